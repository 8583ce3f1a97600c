// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # Catalogsync - Service Broker Catalog Operator for Kubernetes
//!
//! Catalogsync watches `ServiceBroker` resources, fetches each broker's
//! Open Service Broker API catalog and mirrors it into `ServiceOffering` and
//! `ServicePlan` resources. The result of every attempt is reported on the
//! broker's `Ready` condition.
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definition types
//! - [`reconcilers`] - Broker reconciliation logic
//! - [`controller`] - Controller wiring, error policy and secret watch
//! - [`osbapi`] - Catalog types and the broker HTTP client
//! - [`store`] - Storage seam over the Kubernetes API
//! - [`credentials`] - Credentials secret validation
//! - [`identity`] - Deterministic offering and plan names
//! - [`repositories`], [`presenter`], [`server`] - Service plan REST API and metrics
//!
//! ## Example
//!
//! ```rust
//! use catalogsync::crd::{SecretReference, ServiceBrokerSpec};
//! use catalogsync::identity::offering_name;
//!
//! let spec = ServiceBrokerSpec {
//!     name: "Postgres broker".to_string(),
//!     url: "https://postgres-broker.example.com".to_string(),
//!     credentials: SecretReference {
//!         name: "postgres-broker-creds".to_string(),
//!     },
//! };
//!
//! // Offerings are named after the broker and the catalog service id
//! let name = offering_name("postgres-broker", "6d8c1c5e-service");
//! assert_eq!(name, offering_name("postgres-broker", "6d8c1c5e-service"));
//! # let _ = spec;
//! ```

pub mod config;
pub mod constants;
pub mod context;
pub mod controller;
pub mod crd;
pub mod credentials;
pub mod errors;
pub mod identity;
pub mod labels;
pub mod metrics;
pub mod osbapi;
pub mod presenter;
pub mod reconcilers;
pub mod repositories;
pub mod server;
pub mod status_reasons;
pub mod store;
