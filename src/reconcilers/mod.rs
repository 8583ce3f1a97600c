// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation logic for service brokers.
//!
//! The catalog operator follows the standard Kubernetes controller pattern:
//!
//! 1. **Watch** - Brokers and the secrets they reference
//! 2. **Reconcile** - Fetch the broker catalog and compare it with the stored
//!    offerings and plans
//! 3. **Update** - Create or update offerings and plans to match the catalog
//! 4. **Status** - Report the result on the broker's `Ready` condition
//!
//! # Modules
//!
//! - [`servicebroker`] - The broker reconciler itself
//! - [`upsert`] - Idempotent create-or-update of child objects
//! - [`status`] - Condition helpers
//! - [`secret_index`] - Secret to broker reverse index
//! - [`key_lock`] - Per-broker serialization
//! - [`retry`] - Backoff for Kubernetes API reads
//!
//! # Example: Using the Reconciler
//!
//! ```rust,no_run
//! use catalogsync::config::ReconcileSettings;
//! use catalogsync::context::Context;
//! use catalogsync::crd::ServiceBroker;
//! use catalogsync::osbapi::BrokerClient;
//! use catalogsync::reconcilers::reconcile_service_broker;
//! use catalogsync::store::KubeStore;
//! use std::time::Duration;
//!
//! async fn sync(broker: ServiceBroker) -> anyhow::Result<()> {
//!     let client = kube::Client::try_default().await?;
//!     let ctx = Context::new(
//!         KubeStore::new(client, "catalogsync-controller"),
//!         BrokerClient::new(Duration::from_secs(30))?,
//!         ReconcileSettings::default(),
//!     );
//!
//!     reconcile_service_broker(&ctx, &broker).await?;
//!     Ok(())
//! }
//! ```

pub mod key_lock;
pub mod retry;
pub mod secret_index;
pub mod servicebroker;
pub mod status;
pub mod upsert;

#[cfg(test)]
pub(crate) mod fixtures;

pub use servicebroker::{reconcile_catalog, reconcile_service_broker, ReconcileOutcome};
