// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Standard Kubernetes status condition reasons for catalog resources.
//!
//! This module defines constants for condition reasons following Kubernetes conventions.
//! Reasons are programmatic identifiers in CamelCase that explain why a condition has
//! a particular status.
//!
//! # Condition Types
//!
//! A `ServiceBroker` carries a single encompassing `type: Ready` condition. It is
//! binary: either the last reconciliation synchronized the whole catalog, or it
//! did not and the reason says which step failed.
//!
//! # Example Status
//!
//! ```yaml
//! status:
//!   observedGeneration: 3
//!   credentialsObservedVersion: "918273"
//!   conditions:
//!     - type: Ready
//!       status: "False"
//!       reason: GetCatalogFailed
//!       message: "catalog request to https://broker.example.com returned HTTP 503"
//! ```

// ============================================================================
// Condition Types
// ============================================================================

/// Encompassing readiness condition of a `ServiceBroker`
pub const CONDITION_TYPE_READY: &str = "Ready";

/// Condition status value for a satisfied condition
pub const CONDITION_STATUS_TRUE: &str = "True";

/// Condition status value for an unsatisfied condition
pub const CONDITION_STATUS_FALSE: &str = "False";

// ============================================================================
// Common Reasons
// ============================================================================

/// The broker catalog has been fully synchronized.
pub const REASON_READY: &str = "Ready";

/// Reconciliation failed without a more specific classification.
pub const REASON_UNKNOWN: &str = "Unknown";

// ============================================================================
// ServiceBroker Specific Reasons
// ============================================================================

/// The referenced credentials secret could not be read.
///
/// When the secret simply does not exist yet the controller requeues quickly
/// and the broker stays not-ready with this reason until the secret appears.
pub const REASON_CREDENTIALS_SECRET_NOT_AVAILABLE: &str = "CredentialsSecretNotAvailable";

/// The credentials secret exists but its payload is malformed or incomplete.
///
/// No automatic retry happens; the next attempt is triggered by a secret update.
pub const REASON_SECRET_INVALID: &str = "SecretInvalid";

/// The broker's catalog endpoint could not be fetched or decoded.
pub const REASON_GET_CATALOG_FAILED: &str = "GetCatalogFailed";

/// Writing the offerings and plans derived from the catalog failed part way.
pub const REASON_RECONCILE_CATALOG_FAILED: &str = "ReconcileCatalogFailed";

#[cfg(test)]
#[path = "status_reasons_tests.rs"]
mod status_reasons_tests;
