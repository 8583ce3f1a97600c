// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Deterministic object names for catalog entries.
//!
//! Offerings and plans are named from their parent broker and the ID the broker
//! advertises for them. Running the reconciler again against the same catalog must
//! land on the same objects, so the name is a pure function of those two inputs:
//!
//! ```text
//! name = uuid5(uuid5(NIL, parent), catalog_id)
//! ```
//!
//! The result is a lowercase hyphenated UUID, which is always a valid Kubernetes
//! object name regardless of what characters the broker uses in its IDs.

use uuid::Uuid;

/// Derive the object name for a catalog entry owned by `parent`.
///
/// # Example
///
/// ```rust
/// use catalogsync::identity::namespaced_uuid;
///
/// let a = namespaced_uuid("my-broker", "service-id");
/// let b = namespaced_uuid("my-broker", "service-id");
/// assert_eq!(a, b);
/// assert_ne!(a, namespaced_uuid("other-broker", "service-id"));
/// ```
#[must_use]
pub fn namespaced_uuid(parent: &str, catalog_id: &str) -> String {
    let namespace = Uuid::new_v5(&Uuid::nil(), parent.as_bytes());
    Uuid::new_v5(&namespace, catalog_id.as_bytes()).to_string()
}

/// Name of the `ServiceOffering` for a catalog service of `broker_name`.
#[must_use]
pub fn offering_name(broker_name: &str, service_id: &str) -> String {
    namespaced_uuid(broker_name, service_id)
}

/// Name of the `ServicePlan` for a catalog plan of `broker_name`.
///
/// Plans are keyed by the broker, not by the offering, so a plan keeps its name
/// even if the broker moves it between services.
#[must_use]
pub fn plan_name(broker_name: &str, plan_id: &str) -> String {
    namespaced_uuid(broker_name, plan_id)
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod identity_tests;
