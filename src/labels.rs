// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label constants used across the catalog reconcilers.
//!
//! Offerings and plans reference their parents through labels rather than
//! owner references, so these keys are the only link between the three tiers.

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Value for `app.kubernetes.io/managed-by` on objects written by this controller
pub const MANAGED_BY_CATALOGSYNC: &str = "catalogsync";

// ============================================================================
// Relationship Labels
// ============================================================================

/// Label on offerings and plans naming the owning `ServiceBroker`
pub const REL_SERVICE_BROKER_LABEL: &str = "services.catalogsync.io/service-broker-guid";

/// Label on plans naming the owning `ServiceOffering`
pub const REL_SERVICE_OFFERING_LABEL: &str = "services.catalogsync.io/service-offering-guid";
