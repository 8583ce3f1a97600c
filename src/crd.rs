// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for service broker catalogs.
//!
//! This module defines the three tiers of resources the operator works with.
//!
//! # Resource Types
//!
//! - [`ServiceBroker`] - A broker endpoint plus a reference to its credentials secret.
//!   Created by users, status owned by the controller.
//! - [`ServiceOffering`] - One service advertised by a broker catalog. Owned by the controller.
//! - [`ServicePlan`] - One plan of an offering. Owned by the controller.
//!
//! Offerings and plans point back at their parents through labels (see
//! [`crate::labels`]) and are named by [`crate::identity::namespaced_uuid`], so the same
//! catalog entry always maps to the same object.
//!
//! # Example: Registering a Broker
//!
//! ```rust,no_run
//! use catalogsync::crd::{SecretReference, ServiceBrokerSpec};
//!
//! let spec = ServiceBrokerSpec {
//!     name: "my-broker".to_string(),
//!     url: "https://broker.example.com".to_string(),
//!     credentials: SecretReference {
//!         name: "my-broker-credentials".to_string(),
//!     },
//! };
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Schema for opaque JSON blobs copied verbatim from the broker catalog.
///
/// The API server must keep unknown fields inside these blobs, otherwise broker
/// metadata and parameter schemas would be pruned on write.
#[must_use]
pub fn raw_json_schema(_generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "object",
        "nullable": true,
        "x-kubernetes-preserve-unknown-fields": true
    })
}

/// Condition represents an observation of a resource's current state.
///
/// Conditions are used in status subresources to communicate the state of
/// a resource to users and controllers.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition. The broker controller only writes `Ready`.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// Reference to a Secret in the same namespace as the referencing object.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
pub struct SecretReference {
    /// Name of the Secret.
    pub name: String,
}

// ============================================================================
// ServiceBroker
// ============================================================================

/// `ServiceBroker` registers an Open Service Broker API endpoint.
///
/// The controller reads the broker's catalog and materializes every service as a
/// [`ServiceOffering`] and every plan as a [`ServicePlan`] in the broker's namespace.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "services.catalogsync.io",
    version = "v1alpha1",
    kind = "ServiceBroker",
    namespaced,
    shortname = "sb",
    doc = "ServiceBroker registers an Open Service Broker API endpoint whose catalog is synchronized into ServiceOffering and ServicePlan resources.",
    printcolumn = r#"{"name":"URL","type":"string","jsonPath":".spec.url"}"#,
    printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#
)]
#[kube(status = "ServiceBrokerStatus")]
#[serde(rename_all = "camelCase")]
pub struct ServiceBrokerSpec {
    /// Human-readable broker name.
    pub name: String,

    /// Base URL of the broker. The catalog is read from `{url}/v2/catalog`.
    pub url: String,

    /// Secret holding the broker credentials under the `credentials` key.
    ///
    /// The value must be a JSON object with at least `username` and `password`.
    pub credentials: SecretReference,
}

/// `ServiceBroker` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBrokerStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Generation of the spec the controller last acted on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// `resourceVersion` of the credentials secret the controller last validated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_observed_version: Option<String>,
}

// ============================================================================
// ServiceOffering
// ============================================================================

/// Feature flags advertised by a catalog service.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BrokerCatalogFeatures {
    #[serde(default)]
    pub plan_updateable: bool,
    #[serde(default)]
    pub bindable: bool,
    #[serde(default)]
    pub instances_retrievable: bool,
    #[serde(default)]
    pub bindings_retrievable: bool,
    #[serde(default)]
    pub allow_context_updates: bool,
}

/// Broker-side identity and metadata of an offering.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBrokerCatalog {
    /// Service ID as advertised by the broker. Immutable once set.
    pub id: String,

    /// Catalog metadata, copied verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "raw_json_schema")]
    pub metadata: Option<serde_json::Value>,

    #[serde(default)]
    pub features: BrokerCatalogFeatures,
}

/// `ServiceOffering` mirrors one service of a broker catalog.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "services.catalogsync.io",
    version = "v1alpha1",
    kind = "ServiceOffering",
    namespaced,
    derive = "Default",
    derive = "PartialEq",
    doc = "ServiceOffering mirrors one service advertised by a ServiceBroker catalog. Managed by the controller.",
    printcolumn = r#"{"name":"Offering","type":"string","jsonPath":".spec.name"}"#,
    printcolumn = r#"{"name":"Catalog ID","type":"string","jsonPath":".spec.brokerCatalog.id"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOfferingSpec {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Platform capabilities the service requires (e.g. `syslog_drain`).
    #[serde(default)]
    pub requires: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,

    pub broker_catalog: ServiceBrokerCatalog,
}

// ============================================================================
// ServicePlan
// ============================================================================

/// Plan-level feature flags.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServicePlanFeatures {
    #[serde(default)]
    pub plan_updateable: bool,
    #[serde(default)]
    pub bindable: bool,
}

/// Broker-side identity and metadata of a plan.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServicePlanBrokerCatalog {
    /// Plan ID as advertised by the broker.
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "raw_json_schema")]
    pub metadata: Option<serde_json::Value>,

    #[serde(default)]
    pub features: ServicePlanFeatures,
}

/// JSON schema for a set of input parameters.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
pub struct InputParameterSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "raw_json_schema")]
    pub parameters: Option<serde_json::Value>,
}

/// Parameter schemas for service instance operations.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
pub struct ServiceInstanceSchema {
    #[serde(default)]
    pub create: InputParameterSchema,
    #[serde(default)]
    pub update: InputParameterSchema,
}

/// Parameter schemas for service binding operations.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
pub struct ServiceBindingSchema {
    #[serde(default)]
    pub create: InputParameterSchema,
}

/// Parameter validation schemas advertised for a plan.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServicePlanSchemas {
    #[serde(default)]
    pub service_instance: ServiceInstanceSchema,
    #[serde(default)]
    pub service_binding: ServiceBindingSchema,
}

/// `ServicePlan` mirrors one plan of a catalog service.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "services.catalogsync.io",
    version = "v1alpha1",
    kind = "ServicePlan",
    namespaced,
    derive = "Default",
    derive = "PartialEq",
    doc = "ServicePlan mirrors one plan of a service advertised by a ServiceBroker catalog. Managed by the controller.",
    printcolumn = r#"{"name":"Plan","type":"string","jsonPath":".spec.name"}"#,
    printcolumn = r#"{"name":"Free","type":"boolean","jsonPath":".spec.free"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ServicePlanSpec {
    pub name: String,

    #[serde(default)]
    pub free: bool,

    #[serde(default)]
    pub description: String,

    pub broker_catalog: ServicePlanBrokerCatalog,

    #[serde(default)]
    pub schemas: ServicePlanSchemas,
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
