// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Open Service Broker API catalog types and client.
//!
//! The types mirror the `GET /v2/catalog` response body. Only the fields the
//! controller projects into offerings and plans are modelled; everything else in
//! the response is ignored.
//!
//! The reconciler depends on the [`CatalogClient`] trait, not on HTTP, so tests can
//! hand it a canned catalog. [`BrokerClient`] is the real implementation.

pub mod client;

pub use client::BrokerClient;

use crate::credentials::BrokerCredentials;
use crate::crd::{
    BrokerCatalogFeatures, InputParameterSchema, ServiceBindingSchema, ServiceBroker,
    ServiceInstanceSchema, ServicePlanSchemas,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A broker catalog.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    #[serde(default)]
    pub services: Vec<Service>,
}

/// One service advertised by a broker.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub features: ServiceFeatures,
    #[serde(default)]
    pub plans: Vec<Plan>,
}

/// Service-level feature flags, inlined in the service object on the wire.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceFeatures {
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

impl From<&ServiceFeatures> for BrokerCatalogFeatures {
    fn from(features: &ServiceFeatures) -> Self {
        Self {
            plan_updateable: features.plan_updateable,
            bindable: features.bindable,
            instances_retrievable: features.instances_retrievable,
            bindings_retrievable: features.bindings_retrievable,
            allow_context_updates: features.allow_context_updates,
        }
    }
}

impl Service {
    /// The `documentationUrl` metadata entry, when it is a string.
    #[must_use]
    pub fn documentation_url(&self) -> Option<String> {
        self.metadata
            .as_ref()?
            .get(crate::constants::DOCUMENTATION_URL_METADATA_KEY)?
            .as_str()
            .map(str::to_string)
    }
}

/// One plan of a service.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default)]
    pub free: bool,
    #[serde(default)]
    pub bindable: bool,
    #[serde(default)]
    pub plan_updateable: bool,
    #[serde(default)]
    pub schemas: PlanSchemas,
}

/// Parameter schemas of a plan, in wire format.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PlanSchemas {
    #[serde(default)]
    pub service_instance: InstanceSchemas,
    #[serde(default)]
    pub service_binding: BindingSchemas,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct InstanceSchemas {
    #[serde(default)]
    pub create: ParameterSchema,
    #[serde(default)]
    pub update: ParameterSchema,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct BindingSchemas {
    #[serde(default)]
    pub create: ParameterSchema,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ParameterSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl From<&ParameterSchema> for InputParameterSchema {
    fn from(schema: &ParameterSchema) -> Self {
        Self {
            parameters: schema.parameters.clone(),
        }
    }
}

impl From<&PlanSchemas> for ServicePlanSchemas {
    fn from(schemas: &PlanSchemas) -> Self {
        Self {
            service_instance: ServiceInstanceSchema {
                create: (&schemas.service_instance.create).into(),
                update: (&schemas.service_instance.update).into(),
            },
            service_binding: ServiceBindingSchema {
                create: (&schemas.service_binding.create).into(),
            },
        }
    }
}

/// Errors fetching a broker catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The broker URL cannot be turned into a catalog URL.
    #[error("invalid broker URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The request could not be sent or the response could not be read.
    #[error("catalog request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The broker answered with a non-success status.
    #[error("catalog request to {url} returned {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The response body is not a valid catalog.
    #[error("failed to decode catalog from {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// Something that can fetch a broker's catalog.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch the catalog of `broker`, authenticating with `credentials`.
    async fn get_catalog(
        &self,
        broker: &ServiceBroker,
        credentials: &BrokerCredentials,
    ) -> Result<Catalog, CatalogError>;
}
