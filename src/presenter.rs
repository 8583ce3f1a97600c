// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! JSON documents served by the REST API.
//!
//! Field names are snake case, timestamps are RFC 3339 UTC with second precision
//! and catalog metadata and schema parameters are passed through untouched.

use crate::constants::{SERVICE_OFFERINGS_PATH, SERVICE_PLANS_PATH};
use crate::crd::InputParameterSchema;
use crate::repositories::ServicePlanResource;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePlanResponse {
    pub name: String,
    pub free: bool,
    pub description: String,
    pub broker_catalog: BrokerCatalogResponse,
    pub schemas: SchemasResponse,
    pub guid: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub metadata: MetadataResponse,
    pub relationships: RelationshipsResponse,
    pub links: LinksResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerCatalogResponse {
    pub id: String,
    pub metadata: Option<Value>,
    pub features: PlanFeaturesResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanFeaturesResponse {
    pub plan_updateable: bool,
    pub bindable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemasResponse {
    pub service_instance: InstanceSchemaResponse,
    pub service_binding: BindingSchemaResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSchemaResponse {
    pub create: ParametersResponse,
    pub update: ParametersResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingSchemaResponse {
    pub create: ParametersResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametersResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl From<&InputParameterSchema> for ParametersResponse {
    fn from(schema: &InputParameterSchema) -> Self {
        Self {
            parameters: schema.parameters.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataResponse {
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipsResponse {
    pub service_offering: ToOneRelationship,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToOneRelationship {
    pub data: RelationshipData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipData {
    pub guid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinksResponse {
    #[serde(rename = "self")]
    pub self_link: Link,
    pub service_offering: Link,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

/// Paged list envelope. The API returns everything on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub pagination: PaginationResponse,
    pub resources: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationResponse {
    pub total_results: usize,
    pub total_pages: usize,
    pub first: Link,
    pub last: Link,
    pub next: Option<Link>,
    pub previous: Option<Link>,
}

fn timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn link(base_url: &Url, path: &str) -> Link {
    Link {
        href: format!("{}{path}", base_url.as_str().trim_end_matches('/')),
    }
}

/// Render one plan.
///
/// # Example
///
/// ```rust
/// use catalogsync::presenter::for_service_plan;
/// use catalogsync::repositories::ServicePlanResource;
/// use url::Url;
///
/// # fn example(plan: &ServicePlanResource) {
/// let base = Url::parse("https://api.example.org").unwrap();
/// let response = for_service_plan(plan, &base);
/// assert!(response.links.self_link.href.ends_with(&plan.guid));
/// # }
/// ```
#[must_use]
pub fn for_service_plan(plan: &ServicePlanResource, base_url: &Url) -> ServicePlanResponse {
    let spec = &plan.plan;
    let schemas = &spec.schemas;

    ServicePlanResponse {
        name: spec.name.clone(),
        free: spec.free,
        description: spec.description.clone(),
        broker_catalog: BrokerCatalogResponse {
            id: spec.broker_catalog.id.clone(),
            metadata: spec.broker_catalog.metadata.clone(),
            features: PlanFeaturesResponse {
                plan_updateable: spec.broker_catalog.features.plan_updateable,
                bindable: spec.broker_catalog.features.bindable,
            },
        },
        schemas: SchemasResponse {
            service_instance: InstanceSchemaResponse {
                create: (&schemas.service_instance.create).into(),
                update: (&schemas.service_instance.update).into(),
            },
            service_binding: BindingSchemaResponse {
                create: (&schemas.service_binding.create).into(),
            },
        },
        guid: plan.guid.clone(),
        created_at: timestamp(&plan.created_at),
        updated_at: plan.updated_at.as_ref().map(timestamp),
        metadata: MetadataResponse {
            labels: plan.labels.clone(),
            annotations: plan.annotations.clone(),
        },
        relationships: RelationshipsResponse {
            service_offering: ToOneRelationship {
                data: RelationshipData {
                    guid: plan.service_offering_guid.clone(),
                },
            },
        },
        links: LinksResponse {
            self_link: link(base_url, &format!("{SERVICE_PLANS_PATH}/{}", plan.guid)),
            service_offering: link(
                base_url,
                &format!("{SERVICE_OFFERINGS_PATH}/{}", plan.service_offering_guid),
            ),
        },
    }
}

/// Render a list of plans as a single page.
#[must_use]
pub fn for_service_plan_list(
    plans: &[ServicePlanResource],
    base_url: &Url,
) -> ListResponse<ServicePlanResponse> {
    let page = link(base_url, &format!("{SERVICE_PLANS_PATH}?page=1"));
    ListResponse {
        pagination: PaginationResponse {
            total_results: plans.len(),
            total_pages: 1,
            first: page.clone(),
            last: page,
            next: None,
            previous: None,
        },
        resources: plans
            .iter()
            .map(|plan| for_service_plan(plan, base_url))
            .collect(),
    }
}

#[cfg(test)]
#[path = "presenter_tests.rs"]
mod presenter_tests;
