// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Read-side access to service plans for the REST API.

use crate::crd::{ServicePlan, ServicePlanSpec};
use crate::labels::REL_SERVICE_OFFERING_LABEL;
use crate::store::{ObjectStore, StoreError};
use chrono::{DateTime, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// A stored plan together with the bookkeeping the API exposes.
#[derive(Debug, Clone, PartialEq)]
pub struct ServicePlanResource {
    pub plan: ServicePlanSpec,
    pub guid: String,
    pub created_at: DateTime<Utc>,
    /// Not tracked by the store; always `None` for listed plans.
    pub updated_at: Option<DateTime<Utc>>,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    /// Guid of the offering the plan belongs to, from its back-reference label.
    pub service_offering_guid: String,
}

impl From<&ServicePlan> for ServicePlanResource {
    fn from(plan: &ServicePlan) -> Self {
        Self {
            plan: plan.spec.clone(),
            guid: plan.name_any(),
            created_at: plan
                .metadata
                .creation_timestamp
                .as_ref()
                .and_then(to_utc)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            updated_at: None,
            labels: plan.labels().clone(),
            annotations: plan.annotations().clone(),
            service_offering_guid: plan
                .labels()
                .get(REL_SERVICE_OFFERING_LABEL)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

// Goes through the wire form so it does not depend on the timestamp backend
fn to_utc(time: &Time) -> Option<DateTime<Utc>> {
    let value = serde_json::to_value(time).ok()?;
    DateTime::parse_from_rfc3339(value.as_str()?)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Lists service plans from the root namespace.
pub struct ServicePlanRepo<S> {
    store: Arc<S>,
    root_namespace: String,
}

impl<S: ObjectStore> ServicePlanRepo<S> {
    pub fn new(store: Arc<S>, root_namespace: impl Into<String>) -> Self {
        Self {
            store,
            root_namespace: root_namespace.into(),
        }
    }

    /// All plans in the root namespace.
    ///
    /// # Errors
    ///
    /// Returns the store error if listing fails.
    pub async fn list_plans(&self) -> Result<Vec<ServicePlanResource>, StoreError> {
        let plans: Vec<ServicePlan> = self.store.list(&self.root_namespace, None).await?;
        debug!(
            namespace = %self.root_namespace,
            count = plans.len(),
            "Listed service plans"
        );
        Ok(plans.iter().map(ServicePlanResource::from).collect())
    }
}

#[cfg(test)]
#[path = "repositories_tests.rs"]
mod repositories_tests;
