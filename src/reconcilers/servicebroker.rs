// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `ServiceBroker` reconciliation logic.
//!
//! A reconcile walks a fixed sequence and stops at the first failure:
//!
//! 1. Fetch the credentials secret referenced by `spec.credentials.name`
//! 2. Validate the credentials it holds
//! 3. Fetch the broker catalog
//! 4. Upsert one `ServiceOffering` per catalog service and one `ServicePlan` per plan,
//!    in catalog order
//!
//! Whatever happens, the broker's `Ready` condition is written exactly once at the
//! end of the attempt. Offerings and plans whose catalog entries disappear are left
//! in place; existing instances and bindings may still point at them.

use crate::context::Context;
use crate::credentials::validate_credentials;
use crate::crd::{
    ServiceBroker, ServiceBrokerCatalog, ServiceBrokerStatus, ServiceOffering,
    ServiceOfferingSpec, ServicePlan, ServicePlanBrokerCatalog, ServicePlanFeatures,
    ServicePlanSpec,
};
use crate::errors::{CatalogReconcileError, ErrorClass, ReconcileError};
use crate::identity::{offering_name, plan_name};
use crate::labels::{
    K8S_MANAGED_BY, MANAGED_BY_CATALOGSYNC, REL_SERVICE_BROKER_LABEL, REL_SERVICE_OFFERING_LABEL,
};
use crate::metrics;
use crate::osbapi::{Catalog, CatalogClient, Plan, Service};
use crate::reconcilers::status::{set_condition, ReadyConditionBuilder};
use crate::reconcilers::upsert::{create_or_patch, set_label, UpsertOutcome};
use crate::store::{ObjectStore, StoreError};
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use serde_json::Value;
use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Successful result of one broker reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The catalog is fully reflected in offerings and plans.
    Synced,
    /// Nothing failed, but the broker cannot make progress yet; try again later.
    RetryAfter(Duration),
}

/// Write counts of one catalog walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl CatalogSummary {
    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

/// Reconciles a `ServiceBroker` resource.
///
/// Mirrors the broker's catalog into `ServiceOffering` and `ServicePlan` objects in
/// the broker's namespace and reports the result on the broker's `Ready` condition.
///
/// # Arguments
///
/// * `ctx` - Store, catalog client and timings
/// * `broker` - The broker to reconcile
///
/// # Returns
///
/// * `Ok(ReconcileOutcome::Synced)` - The catalog was applied
/// * `Ok(ReconcileOutcome::RetryAfter(_))` - The credentials secret does not exist yet
///
/// # Errors
///
/// Returns the first failure of the sequence. The broker status has already been
/// updated to describe it when this returns, unless the status write itself failed.
pub async fn reconcile_service_broker<S, C>(
    ctx: &Context<S, C>,
    broker: &ServiceBroker,
) -> Result<ReconcileOutcome, ReconcileError>
where
    S: ObjectStore,
    C: CatalogClient,
{
    let name = broker.name_any();
    let Some(namespace) = broker.namespace() else {
        return Err(ReconcileError::MissingNamespace { name });
    };

    info!("Reconciling ServiceBroker: {}/{}", namespace, name);
    debug!(
        namespace = %namespace,
        broker = %name,
        generation = ?broker.metadata.generation,
        secret = %broker.spec.credentials.name,
        "Starting ServiceBroker reconciliation"
    );

    ctx.secret_index.track(broker);

    let mut status = broker.status.clone().unwrap_or_default();
    status.observed_generation = broker.metadata.generation;

    let result = sync_catalog(ctx, broker, &namespace, &mut status).await;

    let condition = match &result {
        Ok(_) => ReadyConditionBuilder::new().ready(),
        Err(e) => ReadyConditionBuilder::new()
            .with_reason(e.condition_reason())
            .with_error(Some(e as &dyn Display)),
    }
    .build();
    set_condition(&mut status.conditions, condition);

    let status_result = write_status(&ctx.store, &namespace, &name, &status).await;

    match (result, status_result) {
        (Ok(summary), Ok(())) => {
            info!(
                namespace = %namespace,
                broker = %name,
                created = summary.created,
                updated = summary.updated,
                unchanged = summary.unchanged,
                "ServiceBroker catalog synchronized"
            );
            Ok(ReconcileOutcome::Synced)
        }
        (Ok(_), Err(status_err)) => Err(status_err),
        (Err(e), Ok(())) if e.class() == ErrorClass::Transient => {
            info!(
                namespace = %namespace,
                broker = %name,
                "{e}, retrying in {:?}",
                ctx.settings.secret_requeue
            );
            Ok(ReconcileOutcome::RetryAfter(ctx.settings.secret_requeue))
        }
        (Err(e), status_result) => {
            if let Err(status_err) = status_result {
                warn!(
                    namespace = %namespace,
                    broker = %name,
                    "Failed to record reconcile failure on ServiceBroker status: {status_err}"
                );
            }
            Err(e)
        }
    }
}

async fn sync_catalog<S, C>(
    ctx: &Context<S, C>,
    broker: &ServiceBroker,
    namespace: &str,
    status: &mut ServiceBrokerStatus,
) -> Result<CatalogSummary, ReconcileError>
where
    S: ObjectStore,
    C: CatalogClient,
{
    let broker_name = broker.name_any();
    let secret_name = &broker.spec.credentials.name;

    let secret = match ctx.store.get::<Secret>(namespace, secret_name).await {
        Ok(Some(secret)) => secret,
        Ok(None) => {
            return Err(ReconcileError::CredentialsSecretNotFound {
                namespace: namespace.to_string(),
                name: secret_name.clone(),
            })
        }
        Err(e) if e.is_not_found() => {
            return Err(ReconcileError::CredentialsSecretNotFound {
                namespace: namespace.to_string(),
                name: secret_name.clone(),
            })
        }
        Err(source) => {
            return Err(ReconcileError::CredentialsSecretFetch {
                namespace: namespace.to_string(),
                name: secret_name.clone(),
                source,
            })
        }
    };

    let credentials = validate_credentials(secret_name, secret.data.as_ref())?;
    status
        .credentials_observed_version
        .clone_from(&secret.metadata.resource_version);

    let catalog = ctx
        .catalog_client
        .get_catalog(broker, &credentials)
        .await
        .map_err(|source| ReconcileError::GetCatalog {
            broker: broker_name.clone(),
            source,
        })?;

    let plan_count = catalog.services.iter().map(|s| s.plans.len()).sum();
    metrics::record_catalog_size(namespace, &broker_name, catalog.services.len(), plan_count);
    debug!(
        broker = %broker_name,
        services = catalog.services.len(),
        plans = plan_count,
        "Fetched broker catalog"
    );

    reconcile_catalog(&ctx.store, namespace, &broker_name, &catalog)
        .await
        .map_err(ReconcileError::ReconcileCatalog)
}

/// Upsert an offering for every catalog service and a plan for every plan.
///
/// Stops at the first failed upsert. Objects written before the failure stay
/// written.
///
/// # Errors
///
/// Returns the failed upsert, naming the catalog entry it was for.
pub async fn reconcile_catalog<S>(
    store: &S,
    namespace: &str,
    broker_name: &str,
    catalog: &Catalog,
) -> Result<CatalogSummary, CatalogReconcileError>
where
    S: ObjectStore + ?Sized,
{
    let mut summary = CatalogSummary::default();

    for service in &catalog.services {
        let (offering, outcome) = upsert_offering(store, namespace, broker_name, service)
            .await
            .map_err(|source| CatalogReconcileError::Offering {
                service_id: service.id.clone(),
                source,
            })?;
        summary.record(outcome);

        // Plans hang off the offering as stored, not as desired
        let offering_broker = offering
            .labels()
            .get(REL_SERVICE_BROKER_LABEL)
            .cloned()
            .unwrap_or_else(|| broker_name.to_string());
        let offering_guid = offering.name_any();

        for plan in &service.plans {
            let (_, outcome) =
                upsert_plan(store, namespace, &offering_broker, &offering_guid, plan)
                    .await
                    .map_err(|source| CatalogReconcileError::Plan {
                        plan_id: plan.id.clone(),
                        service_id: service.id.clone(),
                        source,
                    })?;
            summary.record(outcome);
        }
    }

    Ok(summary)
}

async fn upsert_offering<S>(
    store: &S,
    namespace: &str,
    broker_name: &str,
    service: &Service,
) -> Result<(ServiceOffering, UpsertOutcome), StoreError>
where
    S: ObjectStore + ?Sized,
{
    let name = offering_name(broker_name, &service.id);
    create_or_patch(store, namespace, &name, |offering: &mut ServiceOffering| {
        offering.spec = offering_spec(service);
        set_label(offering, K8S_MANAGED_BY, MANAGED_BY_CATALOGSYNC);
        set_label(offering, REL_SERVICE_BROKER_LABEL, broker_name);
    })
    .await
}

async fn upsert_plan<S>(
    store: &S,
    namespace: &str,
    broker_name: &str,
    offering_guid: &str,
    plan: &Plan,
) -> Result<(ServicePlan, UpsertOutcome), StoreError>
where
    S: ObjectStore + ?Sized,
{
    let name = plan_name(broker_name, &plan.id);
    create_or_patch(store, namespace, &name, |service_plan: &mut ServicePlan| {
        service_plan.spec = plan_spec(plan);
        set_label(service_plan, K8S_MANAGED_BY, MANAGED_BY_CATALOGSYNC);
        set_label(service_plan, REL_SERVICE_BROKER_LABEL, broker_name);
        set_label(service_plan, REL_SERVICE_OFFERING_LABEL, offering_guid);
    })
    .await
}

/// Offering spec for a catalog service.
#[must_use]
pub fn offering_spec(service: &Service) -> ServiceOfferingSpec {
    ServiceOfferingSpec {
        name: service.name.clone(),
        description: service.description.clone(),
        tags: service.tags.clone(),
        requires: service.requires.clone(),
        documentation_url: service.documentation_url(),
        broker_catalog: ServiceBrokerCatalog {
            id: service.id.clone(),
            metadata: service.metadata.clone().map(Value::Object),
            features: (&service.features).into(),
        },
    }
}

/// Plan spec for a catalog plan.
#[must_use]
pub fn plan_spec(plan: &Plan) -> ServicePlanSpec {
    ServicePlanSpec {
        name: plan.name.clone(),
        free: plan.free,
        description: plan.description.clone(),
        broker_catalog: ServicePlanBrokerCatalog {
            id: plan.id.clone(),
            metadata: plan.metadata.clone().map(Value::Object),
            features: ServicePlanFeatures {
                plan_updateable: plan.plan_updateable,
                bindable: plan.bindable,
            },
        },
        schemas: (&plan.schemas).into(),
    }
}

async fn write_status<S>(
    store: &S,
    namespace: &str,
    name: &str,
    status: &ServiceBrokerStatus,
) -> Result<(), ReconcileError>
where
    S: ObjectStore + ?Sized,
{
    let value = serde_json::to_value(status)
        .map_err(|e| ReconcileError::Status(StoreError::from(e)))?;
    store
        .patch_status::<ServiceBroker>(namespace, name, value)
        .await
        .map_err(ReconcileError::Status)
}

#[cfg(test)]
#[path = "servicebroker_tests.rs"]
mod servicebroker_tests;
