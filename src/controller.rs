// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `ServiceBroker` controller wiring.
//!
//! Brokers are watched through a reflector so the [`SecretWatchIndex`] sees every
//! apply and delete. Secrets are watched as well; a secret event is mapped back to
//! the brokers that reference it and those brokers are reconciled again.

use crate::context::Context;
use crate::crd::ServiceBroker;
use crate::errors::{ErrorClass, ReconcileError};
use crate::metrics::{self, ReconcileResult};
use crate::osbapi::CatalogClient;
use crate::reconcilers::secret_index::SecretWatchIndex;
use crate::reconcilers::{reconcile_service_broker, ReconcileOutcome};
use crate::store::ObjectStore;
use anyhow::Result;
use futures::{StreamExt, TryStreamExt};
use k8s_openapi::api::core::v1::Secret;
use kube::runtime::controller::{self, Action};
use kube::runtime::reflector::{self, ObjectRef};
use kube::runtime::{watcher, Controller, WatchStreamExt};
use kube::{Api, Client, ResourceExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Run the `ServiceBroker` controller until its watch streams end.
///
/// # Arguments
///
/// * `client` - Kubernetes client for the watches
/// * `ctx` - Shared reconcile context
/// * `watch_namespace` - Namespace to watch, all namespaces when `None`
///
/// # Errors
///
/// Returns an error if the controller fails to start.
pub async fn run_service_broker_controller(
    client: Client,
    ctx: Arc<Context>,
    watch_namespace: Option<String>,
) -> Result<()> {
    info!(
        namespace = watch_namespace.as_deref().unwrap_or("<all>"),
        "Starting ServiceBroker controller"
    );

    let (brokers, secrets): (Api<ServiceBroker>, Api<Secret>) = match &watch_namespace {
        Some(ns) => (
            Api::namespaced(client.clone(), ns),
            Api::namespaced(client, ns),
        ),
        None => (Api::all(client.clone()), Api::all(client)),
    };

    let (reader, writer) = reflector::store();
    let index_ctx = ctx.clone();
    let broker_stream = watcher(brokers, watcher::Config::default())
        .default_backoff()
        .reflect(writer)
        .inspect_ok(move |event| observe_broker_event(&index_ctx.secret_index, event))
        .applied_objects();

    let mapper_ctx = ctx.clone();
    let results_ctx = ctx.clone();

    Controller::for_stream(broker_stream, reader)
        .watches(secrets, watcher::Config::default(), move |secret: Secret| {
            let Some(namespace) = secret.namespace() else {
                return Vec::new();
            };
            let brokers = mapper_ctx
                .secret_index
                .brokers_for_secret(&namespace, &secret.name_any());
            if !brokers.is_empty() {
                debug!(
                    namespace = %namespace,
                    secret = %secret.name_any(),
                    brokers = brokers.len(),
                    "Credentials secret changed, re-enqueueing brokers"
                );
            }
            brokers
        })
        .run(reconcile_wrapper, error_policy, ctx)
        .for_each(move |result| {
            handle_result(&results_ctx.secret_index, result);
            futures::future::ready(())
        })
        .await;

    Ok(())
}

type ControllerResult =
    Result<(ObjectRef<ServiceBroker>, Action), controller::Error<ReconcileError, watcher::Error>>;

fn handle_result(index: &SecretWatchIndex, result: ControllerResult) {
    match result {
        Ok((broker, action)) => debug!(broker = %broker, ?action, "Reconcile finished"),
        // Queued by a secret event after the broker was deleted
        Err(controller::Error::ObjectNotFound(obj_ref)) => {
            if let Some(namespace) = obj_ref.namespace.as_deref() {
                forget_broker(index, namespace, &obj_ref.name);
            }
            debug!(broker = %obj_ref, "Dropped state of deleted ServiceBroker");
        }
        Err(controller::Error::ReconcilerFailed(err, obj_ref)) => {
            debug!(broker = %obj_ref, "Reconcile failed: {err}");
        }
        Err(e) => warn!("ServiceBroker controller error: {e}"),
    }
}

/// Keep the secret index and per-broker metrics in step with the broker watch.
pub(crate) fn observe_broker_event(
    index: &SecretWatchIndex,
    event: &watcher::Event<ServiceBroker>,
) {
    index.observe(event);
    if let watcher::Event::Delete(broker) = event {
        if let Some(namespace) = broker.namespace() {
            metrics::forget_broker(&namespace, &broker.name_any());
        }
    }
}

fn forget_broker(index: &SecretWatchIndex, namespace: &str, name: &str) {
    index.forget(namespace, name);
    metrics::forget_broker(namespace, name);
}

/// Reconcile wrapper for `ServiceBroker`.
///
/// Serializes reconciles of the same broker, records metrics and turns the
/// reconcile outcome into a requeue action.
///
/// # Errors
///
/// Returns the reconcile error unchanged; [`error_policy`] decides the retry.
pub async fn reconcile_wrapper<S, C>(
    broker: Arc<ServiceBroker>,
    ctx: Arc<Context<S, C>>,
) -> Result<Action, ReconcileError>
where
    S: ObjectStore + 'static,
    C: CatalogClient + 'static,
{
    let key = format!(
        "{}/{}",
        broker.namespace().unwrap_or_default(),
        broker.name_any()
    );
    let _guard = ctx.key_lock.lock(&key).await;

    let start = Instant::now();
    let result = reconcile_service_broker(&ctx, &broker).await;
    let duration = start.elapsed();

    match result {
        Ok(ReconcileOutcome::Synced) => {
            info!("Successfully reconciled ServiceBroker: {key}");
            metrics::record_reconcile(ReconcileResult::Synced, duration);
            Ok(Action::requeue(ctx.settings.resync_interval))
        }
        Ok(ReconcileOutcome::RetryAfter(delay)) => {
            metrics::record_reconcile(ReconcileResult::Waiting, duration);
            metrics::record_requeue("secret_not_available");
            Ok(Action::requeue(delay))
        }
        Err(e) => {
            error!("Failed to reconcile ServiceBroker {key}: {e}");
            metrics::record_reconcile(ReconcileResult::Failed, duration);
            Err(e)
        }
    }
}

/// Error policy for the `ServiceBroker` controller.
///
/// | Class         | Action                           |
/// |---------------|----------------------------------|
/// | `Transient`   | requeue after the secret delay   |
/// | `Validation`  | wait for the broker or secret    |
/// | `Conflict`    | requeue after the conflict delay |
/// | anything else | requeue after the error delay    |
#[allow(clippy::needless_pass_by_value)] // Signature required by kube::runtime::Controller
pub fn error_policy<S, C>(
    broker: Arc<ServiceBroker>,
    err: &ReconcileError,
    ctx: Arc<Context<S, C>>,
) -> Action
where
    S: ObjectStore,
    C: CatalogClient,
{
    let class = err.class();
    metrics::record_error(class.as_str());

    match class {
        ErrorClass::Validation => {
            warn!(
                broker = %broker.name_any(),
                error = %err,
                "Invalid ServiceBroker input, waiting for a change"
            );
            Action::await_change()
        }
        // Only reaches here when recording the missing secret on the status failed
        ErrorClass::Transient => {
            debug!(
                broker = %broker.name_any(),
                error = %err,
                "Credentials secret not available - will retry in {:?}",
                ctx.settings.secret_requeue
            );
            metrics::record_requeue(class.as_str());
            Action::requeue(ctx.settings.secret_requeue)
        }
        ErrorClass::Conflict => {
            debug!(
                broker = %broker.name_any(),
                error = %err,
                "Write conflict - will retry in {:?}",
                ctx.settings.conflict_requeue
            );
            metrics::record_requeue(class.as_str());
            Action::requeue(ctx.settings.conflict_requeue)
        }
        _ => {
            error!(
                broker = %broker.name_any(),
                error = %err,
                class = class.as_str(),
                "Reconciliation error - will retry in {:?}",
                ctx.settings.error_requeue
            );
            metrics::record_requeue(class.as_str());
            Action::requeue(ctx.settings.error_requeue)
        }
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod controller_tests;
