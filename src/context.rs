// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for the broker controller.
//!
//! The controller hands every reconcile an `Arc<Context>` holding:
//! - the [`ObjectStore`] used for all reads and writes
//! - the [`CatalogClient`] used to fetch broker catalogs
//! - the [`SecretWatchIndex`] mapping secrets back to brokers
//! - the [`KeyedLock`] serializing reconciles of the same broker
//! - requeue timings
//!
//! Both collaborators are type parameters so tests can run the real reconciler
//! against an in-memory store and a canned catalog.

use crate::config::ReconcileSettings;
use crate::osbapi::{BrokerClient, CatalogClient};
use crate::reconcilers::key_lock::KeyedLock;
use crate::reconcilers::secret_index::SecretWatchIndex;
use crate::store::{KubeStore, ObjectStore};

/// Shared context passed to the broker controller.
pub struct Context<S = KubeStore, C = BrokerClient>
where
    S: ObjectStore,
    C: CatalogClient,
{
    /// Reads and writes Kubernetes objects
    pub store: S,

    /// Fetches broker catalogs
    pub catalog_client: C,

    /// Secret to broker reverse index for the secret watch
    pub secret_index: SecretWatchIndex,

    /// One in-flight reconcile per broker
    pub key_lock: KeyedLock,

    pub settings: ReconcileSettings,
}

impl<S, C> Context<S, C>
where
    S: ObjectStore,
    C: CatalogClient,
{
    #[must_use]
    pub fn new(store: S, catalog_client: C, settings: ReconcileSettings) -> Self {
        Self {
            store,
            catalog_client,
            secret_index: SecretWatchIndex::new(),
            key_lock: KeyedLock::new(),
            settings,
        }
    }
}
