// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reverse index from credentials secrets to the brokers that reference them.
//!
//! The controller watches secrets and uses this index to find which brokers to
//! re-enqueue when a secret changes. Brokers and their secrets always live in the
//! same namespace.
//!
//! The index may be too broad but never too narrow: an entry for a deleted broker
//! only causes a harmless re-enqueue, which the controller reports as not found and
//! the entry is then dropped.

use crate::crd::ServiceBroker;
use kube::runtime::reflector::ObjectRef;
use kube::runtime::watcher;
use kube::ResourceExt;
use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// `(namespace, name)`
type Key = (String, String);

#[derive(Default)]
struct IndexState {
    /// secret -> brokers referencing it
    brokers_by_secret: HashMap<Key, BTreeSet<String>>,
    /// broker -> secret name it references
    secret_by_broker: HashMap<Key, String>,
}

#[derive(Default)]
pub struct SecretWatchIndex {
    state: RwLock<IndexState>,
}

impl SecretWatchIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the secret `broker` currently references, moving it if it changed.
    pub fn track(&self, broker: &ServiceBroker) {
        let Some(namespace) = broker.namespace() else {
            return;
        };
        let broker_name = broker.name_any();
        let secret_name = broker.spec.credentials.name.clone();

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let broker_key = (namespace.clone(), broker_name.clone());

        if let Some(previous) = state.secret_by_broker.get(&broker_key).cloned() {
            if previous == secret_name {
                return;
            }
            let previous_key = (namespace.clone(), previous);
            remove_dependent(&mut state, &previous_key, &broker_name);
        }

        debug!(
            namespace = %namespace,
            broker = %broker_name,
            secret = %secret_name,
            "Tracking credentials secret"
        );
        state
            .brokers_by_secret
            .entry((namespace, secret_name.clone()))
            .or_default()
            .insert(broker_name);
        state.secret_by_broker.insert(broker_key, secret_name);
    }

    /// Drop a broker from the index.
    pub fn forget(&self, namespace: &str, broker_name: &str) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let broker_key = (namespace.to_string(), broker_name.to_string());

        if let Some(secret_name) = state.secret_by_broker.remove(&broker_key) {
            let secret_key = (namespace.to_string(), secret_name);
            remove_dependent(&mut state, &secret_key, broker_name);
        }
    }

    /// Keep the index in step with the broker watch stream.
    pub fn observe(&self, event: &watcher::Event<ServiceBroker>) {
        match event {
            watcher::Event::Apply(broker) | watcher::Event::InitApply(broker) => {
                self.track(broker);
            }
            watcher::Event::Delete(broker) => {
                if let Some(namespace) = broker.namespace() {
                    self.forget(&namespace, &broker.name_any());
                }
            }
            watcher::Event::Init | watcher::Event::InitDone => {}
        }
    }

    /// Brokers that reference the secret `namespace/secret_name`.
    #[must_use]
    pub fn brokers_for_secret(
        &self,
        namespace: &str,
        secret_name: &str,
    ) -> Vec<ObjectRef<ServiceBroker>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .brokers_by_secret
            .get(&(namespace.to_string(), secret_name.to_string()))
            .map(|brokers| {
                brokers
                    .iter()
                    .map(|name| ObjectRef::new(name).within(namespace))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of brokers tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .secret_by_broker
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn remove_dependent(state: &mut IndexState, secret_key: &Key, broker_name: &str) {
    if let Some(brokers) = state.brokers_by_secret.get_mut(secret_key) {
        brokers.remove(broker_name);
        if brokers.is_empty() {
            state.brokers_by_secret.remove(secret_key);
        }
    }
}

#[cfg(test)]
#[path = "secret_index_tests.rs"]
mod secret_index_tests;
