// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory [`ObjectStore`] for tests.
//!
//! Objects are kept as JSON, keyed by kind, namespace and name. Every write bumps a
//! global `resourceVersion` counter and `replace` enforces optimistic concurrency the
//! way the API server does. Writes are recorded so tests can assert on them.

use super::{object_name, ObjectStore, StoreError, StoredObject};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use kube::ResourceExt;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

type ObjectKey = (String, String, String);

/// One recorded write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub verb: &'static str,
    pub kind: String,
    pub name: String,
}

#[derive(Default)]
struct State {
    objects: BTreeMap<ObjectKey, Value>,
    next_version: u64,
    writes: Vec<WriteRecord>,
    failing: HashSet<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

fn key<K: StoredObject>(namespace: &str, name: &str) -> ObjectKey {
    (
        K::kind(&()).to_string(),
        namespace.to_string(),
        name.to_string(),
    )
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Store an object as-is, bypassing write accounting. Returns the stored copy.
    pub fn seed<K: StoredObject>(&self, object: &K) -> K {
        let namespace = object.namespace().unwrap_or_default();
        let name = object.name_any();
        let mut state = self.lock();
        state.next_version += 1;
        let version = state.next_version;

        let mut stored = object.clone();
        stored.meta_mut().namespace = Some(namespace.clone());
        stored.meta_mut().resource_version = Some(version.to_string());
        let mut value = serde_json::to_value(&stored).expect("serializable test object");
        value["metadata"]["creationTimestamp"] = Value::String(now());
        state
            .objects
            .insert(key::<K>(&namespace, &name), value.clone());

        serde_json::from_value(value).expect("deserializable test object")
    }

    /// Read an object without going through the async API.
    pub fn fetch<K: StoredObject>(&self, namespace: &str, name: &str) -> Option<K> {
        self.lock()
            .objects
            .get(&key::<K>(namespace, name))
            .map(|value| serde_json::from_value(value.clone()).expect("stored object"))
    }

    /// All stored objects of one kind in a namespace.
    pub fn all<K: StoredObject>(&self, namespace: &str) -> Vec<K> {
        let kind = K::kind(&()).to_string();
        self.lock()
            .objects
            .iter()
            .filter(|((k, ns, _), _)| *k == kind && ns == namespace)
            .map(|(_, value)| serde_json::from_value(value.clone()).expect("stored object"))
            .collect()
    }

    /// Writes performed through the [`ObjectStore`] API so far.
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.lock().writes.clone()
    }

    /// Number of writes of one verb.
    pub fn write_count(&self, verb: &str) -> usize {
        self.lock().writes.iter().filter(|w| w.verb == verb).count()
    }

    pub fn clear_writes(&self) {
        self.lock().writes.clear();
    }

    /// Make every write to an object with this name fail.
    pub fn fail_writes_to(&self, name: &str) {
        self.lock().failing.insert(name.to_string());
    }

    pub fn stop_failing(&self, name: &str) {
        self.lock().failing.remove(name);
    }

    fn check_failure(state: &State, name: &str) -> Result<(), StoreError> {
        if state.failing.contains(name) {
            return Err(StoreError::Backend(format!("injected failure writing {name}")));
        }
        Ok(())
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn conflict<K: StoredObject>(namespace: &str, name: &str, message: &str) -> StoreError {
    StoreError::Conflict {
        kind: K::kind(&()).to_string(),
        namespace: namespace.to_string(),
        name: name.to_string(),
        message: message.to_string(),
    }
}

fn labels_match(value: &Value, selector: &str) -> bool {
    let labels = &value["metadata"]["labels"];
    selector
        .split(',')
        .filter(|term| !term.is_empty())
        .all(|term| match term.split_once('=') {
            Some((k, v)) => labels[k.trim()].as_str() == Some(v.trim()),
            None => !labels[term.trim()].is_null(),
        })
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get<K: StoredObject>(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<K>, StoreError> {
        let state = self.lock();
        state
            .objects
            .get(&key::<K>(namespace, name))
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn create<K: StoredObject>(&self, namespace: &str, object: &K) -> Result<K, StoreError> {
        let name = object_name(object)?.to_string();
        let mut state = self.lock();
        Self::check_failure(&state, &name)?;

        let key = key::<K>(namespace, &name);
        if state.objects.contains_key(&key) {
            return Err(conflict::<K>(namespace, &name, "already exists"));
        }

        state.next_version += 1;
        let mut stored = object.clone();
        stored.meta_mut().namespace = Some(namespace.to_string());
        stored.meta_mut().resource_version = Some(state.next_version.to_string());
        stored.meta_mut().generation = Some(1);
        let mut value = serde_json::to_value(&stored)?;
        value["metadata"]["creationTimestamp"] = Value::String(now());

        state.objects.insert(key, value.clone());
        state.writes.push(WriteRecord {
            verb: "create",
            kind: K::kind(&()).to_string(),
            name,
        });

        Ok(serde_json::from_value(value)?)
    }

    async fn replace<K: StoredObject>(
        &self,
        namespace: &str,
        object: &K,
    ) -> Result<K, StoreError> {
        let name = object_name(object)?.to_string();
        let mut state = self.lock();
        Self::check_failure(&state, &name)?;

        let key = key::<K>(namespace, &name);
        let Some(current) = state.objects.get(&key).cloned() else {
            return Err(StoreError::NotFound {
                kind: K::kind(&()).to_string(),
                namespace: namespace.to_string(),
                name,
            });
        };

        let current_version = current["metadata"]["resourceVersion"].as_str();
        if object.resource_version().as_deref() != current_version {
            return Err(conflict::<K>(
                namespace,
                &name,
                "the object has been modified; please apply your changes to the latest version and try again",
            ));
        }

        state.next_version += 1;
        let generation = current["metadata"]["generation"].as_i64().unwrap_or(1);
        let mut value = serde_json::to_value(object)?;
        value["metadata"]["resourceVersion"] = Value::String(state.next_version.to_string());
        value["metadata"]["generation"] = Value::from(generation + 1);
        value["metadata"]["creationTimestamp"] = current["metadata"]["creationTimestamp"].clone();
        // Status is a subresource; a full replace leaves it alone
        match current.get("status") {
            Some(status) => value["status"] = status.clone(),
            None => {
                if let Some(map) = value.as_object_mut() {
                    map.remove("status");
                }
            }
        }

        state.objects.insert(key, value.clone());
        state.writes.push(WriteRecord {
            verb: "replace",
            kind: K::kind(&()).to_string(),
            name,
        });

        Ok(serde_json::from_value(value)?)
    }

    async fn list<K: StoredObject>(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<K>, StoreError> {
        let kind = K::kind(&()).to_string();
        let state = self.lock();
        state
            .objects
            .iter()
            .filter(|((k, ns, _), _)| *k == kind && ns == namespace)
            .filter(|(_, value)| label_selector.is_none_or(|s| labels_match(value, s)))
            .map(|(_, value)| serde_json::from_value(value.clone()).map_err(StoreError::from))
            .collect()
    }

    async fn patch_status<K: StoredObject>(
        &self,
        namespace: &str,
        name: &str,
        status: Value,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        Self::check_failure(&state, name)?;

        let key = key::<K>(namespace, name);
        state.next_version += 1;
        let version = state.next_version;
        let Some(current) = state.objects.get_mut(&key) else {
            return Err(StoreError::NotFound {
                kind: K::kind(&()).to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        };
        current["status"] = status;
        current["metadata"]["resourceVersion"] = Value::String(version.to_string());

        state.writes.push(WriteRecord {
            verb: "patch_status",
            kind: K::kind(&()).to_string(),
            name: name.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod memory_tests;
