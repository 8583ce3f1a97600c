// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! [`ObjectStore`] backed by the Kubernetes API server.

use super::{object_name, ObjectStore, StoreError, StoredObject};
use crate::reconcilers::retry::{retry, KUBE_API};
use async_trait::async_trait;
use kube::api::{ListParams, Patch, PatchParams, PostParams};
use kube::{Api, Client};
use tracing::debug;

/// Store that reads and writes through a [`kube::Client`].
///
/// Reads are retried on transient API errors. Writes are not: a failed write ends
/// the reconcile and the controller requeues it with a fresh read.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    field_manager: String,
}

impl KubeStore {
    /// Create a store that identifies its writes with `field_manager`.
    #[must_use]
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    fn api<K: StoredObject>(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn post_params(&self) -> PostParams {
        PostParams {
            field_manager: Some(self.field_manager.clone()),
            ..Default::default()
        }
    }
}

/// Translate a [`kube::Error`] into a [`StoreError`] for the given object.
pub(crate) fn map_kube_error<K: StoredObject>(
    err: kube::Error,
    namespace: &str,
    name: &str,
) -> StoreError {
    match err {
        kube::Error::Api(ref response) if response.code == 404 => StoreError::NotFound {
            kind: K::kind(&()).to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        kube::Error::Api(ref response) if response.code == 409 => StoreError::Conflict {
            kind: K::kind(&()).to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            message: response.message.clone(),
        },
        other => StoreError::Api(other),
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get<K: StoredObject>(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<K>, StoreError> {
        let api = self.api::<K>(namespace);
        let operation = format!("get {} {namespace}/{name}", K::kind(&()));

        retry(KUBE_API, &operation, || api.get_opt(name))
            .await
            .map_err(|e| map_kube_error::<K>(e, namespace, name))
    }

    async fn create<K: StoredObject>(&self, namespace: &str, object: &K) -> Result<K, StoreError> {
        let name = object_name(object)?;
        debug!(kind = %K::kind(&()), namespace, name, "Creating object");

        self.api::<K>(namespace)
            .create(&self.post_params(), object)
            .await
            .map_err(|e| map_kube_error::<K>(e, namespace, name))
    }

    async fn replace<K: StoredObject>(
        &self,
        namespace: &str,
        object: &K,
    ) -> Result<K, StoreError> {
        let name = object_name(object)?;
        debug!(kind = %K::kind(&()), namespace, name, "Replacing object");

        self.api::<K>(namespace)
            .replace(name, &self.post_params(), object)
            .await
            .map_err(|e| map_kube_error::<K>(e, namespace, name))
    }

    async fn list<K: StoredObject>(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<K>, StoreError> {
        let api = self.api::<K>(namespace);
        let params = match label_selector {
            Some(selector) => ListParams::default().labels(selector),
            None => ListParams::default(),
        };
        let operation = format!("list {} in {namespace}", K::kind(&()));

        let list = retry(KUBE_API, &operation, || api.list(&params))
            .await
            .map_err(|e| map_kube_error::<K>(e, namespace, ""))?;

        Ok(list.items)
    }

    async fn patch_status<K: StoredObject>(
        &self,
        namespace: &str,
        name: &str,
        status: serde_json::Value,
    ) -> Result<(), StoreError> {
        let patch = serde_json::json!({ "status": status });

        self.api::<K>(namespace)
            .patch_status(
                name,
                &PatchParams {
                    field_manager: Some(self.field_manager.clone()),
                    ..Default::default()
                },
                &Patch::Merge(&patch),
            )
            .await
            .map_err(|e| map_kube_error::<K>(e, namespace, name))?;

        Ok(())
    }
}

#[cfg(test)]
#[path = "kube_store_tests.rs"]
mod kube_store_tests;
