// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Storage seam between the reconcilers and the Kubernetes API.
//!
//! Reconcilers never talk to [`kube::Api`] directly. They go through an
//! [`ObjectStore`], which exposes the handful of verbs the catalog loop needs:
//!
//! - `get` - read an object, `None` when it does not exist
//! - `create` - create an object, [`StoreError::Conflict`] if the name is taken
//! - `replace` - full update guarded by `metadata.resourceVersion`
//! - `list` - list objects in a namespace, optionally filtered by label
//! - `patch_status` - merge-patch the status subresource
//!
//! [`KubeStore`] is the production implementation. Tests use the in-memory store
//! in `memory`, which applies the same optimistic-concurrency rules.

pub mod kube_store;

#[cfg(test)]
pub mod memory;

pub use kube_store::KubeStore;

use async_trait::async_trait;
use kube::core::NamespaceResourceScope;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use thiserror::Error;

/// Bound shared by every object type the store can hold.
pub trait StoredObject:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<T> StoredObject for T where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Errors returned by an [`ObjectStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// The object does not exist.
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    /// Optimistic-concurrency clash: the object changed since it was read, or a
    /// create raced another writer. Retrying the whole read-modify-write resolves it.
    #[error("conflict writing {kind} {namespace}/{name}: {message}")]
    Conflict {
        kind: String,
        namespace: String,
        name: String,
        message: String,
    },

    /// The object has no `metadata.name`.
    #[error("{kind} must have a name")]
    MissingName { kind: String },

    /// The object could not be converted to or from JSON.
    #[error("failed to serialize object: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other Kubernetes API failure.
    #[error("kubernetes API error: {0}")]
    Api(#[source] kube::Error),

    /// Failure reported by a non-Kubernetes backend.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether this error is an optimistic-concurrency conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    /// Whether this error means the object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Typed access to namespaced objects.
///
/// Implementations must reject a `replace` whose `metadata.resourceVersion` does not
/// match the stored object with [`StoreError::Conflict`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object by name, `Ok(None)` if it does not exist.
    async fn get<K: StoredObject>(&self, namespace: &str, name: &str)
        -> Result<Option<K>, StoreError>;

    /// Create a new object.
    async fn create<K: StoredObject>(&self, namespace: &str, object: &K) -> Result<K, StoreError>;

    /// Replace an existing object, guarded by its `resourceVersion`.
    async fn replace<K: StoredObject>(&self, namespace: &str, object: &K)
        -> Result<K, StoreError>;

    /// List objects in a namespace. `label_selector` uses the Kubernetes selector syntax.
    async fn list<K: StoredObject>(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<K>, StoreError>;

    /// Merge-patch the status subresource of an object.
    async fn patch_status<K: StoredObject>(
        &self,
        namespace: &str,
        name: &str,
        status: serde_json::Value,
    ) -> Result<(), StoreError>;
}

/// Name of an object, or [`StoreError::MissingName`].
///
/// # Errors
///
/// Returns an error if `metadata.name` is unset.
pub fn object_name<K: StoredObject>(object: &K) -> Result<&str, StoreError> {
    object
        .meta()
        .name
        .as_deref()
        .ok_or_else(|| StoreError::MissingName {
            kind: K::kind(&()).to_string(),
        })
}
