// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Create-or-update helper for controller-owned objects.
//!
//! [`create_or_patch`] reads the target object, lets the caller mutate it into the
//! desired state, and writes it back only if something changed:
//!
//! - object absent: the mutation runs on an empty object, which is then created
//! - object present and the mutation changes it: it is replaced, carrying the
//!   `resourceVersion` that was read, so a concurrent write surfaces as
//!   [`StoreError::Conflict`] instead of being overwritten
//! - object present and unchanged: nothing is written
//!
//! # Example
//!
//! ```rust,no_run
//! use catalogsync::crd::ServiceOffering;
//! use catalogsync::reconcilers::upsert::create_or_patch;
//! use catalogsync::store::ObjectStore;
//!
//! async fn example(store: &impl ObjectStore) -> Result<(), catalogsync::store::StoreError> {
//!     let (_offering, outcome) = create_or_patch::<_, ServiceOffering, _>(
//!         store,
//!         "cf",
//!         "3c0b2a36-0f0b-5b6e-9f3c-1f2a7d5e9c11",
//!         |offering| offering.spec.name = "postgres".to_string(),
//!     )
//!     .await?;
//!     println!("{outcome:?}");
//!     Ok(())
//! }
//! ```

use crate::metrics;
use crate::store::{ObjectStore, StoreError, StoredObject};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// What [`create_or_patch`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Create the object `namespace/name` or bring it in line with `mutate`.
///
/// `mutate` receives the stored object (or `K::default()` when absent) and must set
/// the desired state on it. The name and namespace are reset after `mutate` runs.
/// At most one write is made.
///
/// # Errors
///
/// Returns [`StoreError::Conflict`] if another writer changed or created the object
/// since it was read, or any other store error.
pub async fn create_or_patch<S, K, F>(
    store: &S,
    namespace: &str,
    name: &str,
    mutate: F,
) -> Result<(K, UpsertOutcome), StoreError>
where
    S: ObjectStore + ?Sized,
    K: StoredObject + Default,
    F: FnOnce(&mut K),
{
    let kind = K::kind(&());
    let current: Option<K> = store.get(namespace, name).await?;

    let Some(current) = current else {
        let mut desired = K::default();
        mutate(&mut desired);
        set_identity(&mut desired, namespace, name);

        info!(kind = %kind, namespace, name, "Creating resource");
        let created = store.create(namespace, &desired).await?;
        metrics::record_object_written(&kind, "created");
        return Ok((created, UpsertOutcome::Created));
    };

    let mut desired = current.clone();
    mutate(&mut desired);
    set_identity(&mut desired, namespace, name);

    if serde_json::to_value(&current)? == serde_json::to_value(&desired)? {
        debug!(kind = %kind, namespace, name, "Resource up to date");
        return Ok((current, UpsertOutcome::Unchanged));
    }

    info!(kind = %kind, namespace, name, "Updating resource");
    let updated = store.replace(namespace, &desired).await?;
    metrics::record_object_written(&kind, "updated");
    Ok((updated, UpsertOutcome::Updated))
}

fn set_identity<K: StoredObject>(object: &mut K, namespace: &str, name: &str) {
    let meta = object.meta_mut();
    meta.name = Some(name.to_string());
    meta.namespace = Some(namespace.to_string());
}

/// Set one label, creating the label map if needed.
pub fn set_label<K: StoredObject>(object: &mut K, key: &str, value: &str) {
    object
        .meta_mut()
        .labels
        .get_or_insert_with(BTreeMap::new)
        .insert(key.to_string(), value.to_string());
}

#[cfg(test)]
#[path = "upsert_tests.rs"]
mod upsert_tests;
