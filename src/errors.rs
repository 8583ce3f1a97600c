// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation errors and their classification.
//!
//! Every failure of a broker reconcile is a [`ReconcileError`]. Each error maps to
//! an [`ErrorClass`], which decides how the controller retries it, and to a
//! condition reason, which is what users see on the broker's `Ready` condition.
//!
//! | Class          | Example                         | Controller action          |
//! |----------------|---------------------------------|----------------------------|
//! | `Transient`    | credentials secret not found    | requeue after secret delay |
//! | `Validation`   | credentials missing `password`  | wait for a change          |
//! | `Collaborator` | broker returned 500             | requeue after error delay  |
//! | `Conflict`     | stale `resourceVersion`         | requeue after short delay  |
//! | `Unclassified` | API server rejected a write     | requeue after error delay  |

use crate::credentials::CredentialsError;
use crate::osbapi::CatalogError;
use crate::status_reasons::{
    REASON_CREDENTIALS_SECRET_NOT_AVAILABLE, REASON_GET_CATALOG_FAILED,
    REASON_RECONCILE_CATALOG_FAILED, REASON_SECRET_INVALID, REASON_UNKNOWN,
};
use crate::store::StoreError;
use thiserror::Error;

/// How a reconcile failure should be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Expected to resolve on its own shortly.
    Transient,
    /// User input is invalid; retrying without a change is pointless.
    Validation,
    /// An external dependency (the broker) failed.
    Collaborator,
    /// Optimistic-concurrency clash.
    Conflict,
    /// Everything else.
    Unclassified,
}

impl ErrorClass {
    /// Label value used in metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Transient => "transient",
            ErrorClass::Validation => "validation",
            ErrorClass::Collaborator => "collaborator",
            ErrorClass::Conflict => "conflict",
            ErrorClass::Unclassified => "unclassified",
        }
    }
}

/// Failure while walking the catalog, naming the entry that failed.
#[derive(Error, Debug)]
pub enum CatalogReconcileError {
    #[error("failed to reconcile service offering {service_id:?}: {source}")]
    Offering {
        service_id: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to reconcile service plan {plan_id:?} for service offering {service_id:?}: {source}")]
    Plan {
        plan_id: String,
        service_id: String,
        #[source]
        source: StoreError,
    },
}

impl CatalogReconcileError {
    fn store_error(&self) -> &StoreError {
        match self {
            CatalogReconcileError::Offering { source, .. }
            | CatalogReconcileError::Plan { source, .. } => source,
        }
    }
}

/// Errors returned by the broker reconciler.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The broker has no namespace.
    #[error("ServiceBroker {name} has no namespace")]
    MissingNamespace { name: String },

    /// The referenced credentials secret does not exist (yet).
    #[error("credentials secret {namespace}/{name} not found")]
    CredentialsSecretNotFound { namespace: String, name: String },

    /// The credentials secret could not be read.
    #[error("failed to get credentials secret {namespace}/{name}: {source}")]
    CredentialsSecretFetch {
        namespace: String,
        name: String,
        #[source]
        source: StoreError,
    },

    /// The credentials secret exists but is unusable.
    #[error(transparent)]
    InvalidCredentials(#[from] CredentialsError),

    /// The broker catalog could not be fetched.
    #[error("failed to get catalog from broker {broker:?}: {source}")]
    GetCatalog {
        broker: String,
        #[source]
        source: CatalogError,
    },

    /// Writing offerings or plans failed part way.
    #[error("failed to reconcile catalog: {0}")]
    ReconcileCatalog(#[source] CatalogReconcileError),

    /// Writing the broker status failed.
    #[error("failed to update ServiceBroker status: {0}")]
    Status(#[source] StoreError),
}

impl ReconcileError {
    /// Retry class of this error.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            ReconcileError::CredentialsSecretNotFound { .. } => ErrorClass::Transient,
            ReconcileError::InvalidCredentials(_) => ErrorClass::Validation,
            ReconcileError::GetCatalog { .. } => ErrorClass::Collaborator,
            ReconcileError::ReconcileCatalog(e) if e.store_error().is_conflict() => {
                ErrorClass::Conflict
            }
            ReconcileError::Status(e) if e.is_conflict() => ErrorClass::Conflict,
            _ => ErrorClass::Unclassified,
        }
    }

    /// Reason written to the broker's `Ready` condition for this error.
    #[must_use]
    pub fn condition_reason(&self) -> &'static str {
        match self {
            ReconcileError::CredentialsSecretNotFound { .. }
            | ReconcileError::CredentialsSecretFetch { .. } => {
                REASON_CREDENTIALS_SECRET_NOT_AVAILABLE
            }
            ReconcileError::InvalidCredentials(_) => REASON_SECRET_INVALID,
            ReconcileError::GetCatalog { .. } => REASON_GET_CATALOG_FAILED,
            ReconcileError::ReconcileCatalog(_) => REASON_RECONCILE_CATALOG_FAILED,
            ReconcileError::MissingNamespace { .. } | ReconcileError::Status(_) => REASON_UNKNOWN,
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
