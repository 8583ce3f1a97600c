// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Operator configuration.
//!
//! Every option is a command-line flag that can also be set through an
//! environment variable:
//!
//! | Variable                | Default                  |
//! |-------------------------|--------------------------|
//! | `WATCH_NAMESPACE`       | all namespaces           |
//! | `ROOT_NAMESPACE`        | `cf`                     |
//! | `METRICS_BIND_ADDRESS`  | `0.0.0.0:8080`           |
//! | `API_BASE_URL`          | `http://localhost:8080`  |
//! | `SECRET_REQUEUE_SECS`   | `2`                      |
//! | `CONFLICT_REQUEUE_SECS` | `1`                      |
//! | `ERROR_REQUEUE_SECS`    | `30`                     |
//! | `RESYNC_INTERVAL_SECS`  | `300`                    |
//! | `CATALOG_TIMEOUT_SECS`  | `30`                     |
//! | `FIELD_MANAGER`         | `catalogsync-controller` |

use crate::constants::{
    CONFLICT_REQUEUE_DURATION_SECS, DEFAULT_API_BASE_URL, DEFAULT_CATALOG_TIMEOUT_SECS,
    DEFAULT_FIELD_MANAGER, DEFAULT_ROOT_NAMESPACE, ERROR_REQUEUE_DURATION_SECS,
    METRICS_SERVER_BIND_ADDRESS, RESYNC_INTERVAL_SECS, SECRET_NOT_AVAILABLE_REQUEUE_SECS,
};
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Invalid configuration values.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid API base URL {url:?}: {reason}")]
    InvalidApiBaseUrl { url: String, reason: String },

    #[error("{name} must be greater than zero")]
    ZeroDuration { name: &'static str },

    #[error("field manager must not be empty")]
    EmptyFieldManager,
}

/// Command-line and environment configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "catalogsync", version, about = "Service broker catalog operator")]
pub struct OperatorConfig {
    /// Namespace to watch for brokers. All namespaces when unset.
    #[arg(long, env = "WATCH_NAMESPACE")]
    pub watch_namespace: Option<String>,

    /// Namespace the service plan API lists plans from.
    #[arg(long, env = "ROOT_NAMESPACE", default_value = DEFAULT_ROOT_NAMESPACE)]
    pub root_namespace: String,

    /// Address of the metrics and API server.
    #[arg(long, env = "METRICS_BIND_ADDRESS", default_value = METRICS_SERVER_BIND_ADDRESS)]
    pub metrics_bind_address: SocketAddr,

    /// External base URL used to build links in API responses.
    #[arg(long, env = "API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// Delay before retrying a broker whose credentials secret does not exist.
    #[arg(long, env = "SECRET_REQUEUE_SECS", default_value_t = SECRET_NOT_AVAILABLE_REQUEUE_SECS)]
    pub secret_requeue_secs: u64,

    /// Delay before retrying after a write conflict.
    #[arg(long, env = "CONFLICT_REQUEUE_SECS", default_value_t = CONFLICT_REQUEUE_DURATION_SECS)]
    pub conflict_requeue_secs: u64,

    /// Delay before retrying after any other failure.
    #[arg(long, env = "ERROR_REQUEUE_SECS", default_value_t = ERROR_REQUEUE_DURATION_SECS)]
    pub error_requeue_secs: u64,

    /// Interval at which ready brokers are re-read.
    #[arg(long, env = "RESYNC_INTERVAL_SECS", default_value_t = RESYNC_INTERVAL_SECS)]
    pub resync_interval_secs: u64,

    /// Timeout of a single catalog request.
    #[arg(long, env = "CATALOG_TIMEOUT_SECS", default_value_t = DEFAULT_CATALOG_TIMEOUT_SECS)]
    pub catalog_timeout_secs: u64,

    /// Field manager recorded on every write.
    #[arg(long, env = "FIELD_MANAGER", default_value = DEFAULT_FIELD_MANAGER)]
    pub field_manager: String,
}

/// Requeue timings used by the broker controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileSettings {
    pub secret_requeue: Duration,
    pub conflict_requeue: Duration,
    pub error_requeue: Duration,
    pub resync_interval: Duration,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            secret_requeue: Duration::from_secs(SECRET_NOT_AVAILABLE_REQUEUE_SECS),
            conflict_requeue: Duration::from_secs(CONFLICT_REQUEUE_DURATION_SECS),
            error_requeue: Duration::from_secs(ERROR_REQUEUE_DURATION_SECS),
            resync_interval: Duration::from_secs(RESYNC_INTERVAL_SECS),
        }
    }
}

impl OperatorConfig {
    /// Check values clap cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = Url::parse(&self.api_base_url).map_err(|e| ConfigError::InvalidApiBaseUrl {
            url: self.api_base_url.clone(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ConfigError::InvalidApiBaseUrl {
                url: self.api_base_url.clone(),
                reason: "not a base URL".to_string(),
            });
        }

        for (name, value) in [
            ("secret-requeue-secs", self.secret_requeue_secs),
            ("conflict-requeue-secs", self.conflict_requeue_secs),
            ("error-requeue-secs", self.error_requeue_secs),
            ("resync-interval-secs", self.resync_interval_secs),
            ("catalog-timeout-secs", self.catalog_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDuration { name });
            }
        }

        if self.field_manager.trim().is_empty() {
            return Err(ConfigError::EmptyFieldManager);
        }

        Ok(())
    }

    #[must_use]
    pub fn reconcile_settings(&self) -> ReconcileSettings {
        ReconcileSettings {
            secret_requeue: Duration::from_secs(self.secret_requeue_secs),
            conflict_requeue: Duration::from_secs(self.conflict_requeue_secs),
            error_requeue: Duration::from_secs(self.error_requeue_secs),
            resync_interval: Duration::from_secs(self.resync_interval_secs),
        }
    }

    #[must_use]
    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
