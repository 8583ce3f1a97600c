// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the catalog sync operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for all catalog CRDs
pub const API_GROUP: &str = "services.catalogsync.io";

/// API version for all catalog CRDs
pub const API_VERSION: &str = "v1alpha1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "services.catalogsync.io/v1alpha1";

/// Kind name for `ServiceBroker` resource
pub const KIND_SERVICE_BROKER: &str = "ServiceBroker";

/// Kind name for `ServiceOffering` resource
pub const KIND_SERVICE_OFFERING: &str = "ServiceOffering";

/// Kind name for `ServicePlan` resource
pub const KIND_SERVICE_PLAN: &str = "ServicePlan";

// ============================================================================
// Broker Credentials Constants
// ============================================================================

/// Key in the credentials secret `data` map holding the JSON credentials object
pub const CREDENTIALS_SECRET_KEY: &str = "credentials";

/// Required identity field inside the credentials object
pub const USERNAME_CREDENTIALS_KEY: &str = "username";

/// Required secret field inside the credentials object
pub const PASSWORD_CREDENTIALS_KEY: &str = "password";

// ============================================================================
// Open Service Broker API Constants
// ============================================================================

/// Catalog endpoint path, relative to the broker URL
pub const OSBAPI_CATALOG_PATH: &str = "/v2/catalog";

/// Header carrying the broker API version
pub const OSBAPI_VERSION_HEADER: &str = "X-Broker-API-Version";

/// Broker API version sent with every request
pub const OSBAPI_VERSION: &str = "2.17";

/// Default timeout for a single catalog request (30 seconds)
pub const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 30;

/// Catalog metadata key copied into the offering's documentation URL
pub const DOCUMENTATION_URL_METADATA_KEY: &str = "documentationUrl";

// ============================================================================
// Controller Requeue Constants
// ============================================================================

/// Requeue delay while the credentials secret does not exist yet (2 seconds)
pub const SECRET_NOT_AVAILABLE_REQUEUE_SECS: u64 = 2;

/// Requeue delay after an optimistic-concurrency conflict (1 second)
pub const CONFLICT_REQUEUE_DURATION_SECS: u64 = 1;

/// Requeue duration for controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Requeue interval for brokers whose catalog synced (5 minutes)
pub const RESYNC_INTERVAL_SECS: u64 = 300;

/// Field manager recorded on objects written by the controller
pub const DEFAULT_FIELD_MANAGER: &str = "catalogsync-controller";

/// Namespace the public plan listing is scoped to
pub const DEFAULT_ROOT_NAMESPACE: &str = "cf";

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Path for the liveness endpoint served next to metrics
pub const HEALTH_SERVER_PATH: &str = "/healthz";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Path of the service plan listing
pub const SERVICE_PLANS_PATH: &str = "/v3/service_plans";

/// Path of the service offering resources, used in links
pub const SERVICE_OFFERINGS_PATH: &str = "/v3/service_offerings";

/// External base URL used in API links when none is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
