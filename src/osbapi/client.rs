// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP client for the broker catalog endpoint.

use super::{Catalog, CatalogClient, CatalogError};
use crate::constants::{OSBAPI_CATALOG_PATH, OSBAPI_VERSION, OSBAPI_VERSION_HEADER};
use crate::credentials::BrokerCredentials;
use crate::crd::ServiceBroker;
use crate::metrics;
use crate::reconcilers::retry::{
    retry, transient_http_status, RetrySchedule, Retryable, BROKER_CATALOG,
};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use std::time::{Duration, Instant};
use tracing::{debug, error};
use url::Url;

/// Fetches catalogs over HTTP with basic auth.
///
/// # Retry Behavior
/// - Retries on HTTP 429, 500, 502, 503, 504 and on connection errors
/// - Fails immediately on other statuses and on undecodable bodies
/// - Initial retry after 50ms, growing to at most 10 seconds between attempts
#[derive(Clone)]
pub struct BrokerClient {
    http: HttpClient,
    schedule: RetrySchedule,
}

impl BrokerClient {
    /// Build a client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self::with_http_client(http))
    }

    /// Wrap an existing HTTP client.
    #[must_use]
    pub fn with_http_client(http: HttpClient) -> Self {
        Self {
            http,
            schedule: BROKER_CATALOG,
        }
    }

    /// Cap the total time spent retrying one catalog fetch.
    #[must_use]
    pub fn with_max_retry_elapsed(mut self, max: Option<Duration>) -> Self {
        self.schedule = self.schedule.with_budget(max);
        self
    }

    async fn fetch_once(
        &self,
        url: &Url,
        credentials: &BrokerCredentials,
    ) -> Result<Catalog, CatalogError> {
        let response = self
            .http
            .get(url.clone())
            .basic_auth(&credentials.username, Some(&credentials.password))
            .header(OSBAPI_VERSION_HEADER, OSBAPI_VERSION)
            .send()
            .await
            .map_err(|source| CatalogError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| CatalogError::Request {
                url: url.to_string(),
                source,
            })?;

        serde_json::from_slice(&body).map_err(|e| CatalogError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Build `{broker_url}/v2/catalog`, keeping any path prefix on the broker URL.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidUrl`] if `broker_url` is not an absolute URL.
pub fn catalog_url(broker_url: &str) -> Result<Url, CatalogError> {
    let raw = format!("{}{OSBAPI_CATALOG_PATH}", broker_url.trim_end_matches('/'));
    Url::parse(&raw).map_err(|e| CatalogError::InvalidUrl {
        url: broker_url.to_string(),
        reason: e.to_string(),
    })
}

impl Retryable for CatalogError {
    fn is_transient(&self) -> bool {
        match self {
            CatalogError::Status { status, .. } => transient_http_status(*status),
            CatalogError::Request { source, .. } => source.is_connect() || source.is_timeout(),
            CatalogError::InvalidUrl { .. } | CatalogError::Decode { .. } => false,
        }
    }
}

#[async_trait]
impl CatalogClient for BrokerClient {
    async fn get_catalog(
        &self,
        broker: &ServiceBroker,
        credentials: &BrokerCredentials,
    ) -> Result<Catalog, CatalogError> {
        let url = catalog_url(&broker.spec.url)?;
        let started = Instant::now();
        let operation = format!("GET {url}");

        match retry(self.schedule, &operation, || self.fetch_once(&url, credentials)).await {
            Ok(catalog) => {
                metrics::record_catalog_fetch("success", started.elapsed());
                debug!(
                    url = %url,
                    services = catalog.services.len(),
                    elapsed = ?started.elapsed(),
                    "Fetched broker catalog"
                );
                Ok(catalog)
            }
            Err(e) => {
                metrics::record_catalog_fetch("error", started.elapsed());
                error!(url = %url, error = %e, "Broker catalog request failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;
