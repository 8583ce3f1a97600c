// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared fixtures for reconciler and controller tests.

use crate::config::ReconcileSettings;
use crate::context::Context;
use crate::credentials::BrokerCredentials;
use crate::crd::{SecretReference, ServiceBroker, ServiceBrokerSpec};
use crate::osbapi::{Catalog, CatalogClient, CatalogError};
use crate::store::memory::MemoryStore;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const NAMESPACE: &str = "cf";
pub const BROKER: &str = "my-broker";
pub const SECRET: &str = "my-broker-creds";

enum Reply {
    Catalog(Catalog),
    Status(u16),
}

/// Canned [`CatalogClient`] that counts calls and remembers the last credentials.
pub struct StubCatalog {
    reply: Mutex<Reply>,
    calls: AtomicUsize,
    last_credentials: Mutex<Option<BrokerCredentials>>,
}

impl StubCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            reply: Mutex::new(Reply::Catalog(catalog)),
            calls: AtomicUsize::new(0),
            last_credentials: Mutex::new(None),
        }
    }

    pub fn set_catalog(&self, catalog: Catalog) {
        *self.reply.lock().unwrap() = Reply::Catalog(catalog);
    }

    /// Answer every following call with this HTTP status.
    pub fn fail_with(&self, status: u16) {
        *self.reply.lock().unwrap() = Reply::Status(status);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_credentials(&self) -> Option<BrokerCredentials> {
        self.last_credentials.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogClient for StubCatalog {
    async fn get_catalog(
        &self,
        broker: &ServiceBroker,
        credentials: &BrokerCredentials,
    ) -> Result<Catalog, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_credentials.lock().unwrap() = Some(credentials.clone());

        match &*self.reply.lock().unwrap() {
            Reply::Catalog(catalog) => Ok(catalog.clone()),
            Reply::Status(status) => Err(CatalogError::Status {
                url: format!("{}/v2/catalog", broker.spec.url),
                status: *status,
                body: "broker unavailable".to_string(),
            }),
        }
    }
}

pub type TestContext = Context<MemoryStore, StubCatalog>;

pub fn context(catalog: Catalog) -> TestContext {
    Context::new(
        MemoryStore::new(),
        StubCatalog::new(catalog),
        ReconcileSettings::default(),
    )
}

pub fn broker(name: &str, secret: &str) -> ServiceBroker {
    let mut broker = ServiceBroker::new(
        name,
        ServiceBrokerSpec {
            name: format!("{name} display"),
            url: "https://broker.example.com".to_string(),
            credentials: SecretReference {
                name: secret.to_string(),
            },
        },
    );
    broker.metadata.namespace = Some(NAMESPACE.to_string());
    broker.metadata.generation = Some(3);
    broker
}

pub fn secret_with(name: &str, credentials: &serde_json::Value) -> Secret {
    let mut data = BTreeMap::new();
    data.insert(
        "credentials".to_string(),
        ByteString(credentials.to_string().into_bytes()),
    );
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            ..Default::default()
        },
        data: Some(data),
        ..Default::default()
    }
}

pub fn valid_secret(name: &str) -> Secret {
    secret_with(name, &json!({"username": "broker-user", "password": "broker-pass"}))
}

/// Catalog with the given services, each with `plans_per_service` plans.
///
/// Service ids are `svc-<n>`, plan ids `svc-<n>-plan-<m>`, both counting from 1.
pub fn catalog(services: usize, plans_per_service: usize) -> Catalog {
    let services: Vec<serde_json::Value> = (1..=services)
        .map(|s| {
            let plans: Vec<serde_json::Value> = (1..=plans_per_service)
                .map(|p| {
                    json!({
                        "id": format!("svc-{s}-plan-{p}"),
                        "name": format!("plan-{p}"),
                        "description": format!("plan {p} of service {s}"),
                        "free": p == 1,
                        "bindable": true,
                        "metadata": {"bullets": ["fast"]},
                        "schemas": {
                            "service_instance": {
                                "create": {"parameters": {"type": "object"}}
                            }
                        }
                    })
                })
                .collect();
            json!({
                "id": format!("svc-{s}"),
                "name": format!("service-{s}"),
                "description": format!("service {s}"),
                "tags": ["sql"],
                "bindable": true,
                "metadata": {"documentationUrl": format!("https://docs.example.com/{s}")},
                "plans": plans
            })
        })
        .collect();

    serde_json::from_value(json!({ "services": services })).unwrap()
}
