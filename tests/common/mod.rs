// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use k8s_openapi::api::core::v1::{Namespace, Secret};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::api::{Api, DeleteParams, PostParams};
use kube::client::Client;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

pub const CRD_NAMES: [&str; 3] = [
    "servicebrokers.services.catalogsync.io",
    "serviceofferings.services.catalogsync.io",
    "serviceplans.services.catalogsync.io",
];

/// Get a Kubernetes client or skip the test if no cluster is reachable
pub async fn get_kube_client_or_skip() -> Option<Client> {
    let client = match Client::try_default().await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("⊘ Skipping integration test: no Kubernetes cluster: {e}");
            return None;
        }
    };

    if let Err(e) = client.apiserver_version().await {
        eprintln!("⊘ Skipping integration test: API server unreachable: {e}");
        return None;
    }

    println!("✓ Successfully connected to Kubernetes cluster");
    Some(client)
}

/// Whether all catalogsync CRDs are installed
pub async fn crds_installed(client: &Client) -> bool {
    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    for name in CRD_NAMES {
        match crds.get_opt(name).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                eprintln!("⊘ CRD {name} is not installed (run `cargo run --bin crdgen`)");
                return false;
            }
            Err(e) => {
                eprintln!("⊘ Failed to look up CRD {name}: {e}");
                return false;
            }
        }
    }
    true
}

/// Create a test namespace
pub async fn create_test_namespace(
    client: &Client,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    let mut labels = BTreeMap::new();
    labels.insert("test".to_string(), "integration".to_string());
    labels.insert("managed-by".to_string(), "catalogsync-test".to_string());

    let ns = Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        ..Default::default()
    };

    match namespaces.create(&PostParams::default(), &ns).await {
        Ok(_) => {
            println!("✓ Created test namespace: {name}");
            Ok(())
        }
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            println!("  Test namespace already exists: {name}");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

/// Delete a test namespace, ignoring errors
pub async fn delete_test_namespace(client: &Client, name: &str) {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    match namespaces.delete(name, &DeleteParams::default()).await {
        Ok(_) => println!("✓ Deleted test namespace: {name}"),
        Err(e) => eprintln!("  Failed to delete test namespace {name}: {e}"),
    }
}

/// Create a broker credentials secret
pub async fn create_credentials_secret(
    client: &Client,
    namespace: &str,
    name: &str,
    credentials: &serde_json::Value,
) -> Result<Secret, kube::Error> {
    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);

    let mut data = BTreeMap::new();
    data.insert(
        "credentials".to_string(),
        ByteString(credentials.to_string().into_bytes()),
    );
    let secret = Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        data: Some(data),
        ..Default::default()
    };

    secrets.create(&PostParams::default(), &secret).await
}

/// Poll `check` until it returns `Some` or `timeout` passes
pub async fn wait_for<T, F, Fut>(timeout: Duration, mut check: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some(value) = check().await {
            return Some(value);
        }
        if tokio::time::Instant::now() >= deadline {
            return None;
        }
        sleep(Duration::from_secs(1)).await;
    }
}
