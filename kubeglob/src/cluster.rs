#![doc = "Kubernetes API client: the real `ResourceCreator` behind the CLI."]
//
//! # Cluster client (CLI <-> Core)
//!
//! This module bridges the core's [`ResourceCreator`] trait to a Kubernetes API
//! server. It is constructed once from a resolved kubeconfig context and borrowed
//! by the pipeline for the whole run.
//!
//! ## Request flow
//! - The document's `apiVersion` and `kind` are mapped to a REST resource through
//!   API discovery (`/api/v1` or `/apis/<group>/<version>`). Each group-version is
//!   fetched once and cached for the lifetime of the client.
//! - Namespaced kinds are POSTed to `.../namespaces/<ns>/<plural>`, cluster-scoped
//!   kinds to `.../<plural>` with `metadata.namespace` stripped from the body.
//! - Non-2xx replies are decoded as a `Status` object when the server sends one.
//!
//! One request per document; nothing is retried here.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::{Certificate, Identity, RequestBuilder, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use kubeglob_core::contract::{ResourceCreator, StoreError};
use kubeglob_core::document::ResourceDocument;

use crate::load_config::{ClusterConfig, Credentials};

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("document has no apiVersion")]
    MissingApiVersion,

    #[error("document has no kind")]
    MissingKind,

    #[error("kind {kind:?} is not served by {api_version}")]
    UnknownKind { api_version: String, kind: String },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("discovery of {api_version} failed: HTTP {status}")]
    Discovery { api_version: String, status: StatusCode },

    #[error("{message} (reason: {reason}, code: {code})")]
    Api {
        code: u16,
        reason: String,
        message: String,
    },
}

/// One entry of an `APIResourceList`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiResource {
    /// Plural resource name used in the URL, e.g. `deployments`.
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub namespaced: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResourceList {
    #[serde(default)]
    resources: Vec<ApiResource>,
}

#[derive(Debug, Default, Deserialize)]
struct Status {
    #[serde(default)]
    message: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    code: u16,
}

pub struct ClusterClient {
    http: reqwest::Client,
    server: String,
    credentials: Credentials,
    discovery: Mutex<HashMap<String, Vec<ApiResource>>>,
}

impl ClusterClient {
    pub fn new(config: &ClusterConfig) -> Result<Self, ClusterError> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .user_agent(concat!("kubeglob/", env!("CARGO_PKG_VERSION")));

        if let Some(pem) = &config.certificate_authority {
            for cert in Certificate::from_pem_bundle(pem).map_err(ClusterError::Client)? {
                builder = builder.add_root_certificate(cert);
            }
        }
        if let Some(pem) = &config.client_identity {
            builder = builder.identity(Identity::from_pem(pem).map_err(ClusterError::Client)?);
        }
        if config.insecure_skip_tls_verify {
            tracing::warn!(server = %config.server, "TLS verification disabled for cluster");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().map_err(ClusterError::Client)?;
        tracing::info!(
            context = %config.context,
            server = %config.server,
            "Initialized ClusterClient from kubeconfig"
        );
        Ok(Self {
            http,
            server: config.server.clone(),
            credentials: config.credentials.clone(),
            discovery: Mutex::new(HashMap::new()),
        })
    }

    /// Create `document` on the server. The caller is expected to have defaulted
    /// the namespace already.
    pub async fn create_resource(&self, document: &ResourceDocument) -> Result<(), ClusterError> {
        let api_version = document.api_version().ok_or(ClusterError::MissingApiVersion)?;
        let kind = document.kind().ok_or(ClusterError::MissingKind)?;
        let resource = self.resolve(api_version, kind).await?;

        let mut body = document.clone();
        let path = if resource.namespaced {
            resource_path(api_version, &resource, document.namespace())
        } else {
            body.clear_namespace();
            resource_path(api_version, &resource, None)
        };
        let url = format!("{}{}", self.server, path);

        tracing::info!(
            url = %url,
            kind,
            name = document.name().unwrap_or(""),
            "Creating resource"
        );
        let response = self
            .authorize(self.http.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|source| ClusterError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(url = %url, status = %status, "Resource created");
            return Ok(());
        }

        let bytes = response.bytes().await.map_err(|source| {
            tracing::error!(url = %url, status = %status, error = %source, "Failed to read error body");
            ClusterError::Http {
                url: url.clone(),
                source,
            }
        })?;
        let err = api_error(status, &bytes);
        tracing::error!(url = %url, error = %err, "API server rejected create");
        Err(err)
    }

    async fn resolve(&self, api_version: &str, kind: &str) -> Result<ApiResource, ClusterError> {
        let resources = self.discover(api_version).await?;
        resources
            .into_iter()
            .find(|r| r.kind == kind && !r.name.contains('/'))
            .ok_or_else(|| ClusterError::UnknownKind {
                api_version: api_version.to_string(),
                kind: kind.to_string(),
            })
    }

    async fn discover(&self, api_version: &str) -> Result<Vec<ApiResource>, ClusterError> {
        if let Some(cached) = self.cached(api_version) {
            return Ok(cached);
        }

        let url = format!("{}{}", self.server, group_version_path(api_version));
        tracing::debug!(url = %url, "Discovering API resources");
        let response = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .map_err(|source| ClusterError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(url = %url, status = %status, "Discovery request failed");
            return Err(ClusterError::Discovery {
                api_version: api_version.to_string(),
                status,
            });
        }
        let list: ApiResourceList = response
            .json()
            .await
            .map_err(|source| ClusterError::Http { url, source })?;

        if let Ok(mut cache) = self.discovery.lock() {
            cache.insert(api_version.to_string(), list.resources.clone());
        }
        Ok(list.resources)
    }

    fn cached(&self, api_version: &str) -> Option<Vec<ApiResource>> {
        self.discovery.lock().ok()?.get(api_version).cloned()
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Credentials::None => request,
            Credentials::Bearer(token) => request.bearer_auth(token),
            Credentials::Basic { username, password } => request.basic_auth(username, password.as_ref()),
        }
    }
}

#[async_trait]
impl ResourceCreator for ClusterClient {
    async fn create(&self, document: &ResourceDocument) -> Result<(), StoreError> {
        self.create_resource(document).await.map_err(Into::into)
    }
}

/// `/api/v1` for the core group, `/apis/<group>/<version>` otherwise.
pub fn group_version_path(api_version: &str) -> String {
    if api_version.contains('/') {
        format!("/apis/{api_version}")
    } else {
        format!("/api/{api_version}")
    }
}

/// Collection URL path for creating `resource`, scoped to `namespace` when given.
pub fn resource_path(api_version: &str, resource: &ApiResource, namespace: Option<&str>) -> String {
    let prefix = group_version_path(api_version);
    match namespace {
        Some(ns) => format!("{prefix}/namespaces/{ns}/{}", resource.name),
        None => format!("{prefix}/{}", resource.name),
    }
}

fn api_error(status: StatusCode, body: &[u8]) -> ClusterError {
    let parsed: Status = serde_json::from_slice(body).unwrap_or_default();
    let message = if parsed.message.is_empty() {
        String::from_utf8_lossy(body).trim().to_string()
    } else {
        parsed.message
    };
    let reason = if parsed.reason.is_empty() {
        status.canonical_reason().unwrap_or("Unknown").to_string()
    } else {
        parsed.reason
    };
    ClusterError::Api {
        code: if parsed.code == 0 { status.as_u16() } else { parsed.code },
        reason,
        message,
    }
}
