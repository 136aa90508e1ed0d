//! High-level pipeline: locate → read → decode → default → create.
//!
//! [`apply`] is the run entrypoint. It locates every matching file once, then
//! feeds the paths one at a time through [`submit`]. Each file is fully handled
//! before the next one is opened; documents are never shared between iterations.
//!
//! # Failure handling
//! With [`FailurePolicy::FailFast`] (the default) the first read, decode or create
//! error ends the run and is returned as-is. With [`FailurePolicy::Continue`] the
//! error is logged, recorded in [`ApplyReport::failed`] and the loop moves on.
//! Pattern and walk errors always end the run: there is nothing to continue with.
//!
//! # Dry runs
//! In dry-run mode every step runs except the create call, so malformed files are
//! still reported while the store is never contacted.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::config::{ApplyConfig, FailurePolicy};
use crate::contract::ResourceCreator;
use crate::document::{ResourceDocument, DEFAULT_NAMESPACE};
use crate::error::{ApplyError, ApplyResult};
use crate::locate::locate;

/// Identity of a document that went through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedResource {
    pub path: PathBuf,
    pub api_version: Option<String>,
    pub kind: Option<String>,
    pub name: Option<String>,
    pub namespace: String,
}

impl AppliedResource {
    fn from_document(path: &Path, document: &ResourceDocument) -> Self {
        Self {
            path: path.to_path_buf(),
            api_version: document.api_version().map(str::to_string),
            kind: document.kind().map(str::to_string),
            name: document.name().map(str::to_string),
            namespace: document
                .namespace()
                .unwrap_or(DEFAULT_NAMESPACE)
                .to_string(),
        }
    }
}

/// Result of pushing one file through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submitted {
    Created(AppliedResource),
    /// Dry run: decoded and defaulted, but not sent.
    Simulated(AppliedResource),
}

#[derive(Debug)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: ApplyError,
}

#[derive(Debug, Default)]
pub struct ApplyReport {
    pub created: Vec<AppliedResource>,
    pub simulated: Vec<AppliedResource>,
    pub failed: Vec<FailedFile>,
}

impl ApplyReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of files the run looked at.
    pub fn total(&self) -> usize {
        self.created.len() + self.simulated.len() + self.failed.len()
    }
}

/// Read, decode, default and (unless `dry_run`) create a single file.
pub async fn submit<C>(creator: &C, path: &Path, dry_run: bool) -> ApplyResult<Submitted>
where
    C: ResourceCreator + ?Sized,
{
    info!(path = %path.display(), "[APPLY] Processing file");

    let bytes = fs::read(path).map_err(|source| {
        error!(path = %path.display(), error = %source, "[APPLY][ERROR] Read failed");
        ApplyError::Read {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let mut document = ResourceDocument::decode(&bytes).map_err(|source| {
        error!(path = %path.display(), error = %source, "[APPLY][ERROR] Decode failed");
        ApplyError::Decode {
            path: path.to_path_buf(),
            source,
        }
    })?;

    if document.default_namespace(DEFAULT_NAMESPACE) {
        tracing::debug!(path = %path.display(), namespace = DEFAULT_NAMESPACE, "[APPLY] Defaulted namespace");
    }
    let resource = AppliedResource::from_document(path, &document);

    if dry_run {
        info!(
            path = %path.display(),
            kind = resource.kind.as_deref().unwrap_or(""),
            name = resource.name.as_deref().unwrap_or(""),
            namespace = %resource.namespace,
            "[APPLY] Dry run, skipping create"
        );
        return Ok(Submitted::Simulated(resource));
    }

    match creator.create(&document).await {
        Ok(()) => {
            info!(
                path = %path.display(),
                kind = resource.kind.as_deref().unwrap_or(""),
                name = resource.name.as_deref().unwrap_or(""),
                namespace = %resource.namespace,
                "[APPLY] Created resource"
            );
            Ok(Submitted::Created(resource))
        }
        Err(source) => {
            error!(path = %path.display(), error = %source, "[APPLY][ERROR] Create failed");
            Err(ApplyError::Submit {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

/// Run the whole pipeline described by `config` against `creator`.
pub async fn apply<C>(config: &ApplyConfig, creator: &C) -> ApplyResult<ApplyReport>
where
    C: ResourceCreator + ?Sized,
{
    config.trace_loaded();
    let paths = locate(&config.base_dir, &config.pattern)?;

    let mut report = ApplyReport::default();
    for path in paths {
        match submit(creator, &path, config.dry_run).await {
            Ok(Submitted::Created(resource)) => report.created.push(resource),
            Ok(Submitted::Simulated(resource)) => report.simulated.push(resource),
            Err(error) => match config.on_error {
                FailurePolicy::FailFast => return Err(error),
                FailurePolicy::Continue => {
                    warn!(path = %path.display(), error = %error, "[APPLY] Continuing after failure");
                    report.failed.push(FailedFile { path, error });
                }
            },
        }
    }

    info!(
        created = report.created.len(),
        simulated = report.simulated.len(),
        failed = report.failed.len(),
        "[APPLY] Run finished"
    );
    Ok(report)
}
