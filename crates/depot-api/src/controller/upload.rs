//! # Deploys
//!
//! A `PUT` carries either a `multipart/form-data` body, one file per part, or
//! a raw body that is the file itself.
//!
//! Multipart file parts land under the upload base: the request path when it
//! ends in `/`, its parent otherwise. A part's file name may carry relative
//! segments (`1.0/lib-1.0.jar`). Form fields without a file name are ignored.
//! Parts are handled one at a time:
//!
//! 1. resolve the target, or reject the part as an invalid path (hidden
//!    names included);
//! 2. skip it if it would overwrite a generated `maven-metadata` file;
//! 3. reject it if the session may not write there, then carry on with the rest;
//! 4. write it atomically.
//!
//! Every directory that received a file is invalidated in the metadata cache
//! together with its parent, each exactly once, after the last part.

use std::collections::HashSet;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use depot_auth::Session;
use depot_core::ArtifactLocation;
use serde::{Deserialize, Serialize};

use super::RepositoryController;
use crate::error::AppError;

const INDEX_MARKER: &str = "maven-metadata";
const TEMP_PREFIX: &str = ".depot-upload-";

/// Outcome of a deploy, by request path.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployReport {
    pub deployed: Vec<String>,
    pub rejected: Vec<String>,
    pub skipped: Vec<String>,
}

struct UploadPart {
    file_name: Option<String>,
    bytes: Bytes,
}

#[derive(Default)]
struct Outcome {
    report: DeployReport,
    unauthorized: bool,
    invalid: bool,
}

impl Outcome {
    fn status(&self) -> StatusCode {
        if self.unauthorized {
            StatusCode::UNAUTHORIZED
        } else if self.invalid {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::OK
        }
    }
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
}

fn write_atomically(target: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = target
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "target has no parent"))?;
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::Builder::new().prefix(TEMP_PREFIX).tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

impl RepositoryController {
    pub(super) async fn put(&self, path: &str, request: Request) -> Result<Response, AppError> {
        if !self.deploy_enabled {
            tracing::warn!(path, "deploy refused: deployment is disabled");
            return Err(AppError::DeploymentDisabled);
        }

        let authorization = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let session = self
            .authenticator
            .authenticate_header(authorization)
            .map_err(|e| {
                tracing::warn!(path, error = %e, "deploy refused: authentication failed");
                AppError::from(e)
            })?;

        let target = self.resolver.resolve(path)?;
        let parts = if is_multipart(&request) {
            read_multipart(request).await?
        } else {
            if target.is_directory_hint() {
                return Err(AppError::BadRequest(
                    "a raw upload must name a file, not a directory".to_string(),
                ));
            }
            let bytes = axum::body::to_bytes(request.into_body(), self.max_upload_bytes)
                .await
                .map_err(|e| AppError::BadRequest(format!("cannot read request body: {e}")))?;
            vec![UploadPart {
                file_name: None,
                bytes,
            }]
        };
        if parts.is_empty() {
            return Err(AppError::BadRequest("upload contains no parts".to_string()));
        }

        let base = if target.is_directory_hint() {
            target.clone()
        } else {
            target.parent().unwrap_or_else(|| self.resolver.root_location())
        };

        let mut outcome = Outcome::default();
        let mut touched: Vec<ArtifactLocation> = Vec::new();
        let mut failure = None;
        for part in parts {
            if let Err(e) = self
                .deploy_part(&session, &base, &target, part, &mut outcome, &mut touched)
                .await
            {
                failure = Some(e);
                break;
            }
        }

        self.invalidate_written(touched).await?;
        if let Some(err) = failure {
            return Err(err);
        }

        tracing::info!(
            alias = %session.alias(),
            path,
            deployed = outcome.report.deployed.len(),
            rejected = outcome.report.rejected.len(),
            skipped = outcome.report.skipped.len(),
            "deploy finished"
        );
        Ok((outcome.status(), Json(outcome.report)).into_response())
    }

    async fn deploy_part(
        &self,
        session: &Session,
        base: &ArtifactLocation,
        request_target: &ArtifactLocation,
        part: UploadPart,
        outcome: &mut Outcome,
        touched: &mut Vec<ArtifactLocation>,
    ) -> Result<(), AppError> {
        let label = part.file_name.clone().unwrap_or_else(|| request_target.uri());
        let resolved = match &part.file_name {
            Some(name) => base.join(name),
            None => Ok(request_target.clone()),
        };
        let target = match resolved {
            Ok(target)
                if !target.is_root() && !target.is_directory_hint() && !target.is_hidden() =>
            {
                target
            }
            _ => {
                tracing::warn!(part = %label, "rejected part: invalid path");
                outcome.report.rejected.push(label);
                outcome.invalid = true;
                return Ok(());
            }
        };

        if target.file_name().is_some_and(|name| name.contains(INDEX_MARKER)) {
            tracing::debug!(path = %target, "skipped generated index document");
            outcome.report.skipped.push(target.uri());
            return Ok(());
        }

        if !session.permits(&target) {
            tracing::warn!(
                alias = %session.alias(),
                prefix = %session.prefix(),
                path = %target,
                "rejected part: outside token prefix"
            );
            outcome.report.rejected.push(target.uri());
            outcome.unauthorized = true;
            return Ok(());
        }

        let file = target.to_path();
        let size = part.bytes.len();
        let bytes = part.bytes;
        tokio::task::spawn_blocking(move || write_atomically(&file, &bytes))
            .await
            .map_err(|e| AppError::Internal(format!("write task failed: {e}")))?
            .map_err(|e| AppError::Internal(format!("cannot write {target}: {e}")))?;

        tracing::info!(alias = %session.alias(), path = %target, bytes = size, "deployed artifact");
        outcome.report.deployed.push(target.uri());
        if let Some(directory) = target.parent() {
            touched.push(directory);
        }
        Ok(())
    }

    async fn invalidate_written(&self, touched: Vec<ArtifactLocation>) -> Result<(), AppError> {
        let mut seen = HashSet::new();
        let mut directories = Vec::new();
        for directory in touched {
            let parent = directory.parent();
            for candidate in std::iter::once(directory).chain(parent) {
                if seen.insert(candidate.clone()) {
                    directories.push(candidate);
                }
            }
        }
        if directories.is_empty() {
            return Ok(());
        }

        let cache = Arc::clone(&self.cache);
        tokio::task::spawn_blocking(move || {
            for directory in &directories {
                cache.invalidate(directory);
            }
        })
        .await
        .map_err(|e| AppError::Internal(format!("invalidation task failed: {e}")))
    }
}

async fn read_multipart(request: Request) -> Result<Vec<UploadPart>, AppError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?;
    let mut parts = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            tracing::debug!(field = field.name().unwrap_or_default(), "ignored form field");
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        parts.push(UploadPart {
            file_name: Some(file_name),
            bytes,
        });
    }
    Ok(parts)
}
