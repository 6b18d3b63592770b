//! # Repository Controller
//!
//! Every request outside the reserved `/-/` prefix lands here. The method is
//! classified once into a [`RepositoryMethod`] and each variant has its own
//! handler:
//!
//! | Method | Handler                         | Auth |
//! |--------|---------------------------------|------|
//! | GET    | [`download`]: file or generated metadata | none |
//! | HEAD   | GET, then the body is dropped   | none |
//! | PUT    | [`upload`]: multipart or raw deploy | token |
//! | other  | `404 Unknown method`            | n/a  |
//!
//! GET and HEAD responses always carry an explicit `Content-Length`, computed
//! from the full body, so the two agree header for header.
//!
//! Internal failures are recorded in the controller's [`FaultLog`] before
//! being turned into a `500`.

pub mod download;
pub mod upload;

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use depot_auth::{Authenticator, TokenStore};
use depot_core::RepositoryResolver;
use depot_metadata::MetadataCache;

use crate::config::DepotConfig;
use crate::error::AppError;
use crate::faults::{FaultLog, FaultRecord};

pub use upload::DeployReport;

/// The methods the repository distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryMethod {
    Get,
    Head,
    Put,
    Other,
}

impl RepositoryMethod {
    pub fn of(method: &Method) -> Self {
        match *method {
            Method::GET => Self::Get,
            Method::HEAD => Self::Head,
            Method::PUT => Self::Put,
            _ => Self::Other,
        }
    }
}

/// Serves reads and deploys over one repository root.
#[derive(Debug)]
pub struct RepositoryController {
    resolver: RepositoryResolver,
    authenticator: Authenticator,
    cache: Arc<MetadataCache>,
    deploy_enabled: bool,
    max_upload_bytes: usize,
    faults: FaultLog,
}

impl RepositoryController {
    /// Build a controller from configuration and a loaded token store.
    pub fn new(config: &DepotConfig, tokens: TokenStore) -> Self {
        Self {
            resolver: RepositoryResolver::new(config.repository_root.clone()),
            authenticator: Authenticator::new(Arc::new(tokens)),
            cache: Arc::new(MetadataCache::default()),
            deploy_enabled: config.deploy_enabled,
            max_upload_bytes: config.max_upload_bytes,
            faults: FaultLog::new(config.fault_history),
        }
    }

    /// Maps request paths onto the repository root.
    pub fn resolver(&self) -> &RepositoryResolver {
        &self.resolver
    }

    /// Checks deploy and status credentials.
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Generated `maven-metadata.xml` documents, by directory.
    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    /// Whether `PUT` is accepted at all.
    pub fn deploy_enabled(&self) -> bool {
        self.deploy_enabled
    }

    /// Recent unhandled failures, oldest first.
    pub fn faults(&self) -> &FaultLog {
        &self.faults
    }

    /// The most recent unhandled failure, if any.
    pub fn latest_fault(&self) -> Option<FaultRecord> {
        self.faults.latest()
    }

    /// Dispatch one request.
    pub async fn handle(&self, request: Request) -> Response {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        match RepositoryMethod::of(&method) {
            RepositoryMethod::Get => {
                let (parts, body) = self.read(&method, &path).await.into_parts();
                Response::from_parts(parts, Body::from(body))
            }
            RepositoryMethod::Head => {
                let (parts, _) = self.read(&method, &path).await.into_parts();
                Response::from_parts(parts, Body::empty())
            }
            RepositoryMethod::Put => {
                let result = self.put(&path, request).await;
                self.settle(&method, &path, result)
            }
            RepositoryMethod::Other => self.settle(
                &method,
                &path,
                Err(AppError::MethodNotAllowed(method.to_string())),
            ),
        }
    }

    /// The fully buffered GET response for `path`, shared by GET and HEAD.
    async fn read(&self, method: &Method, path: &str) -> Response<Bytes> {
        let result = match self.get(path).await {
            Ok(response) => buffer(response).await,
            Err(err) => Err(err),
        };
        let response = match result {
            Ok(response) => return response,
            Err(err) => self.settle(method, path, Err(err)),
        };
        match buffer(response).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(error = %err, "failed to buffer error response");
                let mut response = Response::new(Bytes::new());
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                response
                    .headers_mut()
                    .insert(header::CONTENT_LENGTH, HeaderValue::from(0usize));
                response
            }
        }
    }

    fn settle(&self, method: &Method, path: &str, result: Result<Response, AppError>) -> Response {
        match result {
            Ok(response) => response,
            Err(err) => {
                if let AppError::Internal(message) = &err {
                    self.faults.record(method.as_str(), path, message.clone());
                }
                err.into_response()
            }
        }
    }
}

/// Read a response body fully and record its length in `Content-Length`.
async fn buffer(response: Response) -> Result<Response<Bytes>, AppError> {
    let (mut parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| AppError::Internal(format!("cannot buffer response body: {e}")))?;
    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
    Ok(Response::from_parts(parts, bytes))
}
