//! # Downloads
//!
//! `maven-metadata.xml` and its `.sha256`/`.sha512` companions are always
//! answered from the metadata cache. Everything else is read from disk.
//! Directories are not listed, and hidden entries (in-flight uploads) are
//! never served.

use std::io::ErrorKind;
use std::sync::Arc;

use axum::http::header;
use axum::response::{IntoResponse, Response};
use depot_metadata::{classify, MetadataRequest};

use super::RepositoryController;
use crate::error::AppError;

const XML: &str = "application/xml";
const JAVA_ARCHIVE: &str = "application/java-archive";
const TEXT: &str = "text/plain";
const JSON: &str = "application/json";
const OCTET_STREAM: &str = "application/octet-stream";

/// Content type served for a file name, by extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "xml" | "pom" => XML,
        "jar" | "war" | "ear" => JAVA_ARCHIVE,
        "sha1" | "sha256" | "sha512" | "md5" | "asc" => TEXT,
        "json" | "module" => JSON,
        _ => OCTET_STREAM,
    }
}

impl RepositoryController {
    pub(super) async fn get(&self, path: &str) -> Result<Response, AppError> {
        let location = self.resolver.resolve(path)?;
        if location.is_hidden() {
            return Err(AppError::NotFound(location.uri()));
        }

        if let Some((directory, request)) = classify(&location) {
            let cache = Arc::clone(&self.cache);
            let document = tokio::task::spawn_blocking(move || cache.get(&directory))
                .await
                .map_err(|e| AppError::Internal(format!("metadata task failed: {e}")))??;
            return Ok(match request {
                MetadataRequest::Document => {
                    ([(header::CONTENT_TYPE, XML)], document.bytes.to_vec()).into_response()
                }
                MetadataRequest::Checksum(kind) => {
                    ([(header::CONTENT_TYPE, TEXT)], document.checksum(kind)).into_response()
                }
            });
        }

        let file = location.to_path();
        match tokio::fs::metadata(&file).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(AppError::NotFound(location.uri())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::NotFound(location.uri()))
            }
            Err(e) => {
                return Err(AppError::Internal(format!(
                    "cannot stat {}: {e}",
                    file.display()
                )))
            }
        }
        let bytes = tokio::fs::read(&file)
            .await
            .map_err(|e| AppError::Internal(format!("cannot read {}: {e}", file.display())))?;

        let content_type = content_type_for(location.file_name().unwrap_or_default());
        Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type_for("maven-metadata.xml"), XML);
        assert_eq!(content_type_for("lib-1.0.pom"), XML);
        assert_eq!(content_type_for("lib-1.0.JAR"), JAVA_ARCHIVE);
        assert_eq!(content_type_for("app.war"), JAVA_ARCHIVE);
        assert_eq!(content_type_for("lib-1.0.jar.sha1"), TEXT);
        assert_eq!(content_type_for("lib-1.0.jar.asc"), TEXT);
        assert_eq!(content_type_for("lib-1.0.module"), JSON);
        assert_eq!(content_type_for("lib-1.0.tar.gz"), OCTET_STREAM);
        assert_eq!(content_type_for("README"), OCTET_STREAM);
    }
}
