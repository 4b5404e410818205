//! Blob storage for templates, schema documents, profiles and generated CVs.
//!
//! Containers map to key prefixes inside a single bucket, so
//! `read("cv-schemas", "cv_schema.json")` fetches `cv-schemas/cv_schema.json`.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;
use tracing::{error, info};

/// Container holding generated documents.
pub const GENERATED_CONTAINER: &str = "generated-cvs";
/// Container holding profiles and templates.
pub const GENERATOR_CONTAINER: &str = "cv-generator";
/// Container holding schema documents.
pub const SCHEMA_CONTAINER: &str = "cv-schemas";
/// Container the parser front-end uploads results into.
pub const PARSER_RESULT_CONTAINER: &str = "cv-parser-result";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("storage request failed: {0}")]
    Request(String),

    #[error("could not sign URL: {0}")]
    Signing(String),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn read(&self, container: &str, name: &str) -> Result<Bytes, StorageError>;

    /// Stores a generated document under [`GENERATED_CONTAINER`] and returns
    /// the full blob path.
    async fn write(
        &self,
        bytes: Bytes,
        path: &str,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Time-limited GET URL for a generated document.
    async fn signed_download_url(&self, path: &str, ttl: Duration)
        -> Result<String, StorageError>;

    /// Time-limited PUT URL for an arbitrary blob path.
    async fn signed_upload_url(
        &self,
        blob_path: &str,
        ttl: Duration,
        content_type: &str,
    ) -> Result<String, StorageError>;
}

pub fn blob_path(container: &str, name: &str) -> String {
    format!("{container}/{name}")
}

/// S3-compatible implementation (AWS, MinIO, or GCS interoperability mode).
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn read(&self, container: &str, name: &str) -> Result<Bytes, StorageError> {
        let key = blob_path(container, name);
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    error!("File not found in storage: {key}");
                    StorageError::NotFound(key.clone())
                } else {
                    StorageError::Request(format!("get {key}: {e}"))
                }
            })?;

        let body = object
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Request(format!("read {key}: {e}")))?;
        Ok(body.into_bytes())
    }

    async fn write(
        &self,
        bytes: Bytes,
        path: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let key = blob_path(GENERATED_CONTAINER, path);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Request(format!("put {key}: {e}")))?;

        info!("Uploaded CV to s3://{}/{}", self.bucket, key);
        Ok(key)
    }

    async fn signed_download_url(
        &self,
        path: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        let key = blob_path(GENERATED_CONTAINER, path);
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|e| StorageError::Signing(e.to_string()))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Signing(format!("{key}: {e}")))?;
        Ok(request.uri().to_string())
    }

    async fn signed_upload_url(
        &self,
        blob_path: &str,
        ttl: Duration,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|e| StorageError::Signing(e.to_string()))?;
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(blob_path)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Signing(format!("{blob_path}: {e}")))?;
        Ok(request.uri().to_string())
    }
}
