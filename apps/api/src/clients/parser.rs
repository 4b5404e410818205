use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

use crate::clients::{http_client, send_with_retry};
use crate::models::cv::DOCX_CONTENT_TYPE;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("no parser endpoint is configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("parser rejected the file (status {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Extracts structured CV data (parser shape) from an uploaded document.
#[async_trait]
pub trait CvParser: Send + Sync {
    async fn parse(&self, file: Bytes, file_name: &str) -> Result<Value, ParserError>;
}

pub struct HttpCvParser {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl HttpCvParser {
    pub fn new(endpoint: Option<String>, timeout: Duration) -> Result<Self, ParserError> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint,
        })
    }
}

#[async_trait]
impl CvParser for HttpCvParser {
    async fn parse(&self, file: Bytes, file_name: &str) -> Result<Value, ParserError> {
        let endpoint = self.endpoint.as_deref().ok_or(ParserError::NotConfigured)?;
        let mime = mime_for(file_name);

        let response = send_with_retry("CV parser", || {
            let part = Part::stream(reqwest::Body::from(file.clone()))
                .file_name(file_name.to_string())
                .mime_str(mime)?;
            Ok(self
                .client
                .post(endpoint)
                .multipart(Form::new().part("file", part)))
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("CV parsing failed: {status} - {body}");
            return Err(ParserError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: Value = response.json().await?;
        info!("Parsed {file_name} ({} bytes)", file.len());
        Ok(parsed)
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "docx" => DOCX_CONTENT_TYPE,
        "doc" => "application/msword",
        "rtf" => "application/rtf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
