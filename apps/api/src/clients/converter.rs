use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use thiserror::Error;
use tracing::{error, info};

use crate::clients::{http_client, send_with_retry};
use crate::models::cv::DOCX_CONTENT_TYPE;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("converter rejected the document (status {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// DOCX → PDF conversion.
#[async_trait]
pub trait PdfConverter: Send + Sync {
    async fn convert(&self, docx: Bytes) -> Result<Bytes, ConversionError>;
}

/// Posts the document as multipart `file` to a remote conversion endpoint.
pub struct HttpPdfConverter {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpPdfConverter {
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ConversionError> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint,
            api_key,
        })
    }

    fn request(&self, docx: &Bytes) -> Result<reqwest::RequestBuilder, reqwest::Error> {
        let part = Part::stream(reqwest::Body::from(docx.clone()))
            .file_name("doc.docx")
            .mime_str(DOCX_CONTENT_TYPE)?;
        let mut request = self
            .client
            .post(&self.endpoint)
            .multipart(Form::new().part("file", part));
        if let Some(key) = &self.api_key {
            request = request.header("API-Key", key);
        }
        Ok(request)
    }
}

#[async_trait]
impl PdfConverter for HttpPdfConverter {
    async fn convert(&self, docx: Bytes) -> Result<Bytes, ConversionError> {
        let response = send_with_retry("PDF converter", || self.request(&docx)).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("PDF conversion failed: {status} - {body}");
            return Err(ConversionError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let pdf = response.bytes().await?;
        info!("Converted {} byte DOCX into {} byte PDF", docx.len(), pdf.len());
        Ok(pdf)
    }
}
