//! In-memory collaborators and helpers shared by the unit and router tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use serde_json::{json, Value};

use crate::clients::converter::{ConversionError, PdfConverter};
use crate::clients::parser::{CvParser, ParserError};
use crate::config::Config;
use crate::profiles::ProfileCache;
use crate::render::tests::docx_with_body;
use crate::render::DocxTemplateRenderer;
use crate::state::AppState;
use crate::storage::{
    blob_path, BlobStore, StorageError, GENERATED_CONTAINER, GENERATOR_CONTAINER,
    SCHEMA_CONTAINER,
};

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{addr}")
}

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, (Bytes, String)>>,
}

impl MemoryBlobStore {
    pub fn put(&self, container: &str, name: &str, bytes: impl Into<Bytes>) {
        self.blobs.lock().expect("lock").insert(
            blob_path(container, name),
            (bytes.into(), "application/octet-stream".to_string()),
        );
    }

    pub fn put_json(&self, container: &str, name: &str, value: &Value) {
        self.put(container, name, serde_json::to_vec(value).expect("json"));
    }

    /// Stored bytes and content type at a full blob path.
    pub fn get(&self, path: &str) -> Option<(Bytes, String)> {
        self.blobs.lock().expect("lock").get(path).cloned()
    }

    pub fn paths_under(&self, container: &str) -> Vec<String> {
        let prefix = format!("{container}/");
        let mut paths: Vec<String> = self
            .blobs
            .lock()
            .expect("lock")
            .keys()
            .filter(|path| path.starts_with(&prefix))
            .cloned()
            .collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read(&self, container: &str, name: &str) -> Result<Bytes, StorageError> {
        let path = blob_path(container, name);
        self.get(&path)
            .map(|(bytes, _)| bytes)
            .ok_or(StorageError::NotFound(path))
    }

    async fn write(
        &self,
        bytes: Bytes,
        path: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let key = blob_path(GENERATED_CONTAINER, path);
        self.blobs
            .lock()
            .expect("lock")
            .insert(key.clone(), (bytes, content_type.to_string()));
        Ok(key)
    }

    async fn signed_download_url(
        &self,
        path: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        Ok(format!(
            "https://blobs.test/{}?expires={}",
            blob_path(GENERATED_CONTAINER, path),
            ttl.as_secs()
        ))
    }

    async fn signed_upload_url(
        &self,
        blob_path: &str,
        ttl: Duration,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        Ok(format!(
            "https://blobs.test/{blob_path}?upload=1&expires={}",
            ttl.as_secs()
        ))
    }
}

pub const FAKE_PDF: &[u8] = b"%PDF-1.7 fake";

#[derive(Default)]
pub struct FakeConverter {
    pub calls: Mutex<usize>,
}

#[async_trait]
impl PdfConverter for FakeConverter {
    async fn convert(&self, _docx: Bytes) -> Result<Bytes, ConversionError> {
        *self.calls.lock().expect("lock") += 1;
        Ok(Bytes::from_static(FAKE_PDF))
    }
}

/// Returns a fixed parser-shaped record, or `NotConfigured` when empty.
#[derive(Default)]
pub struct FakeParser {
    pub output: Option<Value>,
}

#[async_trait]
impl CvParser for FakeParser {
    async fn parse(&self, _file: Bytes, _file_name: &str) -> Result<Value, ParserError> {
        self.output.clone().ok_or(ParserError::NotConfigured)
    }
}

pub fn parser_output() -> Value {
    json!({
        "contact_info": {
            "first_name": "Jane",
            "last_name": "Smith",
            "email": "jane@example.com",
            "phone": "+44 7700 900000",
            "location": "Leeds"
        },
        "personal_statement": "Platform engineer.",
        "links": ["https://linkedin.com/in/jane", "https://github.com/jane"],
        "skills": ["Rust", "Kubernetes"],
        "experience": [{
            "title": "Engineer",
            "company": "Acme",
            "start_date": "2020",
            "end_date": "",
            "is_current": true,
            "description": "Built things"
        }],
        "education": [{
            "institution": "Leeds",
            "degree": "BSc",
            "field_of_study": "CS",
            "start_date": "2014",
            "end_date": "2017"
        }]
    })
}

pub const TEMPLATE_BODY: &str =
    "<w:t>{{ data.firstName }} {{ data.surname }}</w:t><w:t>{{ data.email }}</w:t>";

pub fn test_config() -> Config {
    Config {
        s3_bucket: "cv-test".to_string(),
        s3_endpoint: "http://localhost:9000".to_string(),
        s3_region: "us-east-1".to_string(),
        aws_access_key_id: "test".to_string(),
        aws_secret_access_key: "test".to_string(),
        profile: "profile.json".to_string(),
        pdf_conversion_endpoint: "http://localhost:9999/convert".to_string(),
        pdf_api_key_secret: None,
        parser_api_endpoint: None,
        jwt_secret_name: "SUPABASE_JWT_SECRET".to_string(),
        signed_url_ttl: Duration::from_secs(3600),
        collaborator_timeout: Duration::from_secs(5),
        port: 0,
        rust_log: "debug".to_string(),
    }
}

/// Storage seeded with a profile, an empty external schema and a template.
pub fn seeded_storage() -> Arc<MemoryBlobStore> {
    let storage = MemoryBlobStore::default();
    storage.put_json(
        GENERATOR_CONTAINER,
        "profile.json",
        &json!({
            "schema": "cv_schema.json",
            "template": "template.docx",
            "default_section_visibility": { "experience": true, "education": true }
        }),
    );
    storage.put_json(SCHEMA_CONTAINER, "cv_schema.json", &json!({ "properties": {} }));
    storage.put(GENERATOR_CONTAINER, "template.docx", docx_with_body(TEMPLATE_BODY));
    Arc::new(storage)
}

pub struct TestApp {
    pub state: AppState,
    pub storage: Arc<MemoryBlobStore>,
    pub converter: Arc<FakeConverter>,
}

pub fn test_app(parser: FakeParser) -> TestApp {
    let storage = seeded_storage();
    let converter = Arc::new(FakeConverter::default());
    let config = test_config();
    let state = AppState {
        profiles: Arc::new(ProfileCache::new(config.profile.clone())),
        config,
        storage: storage.clone(),
        converter: converter.clone(),
        parser: Arc::new(parser),
        renderer: Arc::new(DocxTemplateRenderer),
        auth: None,
    };
    TestApp {
        state,
        storage,
        converter,
    }
}
