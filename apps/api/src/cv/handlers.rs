//! Axum route handlers for the CV API.

use axum::{extract::State, Json};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::cv::generator::{generate_cv, GeneratedCv};
use crate::errors::AppError;
use crate::pipeline::adapter::{GeneratorRecord, ParserRecord};
use crate::pipeline::{generator_to_parser, parser_to_generator};
use crate::state::AppState;
use crate::storage::{blob_path, PARSER_RESULT_CONTAINER};

/// Generation settings `parse-and-generate` forwards from its body.
const GENERATION_OPTIONS: &[&str] = &[
    "template",
    "outputFormat",
    "sectionOrder",
    "sectionVisibility",
    "isAnonymized",
    "recruiterProfile",
];

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseRequest {
    /// Base64-encoded document.
    pub file_content: String,
    pub file_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResponse {
    pub parsed_data: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseAndGenerateResponse {
    pub url: String,
    pub parsed_data: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTokenResponse {
    pub blob_name: String,
    pub url: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/cv/generate
///
/// Renders the request into the profile's template and returns a signed
/// download link for the stored document.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<GeneratedCv>, AppError> {
    info!("Processing CV Generation request");
    Ok(Json(generate_cv(&state, &body).await?))
}

/// POST /api/v1/cv/parse
pub async fn handle_parse(
    State(state): State<AppState>,
    Json(request): Json<ParseRequest>,
) -> Result<Json<ParseResponse>, AppError> {
    let record = parse_upload(&state, &request).await?;
    Ok(Json(ParseResponse {
        parsed_data: parsed_data(&record)?,
    }))
}

/// POST /api/v1/cv/parse-and-generate
///
/// Parses the uploaded file, then generates a CV from the result using the
/// generation settings carried alongside the file.
pub async fn handle_parse_and_generate(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<ParseAndGenerateResponse>, AppError> {
    let request: ParseRequest = serde_json::from_value(body.clone())
        .map_err(|e| AppError::BadRequest(format!("Invalid parse request: {e}")))?;
    let record = parse_upload(&state, &request).await?;

    let mut generation = Map::new();
    if let Some(options) = body.as_object() {
        for key in GENERATION_OPTIONS {
            if let Some(value) = options.get(*key) {
                generation.insert((*key).to_string(), value.clone());
            }
        }
    }
    let parsed_data = parsed_data(&record)?;
    generation.insert("data".to_string(), parsed_data.clone());

    let generated = generate_cv(&state, &Value::Object(generation)).await?;
    Ok(Json(ParseAndGenerateResponse {
        url: generated.url,
        parsed_data,
    }))
}

/// POST /api/v1/adapter/parser-to-generator
pub async fn handle_parser_to_generator(Json(body): Json<Value>) -> Json<GeneratorRecord> {
    Json(parser_to_generator(&body))
}

/// POST /api/v1/adapter/generator-to-parser
pub async fn handle_generator_to_parser(Json(body): Json<Value>) -> Json<ParserRecord> {
    Json(generator_to_parser(&body))
}

/// POST /api/v1/uploads/token
///
/// Issues a signed PUT URL for a fresh blob in the parser result container.
pub async fn handle_upload_token(
    State(state): State<AppState>,
) -> Result<Json<UploadTokenResponse>, AppError> {
    let blob_name = blob_path(PARSER_RESULT_CONTAINER, &format!("{}.json", Uuid::new_v4()));
    let url = state
        .storage
        .signed_upload_url(&blob_name, state.config.signed_url_ttl, "application/json")
        .await?;
    info!("Issued upload URL for {blob_name}");
    Ok(Json(UploadTokenResponse { blob_name, url }))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn parse_upload(state: &AppState, request: &ParseRequest) -> Result<GeneratorRecord, AppError> {
    if request.file_name.trim().is_empty() {
        return Err(AppError::BadRequest("fileName cannot be empty".to_string()));
    }
    let file = STANDARD
        .decode(request.file_content.trim())
        .map_err(|e| AppError::BadRequest(format!("fileContent is not valid base64: {e}")))?;
    if file.is_empty() {
        return Err(AppError::BadRequest("fileContent cannot be empty".to_string()));
    }

    let parsed = state
        .parser
        .parse(Bytes::from(file), &request.file_name)
        .await?;
    Ok(parser_to_generator(&parsed))
}

/// The `data` part of an adapted record; an empty parse yields `{}`.
fn parsed_data(record: &GeneratorRecord) -> Result<Value, AppError> {
    match &record.data {
        Some(data) => Ok(serde_json::to_value(data).map_err(anyhow::Error::from)?),
        None => Ok(json!({})),
    }
}
