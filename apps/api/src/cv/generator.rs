//! CV generation: turns a raw request body into a stored document and a
//! signed download link.
//!
//! Flow: escape_markup → normalize_keys → validate (canonical schema overlaid
//!       with the profile's schema document) → typed request → profile
//!       defaults → build_context → render template → PDF conversion (if
//!       asked) → upload → signed URL.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::cv::{CvGenerationRequest, OutputFormat};
use crate::models::profile::Profile;
use crate::pipeline::{
    build_context, escape_markup, normalize_keys, ContextOptions, SchemaValidator,
};
use crate::state::AppState;
use crate::storage::{GENERATOR_CONTAINER, SCHEMA_CONTAINER};

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedCv {
    /// Blob path of the stored document.
    #[serde(skip)]
    pub path: String,
    pub url: String,
}

pub async fn generate_cv(state: &AppState, body: &Value) -> Result<GeneratedCv, AppError> {
    let escaped = escape_markup(body);
    let normalized = normalize_keys(&escaped);

    let profile = state.profiles.get(state.storage.as_ref()).await?;
    let validator = load_validator(state, &profile).await?;

    let result = validator.validate(&normalized);
    if !result.passed {
        for error in &result.errors {
            warn!("Request validation failed: {error}");
        }
        return Err(AppError::validation(result.errors));
    }

    let request: CvGenerationRequest = serde_json::from_value(normalized)
        .map_err(|e| AppError::BadRequest(format!("Request does not describe a CV: {e}")))?;
    info!("Request validated successfully");

    let options = context_options(&request, &profile);
    // The context keeps the request's own key spelling; templates address
    // fields as `data.firstName`.
    let context = build_context(&escaped, &options);

    let template_name = request.template.as_deref().unwrap_or(&profile.template);
    let template = state.storage.read(GENERATOR_CONTAINER, template_name).await?;

    let renderer = state.renderer.clone();
    let mut document = tokio::task::spawn_blocking(move || renderer.render(&template, &context))
        .await
        .map_err(|e| anyhow::anyhow!("render task failed: {e}"))??;

    let format = request.output_format();
    if format == OutputFormat::Pdf {
        document = state.converter.convert(document).await?;
    }

    let file_name = cv_filename(
        &request.data.first_name,
        &request.data.surname,
        format,
        Utc::now(),
    );
    let path = state
        .storage
        .write(document, &file_name, format.content_type())
        .await?;
    let url = state
        .storage
        .signed_download_url(&file_name, state.config.signed_url_ttl)
        .await?;
    info!("CV Download Link: {url}");

    Ok(GeneratedCv { path, url })
}

async fn load_validator(state: &AppState, profile: &Profile) -> Result<SchemaValidator, AppError> {
    let raw = state
        .storage
        .read(SCHEMA_CONTAINER, &profile.schema_file)
        .await?;
    let document: Value = serde_json::from_slice(&raw).map_err(|e| {
        anyhow::anyhow!("schema document {} is malformed: {e}", profile.schema_file)
    })?;
    Ok(SchemaValidator::canonical().with_schema_document(&document))
}

/// Request settings win; the profile fills in what the request leaves out.
fn context_options(request: &CvGenerationRequest, profile: &Profile) -> ContextOptions {
    ContextOptions {
        section_order: request
            .section_order
            .clone()
            .or_else(|| profile.default_section_order()),
        section_visibility: request
            .section_visibility
            .clone()
            .or_else(|| profile.default_section_visibility.clone()),
        anonymize: request.anonymize(),
    }
}

pub fn cv_filename(
    first_name: &str,
    surname: &str,
    format: OutputFormat,
    at: DateTime<Utc>,
) -> String {
    format!(
        "{first_name} {surname} CV {}.{}",
        at.format("%Y-%m-%d-%H-%M-%S"),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::read_part;
    use crate::storage::GENERATED_CONTAINER;
    use crate::testing::{test_app, FakeParser, FAKE_PDF};
    use chrono::TimeZone;
    use serde_json::json;

    fn request() -> Value {
        json!({
            "outputFormat": "docx",
            "data": {
                "firstName": "John",
                "surname": "Doe",
                "email": "john@example.com",
                "experience": [{ "role": "Dev", "company": "Acme", "startDate": "2020-01" }]
            }
        })
    }

    #[test]
    fn test_cv_filename() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            cv_filename("John", "Doe", OutputFormat::Pdf, at),
            "John Doe CV 2024-03-09-14-05-07.pdf"
        );
        assert_eq!(
            cv_filename("John", "Doe", OutputFormat::Doc, at),
            "John Doe CV 2024-03-09-14-05-07.docx"
        );
    }

    #[tokio::test]
    async fn test_generate_docx_stores_rendered_document() {
        let app = test_app(FakeParser::default());
        let generated = generate_cv(&app.state, &request()).await.expect("generates");

        assert!(generated.path.starts_with("generated-cvs/John Doe CV "));
        assert!(generated.path.ends_with(".docx"));
        assert!(generated.url.contains(&generated.path));

        let (bytes, content_type) = app.storage.get(&generated.path).expect("stored");
        assert_eq!(content_type, crate::models::cv::DOCX_CONTENT_TYPE);
        assert_eq!(
            read_part(&bytes, "word/document.xml"),
            "<w:t>John Doe</w:t><w:t>john@example.com</w:t>"
        );
        assert_eq!(*app.converter.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_generate_pdf_goes_through_converter() {
        let app = test_app(FakeParser::default());
        let mut body = request();
        body["outputFormat"] = json!("pdf");

        let generated = generate_cv(&app.state, &body).await.expect("generates");
        assert!(generated.path.ends_with(".pdf"));
        let (bytes, content_type) = app.storage.get(&generated.path).expect("stored");
        assert_eq!(&bytes[..], FAKE_PDF);
        assert_eq!(content_type, "application/pdf");
        assert_eq!(*app.converter.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_generate_escapes_markup_before_rendering() {
        let app = test_app(FakeParser::default());
        let mut body = request();
        body["data"]["firstName"] = json!("Tom & <Jerry>");

        let generated = generate_cv(&app.state, &body).await.expect("generates");
        let (bytes, _) = app.storage.get(&generated.path).expect("stored");
        assert!(read_part(&bytes, "word/document.xml")
            .starts_with("<w:t>Tom &amp; &lt;Jerry&gt; Doe</w:t>"));
    }

    #[tokio::test]
    async fn test_generate_anonymized() {
        let app = test_app(FakeParser::default());
        let mut body = request();
        body["isAnonymized"] = json!(true);

        let generated = generate_cv(&app.state, &body).await.expect("generates");
        let (bytes, _) = app.storage.get(&generated.path).expect("stored");
        let xml = read_part(&bytes, "word/document.xml");
        assert!(!xml.contains("John"));
        assert!(!xml.contains("john@example.com"));
        // The stored name still comes from the request.
        assert!(generated.path.contains("John Doe CV"));
    }

    #[tokio::test]
    async fn test_generate_validation_failure_lists_fields() {
        let app = test_app(FakeParser::default());
        let body = json!({ "outputFormat": "rtf", "data": { "firstName": "" } });

        let err = generate_cv(&app.state, &body).await.expect_err("invalid");
        let AppError::Validation { details, .. } = err else {
            panic!("expected validation error, got {err:?}");
        };
        let paths: Vec<&str> = details.iter().map(|d| d.path.as_str()).collect();
        assert!(paths.contains(&"output_format"));
        assert!(paths.contains(&"data.first_name"));
        assert!(paths.contains(&"data.surname"));
        assert!(app.storage.paths_under(GENERATED_CONTAINER).is_empty());
    }

    #[tokio::test]
    async fn test_profile_schema_document_is_enforced() {
        let app = test_app(FakeParser::default());
        app.storage.put_json(
            SCHEMA_CONTAINER,
            "cv_schema.json",
            &json!({
                "properties": {
                    "data": {
                        "type": "object",
                        "required": ["email", "phone"],
                        "properties": {
                            "email": { "type": "string" },
                            "phone": { "type": "string" }
                        }
                    }
                }
            }),
        );

        let err = generate_cv(&app.state, &request()).await.expect_err("phone missing");
        let AppError::Validation { details, .. } = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].path, "data.phone");
    }

    #[tokio::test]
    async fn test_request_template_overrides_profile() {
        let app = test_app(FakeParser::default());
        let mut body = request();
        body["template"] = json!("missing.docx");

        let err = generate_cv(&app.state, &body).await.expect_err("template absent");
        assert!(matches!(
            err,
            AppError::Storage(crate::storage::StorageError::NotFound(ref path))
                if path == "cv-generator/missing.docx"
        ));
    }

    #[test]
    fn test_context_options_fall_back_to_profile() {
        let profile: Profile = serde_json::from_value(json!({
            "schema": "s.json",
            "template": "t.docx",
            "default_section_visibility": { "skills": false },
            "default_section_order": ["skills", "experience"]
        }))
        .unwrap();
        let request: CvGenerationRequest = serde_json::from_value(json!({
            "data": { "first_name": "A", "surname": "B" }
        }))
        .unwrap();

        let options = context_options(&request, &profile);
        assert_eq!(
            options.section_order,
            Some(vec!["skills".to_string(), "experience".to_string()])
        );
        assert_eq!(options.section_visibility.unwrap().get("skills"), Some(&false));
        assert!(!options.anonymize);

        let request: CvGenerationRequest = serde_json::from_value(json!({
            "section_order": ["education"],
            "section_visibility": { "skills": true },
            "is_anonymized": true,
            "data": { "first_name": "A", "surname": "B" }
        }))
        .unwrap();
        let options = context_options(&request, &profile);
        assert_eq!(options.section_order, Some(vec!["education".to_string()]));
        assert_eq!(options.section_visibility.unwrap().get("skills"), Some(&true));
        assert!(options.anonymize);
    }
}
