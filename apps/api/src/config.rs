use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_PDF_CONVERSION_ENDPOINT: &str = "https://docx2pdf.tombrown.io/convert";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub s3_region: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    /// Profile document name inside the `cv-generator` container.
    pub profile: String,
    pub pdf_conversion_endpoint: String,
    /// Name of the secret holding the converter's API key, if it needs one.
    pub pdf_api_key_secret: Option<String>,
    pub parser_api_endpoint: Option<String>,
    pub jwt_secret_name: String,
    pub signed_url_ttl: Duration,
    pub collaborator_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            s3_region: env_or("S3_REGION", "us-east-1"),
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            profile: env_or("PROFILE", "profile.json"),
            pdf_conversion_endpoint: env_or(
                "PDF_CONVERSION_ENDPOINT",
                DEFAULT_PDF_CONVERSION_ENDPOINT,
            ),
            pdf_api_key_secret: optional_env("PDF_API_KEY_SECRET"),
            parser_api_endpoint: optional_env("PARSER_API_ENDPOINT"),
            jwt_secret_name: env_or("JWT_SECRET_NAME", "SUPABASE_JWT_SECRET"),
            signed_url_ttl: Duration::from_secs(parse_env("SIGNED_URL_TTL_SECS", 3600)?),
            collaborator_timeout: Duration::from_secs(parse_env(
                "COLLABORATOR_TIMEOUT_SECS",
                60,
            )?),
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
