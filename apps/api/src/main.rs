mod auth;
mod clients;
mod config;
mod cv;
mod errors;
mod models;
mod pipeline;
mod profiles;
mod render;
mod routes;
mod secrets;
mod state;
mod storage;
#[cfg(test)]
mod testing;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::clients::converter::HttpPdfConverter;
use crate::clients::parser::HttpCvParser;
use crate::config::Config;
use crate::profiles::ProfileCache;
use crate::render::DocxTemplateRenderer;
use crate::routes::build_router;
use crate::secrets::{CachedSecrets, EnvSecretStore};
use crate::state::AppState;
use crate::storage::S3BlobStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV generator v{}", env!("CARGO_PKG_VERSION"));

    let secrets = CachedSecrets::new(Arc::new(EnvSecretStore));

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let storage = Arc::new(S3BlobStore::new(s3, config.s3_bucket.clone()));
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Remote collaborators
    let pdf_api_key = match &config.pdf_api_key_secret {
        Some(name) => Some(secrets.get(name).await?),
        None => None,
    };
    let converter = Arc::new(HttpPdfConverter::new(
        config.pdf_conversion_endpoint.clone(),
        pdf_api_key,
        config.collaborator_timeout,
    )?);
    info!("PDF converter: {}", config.pdf_conversion_endpoint);

    if config.parser_api_endpoint.is_none() {
        warn!("PARSER_API_ENDPOINT is not set; parse endpoints will fail");
    }
    let parser = Arc::new(HttpCvParser::new(
        config.parser_api_endpoint.clone(),
        config.collaborator_timeout,
    )?);

    let auth = match secrets.get(&config.jwt_secret_name).await {
        Ok(secret) => Some(Arc::new(TokenVerifier::new(&secret))),
        Err(e) => {
            warn!("Authentication disabled: {e}");
            None
        }
    };

    // Build app state
    let state = AppState {
        profiles: Arc::new(ProfileCache::new(config.profile.clone())),
        config: config.clone(),
        storage,
        converter,
        parser,
        renderer: Arc::new(DocxTemplateRenderer),
        auth,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS / GCS interop (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "cv-generator-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.s3_region.clone()))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
