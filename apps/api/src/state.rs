use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::clients::converter::PdfConverter;
use crate::clients::parser::CvParser;
use crate::config::Config;
use crate::profiles::ProfileCache;
use crate::render::TemplateRenderer;
use crate::storage::BlobStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every collaborator sits behind a trait object so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn BlobStore>,
    pub converter: Arc<dyn PdfConverter>,
    pub parser: Arc<dyn CvParser>,
    pub renderer: Arc<dyn TemplateRenderer>,
    pub profiles: Arc<ProfileCache>,
    /// `None` disables bearer-token checks.
    pub auth: Option<Arc<TokenVerifier>>,
}
