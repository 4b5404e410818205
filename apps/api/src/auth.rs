//! Bearer-token authentication. Tokens are HS256 JWTs issued for the
//! `authenticated` audience; a token is accepted when its signature, expiry
//! and audience check out and it names a subject. There is no further
//! authorization policy.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

use crate::errors::AppError;
use crate::state::AppState;

const AUDIENCE: &str = "authenticated";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("authentication token has expired")]
    Expired,

    #[error("invalid authentication token: {0}")]
    Invalid(String),

    #[error("token missing 'sub' claim")]
    MissingSubject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    pub sub: Option<String>,
    pub email: Option<String>,
}

pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUDIENCE]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(e.to_string()),
            }
        })?;

        match data.claims.sub.as_deref() {
            Some(sub) if !sub.is_empty() => Ok(data.claims),
            _ => Err(AuthError::MissingSubject),
        }
    }
}

/// Accepts exactly `Bearer <token>`; the scheme is case-insensitive.
pub fn extract_bearer(header: Option<&str>) -> Option<&str> {
    let mut parts = header?.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token)
}

/// Rejects requests without a valid bearer token. A no-op when the state
/// carries no verifier.
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(verifier) = &state.auth {
        let header = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let token = extract_bearer(header).ok_or(AuthError::MissingToken)?;
        let claims = verifier.verify(token)?;
        tracing::debug!(
            "Authenticated subject {} ({})",
            claims.sub.unwrap_or_default(),
            claims.email.unwrap_or_default()
        );
    }
    Ok(next.run(request).await)
}
