// src/auth.rs
use crate::core::AuthContext;
use crate::environment::AuthSettings;
use crate::web::GatewayState;
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::{Request, State};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Caller (user or service) id
    pub tenant_id: String,
    pub exp: usize,
    #[serde(default)]
    pub iat: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

pub struct AuthConfig {
    secret: String,
    issuer: Option<String>,
}

impl AuthConfig {
    pub fn new(secret: impl Into<String>, issuer: Option<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer,
        }
    }

    pub fn from_settings(settings: &AuthSettings) -> Result<Self> {
        let secret = settings.jwt_secret()?;
        Ok(Self::new(secret, settings.issuer.clone()))
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    /// HS256 token for `subject` acting in `tenant_id`.
    pub fn issue_token(&self, subject: &str, tenant_id: &str, ttl_hours: i64) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            tenant_id: tenant_id.to_string(),
            exp: (now + Duration::hours(ttl_hours)).timestamp().max(0) as usize,
            iat: now.timestamp().max(0) as usize,
            iss: self.issuer.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to sign token")
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .context("Token verification failed")?;

        if token_data.claims.tenant_id.trim().is_empty() {
            anyhow::bail!("Token carries an empty tenant_id");
        }
        Ok(token_data.claims)
    }
}

/// Caller of the raw tool surface and the agent endpoints, resolved from a bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedTenant {
    pub subject: String,
    pub tenant_id: String,
    pub token: String,
}

impl AuthenticatedTenant {
    /// The context to bind for the rest of the request.
    pub fn context(&self) -> AuthContext {
        AuthContext::for_tenant(self.token.clone(), self.tenant_id.clone())
    }
}

/// Why the last guard on this request refused it; read by the 401 catcher.
#[derive(Debug, Default)]
pub struct AuthFailure(pub Option<AuthError>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedTenant {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let fail = |error: AuthError| {
            req.local_cache(|| AuthFailure(Some(error)));
            Outcome::Error((Status::Unauthorized, error))
        };

        let auth_config = match req.guard::<&State<GatewayState>>().await {
            Outcome::Success(state) => &state.auth,
            Outcome::Error((status, _)) => {
                return Outcome::Error((status, AuthError::NotConfigured))
            }
            Outcome::Forward(f) => return Outcome::Forward(f),
        };

        let token = match req.headers().get_one("Authorization") {
            Some(header) if header.starts_with("Bearer ") => header[7..].trim(),
            Some(_) => {
                warn!("Invalid Authorization header format");
                return fail(AuthError::InvalidToken);
            }
            None => {
                warn!("Missing Authorization header");
                return fail(AuthError::MissingToken);
            }
        };

        let claims = match auth_config.verify_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!("Token verification failed: {:#}", e);
                return fail(AuthError::TokenVerificationFailed);
            }
        };

        info!("{} authenticated for tenant: {}", claims.sub, claims.tenant_id);

        Outcome::Success(AuthenticatedTenant {
            subject: claims.sub,
            tenant_id: claims.tenant_id,
            token: token.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    TokenVerificationFailed,
    NotConfigured,
}

impl AuthError {
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "Authorization token required",
            AuthError::InvalidToken => "Invalid authorization token format",
            AuthError::TokenVerificationFailed => "Token verification failed",
            AuthError::NotConfigured => "Authentication is not configured on this gateway",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::TokenVerificationFailed => "TOKEN_VERIFICATION_FAILED",
            AuthError::NotConfigured => "AUTH_NOT_CONFIGURED",
        }
    }
}

// Optional auth guard that doesn't fail if no auth is provided
pub struct OptionalAuth {
    pub tenant: Option<AuthenticatedTenant>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for OptionalAuth {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match AuthenticatedTenant::from_request(req).await {
            Outcome::Success(auth) => Outcome::Success(OptionalAuth { tenant: Some(auth) }),
            _ => Outcome::Success(OptionalAuth { tenant: None }),
        }
    }
}
