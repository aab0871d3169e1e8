use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use linkstash_db::Credential;
use linkstash_types::api::Claims;

use crate::error::ApiError;
use crate::state::AppState;

/// HS256 signing keys and token lifetime.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, credential: &Credential) -> Result<String, ApiError> {
        let expires = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| ApiError::Internal(format!("token lifetime {} overflows", self.ttl)))?;
        let exp = usize::try_from(expires.timestamp())
            .map_err(|_| ApiError::Internal(format!("token lifetime {} is negative", self.ttl)))?;

        let claims = Claims {
            sub: credential.user_hash.clone(),
            username: credential.username.clone(),
            exp,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("token encoding failed: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| ApiError::InvalidToken)
    }
}

/// Validate the bearer token and stash its claims in request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(auth) = bearer.map_err(|_| ApiError::NotAuthenticated)?;

    let claims = state.tokens.verify(auth.token())?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
