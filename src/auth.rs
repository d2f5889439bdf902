use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, StatusCode, header, request::Parts},
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{config::AppConfig, errors::Error};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "jwt";

/// Fixed session lifetime. A token issued at `iat` stops verifying once the
/// current time reaches `iat + TOKEN_TTL_SECS`.
pub const TOKEN_TTL_SECS: i64 = 60 * 60 * 24;

/// Claims
///
/// The identity assertion embedded in a session token. These claims are signed
/// by the server's secret and validated on every authenticated request; they
/// are never persisted server-side — the signed token *is* the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the storage-assigned id of the account.
    pub sub: i32,
    /// Username at issuance time, carried for logging and display.
    pub username: String,
    /// Whether the account holds the admin role.
    pub admin: bool,
    /// Issued At: timestamp when the token was created.
    pub iat: usize,
    /// Expiration Time: timestamp after which the token must not be accepted.
    pub exp: usize,
}

/// TokenError
///
/// The three ways verification can fail. The HTTP gate collapses all of them
/// to 401, but internal callers and tests branch on the precise kind.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature invalid")]
    SignatureInvalid,
    #[error("token expired")]
    Expired,
    #[error("token malformed")]
    Malformed,
}

/// Produces a compact signed token asserting the given identity, valid from
/// `now` until `now + TOKEN_TTL_SECS`. Pure function of (secret, claims, clock).
pub fn issue_token(
    secret: &str,
    user_id: i32,
    username: &str,
    is_admin: bool,
    now: DateTime<Utc>,
) -> Result<String, Error> {
    let iat = now.timestamp() as usize;
    let claims = Claims {
        sub: user_id,
        username: username.to_owned(),
        admin: is_admin,
        iat,
        exp: iat + TOKEN_TTL_SECS as usize,
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    Ok(encode(&Header::default(), &claims, &key)?)
}

/// Decodes and checks a session token: signature first, so a tampered token is
/// rejected before its content is interpreted, then expiry against the caller
/// supplied `now`. Taking the clock as an argument keeps verification a pure
/// function and lets tests pin time exactly.
pub fn verify_token(secret: &str, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    // Expiry is checked manually below against the injected clock, so the
    // library's own system-clock check is disabled.
    let mut validation = Validation::default();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        // Wrong shape, bad base64, unknown claim set: all malformed.
        _ => TokenError::Malformed,
    })?;

    if now.timestamp() as usize >= data.claims.exp {
        return Err(TokenError::Expired);
    }

    Ok(data.claims)
}

/// Renders the `Set-Cookie` value installing a session token.
pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; Max-Age={TOKEN_TTL_SECS}")
}

/// Renders the `Set-Cookie` value clearing the session.
pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0")
}

/// Extracts the raw session token from the request's Cookie header, if any.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|c| c.strip_prefix(SESSION_COOKIE).and_then(|r| r.strip_prefix('=')))
        .map(str::to_owned)
}

/// AuthUser
///
/// The resolved identity of an authenticated request — the output of the
/// session cookie surviving verification. Handlers and the tier middlewares
/// receive this struct instead of touching tokens themselves.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub is_admin: bool,
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any authenticated handler or middleware. The process:
///
/// 1. Pull the signing key from the shared AppConfig.
/// 2. Read the session cookie. Missing cookie → 401.
/// 3. Verify the token (signature, then expiry). Any failure → 401.
///
/// Authentication is stateless per request: no session store is consulted, and
/// the admin tier check happens elsewhere, only after this extractor succeeds.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        let token = session_token(&parts.headers).ok_or(StatusCode::UNAUTHORIZED)?;

        let claims = verify_token(&config.signing_key, &token, Utc::now()).map_err(|e| {
            // The caller-visible signal is uniform; the diagnostic is not.
            tracing::debug!("session rejected: {e}");
            StatusCode::UNAUTHORIZED
        })?;

        tracing::debug!("authenticated user={} user_id={}", claims.username, claims.sub);

        Ok(AuthUser {
            id: claims.sub,
            username: claims.username,
            is_admin: claims.admin,
        })
    }
}
