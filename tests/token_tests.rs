use chrono::{Duration, TimeZone, Utc};
use film_catalog::auth::{self, TOKEN_TTL_SECS, TokenError};

const SECRET: &str = "super-secure-test-secret-value-local";

// All token tests pin the clock explicitly; nothing here depends on the
// system time, so expiry boundaries can be asserted to the second.
fn issued_at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
}

#[test]
fn test_token_roundtrip_preserves_identity() {
    let now = issued_at();
    let token = auth::issue_token(SECRET, 42, "alice", true, now).expect("issue failed");

    let claims = auth::verify_token(SECRET, &token, now).expect("verify failed");

    assert_eq!(claims.sub, 42);
    assert_eq!(claims.username, "alice");
    assert!(claims.admin);
    assert_eq!(claims.exp, claims.iat + TOKEN_TTL_SECS as usize);
}

#[test]
fn test_token_valid_just_before_expiry() {
    let now = issued_at();
    let token = auth::issue_token(SECRET, 1, "bob", false, now).expect("issue failed");

    // One second before the boundary the token still verifies.
    let later = now + Duration::seconds(TOKEN_TTL_SECS - 1);
    let claims = auth::verify_token(SECRET, &token, later).expect("should still verify");
    assert_eq!(claims.sub, 1);
    assert!(!claims.admin);
}

#[test]
fn test_token_expired_exactly_at_ttl() {
    let now = issued_at();
    let token = auth::issue_token(SECRET, 1, "bob", false, now).expect("issue failed");

    // The boundary itself is already expired: valid strictly before iat + TTL.
    let at_ttl = now + Duration::seconds(TOKEN_TTL_SECS);
    assert_eq!(
        auth::verify_token(SECRET, &token, at_ttl).unwrap_err(),
        TokenError::Expired
    );

    let past_ttl = now + Duration::hours(48);
    assert_eq!(
        auth::verify_token(SECRET, &token, past_ttl).unwrap_err(),
        TokenError::Expired
    );
}

#[test]
fn test_token_rejected_with_wrong_secret() {
    let now = issued_at();
    let token = auth::issue_token(SECRET, 7, "carol", false, now).expect("issue failed");

    assert_eq!(
        auth::verify_token("a-completely-different-secret", &token, now).unwrap_err(),
        TokenError::SignatureInvalid
    );
}

#[test]
fn test_tampered_payload_fails_signature_check() {
    let now = issued_at();
    let token = auth::issue_token(SECRET, 7, "carol", false, now).expect("issue failed");

    // Flip one character inside the payload segment. The claims change, the
    // signature does not, so verification must fail before expiry is even
    // considered.
    let mut parts: Vec<String> = token.split('.').map(str::to_owned).collect();
    assert_eq!(parts.len(), 3);
    let mut payload: Vec<u8> = parts[1].clone().into_bytes();
    let idx = payload.len() / 2;
    payload[idx] = if payload[idx] == b'A' { b'B' } else { b'A' };
    parts[1] = String::from_utf8(payload).unwrap();
    let tampered = parts.join(".");

    assert_eq!(
        auth::verify_token(SECRET, &tampered, now).unwrap_err(),
        TokenError::SignatureInvalid
    );
}

#[test]
fn test_garbage_token_is_malformed() {
    let now = issued_at();
    assert_eq!(
        auth::verify_token(SECRET, "not-a-token-at-all", now).unwrap_err(),
        TokenError::Malformed
    );
    assert_eq!(
        auth::verify_token(SECRET, "", now).unwrap_err(),
        TokenError::Malformed
    );
}

#[test]
fn test_wrong_claim_shape_is_malformed() {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::Serialize;

    // Correctly signed, but the claims carry none of the expected fields.
    #[derive(Serialize)]
    struct OtherClaims {
        foo: String,
    }

    let token = encode(
        &Header::default(),
        &OtherClaims { foo: "bar".into() },
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    assert_eq!(
        auth::verify_token(SECRET, &token, issued_at()).unwrap_err(),
        TokenError::Malformed
    );
}

#[test]
fn test_session_cookie_roundtrip_through_headers() {
    use axum::http::{HeaderMap, HeaderValue, header};

    let cookie = auth::session_cookie("abc.def.ghi");
    // The Set-Cookie value starts with the pair; attributes follow.
    let pair = cookie.split(';').next().unwrap();

    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_str(&format!("theme=dark; {pair}; lang=en")).unwrap(),
    );

    assert_eq!(auth::session_token(&headers).as_deref(), Some("abc.def.ghi"));
}

#[test]
fn test_session_token_absent_without_cookie() {
    use axum::http::{HeaderMap, HeaderValue, header};

    let mut headers = HeaderMap::new();
    assert!(auth::session_token(&headers).is_none());

    // Other cookies alone do not produce a session.
    headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
    assert!(auth::session_token(&headers).is_none());
}
