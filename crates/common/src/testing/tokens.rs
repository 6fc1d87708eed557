//! Bearer token fixtures
//!
//! Tokens produced here carry a real base64url JSON payload and a dummy
//! signature, which is all the client-side validator reads.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{json, Value};

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Build an unsigned token whose payload is `claims`
#[must_use]
pub fn token_with_claims(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(HEADER);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.test-signature")
}

/// Build a token for user 1 expiring at `exp` (Unix seconds)
#[must_use]
pub fn token_expiring_at(exp: i64) -> String {
    token_with_claims(&json!({ "user_id": 1, "exp": exp }))
}

/// Build a token with no `exp` claim
#[must_use]
pub fn token_without_expiry() -> String {
    token_with_claims(&json!({ "user_id": 1 }))
}
