//! Unverified JWT payload decoding
//!
//! A bearer token is `header.payload.signature`, each segment base64url
//! encoded. Only the payload is read here. Backends in the wild are loose
//! about numeric claims, so `exp` and `user_id` accept integers, floats and
//! numeric strings.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors produced while reading a token payload
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("token must have three dot-separated segments, found {0}")]
    Malformed(usize),

    #[error("token payload is not valid base64url: {0}")]
    Encoding(String),

    #[error("token payload is not valid JSON: {0}")]
    Payload(String),
}

/// Claims the session lifecycle cares about
///
/// Every field is optional; a token without `exp` decodes fine but is never
/// considered valid by the validator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Expiry as Unix seconds
    #[serde(default, deserialize_with = "lenient_i64")]
    pub exp: Option<i64>,

    /// Issued-at as Unix seconds
    #[serde(default, deserialize_with = "lenient_i64")]
    pub iat: Option<i64>,

    #[serde(default, alias = "userId", deserialize_with = "lenient_i64")]
    pub user_id: Option<i64>,

    #[serde(default)]
    pub sub: Option<String>,
}

impl TokenClaims {
    /// Seconds from `now` until expiry, negative once expired
    #[must_use]
    pub fn seconds_until_expiry(&self, now: i64) -> Option<i64> {
        self.exp.map(|exp| exp.saturating_sub(now))
    }
}

/// Decode the payload segment of a bearer token
///
/// # Errors
///
/// Returns [`ClaimsError`] when the token does not have three segments, the
/// payload is not base64url or the decoded bytes are not a JSON object with
/// the expected claim types.
pub fn decode_claims(token: &str) -> Result<TokenClaims, ClaimsError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(ClaimsError::Malformed(segments.len()));
    }

    // Some issuers keep the padding; the no-pad engine rejects it.
    let payload = segments[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|e| ClaimsError::Encoding(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| ClaimsError::Payload(e.to_string()))
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    let raw = Option::<Raw>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Raw::Int(value)) => Some(value),
        #[allow(clippy::cast_possible_truncation)]
        Some(Raw::Float(value)) if value.is_finite() => Some(value.trunc() as i64),
        Some(Raw::Text(text)) => text.trim().parse::<i64>().ok(),
        _ => None,
    })
}
