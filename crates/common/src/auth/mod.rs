//! Bearer token helpers
//!
//! The portal receives opaque JWT bearer tokens from the backend. The client
//! never verifies signatures; it only reads the payload to learn when the
//! token expires and whom it belongs to.
//!
//! - **[`claims`]**: Unverified payload decoding into [`TokenClaims`]

pub mod claims;

pub use claims::{decode_claims, ClaimsError, TokenClaims};
