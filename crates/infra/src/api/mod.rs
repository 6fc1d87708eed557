//! Portal API plumbing
//!
//! - **[`backend`]**: the HTTP session backend (token refresh and logout)
//! - **[`client`]**: authenticated API calls with one renewal on 401
//! - **[`auth`]**: token provider seam between the client and the session
//! - **[`errors`]**: status classification and retry metadata

pub mod auth;
pub mod backend;
pub mod client;
pub mod errors;

pub use auth::AccessTokenProvider;
pub use backend::HttpSessionBackend;
pub use client::{ApiClient, ApiClientBuilder};
pub use errors::ApiError;
