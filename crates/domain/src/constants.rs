//! Application constants
//!
//! Centralized location for all domain-level constants used by the session
//! lifecycle and its adapters.

// Token timing
pub const DEFAULT_GRACE_BUFFER_SECS: i64 = 30;
pub const DEFAULT_REFRESH_LEAD_SECS: i64 = 300; // 5 minutes before expiry
pub const DEFAULT_REVALIDATE_INTERVAL_SECS: u64 = 60;

// Persisted record keys
pub const TOKEN_STORAGE_KEY: &str = "token";
pub const USER_STORAGE_KEY: &str = "user";

// Backend API
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const REFRESH_TOKEN_PATH: &str = "/auth/refresh-token";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// Navigation
pub const LOGIN_ROUTE: &str = "/login";
pub const DEFAULT_REDIRECT_ROUTE: &str = "/";
pub const REDIRECT_QUERY_PARAM: &str = "redirect";

/// Pages that belong to the sign-in flow; logout never points back at them.
pub const AUTH_ROUTES: &[&str] = &[
    "/login",
    "/register",
    "/verify",
    "/forgot-password",
    "/reset-password",
    "/complete-registration",
];

/// Route prefixes that require an authenticated session.
pub const PROTECTED_ROUTE_PREFIXES: &[&str] = &[
    "/tax-solutions",
    "/payment",
    "/booking",
    "/appointments",
    "/smsf-establishment-payment",
    "/company-registration-payment",
];

// User-facing notices
pub const SESSION_EXPIRED_NOTICE: &str = "Your session has expired. Please log in again.";

// Local persistence
pub const DEFAULT_STORAGE_FILE: &str = "taxdesk-session.json";
pub const KEYCHAIN_SERVICE_NAME: &str = "TaxDesk.session";
