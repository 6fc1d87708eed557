//! Where to send the user after login and logout

use taxdesk_domain::RouteConfig;

/// Path component of `location`, without query string or fragment
fn path_of(location: &str) -> &str {
    let end = location.find(['?', '#']).unwrap_or(location.len());
    &location[..end]
}

/// True when `location` belongs to the sign-in flow
pub fn is_auth_page(location: &str, routes: &RouteConfig) -> bool {
    let path = path_of(location).trim_end_matches('/');
    routes.auth_paths.iter().any(|auth| auth.trim_end_matches('/') == path)
}

/// Login URL carrying `current` as the return hint
///
/// No hint is added when the user is already on an auth page or on the
/// default landing page.
pub fn login_redirect(current: &str, routes: &RouteConfig) -> String {
    let current = current.trim();
    let skip_hint = current.is_empty()
        || path_of(current) == routes.default_redirect
        || is_auth_page(current, routes);

    if skip_hint {
        return routes.login_path.clone();
    }

    format!("{}?{}={}", routes.login_path, routes.redirect_param, urlencoding::encode(current))
}

/// Sanitized post-login destination
///
/// Only local absolute paths are honoured; anything that could leave the
/// portal or loop back into the sign-in flow falls back to the default.
pub fn post_login_target(return_to: Option<&str>, routes: &RouteConfig) -> String {
    return_to
        .map(str::trim)
        .filter(|target| is_local_path(target) && !is_auth_page(target, routes))
        .map_or_else(|| routes.default_redirect.clone(), str::to_string)
}

fn is_local_path(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.starts_with("/\\")
        && !path_of(target).contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes() -> RouteConfig {
        RouteConfig::default()
    }

    #[test]
    fn test_login_redirect_carries_current_path() {
        assert_eq!(
            login_redirect("/tax-solutions/business?step=2", &routes()),
            "/login?redirect=%2Ftax-solutions%2Fbusiness%3Fstep%3D2"
        );
    }

    #[test]
    fn test_login_redirect_skips_hint_on_auth_pages() {
        for page in ["/login", "/register", "/verify?code=1", "/reset-password/", "/"] {
            assert_eq!(login_redirect(page, &routes()), "/login", "{page}");
        }
    }

    #[test]
    fn test_post_login_target_accepts_local_paths() {
        assert_eq!(post_login_target(Some("/booking?slot=3"), &routes()), "/booking?slot=3");
    }

    #[test]
    fn test_post_login_target_rejects_unsafe_targets() {
        let unsafe_targets = [
            None,
            Some(""),
            Some("https://evil.example.com"),
            Some("//evil.example.com/path"),
            Some("/\\evil.example.com"),
            Some("booking"),
            Some("/login?redirect=%2Fbooking"),
            Some("/forgot-password"),
        ];

        for target in unsafe_targets {
            assert_eq!(post_login_target(target, &routes()), "/", "{target:?}");
        }
    }

    #[test]
    fn test_custom_routes() {
        let routes = RouteConfig {
            login_path: "/signin".into(),
            redirect_param: "next".into(),
            auth_paths: vec!["/signin".into()],
            ..RouteConfig::default()
        };

        assert_eq!(login_redirect("/payment", &routes), "/signin?next=%2Fpayment");
        assert_eq!(login_redirect("/signin", &routes), "/signin");
    }
}
