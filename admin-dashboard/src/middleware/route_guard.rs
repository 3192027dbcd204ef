use crate::services::session_store::SESSION_KEY;
use axum::{
    extract::Request,
    http::Uri,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const CALLBACK_PARAM: &str = "callbackUrl";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Requires a session.
    Protected,
    /// Only reachable without a session.
    AuthOnly,
    Public,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectToLogin { callback_url: String },
    RedirectToDashboard,
}

impl GuardDecision {
    pub fn location(&self) -> Option<String> {
        match self {
            GuardDecision::Allow => None,
            GuardDecision::RedirectToLogin { callback_url } => Some(login_redirect(callback_url)),
            GuardDecision::RedirectToDashboard => Some(DASHBOARD_PATH.to_string()),
        }
    }
}

pub fn classify(path: &str) -> RouteClass {
    if is_dashboard_path(path) {
        RouteClass::Protected
    } else if path == LOGIN_PATH {
        RouteClass::AuthOnly
    } else {
        RouteClass::Public
    }
}

fn is_dashboard_path(path: &str) -> bool {
    match path.strip_prefix(DASHBOARD_PATH) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Decide from the path and the raw `adminUser` cookie value. The value is
/// never parsed; any non-empty value counts as a session.
pub fn evaluate(path: &str, session_cookie: Option<&str>) -> GuardDecision {
    let authenticated = session_cookie.is_some_and(|value| !value.is_empty());

    match (classify(path), authenticated) {
        (RouteClass::Protected, false) => GuardDecision::RedirectToLogin {
            callback_url: path.to_string(),
        },
        (RouteClass::AuthOnly, true) => GuardDecision::RedirectToDashboard,
        _ => GuardDecision::Allow,
    }
}

/// `/login?callbackUrl=<path>`, encoding each path segment but keeping the
/// slashes readable.
pub fn login_redirect(callback_url: &str) -> String {
    let encoded = callback_url
        .split('/')
        .map(|segment| match urlencoding::decode(segment) {
            Ok(decoded) => urlencoding::encode(&decoded).into_owned(),
            Err(_) => urlencoding::encode(segment).into_owned(),
        })
        .collect::<Vec<_>>()
        .join("/");

    format!("{}?{}={}", LOGIN_PATH, CALLBACK_PARAM, encoded)
}

/// Where to send a user after login: a local, non-login path, or the dashboard.
pub fn post_login_target(callback_url: Option<&str>) -> String {
    callback_url
        .filter(|url| is_local_path(url))
        .map(str::to_string)
        .unwrap_or_else(|| DASHBOARD_PATH.to_string())
}

/// Origin-form path (optionally with a query) that is safe to put in a
/// `Location` header. Control characters are rejected because browsers strip
/// them, which can turn `/\t/host` into a protocol-relative URL.
fn is_local_path(url: &str) -> bool {
    if !url.starts_with('/')
        || url.starts_with("//")
        || url.contains('\\')
        || url.chars().any(char::is_control)
    {
        return false;
    }

    match url.parse::<Uri>() {
        Ok(uri) => {
            uri.scheme().is_none()
                && uri.authority().is_none()
                && classify(uri.path()) != RouteClass::AuthOnly
        }
        Err(_) => false,
    }
}

pub async fn route_guard(jar: CookieJar, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let decision = evaluate(&path, jar.get(SESSION_KEY).map(|cookie| cookie.value()));

    match decision.location() {
        None => next.run(request).await,
        Some(location) => {
            tracing::debug!(path = %path, location = %location, "Route guard redirect");
            Redirect::to(&location).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOKIE: Option<&str> = Some(r#"{"id":"1"}"#);

    #[test]
    fn test_classification() {
        assert_eq!(classify("/dashboard"), RouteClass::Protected);
        assert_eq!(classify("/dashboard/products/PROD-1"), RouteClass::Protected);
        assert_eq!(classify("/login"), RouteClass::AuthOnly);
        assert_eq!(classify("/login/help"), RouteClass::Public);
        assert_eq!(classify("/dashboards"), RouteClass::Public);
        assert_eq!(classify("/"), RouteClass::Public);
        assert_eq!(classify("/health"), RouteClass::Public);
    }

    #[test]
    fn test_public_paths_always_allowed() {
        for path in ["/", "/health", "/metrics", "/static/dashboard.css", "/dashboardx"] {
            assert_eq!(evaluate(path, None), GuardDecision::Allow, "{}", path);
            assert_eq!(evaluate(path, COOKIE), GuardDecision::Allow, "{}", path);
        }
    }

    #[test]
    fn test_protected_without_cookie_redirects_with_callback() {
        let decision = evaluate("/dashboard/anything", None);
        assert_eq!(
            decision,
            GuardDecision::RedirectToLogin {
                callback_url: "/dashboard/anything".to_string()
            }
        );
        assert_eq!(
            decision.location().as_deref(),
            Some("/login?callbackUrl=/dashboard/anything")
        );
    }

    #[test]
    fn test_empty_cookie_is_not_a_session() {
        assert!(matches!(
            evaluate("/dashboard", Some("")),
            GuardDecision::RedirectToLogin { .. }
        ));
        assert_eq!(evaluate("/login", Some("")), GuardDecision::Allow);
    }

    #[test]
    fn test_protected_with_any_cookie_allowed() {
        assert_eq!(evaluate("/dashboard/anything", COOKIE), GuardDecision::Allow);
        assert_eq!(evaluate("/dashboard", Some("garbage")), GuardDecision::Allow);
    }

    #[test]
    fn test_login_with_cookie_redirects_to_dashboard() {
        let decision = evaluate("/login", COOKIE);
        assert_eq!(decision, GuardDecision::RedirectToDashboard);
        assert_eq!(decision.location().as_deref(), Some("/dashboard"));
    }

    #[test]
    fn test_login_without_cookie_allowed() {
        assert_eq!(evaluate("/login", None), GuardDecision::Allow);
    }

    #[test]
    fn test_login_redirect_encodes_segments() {
        assert_eq!(
            login_redirect("/dashboard/products/a&b"),
            "/login?callbackUrl=/dashboard/products/a%26b"
        );
        assert_eq!(
            login_redirect("/dashboard/products/a%20b"),
            "/login?callbackUrl=/dashboard/products/a%20b"
        );
    }

    #[test]
    fn test_post_login_target() {
        assert_eq!(post_login_target(None), "/dashboard");
        assert_eq!(
            post_login_target(Some("/dashboard/products")),
            "/dashboard/products"
        );
        assert_eq!(post_login_target(Some("https://evil.example")), "/dashboard");
        assert_eq!(post_login_target(Some("//evil.example")), "/dashboard");
        assert_eq!(post_login_target(Some("/login")), "/dashboard");
        assert_eq!(post_login_target(Some("/login?callbackUrl=/x")), "/dashboard");
        assert_eq!(
            post_login_target(Some("/dashboard/products?page=2")),
            "/dashboard/products?page=2"
        );
    }

    #[test]
    fn test_post_login_target_rejects_control_characters() {
        assert_eq!(post_login_target(Some("/dashboard\n")), "/dashboard");
        assert_eq!(post_login_target(Some("/\t/evil.example")), "/dashboard");
        assert_eq!(post_login_target(Some("/dashboard\r\nSet-Cookie: x=1")), "/dashboard");
        assert_eq!(post_login_target(Some("/\\evil.example")), "/dashboard");
    }
}
