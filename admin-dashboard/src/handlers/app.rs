use crate::middleware::route_guard::{DASHBOARD_PATH, LOGIN_PATH};
use crate::services::SESSION_KEY;
use axum::response::Redirect;
use axum_extra::extract::cookie::CookieJar;

/// Send the visitor to the dashboard or the login page depending on the
/// session cookie.
pub async fn index(jar: CookieJar) -> Redirect {
    let authenticated = jar
        .get(SESSION_KEY)
        .is_some_and(|cookie| !cookie.value().is_empty());

    if authenticated {
        Redirect::to(DASHBOARD_PATH)
    } else {
        Redirect::to(LOGIN_PATH)
    }
}

pub async fn health_check() -> &'static str {
    "OK"
}
