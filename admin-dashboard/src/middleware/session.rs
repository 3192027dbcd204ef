use crate::middleware::route_guard::login_redirect;
use crate::models::Identity;
use crate::services::session_store::SessionStore;
use crate::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tower_sessions::Session;

/// Session store bound to the request's session record and cookies, already
/// restored.
pub type RequestSession = SessionStore<Session>;

#[async_trait]
impl FromRequestParts<AppState> for SessionStore<Session> {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|rejection| rejection.into_response())?;
        let jar = CookieJar::from_headers(&parts.headers);

        let mut store = SessionStore::new(
            state.identities.clone(),
            session,
            jar,
            state.session_cookie.clone(),
        );
        store.restore_session().await;

        Ok(store)
    }
}

/// The logged-in user of a dashboard page.
///
/// The route guard only checks that the cookie exists. When the stored
/// session is gone (expired record, server restart) the stale cookie is
/// expired here and the user is sent back to the login page.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let mut store = RequestSession::from_request_parts(parts, state).await?;

        if let Some(identity) = store.identity().cloned() {
            return Ok(CurrentUser(identity));
        }

        tracing::warn!(
            path = %parts.uri.path(),
            "Session cookie present without a stored identity; clearing it"
        );
        store.logout().await;

        let location = login_redirect(parts.uri.path());
        Err((store.into_jar(), Redirect::to(&location)).into_response())
    }
}
