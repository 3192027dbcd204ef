use crate::middleware::route_guard::{post_login_target, LOGIN_PATH};
use crate::middleware::RequestSession;
use askama::Template;
use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub callback_url: Option<String>,
    pub email: String,
    pub error: Option<&'static str>,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "callbackUrl", default)]
    pub callback_url: Option<String>,
}

pub async fn login_page(Query(query): Query<LoginQuery>) -> impl IntoResponse {
    LoginTemplate {
        callback_url: query.callback_url,
        email: String::new(),
        error: None,
    }
}

pub async fn login_handler(
    mut session: RequestSession,
    Form(payload): Form<LoginRequest>,
) -> Response {
    if session.login(&payload.email, &payload.password).await {
        let target = post_login_target(payload.callback_url.as_deref());
        return (session.into_jar(), Redirect::to(&target)).into_response();
    }

    (
        StatusCode::UNPROCESSABLE_ENTITY,
        LoginTemplate {
            callback_url: payload.callback_url,
            email: payload.email,
            error: Some(INVALID_CREDENTIALS),
        },
    )
        .into_response()
}

pub async fn logout_handler(mut session: RequestSession) -> impl IntoResponse {
    session.logout().await;
    (session.into_jar(), Redirect::to(LOGIN_PATH))
}
