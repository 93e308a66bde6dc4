use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use tracing::info;

use crate::api::{APIResponse, ProxyError};

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(APIResponse::new_from_msg("ok"))
}

pub fn not_found(msg: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ProxyError::new(StatusCode::NOT_FOUND.as_u16(), msg)),
    )
        .into_response()
}

pub fn bad_request(msg: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ProxyError::new(StatusCode::BAD_REQUEST.as_u16(), msg)),
    )
        .into_response()
}

pub fn server_error(msg: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ProxyError::new(StatusCode::INTERNAL_SERVER_ERROR.as_u16(), msg)),
    )
        .into_response()
}

pub async fn fallback() -> Response {
    not_found("Page not found")
}
