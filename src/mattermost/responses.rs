use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::core::call::CallResponse;
use crate::core::errors::{AppError, ExceptionKind};

/// Maps a failure to what Mattermost shows the user.
/// Markdown exceptions are informational and go back as `ok`.
pub fn error_response(err: AppError) -> CallResponse {
    match err.kind() {
        Some(ExceptionKind::Markdown) => CallResponse::markdown(err.to_string()),
        _ => CallResponse::error(err.to_string()),
    }
}

/// Final step of every call handler.
pub fn render(path: &str, result: Result<CallResponse, AppError>) -> Response {
    match result {
        Ok(response) => Json(response).into_response(),
        Err(err) => {
            tracing::warn!(path = path, error = %err, "Call failed");
            let status = match err {
                AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                _ => StatusCode::OK,
            };
            (status, Json(error_response(err))).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::google::GoogleError;

    #[test]
    fn markdown_exceptions_render_as_ok() {
        let response = error_response(AppError::markdown("no session"));
        assert_eq!(response, CallResponse::markdown("no session"));
    }

    #[test]
    fn everything_else_renders_as_error_text() {
        assert_eq!(
            error_response(AppError::text("Google failed: boom")),
            CallResponse::error("Google failed: boom")
        );
        assert_eq!(
            error_response(AppError::BadRequest("Bad Request: code param not provided".into())),
            CallResponse::error("Bad Request: code param not provided")
        );
        assert_eq!(
            error_response(AppError::Google(GoogleError::MissingField("client_id"))),
            CallResponse::error("Google response is missing client_id")
        );
    }

    #[test]
    fn unauthorized_calls_get_401() {
        let response = render("/bindings", Err(AppError::Unauthorized("nope".into())));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = render("/bindings", Ok(CallResponse::ok()));
        assert_eq!(response.status(), StatusCode::OK);
    }
}
