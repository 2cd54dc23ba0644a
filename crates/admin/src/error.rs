//! HTTP mapping of core errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use recordops_core::Error;

/// Error returned by admin handlers, rendered as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::InvalidRequest(_) | Error::CsvParse(_) => StatusCode::BAD_REQUEST,
            Error::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Error::Busy(_) | Error::InvalidTransition(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Admin request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "Admin request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::invalid_request("x"), StatusCode::BAD_REQUEST),
            (Error::csv_parse("x"), StatusCode::BAD_REQUEST),
            (Error::unauthenticated("x"), StatusCode::UNAUTHORIZED),
            (Error::busy("x"), StatusCode::CONFLICT),
            (Error::storage("x"), StatusCode::INTERNAL_SERVER_ERROR),
            (
                Error::PartialImport { row: 2, completed: 1, cause: "x".into() },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }
}
