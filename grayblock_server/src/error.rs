use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use grayblock::PixelateError;
use thiserror::Error;
use tracing::{error, warn};

/// Everything that can end a `/pixelate` request early.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Pixelate(#[from] PixelateError),

    #[error("multipart field `{}` is missing", crate::IMAGE_FIELD)]
    MissingImage,

    #[error("malformed upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("pixelation worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Pixelate(_) | ApiError::MissingImage => StatusCode::BAD_REQUEST,
            // Bad framing is a 400, an over-limit body a 413.
            ApiError::Multipart(err) => err.status(),
            ApiError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "pixelate request failed");
        } else {
            warn!(error = %self, %status, "rejected pixelate request");
        }
        (status, self.to_string()).into_response()
    }
}
