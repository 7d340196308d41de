//! Library error type

use axum::response::{IntoResponse, Response};
use reqwest::StatusCode;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("content API returned {status} for {url}")]
    Status { status: StatusCode, url: String },

    #[error("failed to decode content API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid record {id}: {reason}")]
    InvalidRecord { id: String, reason: String },

    #[error("content API at {0} has no master ref")]
    MissingMasterRef(String),

    #[error("a page load is already in flight")]
    LoadInFlight,

    #[error(transparent)]
    Template(#[from] tera::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_record(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidRecord {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Whether the failure came from the content service rather than from us
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Http(_)
                | Error::Status { .. }
                | Error::Decode(_)
                | Error::InvalidRecord { .. }
                | Error::MissingMasterRef(_)
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if self.is_upstream() {
            tracing::error!(%self, "content API error");
            (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
        } else {
            tracing::error!(%self, "internal error");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
