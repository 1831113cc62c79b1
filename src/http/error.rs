use crate::git::Error as SyncError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ring::error::Unspecified;
use serde_json::{error::Error as SerdeError, json};

pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    UnsupportedMediaType,
    InvalidPayload,
    SignatureMismatch,
    RepositoryNotFound,
    Sync(SyncError),
}

impl Error {
    /// A short identifier for the failure
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnsupportedMediaType => "unsupported_media_type",
            Error::InvalidPayload => "invalid_payload",
            Error::SignatureMismatch => "signature_mismatch",
            Error::RepositoryNotFound => "repository_not_found",
            Error::Sync(_) => "sync",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Error::UnsupportedMediaType => (StatusCode::BAD_REQUEST, "unsupported content type"),
            Error::InvalidPayload => (StatusCode::BAD_REQUEST, "invalid payload"),
            Error::SignatureMismatch => (StatusCode::FORBIDDEN, "forbidden"),
            Error::RepositoryNotFound | Error::Sync(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };

        let body = Json(json!({ "message": message }));
        (status, body).into_response()
    }
}

impl From<SerdeError> for Error {
    fn from(_: SerdeError) -> Self {
        Error::InvalidPayload
    }
}

impl From<Unspecified> for Error {
    fn from(_: Unspecified) -> Self {
        Error::SignatureMismatch
    }
}

impl From<SyncError> for Error {
    fn from(e: SyncError) -> Self {
        Error::Sync(e)
    }
}
