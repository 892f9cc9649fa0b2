use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::reply;
use crate::errors::{InvalidRequest, NotFound};

/// Why a request failed, as the client gets to see it
#[derive(Debug)]
pub enum ApiError {
    NotFound(&'static str),
    BadRequest(String),
    PayloadTooLarge,
    Internal(anyhow::Error),
}

impl ApiError {
    /// Replaces the message of a not found error
    pub fn not_found(self, message: &'static str) -> Self {
        match self {
            Self::NotFound(_) => Self::NotFound(message),
            err => err,
        }
    }

    fn rejected(status: StatusCode, reason: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::PayloadTooLarge;
        }
        Self::BadRequest(reason)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if err.is::<NotFound>() {
            log::debug!("not found: {err:#}");
            return Self::NotFound("Gist not found");
        }

        match err.downcast::<InvalidRequest>() {
            Ok(InvalidRequest(reason)) => Self::BadRequest(reason),
            Err(err) => Self::Internal(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(message) => reply::failure(StatusCode::NOT_FOUND, message),
            Self::BadRequest(reason) => reply::failure(
                StatusCode::BAD_REQUEST,
                &format!("Invalid request: {reason}"),
            ),
            Self::PayloadTooLarge => {
                reply::failure(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
            }
            Self::Internal(err) => {
                log::error!("{err:?}");
                reply::failure(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
            }
        }
    }
}
