use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Boxed error returned by a failing dynamic flag check.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Message carried by [`TrunkerError::NotAttached`].
pub const NOT_ATTACHED_MESSAGE: &str = "TrunkerError: flag snapshot not found on request. \
     Did you layer `trunker::attach` before `trunker::restrict`?";

/// Everything that can go wrong while configuring or running the gate.
///
/// A flag being inactive is not in here: that is a regular rejection
/// response, see [`ErrorOptions::reject`](crate::ErrorOptions::reject).
#[derive(Debug, Error)]
pub enum TrunkerError {
    #[error("{}", NOT_ATTACHED_MESSAGE)]
    NotAttached,

    #[error("Invalid value for flag {flag}: {value}. Only boolean values are supported.")]
    InvalidEnvValue { flag: String, value: String },

    #[error("TrunkerError: no flags configured. `flags` is required.")]
    MissingFlags,

    #[error("check for flag {flag} failed: {source}")]
    Check {
        flag: String,
        #[source]
        source: BoxError,
    },
}

impl IntoResponse for TrunkerError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "trunker gate failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
