//! Error handling in [`kube-lister`][crate]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Possible errors from a single request against the apiserver
#[derive(Error, Debug)]
pub enum Error {
    /// ApiError for when things fail
    ///
    /// Returned when the apiserver answered with a non-2xx status.
    /// The body is parsed into an [`ErrorResponse`] when possible.
    #[error("ApiError: {0} ({0:?})")]
    Api(#[source] ErrorResponse),

    /// Service error
    ///
    /// An error bubbling out of the underlying tower service stack,
    /// typically a connection or middleware failure.
    #[error("ServiceError: {0}")]
    Service(#[source] tower::BoxError),

    /// Http based error
    #[error("HttpError: {0}")]
    HttpError(#[source] http::Error),

    /// UTF-8 Error
    #[error("UTF-8 Error: {0}")]
    FromUtf8(#[source] std::string::FromUtf8Error),

    /// Common error case when deserializing a discovery payload
    #[error("Error deserializing response")]
    SerdeError(#[source] serde_json::Error),
}

/// An error response from the API.
///
/// This is the `Status` object the apiserver returns on failed requests.
#[derive(Error, Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[error("{message}: {reason}")]
pub struct ErrorResponse {
    /// The status
    pub status: String,
    /// A message about the error
    #[serde(default)]
    pub message: String,
    /// The reason for the error
    #[serde(default)]
    pub reason: String,
    /// The error code
    pub code: u16,
}
