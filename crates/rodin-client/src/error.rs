use std::path::PathBuf;

use thiserror::Error;

use crate::types::JobStatus;

pub type Result<T> = std::result::Result<T, RodinError>;

/// Status and body of a failed vendor response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

/// Errors returned by the Rodin client
#[derive(Debug, Error)]
pub enum RodinError {
    /// Transport failure, timeout, or non-success status from a vendor call
    ///
    /// `response` is `None` when no response was received at all.
    #[error("{message}")]
    Api {
        message: String,
        response: Option<ApiResponse>,
    },

    /// The vendor answered with success but the body has an unexpected shape
    #[error("unexpected response from Rodin: {0}")]
    MalformedResponse(String),

    /// At least one job of the task ended as `Failed` or `Canceled`
    #[error("generation task failed (job statuses: {})", join_statuses(.statuses))]
    TaskFailed { statuses: Vec<JobStatus> },

    /// The request could not be built from the caller's parameters
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The client could not be built from its configuration
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// Creating the target directory or writing an asset failed
    #[error("filesystem error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RodinError {
    /// Normalize a reqwest error raised before a usable response arrived
    pub(crate) fn transport(endpoint: &str, error: &reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            format!("Timeout occurred calling {endpoint}: {error}")
        } else {
            format!("Request error occurred calling {endpoint}: {error}")
        };

        Self::Api {
            message,
            response: None,
        }
    }

    /// Consume a non-success response into an API error carrying its body
    pub(crate) async fn from_response(endpoint: &str, response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        Self::Api {
            message: format!("HTTP error occurred calling {endpoint}: {status}"),
            response: Some(ApiResponse {
                status: status.as_u16(),
                body,
            }),
        }
    }

    /// The vendor response that triggered this error, if any
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            Self::Api { response, .. } => response.as_ref(),
            _ => None,
        }
    }
}

fn join_statuses(statuses: &[JobStatus]) -> String {
    statuses.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
