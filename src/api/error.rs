//! Error types for DataDock API access.

use thiserror::Error;

use crate::data::export::ExportError;

/// Result alias for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors that can occur while talking to the DataDock backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// The request could not be sent or the connection failed.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("request to {url} failed with status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The response body did not have the expected shape.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// The backend answered `success: false`.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The download could not be prepared.
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl ApiError {
    /// Returns a short message suitable for a notification.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => {
                "Could not reach the DataDock server. Check your connection.".to_string()
            }
            Self::Status { status, .. } if *status == 404 => {
                "The requested dataset was not found.".to_string()
            }
            Self::Status { status, .. } => format!("The server returned an error ({status})."),
            Self::Decode(_) => "The server sent data in an unexpected format.".to_string(),
            Self::Rejected(message) => message.clone(),
            Self::Export(e) => e.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ApiError::Status {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            },
            None => ApiError::Network(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<crate::data::loader::Rejected>() {
            Ok(rejected) => ApiError::Rejected(rejected.0),
            Err(err) => ApiError::Decode(format!("{err:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::Rejected;

    #[test]
    fn rejections_survive_conversion() {
        let err: ApiError = anyhow::Error::from(Rejected("no access".into())).into();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "no access"));
        assert_eq!(err.user_message(), "no access");
    }

    #[test]
    fn decode_failures_keep_context() {
        let err: ApiError = anyhow::anyhow!("missing field").context("decoding 'data'").into();
        assert!(matches!(err, ApiError::Decode(ref m) if m.contains("missing field")));
    }

    #[test]
    fn empty_selection_message() {
        let err = ApiError::from(ExportError::EmptySelection);
        assert_eq!(err.user_message(), "select at least one column to export");
    }
}
