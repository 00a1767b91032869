use std::path::PathBuf;
use thiserror::Error;

/// The only way a remote call can fail. The reason is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct RemoteCallFailure {
    reason: String,
}

impl RemoteCallFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Failure for a non-2xx answer; `message` is the envelope message if
    /// the body carried one.
    pub fn from_status(code: u16, message: Option<String>) -> Self {
        match message {
            Some(message) => Self::new(format!(
                "An error occurred - Error code: {code} ({message})"
            )),
            None => Self::new(format!("An error occurred - Error code: {code}")),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn into_reason(self) -> String {
        self.reason
    }
}

impl From<std::io::Error> for RemoteCallFailure {
    fn from(e: std::io::Error) -> Self {
        Self::new(format!("Connection failed: {e}"))
    }
}

impl From<hyper::Error> for RemoteCallFailure {
    fn from(e: hyper::Error) -> Self {
        Self::new(format!("HTTP error: {e}"))
    }
}

impl From<http::Error> for RemoteCallFailure {
    fn from(e: http::Error) -> Self {
        Self::new(format!("Invalid request: {e}"))
    }
}

impl From<serde_json::Error> for RemoteCallFailure {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("Malformed response: {e}"))
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
