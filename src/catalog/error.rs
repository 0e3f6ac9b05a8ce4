use thiserror::Error;

/// Why a catalog fetch produced no usable data.
///
/// Every variant is recoverable: callers release their bookkeeping and carry on
/// with whatever attributes they already have.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("transport error: {0}")]
  Transport(String),
  #[error("unexpected HTTP status {0}")]
  Status(u16),
  #[error("malformed response: {0}")]
  Malformed(String),
  #[error("request timed out")]
  Timeout,
}

impl From<reqwest::Error> for FetchError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_timeout() {
      FetchError::Timeout
    } else if let Some(status) = e.status() {
      FetchError::Status(status.as_u16())
    } else {
      FetchError::Transport(e.to_string())
    }
  }
}

impl From<tokio::time::error::Elapsed> for FetchError {
  fn from(_: tokio::time::error::Elapsed) -> Self {
    FetchError::Timeout
  }
}
