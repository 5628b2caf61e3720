//! Failures reported by the remote posts service.

use thiserror::Error;

/// Low-level failure of a single remote call.
///
/// This is the raw material for [`crate::sync::classify`]; callers of the
/// repository never see it directly.
#[derive(Debug, Error)]
pub enum RemoteError {
  /// The request/response cycle did not complete (connect, DNS, timeout,
  /// interrupted body).
  #[error("Transport failure: {0}")]
  Transport(String),

  /// The server answered with a non-success status.
  #[error("Request failed with status {code} {message}")]
  Status { code: u16, message: String },

  /// A success status without the body the call requires.
  #[error("Response {code} {message} had no body")]
  MissingBody { code: u16, message: String },

  /// A success status whose body could not be parsed.
  #[error("Response {code} {message} had an invalid body: {source}")]
  MalformedBody {
    code: u16,
    message: String,
    #[source]
    source: serde_json::Error,
  },

  /// The request could not be built.
  #[error("Invalid request: {0}")]
  Request(String),
}

impl RemoteError {
  /// Whether the failure happened before a response could be interpreted.
  pub fn is_transport(&self) -> bool {
    matches!(self, Self::Transport(_))
  }

  /// Status code and reason phrase of a response that was received but
  /// could not be used.
  pub fn failed_response(&self) -> Option<(u16, &str)> {
    match self {
      Self::Status { code, message }
      | Self::MissingBody { code, message }
      | Self::MalformedBody { code, message, .. } => Some((*code, message.as_str())),
      Self::Transport(_) | Self::Request(_) => None,
    }
  }
}

impl From<reqwest::Error> for RemoteError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_builder() {
      Self::Request(e.to_string())
    } else {
      Self::Transport(e.to_string())
    }
  }
}

impl From<url::ParseError> for RemoteError {
  fn from(e: url::ParseError) -> Self {
    Self::Request(e.to_string())
  }
}
