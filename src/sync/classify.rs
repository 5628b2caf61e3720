//! Error taxonomy surfaced by the repository and the classifier that
//! produces it.

use color_eyre::Report;
use thiserror::Error;
use tokio::task::JoinError;

use crate::api::RemoteError;

/// Closed set of failures a repository operation can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
  /// The remote service could not be reached.
  #[error("Network error")]
  Network,

  /// The remote service answered, but not with something usable.
  #[error("API error {code}: {message}")]
  Api { code: u16, message: String },

  /// Anything else.
  #[error("Unknown error")]
  Unknown,
}

impl SyncError {
  /// Only transport faults are worth retrying automatically.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::Network)
  }
}

/// Everything that can go wrong inside an operation, before classification.
#[derive(Debug, Error)]
pub enum Failure {
  #[error(transparent)]
  Remote(#[from] RemoteError),

  #[error("Cache store failure: {0}")]
  Store(Report),

  #[error("Operation task failed: {0}")]
  Task(#[from] JoinError),
}

impl From<Report> for Failure {
  fn from(report: Report) -> Self {
    Self::Store(report)
  }
}

/// Map a failure onto the caller-facing taxonomy.
///
/// The checks run in a fixed order: transport faults, then unusable
/// responses, then everything else.
pub fn classify(failure: &Failure) -> SyncError {
  let remote = match failure {
    Failure::Remote(remote) => Some(remote),
    Failure::Store(_) | Failure::Task(_) => None,
  };

  if remote.is_some_and(RemoteError::is_transport) {
    return SyncError::Network;
  }

  if let Some((code, message)) = remote.and_then(RemoteError::failed_response) {
    return SyncError::Api {
      code,
      message: message.to_string(),
    };
  }

  SyncError::Unknown
}
