//! Synchronization between the local post cache and the remote service.

mod classify;
mod repository;

pub use classify::{classify, Failure, SyncError};
pub use repository::PostRepository;
