//! Remote posts service: the port the repository talks to and its HTTP client.

mod client;
mod error;
mod types;

pub use client::{ApiResponse, HttpPostsApi, PostsApi};
pub use error::RemoteError;
pub use types::ApiPost;
