//! Optimistic local cache of posts kept in sync with a remote feed service.
//!
//! Reads are served from a SQLite-backed [`cache::PostStore`] whose contents
//! are republished to [`cache::LivePosts`] observers after every write.
//! Mutations go through [`sync::PostRepository`], which applies them locally,
//! confirms them with the [`api::PostsApi`] service, and either reconciles the
//! cache with the service's answer or rolls it back and reports a
//! [`sync::SyncError`].

pub mod api;
pub mod cache;
pub mod config;
pub mod logging;
pub mod post;
pub mod sync;

pub use post::{Attachment, AttachmentKind, Post, PostId};
pub use sync::{PostRepository, SyncError};
