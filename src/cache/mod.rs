//! Local post cache.
//!
//! This module provides the durable record store that the UI reads from:
//! - One row per post id, upserted on every write
//! - A live, newest-first view republished after every committed write
//! - SQLite persistence so the feed is readable before the network answers

mod storage;
mod traits;

pub use storage::SqliteStorage;
pub use traits::{LivePosts, PostStore, PostsSnapshot};
