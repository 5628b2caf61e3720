//! Core traits and types for the post cache.

use color_eyre::Result;
use futures::Stream;
use std::sync::Arc;
use tokio::sync::watch;

use crate::post::{Post, PostId};

/// Trait for local post storage backends.
///
/// The store is the single source of truth for what gets rendered. Every
/// successful write republishes the full, ordered contents to all
/// [`LivePosts`] subscribers.
pub trait PostStore: Send + Sync {
  /// Subscribe to the live, newest-first view of all cached posts.
  fn subscribe(&self) -> LivePosts;

  /// All cached posts, newest first.
  fn all(&self) -> Result<Vec<Post>>;

  /// A single cached post.
  fn get(&self, id: PostId) -> Result<Option<Post>>;

  /// Insert or replace posts keyed by id. Idempotent per id.
  fn upsert(&self, posts: &[Post]) -> Result<()>;

  /// Delete the post with the given id. Deleting a missing id is not an error.
  fn delete_by_id(&self, id: PostId) -> Result<()>;
}

/// Snapshot of the cache as published to observers.
pub type PostsSnapshot = Arc<Vec<Post>>;

/// Read-only, continuously updated view of the cached posts.
#[derive(Debug, Clone)]
pub struct LivePosts {
  rx: watch::Receiver<PostsSnapshot>,
}

impl LivePosts {
  pub(crate) fn new(rx: watch::Receiver<PostsSnapshot>) -> Self {
    Self { rx }
  }

  /// The latest published contents.
  pub fn current(&self) -> PostsSnapshot {
    Arc::clone(&self.rx.borrow())
  }

  /// Wait for the next publish.
  ///
  /// Returns `None` once the store has been dropped.
  pub async fn changed(&mut self) -> Option<PostsSnapshot> {
    self.rx.changed().await.ok()?;
    Some(Arc::clone(&self.rx.borrow_and_update()))
  }

  /// Turn the view into a stream that yields the current contents first and
  /// then every subsequent publish.
  pub fn into_stream(self) -> impl Stream<Item = PostsSnapshot> {
    futures::stream::unfold((self, true), |(mut live, first)| async move {
      if first {
        let current = Arc::clone(&live.rx.borrow_and_update());
        return Some((current, (live, false)));
      }
      let next = live.changed().await?;
      Some((next, (live, false)))
    })
  }
}
