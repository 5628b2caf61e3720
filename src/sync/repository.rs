//! Post repository that keeps the local cache in step with the remote service.

use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::classify::{classify, Failure, SyncError};
use crate::api::PostsApi;
use crate::cache::{LivePosts, PostStore};
use crate::post::{Post, PostId};

/// Repository that reads from the local cache and writes through to the
/// remote service.
///
/// `remove_by_id` and `like_by_id` are optimistic: the cache changes before the
/// remote call and is restored from a snapshot if the call fails. `save` and
/// `refresh_all` only write once the service has answered.
///
/// Each operation runs on its own task, so dropping the returned future does
/// not interrupt it between the optimistic write and its commit or rollback.
pub struct PostRepository<S: PostStore, A: PostsApi> {
  store: Arc<S>,
  api: Arc<A>,
}

impl<S, A> PostRepository<S, A>
where
  S: PostStore + 'static,
  A: PostsApi + 'static,
{
  pub fn new(store: S, api: A) -> Self {
    Self::from_shared(Arc::new(store), Arc::new(api))
  }

  /// Build a repository over a store and client that are also used elsewhere.
  pub fn from_shared(store: Arc<S>, api: Arc<A>) -> Self {
    Self { store, api }
  }

  /// Live, newest-first view of the cached posts.
  pub fn posts(&self) -> LivePosts {
    self.store.subscribe()
  }

  /// Fetch every post from the service and merge it into the cache.
  ///
  /// Posts cached locally but missing from the response are kept.
  pub async fn refresh_all(&self) -> Result<(), SyncError> {
    let this = self.clone();
    self
      .detached("refresh_all", async move { this.refresh_all_now().await })
      .await
  }

  /// Create or update a post. The cache is written only after the service
  /// confirms, using the version it returns.
  pub async fn save(&self, post: Post) -> Result<(), SyncError> {
    let this = self.clone();
    self
      .detached("save", async move { this.save_now(&post).await })
      .await
  }

  /// Delete a post locally, then remotely. The cached copy is restored if the
  /// remote delete fails.
  pub async fn remove_by_id(&self, id: PostId) -> Result<(), SyncError> {
    let this = self.clone();
    self
      .detached("remove_by_id", async move { this.remove_now(id).await })
      .await
  }

  /// Toggle the viewer's like. Does nothing if the post is not cached.
  pub async fn like_by_id(&self, id: PostId) -> Result<(), SyncError> {
    let this = self.clone();
    self
      .detached("like_by_id", async move { this.like_now(id).await })
      .await
  }

  /// Run an operation to completion on its own task.
  async fn detached<F>(&self, operation: &'static str, fut: F) -> Result<(), SyncError>
  where
    F: Future<Output = Result<(), SyncError>> + Send + 'static,
  {
    match tokio::spawn(fut).await {
      Ok(result) => result,
      Err(e) => Err(fail(operation, &Failure::from(e))),
    }
  }

  async fn refresh_all_now(&self) -> Result<(), SyncError> {
    debug!("refreshing posts");

    let posts = self
      .api
      .fetch_all()
      .await
      .map_err(|e| fail("refresh_all", &Failure::from(e)))?;

    self
      .store
      .upsert(&posts)
      .map_err(|e| fail("refresh_all", &Failure::from(e)))?;

    info!(count = posts.len(), "refreshed posts");
    Ok(())
  }

  async fn save_now(&self, post: &Post) -> Result<(), SyncError> {
    debug!(id = post.id, draft = post.is_draft(), "saving post");

    let saved = self
      .api
      .save(post)
      .await
      .map_err(|e| fail("save", &Failure::from(e)))?;

    self
      .store
      .upsert(std::slice::from_ref(&saved))
      .map_err(|e| fail("save", &Failure::from(e)))?;

    info!(id = saved.id, "saved post");
    Ok(())
  }

  async fn remove_now(&self, id: PostId) -> Result<(), SyncError> {
    let snapshot = self
      .store
      .get(id)
      .map_err(|e| fail("remove_by_id", &Failure::from(e)))?;

    if let Err(failure) = self.try_remove(id).await {
      if let Some(ref snapshot) = snapshot {
        self.restore("remove_by_id", snapshot);
      }
      return Err(fail("remove_by_id", &failure));
    }

    info!(id, "removed post");
    Ok(())
  }

  async fn try_remove(&self, id: PostId) -> Result<(), Failure> {
    self.store.delete_by_id(id)?;
    debug!(id, "removed post locally, confirming remotely");
    self.api.delete_by_id(id).await?;
    Ok(())
  }

  async fn like_now(&self, id: PostId) -> Result<(), SyncError> {
    let snapshot = self
      .store
      .get(id)
      .map_err(|e| fail("like_by_id", &Failure::from(e)))?;

    let Some(snapshot) = snapshot else {
      debug!(id, "post not cached, ignoring like");
      return Ok(());
    };

    if let Err(failure) = self.try_toggle_like(&snapshot.toggled_like()).await {
      self.restore("like_by_id", &snapshot);
      return Err(fail("like_by_id", &failure));
    }

    Ok(())
  }

  async fn try_toggle_like(&self, toggled: &Post) -> Result<(), Failure> {
    self.store.upsert(std::slice::from_ref(toggled))?;
    debug!(
      id = toggled.id,
      liked = toggled.liked_by_me,
      likes = toggled.likes,
      "toggled like locally, confirming remotely"
    );

    let confirmed = if toggled.liked_by_me {
      self.api.like_by_id(toggled.id).await?
    } else {
      self.api.dislike_by_id(toggled.id).await?
    };

    match confirmed {
      Some(post) => {
        debug!(id = post.id, likes = post.likes, "reconciling like with service");
        self.store.upsert(std::slice::from_ref(&post))?;
      }
      None => debug!(id = toggled.id, "service sent no post, keeping local like"),
    }

    Ok(())
  }

  /// Put a snapshot back after a failed optimistic write.
  fn restore(&self, operation: &str, snapshot: &Post) {
    if let Err(e) = self.store.upsert(std::slice::from_ref(snapshot)) {
      error!(operation, id = snapshot.id, "failed to roll back cached post: {e:#}");
    } else {
      debug!(operation, id = snapshot.id, "rolled back cached post");
    }
  }
}

/// Classify a failure and log it.
fn fail(operation: &str, failure: &Failure) -> SyncError {
  let error = classify(failure);
  warn!(operation, %error, "operation failed: {failure}");
  error
}

impl<S: PostStore, A: PostsApi> Clone for PostRepository<S, A> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      api: Arc::clone(&self.api),
    }
  }
}
