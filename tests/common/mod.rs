//! Shared fixtures for repository tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use postsync::api::{PostsApi, RemoteError};
use postsync::cache::{PostStore, SqliteStorage};
use postsync::{Post, PostId, PostRepository};

/// A remote call as seen by the fake service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
  FetchAll,
  Save(PostId),
  Delete(PostId),
  Like(PostId),
  Dislike(PostId),
}

/// In-process posts service with scripted failures.
///
/// Keeps its own copy of the posts, so like counts can drift from the
/// client's cache the way a real shared feed would.
#[derive(Default)]
pub struct FakeApi {
  server: Mutex<BTreeMap<PostId, Post>>,
  failures: Mutex<VecDeque<RemoteError>>,
  calls: Mutex<Vec<Call>>,
  like_bodies: AtomicBool,
  held: AtomicBool,
  entered: Notify,
  release: Notify,
}

impl FakeApi {
  pub fn new() -> Self {
    Self::default()
  }

  /// Seed the service with posts.
  pub fn with_posts(self, posts: &[Post]) -> Self {
    {
      let mut server = self.server.lock().unwrap();
      for post in posts {
        server.insert(post.id, post.clone());
      }
    }
    self
  }

  /// Answer like/dislike calls with the service's version of the post.
  pub fn with_like_bodies(self) -> Self {
    self.like_bodies.store(true, Ordering::SeqCst);
    self
  }

  /// Make the next call fail with `error`.
  pub fn fail_next(&self, error: RemoteError) {
    self.failures.lock().unwrap().push_back(error);
  }

  /// Park every call until [`FakeApi::release`] is called.
  pub fn hold(&self) {
    self.held.store(true, Ordering::SeqCst);
  }

  /// Resolves once a held call has started.
  pub async fn entered(&self) {
    self.entered.notified().await;
  }

  /// Let one held call continue.
  pub fn release(&self) {
    self.release.notify_one();
  }

  pub fn calls(&self) -> Vec<Call> {
    self.calls.lock().unwrap().clone()
  }

  pub fn server_post(&self, id: PostId) -> Option<Post> {
    self.server.lock().unwrap().get(&id).cloned()
  }

  pub fn set_server_post(&self, post: Post) {
    self.server.lock().unwrap().insert(post.id, post);
  }

  async fn begin(&self, call: Call) -> Result<(), RemoteError> {
    self.calls.lock().unwrap().push(call);

    if self.held.load(Ordering::SeqCst) {
      self.entered.notify_one();
      self.release.notified().await;
    }

    let failure = self.failures.lock().unwrap().pop_front();
    match failure {
      Some(error) => Err(error),
      None => Ok(()),
    }
  }

  fn set_like(&self, id: PostId, liked: bool) -> Result<Option<Post>, RemoteError> {
    let mut server = self.server.lock().unwrap();
    let post = server.get_mut(&id).ok_or_else(|| status(404))?;

    if post.liked_by_me != liked {
      *post = post.toggled_like();
    }

    if self.like_bodies.load(Ordering::SeqCst) {
      Ok(Some(post.clone()))
    } else {
      Ok(None)
    }
  }
}

#[async_trait]
impl PostsApi for FakeApi {
  async fn fetch_all(&self) -> Result<Vec<Post>, RemoteError> {
    self.begin(Call::FetchAll).await?;
    Ok(self.server.lock().unwrap().values().rev().cloned().collect())
  }

  async fn save(&self, post: &Post) -> Result<Post, RemoteError> {
    self.begin(Call::Save(post.id)).await?;

    let mut server = self.server.lock().unwrap();
    let mut saved = post.clone();
    if saved.is_draft() {
      saved.id = server.keys().next_back().copied().unwrap_or(0) + 1;
      saved.published = 1_700_000_000 + saved.id;
    }
    server.insert(saved.id, saved.clone());
    Ok(saved)
  }

  async fn delete_by_id(&self, id: PostId) -> Result<(), RemoteError> {
    self.begin(Call::Delete(id)).await?;
    self.server.lock().unwrap().remove(&id);
    Ok(())
  }

  async fn like_by_id(&self, id: PostId) -> Result<Option<Post>, RemoteError> {
    self.begin(Call::Like(id)).await?;
    self.set_like(id, true)
  }

  async fn dislike_by_id(&self, id: PostId) -> Result<Option<Post>, RemoteError> {
    self.begin(Call::Dislike(id)).await?;
    self.set_like(id, false)
  }
}

pub fn network() -> RemoteError {
  RemoteError::Transport("connection refused".to_string())
}

pub fn status(code: u16) -> RemoteError {
  let message = match code {
    404 => "Not Found",
    500 => "Internal Server Error",
    503 => "Service Unavailable",
    _ => "Error",
  };
  RemoteError::Status {
    code,
    message: message.to_string(),
  }
}

pub fn post(id: PostId, likes: u32, liked_by_me: bool) -> Post {
  Post {
    id,
    author: "Нетология".to_string(),
    author_avatar: "netology.jpg".to_string(),
    content: format!("post #{}", id),
    published: 1_700_000_000 + id,
    likes,
    liked_by_me,
    attachment: None,
  }
}

pub struct Harness {
  pub store: Arc<SqliteStorage>,
  pub api: Arc<FakeApi>,
  pub repository: PostRepository<SqliteStorage, FakeApi>,
}

/// A repository over an in-memory cache holding `cached` and a fake service.
pub fn harness(cached: &[Post], api: FakeApi) -> Harness {
  let store = Arc::new(SqliteStorage::open_in_memory().unwrap());
  store.upsert(cached).unwrap();

  let api = Arc::new(api);
  let repository = PostRepository::from_shared(Arc::clone(&store), Arc::clone(&api));

  Harness {
    store,
    api,
    repository,
  }
}

/// Fail the test instead of hanging when a future never resolves.
pub async fn within<F: Future>(fut: F) -> F::Output {
  tokio::time::timeout(Duration::from_secs(5), fut)
    .await
    .expect("timed out")
}
