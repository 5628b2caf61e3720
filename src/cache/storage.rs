//! SQLite implementation of the post store.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::debug;

use super::traits::{LivePosts, PostStore, PostsSnapshot};
use crate::post::{Attachment, Post, PostId};

/// SQLite-based post storage.
///
/// Writes are serialized through the connection mutex. After every write the
/// full table is re-read and published to live subscribers while the lock is
/// still held, so subscribers observe writes in commit order.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
  live: watch::Sender<PostsSnapshot>,
}

impl SqliteStorage {
  /// Open or create the cache database at `path`.
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// Open a throwaway in-memory cache.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;

    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    let initial = query_all(&conn)?;
    let (live, _) = watch::channel(Arc::new(initial));

    Ok(Self {
      conn: Mutex::new(conn),
      live,
    })
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))
  }

  /// Re-read the table and notify subscribers.
  fn publish(&self, conn: &Connection) -> Result<()> {
    let posts = query_all(conn)?;
    debug!(count = posts.len(), "publishing cached posts");
    self.live.send_replace(Arc::new(posts));
    Ok(())
  }
}

/// Schema for the post cache.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY,
    author TEXT NOT NULL,
    author_avatar TEXT NOT NULL DEFAULT '',
    content TEXT NOT NULL,
    published INTEGER NOT NULL,
    likes INTEGER NOT NULL DEFAULT 0,
    liked_by_me INTEGER NOT NULL DEFAULT 0,
    attachment TEXT,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

const SELECT_COLUMNS: &str =
  "SELECT id, author, author_avatar, content, published, likes, liked_by_me, attachment FROM posts";

impl PostStore for SqliteStorage {
  fn subscribe(&self) -> LivePosts {
    LivePosts::new(self.live.subscribe())
  }

  fn all(&self) -> Result<Vec<Post>> {
    let conn = self.lock()?;
    query_all(&conn)
  }

  fn get(&self, id: PostId) -> Result<Option<Post>> {
    let conn = self.lock()?;

    let mut stmt = conn
      .prepare(&format!("{} WHERE id = ?", SELECT_COLUMNS))
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let row = stmt
      .query_row(params![id], read_row)
      .optional()
      .map_err(|e| eyre!("Failed to read post {}: {}", id, e))?;

    row.map(into_post).transpose()
  }

  fn upsert(&self, posts: &[Post]) -> Result<()> {
    let mut conn = self.lock()?;

    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    for post in posts {
      let attachment = post
        .attachment
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| eyre!("Failed to serialize attachment: {}", e))?;

      tx.execute(
        "INSERT OR REPLACE INTO posts (id, author, author_avatar, content, published, likes, liked_by_me, attachment, cached_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, datetime('now'))",
        params![
          post.id,
          post.author,
          post.author_avatar,
          post.content,
          post.published,
          post.likes,
          post.liked_by_me,
          attachment
        ],
      )
      .map_err(|e| eyre!("Failed to store post {}: {}", post.id, e))?;
    }

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    self.publish(&conn)
  }

  fn delete_by_id(&self, id: PostId) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute("DELETE FROM posts WHERE id = ?", params![id])
      .map_err(|e| eyre!("Failed to delete post {}: {}", id, e))?;

    self.publish(&conn)
  }
}

/// Raw column values of a `posts` row.
type PostRow = (i64, String, String, String, i64, u32, bool, Option<String>);

fn read_row(row: &Row<'_>) -> rusqlite::Result<PostRow> {
  Ok((
    row.get(0)?,
    row.get(1)?,
    row.get(2)?,
    row.get(3)?,
    row.get(4)?,
    row.get(5)?,
    row.get(6)?,
    row.get(7)?,
  ))
}

fn into_post(row: PostRow) -> Result<Post> {
  let (id, author, author_avatar, content, published, likes, liked_by_me, attachment) = row;

  let attachment: Option<Attachment> = attachment
    .as_deref()
    .map(serde_json::from_str)
    .transpose()
    .map_err(|e| eyre!("Failed to deserialize attachment of post {}: {}", id, e))?;

  Ok(Post {
    id,
    author,
    author_avatar,
    content,
    published,
    likes,
    liked_by_me,
    attachment,
  })
}

/// All posts, newest first.
fn query_all(conn: &Connection) -> Result<Vec<Post>> {
  let mut stmt = conn
    .prepare(&format!("{} ORDER BY id DESC", SELECT_COLUMNS))
    .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

  let rows = stmt
    .query_map([], read_row)
    .map_err(|e| eyre!("Failed to query posts: {}", e))?
    .collect::<rusqlite::Result<Vec<_>>>()
    .map_err(|e| eyre!("Failed to read posts: {}", e))?;

  rows.into_iter().map(into_post).collect()
}
