use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to a post by the remote service.
pub type PostId = i64;

/// Id carried by a post that has not been saved yet.
pub const DRAFT_ID: PostId = 0;

/// A post as rendered from the local cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
  pub id: PostId,
  pub author: String,
  pub author_avatar: String,
  pub content: String,
  /// Unix timestamp (seconds)
  pub published: i64,
  pub likes: u32,
  pub liked_by_me: bool,
  pub attachment: Option<Attachment>,
}

/// Media attached to a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
  pub url: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(rename = "type")]
  pub kind: AttachmentKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttachmentKind {
  Image,
}

impl Post {
  /// A new, unsaved post. The remote service assigns the id and timestamp.
  pub fn draft(author: impl Into<String>, content: impl Into<String>) -> Self {
    Self {
      id: DRAFT_ID,
      author: author.into(),
      author_avatar: String::new(),
      content: content.into(),
      published: 0,
      likes: 0,
      liked_by_me: false,
      attachment: None,
    }
  }

  pub fn is_draft(&self) -> bool {
    self.id == DRAFT_ID
  }

  /// The post as it looks after the local viewer toggles their like.
  pub fn toggled_like(&self) -> Self {
    let likes = if self.liked_by_me {
      self.likes.saturating_sub(1)
    } else {
      self.likes.saturating_add(1)
    };

    Self {
      liked_by_me: !self.liked_by_me,
      likes,
      ..self.clone()
    }
  }

  pub fn published_at(&self) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(self.published, 0)
  }
}
