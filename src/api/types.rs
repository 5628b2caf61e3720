//! Serde types matching the posts service payloads.
//!
//! These types are separate from domain types to keep the wire format
//! (camelCase, optional fields) out of the cache and repository.

use serde::{Deserialize, Serialize};

use crate::post::{Attachment, Post, PostId};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPost {
  pub id: PostId,
  #[serde(default)]
  pub author: String,
  #[serde(default)]
  pub author_avatar: String,
  #[serde(default)]
  pub content: String,
  #[serde(default)]
  pub published: i64,
  #[serde(default)]
  pub liked_by_me: bool,
  #[serde(default)]
  pub likes: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub attachment: Option<Attachment>,
}

impl From<ApiPost> for Post {
  fn from(api: ApiPost) -> Self {
    Self {
      id: api.id,
      author: api.author,
      author_avatar: api.author_avatar,
      content: api.content,
      published: api.published,
      likes: api.likes,
      liked_by_me: api.liked_by_me,
      attachment: api.attachment,
    }
  }
}

impl From<&Post> for ApiPost {
  fn from(post: &Post) -> Self {
    Self {
      id: post.id,
      author: post.author.clone(),
      author_avatar: post.author_avatar.clone(),
      content: post.content.clone(),
      published: post.published,
      liked_by_me: post.liked_by_me,
      likes: post.likes,
      attachment: post.attachment.clone(),
    }
  }
}
