use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::error::RemoteError;
use super::types::ApiPost;
use crate::config::ApiConfig;
use crate::post::{Post, PostId};

/// Remote posts service.
///
/// Every call either returns the service's payload or a [`RemoteError`]
/// describing how far the request got.
#[async_trait]
pub trait PostsApi: Send + Sync {
  /// Fetch every post the service knows about.
  async fn fetch_all(&self) -> Result<Vec<Post>, RemoteError>;

  /// Create (id 0) or update a post, returning the stored version.
  async fn save(&self, post: &Post) -> Result<Post, RemoteError>;

  async fn delete_by_id(&self, id: PostId) -> Result<(), RemoteError>;

  /// Like a post. The service may answer with the updated post.
  async fn like_by_id(&self, id: PostId) -> Result<Option<Post>, RemoteError>;

  /// Remove the viewer's like. The service may answer with the updated post.
  async fn dislike_by_id(&self, id: PostId) -> Result<Option<Post>, RemoteError>;
}

/// A successful response with its raw body.
#[derive(Debug)]
pub struct ApiResponse {
  pub status: StatusCode,
  pub body: Vec<u8>,
}

impl ApiResponse {
  fn reason(&self) -> String {
    reason(self.status)
  }

  /// Decode a body the call cannot do without.
  pub fn required<T: DeserializeOwned>(&self) -> Result<T, RemoteError> {
    self.optional()?.ok_or_else(|| RemoteError::MissingBody {
      code: self.status.as_u16(),
      message: self.reason(),
    })
  }

  /// Decode a body that the service may leave empty.
  pub fn optional<T: DeserializeOwned>(&self) -> Result<Option<T>, RemoteError> {
    if self.body.iter().all(u8::is_ascii_whitespace) {
      return Ok(None);
    }

    serde_json::from_slice(&self.body)
      .map(Some)
      .map_err(|source| RemoteError::MalformedBody {
        code: self.status.as_u16(),
        message: self.reason(),
        source,
      })
  }
}

fn reason(status: StatusCode) -> String {
  status.canonical_reason().unwrap_or_default().to_string()
}

/// Posts service client over HTTP/JSON.
#[derive(Clone)]
pub struct HttpPostsApi {
  client: reqwest::Client,
  base_url: Url,
  token: Option<String>,
}

impl HttpPostsApi {
  pub fn new(config: &ApiConfig, token: Option<String>) -> Result<Self> {
    // Url::join replaces the last segment unless the base ends with '/'
    let mut base = config.base_url.clone();
    if !base.ends_with('/') {
      base.push('/');
    }

    let base_url =
      Url::parse(&base).map_err(|e| eyre!("Invalid API base URL {}: {}", config.base_url, e))?;

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      client,
      base_url,
      token,
    })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  /// Resolve an endpoint path against the base URL.
  pub fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
    Ok(self.base_url.join(path)?)
  }

  fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, RemoteError> {
    let url = self.endpoint(path)?;
    debug!(%method, %url, "posts api request");

    let mut request = self.client.request(method, url);
    if let Some(ref token) = self.token {
      request = request.bearer_auth(token);
    }
    Ok(request)
  }

  /// Send a request and read the body of a successful response.
  async fn send(&self, request: RequestBuilder) -> Result<ApiResponse, RemoteError> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
      return Err(RemoteError::Status {
        code: status.as_u16(),
        message: reason(status),
      });
    }

    let body = response.bytes().await?.to_vec();
    Ok(ApiResponse { status, body })
  }
}

#[async_trait]
impl PostsApi for HttpPostsApi {
  async fn fetch_all(&self) -> Result<Vec<Post>, RemoteError> {
    let response = self.send(self.request(Method::GET, "posts")?).await?;
    let posts: Vec<ApiPost> = response.required()?;
    Ok(posts.into_iter().map(Post::from).collect())
  }

  async fn save(&self, post: &Post) -> Result<Post, RemoteError> {
    let request = self
      .request(Method::POST, "posts")?
      .json(&ApiPost::from(post));
    let response = self.send(request).await?;
    Ok(response.required::<ApiPost>()?.into())
  }

  async fn delete_by_id(&self, id: PostId) -> Result<(), RemoteError> {
    let path = format!("posts/{}", id);
    self.send(self.request(Method::DELETE, &path)?).await?;
    Ok(())
  }

  async fn like_by_id(&self, id: PostId) -> Result<Option<Post>, RemoteError> {
    let path = format!("posts/{}/likes", id);
    let response = self.send(self.request(Method::POST, &path)?).await?;
    Ok(response.optional::<ApiPost>()?.map(Post::from))
  }

  async fn dislike_by_id(&self, id: PostId) -> Result<Option<Post>, RemoteError> {
    let path = format!("posts/{}/likes", id);
    let response = self.send(self.request(Method::DELETE, &path)?).await?;
    Ok(response.optional::<ApiPost>()?.map(Post::from))
  }
}
