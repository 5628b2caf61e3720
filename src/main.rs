use clap::{Parser, Subcommand};
use color_eyre::Result;
use futures::StreamExt;
use std::path::PathBuf;

use postsync::api::HttpPostsApi;
use postsync::cache::SqliteStorage;
use postsync::config::{ApiConfig, Config};
use postsync::{logging, Post, PostId, PostRepository};

#[derive(Parser, Debug)]
#[command(name = "postsync")]
#[command(about = "Keep a local cache of posts in sync with a feed service")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/postsync/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Posts service base URL, overriding the config file
  #[arg(long, global = true)]
  base_url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print cached posts without contacting the service
  List,
  /// Fetch all posts from the service into the cache
  Refresh,
  /// Create a post, or edit one when --id is given
  Save {
    #[arg(long)]
    content: String,
    #[arg(long)]
    id: Option<PostId>,
    #[arg(long, default_value = "Me")]
    author: String,
  },
  /// Delete a post
  Remove { id: PostId },
  /// Like a post, or remove the like if already liked
  Like { id: PostId },
  /// Refresh, then print the feed every time it changes until Ctrl-C
  Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;

  // Override base URL if specified on command line
  let config = if let Some(base_url) = args.base_url {
    Config {
      api: ApiConfig {
        base_url,
        ..config.api
      },
      ..config
    }
  } else {
    config
  };

  let _log_guard = logging::init(&config.log)?;

  let storage = SqliteStorage::open(&config.cache_path()?)?;
  let api = HttpPostsApi::new(&config.api, Config::get_api_token())?;
  let repository = PostRepository::new(storage, api);

  match args.command {
    Command::List => print_posts(&repository.posts().current()),
    Command::Refresh => {
      repository.refresh_all().await?;
      print_posts(&repository.posts().current());
    }
    Command::Save {
      content,
      id,
      author,
    } => {
      let post = match id {
        Some(id) => {
          let cached = repository
            .posts()
            .current()
            .iter()
            .find(|p| p.id == id)
            .cloned();
          match cached {
            Some(post) => Post { content, ..post },
            None => Post {
              id,
              ..Post::draft(author, content)
            },
          }
        }
        None => Post::draft(author, content),
      };
      repository.save(post).await?;
    }
    Command::Remove { id } => repository.remove_by_id(id).await?,
    Command::Like { id } => repository.like_by_id(id).await?,
    Command::Watch => watch(&repository).await?,
  }

  Ok(())
}

async fn watch(repository: &PostRepository<SqliteStorage, HttpPostsApi>) -> Result<()> {
  let mut feed = Box::pin(repository.posts().into_stream());

  // Serve the cache first; a failed refresh still leaves it readable.
  if let Err(e) = repository.refresh_all().await {
    eprintln!("Refresh failed: {}", e);
  }

  loop {
    tokio::select! {
      posts = feed.next() => match posts {
        Some(posts) => print_posts(&posts),
        None => break,
      },
      _ = tokio::signal::ctrl_c() => break,
    }
  }

  Ok(())
}

fn print_posts(posts: &[Post]) {
  if posts.is_empty() {
    println!("(no cached posts)");
    return;
  }

  for post in posts {
    let published = post
      .published_at()
      .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
      .unwrap_or_default();
    let heart = if post.liked_by_me { "♥" } else { "♡" };

    println!(
      "#{:<5} {} {} {:>4} {}",
      post.id, published, heart, post.likes, post.author
    );
    println!("       {}", post.content);
    if let Some(ref attachment) = post.attachment {
      println!("       [{}]", attachment.url);
    }
  }
  println!();
}
