pub mod cache;
pub mod google_news;
pub mod types;

use async_trait::async_trait;
use types::Article;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("topic must not be empty")]
    EmptyTopic,
    #[error("invalid feed URL: {0}")]
    InvalidUrl(String),
    #[error("feed request failed: {0}")]
    Request(String),
    #[error("feed returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed feed: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait NewsFeed: Send + Sync {
    /// Fetch the first headlines for `topic`, in feed order.
    async fn fetch_articles(&mut self, topic: &str) -> Result<Vec<Article>, FetchError>;
}
