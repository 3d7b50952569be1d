use super::types::Article;
use super::{FetchError, NewsFeed};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Memoizes feed results per topic string for a fixed time-to-live.
/// Failures are never cached.
pub struct CachedFeed<F> {
    inner: F,
    ttl: Duration,
    entries: HashMap<String, (Instant, Vec<Article>)>,
}

impl<F: NewsFeed> CachedFeed<F> {
    pub fn new(inner: F, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: HashMap::new(),
        }
    }

    fn evict_expired(&mut self) {
        let ttl = self.ttl;
        self.entries.retain(|_, (fetched_at, _)| fetched_at.elapsed() < ttl);
    }
}

#[async_trait]
impl<F: NewsFeed> NewsFeed for CachedFeed<F> {
    async fn fetch_articles(&mut self, topic: &str) -> Result<Vec<Article>, FetchError> {
        self.evict_expired();
        if let Some((_, articles)) = self.entries.get(topic) {
            tracing::debug!(topic, "feed cache hit");
            return Ok(articles.clone());
        }

        let articles = self.inner.fetch_articles(topic).await?;
        self.entries
            .insert(topic.to_string(), (Instant::now(), articles.clone()));
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingFeed {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl NewsFeed for CountingFeed {
        async fn fetch_articles(&mut self, topic: &str) -> Result<Vec<Article>, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FetchError::Request("offline".to_string()));
            }
            Ok(vec![Article {
                title: format!("{} #{}", topic, n),
                source: "Wire".to_string(),
                published: String::new(),
                summary: String::new(),
                link: format!("https://news.example/{}", n),
            }])
        }
    }

    fn counting(fail: bool) -> (CountingFeed, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (CountingFeed { calls: calls.clone(), fail }, calls)
    }

    #[tokio::test]
    async fn test_same_topic_within_ttl_hits_cache() {
        let (inner, calls) = counting(false);
        let mut feed = CachedFeed::new(inner, Duration::from_secs(300));

        let first = feed.fetch_articles("rust").await.unwrap();
        let second = feed.fetch_articles("rust").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_topics_are_cached_separately() {
        let (inner, calls) = counting(false);
        let mut feed = CachedFeed::new(inner, Duration::from_secs(300));

        feed.fetch_articles("rust").await.unwrap();
        feed.fetch_articles("go").await.unwrap();
        feed.fetch_articles("rust").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_entry_refetches() {
        let (inner, calls) = counting(false);
        let mut feed = CachedFeed::new(inner, Duration::ZERO);

        let first = feed.fetch_articles("rust").await.unwrap();
        let second = feed.fetch_articles("rust").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let (inner, calls) = counting(true);
        let mut feed = CachedFeed::new(inner, Duration::from_secs(300));

        assert!(feed.fetch_articles("rust").await.is_err());
        assert!(feed.fetch_articles("rust").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
