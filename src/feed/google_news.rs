use super::types::Article;
use super::{FetchError, NewsFeed};
use crate::config::FeedConfig;
use async_trait::async_trait;
use html_escape::decode_html_entities;
use reqwest::{Client, Url};
use std::time::Duration;

/// Google News RSS search feed.
pub struct GoogleNewsRss {
    client: Client,
    base_url: String,
    language: String,
    region: String,
    edition: String,
    max_entries: usize,
}

impl GoogleNewsRss {
    pub fn new(config: &FeedConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            region: config.region.clone(),
            edition: config.edition.clone(),
            max_entries: config.max_entries,
        })
    }

    /// Build the search URL with every query parameter fully encoded.
    pub fn search_url(&self, topic: &str) -> Result<Url, FetchError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(FetchError::EmptyTopic);
        }
        Url::parse_with_params(
            &format!("{}/rss/search", self.base_url),
            [
                ("q", topic),
                ("hl", self.language.as_str()),
                ("gl", self.region.as_str()),
                ("ceid", self.edition.as_str()),
            ],
        )
        .map_err(|e| FetchError::InvalidUrl(e.to_string()))
    }
}

#[async_trait]
impl NewsFeed for GoogleNewsRss {
    async fn fetch_articles(&mut self, topic: &str) -> Result<Vec<Article>, FetchError> {
        let url = self.search_url(topic)?;
        tracing::debug!(%url, "fetching news feed");

        let resp = self.client.get(url).send().await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status { status: status.as_u16(), body });
        }

        let body = resp.bytes().await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let articles = parse_feed(&body, self.max_entries)?;
        tracing::info!(topic, count = articles.len(), "news feed fetched");
        Ok(articles)
    }
}

/// Parse an RSS document into at most `max_entries` articles, in feed order.
/// Items without a title or link are skipped.
pub fn parse_feed(body: &[u8], max_entries: usize) -> Result<Vec<Article>, FetchError> {
    let channel = rss::Channel::read_from(body)
        .map_err(|e| FetchError::Malformed(e.to_string()))?;

    let articles = channel
        .items()
        .iter()
        .filter_map(|item| {
            let title = item.title().map(str::trim).filter(|t| !t.is_empty())?;
            let link = item.link().map(str::trim).filter(|l| !l.is_empty())?;

            let source = item
                .source()
                .and_then(|s| s.title())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .or_else(|| source_from_title(title).map(str::to_string))
                .unwrap_or_else(|| "Unknown source".to_string());

            Some(Article {
                title: title.to_string(),
                source,
                published: item.pub_date().unwrap_or_default().trim().to_string(),
                summary: strip_html(item.description().unwrap_or_default()),
                link: link.to_string(),
            })
        })
        .take(max_entries)
        .collect();

    Ok(articles)
}

/// Google News titles end in " - Publisher".
fn source_from_title(title: &str) -> Option<&str> {
    title
        .rsplit_once(" - ")
        .map(|(_, source)| source.trim())
        .filter(|s| !s.is_empty())
}

fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    decode_html_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
