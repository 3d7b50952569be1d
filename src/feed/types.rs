/// One headline retrieved from the news feed. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub source: String,
    /// Feed-provided timestamp, kept verbatim.
    pub published: String,
    pub summary: String,
    /// Identity key for the cached analysis.
    pub link: String,
}

impl Article {
    /// `source • published` line shown under the headline.
    pub fn byline(&self) -> String {
        if self.published.is_empty() {
            self.source.clone()
        } else {
            format!("{} \u{2022} {}", self.source, self.published)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(published: &str) -> Article {
        Article {
            title: "Chip exports rise".to_string(),
            source: "Reuters".to_string(),
            published: published.to_string(),
            summary: String::new(),
            link: "https://example.com/a".to_string(),
        }
    }

    #[test]
    fn test_byline_with_date() {
        assert_eq!(
            article("Mon, 06 Oct 2025 10:00:00 GMT").byline(),
            "Reuters \u{2022} Mon, 06 Oct 2025 10:00:00 GMT"
        );
    }

    #[test]
    fn test_byline_without_date() {
        assert_eq!(article("").byline(), "Reuters");
    }
}
