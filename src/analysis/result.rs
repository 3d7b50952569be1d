use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Politics,
    Technology,
    Sports,
    Business,
    Health,
    Entertainment,
    Science,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Politics,
        Category::Technology,
        Category::Sports,
        Category::Business,
        Category::Health,
        Category::Entertainment,
        Category::Science,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Politics => "Politics",
            Category::Technology => "Technology",
            Category::Sports => "Sports",
            Category::Business => "Business",
            Category::Health => "Health",
            Category::Entertainment => "Entertainment",
            Category::Science => "Science",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|c| c.label().eq_ignore_ascii_case(s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Sentiment::Positive),
            "negative" => Some(Sentiment::Negative),
            "neutral" => Some(Sentiment::Neutral),
            _ => None,
        }
    }
}

/// Parsed model output. Fields are not validated at extraction time;
/// the accessors apply display defaults for absent or mistyped values.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    fields: Map<String, Value>,
}

impl AnalysisResult {
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn category(&self) -> &str {
        self.text("category").unwrap_or("N/A")
    }

    pub fn sentiment(&self) -> &str {
        self.text("sentiment").unwrap_or("Neutral")
    }

    /// Credibility score as reported. Accepts integers, floats (rounded) and
    /// numeric strings; anything else reads as 0. Not clamped.
    pub fn truth_score(&self) -> i64 {
        match self.fields.get("truth_score") {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.round() as i64))
                .unwrap_or(0),
            Some(Value::String(s)) => {
                let s = s.trim().trim_end_matches('%').trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }

    pub fn fact_check_reason(&self) -> &str {
        self.text("fact_check_reason").unwrap_or("No data")
    }

    pub fn blog_draft(&self) -> &str {
        self.text("blog_draft").unwrap_or("")
    }

    pub fn social_draft(&self) -> &str {
        self.text("social_draft").unwrap_or("")
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} / {}%",
            self.category(),
            self.sentiment(),
            self.truth_score()
        )
    }
}
