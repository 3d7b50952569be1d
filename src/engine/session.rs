use crate::analysis::result::AnalysisResult;
use crate::analysis::AnalysisError;
use crate::feed::types::Article;
use crate::feed::{FetchError, NewsFeed};
use crate::publish::{EditableDraft, PublishDesk, PublishTarget};
use std::collections::{BTreeSet, HashMap};

/// Where the operator is in the fetch -> analyze -> publish flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    FeedLoaded,
    ArticleSelected,
    DraftReady,
    Published,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Idle => "Idle",
            Stage::FeedLoaded => "Feed loaded",
            Stage::ArticleSelected => "Analyzing",
            Stage::DraftReady => "Draft ready",
            Stage::Published => "Published",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("no article at position {0}")]
    NoSuchArticle(usize),
    #[error("no analyzed draft to publish")]
    NoDraft,
}

/// Compact per-article verdict from auto-process triage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageBadge {
    pub category: String,
    pub sentiment: String,
    pub truth_score: i64,
}

impl From<&AnalysisResult> for TriageBadge {
    fn from(r: &AnalysisResult) -> Self {
        Self {
            category: r.category().to_string(),
            sentiment: r.sentiment().to_string(),
            truth_score: r.truth_score(),
        }
    }
}

/// What `begin_select` decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectPlan {
    /// The active analysis already belongs to this article.
    Cached,
    /// The model must be invoked for this article.
    Analyze(Article),
}

/// Operator session: feed, selection, active analysis and settings.
///
/// A successful fetch replaces the article list and discards the selection,
/// the active analysis, triage badges and any publish confirmation. At most
/// one analysis is active, keyed by the selected article's link.
#[derive(Debug, Clone)]
pub struct Session {
    stage: Stage,
    topic: Option<String>,
    articles: Vec<Article>,
    selected: Option<usize>,
    analysis: Option<(String, AnalysisResult)>,
    triage: HashMap<String, TriageBadge>,
    confirmation: Option<String>,
    models: Vec<String>,
    model_index: usize,
    auto_process: bool,
    default_targets: BTreeSet<PublishTarget>,
}

impl Session {
    pub fn new(models: Vec<String>, auto_process: bool, default_targets: BTreeSet<PublishTarget>) -> Self {
        Self {
            stage: Stage::Idle,
            topic: None,
            articles: Vec::new(),
            selected: None,
            analysis: None,
            triage: HashMap::new(),
            confirmation: None,
            models,
            model_index: 0,
            auto_process,
            default_targets,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_article(&self) -> Option<&Article> {
        self.selected.and_then(|i| self.articles.get(i))
    }

    /// Active analysis and the link it belongs to.
    pub fn analysis(&self) -> Option<(&str, &AnalysisResult)> {
        self.analysis.as_ref().map(|(link, r)| (link.as_str(), r))
    }

    pub fn triage(&self) -> &HashMap<String, TriageBadge> {
        &self.triage
    }

    pub fn confirmation(&self) -> Option<&str> {
        self.confirmation.as_deref()
    }

    pub fn model(&self) -> &str {
        self.models.get(self.model_index).map(String::as_str).unwrap_or_default()
    }

    pub fn cycle_model(&mut self) -> &str {
        if !self.models.is_empty() {
            self.model_index = (self.model_index + 1) % self.models.len();
        }
        self.model()
    }

    pub fn auto_process(&self) -> bool {
        self.auto_process
    }

    pub fn toggle_auto_process(&mut self) -> bool {
        self.auto_process = !self.auto_process;
        self.auto_process
    }

    pub fn default_targets(&self) -> &BTreeSet<PublishTarget> {
        &self.default_targets
    }

    /// Fetch `topic` and reset everything downstream. On failure the previous
    /// state is kept.
    pub async fn fetch(&mut self, feed: &mut dyn NewsFeed, topic: &str) -> Result<usize, SessionError> {
        let articles = feed.fetch_articles(topic).await?;
        self.install_feed(topic, articles);
        Ok(self.articles.len())
    }

    fn install_feed(&mut self, topic: &str, articles: Vec<Article>) {
        self.topic = Some(topic.trim().to_string());
        self.articles = articles;
        self.selected = None;
        self.analysis = None;
        self.triage.clear();
        self.confirmation = None;
        self.stage = Stage::FeedLoaded;
    }

    /// Select the article at `index`. Returns whether the model is needed.
    pub fn begin_select(&mut self, index: usize) -> Result<SelectPlan, SessionError> {
        let article = self
            .articles
            .get(index)
            .cloned()
            .ok_or(SessionError::NoSuchArticle(index))?;

        self.selected = Some(index);
        self.confirmation = None;

        if self.analysis.as_ref().is_some_and(|(link, _)| *link == article.link) {
            self.stage = Stage::DraftReady;
            return Ok(SelectPlan::Cached);
        }

        self.analysis = None;
        self.stage = Stage::ArticleSelected;
        Ok(SelectPlan::Analyze(article))
    }

    /// Record the pipeline outcome for `link`. Ignored if the selection moved on.
    pub fn complete_analysis(
        &mut self,
        link: &str,
        outcome: Result<AnalysisResult, AnalysisError>,
    ) -> Result<(), SessionError> {
        if self.selected_article().map(|a| a.link.as_str()) != Some(link) {
            tracing::debug!(link, "dropping analysis for deselected article");
            return Ok(());
        }
        match outcome {
            Ok(result) => {
                self.analysis = Some((link.to_string(), result));
                self.stage = Stage::DraftReady;
                Ok(())
            }
            Err(e) => {
                self.stage = Stage::ArticleSelected;
                Err(e.into())
            }
        }
    }

    pub fn record_triage(&mut self, link: &str, result: &AnalysisResult) {
        if self.articles.iter().any(|a| a.link == link) {
            self.triage.insert(link.to_string(), TriageBadge::from(result));
        }
    }

    /// Editable copy of the active drafts with the default targets checked.
    pub fn draft(&self) -> Option<EditableDraft> {
        self.analysis.as_ref().map(|(_, r)| EditableDraft {
            blog: r.blog_draft().to_string(),
            social: r.social_draft().to_string(),
            targets: self.default_targets.clone(),
        })
    }

    /// Approve the edited draft. Only the stage and confirmation change.
    pub async fn submit(&mut self, draft: &EditableDraft, desk: &PublishDesk) -> Result<String, SessionError> {
        if self.analysis.is_none() {
            return Err(SessionError::NoDraft);
        }
        let report = desk.publish(draft).await;
        let confirmation = report.confirmation();
        self.confirmation = Some(confirmation.clone());
        self.stage = Stage::Published;
        Ok(confirmation)
    }
}
