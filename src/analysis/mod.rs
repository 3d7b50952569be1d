pub mod client;
pub mod extract;
pub mod prompt;
pub mod result;

use crate::feed::types::Article;
use client::ModelClient;
use extract::ExtractionError;
use result::AnalysisResult;

#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisError {
    #[error("model API key is missing (set GOOGLE_API_KEY)")]
    MissingCredential,
    #[error("AI processing error: {0}")]
    Transport(String),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Prompt -> model -> extraction pipeline for one article.
pub struct Analyzer {
    client: Box<dyn ModelClient>,
}

impl Analyzer {
    pub fn new(client: Box<dyn ModelClient>) -> Self {
        Self { client }
    }

    pub async fn analyze(
        &self,
        article: &Article,
        model: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        let prompt = prompt::build_prompt(article);
        let raw = self.client.invoke(&prompt, model).await?;
        let result = extract::extract(&raw)?;
        tracing::info!(link = %article.link, model, summary = %result, "article analyzed");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct ScriptedClient {
        reply: Result<String, AnalysisError>,
        prompts: Arc<Mutex<Vec<(String, String)>>>,
    }

    #[async_trait]
    impl ModelClient for ScriptedClient {
        async fn invoke(&self, prompt: &str, model: &str) -> Result<String, AnalysisError> {
            self.prompts
                .lock()
                .unwrap()
                .push((prompt.to_string(), model.to_string()));
            self.reply.clone()
        }
    }

    fn article() -> Article {
        Article {
            title: "Senate passes budget".to_string(),
            source: "AP".to_string(),
            published: String::new(),
            summary: "The vote was 52-48.".to_string(),
            link: "https://news.example/budget".to_string(),
        }
    }

    fn analyzer(reply: Result<String, AnalysisError>) -> Analyzer {
        Analyzer::new(Box::new(ScriptedClient {
            reply,
            prompts: Arc::default(),
        }))
    }

    #[tokio::test]
    async fn test_analyze_success() {
        let a = analyzer(Ok(
            "{\"category\":\"Politics\",\"sentiment\":\"Neutral\",\"truth_score\":88}".to_string(),
        ));
        let result = a.analyze(&article(), "gemini-2.5-pro").await.unwrap();
        assert_eq!(result.category(), "Politics");
        assert_eq!(result.truth_score(), 88);
    }

    #[tokio::test]
    async fn test_analyze_sends_rendered_prompt_and_model() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let a = Analyzer::new(Box::new(ScriptedClient {
            reply: Ok("{}".to_string()),
            prompts: prompts.clone(),
        }));
        a.analyze(&article(), "gemini-2.5-flash").await.unwrap();

        let seen = prompts.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, prompt::build_prompt(&article()));
        assert_eq!(seen[0].1, "gemini-2.5-flash");
    }

    #[tokio::test]
    async fn test_analyze_transport_error_passes_through() {
        let a = analyzer(Err(AnalysisError::Transport("quota exceeded".to_string())));
        let err = a.analyze(&article(), "gemini-2.5-flash").await.unwrap_err();
        assert_eq!(err.to_string(), "AI processing error: quota exceeded");
    }

    #[tokio::test]
    async fn test_analyze_extraction_error_keeps_raw() {
        let a = analyzer(Ok("no json here".to_string()));
        match a.analyze(&article(), "gemini-2.5-flash").await {
            Err(AnalysisError::Extraction(e)) => assert_eq!(e.raw(), "no json here"),
            other => panic!("expected extraction error, got {:?}", other),
        }
    }
}
