use super::result::Category;
use crate::feed::types::Article;

/// Render the analyst/editor instruction for one article. Article text is
/// interpolated as-is.
pub fn build_prompt(article: &Article) -> String {
    format!(
        r#"You are an AI News Analyst and Editor.

ARTICLE DATA:
Title: {title}
Source: {source}
Snippet: {snippet}

TASKS:
1. Categorize: Choose ONE from [{categories}].
2. Sentiment: Analyze the tone (Positive, Negative, or Neutral).
3. Fact Check: Assess credibility (0-100%) based on source reputation and snippet logic.
4. Blog Post: Write a 100-word blog summary.
5. Social Post: Write a punchy tweet with hashtags.

OUTPUT FORMAT:
Return valid JSON only. No markdown formatting.
{{
    "category": "...",
    "sentiment": "...",
    "truth_score": 85,
    "fact_check_reason": "...",
    "blog_draft": "...",
    "social_draft": "..."
}}
"#,
        title = article.title,
        source = article.source,
        snippet = article.summary,
        categories = Category::ALL.map(Category::label).join(", "),
    )
}
