// Extraction must recover any object the model wraps in prose

#[cfg(test)]
mod tests {
    use aletheia::analysis::extract::{extract, ExtractionError};
    use serde_json::json;

    #[test]
    fn test_object_survives_surrounding_prose() {
        let object = json!({
            "category": "Politics",
            "sentiment": "Negative",
            "truth_score": 35,
            "fact_check_reason": "Single anonymous source",
            "blog_draft": "A draft with {braces} inside",
            "social_draft": "Thread 1/3"
        });
        let body = serde_json::to_string_pretty(&object).unwrap();
        let wrappings = [
            body.clone(),
            format!("Here you go:\n{}", body),
            format!("```json\n{}\n```", body),
            format!("Analysis follows.\n\n{}\n\nLet me know if you need more.", body),
        ];
        for raw in &wrappings {
            let result = extract(raw).unwrap();
            assert_eq!(result.fields(), object.as_object().unwrap(), "input: {}", raw);
            assert_eq!(result.truth_score(), 35);
        }
    }

    #[test]
    fn test_failures_carry_raw_text() {
        match extract("no braces at all") {
            Err(ExtractionError::NoJsonFound { raw }) => assert_eq!(raw, "no braces at all"),
            other => panic!("expected NoJsonFound, got {:?}", other),
        }
        match extract("{\"category\": }") {
            Err(e @ ExtractionError::MalformedJson { .. }) => assert_eq!(e.raw(), "{\"category\": }"),
            other => panic!("expected MalformedJson, got {:?}", other),
        }
    }
}
