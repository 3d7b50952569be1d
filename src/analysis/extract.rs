use super::result::AnalysisResult;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractionError {
    #[error("model did not return a JSON object")]
    NoJsonFound { raw: String },
    #[error("model returned malformed JSON: {reason}")]
    MalformedJson { reason: String, raw: String },
}

impl ExtractionError {
    /// Raw model output, shown verbatim to the operator.
    pub fn raw(&self) -> &str {
        match self {
            ExtractionError::NoJsonFound { raw } => raw,
            ExtractionError::MalformedJson { raw, .. } => raw,
        }
    }
}

/// Pull the JSON object out of free-form model output.
///
/// The span from the first `{` to the last `}` is tried first. When that span
/// does not parse (prose after the object containing a brace, two objects),
/// the first structurally balanced object is tried instead.
pub fn extract(raw: &str) -> Result<AnalysisResult, ExtractionError> {
    let Some(start) = raw.find('{') else {
        return Err(no_json(raw));
    };
    let Some(end) = raw.rfind('}').filter(|&end| end > start) else {
        return Err(no_json(raw));
    };

    let outer_err = match parse_object(&raw[start..=end]) {
        Ok(result) => return Ok(result),
        Err(e) => e,
    };

    if let Some(candidate) = first_balanced_object(raw) {
        if let Ok(result) = parse_object(candidate) {
            tracing::debug!("recovered JSON object by brace matching");
            return Ok(result);
        }
    }

    Err(ExtractionError::MalformedJson {
        reason: outer_err,
        raw: raw.to_string(),
    })
}

fn no_json(raw: &str) -> ExtractionError {
    ExtractionError::NoJsonFound { raw: raw.to_string() }
}

fn parse_object(candidate: &str) -> Result<AnalysisResult, String> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Ok(AnalysisResult::from_map(map)),
        Ok(_) => Err("top-level JSON value is not an object".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// First `{...}` whose braces balance, ignoring braces inside JSON strings.
fn first_balanced_object(raw: &str) -> Option<&str> {
    let bytes = raw.as_bytes();
    let mut search_from = 0;

    while let Some(offset) = raw[search_from..].find('{') {
        let start = search_from + offset;
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (i, &b) in bytes.iter().enumerate().skip(start) {
            if in_string {
                match b {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        let candidate = &raw[start..=i];
                        if serde_json::from_str::<Value>(candidate).is_ok() {
                            return Some(candidate);
                        }
                        break;
                    }
                }
                _ => {}
            }
        }
        search_from = start + 1;
    }
    None
}
