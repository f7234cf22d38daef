//! Utilities for pulling JSON out of free-text model responses.
//!
//! Models without native structured output tend to wrap JSON in markdown
//! fences or surround it with chatter. These helpers recover the document.

use deepbook_error::{DeepbookResult, StoryError, StoryErrorKind};

/// Extract JSON from a response that may contain markdown or extra text.
///
/// Strategies, in order:
/// 1. Markdown code blocks: ```json ... ``` (or an unlabelled fence)
/// 2. Balanced braces: { ... }
/// 3. Balanced brackets: [ ... ]
///
/// Whichever of `{` and `[` appears first is tried first.
///
/// # Errors
///
/// Returns [`StoryErrorKind::NoJsonFound`] if no candidate is found.
///
/// # Examples
///
/// ```
/// use deepbook_story::extract_json;
///
/// let response = "Here is the metadata:\n```json\n{\"title\": \"Tilly\"}\n```\nEnjoy!";
/// assert_eq!(extract_json(response).unwrap(), "{\"title\": \"Tilly\"}");
/// ```
pub fn extract_json(response: &str) -> DeepbookResult<String> {
    if let Some(json) = extract_from_code_block(response) {
        return Ok(json);
    }

    let ordered = match (response.find('['), response.find('{')) {
        (Some(bracket), Some(brace)) if bracket < brace => [('[', ']'), ('{', '}')],
        _ => [('{', '}'), ('[', ']')],
    };
    for (open, close) in ordered {
        if let Some(json) = extract_balanced(response, open, close) {
            return Ok(json);
        }
    }

    tracing::error!(
        response_length = response.len(),
        "No JSON found in model response"
    );
    Err(StoryError::new(StoryErrorKind::NoJsonFound(response.len())).into())
}

/// Content of the first fenced block that looks like JSON.
///
/// A missing closing fence (a truncated response) yields everything after
/// the opening fence.
fn extract_from_code_block(response: &str) -> Option<String> {
    let start = response.find("```")?;
    let after_fence = &response[start + 3..];
    let body_start = after_fence.find('\n').map(|n| n + 1).unwrap_or(0);
    let label = after_fence[..body_start].trim();
    if !(label.is_empty() || label.eq_ignore_ascii_case("json")) {
        return None;
    }

    let body = &after_fence[body_start..];
    let content = match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    };
    let content = content.trim();
    (content.starts_with('{') || content.starts_with('[')).then(|| content.to_string())
}

/// Content between the first `open` and its matching `close`, respecting
/// string literals.
fn extract_balanced(response: &str, open: char, close: char) -> Option<String> {
    let start = response.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(response[start..start + i + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse JSON into a specific type.
///
/// # Errors
///
/// Returns [`StoryErrorKind::Extraction`] if the text is not valid JSON
/// for `T`.
///
/// # Examples
///
/// ```
/// use deepbook_story::parse_json;
/// use serde_json::Value;
///
/// let value: Value = parse_json(r#"{"chapter": 1, "text": "Once upon a time."}"#).unwrap();
/// assert_eq!(value["chapter"], 1);
/// ```
pub fn parse_json<T>(json_str: &str) -> DeepbookResult<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(json_str).map_err(|e| {
        let preview = json_str.chars().take(100).collect::<String>();

        tracing::error!(
            error = %e,
            json_preview = %preview,
            "JSON parsing failed"
        );

        StoryError::new(StoryErrorKind::Extraction(format!(
            "{} (JSON: {}...)",
            e, preview
        )))
        .into()
    })
}
