//! Tolerant JSON object extraction.

use serde_json::Value;

/// Find a JSON object in model output.
///
/// Tries, in order: the whole (trimmed) text, the first fenced code block
/// (` ```json ` or bare ` ``` `), and the span from the first `{` to the last
/// `}`. Returns `None` when none of these parse to a JSON object.
pub fn extract_json_object(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Some(v) = parse_object(trimmed) {
        return Some(v);
    }

    if let Some(block) = fenced_block(trimmed)
        && let Some(v) = parse_object(block)
    {
        return Some(v);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_object(&trimmed[start..=end])
}

fn parse_object(s: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(s) {
        Ok(v @ Value::Object(_)) => Some(v),
        _ => None,
    }
}

fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    // Skip the info string (e.g. "json") up to the end of the line.
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

/// A non-empty string field, accepting numbers as their decimal rendering.
pub fn field_as_string(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A list of non-empty strings; a single string becomes a one-element list.
pub fn field_as_string_list(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_object() {
        let v = extract_json_object(r#"{"intent":"speak","urgency":3}"#).unwrap();
        assert_eq!(v["urgency"], 3);
    }

    #[test]
    fn test_fenced_object() {
        let text = "Here you go:\n```json\n{\"intent\": \"pass\"}\n```\nThanks";
        assert_eq!(extract_json_object(text).unwrap()["intent"], "pass");
    }

    #[test]
    fn test_embedded_object() {
        let text = "Sure! {\"content\": \"hi\"} hope that helps";
        assert_eq!(extract_json_object(text).unwrap()["content"], "hi");
    }

    #[test]
    fn test_rejects_non_objects_and_garbage() {
        assert!(extract_json_object("[1, 2, 3]").is_none());
        assert!(extract_json_object("no json here").is_none());
        assert!(extract_json_object("{ broken").is_none());
        assert!(extract_json_object("} backwards {").is_none());
    }

    #[test]
    fn test_string_helpers() {
        let v = json!({"a": " x ", "n": 4, "empty": "", "list": ["p", "", "q"], "single": "r"});
        assert_eq!(field_as_string(&v, "a"), Some("x".to_string()));
        assert_eq!(field_as_string(&v, "n"), Some("4".to_string()));
        assert_eq!(field_as_string(&v, "empty"), None);
        assert_eq!(field_as_string_list(&v, "list"), vec!["p", "q"]);
        assert_eq!(field_as_string_list(&v, "single"), vec!["r"]);
        assert!(field_as_string_list(&v, "missing").is_empty());
    }
}
