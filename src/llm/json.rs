//! 宽松的JSON解析，兼容模型输出中常见的代码块包裹和前后说明文字

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*\n?(.*?)```").expect("valid code fence regex")
});

/// 解析模型返回的JSON文本
///
/// 依次尝试：原文、```json代码块内容、首个`{`/`[`到最后一个`}`/`]`之间的片段。
pub fn parse_lenient(text: &str) -> Result<Value, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err("empty response".to_string());
    }

    let first_error = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => return Ok(value),
        Err(e) => e.to_string(),
    };

    if let Some(captures) = CODE_FENCE.captures(trimmed)
        && let Some(inner) = captures.get(1)
        && let Ok(value) = serde_json::from_str::<Value>(inner.as_str().trim())
    {
        return Ok(value);
    }

    if let Some(candidate) = outermost_json_span(trimmed)
        && let Ok(value) = serde_json::from_str::<Value>(candidate)
    {
        return Ok(value);
    }

    Err(first_error)
}

fn outermost_json_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let closing = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closing)?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_json() {
        assert_eq!(parse_lenient(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
        assert_eq!(parse_lenient("  [1, 2] ").unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_fenced_json() {
        let text = "Here you go:\n```json\n{\"facts\": [\"x\"]}\n```\nThanks";
        assert_eq!(parse_lenient(text).unwrap(), json!({"facts": ["x"]}));
    }

    #[test]
    fn test_json_with_surrounding_prose() {
        let text = "Sure! [{\"fact\": \"a\"}] hope it helps";
        assert_eq!(parse_lenient(text).unwrap(), json!([{"fact": "a"}]));
    }

    #[test]
    fn test_rejects_non_json() {
        assert!(parse_lenient("no json here").is_err());
        assert!(parse_lenient("   ").is_err());
        assert!(parse_lenient("{ broken").is_err());
    }
}
