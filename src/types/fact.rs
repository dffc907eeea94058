use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 缺省分类
pub const DEFAULT_CATEGORY: &str = "General";

/// 缺省来源
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// 一条带来源和分类的事实
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// 事实陈述
    #[serde(rename = "fact")]
    pub text: String,
    /// 来源，URL或者"Uploaded Document"这样的字面标签
    pub source: String,
    pub category: String,
    /// 产生该事实的检索词，仅作参考
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// 一次流水线运行收集到的全部事实
pub type FactSet = Vec<Fact>;

/// 模型输出中单条事实的结构，用于在prompt中描述期望的JSON格式
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FactPayload {
    /// The factual statement
    pub fact: String,
    /// A website URL or label where this information can be found
    pub source: String,
    /// A relevant category for this fact
    pub category: String,
}

impl Fact {
    pub fn new(
        text: impl Into<String>,
        source: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            category: category.into(),
            query: None,
            timestamp: None,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// 从模型返回的单个JSON条目构造事实
    ///
    /// 陈述文本依次尝试`fact`、`text`、`statement`字段，缺失时丢弃该条目；
    /// 字符串条目直接视为陈述文本。来源缺省为"Unknown"，分类缺省为"General"。
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| Fact::new(text, UNKNOWN_SOURCE, DEFAULT_CATEGORY))
            }
            Value::Object(map) => {
                let text = ["fact", "text", "statement"]
                    .iter()
                    .find_map(|key| non_empty_str(map.get(*key)))?;
                let source = non_empty_str(map.get("source")).unwrap_or(UNKNOWN_SOURCE);
                let category = non_empty_str(map.get("category")).unwrap_or(DEFAULT_CATEGORY);

                let mut fact = Fact::new(text, source, category);
                if let Some(query) = non_empty_str(map.get("query")) {
                    fact.query = Some(query.to_string());
                }
                if let Some(timestamp) = non_empty_str(map.get("timestamp"))
                    && let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp)
                {
                    fact.timestamp = Some(parsed.with_timezone(&Utc));
                }
                Some(fact)
            }
            _ => None,
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
