use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::errors::ResearchError;

/// 调研主题，一次流水线运行期间不可变
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// 创建主题，空白主题视为配置错误
    pub fn new(topic: impl Into<String>) -> Result<Self, ResearchError> {
        let topic = topic.into();
        let trimmed = topic.trim();
        if trimmed.is_empty() {
            return Err(ResearchError::Configuration(
                "research topic must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 用于输出文件名的安全形式
    pub fn slug(&self) -> String {
        self.0
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect::<String>()
            .trim_matches('_')
            .to_string()
    }
}

impl Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_is_trimmed() {
        let topic = Topic::new("  renewable energy \n").unwrap();
        assert_eq!(topic.as_str(), "renewable energy");
    }

    #[test]
    fn test_blank_topic_is_rejected() {
        assert!(matches!(
            Topic::new("   "),
            Err(ResearchError::Configuration(_))
        ));
        assert!(Topic::new("").is_err());
    }

    #[test]
    fn test_topic_slug() {
        let topic = Topic::new("AI in healthcare?").unwrap();
        assert_eq!(topic.slug(), "AI_in_healthcare");
    }
}
