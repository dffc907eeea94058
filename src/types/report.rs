use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::types::topic::Topic;

/// 报告必须包含的五个章节，按规定顺序排列
pub const REPORT_SECTIONS: [&str; 5] = [
    "Executive Summary",
    "Key Findings",
    "Detailed Analysis",
    "Conclusions",
    "References",
];

/// 未指定人设时使用的编辑系统提示词
pub const BASELINE_EDITOR_INSTRUCTION: &str =
    "You are a research editor that creates well-structured, informative reports.";

/// 调研深度，对应报告的输出长度预算
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResearchDepth {
    #[serde(rename = "basic")]
    Basic,
    #[serde(rename = "standard")]
    #[default]
    Standard,
    #[serde(rename = "comprehensive")]
    Comprehensive,
}

impl ResearchDepth {
    /// 输出token预算
    pub fn max_output_size(&self) -> u32 {
        match self {
            ResearchDepth::Basic => 2000,
            ResearchDepth::Standard => 3000,
            ResearchDepth::Comprehensive => 4000,
        }
    }
}

impl Display for ResearchDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResearchDepth::Basic => write!(f, "Basic"),
            ResearchDepth::Standard => write!(f, "Standard"),
            ResearchDepth::Comprehensive => write!(f, "Comprehensive"),
        }
    }
}

impl std::str::FromStr for ResearchDepth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(ResearchDepth::Basic),
            "standard" => Ok(ResearchDepth::Standard),
            "comprehensive" => Ok(ResearchDepth::Comprehensive),
            _ => Err(format!("Unknown research depth: {}", s)),
        }
    }
}

/// 报告生成选项，人设指令随每次运行显式传递
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOptions {
    pub include_visual_suggestions: bool,
    pub include_counter_arguments: bool,
    pub max_output_size: u32,
    pub persona_instruction: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            include_visual_suggestions: false,
            include_counter_arguments: false,
            max_output_size: 2000,
            persona_instruction: BASELINE_EDITOR_INSTRUCTION.to_string(),
        }
    }
}

impl ReportOptions {
    pub fn with_depth(mut self, depth: ResearchDepth) -> Self {
        self.max_output_size = depth.max_output_size();
        self
    }

    pub fn with_persona_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.persona_instruction = instruction.into();
        self
    }
}

/// 报告内容的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportOrigin {
    /// 模型生成，章节完整
    Model,
    /// 模型生成，但缺失的章节已补齐
    Repaired,
    /// 网关失败后的模板报告
    Fallback,
}

/// 最终生成的Markdown报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedReport {
    pub topic: Topic,
    pub markdown: String,
    pub origin: ReportOrigin,
    pub generated_at: DateTime<Utc>,
}

impl GeneratedReport {
    pub fn new(topic: Topic, markdown: String, origin: ReportOrigin) -> Self {
        Self {
            topic,
            markdown,
            origin,
            generated_at: Utc::now(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.markdown
    }
}

impl Display for GeneratedReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_budgets() {
        assert_eq!(ResearchDepth::Basic.max_output_size(), 2000);
        assert_eq!(ResearchDepth::Standard.max_output_size(), 3000);
        assert_eq!(ResearchDepth::Comprehensive.max_output_size(), 4000);
    }

    #[test]
    fn test_depth_from_str() {
        assert_eq!(
            "Comprehensive".parse::<ResearchDepth>().unwrap(),
            ResearchDepth::Comprehensive
        );
        assert_eq!("basic".parse::<ResearchDepth>().unwrap(), ResearchDepth::Basic);
        assert!("deep".parse::<ResearchDepth>().is_err());
    }

    #[test]
    fn test_default_options() {
        let options = ReportOptions::default();
        assert!(!options.include_visual_suggestions);
        assert!(!options.include_counter_arguments);
        assert_eq!(options.persona_instruction, BASELINE_EDITOR_INSTRUCTION);

        let options = options.with_depth(ResearchDepth::Comprehensive);
        assert_eq!(options.max_output_size, 4000);
    }
}
