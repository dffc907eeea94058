use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::topic::Topic;

/// 结构化的调研计划，规划完成后四个字段必然存在且非空
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchPlan {
    pub query: String,
    pub search_queries: Vec<String>,
    pub focus_areas: Vec<String>,
    pub main_objectives: Vec<String>,
}

/// 期望模型返回的调研计划结构，仅用于生成prompt中的JSON Schema
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PlanPayload {
    /// The main research query
    pub query: String,
    /// Key search queries to investigate
    pub search_queries: Vec<String>,
    /// Focus areas for the research
    pub focus_areas: Vec<String>,
    /// Main research objectives
    pub main_objectives: Vec<String>,
}

impl ResearchPlan {
    /// 缺省检索词
    pub fn default_search_queries(topic: &str) -> Vec<String> {
        vec![
            format!("{} overview", topic),
            format!("{} recent studies", topic),
            format!("{} key facts", topic),
        ]
    }

    pub fn default_focus_areas() -> Vec<String> {
        vec![
            "Background".to_string(),
            "Recent Developments".to_string(),
            "Key Challenges".to_string(),
        ]
    }

    pub fn default_main_objectives() -> Vec<String> {
        vec![
            "Understand key concepts".to_string(),
            "Identify major findings".to_string(),
            "Synthesize information".to_string(),
        ]
    }

    /// 完全由兜底规则构造的计划
    pub fn fallback(topic: &Topic) -> Self {
        Self {
            query: topic.to_string(),
            search_queries: Self::default_search_queries(topic.as_str()),
            focus_areas: Self::default_focus_areas(),
            main_objectives: Self::default_main_objectives(),
        }
    }

    /// 从模型返回的JSON对象构造计划，缺失或为空的字段逐个以兜底值补齐
    ///
    /// 返回`None`表示返回值不是JSON对象，调用方应整体使用兜底计划。
    pub fn from_value(topic: &Topic, value: &Value) -> Option<Self> {
        let map = value.as_object()?;

        let query = map
            .get("query")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| topic.to_string());

        Some(Self {
            query,
            search_queries: string_list(map.get("search_queries"))
                .unwrap_or_else(|| Self::default_search_queries(topic.as_str())),
            focus_areas: string_list(map.get("focus_areas"))
                .unwrap_or_else(Self::default_focus_areas),
            main_objectives: string_list(map.get("main_objectives"))
                .unwrap_or_else(Self::default_main_objectives),
        })
    }
}

/// 读取字符串数组，忽略非字符串和空白元素；结果为空时返回None
fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    let items: Vec<String> = value?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (!items.is_empty()).then_some(items)
}
