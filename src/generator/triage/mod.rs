// 规划阶段：把自由文本的主题拆解为检索词、关注领域和调研目标

use schemars::schema_for;

use crate::errors::CallFailure;
use crate::generator::context::GeneratorContext;
use crate::llm::CompletionRequest;
use crate::types::plan::PlanPayload;
use crate::types::{ResearchPlan, Topic};

const PLANNER_SYSTEM_PROMPT: &str =
    "You are a research planner that creates detailed research strategies.";

/// 调研规划器
#[derive(Debug, Default, Clone, Copy)]
pub struct TriageAgent;

impl TriageAgent {
    /// 生成调研计划，任何失败都回退到兜底计划，因此不会返回错误
    pub async fn plan(&self, context: &GeneratorContext, topic: &Topic) -> ResearchPlan {
        tracing::info!("🧭 开始为主题 \"{}\" 制定调研计划", topic);

        let request = CompletionRequest::new(PLANNER_SYSTEM_PROMPT, self.build_prompt(topic))
            .temperature(0.7)
            .max_tokens(800)
            .force_json();

        match context.complete_json(&request).await {
            Ok(value) => match ResearchPlan::from_value(topic, &value) {
                Some(plan) => {
                    tracing::info!(
                        "✅ 调研计划已生成：{}个检索词，{}个关注领域",
                        plan.search_queries.len(),
                        plan.focus_areas.len()
                    );
                    plan
                }
                None => {
                    tracing::warn!("⚠️ 调研计划不是JSON对象，使用兜底计划");
                    ResearchPlan::fallback(topic)
                }
            },
            Err(CallFailure::Gateway(e)) => {
                tracing::warn!("⚠️ 调研规划调用失败，使用兜底计划: {}", e);
                ResearchPlan::fallback(topic)
            }
            Err(CallFailure::Malformed { reason, .. }) => {
                tracing::warn!("⚠️ 调研计划JSON解析失败，使用兜底计划: {}", reason);
                ResearchPlan::fallback(topic)
            }
        }
    }

    fn build_prompt(&self, topic: &Topic) -> String {
        let schema = serde_json::to_string_pretty(&schema_for!(PlanPayload)).unwrap_or_default();
        format!(
            "Create a research plan for the topic: \"{}\".\n\n\
             Break the topic down into specific search queries, the focus areas worth covering \
             and the main objectives of the research.\n\n\
             Respond with a single JSON object matching this JSON schema:\n{}",
            topic, schema
        )
    }
}
