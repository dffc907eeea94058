use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;

use crate::config::Config;
use crate::errors::{CallFailure, GatewayError};
use crate::generator::persona::PersonaRegistry;
use crate::llm::{CompletionRequest, LLMClient, LlmGateway, complete_json};
use crate::types::ReportOptions;

#[derive(Clone)]
pub struct GeneratorContext {
    /// LLM网关，用于与AI通信。
    pub gateway: Arc<dyn LlmGateway>,
    /// 配置
    pub config: Config,
    /// 人设注册表
    pub personas: Arc<PersonaRegistry>,
}

impl GeneratorContext {
    /// 根据配置创建基于rig的上下文
    pub fn new(config: Config) -> Result<Self> {
        let client = LLMClient::new(&config)?;
        Ok(Self::with_gateway(config, Arc::new(client)))
    }

    /// 使用指定的网关创建上下文
    pub fn with_gateway(config: Config, gateway: Arc<dyn LlmGateway>) -> Self {
        Self {
            gateway,
            config,
            personas: Arc::new(PersonaRegistry::new()),
        }
    }

    pub fn with_personas(mut self, personas: Arc<PersonaRegistry>) -> Self {
        self.personas = personas;
        self
    }

    /// 执行一次文本补全
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        tracing::debug!(
            temperature = request.temperature,
            max_tokens = request.max_tokens,
            force_json = request.force_json,
            "prompt: {}",
            request.user
        );
        self.gateway.complete(request).await
    }

    /// 执行一次要求JSON结果的补全
    pub async fn complete_json(&self, request: &CompletionRequest) -> Result<Value, CallFailure> {
        tracing::debug!(
            temperature = request.temperature,
            max_tokens = request.max_tokens,
            "json prompt: {}",
            request.user
        );
        complete_json(self.gateway.as_ref(), request).await
    }

    /// 根据配置生成本次运行的报告选项
    ///
    /// 配置了人设ID时使用注册表中的指令，否则使用基础编辑指令。
    pub fn report_options(&self) -> ReportOptions {
        let research = &self.config.research;
        let mut options = ReportOptions {
            include_visual_suggestions: research.include_visual_suggestions,
            include_counter_arguments: research.include_counter_arguments,
            ..ReportOptions::default()
        }
        .with_depth(research.depth);

        if let Some(persona) = &research.persona {
            options.persona_instruction = self.personas.get_instruction(persona);
        }
        options
    }
}
