use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::errors::{CallFailure, GatewayError};
use crate::llm::json::parse_lenient;

/// 一次补全请求：系统消息 + 用户消息 + 模型参数
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// 要求模型只输出JSON
    pub force_json: bool,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.7,
            max_tokens: 800,
            force_json: false,
        }
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn force_json(mut self) -> Self {
        self.force_json = true;
        self
    }
}

/// 外部LLM服务的抽象，调用方负责凭据、地址与模型选择
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError>;
}

/// 调用网关并把结果解析为JSON
///
/// 网关失败与内容格式错误分别以[`CallFailure::Gateway`]和[`CallFailure::Malformed`]返回，
/// 由调用方决定各自的兜底方式。
pub async fn complete_json(
    gateway: &dyn LlmGateway,
    request: &CompletionRequest,
) -> Result<Value, CallFailure> {
    let text = gateway.complete(request).await?;
    parse_lenient(&text).map_err(|reason| CallFailure::Malformed { reason, raw: text })
}
