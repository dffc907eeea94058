//! LLM Provider支持模块

use anyhow::Result;
use rig::{agent::Agent, client::CompletionClient, completion::Prompt};
use serde_json::{Value, json};

use crate::config::{LLMConfig, LLMProvider};
use crate::llm::gateway::CompletionRequest;

/// 统一的Provider客户端枚举
#[derive(Clone)]
pub enum ProviderClient {
    OpenAI(rig::providers::openai::Client),
    Moonshot(rig::providers::moonshot::Client),
    DeepSeek(rig::providers::deepseek::Client),
    OpenRouter(rig::providers::openrouter::Client),
    Anthropic(rig::providers::anthropic::Client),
    Ollama(rig::providers::ollama::Client),
}

impl ProviderClient {
    /// 根据配置创建相应的provider客户端
    pub fn new(config: &LLMConfig) -> Result<Self> {
        match config.provider {
            LLMProvider::OpenAI => {
                let client = rig::providers::openai::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::OpenAI(client))
            }
            LLMProvider::Moonshot => {
                let client = rig::providers::moonshot::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::Moonshot(client))
            }
            LLMProvider::DeepSeek => {
                let client = rig::providers::deepseek::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::DeepSeek(client))
            }
            LLMProvider::OpenRouter => {
                let client = rig::providers::openrouter::Client::builder(&config.api_key).build();
                Ok(ProviderClient::OpenRouter(client))
            }
            LLMProvider::Anthropic => {
                let client =
                    rig::providers::anthropic::ClientBuilder::new(&config.api_key).build()?;
                Ok(ProviderClient::Anthropic(client))
            }
            LLMProvider::Ollama => {
                let client = rig::providers::ollama::Client::builder().build();
                Ok(ProviderClient::Ollama(client))
            }
        }
    }

    /// 为单次补全请求创建Agent
    ///
    /// 请求的输出长度受`config.max_tokens`约束；JSON模式按provider映射到各自的请求参数，
    /// 不支持的provider仅依赖prompt约束。
    pub fn create_agent(
        &self,
        model: &str,
        request: &CompletionRequest,
        config: &LLMConfig,
    ) -> ProviderAgent {
        let max_tokens = u64::from(request.max_tokens.min(config.max_tokens));
        let json_mode = json_mode_params(&config.provider, request.force_json);

        macro_rules! finish {
            ($builder:expr, $variant:ident) => {{
                let builder = $builder
                    .preamble(&request.system)
                    .max_tokens(max_tokens)
                    .temperature(request.temperature);
                let agent = match json_mode {
                    Some(params) => builder.additional_params(params).build(),
                    None => builder.build(),
                };
                ProviderAgent::$variant(agent)
            }};
        }

        match self {
            ProviderClient::OpenAI(client) => finish!(
                client
                    .completion_model(model)
                    .completions_api()
                    .into_agent_builder(),
                OpenAI
            ),
            ProviderClient::Moonshot(client) => finish!(client.agent(model), Moonshot),
            ProviderClient::DeepSeek(client) => finish!(client.agent(model), DeepSeek),
            ProviderClient::OpenRouter(client) => finish!(client.agent(model), OpenRouter),
            ProviderClient::Anthropic(client) => finish!(client.agent(model), Anthropic),
            ProviderClient::Ollama(client) => finish!(client.agent(model), Ollama),
        }
    }
}

/// JSON模式对应的附加请求参数
pub(crate) fn json_mode_params(provider: &LLMProvider, force_json: bool) -> Option<Value> {
    if !force_json {
        return None;
    }
    match provider {
        LLMProvider::OpenAI
        | LLMProvider::Moonshot
        | LLMProvider::DeepSeek
        | LLMProvider::OpenRouter => Some(json!({ "response_format": { "type": "json_object" } })),
        LLMProvider::Ollama => Some(json!({ "format": "json" })),
        LLMProvider::Anthropic => None,
    }
}

/// 统一的Agent枚举
pub enum ProviderAgent {
    OpenAI(Agent<rig::providers::openai::CompletionModel>),
    OpenRouter(Agent<rig::providers::openrouter::CompletionModel>),
    Anthropic(Agent<rig::providers::anthropic::completion::CompletionModel>),
    Moonshot(Agent<rig::providers::moonshot::CompletionModel>),
    DeepSeek(Agent<rig::providers::deepseek::CompletionModel>),
    Ollama(Agent<rig::providers::ollama::CompletionModel<reqwest::Client>>),
}

impl ProviderAgent {
    /// 执行prompt
    pub async fn prompt(&self, prompt: &str) -> Result<String> {
        match self {
            ProviderAgent::OpenAI(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::Moonshot(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::DeepSeek(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::OpenRouter(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::Anthropic(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::Ollama(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
        }
    }
}
