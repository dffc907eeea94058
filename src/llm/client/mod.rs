//! LLM客户端 - 基于rig的网关实现

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::CacheManager;
use crate::config::{Config, LLMConfig};
use crate::errors::GatewayError;
use crate::llm::gateway::{CompletionRequest, LlmGateway};

mod providers;
pub mod utils;

use providers::ProviderClient;
use utils::evaluate_befitting_model;

const CACHE_CATEGORY: &str = "completions";

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
    cache: Arc<CacheManager>,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: &Config) -> Result<Self> {
        let client = ProviderClient::new(&config.llm)?;
        Ok(Self {
            config: config.llm.clone(),
            client,
            cache: Arc::new(CacheManager::new(config.cache.clone())),
        })
    }

    /// 检查模型连接是否正常
    pub async fn check_connection(&self) -> Result<()> {
        tracing::info!("🔄 正在检查模型连接...");
        let request = CompletionRequest::new("You are a helpful assistant.", "Hello").max_tokens(16);
        match self.complete_with_model(&self.config.model_efficient, &request).await {
            Ok(_) => {
                tracing::info!("✅ 模型连接正常");
                Ok(())
            }
            Err(e) => {
                tracing::error!("❌ 模型连接失败: {}", e);
                Err(e.into())
            }
        }
    }

    /// 缓存统计
    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// 通用重试逻辑，重试间隔附带随机抖动
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T, GatewayError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let max_retries = self.config.retry_attempts.max(1);
        let retry_delay_ms = self.config.retry_delay_ms;
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    retries += 1;
                    tracing::warn!(
                        "❌ 调用模型服务出错，重试中 (第 {} / {}次尝试): {}",
                        retries,
                        max_retries,
                        err
                    );
                    if retries >= max_retries {
                        return Err(err);
                    }
                    let jitter = rand::rng().random_range(0..=retry_delay_ms / 4);
                    tokio::time::sleep(Duration::from_millis(retry_delay_ms + jitter)).await;
                }
            }
        }
    }

    /// 使用指定模型执行一次调用（带超时）
    async fn complete_once(
        &self,
        model: &str,
        request: &CompletionRequest,
    ) -> Result<String, GatewayError> {
        let agent = self.client.create_agent(model, request, &self.config);
        let timeout = Duration::from_secs(self.config.timeout_seconds);

        match tokio::time::timeout(timeout, agent.prompt(&request.user)).await {
            Err(_) => Err(GatewayError::Timeout(self.config.timeout_seconds)),
            Ok(Err(e)) => Err(GatewayError::Provider(e.to_string())),
            Ok(Ok(text)) if text.trim().is_empty() => Err(GatewayError::EmptyCompletion),
            Ok(Ok(text)) => Ok(text),
        }
    }

    async fn complete_with_model(
        &self,
        model: &str,
        request: &CompletionRequest,
    ) -> Result<String, GatewayError> {
        let cache_key = cache_key(model, request);
        if let Some(cached) = self.cache.get::<String>(CACHE_CATEGORY, &cache_key).await {
            tracing::debug!("   💰 命中缓存 [{}]", model);
            return Ok(cached);
        }

        let text = self
            .retry_with_backoff(|| self.complete_once(model, request))
            .await?;

        if let Err(e) = self.cache.set(CACHE_CATEGORY, &cache_key, &text).await {
            tracing::warn!("⚠️ 写入缓存失败: {}", e);
        }
        Ok(text)
    }
}

/// 缓存键包含模型与全部请求参数
fn cache_key(model: &str, request: &CompletionRequest) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        model,
        request.temperature,
        request.max_tokens,
        request.force_json,
        request.system,
        request.user
    )
}

#[async_trait]
impl LlmGateway for LLMClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let (befitting_model, fallover_model) =
            evaluate_befitting_model(&self.config, &request.system, &request.user);

        match self.complete_with_model(&befitting_model, request).await {
            Ok(text) => Ok(text),
            Err(e) => match fallover_model {
                Some(model) => {
                    tracing::warn!(
                        "❌ 调用模型服务出错，尝试 {} 次均失败，尝试使用备选模型{}...{}",
                        self.config.retry_attempts,
                        model,
                        e
                    );
                    self.complete_with_model(&model, request).await
                }
                None => Err(e),
            },
        }
    }
}
