//! 可编排的网关替身，用于在不访问模型服务的情况下驱动各组件

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::errors::GatewayError;
use crate::llm::gateway::{CompletionRequest, LlmGateway};

type ResponderFn = dyn Fn(&CompletionRequest) -> Result<String, GatewayError> + Send + Sync;

enum Responder {
    Always(String),
    Failing(GatewayError),
    Script(Mutex<VecDeque<Result<String, GatewayError>>>),
    Custom(Box<ResponderFn>),
}

/// 网关替身，会记录收到的每一个请求
pub struct MockGateway {
    responder: Responder,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockGateway {
    fn with(responder: Responder) -> Self {
        Self {
            responder,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 每次调用都返回同一段文本
    pub fn always(response: impl Into<String>) -> Self {
        Self::with(Responder::Always(response.into()))
    }

    /// 每次调用都失败
    pub fn failing() -> Self {
        Self::with(Responder::Failing(GatewayError::Provider(
            "simulated outage".to_string(),
        )))
    }

    /// 按顺序返回预设结果，用尽后返回失败
    pub fn scripted(responses: Vec<Result<String, GatewayError>>) -> Self {
        Self::with(Responder::Script(Mutex::new(responses.into())))
    }

    /// 根据请求内容动态生成结果
    pub fn responding<F>(responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String, GatewayError> + Send + Sync + 'static,
    {
        Self::with(Responder::Custom(Box::new(responder)))
    }

    /// 已收到的请求（按到达顺序）
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmGateway for MockGateway {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        match &self.responder {
            Responder::Always(text) => Ok(text.clone()),
            Responder::Failing(error) => Err(error.clone()),
            Responder::Script(queue) => queue
                .lock()
                .ok()
                .and_then(|mut queue| queue.pop_front())
                .unwrap_or_else(|| Err(GatewayError::Provider("script exhausted".to_string()))),
            Responder::Custom(responder) => responder(request),
        }
    }
}
