//! 错误类型定义
//!
//! 模型侧的失败（[`GatewayError`]、[`CallFailure::Malformed`]）会在各个组件内部被转换为兜底数据，
//! 不会越过组件边界；只有调用方的误用（[`ResearchError`]）才会返回给调用方。

use thiserror::Error;

/// LLM网关调用失败
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GatewayError {
    /// 服务端返回错误（网络、鉴权、配额等）
    #[error("LLM provider error: {0}")]
    Provider(String),

    /// 调用超时
    #[error("LLM call timed out after {0} seconds")]
    Timeout(u64),

    /// 模型返回了空内容
    #[error("LLM returned an empty completion")]
    EmptyCompletion,
}

/// 需要JSON结果的网关调用的失败类型，供各组件显式选择兜底分支
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CallFailure {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// 网关调用成功，但返回内容不是合法JSON
    #[error("malformed JSON response: {reason}")]
    Malformed { reason: String, raw: String },
}

/// 由调用方误用引起、必须上抛的错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResearchError {
    /// 前置条件不满足，例如在compile之前调用generate
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// 配置错误，例如分块的overlap不小于max_size
    #[error("invalid configuration: {0}")]
    Configuration(String),
}
