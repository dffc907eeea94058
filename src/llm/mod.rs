//! LLM网关 - 组件只依赖[`LlmGateway`]，具体的模型服务由[`client::LLMClient`]提供

pub mod client;
pub mod gateway;
pub mod json;
pub mod mock;

pub use client::LLMClient;
pub use gateway::{CompletionRequest, LlmGateway, complete_json};
