// 事实收集阶段：按检索计划逐词查询，或对上传的文档逐块抽取事实

pub mod chunker;
pub mod gatherer;

pub use chunker::{DocumentChunk, chunk};
pub use gatherer::FactGatherer;
