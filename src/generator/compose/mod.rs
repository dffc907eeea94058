// 编辑阶段：整理事实并生成带固定章节结构的报告

pub mod editor;
pub mod fixer;
pub mod types;

pub use editor::ReportCompiler;
pub use types::CategorizedFacts;
