pub mod fact;
pub mod plan;
pub mod report;
pub mod topic;

pub use fact::{Fact, FactSet};
pub use plan::ResearchPlan;
pub use report::{GeneratedReport, ReportOptions, ReportOrigin, ResearchDepth};
pub use topic::Topic;
