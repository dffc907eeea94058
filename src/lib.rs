pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod generator;
pub mod i18n;
pub mod llm;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use errors::{CallFailure, GatewayError, ResearchError};
pub use generator::compose::{CategorizedFacts, ReportCompiler};
pub use generator::context::GeneratorContext;
pub use generator::persona::{PersonaRegistry, ReportStyle};
pub use generator::research::FactGatherer;
pub use generator::triage::TriageAgent;
pub use generator::workflow::{ResearchOutcome, ResearchWorkflow, RunRequest, ask, launch};
pub use types::{Fact, FactSet, GeneratedReport, ReportOptions, ResearchPlan, Topic};
