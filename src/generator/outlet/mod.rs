use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::generator::workflow::ResearchOutcome;

pub const REPORT_FILE: &str = "report.md";
pub const PLAN_FILE: &str = "plan.json";
pub const FACTS_FILE: &str = "facts.json";
pub const RUN_FILE: &str = "run.json";

pub trait Outlet {
    /// 保存一次运行的结果，返回结果所在的位置
    async fn save(&self, outcome: &ResearchOutcome) -> Result<PathBuf>;
}

/// 运行摘要
#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    run_id: String,
    topic: &'a str,
    origin: String,
    generated_at: String,
    fact_count: usize,
    categories: Vec<&'a str>,
    timings_ms: Vec<(&'a str, u64)>,
}

/// 把报告和中间结果写到磁盘，每次运行一个目录
pub struct DiskOutlet {
    output_dir: PathBuf,
}

impl DiskOutlet {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// 运行目录名：主题slug + 生成时间 + run id前8位
    pub fn run_dir_name(outcome: &ResearchOutcome) -> String {
        let run_id = outcome.run_id.simple().to_string();
        format!(
            "{}_{}_{}",
            outcome.topic.slug(),
            outcome.report.generated_at.format("%Y%m%d_%H%M%S"),
            &run_id[..8]
        )
    }

    fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(value)?;
        fs::write(path, content).with_context(|| format!("无法写入文件 {}", path.display()))
    }
}

impl Outlet for DiskOutlet {
    async fn save(&self, outcome: &ResearchOutcome) -> Result<PathBuf> {
        tracing::info!("🖊️ 报告存储中...");
        let run_dir = self.output_dir.join(Self::run_dir_name(outcome));
        fs::create_dir_all(&run_dir)
            .with_context(|| format!("无法创建输出目录 {}", run_dir.display()))?;

        let report_path = run_dir.join(REPORT_FILE);
        fs::write(&report_path, &outcome.report.markdown)
            .with_context(|| format!("无法写入报告 {}", report_path.display()))?;
        tracing::info!("💾 已保存报告: {}", report_path.display());

        Self::write_json(&run_dir.join(PLAN_FILE), &outcome.plan)?;
        Self::write_json(&run_dir.join(FACTS_FILE), &outcome.categorized)?;

        let summary = RunSummary {
            run_id: outcome.run_id.to_string(),
            topic: outcome.topic.as_str(),
            origin: format!("{:?}", outcome.report.origin),
            generated_at: outcome.report.generated_at.to_rfc3339(),
            fact_count: outcome.facts.len(),
            categories: outcome.categorized.categories(),
            timings_ms: outcome
                .timings
                .iter()
                .map(|(stage, duration)| (stage.as_str(), duration.as_millis() as u64))
                .collect(),
        };
        Self::write_json(&run_dir.join(RUN_FILE), &summary)?;

        tracing::info!("💾 结果保存完成，输出目录: {}", run_dir.display());
        Ok(run_dir)
    }
}
