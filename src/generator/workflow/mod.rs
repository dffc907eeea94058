use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::ResearchError;
use crate::generator::compose::{CategorizedFacts, ReportCompiler};
use crate::generator::context::GeneratorContext;
use crate::generator::outlet::{DiskOutlet, Outlet};
use crate::generator::persona::ReportStyle;
use crate::generator::research::FactGatherer;
use crate::generator::triage::TriageAgent;
use crate::llm::LLMClient;
use crate::types::{FactSet, GeneratedReport, ReportOptions, ResearchPlan, Topic};

/// 时间跟踪作用域，阶段按开始的先后顺序记录
pub struct TimingScope {
    start_time: Instant,
    phase_start_times: Vec<(String, Instant)>,
    phase_durations: Vec<(String, Duration)>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            phase_start_times: Vec::new(),
            phase_durations: Vec::new(),
        }
    }

    /// 开始一个新的阶段计时
    pub fn start_phase(&mut self, phase_name: &str) {
        self.phase_start_times
            .push((phase_name.to_string(), Instant::now()));
    }

    /// 结束一个阶段的计时
    pub fn end_phase(&mut self, phase_name: &str) -> Option<Duration> {
        let position = self
            .phase_start_times
            .iter()
            .position(|(name, _)| name == phase_name)?;
        let (name, start_time) = self.phase_start_times.remove(position);
        let duration = start_time.elapsed();
        self.phase_durations.push((name, duration));
        Some(duration)
    }

    /// 获取总执行时间
    pub fn get_total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 获取所有阶段的执行时间
    pub fn get_phase_durations(&self) -> &[(String, Duration)] {
        &self.phase_durations
    }

    pub fn into_phase_durations(self) -> Vec<(String, Duration)> {
        self.phase_durations
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "总执行时间: {:.2}秒\n",
            self.get_total_duration().as_secs_f64()
        );

        if !self.phase_durations.is_empty() {
            report.push_str("\n各阶段执行时间:\n");
            for (phase, duration) in &self.phase_durations {
                report.push_str(&format!("- {}: {:.3}秒\n", phase, duration.as_secs_f64()));
            }
        }

        report
    }
}

/// 时间跟踪常量
pub struct TimingKeys;

impl TimingKeys {
    pub const PLAN: &'static str = "plan";
    pub const GATHER: &'static str = "gather";
    pub const COMPILE: &'static str = "compile";
    pub const GENERATE: &'static str = "generate";

    pub fn get_all_phase_keys() -> Vec<&'static str> {
        vec![Self::PLAN, Self::GATHER, Self::COMPILE, Self::GENERATE]
    }
}

/// 一次完整运行的全部中间结果
#[derive(Debug, Clone)]
pub struct ResearchOutcome {
    pub run_id: Uuid,
    pub topic: Topic,
    pub plan: ResearchPlan,
    pub facts: FactSet,
    pub categorized: CategorizedFacts,
    pub report: GeneratedReport,
    pub timings: Vec<(String, Duration)>,
}

/// 由宿主程序发起的一次调研请求
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub topic: String,
    /// 作为事实来源的文档路径
    pub document: Option<PathBuf>,
    /// 覆盖配置中的写作风格
    pub style: Option<ReportStyle>,
    /// 直接指定的编辑指令，优先于人设与写作风格
    pub instruction: Option<String>,
}

/// 调研流水线：规划 → 收集事实 → 整理并生成报告
pub struct ResearchWorkflow {
    context: GeneratorContext,
    planner: TriageAgent,
    gatherer: FactGatherer,
}

impl ResearchWorkflow {
    pub fn new(context: GeneratorContext) -> Result<Self, ResearchError> {
        let gatherer = FactGatherer::from_config(&context.config.research)?;
        Ok(Self {
            context,
            planner: TriageAgent,
            gatherer,
        })
    }

    pub fn context(&self) -> &GeneratorContext {
        &self.context
    }

    pub fn gatherer(&self) -> &FactGatherer {
        &self.gatherer
    }

    /// 用于加载问答文档
    pub fn gatherer_mut(&mut self) -> &mut FactGatherer {
        &mut self.gatherer
    }

    /// 以默认报告选项执行完整流程
    pub async fn run(&self, topic: &Topic) -> Result<GeneratedReport, ResearchError> {
        let outcome = self
            .run_with(topic, None, &ReportOptions::default(), None)
            .await?;
        Ok(outcome.report)
    }

    /// 执行完整流程并返回全部中间结果
    ///
    /// 提供`style`时使用该风格的编辑指令覆盖`options`中的人设指令，仅对本次运行生效。
    pub async fn run_with(
        &self,
        topic: &Topic,
        document: Option<&str>,
        options: &ReportOptions,
        style: Option<ReportStyle>,
    ) -> Result<ResearchOutcome, ResearchError> {
        let run_id = Uuid::new_v4();
        let mut timing = TimingScope::new();
        tracing::info!("🚀 开始调研 [{}]: {}", run_id, topic);

        timing.start_phase(TimingKeys::PLAN);
        let plan = self.planner.plan(&self.context, topic).await;
        timing.end_phase(TimingKeys::PLAN);

        timing.start_phase(TimingKeys::GATHER);
        let facts = self
            .gatherer
            .gather(&self.context, topic, &plan, document)
            .await;
        timing.end_phase(TimingKeys::GATHER);

        timing.start_phase(TimingKeys::COMPILE);
        let mut compiler = ReportCompiler::new();
        let categorized = compiler.compile(&facts);
        timing.end_phase(TimingKeys::COMPILE);

        timing.start_phase(TimingKeys::GENERATE);
        let report = match style {
            Some(style) => {
                compiler
                    .generate_with_style(&self.context, topic, style, options)
                    .await?
            }
            None => compiler.generate(&self.context, topic, options).await?,
        };
        timing.end_phase(TimingKeys::GENERATE);

        tracing::info!("🎉 调研完成\n{}", timing.generate_timing_report());

        Ok(ResearchOutcome {
            run_id,
            topic: topic.clone(),
            plan,
            facts,
            categorized,
            report,
            timings: timing.into_phase_durations(),
        })
    }
}

/// 根据配置与请求构造本次运行的报告选项
///
/// 请求中的编辑指令只写入本次运行的选项，不进入共享的人设注册表。
pub fn report_options_for(context: &GeneratorContext, request: &RunRequest) -> ReportOptions {
    let mut options = context.report_options();
    if let Some(instruction) = &request.instruction {
        options.persona_instruction = instruction.clone();
    }
    options
}

/// 本次运行实际使用的写作风格
///
/// 显式的编辑指令优先于任何风格；否则请求中的风格优先于配置中的风格。
pub fn style_for(config: &Config, request: &RunRequest) -> Option<ReportStyle> {
    if request.instruction.is_some() {
        return None;
    }
    request.style.or(config.research.style)
}

/// 创建模型客户端，连接检查失败时只记录警告，后续各阶段自带兜底
async fn connect(config: &Config) -> Result<Arc<LLMClient>> {
    let client = LLMClient::new(config)?;
    if config.check_connection
        && let Err(e) = client.check_connection().await
    {
        tracing::warn!("⚠️ 模型连接检查失败，继续执行，各阶段将使用兜底结果: {}", e);
    }
    Ok(Arc::new(client))
}

fn log_cache_stats(client: &LLMClient) {
    let stats = client.cache().stats();
    tracing::info!(
        "💰 缓存统计：命中{}次，未命中{}次，命中率{:.1}%",
        stats.hits,
        stats.misses,
        stats.hit_rate() * 100.0
    );
}

/// 启动调研工作流并保存结果
pub async fn launch(config: &Config, request: RunRequest) -> Result<ResearchOutcome> {
    let topic = Topic::new(request.topic.as_str())?;
    let document = match &request.document {
        Some(path) => Some(read_document(path)?),
        None => None,
    };
    tracing::info!("📝 报告语言: {}", config.target_language.display_name());

    let client = connect(config).await?;
    let context = GeneratorContext::with_gateway(config.clone(), client.clone());

    let options = report_options_for(&context, &request);
    let style = style_for(config, &request);
    let workflow = ResearchWorkflow::new(context)?;

    let outcome = workflow
        .run_with(&topic, document.as_deref(), &options, style)
        .await?;

    log_cache_stats(&client);

    DiskOutlet::new(config.output_path.clone()).save(&outcome).await?;
    Ok(outcome)
}

/// 载入文档并就其内容回答一个问题
pub async fn ask(config: &Config, document: &Path, question: &str) -> Result<String> {
    let text = read_document(document)?;
    let name = document
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| document.display().to_string());

    let client = connect(config).await?;
    let context = GeneratorContext::with_gateway(config.clone(), client.clone());
    let mut workflow = ResearchWorkflow::new(context)?;

    let answer = answer_from_document(&mut workflow, &name, &text, question).await;
    log_cache_stats(&client);
    Ok(answer)
}

/// 将文档加入问答上下文后回答问题
pub async fn answer_from_document(
    workflow: &mut ResearchWorkflow,
    name: &str,
    text: &str,
    question: &str,
) -> String {
    workflow.gatherer_mut().add_context(name, text);
    workflow
        .gatherer()
        .query_documents(workflow.context(), question)
        .await
}

fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("无法读取文档 {}", path.display()))
}
