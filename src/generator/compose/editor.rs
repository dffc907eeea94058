use crate::errors::ResearchError;
use crate::generator::compose::fixer::{repair_sections, section_body};
use crate::generator::compose::types::CategorizedFacts;
use crate::generator::context::GeneratorContext;
use crate::generator::persona::ReportStyle;
use crate::llm::CompletionRequest;
use crate::types::report::REPORT_SECTIONS;
use crate::types::{Fact, GeneratedReport, ReportOptions, ReportOrigin, Topic};

/// 报告编辑器：先compile分组事实，再generate生成报告
#[derive(Debug, Default, Clone)]
pub struct ReportCompiler {
    categorized: Option<CategorizedFacts>,
}

impl ReportCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按分类整理事实，每次调用都整体替换上一次的结果
    pub fn compile(&mut self, facts: &[Fact]) -> CategorizedFacts {
        let categorized = CategorizedFacts::from_facts(facts);
        tracing::info!(
            "🗂️ 整理事实：{}条事实，{}个分类",
            categorized.fact_count(),
            categorized.len()
        );
        self.categorized = Some(categorized.clone());
        categorized
    }

    pub fn categorized(&self) -> Option<&CategorizedFacts> {
        self.categorized.as_ref()
    }

    /// 生成最终报告
    ///
    /// 未调用过`compile`时返回[`ResearchError::Precondition`]。模型调用失败时返回模板报告，
    /// 模型输出缺少章节时补齐后返回。
    pub async fn generate(
        &self,
        context: &GeneratorContext,
        topic: &Topic,
        options: &ReportOptions,
    ) -> Result<GeneratedReport, ResearchError> {
        let categorized = self.categorized.as_ref().ok_or_else(|| {
            ResearchError::Precondition(
                "no facts have been compiled; call compile before generate".to_string(),
            )
        })?;
        let facts_markdown = categorized.to_markdown();

        let request = CompletionRequest::new(
            self.system_prompt(context, options),
            self.build_prompt(topic, &facts_markdown, options),
        )
        .temperature(0.5)
        .max_tokens(options.max_output_size);

        tracing::info!("✍️ 开始生成报告：{}", topic);
        let completion = context
            .complete(&request)
            .await
            .map(|text| text.trim().to_string());

        let report = match completion {
            Ok(text) if !text.is_empty() => {
                let (markdown, repaired) =
                    repair_sections(&text, topic.as_str(), &facts_markdown);
                let origin = if repaired {
                    ReportOrigin::Repaired
                } else {
                    ReportOrigin::Model
                };
                GeneratedReport::new(topic.clone(), markdown, origin)
            }
            Ok(_) => {
                tracing::warn!("⚠️ 模型返回了空报告，使用模板报告");
                self.fallback_report(topic, &facts_markdown)
            }
            Err(e) => {
                tracing::warn!("⚠️ 报告生成失败，使用模板报告: {}", e);
                self.fallback_report(topic, &facts_markdown)
            }
        };

        tracing::info!("✅ 报告生成完成（{:?}）", report.origin);
        Ok(report)
    }

    /// 以指定写作风格生成报告，只影响本次调用，不修改传入的选项
    pub async fn generate_with_style(
        &self,
        context: &GeneratorContext,
        topic: &Topic,
        style: ReportStyle,
        options: &ReportOptions,
    ) -> Result<GeneratedReport, ResearchError> {
        let styled = options.clone().with_persona_instruction(style.instruction());
        self.generate(context, topic, &styled).await
    }

    fn system_prompt(&self, context: &GeneratorContext, options: &ReportOptions) -> String {
        match context.config.target_language.prompt_instruction() {
            Some(language) => format!("{}\n\n{}", options.persona_instruction, language),
            None => options.persona_instruction.clone(),
        }
    }

    fn build_prompt(&self, topic: &Topic, facts_markdown: &str, options: &ReportOptions) -> String {
        let sections = REPORT_SECTIONS
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {}", i + 1, s))
            .collect::<Vec<_>>()
            .join("\n");

        let mut prompt = format!(
            "Generate a comprehensive research report about \"{}\" based on the following facts:\n\n\
             {}\n\n\
             Format the report in Markdown with the following sections, each as a \"## \" heading:\n{}",
            topic, facts_markdown, sections
        );

        if options.include_visual_suggestions {
            prompt.push_str(
                "\n\nWhere it would help the reader, suggest charts, tables or other visualizations \
                 that could illustrate the findings, describing what each would show.",
            );
        }
        if options.include_counter_arguments {
            prompt.push_str(
                "\n\nIn the Detailed Analysis, include counter-arguments and alternative perspectives \
                 to the main findings.",
            );
        }
        prompt
    }

    /// 模型不可用时的模板报告，包含全部章节，Key Findings为整理后的事实原文
    fn fallback_report(&self, topic: &Topic, facts_markdown: &str) -> GeneratedReport {
        let mut markdown = format!("# Research Report: {}\n", topic);
        for section in REPORT_SECTIONS {
            markdown.push_str(&format!(
                "\n## {}\n{}\n",
                section,
                section_body(section, topic.as_str(), facts_markdown)
            ));
        }
        GeneratedReport::new(topic.clone(), markdown, ReportOrigin::Fallback)
    }
}
