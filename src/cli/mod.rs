use crate::config::{Config, LLMProvider};
use crate::generator::persona::ReportStyle;
use crate::generator::workflow::RunRequest;
use crate::i18n::TargetLanguage;
use crate::types::ResearchDepth;
use anyhow::{Result, bail};
use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "triad.toml";

/// Triad - 由规划、检索、编辑三个角色协作完成的调研报告生成引擎
#[derive(Parser, Debug)]
#[command(name = "triad")]
#[command(
    about = "Produces a structured research report from a free-text topic by planning the research, gathering facts and compiling them into a report with an LLM."
)]
#[command(version)]
pub struct Args {
    /// 调研主题
    pub topic: Option<String>,

    /// 作为事实来源的文本文档
    #[arg(short, long)]
    pub document: Option<PathBuf>,

    /// 输出路径
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 人设ID (academic, journalist, business, technical, medical)
    #[arg(short, long)]
    pub persona: Option<String>,

    /// 报告写作风格 (academic, journalistic, business, technical)
    #[arg(short, long)]
    pub style: Option<String>,

    /// 调研深度 (basic, standard, comprehensive)
    #[arg(long)]
    pub depth: Option<String>,

    /// 直接指定编辑指令，优先于人设
    #[arg(long)]
    pub instruction: Option<String>,

    /// 在报告中给出可视化建议
    #[arg(long)]
    pub visual_suggestions: bool,

    /// 在报告中包含反方观点
    #[arg(long)]
    pub counter_arguments: bool,

    /// 就`--document`指定的文档回答一个问题后退出
    #[arg(long, requires = "document")]
    pub ask: Option<String>,

    /// 列出可用的人设后退出
    #[arg(long)]
    pub list_personas: bool,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// 高能效模型，用于常规的规划与事实收集
    #[arg(long)]
    pub model_efficient: Option<String>,

    /// 高质量模型，用于长prompt，以及作为efficient失效情况下的兜底
    #[arg(long)]
    pub model_powerful: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// LLM Provider (openai, moonshot, deepseek, openrouter, anthropic, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 事实收集的最大并发数
    #[arg(long)]
    pub max_parallels: Option<usize>,

    /// 目标语言 (zh, en, ja, ko, de, fr, ru)
    #[arg(long)]
    pub target_language: Option<String>,

    /// 文档分块大小（字符）
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// 相邻分块的重叠长度（字符）
    #[arg(long)]
    pub chunk_overlap: Option<usize>,

    /// 是否禁用缓存
    #[arg(long)]
    pub no_cache: bool,

    /// 启动时检查模型连接，失败时仅输出警告
    #[arg(long)]
    pub check_connection: bool,
}

impl Args {
    /// 将CLI参数转换为配置
    ///
    /// 在日志初始化之前调用，告警直接写到stderr。
    pub fn into_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            // 显式指定的配置文件必须能读取
            Some(config_path) => Config::from_file(config_path)?,
            None => {
                let default_config_path = std::env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join(DEFAULT_CONFIG_FILE);

                if default_config_path.exists() {
                    Config::from_file(&default_config_path)?
                } else {
                    Config::default()
                }
            }
        };

        if let Some(output_path) = &self.output_path {
            config.output_path = output_path.clone();
        }

        // 覆盖LLM配置
        if let Some(provider_str) = &self.llm_provider {
            match provider_str.parse::<LLMProvider>() {
                Ok(provider) => config.llm.provider = provider,
                Err(_) => eprintln!(
                    "⚠️ 警告: 未知的provider: {}，使用默认provider",
                    provider_str
                ),
            }
        }
        if let Some(llm_api_base_url) = &self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url.clone();
        }
        if let Some(llm_api_key) = &self.llm_api_key {
            config.llm.api_key = llm_api_key.clone();
        }
        if let Some(model_efficient) = &self.model_efficient {
            config.llm.model_efficient = model_efficient.clone();
        }
        if let Some(model_powerful) = &self.model_powerful {
            config.llm.model_powerful = model_powerful.clone();
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(max_parallels) = self.max_parallels {
            config.llm.max_parallels = max_parallels;
        }

        // 目标语言配置
        if let Some(target_language_str) = &self.target_language {
            match target_language_str.parse::<TargetLanguage>() {
                Ok(target_language) => config.target_language = target_language,
                Err(_) => eprintln!(
                    "⚠️ 警告: 未知的目标语言: {}，使用默认语言 (English)",
                    target_language_str
                ),
            }
        }

        // 调研配置
        if let Some(depth) = &self.depth {
            config.research.depth = depth.parse::<ResearchDepth>().map_err(anyhow::Error::msg)?;
        }
        if let Some(persona) = &self.persona {
            config.research.persona = Some(persona.clone());
        }
        if self.visual_suggestions {
            config.research.include_visual_suggestions = true;
        }
        if self.counter_arguments {
            config.research.include_counter_arguments = true;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.research.chunk_size = chunk_size;
        }
        if let Some(chunk_overlap) = self.chunk_overlap {
            config.research.chunk_overlap = chunk_overlap;
        }

        // 缓存配置
        if self.no_cache {
            config.cache.enabled = false;
        }

        if self.check_connection {
            config.check_connection = true;
        }
        config.verbose = config.verbose || self.verbose;

        Ok(config)
    }

    /// 将CLI参数转换为一次调研请求
    pub fn run_request(&self) -> Result<RunRequest> {
        let Some(topic) = self.topic.as_ref().filter(|t| !t.trim().is_empty()) else {
            bail!("a research topic is required");
        };
        if self.style.is_some() && self.instruction.is_some() {
            bail!("--style and --instruction cannot be combined");
        }
        let style = match &self.style {
            Some(style) => Some(style.parse::<ReportStyle>().map_err(anyhow::Error::msg)?),
            None => None,
        };

        Ok(RunRequest {
            topic: topic.clone(),
            document: self.document.clone(),
            style,
            instruction: self.instruction.clone(),
        })
    }
}
