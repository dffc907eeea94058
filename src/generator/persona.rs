//! 人设注册表与报告写作风格
//!
//! 注册表只是从人设ID到系统提示词的查找表，不保存"当前人设"这样的会话状态；
//! 每次运行使用的人设指令通过[`crate::types::ReportOptions`]显式传递。

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::types::report::BASELINE_EDITOR_INSTRUCTION;

/// 未知人设时回退使用的ID
pub const DEFAULT_PERSONA_ID: &str = "academic";

/// 调研人设
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub name: String,
    pub description: String,
    /// 作为系统消息发送给模型的指令
    pub instruction: String,
}

/// 用于展示的人设摘要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonaSummary {
    pub id: String,
    pub name: String,
    pub description: String,
}

fn builtin_personas() -> Vec<Persona> {
    let entries = [
        (
            "academic",
            "Academic Researcher",
            "Specializes in rigorous academic research with proper citations and methodology.",
            "You are an Academic Researcher specializing in thorough literature review and methodical analysis. Focus on peer-reviewed sources, proper citations, and balanced viewpoints. Maintain academic rigor and precision in your research.",
        ),
        (
            "journalist",
            "Investigative Journalist",
            "Focuses on uncovering facts, interviewing sources, and presenting balanced narratives.",
            "You are an Investigative Journalist skilled at fact-finding and source verification. Focus on uncovering the truth, presenting multiple perspectives, and explaining complex topics clearly. Prioritize factual accuracy, balance, and public interest in your research.",
        ),
        (
            "business",
            "Business Analyst",
            "Specializes in market trends, competitive analysis, and business implications.",
            "You are a Business Analyst expert in market research and competitive analysis. Focus on industry trends, market data, competitive positioning, and business implications. Provide actionable insights and data-driven recommendations in your research.",
        ),
        (
            "technical",
            "Technical Specialist",
            "Focuses on technical details, specifications, and implementation considerations.",
            "You are a Technical Specialist with deep expertise in analyzing technologies and systems. Focus on technical specifications, implementation details, and practical applications. Provide thorough technical analysis with clear explanations in your research.",
        ),
        (
            "medical",
            "Medical Researcher",
            "Specializes in medical and health-related research with proper clinical context.",
            "You are a Medical Researcher focusing on health-related topics. Emphasize evidence-based information, clinical relevance, and patient impact. Maintain scientific accuracy while making medical information accessible in your research.",
        ),
    ];

    entries
        .into_iter()
        .map(|(id, name, description, instruction)| Persona {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            instruction: instruction.to_string(),
        })
        .collect()
}

/// 人设注册表，进程内共享，只增不删
#[derive(Debug)]
pub struct PersonaRegistry {
    personas: RwLock<Vec<Persona>>,
}

impl Default for PersonaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PersonaRegistry {
    /// 包含内置人设的注册表
    pub fn new() -> Self {
        Self {
            personas: RwLock::new(builtin_personas()),
        }
    }

    /// 空注册表
    pub fn empty() -> Self {
        Self {
            personas: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Persona>> {
        self.personas.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Persona>> {
        self.personas.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, id: &str) -> Option<Persona> {
        self.read().iter().find(|p| p.id == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read().iter().any(|p| p.id == id)
    }

    /// 获取人设指令，未知ID回退到academic，注册表中没有academic时使用基础编辑指令
    pub fn get_instruction(&self, id: &str) -> String {
        let personas = self.read();
        personas
            .iter()
            .find(|p| p.id == id)
            .or_else(|| personas.iter().find(|p| p.id == DEFAULT_PERSONA_ID))
            .map(|p| p.instruction.clone())
            .unwrap_or_else(|| BASELINE_EDITOR_INSTRUCTION.to_string())
    }

    /// 注册人设，ID已存在时覆盖原有条目并保持其位置
    pub fn register(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        instruction: impl Into<String>,
    ) {
        let persona = Persona {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            instruction: instruction.into(),
        };

        let mut personas = self.write();
        match personas.iter_mut().find(|p| p.id == persona.id) {
            Some(existing) => *existing = persona,
            None => personas.push(persona),
        }
    }

    /// 根据名称创建自定义人设，返回生成的ID
    pub fn create_custom(&self, name: &str, description: &str, instruction: &str) -> String {
        let id = name.trim().to_lowercase().replace(' ', "_");
        self.register(id.clone(), name.trim(), description, instruction);
        id
    }

    /// 按注册顺序列出人设
    pub fn list(&self) -> Vec<PersonaSummary> {
        self.read()
            .iter()
            .map(|p| PersonaSummary {
                id: p.id.clone(),
                name: p.name.clone(),
                description: p.description.clone(),
            })
            .collect()
    }
}

/// 报告写作风格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStyle {
    Academic,
    Journalistic,
    Business,
    Technical,
}

impl ReportStyle {
    pub const ALL: [ReportStyle; 4] = [
        ReportStyle::Academic,
        ReportStyle::Journalistic,
        ReportStyle::Business,
        ReportStyle::Technical,
    ];

    /// 该风格使用的编辑系统提示词
    pub fn instruction(&self) -> &'static str {
        match self {
            ReportStyle::Academic => {
                "You are an academic research editor. Write in a formal scholarly register, use precise terminology, qualify claims carefully and attribute every finding to its source."
            }
            ReportStyle::Journalistic => {
                "You are a senior news editor. Write in a clear, engaging journalistic style that leads with the most important findings, explains context for a general audience and attributes claims to their sources."
            }
            ReportStyle::Business => {
                "You are a business research editor. Write concise, decision-oriented prose that highlights market implications, risks and opportunities, and ends sections with actionable takeaways."
            }
            ReportStyle::Technical => {
                "You are a technical documentation editor. Write precise, structured prose that explains mechanisms, specifications and trade-offs, using lists and tables where they aid clarity."
            }
        }
    }
}

impl Display for ReportStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStyle::Academic => write!(f, "academic"),
            ReportStyle::Journalistic => write!(f, "journalistic"),
            ReportStyle::Business => write!(f, "business"),
            ReportStyle::Technical => write!(f, "technical"),
        }
    }
}

impl std::str::FromStr for ReportStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "academic" => Ok(ReportStyle::Academic),
            "journalistic" | "journalist" => Ok(ReportStyle::Journalistic),
            "business" => Ok(ReportStyle::Business),
            "technical" => Ok(ReportStyle::Technical),
            _ => Err(format!("Unknown report style: {}", s)),
        }
    }
}
