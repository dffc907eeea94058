//! 报告章节修复：检查模型输出是否包含全部必需章节，缺失的按规定顺序补在末尾

use regex::Regex;
use std::sync::LazyLock;

use crate::types::report::REPORT_SECTIONS;

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^ {0,3}#{1,6}[ \t]+(?:\d+[.)][ \t]*)?(.+?)[ \t#]*$")
        .expect("valid heading regex")
});

/// 去掉标题中的强调标记和结尾冒号，并转为小写
fn normalize(title: &str) -> String {
    title
        .trim_matches(|c: char| c == '*' || c == '_' || c.is_whitespace())
        .trim_end_matches(':')
        .trim()
        .to_lowercase()
}

/// 报告中已出现的必需章节
pub fn present_sections(markdown: &str) -> Vec<&'static str> {
    let headings: Vec<String> = HEADING
        .captures_iter(markdown)
        .filter_map(|c| c.get(1))
        .map(|m| normalize(m.as_str()))
        .collect();

    REPORT_SECTIONS
        .iter()
        .copied()
        .filter(|section| {
            let section = section.to_lowercase();
            headings.iter().any(|h| h.starts_with(&section))
        })
        .collect()
}

/// 报告中缺失的必需章节，按规定顺序排列
pub fn missing_sections(markdown: &str) -> Vec<&'static str> {
    let present = present_sections(markdown);
    REPORT_SECTIONS
        .iter()
        .copied()
        .filter(|s| !present.contains(s))
        .collect()
}

/// 章节的默认正文，兜底报告与章节修复共用
pub fn section_body(section: &str, topic: &str, facts_markdown: &str) -> String {
    match section {
        "Executive Summary" => format!("This is an automatically generated report about {}.", topic),
        "Key Findings" => facts_markdown.to_string(),
        "Detailed Analysis" => format!(
            "A detailed analysis of {} could not be produced automatically. The findings above are grouped by category with their sources.",
            topic
        ),
        "Conclusions" => "More detailed research is needed in this area.".to_string(),
        "References" => "See sources listed with each fact.".to_string(),
        _ => String::new(),
    }
}

/// 补齐缺失章节，返回修复后的文本和是否做过修改
pub fn repair_sections(markdown: &str, topic: &str, facts_markdown: &str) -> (String, bool) {
    let missing = missing_sections(markdown);
    if missing.is_empty() {
        return (markdown.to_string(), false);
    }

    tracing::warn!("🔧 报告缺少{}个章节，自动补齐: {}", missing.len(), missing.join(", "));
    let mut repaired = markdown.trim_end().to_string();
    for section in missing {
        repaired.push_str(&format!(
            "\n\n## {}\n{}",
            section,
            section_body(section, topic, facts_markdown)
        ));
    }
    repaired.push('\n');
    (repaired, true)
}
