use serde_json::json;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use triad_rs::config::Config;
use triad_rs::generator::compose::fixer::missing_sections;
use triad_rs::generator::outlet::{DiskOutlet, Outlet, REPORT_FILE};
use triad_rs::generator::research::chunk;
use triad_rs::llm::mock::MockGateway;
use triad_rs::types::report::REPORT_SECTIONS;
use triad_rs::{
    FactGatherer, GeneratorContext, ReportCompiler, ReportOptions, ResearchError, ResearchPlan,
    ResearchWorkflow, TriageAgent, Topic,
};

/// 创建不检查连接、不使用缓存的测试配置
fn test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.output_path = temp_dir.path().join("reports");
    config.cache.enabled = false;
    config.check_connection = false;
    config
}

fn two_fact_double() -> Arc<MockGateway> {
    let facts = json!([
        {"fact": "Solar capacity grew 20% last year", "source": "https://iea.org/solar", "category": "Solar"},
        {"fact": "Wind supplies a tenth of global power", "source": "https://gwec.net/report", "category": "Wind"}
    ]);
    Arc::new(MockGateway::always(facts.to_string()))
}

#[tokio::test]
async fn test_renewable_energy_with_fixed_double() {
    let temp_dir = TempDir::new().unwrap();
    let context = GeneratorContext::with_gateway(test_config(&temp_dir), two_fact_double());
    let workflow = ResearchWorkflow::new(context).unwrap();
    let topic = Topic::new("renewable energy").unwrap();

    let outcome = workflow
        .run_with(&topic, None, &ReportOptions::default(), None)
        .await
        .unwrap();

    // 计划不是JSON对象，使用兜底计划，三个检索词各返回两条事实
    assert_eq!(outcome.plan, ResearchPlan::fallback(&topic));
    assert_eq!(outcome.facts.len(), 6);
    assert_eq!(outcome.categorized.categories(), vec!["Solar", "Wind"]);
    assert_eq!(outcome.categorized.get("Solar").unwrap().len(), 3);

    for section in REPORT_SECTIONS {
        assert!(
            outcome.report.markdown.contains(&format!("## {}", section)),
            "missing section {section}"
        );
    }

    let run_dir = DiskOutlet::new(temp_dir.path().join("reports"))
        .save(&outcome)
        .await
        .unwrap();
    let saved = fs::read_to_string(run_dir.join(REPORT_FILE)).unwrap();
    assert_eq!(saved, outcome.report.markdown);
}

#[tokio::test]
async fn test_always_failing_gateway() {
    let temp_dir = TempDir::new().unwrap();
    let context =
        GeneratorContext::with_gateway(test_config(&temp_dir), Arc::new(MockGateway::failing()));
    let topic = Topic::new("renewable energy").unwrap();

    let plan = TriageAgent.plan(&context, &topic).await;
    assert!(!plan.query.is_empty());
    assert_eq!(plan.search_queries.len(), 3);
    assert_eq!(plan.focus_areas.len(), 3);
    assert_eq!(plan.main_objectives.len(), 3);

    let facts = FactGatherer::default()
        .gather(&context, &topic, &plan, None)
        .await;
    assert_eq!(facts.len(), 2);

    let mut compiler = ReportCompiler::new();
    compiler.compile(&facts);
    let report = compiler
        .generate(&context, &topic, &ReportOptions::default())
        .await
        .unwrap();

    assert!(missing_sections(&report.markdown).is_empty());
    let findings = report.markdown.find("## Key Findings").unwrap();
    let analysis = report.markdown.find("## Detailed Analysis").unwrap();
    let key_findings = &report.markdown[findings..analysis];
    assert!(key_findings.contains("This is a sample fact about renewable energy"));
    assert!(key_findings.contains("Another example fact related to renewable energy"));
}

#[tokio::test]
async fn test_generate_before_compile_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let context = GeneratorContext::with_gateway(test_config(&temp_dir), two_fact_double());
    let topic = Topic::new("anything").unwrap();

    let result = ReportCompiler::new()
        .generate(&context, &topic, &ReportOptions::default())
        .await;
    assert!(matches!(result, Err(ResearchError::Precondition(_))));
}

#[test]
fn test_compile_empty_and_idempotent() {
    let mut compiler = ReportCompiler::new();
    let empty = compiler.compile(&[]);
    assert_eq!(empty.categories(), vec!["General"]);
    assert_eq!(
        empty.get("General").unwrap()[0].text,
        "No facts were collected"
    );
    assert_eq!(compiler.compile(&[]), empty);
}

#[test]
fn test_chunking_2500_chars() {
    let text = "abcde".repeat(500);
    let chunks = chunk(&text, 1000, 100).unwrap();
    let starts: Vec<usize> = chunks.iter().map(|c| c.start).collect();
    assert_eq!(starts, vec![0, 900, 1800]);
    assert_eq!(chunks[2].text.len(), 700);

    assert!(matches!(
        chunk(&text, 100, 150),
        Err(ResearchError::Configuration(_))
    ));
}

#[test]
fn test_blank_topic_is_rejected() {
    assert!(matches!(
        Topic::new("   "),
        Err(ResearchError::Configuration(_))
    ));
}
