use chrono::Utc;
use schemars::schema_for;
use serde_json::Value;

use crate::config::ResearchConfig;
use crate::errors::{CallFailure, ResearchError};
use crate::generator::context::GeneratorContext;
use crate::generator::research::chunker::{self, DocumentChunk};
use crate::llm::CompletionRequest;
use crate::types::fact::DEFAULT_CATEGORY;
use crate::types::{Fact, FactSet, ResearchPlan, Topic};
use crate::utils::threads::do_parallel_with_limit;

const RESEARCH_SYSTEM_PROMPT: &str =
    "You are a research assistant that provides factual information.";
const DOCUMENT_QA_SYSTEM_PROMPT: &str =
    "You are a research assistant that answers questions using only the provided document excerpts.";

/// 文档模式下事实的来源标签
pub const UPLOADED_DOCUMENT_SOURCE: &str = "Uploaded Document";

const NO_DOCUMENTS_ANSWER: &str =
    "No documents have been loaded yet. Add a document before asking questions about it.";
const UNANSWERED_ANSWER: &str =
    "I was unable to answer this question from the loaded documents at this time.";

const TOP_CHUNKS: usize = 3;

/// 一个已加载的命名文档
#[derive(Debug, Clone)]
struct ContextDocument {
    name: String,
    chunks: Vec<DocumentChunk>,
}

/// 单个检索词或文档分块产出的事实
type UnitResult = Result<Vec<Fact>, CallFailure>;

/// 事实收集器：按检索计划或上传的文档向模型索取事实
#[derive(Debug, Clone)]
pub struct FactGatherer {
    chunk_size: usize,
    chunk_overlap: usize,
    documents: Vec<ContextDocument>,
}

impl Default for FactGatherer {
    fn default() -> Self {
        Self {
            chunk_size: chunker::DEFAULT_CHUNK_SIZE,
            chunk_overlap: chunker::DEFAULT_CHUNK_OVERLAP,
            documents: Vec::new(),
        }
    }
}

impl FactGatherer {
    /// 使用指定的分块参数创建收集器，overlap不小于chunk_size时返回配置错误
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ResearchError> {
        // 提前校验，gather过程中的分块就不会再失败
        chunker::chunk("", chunk_size, chunk_overlap)?;
        Ok(Self {
            chunk_size,
            chunk_overlap,
            documents: Vec::new(),
        })
    }

    pub fn from_config(config: &ResearchConfig) -> Result<Self, ResearchError> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// 收集事实，结果永不为空
    ///
    /// 提供文档时逐块抽取事实，否则按计划中的检索词逐个查询。任一调用出现网关失败时，
    /// 整个结果替换为两条固定的兜底事实；格式错误的单元只记录日志并跳过。
    pub async fn gather(
        &self,
        context: &GeneratorContext,
        topic: &Topic,
        plan: &ResearchPlan,
        document: Option<&str>,
    ) -> FactSet {
        let max_parallels = context.config.llm.max_parallels;

        let results = match document.filter(|d| !d.trim().is_empty()) {
            Some(document) => {
                let chunks = self.chunk(document);
                tracing::info!("📄 文档模式：共{}个分块，最大并发数：{}", chunks.len(), max_parallels);
                let futures: Vec<_> = chunks
                    .iter()
                    .map(|chunk| self.facts_from_chunk(context, topic, chunk))
                    .collect();
                do_parallel_with_limit(futures, max_parallels).await
            }
            None => {
                let queries = if plan.search_queries.is_empty() {
                    ResearchPlan::default_search_queries(topic.as_str())
                } else {
                    plan.search_queries.clone()
                };
                tracing::info!("🔍 检索模式：共{}个检索词，最大并发数：{}", queries.len(), max_parallels);
                let futures: Vec<_> = queries
                    .iter()
                    .map(|query| self.facts_for_query(context, topic, query))
                    .collect();
                do_parallel_with_limit(futures, max_parallels).await
            }
        };

        match collect_results(results) {
            Some(facts) if !facts.is_empty() => {
                tracing::info!("✅ 共收集到{}条事实", facts.len());
                facts
            }
            _ => {
                tracing::warn!("⚠️ 未能收集到任何事实，使用兜底事实");
                fallback_facts(topic)
            }
        }
    }

    async fn facts_for_query(
        &self,
        context: &GeneratorContext,
        topic: &Topic,
        query: &str,
    ) -> UnitResult {
        let prompt = format!(
            "Generate 3 factual pieces of information about \"{}\" for research on the topic \"{}\".\n\n\
             Return a JSON object with a \"facts\" array. Each item must match this JSON schema:\n{}",
            query,
            topic,
            fact_schema()
        );
        let value = context.complete_json(&research_request(prompt)).await?;
        let now = Utc::now();

        Ok(parse_facts(&value)
            .into_iter()
            .map(|fact| fact.with_query(query).with_timestamp(now))
            .collect())
    }

    async fn facts_from_chunk(
        &self,
        context: &GeneratorContext,
        topic: &Topic,
        chunk: &DocumentChunk,
    ) -> UnitResult {
        let prompt = format!(
            "Extract 3-5 key facts relevant to the topic \"{}\" from the following document excerpt.\n\n\
             Document excerpt:\n{}\n\n\
             Return a JSON object with a \"facts\" array. Each item must match this JSON schema:\n{}",
            topic,
            chunk.text,
            fact_schema()
        );
        let value = context.complete_json(&research_request(prompt)).await?;

        Ok(parse_facts(&value)
            .into_iter()
            .map(|mut fact| {
                fact.source = UPLOADED_DOCUMENT_SOURCE.to_string();
                fact
            })
            .collect())
    }

    fn chunk(&self, text: &str) -> Vec<DocumentChunk> {
        chunker::chunk(text, self.chunk_size, self.chunk_overlap).unwrap_or_default()
    }

    /// 加载一个命名文档作为问答上下文，返回分块数量；同名文档会被替换
    pub fn add_context(&mut self, name: impl Into<String>, text: &str) -> usize {
        let document = ContextDocument {
            name: name.into(),
            chunks: self.chunk(text),
        };
        let count = document.chunks.len();
        tracing::info!("📎 加载文档 {}，共{}个分块", document.name, count);

        match self.documents.iter_mut().find(|d| d.name == document.name) {
            Some(existing) => *existing = document,
            None => self.documents.push(document),
        }
        count
    }

    /// 已加载的文档名称
    pub fn documents(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn clear_context(&mut self) {
        self.documents.clear();
    }

    /// 基于已加载文档中最相关的分块回答问题
    pub async fn query_documents(&self, context: &GeneratorContext, question: &str) -> String {
        let excerpts = self.relevant_chunks(question);
        if excerpts.is_empty() {
            return NO_DOCUMENTS_ANSWER.to_string();
        }

        let excerpts_text = excerpts
            .iter()
            .map(|(name, chunk)| format!("[{} #{}]\n{}", name, chunk.index + 1, chunk.text))
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = format!(
            "Answer the question using the document excerpts below. If the excerpts do not contain the answer, say so.\n\n\
             Excerpts:\n{}\n\nQuestion: {}",
            excerpts_text, question
        );
        let request = CompletionRequest::new(DOCUMENT_QA_SYSTEM_PROMPT, prompt)
            .temperature(0.3)
            .max_tokens(800);

        match context.complete(&request).await {
            Ok(answer) => answer.trim().to_string(),
            Err(e) => {
                tracing::warn!("⚠️ 文档问答失败: {}", e);
                UNANSWERED_ANSWER.to_string()
            }
        }
    }

    /// 按关键词重叠数挑选最相关的分块，全部不相关时取最前面的分块
    fn relevant_chunks(&self, question: &str) -> Vec<(&str, &DocumentChunk)> {
        let keywords = keywords(question);
        let mut scored: Vec<(usize, &str, &DocumentChunk)> = self
            .documents
            .iter()
            .flat_map(|d| d.chunks.iter().map(move |c| (d.name.as_str(), c)))
            .map(|(name, chunk)| {
                let text = chunk.text.to_lowercase();
                let score = keywords.iter().filter(|k| text.contains(k.as_str())).count();
                (score, name, chunk)
            })
            .collect();

        // 稳定排序，同分时保持文档原有顺序
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
            .into_iter()
            .take(TOP_CHUNKS)
            .map(|(_, name, chunk)| (name, chunk))
            .collect()
    }
}

fn research_request(prompt: String) -> CompletionRequest {
    CompletionRequest::new(RESEARCH_SYSTEM_PROMPT, prompt)
        .temperature(0.3)
        .max_tokens(800)
        .force_json()
}

fn fact_schema() -> String {
    serde_json::to_string_pretty(&schema_for!(crate::types::fact::FactPayload))
        .unwrap_or_default()
}

fn keywords(question: &str) -> Vec<String> {
    let mut words: Vec<String> = question
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
        .map(str::to_lowercase)
        .collect();
    words.sort();
    words.dedup();
    words
}

/// 汇总各单元结果：出现网关失败时返回None，格式错误的单元被跳过
fn collect_results(results: Vec<UnitResult>) -> Option<FactSet> {
    let mut facts = Vec::new();
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(unit_facts) => facts.extend(unit_facts),
            Err(CallFailure::Gateway(e)) => {
                tracing::warn!("⚠️ 第{}个单元调用模型失败: {}", index + 1, e);
                return None;
            }
            Err(CallFailure::Malformed { reason, .. }) => {
                tracing::warn!("⚠️ 第{}个单元返回的JSON无法解析，已跳过: {}", index + 1, reason);
            }
        }
    }
    Some(facts)
}

/// 从模型返回的JSON中提取事实
///
/// 优先读取顶层的`facts`数组；顶层本身是数组时直接使用；否则展开顶层对象中所有数组类型的值。
pub fn parse_facts(value: &Value) -> Vec<Fact> {
    let items: Vec<&Value> = match value {
        Value::Object(map) => match map.get("facts") {
            Some(Value::Array(facts)) => facts.iter().collect(),
            _ => map
                .values()
                .filter_map(Value::as_array)
                .flatten()
                .collect(),
        },
        Value::Array(items) => items.iter().collect(),
        _ => Vec::new(),
    };

    items.into_iter().filter_map(Fact::from_value).collect()
}

/// 网关不可用时使用的两条固定事实
pub fn fallback_facts(topic: &Topic) -> FactSet {
    vec![
        Fact::new(
            format!("This is a sample fact about {}", topic),
            "https://example.com/sample",
            DEFAULT_CATEGORY,
        ),
        Fact::new(
            format!("Another example fact related to {}", topic),
            "https://research.org/example",
            "Background",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::errors::GatewayError;
    use crate::llm::mock::MockGateway;
    use serde_json::json;
    use std::sync::Arc;

    fn context_with(gateway: Arc<MockGateway>) -> GeneratorContext {
        GeneratorContext::with_gateway(Config::default(), gateway)
    }

    fn topic() -> Topic {
        Topic::new("renewable energy").unwrap()
    }

    #[test]
    fn test_parse_facts_shapes() {
        let wrapped = json!({"facts": [{"fact": "A", "source": "s", "category": "c"}]});
        assert_eq!(parse_facts(&wrapped).len(), 1);

        let bare = json!([{"fact": "A"}, {"fact": "B"}]);
        let facts = parse_facts(&bare);
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].source, "Unknown");
        assert_eq!(facts[0].category, "General");

        let scattered = json!({"solar": [{"fact": "A"}], "wind": [{"fact": "B"}], "note": "x"});
        assert_eq!(parse_facts(&scattered).len(), 2);

        assert!(parse_facts(&json!({"facts": []})).is_empty());
        assert!(parse_facts(&json!("just text")).is_empty());
    }

    #[test]
    fn test_parse_facts_drops_items_without_text() {
        let value = json!({"facts": [{"source": "s"}, {"fact": "kept"}, 42]});
        let facts = parse_facts(&value);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].text, "kept");
    }

    #[test]
    fn test_invalid_chunk_configuration() {
        assert!(matches!(
            FactGatherer::new(100, 100),
            Err(ResearchError::Configuration(_))
        ));
        assert!(FactGatherer::new(100, 10).is_ok());
    }

    #[tokio::test]
    async fn test_web_mode_concatenates_in_query_order() {
        let gateway = Arc::new(MockGateway::responding(|request| {
            let marker = if request.user.contains("\"q1\"") {
                "one"
            } else if request.user.contains("\"q2\"") {
                "two"
            } else {
                "other"
            };
            Ok(json!({"facts": [{"fact": marker, "source": "https://a.org", "category": "X"}]})
                .to_string())
        }));
        let context = context_with(gateway.clone());
        let mut plan = ResearchPlan::fallback(&topic());
        plan.search_queries = vec!["q1".to_string(), "q2".to_string()];

        let facts = FactGatherer::default()
            .gather(&context, &topic(), &plan, None)
            .await;

        assert_eq!(gateway.call_count(), 2);
        let texts: Vec<&str> = facts.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two"]);
        assert_eq!(facts[0].query.as_deref(), Some("q1"));
        assert!(facts[0].timestamp.is_some());

        let request = &gateway.requests()[0];
        assert_eq!(request.system, RESEARCH_SYSTEM_PROMPT);
        assert_eq!(request.temperature, 0.3);
        assert_eq!(request.max_tokens, 800);
        assert!(request.force_json);
    }

    #[tokio::test]
    async fn test_empty_plan_uses_default_queries() {
        let gateway = Arc::new(MockGateway::always(r#"[{"fact": "f"}]"#));
        let context = context_with(gateway.clone());
        let mut plan = ResearchPlan::fallback(&topic());
        plan.search_queries.clear();

        let facts = FactGatherer::default()
            .gather(&context, &topic(), &plan, None)
            .await;

        assert_eq!(facts.len(), 3);
        assert_eq!(gateway.call_count(), 3);
        assert!(gateway.requests()[1].user.contains("renewable energy recent studies"));
    }

    #[tokio::test]
    async fn test_gateway_failure_yields_fallback_facts() {
        let context = context_with(Arc::new(MockGateway::failing()));
        let plan = ResearchPlan::fallback(&topic());

        let facts = FactGatherer::default()
            .gather(&context, &topic(), &plan, None)
            .await;

        assert_eq!(facts, fallback_facts(&topic()));
        assert_eq!(facts[0].text, "This is a sample fact about renewable energy");
        assert_eq!(facts[1].category, "Background");
    }

    #[tokio::test]
    async fn test_partial_gateway_failure_replaces_whole_result() {
        let gateway = Arc::new(MockGateway::scripted(vec![
            Ok(r#"{"facts": [{"fact": "first"}]}"#.to_string()),
            Err(GatewayError::Timeout(5)),
            Ok(r#"{"facts": [{"fact": "third"}]}"#.to_string()),
        ]));
        let context = GeneratorContext::with_gateway(
            {
                let mut config = Config::default();
                config.llm.max_parallels = 1;
                config
            },
            gateway,
        );

        let facts = FactGatherer::default()
            .gather(&context, &topic(), &ResearchPlan::fallback(&topic()), None)
            .await;
        assert_eq!(facts, fallback_facts(&topic()));
    }

    #[tokio::test]
    async fn test_malformed_units_are_skipped() {
        let gateway = Arc::new(MockGateway::scripted(vec![
            Ok("not json at all".to_string()),
            Ok(r#"{"facts": [{"fact": "survivor"}]}"#.to_string()),
            Ok("{{{".to_string()),
        ]));
        let mut config = Config::default();
        config.llm.max_parallels = 1;
        let context = GeneratorContext::with_gateway(config, gateway);

        let facts = FactGatherer::default()
            .gather(&context, &topic(), &ResearchPlan::fallback(&topic()), None)
            .await;
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].text, "survivor");
    }

    #[tokio::test]
    async fn test_all_malformed_yields_fallback() {
        let context = context_with(Arc::new(MockGateway::always("nope")));
        let facts = FactGatherer::default()
            .gather(&context, &topic(), &ResearchPlan::fallback(&topic()), None)
            .await;
        assert_eq!(facts, fallback_facts(&topic()));
    }

    #[tokio::test]
    async fn test_document_mode_forces_source() {
        let gateway = Arc::new(MockGateway::always(
            r#"{"facts": [{"fact": "from doc", "source": "https://elsewhere.com", "category": "Doc"}]}"#,
        ));
        let context = context_with(gateway.clone());
        let document = "x".repeat(2500);

        let facts = FactGatherer::default()
            .gather(
                &context,
                &topic(),
                &ResearchPlan::fallback(&topic()),
                Some(&document),
            )
            .await;

        assert_eq!(gateway.call_count(), 3);
        assert_eq!(facts.len(), 3);
        assert!(facts.iter().all(|f| f.source == UPLOADED_DOCUMENT_SOURCE));
        assert_eq!(facts[0].category, "Doc");
    }

    #[tokio::test]
    async fn test_document_mode_skips_malformed_chunk() {
        let gateway = Arc::new(MockGateway::scripted(vec![
            Ok(r#"{"facts": [{"fact": "chunk one", "source": "https://a.org"}]}"#.to_string()),
            Ok("garbage".to_string()),
            Ok(r#"[{"fact": "chunk three", "category": "Doc"}]"#.to_string()),
        ]));
        let mut config = Config::default();
        config.llm.max_parallels = 1;
        let context = GeneratorContext::with_gateway(config, gateway.clone());
        let document = "x".repeat(2500);

        let facts = FactGatherer::default()
            .gather(
                &context,
                &topic(),
                &ResearchPlan::fallback(&topic()),
                Some(&document),
            )
            .await;

        assert_eq!(gateway.call_count(), 3);
        let texts: Vec<&str> = facts.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["chunk one", "chunk three"]);
        assert!(facts.iter().all(|f| f.source == UPLOADED_DOCUMENT_SOURCE));
    }

    #[tokio::test]
    async fn test_document_context_and_questions() {
        let gateway = Arc::new(MockGateway::always("  Solar output doubled.  "));
        let context = context_with(gateway.clone());
        let mut gatherer = FactGatherer::new(40, 5).unwrap();

        assert_eq!(
            gatherer.query_documents(&context, "anything?").await,
            NO_DOCUMENTS_ANSWER
        );
        assert_eq!(gateway.call_count(), 0);

        let text = "Wind farms expanded across the north. Solar output doubled in the south region last year.";
        assert!(gatherer.add_context("energy.txt", text) > 1);
        gatherer.add_context("other.txt", "Unrelated notes about cooking pasta.");
        assert_eq!(gatherer.documents(), vec!["energy.txt", "other.txt"]);

        let answer = gatherer
            .query_documents(&context, "What happened to solar output?")
            .await;
        assert_eq!(answer, "Solar output doubled.");
        let prompt = &gateway.requests()[0].user;
        assert!(prompt.contains("Solar output"));
        assert!(prompt.contains("What happened to solar output?"));

        gatherer.clear_context();
        assert!(gatherer.documents().is_empty());
    }

    #[tokio::test]
    async fn test_document_question_gateway_failure() {
        let context = context_with(Arc::new(MockGateway::failing()));
        let mut gatherer = FactGatherer::default();
        gatherer.add_context("a.txt", "some content here");

        assert_eq!(
            gatherer.query_documents(&context, "content?").await,
            UNANSWERED_ANSWER
        );
    }

    #[test]
    fn test_add_context_replaces_same_name() {
        let mut gatherer = FactGatherer::default();
        gatherer.add_context("a.txt", "first");
        gatherer.add_context("a.txt", "second");
        assert_eq!(gatherer.documents(), vec!["a.txt"]);
    }
}
