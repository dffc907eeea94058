use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::fact::DEFAULT_CATEGORY;
use crate::types::{Fact, FactSet};

/// 没有任何事实时占位使用的条目
pub const NO_FACTS_TEXT: &str = "No facts were collected";
pub const NO_FACTS_SOURCE: &str = "N/A";

/// 按分类分组的事实，分类顺序为首次出现的顺序
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CategorizedFacts {
    groups: Vec<(String, Vec<Fact>)>,
}

impl CategorizedFacts {
    /// 对事实分组；输入为空时只包含一个General分类下的占位事实
    pub fn from_facts(facts: &[Fact]) -> Self {
        if facts.is_empty() {
            return Self {
                groups: vec![(
                    DEFAULT_CATEGORY.to_string(),
                    vec![Fact::new(NO_FACTS_TEXT, NO_FACTS_SOURCE, DEFAULT_CATEGORY)],
                )],
            };
        }

        let mut groups: Vec<(String, Vec<Fact>)> = Vec::new();
        for fact in facts {
            match groups.iter_mut().find(|(category, _)| *category == fact.category) {
                Some((_, members)) => members.push(fact.clone()),
                None => groups.push((fact.category.clone(), vec![fact.clone()])),
            }
        }
        Self { groups }
    }

    pub fn categories(&self) -> Vec<&str> {
        self.groups.iter().map(|(c, _)| c.as_str()).collect()
    }

    pub fn get(&self, category: &str) -> Option<&[Fact]> {
        self.groups
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, facts)| facts.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Fact])> {
        self.groups
            .iter()
            .map(|(c, facts)| (c.as_str(), facts.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn fact_count(&self) -> usize {
        self.groups.iter().map(|(_, facts)| facts.len()).sum()
    }

    /// 按分类顺序展开回事实列表
    pub fn flatten(&self) -> FactSet {
        self.groups
            .iter()
            .flat_map(|(_, facts)| facts.iter().cloned())
            .collect()
    }

    /// 渲染为Markdown：每个分类一个`## <category>`标题，每条事实一行`- <text> (Source: <source>)`
    pub fn to_markdown(&self) -> String {
        self.groups
            .iter()
            .map(|(category, facts)| {
                let lines = facts
                    .iter()
                    .map(|f| format!("- {} (Source: {})", f.text, f.source))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("## {}\n{}", category, lines)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

// 序列化为保持分类顺序的JSON对象
impl Serialize for CategorizedFacts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (category, facts) in &self.groups {
            map.serialize_entry(category, facts)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(text: &str, category: &str) -> Fact {
        Fact::new(text, format!("https://{}.org", text), category)
    }

    #[test]
    fn test_empty_input_gives_placeholder() {
        let categorized = CategorizedFacts::from_facts(&[]);
        assert_eq!(categorized.categories(), vec!["General"]);
        let general = categorized.get("General").unwrap();
        assert_eq!(general.len(), 1);
        assert_eq!(general[0].text, "No facts were collected");
        assert_eq!(general[0].source, "N/A");
    }

    #[test]
    fn test_first_seen_category_order() {
        let facts = vec![
            fact("a", "Policy"),
            fact("b", "Technology"),
            fact("c", "Policy"),
            fact("d", "Economics"),
        ];
        let categorized = CategorizedFacts::from_facts(&facts);

        assert_eq!(
            categorized.categories(),
            vec!["Policy", "Technology", "Economics"]
        );
        let policy: Vec<&str> = categorized
            .get("Policy")
            .unwrap()
            .iter()
            .map(|f| f.text.as_str())
            .collect();
        assert_eq!(policy, vec!["a", "c"]);
        assert_eq!(categorized.fact_count(), 4);
        assert_eq!(categorized.flatten().len(), 4);
    }

    #[test]
    fn test_markdown_rendering() {
        let facts = vec![fact("a", "Policy"), fact("b", "Tech"), fact("c", "Policy")];
        let markdown = CategorizedFacts::from_facts(&facts).to_markdown();
        assert_eq!(
            markdown,
            "## Policy\n- a (Source: https://a.org)\n- c (Source: https://c.org)\n\n## Tech\n- b (Source: https://b.org)"
        );
    }

    #[test]
    fn test_serializes_as_ordered_object() {
        let facts = vec![fact("z", "Zeta"), fact("a", "Alpha")];
        let json = serde_json::to_string(&CategorizedFacts::from_facts(&facts)).unwrap();
        assert!(json.find("Zeta").unwrap() < json.find("Alpha").unwrap());
    }
}
