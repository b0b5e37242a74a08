//! Search query generation

use crate::generate::{generate_structured, Prompt, PromptTemplate, TextGenerator};
use serde::{Deserialize, Serialize};

/// A generated search query and what it is meant to uncover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchQuery {
    pub query: String,
    #[serde(rename = "researchGoal", alias = "research_goal", default)]
    pub research_goal: String,
}

#[derive(Debug, Deserialize)]
struct QueryList {
    queries: Vec<ResearchQuery>,
}

/// Queries for one research iteration
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedQueries {
    pub queries: Vec<ResearchQuery>,
    /// True when the generator failed and the defaults were used
    pub fallback: bool,
}

/// Renders learnings as a bullet list for prompts
pub fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn query_prompt(topic: &str, breadth: usize, learnings: &[String], guidance: Option<&str>) -> Prompt {
    Prompt::new(PromptTemplate::QueryGeneration)
        .with("topic", topic)
        .with("breadth", breadth.to_string())
        .with("learnings", bullet_list(learnings))
        .with("guidance", guidance.unwrap_or("(none)"))
}

/// Three generic queries derived from the topic alone
pub fn fallback_queries(topic: &str) -> Vec<ResearchQuery> {
    let topic = topic.trim();
    vec![
        ResearchQuery {
            query: topic.to_string(),
            research_goal: format!("Build a general overview of {}", topic),
        },
        ResearchQuery {
            query: format!("{} best practices", topic),
            research_goal: format!("Find established best practices for {}", topic),
        },
        ResearchQuery {
            query: format!("{} latest trends and statistics", topic),
            research_goal: format!("Find recent data and developments about {}", topic),
        },
    ]
}

/// Asks the generator for up to `breadth` queries
///
/// Never fails: any generator error, or an answer without a usable query,
/// yields [`fallback_queries`].
pub async fn generate_queries(
    generator: &dyn TextGenerator,
    topic: &str,
    breadth: usize,
    learnings: &[String],
    guidance: Option<&str>,
) -> GeneratedQueries {
    let prompt = query_prompt(topic, breadth, learnings, guidance);

    match generate_structured::<QueryList>(generator, &prompt).await {
        Ok(list) => {
            let queries: Vec<ResearchQuery> = list
                .queries
                .into_iter()
                .filter(|q| !q.query.trim().is_empty())
                .take(breadth)
                .collect();
            if queries.is_empty() {
                tracing::warn!("Query generation for {:?} returned no queries, using defaults", topic);
                GeneratedQueries {
                    queries: fallback_queries(topic),
                    fallback: true,
                }
            } else {
                GeneratedQueries {
                    queries,
                    fallback: false,
                }
            }
        }
        Err(e) => {
            tracing::warn!("Query generation for {:?} failed ({}), using defaults", topic, e);
            GeneratedQueries {
                queries: fallback_queries(topic),
                fallback: true,
            }
        }
    }
}
