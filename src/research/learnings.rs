//! Content policy and learning extraction

use crate::generate::{generate_structured, GenerationError, Prompt, PromptTemplate, TextGenerator};
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

/// Why a page's text was not sent for extraction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentRejection {
    #[error("content too short ({chars} < {min} chars)")]
    TooShort { chars: usize, min: usize },

    #[error("content too large ({chars} > {max} chars)")]
    TooLarge { chars: usize, max: usize },
}

/// Accepts text whose length in characters lies within `min..=max`
pub fn check_content(text: &str, min: usize, max: usize) -> Result<(), ContentRejection> {
    let chars = text.chars().count();
    if chars < min {
        Err(ContentRejection::TooShort { chars, min })
    } else if chars > max {
        Err(ContentRejection::TooLarge { chars, max })
    } else {
        Ok(())
    }
}

/// Learnings and follow-up questions taken from one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Extraction {
    pub learnings: Vec<String>,
    #[serde(rename = "followUpQuestions", alias = "follow_up_questions", default)]
    pub follow_up_questions: Vec<String>,
}

pub fn extraction_prompt(
    topic: &str,
    query: &str,
    content: &str,
    guidance: Option<&str>,
    max_learnings: usize,
) -> Prompt {
    Prompt::new(PromptTemplate::LearningExtraction)
        .with("topic", topic)
        .with("query", query)
        .with("content", content)
        .with("guidance", guidance.unwrap_or("(none)"))
        .with("max_learnings", max_learnings.to_string())
}

/// Extracts at most `max_learnings` learnings from page text
///
/// Blank entries are dropped. Generator errors, including an answer with
/// no `learnings` array, are returned so the caller can skip just this page.
pub async fn extract_learnings(
    generator: &dyn TextGenerator,
    topic: &str,
    query: &str,
    content: &str,
    guidance: Option<&str>,
    max_learnings: usize,
) -> Result<Extraction, GenerationError> {
    let prompt = extraction_prompt(topic, query, content, guidance, max_learnings);
    let raw: Extraction = generate_structured(generator, &prompt).await?;

    Ok(Extraction {
        learnings: clean(raw.learnings).into_iter().take(max_learnings).collect(),
        follow_up_questions: clean(raw.follow_up_questions),
    })
}

fn clean(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Removes exact duplicates, keeping first occurrences in order
///
/// Two learnings that say the same thing in different words both survive.
pub fn dedup_learnings(learnings: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    learnings
        .into_iter()
        .filter(|learning| seen.insert(learning.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed(serde_json::Value);

    #[async_trait]
    impl TextGenerator for Fixed {
        async fn generate(&self, _prompt: &Prompt) -> Result<serde_json::Value, GenerationError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_content_window() {
        assert_eq!(
            check_content("short", 100, 400_000),
            Err(ContentRejection::TooShort { chars: 5, min: 100 })
        );
        assert!(check_content(&"a".repeat(100), 100, 400_000).is_ok());
        assert_eq!(
            check_content(&"a".repeat(11), 1, 10),
            Err(ContentRejection::TooLarge { chars: 11, max: 10 })
        );
    }

    #[test]
    fn test_content_counts_chars_not_bytes() {
        assert!(check_content(&"é".repeat(10), 10, 10).is_ok());
    }

    #[test]
    fn test_dedup_exact_only() {
        let learnings = vec![
            "Core Web Vitals affect ranking".to_string(),
            "core web vitals affect ranking".to_string(),
            "Core Web Vitals affect ranking".to_string(),
        ];
        assert_eq!(
            dedup_learnings(learnings),
            vec![
                "Core Web Vitals affect ranking".to_string(),
                "core web vitals affect ranking".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_extraction_caps_and_cleans() {
        let generator = Fixed(serde_json::json!({
            "learnings": ["one", " ", "two", "three", "four"],
            "followUpQuestions": ["why?", ""]
        }));
        let extraction = extract_learnings(&generator, "t", "q", "text", None, 3)
            .await
            .unwrap();
        assert_eq!(extraction.learnings, vec!["one", "two", "three"]);
        assert_eq!(extraction.follow_up_questions, vec!["why?"]);
    }

    #[tokio::test]
    async fn test_missing_follow_ups_default_to_empty() {
        let generator = Fixed(serde_json::json!({"learnings": ["one"]}));
        let extraction = extract_learnings(&generator, "t", "q", "text", None, 3)
            .await
            .unwrap();
        assert!(extraction.follow_up_questions.is_empty());
    }

    #[tokio::test]
    async fn test_off_shape_answer_is_schema_error() {
        let generator = Fixed(serde_json::json!({"answer": "Local SEO matters"}));
        let result = extract_learnings(&generator, "t", "q", "text", None, 3).await;
        assert!(matches!(result, Err(GenerationError::Schema(_))));
    }
}
