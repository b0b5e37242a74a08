//! Prompt templates for the research pipeline
//!
//! Each template has a system instruction, a body with `{placeholder}`
//! variables and a description of the JSON object the model must return.

use std::collections::BTreeMap;
use std::fmt;

/// The prompts the research loop sends to a `TextGenerator`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptTemplate {
    /// Variables: `topic`, `breadth`, `learnings`, `guidance`
    QueryGeneration,
    /// Variables: `topic`, `query`, `content`, `max_learnings`, `guidance`
    LearningExtraction,
    /// Variables: `topic`, `learnings`, `sources`, `guidance`
    ReportSynthesis,
}

impl PromptTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            Self::QueryGeneration => "query_generation",
            Self::LearningExtraction => "learning_extraction",
            Self::ReportSynthesis => "report_synthesis",
        }
    }

    pub fn system(&self) -> &'static str {
        match self {
            Self::QueryGeneration => {
                "You are an expert SEO and market researcher. You plan web searches \
                 that uncover specific, verifiable information. Respond with JSON only."
            }
            Self::LearningExtraction => {
                "You are an analyst who extracts concise, information-dense facts from \
                 web pages. Include entities, numbers and dates when present. Respond \
                 with JSON only."
            }
            Self::ReportSynthesis => {
                "You are an expert SEO consultant writing a detailed research report \
                 in Markdown. Use only the provided learnings. Respond with JSON only."
            }
        }
    }

    pub fn body(&self) -> &'static str {
        match self {
            Self::QueryGeneration => {
                "Generate {breadth} distinct search queries to research the topic below. \
                 Each query needs a research goal explaining what it should uncover and \
                 how to continue the research once results are found.\n\n\
                 Topic: {topic}\n\n\
                 Additional guidance: {guidance}\n\n\
                 Learnings from previous research (avoid repeating them):\n{learnings}"
            }
            Self::LearningExtraction => {
                "Extract up to {max_learnings} unique learnings from the content below \
                 that help answer the research query, and suggest follow-up questions \
                 for deeper research.\n\n\
                 Research topic: {topic}\n\
                 Search query: {query}\n\n\
                 Additional guidance: {guidance}\n\n\
                 <content>\n{content}\n</content>"
            }
            Self::ReportSynthesis => {
                "Write a comprehensive report on the topic below using every learning \
                 listed. Structure it with headings and cite sources where relevant.\n\n\
                 Topic: {topic}\n\n\
                 Additional guidance: {guidance}\n\n\
                 Learnings:\n{learnings}\n\n\
                 Sources:\n{sources}"
            }
        }
    }

    /// Shape of the JSON object the model must return
    pub fn expected_shape(&self) -> &'static str {
        match self {
            Self::QueryGeneration => {
                r#"{"queries": [{"query": string, "researchGoal": string}]}"#
            }
            Self::LearningExtraction => {
                r#"{"learnings": [string], "followUpQuestions": [string]}"#
            }
            Self::ReportSynthesis => r#"{"report": string}"#,
        }
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A template together with its variable bindings
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub template: PromptTemplate,
    pub variables: BTreeMap<String, String>,
}

impl Prompt {
    pub fn new(template: PromptTemplate) -> Self {
        Self {
            template,
            variables: BTreeMap::new(),
        }
    }

    /// Binds a variable, replacing any previous value
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.variables.insert(name.to_string(), value.into());
        self
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    /// System message including the required response shape
    pub fn system_message(&self) -> String {
        format!(
            "{}\nReturn a single JSON object of the form: {}",
            self.template.system(),
            self.template.expected_shape()
        )
    }

    /// Renders the template body
    ///
    /// Placeholders are substituted in one left-to-right pass, so a value
    /// containing `{name}` is never expanded again. Unbound placeholders
    /// render as an empty string.
    pub fn render(&self) -> String {
        let body = self.template.body();
        let mut out = String::with_capacity(body.len());
        let mut rest = body;

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            match after.find('}') {
                Some(end) if is_placeholder_name(&after[..end]) => {
                    out.push_str(self.variable(&after[..end]).unwrap_or(""));
                    rest = &after[end + 1..];
                }
                _ => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_lowercase() || c == '_')
}
