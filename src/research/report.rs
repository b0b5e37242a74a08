//! Final report synthesis and assembly

use crate::generate::{generate_structured, GenerationError, Prompt, PromptTemplate, TextGenerator};
use crate::research::queries::bullet_list;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchStatus {
    /// A report was synthesized from at least one learning
    Completed,
    /// Nothing usable was found; the report is a fixed explanation
    NoFindings,
}

impl ResearchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::NoFindings => "no_findings",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchTiming {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: f64,
}

impl ResearchTiming {
    pub fn between(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        let duration_minutes = (end_time - start_time).num_milliseconds() as f64 / 60_000.0;
        Self {
            start_time,
            end_time,
            duration_minutes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchParameters {
    pub breadth: usize,
    pub depth: usize,
    pub guidance: Option<String>,
}

/// Result of a completed research run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchReport {
    pub topic: String,
    /// Markdown report including the sources and metadata sections
    pub report: String,
    pub sources: Vec<String>,
    pub learnings: Vec<String>,
    pub timing: ResearchTiming,
    pub parameters: ResearchParameters,
    pub status: ResearchStatus,
}

#[derive(Debug, Deserialize)]
struct SynthesizedReport {
    report: String,
}

/// Fixed message returned when no learnings were collected
pub fn no_findings_message(topic: &str) -> String {
    format!(
        "No research findings were collected for \"{}\". None of the search results \
         produced usable content (pages were unreachable, too short, too large, or \
         yielded no extractable learnings), so no report was generated. Try a broader \
         topic, different guidance, or a greater breadth.",
        topic
    )
}

pub fn synthesis_prompt(
    topic: &str,
    learnings: &[String],
    sources: &[String],
    guidance: Option<&str>,
) -> Prompt {
    Prompt::new(PromptTemplate::ReportSynthesis)
        .with("topic", topic)
        .with("learnings", bullet_list(learnings))
        .with("sources", bullet_list(sources))
        .with("guidance", guidance.unwrap_or("(none)"))
}

/// Asks the generator for the narrative part of the report
pub async fn synthesize(
    generator: &dyn TextGenerator,
    topic: &str,
    learnings: &[String],
    sources: &[String],
    guidance: Option<&str>,
) -> Result<String, GenerationError> {
    let prompt = synthesis_prompt(topic, learnings, sources, guidance);
    let synthesized: SynthesizedReport = generate_structured(generator, &prompt).await?;
    let report = synthesized.report.trim();
    if report.is_empty() {
        return Err(GenerationError::Schema("report is empty".to_string()));
    }
    Ok(report.to_string())
}

/// Narrative used when synthesis fails: the learnings as a plain list
pub fn learnings_digest(topic: &str, learnings: &[String]) -> String {
    format!(
        "# Research: {}\n\n## Key Learnings\n\n{}",
        topic,
        bullet_list(learnings)
    )
}

/// Appends the sources section and metadata block to a narrative
pub fn assemble_report(
    narrative: &str,
    topic: &str,
    sources: &[String],
    learnings: usize,
    parameters: &ResearchParameters,
    timing: &ResearchTiming,
) -> String {
    let mut out = String::from(narrative.trim_end());

    out.push_str("\n\n## Sources\n\n");
    if sources.is_empty() {
        out.push_str("(none)\n");
    }
    for (i, source) in sources.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, source));
    }

    out.push_str("\n## Research Metadata\n\n");
    out.push_str(&format!("- **Query:** {}\n", topic));
    out.push_str(&format!("- **Breadth:** {}\n", parameters.breadth));
    out.push_str(&format!("- **Depth:** {}\n", parameters.depth));
    if let Some(guidance) = &parameters.guidance {
        out.push_str(&format!("- **Guidance:** {}\n", guidance));
    }
    out.push_str(&format!(
        "- **Started:** {}\n",
        timing.start_time.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!(
        "- **Finished:** {}\n",
        timing.end_time.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!(
        "- **Duration:** {:.2} minutes\n",
        timing.duration_minutes
    ));
    out.push_str(&format!("- **Learnings:** {}\n", learnings));
    out.push_str(&format!("- **Sources:** {}\n", sources.len()));

    out
}
