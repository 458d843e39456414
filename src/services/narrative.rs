//! Elevator pitch and executive summary, written by the language model.

use crate::core::record::{PitchRecord, TeamMember};
use crate::services::llm::LlmClient;
use crate::utils::format::currency;
use log::{error, info};
use serde_json::{Map, Value};

pub const PITCH_FAILURE_TEXT: &str = "Error generating elevator pitch. Please check the logs.";
pub const SUMMARY_FAILURE_TEXT: &str =
    "Error generating executive summary. Please check the logs.";

const SYSTEM_PROMPT: &str = "You are an experienced startup advisor who writes investor-ready pitch material. \
    Answer with plain prose only.";

const EMPTY_TEAM: &str = "Experienced team";
const TEAM_FALLBACK: &str = "Core team in place";
const UNDEFINED_ROLE: &str = "undefined role";

/// Outcome of one narrative request.
#[derive(Debug, Clone, PartialEq)]
pub enum Narrative {
    Generated(String),
    Failed {
        reason: String,
        /// Text shown in place of the narrative.
        sentinel: &'static str,
    },
}

impl Narrative {
    pub fn as_text(&self) -> &str {
        match self {
            Narrative::Generated(text) => text,
            Narrative::Failed { sentinel, .. } => sentinel,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Narrative::Failed { .. })
    }
}

pub struct NarrativeGenerator {
    llm: Box<dyn LlmClient>,
}

impl NarrativeGenerator {
    pub fn new(llm: Box<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn generate_pitch(&self, record: &PitchRecord) -> Narrative {
        info!("Generating elevator pitch for {}", record.company_name());
        self.request(&pitch_prompt(record), PITCH_FAILURE_TEXT).await
    }

    pub async fn generate_summary(&self, record: &PitchRecord) -> Narrative {
        info!("Generating executive summary for {}", record.company_name());
        self.request(&summary_prompt(record), SUMMARY_FAILURE_TEXT)
            .await
    }

    async fn request(&self, prompt: &str, sentinel: &'static str) -> Narrative {
        match self.llm.chat(SYSTEM_PROMPT, prompt).await {
            Ok(text) => Narrative::Generated(text.trim().to_string()),
            Err(e) => {
                error!("Narrative generation failed: {:#}", e);
                Narrative::Failed {
                    reason: format!("{:#}", e),
                    sentinel,
                }
            }
        }
    }
}

pub(crate) fn pitch_prompt(record: &PitchRecord) -> String {
    format!(
        "Create a compelling elevator pitch for {}.\n\
         Problem: {}\n\
         Solution: {}\n\
         Market Size: {}\n",
        record.company_name(),
        record.problem_statement(),
        record.solution(),
        currency(record.market_size()),
    )
}

pub(crate) fn summary_prompt(record: &PitchRecord) -> String {
    let revenue: Map<String, Value> = record
        .revenue_model()
        .iter()
        .map(|s| (s.name.clone(), share_value(s.share)))
        .collect();
    let highlights = record
        .roadmap()
        .iter()
        .take(2)
        .map(|m| format!("{} ({})", m.name, m.span_label()))
        .collect::<Vec<_>>()
        .join("; ");

    format!(
        "Create a concise executive summary for {} covering:\n\
         - Problem: {}\n\
         - Solution: {}\n\
         - Market Size: {}\n\
         - Revenue Model: {}\n\
         - Key Traction: {}\n\
         - Roadmap Highlights: {}\n\
         - Team Strength: {}\n",
        record.company_name(),
        record.problem_statement(),
        record.solution(),
        currency(record.market_size()),
        Value::Object(revenue),
        record.traction(),
        highlights,
        team_description(record.team()),
    )
}

/// Whole shares serialize as integers (`60`, not `60.0`).
fn share_value(share: f64) -> Value {
    if share.fract() == 0.0 && share.abs() < 9_007_199_254_740_992.0 {
        Value::from(share as i64)
    } else {
        Value::from(share)
    }
}

/// One-line description of the team for the summary prompt.
///
/// A member without a role reads as "undefined role"; a role that is present
/// but blank cannot describe leadership, so the generic phrase is used.
pub(crate) fn team_description(team: &[TeamMember]) -> String {
    let Some(lead) = team.first() else {
        return EMPTY_TEAM.to_string();
    };
    match lead.role.as_deref() {
        None => format!("{} members with {} leadership", team.len(), UNDEFINED_ROLE),
        // a blank role names no leadership, so fall back to the generic phrase
        Some(role) if role.trim().is_empty() => TEAM_FALLBACK.to_string(),
        Some(role) => format!("{} members with {} leadership", team.len(), role),
    }
}
