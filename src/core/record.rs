use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("market size must be a non-negative number, got {0}")]
    InvalidMarketSize(f64),
    #[error("{field} is not valid JSON: {source}")]
    MalformedJson {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("revenue stream '{0}' must have a numeric share")]
    NonNumericShare(String),
    #[error("milestone '{name}': {reason}")]
    InvalidMilestone { name: String, reason: String },
    #[error("team member #{0} has no name")]
    UnnamedMember(usize),
}

/// Raw pitch facts as submitted. The three structured fields arrive as
/// JSON-encoded strings and are only trusted once turned into a
/// [`PitchRecord`].
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PitchForm {
    pub company_name: String,
    pub problem_statement: String,
    pub solution: String,
    pub market_size: f64,
    #[serde(default = "default_revenue_model")]
    pub revenue_model: String,
    #[serde(default = "default_list")]
    pub roadmap: String,
    #[serde(default = "default_list")]
    pub team: String,
    #[serde(default)]
    pub traction: String,
    #[serde(default)]
    pub future_outlook: String,
}

fn default_revenue_model() -> String {
    "{}".to_string()
}
fn default_list() -> String {
    "[]".to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevenueStream {
    pub name: String,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Milestone {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Milestone {
    /// `Mar 2024 → Jun 2024`
    pub fn span_label(&self) -> String {
        format!(
            "{} → {}",
            self.start.format("%b %Y"),
            self.end.format("%b %Y")
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamMember {
    pub name: String,
    pub role: Option<String>,
}

#[derive(Deserialize)]
struct RawMilestone {
    milestone: String,
    start_date: String,
    end_date: String,
}

#[derive(Deserialize)]
struct RawMember {
    #[serde(default)]
    name: String,
    role: Option<String>,
}

/// Validated, immutable snapshot of everything a deck is built from.
#[derive(Debug, Clone)]
pub struct PitchRecord {
    company_name: String,
    problem_statement: String,
    solution: String,
    market_size: f64,
    revenue_model: Vec<RevenueStream>,
    roadmap: Vec<Milestone>,
    team: Vec<TeamMember>,
    traction: String,
    future_outlook: String,
}

impl PitchRecord {
    pub fn from_form(form: PitchForm) -> Result<Self, ValidationError> {
        if form.company_name.trim().is_empty() {
            return Err(ValidationError::MissingField("company_name"));
        }
        if form.problem_statement.trim().is_empty() {
            return Err(ValidationError::MissingField("problem_statement"));
        }
        if !form.market_size.is_finite() || form.market_size < 0.0 {
            return Err(ValidationError::InvalidMarketSize(form.market_size));
        }

        Ok(Self {
            revenue_model: parse_revenue_model(&form.revenue_model)?,
            roadmap: parse_roadmap(&form.roadmap)?,
            team: parse_team(&form.team)?,
            company_name: form.company_name,
            problem_statement: form.problem_statement,
            solution: form.solution,
            market_size: form.market_size,
            traction: form.traction,
            future_outlook: form.future_outlook,
        })
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }
    pub fn problem_statement(&self) -> &str {
        &self.problem_statement
    }
    pub fn solution(&self) -> &str {
        &self.solution
    }
    pub fn market_size(&self) -> f64 {
        self.market_size
    }
    pub fn revenue_model(&self) -> &[RevenueStream] {
        &self.revenue_model
    }
    pub fn roadmap(&self) -> &[Milestone] {
        &self.roadmap
    }
    pub fn team(&self) -> &[TeamMember] {
        &self.team
    }
    pub fn traction(&self) -> &str {
        &self.traction
    }
    pub fn future_outlook(&self) -> &str {
        &self.future_outlook
    }
}

impl TryFrom<PitchForm> for PitchRecord {
    type Error = ValidationError;

    fn try_from(form: PitchForm) -> Result<Self, Self::Error> {
        Self::from_form(form)
    }
}

fn parse_revenue_model(raw: &str) -> Result<Vec<RevenueStream>, ValidationError> {
    // serde_json is built with preserve_order, so the map keeps the submitted key order
    let map: Map<String, Value> =
        serde_json::from_str(raw).map_err(|source| ValidationError::MalformedJson {
            field: "revenue_model",
            source,
        })?;

    map.into_iter()
        .map(|(name, value)| match value.as_f64() {
            Some(share) => Ok(RevenueStream { name, share }),
            None => Err(ValidationError::NonNumericShare(name)),
        })
        .collect()
}

fn parse_roadmap(raw: &str) -> Result<Vec<Milestone>, ValidationError> {
    let milestones: Vec<RawMilestone> =
        serde_json::from_str(raw).map_err(|source| ValidationError::MalformedJson {
            field: "roadmap",
            source,
        })?;

    milestones
        .into_iter()
        .map(|m| {
            let start = parse_month(&m.start_date).ok_or_else(|| ValidationError::InvalidMilestone {
                name: m.milestone.clone(),
                reason: format!("unrecognised start date '{}'", m.start_date),
            })?;
            let end = parse_month(&m.end_date).ok_or_else(|| ValidationError::InvalidMilestone {
                name: m.milestone.clone(),
                reason: format!("unrecognised end date '{}'", m.end_date),
            })?;
            if end < start {
                return Err(ValidationError::InvalidMilestone {
                    name: m.milestone,
                    reason: "ends before it starts".to_string(),
                });
            }
            Ok(Milestone {
                name: m.milestone,
                start,
                end,
            })
        })
        .collect()
}

fn parse_team(raw: &str) -> Result<Vec<TeamMember>, ValidationError> {
    let members: Vec<RawMember> =
        serde_json::from_str(raw).map_err(|source| ValidationError::MalformedJson {
            field: "team",
            source,
        })?;

    members
        .into_iter()
        .enumerate()
        .map(|(i, m)| {
            if m.name.trim().is_empty() {
                return Err(ValidationError::UnnamedMember(i + 1));
            }
            Ok(TeamMember {
                name: m.name,
                role: m.role,
            })
        })
        .collect()
}

/// Accepts `YYYY-MM-DD` or `YYYY-MM` (first of the month).
fn parse_month(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d"))
        .ok()
}
