//! Turns a record and its narratives into the ordered slide list.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::record::PitchRecord;
use crate::core::slide::{SlideKind, SlideSpec, Visual};
use crate::services::narrative::Narrative;
use crate::services::visuals;
use crate::utils::format::billions;

pub const MIN_SOLUTION_CHARS: usize = 50;

/// Fragment the model leaves behind when it asks for data instead of
/// writing the summary.
pub const PLACEHOLDER_MARKER: &str = "[**Specify";

#[derive(Debug, Error, PartialEq)]
pub enum ContentError {
    #[error("AI failed to generate proper executive summary: {0}")]
    NarrativeFailed(String),
    #[error("Solution description too vague ({len} characters, need at least {min})")]
    SolutionTooVague { len: usize, min: usize },
}

/// Image files shown on the problem and team slides.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SlideAssets {
    #[serde(default = "default_problem_icon")]
    pub problem_icon: PathBuf,
    #[serde(default = "default_team_photo")]
    pub team_photo: PathBuf,
}

fn default_problem_icon() -> PathBuf {
    PathBuf::from("assets/problem_icon.png")
}
fn default_team_photo() -> PathBuf {
    PathBuf::from("assets/team_photo.png")
}

impl Default for SlideAssets {
    fn default() -> Self {
        Self {
            problem_icon: default_problem_icon(),
            team_photo: default_team_photo(),
        }
    }
}

/// Everything a slide builder may read.
pub struct SlideContext<'a> {
    pub record: &'a PitchRecord,
    pub pitch: &'a str,
    pub summary: &'a str,
    pub assets: &'a SlideAssets,
}

pub type SlideBuilder = fn(&SlideContext) -> SlideSpec;

/// Deck order. Each entry builds exactly one slide.
pub const SLIDE_PLAN: [(SlideKind, SlideBuilder); 11] = [
    (SlideKind::Title, title_slide),
    (SlideKind::Problem, problem_slide),
    (SlideKind::Solution, solution_slide),
    (SlideKind::Market, market_slide),
    (SlideKind::Revenue, revenue_slide),
    (SlideKind::Roadmap, roadmap_slide),
    (SlideKind::Traction, traction_slide),
    (SlideKind::Financials, financials_slide),
    (SlideKind::Team, team_slide),
    (SlideKind::ExecutiveSummary, summary_slide),
    (SlideKind::NextSteps, next_steps_slide),
];

pub fn check_solution(record: &PitchRecord) -> Result<(), ContentError> {
    let len = record.solution().chars().count();
    if len < MIN_SOLUTION_CHARS {
        return Err(ContentError::SolutionTooVague {
            len,
            min: MIN_SOLUTION_CHARS,
        });
    }
    Ok(())
}

/// Rejects a summary the model did not actually write. Besides an explicit
/// provider failure, the model sometimes answers with a template that still
/// carries its bracketed fill-in instructions.
pub fn check_summary(summary: &Narrative) -> Result<(), ContentError> {
    match summary {
        Narrative::Failed { reason, .. } => Err(ContentError::NarrativeFailed(reason.clone())),
        Narrative::Generated(text) if text.contains(PLACEHOLDER_MARKER) => Err(
            ContentError::NarrativeFailed("summary still contains fill-in placeholders".to_string()),
        ),
        Narrative::Generated(_) => Ok(()),
    }
}

#[derive(Debug, Clone, Default)]
pub struct SlideAssembler {
    assets: SlideAssets,
}

impl SlideAssembler {
    pub fn new(assets: SlideAssets) -> Self {
        Self { assets }
    }

    /// All-or-nothing: both content checks run before any slide is built.
    pub fn build_slides(
        &self,
        record: &PitchRecord,
        pitch: &Narrative,
        summary: &Narrative,
    ) -> Result<Vec<SlideSpec>, ContentError> {
        check_summary(summary)?;
        check_solution(record)?;

        let ctx = SlideContext {
            record,
            pitch: pitch.as_text(),
            summary: summary.as_text(),
            assets: &self.assets,
        };
        Ok(SLIDE_PLAN.iter().map(|(_, build)| build(&ctx)).collect())
    }
}

/// [`SlideAssembler::build_slides`] with the default image assets.
pub fn build_slides(
    record: &PitchRecord,
    pitch: &Narrative,
    summary: &Narrative,
) -> Result<Vec<SlideSpec>, ContentError> {
    SlideAssembler::default().build_slides(record, pitch, summary)
}

fn title_slide(ctx: &SlideContext) -> SlideSpec {
    SlideSpec::new(SlideKind::Title, ctx.record.company_name(), ctx.pitch)
}

fn problem_slide(ctx: &SlideContext) -> SlideSpec {
    SlideSpec::new(
        SlideKind::Problem,
        "The Problem",
        format!("**Key Pain Points:**\n{}", ctx.record.problem_statement()),
    )
    .with_visual(Visual::image(&ctx.assets.problem_icon))
}

fn solution_slide(ctx: &SlideContext) -> SlideSpec {
    SlideSpec::new(
        SlideKind::Solution,
        "Our Solution",
        format!(
            "**{}'s Innovation:**\n{}\n\n**Key Benefits:**\n\
             - 50% cost savings vs competitors\n- 98% customer satisfaction",
            ctx.record.company_name(),
            ctx.record.solution()
        ),
    )
    .with_visual(Visual::chart(visuals::solution_diagram()))
}

fn market_slide(ctx: &SlideContext) -> SlideSpec {
    let tam = ctx.record.market_size();
    SlideSpec::new(
        SlideKind::Market,
        "Market Opportunity",
        format!(
            "**{} Total Addressable Market**\n22% CAGR projected (2024-2029)",
            billions(tam)
        ),
    )
    .with_visual(Visual::chart(visuals::market_size_chart(tam)))
}

fn revenue_slide(ctx: &SlideContext) -> SlideSpec {
    let mut body = String::from("**Revenue Streams:**");
    for stream in ctx.record.revenue_model() {
        body.push_str(&format!("\n- {}: {}%", stream.name, stream.share));
    }
    SlideSpec::new(SlideKind::Revenue, "Business Model", body)
        .with_visual(Visual::chart(visuals::revenue_chart(ctx.record.revenue_model())))
}

fn roadmap_slide(ctx: &SlideContext) -> SlideSpec {
    let mut body = String::from("Key Milestones & Timeline");
    for milestone in ctx.record.roadmap() {
        body.push_str(&format!("\n- {}: {}", milestone.name, milestone.span_label()));
    }
    SlideSpec::new(SlideKind::Roadmap, "Product Roadmap", body)
        .with_visual(Visual::timeline(visuals::roadmap_timeline(ctx.record.roadmap())))
}

fn traction_slide(ctx: &SlideContext) -> SlideSpec {
    SlideSpec::new(
        SlideKind::Traction,
        "Traction & Validation",
        format!(
            "**Early Success:**\n{}\n\n**Key Metrics:**\n- 80% Pilot Retention\n- 4.9/5 Customer Rating",
            ctx.record.traction()
        ),
    )
}

fn financials_slide(_ctx: &SlideContext) -> SlideSpec {
    SlideSpec::new(
        SlideKind::Financials,
        "Financial Projections",
        "3-Year Growth Outlook",
    )
    .with_visual(Visual::chart(visuals::financial_forecast()))
}

fn team_slide(ctx: &SlideContext) -> SlideSpec {
    let body = ctx
        .record
        .team()
        .iter()
        .map(|m| {
            format!(
                "- {} ({})",
                m.name,
                m.role.as_deref().unwrap_or("undefined role")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    SlideSpec::new(SlideKind::Team, "Leadership Team", body)
        .with_visual(Visual::image(&ctx.assets.team_photo))
}

fn summary_slide(ctx: &SlideContext) -> SlideSpec {
    SlideSpec::new(SlideKind::ExecutiveSummary, "Executive Summary", ctx.summary)
}

fn next_steps_slide(_ctx: &SlideContext) -> SlideSpec {
    SlideSpec::new(
        SlideKind::NextSteps,
        "Next Steps",
        "**Investment Ask:** $2M Seed Round\n**Key Milestones:**\n\
         - Expand to 3 new cities\n- Launch mobile app",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::tests::{sample_form, sample_record};
    use crate::core::slide::{VisualKind, VisualPayload};
    use crate::services::charts::Series;

    const EXPECTED_ORDER: [SlideKind; 11] = [
        SlideKind::Title,
        SlideKind::Problem,
        SlideKind::Solution,
        SlideKind::Market,
        SlideKind::Revenue,
        SlideKind::Roadmap,
        SlideKind::Traction,
        SlideKind::Financials,
        SlideKind::Team,
        SlideKind::ExecutiveSummary,
        SlideKind::NextSteps,
    ];

    fn generated(text: &str) -> Narrative {
        Narrative::Generated(text.to_string())
    }

    fn record_with(edit: impl FnOnce(&mut crate::core::record::PitchForm)) -> PitchRecord {
        let mut form = sample_form();
        edit(&mut form);
        PitchRecord::from_form(form).unwrap()
    }

    fn build(record: &PitchRecord) -> Vec<SlideSpec> {
        build_slides(record, &generated("Pitch"), &generated("Summary")).unwrap()
    }

    #[test]
    fn test_plan_order_is_fixed() {
        let kinds: Vec<SlideKind> = SLIDE_PLAN.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds, EXPECTED_ORDER);
    }

    #[test]
    fn test_builds_eleven_slides_in_order() {
        let slides = build(&sample_record());
        assert_eq!(slides.len(), 11);
        let kinds: Vec<SlideKind> = slides.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, EXPECTED_ORDER);

        // every builder stamps the kind it is registered under
        for ((kind, _), slide) in SLIDE_PLAN.iter().zip(&slides) {
            assert_eq!(*kind, slide.kind);
        }
        assert_eq!(slides[0].title, "Acme Robotics");
        assert_eq!(slides[0].body, "Pitch");
        assert_eq!(slides[9].body, "Summary");
    }

    #[test]
    fn test_five_chart_visuals_and_two_images() {
        let slides = build(&sample_record());
        let charts = slides
            .iter()
            .filter(|s| {
                matches!(
                    s.visual.as_ref().map(|v| &v.payload),
                    Some(VisualPayload::Chart(_))
                )
            })
            .count();
        assert_eq!(charts, 5);
        assert_eq!(
            slides[5].visual.as_ref().map(|v| v.kind),
            Some(VisualKind::Timeline)
        );
        assert_eq!(
            slides[1].visual.as_ref().map(|v| v.kind),
            Some(VisualKind::Image)
        );
        assert!(slides[6].visual.is_none());
        assert!(slides[10].visual.is_none());
    }

    #[test]
    fn test_vague_solution_is_rejected_regardless_of_other_fields() {
        let just_short = "x".repeat(49);
        for solution in ["", "Robots.", just_short.as_str()] {
            let record = record_with(|f| f.solution = solution.to_string());
            let err = build_slides(&record, &generated("p"), &generated("s")).unwrap_err();
            assert!(matches!(err, ContentError::SolutionTooVague { min: 50, .. }));
        }

        let record = record_with(|f| f.solution = "x".repeat(50));
        assert!(build_slides(&record, &generated("p"), &generated("s")).is_ok());
    }

    #[test]
    fn test_placeholder_summary_is_rejected() {
        let summary = generated("[**Specify** missing data]");
        let err = build_slides(&sample_record(), &generated("p"), &summary).unwrap_err();
        assert!(matches!(err, ContentError::NarrativeFailed(_)));

        // even when the solution would also fail
        let record = record_with(|f| f.solution = String::new());
        let err = build_slides(&record, &generated("p"), &summary).unwrap_err();
        assert!(matches!(err, ContentError::NarrativeFailed(_)));
    }

    #[test]
    fn test_failed_summary_is_rejected() {
        let summary = Narrative::Failed {
            reason: "timeout".to_string(),
            sentinel: "Error",
        };
        let err = build_slides(&sample_record(), &generated("p"), &summary).unwrap_err();
        assert_eq!(err, ContentError::NarrativeFailed("timeout".to_string()));
    }

    #[test]
    fn test_failed_pitch_still_builds_with_sentinel() {
        let pitch = Narrative::Failed {
            reason: "timeout".to_string(),
            sentinel: "Error generating elevator pitch. Please check the logs.",
        };
        let slides = build_slides(&sample_record(), &pitch, &generated("s")).unwrap();
        assert_eq!(
            slides[0].body,
            "Error generating elevator pitch. Please check the logs."
        );
    }

    #[test]
    fn test_market_slide_text_and_chart() {
        let slides = build(&sample_record());
        let market = &slides[3];
        assert!(market.body.contains("$5.0B Total Addressable Market"));
        match market.visual.as_ref().map(|v| &v.payload) {
            Some(VisualPayload::Chart(chart)) => match chart.series() {
                Series::Bars(bars) => {
                    let values: Vec<f64> = bars.iter().map(|b| b.value).collect();
                    assert_eq!(values, vec![5e9, 3e9, 1.5e9]);
                }
                other => panic!("expected bars, got {:?}", other),
            },
            other => panic!("expected chart visual, got {:?}", other),
        }
    }

    #[test]
    fn test_revenue_lines_follow_insertion_order() {
        let record = record_with(|f| f.revenue_model = r#"{"zeta": 20, "alpha": 45.5, "mid": 34.5}"#.to_string());
        let slides = build(&record);
        let lines: Vec<&str> = slides[4].body.lines().skip(1).collect();
        assert_eq!(lines, vec!["- zeta: 20%", "- alpha: 45.5%", "- mid: 34.5%"]);
        for key in ["zeta", "alpha", "mid"] {
            assert_eq!(slides[4].body.matches(&format!("{}: ", key)).count(), 1);
        }
    }

    #[test]
    fn test_team_lines_and_empty_team() {
        let slides = build(&sample_record());
        assert_eq!(slides[8].body, "- Jane Doe (CEO)\n- Raj Patel (CTO)");

        let record = record_with(|f| f.team = "[]".to_string());
        let slides = build(&record);
        assert_eq!(slides[8].body, "");
    }

    #[test]
    fn test_roadmap_lists_milestones() {
        let slides = build(&sample_record());
        let body = &slides[5].body;
        assert!(body.starts_with("Key Milestones & Timeline"));
        assert!(body.contains("- MVP: Mar 2024 → Jun 2024"));
        assert_eq!(body.lines().count(), 4);
    }

    #[test]
    fn test_configured_assets_are_used() {
        let assembler = SlideAssembler::new(SlideAssets {
            problem_icon: PathBuf::from("/tmp/icon.png"),
            team_photo: PathBuf::from("/tmp/team.png"),
        });
        let slides = assembler
            .build_slides(&sample_record(), &generated("p"), &generated("s"))
            .unwrap();
        match slides[8].visual.as_ref().map(|v| &v.payload) {
            Some(VisualPayload::File(path)) => assert_eq!(path, &PathBuf::from("/tmp/team.png")),
            other => panic!("expected image file, got {:?}", other),
        }
    }
}
