use std::path::PathBuf;

use crate::services::charts::Chart;

/// The eleven logical slides of a deck, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideKind {
    Title,
    Problem,
    Solution,
    Market,
    Revenue,
    Roadmap,
    Traction,
    Financials,
    Team,
    ExecutiveSummary,
    NextSteps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualKind {
    Chart,
    Image,
    Timeline,
    Graph,
}

#[derive(Debug, Clone)]
pub enum VisualPayload {
    /// Rendered to a scratch PNG when the slide is laid out.
    Chart(Chart),
    /// An image already on disk.
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Visual {
    pub kind: VisualKind,
    pub payload: VisualPayload,
}

impl Visual {
    pub fn chart(chart: Chart) -> Self {
        Self {
            kind: VisualKind::Chart,
            payload: VisualPayload::Chart(chart),
        }
    }

    pub fn timeline(chart: Chart) -> Self {
        Self {
            kind: VisualKind::Timeline,
            payload: VisualPayload::Chart(chart),
        }
    }

    pub fn image(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: VisualKind::Image,
            payload: VisualPayload::File(path.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SlideSpec {
    pub kind: SlideKind,
    pub title: String,
    /// Newline-delimited paragraphs.
    pub body: String,
    pub visual: Option<Visual>,
}

impl SlideSpec {
    pub fn new(kind: SlideKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            body: body.into(),
            visual: None,
        }
    }

    pub fn with_visual(mut self, visual: Visual) -> Self {
        self.visual = Some(visual);
        self
    }
}
