use crate::core::record::{Milestone, RevenueStream};
use crate::services::charts::{Bar, Chart, Series, Slice, Span, BLUE, GREEN, SLATE};
use crate::utils::format::millions;

pub const SAM_RATIO: f64 = 0.6;
pub const SOM_RATIO: f64 = 0.3;

const REVENUE_PALETTE: [image::Rgba<u8>; 2] = [BLUE, GREEN];

/// Total, serviceable and obtainable market, all derived from the TAM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketSizes {
    pub tam: f64,
    pub sam: f64,
    pub som: f64,
}

impl MarketSizes {
    pub fn from_tam(tam: f64) -> Self {
        Self {
            tam,
            sam: tam * SAM_RATIO,
            som: tam * SOM_RATIO,
        }
    }
}

pub fn market_size_chart(tam: f64) -> Chart {
    let sizes = MarketSizes::from_tam(tam);
    let bars = [("TAM", sizes.tam, BLUE), ("SAM", sizes.sam, SLATE), ("SOM", sizes.som, GREEN)]
        .into_iter()
        .map(|(label, value, color)| Bar {
            label: label.to_string(),
            value,
            text: millions(value),
            color,
        })
        .collect();
    Chart::new("Market Size", Series::Bars(bars))
}

pub fn revenue_chart(streams: &[RevenueStream]) -> Chart {
    let slices = streams
        .iter()
        .zip(REVENUE_PALETTE.iter().cycle())
        .map(|(stream, color)| Slice {
            label: stream.name.clone(),
            value: stream.share,
            color: *color,
        })
        .collect();
    Chart::new("Revenue Distribution", Series::Pie(slices))
}

pub fn roadmap_timeline(milestones: &[Milestone]) -> Chart {
    let spans = milestones
        .iter()
        .map(|m| Span {
            label: m.name.clone(),
            start: m.start,
            end: m.end,
            color: BLUE,
        })
        .collect();
    Chart::new("Product Roadmap", Series::Timeline(spans))
}

/// Illustrative only: the deck always claims 50% cost savings.
pub fn solution_diagram() -> Chart {
    Chart::new(
        "Cost Savings %",
        Series::Gauge {
            value: 50.0,
            max: 100.0,
            color: BLUE,
        },
    )
}

/// Illustrative three-year revenue line, in millions.
pub fn financial_forecast() -> Chart {
    Chart::new(
        "Revenue Projection (Millions USD)",
        Series::Line {
            points: vec![(2024.0, 1.2), (2025.0, 3.5), (2026.0, 8.0)],
            color: BLUE,
        },
    )
}
