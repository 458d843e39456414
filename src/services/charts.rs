//! Chart objects and their rasterization.
//!
//! A [`Chart`] is a plain description of one figure (title, series, layout).
//! [`Chart::to_image`] paints it into an RGBA buffer, lettering included, and
//! encodes it as PNG, which is all the slide renderer needs.

use ab_glyph::{FontRef, PxScale};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::f64::consts::{FRAC_PI_2, TAU};
use std::io::Cursor;

pub const BLUE: Rgba<u8> = Rgba([0x29, 0x62, 0xFF, 0xFF]);
pub const SLATE: Rgba<u8> = Rgba([0x54, 0x6E, 0x7A, 0xFF]);
pub const GREEN: Rgba<u8> = Rgba([0x00, 0xC8, 0x53, 0xFF]);

const AXIS: Rgba<u8> = Rgba([0xB0, 0xBE, 0xC5, 0xFF]);
const TRACK: Rgba<u8> = Rgba([0xE0, 0xE0, 0xE0, 0xFF]);
const MARKER: Rgba<u8> = Rgba([0x26, 0x32, 0x38, 0xFF]);
const WHITE: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);
const CLEAR: Rgba<u8> = Rgba([0x00, 0x00, 0x00, 0x00]);

static FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margin {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartLayout {
    pub width: u32,
    pub height: u32,
    pub margin: Margin,
    pub transparent: bool,
    /// Pixel height of the title. Captions, legends and ticks use 60% of it.
    pub title_font_size: f32,
}

impl ChartLayout {
    /// Charts placed next to slide text: tight margins, no background.
    pub const SLIDE: ChartLayout = ChartLayout {
        width: 800,
        height: 600,
        margin: Margin {
            left: 20,
            right: 20,
            top: 40,
            bottom: 20,
        },
        transparent: true,
        title_font_size: 24.0,
    };

    fn label_font_size(&self) -> f32 {
        (self.title_font_size * 0.6).max(10.0)
    }
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            width: 700,
            height: 500,
            margin: Margin {
                left: 80,
                right: 80,
                top: 100,
                bottom: 80,
            },
            transparent: false,
            title_font_size: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    /// Caption shown on the bar, e.g. `$3000.0M`.
    pub text: String,
    pub color: Rgba<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    pub value: f64,
    pub color: Rgba<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub color: Rgba<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Series {
    Bars(Vec<Bar>),
    Pie(Vec<Slice>),
    Timeline(Vec<Span>),
    /// Bullet gauge: a filled bar against a `0..max` track.
    Gauge { value: f64, max: f64, color: Rgba<u8> },
    Line { points: Vec<(f64, f64)>, color: Rgba<u8> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    title: String,
    series: Series,
    layout: ChartLayout,
}

impl Chart {
    pub fn new(title: impl Into<String>, series: Series) -> Self {
        Self {
            title: title.into(),
            series,
            layout: ChartLayout::default(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn layout(&self) -> ChartLayout {
        self.layout
    }

    pub fn with_layout(mut self, layout: ChartLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Renders at the size configured in the layout.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        self.to_image(self.layout.width, self.layout.height)
    }

    pub fn to_image(&self, width: u32, height: u32) -> Result<Vec<u8>> {
        let background = if self.layout.transparent { CLEAR } else { WHITE };
        let mut canvas = Canvas::new(width.max(1), height.max(1), background, &self.layout)?;
        let area = canvas.plot_area(&self.layout.margin);
        canvas.draw_title(area, &self.title);

        match &self.series {
            Series::Bars(bars) => canvas.draw_bars(area, bars),
            Series::Pie(slices) => canvas.draw_pie(area, slices),
            Series::Timeline(spans) => canvas.draw_timeline(area, spans),
            Series::Gauge { value, max, color } => canvas.draw_gauge(area, *value, *max, *color),
            Series::Line { points, color } => canvas.draw_line_series(area, points, *color),
        }

        canvas
            .encode()
            .with_context(|| format!("Failed to encode chart '{}' as PNG", self.title))
    }
}

#[derive(Debug, Clone, Copy)]
struct Area {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl Area {
    fn width(&self) -> f64 {
        self.x1 - self.x0
    }
    fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

/// `42.0` -> `42`, `3.45` -> `3.5`
fn number_label(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{:.1}", rounded)
    }
}

struct Canvas {
    img: RgbaImage,
    font: FontRef<'static>,
    title_size: f32,
    label_size: f32,
}

impl Canvas {
    fn new(width: u32, height: u32, background: Rgba<u8>, layout: &ChartLayout) -> Result<Self> {
        let font = FontRef::try_from_slice(FONT).context("Bundled chart font is unreadable")?;
        Ok(Self {
            img: RgbaImage::from_pixel(width, height, background),
            font,
            title_size: layout.title_font_size,
            label_size: layout.label_font_size(),
        })
    }

    fn text_width(&self, size: f32, text: &str) -> f64 {
        text_size(PxScale::from(size), &self.font, text).0 as f64
    }

    /// `(x, y)` is the top-left corner of the text box.
    fn draw_text(&mut self, x: f64, y: f64, size: f32, color: Rgba<u8>, text: &str) {
        if text.is_empty() {
            return;
        }
        draw_text_mut(
            &mut self.img,
            color,
            x.round() as i32,
            y.round() as i32,
            PxScale::from(size),
            &self.font,
            text,
        );
    }

    fn draw_text_centered(&mut self, cx: f64, y: f64, size: f32, color: Rgba<u8>, text: &str) {
        let width = self.text_width(size, text);
        self.draw_text(cx - width / 2.0, y, size, color, text);
    }

    /// Whether the strip under the plot area can hold a row of labels.
    fn fits_below(&self, area: Area) -> bool {
        self.img.height() as f64 - area.y1 >= self.label_size as f64 + 3.0
    }

    /// Centered in the top margin; skipped when the margin is too thin for it.
    fn draw_title(&mut self, area: Area, title: &str) {
        let size = self.title_size;
        if area.y0 < size as f64 + 4.0 {
            return;
        }
        let cx = self.img.width() as f64 / 2.0;
        self.draw_text_centered(cx, (area.y0 - size as f64) / 2.0, size, MARKER, title);
    }

    fn plot_area(&self, margin: &Margin) -> Area {
        let (w, h) = self.img.dimensions();
        let (left, right) = if margin.left + margin.right < w {
            (margin.left, margin.right)
        } else {
            (0, 0)
        };
        let (top, bottom) = if margin.top + margin.bottom < h {
            (margin.top, margin.bottom)
        } else {
            (0, 0)
        };
        Area {
            x0: left as f64,
            y0: top as f64,
            x1: (w - right) as f64,
            y1: (h - bottom) as f64,
        }
    }

    fn fill_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgba<u8>) {
        let (w, h) = self.img.dimensions();
        let clamp = |v: f64, limit: u32| v.round().clamp(0.0, limit as f64) as u32;
        let (xa, xb) = (clamp(x0.min(x1), w), clamp(x0.max(x1), w));
        let (ya, yb) = (clamp(y0.min(y1), h), clamp(y0.max(y1), h));
        for y in ya..yb {
            for x in xa..xb {
                self.img.put_pixel(x, y, color);
            }
        }
    }

    fn fill_disc(&mut self, cx: f64, cy: f64, r: f64, color: Rgba<u8>) {
        let (w, h) = self.img.dimensions();
        let xa = (cx - r).floor().max(0.0) as u32;
        let ya = (cy - r).floor().max(0.0) as u32;
        let xb = ((cx + r).ceil().max(0.0) as u32).min(w);
        let yb = ((cy + r).ceil().max(0.0) as u32).min(h);
        for y in ya..yb {
            for x in xa..xb {
                let (dx, dy) = (x as f64 + 0.5 - cx, y as f64 + 0.5 - cy);
                if dx * dx + dy * dy <= r * r {
                    self.img.put_pixel(x, y, color);
                }
            }
        }
    }

    fn stroke(&mut self, from: (f64, f64), to: (f64, f64), thickness: f64, color: Rgba<u8>) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let steps = dx.hypot(dy).ceil().max(1.0) as u32;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            self.fill_disc(from.0 + t * dx, from.1 + t * dy, thickness / 2.0, color);
        }
    }

    /// Angles are clockwise from the positive x axis (screen coordinates).
    fn fill_wedge(&mut self, cx: f64, cy: f64, r: f64, start: f64, sweep: f64, color: Rgba<u8>) {
        let (w, h) = self.img.dimensions();
        let xa = (cx - r).floor().max(0.0) as u32;
        let ya = (cy - r).floor().max(0.0) as u32;
        let xb = ((cx + r).ceil().max(0.0) as u32).min(w);
        let yb = ((cy + r).ceil().max(0.0) as u32).min(h);
        for y in ya..yb {
            for x in xa..xb {
                let (dx, dy) = (x as f64 + 0.5 - cx, y as f64 + 0.5 - cy);
                if dx * dx + dy * dy > r * r {
                    continue;
                }
                let offset = (dy.atan2(dx) - start).rem_euclid(TAU);
                if offset <= sweep {
                    self.img.put_pixel(x, y, color);
                }
            }
        }
    }

    fn draw_axes(&mut self, area: Area) {
        self.stroke((area.x0, area.y1), (area.x1, area.y1), 2.0, AXIS);
        self.stroke((area.x0, area.y0), (area.x0, area.y1), 2.0, AXIS);
    }

    fn draw_bars(&mut self, area: Area, bars: &[Bar]) {
        self.draw_axes(area);
        let max = bars.iter().map(|b| b.value).fold(0.0, f64::max);
        if bars.is_empty() || max <= 0.0 {
            return;
        }
        let size = self.label_size;
        let labels = self.fits_below(area);
        let slot = area.width() / bars.len() as f64;
        for (i, bar) in bars.iter().enumerate() {
            let left = area.x0 + slot * i as f64 + slot * 0.2;
            let center = left + slot * 0.3;
            let height = (bar.value.max(0.0) / max) * area.height() * 0.9;
            let top = area.y1 - height;
            self.fill_rect(left, top, left + slot * 0.6, area.y1, bar.color);
            self.draw_text_centered(center, top - size as f64 - 4.0, size, MARKER, &bar.text);
            if labels {
                self.draw_text_centered(center, area.y1 + 3.0, size, MARKER, &bar.label);
            }
        }
    }

    fn draw_pie(&mut self, area: Area, slices: &[Slice]) {
        let total: f64 = slices.iter().map(|s| s.value.max(0.0)).sum();
        if total <= 0.0 {
            return;
        }
        let cx = area.x0 + area.width() / 2.0;
        let cy = area.y0 + area.height() / 2.0;
        let r = area.width().min(area.height()) / 2.0 * 0.9;

        let size = self.label_size;

        // first slice starts at twelve o'clock
        let mut start = -FRAC_PI_2;
        for slice in slices.iter().filter(|s| s.value > 0.0) {
            let sweep = slice.value / total * TAU;
            self.fill_wedge(cx, cy, r, start, sweep, slice.color);

            let mid = start + sweep / 2.0;
            let share = format!("{}%", number_label(slice.value / total * 100.0));
            self.draw_text_centered(
                cx + r * 0.6 * mid.cos(),
                cy + r * 0.6 * mid.sin() - size as f64 / 2.0,
                size,
                WHITE,
                &share,
            );
            start += sweep;
        }

        // legend, top-left, one row per slice
        let row = size as f64 + 6.0;
        let swatch = size as f64 * 0.8;
        for (i, slice) in slices.iter().enumerate() {
            let y = area.y0 + row * i as f64;
            let inset = size as f64 * 0.1;
            self.fill_rect(area.x0, y + inset, area.x0 + swatch, y + inset + swatch, slice.color);
            self.draw_text(area.x0 + swatch + 6.0, y, size, MARKER, &slice.label);
        }
    }

    fn draw_timeline(&mut self, area: Area, spans: &[Span]) {
        self.draw_axes(area);
        let (Some(earliest), Some(latest)) = (
            spans.iter().map(|s| s.start).min(),
            spans.iter().map(|s| s.end).max(),
        ) else {
            return;
        };
        let total_days = (latest - earliest).num_days().max(1) as f64;
        let row = area.height() / spans.len() as f64;
        let x_of = |date: NaiveDate| {
            area.x0 + (date - earliest).num_days() as f64 / total_days * area.width()
        };

        let size = self.label_size;
        for (i, span) in spans.iter().enumerate() {
            let top = area.y0 + row * i as f64 + row * 0.2;
            let left = x_of(span.start);
            let right = x_of(span.end).max(left + 2.0);
            self.fill_rect(left, top, right, top + row * 0.6, span.color);

            // name after the bar, else before it, else on it
            let width = self.text_width(size, &span.label);
            let y = top + row * 0.3 - size as f64 / 2.0;
            let (x, color) = if right + 6.0 + width <= area.x1 {
                (right + 6.0, MARKER)
            } else if left - 6.0 - width >= 0.0 {
                (left - 6.0 - width, MARKER)
            } else {
                (left + 4.0, WHITE)
            };
            self.draw_text(x, y, size, color, &span.label);
        }

        if self.fits_below(area) {
            let first = earliest.format("%b %Y").to_string();
            let last = latest.format("%b %Y").to_string();
            let last_width = self.text_width(size, &last);
            self.draw_text(area.x0, area.y1 + 3.0, size, MARKER, &first);
            self.draw_text(area.x1 - last_width, area.y1 + 3.0, size, MARKER, &last);
        }
    }

    fn draw_gauge(&mut self, area: Area, value: f64, max: f64, color: Rgba<u8>) {
        let mid = area.y0 + area.height() / 2.0;
        let track = area.height() * 0.15;
        let bar = area.height() * 0.08;
        let fraction = if max > 0.0 { (value / max).clamp(0.0, 1.0) } else { 0.0 };
        let tip = area.x0 + area.width() * fraction;

        self.fill_rect(area.x0, mid - track, area.x1, mid + track, TRACK);
        self.fill_rect(area.x0, mid - bar, tip, mid + bar, color);
        self.stroke((tip, mid - track), (tip, mid + track), 3.0, MARKER);

        let number = self.title_size * 1.6;
        let center = area.x0 + area.width() / 2.0;
        let above = mid - track - number as f64 - 8.0;
        self.draw_text_centered(center, above, number, MARKER, &number_label(value));

        let size = self.label_size;
        let max_label = number_label(max);
        let max_width = self.text_width(size, &max_label);
        self.draw_text(area.x0, mid + track + 4.0, size, MARKER, "0");
        self.draw_text(area.x1 - max_width, mid + track + 4.0, size, MARKER, &max_label);
    }

    fn draw_line_series(&mut self, area: Area, points: &[(f64, f64)], color: Rgba<u8>) {
        self.draw_axes(area);
        if points.is_empty() {
            return;
        }
        let x_min = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let x_max = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let y_max = points.iter().map(|p| p.1).fold(0.0, f64::max);
        let x_span = if x_max > x_min { x_max - x_min } else { 1.0 };
        let y_span = if y_max > 0.0 { y_max } else { 1.0 };

        let project = |(x, y): (f64, f64)| {
            (
                area.x0 + (x - x_min) / x_span * area.width(),
                area.y1 - y.max(0.0) / y_span * area.height() * 0.9,
            )
        };

        let projected: Vec<(f64, f64)> = points.iter().copied().map(project).collect();
        for pair in projected.windows(2) {
            self.stroke(pair[0], pair[1], 4.0, color);
        }
        for &(x, y) in &projected {
            self.fill_disc(x, y, 6.0, color);
        }

        let size = self.label_size;
        let ticks = self.fits_below(area);
        for (&(x_value, y_value), &(x, y)) in points.iter().zip(&projected) {
            self.draw_text_centered(x, y - size as f64 - 10.0, size, MARKER, &number_label(y_value));
            if ticks {
                self.draw_text_centered(x, area.y1 + 3.0, size, MARKER, &number_label(x_value));
            }
        }
    }

    fn encode(self) -> Result<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        self.img.write_to(&mut buf, ImageFormat::Png)?;
        Ok(buf.into_inner())
    }
}
