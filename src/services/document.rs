//! Presentation document: themed slides built from [`SlideSpec`]s and
//! persisted as a `.pptx` package.

use anyhow::{anyhow, bail, Context, Result};
use image::{ImageFormat, ImageReader};
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::core::slide::{SlideKind, SlideSpec, Visual, VisualKind, VisualPayload};
use crate::services::charts::ChartLayout;
use crate::services::pptx;

pub const MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

const EMU_PER_INCH: f64 = 914_400.0;

pub fn inches(value: f64) -> i64 {
    (value * EMU_PER_INCH).round() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Palette and fonts shared by every slide of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub background: Option<Rgb>,
    pub accent: Rgb,
    pub body_text: Rgb,
    pub muted: Rgb,
    pub font: String,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            background: Some(Rgb(245, 245, 245)),
            ..Self::plain()
        }
    }

    pub fn plain() -> Self {
        Self {
            background: None,
            accent: Rgb(0, 70, 122),
            body_text: Rgb(50, 50, 50),
            muted: Rgb(100, 100, 100),
            font: "Calibri".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Frame {
    pub fn inches(x: f64, y: f64, cx: f64, cy: f64) -> Self {
        Self {
            x: inches(x),
            y: inches(y),
            cx: inches(cx),
            cy: inches(cy),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Paragraph {
    pub runs: Vec<Run>,
    pub align: Align,
    pub size_pt: u32,
    pub color: Rgb,
    pub space_after_pt: Option<u32>,
}

#[derive(Debug, Clone)]
pub(crate) struct TextBox {
    pub frame: Frame,
    pub wrap: bool,
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MediaFormat {
    Png,
    Jpeg,
}

impl MediaFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            MediaFormat::Png => "png",
            MediaFormat::Jpeg => "jpeg",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Picture {
    pub frame: Frame,
    pub description: String,
    pub data: Vec<u8>,
    pub format: MediaFormat,
}

#[derive(Debug, Clone)]
pub(crate) enum Shape {
    Text(TextBox),
    Picture(Picture),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Slide {
    pub shapes: Vec<Shape>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Empty,
    Populated,
}

/// What [`inspect`] reads back from a saved deck.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckSummary {
    pub slide_count: usize,
    /// First text run of the first slide.
    pub title: Option<String>,
}

/// An in-memory deck. Slides are only ever appended; [`Document::save`]
/// consumes the document.
#[derive(Debug)]
pub struct Document {
    pub(crate) theme: Theme,
    pub(crate) slides: Vec<Slide>,
    pub(crate) width: i64,
    pub(crate) height: i64,
    scratch_dir: Option<PathBuf>,
}

impl Document {
    /// 16:9 document. A themed document paints the light-gray background on
    /// the master and on every slide.
    pub fn new(themed: bool) -> Self {
        Self {
            theme: if themed { Theme::light() } else { Theme::plain() },
            slides: Vec::new(),
            width: inches(16.0),
            height: inches(9.0),
            scratch_dir: None,
        }
    }

    /// Directory for the temporary chart images (defaults to the system temp dir).
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn state(&self) -> DocumentState {
        if self.slides.is_empty() {
            DocumentState::Empty
        } else {
            DocumentState::Populated
        }
    }

    pub fn add_title_slide(&mut self, name: &str, subtitle: &str) {
        let theme = &self.theme;
        let title = TextBox {
            frame: Frame::inches(1.0, 2.5, 14.0, 1.5),
            wrap: true,
            paragraphs: vec![Paragraph {
                runs: vec![Run {
                    text: name.to_string(),
                    bold: true,
                    italic: false,
                }],
                align: Align::Center,
                size_pt: 60,
                color: theme.accent,
                space_after_pt: None,
            }],
        };
        let subtitle = TextBox {
            frame: Frame::inches(1.0, 4.2, 14.0, 2.0),
            wrap: true,
            // an empty pitch still needs one (empty) paragraph
            paragraphs: subtitle
                .split('\n')
                .map(|line| Paragraph {
                    runs: if line.is_empty() {
                        vec![]
                    } else {
                        vec![Run {
                            text: line.to_string(),
                            bold: false,
                            italic: true,
                        }]
                    },
                    align: Align::Center,
                    size_pt: 32,
                    color: theme.muted,
                    space_after_pt: None,
                })
                .collect(),
        };

        self.slides.push(Slide {
            shapes: vec![Shape::Text(title), Shape::Text(subtitle)],
        });
    }

    pub fn add_content_slide(&mut self, spec: &SlideSpec) {
        let theme = &self.theme;
        let title = TextBox {
            frame: Frame::inches(0.5, 0.3, 15.0, 1.0),
            wrap: true,
            paragraphs: vec![Paragraph {
                runs: vec![Run {
                    text: spec.title.to_uppercase(),
                    bold: true,
                    italic: false,
                }],
                align: Align::Center,
                size_pt: 44,
                color: theme.accent,
                space_after_pt: None,
            }],
        };
        let body = TextBox {
            frame: Frame::inches(0.5, 1.5, 8.0, 5.0),
            wrap: true,
            paragraphs: spec
                .body
                .split('\n')
                .map(|line| Paragraph {
                    runs: parse_runs(line),
                    align: Align::Left,
                    size_pt: 24,
                    color: theme.body_text,
                    space_after_pt: Some(10),
                })
                .collect(),
        };

        let mut slide = Slide {
            shapes: vec![Shape::Text(title), Shape::Text(body)],
        };

        // a slide without its visual is still worth keeping
        if let Some(visual) = &spec.visual {
            match self.prepare_picture(visual) {
                Ok(picture) => slide.shapes.push(Shape::Picture(picture)),
                Err(e) => warn!("Skipping visual on slide '{}': {:#}", spec.title, e),
            }
        }

        self.slides.push(slide);
    }

    /// Lays out a whole deck: title specs become title slides, the rest content slides.
    pub fn render(&mut self, specs: &[SlideSpec]) {
        for spec in specs {
            match spec.kind {
                SlideKind::Title => self.add_title_slide(&spec.title, &spec.body),
                _ => self.add_content_slide(spec),
            }
        }
        debug!("Rendered {} slides", self.slides.len());
    }

    pub fn save(self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(&path).with_context(|| format!("Failed to create {:?}", path))?;
        if let Err(e) = pptx::write_package(&self, BufWriter::new(file)) {
            // a half-written package is not a deck
            let _ = fs::remove_file(&path);
            return Err(e.context(format!("Failed to write presentation {:?}", path)));
        }

        info!("Saved {} slides to {:?}", self.slides.len(), path);
        Ok(path)
    }

    fn prepare_picture(&self, visual: &Visual) -> Result<Picture> {
        let frame = |aspect: f64| Frame {
            x: inches(9.0),
            y: inches(1.5),
            cx: inches(6.0),
            cy: (inches(6.0) as f64 * aspect).round() as i64,
        };

        match &visual.payload {
            VisualPayload::Chart(chart) => {
                let layout = match visual.kind {
                    VisualKind::Timeline => chart.layout(),
                    _ => ChartLayout::SLIDE,
                };
                let png = chart.clone().with_layout(layout).to_png()?;
                // removed when `scratch` drops, whether or not loading succeeds
                let scratch = self.write_scratch(&png)?;
                load_picture(scratch.path(), chart.title(), frame)
            }
            VisualPayload::File(path) => {
                let description = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                load_picture(path, &description, frame)
            }
        }
    }

    fn write_scratch(&self, png: &[u8]) -> Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("pitchdeck_chart_").suffix(".png");
        let mut file = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .context("Failed to create scratch image")?;
        file.write_all(png)?;
        file.flush()?;
        Ok(file)
    }
}

fn load_picture(path: &Path, description: &str, frame: impl Fn(f64) -> Frame) -> Result<Picture> {
    let data = fs::read(path).with_context(|| format!("Failed to read image {:?}", path))?;

    let reader = ImageReader::new(Cursor::new(&data)).with_guessed_format()?;
    let format = match reader.format() {
        Some(ImageFormat::Png) => MediaFormat::Png,
        Some(ImageFormat::Jpeg) => MediaFormat::Jpeg,
        other => bail!("Unsupported image format {:?} in {:?}", other, path),
    };
    let (w, h) = reader.into_dimensions()?;
    if w == 0 {
        return Err(anyhow!("Image {:?} has zero width", path));
    }

    Ok(Picture {
        frame: frame(h as f64 / w as f64),
        description: description.to_string(),
        data,
        format,
    })
}

/// Splits `**bold**` spans into runs. Lines with unbalanced markers stay literal.
pub(crate) fn parse_runs(line: &str) -> Vec<Run> {
    let parts: Vec<&str> = line.split("**").collect();
    if parts.len() % 2 == 0 {
        return vec![Run {
            text: line.to_string(),
            bold: false,
            italic: false,
        }];
    }
    parts
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.is_empty())
        .map(|(i, text)| Run {
            text: text.to_string(),
            bold: i % 2 == 1,
            italic: false,
        })
        .collect()
}

/// Reopens a saved deck and reports its slide count and title text.
pub fn inspect(path: impl AsRef<Path>) -> Result<DeckSummary> {
    pptx::read_summary(path.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::visuals;

    fn spec(title: &str, body: &str) -> SlideSpec {
        SlideSpec::new(SlideKind::Problem, title, body)
    }

    fn text_of(shape: &Shape) -> Vec<String> {
        match shape {
            Shape::Text(tb) => tb
                .paragraphs
                .iter()
                .map(|p| p.runs.iter().map(|r| r.text.as_str()).collect::<String>())
                .collect(),
            Shape::Picture(_) => vec![],
        }
    }

    #[test]
    fn test_parse_runs() {
        let runs = parse_runs("**Investment Ask:** $2M Seed Round");
        assert_eq!(runs.len(), 2);
        assert!(runs[0].bold);
        assert_eq!(runs[0].text, "Investment Ask:");
        assert!(!runs[1].bold);

        let runs = parse_runs("[**Specify missing");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "[**Specify missing");

        assert!(parse_runs("").is_empty());
    }

    #[test]
    fn test_state_transitions() {
        let mut doc = Document::new(true);
        assert_eq!(doc.state(), DocumentState::Empty);
        doc.add_title_slide("Acme", "Robots");
        assert_eq!(doc.state(), DocumentState::Populated);
        assert_eq!(doc.slide_count(), 1);
    }

    #[test]
    fn test_empty_subtitle_keeps_one_paragraph() {
        let mut doc = Document::new(true);
        doc.add_title_slide("Acme", "");
        match &doc.slides[0].shapes[1] {
            Shape::Text(subtitle) => {
                assert_eq!(subtitle.paragraphs.len(), 1);
                assert!(subtitle.paragraphs[0].runs.is_empty());
            }
            _ => panic!("expected subtitle text box"),
        }
    }

    #[test]
    fn test_theme_selection() {
        assert_eq!(Document::new(true).theme().background, Some(Rgb(245, 245, 245)));
        assert_eq!(Document::new(false).theme().background, None);
        assert_eq!(Rgb(0, 70, 122).hex(), "00467A");
    }

    #[test]
    fn test_content_slide_layout() {
        let mut doc = Document::new(true);
        doc.add_content_slide(&spec("The Problem", "**Key Pain Points:**\nSlow picking"));
        let slide = &doc.slides[0];
        assert_eq!(slide.shapes.len(), 2);
        assert_eq!(text_of(&slide.shapes[0]), vec!["THE PROBLEM"]);
        assert_eq!(
            text_of(&slide.shapes[1]),
            vec!["Key Pain Points:", "Slow picking"]
        );
        match &slide.shapes[1] {
            Shape::Text(body) => {
                assert!(body.wrap);
                assert_eq!(body.frame, Frame::inches(0.5, 1.5, 8.0, 5.0));
                assert_eq!(body.paragraphs[0].size_pt, 24);
                assert_eq!(body.paragraphs[0].space_after_pt, Some(10));
            }
            _ => panic!("expected body text box"),
        }
    }

    #[test]
    fn test_chart_visual_is_embedded_and_scratch_removed() {
        let scratch = tempfile::tempdir().unwrap();
        let mut doc = Document::new(true).with_scratch_dir(scratch.path());
        doc.add_content_slide(
            &spec("Market", "body").with_visual(Visual::chart(visuals::market_size_chart(5e9))),
        );

        match &doc.slides[0].shapes[2] {
            Shape::Picture(pic) => {
                assert_eq!(pic.format, MediaFormat::Png);
                assert_eq!(pic.frame.x, inches(9.0));
                assert_eq!(pic.frame.cx, inches(6.0));
                // 800x600 chart keeps its 4:3 aspect
                assert_eq!(pic.frame.cy, inches(4.5));
                assert_eq!(pic.description, "Market Size");
            }
            _ => panic!("expected picture"),
        }
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_image_keeps_slide() {
        let mut doc = Document::new(true);
        doc.add_content_slide(
            &spec("Leadership Team", "- Jane (CEO)").with_visual(Visual::image("/no/such/photo.png")),
        );
        assert_eq!(doc.slide_count(), 1);
        assert_eq!(doc.slides[0].shapes.len(), 2);
    }

    #[test]
    fn test_unwritable_scratch_dir_keeps_slide() {
        let mut doc = Document::new(true).with_scratch_dir("/no/such/scratch/dir");
        doc.add_content_slide(
            &spec("Financials", "3-Year Growth Outlook")
                .with_visual(Visual::chart(visuals::financial_forecast())),
        );
        assert_eq!(doc.slides[0].shapes.len(), 2);
    }

    #[test]
    fn test_render_routes_title_spec() {
        let mut doc = Document::new(true);
        doc.render(&[
            SlideSpec::new(SlideKind::Title, "Acme", "We pick.\nFast."),
            spec("Next Steps", "Raise"),
        ]);
        assert_eq!(doc.slide_count(), 2);
        assert_eq!(text_of(&doc.slides[0].shapes[0]), vec!["Acme"]);
        assert_eq!(text_of(&doc.slides[0].shapes[1]), vec!["We pick.", "Fast."]);
        assert_eq!(text_of(&doc.slides[1].shapes[0]), vec!["NEXT STEPS"]);
    }

    #[test]
    fn test_save_and_inspect_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut doc = Document::new(true);
        doc.add_title_slide("Acme & Sons <Robotics>", "Picking, solved");
        doc.add_content_slide(
            &spec("Market", "**$5.0B Total Addressable Market**")
                .with_visual(Visual::chart(visuals::market_size_chart(5e9))),
        );
        doc.add_content_slide(&spec("Team", ""));

        let path = doc.save(dir.path().join("decks").join("deck.pptx"))?;
        assert!(path.exists());

        let summary = inspect(&path)?;
        assert_eq!(summary.slide_count, 3);
        assert_eq!(summary.title.as_deref(), Some("Acme & Sons <Robotics>"));
        Ok(())
    }

    #[test]
    fn test_save_to_unwritable_path_fails() {
        let doc = Document::new(true);
        assert!(doc.save("/proc/definitely/not/here/deck.pptx").is_err());
    }
}
