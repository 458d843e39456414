use crate::core::config::{Config, DeckConfig};
use crate::core::record::{PitchForm, PitchRecord};
use crate::services::assembler::{check_solution, SlideAssembler};
use crate::services::document::Document;
use crate::services::llm::LlmClient;
use crate::services::narrative::NarrativeGenerator;
use crate::utils::format::deck_file_name;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Runs one record through narratives, slide assembly and rendering.
pub struct DeckGenerator {
    narratives: NarrativeGenerator,
    assembler: SlideAssembler,
    themed: bool,
}

impl DeckGenerator {
    pub fn new(llm: Box<dyn LlmClient>, deck: &DeckConfig) -> Self {
        Self {
            narratives: NarrativeGenerator::new(llm),
            assembler: SlideAssembler::new(deck.assets.clone()),
            themed: deck.themed,
        }
    }

    /// Writes `pitch_deck_<company>.pptx` into `output_dir`.
    ///
    /// A vague solution is refused before the model is asked for anything.
    /// Content errors surface as [`ContentError`](crate::services::assembler::ContentError)
    /// inside the returned error.
    pub async fn generate_pitch_deck(
        &self,
        record: &PitchRecord,
        output_dir: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        check_solution(record)?;

        let pitch = self.narratives.generate_pitch(record).await;
        let summary = self.narratives.generate_summary(record).await;
        let specs = self.assembler.build_slides(record, &pitch, &summary)?;

        let mut document = Document::new(self.themed);
        document.render(&specs);

        let path = output_dir
            .as_ref()
            .join(deck_file_name(record.company_name()));
        document.save(&path)
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub generated: Vec<PathBuf>,
    /// Input file name and the reason it produced no deck.
    pub rejected: Vec<(String, String)>,
}

pub struct WorkflowManager {
    config: Config,
    generator: DeckGenerator,
}

impl WorkflowManager {
    pub fn new(config: Config, llm: Box<dyn LlmClient>) -> Self {
        let generator = DeckGenerator::new(llm, &config.deck);
        Self { config, generator }
    }

    pub async fn run(&self) -> Result<RunReport> {
        let forms = list_forms(Path::new(&self.config.input_folder))?;
        info!("Found {} pitch forms", forms.len());

        let pb = ProgressBar::new(forms.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("#>-"),
        );

        let mut report = RunReport::default();
        for path in &forms {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            match self.process_form(path).await {
                Ok(deck) => {
                    info!("{} -> {:?}", filename, deck);
                    report.generated.push(deck);
                }
                Err(e) => {
                    error!("Skipping {}: {:#}", filename, e);
                    report.rejected.push((filename, format!("{:#}", e)));
                }
            }
            pb.inc(1);
        }
        pb.finish_with_message("Decks complete");

        Ok(report)
    }

    async fn process_form(&self, path: &Path) -> Result<PathBuf> {
        let record = read_form(path)?;
        self.generator
            .generate_pitch_deck(&record, &self.config.output_folder)
            .await
    }
}

fn list_forms(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut forms = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {:?}", dir))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            forms.push(path);
        }
    }
    forms.sort();
    Ok(forms)
}

pub fn read_form(path: &Path) -> Result<PitchRecord> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let form: PitchForm = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse pitch form {:?}", path))?;
    Ok(PitchRecord::from_form(form)?)
}
