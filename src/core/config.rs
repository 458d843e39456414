use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::services::assembler::SlideAssets;
use crate::services::llm::LlmConfig;

const CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_input")]
    pub input_folder: String,

    #[serde(default = "default_output")]
    pub output_folder: String,

    pub llm: LlmConfig,

    #[serde(default)]
    pub deck: DeckConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeckConfig {
    /// Paint the light-gray background on every slide.
    #[serde(default = "default_themed")]
    pub themed: bool,

    #[serde(default)]
    pub assets: SlideAssets,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            themed: default_themed(),
            assets: SlideAssets::default(),
        }
    }
}

fn default_input() -> String {
    "input".to_string()
}
fn default_output() -> String {
    "output".to_string()
}
fn default_themed() -> bool {
    true
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("{:?} not found. Please create one.", path);
        }

        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: Config = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(CONFIG_FILE)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.input_folder)?;
        fs::create_dir_all(&self.output_folder)?;
        Ok(())
    }
}
