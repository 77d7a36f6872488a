//! Export configuration.
//!
//! Settings live in an optional `word-export.toml` at the project root. Every
//! field has a default matching the course site's layout, so a missing file
//! (or a file that only sets a couple of keys) is fine. Command-line flags and
//! their environment variables override the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file, looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "word-export.toml";

/// How the markdown to docx conversion is run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PandocConfig {
    /// Converter executable, looked up on `PATH` unless it is a path.
    pub program: String,
    /// Input format flag
    pub from: String,
    /// Output format flag
    pub to: String,
}

impl Default for PandocConfig {
    fn default() -> Self {
        Self {
            program: "pandoc".to_string(),
            from: "gfm".to_string(),
            to: "docx".to_string(),
        }
    }
}

/// Mermaid rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    /// Kroki endpoint accepting Mermaid source and returning PNG
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Image cache directory, relative to the output directory
    pub assets_dir: PathBuf,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://kroki.io/mermaid/png".to_string(),
            timeout_secs: 30,
            assets_dir: PathBuf::from("assets"),
        }
    }
}

/// Complete configuration for an export run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Course content root holding the top-level `meta.json`, relative to the
    /// project root
    pub docs_root: PathBuf,
    /// Where documents are written, relative to the project root
    pub output_dir: PathBuf,
    /// The export refuses to run unless exactly this many chapters are found
    pub expected_chapters: usize,
    /// Also write the intermediate markdown next to each document
    pub debug_markdown: bool,
    pub pandoc: PandocConfig,
    pub diagrams: DiagramConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            docs_root: PathBuf::from("content").join("docs"),
            output_dir: PathBuf::from("exports").join("word"),
            expected_chapters: 20,
            debug_markdown: false,
            pandoc: PandocConfig::default(),
            diagrams: DiagramConfig::default(),
        }
    }
}

impl Configuration {
    /// Load `path`, or `<root>/word-export.toml` when no path is given.
    ///
    /// A missing default file yields the defaults; an explicitly named file
    /// must exist.
    pub fn load(root: &Path, path: Option<&Path>) -> Result<Configuration> {
        let (path, required) = match path {
            Some(p) => (root.join(p), true),
            None => (root.join(CONFIG_FILE_NAME), false),
        };
        if !required && !path.exists() {
            log::debug!("No {} found, using defaults", path.display());
            return Ok(Configuration::default());
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to load {} contents", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Absolute content root.
    pub fn docs_root(&self, root: &Path) -> PathBuf {
        root.join(&self.docs_root)
    }

    /// Absolute output directory.
    pub fn output_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.output_dir)
    }

    /// Absolute diagram image cache directory.
    pub fn assets_dir(&self, root: &Path) -> PathBuf {
        self.output_dir(root).join(&self.diagrams.assets_dir)
    }
}
