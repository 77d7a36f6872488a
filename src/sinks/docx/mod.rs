//! Word output: pandoc conversion followed by in-place style patching.

mod pandoc;
mod styles;

use crate::config::PandocConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct Docx {
    pandoc: PandocConfig,
    /// Directory pandoc runs from, so relative image links resolve
    workdir: PathBuf,
}

impl Docx {
    pub fn new<P: AsRef<Path>>(pandoc: PandocConfig, workdir: P) -> Docx {
        Docx {
            pandoc,
            workdir: workdir.as_ref().to_path_buf(),
        }
    }

    /// Write `markdown` to `outfile` as a finished Word document.
    pub fn render(&self, markdown: &str, outfile: &Path) -> Result<()> {
        pandoc::convert(&self.pandoc, markdown, outfile, &self.workdir)
            .with_context(|| format!("Failed to convert {}", outfile.display()))?;
        styles::restyle(outfile)
            .with_context(|| format!("Failed to post-process {}", outfile.display()))
    }
}
