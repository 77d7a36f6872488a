//! The batch export: every chapter of the course to its own Word document.
//!
//! Chapters are processed one at a time in manifest order. The run fails on
//! the first chapter that cannot be read, converted or post-processed; the
//! `manifest.json` index is only written once every chapter succeeded.
//! Diagram rendering problems never fail the run, they are counted and
//! reported in the closing summary instead.

use crate::config::Configuration;
use crate::diagrams::{DiagramCache, DiagramReport};
use crate::sinks::Docx;
use crate::source::{collect_chapters, parse_frontmatter, sanitize_key};
use crate::transform::to_word_markdown;
use anyhow::{anyhow, Context, Result};
use indicatif::ProgressBar;
use serde::Serialize;
use std::path::{Path, PathBuf};

const STRATEGY_NOTES: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/strategy.md"
));

/// One line of `manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRecord {
    /// 1-based position in the export
    pub index: usize,
    pub chapter_prefix: String,
    pub title: String,
    /// Source page, relative to the project root
    pub source: String,
    /// Generated document, relative to the project root
    pub output: String,
}

#[derive(Debug, Default)]
pub struct ExportStats {
    pub records: Vec<ChapterRecord>,
    pub diagrams: DiagramReport,
    pub output_dir: PathBuf,
}

/// Remove characters Windows forbids in file names and collapse whitespace.
pub fn sanitize_file_name(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .collect();
    cleaned.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// `path` relative to `root` with `/` separators, or `path` itself when it is
/// not below `root`.
fn relative_to(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}

pub struct Exporter {
    root: PathBuf,
    config: Configuration,
    diagrams: DiagramCache,
    docx: Docx,
}

impl Exporter {
    /// `root` must be the canonical project root; every configured path is
    /// resolved against it.
    pub fn new(root: PathBuf, config: Configuration, diagrams: DiagramCache) -> Exporter {
        let docx = Docx::new(config.pandoc.clone(), &root);
        Exporter {
            root,
            config,
            diagrams,
            docx,
        }
    }

    pub fn run(&self, progress: &ProgressBar) -> Result<ExportStats> {
        let docs_root = self.config.docs_root(&self.root);
        let chapters = collect_chapters(&docs_root)
            .with_context(|| format!("Failed to collect chapters from {}", docs_root.display()))?;

        // nothing is written unless the course has the expected shape
        if chapters.len() != self.config.expected_chapters {
            return Err(anyhow!(
                "Expected {} theory chapters, found {}",
                self.config.expected_chapters,
                chapters.len()
            ));
        }

        let output_dir = self.config.output_dir(&self.root);
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;
        std::fs::create_dir_all(self.diagrams.assets_dir()).with_context(|| {
            format!("Failed to create {}", self.diagrams.assets_dir().display())
        })?;
        let readme = output_dir.join("README.md");
        std::fs::write(&readme, STRATEGY_NOTES)
            .with_context(|| format!("Failed to write {}", readme.display()))?;

        progress.set_length(chapters.len() as u64);
        let mut stats = ExportStats {
            output_dir: output_dir.clone(),
            ..ExportStats::default()
        };

        for (i, chapter) in chapters.iter().enumerate() {
            let raw = std::fs::read_to_string(&chapter.source_path).with_context(|| {
                format!("Failed to read chapter {}", chapter.source_path.display())
            })?;
            let (title, body) = parse_frontmatter(&raw);
            let title = if title.is_empty() {
                chapter.fallback_title()
            } else {
                title
            };
            let prefix = chapter.prefix();
            progress.set_message(format!("{prefix} {title}"));

            let conversion = to_word_markdown(body, &title, &chapter.key(), &self.diagrams);
            stats.diagrams += conversion.diagrams;

            let file_base = format!("{prefix}-{}", sanitize_file_name(&title));
            let outfile = output_dir.join(format!("{file_base}.docx"));
            self.docx
                .render(&conversion.markdown, &outfile)
                .with_context(|| format!("Failed to export chapter {prefix}"))?;

            if self.config.debug_markdown {
                let debug_path = output_dir.join(format!("{file_base}.md"));
                std::fs::write(&debug_path, &conversion.markdown)
                    .with_context(|| format!("Failed to write {}", debug_path.display()))?;
            }

            stats.records.push(ChapterRecord {
                index: i + 1,
                chapter_prefix: prefix,
                title,
                source: relative_to(&self.root, &chapter.source_path),
                output: relative_to(&self.root, &outfile),
            });
            progress.inc(1);
        }

        let manifest_path = output_dir.join("manifest.json");
        let manifest = serde_json::to_string_pretty(&stats.records)
            .with_context(|| "Failed to serialize manifest")?;
        std::fs::write(&manifest_path, format!("{manifest}\n"))
            .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

        log::info!(
            "Export complete: {} files -> {} | Mermaid: {}/{} rendered, {} failed",
            stats.records.len(),
            relative_to(&self.root, &output_dir),
            stats.diagrams.rendered,
            stats.diagrams.found,
            stats.diagrams.failed
        );
        Ok(stats)
    }

    /// Convert a single page to markdown without running pandoc.
    pub fn preview(&self, file: &Path) -> Result<String> {
        let raw = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let (title, body) = parse_frontmatter(&raw);
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let title = if title.is_empty() { stem.clone() } else { title };

        std::fs::create_dir_all(self.diagrams.assets_dir()).with_context(|| {
            format!("Failed to create {}", self.diagrams.assets_dir().display())
        })?;
        let key = sanitize_key(&format!("preview-{stem}"));
        let conversion = to_word_markdown(body, &title, &key, &self.diagrams);
        log::info!(
            "Mermaid: {}/{} rendered, {} failed",
            conversion.diagrams.rendered,
            conversion.diagrams.found,
            conversion.diagrams.failed
        );
        Ok(conversion.markdown)
    }
}
