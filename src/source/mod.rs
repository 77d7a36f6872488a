//! Chapter discovery.
//!
//! The course site orders its content with `meta.json` files: the docs root
//! lists module directories, and each module lists its pages. The export walks
//! the same manifests so chapters come out in the order readers see them on
//! the site. Module landing pages (`index`) and lab notebooks (`labs`) are not
//! theory chapters and are skipped.

mod frontmatter;
pub use frontmatter::parse_frontmatter;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Manifest page names that never become chapters at the top level.
const SKIPPED_MODULES: &[&str] = &["index"];
/// Manifest page names that never become chapters inside a module.
const SKIPPED_PAGES: &[&str] = &["index", "labs"];

/// The subset of a `meta.json` manifest the export cares about.
#[derive(Debug, Default, Deserialize)]
struct Meta {
    #[serde(default)]
    pages: Vec<String>,
}

fn read_meta(path: &Path) -> Result<Meta> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to open manifest '{}' for reading", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse manifest '{}'", path.display()))
}

/// One chapter page, located by module and page name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterEntry {
    pub module_name: String,
    pub page: String,
    /// 1-based position of the module in the course
    pub module_index: usize,
    /// 1-based position of the chapter within its module
    pub chapter_index: usize,
    pub source_path: PathBuf,
}

impl ChapterEntry {
    /// Display prefix, e.g. `3.2`.
    pub fn prefix(&self) -> String {
        format!("{}.{}", self.module_index, self.chapter_index)
    }

    /// A filesystem-safe identifier, e.g. `3_2-attacks-jailbreaks`.
    pub fn key(&self) -> String {
        sanitize_key(&format!(
            "{}_{}-{}-{}",
            self.module_index, self.chapter_index, self.module_name, self.page
        ))
    }

    /// Title used when the page has none in its frontmatter.
    pub fn fallback_title(&self) -> String {
        format!("{}/{}", self.module_name, self.page)
    }
}

/// Replace everything outside `[A-Za-z0-9_-]` with `_`, collapsing runs of `_`.
pub fn sanitize_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            c
        } else {
            '_'
        };
        if c == '_' && key.ends_with('_') {
            continue;
        }
        key.push(c);
    }
    key
}

/// Collect every chapter under `docs_root` in course order.
///
/// Any missing or malformed manifest aborts the collection.
pub fn collect_chapters(docs_root: &Path) -> Result<Vec<ChapterEntry>> {
    let root_meta = read_meta(&docs_root.join("meta.json"))?;
    let modules = root_meta
        .pages
        .into_iter()
        .filter(|page| !SKIPPED_MODULES.contains(&page.as_str()));

    let mut chapters = Vec::new();
    for (module_i, module_name) in modules.enumerate() {
        let module_dir = docs_root.join(&module_name);
        let module_meta = read_meta(&module_dir.join("meta.json"))?;

        let pages = module_meta
            .pages
            .into_iter()
            .filter(|page| !SKIPPED_PAGES.contains(&page.as_str()));
        for (chapter_i, page) in pages.enumerate() {
            chapters.push(ChapterEntry {
                source_path: module_dir.join(format!("{page}.mdx")),
                module_name: module_name.clone(),
                page,
                module_index: module_i + 1,
                chapter_index: chapter_i + 1,
            });
        }
    }

    log::debug!(
        "Found {} chapters under {}",
        chapters.len(),
        docs_root.display()
    );
    Ok(chapters)
}

#[cfg(test)]
pub mod test_support {
    use std::path::Path;

    /// Lay out a course tree with `chapters_per_module[i]` pages in module `i`.
    pub fn write_course(docs_root: &Path, chapters_per_module: &[usize]) {
        let modules: Vec<String> = (1..=chapters_per_module.len())
            .map(|i| format!("module-{i}"))
            .collect();
        let mut top = vec!["index".to_string()];
        top.extend(modules.iter().cloned());
        std::fs::create_dir_all(docs_root).expect("can create docs root");
        std::fs::write(
            docs_root.join("meta.json"),
            serde_json::json!({ "title": "Course", "pages": top }).to_string(),
        )
        .expect("can write root meta");

        for (module, count) in modules.iter().zip(chapters_per_module) {
            let dir = docs_root.join(module);
            std::fs::create_dir_all(&dir).expect("can create module dir");
            let mut pages = vec!["index".to_string()];
            pages.extend((1..=*count).map(|c| format!("chapter-{c}")));
            pages.push("labs".to_string());
            std::fs::write(
                dir.join("meta.json"),
                serde_json::json!({ "pages": pages }).to_string(),
            )
            .expect("can write module meta");
            for c in 1..=*count {
                std::fs::write(
                    dir.join(format!("chapter-{c}.mdx")),
                    format!("---\ntitle: {module} chapter {c}\n---\n\nBody of chapter {c}.\n"),
                )
                .expect("can write chapter");
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::test_support::write_course;
    use super::*;

    #[test]
    fn collects_chapters_in_manifest_order() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        write_course(dir.path(), &[2, 1]);

        let chapters = collect_chapters(dir.path()).expect("can collect chapters");
        let summary: Vec<(String, String, String)> = chapters
            .iter()
            .map(|c| (c.prefix(), c.module_name.clone(), c.page.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("1.1".into(), "module-1".into(), "chapter-1".into()),
                ("1.2".into(), "module-1".into(), "chapter-2".into()),
                ("2.1".into(), "module-2".into(), "chapter-1".into()),
            ]
        );
        assert_eq!(
            chapters[2].source_path,
            dir.path().join("module-2").join("chapter-1.mdx")
        );
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        std::fs::write(dir.path().join("meta.json"), r#"{"pages":["gone"]}"#)
            .expect("can write meta");
        let err = collect_chapters(dir.path()).expect_err("module manifest is missing");
        assert!(format!("{err:#}").contains("meta.json"));
    }

    #[test]
    fn malformed_manifest_is_an_error() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        std::fs::write(dir.path().join("meta.json"), "{ pages: [").expect("can write meta");
        assert!(collect_chapters(dir.path()).is_err());
    }

    #[test]
    fn manifest_without_pages_is_empty() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        std::fs::write(dir.path().join("meta.json"), r#"{"title":"x"}"#).expect("can write meta");
        assert!(collect_chapters(dir.path()).expect("empty course").is_empty());
    }

    #[test]
    fn keys_are_filesystem_safe() {
        let entry = ChapterEntry {
            module_name: "02 attacks".to_string(),
            page: "jail.breaks!!".to_string(),
            module_index: 2,
            chapter_index: 3,
            source_path: PathBuf::from("x.mdx"),
        };
        assert_eq!(entry.key(), "2_3-02_attacks-jail_breaks_");
        assert_eq!(entry.prefix(), "2.3");
        assert_eq!(entry.fallback_title(), "02 attacks/jail.breaks!!");
    }

    #[test]
    fn sanitized_keys_collapse_underscores() {
        assert_eq!(sanitize_key("a__b  c"), "a_b_c");
        assert_eq!(sanitize_key("提示-词"), "_-_");
        assert_eq!(sanitize_key("plain-key_1"), "plain-key_1");
    }
}
