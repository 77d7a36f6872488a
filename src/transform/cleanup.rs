//! Line-level clean-up passes that bracket the component conversions.

use regex::Regex;
use std::sync::LazyLock;

static RE_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^import\s+.+\s+from\s+['"][^'"]+['"];?\s*$"#).expect("valid import regex")
});
static RE_RESIDUAL_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*</?[A-Z][A-Za-z0-9]*(?:\s+[^>]*)?/?>\s*$").expect("valid tag regex")
});
static RE_BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid blank run regex"));

/// Blank out ES module `import ... from '...'` lines.
pub fn remove_imports(input: &str) -> String {
    RE_IMPORT.replace_all(input, "").into_owned()
}

/// Remove lines that consist of nothing but a component tag.
///
/// Runs after every known component has been flattened, so anything left is
/// markup without a textual equivalent (cards, banners, ...).
pub fn strip_residual_tags(input: &str) -> String {
    RE_RESIDUAL_TAG.replace_all(input, "").into_owned()
}

/// Collapse runs of blank lines and end the document with a single newline.
pub fn cleanup_spacing(input: &str) -> String {
    let output = input.replace("\r\n", "\n");
    let output = RE_BLANK_RUN.replace_all(&output, "\n\n");
    format!("{}\n", output.trim())
}
