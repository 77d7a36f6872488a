use super::{DiagramCache, DiagramReport};
use crate::transform::dedent;
use regex::Regex;
use std::sync::LazyLock;

static RE_MERMAID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)```mermaid(?:\s+title=(?:"([^"]*)"|'([^']*)'))?\s*\r?\n(.*?)\r?\n```"#)
        .expect("valid mermaid fence regex")
});

fn escape_alt_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('[', "\\[")
        .replace(']', "\\]")
}

/// Replace ```` ```mermaid ```` fences with links to rendered PNG images.
///
/// Diagrams are numbered per chapter in document order. A diagram that cannot
/// be rendered is logged and its fence is kept verbatim.
pub fn convert_mermaid_blocks(
    input: &str,
    chapter_key: &str,
    cache: &DiagramCache,
) -> (String, DiagramReport) {
    let mut report = DiagramReport::default();
    let mut output = String::with_capacity(input.len());
    let mut last = 0;

    for caps in RE_MERMAID.captures_iter(input) {
        let whole = caps.get(0).expect("capture 0 is always present");
        output.push_str(&input[last..whole.start()]);
        last = whole.end();
        report.found += 1;
        let ordinal = report.found;

        let title = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().trim())
            .unwrap_or_default();
        let source = dedent(&caps[3]);
        let image_path = cache.image_path(chapter_key, ordinal, &source);

        match cache.ensure_rendered(&source, &image_path) {
            Ok(()) => {
                report.rendered += 1;
                let alt = if title.is_empty() {
                    format!("Mermaid 图 {ordinal}")
                } else {
                    title.to_string()
                };
                output.push_str(&format!(
                    "\n![{}]({})\n",
                    escape_alt_text(&alt),
                    cache.link_for(&image_path)
                ));
            }
            Err(e) => {
                report.failed += 1;
                log::warn!("Mermaid render failed ({chapter_key}#{ordinal}): {e}");
                output.push('\n');
                output.push_str(whole.as_str());
                output.push('\n');
            }
        }
    }

    output.push_str(&input[last..]);
    (output, report)
}
