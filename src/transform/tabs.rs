use super::dedent;
use super::tags::{attr, replace_blocks};
use regex::Regex;
use std::sync::LazyLock;

static RE_TABS_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Tabs\b[^>]*>").expect("valid tabs open regex"));

/// Drop `<Tabs>` wrappers and turn each `<Tab value="...">` into a level-3
/// section.
///
/// Tabs nested in a tab's content are flattened the same way. Tabs without a
/// `value` attribute are left for the residual tag pass.
pub fn convert_tabs(input: &str) -> String {
    let output = RE_TABS_OPEN.replace_all(input, "");
    let output = output.replace("</Tabs>", "");

    replace_blocks(&output, "Tab", |block| {
        let value = attr(block.attrs, "value")?;
        let value = match value.trim() {
            "" => "选项",
            v => v,
        };
        let text = convert_tabs(&dedent(block.inner));
        let text = text.trim_matches('\n');
        Some(format!("\n### {value}\n\n{text}\n"))
    })
}
