use super::dedent;
use super::tags::{attr, blocks, replace_blocks};

fn convert_accordions_block(inner: &str) -> Option<String> {
    let items: Vec<_> = blocks(inner, "Accordion")
        .into_iter()
        .filter_map(|item| attr(item.attrs, "title").map(|title| (title, item.inner)))
        .collect();
    if items.is_empty() {
        return None;
    }

    let mut lines = Vec::with_capacity(items.len() * 4);
    for (title, content) in items {
        let title = match title.trim() {
            "" => "问答",
            t => t,
        };
        lines.push(format!("### {title}"));
        lines.push(String::new());
        lines.push(dedent(content));
        lines.push(String::new());
    }
    Some(lines.join("\n"))
}

/// Flatten `<Accordions>` groups into a run of level-3 question headings,
/// each followed by its answer.
///
/// A group with no titled `<Accordion>` keeps its inner text.
pub fn convert_accordions(input: &str) -> String {
    replace_blocks(input, "Accordions", |block| {
        Some(convert_accordions_block(block.inner).unwrap_or_else(|| block.inner.to_string()))
    })
}
