use super::tags::{attr, replace_blocks};

/// One recognised line inside a `<Files>` block.
#[derive(Debug, PartialEq, Eq)]
enum TreeToken<'a> {
    OpenFolder(&'a str),
    CloseFolder,
    File(&'a str),
}

/// Split `<Name attrs>` at the start of a trimmed line into its attribute text.
fn leading_tag<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let rest = line.strip_prefix('<')?.strip_prefix(name)?;
    match rest.chars().next() {
        Some(c) if c.is_alphanumeric() || c == '_' => return None,
        None => return None,
        _ => {}
    }
    let gt = rest.find('>')?;
    Some(&rest[..gt])
}

fn tokenize(line: &str) -> Option<TreeToken<'_>> {
    let line = line.trim();
    if let Some(attrs) = leading_tag(line, "Folder") {
        let name = attr(attrs, "name")?;
        return Some(TreeToken::OpenFolder(if name.is_empty() { "folder" } else { name }));
    }
    if line.starts_with("</Folder>") {
        return Some(TreeToken::CloseFolder);
    }
    if let Some(attrs) = leading_tag(line, "File") {
        let name = attr(attrs, "name")?;
        return Some(TreeToken::File(if name.is_empty() { "file" } else { name }));
    }
    None
}

fn convert_files_block(inner: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    let mut tree: Vec<String> = Vec::new();

    for line in inner.lines() {
        match tokenize(line) {
            Some(TreeToken::OpenFolder(name)) => {
                tree.push(format!("{}{name}/", "  ".repeat(stack.len())));
                stack.push(name);
            }
            Some(TreeToken::CloseFolder) => {
                stack.pop();
            }
            Some(TreeToken::File(name)) => {
                tree.push(format!("{}{name}", "  ".repeat(stack.len())));
            }
            None => {}
        }
    }

    if tree.is_empty() {
        return String::new();
    }
    format!("文件结构：\n\n```text\n{}\n```\n", tree.join("\n"))
}

/// Render `<Files>` / `<Folder>` / `<File>` component trees as an indented
/// plain-text listing in a fenced block.
///
/// Expects one tag per line, which is how the component is written in the
/// course pages. Folder depth is tracked on an explicit stack.
pub fn convert_files(input: &str) -> String {
    replace_blocks(input, "Files", |block| Some(convert_files_block(block.inner)))
}
