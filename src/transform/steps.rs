use super::dedent;
use super::tags::{blocks, replace_blocks};

fn convert_steps_block(inner: &str) -> Option<String> {
    let steps = blocks(inner, "Step");
    if steps.is_empty() {
        return None;
    }

    let mut lines = Vec::new();
    // numbering follows the step's position, so empty steps still use a number
    for (i, step) in steps.iter().enumerate() {
        let content = dedent(step.inner);
        if content.is_empty() {
            continue;
        }
        let mut content_lines = content.split('\n');
        let first = content_lines.next().unwrap_or_default().trim();
        lines.push(format!("{}. {first}", i + 1));
        for line in content_lines {
            if line.trim().is_empty() {
                lines.push(String::new());
            } else {
                lines.push(format!("   {line}"));
            }
        }
        lines.push(String::new());
    }
    Some(lines.join("\n"))
}

/// Flatten `<Steps>` / `<Step>` blocks into a numbered list.
///
/// The first line of a step becomes the list item; the remaining lines are
/// indented so markdown keeps them inside the item.
pub fn convert_steps(input: &str) -> String {
    replace_blocks(input, "Steps", |block| {
        Some(convert_steps_block(block.inner).unwrap_or_else(|| block.inner.to_string()))
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn numbers_steps() {
        let input = "<Steps>\n<Step>\n  ### Install\n  Run the installer.\n\n  Then reboot.\n</Step>\n<Step>Done</Step>\n</Steps>";
        assert_eq!(
            convert_steps(input),
            "1. ### Install\n   Run the installer.\n\n   Then reboot.\n\n2. Done\n"
        );
    }

    #[test]
    fn empty_steps_keep_their_number() {
        let input = "<Steps><Step> </Step><Step>second</Step></Steps>";
        assert_eq!(convert_steps(input), "2. second\n");
    }

    #[test]
    fn steps_without_step_keep_inner_text() {
        assert_eq!(convert_steps("<Steps>\nloose\n</Steps>"), "\nloose\n");
        let untouched = "No steps here.";
        assert_eq!(convert_steps(untouched), untouched);
    }
}
