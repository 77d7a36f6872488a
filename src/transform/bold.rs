//! Bold emphasis removal.
//!
//! The exported documents use a single text weight, so markdown and HTML bold
//! markers are dropped from prose. Fenced code is left untouched.

use regex::Regex;
use std::sync::LazyLock;

static RE_STARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid star bold regex"));
static RE_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__([^_]+)__").expect("valid underscore bold regex"));
static RE_STRONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<strong>(.*?)</strong>").expect("valid strong regex"));
static RE_B: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<b>(.*?)</b>").expect("valid b regex"));

fn strip_bold_in_line(line: &str) -> String {
    let mut output = line.to_string();
    loop {
        let next = RE_STARS.replace_all(&output, "$1");
        let next = RE_UNDERSCORES.replace_all(&next, "$1");
        let next = RE_STRONG.replace_all(&next, "$1");
        let next = RE_B.replace_all(&next, "$1").into_owned();
        if next == output {
            return output;
        }
        output = next;
    }
}

fn strip_bold_pass(input: &str) -> String {
    let mut in_fence = false;
    input
        .split('\n')
        .map(|line| {
            if line.trim().starts_with("```") {
                in_fence = !in_fence;
                return line.to_string();
            }
            if in_fence {
                line.to_string()
            } else {
                strip_bold_in_line(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Remove `**x**`, `__x__`, `<strong>x</strong>` and `<b>x</b>` outside of
/// fenced code blocks.
///
/// Unwrapping a marker can turn a prose line into a fence line (`**```**`),
/// which moves the fence boundaries, so passes repeat over the whole text
/// until nothing changes. A second call is then always a no-op.
pub fn strip_bold(input: &str) -> String {
    let mut output = strip_bold_pass(input);
    loop {
        let next = strip_bold_pass(&output);
        if next == output {
            return output;
        }
        output = next;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn strips_markdown_and_html_bold() {
        assert_eq!(strip_bold("a **b** c __d__ e"), "a b c d e");
        assert_eq!(strip_bold("<strong>x</strong> and <B>y</B>"), "x and y");
    }

    #[test]
    fn unwraps_nested_markers() {
        assert_eq!(strip_bold("__**deep**__"), "deep");
        assert_eq!(strip_bold("<strong><strong>x</strong></strong>"), "x");
        assert_eq!(strip_bold("<b>**mixed**</b>"), "mixed");
    }

    #[test]
    fn leaves_fenced_code_alone() {
        let input = "**a**\n```js\nconst s = \"**b**\";\n```\n__c__";
        assert_eq!(strip_bold(input), "a\n```js\nconst s = \"**b**\";\n```\nc");
    }

    #[test]
    fn unwrapped_fence_markers_move_the_fences() {
        assert_eq!(strip_bold("**```**\n```\n**y**\n```"), "```\n```\ny\n```");
    }

    #[test]
    fn is_idempotent() {
        let inputs = [
            "plain text",
            "**a** **b**c** d",
            "__x__ and ____ and **",
            "<strong><b>x</b></strong> <strong>unclosed",
            "```\n**kept**\n```\n**gone**",
            "**```**\n```\n**y**\n```",
        ];
        for input in inputs {
            let once = strip_bold(input);
            assert_eq!(strip_bold(&once), once, "input: {input:?}");
        }
    }
}
