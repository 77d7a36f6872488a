use regex::{Captures, Regex};
use std::sync::LazyLock;

static RE_TITLED_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^```([a-zA-Z0-9_-]+)\s+title=(?:"([^"]*)"|'([^']*)')\s*$"#)
        .expect("valid titled fence regex")
});

/// Move a code fence's `title="..."` attribute into a level-4 heading above
/// the fence, which pandoc would otherwise ignore.
pub fn convert_code_fence_titles(input: &str) -> String {
    RE_TITLED_FENCE
        .replace_all(input, |caps: &Captures| {
            let lang = &caps[1];
            let title = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().trim())
                .unwrap_or_default();
            if title.is_empty() {
                format!("```{lang}")
            } else {
                format!("#### {title}\n\n```{lang}")
            }
        })
        .into_owned()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hoists_titles() {
        assert_eq!(
            convert_code_fence_titles("```ts title=\"app.ts\"\nlet a = 1;\n```"),
            "#### app.ts\n\n```ts\nlet a = 1;\n```"
        );
        assert_eq!(
            convert_code_fence_titles("```bash title='run'\nls\n```"),
            "#### run\n\n```bash\nls\n```"
        );
    }

    #[test]
    fn empty_title_just_drops_the_attribute() {
        assert_eq!(
            convert_code_fence_titles("```py title=\"\"\nx\n```"),
            "```py\nx\n```"
        );
    }

    #[test]
    fn untitled_fences_are_untouched() {
        let input = "```rust\nfn main() {}\n```\n";
        assert_eq!(convert_code_fence_titles(input), input);
    }
}
