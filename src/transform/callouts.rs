use super::dedent;
use super::tags::{attr, replace_blocks};

/// Flatten `<Callout title="...">...</Callout>` into a level-4 heading and a
/// plain paragraph.
///
/// Callouts nested inside a callout are flattened too.
pub fn convert_callouts(input: &str) -> String {
    replace_blocks(input, "Callout", |block| {
        let title = attr(block.attrs, "title").unwrap_or_default().trim();
        let text = convert_callouts(&dedent(block.inner));
        let text = text.trim_matches('\n');

        Some(match (title.is_empty(), text.is_empty()) {
            (true, true) => "\n".to_string(),
            (false, false) => format!("\n#### {title}\n\n{text}\n"),
            (false, true) => format!("\n#### {title}\n"),
            (true, false) => format!("\n{text}\n"),
        })
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn title_and_content() {
        assert_eq!(
            convert_callouts("<Callout title=\"T\">C</Callout>"),
            "\n#### T\n\nC\n"
        );
    }

    #[test]
    fn content_only() {
        assert_eq!(convert_callouts("<Callout>\n  C\n</Callout>"), "\nC\n");
        assert_eq!(
            convert_callouts("<Callout type=\"warn\" title=''>C</Callout>"),
            "\nC\n"
        );
    }

    #[test]
    fn title_only_and_empty() {
        assert_eq!(
            convert_callouts("<Callout title='Heads up'>\n</Callout>"),
            "\n#### Heads up\n"
        );
        assert_eq!(convert_callouts("x<Callout></Callout>y"), "x\ny");
    }

    #[test]
    fn nested_callouts_are_flattened() {
        let input = "<Callout title=\"A\">\n  Outer\n  <Callout title=\"B\">\n    Inner\n  </Callout>\n</Callout>";
        assert_eq!(
            convert_callouts(input),
            "\n#### A\n\nOuter\n\n#### B\n\nInner\n"
        );
        assert_eq!(
            convert_callouts("<Callout>x <Callout title=\"B\">y</Callout></Callout>"),
            "\nx \n#### B\n\ny\n"
        );
    }

    #[test]
    fn no_callouts_is_a_no_op() {
        let input = "# Heading\n\nCallout is just a word here.\n";
        assert_eq!(convert_callouts(input), input);
    }
}
