use regex::Regex;
use std::sync::LazyLock;

static RE_FRONTMATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^---\s*\r?\n(?s:(.*?))\r?\n---\s*\r?\n?").expect("valid frontmatter regex")
});
static RE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^title:\s*(.+)$").expect("valid title regex"));

/// Split a page into its frontmatter title and the body that follows.
///
/// Without a leading `---` block the title is empty and the body is the whole
/// input. Only `title` is read from the header.
pub fn parse_frontmatter(raw: &str) -> (String, &str) {
    let Some(header) = RE_FRONTMATTER.captures(raw) else {
        return (String::new(), raw);
    };
    let body = &raw[header[0].len()..];

    let title = RE_TITLE
        .captures(&header[1])
        .map(|caps| {
            let value = caps[1].trim();
            let value = value.strip_prefix(['"', '\'']).unwrap_or(value);
            let value = value.strip_suffix(['"', '\'']).unwrap_or(value);
            value.to_string()
        })
        .unwrap_or_default();
    (title, body)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reads_title_and_body() {
        let raw = "---\ntitle: \"Prompt Injection\"\ndescription: x\n---\n\n# Body\n";
        assert_eq!(
            parse_frontmatter(raw),
            ("Prompt Injection".to_string(), "# Body\n")
        );
    }

    #[test]
    fn handles_crlf_and_single_quotes() {
        let raw = "---\r\ntitle: 'Threat Models'\r\n---\r\nBody";
        assert_eq!(parse_frontmatter(raw), ("Threat Models".to_string(), "Body"));
    }

    #[test]
    fn header_without_title() {
        let raw = "---\ndescription: none\n---\nBody";
        assert_eq!(parse_frontmatter(raw), (String::new(), "Body"));
    }

    #[test]
    fn no_header_returns_everything() {
        let raw = "# Just markdown\n---\ntitle: not frontmatter\n---\n";
        assert_eq!(parse_frontmatter(raw), (String::new(), raw));
        assert_eq!(parse_frontmatter(""), (String::new(), ""));
    }
}
