//! Post-processing of pandoc's docx output.
//!
//! Pandoc's default reference document uses bold headings, unshaded code and
//! tables without borders. Rather than maintaining a custom reference docx,
//! the generated archive is opened and two of its XML parts are patched in
//! place:
//!
//! - `word/styles.xml`: every bold run property is dropped, the `SourceCode`
//!   paragraph style gets a grey background and a thin border box, and the
//!   `VerbatimChar` character style gets the same grey background.
//! - `word/document.xml`: every table gets a full single-line border grid.
//!
//! Elements are inserted at their schema position so Word accepts the result.

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::sync::LazyLock;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const STYLES_PART: &str = "word/styles.xml";
const DOCUMENT_PART: &str = "word/document.xml";

const CODE_SHADING: &str = r#"<w:shd w:val="clear" w:color="auto" w:fill="F2F2F2"/>"#;
const CODE_BLOCK_BORDER: &str = concat!(
    r#"<w:pBdr>"#,
    r#"<w:top w:val="single" w:sz="4" w:space="0" w:color="D0D0D0"/>"#,
    r#"<w:left w:val="single" w:sz="4" w:space="0" w:color="D0D0D0"/>"#,
    r#"<w:bottom w:val="single" w:sz="4" w:space="0" w:color="D0D0D0"/>"#,
    r#"<w:right w:val="single" w:sz="4" w:space="0" w:color="D0D0D0"/>"#,
    r#"</w:pBdr>"#
);
const TABLE_BORDERS: &str = concat!(
    r#"<w:tblBorders>"#,
    r#"<w:top w:val="single" w:sz="8" w:space="0" w:color="000000"/>"#,
    r#"<w:left w:val="single" w:sz="8" w:space="0" w:color="000000"/>"#,
    r#"<w:bottom w:val="single" w:sz="8" w:space="0" w:color="000000"/>"#,
    r#"<w:right w:val="single" w:sz="8" w:space="0" w:color="000000"/>"#,
    r#"<w:insideH w:val="single" w:sz="8" w:space="0" w:color="000000"/>"#,
    r#"<w:insideV w:val="single" w:sz="8" w:space="0" w:color="000000"/>"#,
    r#"</w:tblBorders>"#
);

// children that must come after the inserted element, per the WordprocessingML schema
const PPR_AFTER_BORDER: &[&str] = &[
    "w:shd", "w:tabs", "w:suppressAutoHyphens", "w:kinsoku", "w:wordWrap",
    "w:overflowPunct", "w:topLinePunct", "w:autoSpaceDE", "w:autoSpaceDN", "w:bidi",
    "w:adjustRightInd", "w:snapToGrid", "w:spacing", "w:ind", "w:contextualSpacing",
    "w:mirrorIndents", "w:suppressOverlap", "w:jc", "w:textDirection", "w:textAlignment",
    "w:textboxTightWrap", "w:outlineLvl", "w:divId", "w:cnfStyle", "w:rPr", "w:sectPr",
    "w:pPrChange",
];
const PPR_AFTER_SHADING: &[&str] = &[
    "w:tabs", "w:suppressAutoHyphens", "w:kinsoku", "w:wordWrap", "w:overflowPunct",
    "w:topLinePunct", "w:autoSpaceDE", "w:autoSpaceDN", "w:bidi", "w:adjustRightInd",
    "w:snapToGrid", "w:spacing", "w:ind", "w:contextualSpacing", "w:mirrorIndents",
    "w:suppressOverlap", "w:jc", "w:textDirection", "w:textAlignment", "w:textboxTightWrap",
    "w:outlineLvl", "w:divId", "w:cnfStyle", "w:rPr", "w:sectPr", "w:pPrChange",
];
const RPR_AFTER_SHADING: &[&str] = &[
    "w:fitText", "w:vertAlign", "w:rtl", "w:cs", "w:em", "w:lang", "w:eastAsianLayout",
    "w:specVanish", "w:oMath",
];
const TBLPR_AFTER_BORDERS: &[&str] = &[
    "w:shd", "w:tblLayout", "w:tblCellMar", "w:tblLook", "w:tblCaption", "w:tblDescription",
];

static RE_BOLD: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        r"<w:b\b[^>]*/>",
        r"<w:bCs\b[^>]*/>",
        r"<w:b\b[^>]*>.*?</w:b>",
        r"<w:bCs\b[^>]*>.*?</w:bCs>",
    ]
    .map(|pattern| Regex::new(pattern).expect("valid bold property regex"))
});
static RE_SOURCE_CODE_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<w:style[^>]*w:styleId="SourceCode"[^>]*>.*?</w:style>"#)
        .expect("valid SourceCode style regex")
});
static RE_VERBATIM_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<w:style[^>]*w:styleId="VerbatimChar"[^>]*>.*?</w:style>"#)
        .expect("valid VerbatimChar style regex")
});
static RE_SHADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<w:shd\b[^>]*/>").expect("valid shading regex"));
static RE_TABLE_BORDERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:tblBorders>.*?</w:tblBorders>").expect("valid table borders regex")
});
static RE_TABLE_PROPERTIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:tblPr>(.*?)</w:tblPr>").expect("valid table properties regex")
});

/// Insert `fragment` into the first `<parent>...</parent>` of `xml`, ahead of
/// the first child named in `followers`, or at the end of the parent.
fn insert_child(xml: &str, parent: &str, fragment: &str, followers: &[&str]) -> String {
    let open = format!("<{parent}>");
    let close = format!("</{parent}>");
    let Some(start) = xml.find(&open).map(|i| i + open.len()) else {
        return xml.to_string();
    };
    let Some(end) = xml[start..].find(&close).map(|i| start + i) else {
        return xml.to_string();
    };

    let children = &xml[start..end];
    let at = followers
        .iter()
        .filter_map(|name| {
            let tag = format!("<{name}");
            children.match_indices(&tag).find_map(|(i, _)| {
                // `<w:shd` must not match `<w:shdX`
                match children[i + tag.len()..].chars().next() {
                    Some(c) if c.is_alphanumeric() => None,
                    _ => Some(i),
                }
            })
        })
        .min()
        .map(|i| start + i)
        .unwrap_or(end);

    let mut out = String::with_capacity(xml.len() + fragment.len());
    out.push_str(&xml[..at]);
    out.push_str(fragment);
    out.push_str(&xml[at..]);
    out
}

fn restyle_source_code(style: &str) -> String {
    let mut s = style.to_string();
    if !s.contains("<w:pPr>") {
        s = s.replace("</w:style>", "<w:pPr></w:pPr></w:style>");
    }
    if !s.contains("<w:pBdr>") {
        s = insert_child(&s, "w:pPr", CODE_BLOCK_BORDER, PPR_AFTER_BORDER);
    }
    if RE_SHADING.is_match(&s) {
        s = RE_SHADING.replace_all(&s, CODE_SHADING).into_owned();
    } else {
        s = insert_child(&s, "w:pPr", CODE_SHADING, PPR_AFTER_SHADING);
    }
    s
}

fn restyle_verbatim(style: &str) -> String {
    let mut s = style.to_string();
    if !s.contains("<w:rPr>") {
        s = s.replace("</w:style>", "<w:rPr></w:rPr></w:style>");
    }
    if RE_SHADING.is_match(&s) {
        s = RE_SHADING.replace_all(&s, CODE_SHADING).into_owned();
    } else {
        s = insert_child(&s, "w:rPr", CODE_SHADING, RPR_AFTER_SHADING);
    }
    s
}

/// Rewrite `word/styles.xml`: no bold anywhere, shaded and boxed code styles.
pub fn restyle_styles(xml: &str) -> String {
    let mut xml = xml.to_string();
    for re in RE_BOLD.iter() {
        xml = re.replace_all(&xml, "").into_owned();
    }
    let xml = RE_SOURCE_CODE_STYLE.replace_all(&xml, |caps: &Captures| restyle_source_code(&caps[0]));
    let xml = RE_VERBATIM_STYLE.replace_all(&xml, |caps: &Captures| restyle_verbatim(&caps[0]));
    xml.into_owned()
}

/// Rewrite `word/document.xml` so every table has a complete border grid.
pub fn restyle_tables(xml: &str) -> String {
    let xml = RE_TABLE_BORDERS.replace_all(xml, TABLE_BORDERS);
    RE_TABLE_PROPERTIES
        .replace_all(&xml, |caps: &Captures| {
            if caps[1].contains("<w:tblBorders>") {
                caps[0].to_string()
            } else {
                insert_child(&caps[0], "w:tblPr", TABLE_BORDERS, TBLPR_AFTER_BORDERS)
            }
        })
        .into_owned()
}

/// Patch the styles and tables of the docx archive at `path`, in place.
///
/// Every other archive entry is copied through untouched and in order.
pub fn restyle(path: &Path) -> Result<()> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .with_context(|| format!("Failed to open {} as a zip archive", path.display()))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to read entry {i} of {}", path.display()))?;
        let name = entry.name().to_string();
        let rewrite: Option<fn(&str) -> String> = match name.as_str() {
            STYLES_PART => Some(restyle_styles),
            DOCUMENT_PART => Some(restyle_tables),
            _ => None,
        };

        match rewrite {
            Some(rewrite) => {
                let mut xml = String::new();
                entry
                    .read_to_string(&mut xml)
                    .with_context(|| format!("Failed to read {name} from {}", path.display()))?;
                let xml = rewrite(&xml);
                writer
                    .start_file(name.as_str(), options)
                    .with_context(|| format!("Failed to start {name}"))?;
                writer
                    .write_all(xml.as_bytes())
                    .with_context(|| format!("Failed to write {name}"))?;
            }
            None => writer
                .raw_copy_file(entry)
                .with_context(|| format!("Failed to copy {name}"))?,
        }
    }

    let patched = writer
        .finish()
        .with_context(|| format!("Failed to finish rewriting {}", path.display()))?
        .into_inner();
    std::fs::write(path, patched).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod test {
    use super::*;

    const STYLES: &str = concat!(
        r#"<w:styles>"#,
        r#"<w:style w:type="paragraph" w:styleId="Heading1"><w:rPr><w:b/><w:bCs w:val="1"/><w:sz w:val="32"/></w:rPr></w:style>"#,
        r#"<w:style w:type="paragraph" w:customStyle="1" w:styleId="SourceCode"><w:name w:val="Source Code"/><w:pPr><w:wordWrap w:val="off"/></w:pPr></w:style>"#,
        r#"<w:style w:type="character" w:customStyle="1" w:styleId="VerbatimChar"><w:name w:val="Verbatim Char"/><w:rPr><w:rFonts w:ascii="Consolas"/><w:sz w:val="22"/></w:rPr></w:style>"#,
        r#"<w:style w:type="character" w:styleId="Strong"><w:rPr><w:b></w:b></w:rPr></w:style>"#,
        r#"</w:styles>"#
    );

    #[test]
    fn removes_bold_everywhere() {
        let out = restyle_styles(STYLES);
        assert!(!out.contains("<w:b/>"));
        assert!(!out.contains("<w:bCs"));
        assert!(!out.contains("<w:b>"));
        assert!(out.contains(r#"<w:rPr><w:sz w:val="32"/></w:rPr>"#));
    }

    #[test]
    fn boxes_and_shades_code_blocks() {
        let out = restyle_styles(STYLES);
        let expected = format!(
            r#"<w:style w:type="paragraph" w:customStyle="1" w:styleId="SourceCode"><w:name w:val="Source Code"/><w:pPr>{CODE_BLOCK_BORDER}{CODE_SHADING}<w:wordWrap w:val="off"/></w:pPr></w:style>"#
        );
        assert!(out.contains(&expected), "{out}");
    }

    #[test]
    fn shades_inline_code() {
        let out = restyle_styles(STYLES);
        let expected = format!(
            r#"<w:rPr><w:rFonts w:ascii="Consolas"/><w:sz w:val="22"/>{CODE_SHADING}</w:rPr>"#
        );
        assert!(out.contains(&expected), "{out}");
    }

    #[test]
    fn normalises_existing_shading_and_missing_properties() {
        let styles = concat!(
            r#"<w:style w:styleId="SourceCode"><w:pPr><w:shd w:val="clear" w:fill="FFFFFF"/></w:pPr></w:style>"#,
            r#"<w:style w:styleId="VerbatimChar"><w:name w:val="Verbatim Char"/></w:style>"#
        );
        let out = restyle_styles(styles);
        assert_eq!(
            out,
            format!(
                r#"<w:style w:styleId="SourceCode"><w:pPr>{CODE_BLOCK_BORDER}{CODE_SHADING}</w:pPr></w:style><w:style w:styleId="VerbatimChar"><w:name w:val="Verbatim Char"/><w:rPr>{CODE_SHADING}</w:rPr></w:style>"#
            )
        );
    }

    #[test]
    fn restyling_twice_changes_nothing() {
        let once = restyle_styles(STYLES);
        assert_eq!(restyle_styles(&once), once);
    }

    #[test]
    fn adds_and_replaces_table_borders() {
        let document = concat!(
            r#"<w:tbl><w:tblPr><w:tblStyle w:val="Table"/><w:tblW w:type="pct" w:w="5000"/><w:tblLook w:firstRow="1"/></w:tblPr></w:tbl>"#,
            r#"<w:tbl><w:tblPr><w:tblBorders><w:top w:val="nil"/></w:tblBorders></w:tblPr></w:tbl>"#
        );
        let out = restyle_tables(document);
        assert_eq!(
            out,
            format!(
                r#"<w:tbl><w:tblPr><w:tblStyle w:val="Table"/><w:tblW w:type="pct" w:w="5000"/>{TABLE_BORDERS}<w:tblLook w:firstRow="1"/></w:tblPr></w:tbl><w:tbl><w:tblPr>{TABLE_BORDERS}</w:tblPr></w:tbl>"#
            )
        );
        assert_eq!(restyle_tables(&out), out);
    }

    #[test]
    fn documents_without_tables_are_untouched() {
        let document = "<w:body><w:p><w:r><w:t>text</w:t></w:r></w:p></w:body>";
        assert_eq!(restyle_tables(document), document);
    }

    fn write_docx(path: &Path, entries: &[(&str, &str)]) {
        let file = std::fs::File::create(path).expect("can create docx");
        let mut zip = ZipWriter::new(file);
        for (name, contents) in entries {
            zip.start_file(*name, SimpleFileOptions::default())
                .expect("can start entry");
            zip.write_all(contents.as_bytes()).expect("can write entry");
        }
        zip.finish().expect("can finish docx");
    }

    fn read_entries(path: &Path) -> Vec<(String, String)> {
        let file = std::fs::File::open(path).expect("can open docx");
        let mut archive = ZipArchive::new(file).expect("valid zip");
        (0..archive.len())
            .map(|i| {
                let mut entry = archive.by_index(i).expect("entry");
                let mut contents = String::new();
                entry.read_to_string(&mut contents).expect("utf-8 entry");
                (entry.name().to_string(), contents)
            })
            .collect()
    }

    #[test]
    fn patches_archive_in_place() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let path = dir.path().join("chapter.docx");
        let document = r#"<w:tbl><w:tblPr></w:tblPr></w:tbl>"#;
        write_docx(
            &path,
            &[
                ("[Content_Types].xml", "<Types/>"),
                (STYLES_PART, STYLES),
                (DOCUMENT_PART, document),
                ("word/media/rId1.png", "png-bytes"),
            ],
        );

        restyle(&path).expect("can restyle docx");

        let entries = read_entries(&path);
        let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["[Content_Types].xml", STYLES_PART, DOCUMENT_PART, "word/media/rId1.png"]
        );
        assert_eq!(entries[0].1, "<Types/>");
        assert_eq!(entries[1].1, restyle_styles(STYLES));
        assert_eq!(entries[2].1, format!("<w:tbl><w:tblPr>{TABLE_BORDERS}</w:tblPr></w:tbl>"));
        assert_eq!(entries[3].1, "png-bytes");
    }

    #[test]
    fn archive_without_styles_is_copied() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let path = dir.path().join("plain.docx");
        write_docx(&path, &[("word/other.xml", "<x/>")]);
        restyle(&path).expect("can restyle docx");
        assert_eq!(read_entries(&path), vec![("word/other.xml".to_string(), "<x/>".to_string())]);
    }

    #[test]
    fn non_archives_are_rejected() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, "not a zip").expect("can write file");
        assert!(restyle(&path).is_err());
    }
}
