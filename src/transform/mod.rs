//! MDX to Word-flavoured markdown conversion.
//!
//! Course pages are MDX: markdown interleaved with interactive components
//! (callouts, tabs, quizzes, file trees, ...). None of those survive a trip
//! through pandoc, so each chapter body is pushed through a fixed sequence of
//! text stages that flatten the components into plain markdown before
//! conversion. Stages are order-dependent: later stages assume earlier ones
//! have already removed the constructs they would otherwise trip over.
//!
//! Every stage is a pure `&str -> String` function and returns its input
//! unchanged when the construct it targets is absent.

mod accordions;
mod bold;
mod callouts;
mod cleanup;
mod fences;
mod files;
mod literal;
mod quiz;
mod steps;
mod tabs;
mod tags;

pub use accordions::convert_accordions;
pub use bold::strip_bold;
pub use callouts::convert_callouts;
pub use cleanup::{cleanup_spacing, remove_imports, strip_residual_tags};
pub use fences::convert_code_fence_titles;
pub use files::convert_files;
pub use quiz::convert_quiz;
pub use steps::convert_steps;
pub use tabs::convert_tabs;

use crate::diagrams::{convert_mermaid_blocks, DiagramCache, DiagramReport};

/// The result of converting one chapter.
#[derive(Debug)]
pub struct Conversion {
    /// Markdown ready to be handed to pandoc, headed by the chapter title
    pub markdown: String,
    /// What happened to the chapter's Mermaid diagrams
    pub diagrams: DiagramReport,
}

/// Convert an MDX chapter body (frontmatter already removed) into markdown.
///
/// `chapter_key` names the chapter's rendered diagram files and tags warnings.
pub fn to_word_markdown(
    body: &str,
    title: &str,
    chapter_key: &str,
    diagrams: &DiagramCache,
) -> Conversion {
    let body = remove_imports(body);
    let body = convert_quiz(&body);
    let body = convert_files(&body);
    let body = convert_steps(&body);
    let body = convert_accordions(&body);
    let body = convert_tabs(&body);
    let body = convert_callouts(&body);
    let (body, report) = convert_mermaid_blocks(&body, chapter_key, diagrams);
    let body = convert_code_fence_titles(&body);
    let body = strip_bold(&body);
    let body = strip_residual_tags(&body);
    let body = cleanup_spacing(&body);

    Conversion {
        markdown: format!("# {title}\n\n{body}"),
        diagrams: report,
    }
}

/// Strip the common leading indentation from a block of text.
///
/// Leading and trailing blank lines are dropped, CRLF line endings are
/// normalised, and whitespace-only lines become empty. Only spaces and tabs
/// count as indentation.
pub fn dedent(input: &str) -> String {
    let normalised = input.replace("\r\n", "\n");
    let mut lines: Vec<&str> = normalised.split('\n').collect();

    while lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    if lines.is_empty() {
        return String::new();
    }

    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);
    if indent == 0 {
        return lines.join("\n");
    }

    lines
        .into_iter()
        .map(|l| if l.trim().is_empty() { "" } else { &l[indent..] })
        .collect::<Vec<_>>()
        .join("\n")
}
