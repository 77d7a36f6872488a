use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Project root holding the course content and word-export.toml
    #[clap(long, default_value = ".")]
    pub root: PathBuf,

    /// Configuration file to use instead of <ROOT>/word-export.toml
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Directory to write documents into, relative to the project root
    #[clap(long, env = "WORD_EXPORT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Also write the intermediate markdown next to each document
    #[clap(long, env = "EXPORT_WORD_DEBUG_MD")]
    pub debug_markdown: bool,

    /// Don't contact the diagram renderer; Mermaid blocks stay as code
    #[clap(long)]
    pub offline: bool,
}

#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// MDX page to convert
    pub file: PathBuf,

    /// Project root holding the course content and word-export.toml
    #[clap(long, default_value = ".")]
    pub root: PathBuf,

    /// Don't contact the diagram renderer; Mermaid blocks stay as code
    #[clap(long)]
    pub offline: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Project root to write word-export.toml into
    #[clap(long, default_value = ".")]
    pub root: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Exports every theory chapter to its own Word document
    Export(ExportArgs),
    /// Prints the markdown a single page would be converted to
    Preview(PreviewArgs),
    /// Generates a word-export.toml config file with the default settings
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_export_flags() {
        let cli = Cli::try_parse_from([
            "course-docx",
            "export",
            "--root",
            "site",
            "--output-dir",
            "out",
            "--offline",
        ])
        .expect("valid arguments");
        let Commands::Export(args) = cli.command else {
            panic!("expected the export command");
        };
        assert_eq!(args.root, PathBuf::from("site"));
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert!(args.offline);
        assert!(args.config.is_none());
    }

    #[test]
    fn preview_requires_a_file() {
        assert!(Cli::try_parse_from(["course-docx", "preview"]).is_err());
        let cli = Cli::try_parse_from(["course-docx", "preview", "page.mdx"])
            .expect("valid arguments");
        assert!(matches!(cli.command, Commands::Preview(ref args) if args.file == PathBuf::from("page.mdx")));
    }
}
