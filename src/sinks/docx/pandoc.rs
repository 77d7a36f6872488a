use crate::config::PandocConfig;
use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Convert `markdown` into a document at `outfile` by piping it through pandoc.
///
/// Pandoc runs from `workdir` so relative image links in the markdown resolve
/// against it.
pub fn convert(config: &PandocConfig, markdown: &str, outfile: &Path, workdir: &Path) -> Result<()> {
    let mut child = Command::new(&config.program)
        .arg("-f")
        .arg(&config.from)
        .arg("-t")
        .arg(&config.to)
        .arg("-o")
        .arg(outfile)
        .current_dir(workdir)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to launch `{}`", config.program))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("Failed to open stdin of `{}`", config.program))?;

    // feed stdin from its own thread while stderr is drained here
    let (output, sent) = std::thread::scope(|scope| {
        let writer = scope.spawn(move || stdin.write_all(markdown.as_bytes()));
        let output = child.wait_with_output();
        (output, writer.join())
    });
    let output = output.with_context(|| format!("Failed to wait for `{}`", config.program))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        return Err(if stderr.is_empty() {
            anyhow!("{} failed ({}): {}", config.program, output.status, outfile.display())
        } else {
            anyhow!("{} failed ({}): {stderr}", config.program, output.status)
        });
    }
    sent.map_err(|_| anyhow!("Writer thread for `{}` panicked", config.program))?
        .with_context(|| format!("Failed to send markdown to `{}`", config.program))
}
