//! Mermaid diagram rasterization.
//!
//! Word cannot display Mermaid source, so every diagram is sent to a Kroki
//! endpoint and the returned PNG is embedded instead. Rendered images are
//! cached on disk under a name that includes a hash of the diagram source, so
//! re-running an export only contacts the network for diagrams that changed.
//! Rendering is best-effort: a diagram that fails to render keeps its source
//! block in the document.

mod mermaid;
pub use mermaid::convert_mermaid_blocks;

use crate::config::DiagramConfig;
use std::io::Read;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Why a diagram could not be rendered.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Kroki {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("diagram rendering is disabled")]
    Disabled,
    #[error("failed to cache rendered image at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Something that can turn diagram source text into PNG bytes.
pub trait DiagramRenderer {
    fn render(&self, source: &str) -> Result<Vec<u8>, RenderError>;
}

/// Renders diagrams through a Kroki HTTP endpoint.
pub struct KrokiRenderer {
    agent: ureq::Agent,
    endpoint: String,
}

impl KrokiRenderer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> KrokiRenderer {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        KrokiRenderer {
            agent,
            endpoint: endpoint.into(),
        }
    }
}

impl DiagramRenderer for KrokiRenderer {
    fn render(&self, source: &str) -> Result<Vec<u8>, RenderError> {
        let response = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "text/plain; charset=utf-8")
            .set("Accept", "image/png")
            .send_string(source);

        let response = match response {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                return Err(RenderError::Status {
                    status,
                    body: body.chars().take(120).collect(),
                });
            }
            Err(e) => return Err(RenderError::Transport(e.to_string())),
        };

        let mut png = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut png)
            .map_err(|e| RenderError::Transport(e.to_string()))?;
        Ok(png)
    }
}

/// Stands in for the network when rendering is switched off.
pub struct OfflineRenderer;

impl DiagramRenderer for OfflineRenderer {
    fn render(&self, _source: &str) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::Disabled)
    }
}

/// Counts of diagrams seen while converting one or more chapters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiagramReport {
    pub found: usize,
    pub rendered: usize,
    pub failed: usize,
}

impl AddAssign for DiagramReport {
    fn add_assign(&mut self, other: DiagramReport) {
        self.found += other.found;
        self.rendered += other.rendered;
        self.failed += other.failed;
    }
}

/// Content-addressed on-disk cache of rendered diagrams.
pub struct DiagramCache {
    renderer: Box<dyn DiagramRenderer>,
    assets_dir: PathBuf,
    link_root: PathBuf,
}

impl DiagramCache {
    /// `assets_dir` holds the PNG files; markdown links to them are written
    /// relative to `link_root`.
    pub fn new<A: Into<PathBuf>, L: Into<PathBuf>>(
        renderer: Box<dyn DiagramRenderer>,
        assets_dir: A,
        link_root: L,
    ) -> DiagramCache {
        DiagramCache {
            renderer,
            assets_dir: assets_dir.into(),
            link_root: link_root.into(),
        }
    }

    /// Build a cache backed by Kroki, or by nothing when `offline` is set.
    pub fn from_config(
        config: &DiagramConfig,
        assets_dir: PathBuf,
        link_root: PathBuf,
        offline: bool,
    ) -> DiagramCache {
        let renderer: Box<dyn DiagramRenderer> = if offline {
            Box::new(OfflineRenderer)
        } else {
            Box::new(KrokiRenderer::new(
                config.endpoint.clone(),
                Duration::from_secs(config.timeout_secs),
            ))
        };
        DiagramCache::new(renderer, assets_dir, link_root)
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// Where the image for the `ordinal`th diagram of a chapter lives.
    pub fn image_path(&self, chapter_key: &str, ordinal: usize, source: &str) -> PathBuf {
        let hash = content_hash(source);
        self.assets_dir
            .join(format!("{chapter_key}-mermaid-{ordinal:02}-{hash}.png"))
    }

    /// Make sure a rendered image for `source` exists at `path`.
    ///
    /// An existing file is trusted as-is; otherwise the renderer is called and
    /// its output written next to `path` and then renamed into place, so an
    /// interrupted write never leaves a truncated image behind.
    pub fn ensure_rendered(&self, source: &str, path: &Path) -> Result<(), RenderError> {
        if path.exists() {
            log::debug!("Using cached diagram {}", path.display());
            return Ok(());
        }

        let png = self.renderer.render(source)?;

        // only complete images may appear under the final name
        let mut partial = path.as_os_str().to_owned();
        partial.push(".part");
        let partial = PathBuf::from(partial);
        let io_error = |source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Err(e) = std::fs::write(&partial, png) {
            let _ = std::fs::remove_file(&partial);
            return Err(io_error(e));
        }
        std::fs::rename(&partial, path).map_err(io_error)
    }

    /// Markdown link target for an image, relative to the link root when
    /// possible and always with `/` separators.
    pub fn link_for(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.link_root).unwrap_or(path);
        relative.to_string_lossy().replace('\\', "/")
    }
}

/// First 12 hex digits of the SHA-1 of `source`.
pub fn content_hash(source: &str) -> String {
    let mut digest = sha1_smol::Sha1::from(source).digest().to_string();
    digest.truncate(12);
    digest
}
