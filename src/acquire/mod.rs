//! Source acquisition: turn a PDF export or a live dashboard into an ordered
//! sequence of page images. The rasterizer and the browser are external
//! programs; only their narrow contracts live here.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};
use wait_timeout::ChildExt;

use crate::config::{PAGE_PLACEHOLDER, ReportConfig};
use crate::error::{AcquisitionError, ReportError, ReportResult};

mod browser;
mod pdf;

pub use browser::HeadlessChrome;
pub use pdf::{DEFAULT_DPI, Pdftoppm};

/// One page of the source document, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePage {
    pub index: usize,
    /// Encoded PNG bytes.
    pub image: Vec<u8>,
}

pub trait Rasterize {
    fn rasterize(&self, pdf: &Path) -> Result<Vec<SourcePage>>;
}

/// Browser window size used for screenshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 1200,
        }
    }
}

pub trait CaptureDriver {
    fn screenshot(&self, url: &str, viewport: Viewport) -> Result<Vec<u8>>;
}

/// Picks the PDF to rasterize: the explicit path when given, otherwise the
/// single PDF sitting in `search_dir`.
pub fn resolve_pdf(explicit: Option<&Path>, search_dir: &Path) -> ReportResult<PathBuf> {
    match explicit {
        Some(path) if path.is_file() => Ok(path.to_path_buf()),
        Some(path) => Err(AcquisitionError::MissingPdf {
            path: path.to_path_buf(),
        }
        .into()),
        None => discover_pdf(search_dir),
    }
}

pub fn discover_pdf(dir: &Path) -> ReportResult<PathBuf> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_file() && is_pdf(path))
                .collect()
        })
        .unwrap_or_default();
    candidates.sort();

    match candidates.len() {
        0 => Err(AcquisitionError::NoSource {
            dir: dir.to_path_buf(),
        }
        .into()),
        1 => Ok(candidates.remove(0)),
        _ => Err(AcquisitionError::Ambiguous {
            dir: dir.to_path_buf(),
            candidates,
        }
        .into()),
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Screenshots every page the manifest can reference, substituting the
/// 1-based page number into the URL template.
pub fn capture_pages(
    driver: &dyn CaptureDriver,
    config: &ReportConfig,
    viewport: Viewport,
) -> Result<Vec<SourcePage>> {
    let template = config.validate_source_url()?;
    let page_count = config.required_page_count();

    let mut pages = Vec::with_capacity(page_count);
    for index in 0..page_count {
        let url = page_url(template, index);
        info!(page = index + 1, url = %url, "capturing dashboard page");
        let image = driver
            .screenshot(&url, viewport)
            .with_context(|| format!("failed to capture page {} from {url}", index + 1))?;
        pages.push(SourcePage { index, image });
    }

    info!(pages = pages.len(), "browser capture complete");
    Ok(pages)
}

pub fn page_url(template: &str, index: usize) -> String {
    template.replace(PAGE_PLACEHOLDER, &(index + 1).to_string())
}

/// Runs an external tool to completion, killing it once `timeout` elapses.
/// Stderr is drained on a separate thread so a chatty tool cannot stall on a
/// full pipe.
fn run_tool(mut command: Command, program: &str, target: &str, timeout: Duration) -> Result<()> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to execute {program} for {target}"))?;

    let stderr_reader = child.stderr.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    });

    let status = match child
        .wait_timeout(timeout)
        .with_context(|| format!("failed to wait on {program} for {target}"))?
    {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            // A grandchild may still hold the pipe open; leave the reader detached.
            warn!(
                program = %program,
                input = %target,
                seconds = timeout.as_secs(),
                "killed tool after timeout"
            );
            return Err(ReportError::from(AcquisitionError::Timeout {
                program: program.to_string(),
                target: target.to_string(),
                seconds: timeout.as_secs(),
            })
            .into());
        }
    };

    let stderr = stderr_reader
        .and_then(|reader| reader.join().ok())
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default();

    if !status.success() {
        let stderr = match stderr.trim() {
            "" => status.to_string(),
            trimmed => trimmed.to_string(),
        };
        return Err(ReportError::from(AcquisitionError::ToolFailed {
            program: program.to_string(),
            target: target.to_string(),
            stderr,
        })
        .into());
    }

    Ok(())
}
