use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::{debug, info};

use super::{Rasterize, SourcePage, run_tool};
use crate::error::{AcquisitionError, ReportError};

pub const DEFAULT_DPI: u32 = 200;
const OUTPUT_STEM: &str = "page";

/// Rasterizes every page of a PDF with poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct Pdftoppm {
    pub program: String,
    pub dpi: u32,
    pub timeout: Duration,
}

impl Default for Pdftoppm {
    fn default() -> Self {
        Self {
            program: "pdftoppm".to_string(),
            dpi: DEFAULT_DPI,
            timeout: Duration::from_secs(300),
        }
    }
}

impl Rasterize for Pdftoppm {
    fn rasterize(&self, pdf: &Path) -> Result<Vec<SourcePage>> {
        let scratch = TempDir::new().context("failed to create rasterizer scratch directory")?;
        let output_root = scratch.path().join(OUTPUT_STEM);

        info!(pdf = %pdf.display(), dpi = self.dpi, "converting PDF");

        let mut command = Command::new(&self.program);
        command
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(pdf)
            .arg(&output_root);
        run_tool(
            command,
            &self.program,
            &pdf.display().to_string(),
            self.timeout,
        )?;

        let rendered = collect_rendered_pages(scratch.path())?;
        if rendered.is_empty() {
            return Err(ReportError::from(AcquisitionError::NoPages {
                program: self.program.clone(),
                target: pdf.display().to_string(),
            })
            .into());
        }

        let mut pages = Vec::with_capacity(rendered.len());
        for (index, path) in rendered.into_iter().enumerate() {
            let image = fs::read(&path)
                .with_context(|| format!("failed to read rendered page: {}", path.display()))?;
            debug!(page = index + 1, bytes = image.len(), "rendered page");
            pages.push(SourcePage { index, image });
        }

        info!(pages = pages.len(), "found pages in PDF");
        Ok(pages)
    }
}

/// `pdftoppm` names outputs `page-1.png` or `page-01.png` depending on the
/// page count, so order by the parsed number rather than by name.
fn collect_rendered_pages(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    let mut numbered = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read entry in {}", dir.display()))?
            .path();
        if let Some(number) = rendered_page_number(&path) {
            numbered.push((number, path));
        }
    }

    numbered.sort_by_key(|(number, _)| *number);
    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}

pub(super) fn rendered_page_number(path: &Path) -> Option<u32> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("png") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (prefix, number) = stem.rsplit_once('-')?;
    if prefix != OUTPUT_STEM {
        return None;
    }
    number.parse().ok()
}
