use std::fs;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::debug;

use super::{CaptureDriver, Viewport, run_tool};
use crate::error::{AcquisitionError, ReportError};

/// Screenshots a page with a headless Chromium-family browser.
#[derive(Debug, Clone)]
pub struct HeadlessChrome {
    pub program: String,
    /// Virtual time the page gets to finish rendering before the shot.
    pub settle: Duration,
    pub timeout: Duration,
}

impl Default for HeadlessChrome {
    fn default() -> Self {
        Self {
            program: "chromium".to_string(),
            settle: Duration::from_secs(10),
            timeout: Duration::from_secs(60),
        }
    }
}

impl HeadlessChrome {
    pub fn command_args(
        &self,
        screenshot_path: &str,
        url: &str,
        viewport: Viewport,
    ) -> Vec<String> {
        vec![
            "--headless".to_string(),
            "--disable-gpu".to_string(),
            "--hide-scrollbars".to_string(),
            format!("--window-size={},{}", viewport.width, viewport.height),
            format!("--virtual-time-budget={}", self.settle.as_millis()),
            format!("--screenshot={screenshot_path}"),
            url.to_string(),
        ]
    }
}

impl CaptureDriver for HeadlessChrome {
    fn screenshot(&self, url: &str, viewport: Viewport) -> Result<Vec<u8>> {
        let scratch = TempDir::new().context("failed to create capture scratch directory")?;
        let shot_path = scratch.path().join("screenshot.png");

        let mut command = Command::new(&self.program);
        command.args(self.command_args(&shot_path.display().to_string(), url, viewport));
        run_tool(command, &self.program, url, self.timeout)?;

        if !shot_path.is_file() {
            return Err(ReportError::from(AcquisitionError::ToolFailed {
                program: self.program.clone(),
                target: url.to_string(),
                stderr: "browser exited without writing a screenshot".to_string(),
            })
            .into());
        }

        let image = fs::read(&shot_path)
            .with_context(|| format!("failed to read screenshot: {}", shot_path.display()))?;
        debug!(url = %url, bytes = image.len(), "captured screenshot");
        Ok(image)
    }
}
