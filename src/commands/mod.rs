use std::path::Path;

use anyhow::Result;

use crate::config::ReportConfig;

pub mod build;
pub mod capture;
pub mod generate;
pub mod status;

/// Loads and validates the config before any command does work.
fn load_config(config_path: &Path) -> Result<ReportConfig> {
    ReportConfig::load(config_path)
}
