use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::model::{BUILD_MANIFEST_FILE, CAPTURE_MANIFEST_FILE, RunSnapshot};

pub fn run(config_path: &Path) -> Result<()> {
    let config = super::load_config(config_path)?;
    let manifest_dir = config.manifest_dir();

    info!(
        config = %config_path.display(),
        images_dir = %config.images_dir.display(),
        "status requested"
    );

    let mut missing = 0_usize;
    for slot in &config.report_pages {
        let path = config.images_dir.join(slot.image_file_name());
        if path.is_file() {
            info!(slot = %slot.name, label = %slot.label, file = %path.display(), "image present");
        } else {
            missing += 1;
            warn!(slot = %slot.name, label = %slot.label, file = %path.display(), "image missing");
        }
    }
    info!(
        slots = config.report_pages.len(),
        missing,
        "slot image summary"
    );

    for file in [CAPTURE_MANIFEST_FILE, BUILD_MANIFEST_FILE] {
        let path = manifest_dir.join(file);
        match load_snapshot(&path)? {
            Some(snapshot) => {
                info!(
                    manifest = %file,
                    run_id = %snapshot.run_id.unwrap_or_default(),
                    status = %snapshot.status.unwrap_or_default(),
                    updated_at = %snapshot.updated_at.unwrap_or_default(),
                    command = %snapshot.command.unwrap_or_default(),
                    document = %snapshot.document_path.unwrap_or_default(),
                    warnings = snapshot.warnings.len(),
                    "loaded run manifest"
                );
                for warning in &snapshot.warnings {
                    warn!(manifest = %file, warning = %warning, "recorded degradation");
                }
            }
            None => warn!(path = %path.display(), "run manifest missing"),
        }
    }

    Ok(())
}

fn load_snapshot(path: &Path) -> Result<Option<RunSnapshot>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let snapshot = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(snapshot))
}
