use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{Local, Utc};
use tracing::{info, warn};

use crate::cli::BuildArgs;
use crate::compose::{self, ComposeOptions, SlotImages};
use crate::config::ReportConfig;
use crate::emit::{self, Emit, JsonDeck};
use crate::model::{BUILD_MANIFEST_FILE, BuildRunManifest, MANIFEST_VERSION};
use crate::util::{now_utc_string, utc_compact_string, write_json_pretty};

pub fn run(config_path: &Path, args: BuildArgs) -> Result<()> {
    let config = super::load_config(config_path)?;
    let images = SlotImages::from_images_dir(&config, &config.images_dir);
    build(config_path, &config, &images, &args)?;
    Ok(())
}

/// Composes the deck from `images`, emits it, and records the run.
pub fn build(
    config_path: &Path,
    config: &ReportConfig,
    images: &SlotImages,
    args: &BuildArgs,
) -> Result<PathBuf> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("build-{}", utc_compact_string(started_ts));
    let emitter = JsonDeck;

    info!(run_id = %run_id, images_dir = %config.images_dir.display(), "starting build");

    let options = ComposeOptions {
        date_range: args.date_range.clone(),
        client_name: args.client.clone(),
        today: Local::now().date_naive(),
        extension: emitter.extension().to_string(),
    };
    let deck = compose::compose(config, images, &options);
    let document_path = emit::write_document(&emitter, &deck, &config.output_dir)?;

    let warnings: Vec<String> = deck
        .degradations
        .iter()
        .map(|degradation| format!("{}: {}", degradation.label, degradation.diagnostic))
        .collect();

    let manifest = BuildRunManifest {
        manifest_version: MANIFEST_VERSION,
        run_id,
        status: if warnings.is_empty() {
            "completed".to_string()
        } else {
            "completed_with_warnings".to_string()
        },
        started_at,
        updated_at: now_utc_string(),
        command: render_build_command(config_path, args),
        document_path: document_path.display().to_string(),
        date_range: deck.date_range.clone(),
        client_name: deck.client_name.clone(),
        slide_count: deck.slides.len(),
        placeholder_count: deck.slides.iter().filter(|slide| slide.is_placeholder()).count(),
        degradations: deck.degradations.clone(),
        warnings,
    };

    let manifest_path = config.manifest_dir().join(BUILD_MANIFEST_FILE);
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote build manifest");

    if manifest.placeholder_count > 0 {
        warn!(
            placeholders = manifest.placeholder_count,
            "some slides use placeholders; re-run capture to fill them"
        );
    }
    info!(
        path = %document_path.display(),
        slides = manifest.slide_count,
        "build completed"
    );

    Ok(document_path)
}

fn render_build_command(config_path: &Path, args: &BuildArgs) -> String {
    let mut command = vec![
        "report-deck".to_string(),
        "build".to_string(),
        "--config".to_string(),
        config_path.display().to_string(),
    ];

    if let Some(date_range) = &args.date_range {
        command.push("--date-range".to_string());
        command.push(format!("\"{date_range}\""));
    }
    if let Some(client) = &args.client {
        command.push("--client".to_string());
        command.push(format!("\"{client}\""));
    }

    command.join(" ")
}
