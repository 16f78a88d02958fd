use std::path::Path;
use std::process::Command;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::acquire::{self, HeadlessChrome, Pdftoppm, Rasterize, Viewport};
use crate::cli::{CaptureArgs, SourceMode};
use crate::config::ReportConfig;
use crate::extract::{self, ImageKind, PersistedImage, SlotState};
use crate::model::{
    CAPTURE_MANIFEST_FILE, CaptureCounts, CapturePaths, CaptureRunManifest, MANIFEST_VERSION,
    SlotRecord, SourceInfo,
};
use crate::util::{now_utc_string, sha256_file, utc_compact_string, write_json_pretty};

pub fn run(config_path: &Path, args: CaptureArgs) -> Result<()> {
    let config = super::load_config(config_path)?;
    capture(config_path, &config, &args)?;
    Ok(())
}

/// Acquires source pages, maps them onto the manifest, persists the images,
/// and records the run. Returns what was written.
pub fn capture(
    config_path: &Path,
    config: &ReportConfig,
    args: &CaptureArgs,
) -> Result<Vec<PersistedImage>> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("capture-{}", utc_compact_string(started_ts));
    let timeout = Duration::from_secs(args.timeout_secs);

    info!(run_id = %run_id, source = args.source.as_str(), "starting capture");

    let (pages, source) = match args.source {
        SourceMode::Pdf => {
            let pdf = acquire::resolve_pdf(args.pdf.as_deref(), &config.config_dir)?;
            let rasterizer = Pdftoppm {
                program: args.pdftoppm.clone(),
                dpi: args.dpi,
                timeout,
            };
            let pages = rasterizer.rasterize(&pdf)?;
            let source = SourceInfo {
                kind: args.source.as_str().to_string(),
                location: pdf.display().to_string(),
                sha256: Some(sha256_file(&pdf)?),
                tool: rasterizer.program.clone(),
                tool_version: command_version_optional(&rasterizer.program, &["-v"]),
            };
            (pages, source)
        }
        SourceMode::Browser => {
            let driver = HeadlessChrome {
                program: args.browser.clone(),
                timeout,
                ..HeadlessChrome::default()
            };
            let viewport = Viewport {
                width: args.viewport_width,
                height: args.viewport_height,
            };
            let pages = acquire::capture_pages(&driver, config, viewport)?;
            let source = SourceInfo {
                kind: args.source.as_str().to_string(),
                location: config.source_url.clone().unwrap_or_default(),
                sha256: None,
                tool: driver.program.clone(),
                tool_version: command_version_optional(&driver.program, &["--version"]),
            };
            (pages, source)
        }
    };

    let extraction = extract::extract(config, &pages);
    let images = extract::persist(&extraction, &config.images_dir)?;
    let warnings = extraction.warnings();

    let slots = extraction
        .assignment
        .iter()
        .map(|entry| SlotRecord {
            name: entry.slot.name.clone(),
            label: entry.slot.label.clone(),
            expected_index: entry.slot.expected_index,
            status: match entry.state {
                SlotState::Resolved(_) => "resolved".to_string(),
                SlotState::Missing { .. } => "missing".to_string(),
            },
            image: images
                .iter()
                .find(|image| image.kind == ImageKind::Slot && image.key == entry.slot.name)
                .cloned(),
        })
        .collect::<Vec<_>>();
    let extra_pages = images
        .iter()
        .filter(|image| image.kind == ImageKind::Extra)
        .cloned()
        .collect::<Vec<_>>();

    let manifest = CaptureRunManifest {
        manifest_version: MANIFEST_VERSION,
        run_id: run_id.clone(),
        status: if warnings.is_empty() {
            "completed".to_string()
        } else {
            "completed_with_warnings".to_string()
        },
        started_at,
        updated_at: now_utc_string(),
        command: render_capture_command(config_path, args),
        source,
        paths: CapturePaths {
            config_path: config_path.display().to_string(),
            images_dir: config.images_dir.display().to_string(),
        },
        counts: CaptureCounts {
            page_count: extraction.page_count,
            slot_count: extraction.assignment.len(),
            resolved_slot_count: extraction.assignment.resolved().count(),
            missing_slot_count: extraction.assignment.missing().count(),
            extra_page_count: extra_pages.len(),
        },
        slots,
        extra_pages,
        collisions: extraction.collisions.clone(),
        warnings,
    };

    let manifest_path = config.manifest_dir().join(CAPTURE_MANIFEST_FILE);
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote capture manifest");

    for warning in &manifest.warnings {
        warn!(warning = %warning, "capture degraded");
    }
    info!(
        pages = manifest.counts.page_count,
        resolved = manifest.counts.resolved_slot_count,
        missing = manifest.counts.missing_slot_count,
        extras = manifest.counts.extra_page_count,
        "capture completed"
    );

    Ok(images)
}

fn command_version_optional(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
}

fn render_capture_command(config_path: &Path, args: &CaptureArgs) -> String {
    let mut command = vec![
        "report-deck".to_string(),
        "capture".to_string(),
        "--config".to_string(),
        config_path.display().to_string(),
        "--source".to_string(),
        args.source.as_str().to_string(),
    ];

    match args.source {
        SourceMode::Pdf => {
            if let Some(path) = &args.pdf {
                command.push("--pdf".to_string());
                command.push(path.display().to_string());
            }
            command.push("--dpi".to_string());
            command.push(args.dpi.to_string());
        }
        SourceMode::Browser => {
            command.push("--browser".to_string());
            command.push(args.browser.clone());
            command.push("--viewport-width".to_string());
            command.push(args.viewport_width.to_string());
            command.push("--viewport-height".to_string());
            command.push(args.viewport_height.to_string());
        }
    }

    command.join(" ")
}
