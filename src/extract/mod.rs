//! Page extraction: map an arbitrary-length page sequence onto the manifest.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::acquire::SourcePage;
use crate::config::{IndexCollision, ReportConfig, ReportSlot};
use crate::util::{ensure_directory, sha256_bytes, write_atomic};

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState<'a> {
    Resolved(&'a SourcePage),
    Missing { requested: usize, available: usize },
}

#[derive(Debug, Clone)]
pub struct SlotResolution<'a> {
    pub slot: &'a ReportSlot,
    pub state: SlotState<'a>,
}

impl SlotResolution<'_> {
    pub fn is_missing(&self) -> bool {
        matches!(self.state, SlotState::Missing { .. })
    }
}

/// Every manifest slot, in manifest order, with its resolved page or an
/// explicit missing marker.
#[derive(Debug, Clone, Default)]
pub struct SlotAssignment<'a> {
    slots: Vec<SlotResolution<'a>>,
}

impl<'a> SlotAssignment<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &SlotResolution<'a>> {
        self.slots.iter()
    }

    pub fn get(&self, name: &str) -> Option<&SlotResolution<'a>> {
        self.slots.iter().find(|entry| entry.slot.name == name)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn resolved(&self) -> impl Iterator<Item = (&'a ReportSlot, &'a SourcePage)> + '_ {
        self.slots.iter().filter_map(|entry| match entry.state {
            SlotState::Resolved(page) => Some((entry.slot, page)),
            SlotState::Missing { .. } => None,
        })
    }

    pub fn missing(&self) -> impl Iterator<Item = &SlotResolution<'a>> {
        self.slots.iter().filter(|entry| entry.is_missing())
    }
}

/// A source page no slot asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraPage<'a> {
    pub name: String,
    pub page: &'a SourcePage,
}

impl ExtraPage<'_> {
    pub fn image_file_name(&self) -> String {
        format!("{}.png", self.name)
    }
}

#[derive(Debug, Clone)]
pub struct Extraction<'a> {
    pub page_count: usize,
    pub assignment: SlotAssignment<'a>,
    pub extras: Vec<ExtraPage<'a>>,
    pub collisions: Vec<IndexCollision>,
}

impl Extraction<'_> {
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings: Vec<String> = self
            .assignment
            .missing()
            .filter_map(|entry| match entry.state {
                SlotState::Missing {
                    requested,
                    available,
                } => Some(format!(
                    "page {requested} requested for '{}' but source only has {available} pages",
                    entry.slot.label
                )),
                SlotState::Resolved(_) => None,
            })
            .collect();

        warnings.extend(self.collisions.iter().map(|collision| {
            format!(
                "slots {} all claim page {}",
                collision.slots.join(", "),
                collision.index
            )
        }));

        warnings
    }
}

pub fn extra_page_name(index: usize) -> String {
    format!("page_{}", index + 1)
}

/// True for `page_<n>.png`, the file name an extra page is persisted under.
fn is_extra_page_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("png")
        && path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.strip_prefix("page_"))
            .is_some_and(|number| {
                !number.is_empty() && number.bytes().all(|byte| byte.is_ascii_digit())
            })
}

/// Resolves each manifest slot against `pages`. Slots beyond the end of the
/// source are marked missing; pages no slot claims become extras.
pub fn extract<'a>(config: &'a ReportConfig, pages: &'a [SourcePage]) -> Extraction<'a> {
    let available = pages.len();

    let slots = config
        .report_pages
        .iter()
        .map(|slot| {
            let state = match pages.get(slot.expected_index) {
                Some(page) => SlotState::Resolved(page),
                None => {
                    warn!(
                        slot = %slot.label,
                        requested = slot.expected_index,
                        available,
                        "requested page is beyond the source; slot will use a placeholder"
                    );
                    SlotState::Missing {
                        requested: slot.expected_index,
                        available,
                    }
                }
            };
            SlotResolution { slot, state }
        })
        .collect();

    let collisions = config.index_collisions();
    for collision in &collisions {
        warn!(
            index = collision.index,
            slots = %collision.slots.join(", "),
            "multiple slots claim the same source page"
        );
    }

    let claimed: HashSet<usize> = config
        .report_pages
        .iter()
        .map(|slot| slot.expected_index)
        .collect();
    let extras = pages
        .iter()
        .enumerate()
        .filter(|(index, _)| !claimed.contains(index))
        .map(|(index, page)| ExtraPage {
            name: extra_page_name(index),
            page,
        })
        .collect();

    Extraction {
        page_count: available,
        assignment: SlotAssignment { slots },
        extras,
        collisions,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    Slot,
    Extra,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistedImage {
    pub key: String,
    pub kind: ImageKind,
    pub source_page: usize,
    pub path: PathBuf,
    pub sha256: String,
}

/// Writes resolved and extra pages to `images_dir` under their deterministic
/// names. Images left over from an earlier run for slots that are missing now
/// are removed, so composition cannot pick up stale content.
pub fn persist(extraction: &Extraction<'_>, images_dir: &Path) -> Result<Vec<PersistedImage>> {
    ensure_directory(images_dir)?;

    let mut written = Vec::new();
    for (slot, page) in extraction.assignment.resolved() {
        let path = images_dir.join(slot.image_file_name());
        let image = write_page(&path, &slot.name, ImageKind::Slot, page)?;
        info!(
            page = page.index + 1,
            file = %path.display(),
            label = %slot.label,
            "saved slot image"
        );
        written.push(image);
    }

    for entry in extraction.assignment.missing() {
        let stale = images_dir.join(entry.slot.image_file_name());
        if stale.is_file() {
            fs::remove_file(&stale)
                .with_context(|| format!("failed to remove stale image: {}", stale.display()))?;
            warn!(file = %stale.display(), "removed stale image for missing slot");
        }
    }

    remove_stale_extras(extraction, images_dir)?;

    for extra in &extraction.extras {
        let path = images_dir.join(extra.image_file_name());
        let image = write_page(&path, &extra.name, ImageKind::Extra, extra.page)?;
        info!(
            page = extra.page.index + 1,
            file = %path.display(),
            "saved extra page"
        );
        written.push(image);
    }

    info!(
        images = written.len(),
        dir = %images_dir.display(),
        "extraction images saved"
    );
    Ok(written)
}

/// Drops extra-page images from earlier runs that this source no longer has.
fn remove_stale_extras(extraction: &Extraction<'_>, images_dir: &Path) -> Result<()> {
    let current: HashSet<String> = extraction
        .extras
        .iter()
        .map(ExtraPage::image_file_name)
        .collect();

    let entries = fs::read_dir(images_dir)
        .with_context(|| format!("failed to read {}", images_dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read entry in {}", images_dir.display()))?
            .path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !is_extra_page_file(&path) || current.contains(name) || !path.is_file() {
            continue;
        }
        fs::remove_file(&path)
            .with_context(|| format!("failed to remove stale image: {}", path.display()))?;
        warn!(file = %path.display(), "removed stale extra page image");
    }

    Ok(())
}

fn write_page(path: &Path, key: &str, kind: ImageKind, page: &SourcePage) -> Result<PersistedImage> {
    write_atomic(path, &page.image)?;
    Ok(PersistedImage {
        key: key.to_string(),
        kind,
        source_page: page.index,
        path: path.to_path_buf(),
        sha256: sha256_bytes(&page.image),
    })
}
