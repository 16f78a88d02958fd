use serde::{Deserialize, Serialize};

use crate::compose::Degradation;
use crate::config::IndexCollision;
use crate::extract::PersistedImage;

pub const MANIFEST_VERSION: u32 = 1;
pub const CAPTURE_MANIFEST_FILE: &str = "capture_run.json";
pub const BUILD_MANIFEST_FILE: &str = "build_run.json";

#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub kind: String,
    pub location: String,
    pub sha256: Option<String>,
    pub tool: String,
    pub tool_version: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CapturePaths {
    pub config_path: String,
    pub images_dir: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaptureCounts {
    pub page_count: usize,
    pub slot_count: usize,
    pub resolved_slot_count: usize,
    pub missing_slot_count: usize,
    pub extra_page_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotRecord {
    pub name: String,
    pub label: String,
    pub expected_index: usize,
    pub status: String,
    pub image: Option<PersistedImage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaptureRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub source: SourceInfo,
    pub paths: CapturePaths,
    pub counts: CaptureCounts,
    pub slots: Vec<SlotRecord>,
    pub extra_pages: Vec<PersistedImage>,
    pub collisions: Vec<IndexCollision>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub document_path: String,
    pub date_range: String,
    pub client_name: String,
    pub slide_count: usize,
    pub placeholder_count: usize,
    pub degradations: Vec<Degradation>,
    pub warnings: Vec<String>,
}

/// Loose view of either run manifest, for `status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunSnapshot {
    pub run_id: Option<String>,
    pub status: Option<String>,
    pub updated_at: Option<String>,
    pub command: Option<String>,
    pub document_path: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}
