//! Report configuration: branding plus the ordered manifest of report slots.
//!
//! The JSON file is deserialized into loose `Raw*` shapes first and then
//! validated into [`ReportConfig`], so every problem is reported against the
//! offending field before any page is touched.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::error::{ReportError, ReportResult};


pub const DEFAULT_REPORT_TITLE: &str = "Financial Review";
pub const DEFAULT_FILENAME_PREFIX: &str = "Financial_Review";
pub const PAGE_PLACEHOLDER: &str = "{page}";

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#?([0-9A-Fa-f]{6})$").expect("static hex color regex"));
/// Names persisted for pages no slot claims; slots may not use them.
static EXTRA_PAGE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^page_\d+$").expect("static extra page name regex"));
static UNRESOLVED_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"YOUR_[A-Z_]+|<[^>]*>").expect("static placeholder regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn parse_hex(raw: &str) -> Option<Self> {
        let captures = HEX_COLOR.captures(raw.trim())?;
        let digits = captures.get(1)?.as_str();
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BrandColors {
    pub primary: Rgb,
    pub accent: Rgb,
    pub dark: Rgb,
    pub light: Rgb,
    pub text: Rgb,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSlot {
    pub name: String,
    pub label: String,
    pub description: Option<String>,
    pub expected_index: usize,
    pub section: Option<String>,
}

impl ReportSlot {
    pub fn image_file_name(&self) -> String {
        format!("{}.png", self.name)
    }
}

/// Two or more slots that point at the same source page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexCollision {
    pub index: usize,
    pub slots: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub business_name: String,
    pub client_name: String,
    pub consultant_name: String,
    pub report_title: String,
    pub filename_prefix: String,
    pub config_dir: PathBuf,
    pub output_dir: PathBuf,
    pub images_dir: PathBuf,
    pub source_url: Option<String>,
    pub brand_colors: BrandColors,
    pub report_pages: Vec<ReportSlot>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    business_name: String,
    client_name: String,
    consultant_name: String,
    report_title: Option<String>,
    filename_prefix: Option<String>,
    output_dir: Option<PathBuf>,
    images_dir: Option<PathBuf>,
    source_url: Option<String>,
    brand_colors: Option<RawBrandColors>,
    report_pages: Vec<RawSlot>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawBrandColors {
    primary: String,
    accent: String,
    dark: String,
    light: String,
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSlot {
    name: String,
    label: String,
    description: Option<String>,
    #[serde(alias = "page_index")]
    expected_index: Option<i64>,
    section: Option<String>,
}

impl ReportConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let base_dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let config = Self::from_json_slice(&raw, &base_dir)
            .with_context(|| format!("invalid config file: {}", path.display()))?;
        debug!(
            path = %path.display(),
            slots = config.report_pages.len(),
            "loaded report config"
        );
        Ok(config)
    }

    pub fn from_json_slice(raw: &[u8], base_dir: &Path) -> ReportResult<Self> {
        let parsed: RawConfig = serde_json::from_slice(raw)
            .map_err(|err| ReportError::config("config", err.to_string()))?;
        Self::from_raw(parsed, base_dir)
    }

    fn from_raw(raw: RawConfig, base_dir: &Path) -> ReportResult<Self> {
        let business_name = required_text("business_name", raw.business_name)?;
        let client_name = required_text("client_name", raw.client_name)?;
        let consultant_name = required_text("consultant_name", raw.consultant_name)?;

        let colors = raw
            .brand_colors
            .ok_or_else(|| ReportError::config("brand_colors", "required field is missing"))?;
        let brand_colors = BrandColors {
            primary: parse_color("brand_colors.primary", &colors.primary)?,
            accent: parse_color("brand_colors.accent", &colors.accent)?,
            dark: parse_color("brand_colors.dark", &colors.dark)?,
            light: parse_color("brand_colors.light", &colors.light)?,
            text: parse_color("brand_colors.text", &colors.text)?,
        };

        let report_pages = validate_slots(raw.report_pages)?;

        let output_dir = base_dir.join(raw.output_dir.unwrap_or_else(|| PathBuf::from("output")));
        let images_dir = raw
            .images_dir
            .map(|dir| base_dir.join(dir))
            .unwrap_or_else(|| output_dir.join("images"));

        Ok(Self {
            business_name,
            client_name,
            consultant_name,
            report_title: non_empty(raw.report_title)
                .unwrap_or_else(|| DEFAULT_REPORT_TITLE.to_string()),
            filename_prefix: non_empty(raw.filename_prefix)
                .unwrap_or_else(|| DEFAULT_FILENAME_PREFIX.to_string()),
            config_dir: base_dir.to_path_buf(),
            output_dir,
            images_dir,
            source_url: non_empty(raw.source_url),
            brand_colors,
            report_pages,
        })
    }

    pub fn manifest_dir(&self) -> PathBuf {
        self.output_dir.join("manifests")
    }

    /// Number of source pages the manifest expects to exist.
    pub fn required_page_count(&self) -> usize {
        self.report_pages
            .iter()
            .map(|slot| slot.expected_index + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn index_collisions(&self) -> Vec<IndexCollision> {
        let mut by_index: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for slot in &self.report_pages {
            by_index
                .entry(slot.expected_index)
                .or_default()
                .push(slot.name.clone());
        }

        by_index
            .into_iter()
            .filter(|(_, slots)| slots.len() > 1)
            .map(|(index, slots)| IndexCollision { index, slots })
            .collect()
    }

    /// Checks the capture URL. Only live capture needs it, so this is not part
    /// of the load-time validation.
    pub fn validate_source_url(&self) -> ReportResult<&str> {
        let url = self
            .source_url
            .as_deref()
            .ok_or_else(|| ReportError::config("source_url", "required for browser capture"))?;

        if let Some(found) = UNRESOLVED_URL.find(url) {
            return Err(ReportError::config(
                "source_url",
                format!("contains unresolved placeholder `{}`", found.as_str()),
            ));
        }
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ReportError::config(
                "source_url",
                "must start with http:// or https://",
            ));
        }
        if self.required_page_count() > 1 && !url.contains(PAGE_PLACEHOLDER) {
            return Err(ReportError::config(
                "source_url",
                format!(
                    "manifest spans {} pages but the URL has no {PAGE_PLACEHOLDER} template",
                    self.required_page_count()
                ),
            ));
        }

        Ok(url)
    }
}

fn required_text(field: &str, value: String) -> ReportResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ReportError::config(field, "required field is missing or empty"));
    }
    Ok(trimmed.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_color(field: &str, raw: &str) -> ReportResult<Rgb> {
    if raw.trim().is_empty() {
        return Err(ReportError::config(field, "required field is missing or empty"));
    }
    Rgb::parse_hex(raw)
        .ok_or_else(|| ReportError::config(field, format!("expected #rrggbb, got `{raw}`")))
}

fn validate_slots(raw_slots: Vec<RawSlot>) -> ReportResult<Vec<ReportSlot>> {
    if raw_slots.is_empty() {
        return Err(ReportError::config(
            "report_pages",
            "at least one report page is required",
        ));
    }

    let mut seen = HashSet::with_capacity(raw_slots.len());
    let mut slots = Vec::with_capacity(raw_slots.len());

    for (position, raw) in raw_slots.into_iter().enumerate() {
        let field = |name: &str| format!("report_pages[{position}].{name}");

        let name = raw.name.trim().to_string();
        if name.is_empty() {
            return Err(ReportError::config(field("name"), "must not be empty"));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ReportError::config(
                field("name"),
                format!("`{name}` is not usable as a file name"),
            ));
        }
        if EXTRA_PAGE_NAME.is_match(&name) {
            return Err(ReportError::config(
                field("name"),
                format!("`{name}` is reserved for unassigned source pages"),
            ));
        }
        if !seen.insert(name.clone()) {
            return Err(ReportError::config(
                field("name"),
                format!("duplicate slot name `{name}`"),
            ));
        }

        let label = raw.label.trim().to_string();
        if label.is_empty() {
            return Err(ReportError::config(field("label"), "must not be empty"));
        }

        let index = raw
            .expected_index
            .ok_or_else(|| ReportError::config(field("expected_index"), "required field is missing"))?;
        let expected_index = usize::try_from(index).map_err(|_| {
            ReportError::config(
                field("expected_index"),
                format!("must be non-negative, got {index}"),
            )
        })?;

        slots.push(ReportSlot {
            name,
            label,
            description: non_empty(raw.description),
            expected_index,
            section: non_empty(raw.section),
        });
    }

    Ok(slots)
}
