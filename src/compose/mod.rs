//! Slide composition: the ordered, styled slide sequence for one report.
//!
//! Composition never fails on a missing image. Each content slide carries an
//! [`AssetState`], and a missing asset turns into a placeholder body plus a
//! [`Degradation`] entry on the deck.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ReportConfig, ReportSlot};
use crate::extract::{ImageKind, PersistedImage};

mod slide;
mod style;
#[cfg(test)]
mod tests;

pub use slide::{
    Align, AssetState, SlideBody, SlideDescriptor, SlideKind, TextBlock, content_body,
};
pub use style::Palette;

pub const REPORT_PERIOD_DAYS: u64 = 14;
pub const INSIGHTS_TITLE: &str = "Key Insights & Next Steps";
pub const INSIGHT_PLACEHOLDERS: [&str; 3] = [
    "Your top spending category this period was [Category] at $[Amount]",
    "You are [X%] through your monthly budget with [Y%] of the month remaining",
    "Spending in [Category] increased [X%] compared to last period",
];
pub const ACTION_PLACEHOLDERS: [&str; 3] = [
    "Review [Category] spending for savings opportunities",
    "Consider adjusting budget for [Category] based on trends",
    "Schedule check-in to discuss [specific topic]",
];

/// Where each slot's image is expected to live.
#[derive(Debug, Clone, Default)]
pub struct SlotImages {
    paths: HashMap<String, PathBuf>,
}

impl SlotImages {
    /// Images written by a capture in this run. Slots extraction could not
    /// resolve have no entry.
    pub fn from_persisted(images: &[PersistedImage]) -> Self {
        let paths = images
            .iter()
            .filter(|image| image.kind == ImageKind::Slot)
            .map(|image| (image.key.clone(), image.path.clone()))
            .collect();
        Self { paths }
    }

    /// Conventional locations in the images directory, for composing from a
    /// previous capture. Whether the files exist is checked at render time.
    pub fn from_images_dir(config: &ReportConfig, images_dir: &Path) -> Self {
        let paths = config
            .report_pages
            .iter()
            .map(|slot| (slot.name.clone(), images_dir.join(slot.image_file_name())))
            .collect();
        Self { paths }
    }

    pub fn get(&self, slot: &str) -> Option<&Path> {
        self.paths.get(slot).map(PathBuf::as_path)
    }
}

#[derive(Debug, Clone)]
pub struct ComposeOptions {
    pub date_range: Option<String>,
    pub client_name: Option<String>,
    pub today: NaiveDate,
    pub extension: String,
}

/// A slot whose slide was composed with a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Degradation {
    pub slot: String,
    pub label: String,
    pub diagnostic: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Deck {
    pub filename: String,
    pub date_range: String,
    pub client_name: String,
    pub palette: Palette,
    pub slides: Vec<SlideDescriptor>,
    pub degradations: Vec<Degradation>,
}

pub fn compose(config: &ReportConfig, images: &SlotImages, options: &ComposeOptions) -> Deck {
    let palette = Palette::from(&config.brand_colors);
    let date_range = non_blank(options.date_range.as_deref())
        .unwrap_or_else(|| default_date_range(options.today));
    let client_name = non_blank(options.client_name.as_deref())
        .unwrap_or_else(|| config.client_name.clone());

    let mut slides = Vec::with_capacity(config.report_pages.len() + 3);
    let mut degradations = Vec::new();

    info!("building title slide");
    slides.push(title_slide(config, &palette, &date_range, &client_name));

    let mut current_section: Option<&str> = None;
    for slot in &config.report_pages {
        if let Some(section) = slot.section.as_deref()
            && current_section != Some(section)
        {
            info!(section = %section, "building section slide");
            slides.push(section_slide(&palette, section));
            current_section = Some(section);
        }

        info!(slot = %slot.name, label = %slot.label, "building content slide");
        let state = AssetState::probe(images.get(&slot.name));
        if let AssetState::Missing(reason) = &state {
            let diagnostic = reason.diagnostic();
            warn!(slot = %slot.name, diagnostic = %diagnostic, "slide degraded to placeholder");
            degradations.push(Degradation {
                slot: slot.name.clone(),
                label: slot.label.clone(),
                diagnostic,
            });
        }
        slides.push(content_slide(&palette, slot, &state));
    }

    info!("building insights slide");
    slides.push(insights_slide(&palette));

    info!("building closing slide");
    slides.push(closing_slide(config, &palette));

    Deck {
        filename: output_filename(
            &config.filename_prefix,
            &client_name,
            options.today,
            &options.extension,
        ),
        date_range,
        client_name,
        palette,
        slides,
        degradations,
    }
}

/// The reporting fortnight ending on `today`, e.g. `Jan 01 - Jan 15, 2026`.
pub fn default_date_range(today: NaiveDate) -> String {
    let start = today
        .checked_sub_days(Days::new(REPORT_PERIOD_DAYS))
        .unwrap_or(today);
    format!("{} - {}", start.format("%b %d"), today.format("%b %d, %Y"))
}

pub fn output_filename(prefix: &str, client_name: &str, date: NaiveDate, extension: &str) -> String {
    let safe_client = client_name
        .replace(' ', "_")
        .replace('.', "")
        .replace(['/', '\\'], "_");
    format!("{prefix}_{safe_client}_{}.{extension}", date.format("%Y-%m-%d"))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

fn title_slide(
    config: &ReportConfig,
    palette: &Palette,
    date_range: &str,
    client_name: &str,
) -> SlideDescriptor {
    let mut blocks = vec![TextBlock::line(&config.business_name, palette.accent)];
    if !client_name.is_empty() {
        blocks.push(TextBlock::line(
            format!("Prepared for {client_name}"),
            palette.light,
        ));
    }
    blocks.push(TextBlock::line(
        format!("Prepared by {}", config.consultant_name),
        palette.slate,
    ));

    SlideDescriptor {
        kind: SlideKind::Title,
        title: config.report_title.clone(),
        subtitle: Some(date_range.to_string()),
        body: SlideBody::Text { blocks },
        style: palette.feature_style(),
    }
}

fn section_slide(palette: &Palette, section: &str) -> SlideDescriptor {
    SlideDescriptor {
        kind: SlideKind::Section,
        title: section.to_string(),
        subtitle: None,
        body: SlideBody::Text { blocks: Vec::new() },
        style: palette.feature_style(),
    }
}

fn content_slide(palette: &Palette, slot: &ReportSlot, state: &AssetState) -> SlideDescriptor {
    SlideDescriptor {
        kind: SlideKind::Content,
        title: slot.label.clone(),
        subtitle: slot.description.clone(),
        body: content_body(state, palette.slate),
        style: palette.body_style(),
    }
}

fn insights_slide(palette: &Palette) -> SlideDescriptor {
    let list = |heading: &str, items: &[&str]| TextBlock {
        heading: Some(heading.to_string()),
        lines: items.iter().map(|item| item.to_string()).collect(),
        color: palette.text,
        bold: false,
        align: Align::Left,
    };

    SlideDescriptor {
        kind: SlideKind::Insights,
        title: INSIGHTS_TITLE.to_string(),
        subtitle: None,
        body: SlideBody::Text {
            blocks: vec![
                list("Insights", &INSIGHT_PLACEHOLDERS),
                list("Recommended Actions", &ACTION_PLACEHOLDERS),
            ],
        },
        style: palette.body_style(),
    }
}

fn closing_slide(config: &ReportConfig, palette: &Palette) -> SlideDescriptor {
    SlideDescriptor {
        kind: SlideKind::Closing,
        title: "Thank You".to_string(),
        subtitle: Some("Questions? Reach out anytime.".to_string()),
        body: SlideBody::Text {
            blocks: vec![
                TextBlock::line(&config.consultant_name, palette.accent)
                    .bold()
                    .centered(),
                TextBlock::line(&config.business_name, palette.light).centered(),
            ],
        },
        style: palette.feature_style(),
    }
}
