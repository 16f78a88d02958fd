use std::path::Path;

use crate::acquire::SourcePage;
use crate::config::ReportConfig;

pub const SLOT_NAMES: [&str; 6] = [
    "overview",
    "categories",
    "trends",
    "budget",
    "merchants",
    "cash_flow",
];

/// A valid config whose manifest declares one slot per entry of `indices`.
pub fn config_with_indices(indices: &[usize], base_dir: &Path) -> ReportConfig {
    let pages: Vec<String> = indices
        .iter()
        .enumerate()
        .map(|(position, index)| {
            let name = SLOT_NAMES
                .get(position)
                .map(|name| name.to_string())
                .unwrap_or_else(|| format!("slot_{position}"));
            format!(
                r#"{{"name": "{name}", "label": "Label {name}", "description": "About {name}", "expected_index": {index}}}"#
            )
        })
        .collect();

    let json = format!(
        r##"{{
          "business_name": "Clarity Finance",
          "client_name": "Sarah M.",
          "consultant_name": "Jordan Lee",
          "output_dir": "output",
          "brand_colors": {{
            "primary": "#2b6777",
            "accent": "#f2a541",
            "dark": "#1b3a4b",
            "light": "#f4f7f6",
            "text": "#333333"
          }},
          "report_pages": [{}]
        }}"##,
        pages.join(",")
    );

    ReportConfig::from_json_slice(json.as_bytes(), base_dir).expect("fixture config is valid")
}

pub fn source_pages(count: usize) -> Vec<SourcePage> {
    (0..count)
        .map(|index| SourcePage {
            index,
            image: format!("\u{89}PNG fake page {}", index + 1).into_bytes(),
        })
        .collect()
}
