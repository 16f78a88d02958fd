use std::path::{Path, PathBuf};

use serde::Serialize;

use super::style::SlideStyle;
use crate::config::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideKind {
    Title,
    Section,
    Content,
    Insights,
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextBlock {
    pub heading: Option<String>,
    pub lines: Vec<String>,
    pub color: Rgb,
    pub bold: bool,
    pub align: Align,
}

impl TextBlock {
    pub fn line(text: impl Into<String>, color: Rgb) -> Self {
        Self {
            heading: None,
            lines: vec![text.into()],
            color,
            bold: false,
            align: Align::Left,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlideBody {
    Image {
        path: PathBuf,
    },
    Placeholder {
        diagnostic: String,
        missing: Option<PathBuf>,
        color: Rgb,
    },
    Text {
        blocks: Vec<TextBlock>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideDescriptor {
    pub kind: SlideKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub body: SlideBody,
    pub style: SlideStyle,
}

impl SlideDescriptor {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.body, SlideBody::Placeholder { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingReason {
    /// Extraction had no page for the slot.
    NoSourcePage,
    /// A path was expected but nothing is on disk at render time.
    FileAbsent(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetState {
    Resolved(PathBuf),
    Missing(MissingReason),
}

impl AssetState {
    /// Checks the disk at call time; a path that was resolved earlier but has
    /// since been deleted counts as missing.
    pub fn probe(path: Option<&Path>) -> Self {
        match path {
            Some(path) if path.is_file() => Self::Resolved(path.to_path_buf()),
            Some(path) => Self::Missing(MissingReason::FileAbsent(path.to_path_buf())),
            None => Self::Missing(MissingReason::NoSourcePage),
        }
    }
}

impl MissingReason {
    pub fn diagnostic(&self) -> String {
        match self {
            Self::NoSourcePage => "Screenshot not found: N/A".to_string(),
            Self::FileAbsent(path) => format!("Screenshot not found: {}", path.display()),
        }
    }

    pub fn missing_path(&self) -> Option<&Path> {
        match self {
            Self::NoSourcePage => None,
            Self::FileAbsent(path) => Some(path),
        }
    }
}

/// The one place a content slide's body is derived from its asset state.
pub fn content_body(state: &AssetState, placeholder_color: Rgb) -> SlideBody {
    match state {
        AssetState::Resolved(path) => SlideBody::Image { path: path.clone() },
        AssetState::Missing(reason) => SlideBody::Placeholder {
            diagnostic: reason.diagnostic(),
            missing: reason.missing_path().map(Path::to_path_buf),
            color: placeholder_color,
        },
    }
}
