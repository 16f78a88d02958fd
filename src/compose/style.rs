use serde::Serialize;

use crate::config::{BrandColors, Rgb};

pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);
pub const SLATE: Rgb = Rgb::new(0x64, 0x74, 0x8B);

/// The closed palette every slide draws from: five brand colors and two
/// fixed neutrals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub primary: Rgb,
    pub accent: Rgb,
    pub dark: Rgb,
    pub light: Rgb,
    pub text: Rgb,
    pub white: Rgb,
    pub slate: Rgb,
}

impl From<&BrandColors> for Palette {
    fn from(colors: &BrandColors) -> Self {
        Self {
            primary: colors.primary,
            accent: colors.accent,
            dark: colors.dark,
            light: colors.light,
            text: colors.text,
            white: WHITE,
            slate: SLATE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlideStyle {
    pub background: Rgb,
    pub title_color: Rgb,
    pub subtitle_color: Rgb,
    /// Band behind the title on light slides.
    pub header_bar: Option<Rgb>,
    /// Thin rules along the top and bottom edges.
    pub edge_rule: Rgb,
}

impl Palette {
    /// Title, section and closing slides.
    pub fn feature_style(&self) -> SlideStyle {
        SlideStyle {
            background: self.primary,
            title_color: self.white,
            subtitle_color: self.light,
            header_bar: None,
            edge_rule: self.accent,
        }
    }

    /// Content and insights slides.
    pub fn body_style(&self) -> SlideStyle {
        SlideStyle {
            background: self.light,
            title_color: self.white,
            subtitle_color: self.slate,
            header_bar: Some(self.primary),
            edge_rule: self.accent,
        }
    }
}
