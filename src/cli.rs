use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "report-deck",
    version,
    about = "Turn dashboard exports into branded client report decks"
)]
pub struct Cli {
    /// Report configuration (branding and page manifest).
    #[arg(long, global = true, default_value = "config.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rasterize or capture the dashboard and save one image per report page.
    Capture(CaptureArgs),
    /// Build the deck from previously captured images.
    Build(BuildArgs),
    /// Capture, then build.
    Generate(GenerateArgs),
    /// Show which report images exist and summarize the last runs.
    Status,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SourceMode {
    Pdf,
    Browser,
}

impl SourceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Browser => "browser",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CaptureArgs {
    /// PDF export to rasterize; defaults to the only PDF beside the config.
    #[arg(long)]
    pub pdf: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = SourceMode::Pdf)]
    pub source: SourceMode,

    #[arg(long, default_value_t = crate::acquire::DEFAULT_DPI)]
    pub dpi: u32,

    #[arg(long, default_value = "pdftoppm")]
    pub pdftoppm: String,

    #[arg(long, default_value = "chromium")]
    pub browser: String,

    /// Browser window width for screenshots.
    #[arg(long, default_value_t = 1600)]
    pub viewport_width: u32,

    #[arg(long, default_value_t = 1200)]
    pub viewport_height: u32,

    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Date range shown on the title slide, e.g. "Jan 1 - Jan 15, 2026".
    #[arg(long)]
    pub date_range: Option<String>,

    /// Client name; overrides the config.
    #[arg(long)]
    pub client: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub capture: CaptureArgs,

    #[command(flatten)]
    pub build: BuildArgs,

    /// Reuse the images already in the images directory.
    #[arg(long, default_value_t = false)]
    pub skip_capture: bool,
}
