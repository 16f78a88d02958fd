use std::path::PathBuf;

use thiserror::Error;

pub type ReportResult<T> = Result<T, ReportError>;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("invalid configuration field `{field}`: {message}")]
    Config { field: String, message: String },

    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),
}

impl ReportError {
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failures while obtaining source pages. Fatal for the run; messages carry
/// the remediation an operator needs.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error(
        "no PDF found in {dir}\n\nTo fix:\n  1. Export the dashboard with File > Download > PDF\n  2. Save the PDF into {dir}\n  3. Run again, or pass --pdf \"path/to/report.pdf\""
    )]
    NoSource { dir: PathBuf },

    #[error("PDF not found: {path}")]
    MissingPdf { path: PathBuf },

    #[error(
        "multiple PDF files found in {dir}:\n{listing}\n\nSpecify which one with --pdf \"filename.pdf\"",
        listing = render_candidates(.candidates)
    )]
    Ambiguous {
        dir: PathBuf,
        candidates: Vec<PathBuf>,
    },

    #[error("{program} failed for {target}: {stderr}")]
    ToolFailed {
        program: String,
        target: String,
        stderr: String,
    },

    #[error("{program} timed out after {seconds}s for {target}")]
    Timeout {
        program: String,
        target: String,
        seconds: u64,
    },

    #[error("{program} produced no pages for {target}")]
    NoPages { program: String, target: String },
}

fn render_candidates(candidates: &[PathBuf]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(index, path)| {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            format!("  {}. {}", index + 1, name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
