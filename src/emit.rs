use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::compose::Deck;
use crate::util::write_atomic;

/// Turns a composed deck into document bytes.
pub trait Emit {
    fn extension(&self) -> &'static str;

    fn emit(&self, deck: &Deck) -> Result<Vec<u8>>;
}

/// Emits the descriptor sequence as a pretty-printed JSON document.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDeck;

impl Emit for JsonDeck {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn emit(&self, deck: &Deck) -> Result<Vec<u8>> {
        let mut data = serde_json::to_vec_pretty(deck).context("failed to serialize deck")?;
        data.push(b'\n');
        Ok(data)
    }
}

pub fn write_document(emitter: &dyn Emit, deck: &Deck, output_dir: &Path) -> Result<PathBuf> {
    let bytes = emitter.emit(deck)?;
    let path = output_dir.join(&deck.filename);
    write_atomic(&path, &bytes)
        .with_context(|| format!("failed to save report: {}", path.display()))?;

    info!(
        path = %path.display(),
        slides = deck.slides.len(),
        bytes = bytes.len(),
        "report saved"
    );
    Ok(path)
}
