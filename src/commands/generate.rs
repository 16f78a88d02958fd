use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::cli::GenerateArgs;
use crate::compose::SlotImages;

use super::{build, capture};

pub fn run(config_path: &Path, args: GenerateArgs) -> Result<()> {
    let config = super::load_config(config_path)?;

    let images = if args.skip_capture {
        info!(images_dir = %config.images_dir.display(), "skipping capture; using existing images");
        SlotImages::from_images_dir(&config, &config.images_dir)
    } else {
        info!("step 1: capturing dashboard pages");
        let persisted = capture::capture(config_path, &config, &args.capture)?;
        SlotImages::from_persisted(&persisted)
    };

    info!("step 2: building deck");
    let document = build::build(config_path, &config, &images, &args.build)?;

    info!(path = %document.display(), "report generated");
    Ok(())
}
