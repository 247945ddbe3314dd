//! `imgcluster preview`: normalize one file and print its data URI.

use std::path::Path;

use anyhow::{Context, Result, bail};
use imgcluster_core::config::Config;
use imgcluster_core::pipeline::{FileSource, IntakeController, PathSource};

pub async fn run(path: &Path, config: &Config) -> Result<()> {
    if path.is_dir() {
        bail!("{} is a directory", path.display());
    }

    let mut source = PathSource::new([path.to_path_buf()]);
    let Some(image) = source.select()?.into_iter().next() else {
        bail!("Cannot read {}", path.display());
    };
    if !image.is_image() {
        bail!("{} is not an image ({})", image.name(), image.mime_type());
    }

    let controller = IntakeController::new(config.intake.clone());
    let entry = controller
        .prepare(image)
        .await
        .with_context(|| format!("preview {}", path.display()))?;

    println!("{}", entry.preview);
    Ok(())
}
