use std::path::PathBuf;

use log::info;

use crate::error::{ClaimError, Result};
use crate::loader::load_dataset;
use crate::settings::{load_settings, save_settings, shellexpand_path};

/// Validate a dataset by loading it, then make it the default.
pub fn run(path: &str) -> Result<()> {
    let resolved = PathBuf::from(shellexpand_path(path));
    if !resolved.exists() {
        return Err(ClaimError::Settings(format!(
            "No dataset found at {}",
            resolved.display()
        )));
    }
    let resolved = resolved.canonicalize()?;
    let dataset = load_dataset(&resolved)?;

    let mut settings = load_settings();
    settings.data_path = resolved.to_string_lossy().to_string();
    save_settings(&settings)?;
    info!("default dataset set to {}", resolved.display());

    println!("Switched to {} ({} rows)", resolved.display(), dataset.len());
    Ok(())
}
