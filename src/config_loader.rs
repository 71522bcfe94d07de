use crate::config::Settings;
use crate::resource::Manifest;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load and validate conversion settings from a YAML file
pub fn load_settings(settings_path: &Path) -> Result<Settings> {
    info!("Loading settings from: {:?}", settings_path);

    let file = File::open(settings_path)
        .wrap_err_with(|| format!("Failed to open settings file '{}'", settings_path.display()))?;

    let settings: Settings = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse settings file '{}'", settings_path.display()))?;

    settings.validate()?;

    Ok(settings)
}

/// Load a resource manifest. YAML and JSON are both accepted.
pub fn load_manifest(manifest_path: &Path) -> Result<Manifest> {
    info!("Loading resource manifest from: {:?}", manifest_path);

    let file = File::open(manifest_path)
        .wrap_err_with(|| format!("Failed to open manifest '{}'", manifest_path.display()))?;

    let manifest: Manifest = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse manifest '{}'", manifest_path.display()))?;

    info!("Manifest declares {} resources", manifest.resources.len());

    Ok(manifest)
}
