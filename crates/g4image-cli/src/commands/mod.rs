mod dockerfile;
mod images;
mod libraries;
mod packages;

use std::path::Path;

use clap::Args;
use g4image_core::{G4ImageConfig, Image};

pub use dockerfile::dockerfile;
pub use images::images;
pub use libraries::libraries;
pub use packages::{PackageFormat, packages};

/// Version overrides for libraries installed outside the package manager.
#[derive(Args, Debug, Default)]
pub struct VersionArgs {
    /// ROOT git tag to build (default: v6-36-04)
    #[arg(long)]
    pub root_version: Option<String>,
    /// Meson release to install (default: 1.9.0)
    #[arg(long)]
    pub meson_version: Option<String>,
    /// noVNC release tag to install (default: v1.6.0)
    #[arg(long)]
    pub novnc_version: Option<String>,
    /// Geant4 version to install (default: 11.4.0)
    #[arg(long)]
    pub geant4_version: Option<String>,
}

impl VersionArgs {
    /// Flags take precedence over the config file.
    fn apply(&self, config: &mut G4ImageConfig) {
        let overrides = [
            (&self.root_version, &mut config.versions.root),
            (&self.meson_version, &mut config.versions.meson),
            (&self.novnc_version, &mut config.versions.novnc),
            (&self.geant4_version, &mut config.versions.geant4),
        ];
        for (flag, slot) in overrides {
            if let Some(version) = flag {
                slot.clone_from(version);
            }
        }
    }
}

/// Validate the image identifier before anything else runs.
pub(crate) fn parse_image(identifier: &str) -> anyhow::Result<Image> {
    Ok(identifier.parse::<Image>()?)
}

/// Explicit `--config` path, else `./g4image.toml` if present, else defaults.
pub(crate) fn load_config(
    config_path: Option<&Path>,
    versions: &VersionArgs,
) -> anyhow::Result<G4ImageConfig> {
    let mut config = match config_path {
        Some(path) => G4ImageConfig::load_file(path)?,
        None => G4ImageConfig::load(Path::new("."))?,
    };
    versions.apply(&mut config);
    tracing::debug!(?config.versions, "effective versions");
    Ok(config)
}
