use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "g4image.toml";

/// g4image.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct G4ImageConfig {
    #[serde(default)]
    pub versions: Versions,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Versions of the libraries installed outside the package manager.
///
/// These parameterize download URLs and build steps only; they never
/// change which packages the catalog resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versions {
    /// ROOT git tag (built from source on debian-family images)
    #[serde(default = "default_root_version")]
    pub root: String,
    /// Meson release
    #[serde(default = "default_meson_version")]
    pub meson: String,
    /// noVNC release tag
    #[serde(default = "default_novnc_version")]
    pub novnc: String,
    /// Geant4 module version loaded through g4install
    #[serde(default = "default_geant4_version")]
    pub geant4: String,
}

/// Local files copied into the image. Paths are relative to the build context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetsConfig {
    #[serde(default = "default_entrypoint")]
    pub entrypoint: String,
    #[serde(default = "default_novnc_startup")]
    pub novnc_startup: String,
    /// Directory holding the per-family `start-novnc.d` fragments
    #[serde(default = "default_novnc_fragments_dir")]
    pub novnc_fragments_dir: String,
    /// Site root certificate installed into the system trust store
    #[serde(default = "default_ca_certificate")]
    pub ca_certificate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_maintainer")]
    pub maintainer: String,
    #[serde(default)]
    pub sim_home: SimHome,
}

/// Where g4install is cloned inside the image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimHome {
    #[default]
    Cvmfs,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Host suffixes whose downloads are verified against the site certificate
    #[serde(default = "default_site_domains")]
    pub site_domains: Vec<String>,
}

impl Default for Versions {
    fn default() -> Self {
        Self {
            root: default_root_version(),
            meson: default_meson_version(),
            novnc: default_novnc_version(),
            geant4: default_geant4_version(),
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            entrypoint: default_entrypoint(),
            novnc_startup: default_novnc_startup(),
            novnc_fragments_dir: default_novnc_fragments_dir(),
            ca_certificate: default_ca_certificate(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            maintainer: default_maintainer(),
            sim_home: SimHome::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            site_domains: default_site_domains(),
        }
    }
}

impl SimHome {
    pub fn path(self) -> &'static str {
        match self {
            SimHome::Cvmfs => "/cvmfs/oasis.opensciencegrid.org/geant4/g4install",
            SimHome::Local => "/opt/software",
        }
    }
}

impl AssetsConfig {
    /// File name of the certificate, used for the trust-store anchor.
    pub fn ca_certificate_name(&self) -> &str {
        match Path::new(&self.ca_certificate)
            .file_name()
            .and_then(|n| n.to_str())
        {
            Some(name) => name,
            None => &self.ca_certificate,
        }
    }
}

impl G4ImageConfig {
    /// Load from g4image.toml in the given directory, or return defaults if not found.
    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Self::load_file(&config_path)
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load an explicitly named config file. A missing file is an error.
    pub fn load_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| crate::Error::ConfigLoad {
            path: PathBuf::from(path),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
            path: PathBuf::from(path),
            source: e,
        })
    }
}

fn default_root_version() -> String {
    "v6-36-04".to_owned()
}

fn default_meson_version() -> String {
    "1.9.0".to_owned()
}

fn default_novnc_version() -> String {
    "v1.6.0".to_owned()
}

fn default_geant4_version() -> String {
    "11.4.0".to_owned()
}

fn default_entrypoint() -> String {
    "ci/docker-entrypoint.sh".to_owned()
}

fn default_novnc_startup() -> String {
    "ci/novnc/start-novnc.sh".to_owned()
}

fn default_novnc_fragments_dir() -> String {
    "ci/novnc".to_owned()
}

fn default_ca_certificate() -> String {
    "ci/assets/JLabCA.crt".to_owned()
}

fn default_maintainer() -> String {
    "Maurizio Ungaro <ungaro@jlab.org>".to_owned()
}

fn default_site_domains() -> Vec<String> {
    vec![".jlab.org".to_owned(), ".jlab.gov".to_owned()]
}
