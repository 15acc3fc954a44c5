//! Base images and the package-manager family each one belongs to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A concrete base OS the generator can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Image {
    Fedora,
    Ubuntu,
    Archlinux,
    Almalinux,
    Debian,
}

/// Package-manager lineage: dnf, apt or pacman.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Fedora,
    Debian,
    Archlinux,
}

impl Image {
    /// Every supported image, in the order the CLI documents them.
    pub const ALL: [Image; 5] = [
        Image::Fedora,
        Image::Ubuntu,
        Image::Archlinux,
        Image::Almalinux,
        Image::Debian,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Image::Fedora => "fedora",
            Image::Ubuntu => "ubuntu",
            Image::Archlinux => "archlinux",
            Image::Almalinux => "almalinux",
            Image::Debian => "debian",
        }
    }

    /// The family whose package names and commands this image uses.
    pub fn family(self) -> Family {
        match self {
            Image::Fedora | Image::Almalinux => Family::Fedora,
            Image::Ubuntu | Image::Debian => Family::Debian,
            Image::Archlinux => Family::Archlinux,
        }
    }
}

impl Family {
    pub const ALL: [Family; 3] = [Family::Fedora, Family::Debian, Family::Archlinux];

    pub fn as_str(self) -> &'static str {
        match self {
            Family::Fedora => "fedora",
            Family::Debian => "debian",
            Family::Archlinux => "archlinux",
        }
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Image {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Image::ALL
            .into_iter()
            .find(|image| image.as_str() == s)
            .ok_or_else(|| crate::Error::InvalidImage {
                image: s.to_owned(),
            })
    }
}

/// Resolve an image identifier straight to its family.
///
/// # Examples
///
/// ```
/// use g4image_core::{Family, resolve};
///
/// assert_eq!(resolve("almalinux").unwrap(), Family::Fedora);
/// assert_eq!(resolve("ubuntu").unwrap(), Family::Debian);
/// assert!(resolve("suse").is_err());
/// ```
pub fn resolve(identifier: &str) -> crate::Result<Family> {
    let image: Image = identifier.parse()?;
    tracing::debug!(%image, family = %image.family(), "resolved image family");
    Ok(image.family())
}

/// Valid identifiers, sorted and comma separated.
pub fn available_images() -> String {
    let mut names: Vec<&str> = Image::ALL.iter().map(|i| i.as_str()).collect();
    names.sort_unstable();
    names.join(", ")
}
