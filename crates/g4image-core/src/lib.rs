//! Core types and configuration for g4image.
//!
//! This crate defines the supported base images ([`Image`]) and the
//! package-manager lineage they resolve to ([`Family`]), the static
//! package table ([`Catalog`]), the `g4image.toml` schema
//! ([`G4ImageConfig`]), and shared error types.

pub mod catalog;
pub mod config;
pub mod error;
pub mod image;

pub use catalog::{Catalog, PackageSection, RewriteRule, packages_for};
pub use config::{AssetsConfig, G4ImageConfig, ImageConfig, NetworkConfig, SimHome, Versions};
pub use error::{Error, Result};
pub use image::{Family, Image, available_images, resolve};
