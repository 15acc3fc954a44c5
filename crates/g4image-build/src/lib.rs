//! Dockerfile generation for g4image.
//!
//! # Assembly order
//!
//! ```text
//! g4image dockerfile -i <image> -t <tag>
//!   1. Header       ── FROM, maintainer label, SHELL, ENTRYPOINT/CMD
//!   2. Setup files  ── entrypoint + noVNC startup scripts
//!   3. CA trust     ── site certificate into the family trust store
//!   4. Preamble     ── extra repositories / keyring refresh
//!   5. Packages     ── one package-manager invocation, log captured
//!   6. Cleanup      ── cache purge chained onto the install RUN
//!   7. Libraries    ── ROOT, Meson, noVNC, g4install, Geant4
//! ```
//!
//! Every stage produces [`Block`]s of [`BuildStep`] values; a single
//! formatter ([`render_blocks`]) turns them into text. Nothing is executed.

pub mod dockerfile;
pub mod install;
pub mod libraries;
pub mod output;
pub mod step;

pub use dockerfile::{DockerfileGenerator, create_dockerfile};
pub use install::{InstallCommand, cleanup_commands, install_command};
pub use libraries::{LibraryInstaller, additional_libraries};
pub use step::{Block, BuildStep, Dockerfile, Stage, render_blocks};
