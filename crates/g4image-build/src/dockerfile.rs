use g4image_core::{Catalog, Family, G4ImageConfig, Image};

use crate::install::{cleanup_commands, install_command};
use crate::libraries::LibraryInstaller;
use crate::step::{Block, BuildStep, Dockerfile, Stage};

/// Directory the startup scripts are installed into.
pub const REMOTE_STARTUP_DIR: &str = "/usr/local/bin";

/// Directory of the system trust store that picks up extra root certificates.
pub fn trust_anchor_dir(family: Family) -> &'static str {
    match family {
        Family::Fedora => "/etc/pki/ca-trust/source/anchors",
        Family::Debian => "/usr/local/share/ca-certificates",
        Family::Archlinux => "/etc/ca-certificates/trust-source/anchors",
    }
}

/// Per-family fragment sourced by the noVNC startup script.
fn novnc_fragment(family: Family) -> &'static str {
    match family {
        Family::Fedora => "fedora.sh",
        Family::Debian => "debian.sh",
        Family::Archlinux => "arch.sh",
    }
}

/// Assembles the Dockerfile for one base image.
///
/// Stage order is fixed: the certificate is trusted before anything is
/// downloaded, cleanup follows the install it shrinks, and the additional
/// libraries come last because they build with the installed toolchain.
pub struct DockerfileGenerator<'a> {
    image: Image,
    tag: &'a str,
    config: &'a G4ImageConfig,
    catalog: &'a Catalog,
}

impl<'a> DockerfileGenerator<'a> {
    pub fn new(image: Image, tag: &'a str, config: &'a G4ImageConfig) -> Self {
        Self {
            image,
            tag,
            config,
            catalog: Catalog::builtin(),
        }
    }

    /// Resolve packages from `catalog` instead of the built-in table.
    pub fn with_catalog(mut self, catalog: &'a Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    fn family(&self) -> Family {
        self.image.family()
    }

    pub fn build(&self) -> Dockerfile {
        let mut blocks = vec![
            self.header(),
            self.setup_files(),
            self.ca_trust(),
            self.preamble(),
            self.packages(),
            self.cleanup(),
        ];
        blocks.extend(LibraryInstaller::new(self.image, self.config).blocks());

        let dockerfile = Dockerfile::new(blocks);
        tracing::debug!(
            image = %self.image,
            tag = self.tag,
            blocks = dockerfile.blocks().len(),
            "assembled dockerfile"
        );
        dockerfile
    }

    pub fn render(&self) -> String {
        self.build().render()
    }

    fn header(&self) -> Block {
        let entrypoint = remote_path(&self.config.assets.entrypoint);
        let novnc_startup = remote_path(&self.config.assets.novnc_startup);

        Block::new(
            Stage::Header,
            vec![
                BuildStep::From {
                    image: self.image.to_string(),
                    tag: self.tag.to_owned(),
                },
                BuildStep::Label {
                    key: "maintainer".to_owned(),
                    value: self.config.image.maintainer.clone(),
                },
                BuildStep::comment("run bash instead of sh"),
                BuildStep::Shell(vec!["/bin/bash".to_owned(), "-c".to_owned()]),
                BuildStep::comment(
                    "Make browser UI the default; users can override with \"docker run ... bash -il\"",
                ),
                BuildStep::Entrypoint(vec![entrypoint]),
                BuildStep::Cmd(vec![novnc_startup]),
                BuildStep::env("AUTOBUILD", "1"),
            ],
        )
    }

    fn setup_files(&self) -> Block {
        let assets = &self.config.assets;
        let entrypoint = remote_path(&assets.entrypoint);
        let novnc_startup = remote_path(&assets.novnc_startup);
        let fragment_dir = format!("{REMOTE_STARTUP_DIR}/start-novnc.d");
        let fragment = novnc_fragment(self.family());

        Block::new(
            Stage::SetupFiles,
            vec![
                BuildStep::comment("Create and set permissions to remote startup files"),
                BuildStep::copy(&assets.entrypoint, &entrypoint),
                BuildStep::copy(&assets.novnc_startup, &novnc_startup),
                BuildStep::run([format!("chmod 0755 {entrypoint} {novnc_startup}")]),
                BuildStep::comment("Create start-novnc.d directory and install functions"),
                BuildStep::run([format!("install -d -m 0755 {fragment_dir}")]),
                BuildStep::copy(
                    format!("{}/{fragment}", assets.novnc_fragments_dir.trim_end_matches('/')),
                    format!("{fragment_dir}/{fragment}"),
                ),
            ],
        )
    }

    fn ca_trust(&self) -> Block {
        let family = self.family();
        let certificate = &self.config.assets.ca_certificate;
        let anchor = format!(
            "{}/{}",
            trust_anchor_dir(family),
            self.config.assets.ca_certificate_name()
        );

        let refresh = match family {
            Family::Fedora => BuildStep::run(["update-ca-trust"]),
            Family::Debian => BuildStep::run([
                "apt-get update",
                "apt-get install -y --no-install-recommends ca-certificates",
                "update-ca-certificates",
            ]),
            Family::Archlinux => BuildStep::run(["trust extract-compat"]),
        };

        Block::new(
            Stage::CaTrust,
            vec![
                BuildStep::comment("Install site CA"),
                BuildStep::copy(certificate, anchor),
                refresh,
            ],
        )
    }

    /// Repository and keyring setup needed before the package install.
    fn preamble(&self) -> Block {
        let steps = match self.image {
            Image::Almalinux => vec![
                BuildStep::comment("AlmaLinux synergy"),
                BuildStep::run([
                    "dnf install -y 'dnf-command(config-manager)'",
                    "dnf config-manager --set-enabled crb",
                    "dnf install -y almalinux-release-synergy",
                ]),
            ],
            Image::Archlinux => vec![
                BuildStep::comment("Refresh the archlinux keyring"),
                BuildStep::run([
                    "pacman-key --init",
                    "pacman-key --populate",
                    "pacman -Sy --noconfirm archlinux-keyring",
                ]),
            ],
            Image::Fedora | Image::Ubuntu | Image::Debian => Vec::new(),
        };
        Block::new(Stage::Preamble, steps)
    }

    fn packages(&self) -> Block {
        let packages = self.catalog.packages_for(self.family(), self.image);
        let mut steps = vec![BuildStep::comment("Install packages")];
        steps.extend(install_command(self.family(), &packages).steps());
        Block::new(Stage::Packages, steps)
    }

    fn cleanup(&self) -> Block {
        Block::new(
            Stage::Cleanup,
            vec![BuildStep::AndThen(cleanup_commands(self.family()))],
        )
    }
}

/// Render the full Dockerfile for `image:tag` with the built-in catalog.
pub fn create_dockerfile(image: Image, tag: &str, config: &G4ImageConfig) -> String {
    DockerfileGenerator::new(image, tag, config).render()
}

/// Where a local asset ends up inside the image.
fn remote_path(local: &str) -> String {
    let name = match local.rsplit_once('/') {
        Some((_, name)) => name,
        None => local,
    };
    format!("{REMOTE_STARTUP_DIR}/{name}")
}
