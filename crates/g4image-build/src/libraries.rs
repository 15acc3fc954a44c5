//! Build steps for libraries installed outside the package manager.
//!
//! Steps append `source` / `module` lines to [`REMOTE_SETUP_FILE`]; later
//! steps (Geant4) source that file and rely on the lines written before.

use g4image_core::{Family, G4ImageConfig, Image, SimHome, Versions};
use url::Url;

use crate::dockerfile::trust_anchor_dir;
use crate::step::{Block, BuildStep, Stage};

/// Login-shell profile collecting the environment of every installed library.
pub const REMOTE_SETUP_FILE: &str = "/etc/profile.d/localSetup.sh";

const ROOT_REPO: &str = "https://github.com/root-project/root.git";
const ROOT_INSTALL_DIR: &str = "/usr/local";
const ROOT_DISABLED_FEATURES: &[&str] = &[
    "arrow", "davix", "cefweb", "cocoa", "cuda", "fortran", "pythia8", "r", "shadowpw", "tmva",
    "vecgeom", "xrootd",
];

const MESON_INSTALL_DIR: &str = "/usr/local";
const NOVNC_DIR: &str = "/opt/novnc";
const WEBSOCKIFY_REPO: &str = "https://github.com/novnc/websockify";
const G4INSTALL_REPO: &str = "https://github.com/gemc/g4install";

/// Builds `curl` download commands.
///
/// Hosts under one of `site_domains` are verified against the site
/// certificate; everything else uses the system trust store.
#[derive(Debug, Clone)]
pub struct Downloader<'a> {
    site_domains: &'a [String],
    site_certificate: String,
}

impl<'a> Downloader<'a> {
    pub fn new(site_domains: &'a [String], site_certificate: String) -> Self {
        Self {
            site_domains,
            site_certificate,
        }
    }

    pub fn is_site_host(&self, url: &str) -> bool {
        Url::parse(url).is_ok_and(|parsed| {
            let Some(host) = parsed.host_str() else {
                return false;
            };
            self.site_domains
                .iter()
                .any(|domain| in_domain(host, domain))
        })
    }

    pub fn command(&self, url: &str) -> String {
        if self.is_site_host(url) {
            format!(
                "curl -S --fail-with-body --location --progress-bar --retry 4 --cacert {} -O {url}",
                self.site_certificate
            )
        } else {
            format!("curl -S --fail-with-body --location --progress-bar --retry 4 -O {url}")
        }
    }
}

/// `host` equals `domain` or is one of its subdomains. A leading dot on
/// `domain` is optional.
fn in_domain(host: &str, domain: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let domain = domain.trim_start_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// Emits the additional-library blocks for one image.
#[derive(Debug, Clone)]
pub struct LibraryInstaller<'a> {
    image: Image,
    versions: &'a Versions,
    sim_home: SimHome,
    downloader: Downloader<'a>,
}

impl<'a> LibraryInstaller<'a> {
    pub fn new(image: Image, config: &'a G4ImageConfig) -> Self {
        let site_certificate = format!(
            "{}/{}",
            trust_anchor_dir(image.family()),
            config.assets.ca_certificate_name()
        );
        Self {
            image,
            versions: &config.versions,
            sim_home: config.image.sim_home,
            downloader: Downloader::new(&config.network.site_domains, site_certificate),
        }
    }

    pub fn blocks(&self) -> Vec<Block> {
        let mut blocks = Vec::new();
        if self.image == Image::Archlinux {
            blocks.push(self.environment_modules_on_arch());
        }
        blocks.push(self.version_summary());
        blocks.extend(self.root_from_source());
        blocks.push(self.meson());
        blocks.push(self.novnc());
        blocks.push(self.g4install());
        blocks.push(self.geant4());
        blocks
    }

    /// Arch has no environment-modules package; build it from the AUR as
    /// an unprivileged user.
    fn environment_modules_on_arch(&self) -> Block {
        Block::new(
            Stage::Libraries,
            vec![
                BuildStep::comment("Install env-modules on Arch Linux"),
                BuildStep::run([
                    "pacman -Syu --noconfirm",
                    "pacman -S --needed --noconfirm base-devel git sudo fakeroot tcl procps pacman-contrib",
                    "useradd -m -G wheel -s /bin/bash build",
                    "echo \"build ALL=(ALL) NOPASSWD: ALL\" > /etc/sudoers.d/99-build",
                    "chmod 440 /etc/sudoers.d/99-build",
                    "su - build -c 'git clone https://aur.archlinux.org/env-modules.git && cd env-modules && updpkgsums && makepkg -si --noconfirm --needed'",
                    "pacman -U --noconfirm /home/build/env-modules/*.pkg.tar.zst",
                ]),
            ],
        )
    }

    fn version_summary(&self) -> Block {
        Block::new(
            Stage::Libraries,
            vec![
                BuildStep::comment("Install additional libraries"),
                BuildStep::comment(format!("ROOT version: {}", self.versions.root)),
                BuildStep::comment(format!("Meson version: {}", self.versions.meson)),
                BuildStep::comment(format!("noVNC version: {}", self.versions.novnc)),
                BuildStep::comment(format!("Geant4 version: {}", self.versions.geant4)),
            ],
        )
    }

    /// Fedora and Arch ship ROOT as a package; debian-family builds it.
    fn root_from_source(&self) -> Option<Block> {
        if self.image.family() != Family::Debian {
            tracing::debug!(image = %self.image, "ROOT provided by the package manager");
            return None;
        }

        let disabled: Vec<String> = ROOT_DISABLED_FEATURES
            .iter()
            .map(|feature| format!("-D{feature}=OFF"))
            .collect();

        Some(Block::new(
            Stage::Libraries,
            vec![
                BuildStep::comment("ROOT installation from source"),
                BuildStep::run([
                    format!("cd {ROOT_INSTALL_DIR}"),
                    format!(
                        "git clone -c advice.detachedHead=false --single-branch --depth=1 -b {} {ROOT_REPO} root_src",
                        self.versions.root
                    ),
                    "mkdir root_build root && cd root_build".to_owned(),
                    format!(
                        "cmake {} -Dminimal=ON -DCMAKE_INSTALL_PREFIX=../root ../root_src",
                        disabled.join(" ")
                    ),
                    "cmake --build . -- install -j\"$(nproc)\"".to_owned(),
                    format!("cd {ROOT_INSTALL_DIR} && rm -rf root_src root_build"),
                    format!(
                        "echo \"cd {ROOT_INSTALL_DIR}/root/bin ; source thisroot.sh ; cd -\" >> {REMOTE_SETUP_FILE}"
                    ),
                ]),
            ],
        ))
    }

    fn meson(&self) -> Block {
        let version = &self.versions.meson;
        let tarball = format!("meson-{version}.tar.gz");
        let url = format!("https://github.com/mesonbuild/meson/releases/download/{version}/{tarball}");

        Block::new(
            Stage::Libraries,
            vec![
                BuildStep::comment("Meson installation using tarball"),
                BuildStep::run([
                    format!("cd {MESON_INSTALL_DIR}"),
                    self.downloader.command(&url),
                    format!("tar -xzf {tarball}"),
                    format!("rm {tarball}"),
                    format!("ln -s {MESON_INSTALL_DIR}/meson-{version}/meson.py /usr/bin/meson"),
                ]),
            ],
        )
    }

    /// noVNC from its release archive; websockify is cloned next to it.
    fn novnc(&self) -> Block {
        let tag = self.versions.novnc.as_str();
        let url = format!("https://github.com/novnc/noVNC/archive/refs/tags/{tag}.tar.gz");
        let bare = match tag.strip_prefix('v') {
            Some(bare) => bare,
            None => tag,
        };
        let extracted = format!("noVNC-{bare}");

        Block::new(
            Stage::Libraries,
            vec![
                BuildStep::comment("Install noVNC"),
                BuildStep::run([
                    "mkdir -p /opt && cd /opt".to_owned(),
                    self.downloader.command(&url),
                    format!("tar -xzf {tag}.tar.gz"),
                    format!("rm {tag}.tar.gz"),
                    format!("mv {extracted} {NOVNC_DIR}"),
                    format!("ln -sf {NOVNC_DIR}/vnc.html {NOVNC_DIR}/index.html"),
                    format!("ln -sf {NOVNC_DIR}/utils/novnc_proxy /usr/local/bin/novnc_proxy"),
                    format!("git clone --depth=1 {WEBSOCKIFY_REPO} {NOVNC_DIR}/utils/websockify"),
                ]),
            ],
        )
    }

    /// `UPSTREAM_REV` changes with every g4install commit, which keeps the
    /// clone from being served out of the layer cache.
    fn g4install(&self) -> Block {
        let home = self.sim_home.path();
        Block::new(
            Stage::Libraries,
            vec![
                BuildStep::comment("Clone g4install"),
                BuildStep::Arg {
                    name: "UPSTREAM_REV".to_owned(),
                    default: Some("unknown".to_owned()),
                },
                BuildStep::run([
                    format!("mkdir -p {home}"),
                    format!("cd {home}"),
                    format!("git clone --depth=1 {G4INSTALL_REPO} ."),
                    format!("echo \"module use {home}/modules\" >> {REMOTE_SETUP_FILE}"),
                    format!(
                        "echo \"module load geant4/{}\" >> {REMOTE_SETUP_FILE}",
                        self.versions.geant4
                    ),
                ]),
            ],
        )
    }

    fn geant4(&self) -> Block {
        let version = &self.versions.geant4;
        Block::new(
            Stage::Libraries,
            vec![
                BuildStep::comment(format!("Install Geant4 {version}")),
                BuildStep::run([
                    format!("source {REMOTE_SETUP_FILE}"),
                    format!("install_geant4 {version}"),
                ]),
            ],
        )
    }
}

/// Additional-library blocks for `image` using the configured versions.
pub fn additional_libraries(image: Image, config: &G4ImageConfig) -> Vec<Block> {
    LibraryInstaller::new(image, config).blocks()
}
