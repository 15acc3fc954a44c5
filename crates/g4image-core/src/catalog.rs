//! Package catalog: named sections of per-family package lists.
//!
//! Resolution walks the sections in declaration order, concatenates the
//! entries for one [`Family`], applies the [`RewriteRule`]s registered for
//! the exact [`Image`], and drops repeated names while keeping the first
//! occurrence where it was.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use crate::image::{Family, Image};

/// A named purpose-group of packages (compiler toolchain, X11, Qt, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSection {
    pub name: String,
    entries: BTreeMap<Family, Vec<String>>,
}

impl PackageSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Set the package list this section contributes for `family`.
    pub fn with(mut self, family: Family, packages: &[&str]) -> Self {
        self.entries.insert(
            family,
            packages.iter().map(|p| (*p).to_owned()).collect(),
        );
        self
    }

    /// Packages for `family`; empty when the section has no entry for it.
    pub fn packages(&self, family: Family) -> &[String] {
        match self.entries.get(&family) {
            Some(packages) => packages,
            None => &[],
        }
    }
}

/// Package-name substitutions applied for one specific image only.
///
/// Lets a family-level template be corrected for a single derivative
/// (e.g. Debian's Qt library names) without touching its siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    pub image: Image,
    replacements: Vec<(String, String)>,
}

impl RewriteRule {
    pub fn new(image: Image, replacements: &[(&str, &str)]) -> Self {
        Self {
            image,
            replacements: replacements
                .iter()
                .map(|(from, to)| ((*from).to_owned(), (*to).to_owned()))
                .collect(),
        }
    }

    pub fn rewrite<'a>(&'a self, package: &'a str) -> &'a str {
        self.replacements
            .iter()
            .find(|(from, _)| from == package)
            .map_or(package, |(_, to)| to.as_str())
    }
}

/// Immutable package table. Build one with [`Catalog::new`] or use the
/// process-wide [`Catalog::builtin`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    sections: Vec<PackageSection>,
    rules: Vec<RewriteRule>,
}

static BUILTIN: LazyLock<Catalog> = LazyLock::new(builtin_catalog);

impl Catalog {
    pub fn new(sections: Vec<PackageSection>, rules: Vec<RewriteRule>) -> Self {
        Self { sections, rules }
    }

    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    pub fn sections(&self) -> &[PackageSection] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&PackageSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Ordered, de-duplicated package names for `family`, with the rewrite
    /// rules of `image` applied.
    pub fn packages_for(&self, family: Family, image: Image) -> Vec<String> {
        let rules: Vec<&RewriteRule> = self.rules.iter().filter(|r| r.image == image).collect();

        let packages = self
            .sections
            .iter()
            .flat_map(|section| section.packages(family))
            .map(|package| {
                rules
                    .iter()
                    .fold(package.as_str(), |name, rule| rule.rewrite(name))
                    .to_owned()
            });

        let resolved = unique_preserve_order(packages);
        tracing::debug!(%family, %image, count = resolved.len(), "resolved package list");
        resolved
    }
}

/// Package list for `family`/`image` from the built-in catalog.
pub fn packages_for(family: Family, image: Image) -> Vec<String> {
    Catalog::builtin().packages_for(family, image)
}

fn unique_preserve_order(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

fn builtin_catalog() -> Catalog {
    use Family::{Archlinux, Debian, Fedora};

    let sections = vec![
        PackageSection::new("cxx_essentials")
            .with(Fedora, &["git", "make", "cmake", "gcc-c++", "gdb", "valgrind"])
            .with(Debian, &["git", "make", "cmake", "g++", "gdb", "valgrind"])
            .with(Archlinux, &["git", "make", "cmake", "gcc", "gdb", "valgrind"]),
        PackageSection::new("expat")
            .with(Fedora, &["expat-devel"])
            .with(Debian, &["libexpat1-dev"])
            .with(Archlinux, &["expat"]),
        PackageSection::new("sql")
            .with(Fedora, &["mariadb-devel", "sqlite-devel"])
            .with(Debian, &["libmysqlclient-dev", "libsqlite3-dev"])
            .with(Archlinux, &["mariadb", "mariadb-libs", "sqlite"]),
        PackageSection::new("python_ninja")
            .with(Fedora, &["python3-devel", "ninja-build"])
            .with(Debian, &["python3-dev", "ninja-build"])
            .with(Archlinux, &["python", "python-pip", "ninja"]),
        PackageSection::new("x11_1")
            .with(
                Fedora,
                &[
                    "mesa-libGL-devel",
                    "mesa-libGLU-devel",
                    "libX11-devel",
                    "libXpm-devel",
                    "libXft-devel",
                ],
            )
            .with(
                Debian,
                &[
                    "libgl1-mesa-dev",
                    "libglu1-mesa-dev",
                    "libx11-dev",
                    "libxpm-dev",
                    "libxft-dev",
                ],
            )
            .with(Archlinux, &["mesa", "glu", "libx11", "libxpm", "libxft"]),
        PackageSection::new("x11_2")
            .with(
                Fedora,
                &[
                    "libXt-devel",
                    "libXmu-devel",
                    "libXrender-devel",
                    "xorg-x11-server-Xvfb",
                    "xrandr",
                ],
            )
            .with(
                Debian,
                &[
                    "libxt-dev",
                    "libxmu-dev",
                    "libxrender-dev",
                    "xvfb",
                    "x11-xserver-utils",
                ],
            )
            .with(
                Archlinux,
                &[
                    "libxt",
                    "libxmu",
                    "libxrender",
                    "xorg-server-xvfb",
                    "xorg-xrandr",
                ],
            ),
        PackageSection::new("utilities_1")
            .with(
                Fedora,
                &[
                    "bzip2",
                    "wget",
                    "curl",
                    "nano",
                    "bash",
                    "zsh",
                    "hostname",
                    "gedit",
                    "environment-modules",
                    "pv",
                    "which",
                ],
            )
            .with(
                Debian,
                &[
                    "bzip2",
                    "wget",
                    "curl",
                    "nano",
                    "bash",
                    "zsh",
                    "hostname",
                    "gedit",
                    "environment-modules",
                    "pv",
                    "which",
                    "ca-certificates",
                ],
            )
            .with(
                Archlinux,
                &[
                    "bzip2",
                    "wget",
                    "curl",
                    "nano",
                    "bash",
                    "zsh",
                    "inetutils",
                    "gedit",
                    "pv",
                    "which",
                    "fakeroot",
                ],
            ),
        PackageSection::new("utilities_2")
            .with(
                Fedora,
                &[
                    "psmisc",
                    "procps",
                    "mailcap",
                    "net-tools",
                    "rsync",
                    "patch",
                    "bash-completion",
                    "python3-numpy",
                ],
            )
            .with(
                Debian,
                &[
                    "psmisc",
                    "procps",
                    "mailcap",
                    "net-tools",
                    "rsync",
                    "patch",
                    "bash-completion",
                    "python3-numpy",
                ],
            )
            .with(
                Archlinux,
                &[
                    "psmisc",
                    "procps",
                    "mailcap",
                    "net-tools",
                    "rsync",
                    "patch",
                    "bash-completion",
                    "ncurses",
                    "python-numpy",
                ],
            ),
        // noVNC itself is fetched from GitHub, see the library installer
        PackageSection::new("vnc")
            .with(
                Fedora,
                &["xterm", "x11vnc", "openbox", "tint2", "dejavu-sans-mono-fonts"],
            )
            .with(
                Debian,
                &[
                    "xterm",
                    "x11vnc",
                    "openbox",
                    "tint2",
                    "dbus-x11",
                    "fonts-dejavu-core",
                ],
            )
            .with(Archlinux, &["xterm", "tigervnc", "openbox", "ttf-dejavu"]),
        PackageSection::new("qt6")
            .with(Fedora, &["qt6-qtbase-devel", "qt6-qtsvg", "qt6-qtsvg-devel"])
            .with(
                Debian,
                &[
                    "qt6-base-dev",
                    "libqt6opengl6t64",
                    "libqt6openglwidgets6t64",
                    "qt6-base-dev-tools",
                    "libqt6svg6",
                    "qt6-svg-dev",
                ],
            )
            .with(Archlinux, &["qt6-base", "qt6-svg"]),
        // debian-family builds ROOT from source
        PackageSection::new("root")
            .with(Fedora, &["root"])
            .with(Debian, &[])
            .with(Archlinux, &["root"]),
        PackageSection::new("sanitizers")
            .with(Fedora, &["liblsan", "libasan", "libubsan", "libtsan", "tbb"])
            .with(
                Debian,
                &["liblsan0", "libasan8", "libubsan1", "libtsan2", "libtbb12"],
            )
            .with(Archlinux, &["gcc-libs", "tbb"]),
    ];

    let rules = vec![
        // Ubuntu ships the t64 Qt libraries; Debian does not
        RewriteRule::new(
            Image::Debian,
            &[
                ("libqt6opengl6t64", "libqt6opengl6-dev"),
                ("libqt6openglwidgets6t64", "libqt6openglwidgets6"),
                ("libmysqlclient-dev", "libmariadb-dev"),
            ],
        ),
        RewriteRule::new(Image::Fedora, &[("tint2", "lxqt-panel")]),
    ];

    Catalog::new(sections, rules)
}
