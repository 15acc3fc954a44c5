//! Package-manager invocation and cache cleanup per family.

use std::fmt;

use g4image_core::Family;

use crate::step::{Block, BuildStep, Stage};

/// Where the install output is captured during the image build.
pub const INSTALL_LOG: &str = "/tmp/packages-install.log";

/// Timezone linked as `/etc/localtime` on debian-family images.
const LOCALTIME_ZONE: &str = "America/New_York";

/// One family-specific package install.
///
/// `env` is declared before the command runs; `inner` is the bare
/// package-manager command line, which [`InstallCommand::wrapped`] turns
/// into a logged invocation that dumps its log on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCommand {
    pub family: Family,
    pub env: Vec<(String, String)>,
    pub inner: String,
}

impl InstallCommand {
    pub fn new(family: Family, packages: &[String]) -> Self {
        let packages = packages.join(" ");
        match family {
            Family::Fedora => Self {
                family,
                env: Vec::new(),
                inner: format!("dnf install -y --allowerasing {packages}"),
            },
            Family::Debian => Self {
                family,
                env: vec![
                    ("DEBIAN_FRONTEND".to_owned(), "noninteractive".to_owned()),
                    ("DEBCONF_NONINTERACTIVE_SEEN".to_owned(), "true".to_owned()),
                    ("TZ".to_owned(), "UTC".to_owned()),
                ],
                inner: format!(
                    "ln -fs /usr/share/zoneinfo/{LOCALTIME_ZONE} /etc/localtime && \
                     apt-get update && \
                     apt-get install -y --no-install-recommends tzdata {packages}"
                ),
            },
            Family::Archlinux => Self {
                family,
                env: Vec::new(),
                inner: format!("pacman -Syu --noconfirm --needed {packages}"),
            },
        }
    }

    /// The command run under bash with output sent to [`INSTALL_LOG`].
    ///
    /// On a non-zero exit the log is printed and the same status is
    /// returned, so the build shows the package manager's own error.
    pub fn wrapped(&self) -> String {
        format!(
            "/bin/bash -lc 'set -euo pipefail; {{ {inner}; }} >{INSTALL_LOG} 2>&1 || \
             {{ rc=$?; cat {INSTALL_LOG}; exit $rc; }}'",
            inner = self.inner
        )
    }

    pub fn steps(&self) -> Vec<BuildStep> {
        self.env
            .iter()
            .map(|(key, value)| BuildStep::env(key, value))
            .chain(std::iter::once(BuildStep::run([self.wrapped()])))
            .collect()
    }

    pub fn block(&self) -> Block {
        Block::new(Stage::Packages, self.steps())
    }
}

impl fmt::Display for InstallCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.block(), f)
    }
}

/// Install invocation for `packages` using `family`'s package manager.
pub fn install_command(family: Family, packages: &[String]) -> InstallCommand {
    tracing::debug!(%family, count = packages.len(), "composing install command");
    InstallCommand::new(family, packages)
}

/// Cache purge chained after the install so it lands in the same layer.
pub fn cleanup_commands(family: Family) -> Vec<String> {
    let commands: &[&str] = match family {
        Family::Fedora => &[
            "dnf -y update",
            "dnf -y check-update",
            "dnf clean packages",
            "dnf clean all",
            "rm -rf /var/cache/dnf",
        ],
        Family::Debian => &[
            "apt-get -y autoremove",
            "apt-get -y autoclean",
            "rm -rf /var/lib/apt/lists/*",
        ],
        Family::Archlinux => &["pacman -Scc --noconfirm", "rm -rf /var/cache/pacman/pkg/*"],
    };
    commands.iter().map(|c| (*c).to_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkgs(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_owned()).collect()
    }

    #[test]
    fn fedora_uses_dnf_allowerasing() {
        let cmd = install_command(Family::Fedora, &pkgs(&["git", "root"]));
        assert_eq!(cmd.inner, "dnf install -y --allowerasing git root");
        assert!(cmd.env.is_empty());
    }

    #[test]
    fn archlinux_uses_pacman_needed() {
        let cmd = install_command(Family::Archlinux, &pkgs(&["git"]));
        assert_eq!(cmd.inner, "pacman -Syu --noconfirm --needed git");
    }

    #[test]
    fn debian_pins_timezone_before_update() {
        let cmd = install_command(Family::Debian, &pkgs(&["g++"]));
        assert_eq!(
            cmd.inner,
            "ln -fs /usr/share/zoneinfo/America/New_York /etc/localtime && \
             apt-get update && \
             apt-get install -y --no-install-recommends tzdata g++"
        );
        let keys: Vec<&str> = cmd.env.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["DEBIAN_FRONTEND", "DEBCONF_NONINTERACTIVE_SEEN", "TZ"]);
    }

    #[test]
    fn wrapper_logs_whole_command_and_reports_failure() {
        let cmd = install_command(Family::Archlinux, &pkgs(&["git"]));
        assert_eq!(
            cmd.wrapped(),
            "/bin/bash -lc 'set -euo pipefail; { pacman -Syu --noconfirm --needed git; } \
             >/tmp/packages-install.log 2>&1 || \
             { rc=$?; cat /tmp/packages-install.log; exit $rc; }'"
        );
    }

    #[test]
    fn debian_block_declares_env_before_run() {
        let text = install_command(Family::Debian, &pkgs(&["git"])).to_string();

        let frontend = text.find("ENV DEBIAN_FRONTEND=noninteractive").unwrap();
        let tz = text.find("ENV TZ=UTC").unwrap();
        let install = text.find("apt-get install").unwrap();
        let pin = text.find("ln -fs /usr/share/zoneinfo").unwrap();
        let update = text.find("apt-get update").unwrap();

        assert!(frontend < install);
        assert!(tz < install);
        assert!(pin < update);
        assert!(text.starts_with("ENV "));
    }

    #[test]
    fn cleanup_differs_per_family() {
        assert!(cleanup_commands(Family::Fedora).contains(&"dnf clean all".to_owned()));
        assert!(cleanup_commands(Family::Debian).contains(&"rm -rf /var/lib/apt/lists/*".to_owned()));
        assert_eq!(
            cleanup_commands(Family::Archlinux),
            ["pacman -Scc --noconfirm", "rm -rf /var/cache/pacman/pkg/*"]
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn family() -> impl Strategy<Value = Family> {
            prop_oneof![
                Just(Family::Fedora),
                Just(Family::Debian),
                Just(Family::Archlinux),
            ]
        }

        proptest! {
            #[test]
            fn every_package_reaches_the_wrapped_command(
                family in family(),
                packages in proptest::collection::vec("[a-z][a-z0-9+-]{0,15}", 1..20),
            ) {
                let wrapped = install_command(family, &packages).wrapped();
                prop_assert!(wrapped.contains(&packages.join(" ")));
                let dumps_log = wrapped.ends_with(
                    "|| { rc=$?; cat /tmp/packages-install.log; exit $rc; }'"
                );
                prop_assert!(dumps_log);
            }

            #[test]
            fn block_always_ends_with_single_run(
                family in family(),
                packages in proptest::collection::vec("[a-z]{1,8}", 0..10),
            ) {
                let steps = install_command(family, &packages).steps();
                let runs = steps.iter().filter(|s| matches!(s, BuildStep::Run(_))).count();
                prop_assert_eq!(runs, 1);
                let last_is_run = matches!(steps.last(), Some(BuildStep::Run(_)));
                prop_assert!(last_is_run);
            }
        }
    }
}
