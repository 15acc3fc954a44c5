use g4image_build::output::{OutputError, write_dockerfile};
use g4image_build::{BuildStep, DockerfileGenerator, Stage, create_dockerfile};
use g4image_core::{G4ImageConfig, Image};
use tempfile::TempDir;

fn render(image: Image, tag: &str) -> String {
    create_dockerfile(image, tag, &G4ImageConfig::default())
}

fn pos(text: &str, needle: &str) -> usize {
    text.find(needle)
        .unwrap_or_else(|| panic!("{needle:?} not found in dockerfile"))
}

// ── Stage order ──

#[test]
fn stages_follow_fixed_order() {
    let config = G4ImageConfig::default();
    let dockerfile = DockerfileGenerator::new(Image::Archlinux, "latest", &config).build();
    let stages = dockerfile.stages();

    let expected_prefix = [
        Stage::Header,
        Stage::SetupFiles,
        Stage::CaTrust,
        Stage::Preamble,
        Stage::Packages,
        Stage::Cleanup,
    ];
    assert_eq!(&stages[..expected_prefix.len()], expected_prefix);
    assert!(
        stages[expected_prefix.len()..]
            .iter()
            .all(|s| *s == Stage::Libraries)
    );
}

#[test]
fn ubuntu_has_no_preamble_stage() {
    let config = G4ImageConfig::default();
    let dockerfile = DockerfileGenerator::new(Image::Ubuntu, "24.04", &config).build();

    assert_eq!(dockerfile.position(Stage::Preamble), None);
    assert!(dockerfile.position(Stage::CaTrust) < dockerfile.position(Stage::Packages));
}

#[test]
fn every_image_trusts_certificate_before_any_download() {
    for image in Image::ALL {
        let text = render(image, "latest");
        let trust = pos(&text, "# Install site CA");
        let first_curl = pos(&text, "curl ");
        let first_clone = pos(&text, "git clone");
        assert!(trust < first_curl && trust < first_clone, "{image}");
    }
}

// ── Header ──

#[test]
fn header_declares_base_image_and_entrypoint() {
    let text = render(Image::Fedora, "40");

    assert!(text.starts_with("FROM fedora:40\n"));
    assert!(text.contains(r#"LABEL maintainer="Maurizio Ungaro <ungaro@jlab.org>""#));
    assert!(text.contains(r#"SHELL ["/bin/bash", "-c"]"#));
    assert!(text.contains(r#"ENTRYPOINT ["/usr/local/bin/docker-entrypoint.sh"]"#));
    assert!(text.contains(r#"CMD ["/usr/local/bin/start-novnc.sh"]"#));
    assert!(text.contains("ENV AUTOBUILD=1"));
}

#[test]
fn setup_files_copy_family_fragment() {
    assert!(render(Image::Almalinux, "9").contains(
        "COPY ci/novnc/fedora.sh /usr/local/bin/start-novnc.d/fedora.sh"
    ));
    assert!(render(Image::Debian, "12").contains(
        "COPY ci/novnc/debian.sh /usr/local/bin/start-novnc.d/debian.sh"
    ));
    assert!(render(Image::Archlinux, "latest").contains(
        "COPY ci/novnc/arch.sh /usr/local/bin/start-novnc.d/arch.sh"
    ));
}

// ── CA trust ──

#[test]
fn ca_trust_uses_family_store() {
    let fedora = render(Image::Fedora, "40");
    assert!(fedora.contains(
        "COPY ci/assets/JLabCA.crt /etc/pki/ca-trust/source/anchors/JLabCA.crt\nRUN update-ca-trust\n"
    ));

    let ubuntu = render(Image::Ubuntu, "24.04");
    assert!(ubuntu.contains("COPY ci/assets/JLabCA.crt /usr/local/share/ca-certificates/JLabCA.crt"));
    assert!(ubuntu.contains("update-ca-certificates"));

    let arch = render(Image::Archlinux, "latest");
    assert!(arch.contains(
        "COPY ci/assets/JLabCA.crt /etc/ca-certificates/trust-source/anchors/JLabCA.crt"
    ));
    assert!(arch.contains("RUN trust extract-compat"));
}

#[test]
fn ca_certificate_path_is_configurable() {
    let mut config = G4ImageConfig::default();
    config.assets.ca_certificate = "certs/Site.crt".to_owned();
    let text = create_dockerfile(Image::Fedora, "40", &config);

    assert!(text.contains("COPY certs/Site.crt /etc/pki/ca-trust/source/anchors/Site.crt"));
}

// ── Preamble ──

#[test]
fn almalinux_enables_synergy_repository() {
    let text = render(Image::Almalinux, "9");
    let synergy = pos(&text, "dnf install -y almalinux-release-synergy");
    let crb = pos(&text, "dnf config-manager --set-enabled crb");
    let install = pos(&text, "dnf install -y --allowerasing");

    assert!(crb < synergy && synergy < install);
    assert!(!render(Image::Fedora, "40").contains("almalinux-release-synergy"));
}

#[test]
fn archlinux_refreshes_keyring_before_install_and_purges_after() {
    let text = render(Image::Archlinux, "latest");
    let keyring = pos(&text, "pacman -Sy --noconfirm archlinux-keyring");
    let install = pos(&text, "pacman -Syu --noconfirm --needed");
    let purge = pos(&text, "pacman -Scc --noconfirm");

    assert!(keyring < install);
    assert!(install < purge);
}

// ── Packages and cleanup ──

#[test]
fn debian_install_declares_env_and_pins_timezone() {
    let text = render(Image::Debian, "12");
    let packages = pos(&text, "# Install packages");
    let frontend = pos(&text, "ENV DEBIAN_FRONTEND=noninteractive");
    let tz = pos(&text, "ENV TZ=UTC");
    let pin = pos(&text, "ln -fs /usr/share/zoneinfo/America/New_York /etc/localtime");
    let install = pos(&text, "apt-get install -y --no-install-recommends tzdata");

    assert!(packages < frontend && frontend < install && tz < install);
    let update = packages + text[packages..].find("apt-get update").unwrap();
    assert!(pin < update && update < install);
}

#[test]
fn cleanup_chains_onto_install_run() {
    let text = render(Image::Fedora, "40");
    assert!(text.contains(
        "exit $rc; }' \\\n    && dnf -y update \\\n    && dnf -y check-update"
    ));
    assert!(text.contains("&& rm -rf /var/cache/dnf\n"));

    let debian = render(Image::Debian, "12");
    assert!(debian.contains("exit $rc; }' \\\n    && apt-get -y autoremove"));
}

#[test]
fn install_failure_dumps_log() {
    for image in Image::ALL {
        let text = render(image, "latest");
        assert!(
            text.contains(">/tmp/packages-install.log 2>&1 || { rc=$?; cat /tmp/packages-install.log; exit $rc; }"),
            "{image}"
        );
    }
}

#[test]
fn debian_rewrites_reach_install_command() {
    let debian = render(Image::Debian, "12");
    let ubuntu = render(Image::Ubuntu, "24.04");

    assert!(debian.contains("libqt6opengl6-dev"));
    assert!(!debian.contains("libqt6opengl6t64"));
    assert!(ubuntu.contains("libqt6opengl6t64"));
}

// ── Libraries ──

#[test]
fn libraries_follow_cleanup() {
    for image in Image::ALL {
        let text = render(image, "latest");
        let cleanup = pos(&text, "rm -rf /var/");
        let libraries = pos(&text, "# Install additional libraries");
        assert!(cleanup < libraries, "{image}");
    }
}

#[test]
fn versions_flow_into_library_steps() {
    let mut config = G4ImageConfig::default();
    config.versions.root = "v6-30-06".to_owned();
    config.versions.novnc = "v1.5.0".to_owned();
    config.versions.geant4 = "11.2.2".to_owned();
    let text = create_dockerfile(Image::Ubuntu, "24.04", &config);

    assert!(text.contains("-b v6-30-06 https://github.com/root-project/root.git"));
    assert!(text.contains("# ROOT version: v6-30-06"));
    assert!(text.contains("mv noVNC-1.5.0 /opt/novnc"));
    assert!(text.contains("module load geant4/11.2.2"));
    assert!(text.contains("install_geant4 11.2.2"));
}

#[test]
fn versions_do_not_change_packages() {
    let mut config = G4ImageConfig::default();
    config.versions.root = "v6-00-00".to_owned();

    let step_of = |config: &G4ImageConfig| {
        DockerfileGenerator::new(Image::Fedora, "40", config)
            .build()
            .blocks()
            .iter()
            .find(|b| b.stage == Stage::Packages)
            .cloned()
    };
    assert_eq!(step_of(&config), step_of(&G4ImageConfig::default()));
}

#[test]
fn g4install_arg_precedes_clone() {
    let config = G4ImageConfig::default();
    let dockerfile = DockerfileGenerator::new(Image::Fedora, "40", &config).build();
    let steps: Vec<&BuildStep> = dockerfile.steps().collect();

    let arg = steps
        .iter()
        .position(|s| matches!(s, BuildStep::Arg { name, .. } if name == "UPSTREAM_REV"))
        .unwrap();
    let clone = steps
        .iter()
        .position(|s| s.commands().iter().any(|c| c.contains("gemc/g4install")))
        .unwrap();
    assert!(arg < clone);
}

// ── Determinism ──

#[test]
fn output_is_deterministic() {
    for image in Image::ALL {
        assert_eq!(render(image, "latest"), render(image, "latest"));
    }
}

// ── Output Tests ──

#[test]
fn write_creates_parent_directories() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("dockerfiles/fedora-40/Dockerfile");

    write_dockerfile(&path, "FROM fedora:40\n", false).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "FROM fedora:40\n");
}

#[test]
fn write_refuses_to_overwrite_without_force() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("Dockerfile");
    std::fs::write(&path, "original").unwrap();

    let err = write_dockerfile(&path, "new", false).unwrap_err();
    assert!(matches!(err, OutputError::AlreadyExists(_)));
    assert!(err.to_string().contains("--force"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
}

#[test]
fn write_overwrites_with_force() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("Dockerfile");
    std::fs::write(&path, "original").unwrap();

    write_dockerfile(&path, "new", true).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
}
