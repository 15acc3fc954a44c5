mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "g4image",
    about = "Print Dockerfiles for Geant4/ROOT scientific-computing images",
    after_help = "Example: g4image dockerfile -i fedora -t 40 > Dockerfile"
)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./g4image.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full Dockerfile for a base image
    Dockerfile {
        /// Target base OS (fedora, almalinux, ubuntu, debian, archlinux)
        #[arg(short, long)]
        image: String,
        /// Base image tag (e.g. 40 for fedora, 24.04 for ubuntu)
        #[arg(short, long)]
        tag: String,
        #[command(flatten)]
        versions: commands::VersionArgs,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overwrite the output file if it exists
        #[arg(long, requires = "output")]
        force: bool,
    },
    /// Print the package install command for a base image
    Packages {
        /// Target base OS (fedora, almalinux, ubuntu, debian, archlinux)
        #[arg(short, long)]
        image: String,
        /// Print resolved package names, one per line
        #[arg(long, conflicts_with = "json")]
        list: bool,
        /// Print resolved package names as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Print the additional-library install steps for a base image
    Libraries {
        /// Target base OS (fedora, almalinux, ubuntu, debian, archlinux)
        #[arg(short, long)]
        image: String,
        #[command(flatten)]
        versions: commands::VersionArgs,
    },
    /// List valid base images and their package family
    Images,
}

fn main() -> anyhow::Result<()> {
    // stdout carries the generated text; diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                // arch-lint: allow(no-silent-result-drop) reason="unset or malformed RUST_LOG falls back to the warn filter"
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Dockerfile {
            image,
            tag,
            versions,
            output,
            force,
        } => commands::dockerfile(
            &image,
            &tag,
            &versions,
            config_path,
            output.as_deref(),
            force,
        )?,
        Commands::Packages { image, list, json } => {
            let format = if json {
                commands::PackageFormat::Json
            } else if list {
                commands::PackageFormat::List
            } else {
                commands::PackageFormat::Command
            };
            commands::packages(&image, format)?
        }
        Commands::Libraries { image, versions } => {
            commands::libraries(&image, &versions, config_path)?
        }
        Commands::Images => commands::images(),
    }

    Ok(())
}
