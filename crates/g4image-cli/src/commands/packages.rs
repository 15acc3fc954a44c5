use g4image_build::install_command;
use g4image_core::packages_for;

use super::parse_image;

/// How the `packages` subcommand prints its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageFormat {
    /// Install block as it appears in the Dockerfile
    Command,
    List,
    Json,
}

pub fn packages(image: &str, format: PackageFormat) -> anyhow::Result<()> {
    let image = parse_image(image)?;
    let family = image.family();
    let packages = packages_for(family, image);

    match format {
        PackageFormat::Command => print!("{}", install_command(family, &packages)),
        PackageFormat::List => {
            for package in &packages {
                println!("{package}");
            }
        }
        PackageFormat::Json => println!("{}", serde_json::to_string_pretty(&packages)?),
    }
    Ok(())
}
