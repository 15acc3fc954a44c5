use std::path::Path;

use g4image_build::DockerfileGenerator;
use g4image_build::output::write_dockerfile;

use super::{VersionArgs, load_config, parse_image};

pub fn dockerfile(
    image: &str,
    tag: &str,
    versions: &VersionArgs,
    config_path: Option<&Path>,
    output: Option<&Path>,
    force: bool,
) -> anyhow::Result<()> {
    let image = parse_image(image)?;
    let config = load_config(config_path, versions)?;

    let dockerfile = DockerfileGenerator::new(image, tag, &config).render();

    match output {
        Some(path) => {
            write_dockerfile(path, &dockerfile, force)?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{dockerfile}"),
    }
    Ok(())
}
