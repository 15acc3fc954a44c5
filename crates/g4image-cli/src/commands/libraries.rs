use std::path::Path;

use g4image_build::{additional_libraries, render_blocks};

use super::{VersionArgs, load_config, parse_image};

pub fn libraries(
    image: &str,
    versions: &VersionArgs,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let image = parse_image(image)?;
    let config = load_config(config_path, versions)?;

    print!("{}", render_blocks(&additional_libraries(image, &config)));
    Ok(())
}
