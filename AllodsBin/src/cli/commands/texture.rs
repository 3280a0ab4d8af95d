//! CLI commands for texture operations

use std::path::Path;

use crate::formats::texture::{dds_to_png, TextureOptions};
use crate::formats::xdb::read_xdb;
use crate::import::{base_dir_for, convert_texture};

/// Decode one texture XDB to DDS, optionally also PNG.
///
/// # Errors
/// Returns an error if the texture fails to decode or an output cannot be written.
pub fn execute(
    path: &Path,
    output: Option<&Path>,
    png: Option<&Path>,
    base_dir: Option<&Path>,
    max_size: Option<usize>,
    scan: bool,
) -> anyhow::Result<()> {
    let base_dir = match base_dir {
        Some(dir) => dir.to_path_buf(),
        None => base_dir_for(&std::path::absolute(path)?, &read_xdb(path)?)?,
    };

    let mut options = TextureOptions::new().with_block_pattern_scan(scan);
    if let Some(limit) = max_size {
        options = options.with_max_inflated_size(limit);
    }

    let texture = convert_texture(path, &base_dir, &options)?;
    let dds_path = output.map_or_else(|| texture.binary.with_extension("dds"), Path::to_path_buf);
    std::fs::write(&dds_path, &texture.dds)?;

    println!(
        "Decoded {}x{} {} texture",
        texture.info.width, texture.info.height, texture.info.pixel_format
    );
    println!("Written to: {}", dds_path.display());

    if let Some(png_path) = png {
        std::fs::write(png_path, dds_to_png(&texture.dds)?)?;
        println!("Written to: {}", png_path.display());
    }

    Ok(())
}
