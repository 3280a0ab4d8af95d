//! Batch texture conversion command

use std::path::Path;
use std::time::Instant;

use indicatif::ProgressBar;

use crate::cli::progress::{print_done, print_step, simple_bar, LOOKING_GLASS, PICTURE};
use crate::formats::texture::TextureOptions;
use crate::import::{batch_convert_textures, BatchProgress};

/// Convert every texture XDB under `dir`.
///
/// # Errors
/// Returns an error if any texture fails to convert.
pub fn execute(dir: &Path, png: bool, quiet: bool) -> anyhow::Result<()> {
    let started = Instant::now();
    print_step(1, 2, LOOKING_GLASS, &format!("Scanning {} for XDB files...", dir.display()));
    print_step(2, 2, PICTURE, "Converting textures...");

    let pb = if quiet { ProgressBar::hidden() } else { simple_bar(0, "Converting") };
    let result = batch_convert_textures(dir, png, &TextureOptions::new(), |progress: &BatchProgress| {
        pb.set_length(progress.total as u64);
        pb.set_position(progress.current as u64);
        if let Some(file) = &progress.current_file {
            pb.set_message(file.clone());
        }
    });
    pb.finish_and_clear();

    if !quiet {
        for line in &result.results {
            println!("  {line}");
        }
    }
    println!(
        "{} converted, {} failed, {} skipped (not textures)",
        result.success_count, result.fail_count, result.skipped_count
    );
    print_done(started.elapsed());

    if result.fail_count > 0 {
        anyhow::bail!("{} texture(s) failed to convert", result.fail_count);
    }
    Ok(())
}
