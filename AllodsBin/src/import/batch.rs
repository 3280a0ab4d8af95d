//! Batch texture conversion
//!
//! Finds texture XDB files under a directory and decodes them in parallel,
//! writing a `.dds` (and optionally a `.png`) next to each texture's `.bin`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use walkdir::WalkDir;

use super::{base_dir_for, convert_texture};
use crate::error::Result;
use crate::formats::texture::{dds_to_png, TextureOptions};
use crate::formats::xdb::{read_xdb, XdbDocument};

/// Result of [`batch_convert_textures`]
#[derive(Debug, Clone, Default)]
pub struct BatchTextureResult {
    /// Textures decoded and written
    pub success_count: usize,
    /// Texture XDBs that failed to decode
    pub fail_count: usize,
    /// XDB files that do not describe a texture
    pub skipped_count: usize,
    /// One message per converted or failed texture
    pub results: Vec<String>,
}

/// Progress update sent once per XDB file as a worker picks it up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    /// Files started so far, 1-indexed
    pub current: usize,
    /// Number of XDB files in the batch
    pub total: usize,
    /// Path of the file being converted, for display
    pub current_file: Option<String>,
}

impl BatchProgress {
    #[must_use]
    pub fn with_file(current: usize, total: usize, file: impl Into<String>) -> Self {
        Self {
            current,
            total,
            current_file: Some(file.into()),
        }
    }
}

/// Find all .xdb files in a directory recursively, sorted.
pub fn find_xdb_files<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let mut files: Vec<_> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| {
            e.path().is_file()
                && e.path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("xdb"))
        })
        .map(|e| e.path().to_path_buf())
        .collect();

    files.sort();
    files
}

enum Outcome {
    Converted(String),
    Skipped,
}

/// Texture XDBs carry at least one of the texture description tags.
fn describes_texture(doc: &XdbDocument) -> bool {
    ["width", "height", "type"].iter().any(|tag| doc.root.find(tag).is_some())
}

fn convert_one(xdb_path: &Path, write_png: bool, options: &TextureOptions) -> Result<Outcome> {
    let doc = read_xdb(xdb_path)?;
    if !describes_texture(&doc) {
        return Ok(Outcome::Skipped);
    }

    let base_dir = base_dir_for(&std::path::absolute(xdb_path)?, &doc)?;
    let texture = convert_texture(xdb_path, &base_dir, options)?;

    let dds_path = texture.binary.with_extension("dds");
    std::fs::write(&dds_path, &texture.dds)?;
    if write_png {
        std::fs::write(texture.binary.with_extension("png"), dds_to_png(&texture.dds)?)?;
    }

    Ok(Outcome::Converted(format!(
        "{} -> {} ({}x{} {})",
        xdb_path.display(),
        dds_path.display(),
        texture.info.width,
        texture.info.height,
        texture.info.pixel_format
    )))
}

/// Decode every texture XDB under `dir` in parallel.
///
/// XDB files without texture tags are skipped. Texture XDBs that fail to
/// parse or decode are counted and reported, never fatal.
///
/// # Arguments
/// * `dir` - Directory to scan recursively
/// * `write_png` - Also write a `.png` next to each `.dds`
/// * `options` - Texture decoding options
/// * `progress` - Callback for progress updates
pub fn batch_convert_textures<F>(
    dir: &Path,
    write_png: bool,
    options: &TextureOptions,
    progress: F,
) -> BatchTextureResult
where
    F: Fn(&BatchProgress) + Send + Sync,
{
    let files = find_xdb_files(dir);
    let total = files.len();
    let success_counter = AtomicUsize::new(0);
    let fail_counter = AtomicUsize::new(0);
    let skip_counter = AtomicUsize::new(0);
    let processed = AtomicUsize::new(0);

    let results: Vec<String> = files
        .par_iter()
        .filter_map(|xdb_path| {
            let display_path = xdb_path.strip_prefix(dir).unwrap_or(xdb_path).to_string_lossy();
            let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(&BatchProgress::with_file(current, total, display_path));

            match convert_one(xdb_path, write_png, options) {
                Ok(Outcome::Converted(message)) => {
                    success_counter.fetch_add(1, Ordering::SeqCst);
                    Some(message)
                }
                Ok(Outcome::Skipped) => {
                    skip_counter.fetch_add(1, Ordering::SeqCst);
                    None
                }
                Err(e) => {
                    tracing::warn!("Failed to convert {}: {}", xdb_path.display(), e);
                    fail_counter.fetch_add(1, Ordering::SeqCst);
                    Some(format!("Failed {}: {e}", xdb_path.display()))
                }
            }
        })
        .collect();

    BatchTextureResult {
        success_count: success_counter.load(Ordering::SeqCst),
        fail_count: fail_counter.load(Ordering::SeqCst),
        skipped_count: skip_counter.load(Ordering::SeqCst),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[test]
    fn test_broken_texture_xdb_counts_as_failure() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("Model.xdb"),
            "<Geometry><binaryFile href=\"/Model.bin\"/></Geometry>",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("Odd.xdb"),
            "<Texture><binaryFile href=\"/Odd.bin\"/><width>4</width><height>4</height><type>DXT9</type></Texture>",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("Wide.xdb"),
            "<Texture><binaryFile href=\"/Wide.bin\"/><width>wide</width><height>4</height><type>DXT1</type></Texture>",
        )
        .unwrap();

        let seen = Mutex::new(Vec::new());
        let result = batch_convert_textures(dir.path(), false, &TextureOptions::new(), |progress| {
            seen.lock().unwrap().push((progress.current, progress.total));
        });

        assert_eq!(result.success_count, 0);
        assert_eq!(result.fail_count, 2);
        assert_eq!(result.skipped_count, 1);
        assert_eq!(result.results.len(), 2);

        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }
}
