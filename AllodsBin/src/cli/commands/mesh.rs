//! Assemble model LODs to JSON

use std::path::Path;

use crate::import::{import_model, ImportOptions, LodSelection, TextureCache};

/// Import a geometry XDB and write the assembled model as JSON.
///
/// # Errors
/// Returns an error if the import fails or the JSON cannot be written.
pub fn execute(
    path: &Path,
    output: &Path,
    lod: usize,
    all_lods: bool,
    include_slots: bool,
    no_textures: bool,
) -> anyhow::Result<()> {
    let lods = if all_lods { LodSelection::All } else { LodSelection::Only(lod) };
    let mut options = ImportOptions::new().with_lods(lods).with_slot_bones(include_slots);
    if no_textures {
        options = options.no_textures();
    }

    println!("Importing model: {}", path.display());
    let mut cache = TextureCache::new();
    let model = import_model(path, &options, &mut cache)?;

    for element in &model.elements {
        for lod in &element.lods {
            println!(
                "  - {}_lod{} ({} vertices, {} triangles)",
                element.name,
                lod.lod,
                lod.mesh.vertices.len(),
                lod.mesh.triangles.len()
            );
        }
    }
    println!("Bones: {} of {}", model.bones.len(), model.skeleton.len());
    println!("Textures decoded: {}", cache.len());
    for warning in &model.warnings {
        println!("Warning: {warning}");
    }

    let json = serde_json::to_string_pretty(&model)?;
    std::fs::write(output, json)?;

    println!("Written to: {}", output.display());
    Ok(())
}
