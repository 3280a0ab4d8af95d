//! Describe an XDB file

use std::path::Path;

use crate::container::Container;
use crate::formats::xdb::{read_xdb, XdbDocument};

/// Print a summary of a model or texture XDB.
///
/// # Errors
/// Returns an error if the XDB cannot be read or has malformed fields.
pub fn execute(path: &Path) -> anyhow::Result<()> {
    let doc = read_xdb(path)?;

    println!("XDB: {}", path.display());
    println!("Root: <{}>", doc.root.name);
    if let Some(binary) = doc.binary_file() {
        println!("Binary file: {binary}");
    }
    println!();

    if let Ok(info) = doc.texture_info() {
        println!("Texture");
        println!("=======");
        println!("Dimensions: {}x{}", info.width, info.height);
        println!("Format:     {}", info.pixel_format);
        return Ok(());
    }

    print_model(path, &doc)
}

fn print_model(path: &Path, doc: &XdbDocument) -> anyhow::Result<()> {
    println!("Model");
    println!("=====");
    for (label, blob) in [
        ("Vertex buffer", doc.vertex_buffer()?),
        ("Index buffer", doc.index_buffer()?),
        ("Skeleton", doc.skeleton()?),
    ] {
        match blob {
            Some(blob) => println!("{label:14} segment {} ({} bytes)", blob.container_id, blob.byte_length),
            None => println!("{label:14} none"),
        }
    }

    let declarations = doc.vertex_declarations()?;
    println!();
    println!("Vertex declarations ({}):", declarations.len());
    for (i, layout) in declarations.iter().enumerate() {
        let components: Vec<String> = layout
            .components()
            .map(|(name, c)| format!("{name}@{}:{}", c.byte_offset, c.element_type.as_str()))
            .collect();
        println!("  [{i}] stride {:3} | {}", layout.stride, components.join(", "));
    }

    let elements = doc.model_elements()?;
    println!();
    println!("Model elements ({}):", elements.len());
    for element in &elements {
        println!(
            "  - {} ({} LODs, declaration {}, material {})",
            element.name,
            element.lods.len(),
            element.vertex_declaration_id,
            element.material_name
        );
        if let Some(texture) = &element.material.diffuse_texture {
            println!("      diffuse: {texture}");
        }
    }

    let bin_path = path.with_extension("bin");
    match Container::open(&bin_path) {
        Ok(container) => println!("\nContainer: {} segments", container.segment_count()),
        Err(e) => println!("\n(Could not read {}: {})", bin_path.display(), e),
    }

    Ok(())
}
