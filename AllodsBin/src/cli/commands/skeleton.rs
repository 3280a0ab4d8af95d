//! Print a model's bone hierarchy

use std::path::Path;

use anyhow::Context;

use crate::container::Container;
use crate::formats::skeleton::Skeleton;
use crate::formats::xdb::read_xdb;

/// Decode the skeleton of a geometry XDB and print it as a tree.
///
/// # Errors
/// Returns an error if the model has no skeleton or it fails to decode.
pub fn execute(path: &Path, include_slots: bool) -> anyhow::Result<()> {
    let doc = read_xdb(path)?;
    let blob = doc
        .skeleton()?
        .with_context(|| format!("{} has no skeleton", path.display()))?;
    let container = Container::open(path.with_extension("bin"))?;
    let skeleton = Skeleton::decode(container.extract(blob)?)?;

    if let Err(e) = skeleton.validate() {
        println!("Warning: {e}");
    }

    println!("Skeleton: {} bones ({} roots)", skeleton.len(), skeleton.roots().len());
    println!();
    print!("{}", skeleton.render_tree(include_slots));

    Ok(())
}
