use allodsbin::import::{batch_convert_textures, find_xdb_files};
use allodsbin::prelude::*;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use glam::{Mat4, Vec3};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const GEOMETRY_XDB: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Geometry>
  <binaryFile href="/Mechanics/Models/Chest.(Geometry).bin"/>
  <vertexBuffer><localID>0</localID><size>100</size></vertexBuffer>
  <indexBuffer><localID>1</localID><size>18</size></indexBuffer>
  <skeleton><localID>2</localID><size>592</size></skeleton>
  <vertexDeclarations>
    <Item>
      <position><offset>0</offset><type>FLOAT3</type></position>
      <texcoord0><offset>12</offset><type>FLOAT2</type></texcoord0>
      <stride>20</stride>
    </Item>
  </vertexDeclarations>
  <modelElements>
    <Item>
      <lods>
        <Item>
          <indexBufferBegin>0</indexBufferBegin><indexBufferEnd>12</indexBufferEnd>
          <vertexBufferBegin>0</vertexBufferBegin><vertexBufferEnd>5</vertexBufferEnd>
        </Item>
        <Item>
          <indexBufferBegin>12</indexBufferBegin><indexBufferEnd>18</indexBufferEnd>
          <vertexBufferBegin>0</vertexBufferBegin><vertexBufferEnd>3</vertexBufferEnd>
        </Item>
      </lods>
      <material>
        <diffuseTexture href="/Mechanics/Textures/Chest.xdb#xpointer(/Texture)"/>
      </material>
      <materialName>ChestMat</materialName>
      <name>Chest</name>
      <skinIndex>0</skinIndex>
      <vertexBufferOffset>0</vertexBufferOffset>
      <vertexDeclarationID>0</vertexDeclarationID>
      <virtualOffset>0</virtualOffset>
    </Item>
  </modelElements>
</Geometry>"#;

const TEXTURE_XDB: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Texture>
  <binaryFile href="/Mechanics/Textures/Chest.bin"/>
  <width>4</width>
  <height>4</height>
  <type>DXT1</type>
</Texture>"#;

/// DXT1 block, both endpoints pure red.
const RED_BLOCK: [u8; 8] = [0x00, 0xF8, 0x00, 0xF8, 0, 0, 0, 0];

fn framed(segments: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for segment in segments {
        out.extend_from_slice(&(segment.len() as u32).to_le_bytes());
        out.extend_from_slice(segment);
    }
    out
}

fn vertex_bytes() -> Vec<u8> {
    // Vertex 4 duplicates vertex 0
    let vertices: [[f32; 5]; 5] = [
        [0.0, 0.0, 0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0, 1.0, 0.0],
        [1.0, 1.0, 0.0, 1.0, 1.0],
        [0.0, 1.0, 0.0, 0.0, 1.0],
        [0.0, 0.0, 0.0, 0.0, 0.0],
    ];
    vertices.iter().flatten().flat_map(|v| v.to_le_bytes()).collect()
}

fn index_bytes() -> Vec<u8> {
    [[0u16, 1, 2], [4, 2, 3], [0, 1, 2]]
        .iter()
        .flatten()
        .flat_map(|i| i.to_le_bytes())
        .collect()
}

fn bone_record(name: &str, parent: u16, local: Mat4, world: Mat4) -> Vec<u8> {
    let mut out = vec![0u8; 64];
    out[..name.len()].copy_from_slice(name.as_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&parent.to_le_bytes());
    for v in local.to_cols_array().iter().chain(world.inverse().to_cols_array().iter()) {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

fn skeleton_bytes() -> Vec<u8> {
    let root = Mat4::from_translation(Vec3::new(0.0, 0.0, 1.0));
    let spine = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0));
    let slot = Mat4::from_translation(Vec3::new(0.5, 0.0, 0.0));

    let mut out = 3u32.to_le_bytes().to_vec();
    out.extend(bone_record("Root", NO_PARENT, root, root));
    out.extend(bone_record("Spine", 0, spine, root * spine));
    out.extend(bone_record("HandSlot", 1, slot, root * spine * slot));
    out
}

fn texture_stream() -> Vec<u8> {
    let mut raw = 0i32.to_le_bytes().to_vec();
    raw.extend_from_slice(&(RED_BLOCK.len() as i32).to_le_bytes());
    raw.extend_from_slice(&RED_BLOCK);

    let mut encoder = DeflateEncoder::new(vec![0x78, 0xDA], Compression::default());
    encoder.write_all(&raw).unwrap();
    encoder.finish().unwrap()
}

/// Lay out a resource tree with one model and its texture.
fn write_resources(root: &Path) -> PathBuf {
    let models = root.join("Mechanics/Models");
    let textures = root.join("Mechanics/Textures");
    std::fs::create_dir_all(&models).unwrap();
    std::fs::create_dir_all(&textures).unwrap();

    let model_xdb = models.join("Chest.(Geometry).xdb");
    std::fs::write(&model_xdb, GEOMETRY_XDB).unwrap();
    std::fs::write(
        models.join("Chest.(Geometry).bin"),
        framed(&[vertex_bytes(), index_bytes(), skeleton_bytes()]),
    )
    .unwrap();

    std::fs::write(textures.join("Chest.xdb"), TEXTURE_XDB).unwrap();
    std::fs::write(textures.join("Chest.bin"), texture_stream()).unwrap();

    model_xdb
}

#[test]
fn test_import_model_default_options() {
    let dir = tempdir().unwrap();
    let model_xdb = write_resources(dir.path());

    let mut cache = TextureCache::new();
    let model = import_model(&model_xdb, &ImportOptions::new(), &mut cache).unwrap();

    assert_eq!(model.name, "Chest");
    assert_eq!(model.base_dir, std::path::absolute(dir.path()).unwrap());
    assert!(model.warnings.is_empty(), "{:?}", model.warnings);
    assert_eq!(model.elements.len(), 1);

    let chest = &model.elements[0];
    assert_eq!(chest.lods.len(), 1);
    let mesh = &chest.lods[0].mesh;
    assert_eq!(mesh.vertices.len(), 4);
    assert_eq!(mesh.triangles, vec![[0, 1, 2], [0, 2, 3]]);
    assert_eq!(mesh.vertices[2].position, [1.0, 1.0, 0.0]);
    assert_eq!(mesh.vertices[3].texcoord0, [0.0, 1.0]);

    // Slot bone hidden by default
    assert_eq!(model.skeleton.len(), 3);
    assert_eq!(model.bones, vec![0, 1]);
    let worlds = model.skeleton.world_transforms().unwrap();
    assert!(worlds[1].abs_diff_eq(Mat4::from_translation(Vec3::new(0.0, 1.0, 1.0)), 1e-5));
    assert!(worlds[2].abs_diff_eq(model.skeleton.bind_world_transforms()[2], 1e-5));

    let texture_xdb = chest.diffuse_texture.clone().unwrap();
    assert!(texture_xdb.ends_with("Mechanics/Textures/Chest.xdb"));
    let texture = cache.get(&texture_xdb).unwrap();
    assert_eq!(texture.info, TextureInfo::new(4, 4, PixelFormat::Dxt1));
    assert_eq!(&texture.dds[..4], b"DDS ");
    assert_eq!(&texture.dds[128..], &RED_BLOCK);

    let png = dds_to_png(&texture.dds).unwrap();
    assert_eq!(&png[1..4], b"PNG");
}

#[test]
fn test_import_all_lods_with_slots() {
    let dir = tempdir().unwrap();
    let model_xdb = write_resources(dir.path());

    let options = ImportOptions::new()
        .with_lods(LodSelection::All)
        .with_slot_bones(true)
        .no_textures();
    let mut cache = TextureCache::new();
    let model = import_model(&model_xdb, &options, &mut cache).unwrap();

    let lods: Vec<usize> = model.elements[0].lods.iter().map(|l| l.lod).collect();
    assert_eq!(lods, vec![0, 1]);
    assert_eq!(model.elements[0].lods[1].mesh.triangles, vec![[0, 1, 2]]);
    assert_eq!(model.bones, vec![0, 1, 2]);
    assert!(cache.is_empty());
    assert_eq!(model.elements[0].diffuse_texture, None);
}

#[test]
fn test_import_missing_lod() {
    let dir = tempdir().unwrap();
    let model_xdb = write_resources(dir.path());

    let options = ImportOptions::new().with_lods(LodSelection::Only(2));
    let result = import_model(&model_xdb, &options, &mut TextureCache::new());
    assert!(matches!(result, Err(Error::NoLods { .. })));
}

#[test]
fn test_texture_cache_is_reused() {
    let dir = tempdir().unwrap();
    let model_xdb = write_resources(dir.path());

    let mut cache = TextureCache::new();
    import_model(&model_xdb, &ImportOptions::new(), &mut cache).unwrap();
    let first = cache.iter().next().map(|(_, t)| t.clone()).unwrap();

    // Remove the stream: a second import must be served from the cache
    std::fs::remove_file(dir.path().join("Mechanics/Textures/Chest.bin")).unwrap();
    let model = import_model(&model_xdb, &ImportOptions::new(), &mut cache).unwrap();

    assert!(model.warnings.is_empty());
    assert_eq!(cache.len(), 1);
    assert!(std::sync::Arc::ptr_eq(&first, cache.iter().next().unwrap().1));
}

#[test]
fn test_broken_texture_becomes_warning() {
    let dir = tempdir().unwrap();
    let model_xdb = write_resources(dir.path());
    std::fs::write(dir.path().join("Mechanics/Textures/Chest.bin"), [0x78, 0xDA, 0xFF]).unwrap();

    let model = import_model(&model_xdb, &ImportOptions::new(), &mut TextureCache::new()).unwrap();
    assert_eq!(model.warnings.len(), 1);
    assert_eq!(model.elements[0].diffuse_texture, None);
}

#[test]
fn test_truncated_container() {
    let dir = tempdir().unwrap();
    let model_xdb = write_resources(dir.path());
    let bin = model_xdb.with_extension("bin");
    let mut data = std::fs::read(&bin).unwrap();
    data.truncate(data.len() - 1);
    std::fs::write(&bin, data).unwrap();

    let result = import_model(&model_xdb, &ImportOptions::new(), &mut TextureCache::new());
    assert!(matches!(result, Err(Error::TruncatedSegment { index: 2, .. })));
}

#[test]
fn test_convert_texture_and_batch() {
    let dir = tempdir().unwrap();
    write_resources(dir.path());

    let texture_xdb = dir.path().join("Mechanics/Textures/Chest.xdb");
    let texture = convert_texture(&texture_xdb, dir.path(), &TextureOptions::new()).unwrap();
    assert_eq!(texture.binary, dir.path().join("Mechanics/Textures/Chest.bin"));
    assert_eq!(texture.dds.len(), 128 + RED_BLOCK.len());

    assert_eq!(find_xdb_files(dir.path()).len(), 2);
    let result = batch_convert_textures(dir.path(), true, &TextureOptions::new(), |_| {});
    assert_eq!(result.success_count, 1);
    assert_eq!(result.fail_count, 0);
    assert_eq!(result.skipped_count, 1);
    assert!(dir.path().join("Mechanics/Textures/Chest.dds").is_file());
    assert!(dir.path().join("Mechanics/Textures/Chest.png").is_file());
}

#[test]
fn test_segment_extraction_matches_xdb_refs() {
    let doc = XdbDocument::parse(GEOMETRY_XDB).unwrap();
    let container = Container::parse(framed(&[vertex_bytes(), index_bytes(), skeleton_bytes()])).unwrap();

    let vertices = container.extract(doc.vertex_buffer().unwrap().unwrap()).unwrap();
    assert_eq!(vertices.len(), 100);
    let layout = &doc.vertex_declarations().unwrap()[0];
    assert_eq!(decode_vertices(layout, vertices).unwrap().len(), 5);

    let triangles = decode_triangles(container.extract(doc.index_buffer().unwrap().unwrap()).unwrap());
    assert_eq!(triangles.len(), 3);

    let skeleton = Skeleton::decode(container.extract(doc.skeleton().unwrap().unwrap()).unwrap()).unwrap();
    assert_eq!(skeleton.render_tree(false), "Root\n-- Spine\n");
}
