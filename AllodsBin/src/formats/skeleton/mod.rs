//! Skeleton decoding and bone hierarchy
//!
//! Bones live in a flat table addressed by position. Parent links are
//! indices into that table, with [`NO_PARENT`] marking a root. Nothing owns
//! anything else, so the hierarchy is rebuilt by index lookup only.
//!
//! Matrices are stored row-major with the translation in row 3 (row-vector
//! convention, `v' = v * M`). Converted to glam they become the equivalent
//! column-vector matrices, so a bone's world transform is
//! `parent_world * local` on the glam side.

mod hierarchy;
mod reader;

use glam::Mat4;
use serde::Serialize;

pub use reader::{BONE_NAME_SIZE, BONE_RECORD_SIZE};

/// Parent index of a root bone.
pub const NO_PARENT: u16 = 0xFFFF;

/// Bones with this in their name are attachment slots.
const SLOT_MARKER: &str = "Slot";

/// A bone record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bone {
    pub name: String,
    /// Position of the parent in the skeleton, or [`NO_PARENT`].
    pub parent_index: u16,
    /// Row-major local transform relative to the parent.
    pub local_matrix: [f32; 16],
    /// Row-major inverse of the bind-pose world transform.
    pub inverse_world_matrix: [f32; 16],
}

impl Bone {
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_index == NO_PARENT
    }

    #[must_use]
    pub fn is_slot(&self) -> bool {
        self.name.contains(SLOT_MARKER)
    }

    /// Local transform as a glam (column-vector) matrix.
    #[must_use]
    pub fn local(&self) -> Mat4 {
        Mat4::from_cols_array(&self.local_matrix)
    }

    /// Inverse world transform as a glam (column-vector) matrix.
    #[must_use]
    pub fn inverse_world(&self) -> Mat4 {
        Mat4::from_cols_array(&self.inverse_world_matrix)
    }

    /// Bind-pose world transform, `inverse(inverse_world)`.
    #[must_use]
    pub fn bind_world(&self) -> Mat4 {
        self.inverse_world().inverse()
    }
}

/// Flat, index-addressed bone table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Skeleton {
    pub bones: Vec<Bone>,
}

impl Skeleton {
    #[must_use]
    pub fn new(bones: Vec<Bone>) -> Self {
        Self { bones }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// Indices of bones kept by an import, dropping slot bones unless asked.
    #[must_use]
    pub fn visible_bones(&self, include_slots: bool) -> Vec<usize> {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, bone)| include_slots || !bone.is_slot())
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use glam::{Quat, Vec3};
    use pretty_assertions::assert_eq;

    fn record(name: &str, embedded_id: u16, parent: u16, local: Mat4, inverse_world: Mat4) -> Vec<u8> {
        let mut out = vec![0u8; BONE_NAME_SIZE];
        out[..name.len()].copy_from_slice(name.as_bytes());
        out.extend_from_slice(&embedded_id.to_le_bytes());
        out.extend_from_slice(&parent.to_le_bytes());
        for v in local.to_cols_array().iter().chain(inverse_world.to_cols_array().iter()) {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    fn buffer(records: &[Vec<u8>]) -> Vec<u8> {
        let mut out = (records.len() as u32).to_le_bytes().to_vec();
        for r in records {
            out.extend_from_slice(r);
        }
        out
    }

    fn chain_local(i: usize) -> Mat4 {
        Mat4::from_rotation_translation(
            Quat::from_rotation_z(0.3 * i as f32),
            Vec3::new(1.0, 0.5 * i as f32, 0.0),
        )
    }

    /// A chain where bone `i` is parented to bone `i - 1`, with the stored
    /// inverse world matrices computed from the composed locals.
    fn chain_buffer(n: usize) -> Vec<u8> {
        let mut world = Mat4::IDENTITY;
        let records: Vec<Vec<u8>> = (0..n)
            .map(|i| {
                let local = chain_local(i);
                world *= local;
                let parent = if i == 0 { NO_PARENT } else { (i - 1) as u16 };
                // Embedded ids are deliberately scrambled
                record(&format!("Bone{i}"), 100 - i as u16, parent, local, world.inverse())
            })
            .collect();
        buffer(&records)
    }

    #[test]
    fn test_record_size() {
        assert_eq!(BONE_RECORD_SIZE, 196);
    }

    #[test]
    fn test_decode_positional_identity() {
        let skeleton = Skeleton::decode(&chain_buffer(3)).unwrap();
        assert_eq!(skeleton.len(), 3);
        assert_eq!(skeleton.bones[0].name, "Bone0");
        assert!(skeleton.bones[0].is_root());
        assert_eq!(skeleton.bones[2].parent_index, 1);
        assert_eq!(skeleton.roots(), vec![0]);
        assert_eq!(skeleton.children(0), vec![1]);
        assert_eq!(skeleton.ancestors(2).unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_chain_world_matches_inverse_world() {
        let n = 6;
        let skeleton = Skeleton::decode(&chain_buffer(n)).unwrap();

        let worlds = skeleton.world_transforms().unwrap();
        let bind = skeleton.bind_world_transforms();
        let expected = (0..n).fold(Mat4::IDENTITY, |acc, i| acc * chain_local(i));

        assert!(worlds[n - 1].abs_diff_eq(expected, 1e-4));
        assert!(worlds[n - 1].abs_diff_eq(bind[n - 1], 1e-4));
        assert!(skeleton.compose_world(n - 1).unwrap().abs_diff_eq(expected, 1e-4));
        for i in 0..n {
            assert!(worlds[i].abs_diff_eq(bind[i], 1e-4), "bone {i}");
        }
    }

    #[test]
    fn test_self_parent_is_cyclic() {
        let records: Vec<Vec<u8>> = (0..5u16)
            .map(|i| {
                let parent = match i {
                    0 => NO_PARENT,
                    3 => 3,
                    _ => i - 1,
                };
                record("b", i, parent, Mat4::IDENTITY, Mat4::IDENTITY)
            })
            .collect();
        let skeleton = Skeleton::decode(&buffer(&records)).unwrap();

        assert!(matches!(skeleton.world_transforms(), Err(Error::CyclicHierarchy { bone: 3 })));
        assert!(matches!(skeleton.ancestors(4), Err(Error::CyclicHierarchy { bone: 4 })));
        assert!(skeleton.validate().is_err());
        assert_eq!(skeleton.depth_first_order(), vec![0, 1, 2]);
    }

    #[test]
    fn test_two_bone_cycle_and_bad_parent() {
        let cyclic = buffer(&[
            record("a", 0, 1, Mat4::IDENTITY, Mat4::IDENTITY),
            record("b", 1, 0, Mat4::IDENTITY, Mat4::IDENTITY),
        ]);
        let skeleton = Skeleton::decode(&cyclic).unwrap();
        assert!(matches!(skeleton.world_transforms(), Err(Error::CyclicHierarchy { .. })));

        let dangling = buffer(&[record("a", 0, 7, Mat4::IDENTITY, Mat4::IDENTITY)]);
        let skeleton = Skeleton::decode(&dangling).unwrap();
        assert!(matches!(
            skeleton.world_transforms(),
            Err(Error::InvalidParent { bone: 0, parent: 7, bone_count: 1 })
        ));
    }

    #[test]
    fn test_queries_reject_unknown_bone() {
        let skeleton = Skeleton::decode(&chain_buffer(2)).unwrap();

        assert!(matches!(skeleton.parent(2), Err(Error::BoneOutOfRange { index: 2, bone_count: 2 })));
        assert!(matches!(skeleton.ancestors(9), Err(Error::BoneOutOfRange { index: 9, .. })));
        assert!(matches!(skeleton.compose_world(usize::MAX), Err(Error::BoneOutOfRange { .. })));
        assert!(skeleton.children(5).is_empty());
    }

    #[test]
    fn test_truncated_record() {
        let mut data = chain_buffer(2);
        data.truncate(4 + BONE_RECORD_SIZE + 10);
        assert!(matches!(
            Skeleton::decode(&data),
            Err(Error::MalformedRecord { index: 1, offset: 200, expected: 196, actual: 10 })
        ));
        assert!(matches!(Skeleton::decode(&[1, 0]), Err(Error::MalformedRecord { .. })));
        assert!(Skeleton::decode(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_render_tree_hides_slots() {
        let data = buffer(&[
            record("Root", 0, NO_PARENT, Mat4::IDENTITY, Mat4::IDENTITY),
            record("Spine", 0, 0, Mat4::IDENTITY, Mat4::IDENTITY),
            record("WeaponSlot", 0, 1, Mat4::IDENTITY, Mat4::IDENTITY),
            record("Head", 0, 1, Mat4::IDENTITY, Mat4::IDENTITY),
        ]);
        let skeleton = Skeleton::decode(&data).unwrap();

        assert_eq!(skeleton.render_tree(false), "Root\n-- Spine\n-- -- Head\n");
        assert_eq!(
            skeleton.render_tree(true),
            "Root\n-- Spine\n-- -- WeaponSlot\n-- -- Head\n"
        );
        assert_eq!(skeleton.visible_bones(false), vec![0, 1, 3]);
    }
}
