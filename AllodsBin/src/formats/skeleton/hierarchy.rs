//! Parent/child queries and world transforms over a [`Skeleton`].

use glam::Mat4;

use super::{Skeleton, NO_PARENT};
use crate::error::{Error, Result};

impl Skeleton {
    /// Parent position of `index`, `None` for roots.
    ///
    /// # Errors
    /// Returns [`Error::BoneOutOfRange`] if `index` is not in the table and
    /// [`Error::InvalidParent`] if the stored parent is outside it.
    pub fn parent(&self, index: usize) -> Result<Option<usize>> {
        let parent = self
            .bones
            .get(index)
            .ok_or(Error::BoneOutOfRange {
                index,
                bone_count: self.bones.len(),
            })?
            .parent_index;
        if parent == NO_PARENT {
            return Ok(None);
        }
        if usize::from(parent) >= self.bones.len() {
            return Err(Error::InvalidParent {
                bone: index,
                parent,
                bone_count: self.bones.len(),
            });
        }
        Ok(Some(usize::from(parent)))
    }

    /// Direct children of `index`, in table order.
    #[must_use]
    pub fn children(&self, index: usize) -> Vec<usize> {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, bone)| usize::from(bone.parent_index) == index && bone.parent_index != NO_PARENT)
            .map(|(i, _)| i)
            .collect()
    }

    /// Bones without a parent, in table order.
    #[must_use]
    pub fn roots(&self) -> Vec<usize> {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, bone)| bone.is_root())
            .map(|(i, _)| i)
            .collect()
    }

    /// Ancestors of `index`, nearest first.
    ///
    /// The walk is bounded by the bone count.
    ///
    /// # Errors
    /// Returns [`Error::CyclicHierarchy`] if the chain does not reach a root
    /// within that bound, or [`Error::InvalidParent`].
    pub fn ancestors(&self, index: usize) -> Result<Vec<usize>> {
        let mut chain = Vec::new();
        let mut current = index;
        while let Some(parent) = self.parent(current)? {
            if chain.len() >= self.bones.len() {
                return Err(Error::CyclicHierarchy { bone: index });
            }
            chain.push(parent);
            current = parent;
        }
        Ok(chain)
    }

    /// World transform of one bone by composing its local matrix with every
    /// ancestor's, walking up to the root.
    ///
    /// # Errors
    /// Same as [`Skeleton::ancestors`].
    pub fn compose_world(&self, index: usize) -> Result<Mat4> {
        // Every position returned by `ancestors` was checked by `parent`
        let ancestors = self.ancestors(index)?;
        Ok(ancestors
            .iter()
            .fold(self.bones[index].local(), |world, &parent| self.bones[parent].local() * world))
    }

    /// World transforms of all bones, computed top-down from the roots with
    /// each bone's result cached for its descendants.
    ///
    /// # Errors
    /// Returns [`Error::CyclicHierarchy`] or [`Error::InvalidParent`].
    pub fn world_transforms(&self) -> Result<Vec<Mat4>> {
        let mut cache: Vec<Option<Mat4>> = vec![None; self.bones.len()];
        let mut pending = Vec::new();

        for index in 0..self.bones.len() {
            if cache[index].is_some() {
                continue;
            }

            // Collect uncached bones up to the first cached ancestor or a root
            pending.clear();
            let mut current = Some(index);
            let mut base = Mat4::IDENTITY;
            while let Some(bone) = current {
                if let Some(world) = cache[bone] {
                    base = world;
                    break;
                }
                if pending.len() >= self.bones.len() {
                    return Err(Error::CyclicHierarchy { bone: index });
                }
                pending.push(bone);
                current = self.parent(bone)?;
            }

            for &bone in pending.iter().rev() {
                base *= self.bones[bone].local();
                cache[bone] = Some(base);
            }
        }

        Ok(cache.into_iter().flatten().collect())
    }

    /// Bind-pose world transforms, `inverse(inverse_world)` per bone.
    #[must_use]
    pub fn bind_world_transforms(&self) -> Vec<Mat4> {
        self.bones.iter().map(super::Bone::bind_world).collect()
    }

    /// Check that every parent chain terminates at a root.
    ///
    /// # Errors
    /// Returns [`Error::CyclicHierarchy`] or [`Error::InvalidParent`].
    pub fn validate(&self) -> Result<()> {
        self.world_transforms().map(|_| ())
    }

    /// Depth-first ordering from the roots; children follow table order.
    ///
    /// Bones unreachable from a root (cycles, broken parents) are left out.
    #[must_use]
    pub fn depth_first_order(&self) -> Vec<usize> {
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); self.bones.len()];
        for (i, bone) in self.bones.iter().enumerate() {
            if let Some(list) = children.get_mut(usize::from(bone.parent_index)) {
                if !bone.is_root() {
                    list.push(i);
                }
            }
        }

        let mut order = Vec::with_capacity(self.bones.len());
        let mut stack: Vec<usize> = self.roots().into_iter().rev().collect();
        while let Some(idx) = stack.pop() {
            order.push(idx);
            for &child in children[idx].iter().rev() {
                stack.push(child);
            }
        }
        order
    }

    /// Text tree of the hierarchy, one bone per line, `-- ` per depth level.
    ///
    /// Slot bones and their subtrees are omitted unless `include_slots`.
    #[must_use]
    pub fn render_tree(&self, include_slots: bool) -> String {
        let mut out = String::new();
        let mut stack: Vec<(usize, usize)> = self.roots().into_iter().rev().map(|r| (r, 0)).collect();

        while let Some((idx, depth)) = stack.pop() {
            let bone = &self.bones[idx];
            if !include_slots && bone.is_slot() {
                continue;
            }
            out.push_str(&"-- ".repeat(depth));
            out.push_str(&bone.name);
            out.push('\n');
            for child in self.children(idx).into_iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }
}
