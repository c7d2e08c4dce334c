// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The subdivision skeleton: reference-counted vertices in a pair-subdivision
//! DAG, and reference-counted triangles in groups of four.
//!
//! Neither structure stores vertex data like positions or normals; those live
//! in caller-owned parallel arrays indexed by [`VertexId`].

use orbita_core::define_id;
use orbita_core::id::{Handle, IdRegistry, PairKeyedIdTree};
use orbita_core::CoreError;

define_id! {
    /// Identifies a topological vertex in the subdivision DAG.
    pub struct VertexId
}

define_id! {
    /// Identifies one skeleton triangle. Encodes its group and sibling index:
    /// `triangle = group * 4 + sibling`.
    pub struct TriangleId
}

define_id! {
    /// Identifies a group of four triangles created by one subdivision.
    pub struct TriangleGroupId
}

impl TriangleId {
    /// The group this triangle belongs to.
    pub fn group(self) -> TriangleGroupId {
        TriangleGroupId::from_index(self.index() / 4)
    }

    /// This triangle's sibling index within its group.
    pub fn sibling(self) -> u8 {
        (self.index() % 4) as u8
    }
}

impl TriangleGroupId {
    /// The triangle at `sibling` within this group.
    pub fn triangle(self, sibling: u8) -> TriangleId {
        debug_assert!(sibling < 4);
        TriangleId::from_index(self.index() * 4 + u32::from(sibling))
    }
}

/// One skeleton triangle.
///
/// Vertices are ordered counter-clockwise, starting from the top:
///
/// ```text
///          0
///         / \
///        /   \
///       /     \
///      1 _____ 2
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkeletonTriangle {
    /// The corner vertices: 0 top, 1 left, 2 right.
    pub vertices: [VertexId; 3],
    /// The group created by subdividing this triangle, if any.
    pub children: Option<TriangleGroupId>,
}

impl SkeletonTriangle {
    const BLANK: Self = Self {
        vertices: [VertexId::NULL; 3],
        children: None,
    };
}

/// Four triangles created and removed together by one subdivision.
///
/// ```text
///         /\
///        /  \
///       / t0 \
///      /______\
///     /\      /\
///    /  \ t3 /  \
///   / t1 \  / t2 \
///  /______\/______\
/// ```
///
/// Sibling 3 is upside-down; its "top" vertex is the bottom-middle one. This
/// arrangement does not necessarily apply to root groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriangleGroup {
    /// The triangles: 0 top, 1 left, 2 right, 3 center (inverted).
    pub triangles: [SkeletonTriangle; 4],
    /// The triangle this group was subdivided from, or
    /// [`TriangleId::NULL`] for root groups.
    pub parent: TriangleId,
    /// Subdivision depth; root groups sit at depth 0.
    pub depth: u8,
}

impl TriangleGroup {
    const BLANK: Self = Self {
        triangles: [SkeletonTriangle::BLANK; 4],
        parent: TriangleId::NULL,
        depth: 0,
    };
}

/// Reference-counted subdivision vertices over a [`PairKeyedIdTree`].
///
/// A vertex may be freed only once its reference count returns to zero;
/// triangles and chunks hold counts on every vertex they mention.
#[derive(Debug, Default, Clone)]
pub struct SubdivSkeleton {
    vrtx_ids: PairKeyedIdTree<VertexId>,
    // Access using VertexIds from vrtx_ids.
    vrtx_ref_counts: Vec<u8>,
}

impl SubdivSkeleton {
    /// Creates an empty skeleton.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a vertex with no parents.
    pub fn vrtx_create_root(&mut self) -> Result<VertexId, CoreError> {
        let vrtx = self.vrtx_ids.create_root()?;
        self.fit_ref_counts();
        self.vrtx_ref_counts[vrtx.index() as usize] = 0;
        Ok(vrtx)
    }

    /// Returns the midpoint child of `(a, b)`, creating it if the unordered
    /// pair has no child yet.
    pub fn vrtx_create_or_get_child(
        &mut self,
        a: VertexId,
        b: VertexId,
    ) -> Result<VertexId, CoreError> {
        let (vrtx, created) = self.vrtx_ids.create_or_get(a, b)?;
        if created {
            self.fit_ref_counts();
            self.vrtx_ref_counts[vrtx.index() as usize] = 0;
        }
        Ok(vrtx)
    }

    /// Adds one reference to a vertex.
    pub fn vrtx_refcount_add(&mut self, vrtx: VertexId) -> Result<(), CoreError> {
        if !self.vrtx_ids.exists(vrtx) {
            return Err(CoreError::LivenessViolation {
                kind: VertexId::KIND,
                index: vrtx.index(),
            });
        }
        let count = &mut self.vrtx_ref_counts[vrtx.index() as usize];
        *count = count.checked_add(1).ok_or(CoreError::RefCountOverflow {
            kind: VertexId::KIND,
            index: vrtx.index(),
        })?;
        Ok(())
    }

    /// Releases one reference to a vertex.
    pub fn vrtx_refcount_remove(&mut self, vrtx: VertexId) -> Result<(), CoreError> {
        if !self.vrtx_ids.exists(vrtx) {
            return Err(CoreError::LivenessViolation {
                kind: VertexId::KIND,
                index: vrtx.index(),
            });
        }
        let count = &mut self.vrtx_ref_counts[vrtx.index() as usize];
        *count = count.checked_sub(1).ok_or(CoreError::RefCountUnderflow {
            kind: VertexId::KIND,
            index: vrtx.index(),
        })?;
        Ok(())
    }

    /// A vertex's current reference count.
    pub fn vrtx_refcount(&self, vrtx: VertexId) -> u8 {
        if self.vrtx_ids.exists(vrtx) {
            self.vrtx_ref_counts[vrtx.index() as usize]
        } else {
            0
        }
    }

    /// The underlying vertex ID tree.
    pub fn vrtx_ids(&self) -> &PairKeyedIdTree<VertexId> {
        &self.vrtx_ids
    }

    /// Reserves room for `n` more vertices.
    pub fn vrtx_reserve_more(&mut self, n: u32) {
        self.vrtx_ids.reserve_more(n);
        self.vrtx_ref_counts
            .reserve(self.vrtx_ids.size_required() as usize);
    }

    fn fit_ref_counts(&mut self) {
        let required = self.vrtx_ids.size_required() as usize;
        if self.vrtx_ref_counts.len() < required {
            self.vrtx_ref_counts.resize(required, 0);
        }
    }
}

/// A subdividable mesh skeleton with reference-counted triangles and
/// vertices.
///
/// Triangle reference counts govern external pinning (a chunk exists only
/// while its triangle is held) but do not themselves delete anything;
/// deletion is a separate sweep invoked by the owner.
#[derive(Debug, Default, Clone)]
pub struct TriangleSkeleton {
    vrtx: SubdivSkeleton,
    tri_group_ids: IdRegistry<TriangleGroupId>,
    // Access using TriangleGroupIds from tri_group_ids.
    tri_groups: Vec<TriangleGroup>,
    tri_ref_counts: Vec<u8>,
}

impl TriangleSkeleton {
    /// Creates an empty skeleton.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a vertex with no parents.
    pub fn vrtx_create_root(&mut self) -> Result<VertexId, CoreError> {
        self.vrtx.vrtx_create_root()
    }

    /// Returns the midpoint child of `(a, b)`, creating it on first request.
    pub fn vrtx_create_or_get_child(
        &mut self,
        a: VertexId,
        b: VertexId,
    ) -> Result<VertexId, CoreError> {
        self.vrtx.vrtx_create_or_get_child(a, b)
    }

    /// Adds one reference to a vertex.
    pub fn vrtx_refcount_add(&mut self, vrtx: VertexId) -> Result<(), CoreError> {
        self.vrtx.vrtx_refcount_add(vrtx)
    }

    /// Releases one reference to a vertex.
    pub fn vrtx_refcount_remove(&mut self, vrtx: VertexId) -> Result<(), CoreError> {
        self.vrtx.vrtx_refcount_remove(vrtx)
    }

    /// A vertex's current reference count.
    pub fn vrtx_refcount(&self, vrtx: VertexId) -> u8 {
        self.vrtx.vrtx_refcount(vrtx)
    }

    /// The underlying vertex ID tree.
    pub fn vrtx_ids(&self) -> &PairKeyedIdTree<VertexId> {
        self.vrtx.vrtx_ids()
    }

    /// Creates the three edge-midpoint vertices of a triangle, in canonical
    /// order: (v0,v1), (v1,v2), (v2,v0).
    pub fn vrtx_create_middles(
        &mut self,
        vertices: &[VertexId; 3],
    ) -> Result<[VertexId; 3], CoreError> {
        Ok([
            self.vrtx_create_or_get_child(vertices[0], vertices[1])?,
            self.vrtx_create_or_get_child(vertices[1], vertices[2])?,
            self.vrtx_create_or_get_child(vertices[2], vertices[0])?,
        ])
    }

    /// Fills `out` with the midpoint subdivision sequence between `a` and
    /// `b`.
    ///
    /// `out` must hold exactly `2^level - 1` slots. The edge midpoint lands
    /// at the middle index and recursion refines the left and right halves
    /// inward, so `out` reads in order from `a` to `b`.
    pub fn vrtx_create_chunk_edge_recurse(
        &mut self,
        level: u8,
        a: VertexId,
        b: VertexId,
        out: &mut [VertexId],
    ) -> Result<(), CoreError> {
        let expected = (1usize << level) - 1;
        if out.len() != expected {
            return Err(CoreError::GeometryShapeMismatch {
                what: "chunk edge vertex array",
                expected,
                actual: out.len(),
            });
        }
        self.chunk_edge_recurse(level, a, b, out)
    }

    fn chunk_edge_recurse(
        &mut self,
        level: u8,
        a: VertexId,
        b: VertexId,
        out: &mut [VertexId],
    ) -> Result<(), CoreError> {
        if level == 0 {
            return Ok(());
        }
        let mid = self.vrtx_create_or_get_child(a, b)?;
        let half = out.len() / 2;
        out[half] = mid;
        // The right slice keeps `mid` at its head; deeper writes never touch
        // a slice's first slot again.
        self.chunk_edge_recurse(level - 1, a, mid, &mut out[..half])?;
        self.chunk_edge_recurse(level - 1, mid, b, &mut out[half..])
    }

    /// Allocates a triangle group, storing the four triangles and
    /// reference-holding all twelve vertex slots (duplicates counted
    /// independently).
    ///
    /// `parent` is [`TriangleId::NULL`] for root groups.
    pub fn tri_group_create(
        &mut self,
        depth: u8,
        parent: TriangleId,
        vertices: [[VertexId; 3]; 4],
    ) -> Result<TriangleGroupId, CoreError> {
        for corner in vertices.iter().flatten() {
            if !self.vrtx.vrtx_ids.exists(*corner) {
                return Err(CoreError::LivenessViolation {
                    kind: VertexId::KIND,
                    index: corner.index(),
                });
            }
        }

        let group_id = self.tri_group_ids.create()?;
        self.tri_group_resize_fit_ids();

        let group = &mut self.tri_groups[group_id.index() as usize];
        group.parent = parent;
        group.depth = depth;
        for (triangle, corners) in group.triangles.iter_mut().zip(vertices) {
            triangle.children = None;
            triangle.vertices = corners;
        }
        for sibling in 0..4u8 {
            self.tri_ref_counts[group_id.triangle(sibling).index() as usize] = 0;
        }

        for corner in vertices.iter().flatten() {
            self.vrtx.vrtx_refcount_add(*corner)?;
        }

        log::trace!("{group_id} created at depth {depth}");
        Ok(group_id)
    }

    /// Looks up a triangle, if its group is alive.
    pub fn tri_at(&self, tri: TriangleId) -> Option<&SkeletonTriangle> {
        if tri.is_null() || !self.tri_group_ids.exists(tri.group()) {
            return None;
        }
        Some(&self.tri_groups[tri.group().index() as usize].triangles[tri.sibling() as usize])
    }

    /// Looks up a triangle group.
    pub fn tri_group_at(&self, group: TriangleGroupId) -> Option<&TriangleGroup> {
        self.tri_group_ids
            .exists(group)
            .then(|| &self.tri_groups[group.index() as usize])
    }

    /// Subdivides a triangle into a child group built from its corners and
    /// the supplied edge midpoints `[m01, m12, m20]`.
    ///
    /// The children follow the corner/midpoint pattern: 0 = {v0, m01, m20},
    /// 1 = {m01, v1, m12}, 2 = {m20, m12, v2}, 3 (center, inverted) =
    /// {m12, m20, m01}. Subdividing an already-subdivided triangle is not
    /// permitted.
    pub fn tri_subdiv(
        &mut self,
        tri: TriangleId,
        middles: [VertexId; 3],
    ) -> Result<TriangleGroupId, CoreError> {
        let triangle = self
            .tri_at(tri)
            .ok_or(CoreError::LivenessViolation {
                kind: TriangleId::KIND,
                index: tri.index(),
            })?;
        if triangle.children.is_some() {
            return Err(CoreError::InvariantViolation {
                what: "triangle is already subdivided",
            });
        }
        let [v0, v1, v2] = triangle.vertices;
        let [m01, m12, m20] = middles;
        for vrtx in [v0, v1, v2, m01, m12, m20] {
            if !self.vrtx.vrtx_ids.exists(vrtx) {
                return Err(CoreError::InvariantViolation {
                    what: "subdivision vertex is not alive",
                });
            }
        }

        let parent_depth = self.tri_groups[tri.group().index() as usize].depth;
        let depth = parent_depth
            .checked_add(1)
            .ok_or(CoreError::InvariantViolation {
                what: "subdivision depth overflowed its u8 range",
            })?;

        let children = self.tri_group_create(
            depth,
            tri,
            [
                [v0, m01, m20],
                [m01, v1, m12],
                [m20, m12, v2],
                [m12, m20, m01],
            ],
        )?;

        self.tri_groups[tri.group().index() as usize].triangles[tri.sibling() as usize]
            .children = Some(children);
        Ok(children)
    }

    /// Adds one external reference to a triangle.
    pub fn tri_refcount_add(&mut self, tri: TriangleId) -> Result<(), CoreError> {
        if self.tri_at(tri).is_none() {
            return Err(CoreError::LivenessViolation {
                kind: TriangleId::KIND,
                index: tri.index(),
            });
        }
        let count = &mut self.tri_ref_counts[tri.index() as usize];
        *count = count.checked_add(1).ok_or(CoreError::RefCountOverflow {
            kind: TriangleId::KIND,
            index: tri.index(),
        })?;
        Ok(())
    }

    /// Releases one external reference to a triangle.
    pub fn tri_refcount_remove(&mut self, tri: TriangleId) -> Result<(), CoreError> {
        if self.tri_at(tri).is_none() {
            return Err(CoreError::LivenessViolation {
                kind: TriangleId::KIND,
                index: tri.index(),
            });
        }
        let count = &mut self.tri_ref_counts[tri.index() as usize];
        *count = count.checked_sub(1).ok_or(CoreError::RefCountUnderflow {
            kind: TriangleId::KIND,
            index: tri.index(),
        })?;
        Ok(())
    }

    /// A triangle's current external reference count.
    pub fn tri_refcount(&self, tri: TriangleId) -> u8 {
        if self.tri_at(tri).is_some() {
            self.tri_ref_counts[tri.index() as usize]
        } else {
            0
        }
    }

    /// The number of live triangle groups.
    pub fn tri_group_count(&self) -> u32 {
        self.tri_group_ids.len()
    }

    fn tri_group_resize_fit_ids(&mut self) {
        let required = self.tri_group_ids.size_required() as usize;
        if self.tri_groups.len() < required {
            self.tri_groups.resize(required, TriangleGroup::BLANK);
            self.tri_ref_counts.resize(required * 4, 0);
        }
    }
}
