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

//! The chunked LOD mesh: renderable geometry for the currently resident
//! chunks, with boundary vertices shared between neighbors.
//!
//! A chunk covers one skeleton triangle at a fixed subdivision level. Its
//! boundary (three corners plus three edge runs) is deduplicated into shared
//! vertices that neighboring chunks reference by count; its interior fill
//! vertices belong to the chunk alone. The vertex byte buffer is split
//! accordingly: all chunk fill regions first, the shared region after them at
//! a stable offset.

mod lut;

pub use lut::{ChunkVrtxSubdivLUT, LutEntry, LutVertex};

use ahash::AHashMap;

use orbita_core::define_id;
use orbita_core::id::{Handle, IdRegistry};
use orbita_core::CoreError;

use crate::skeleton::{TriangleId, TriangleSkeleton, VertexId};

define_id! {
    /// Identifies a resident chunk.
    pub struct ChunkId
}

define_id! {
    /// Identifies a deduplicated boundary vertex.
    pub struct SharedVertexId
}

/// Everything a fill callback needs to write one chunk's interior vertices.
///
/// Indices are in vertex units; multiply by the configured vertex stride to
/// address `buffer` bytes.
pub struct ChunkFillArgs<'a> {
    /// The chunk being filled.
    pub chunk: ChunkId,
    /// The chunk's shared vertices in triangular order.
    pub shared: &'a [SharedVertexId],
    /// Number of fill vertices per chunk.
    pub fill_count: u16,
    /// First vertex index of this chunk's fill region.
    pub fill_first: u32,
    /// First vertex index of the shared region.
    pub shared_first: u32,
    /// The whole mesh vertex buffer.
    pub buffer: &'a mut [u8],
}

/// A chunked triangle mesh over a [`TriangleSkeleton`].
///
/// Geometry is fixed at construction: chunk capacity, subdivision level,
/// vertex byte stride, and the fixed-point scale exponent of the skeleton
/// positions this mesh consumes. The engine writes shared entries only inside
/// [`shared_update`](Self::shared_update) and fill entries only inside
/// [`chunk_calc_vrtx_fill`](Self::chunk_calc_vrtx_fill); readers get the
/// buffer between whole frames of updates.
#[derive(Debug)]
pub struct ChunkedMesh {
    level: u8,
    scale: u8,
    vertex_stride: usize,
    fill_per_chunk: u32,
    shared_per_chunk: u32,

    chunk_ids: IdRegistry<ChunkId, true>,
    /// Per chunk: its shared vertices in triangular order, `shared_per_chunk`
    /// entries per slot.
    chunk_shared: Vec<SharedVertexId>,
    /// Per chunk: the skeleton triangle it covers (held by refcount).
    chunk_tris: Vec<TriangleId>,

    shared_ids: IdRegistry<SharedVertexId, true>,
    shared_to_skel: Vec<VertexId>,
    skel_to_shared: AHashMap<VertexId, SharedVertexId>,
    shared_ref_counts: Vec<u8>,
    shared_newly_added: Vec<SharedVertexId>,

    lut: ChunkVrtxSubdivLUT,
    buffer: Vec<u8>,
}

impl ChunkedMesh {
    /// Creates a mesh for up to `chunk_capacity` chunks of subdivision level
    /// `level`, with `vertex_stride` bytes per vertex.
    ///
    /// `scale` is the fixed-point exponent of the skeleton positions this
    /// mesh consumes; callbacks apply `2^-scale` when converting to world
    /// units. The shared region is sized for the worst case of no
    /// deduplication at all.
    pub fn new(chunk_capacity: u32, level: u8, vertex_stride: usize, scale: u8) -> Self {
        let n = 1u32 << level;
        let edge = n - 1;
        let shared_per_chunk = 3 * edge + 3;
        let total_per_chunk = (n + 1) * (n + 2) / 2;
        let fill_per_chunk = total_per_chunk - shared_per_chunk;
        let shared_capacity = chunk_capacity * shared_per_chunk;
        let vertex_total = (chunk_capacity * fill_per_chunk + shared_capacity) as usize;

        log::info!(
            "ChunkedMesh created: {chunk_capacity} chunks at level {level}, \
             {fill_per_chunk} fill + {shared_per_chunk} shared vertices per chunk, \
             {} byte buffer",
            vertex_total * vertex_stride
        );

        Self {
            level,
            scale,
            vertex_stride,
            fill_per_chunk,
            shared_per_chunk,
            chunk_ids: IdRegistry::with_capacity(chunk_capacity),
            chunk_shared: vec![
                SharedVertexId::NULL;
                (chunk_capacity * shared_per_chunk) as usize
            ],
            chunk_tris: vec![TriangleId::NULL; chunk_capacity as usize],
            shared_ids: IdRegistry::with_capacity(shared_capacity),
            shared_to_skel: vec![VertexId::NULL; shared_capacity as usize],
            skel_to_shared: AHashMap::with_capacity(shared_capacity as usize),
            shared_ref_counts: vec![0; shared_capacity as usize],
            shared_newly_added: Vec::new(),
            lut: ChunkVrtxSubdivLUT::new(level),
            buffer: vec![0; vertex_total * vertex_stride],
        }
    }

    /// The subdivision level of every chunk.
    pub fn level(&self) -> u8 {
        self.level
    }

    /// The fixed-point scale exponent of consumed skeleton positions.
    pub fn scale(&self) -> u8 {
        self.scale
    }

    /// Bytes per vertex.
    pub fn vertex_stride(&self) -> usize {
        self.vertex_stride
    }

    /// Vertices along one chunk edge, excluding the corners.
    pub fn edge_vertices(&self) -> u32 {
        (1u32 << self.level) - 1
    }

    /// Fill vertices per chunk.
    pub fn fill_per_chunk(&self) -> u32 {
        self.fill_per_chunk
    }

    /// Shared vertices per chunk.
    pub fn shared_per_chunk(&self) -> u32 {
        self.shared_per_chunk
    }

    /// First vertex index of the shared region. Stable for the lifetime of
    /// the mesh.
    pub fn shared_offset(&self) -> u32 {
        self.chunk_ids.capacity() * self.fill_per_chunk
    }

    /// The fill-subdivision LUT for this mesh's level.
    pub fn lut(&self) -> &ChunkVrtxSubdivLUT {
        &self.lut
    }

    /// The raw vertex buffer, for upload once a frame's updates are complete.
    pub fn vertex_buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// The shared vertex backing a skeleton vertex, if one exists.
    pub fn shared_of_skel(&self, vrtx: VertexId) -> Option<SharedVertexId> {
        self.skel_to_shared.get(&vrtx).copied()
    }

    /// The skeleton vertex behind a shared vertex.
    pub fn skel_of_shared(&self, shared: SharedVertexId) -> Option<VertexId> {
        self.shared_ids.exists(shared).then(|| {
            self.shared_to_skel[shared.index() as usize]
        })
    }

    /// How many resident chunks touch a shared vertex.
    pub fn shared_refcount(&self, shared: SharedVertexId) -> u8 {
        if self.shared_ids.exists(shared) {
            self.shared_ref_counts[shared.index() as usize]
        } else {
            0
        }
    }

    /// A chunk's shared vertices in triangular order.
    pub fn chunk_shared_of(&self, chunk: ChunkId) -> Option<&[SharedVertexId]> {
        self.chunk_ids.exists(chunk).then(|| {
            let start = chunk.index() as usize * self.shared_per_chunk as usize;
            &self.chunk_shared[start..start + self.shared_per_chunk as usize]
        })
    }

    /// The number of resident chunks.
    pub fn chunk_count(&self) -> u32 {
        self.chunk_ids.len()
    }

    /// Creates a chunk over `tri`, whose three edge runs the caller has
    /// already subdivided to this mesh's level.
    ///
    /// Each edge array holds the `edge_vertices()` interior vertices of one
    /// triangle edge, oriented the way
    /// [`TriangleSkeleton::vrtx_create_chunk_edge_recurse`] writes them:
    /// `edge_a` from corner 0 to corner 1, `edge_b` from corner 1 to
    /// corner 2, `edge_c` from corner 2 back to corner 0. Every boundary
    /// vertex is turned into a shared vertex (created on first sight,
    /// reference-counted on reuse), and the chunk pins `tri` for as long as
    /// it is resident.
    pub fn chunk_create(
        &mut self,
        skeleton: &mut TriangleSkeleton,
        tri: TriangleId,
        edge_a: &[VertexId],
        edge_b: &[VertexId],
        edge_c: &[VertexId],
    ) -> Result<ChunkId, CoreError> {
        let edge_len = self.edge_vertices() as usize;
        for run in [edge_a, edge_b, edge_c] {
            if run.len() != edge_len {
                return Err(CoreError::GeometryShapeMismatch {
                    what: "chunk edge vertex array",
                    expected: edge_len,
                    actual: run.len(),
                });
            }
        }
        let corners = skeleton
            .tri_at(tri)
            .ok_or(CoreError::LivenessViolation {
                kind: TriangleId::KIND,
                index: tri.index(),
            })?
            .vertices;

        let chunk = self.chunk_ids.create()?;
        skeleton.tri_refcount_add(tri)?;
        self.chunk_tris[chunk.index() as usize] = tri;

        let mut cursor = chunk.index() as usize * self.shared_per_chunk as usize;
        for (corner, run) in corners.iter().zip([edge_a, edge_b, edge_c]) {
            self.chunk_shared[cursor] = self.shared_get_or_create(skeleton, *corner)?;
            cursor += 1;
            for vrtx in run {
                self.chunk_shared[cursor] = self.shared_get_or_create(skeleton, *vrtx)?;
                cursor += 1;
            }
        }

        log::trace!("{chunk} created over {tri}");
        Ok(chunk)
    }

    /// Removes a chunk, releasing its shared vertices and unpinning its
    /// triangle.
    ///
    /// Shared vertices whose count drops to zero are freed and their skeleton
    /// vertices released.
    pub fn chunk_remove(
        &mut self,
        skeleton: &mut TriangleSkeleton,
        chunk: ChunkId,
    ) -> Result<(), CoreError> {
        if !self.chunk_ids.exists(chunk) {
            return Err(CoreError::LivenessViolation {
                kind: ChunkId::KIND,
                index: chunk.index(),
            });
        }

        let start = chunk.index() as usize * self.shared_per_chunk as usize;
        for slot in start..start + self.shared_per_chunk as usize {
            let shared = self.chunk_shared[slot];
            self.chunk_shared[slot] = SharedVertexId::NULL;

            let count = &mut self.shared_ref_counts[shared.index() as usize];
            *count = count.checked_sub(1).ok_or(CoreError::RefCountUnderflow {
                kind: SharedVertexId::KIND,
                index: shared.index(),
            })?;
            if *count == 0 {
                let vrtx = self.shared_to_skel[shared.index() as usize];
                self.shared_to_skel[shared.index() as usize] = VertexId::NULL;
                self.skel_to_shared.remove(&vrtx);
                self.shared_newly_added.retain(|&pending| pending != shared);
                skeleton.vrtx_refcount_remove(vrtx)?;
                self.shared_ids.remove(shared)?;
            }
        }

        let tri = self.chunk_tris[chunk.index() as usize];
        self.chunk_tris[chunk.index() as usize] = TriangleId::NULL;
        skeleton.tri_refcount_remove(tri)?;

        log::trace!("{chunk} removed");
        self.chunk_ids.remove(chunk)
    }

    /// Hands freshly-created shared vertices to the caller for writing.
    ///
    /// The callback receives the newly-added shared IDs, the shared→skeleton
    /// vertex map, the shared-region offset in vertex units, and the raw
    /// buffer. This is the only point where shared entries are written; a
    /// shared entry is immutable once first written for a given skeleton
    /// vertex.
    pub fn shared_update<F>(&mut self, callback: F)
    where
        F: FnOnce(&[SharedVertexId], &[VertexId], u32, &mut [u8]),
    {
        let shared_first = self.chunk_ids.capacity() * self.fill_per_chunk;
        callback(
            &self.shared_newly_added,
            &self.shared_to_skel,
            shared_first,
            &mut self.buffer,
        );
        log::trace!(
            "shared_update wrote {} new shared vertices",
            self.shared_newly_added.len()
        );
        self.shared_newly_added.clear();
    }

    /// Computes a chunk's interior vertices by walking this mesh's
    /// [`ChunkVrtxSubdivLUT`].
    ///
    /// The callback receives the LUT and the chunk's [`ChunkFillArgs`]; the
    /// reference implementation writes each fill vertex as the midpoint of
    /// its two ancestors, but any attribute interpolation over the same
    /// ancestry is legal.
    pub fn chunk_calc_vrtx_fill<F>(
        &mut self,
        chunk: ChunkId,
        callback: F,
    ) -> Result<(), CoreError>
    where
        F: FnOnce(&ChunkVrtxSubdivLUT, ChunkFillArgs<'_>),
    {
        if !self.chunk_ids.exists(chunk) {
            return Err(CoreError::LivenessViolation {
                kind: ChunkId::KIND,
                index: chunk.index(),
            });
        }
        let start = chunk.index() as usize * self.shared_per_chunk as usize;
        let args = ChunkFillArgs {
            chunk,
            shared: &self.chunk_shared[start..start + self.shared_per_chunk as usize],
            fill_count: self.fill_per_chunk as u16,
            fill_first: chunk.index() * self.fill_per_chunk,
            shared_first: self.chunk_ids.capacity() * self.fill_per_chunk,
            buffer: &mut self.buffer,
        };
        callback(&self.lut, args);
        Ok(())
    }

    fn shared_get_or_create(
        &mut self,
        skeleton: &mut TriangleSkeleton,
        vrtx: VertexId,
    ) -> Result<SharedVertexId, CoreError> {
        if let Some(&shared) = self.skel_to_shared.get(&vrtx) {
            let count = &mut self.shared_ref_counts[shared.index() as usize];
            *count = count.checked_add(1).ok_or(CoreError::RefCountOverflow {
                kind: SharedVertexId::KIND,
                index: shared.index(),
            })?;
            return Ok(shared);
        }

        if !skeleton.vrtx_ids().exists(vrtx) {
            return Err(CoreError::LivenessViolation {
                kind: VertexId::KIND,
                index: vrtx.index(),
            });
        }
        let shared = self.shared_ids.create()?;
        self.shared_to_skel[shared.index() as usize] = vrtx;
        self.skel_to_shared.insert(vrtx, shared);
        self.shared_ref_counts[shared.index() as usize] = 1;
        skeleton.vrtx_refcount_add(vrtx)?;
        self.shared_newly_added.push(shared);
        Ok(shared)
    }
}
