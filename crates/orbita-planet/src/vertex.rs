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

//! The reference interpretation of the opaque mesh vertex buffer.
//!
//! The chunked mesh treats its vertex buffer as raw bytes; what a vertex
//! contains is the caller's business. [`PlanetVertex`] is the interpretation
//! the engine's own callbacks and the sandbox use.

use bytemuck::{Pod, Zeroable};

use orbita_core::math::Vec3;

use crate::chunked::{ChunkFillArgs, ChunkVrtxSubdivLUT};

/// A renderable terrain vertex: world-space position and surface normal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct PlanetVertex {
    /// World-space position.
    pub position: Vec3,
    /// Surface normal.
    pub normal: Vec3,
}

/// The reference fill callback: each fill vertex's position is the midpoint
/// of its two ancestors.
///
/// Normals, tangents, and other attributes are deliberately left untouched;
/// callers wanting them interpolate over the same ancestry themselves.
pub fn fill_vertex_midpoints(lut: &ChunkVrtxSubdivLUT, args: ChunkFillArgs<'_>) {
    let vertices: &mut [PlanetVertex] = bytemuck::cast_slice_mut(args.buffer);

    for entry in lut.entries() {
        let index_a = entry
            .ancestor_a
            .vertex_index(args.fill_first, args.shared_first, args.shared)
            as usize;
        let index_b = entry
            .ancestor_b
            .vertex_index(args.fill_first, args.shared_first, args.shared)
            as usize;

        let position_a = vertices[index_a].position;
        let position_b = vertices[index_b].position;

        let out = (args.fill_first + u32::from(entry.fill_out)) as usize;
        vertices[out].position = (position_a + position_b) * 0.5;
    }
}
