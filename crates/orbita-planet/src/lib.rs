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

//! # Orbita Planet
//!
//! Planetary terrain core: a subdividable triangle skeleton and a chunked LOD
//! mesher.
//!
//! The [`skeleton`] layer is pure topology: a reference-counted DAG of
//! vertices produced by pair subdivision, and a quad-tree of triangle groups.
//! It stores no positions; the caller keeps positions and normals in parallel
//! arrays indexed by [`skeleton::VertexId`]. The [`chunked`] layer
//! instantiates renderable geometry for the currently resident chunks only,
//! deduplicating boundary vertices between neighbors. [`icosahedron`]
//! bootstraps a sphere from twenty root triangles, and [`vertex`] holds the
//! reference vertex-buffer interpretation.

#![warn(missing_docs)]

pub mod chunked;
pub mod icosahedron;
pub mod skeleton;
pub mod vertex;

pub use chunked::{ChunkFillArgs, ChunkId, ChunkVrtxSubdivLUT, ChunkedMesh, SharedVertexId};
pub use skeleton::{
    SkeletonTriangle, SubdivSkeleton, TriangleGroup, TriangleGroupId, TriangleId,
    TriangleSkeleton, VertexId,
};
pub use vertex::PlanetVertex;
