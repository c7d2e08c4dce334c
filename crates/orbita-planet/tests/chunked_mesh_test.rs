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

use approx::assert_relative_eq;
use orbita_core::id::Handle;
use orbita_core::math::{Vec3, Vec3l};
use orbita_core::CoreError;
use orbita_planet::icosahedron::{
    create_skeleton_icosahedron, ico_calc_chunk_edge_recurse, ico_calc_middles,
};
use orbita_planet::vertex::fill_vertex_midpoints;
use orbita_planet::{
    ChunkedMesh, PlanetVertex, TriangleId, TriangleSkeleton, VertexId,
};

const LEVEL: u8 = 2;
const SCALE: u8 = 10;
const RADIUS: f64 = 100.0;

/// Builds an icosahedron, subdivides its first triangle, and prepares the
/// edge runs of the child group's center triangle, positions included.
struct ChunkFixture {
    skeleton: TriangleSkeleton,
    positions: Vec<Vec3l>,
    normals: Vec<Vec3>,
    center_tri: TriangleId,
    edge_a: Vec<VertexId>,
    edge_b: Vec<VertexId>,
    edge_c: Vec<VertexId>,
}

impl ChunkFixture {
    fn build() -> Self {
        let ico = create_skeleton_icosahedron(RADIUS, SCALE).unwrap();
        let mut skeleton = ico.skeleton;
        let mut positions = ico.positions;
        let mut normals = ico.normals;

        let root = ico.triangles[0];
        let corners = skeleton.tri_at(root).unwrap().vertices;
        let middles = skeleton.vrtx_create_middles(&corners).unwrap();
        let children = skeleton.tri_subdiv(root, middles).unwrap();
        let center_tri = children.triangle(3);

        let resize = |skeleton: &TriangleSkeleton,
                          positions: &mut Vec<Vec3l>,
                          normals: &mut Vec<Vec3>| {
            let required = skeleton.vrtx_ids().size_required() as usize;
            positions.resize(required, Vec3l::ZERO);
            normals.resize(required, Vec3::ZERO);
        };
        resize(&skeleton, &mut positions, &mut normals);
        ico_calc_middles(RADIUS, SCALE, &corners, &middles, &mut positions, &mut normals);

        // Edges of the center triangle {m12, m20, m01}, oriented corner 0 to
        // corner 1, corner 1 to corner 2, corner 2 to corner 0.
        let center_corners = skeleton.tri_at(center_tri).unwrap().vertices;
        let edge_len = (1usize << LEVEL) - 1;
        let mut edges = [
            vec![VertexId::NULL; edge_len],
            vec![VertexId::NULL; edge_len],
            vec![VertexId::NULL; edge_len],
        ];
        for (run, (a, b)) in edges.iter_mut().zip([
            (center_corners[0], center_corners[1]),
            (center_corners[1], center_corners[2]),
            (center_corners[2], center_corners[0]),
        ]) {
            skeleton
                .vrtx_create_chunk_edge_recurse(LEVEL, a, b, run)
                .unwrap();
            resize(&skeleton, &mut positions, &mut normals);
            ico_calc_chunk_edge_recurse(
                RADIUS,
                SCALE,
                LEVEL,
                a,
                b,
                run,
                &mut positions,
                &mut normals,
            )
            .unwrap();
        }
        let [edge_a, edge_b, edge_c] = edges;

        Self {
            skeleton,
            positions,
            normals,
            center_tri,
            edge_a,
            edge_b,
            edge_c,
        }
    }

    fn create_chunk(&mut self, mesh: &mut ChunkedMesh) -> orbita_planet::ChunkId {
        mesh.chunk_create(
            &mut self.skeleton,
            self.center_tri,
            &self.edge_a,
            &self.edge_b,
            &self.edge_c,
        )
        .unwrap()
    }

    /// The standard shared-vertex writer: scale fixed-point positions into
    /// world space, copy normals.
    fn run_shared_update(&self, mesh: &mut ChunkedMesh) {
        let positions = &self.positions;
        let normals = &self.normals;
        mesh.shared_update(|newly_added, shared_to_skel, shared_first, buffer| {
            let vertices: &mut [PlanetVertex] = bytemuck::cast_slice_mut(buffer);
            for &shared in newly_added {
                let skel = shared_to_skel[shared.index() as usize];
                let slot = (shared_first + shared.index()) as usize;
                vertices[slot].position = positions[skel.index() as usize].to_world(SCALE);
                vertices[slot].normal = normals[skel.index() as usize];
            }
        });
    }
}

#[test]
fn test_derived_chunk_geometry() {
    let mesh = ChunkedMesh::new(4, LEVEL, std::mem::size_of::<PlanetVertex>(), SCALE);
    assert_eq!(mesh.edge_vertices(), 3);
    assert_eq!(mesh.shared_per_chunk(), 12);
    // 15 lattice vertices total at level 2, 12 of them on the boundary.
    assert_eq!(mesh.fill_per_chunk(), 3);
    assert_eq!(mesh.shared_offset(), 4 * 3);
    assert_eq!(
        mesh.vertex_buffer().len(),
        (4 * 3 + 4 * 12) * std::mem::size_of::<PlanetVertex>()
    );
}

#[test]
fn test_chunk_create_registers_shared_vertices() {
    let mut fixture = ChunkFixture::build();
    let mut mesh = ChunkedMesh::new(4, LEVEL, std::mem::size_of::<PlanetVertex>(), SCALE);

    let chunk = fixture.create_chunk(&mut mesh);

    let shared = mesh.chunk_shared_of(chunk).unwrap();
    assert_eq!(shared.len(), 12);
    assert!(shared.iter().all(|s| !s.is_null()));

    // A single chunk shares nothing yet: every boundary vertex has count 1
    // and pins its skeleton vertex.
    for &s in shared {
        assert_eq!(mesh.shared_refcount(s), 1);
        let skel = mesh.skel_of_shared(s).unwrap();
        assert!(fixture.skeleton.vrtx_refcount(skel) >= 1);
    }

    // The chunk pins its triangle.
    assert_eq!(fixture.skeleton.tri_refcount(fixture.center_tri), 1);
}

#[test]
fn test_neighboring_chunks_deduplicate_their_shared_edge() {
    // --- 1. SETUP ---
    // Two chunks over neighboring triangles of the same group: child 0 and
    // the inverted center share the edge (m01, m20).
    let mut fixture = ChunkFixture::build();
    let mut mesh = ChunkedMesh::new(4, LEVEL, std::mem::size_of::<PlanetVertex>(), SCALE);
    let chunk_center = fixture.create_chunk(&mut mesh);

    let group = fixture.center_tri.group();
    let child_0 = group.triangle(0);
    let child_corners = fixture.skeleton.tri_at(child_0).unwrap().vertices;
    let edge_len = (1usize << LEVEL) - 1;
    let mut edges = [
        vec![VertexId::NULL; edge_len],
        vec![VertexId::NULL; edge_len],
        vec![VertexId::NULL; edge_len],
    ];
    for (run, (a, b)) in edges.iter_mut().zip([
        (child_corners[0], child_corners[1]),
        (child_corners[1], child_corners[2]),
        (child_corners[2], child_corners[0]),
    ]) {
        fixture
            .skeleton
            .vrtx_create_chunk_edge_recurse(LEVEL, a, b, run)
            .unwrap();
    }

    // --- 2. ACTION ---
    let chunk_0 = mesh
        .chunk_create(
            &mut fixture.skeleton,
            child_0,
            &edges[0],
            &edges[1],
            &edges[2],
        )
        .unwrap();
    assert_ne!(chunk_0, chunk_center);

    // --- 3. ASSERTIONS ---
    // The shared edge of child 0 runs from m01 to m20: its interior vertices
    // and both endpoints are touched by both chunks.
    let m01 = child_corners[1];
    let m20 = child_corners[2];
    let mut boundary = vec![m01, m20];
    let mut interior = vec![VertexId::NULL; edge_len];
    fixture
        .skeleton
        .vrtx_create_chunk_edge_recurse(LEVEL, m01, m20, &mut interior)
        .unwrap();
    boundary.extend(interior);

    for vrtx in boundary {
        let shared = mesh
            .shared_of_skel(vrtx)
            .expect("Edge vertices must have shared entries");
        assert_eq!(
            mesh.shared_refcount(shared),
            2,
            "Both chunks must count the deduplicated vertex"
        );
    }

    // The maps stay one-to-one: total shared entries equal the union of both
    // chunks' boundaries, not the sum.
    let unique: std::collections::HashSet<_> = mesh
        .chunk_shared_of(chunk_0)
        .unwrap()
        .iter()
        .chain(mesh.chunk_shared_of(chunk_center).unwrap())
        .copied()
        .collect();
    // 12 + 12 boundary slots, 5 of them shared pairwise.
    assert_eq!(unique.len(), 19);
}

#[test]
fn test_shared_update_flushes_once() {
    let mut fixture = ChunkFixture::build();
    let mut mesh = ChunkedMesh::new(4, LEVEL, std::mem::size_of::<PlanetVertex>(), SCALE);
    fixture.create_chunk(&mut mesh);

    let mut first_batch = 0;
    mesh.shared_update(|newly_added, _, _, _| first_batch = newly_added.len());
    assert_eq!(first_batch, 12);

    // Without new chunks there is nothing left to write.
    let mut second_batch = usize::MAX;
    mesh.shared_update(|newly_added, _, _, _| second_batch = newly_added.len());
    assert_eq!(second_batch, 0);
}

#[test]
fn test_fill_vertices_are_ancestor_midpoints() {
    // --- 1. SETUP ---
    let mut fixture = ChunkFixture::build();
    let mut mesh = ChunkedMesh::new(4, LEVEL, std::mem::size_of::<PlanetVertex>(), SCALE);
    let chunk = fixture.create_chunk(&mut mesh);
    fixture.run_shared_update(&mut mesh);

    // --- 2. ACTION ---
    mesh.chunk_calc_vrtx_fill(chunk, fill_vertex_midpoints).unwrap();

    // --- 3. ASSERTIONS ---
    // Replay the LUT against the final buffer: every fill vertex must equal
    // the midpoint of its two ancestors.
    let shared: Vec<_> = mesh.chunk_shared_of(chunk).unwrap().to_vec();
    let fill_first = chunk.index() * mesh.fill_per_chunk();
    let shared_first = mesh.shared_offset();
    let entries: Vec<_> = mesh.lut().entries().to_vec();
    let vertices: &[PlanetVertex] = bytemuck::cast_slice(mesh.vertex_buffer());

    assert_eq!(entries.len(), mesh.fill_per_chunk() as usize);
    for entry in entries {
        let a = vertices
            [entry.ancestor_a.vertex_index(fill_first, shared_first, &shared) as usize]
            .position;
        let b = vertices
            [entry.ancestor_b.vertex_index(fill_first, shared_first, &shared) as usize]
            .position;
        let out = vertices[(fill_first + u32::from(entry.fill_out)) as usize].position;

        assert_relative_eq!(out.x, (a.x + b.x) * 0.5, epsilon = 1e-5);
        assert_relative_eq!(out.y, (a.y + b.y) * 0.5, epsilon = 1e-5);
        assert_relative_eq!(out.z, (a.z + b.z) * 0.5, epsilon = 1e-5);
        assert!(
            !out.is_zero(),
            "Fill vertices must actually be written"
        );
    }
}

#[test]
fn test_shared_vertices_receive_world_positions() {
    let mut fixture = ChunkFixture::build();
    let mut mesh = ChunkedMesh::new(4, LEVEL, std::mem::size_of::<PlanetVertex>(), SCALE);
    let chunk = fixture.create_chunk(&mut mesh);
    fixture.run_shared_update(&mut mesh);

    let vertices: &[PlanetVertex] = bytemuck::cast_slice(mesh.vertex_buffer());
    let shared_first = mesh.shared_offset();
    for &shared in mesh.chunk_shared_of(chunk).unwrap() {
        let vertex = vertices[(shared_first + shared.index()) as usize];
        // Every boundary vertex of the chunk sits on the sphere.
        assert_relative_eq!(
            vertex.position.length(),
            RADIUS as f32,
            max_relative = 1e-3
        );
        assert_relative_eq!(vertex.normal.length(), 1.0, epsilon = 1e-4);
    }
}

#[test]
fn test_chunk_remove_releases_everything() {
    let mut fixture = ChunkFixture::build();
    let mut mesh = ChunkedMesh::new(4, LEVEL, std::mem::size_of::<PlanetVertex>(), SCALE);
    let chunk = fixture.create_chunk(&mut mesh);

    let shared: Vec<_> = mesh.chunk_shared_of(chunk).unwrap().to_vec();
    let skels: Vec<_> = shared
        .iter()
        .map(|&s| mesh.skel_of_shared(s).unwrap())
        .collect();

    mesh.chunk_remove(&mut fixture.skeleton, chunk).unwrap();

    assert_eq!(mesh.chunk_count(), 0);
    assert_eq!(fixture.skeleton.tri_refcount(fixture.center_tri), 0);
    for (&s, &skel) in shared.iter().zip(&skels) {
        assert_eq!(mesh.shared_refcount(s), 0);
        assert_eq!(mesh.shared_of_skel(skel), None);
    }

    // A second removal is a liveness violation.
    let result = mesh.chunk_remove(&mut fixture.skeleton, chunk);
    assert!(matches!(result, Err(CoreError::LivenessViolation { .. })));
}

#[test]
fn test_chunk_capacity_is_enforced() {
    let mut fixture = ChunkFixture::build();
    let mut mesh = ChunkedMesh::new(1, LEVEL, std::mem::size_of::<PlanetVertex>(), SCALE);
    fixture.create_chunk(&mut mesh);

    let result = mesh.chunk_create(
        &mut fixture.skeleton,
        fixture.center_tri,
        &fixture.edge_a,
        &fixture.edge_b,
        &fixture.edge_c,
    );
    assert!(matches!(result, Err(CoreError::CapacityExceeded { .. })));
}

#[test]
fn test_wrong_edge_length_is_a_shape_mismatch() {
    let mut fixture = ChunkFixture::build();
    let mut mesh = ChunkedMesh::new(4, 3, std::mem::size_of::<PlanetVertex>(), SCALE);

    // Level-3 chunks want 7 vertices per edge; the fixture built 3.
    let result = mesh.chunk_create(
        &mut fixture.skeleton,
        fixture.center_tri,
        &fixture.edge_a,
        &fixture.edge_b,
        &fixture.edge_c,
    );
    assert!(matches!(
        result,
        Err(CoreError::GeometryShapeMismatch { .. })
    ));
}
