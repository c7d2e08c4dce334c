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

//! Bootstraps a planet skeleton from a regular icosahedron.
//!
//! Twelve root vertices and twenty root triangles, with positions held in
//! fixed-point planet space (world units scaled by `2^scale`) and unit
//! normals alongside. Subdivision vertices are projected back onto the sphere
//! by the `ico_calc_*` helpers, which mirror the skeleton's own midpoint
//! recursion so every created vertex receives a position.

use orbita_core::id::Handle;
use orbita_core::math::{Vec3, Vec3l};
use orbita_core::CoreError;

use crate::skeleton::{TriangleId, TriangleSkeleton, VertexId};

/// The golden ratio.
const PHI: f64 = 1.618_033_988_749_895;

/// Icosahedron corner directions before normalization: cyclic permutations of
/// (±1, ±φ, 0).
const CORNERS: [[f64; 3]; 12] = [
    [-1.0, PHI, 0.0],
    [1.0, PHI, 0.0],
    [-1.0, -PHI, 0.0],
    [1.0, -PHI, 0.0],
    [0.0, -1.0, PHI],
    [0.0, 1.0, PHI],
    [0.0, -1.0, -PHI],
    [0.0, 1.0, -PHI],
    [PHI, 0.0, -1.0],
    [PHI, 0.0, 1.0],
    [-PHI, 0.0, -1.0],
    [-PHI, 0.0, 1.0],
];

/// The twenty faces, counter-clockwise seen from outside, in five groups of
/// four. Root groups carry no parent; the group-of-four arrangement is purely
/// an allocation unit at depth 0.
const FACES: [[usize; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

/// A freshly-bootstrapped icosahedron skeleton with its caller-owned
/// position and normal arrays.
#[derive(Debug)]
pub struct IcosahedronSkeleton {
    /// The skeleton holding the root topology.
    pub skeleton: TriangleSkeleton,
    /// The twelve root vertices.
    pub vertices: [VertexId; 12],
    /// The twenty root triangles.
    pub triangles: [TriangleId; 20],
    /// Fixed-point positions, indexed by vertex.
    pub positions: Vec<Vec3l>,
    /// Unit normals, indexed by vertex.
    pub normals: Vec<Vec3>,
}

/// Creates a skeleton containing an icosahedron of the given radius, with
/// positions in fixed-point space at `2^scale` units per world unit.
pub fn create_skeleton_icosahedron(
    radius: f64,
    scale: u8,
) -> Result<IcosahedronSkeleton, CoreError> {
    let mut skeleton = TriangleSkeleton::new();

    let mut vertices = [VertexId::NULL; 12];
    for slot in &mut vertices {
        *slot = skeleton.vrtx_create_root()?;
    }

    let mut positions = vec![Vec3l::ZERO; 12];
    let mut normals = vec![Vec3::ZERO; 12];
    for (corner, vrtx) in CORNERS.iter().zip(vertices) {
        let (position, normal) = project_to_sphere(
            corner[0],
            corner[1],
            corner[2],
            radius,
            scale,
        );
        positions[vrtx.index() as usize] = position;
        normals[vrtx.index() as usize] = normal;
    }

    let mut triangles = [TriangleId::NULL; 20];
    for (group_index, faces) in FACES.chunks_exact(4).enumerate() {
        let corners = |face: &[usize; 3]| {
            [
                vertices[face[0]],
                vertices[face[1]],
                vertices[face[2]],
            ]
        };
        let group = skeleton.tri_group_create(
            0,
            TriangleId::NULL,
            [
                corners(&faces[0]),
                corners(&faces[1]),
                corners(&faces[2]),
                corners(&faces[3]),
            ],
        )?;
        for sibling in 0..4u8 {
            triangles[group_index * 4 + sibling as usize] = group.triangle(sibling);
        }
    }

    log::info!(
        "Icosahedron skeleton created: radius {radius}, scale 2^{scale}, \
         {} vertices, {} triangles",
        vertices.len(),
        triangles.len()
    );

    Ok(IcosahedronSkeleton {
        skeleton,
        vertices,
        triangles,
        positions,
        normals,
    })
}

/// Computes sphere-projected positions for the midpoint vertices returned by
/// [`TriangleSkeleton::vrtx_create_middles`].
///
/// `corners` and `middles` pair up the way the skeleton orders them:
/// `middles[0]` under `(corners[0], corners[1])`, `middles[1]` under
/// `(corners[1], corners[2])`, `middles[2]` under `(corners[2], corners[0])`.
/// The position arrays must already be sized to the skeleton's
/// `size_required()`.
pub fn ico_calc_middles(
    radius: f64,
    scale: u8,
    corners: &[VertexId; 3],
    middles: &[VertexId; 3],
    positions: &mut [Vec3l],
    normals: &mut [Vec3],
) {
    let pairs = [
        (corners[0], corners[1]),
        (corners[1], corners[2]),
        (corners[2], corners[0]),
    ];
    for ((a, b), mid) in pairs.into_iter().zip(middles) {
        let (position, normal) = project_midpoint(
            positions[a.index() as usize],
            positions[b.index() as usize],
            radius,
            scale,
        );
        positions[mid.index() as usize] = position;
        normals[mid.index() as usize] = normal;
    }
}

/// Computes sphere-projected positions along a chunk edge, mirroring the
/// subdivision order of
/// [`TriangleSkeleton::vrtx_create_chunk_edge_recurse`].
///
/// `chunk_edge` must hold the `2^level - 1` vertices that call produced for
/// the edge `(a, b)`, and the position arrays must already be sized to the
/// skeleton's `size_required()`.
#[allow(clippy::too_many_arguments)]
pub fn ico_calc_chunk_edge_recurse(
    radius: f64,
    scale: u8,
    level: u8,
    a: VertexId,
    b: VertexId,
    chunk_edge: &[VertexId],
    positions: &mut [Vec3l],
    normals: &mut [Vec3],
) -> Result<(), CoreError> {
    let expected = (1usize << level) - 1;
    if chunk_edge.len() != expected {
        return Err(CoreError::GeometryShapeMismatch {
            what: "chunk edge vertex array",
            expected,
            actual: chunk_edge.len(),
        });
    }
    calc_edge_recurse(radius, scale, level, a, b, chunk_edge, positions, normals);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn calc_edge_recurse(
    radius: f64,
    scale: u8,
    level: u8,
    a: VertexId,
    b: VertexId,
    chunk_edge: &[VertexId],
    positions: &mut [Vec3l],
    normals: &mut [Vec3],
) {
    if level == 0 {
        return;
    }
    let half = chunk_edge.len() / 2;
    let mid = chunk_edge[half];
    let (position, normal) = project_midpoint(
        positions[a.index() as usize],
        positions[b.index() as usize],
        radius,
        scale,
    );
    positions[mid.index() as usize] = position;
    normals[mid.index() as usize] = normal;

    calc_edge_recurse(
        radius,
        scale,
        level - 1,
        a,
        mid,
        &chunk_edge[..half],
        positions,
        normals,
    );
    calc_edge_recurse(
        radius,
        scale,
        level - 1,
        mid,
        b,
        &chunk_edge[half..],
        positions,
        normals,
    );
}

/// Projects the midpoint of two fixed-point positions back onto the sphere.
fn project_midpoint(a: Vec3l, b: Vec3l, radius: f64, scale: u8) -> (Vec3l, Vec3) {
    let mid = Vec3l::midpoint(a, b);
    project_to_sphere(mid.x as f64, mid.y as f64, mid.z as f64, radius, scale)
}

/// Normalizes a direction and scales it to a fixed-point sphere-surface
/// position; the intermediate math runs in `f64` so planetary radii keep
/// sub-unit precision.
fn project_to_sphere(x: f64, y: f64, z: f64, radius: f64, scale: u8) -> (Vec3l, Vec3) {
    let length = (x * x + y * y + z * z).sqrt();
    let (dir_x, dir_y, dir_z) = (x / length, y / length, z / length);
    let factor = radius * (scale as f64).exp2();
    let position = Vec3l::new(
        (dir_x * factor).round() as i64,
        (dir_y * factor).round() as i64,
        (dir_z * factor).round() as i64,
    );
    let normal = Vec3::new(dir_x as f32, dir_y as f32, dir_z as f32);
    (position, normal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use orbita_core::id::Handle;
    use orbita_core::math::EPSILON;

    #[test]
    fn test_bootstrap_counts() {
        let ico = create_skeleton_icosahedron(100.0, 10).unwrap();
        assert_eq!(ico.skeleton.tri_group_count(), 5);
        assert_eq!(ico.positions.len(), 12);
        assert!(ico.vertices.iter().all(|vrtx| !vrtx.is_null()));
        assert!(ico
            .triangles
            .iter()
            .all(|tri| ico.skeleton.tri_at(*tri).is_some()));
    }

    #[test]
    fn test_corner_normals_are_unit_length() {
        let ico = create_skeleton_icosahedron(100.0, 10).unwrap();
        for normal in &ico.normals {
            assert_relative_eq!(normal.length(), 1.0, epsilon = EPSILON);
        }
    }

    #[test]
    fn test_corners_sit_on_the_sphere() {
        let radius = 6_371.0;
        let scale = 10u8;
        let ico = create_skeleton_icosahedron(radius, scale).unwrap();
        for position in &ico.positions {
            let world = position.to_world(scale);
            assert_relative_eq!(
                world.length(),
                radius as f32,
                max_relative = 1e-4
            );
        }
    }

    #[test]
    fn test_every_face_uses_three_distinct_corners() {
        for face in FACES {
            assert!(face[0] != face[1] && face[1] != face[2] && face[0] != face[2]);
        }
        // Each corner participates in exactly five faces.
        let mut uses = [0u32; 12];
        for face in FACES {
            for corner in face {
                uses[corner] += 1;
            }
        }
        assert!(uses.iter().all(|&count| count == 5));
    }

    #[test]
    fn test_middles_project_back_onto_the_sphere() {
        let radius = 600.0;
        let scale = 12u8;
        let mut ico = create_skeleton_icosahedron(radius, scale).unwrap();
        let tri = ico.triangles[0];
        let corners = ico.skeleton.tri_at(tri).unwrap().vertices;
        let middles = ico.skeleton.vrtx_create_middles(&corners).unwrap();

        let required = ico.skeleton.vrtx_ids().size_required() as usize;
        ico.positions.resize(required, Vec3l::ZERO);
        ico.normals.resize(required, Vec3::ZERO);
        ico_calc_middles(
            radius,
            scale,
            &corners,
            &middles,
            &mut ico.positions,
            &mut ico.normals,
        );

        for mid in middles {
            let world = ico.positions[mid.index() as usize].to_world(scale);
            assert_relative_eq!(world.length(), radius as f32, max_relative = 1e-4);
        }
    }

    #[test]
    fn test_edge_positions_follow_the_recursion_order() {
        let radius = 600.0;
        let scale = 12u8;
        let level = 2u8;
        let mut ico = create_skeleton_icosahedron(radius, scale).unwrap();
        let corners = ico.skeleton.tri_at(ico.triangles[0]).unwrap().vertices;

        let mut edge = [VertexId::NULL; 3];
        ico.skeleton
            .vrtx_create_chunk_edge_recurse(level, corners[0], corners[1], &mut edge)
            .unwrap();

        let required = ico.skeleton.vrtx_ids().size_required() as usize;
        ico.positions.resize(required, Vec3l::ZERO);
        ico.normals.resize(required, Vec3::ZERO);
        ico_calc_chunk_edge_recurse(
            radius,
            scale,
            level,
            corners[0],
            corners[1],
            &edge,
            &mut ico.positions,
            &mut ico.normals,
        )
        .unwrap();

        for vrtx in edge {
            let world = ico.positions[vrtx.index() as usize].to_world(scale);
            assert_relative_eq!(world.length(), radius as f32, max_relative = 1e-4);
        }

        // The middle slot is the projected midpoint of the corner pair.
        let corner_a = ico.positions[corners[0].index() as usize];
        let corner_b = ico.positions[corners[1].index() as usize];
        let (expected_mid, _) = super::project_midpoint(corner_a, corner_b, radius, scale);
        assert_eq!(ico.positions[edge[1].index() as usize], expected_mid);
    }
}
