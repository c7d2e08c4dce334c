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

//! Sandbox demo: one simulated frame of the Orbita engine core.
//!
//! Builds a frame's task description (input → physics → render tag chain),
//! drains it through the tag scheduler, then bootstraps an icosahedron
//! planet, subdivides one triangle, and meshes a chunk over it.

use anyhow::Result;

use orbita_core::bitset;
use orbita_core::id::Handle;
use orbita_core::math::{Vec3, Vec3l};
use orbita_planet::icosahedron::{
    create_skeleton_icosahedron, ico_calc_chunk_edge_recurse, ico_calc_middles,
};
use orbita_planet::vertex::fill_vertex_midpoints;
use orbita_planet::{ChunkedMesh, PlanetVertex, TriangleSkeleton, VertexId};
use orbita_tasks::{
    task_enqueue, task_finish, task_list_available, task_start, ExecutionContext, TaskId, TaskTags,
};

/// Chunk subdivision level: 2^4 triangles per chunk edge.
const CHUNK_LEVEL: u8 = 4;
/// Fixed-point scale exponent for skeleton positions.
const SCALE: u8 = 10;
/// Planet radius in world units.
const RADIUS: f64 = 6_371.0;

fn run_frame_tasks() -> Result<()> {
    // The loader would populate this once; here a frame has three stages.
    let mut tags = TaskTags::new(8, 16, 4);
    let tag_input = tags.tag_create()?;
    let tag_physics = tags.tag_create()?;
    let tag_render = tags.tag_create()?;
    tags.tag_depend(tag_physics, tag_input)?;
    tags.tag_depend(tag_render, tag_physics)?;

    let names = ["poll_input", "step_physics", "integrate_bodies", "draw_scene"];
    let mut tasks = Vec::new();
    for (name, carried) in names.iter().zip([
        vec![tag_input],
        vec![tag_physics],
        vec![tag_physics],
        vec![tag_render],
    ]) {
        tasks.push((tags.task_create(&carried)?, *name));
    }
    tags.validate()?;

    let mut exec = ExecutionContext::new(&tags);
    let mut query = vec![0u64; tags.tag_ints_per_task()];
    for tag in [tag_input, tag_physics, tag_render] {
        bitset::set(&mut query, tag.index());
    }
    task_enqueue(&tags, &mut exec, &query)?;

    let mut wave_bits = vec![0u64; tags.task_ints()];
    let mut wave_index = 0;
    loop {
        task_list_available(&tags, &mut exec, &mut wave_bits)?;
        let wave: Vec<TaskId> = bitset::iter_ones(&wave_bits).map(TaskId::from_index).collect();
        if wave.is_empty() {
            break;
        }
        wave_index += 1;
        for task in wave {
            task_start(&tags, &mut exec, task)?;
            // A real executor would hand the task to a worker here.
            let name = tasks
                .iter()
                .find(|(id, _)| *id == task)
                .map(|(_, name)| *name)
                .unwrap_or("?");
            log::info!("wave {wave_index}: ran {name}");
            task_finish(&tags, &mut exec, task)?;
        }
    }
    log::info!("frame drained in {wave_index} waves");
    Ok(())
}

fn build_planet_chunk() -> Result<()> {
    let ico = create_skeleton_icosahedron(RADIUS, SCALE)?;
    let mut skeleton = ico.skeleton;
    let mut positions = ico.positions;
    let mut normals = ico.normals;

    // Subdivide the first root triangle and mesh a chunk over the inverted
    // center child.
    let root = ico.triangles[0];
    let corners = skeleton.tri_at(root).expect("root triangle exists").vertices;
    let middles = skeleton.vrtx_create_middles(&corners)?;
    let children = skeleton.tri_subdiv(root, middles)?;
    let center_tri = children.triangle(3);

    resize_vertex_data(&skeleton, &mut positions, &mut normals);
    ico_calc_middles(RADIUS, SCALE, &corners, &middles, &mut positions, &mut normals);

    let center_corners = skeleton
        .tri_at(center_tri)
        .expect("freshly subdivided child exists")
        .vertices;
    let edge_len = (1usize << CHUNK_LEVEL) - 1;
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
        skeleton.vrtx_create_chunk_edge_recurse(CHUNK_LEVEL, a, b, run)?;
        resize_vertex_data(&skeleton, &mut positions, &mut normals);
        ico_calc_chunk_edge_recurse(
            RADIUS,
            SCALE,
            CHUNK_LEVEL,
            a,
            b,
            run,
            &mut positions,
            &mut normals,
        )?;
    }

    let mut mesh = ChunkedMesh::new(10, CHUNK_LEVEL, std::mem::size_of::<PlanetVertex>(), SCALE);
    let chunk = mesh.chunk_create(&mut skeleton, center_tri, &edges[0], &edges[1], &edges[2])?;

    mesh.shared_update(|newly_added, shared_to_skel, shared_first, buffer| {
        let vertices: &mut [PlanetVertex] = bytemuck::cast_slice_mut(buffer);
        for &shared in newly_added {
            let skel = shared_to_skel[shared.index() as usize];
            let slot = (shared_first + shared.index()) as usize;
            vertices[slot].position = positions[skel.index() as usize].to_world(SCALE);
            vertices[slot].normal = normals[skel.index() as usize];
        }
    });

    mesh.chunk_calc_vrtx_fill(chunk, fill_vertex_midpoints)?;

    let written = bytemuck::cast_slice::<u8, PlanetVertex>(mesh.vertex_buffer())
        .iter()
        .filter(|vertex| !vertex.position.is_zero())
        .count();
    log::info!(
        "{chunk}: {} shared + {} fill vertices per chunk, {written} vertices written",
        mesh.shared_per_chunk(),
        mesh.fill_per_chunk(),
    );
    Ok(())
}

fn resize_vertex_data(
    skeleton: &TriangleSkeleton,
    positions: &mut Vec<Vec3l>,
    normals: &mut Vec<Vec3>,
) {
    let required = skeleton.vrtx_ids().size_required() as usize;
    positions.resize(required, Vec3l::ZERO);
    normals.resize(required, Vec3::ZERO);
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    run_frame_tasks()?;
    build_planet_chunk()?;
    Ok(())
}
