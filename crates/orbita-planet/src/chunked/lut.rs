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

//! The chunk vertex subdivision LUT: the order and ancestry for computing a
//! chunk's fill vertices.

use super::SharedVertexId;
use orbita_core::id::Handle;

/// A tagged reference to one vertex slot of a chunk.
///
/// Shared slots index into the chunk's shared-vertex list (corners and edge
/// interiors in triangular order); fill slots index the chunk's own fill
/// region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LutVertex {
    /// Index into the chunk's shared-vertex list.
    Shared(u16),
    /// Index into the chunk's fill region.
    Fill(u16),
}

impl LutVertex {
    /// Resolves this reference to an index into the mesh vertex array.
    ///
    /// `fill_first` is the first vertex index of the chunk's fill region;
    /// `shared_first` is the first vertex index of the shared region;
    /// `chunk_shared` is the chunk's shared-vertex list.
    pub fn vertex_index(
        self,
        fill_first: u32,
        shared_first: u32,
        chunk_shared: &[SharedVertexId],
    ) -> u32 {
        match self {
            LutVertex::Fill(slot) => fill_first + u32::from(slot),
            LutVertex::Shared(slot) => {
                shared_first + chunk_shared[usize::from(slot)].index()
            }
        }
    }
}

/// One fill vertex to compute: the midpoint of its two ancestors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LutEntry {
    /// First ancestor.
    pub ancestor_a: LutVertex,
    /// Second ancestor.
    pub ancestor_b: LutVertex,
    /// The fill slot this entry produces.
    pub fill_out: u16,
}

/// The precomputed subdivision order for a chunk's interior vertices.
///
/// Built once per subdivision level and immutable afterwards. Entries are
/// ordered so that a fill slot is always produced before any later entry uses
/// it as an ancestor; walking the list front to back and writing each
/// `fill_out` as the midpoint of its ancestors fills the whole interior.
#[derive(Debug, Clone)]
pub struct ChunkVrtxSubdivLUT {
    entries: Vec<LutEntry>,
    level: u8,
    shared_count: u16,
    fill_count: u16,
}

/// Barycentric lattice coordinate: `x` counts rows from the top corner,
/// `y` counts columns leftwards-to-rightwards along a row, `0 <= y <= x`.
type Lattice = (u32, u32);

impl ChunkVrtxSubdivLUT {
    /// Builds the LUT for chunks of subdivision level `level`.
    pub fn new(level: u8) -> Self {
        let n = 1u32 << level;
        let edge = n - 1;
        let shared_count = (3 * edge + 3) as u16;

        // Every lattice point of the triangular patch, addressed by a
        // triangular row index. Boundary points are pre-seeded with their
        // shared-slot position in the chunk's triangular order:
        // corner 0, edge A interior, corner 1, edge B interior, corner 2,
        // edge C interior.
        let mut slots: Vec<Option<LutVertex>> =
            vec![None; Self::lattice_index((n, n)) + 1];

        slots[Self::lattice_index((0, 0))] = Some(LutVertex::Shared(0));
        for x in 1..n {
            // Edge A runs from corner 0 down the left side to corner 1.
            slots[Self::lattice_index((x, 0))] = Some(LutVertex::Shared(x as u16));
        }
        slots[Self::lattice_index((n, 0))] = Some(LutVertex::Shared((edge + 1) as u16));
        for y in 1..n {
            // Edge B runs along the bottom from corner 1 to corner 2.
            slots[Self::lattice_index((n, y))] =
                Some(LutVertex::Shared((edge + 1 + y) as u16));
        }
        slots[Self::lattice_index((n, n))] =
            Some(LutVertex::Shared((2 * edge + 2) as u16));
        for x in 1..n {
            // Edge C runs up the diagonal from corner 2 back to corner 0.
            slots[Self::lattice_index((x, x))] =
                Some(LutVertex::Shared((2 * edge + 2 + (n - x)) as u16));
        }

        let mut entries = Vec::new();
        let mut next_fill: u16 = 0;
        Self::subdiv_recurse(
            level,
            ((0, 0), LutVertex::Shared(0)),
            ((n, 0), LutVertex::Shared((edge + 1) as u16)),
            ((n, n), LutVertex::Shared((2 * edge + 2) as u16)),
            &mut slots,
            &mut entries,
            &mut next_fill,
        );

        Self {
            entries,
            level,
            shared_count,
            fill_count: next_fill,
        }
    }

    /// The ordered fill records.
    pub fn entries(&self) -> &[LutEntry] {
        &self.entries
    }

    /// The subdivision level this LUT was built for.
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Shared vertices per chunk at this level.
    pub fn shared_count(&self) -> u16 {
        self.shared_count
    }

    /// Fill vertices per chunk at this level.
    pub fn fill_count(&self) -> u16 {
        self.fill_count
    }

    fn lattice_index((x, y): Lattice) -> usize {
        (x * (x + 1) / 2 + y) as usize
    }

    /// Recursively subdivides the triangle `(a, b, c)`, allocating a fill
    /// slot for every interior midpoint the first time it appears.
    ///
    /// Corners of a sub-triangle were produced at a shallower depth, so every
    /// emitted entry's ancestors are already computable when the entry is
    /// reached in order.
    fn subdiv_recurse(
        level: u8,
        a: (Lattice, LutVertex),
        b: (Lattice, LutVertex),
        c: (Lattice, LutVertex),
        slots: &mut [Option<LutVertex>],
        entries: &mut Vec<LutEntry>,
        next_fill: &mut u16,
    ) {
        if level == 0 {
            return;
        }
        let mid_ab = Self::resolve_midpoint(a, b, slots, entries, next_fill);
        let mid_bc = Self::resolve_midpoint(b, c, slots, entries, next_fill);
        let mid_ca = Self::resolve_midpoint(c, a, slots, entries, next_fill);

        Self::subdiv_recurse(level - 1, a, mid_ab, mid_ca, slots, entries, next_fill);
        Self::subdiv_recurse(level - 1, mid_ab, b, mid_bc, slots, entries, next_fill);
        Self::subdiv_recurse(level - 1, mid_ca, mid_bc, c, slots, entries, next_fill);
        Self::subdiv_recurse(level - 1, mid_bc, mid_ca, mid_ab, slots, entries, next_fill);
    }

    fn resolve_midpoint(
        (coord_p, vrtx_p): (Lattice, LutVertex),
        (coord_q, vrtx_q): (Lattice, LutVertex),
        slots: &mut [Option<LutVertex>],
        entries: &mut Vec<LutEntry>,
        next_fill: &mut u16,
    ) -> (Lattice, LutVertex) {
        let mid = ((coord_p.0 + coord_q.0) / 2, (coord_p.1 + coord_q.1) / 2);
        let slot = Self::lattice_index(mid);
        if let Some(existing) = slots[slot] {
            return (mid, existing);
        }
        let fill = LutVertex::Fill(*next_fill);
        entries.push(LutEntry {
            ancestor_a: vrtx_p,
            ancestor_b: vrtx_q,
            fill_out: *next_fill,
        });
        *next_fill += 1;
        slots[slot] = Some(fill);
        (mid, fill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Interior vertices of the lattice: (n - 1)(n - 2) / 2 with n = 2^L.
    fn expected_fill_count(level: u8) -> u16 {
        let n = 1u32 << level;
        ((n - 1) * (n - 2) / 2) as u16
    }

    #[test]
    fn test_level_one_has_no_fill_vertices() {
        let lut = ChunkVrtxSubdivLUT::new(1);
        assert_eq!(lut.fill_count(), 0);
        assert!(lut.entries().is_empty());
        assert_eq!(lut.shared_count(), 6);
    }

    #[test]
    fn test_fill_counts_match_the_lattice() {
        for level in 1..=5u8 {
            let lut = ChunkVrtxSubdivLUT::new(level);
            assert_eq!(
                lut.fill_count(),
                expected_fill_count(level),
                "Wrong fill count at level {level}"
            );
            assert_eq!(lut.entries().len(), usize::from(lut.fill_count()));
            let edge = (1u16 << level) - 1;
            assert_eq!(lut.shared_count(), 3 * edge + 3);
        }
    }

    #[test]
    fn test_level_two_entries_descend_from_shared_ancestors() {
        // At level 2 the three fill vertices are the midpoints of the center
        // sub-triangle's corners, all of which are edge midpoints (shared).
        let lut = ChunkVrtxSubdivLUT::new(2);
        assert_eq!(lut.entries().len(), 3);
        for entry in lut.entries() {
            assert!(
                matches!(entry.ancestor_a, LutVertex::Shared(_)),
                "Level-2 fill ancestors are boundary vertices"
            );
            assert!(matches!(entry.ancestor_b, LutVertex::Shared(_)));
        }
    }

    #[test]
    fn test_ancestors_are_produced_before_use() {
        let lut = ChunkVrtxSubdivLUT::new(4);
        for entry in lut.entries() {
            for ancestor in [entry.ancestor_a, entry.ancestor_b] {
                if let LutVertex::Fill(slot) = ancestor {
                    assert!(
                        slot < entry.fill_out,
                        "Fill slot {slot} used before production by {}",
                        entry.fill_out
                    );
                }
            }
        }
    }

    #[test]
    fn test_fill_slots_are_dense_and_unique() {
        let lut = ChunkVrtxSubdivLUT::new(3);
        let mut seen = vec![false; usize::from(lut.fill_count())];
        for entry in lut.entries() {
            assert!(!seen[usize::from(entry.fill_out)], "Duplicate fill slot");
            seen[usize::from(entry.fill_out)] = true;
        }
        assert!(seen.iter().all(|&slot| slot), "Every fill slot is produced");
    }

    #[test]
    fn test_shared_references_stay_in_range() {
        let lut = ChunkVrtxSubdivLUT::new(3);
        for entry in lut.entries() {
            for ancestor in [entry.ancestor_a, entry.ancestor_b] {
                if let LutVertex::Shared(slot) = ancestor {
                    assert!(slot < lut.shared_count());
                }
            }
        }
    }

    #[test]
    fn test_vertex_index_resolution() {
        let chunk_shared = [SharedVertexId::from_index(9), SharedVertexId::from_index(2)];
        assert_eq!(LutVertex::Fill(3).vertex_index(100, 400, &chunk_shared), 103);
        assert_eq!(
            LutVertex::Shared(1).vertex_index(100, 400, &chunk_shared),
            402
        );
    }
}
