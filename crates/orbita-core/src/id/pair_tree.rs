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

//! A multitree directed acyclic graph of reusable IDs where new IDs can be
//! created from two other parent IDs.

use ahash::AHashMap;

use crate::error::CoreError;
use crate::id::{Handle, IdRegistry};

/// Sentinel for "this node has no parents".
const PAIR_NONE: u64 = u64::MAX;

/// Packs an unordered pair of handles into a canonical 64-bit key.
///
/// The larger index occupies the low half and the smaller the high half, so
/// `pair_key(a, b) == pair_key(b, a)`.
pub fn pair_key<I: Handle>(a: I, b: I) -> u64 {
    let larger = a.index().max(b.index());
    let smaller = a.index().min(b.index());
    u64::from(larger) | (u64::from(smaller) << 32)
}

fn unpack_pair<I: Handle>(key: u64) -> (I, I) {
    (
        I::from_index((key >> 32) as u32),
        I::from_index(key as u32),
    )
}

/// An [`IdRegistry`] whose handles can also be allocated as the child of an
/// unordered pair of existing handles.
///
/// The pair→child hash map is the authoritative relation; the per-node parent
/// keys and child counts are caches over it. A node may not be removed while
/// its child count is non-zero.
#[derive(Debug, Clone)]
pub struct PairKeyedIdTree<I> {
    ids: IdRegistry<I>,
    pair_to_child: AHashMap<u64, I>,
    parents: Vec<u64>,
    child_counts: Vec<u8>,
}

impl<I: Handle> Default for PairKeyedIdTree<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Handle> PairKeyedIdTree<I> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            ids: IdRegistry::new(),
            pair_to_child: AHashMap::new(),
            parents: Vec::new(),
            child_counts: Vec::new(),
        }
    }

    /// Allocates a handle with no parents.
    pub fn create_root(&mut self) -> Result<I, CoreError> {
        let id = self.ids.create()?;
        self.fit_caches();
        let slot = id.index() as usize;
        self.parents[slot] = PAIR_NONE;
        self.child_counts[slot] = 0;
        Ok(id)
    }

    /// Returns the child of `(a, b)`, creating it if the pair is new.
    ///
    /// The boolean is true exactly when the child was freshly created. Parent
    /// order does not matter. Creating a child of dead parents is a
    /// [`CoreError::LivenessViolation`]; pushing a parent's child count past
    /// its `u8` range is a hard [`CoreError::RefCountOverflow`] because the
    /// count guards deletion safety.
    pub fn create_or_get(&mut self, a: I, b: I) -> Result<(I, bool), CoreError> {
        for parent in [a, b] {
            if !self.ids.exists(parent) {
                return Err(CoreError::LivenessViolation {
                    kind: I::KIND,
                    index: parent.index(),
                });
            }
        }

        let key = pair_key(a, b);
        if let Some(&child) = self.pair_to_child.get(&key) {
            return Ok((child, false));
        }

        // Check both bumps up front so a failure cannot leave one applied.
        let gained = if a == b { 2u8 } else { 1u8 };
        for parent in [a, b] {
            if self.child_counts[parent.index() as usize]
                .checked_add(gained)
                .is_none()
            {
                return Err(CoreError::RefCountOverflow {
                    kind: I::KIND,
                    index: parent.index(),
                });
            }
        }

        let child = self.create_root()?;
        self.pair_to_child.insert(key, child);
        self.parents[child.index() as usize] = key;
        self.child_counts[a.index() as usize] += 1;
        self.child_counts[b.index() as usize] += 1;
        Ok((child, true))
    }

    /// Looks up the child of `(a, b)` without creating it.
    pub fn get(&self, a: I, b: I) -> Option<I> {
        self.pair_to_child.get(&pair_key(a, b)).copied()
    }

    /// Returns a node's parents, or `None` if it is a root (or dead).
    pub fn parents_of(&self, id: I) -> Option<(I, I)> {
        if !self.ids.exists(id) {
            return None;
        }
        let key = self.parents[id.index() as usize];
        (key != PAIR_NONE).then(|| unpack_pair(key))
    }

    /// Returns a node's current child count.
    pub fn child_count(&self, id: I) -> u8 {
        if self.ids.exists(id) {
            self.child_counts[id.index() as usize]
        } else {
            0
        }
    }

    /// Removes a node, unlinking it from the pair map and its parents.
    ///
    /// Removing a node whose child count is non-zero is a
    /// [`CoreError::LivenessViolation`]: children reach their parents through
    /// this node's pair key, so it must outlive them.
    pub fn remove(&mut self, id: I) -> Result<(), CoreError> {
        if !self.ids.exists(id) {
            return Err(CoreError::LivenessViolation {
                kind: I::KIND,
                index: id.index(),
            });
        }
        let slot = id.index() as usize;
        if self.child_counts[slot] != 0 {
            return Err(CoreError::LivenessViolation {
                kind: I::KIND,
                index: id.index(),
            });
        }

        let key = self.parents[slot];
        if key != PAIR_NONE {
            self.pair_to_child.remove(&key);
            let (p, q) = unpack_pair::<I>(key);
            for parent in [p, q] {
                let count = &mut self.child_counts[parent.index() as usize];
                *count = count.checked_sub(1).ok_or(CoreError::RefCountUnderflow {
                    kind: I::KIND,
                    index: parent.index(),
                })?;
            }
            self.parents[slot] = PAIR_NONE;
        }
        self.ids.remove(id)
    }

    /// Returns true if `id` designates a live node.
    pub fn exists(&self, id: I) -> bool {
        self.ids.exists(id)
    }

    /// Array size required to fit all currently existing handles.
    pub fn size_required(&self) -> u32 {
        self.ids.size_required()
    }

    /// The number of live nodes.
    pub fn len(&self) -> u32 {
        self.ids.len()
    }

    /// Returns true if no node is alive.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Raises the capacity to at least `n` nodes.
    pub fn reserve(&mut self, n: u32) {
        self.ids.reserve(n);
        self.pair_to_child.reserve(n as usize);
        self.parents.reserve(self.ids.capacity() as usize);
        self.child_counts.reserve(self.ids.capacity() as usize);
    }

    /// Raises the capacity so that `n` more nodes fit beyond the live ones.
    pub fn reserve_more(&mut self, n: u32) {
        self.ids.reserve_more(n);
        self.parents.reserve(self.ids.capacity() as usize);
        self.child_counts.reserve(self.ids.capacity() as usize);
    }

    /// Iterates over all live nodes in increasing index order.
    pub fn iter_live(&self) -> impl Iterator<Item = I> + '_ {
        self.ids.iter_live()
    }

    fn fit_caches(&mut self) {
        let required = self.ids.size_required() as usize;
        if self.parents.len() < required {
            self.parents.resize(required, PAIR_NONE);
            self.child_counts.resize(required, 0);
        }
    }
}
