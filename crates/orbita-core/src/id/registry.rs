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

//! Generates reusable sequential IDs.

use std::marker::PhantomData;

use crate::bitset::Bitset;
use crate::error::CoreError;
use crate::id::Handle;

/// Allocates dense handles of kind `I` and recycles freed slots.
///
/// Liveness is a dense bitmap; freed slot indices wait on a stack and are
/// reused before the high-water mark grows. Parallel per-slot arrays in the
/// owning structure are sized with [`size_required`](Self::size_required).
///
/// With `NO_AUTO_RESIZE = true` the registry refuses to grow past the
/// capacity set by [`with_capacity`](Self::with_capacity) / [`reserve`](Self::reserve)
/// and [`create`](Self::create) fails with [`CoreError::CapacityExceeded`]
/// instead. The invariant at all times: live population plus freed-stack
/// length equals the high-water mark.
#[derive(Debug, Clone)]
pub struct IdRegistry<I, const NO_AUTO_RESIZE: bool = false> {
    alive: Bitset,
    freed: Vec<u32>,
    high_water: u32,
    capacity: u32,
    _kind: PhantomData<I>,
}

impl<I: Handle, const NO_AUTO_RESIZE: bool> Default for IdRegistry<I, NO_AUTO_RESIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Handle, const NO_AUTO_RESIZE: bool> IdRegistry<I, NO_AUTO_RESIZE> {
    /// Creates an empty registry with zero capacity.
    pub fn new() -> Self {
        Self {
            alive: Bitset::new(),
            freed: Vec::new(),
            high_water: 0,
            capacity: 0,
            _kind: PhantomData,
        }
    }

    /// Creates an empty registry that can hold `capacity` handles.
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            alive: Bitset::with_bit_capacity(capacity),
            freed: Vec::new(),
            high_water: 0,
            capacity,
            _kind: PhantomData,
        }
    }

    /// Allocates a handle, reusing a freed slot if one is available.
    pub fn create(&mut self) -> Result<I, CoreError> {
        // Attempt to reuse a freed slot first.
        if let Some(index) = self.freed.pop() {
            self.alive.set(index);
            return Ok(I::from_index(index));
        }

        if NO_AUTO_RESIZE && self.high_water == self.capacity {
            return Err(CoreError::CapacityExceeded {
                kind: I::KIND,
                capacity: self.capacity,
            });
        }

        let index = self.high_water;
        self.high_water += 1;
        self.capacity = self.capacity.max(self.high_water);
        self.alive.set(index);
        Ok(I::from_index(index))
    }

    /// Returns a freed handle's slot to the free stack.
    ///
    /// Removing a handle that is not alive is a [`CoreError::LivenessViolation`].
    pub fn remove(&mut self, id: I) -> Result<(), CoreError> {
        if !self.exists(id) {
            return Err(CoreError::LivenessViolation {
                kind: I::KIND,
                index: id.index(),
            });
        }
        self.alive.clear(id.index());
        self.freed.push(id.index());
        Ok(())
    }

    /// Returns true if `id` designates a live slot.
    pub fn exists(&self, id: I) -> bool {
        !id.is_null() && id.index() < self.high_water && self.alive.is_set(id.index())
    }

    /// Array size required to fit all currently existing handles.
    pub fn size_required(&self) -> u32 {
        self.high_water
    }

    /// The number of live handles.
    pub fn len(&self) -> u32 {
        self.alive.count_ones()
    }

    /// Returns true if no handle is alive.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of slots the registry may address without growing.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Raises the capacity to at least `n` slots.
    pub fn reserve(&mut self, n: u32) {
        self.capacity = self.capacity.max(n);
    }

    /// Raises the capacity so that `n` more handles fit beyond the live ones.
    pub fn reserve_more(&mut self, n: u32) {
        self.reserve(self.high_water - self.freed.len() as u32 + n);
    }

    /// Iterates over all live handles in increasing index order.
    pub fn iter_live(&self) -> impl Iterator<Item = I> + '_ {
        self.alive.ones().map(I::from_index)
    }

    /// Iterates over dead slot indices below the high-water mark.
    pub fn iter_dead(&self) -> impl Iterator<Item = u32> + '_ {
        self.alive.zeros_up_to(self.high_water)
    }
}
