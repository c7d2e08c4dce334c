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

//! Kahn's algorithm over the dense tag dependency table.

use std::collections::VecDeque;

use orbita_core::id::Handle;

use crate::tags::{TagId, TaskTags};

/// An error indicating that a cycle was detected in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError;

/// Orders the registered tags so that every tag comes after the tags it
/// depends on.
///
/// The scheduler itself never needs this order, since per-tag counters encode
/// the same constraints. A cyclic graph would deadlock a frame, though, so
/// loaders run this once after populating a [`TaskTags`].
///
/// # Returns
///
/// * `Ok(Vec<TagId>)`: the tags in a valid dependency order.
/// * `Err(CycleError)`: if the graph contains one or more cycles.
pub fn dependency_order(tags: &TaskTags) -> Result<Vec<TagId>, CycleError> {
    let capacity = tags.tag_capacity() as usize;

    // 1. Build dependent lists and in-degree counts from the flat table.
    let mut dependents: Vec<Vec<TagId>> = vec![Vec::new(); capacity];
    let mut in_degree: Vec<usize> = vec![0; capacity];
    let mut tag_count = 0usize;

    for tag in tags.iter_tags() {
        tag_count += 1;
        for &dep in tags.tag_depends_of(tag) {
            if dep.is_null() {
                break;
            }
            dependents[dep.index() as usize].push(tag);
            in_degree[tag.index() as usize] += 1;
        }
    }

    // 2. Initialize the queue with all tags that depend on nothing.
    let mut queue: VecDeque<TagId> = tags
        .iter_tags()
        .filter(|tag| in_degree[tag.index() as usize] == 0)
        .collect();

    // 3. Process the queue.
    let mut sorted = Vec::with_capacity(tag_count);
    while let Some(tag) = queue.pop_front() {
        sorted.push(tag);
        for &dependent in &dependents[tag.index() as usize] {
            let degree = &mut in_degree[dependent.index() as usize];
            *degree -= 1;
            if *degree == 0 {
                queue.push_back(dependent);
            }
        }
    }

    // 4. Anything left over sits on a cycle.
    if sorted.len() != tag_count {
        Err(CycleError)
    } else {
        Ok(sorted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_orders_dependencies_first() {
        let mut tags = TaskTags::new(8, 1, 2);
        let a = tags.tag_create().unwrap();
        let b = tags.tag_create().unwrap();
        let c = tags.tag_create().unwrap();
        tags.tag_depend(c, b).unwrap();
        tags.tag_depend(b, a).unwrap();

        let order = dependency_order(&tags).unwrap();
        let position = |tag: TagId| order.iter().position(|&t| t == tag).unwrap();
        assert!(position(a) < position(b));
        assert!(position(b) < position(c));
    }

    #[test]
    fn test_two_tag_cycle_is_detected() {
        let mut tags = TaskTags::new(8, 1, 2);
        let a = tags.tag_create().unwrap();
        let b = tags.tag_create().unwrap();
        tags.tag_depend(a, b).unwrap();
        tags.tag_depend(b, a).unwrap();

        assert_eq!(dependency_order(&tags), Err(CycleError));
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let mut tags = TaskTags::new(8, 1, 2);
        let a = tags.tag_create().unwrap();
        tags.tag_depend(a, a).unwrap();

        assert_eq!(dependency_order(&tags), Err(CycleError));
    }
}
