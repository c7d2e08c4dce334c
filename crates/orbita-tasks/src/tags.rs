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

//! The static description of tasks, tags, and tag dependencies.

use orbita_core::bitset;
use orbita_core::define_id;
use orbita_core::id::{Handle, IdRegistry};
use orbita_core::CoreError;

use crate::graph;

define_id! {
    /// Identifies a tag: a named condition carried by zero or more tasks.
    pub struct TagId
}

define_id! {
    /// Identifies a task: a unit of work with a static set of tags.
    pub struct TaskId
}

/// The static tag/task description consumed by the scheduler operations.
///
/// Capacities are fixed at construction so the packed layout is stable: task
/// `t`'s tag bits occupy words `[t·W, (t+1)·W)` of the tag matrix where
/// `W = tag_ints_per_task()`, and tag `g`'s dependency list occupies the
/// fixed-stride slice `[g·D, (g+1)·D)` of the dependency array, terminated by
/// [`TagId::NULL`].
///
/// A `TaskTags` is populated once by the loader and treated as immutable by
/// the per-frame operations.
#[derive(Debug, Clone)]
pub struct TaskTags {
    tags: IdRegistry<TagId, true>,
    tasks: IdRegistry<TaskId, true>,
    /// Row-major packed tag membership, one row of `tag_ints_per_task` words
    /// per task slot.
    task_tag_words: Vec<u64>,
    /// Flat dependency lists, `depends_per_tag` entries per tag slot.
    tag_depends: Vec<TagId>,
    depends_per_tag: usize,
    tag_words_per_task: usize,
    task_words: usize,
}

impl TaskTags {
    /// Creates a description with room for `max_tags` tags and `max_tasks`
    /// tasks, each tag declaring at most `depends_per_tag` dependencies.
    pub fn new(max_tags: u32, max_tasks: u32, depends_per_tag: usize) -> Self {
        let tag_words_per_task = (max_tags as usize).div_ceil(u64::BITS as usize).max(1);
        let task_words = (max_tasks as usize).div_ceil(u64::BITS as usize).max(1);
        log::info!(
            "TaskTags created: capacity {max_tags} tags, {max_tasks} tasks, \
             {depends_per_tag} depends per tag"
        );
        Self {
            tags: IdRegistry::with_capacity(max_tags),
            tasks: IdRegistry::with_capacity(max_tasks),
            task_tag_words: vec![0; max_tasks as usize * tag_words_per_task],
            tag_depends: vec![TagId::NULL; max_tags as usize * depends_per_tag],
            depends_per_tag,
            tag_words_per_task,
            task_words,
        }
    }

    /// Registers a new tag.
    pub fn tag_create(&mut self) -> Result<TagId, CoreError> {
        let tag = self.tags.create()?;
        // A recycled slot may hold a stale dependency list.
        let depends = self.tag_depends_slot(tag);
        self.tag_depends[depends].fill(TagId::NULL);
        Ok(tag)
    }

    /// Registers a new task carrying the given tags.
    ///
    /// A task with no tags is legal but can never match an enqueue query.
    pub fn task_create(&mut self, carried: &[TagId]) -> Result<TaskId, CoreError> {
        for &tag in carried {
            if !self.tags.exists(tag) {
                return Err(CoreError::LivenessViolation {
                    kind: TagId::KIND,
                    index: tag.index(),
                });
            }
        }
        let task = self.tasks.create()?;
        let row = self.task_row_range(task);
        self.task_tag_words[row.clone()].fill(0);
        for &tag in carried {
            bitset::set(&mut self.task_tag_words[row.clone()], tag.index());
        }
        Ok(task)
    }

    /// Declares that `tag` depends on `depends_on`.
    ///
    /// No task carrying `tag` becomes eligible while any enqueued task
    /// carrying `depends_on` is incomplete. Dependencies are not transitive.
    pub fn tag_depend(&mut self, tag: TagId, depends_on: TagId) -> Result<(), CoreError> {
        if !self.tags.exists(tag) || !self.tags.exists(depends_on) {
            return Err(CoreError::InvariantViolation {
                what: "tag dependency refers to an unknown tag",
            });
        }
        let slot = self.tag_depends_slot(tag);
        let list = &mut self.tag_depends[slot];
        match list.iter().position(|dep| dep.is_null()) {
            Some(free) => {
                list[free] = depends_on;
                Ok(())
            }
            None => Err(CoreError::CapacityExceeded {
                kind: "tag dependency list",
                capacity: self.depends_per_tag as u32,
            }),
        }
    }

    /// Checks the dependency graph for cycles.
    ///
    /// A cyclic graph would leave its tags permanently disallowed; loaders
    /// should validate once after population.
    pub fn validate(&self) -> Result<(), CoreError> {
        match graph::dependency_order(self) {
            Ok(_) => Ok(()),
            Err(graph::CycleError) => {
                log::error!("TaskTags dependency graph contains a cycle");
                Err(CoreError::InvariantViolation {
                    what: "tag dependency graph contains a cycle",
                })
            }
        }
    }

    /// Words per packed per-task tag row.
    pub fn tag_ints_per_task(&self) -> usize {
        self.tag_words_per_task
    }

    /// Words required for a tasks-available output bitset.
    pub fn task_ints(&self) -> usize {
        self.task_words
    }

    /// Dependency-list stride per tag.
    pub fn depends_per_tag(&self) -> usize {
        self.depends_per_tag
    }

    /// The packed tag row of one task.
    pub fn task_tag_row(&self, task: TaskId) -> &[u64] {
        let row = self.task_row_range(task);
        &self.task_tag_words[row]
    }

    /// The dependency list of one tag, including its null terminator region.
    pub fn tag_depends_of(&self, tag: TagId) -> &[TagId] {
        let slot = self.tag_depends_slot(tag);
        &self.tag_depends[slot]
    }

    /// Returns true if `task` designates a registered task.
    pub fn task_exists(&self, task: TaskId) -> bool {
        self.tasks.exists(task)
    }

    /// Returns true if `tag` designates a registered tag.
    pub fn tag_exists(&self, tag: TagId) -> bool {
        self.tags.exists(tag)
    }

    /// Iterates over all registered tasks.
    pub fn iter_tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks.iter_live()
    }

    /// Iterates over all registered tags.
    pub fn iter_tags(&self) -> impl Iterator<Item = TagId> + '_ {
        self.tags.iter_live()
    }

    /// Capacity in task slots (sizes the queued-counter array).
    pub fn task_capacity(&self) -> u32 {
        self.tasks.capacity()
    }

    /// Capacity in tag slots (sizes the per-tag counter arrays).
    pub fn tag_capacity(&self) -> u32 {
        self.tags.capacity()
    }

    fn task_row_range(&self, task: TaskId) -> std::ops::Range<usize> {
        let start = task.index() as usize * self.tag_words_per_task;
        start..start + self.tag_words_per_task
    }

    fn tag_depends_slot(&self, tag: TagId) -> std::ops::Range<usize> {
        let start = tag.index() as usize * self.depends_per_tag;
        start..start + self.depends_per_tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_rows_are_packed_row_major() {
        let mut tags = TaskTags::new(70, 4, 2);
        let mut all = Vec::new();
        for _ in 0..70 {
            all.push(tags.tag_create().unwrap());
        }

        // Tag 65 lives in the second word of a two-word row.
        let task = tags.task_create(&[all[0], all[65]]).unwrap();
        assert_eq!(tags.tag_ints_per_task(), 2);
        let row = tags.task_tag_row(task);
        assert_eq!(row[0], 1);
        assert_eq!(row[1], 1 << 1);
    }

    #[test]
    fn test_task_with_unknown_tag_is_refused() {
        let mut tags = TaskTags::new(4, 4, 2);
        let result = tags.task_create(&[TagId::from_index(3)]);
        assert!(matches!(
            result,
            Err(CoreError::LivenessViolation { .. })
        ));
    }

    #[test]
    fn test_dependency_on_unknown_tag_is_refused() {
        let mut tags = TaskTags::new(4, 4, 2);
        let a = tags.tag_create().unwrap();
        let result = tags.tag_depend(a, TagId::from_index(2));
        assert_eq!(
            result,
            Err(CoreError::InvariantViolation {
                what: "tag dependency refers to an unknown tag"
            })
        );
    }

    #[test]
    fn test_dependency_list_overflow() {
        let mut tags = TaskTags::new(4, 4, 1);
        let a = tags.tag_create().unwrap();
        let b = tags.tag_create().unwrap();
        let c = tags.tag_create().unwrap();

        tags.tag_depend(a, b).unwrap();
        let result = tags.tag_depend(a, c);
        assert!(matches!(result, Err(CoreError::CapacityExceeded { .. })));
    }

    #[test]
    fn test_validate_accepts_chains_and_rejects_cycles() {
        let mut tags = TaskTags::new(4, 4, 2);
        let a = tags.tag_create().unwrap();
        let b = tags.tag_create().unwrap();
        let c = tags.tag_create().unwrap();

        tags.tag_depend(b, a).unwrap();
        tags.tag_depend(c, b).unwrap();
        tags.validate().unwrap();

        tags.tag_depend(a, c).unwrap();
        assert!(tags.validate().is_err());
    }
}
