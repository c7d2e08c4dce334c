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

//! The runtime counters and the four scheduler operations.
//!
//! Everything here is free functions over plain data: the static description
//! ([`TaskTags`]) is read-only, the [`ExecutionContext`] carries the mutable
//! counters, and the caller owns both. The reference semantics are as if all
//! four operations were serialized under one logical owner.

use orbita_core::bitset;
use orbita_core::id::Handle;
use orbita_core::CoreError;

use crate::tags::{TagId, TaskId, TaskTags};

/// The mutable scheduling state for one execution of a task description.
///
/// Per task: how many requests to run it are outstanding. Per tag: how many
/// tasks carrying it are currently running, and how many are enqueued but not
/// yet finished. `running[tag] <= incomplete[tag]` holds for every reachable
/// state.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    task_queued_counts: Vec<u32>,
    tag_running_counts: Vec<u32>,
    tag_incomplete_counts: Vec<u32>,
    /// Scratch for the per-tag allowed mask so the steady state allocates
    /// nothing.
    tag_allowed_mask: Vec<u64>,
}

impl ExecutionContext {
    /// Creates a zeroed context sized for `tags`.
    pub fn new(tags: &TaskTags) -> Self {
        Self {
            task_queued_counts: vec![0; tags.task_capacity() as usize],
            tag_running_counts: vec![0; tags.tag_capacity() as usize],
            tag_incomplete_counts: vec![0; tags.tag_capacity() as usize],
            tag_allowed_mask: vec![0; tags.tag_ints_per_task()],
        }
    }

    /// Outstanding run requests for one task.
    pub fn queued(&self, task: TaskId) -> u32 {
        self.task_queued_counts[task.index() as usize]
    }

    /// Currently-running tasks carrying one tag.
    pub fn running(&self, tag: TagId) -> u32 {
        self.tag_running_counts[tag.index() as usize]
    }

    /// Enqueued-but-unfinished tasks carrying one tag.
    pub fn incomplete(&self, tag: TagId) -> u32 {
        self.tag_incomplete_counts[tag.index() as usize]
    }

    /// Returns true when every counter is zero: nothing queued, nothing
    /// running, nothing incomplete.
    pub fn is_drained(&self) -> bool {
        self.task_queued_counts.iter().all(|&count| count == 0)
            && self.tag_running_counts.iter().all(|&count| count == 0)
            && self.tag_incomplete_counts.iter().all(|&count| count == 0)
    }
}

/// Queues every idle task whose tags intersect `query`.
///
/// `query` is a tag-id bitset of exactly [`TaskTags::tag_ints_per_task`]
/// words. Only the 0 → 1 transition of a task's queued count touches the
/// per-tag incomplete counters, so re-enqueueing a still-pending task is a
/// no-op and never double-counts.
pub fn task_enqueue(
    tags: &TaskTags,
    exec: &mut ExecutionContext,
    query: &[u64],
) -> Result<(), CoreError> {
    let width = tags.tag_ints_per_task();
    if query.len() != width {
        return Err(CoreError::GeometryShapeMismatch {
            what: "enqueue query bitset",
            expected: width,
            actual: query.len(),
        });
    }

    for task in tags.iter_tasks() {
        let queued = &mut exec.task_queued_counts[task.index() as usize];
        if *queued != 0 {
            continue;
        }

        let row = tags.task_tag_row(task);
        let any_tag_matches = row
            .iter()
            .zip(query)
            .any(|(task_word, query_word)| task_word & query_word != 0);

        if any_tag_matches {
            *queued = 1;
            for tag in bitset::iter_ones(row) {
                exec.tag_incomplete_counts[tag as usize] += 1;
            }
            log::trace!("{task} queued");
        }
    }
    Ok(())
}

/// Writes the bitset of tasks presently eligible to run into `tasks_out`.
///
/// A task is eligible iff it is queued and every tag it carries is allowed; a
/// tag is allowed iff all of its directly-declared dependencies have zero
/// incomplete tasks. The view of the counters is one consistent snapshot, and
/// there is no preferred order among the returned tasks.
pub fn task_list_available(
    tags: &TaskTags,
    exec: &mut ExecutionContext,
    tasks_out: &mut [u64],
) -> Result<(), CoreError> {
    if tasks_out.len() != tags.task_ints() {
        return Err(CoreError::GeometryShapeMismatch {
            what: "tasks-available bitset",
            expected: tags.task_ints(),
            actual: tasks_out.len(),
        });
    }
    tasks_out.fill(0);

    let ExecutionContext {
        task_queued_counts,
        tag_incomplete_counts,
        tag_allowed_mask,
        ..
    } = exec;

    // Bitmask makes it easy to compare the tags of a task:
    // 1 = allowed (default), 0 = not allowed. All of a task's tag bits must
    // correspond to ones in the mask for the task to run.
    tag_allowed_mask.fill(u64::MAX);
    for tag in tags.iter_tags() {
        let mut satisfied = true;
        for &dep in tags.tag_depends_of(tag) {
            if dep.is_null() {
                break;
            }
            if tag_incomplete_counts[dep.index() as usize] != 0 {
                satisfied = false;
                break;
            }
        }
        if !satisfied {
            bitset::clear(tag_allowed_mask, tag.index());
        }
    }

    // A per-tag running limit would also filter the mask here, using
    // tag_running_counts; no policy is defined yet.

    for task in tags.iter_tasks() {
        if task_queued_counts[task.index() as usize] == 0 {
            continue; // Task not queued to run.
        }
        let row = tags.task_tag_row(task);
        let all_tags_allowed = row
            .iter()
            .zip(tag_allowed_mask.iter())
            .all(|(task_word, mask_word)| mask_word & task_word == *task_word);
        if all_tags_allowed {
            bitset::set(tasks_out, task.index());
        }
    }
    Ok(())
}

/// Records that a queued task has been handed to a worker.
pub fn task_start(
    tags: &TaskTags,
    exec: &mut ExecutionContext,
    task: TaskId,
) -> Result<(), CoreError> {
    if !tags.task_exists(task) {
        return Err(CoreError::LivenessViolation {
            kind: TaskId::KIND,
            index: task.index(),
        });
    }
    if exec.task_queued_counts[task.index() as usize] == 0 {
        return Err(CoreError::InvariantViolation {
            what: "start of a task that is not queued",
        });
    }

    let row = tags.task_tag_row(task);
    for tag in bitset::iter_ones(row) {
        let tag = tag as usize;
        // running may never exceed incomplete.
        if exec.tag_running_counts[tag] >= exec.tag_incomplete_counts[tag] {
            return Err(CoreError::InvariantViolation {
                what: "start would push a tag's running count past its incomplete count",
            });
        }
        exec.tag_running_counts[tag] += 1;
    }
    log::trace!("{task} started");
    Ok(())
}

/// Records that a task's work has returned, successfully or not.
///
/// A cancelled task must still pass through here so the counters stay
/// consistent; whether that finish was a success is the caller's concern.
pub fn task_finish(
    tags: &TaskTags,
    exec: &mut ExecutionContext,
    task: TaskId,
) -> Result<(), CoreError> {
    if !tags.task_exists(task) {
        return Err(CoreError::LivenessViolation {
            kind: TaskId::KIND,
            index: task.index(),
        });
    }
    if exec.task_queued_counts[task.index() as usize] == 0 {
        return Err(CoreError::InvariantViolation {
            what: "finish of a task that is not queued",
        });
    }

    // Verify every decrement before applying any, so a bad call cannot leave
    // the counters torn.
    let row = tags.task_tag_row(task);
    for tag in bitset::iter_ones(row) {
        let tag = tag as usize;
        if exec.tag_running_counts[tag] == 0 || exec.tag_incomplete_counts[tag] == 0 {
            return Err(CoreError::InvariantViolation {
                what: "finish of a task that was never started",
            });
        }
    }

    exec.task_queued_counts[task.index() as usize] -= 1;
    for tag in bitset::iter_ones(row) {
        let tag = tag as usize;
        exec.tag_running_counts[tag] -= 1;
        exec.tag_incomplete_counts[tag] -= 1;
    }
    log::trace!("{task} finished");
    Ok(())
}
