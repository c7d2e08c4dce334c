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

//! # Orbita Tasks
//!
//! The tag-based task scheduler that drives frame execution.
//!
//! Tasks carry bitsets of tags; tags carry dependencies. The scheduler never
//! builds an explicit task graph: ordering falls out of per-tag counters. A
//! frame driver enqueues the tasks matching a tag query, then repeatedly asks
//! which tasks are eligible, dispatches them to whatever executor it owns, and
//! reports start/finish back:
//!
//! ```text
//! task_enqueue(query) ─► task_list_available ─► task_start ─► work ─► task_finish
//!                              ▲                                        │
//!                              └────────────────────────────────────────┘
//! ```
//!
//! The scheduler itself is single-threaded state; the caller provides the
//! threads. All four operations complete in time proportional to
//! (tasks + tags) and allocate nothing in the steady state.

#![warn(missing_docs)]

mod exec;
mod graph;
mod tags;

pub use exec::{
    task_enqueue, task_finish, task_list_available, task_start, ExecutionContext,
};
pub use graph::{dependency_order, CycleError};
pub use tags::{TagId, TaskId, TaskTags};
