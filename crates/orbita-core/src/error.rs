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

//! The error type shared by every Orbita subsystem.
//!
//! All of these indicate a bug at the call site. They are surfaced to the
//! caller rather than swallowed; the surrounding shell decides how to report
//! them.

use std::fmt;

/// An invariant failure in one of the core data structures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A fixed-capacity registry is full and automatic growth is disabled.
    CapacityExceeded {
        /// The kind of resource that ran out (an ID kind name, usually).
        kind: &'static str,
        /// The capacity that was exhausted.
        capacity: u32,
    },
    /// Double-free, removal of an unknown ID, or use of a dead ID.
    LivenessViolation {
        /// The ID kind involved.
        kind: &'static str,
        /// The offending slot index.
        index: u32,
    },
    /// A reference count was decremented below zero.
    RefCountUnderflow {
        /// The ID kind whose count underflowed.
        kind: &'static str,
        /// The offending slot index.
        index: u32,
    },
    /// A reference count was incremented past its `u8` range.
    RefCountOverflow {
        /// The ID kind whose count overflowed.
        kind: &'static str,
        /// The offending slot index.
        index: u32,
    },
    /// A structural invariant was broken: double subdivision, a dependency on
    /// an unknown tag, finish without start, a counter underflow.
    InvariantViolation {
        /// What went wrong.
        what: &'static str,
    },
    /// An array argument has the wrong shape for the configured geometry.
    GeometryShapeMismatch {
        /// Which argument was mis-shaped.
        what: &'static str,
        /// The length the configuration requires.
        expected: usize,
        /// The length that was supplied.
        actual: usize,
    },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::CapacityExceeded { kind, capacity } => {
                write!(
                    f,
                    "{kind} over max capacity ({capacity}) with automatic resizing disabled"
                )
            }
            CoreError::LivenessViolation { kind, index } => {
                write!(f, "{kind} slot {index} is not alive")
            }
            CoreError::RefCountUnderflow { kind, index } => {
                write!(f, "Reference count of {kind} slot {index} underflowed")
            }
            CoreError::RefCountOverflow { kind, index } => {
                write!(
                    f,
                    "Reference count of {kind} slot {index} overflowed its u8 range"
                )
            }
            CoreError::InvariantViolation { what } => {
                write!(f, "Invariant violation: {what}")
            }
            CoreError::GeometryShapeMismatch {
                what,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Shape mismatch for {what}: expected length {expected}, got {actual}"
                )
            }
        }
    }
}

impl std::error::Error for CoreError {}
