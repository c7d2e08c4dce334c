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

//! # Orbita Core
//!
//! Foundational crate for the Orbita space-simulation engine. It provides the
//! small set of building blocks shared by the task scheduler and the planetary
//! terrain subsystems:
//!
//! * word-packed [`bitset`]s with iteration over set and clear positions,
//! * typed dense integer handles and the reusable [`id::IdRegistry`],
//! * the unordered-pair-keyed [`id::PairKeyedIdTree`],
//! * fixed-point and floating-point vector [`math`],
//! * the shared [`CoreError`] type.
//!
//! Nothing in this crate owns a thread, a file, or a GPU resource; every
//! structure is owned by an explicit context object in a higher layer.

#![warn(missing_docs)]

pub mod bitset;
pub mod error;
pub mod id;
pub mod math;

pub use error::CoreError;
