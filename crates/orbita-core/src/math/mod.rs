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

//! Provides the vector primitives used by the terrain subsystem.
//!
//! Skeleton positions live in fixed-point space ([`Vec3l`], 64-bit components
//! scaled by a power of two) so subdivision midpoints stay exact at planetary
//! magnitudes; renderable vertices use [`Vec3`] after the scale exponent is
//! applied.

// --- Fundamental Constants ---

/// A small constant for floating-point comparisons.
pub const EPSILON: f32 = 1e-5;

// --- Declare Sub-Modules ---

pub mod vector;

// --- Re-export Principal Types ---

pub use self::vector::{Vec3, Vec3l};
