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

//! 3D vector types: `f32` world-space and `i64` fixed-point skeleton-space.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use super::EPSILON;
use std::ops::{Add, Div, Mul, Neg, Sub};

// --- Vec3 ---

/// A 3-dimensional vector with `f32` components.
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    bytemuck::Pod,
    bytemuck::Zeroable,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
#[repr(C)]
pub struct Vec3 {
    /// The x component of the vector.
    pub x: f32,
    /// The y component of the vector.
    pub y: f32,
    /// The z component of the vector.
    pub z: f32,
}

impl Vec3 {
    /// A vector with all components set to `0.0`.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    /// A vector with all components set to `1.0`.
    pub const ONE: Self = Self {
        x: 1.0,
        y: 1.0,
        z: 1.0,
    };
    /// The unit vector pointing along the positive X-axis.
    pub const X: Self = Self {
        x: 1.0,
        y: 0.0,
        z: 0.0,
    };
    /// The unit vector pointing along the positive Y-axis.
    pub const Y: Self = Self {
        x: 0.0,
        y: 1.0,
        z: 0.0,
    };
    /// The unit vector pointing along the positive Z-axis.
    pub const Z: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };

    /// Creates a new `Vec3` with the specified components.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Calculates the dot product of this vector and another.
    #[inline]
    pub fn dot(&self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Calculates the cross product of this vector and another.
    #[inline]
    pub fn cross(&self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Calculates the squared length (magnitude) of the vector.
    /// This is faster than `length()` as it avoids a square root.
    #[inline]
    pub fn length_squared(&self) -> f32 {
        self.dot(*self)
    }

    /// Calculates the length (magnitude) of the vector.
    #[inline]
    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Returns a normalized version of the vector with a length of 1.
    /// If the vector's length is near zero, it returns `Vec3::ZERO`.
    #[inline]
    pub fn normalize(&self) -> Self {
        let len_sq = self.length_squared();
        if len_sq > EPSILON * EPSILON {
            *self / len_sq.sqrt()
        } else {
            Self::ZERO
        }
    }

    /// Returns true if every component is exactly zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl Add for Vec3 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Self;
    #[inline]
    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

// --- Vec3l ---

/// A 3-dimensional vector with `i64` fixed-point components.
///
/// A position in skeleton space is the world-space position multiplied by
/// `2^scale` for some per-structure scale exponent. Midpoints of fixed-point
/// positions are exact, which keeps subdivision vertices watertight across
/// chunk borders.
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    bytemuck::Pod,
    bytemuck::Zeroable,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
#[repr(C)]
pub struct Vec3l {
    /// The x component of the vector.
    pub x: i64,
    /// The y component of the vector.
    pub y: i64,
    /// The z component of the vector.
    pub z: i64,
}

impl Vec3l {
    /// A vector with all components set to `0`.
    pub const ZERO: Self = Self { x: 0, y: 0, z: 0 };

    /// Creates a new `Vec3l` with the specified components.
    #[inline]
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Returns the exact component-wise midpoint of two positions.
    #[inline]
    pub fn midpoint(a: Self, b: Self) -> Self {
        Self::new((a.x + b.x) / 2, (a.y + b.y) / 2, (a.z + b.z) / 2)
    }

    /// Converts a world-space position into fixed-point space by scaling with
    /// `2^scale` and rounding.
    #[inline]
    pub fn from_world(v: Vec3, scale: u8) -> Self {
        let factor = (scale as f64).exp2();
        Self::new(
            (f64::from(v.x) * factor).round() as i64,
            (f64::from(v.y) * factor).round() as i64,
            (f64::from(v.z) * factor).round() as i64,
        )
    }

    /// Converts this fixed-point position back to world space by applying the
    /// negative power-of-two scale exponent.
    ///
    /// The intermediate math runs in `f64` so large planetary coordinates keep
    /// their precision until the final narrowing.
    #[inline]
    pub fn to_world(self, scale: u8) -> Vec3 {
        let factor = (-(scale as f64)).exp2();
        Vec3::new(
            (self.x as f64 * factor) as f32,
            (self.y as f64 * factor) as f32,
            (self.z as f64 * factor) as f32,
        )
    }
}

impl Add for Vec3l {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3l {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dot_and_cross() {
        let x = Vec3::X;
        let y = Vec3::Y;
        assert_relative_eq!(x.dot(y), 0.0);
        let z = x.cross(y);
        assert_relative_eq!(z.x, 0.0);
        assert_relative_eq!(z.y, 0.0);
        assert_relative_eq!(z.z, 1.0);
    }

    #[test]
    fn test_normalize() {
        let v = Vec3::new(0.0, 3.0, 4.0);
        let n = v.normalize();
        assert_relative_eq!(n.length(), 1.0, epsilon = EPSILON);
        assert_relative_eq!(n.y, 0.6, epsilon = EPSILON);
        assert_relative_eq!(n.z, 0.8, epsilon = EPSILON);

        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
    }

    #[test]
    fn test_fixed_point_round_trip() {
        let world = Vec3::new(1.5, -2.25, 100.0);
        let fixed = Vec3l::from_world(world, 10);
        assert_eq!(fixed, Vec3l::new(1536, -2304, 102_400));

        let back = fixed.to_world(10);
        assert_relative_eq!(back.x, world.x, epsilon = EPSILON);
        assert_relative_eq!(back.y, world.y, epsilon = EPSILON);
        assert_relative_eq!(back.z, world.z, epsilon = EPSILON);
    }

    #[test]
    fn test_midpoint_is_exact() {
        let a = Vec3l::new(2, 4, -6);
        let b = Vec3l::new(4, 8, -2);
        assert_eq!(Vec3l::midpoint(a, b), Vec3l::new(3, 6, -4));
    }
}
