//! Vector and matrix types shared by the rig geometry.
//!
//! All quantities are `f64`. Positions are in meters relative to the display
//! center, with the viewer on the negative Z side:
//!
//! ```text
//!            +Y
//!             │   display plane (z = 0)
//!             │  ┌───────────┐
//!             │  │           │
//!   viewer ●──┼──┤     ●     ├──▶ +X
//!  (0,0,-d)   │  │           │
//!             │  └───────────┘
//! ```

use serde::{Deserialize, Serialize};

/// A 3D vector for positions and directions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Zero vector.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// The centered rig pose at `focus_distance` in front of the display.
    #[must_use]
    pub fn centered(focus_distance: f64) -> Self {
        Self::new(0.0, 0.0, -focus_distance)
    }

    /// Calculate the length (magnitude) of the vector.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Subtract two vectors.
    #[must_use]
    pub fn sub(&self, other: &Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Add two vectors.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    /// Scale vector by a scalar.
    #[must_use]
    pub fn scale(&self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    /// Distance between two points.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        self.sub(other).length()
    }

    /// Component-wise linear interpolation. `t` is clamped to `[0, 1]`.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self::new(
            lerp(self.x, other.x, t),
            lerp(self.y, other.y, t),
            lerp(self.z, other.z, t),
        )
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::zero()
    }
}

/// Scalar linear interpolation. `t` is clamped to `[0, 1]`.
#[must_use]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    a + (b - a) * t
}

/// A 4x4 matrix for transformations.
///
/// Stored in column-major order; [`Mat4::get`] and [`Mat4::set`] take
/// `(row, column)` so that `m.get(0, 2)` is the entry in the first row,
/// third column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    /// Matrix data in column-major order.
    pub data: [f64; 16],
}

impl Mat4 {
    /// Create identity matrix.
    #[must_use]
    pub fn identity() -> Self {
        #[rustfmt::skip]
        let data = [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        Self { data }
    }

    /// Create a perspective projection matrix (OpenGL clip conventions).
    #[must_use]
    pub fn perspective(fov_y_radians: f64, aspect: f64, near: f64, far: f64) -> Self {
        let f = 1.0 / (fov_y_radians / 2.0).tan();
        let nf = 1.0 / (near - far);

        #[rustfmt::skip]
        let data = [
            f / aspect, 0.0, 0.0, 0.0,
            0.0, f, 0.0, 0.0,
            0.0, 0.0, (far + near) * nf, -1.0,
            0.0, 0.0, 2.0 * far * near * nf, 0.0,
        ];
        Self { data }
    }

    /// Entry at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is not below 4.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < 4 && col < 4, "matrix index ({row}, {col}) out of range");
        self.data[col * 4 + row]
    }

    /// Overwrite the entry at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is not below 4.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(row < 4 && col < 4, "matrix index ({row}, {col}) out of range");
        self.data[col * 4 + row] = value;
    }

    /// Multiply two matrices (`self * other`, so `other` is applied first).
    #[must_use]
    pub fn mul(&self, other: &Self) -> Self {
        let mut result = [0.0f64; 16];

        for row in 0..4 {
            for col in 0..4 {
                for k in 0..4 {
                    result[col * 4 + row] += self.data[k * 4 + row] * other.data[col * 4 + k];
                }
            }
        }

        Self { data: result }
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}
