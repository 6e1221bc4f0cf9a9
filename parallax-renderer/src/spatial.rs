//! Vector and matrix math for stereo projection.
//!
//! Right-handed coordinates, matrices stored column-major so `data` can be
//! uploaded to OpenGL/wgpu uniforms as is.
//!
//! ```text
//!   data index layout          conceptual rows
//!  ┌────┬────┬────┬────┐
//!  │  0 │  4 │  8 │ 12 │       row 0
//!  │  1 │  5 │  9 │ 13 │       row 1
//!  │  2 │  6 │ 10 │ 14 │       row 2
//!  │  3 │  7 │ 11 │ 15 │       row 3
//!  └────┴────┴────┴────┘
//! ```

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use parallax_core::EyePosition;
use serde::{Deserialize, Serialize};

/// A 3D vector for positions and directions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// Zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit vector pointing up (Y+).
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);

    /// Unit vector pointing into the screen (Z-).
    pub const FORWARD: Self = Self::new(0.0, 0.0, -1.0);

    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction. The zero vector stays zero.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            self * (1.0 / len)
        } else {
            self
        }
    }

    /// Dot product.
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product.
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Whether all components are finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    fn mul(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl From<EyePosition> for Vec3 {
    fn from(p: EyePosition) -> Self {
        Self::new(p.x, p.y, p.z)
    }
}

/// A 4x4 matrix for transformations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    /// Matrix data in column-major order.
    pub data: [f32; 16],
}

impl Mat4 {
    /// Identity matrix.
    #[must_use]
    pub const fn identity() -> Self {
        #[rustfmt::skip]
        let data = [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        Self { data }
    }

    /// Build from conceptual rows, storing column-major.
    #[must_use]
    pub fn from_rows(rows: [[f32; 4]; 4]) -> Self {
        let mut data = [0.0; 16];
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                data[c * 4 + r] = *value;
            }
        }
        Self { data }
    }

    /// Element at conceptual `row`, `col`.
    #[must_use]
    pub const fn get(&self, row: usize, col: usize) -> f32 {
        self.data[col * 4 + row]
    }

    /// Columns as nested arrays, the layout glium and wgpu uniforms expect.
    #[must_use]
    pub fn to_cols_array_2d(&self) -> [[f32; 4]; 4] {
        let d = &self.data;
        [
            [d[0], d[1], d[2], d[3]],
            [d[4], d[5], d[6], d[7]],
            [d[8], d[9], d[10], d[11]],
            [d[12], d[13], d[14], d[15]],
        ]
    }

    /// Right-handed look-at view matrix.
    #[must_use]
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let f = (target - eye).normalize();
        let s = f.cross(up).normalize();
        let u = s.cross(f);

        #[rustfmt::skip]
        let data = [
            s.x,  u.x,  -f.x, 0.0,
            s.y,  u.y,  -f.y, 0.0,
            s.z,  u.z,  -f.z, 0.0,
            -s.dot(eye), -u.dot(eye), f.dot(eye), 1.0,
        ];
        Self { data }
    }

    /// Symmetric perspective projection with OpenGL depth range.
    #[must_use]
    pub fn perspective(fov_y_radians: f32, aspect: f32, near: f32, far: f32) -> Self {
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

    /// Asymmetric (off-center) perspective projection.
    ///
    /// `left`, `right`, `bottom` and `top` are the frustum extents on the
    /// near plane. Callers must ensure `right != left`, `top != bottom`
    /// and `far != near`.
    #[must_use]
    pub fn off_center(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let x = 2.0 * near / (right - left);
        let y = 2.0 * near / (top - bottom);
        let a = (right + left) / (right - left);
        let b = (top + bottom) / (top - bottom);
        let c = -(far + near) / (far - near);
        let d = -2.0 * far * near / (far - near);

        Self::from_rows([
            [x, 0.0, a, 0.0],
            [0.0, y, b, 0.0],
            [0.0, 0.0, c, d],
            [0.0, 0.0, -1.0, 0.0],
        ])
    }

    /// Multiply two matrices (`self * other`).
    #[must_use]
    pub fn mul(&self, other: &Self) -> Self {
        let mut result = [0.0f32; 16];

        for row in 0..4 {
            for col in 0..4 {
                for k in 0..4 {
                    result[col * 4 + row] += self.data[k * 4 + row] * other.data[col * 4 + k];
                }
            }
        }

        Self { data: result }
    }

    /// Transform a point and return homogeneous `[x, y, z, w]`.
    #[must_use]
    pub fn transform_point(&self, p: Vec3) -> [f32; 4] {
        let mut out = [0.0f32; 4];
        for (row, slot) in out.iter_mut().enumerate() {
            *slot = self.get(row, 0) * p.x
                + self.get(row, 1) * p.y
                + self.get(row, 2) * p.z
                + self.get(row, 3);
        }
        out
    }

    /// Transform a point and divide by `w`. `None` if `w` is zero.
    #[must_use]
    pub fn project_point(&self, p: Vec3) -> Option<Vec3> {
        let [x, y, z, w] = self.transform_point(p);
        if w == 0.0 {
            return None;
        }
        Some(Vec3::new(x / w, y / w, z / w))
    }

    /// Whether every element is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn assert_mat_approx(a: &Mat4, b: &Mat4) {
        for (i, (x, y)) in a.data.iter().zip(b.data.iter()).enumerate() {
            assert!(approx_eq(*x, *y), "element {i}: {x} != {y}");
        }
    }

    #[test]
    fn test_vec3_length_and_normalize() {
        let v = Vec3::new(3.0, 4.0, 0.0);
        assert!(approx_eq(v.length(), 5.0));
        assert!(approx_eq(v.normalize().length(), 1.0));
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
    }

    #[test]
    fn test_vec3_cross_is_right_handed() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(y), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_vec3_operators() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(a - b, Vec3::new(-3.0, -3.0, -3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(-a, Vec3::new(-1.0, -2.0, -3.0));
        assert!(approx_eq(a.dot(b), 32.0));

        let mut c = a;
        c += b;
        c -= a;
        assert_eq!(c, b);
    }

    #[test]
    fn test_from_eye_position() {
        let v = Vec3::from(EyePosition::new(1.0, -2.0, 3.5));
        assert_eq!(v, Vec3::new(1.0, -2.0, 3.5));
    }

    #[test]
    fn test_from_rows_is_column_major() {
        let m = Mat4::from_rows([
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
            [13.0, 14.0, 15.0, 16.0],
        ]);

        assert!(approx_eq(m.data[1], 5.0));
        assert!(approx_eq(m.data[4], 2.0));
        assert!(approx_eq(m.get(2, 3), 12.0));
        assert!(approx_eq(m.to_cols_array_2d()[3][0], 4.0));
    }

    #[test]
    fn test_mul_identity() {
        let m = Mat4::perspective(1.0, 1.5, 0.1, 100.0);
        assert_mat_approx(&m.mul(&Mat4::identity()), &m);
        assert_mat_approx(&Mat4::identity().mul(&m), &m);
    }

    #[test]
    fn test_look_at_moves_eye_to_origin() {
        let eye = Vec3::new(1.0, 2.0, 5.0);
        let view = Mat4::look_at(eye, eye + Vec3::FORWARD, Vec3::UP);

        let p = view.project_point(eye).expect("w is 1");
        assert!(approx_eq(p.length(), 0.0));

        // A point straight ahead lands on -Z in view space.
        let ahead = view.project_point(eye + Vec3::FORWARD * 3.0).expect("w is 1");
        assert!(approx_eq(ahead.z, -3.0));
    }

    #[test]
    fn test_off_center_symmetric_matches_perspective() {
        let (near, far) = (0.5, 50.0);
        let fov = 60.0_f32.to_radians();
        let aspect = 16.0 / 9.0;
        let top = near * (fov / 2.0).tan();
        let right = top * aspect;

        let off = Mat4::off_center(-right, right, -top, top, near, far);
        let sym = Mat4::perspective(fov, aspect, near, far);

        assert_mat_approx(&off, &sym);
    }

    #[test]
    fn test_off_center_maps_near_and_far_to_ndc() {
        let m = Mat4::off_center(-1.0, 2.0, -0.5, 1.5, 1.0, 10.0);

        let near = m.project_point(Vec3::new(0.0, 0.0, -1.0)).expect("w != 0");
        let far = m.project_point(Vec3::new(0.0, 0.0, -10.0)).expect("w != 0");

        assert!(approx_eq(near.z, -1.0));
        assert!(approx_eq(far.z, 1.0));

        // Near-plane corners land on the NDC edges.
        let corner = m.project_point(Vec3::new(2.0, 1.5, -1.0)).expect("w != 0");
        assert!(approx_eq(corner.x, 1.0));
        assert!(approx_eq(corner.y, 1.0));
    }

    #[test]
    fn test_project_point_zero_w() {
        let m = Mat4::off_center(-1.0, 1.0, -1.0, 1.0, 1.0, 10.0);
        assert!(m.project_point(Vec3::ZERO).is_none());
    }
}
