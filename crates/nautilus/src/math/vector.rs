//! 3-element vectors and 4x4 affine matrices.
//!
//! Vectors are plain `nalgebra` vectors. The matrix keeps its own flat layout because the
//! projective multiply reads the translation from `m[12..15]` and the homogeneous weight from
//! `m[3]`, `m[7]`, `m[11]` and `m[15]`, which is not nalgebra's storage order.

use nalgebra as na;

pub type Vector3 = na::Vector3<f64>;

pub fn dot(a: &Vector3, b: &Vector3) -> f64 {
    (a.x * b.x) + (a.y * b.y) + (a.z * b.z)
}

pub fn length(v: &Vector3) -> f64 {
    dot(v, v).sqrt()
}

pub fn distance(a: &Vector3, b: &Vector3) -> f64 {
    length(&(b - a))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4x4(pub [f64; 16]);

impl Matrix4x4 {
    pub const IDENTITY: Self = Self([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    fn lane(&self, a: usize, b: usize, c: usize) -> Vector3 {
        let m = &self.0;
        Vector3::new(m[a], m[b], m[c])
    }

    /// `r = m * v` with homogeneous divide.
    ///
    /// The caller owns the `w == 0` case; see [`Matrix4x4::try_project_point`].
    pub fn project_point(&self, v: &Vector3) -> Vector3 {
        let m = &self.0;
        let w = dot(v, &self.lane(3, 7, 11)) + m[15];
        Vector3::new(
            (dot(v, &self.lane(0, 4, 8)) + m[12]) / w,
            (dot(v, &self.lane(1, 5, 9)) + m[13]) / w,
            (dot(v, &self.lane(2, 6, 10)) + m[14]) / w,
        )
    }

    /// Like [`Matrix4x4::project_point`], but returns `None` for a zero homogeneous weight or a
    /// non-finite result.
    pub fn try_project_point(&self, v: &Vector3) -> Option<Vector3> {
        let w = dot(v, &self.lane(3, 7, 11)) + self.0[15];
        if w == 0.0 {
            return None;
        }
        let r = self.project_point(v);
        (r.x.is_finite() && r.y.is_finite() && r.z.is_finite()).then_some(r)
    }
}

impl Default for Matrix4x4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}
