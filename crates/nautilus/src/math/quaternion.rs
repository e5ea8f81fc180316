use serde::Serialize;

use super::vector::Matrix4x4;

/// Unit quaternion used to accumulate the scene orientation without gimbal lock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Squared-norm deviation below which [`Quaternion::normalize`] leaves the value untouched.
    pub const NORM_TOLERANCE: f64 = 1e-5;

    /// Combined rotation: `roll` about x, `pitch` about y, `yaw` about z.
    pub fn from_euler(pitch: f64, yaw: f64, roll: f64) -> Self {
        let (sinp, cosp) = (pitch * 0.5).sin_cos();
        let (siny, cosy) = (yaw * 0.5).sin_cos();
        let (sinr, cosr) = (roll * 0.5).sin_cos();
        let mut q = Self {
            x: sinr * cosp * cosy - cosr * sinp * siny,
            y: cosr * sinp * cosy + sinr * cosp * siny,
            z: cosr * cosp * siny - sinr * sinp * cosy,
            w: cosr * cosp * cosy + sinr * sinp * siny,
        };
        q.normalize();
        q
    }

    pub fn norm_squared(&self) -> f64 {
        (self.x * self.x) + (self.y * self.y) + (self.z * self.z) + (self.w * self.w)
    }

    pub fn normalize(&mut self) {
        let l = self.norm_squared();
        if (l - 1.0).abs() > Self::NORM_TOLERANCE {
            let l = l.sqrt();
            self.x /= l;
            self.y /= l;
            self.z /= l;
            self.w /= l;
        }
    }

    /// `self = q * self`: the rotation `q` is applied after the one held by `self`.
    pub fn multiply(&mut self, q: &Quaternion) {
        let s = *self;
        self.x = (q.w * s.x) + (q.x * s.w) + (q.y * s.z) - (q.z * s.y);
        self.y = (q.w * s.y) - (q.x * s.z) + (q.y * s.w) + (q.z * s.x);
        self.z = (q.w * s.z) + (q.x * s.y) - (q.y * s.x) + (q.z * s.w);
        self.w = (q.w * s.w) - (q.x * s.x) - (q.y * s.y) - (q.z * s.z);
    }

    /// Affine rotation matrix with zero translation.
    pub fn to_matrix(&self) -> Matrix4x4 {
        let x2 = self.x * self.x;
        let y2 = self.y * self.y;
        let z2 = self.z * self.z;
        let xy = self.x * self.y;
        let xz = self.x * self.z;
        let yz = self.y * self.z;
        let wx = self.w * self.x;
        let wy = self.w * self.y;
        let wz = self.w * self.z;

        Matrix4x4([
            1.0 - (2.0 * (y2 + z2)),
            2.0 * (xy - wz),
            2.0 * (xz + wy),
            0.0,
            2.0 * (xy + wz),
            1.0 - (2.0 * (x2 + z2)),
            2.0 * (yz - wx),
            0.0,
            2.0 * (xz - wy),
            2.0 * (yz + wx),
            1.0 - (2.0 * (x2 + y2)),
            0.0,
            0.0,
            0.0,
            0.0,
            1.0,
        ])
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}
