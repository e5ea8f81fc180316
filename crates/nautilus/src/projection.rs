//! Spherical coordinates and the fisheye-style view mapping.
//!
//! Angles are re-centred on the viewer: `theta` is measured from the +z axis in the x/z plane
//! and wrapped into `(-π, π]`, `phi` is the elevation in `[-π/2, π/2]`.

use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::math::Vector3;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SphericalCoord {
    pub r: f64,
    pub theta: f64,
    pub phi: f64,
}

impl SphericalCoord {
    /// The zero vector maps to `r = 0` with both angles at zero.
    pub fn from_cartesian(v: &Vector3) -> Self {
        let r = (v.x * v.x + v.y * v.y + v.z * v.z).sqrt();
        if r == 0.0 {
            return Self::default();
        }
        let mut theta = v.z.atan2(v.x) - FRAC_PI_2;
        if theta < -PI {
            theta += 2.0 * PI;
        }
        let phi = (v.y / r).acos() - FRAC_PI_2;
        Self { r, theta, phi }
    }

    /// Points behind the viewer (`z < 0`) have their depth scaled by `negative_stretch`, so a
    /// round trip through [`SphericalCoord::from_cartesian`] is lossy there.
    pub fn to_cartesian(&self, negative_stretch: f64) -> Vector3 {
        if self.r == 0.0 {
            return Vector3::zeros();
        }
        let theta = self.theta + FRAC_PI_2;
        let phi = self.phi + FRAC_PI_2;
        let mut z = self.r * theta.sin() * phi.sin();
        if z < 0.0 {
            z *= negative_stretch;
        }
        Vector3::new(self.r * theta.cos() * phi.sin(), self.r * phi.cos(), z)
    }
}

/// Angular compression parameters, derived from the number of laid-out clusters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewMapping {
    pub mapping_power: f64,
    pub negative_stretch: f64,
}

impl Default for ViewMapping {
    fn default() -> Self {
        Self {
            mapping_power: 1.0,
            negative_stretch: 1.0,
        }
    }
}

impl ViewMapping {
    /// Keeps roughly `visible_target` of `anchors` clusters in the forward hemisphere.
    ///
    /// Up to `2 * visible_target` anchors no compression is needed and both parameters stay 1.
    pub fn for_anchor_count(anchors: usize, visible_target: usize) -> Self {
        let n = anchors as f64;
        let nt = visible_target as f64;
        if visible_target == 0 || n <= nt * 2.0 {
            return Self::default();
        }
        let mapping_power = ((nt / (n / 2.0)).asin() / PI).ln() / 0.5f64.ln();
        Self {
            mapping_power,
            negative_stretch: mapping_power * 2.0,
        }
    }

    /// Pulls `ang` towards `±max_ang` following `mapping_power`.
    pub fn scoord_mapping(&self, ang: f64, max_ang: f64) -> f64 {
        let signed_max = if ang < 0.0 { -max_ang } else { max_ang };
        let d = ((signed_max - ang) / max_ang).abs();
        let d = d.powf(self.mapping_power).abs() * signed_max;
        signed_max - d
    }

    pub fn apply(&self, s: SphericalCoord) -> SphericalCoord {
        SphericalCoord {
            r: s.r,
            theta: self.scoord_mapping(s.theta, PI),
            phi: self.scoord_mapping(s.phi, FRAC_PI_2),
        }
    }

    /// Cartesian -> spherical -> mapped -> cartesian.
    pub fn project(&self, v: &Vector3) -> Vector3 {
        self.apply(SphericalCoord::from_cartesian(v))
            .to_cartesian(self.negative_stretch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &Vector3, b: &Vector3) -> bool {
        (a - b).norm() < 1e-12
    }

    #[test]
    fn forward_hemisphere_round_trips() {
        let samples = [
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.3, -0.4, 2.0),
            Vector3::new(-5.0, 1.0, 0.5),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(-1.0, 3.0, 0.0),
        ];
        for v in samples {
            let back = SphericalCoord::from_cartesian(&v).to_cartesian(3.0);
            assert!(close(&back, &v), "{v:?} -> {back:?}");
        }
    }

    #[test]
    fn rear_hemisphere_is_stretched() {
        let v = Vector3::new(0.2, 0.1, -1.0);
        let back = SphericalCoord::from_cartesian(&v).to_cartesian(2.5);
        assert!((back.x - v.x).abs() < 1e-12);
        assert!((back.y - v.y).abs() < 1e-12);
        assert!((back.z - v.z * 2.5).abs() < 1e-12);
    }

    #[test]
    fn zero_vector_maps_to_origin() {
        let s = SphericalCoord::from_cartesian(&Vector3::zeros());
        assert_eq!(s, SphericalCoord::default());
        assert_eq!(s.to_cartesian(4.0), Vector3::zeros());
        assert_eq!(ViewMapping::default().project(&Vector3::zeros()), Vector3::zeros());
    }

    #[test]
    fn theta_is_wrapped() {
        let s = SphericalCoord::from_cartesian(&Vector3::new(-1.0, 0.0, -0.01));
        assert!(s.theta > -PI && s.theta <= PI, "theta = {}", s.theta);
    }

    #[test]
    fn unit_power_is_the_identity() {
        let m = ViewMapping::default();
        for a in [-3.0, -1.0, -0.1, 0.0, 0.4, 2.9] {
            assert!((m.scoord_mapping(a, PI) - a).abs() < 1e-12);
        }
    }

    #[test]
    fn mapped_angles_stay_in_range() {
        for power in [0.2, 1.0, 1.7, 4.0] {
            let m = ViewMapping {
                mapping_power: power,
                negative_stretch: 1.0,
            };
            for i in 0..=200 {
                let theta = -PI + (i as f64) * (2.0 * PI / 200.0);
                let phi = -FRAC_PI_2 + (i as f64) * (PI / 200.0);
                let s = m.apply(SphericalCoord { r: 1.0, theta, phi });
                assert!(s.theta.abs() <= PI);
                assert!(s.phi.abs() <= FRAC_PI_2);
            }
        }
    }

    #[test]
    fn higher_power_pushes_angles_outwards() {
        let m = ViewMapping {
            mapping_power: 2.0,
            negative_stretch: 1.0,
        };
        let a = m.scoord_mapping(0.5, PI);
        assert!(a > 0.5 && a < PI);
        let b = m.scoord_mapping(-0.5, PI);
        assert!((a + b).abs() < 1e-12);
    }

    #[test]
    fn mapping_parameters_from_anchor_count() {
        assert_eq!(ViewMapping::for_anchor_count(12, 7), ViewMapping::default());
        assert_eq!(ViewMapping::for_anchor_count(14, 7), ViewMapping::default());

        let m = ViewMapping::for_anchor_count(30, 7);
        let expected = ((7.0f64 / 15.0).asin() / PI).ln() / 0.5f64.ln();
        assert!((m.mapping_power - expected).abs() < 1e-12);
        assert!(m.mapping_power.is_finite() && m.mapping_power > 0.0);
        assert_eq!(m.negative_stretch, m.mapping_power * 2.0);
    }
}
