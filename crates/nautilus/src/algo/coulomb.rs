//! Coulomb-repulsion placement of cluster anchors on the unit sphere.
//!
//! Steepest descent on `E = Σ 1/|p_i - p_j|` with a bold-driver step: a trial step that lowers
//! the energy is committed and the step doubles, otherwise the step halves. Forces are
//! projected onto the tangent plane and trial positions renormalized, so anchors never leave
//! the sphere.

use serde::Serialize;

use super::CoulombOptions;
use super::rng::XorShift64Star;
use crate::math::{Vector3, distance, dot, length};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoulombStats {
    pub anchors: usize,
    pub initial_energy: f64,
    pub final_energy: f64,
    pub steps: usize,
    pub committed_steps: usize,
    pub final_step: f64,
}

pub fn coulomb_energy(positions: &[Vector3]) -> f64 {
    let n = positions.len();
    let mut e = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            e += 1.0 / distance(&positions[i], &positions[j]);
        }
    }
    e
}

/// Negative energy gradient for every anchor, written into `forces`.
pub fn coulomb_forces(positions: &[Vector3], forces: &mut [Vector3]) {
    let n = positions.len();
    forces.iter_mut().for_each(|f| *f = Vector3::zeros());
    for i in 0..n {
        for j in (i + 1)..n {
            let r = positions[i] - positions[j];
            let l = length(&r);
            let ff = r * (1.0 / (l * l * l));
            forces[i] += ff;
            forces[j] -= ff;
        }
    }
}

fn random_unit_vector(rng: &mut XorShift64Star) -> Vector3 {
    loop {
        let v = Vector3::new(
            2.0 * rng.next_f64_centered(),
            2.0 * rng.next_f64_centered(),
            2.0 * rng.next_f64_centered(),
        );
        let l = length(&v);
        if l != 0.0 {
            return v / l;
        }
    }
}

/// Seeds every anchor at a random point on the sphere, then relaxes the configuration.
pub fn solve(anchors: &mut [Vector3], opts: &CoulombOptions) -> CoulombStats {
    let mut rng = XorShift64Star::new(opts.random_seed);
    for a in anchors.iter_mut() {
        *a = random_unit_vector(&mut rng);
    }
    relax(anchors, opts)
}

/// Runs the descent from the current anchor positions, which must already be unit vectors.
pub fn relax(anchors: &mut [Vector3], opts: &CoulombOptions) -> CoulombStats {
    let n = anchors.len();
    let mut e0 = coulomb_energy(anchors);
    let mut stats = CoulombStats {
        anchors: n,
        initial_energy: e0,
        final_energy: e0,
        steps: 0,
        committed_steps: 0,
        final_step: opts.initial_step,
    };
    if n < 2 {
        return stats;
    }

    let mut step = opts.initial_step;
    let mut forces = vec![Vector3::zeros(); n];
    let mut trial = vec![Vector3::zeros(); n];

    for _ in 0..opts.max_steps {
        stats.steps += 1;
        coulomb_forces(anchors, &mut forces);
        for i in 0..n {
            let pos = anchors[i];
            let mut f = forces[i];
            f -= pos * dot(&f, &pos);
            let t = pos + f * step;
            trial[i] = t / length(&t);
        }

        let e = coulomb_energy(&trial);
        if e >= e0 {
            step /= 2.0;
            if step < opts.min_step {
                tracing::debug!(step, "coulomb step underflow, stopping");
                break;
            }
        } else {
            anchors.copy_from_slice(&trial);
            e0 = e;
            step *= 2.0;
            stats.committed_steps += 1;
        }
    }

    stats.final_energy = e0;
    stats.final_step = step;
    tracing::debug!(
        anchors = n,
        initial_energy = stats.initial_energy,
        final_energy = stats.final_energy,
        steps = stats.steps,
        committed = stats.committed_steps,
        "coulomb layout finished"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(seed: u64) -> CoulombOptions {
        CoulombOptions {
            random_seed: seed,
            ..Default::default()
        }
    }

    #[test]
    fn anchors_end_on_the_unit_sphere() {
        let mut anchors = vec![Vector3::zeros(); 12];
        solve(&mut anchors, &opts(7));
        for a in &anchors {
            assert!((length(a) - 1.0).abs() < 1e-6, "{a:?}");
        }
    }

    #[test]
    fn energy_never_increases() {
        for seed in [1, 2, 3, 99, 12345] {
            let mut anchors = vec![Vector3::zeros(); 9];
            let stats = solve(&mut anchors, &opts(seed));
            assert!(stats.final_energy <= stats.initial_energy);
            assert!((coulomb_energy(&anchors) - stats.final_energy).abs() < 1e-9);
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let mut a = vec![Vector3::zeros(); 6];
        let mut b = vec![Vector3::zeros(); 6];
        solve(&mut a, &opts(5));
        solve(&mut b, &opts(5));
        assert_eq!(a, b);
    }

    #[test]
    fn two_anchors_drift_apart() {
        let mut anchors = vec![
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        let before = distance(&anchors[0], &anchors[1]);
        let stats = relax(&mut anchors, &opts(1));
        assert!(stats.committed_steps > 0);
        assert!(distance(&anchors[0], &anchors[1]) > before);
    }

    #[test]
    fn forces_are_equal_and_opposite() {
        let positions = [Vector3::new(1.0, 0.0, 0.0), Vector3::new(-1.0, 0.0, 0.0)];
        let mut forces = [Vector3::zeros(); 2];
        coulomb_forces(&positions, &mut forces);
        assert_eq!(forces[0], Vector3::new(0.25, 0.0, 0.0));
        assert_eq!(forces[1], -forces[0]);
    }

    #[test]
    fn fewer_than_two_anchors_is_a_no_op() {
        let mut anchors = vec![Vector3::zeros(); 1];
        let stats = solve(&mut anchors, &opts(3));
        assert_eq!(stats.steps, 0);
        assert_eq!(stats.final_energy, 0.0);
        assert!((length(&anchors[0]) - 1.0).abs() < 1e-12);
    }
}
