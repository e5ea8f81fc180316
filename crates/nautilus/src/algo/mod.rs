pub mod coulomb;
pub mod preset;
mod rng;

use serde::{Deserialize, Serialize};

pub use coulomb::CoulombStats;

#[derive(Debug, Clone)]
pub enum Algorithm {
    /// Inverse-distance repulsion on the unit sphere; also derives the view mapping.
    Coulomb(CoulombOptions),
    /// Fixed table of positions, filled by descending cluster weight.
    Preset,
}

impl Default for Algorithm {
    fn default() -> Self {
        Self::Coulomb(CoulombOptions::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoulombOptions {
    /// Seed for the initial random placement. The layout is fully determined by it.
    pub random_seed: u64,
    pub max_steps: usize,
    pub initial_step: f64,
    /// The solve stops once a rejected step halves the step size below this.
    pub min_step: f64,
    /// How many clusters should remain in the forward hemisphere after view mapping.
    pub visible_target: usize,
}

impl Default for CoulombOptions {
    fn default() -> Self {
        Self {
            random_seed: 0,
            max_steps: 20,
            initial_step: 0.01,
            min_step: 1e-10,
            visible_target: 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum LayoutStats {
    Coulomb(CoulombStats),
    Preset { placed: usize },
}
