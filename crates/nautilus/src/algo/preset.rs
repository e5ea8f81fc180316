//! Fixed-table placement for first-level clusters.
//!
//! The heaviest unplaced cluster takes the next free slot. Slots alternate between the four
//! in-plane directions and the eight cube corners, front and back.

use crate::math::Vector3;

pub const PRESET_SLOTS: [[f64; 3]; 12] = [
    [-0.7, 0.0, 0.0],
    [0.7, 0.0, 0.0],
    [0.0, 0.7, 0.0],
    [0.0, -0.7, 0.0],
    [-0.5, -0.5, -0.5],
    [0.5, 0.5, -0.5],
    [-0.5, 0.5, -0.5],
    [0.5, -0.5, -0.5],
    [-0.5, -0.5, 0.5],
    [0.5, 0.5, 0.5],
    [-0.5, 0.5, 0.5],
    [0.5, -0.5, 0.5],
];

/// Order in which candidates are placed: descending weight, earlier candidates win ties.
/// `None` marks a candidate that does not take part.
pub fn placement_order(weights: &[Option<usize>]) -> Vec<usize> {
    let mut order = weights
        .iter()
        .enumerate()
        .filter_map(|(i, w)| w.map(|w| (i, w)))
        .collect::<Vec<_>>();
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order.into_iter().map(|(i, _)| i).collect()
}

/// Positions for every candidate. Candidates past the end of the table, and those that do not
/// take part, stay at the origin. Returns the positions and how many slots were filled.
pub fn place(weights: &[Option<usize>]) -> (Vec<Vector3>, usize) {
    let mut positions = vec![Vector3::zeros(); weights.len()];
    let mut placed = 0usize;
    for (slot, index) in placement_order(weights).into_iter().enumerate() {
        if let Some([x, y, z]) = PRESET_SLOTS.get(slot) {
            positions[index] = Vector3::new(*x, *y, *z);
            placed += 1;
        }
    }
    (positions, placed)
}
