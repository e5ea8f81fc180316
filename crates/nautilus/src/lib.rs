#![forbid(unsafe_code)]

//! Headless spherical layout and fisheye projection for clustered node-link graphs.
//!
//! Clusters of leaf nodes are spread over a unit sphere around a fixed root, turned by a
//! quaternion orientation, pulled through an angular view mapping and scaled into a viewport.
//! Rendering is left to the caller: every update produces a serializable [`Frame`].

pub mod algo;
pub mod error;
pub mod geom;
pub mod graph;
pub mod math;
pub mod projection;
pub mod scene;
pub mod text;

pub use algo::{Algorithm, CoulombOptions, CoulombStats, LayoutStats};
pub use error::{Error, Result};
pub use graph::{ClusterSpec, GraphSpec, LinkSpec, NodeKind, NodeSpec};
pub use projection::{SphericalCoord, ViewMapping};
pub use scene::{
    Cluster, ClusterKey, Depth, DetailLevel, Endpoint, Frame, InputEvent, InputOptions,
    InputState, LeafKey, LeafNode, Link, LinkDirection, RotationAxis, Scene, SceneOptions,
    SizingOptions,
};
pub use text::{DeterministicTextMeasurer, TextMeasurer, TextMetrics, TextStyle};

use math::Vector3;

/// Places every non-root cluster, pins the root at the origin and re-projects the scene.
pub fn layout(scene: &mut Scene, algorithm: Algorithm) -> LayoutStats {
    let anchors = scene.anchor_keys();
    let mut positions = vec![Vector3::zeros(); anchors.len()];

    let stats = match algorithm {
        Algorithm::Coulomb(opts) => {
            let stats = algo::coulomb::solve(&mut positions, &opts);
            scene.set_view_mapping(ViewMapping::for_anchor_count(
                anchors.len(),
                opts.visible_target,
            ));
            LayoutStats::Coulomb(stats)
        }
        Algorithm::Preset => {
            let weights = anchors
                .iter()
                .map(|k| {
                    let c = scene.cluster(*k);
                    (c.depth == Depth::Child).then_some(c.weight)
                })
                .collect::<Vec<_>>();
            let (placed_positions, placed) = algo::preset::place(&weights);
            for (slot, i) in algo::preset::placement_order(&weights)
                .into_iter()
                .take(placed)
                .enumerate()
            {
                tracing::trace!(slot, cluster = %scene.cluster_summary(anchors[i]), "preset slot");
            }
            positions = placed_positions;
            scene.set_view_mapping(ViewMapping::default());
            LayoutStats::Preset { placed }
        }
    };

    scene.set_anchor_positions(&anchors, &positions);
    scene.update_view();
    tracing::debug!(
        anchors = anchors.len(),
        mapping_power = scene.view_mapping().mapping_power,
        negative_stretch = scene.view_mapping().negative_stretch,
        "layout applied"
    );
    stats
}
