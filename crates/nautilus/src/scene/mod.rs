//! The scene aggregate: clusters, leaf nodes and links, plus the shared view state.
//!
//! Clusters and leaves live in insertion-ordered maps keyed by id; every cross reference is a
//! [`ClusterKey`] or [`LeafKey`] index into those maps.

mod detail;
pub mod frame;
pub mod input;
mod view;

use std::fmt;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geom::{ScreenBox, ScreenPoint, ScreenVector, point, rect};
use crate::graph::{EndpointRef, GraphSpec, NodeKind};
use crate::math::{Matrix4x4, Quaternion, Vector3};
use crate::projection::ViewMapping;
use crate::text::TextMeasurer;

pub use detail::SizingOptions;
pub use frame::Frame;
pub use input::{InputEvent, InputOptions, InputState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterKey(usize);

impl ClusterKey {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafKey(usize);

impl LeafKey {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    Root,
    /// Direct child of the root.
    Child,
    Deep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    #[default]
    Compact,
    Expanded,
}

/// Whether the link attaching a cluster to the root points into the cluster or out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkDirection {
    In,
    Out,
}

/// Named after the screen direction of the drag that drives it, not the axis turned about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationAxis {
    /// Horizontal drag: turns about the vertical axis.
    X,
    /// Vertical drag: turns about the horizontal axis.
    Y,
    /// Turns about the viewing axis.
    Z,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Leaf(LeafKey),
    Cluster(ClusterKey),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneOptions {
    /// Share of the viewport half-extent that the unit sphere maps onto.
    pub viewport_fill: f64,
    pub zoom_step: f64,
    pub min_scale: f64,
    /// Leaves switch to [`DetailLevel::Expanded`] once `scale * (z + detail_depth_offset)`
    /// reaches this value.
    pub detail_threshold: f64,
    pub detail_depth_offset: f64,
    /// Opacity behind the viewer is `-1 / (z * rear_fade)`.
    pub rear_fade: f64,
    /// Depth shift applied to screen z before fading and in frame output.
    pub z_offset: f64,
    pub sizing: SizingOptions,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            viewport_fill: 0.8,
            zoom_step: 0.3,
            min_scale: 0.4,
            detail_threshold: 99_999_999.0,
            detail_depth_offset: 500.0,
            rear_fade: 0.007,
            z_offset: 0.0,
            sizing: SizingOptions::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cluster {
    pub id: String,
    /// Never empty.
    pub leaves: Vec<LeafKey>,
    pub parent: Option<ClusterKey>,
    pub children: Vec<ClusterKey>,
    /// Anchor on the unit sphere; the root stays at the origin.
    pub pos: Vector3,
    /// Screen position after rotation, view mapping and viewport scaling.
    pub rpos: Vector3,
    pub width: f64,
    pub height: f64,
    pub half_width: f64,
    pub half_height: f64,
    /// Width at first measurement, `None` until the cluster has been sized once.
    pub initial_width: Option<f64>,
    pub container_scale: f64,
    pub depth: Depth,
    pub weight: usize,
    pub opacity: f64,
    pub bbox: ScreenBox,
    pub link_label: Option<String>,
    pub link_direction: Option<LinkDirection>,
    pub border_color: Option<String>,
}

impl Cluster {
    fn new(id: String, leaves: Vec<LeafKey>) -> Self {
        Self {
            id,
            leaves,
            parent: None,
            children: Vec::new(),
            pos: Vector3::zeros(),
            rpos: Vector3::zeros(),
            width: 0.0,
            height: 0.0,
            half_width: 0.0,
            half_height: 0.0,
            initial_width: None,
            container_scale: 1.0,
            depth: Depth::Root,
            weight: 0,
            opacity: 1.0,
            bbox: ScreenBox::zero(),
            link_label: None,
            link_direction: None,
            border_color: None,
        }
    }

    fn place_box(&mut self) {
        self.bbox = rect(
            self.rpos.x - self.half_width,
            self.rpos.y - self.half_height,
            self.rpos.x + self.half_width,
            self.rpos.y + self.half_height,
        );
    }
}

#[derive(Debug, Clone)]
pub struct LeafNode {
    pub id: String,
    pub text: String,
    pub kind: NodeKind,
    pub url: Option<String>,
    pub cluster: ClusterKey,
    /// Centre of the leaf relative to the centre of its cluster.
    pub offset: ScreenVector,
    pub width: f64,
    pub height: f64,
    pub half_width: f64,
    pub half_height: f64,
    pub rpos: Vector3,
    pub bbox: ScreenBox,
    pub detail: DetailLevel,
}

impl LeafNode {
    fn place_at(&mut self, cluster_rpos: &Vector3) {
        self.rpos = Vector3::new(
            cluster_rpos.x + self.offset.x,
            cluster_rpos.y + self.offset.y,
            cluster_rpos.z,
        );
        self.bbox = rect(
            self.rpos.x - self.half_width,
            self.rpos.y - self.half_height,
            self.rpos.x + self.half_width,
            self.rpos.y + self.half_height,
        );
    }
}

/// Screen-space placement of a link, recomputed on every view update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkGeometry {
    /// Origin endpoint, clipped to the origin box.
    pub p0: ScreenPoint,
    /// Target endpoint, clipped to the target box.
    pub p1: ScreenPoint,
    pub z0: f64,
    pub z1: f64,
    pub center: ScreenPoint,
    /// 2D length between the clipped endpoints.
    pub length: f64,
    /// `atan(dy / dx)`, in `[-π/2, π/2]`.
    pub slope_angle: f64,
    pub length_3d: f64,
    pub rotation_z: f64,
    pub rotation_y: f64,
    /// Top-left corner of the label strip.
    pub label: ScreenPoint,
    pub label_z: f64,
    /// Horizontal offset of the label text inside its strip.
    pub label_offset: f64,
    pub markers: [Vector3; 4],
    pub label_opacity: f64,
    pub marker_opacity: f64,
}

impl Default for LinkGeometry {
    fn default() -> Self {
        Self {
            p0: point(0.0, 0.0),
            p1: point(0.0, 0.0),
            z0: 0.0,
            z1: 0.0,
            center: point(0.0, 0.0),
            length: 0.0,
            slope_angle: 0.0,
            length_3d: 0.0,
            rotation_z: 0.0,
            rotation_y: 0.0,
            label: point(0.0, 0.0),
            label_z: 0.0,
            label_offset: 0.0,
            markers: [Vector3::zeros(); 4],
            label_opacity: 1.0,
            marker_opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Link {
    pub origin: Endpoint,
    pub target: Endpoint,
    pub relation: String,
    pub color: String,
    pub label_half_width: f64,
    pub label_half_height: f64,
    pub geometry: LinkGeometry,
}

fn cluster_key(clusters: &IndexMap<String, Cluster>, id: &str) -> Result<ClusterKey> {
    clusters
        .get_index_of(id)
        .map(ClusterKey)
        .ok_or_else(|| Error::UnknownCluster { id: id.to_string() })
}

pub struct Scene {
    clusters: IndexMap<String, Cluster>,
    leaves: IndexMap<String, LeafNode>,
    links: Vec<Link>,
    root: ClusterKey,
    orientation: Quaternion,
    affine: Matrix4x4,
    scale: f64,
    offset: ScreenVector,
    mapping: ViewMapping,
    width: f64,
    height: f64,
    options: SceneOptions,
    measurer: Box<dyn TextMeasurer>,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("clusters", &self.clusters.len())
            .field("leaves", &self.leaves.len())
            .field("links", &self.links.len())
            .field("orientation", &self.orientation)
            .field("scale", &self.scale)
            .field("offset", &self.offset)
            .field("mapping", &self.mapping)
            .finish_non_exhaustive()
    }
}

impl Scene {
    /// Builds the scene from a validated description and sizes every box with `measurer`.
    ///
    /// All anchors start at the origin; run [`crate::layout`] to spread them out.
    pub fn from_spec(
        spec: &GraphSpec,
        width: f64,
        height: f64,
        options: SceneOptions,
        measurer: Box<dyn TextMeasurer>,
    ) -> Result<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(Error::InvalidViewport { width, height });
        }
        spec.validate()?;

        let node_specs = spec
            .nodes
            .iter()
            .map(|n| (n.id.as_str(), n))
            .collect::<FxHashMap<_, _>>();

        let mut clusters: IndexMap<String, Cluster> = IndexMap::with_capacity(spec.clusters.len());
        let mut leaves: IndexMap<String, LeafNode> = IndexMap::with_capacity(spec.nodes.len());
        for (ci, c) in spec.clusters.iter().enumerate() {
            let mut keys = Vec::with_capacity(c.nodes.len());
            for id in &c.nodes {
                let n = node_specs
                    .get(id.as_str())
                    .ok_or_else(|| Error::UnknownNode { id: id.clone() })?;
                keys.push(LeafKey(leaves.len()));
                leaves.insert(
                    n.id.clone(),
                    LeafNode {
                        id: n.id.clone(),
                        text: n.text.clone(),
                        kind: n.kind,
                        url: n.url.clone(),
                        cluster: ClusterKey(ci),
                        offset: ScreenVector::zero(),
                        width: 0.0,
                        height: 0.0,
                        half_width: 0.0,
                        half_height: 0.0,
                        rpos: Vector3::zeros(),
                        bbox: ScreenBox::zero(),
                        detail: DetailLevel::Compact,
                    },
                );
            }
            clusters.insert(c.id.clone(), Cluster::new(c.id.clone(), keys));
        }

        let mut root = None;
        let mut parents = Vec::with_capacity(clusters.len());
        for (ci, parent) in spec.cluster_parents()?.into_iter().enumerate() {
            match parent {
                Some(p) => parents.push((ClusterKey(ci), Some(cluster_key(&clusters, p)?))),
                None => {
                    root = Some(ClusterKey(ci));
                    parents.push((ClusterKey(ci), None));
                }
            }
        }
        let root = root.ok_or(Error::MissingRoot)?;

        for (key, parent) in parents {
            clusters[key.0].parent = parent;
            if let Some(p) = parent {
                clusters[p.0].children.push(key);
            }
        }

        let depths = (0..clusters.len())
            .map(|i| match clusters[i].parent {
                None => Depth::Root,
                Some(p) if p == root => Depth::Child,
                Some(_) => Depth::Deep,
            })
            .collect::<Vec<_>>();
        for (i, depth) in depths.into_iter().enumerate() {
            let mut weight = clusters[i].leaves.len();
            if depth == Depth::Child {
                weight += clusters[i]
                    .children
                    .iter()
                    .map(|c| clusters[c.0].leaves.len())
                    .sum::<usize>();
            }
            let c = &mut clusters[i];
            c.depth = depth;
            c.weight = weight;
        }

        let mut links = Vec::with_capacity(spec.links.len());
        for (index, l) in spec.links.iter().enumerate() {
            let resolve = |r: EndpointRef<'_>| -> Result<Endpoint> {
                match r {
                    EndpointRef::Node(id) => leaves
                        .get_index_of(id)
                        .map(|i| Endpoint::Leaf(LeafKey(i)))
                        .ok_or_else(|| Error::UnknownNode { id: id.to_string() }),
                    EndpointRef::Cluster(id) => cluster_key(&clusters, id).map(Endpoint::Cluster),
                }
            };
            let origin = resolve(l.origin_ref(index)?)?;
            let target = resolve(l.target_ref(index)?)?;
            links.push(Link {
                origin,
                target,
                relation: l.relation.clone(),
                color: l.color.clone(),
                label_half_width: 0.0,
                label_half_height: 0.0,
                geometry: LinkGeometry::default(),
            });
        }

        let mut scene = Self {
            clusters,
            leaves,
            links,
            root,
            orientation: Quaternion::IDENTITY,
            affine: Quaternion::IDENTITY.to_matrix(),
            scale: 1.0,
            offset: ScreenVector::zero(),
            mapping: ViewMapping::default(),
            width,
            height,
            options,
            measurer,
        };
        scene.attach_link_labels();
        scene.measure_all();
        scene.update_view();

        tracing::debug!(
            clusters = scene.clusters.len(),
            leaves = scene.leaves.len(),
            links = scene.links.len(),
            root = %scene.clusters[root.0].id,
            "scene built"
        );
        Ok(scene)
    }

    /// Records on each cluster the relation that attaches it to the root, and its border colour.
    fn attach_link_labels(&mut self) {
        for i in 0..self.links.len() {
            let origin = self.owner(self.links[i].origin);
            let target = self.owner(self.links[i].target);
            let relation = self.links[i].relation.clone();
            let color = self.links[i].color.clone();

            if origin == self.root {
                let c = &mut self.clusters[target.0];
                c.link_label = Some(relation);
                c.link_direction = Some(LinkDirection::In);
            } else {
                let c = &mut self.clusters[origin.0];
                c.link_label = Some(relation);
                c.link_direction = Some(LinkDirection::Out);
            }

            let bordered = if target == self.root { origin } else { target };
            self.clusters[bordered.0].border_color = Some(color);
        }
    }

    /// Cluster an endpoint belongs to.
    pub fn owner(&self, e: Endpoint) -> ClusterKey {
        match e {
            Endpoint::Cluster(c) => c,
            Endpoint::Leaf(l) => self.leaves[l.0].cluster,
        }
    }

    pub fn clusters(&self) -> &IndexMap<String, Cluster> {
        &self.clusters
    }

    pub fn leaves(&self) -> &IndexMap<String, LeafNode> {
        &self.leaves
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn cluster(&self, key: ClusterKey) -> &Cluster {
        &self.clusters[key.0]
    }

    pub fn leaf(&self, key: LeafKey) -> &LeafNode {
        &self.leaves[key.0]
    }

    pub fn cluster_key(&self, id: &str) -> Option<ClusterKey> {
        self.clusters.get_index_of(id).map(ClusterKey)
    }

    pub fn leaf_key(&self, id: &str) -> Option<LeafKey> {
        self.leaves.get_index_of(id).map(LeafKey)
    }

    pub fn root(&self) -> ClusterKey {
        self.root
    }

    pub fn orientation(&self) -> Quaternion {
        self.orientation
    }

    pub fn affine(&self) -> &Matrix4x4 {
        &self.affine
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> ScreenVector {
        self.offset
    }

    pub fn view_mapping(&self) -> ViewMapping {
        self.mapping
    }

    pub fn set_view_mapping(&mut self, mapping: ViewMapping) {
        self.mapping = mapping;
    }

    pub fn viewport(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn options(&self) -> &SceneOptions {
        &self.options
    }

    /// Every non-root cluster, in map order.
    pub fn anchor_keys(&self) -> Vec<ClusterKey> {
        (0..self.clusters.len())
            .map(ClusterKey)
            .filter(|k| *k != self.root)
            .collect()
    }

    /// Moves the given anchors and pins the root at the origin. Does not re-project.
    pub fn set_anchor_positions(&mut self, keys: &[ClusterKey], positions: &[Vector3]) {
        for (k, p) in keys.iter().zip(positions) {
            self.clusters[k.0].pos = *p;
        }
        self.clusters[self.root.0].pos = Vector3::zeros();
    }

    /// `{first leaf text, ...}`, as used in log output.
    pub fn cluster_summary(&self, key: ClusterKey) -> String {
        let c = &self.clusters[key.0];
        match c.leaves.first() {
            Some(l) => format!("{{{}, ...}}", self.leaves[l.0].text),
            None => format!("{{{}}}", c.id),
        }
    }

    /// Composes an incremental rotation into the orientation and rebuilds the affine matrix.
    /// Positions are stale until the next [`Scene::update_view`].
    pub fn rotate(&mut self, axis: RotationAxis, angle: f64) {
        let delta = match axis {
            RotationAxis::X => Quaternion::from_euler(angle, 0.0, 0.0),
            RotationAxis::Y => Quaternion::from_euler(0.0, 0.0, angle),
            RotationAxis::Z => Quaternion::from_euler(0.0, angle, 0.0),
        };
        self.orientation.multiply(&delta);
        self.orientation.normalize();
        self.affine = self.orientation.to_matrix();
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset += ScreenVector::new(dx, dy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ClusterSpec, LinkSpec, NodeSpec};
    use crate::text::DeterministicTextMeasurer;

    fn node(id: &str, parent: Option<&str>) -> NodeSpec {
        NodeSpec {
            id: id.to_string(),
            text: format!("text {id}"),
            kind: NodeKind::Generic,
            parent: parent.map(str::to_string),
            url: None,
        }
    }

    fn cluster(id: &str, nodes: &[&str]) -> ClusterSpec {
        ClusterSpec {
            id: id.to_string(),
            nodes: nodes.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn three_level() -> GraphSpec {
        GraphSpec {
            clusters: vec![
                cluster("root", &["r"]),
                cluster("a", &["a1", "a2"]),
                cluster("b", &["b1", "b2", "b3"]),
            ],
            nodes: vec![
                node("r", None),
                node("a1", Some("root")),
                node("a2", Some("root")),
                node("b1", Some("a")),
                node("b2", Some("a")),
                node("b3", Some("a")),
            ],
            links: vec![
                LinkSpec {
                    origin: Some("r".to_string()),
                    target_cluster: Some("a".to_string()),
                    relation: "owns".to_string(),
                    color: "#111".to_string(),
                    ..Default::default()
                },
                LinkSpec {
                    origin_cluster: Some("b".to_string()),
                    target: Some("a2".to_string()),
                    relation: "feeds".to_string(),
                    color: "#222".to_string(),
                    ..Default::default()
                },
            ],
        }
    }

    fn build(spec: &GraphSpec) -> Scene {
        Scene::from_spec(
            spec,
            800.0,
            600.0,
            SceneOptions::default(),
            Box::new(DeterministicTextMeasurer::default()),
        )
        .expect("scene")
    }

    #[test]
    fn hierarchy_depth_and_weight() {
        let scene = build(&three_level());
        let root = scene.root();
        let a = scene.cluster_key("a").expect("a");
        let b = scene.cluster_key("b").expect("b");

        assert_eq!(root, ClusterKey(0));
        assert_eq!(scene.cluster(root).depth, Depth::Root);
        assert_eq!(scene.cluster(a).depth, Depth::Child);
        assert_eq!(scene.cluster(b).depth, Depth::Deep);
        assert_eq!(scene.cluster(root).children, vec![a]);
        assert_eq!(scene.cluster(a).children, vec![b]);
        assert_eq!(scene.cluster(b).parent, Some(a));

        assert_eq!(scene.cluster(root).weight, 1);
        assert_eq!(scene.cluster(a).weight, 5);
        assert_eq!(scene.cluster(b).weight, 3);
    }

    #[test]
    fn link_labels_follow_the_root() {
        let scene = build(&three_level());
        let a = scene.cluster(scene.cluster_key("a").expect("a"));
        let b = scene.cluster(scene.cluster_key("b").expect("b"));

        // "owns" starts at the root, so it labels its target inbound; "feeds" then relabels
        // `b` as its origin.
        assert_eq!(a.link_label.as_deref(), Some("owns"));
        assert_eq!(a.link_direction, Some(LinkDirection::In));
        assert_eq!(b.link_label.as_deref(), Some("feeds"));
        assert_eq!(b.link_direction, Some(LinkDirection::Out));
        assert_eq!(a.border_color.as_deref(), Some("#222"));
        assert_eq!(b.border_color, None);

        assert_eq!(scene.links()[0].origin, Endpoint::Leaf(scene.leaf_key("r").expect("r")));
        assert_eq!(scene.owner(scene.links()[1].target), scene.cluster_key("a").expect("a"));
    }

    #[test]
    fn rejects_bad_viewport() {
        let err = Scene::from_spec(
            &three_level(),
            0.0,
            600.0,
            SceneOptions::default(),
            Box::new(DeterministicTextMeasurer::default()),
        )
        .expect_err("zero width");
        assert!(matches!(err, Error::InvalidViewport { .. }));
    }

    #[test]
    fn rotation_keeps_orientation_normalized() {
        let mut scene = build(&three_level());
        for i in 0..2000 {
            let axis = match i % 3 {
                0 => RotationAxis::X,
                1 => RotationAxis::Y,
                _ => RotationAxis::Z,
            };
            scene.rotate(axis, 0.013 * (i as f64).sin() + 0.002);
            assert!((scene.orientation().norm_squared() - 1.0).abs() <= 1e-5);
        }
    }

    #[test]
    fn anchors_exclude_root_and_root_stays_pinned() {
        let mut scene = build(&three_level());
        let keys = scene.anchor_keys();
        assert_eq!(keys.len(), 2);
        assert!(!keys.contains(&scene.root()));

        let root = scene.root();
        scene.clusters[root.0].pos = Vector3::new(1.0, 1.0, 1.0);
        scene.set_anchor_positions(&keys, &[Vector3::x(), Vector3::y()]);
        assert_eq!(scene.cluster(root).pos, Vector3::zeros());
        assert_eq!(scene.cluster(keys[1]).pos, Vector3::y());
    }

    #[test]
    fn summary_uses_first_leaf() {
        let scene = build(&three_level());
        let b = scene.cluster_key("b").expect("b");
        assert_eq!(scene.cluster_summary(b), "{text b1, ...}");
    }

    #[test]
    fn pan_accumulates() {
        let mut scene = build(&three_level());
        scene.pan(3.0, -2.0);
        scene.pan(1.0, 1.0);
        assert_eq!(scene.offset(), ScreenVector::new(4.0, -1.0));
    }
}
