//! Serializable snapshot of everything a renderer needs after an update pass.

use serde::Serialize;

use super::{Depth, DetailLevel, Endpoint, LinkDirection, Scene};
use crate::math::Quaternion;
use crate::projection::ViewMapping;

#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub transform: SceneTransform,
    pub orientation: Quaternion,
    pub view_mapping: ViewMapping,
    pub clusters: Vec<ClusterFrame>,
    pub leaves: Vec<LeafFrame>,
    pub links: Vec<LinkFrame>,
}

/// Pan and zoom applied to the whole scene on top of the per-entity positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SceneTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterFrame {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
    pub opacity: f64,
    pub depth: Depth,
    pub weight: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_direction: Option<LinkDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeafFrame {
    pub id: String,
    pub cluster: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
    pub opacity: f64,
    pub detail: DetailLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointId {
    Leaf(String),
    Cluster(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkFrame {
    pub origin: EndpointId,
    pub target: EndpointId,
    pub relation: String,
    pub color: String,
    pub endpoint_a: [f64; 3],
    pub endpoint_b: [f64; 3],
    pub label_x: f64,
    pub label_y: f64,
    pub label_z: f64,
    pub label_offset: f64,
    pub rotation_z: f64,
    pub rotation_y: f64,
    pub label_opacity: f64,
    pub marker_opacity: f64,
    pub markers: [[f64; 3]; 4],
}

impl Scene {
    fn endpoint_id(&self, e: Endpoint) -> EndpointId {
        match e {
            Endpoint::Leaf(k) => EndpointId::Leaf(self.leaves[k.0].id.clone()),
            Endpoint::Cluster(k) => EndpointId::Cluster(self.clusters[k.0].id.clone()),
        }
    }

    pub fn frame(&self) -> Frame {
        let z_offset = self.options.z_offset;

        let clusters = self
            .clusters
            .values()
            .map(|c| ClusterFrame {
                id: c.id.clone(),
                x: c.rpos.x,
                y: c.rpos.y,
                z: c.rpos.z + z_offset,
                width: c.width,
                height: c.height,
                scale: c.container_scale,
                opacity: c.opacity,
                depth: c.depth,
                weight: c.weight,
                link_label: c.link_label.clone(),
                link_direction: c.link_direction,
                border_color: c.border_color.clone(),
            })
            .collect();

        let leaves = self
            .leaves
            .values()
            .map(|l| {
                let c = &self.clusters[l.cluster.0];
                LeafFrame {
                    id: l.id.clone(),
                    cluster: c.id.clone(),
                    x: l.rpos.x,
                    y: l.rpos.y,
                    z: l.rpos.z + z_offset,
                    width: l.width,
                    height: l.height,
                    scale: c.container_scale,
                    opacity: c.opacity,
                    detail: l.detail,
                }
            })
            .collect();

        let links = self
            .links
            .iter()
            .map(|l| {
                let g = &l.geometry;
                LinkFrame {
                    origin: self.endpoint_id(l.origin),
                    target: self.endpoint_id(l.target),
                    relation: l.relation.clone(),
                    color: l.color.clone(),
                    endpoint_a: [g.p0.x, g.p0.y, g.z0 + z_offset],
                    endpoint_b: [g.p1.x, g.p1.y, g.z1 + z_offset],
                    label_x: g.label.x,
                    label_y: g.label.y,
                    label_z: g.label_z,
                    label_offset: g.label_offset,
                    rotation_z: g.rotation_z,
                    rotation_y: g.rotation_y,
                    label_opacity: g.label_opacity,
                    marker_opacity: g.marker_opacity,
                    markers: g.markers.map(|m| [m.x, m.y, m.z + z_offset]),
                }
            })
            .collect();

        Frame {
            transform: SceneTransform {
                scale: self.scale,
                offset_x: self.offset.x,
                offset_y: self.offset.y,
            },
            orientation: self.orientation,
            view_mapping: self.mapping,
            clusters,
            leaves,
            links,
        }
    }
}
