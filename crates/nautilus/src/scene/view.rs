//! Per-update projection: cluster and leaf screen positions, link placement, zoom.

use super::{Endpoint, LinkGeometry, Scene};
use crate::geom::{ScreenBox, ScreenPoint, point, segment_rect_exit};
use crate::math::Vector3;

const LABEL_OPACITY: f64 = 0.9;
const MARKER_OPACITY: f64 = 0.7;
const MARKER_HALF_SIZE: f64 = 1.5;
const MARKER_STOPS: [f64; 4] = [0.1, 0.2, 0.8, 0.9];

/// Fade for points behind the viewer; `None` in front of it.
fn rear_opacity(z: f64, rear_fade: f64) -> Option<f64> {
    if z < 0.0 {
        Some((-1.0 / (z * rear_fade)).clamp(0.0, 1.0))
    } else {
        None
    }
}

/// Label and marker placement for a link between two clipped endpoints.
#[allow(clippy::too_many_arguments)]
fn link_geometry(
    p0: ScreenPoint,
    p1: ScreenPoint,
    z0: f64,
    z1: f64,
    label_half_width: f64,
    label_half_height: f64,
    z_offset: f64,
    rear_fade: f64,
) -> LinkGeometry {
    let dx = p1.x - p0.x;
    let dy = p1.y - p0.y;
    let dz = z1 - z0;

    let length = (dx * dx + dy * dy).sqrt();
    let center = point(p0.x + dx / 2.0, p0.y + dy / 2.0);
    let slope_angle = if dx == 0.0 && dy == 0.0 {
        0.0
    } else {
        (dy / dx).atan()
    };

    let cz = z0 + dz / 2.0;
    let length_3d = (dx * dx + dy * dy + dz * dz).sqrt();
    let rotation_z = dy.atan2(dx);
    let rotation_y = if dx >= 0.0 {
        -(dz * rotation_z.cos()).atan2(dx)
    } else {
        (dz * rotation_z.cos()).atan2(-dx)
    };

    let markers = MARKER_STOPS.map(|t| {
        Vector3::new(
            p0.x + dx * t - MARKER_HALF_SIZE,
            p0.y + dy * t - MARKER_HALF_SIZE,
            z0 + dz * t,
        )
    });

    let (label_opacity, marker_opacity) = match rear_opacity(cz + z_offset, rear_fade) {
        Some(o) => (o, o),
        None => (LABEL_OPACITY, MARKER_OPACITY),
    };

    LinkGeometry {
        p0,
        p1,
        z0,
        z1,
        center,
        length,
        slope_angle,
        length_3d,
        rotation_z,
        rotation_y,
        label: point(center.x - length_3d / 2.0, center.y - label_half_height),
        label_z: cz + z_offset,
        label_offset: length_3d / 2.0 - label_half_width,
        markers,
        label_opacity,
        marker_opacity,
    }
}

impl Scene {
    /// Links attach to the box of the cluster that owns the endpoint, leaf or not.
    fn endpoint_box(&self, e: Endpoint) -> (Vector3, ScreenBox) {
        let c = &self.clusters[self.owner(e).0];
        (c.rpos, c.bbox)
    }

    /// Re-projects every cluster through the current orientation and view mapping, then
    /// recomputes leaf boxes and link placement.
    ///
    /// A cluster whose transform comes out non-finite keeps its previous position.
    pub fn update_view(&mut self) {
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        let fill = self.options.viewport_fill;
        let rear_fade = self.options.rear_fade;
        let z_offset = self.options.z_offset;

        for ci in 0..self.clusters.len() {
            let pos = self.clusters[ci].pos;
            let projected = self
                .affine
                .try_project_point(&pos)
                .map(|v| self.mapping.project(&v))
                .filter(|v| v.iter().all(|c| c.is_finite()));
            let Some(v) = projected else {
                tracing::trace!(cluster = %self.clusters[ci].id, "skipping non-finite transform");
                continue;
            };

            let c = &mut self.clusters[ci];
            c.rpos = Vector3::new(
                v.x * hw * fill + hw,
                v.y * hh * fill + hh,
                v.z * hw.min(hh) * fill,
            );
            c.place_box();
            c.opacity = rear_opacity(c.rpos.z + z_offset, rear_fade).unwrap_or(1.0);

            let rpos = c.rpos;
            for j in 0..self.clusters[ci].leaves.len() {
                let lk = self.clusters[ci].leaves[j];
                self.leaves[lk.0].place_at(&rpos);
            }
        }

        for i in 0..self.links.len() {
            let (a, abox) = self.endpoint_box(self.links[i].origin);
            let (b, bbox) = self.endpoint_box(self.links[i].target);
            let from = point(a.x, a.y);
            let to = point(b.x, b.y);
            let p0 = segment_rect_exit(from, to, &abox).unwrap_or(from);
            let p1 = segment_rect_exit(to, from, &bbox).unwrap_or(to);

            let link = &mut self.links[i];
            link.geometry = link_geometry(
                p0,
                p1,
                a.z,
                b.z,
                link.label_half_width,
                link.label_half_height,
                z_offset,
                rear_fade,
            );
        }
    }

    /// Zooms by `delta` steps around the cursor, then runs the detail pass.
    ///
    /// Zooming in keeps the point under the cursor fixed. Zooming out pulls the pan offset
    /// towards the centre in proportion to the distance left to the minimum scale.
    /// Returns whether any leaf changed detail level.
    pub fn zoom(&mut self, delta: f64, cursor_x: f64, cursor_y: f64) -> bool {
        let min_scale = self.options.min_scale;
        let new_scale = (self.scale + self.options.zoom_step * delta).max(min_scale);

        if delta >= 0.0 {
            let rx = cursor_x - self.width / 2.0;
            let ry = cursor_y - self.height / 2.0;
            self.offset.x = rx - ((rx - self.offset.x) / self.scale) * new_scale;
            self.offset.y = ry - ((ry - self.offset.y) / self.scale) * new_scale;
        } else if self.scale - min_scale > 0.0 {
            let r = (new_scale - min_scale) / (self.scale - min_scale);
            self.offset *= r;
        }
        self.scale = new_scale;

        tracing::trace!(scale = self.scale, x = self.offset.x, y = self.offset.y, "zoom");
        self.update_detail_level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::ScreenVector;
    use crate::graph::{ClusterSpec, GraphSpec, LinkSpec, NodeKind, NodeSpec};
    use crate::math::Matrix4x4;
    use crate::scene::{ClusterKey, SceneOptions};
    use crate::text::DeterministicTextMeasurer;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn two_clusters() -> Scene {
        let node = |id: &str, parent: Option<&str>| NodeSpec {
            id: id.to_string(),
            text: id.to_string(),
            kind: NodeKind::Generic,
            parent: parent.map(str::to_string),
            url: None,
        };
        let spec = GraphSpec {
            clusters: vec![
                ClusterSpec {
                    id: "root".to_string(),
                    nodes: vec!["r".to_string()],
                },
                ClusterSpec {
                    id: "a".to_string(),
                    nodes: vec!["a1".to_string()],
                },
            ],
            nodes: vec![node("r", None), node("a1", Some("root"))],
            links: vec![LinkSpec {
                origin_cluster: Some("root".to_string()),
                target: Some("a1".to_string()),
                relation: "has".to_string(),
                color: "#333".to_string(),
                ..Default::default()
            }],
        };
        Scene::from_spec(
            &spec,
            800.0,
            600.0,
            SceneOptions::default(),
            Box::new(DeterministicTextMeasurer::default()),
        )
        .expect("scene")
    }

    fn place_a(scene: &mut Scene, pos: Vector3) -> ClusterKey {
        let a = scene.cluster_key("a").expect("a");
        scene.set_anchor_positions(&[a], &[pos]);
        scene.update_view();
        a
    }

    #[test]
    fn root_sits_in_the_middle() {
        let scene = two_clusters();
        let root = scene.cluster(scene.root());
        assert!(close(root.rpos.x, 400.0));
        assert!(close(root.rpos.y, 300.0));
        assert!(close(root.rpos.z, 0.0));
        assert_eq!(root.opacity, 1.0);
        assert!(close(root.bbox.min.x, 400.0 - root.half_width));
        assert!(close(root.bbox.max.y, 300.0 + root.half_height));
    }

    #[test]
    fn unit_x_maps_to_eighty_percent_of_half_width() {
        let mut scene = two_clusters();
        let a = place_a(&mut scene, Vector3::new(1.0, 0.0, 0.0));
        let c = scene.cluster(a);
        assert!(close(c.rpos.x, 720.0));
        assert!(close(c.rpos.y, 300.0));
        assert!(close(c.rpos.z, 0.0));

        let leaf = scene.leaf(c.leaves[0]);
        assert!(close(leaf.rpos.x, c.rpos.x + leaf.offset.x));
        assert!(close(leaf.rpos.y, c.rpos.y + leaf.offset.y));
        assert!(close(leaf.bbox.min.x, leaf.rpos.x - leaf.half_width));
    }

    #[test]
    fn clusters_behind_the_viewer_fade() {
        let mut scene = two_clusters();
        let a = place_a(&mut scene, Vector3::new(0.0, 0.0, -1.0));
        let c = scene.cluster(a);
        assert!(close(c.rpos.z, -240.0));
        assert!(close(c.opacity, 1.0 / (240.0 * 0.007)));
    }

    #[test]
    fn degenerate_transform_keeps_previous_position() {
        let mut scene = two_clusters();
        let a = place_a(&mut scene, Vector3::new(1.0, 0.0, 0.0));
        let before = scene.cluster(a).rpos;
        scene.affine = Matrix4x4([0.0; 16]);
        scene.update_view();
        assert_eq!(scene.cluster(a).rpos, before);
    }

    #[test]
    fn link_endpoints_are_clipped_to_boxes() {
        let mut scene = two_clusters();
        let a = place_a(&mut scene, Vector3::new(1.0, 0.0, 0.0));
        let root = scene.cluster(scene.root());
        let target = scene.cluster(a);
        let leaf = scene.leaf(target.leaves[0]);
        let g = scene.links()[0].geometry;

        assert!(close(g.p0.x, 400.0 + root.half_width));
        // The link targets leaf a1 but stops at the edge of cluster a, outside the leaf box.
        assert!(close(g.p1.x, target.bbox.min.x));
        assert!(g.p1.x < leaf.bbox.min.x);
        assert!((g.p0.y - 300.0).abs() < 1e-6);
        assert!(close(g.length, g.p1.x - g.p0.x));
        assert!(g.rotation_z.abs() < 1e-6);
        assert_eq!(g.label_opacity, 0.9);
        assert_eq!(g.marker_opacity, 0.7);
    }

    #[test]
    fn horizontal_link_geometry() {
        let g = link_geometry(point(0.0, 0.0), point(100.0, 0.0), 0.0, 0.0, 20.0, 5.0, 0.0, 0.007);
        assert_eq!(g.length, 100.0);
        assert_eq!(g.length_3d, 100.0);
        assert_eq!(g.center, point(50.0, 0.0));
        assert_eq!(g.slope_angle, 0.0);
        assert_eq!(g.rotation_z, 0.0);
        assert_eq!(g.rotation_y, 0.0);
        assert_eq!(g.label, point(0.0, -5.0));
        assert_eq!(g.label_offset, 30.0);
        assert_eq!(g.markers[0], Vector3::new(8.5, -1.5, 0.0));
        assert_eq!(g.markers[3], Vector3::new(88.5, -1.5, 0.0));
    }

    #[test]
    fn link_tilts_towards_depth() {
        let g = link_geometry(point(0.0, 0.0), point(30.0, 0.0), 0.0, 40.0, 0.0, 0.0, 0.0, 0.007);
        assert_eq!(g.length_3d, 50.0);
        assert!(close(g.rotation_y, -(40.0f64).atan2(30.0)));

        let back = link_geometry(point(30.0, 0.0), point(0.0, 0.0), 0.0, 40.0, 0.0, 0.0, 0.0, 0.007);
        // Pointing left, rotation_z is π and cos(π) flips the depth term.
        assert!(close(back.rotation_y, (-40.0f64).atan2(30.0)));
    }

    #[test]
    fn link_geometry_fades_behind_viewer() {
        let g = link_geometry(point(0.0, 0.0), point(10.0, 0.0), -300.0, -300.0, 0.0, 0.0, 0.0, 0.007);
        assert!(close(g.label_opacity, 1.0 / 2.1));
        assert_eq!(g.label_opacity, g.marker_opacity);

        let near = link_geometry(point(0.0, 0.0), point(10.0, 0.0), -10.0, -10.0, 0.0, 0.0, 0.0, 0.007);
        assert_eq!(near.label_opacity, 1.0);
    }

    #[test]
    fn coincident_endpoints_have_zero_slope() {
        let g = link_geometry(point(5.0, 5.0), point(5.0, 5.0), 0.0, 0.0, 0.0, 0.0, 0.0, 0.007);
        assert_eq!(g.slope_angle, 0.0);
        assert_eq!(g.length, 0.0);
    }

    #[test]
    fn zoom_at_centre_is_a_fixed_point() {
        let mut scene = two_clusters();
        scene.zoom(1.0, 400.0, 300.0);
        assert!(close(scene.scale(), 1.3));
        assert_eq!(scene.offset(), ScreenVector::new(0.0, 0.0));
    }

    #[test]
    fn zoom_in_keeps_cursor_point_fixed() {
        let mut scene = two_clusters();
        scene.pan(15.0, -7.0);
        let (x, y) = (620.0, 110.0);
        let world = |s: &Scene| {
            let o = s.offset();
            ((x - 400.0 - o.x) / s.scale(), (y - 300.0 - o.y) / s.scale())
        };
        let before = world(&scene);
        scene.zoom(2.0, x, y);
        let after = world(&scene);
        assert!(close(before.0, after.0));
        assert!(close(before.1, after.1));
    }

    #[test]
    fn zoom_out_pulls_offset_in_and_clamps_scale() {
        let mut scene = two_clusters();
        scene.pan(100.0, 50.0);
        scene.zoom(-1.0, 0.0, 0.0);
        assert!(close(scene.scale(), 0.7));
        // (0.7 - 0.4) / (1.0 - 0.4) = 0.5
        assert!(close(scene.offset().x, 50.0));
        assert!(close(scene.offset().y, 25.0));

        scene.zoom(-10.0, 0.0, 0.0);
        assert!(close(scene.scale(), 0.4));
        assert!(close(scene.offset().x, 0.0));

        // Already at the floor: the offset is left alone.
        scene.pan(10.0, 0.0);
        scene.zoom(-1.0, 0.0, 0.0);
        assert!(close(scene.scale(), 0.4));
        assert!(close(scene.offset().x, 10.0));
    }
}
