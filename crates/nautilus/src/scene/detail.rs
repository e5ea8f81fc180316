//! Box sizing and the compact/expanded level-of-detail pass.

use serde::{Deserialize, Serialize};

use super::{ClusterKey, DetailLevel, LeafKey, Scene};
use crate::geom::ScreenVector;
use crate::graph::NodeKind;
use crate::text::TextStyle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingOptions {
    pub compact_font_size: f64,
    pub expanded_font_size: f64,
    pub url_font_size: f64,
    pub label_font_size: f64,
    pub leaf_padding: f64,
    pub cluster_padding: f64,
    pub label_padding: f64,
    /// Clusters holding more than one leaf scroll past this height.
    pub max_cluster_height: f64,
    /// Secondary line shown under the title of expanded leaves.
    pub detail_text: String,
}

impl Default for SizingOptions {
    fn default() -> Self {
        Self {
            compact_font_size: 12.0,
            expanded_font_size: 24.0,
            url_font_size: 10.0,
            label_font_size: 11.0,
            leaf_padding: 4.0,
            cluster_padding: 6.0,
            label_padding: 3.0,
            max_cluster_height: 250.0,
            detail_text: "Some more text about this node.".to_string(),
        }
    }
}

impl Scene {
    pub(super) fn measure_all(&mut self) {
        for i in 0..self.leaves.len() {
            self.measure_leaf(LeafKey(i));
        }
        for i in 0..self.clusters.len() {
            self.measure_cluster(ClusterKey(i));
        }
        self.measure_link_labels();
    }

    fn measure_leaf(&mut self, key: LeafKey) {
        let sizing = &self.options.sizing;
        let leaf = &self.leaves[key.0];
        let font_size = match leaf.detail {
            DetailLevel::Compact => sizing.compact_font_size,
            DetailLevel::Expanded => sizing.expanded_font_size,
        };

        let title = self.measurer.measure(&leaf.text, &TextStyle { font_size });
        let mut width = title.width;
        let mut height = title.height;

        if leaf.kind == NodeKind::Url {
            if let Some(url) = leaf.url.as_deref() {
                let m = self.measurer.measure(
                    url,
                    &TextStyle {
                        font_size: sizing.url_font_size,
                    },
                );
                width = width.max(m.width);
                height += m.height;
            }
        }
        if leaf.detail == DetailLevel::Expanded {
            let m = self.measurer.measure(
                &sizing.detail_text,
                &TextStyle {
                    font_size: sizing.compact_font_size,
                },
            );
            width = width.max(m.width);
            height += m.height;
        }

        let padding = sizing.leaf_padding * 2.0;
        let leaf = &mut self.leaves[key.0];
        leaf.width = width + padding;
        leaf.height = height + padding;
        leaf.half_width = leaf.width / 2.0;
        leaf.half_height = leaf.height / 2.0;
    }

    /// Stacks the leaves top to bottom and derives the cluster box from them.
    fn measure_cluster(&mut self, key: ClusterKey) {
        let padding = self.options.sizing.cluster_padding;
        let max_height = self.options.sizing.max_cluster_height;
        let keys = &self.clusters[key.0].leaves;

        let mut content_width = 0.0f64;
        let mut content_height = 0.0;
        for lk in keys {
            let leaf = &self.leaves[lk.0];
            content_width = content_width.max(leaf.width);
            content_height += leaf.height;
        }

        let width = content_width + padding * 2.0;
        let mut height = content_height + padding * 2.0;
        if keys.len() > 1 && height > max_height {
            height = max_height;
        }

        let mut y = -height / 2.0 + padding;
        for lk in keys {
            let leaf = &mut self.leaves[lk.0];
            leaf.offset = ScreenVector::new(0.0, y + leaf.half_height);
            y += leaf.height;
        }

        let c = &mut self.clusters[key.0];
        c.width = width;
        c.height = height;
        c.half_width = width / 2.0;
        c.half_height = height / 2.0;
        if c.initial_width.is_none() {
            c.initial_width = Some(width);
        }
    }

    fn measure_link_labels(&mut self) {
        let style = TextStyle {
            font_size: self.options.sizing.label_font_size,
        };
        let padding = self.options.sizing.label_padding * 2.0;
        for link in &mut self.links {
            let m = self.measurer.measure(&link.relation, &style);
            link.label_half_width = (m.width + padding) / 2.0;
            link.label_half_height = (m.height + padding) / 2.0;
        }
    }

    /// Chooses compact or expanded detail for every leaf from its cluster's depth and the zoom
    /// scale. Clusters whose leaves changed are re-measured and rescaled to their first width.
    ///
    /// Returns whether any leaf changed level.
    pub fn update_detail_level(&mut self) -> bool {
        let threshold = self.options.detail_threshold;
        let depth_offset = self.options.detail_depth_offset;
        let mut changed = 0usize;

        for ci in 0..self.clusters.len() {
            let k = self.scale * (self.clusters[ci].rpos.z + depth_offset);
            let level = if k < threshold {
                DetailLevel::Compact
            } else {
                DetailLevel::Expanded
            };

            let mut updated = false;
            for j in 0..self.clusters[ci].leaves.len() {
                let lk = self.clusters[ci].leaves[j];
                if self.leaves[lk.0].detail != level {
                    self.leaves[lk.0].detail = level;
                    self.measure_leaf(lk);
                    updated = true;
                }
            }
            if !updated {
                continue;
            }

            changed += 1;
            self.measure_cluster(ClusterKey(ci));
            let c = &mut self.clusters[ci];
            c.container_scale = c.initial_width.unwrap_or(c.width) / c.width;
            c.place_box();
            let rpos = c.rpos;
            for j in 0..self.clusters[ci].leaves.len() {
                let lk = self.clusters[ci].leaves[j];
                self.leaves[lk.0].place_at(&rpos);
            }
        }

        if changed > 0 {
            tracing::debug!(clusters = changed, scale = self.scale, "detail level changed");
        }
        changed > 0
    }
}
