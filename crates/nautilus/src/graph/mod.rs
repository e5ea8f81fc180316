//! Static scene description, as handed over by the page at load time.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSpec {
    #[serde(default)]
    pub clusters: Vec<ClusterSpec>,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub id: String,
    pub nodes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Generic,
    Url,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    /// Parent cluster of the cluster holding this node; `None` marks the root cluster.
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkSpec {
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub origin_cluster: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub target_cluster: Option<String>,
    #[serde(default)]
    pub relation: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRef<'a> {
    Node(&'a str),
    Cluster(&'a str),
}

fn endpoint<'a>(
    node: &'a Option<String>,
    cluster: &'a Option<String>,
    index: usize,
    side: &'static str,
) -> Result<EndpointRef<'a>> {
    match (node, cluster) {
        (Some(n), None) => Ok(EndpointRef::Node(n)),
        (None, Some(c)) => Ok(EndpointRef::Cluster(c)),
        _ => Err(Error::InvalidEndpoint { index, side }),
    }
}

impl LinkSpec {
    pub fn origin_ref(&self, index: usize) -> Result<EndpointRef<'_>> {
        endpoint(&self.origin, &self.origin_cluster, index, "origin")
    }

    pub fn target_ref(&self, index: usize) -> Result<EndpointRef<'_>> {
        endpoint(&self.target, &self.target_cluster, index, "target")
    }
}

impl GraphSpec {
    /// Parent cluster id of every cluster, in cluster order. The root maps to `None`.
    ///
    /// A node without a parent makes its cluster the root; otherwise the first node decides.
    pub fn cluster_parents(&self) -> Result<Vec<Option<&str>>> {
        let nodes = self
            .nodes
            .iter()
            .map(|n| (n.id.as_str(), n))
            .collect::<FxHashMap<_, _>>();

        let mut parents = Vec::with_capacity(self.clusters.len());
        for c in &self.clusters {
            let mut parent: Option<Option<&str>> = None;
            for id in &c.nodes {
                let node = nodes
                    .get(id.as_str())
                    .ok_or_else(|| Error::UnknownNode { id: id.clone() })?;
                match node.parent.as_deref() {
                    None => parent = Some(None),
                    Some(p) if parent.is_none() => parent = Some(Some(p)),
                    Some(_) => {}
                }
            }
            parents.push(parent.ok_or_else(|| Error::EmptyCluster { id: c.id.clone() })?);
        }
        Ok(parents)
    }

    pub fn validate(&self) -> Result<()> {
        let mut cluster_ids: FxHashSet<&str> = FxHashSet::default();
        for c in &self.clusters {
            if !cluster_ids.insert(c.id.as_str()) {
                return Err(Error::DuplicateCluster { id: c.id.clone() });
            }
            if c.nodes.is_empty() {
                return Err(Error::EmptyCluster { id: c.id.clone() });
            }
        }

        let mut node_ids: FxHashSet<&str> = FxHashSet::default();
        for n in &self.nodes {
            if !node_ids.insert(n.id.as_str()) {
                return Err(Error::DuplicateNode { id: n.id.clone() });
            }
        }

        let mut owner: FxHashMap<&str, &str> = FxHashMap::default();
        for c in &self.clusters {
            for id in &c.nodes {
                if !node_ids.contains(id.as_str()) {
                    return Err(Error::UnknownNode { id: id.clone() });
                }
                if let Some(first) = owner.insert(id.as_str(), c.id.as_str()) {
                    return Err(Error::NodeInMultipleClusters {
                        id: id.clone(),
                        first: first.to_string(),
                        second: c.id.clone(),
                    });
                }
            }
        }
        if let Some(n) = self.nodes.iter().find(|n| !owner.contains_key(n.id.as_str())) {
            return Err(Error::OrphanNode { id: n.id.clone() });
        }

        let mut root: Option<&str> = None;
        for (c, parent) in self.clusters.iter().zip(self.cluster_parents()?) {
            match parent {
                None => {
                    if let Some(first) = root {
                        return Err(Error::MultipleRoots {
                            first: first.to_string(),
                            second: c.id.clone(),
                        });
                    }
                    root = Some(c.id.as_str());
                }
                Some(p) if !cluster_ids.contains(p) => {
                    return Err(Error::UnknownCluster { id: p.to_string() });
                }
                Some(_) => {}
            }
        }
        if root.is_none() {
            return Err(Error::MissingRoot);
        }

        for (index, l) in self.links.iter().enumerate() {
            for side in [l.origin_ref(index)?, l.target_ref(index)?] {
                match side {
                    EndpointRef::Node(id) if !node_ids.contains(id) => {
                        return Err(Error::UnknownNode { id: id.to_string() });
                    }
                    EndpointRef::Cluster(id) if !cluster_ids.contains(id) => {
                        return Err(Error::UnknownCluster { id: id.to_string() });
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }
}
