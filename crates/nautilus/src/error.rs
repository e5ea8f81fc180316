#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("scene description references an unknown cluster: {id}")]
    UnknownCluster { id: String },

    #[error("scene description references an unknown node: {id}")]
    UnknownNode { id: String },

    #[error("duplicate cluster id: {id}")]
    DuplicateCluster { id: String },

    #[error("duplicate node id: {id}")]
    DuplicateNode { id: String },

    #[error("cluster has no nodes: {id}")]
    EmptyCluster { id: String },

    #[error("node {id} is not listed by any cluster")]
    OrphanNode { id: String },

    #[error("node {id} is listed by both {first} and {second}")]
    NodeInMultipleClusters {
        id: String,
        first: String,
        second: String,
    },

    #[error("scene description has no root cluster")]
    MissingRoot,

    #[error("scene description has more than one root cluster: {first}, {second}")]
    MultipleRoots { first: String, second: String },

    #[error("link #{index} must set exactly one {side} endpoint (node or cluster)")]
    InvalidEndpoint { index: usize, side: &'static str },

    #[error("viewport must be positive and finite, got {width}x{height}")]
    InvalidViewport { width: f64, height: f64 },
}

pub type Result<T> = std::result::Result<T, Error>;
