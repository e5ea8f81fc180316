pub mod quaternion;
pub mod vector;

pub use quaternion::Quaternion;
pub use vector::{Matrix4x4, Vector3, distance, dot, length};
