//! Topic-based subscription system.

pub mod registry;
pub mod subscription;
pub mod topic;

pub use registry::TopicRegistry;
pub use topic::Topic;
