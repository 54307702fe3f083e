//! Render graph: per-frame declarative pass registration with transient
//! resource tracking

pub mod builder;
pub mod render_graph;
pub mod resources;

pub use builder::{
    DeclaredUsage, GraphBuilder, GraphResource, GraphToken, ReadToken, TrackedResource,
    WriteToken,
};
pub use render_graph::RenderGraph;
pub use resources::GraphResources;
