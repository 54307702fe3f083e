//! Pipelines
//!
//! Fixed-function state descriptions, the content-hash pipeline cache, and
//! reflection-driven descriptor resolution.

pub mod binder;
pub mod cache;
pub mod state;

pub use binder::{attach_resources, resolve_descriptor_set, ResolvedBindingIds};
pub use cache::PipelineCache;
