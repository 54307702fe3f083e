//! Deferred command recording and replay

pub mod command;
pub mod command_list;

pub use command::{Command, PipelineHandle};
pub use command_list::{CommandList, CommandListPool};

use crate::backend::{GpuBackend, GpuSemaphore};
use crate::pipeline::PipelineCache;
use crate::renderer::RendererStats;
use crate::resources::RenderResources;

/// Everything command replay needs, threaded explicitly
///
/// Built fresh for each `CommandList::execute` call; `current_pipeline`
/// tracks the open pipeline scope during replay so descriptor resolution
/// always sees the right reflection data.
pub struct ExecuteContext<'a> {
    pub backend: &'a mut dyn GpuBackend,
    pub resources: &'a RenderResources,
    pub pipelines: &'a PipelineCache,
    /// Monotonic frame index of the frame being replayed
    pub frame_index: usize,
    /// Semaphore to signal at submission, for the external present surface
    pub signal: Option<&'a dyn GpuSemaphore>,
    pub stats: &'a mut RendererStats,
    pub(crate) current_pipeline: Option<PipelineHandle>,
}

impl<'a> ExecuteContext<'a> {
    pub fn new(
        backend: &'a mut dyn GpuBackend,
        resources: &'a RenderResources,
        pipelines: &'a PipelineCache,
        frame_index: usize,
        signal: Option<&'a dyn GpuSemaphore>,
        stats: &'a mut RendererStats,
    ) -> Self {
        Self {
            backend,
            resources,
            pipelines,
            frame_index,
            signal,
            stats,
            current_pipeline: None,
        }
    }
}
