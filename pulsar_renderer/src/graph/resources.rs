//! Graph resources — the execute-phase API
//!
//! Resolves the tokens a pass collected during setup back to concrete IDs
//! and provides pipeline-cache access, so pass code gets everything it
//! needs through its parameters instead of reaching for globals.

use crate::backend::GpuBackend;
use crate::error::{Error, Result};
use crate::handle::{BufferId, ComputePipelineId, DepthImageId, GraphicsPipelineId, ImageId};
use crate::pipeline::state::{ComputePipelineDesc, GraphicsPipelineDesc};
use crate::pipeline::PipelineCache;
use crate::resources::RenderResources;

use super::builder::{GraphResource, GraphToken, TrackedResource};

/// Execute-phase view handed to each pass's execute callback
pub struct GraphResources<'a> {
    pub(crate) backend: &'a mut dyn GpuBackend,
    /// Read-only handler access during execution
    pub resources: &'a RenderResources,
    pub(crate) pipelines: &'a mut PipelineCache,
    pub(crate) frame_index: usize,
    pub(crate) tracked: &'a [TrackedResource],
}

impl<'a> GraphResources<'a> {
    /// Monotonic index of the frame being executed
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Resolve a token declared for a color image
    pub fn image(&self, token: impl GraphToken) -> Result<ImageId> {
        match self.entry(token.index())?.resource {
            GraphResource::Image(id) => Ok(id),
            other => Err(Error::InvalidResource(format!(
                "token resolves to {:?}, not a color image",
                other
            ))),
        }
    }

    /// Resolve a token declared for a depth image
    pub fn depth_image(&self, token: impl GraphToken) -> Result<DepthImageId> {
        match self.entry(token.index())?.resource {
            GraphResource::DepthImage(id) => Ok(id),
            other => Err(Error::InvalidResource(format!(
                "token resolves to {:?}, not a depth image",
                other
            ))),
        }
    }

    /// Resolve a token declared for a buffer
    pub fn buffer(&self, token: impl GraphToken) -> Result<BufferId> {
        match self.entry(token.index())?.resource {
            GraphResource::Buffer(id) => Ok(id),
            other => Err(Error::InvalidResource(format!(
                "token resolves to {:?}, not a buffer",
                other
            ))),
        }
    }

    /// Get or create a graphics pipeline through the shared cache
    pub fn create_graphics_pipeline(
        &mut self,
        desc: &GraphicsPipelineDesc,
    ) -> Result<GraphicsPipelineId> {
        self.pipelines
            .create_graphics(self.backend, self.resources, desc)
    }

    /// Get or create a compute pipeline through the shared cache
    pub fn create_compute_pipeline(
        &mut self,
        desc: &ComputePipelineDesc,
    ) -> Result<ComputePipelineId> {
        self.pipelines
            .create_compute(self.backend, self.resources, desc)
    }

    fn entry(&self, index: usize) -> Result<&TrackedResource> {
        self.tracked.get(index).ok_or_else(|| {
            Error::InvalidResource(format!(
                "graph token index {} out of range ({} tracked)",
                index,
                self.tracked.len()
            ))
        })
    }
}
