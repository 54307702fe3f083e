//! Graph builder — the setup-phase API
//!
//! During setup each pass declares the transient resources it creates and
//! the existing resources it reads or writes. Declarations yield opaque
//! tokens the pass carries into its execute callback; the concrete IDs are
//! resolved only at execution time, so pass code never hard-codes them.

use crate::backend::types::{BufferDesc, ImageDesc, LoadMode, ReadStage, WriteMode};
use crate::backend::GpuBackend;
use crate::error::Result;
use crate::frame_resource::FRAMES_IN_FLIGHT;
use crate::handle::{BufferId, DepthImageId, ImageId};
use crate::resources::RenderResources;

/// A resource tracked by a render graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphResource {
    Image(ImageId),
    DepthImage(DepthImageId),
    Buffer(BufferId),
}

impl From<ImageId> for GraphResource {
    fn from(id: ImageId) -> Self {
        GraphResource::Image(id)
    }
}

impl From<DepthImageId> for GraphResource {
    fn from(id: DepthImageId) -> Self {
        GraphResource::DepthImage(id)
    }
}

impl From<BufferId> for GraphResource {
    fn from(id: BufferId) -> Self {
        GraphResource::Buffer(id)
    }
}

/// How a tracked resource was first declared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredUsage {
    Read(ReadStage),
    Write(WriteMode, LoadMode),
}

/// One entry of the graph's tracked-resource array
#[derive(Debug, Clone, Copy)]
pub struct TrackedResource {
    pub resource: GraphResource,
    /// First declaration wins; later declarations of the same ID reuse
    /// this entry
    pub usage: DeclaredUsage,
}

/// Token for a declared read dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadToken(pub(crate) u32);

/// Token for a declared write dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteToken(pub(crate) u32);

/// Common access to both token kinds
pub trait GraphToken {
    /// Index into the graph's tracked-resource array
    fn index(&self) -> usize;
}

impl GraphToken for ReadToken {
    fn index(&self) -> usize {
        self.0 as usize
    }
}

impl GraphToken for WriteToken {
    fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Setup-phase view handed to each pass's setup callback
pub struct GraphBuilder<'a> {
    pub(crate) backend: &'a mut dyn GpuBackend,
    pub(crate) resources: &'a mut RenderResources,
    pub(crate) frame_index: usize,
    pub(crate) tracked: &'a mut Vec<TrackedResource>,
}

impl<'a> GraphBuilder<'a> {
    /// Monotonic index of the frame being built
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Allocate a transient color image for this frame
    ///
    /// Destroyed automatically after the frame's in-flight window passes.
    pub fn create_image(&mut self, desc: &ImageDesc) -> Result<ImageId> {
        self.resources.images.create_transient_image(self.backend, desc)
    }

    /// Allocate a transient depth image for this frame
    pub fn create_depth_image(&mut self, desc: &ImageDesc) -> Result<DepthImageId> {
        self.resources
            .images
            .create_transient_depth_image(self.backend, desc)
    }

    /// Allocate a temporary buffer for this frame
    pub fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferId> {
        self.resources
            .buffers
            .create_temporary(self.backend, desc, FRAMES_IN_FLIGHT as u32)
    }

    /// Declare a read dependency on a resource
    ///
    /// Declaring the same concrete ID again (read or write) returns a token
    /// with the same index.
    pub fn read(&mut self, resource: impl Into<GraphResource>, stage: ReadStage) -> ReadToken {
        ReadToken(self.track(resource.into(), DeclaredUsage::Read(stage)))
    }

    /// Declare a write dependency on a resource
    pub fn write(
        &mut self,
        resource: impl Into<GraphResource>,
        mode: WriteMode,
        load: LoadMode,
    ) -> WriteToken {
        WriteToken(self.track(resource.into(), DeclaredUsage::Write(mode, load)))
    }

    /// Dedup by linear scan of the tracked array; first-seen wins
    fn track(&mut self, resource: GraphResource, usage: DeclaredUsage) -> u32 {
        if let Some(index) = self.tracked.iter().position(|t| t.resource == resource) {
            return index as u32;
        }
        self.tracked.push(TrackedResource { resource, usage });
        (self.tracked.len() - 1) as u32
    }
}
