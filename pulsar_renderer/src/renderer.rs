//! Renderer facade
//!
//! Owns the backend, the resource handlers, the pipeline cache, and the
//! command-list pool, and threads them through graph setup/execute as an
//! explicit `RenderContext`. The frame index lives here and is passed down
//! to everything frame-dependent; there is no ambient frame state.

use crate::backend::types::FrameOutput;
use crate::backend::GpuBackend;
use crate::command::CommandListPool;
use crate::engine_info;
use crate::error::Result;
use crate::frame_resource::FRAMES_IN_FLIGHT;
use crate::graph::RenderGraph;
use crate::handle::{DepthImageId, GpuSemaphoreId, ImageId};
use crate::pipeline::PipelineCache;
use crate::resources::RenderResources;

/// Renderer configuration
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Application name
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "Pulsar Application".to_string(),
            app_version: (1, 0, 0),
        }
    }
}

/// Renderer statistics, accumulated during command replay
#[derive(Debug, Clone, Copy, Default)]
pub struct RendererStats {
    /// Number of draw calls this frame
    pub draw_calls: u32,
    /// Number of compute dispatches this frame
    pub dispatches: u32,
}

/// Explicit borrows of everything a frame's graph work needs
///
/// Built by `Renderer::render_context` and threaded through
/// `RenderGraph::setup`/`execute`.
pub struct RenderContext<'a> {
    pub backend: &'a mut dyn GpuBackend,
    pub resources: &'a mut RenderResources,
    pub pipelines: &'a mut PipelineCache,
    pub command_lists: &'a mut CommandListPool,
    /// Monotonic index of the current frame
    pub frame_index: usize,
    /// Semaphore signalled when the frame's submission completes
    pub signal: Option<GpuSemaphoreId>,
    pub stats: &'a mut RendererStats,
}

/// The renderer
///
/// Field order is load-bearing: handlers and the pipeline cache must drop
/// before the backend tears the device down.
pub struct Renderer {
    pub resources: RenderResources,
    pub pipelines: PipelineCache,
    command_lists: CommandListPool,
    backend: Box<dyn GpuBackend>,
    config: RendererConfig,
    frame_index: usize,
    stats: RendererStats,
    /// Semaphore handed to the external present surface, if one was set up
    present_semaphore: GpuSemaphoreId,
}

impl Renderer {
    /// Create a renderer over a backend
    pub fn new(backend: Box<dyn GpuBackend>, config: RendererConfig) -> Self {
        engine_info!(
            "pulsar::Renderer",
            "renderer created for '{}' ({} frames in flight)",
            config.app_name,
            FRAMES_IN_FLIGHT
        );
        Self {
            backend,
            resources: RenderResources::new(),
            pipelines: PipelineCache::new(),
            command_lists: CommandListPool::new(),
            config,
            frame_index: 0,
            stats: RendererStats::default(),
            present_semaphore: GpuSemaphoreId::default(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Monotonic index of the current frame
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Statistics of the last executed frame
    pub fn stats(&self) -> RendererStats {
        self.stats
    }

    /// Mutable backend access (resource creation outside the handlers)
    pub fn backend_mut(&mut self) -> &mut dyn GpuBackend {
        self.backend.as_mut()
    }

    // ===== RESOURCE FACTORY =====
    //
    // Convenience wrappers over the handlers that thread the backend
    // through; the handlers remain directly reachable via `resources`.

    /// Create a buffer
    pub fn create_buffer(&mut self, desc: &crate::backend::types::BufferDesc) -> Result<crate::handle::BufferId> {
        self.resources.buffers.create(self.backend.as_mut(), desc)
    }

    /// Create a temporary buffer alive for `lifetime_frames` frame-start
    /// ticks
    pub fn create_temporary_buffer(
        &mut self,
        desc: &crate::backend::types::BufferDesc,
        lifetime_frames: u32,
    ) -> Result<crate::handle::BufferId> {
        self.resources
            .buffers
            .create_temporary(self.backend.as_mut(), desc, lifetime_frames)
    }

    /// Create a color/storage image
    pub fn create_image(&mut self, desc: &crate::backend::types::ImageDesc) -> Result<ImageId> {
        self.resources.images.create_image(self.backend.as_mut(), desc)
    }

    /// Create a depth/stencil image
    pub fn create_depth_image(
        &mut self,
        desc: &crate::backend::types::ImageDesc,
    ) -> Result<DepthImageId> {
        self.resources
            .images
            .create_depth_image(self.backend.as_mut(), desc)
    }

    /// Create a sampled texture
    pub fn create_texture(
        &mut self,
        desc: &crate::backend::types::TextureDesc,
    ) -> Result<crate::handle::TextureId> {
        self.resources
            .textures
            .create_texture(self.backend.as_mut(), desc)
    }

    /// Create a sampled texture array
    pub fn create_texture_array(
        &mut self,
        desc: &crate::backend::types::TextureDesc,
    ) -> Result<crate::handle::TextureArrayId> {
        self.resources
            .textures
            .create_texture_array(self.backend.as_mut(), desc)
    }

    /// Create a sampler
    pub fn create_sampler(
        &mut self,
        desc: &crate::backend::types::SamplerDesc,
    ) -> Result<crate::handle::SamplerId> {
        self.resources.samplers.create(self.backend.as_mut(), desc)
    }

    /// Create a model, uploading its vertex and index data
    pub fn create_model(
        &mut self,
        desc: &crate::backend::types::ModelDesc,
    ) -> Result<crate::handle::ModelId> {
        self.resources
            .models
            .create(self.backend.as_mut(), &mut self.resources.buffers, desc)
    }

    /// Load a graphics shader program (deduplicated by source paths)
    pub fn load_graphics_shader(
        &mut self,
        desc: &crate::backend::types::GraphicsShaderDesc,
    ) -> Result<crate::handle::GraphicsShaderId> {
        self.resources
            .shaders
            .load_graphics(self.backend.as_mut(), desc)
    }

    /// Load a compute shader program (deduplicated by source path)
    pub fn load_compute_shader(
        &mut self,
        desc: &crate::backend::types::ComputeShaderDesc,
    ) -> Result<crate::handle::ComputeShaderId> {
        self.resources
            .shaders
            .load_compute(self.backend.as_mut(), desc)
    }

    /// Get or create a graphics pipeline through the cache
    pub fn create_graphics_pipeline(
        &mut self,
        desc: &crate::pipeline::state::GraphicsPipelineDesc,
    ) -> Result<crate::handle::GraphicsPipelineId> {
        self.pipelines
            .create_graphics(self.backend.as_mut(), &self.resources, desc)
    }

    /// Get or create a compute pipeline through the cache
    pub fn create_compute_pipeline(
        &mut self,
        desc: &crate::pipeline::state::ComputePipelineDesc,
    ) -> Result<crate::handle::ComputePipelineId> {
        self.pipelines
            .create_compute(self.backend.as_mut(), &self.resources, desc)
    }

    /// Create the semaphore the present surface waits on
    ///
    /// Optional; headless clients skip this and present nothing.
    pub fn create_present_semaphore(&mut self) -> Result<GpuSemaphoreId> {
        let id = self.resources.semaphores.create(self.backend.as_mut())?;
        self.present_semaphore = id;
        Ok(id)
    }

    /// Begin a frame
    ///
    /// Advances the frame index, blocks on the frame slot's completion
    /// fence (the sole blocking point; a timeout is fatal and treated as a
    /// GPU hang), then ages delayed-destruction resources.
    pub fn begin_frame(&mut self) -> Result<()> {
        self.frame_index += 1;
        self.backend.begin_frame(self.frame_index)?;
        self.resources.begin_frame();
        self.stats = RendererStats::default();
        Ok(())
    }

    /// Borrow everything graph work needs for this frame
    pub fn render_context(&mut self) -> RenderContext<'_> {
        let signal = if self.resources.semaphores.contains(self.present_semaphore) {
            Some(self.present_semaphore)
        } else {
            None
        };
        RenderContext {
            backend: self.backend.as_mut(),
            resources: &mut self.resources,
            pipelines: &mut self.pipelines,
            command_lists: &mut self.command_lists,
            frame_index: self.frame_index,
            signal,
            stats: &mut self.stats,
        }
    }

    /// Run a graph's setup and execute phases for this frame
    pub fn execute_graph(&mut self, graph: &mut RenderGraph) -> Result<()> {
        let mut ctx = self.render_context();
        graph.setup(&mut ctx)?;
        graph.execute(&mut ctx)
    }

    /// The finished frame for the externally-owned present surface
    pub fn frame_output(
        &self,
        image: ImageId,
        depth_image: Option<DepthImageId>,
    ) -> Result<FrameOutput> {
        // Validate the IDs before handing them out
        self.resources.images.get_image(image)?;
        if let Some(depth) = depth_image {
            self.resources.images.get_depth_image(depth)?;
        }
        let wait_semaphore = if self.resources.semaphores.contains(self.present_semaphore) {
            Some(self.present_semaphore)
        } else {
            None
        };
        Ok(FrameOutput {
            image,
            depth_image,
            wait_semaphore,
        })
    }

    /// Wait for all GPU work to finish (teardown, resize)
    pub fn wait_idle(&self) -> Result<()> {
        self.backend.wait_idle()
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
