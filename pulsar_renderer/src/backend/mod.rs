//! Backend seam
//!
//! `GpuBackend` is the single trait every GPU API implements. The renderer
//! core records backend-agnostic commands and owns all bookkeeping
//! (handlers, caches, lifetimes); the backend turns descriptions into GPU
//! objects and replayed commands into real API calls.
//!
//! Every command kind maps to exactly one `cmd_*` method, so
//! `Command::dispatch` is a total match with no untyped payloads anywhere.

pub mod null;
pub mod reflection;
pub mod types;

use std::any::Any;

use crate::backend::reflection::{BindingType, ShaderReflection};
use crate::backend::types::{
    BufferDesc, ComputeShaderDesc, DescriptorLifetime, DescriptorSlot, GraphicsShaderDesc,
    ImageDesc, ImageInfo, IndexType, LoadMode, PipelineBarrierKind, Rect2D, SamplerDesc,
    TextureDesc, TextureInfo, Viewport,
};
use crate::error::Result;

// ============================================================================
// Backend object traits
// ============================================================================

/// GPU buffer object
pub trait GpuBuffer: Send + Sync {
    /// Size in bytes
    fn size(&self) -> u64;

    /// Update buffer contents
    ///
    /// # Arguments
    ///
    /// * `offset` - Offset into the buffer in bytes
    /// * `data` - Data to write
    fn update(&self, offset: u64, data: &[u8]) -> Result<()>;

    /// Downcast support for backend implementations
    fn as_any(&self) -> &dyn Any;
}

/// GPU render-target / storage image object
pub trait GpuImage: Send + Sync {
    /// Read-only properties of this image
    fn info(&self) -> &ImageInfo;

    fn as_any(&self) -> &dyn Any;
}

/// GPU sampled texture object
pub trait GpuTexture: Send + Sync {
    /// Read-only properties of this texture
    fn info(&self) -> &TextureInfo;

    fn as_any(&self) -> &dyn Any;
}

/// GPU sampler object
pub trait GpuSampler: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// GPU shader program object (graphics or compute)
pub trait GpuShader: Send + Sync {
    /// Reflection data parsed from the shader bytecode, merged across
    /// stages for graphics programs
    fn reflection(&self) -> &ShaderReflection;

    fn as_any(&self) -> &dyn Any;
}

/// GPU pipeline object (graphics or compute)
pub trait GpuPipeline: Send + Sync {
    /// Reflection data of the program this pipeline was built from
    fn reflection(&self) -> &ShaderReflection;

    fn as_any(&self) -> &dyn Any;
}

/// GPU semaphore object
pub trait GpuSemaphore: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

// ============================================================================
// Resolved views passed across the seam
// ============================================================================

/// A color attachment resolved to its backend object
pub struct ResolvedColorAttachment<'a> {
    pub image: &'a dyn GpuImage,
    pub load: LoadMode,
    pub clear_color: [f32; 4],
}

/// A depth attachment resolved to its backend object
pub struct ResolvedDepthAttachment<'a> {
    pub image: &'a dyn GpuImage,
    pub load: LoadMode,
    pub clear_depth: f32,
    pub clear_stencil: u32,
}

/// Render-target set resolved for pipeline creation / pipeline begin
pub struct ResolvedAttachments<'a> {
    pub colors: Vec<ResolvedColorAttachment<'a>>,
    pub depth: Option<ResolvedDepthAttachment<'a>>,
}

impl ResolvedAttachments<'_> {
    /// Dimensions of the render area (taken from the first attachment)
    pub fn extent(&self) -> (u32, u32) {
        if let Some(color) = self.colors.first() {
            let info = color.image.info();
            return (info.width, info.height);
        }
        if let Some(depth) = &self.depth {
            let info = depth.image.info();
            return (info.width, info.height);
        }
        (0, 0)
    }
}

/// A descriptor resolved against reflection and the resource handlers
pub enum ResolvedResource<'a> {
    Sampler(&'a dyn GpuSampler),
    Texture(&'a dyn GpuTexture),
    TextureArray(&'a dyn GpuTexture),
    Image(&'a dyn GpuImage),
    Buffer(&'a dyn GpuBuffer),
}

/// One binding of a descriptor set after name resolution
pub struct ResolvedDescriptor<'a> {
    /// Binding index within the set
    pub binding: u32,
    /// Resource type the shader expects here
    pub binding_type: BindingType,
    /// Descriptor count (>1 for arrays)
    pub count: u32,
    /// The concrete backend object
    pub resource: ResolvedResource<'a>,
}

// ============================================================================
// Backend trait
// ============================================================================

/// The GPU API seam
///
/// One implementation per backend (Vulkan, testing/null, ...). Resource
/// factories return boxed objects owned by the core's handlers; `cmd_*`
/// methods are only called between `begin_commands` and `submit_commands`,
/// in replay order.
pub trait GpuBackend: Send + Sync {
    // ===== Frame lifecycle =====

    /// Block until the GPU finished the submission that last used this
    /// frame slot. The sole blocking point of a frame; implementations
    /// enforce a hard multi-second timeout and treat expiry as fatal
    /// (GPU hang).
    fn begin_frame(&mut self, frame_index: usize) -> Result<()>;

    /// Wait for all GPU work to complete (teardown, resize)
    fn wait_idle(&self) -> Result<()>;

    // ===== Resource factories =====

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Box<dyn GpuBuffer>>;

    fn create_image(&mut self, desc: &ImageDesc) -> Result<Box<dyn GpuImage>>;

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<Box<dyn GpuTexture>>;

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<Box<dyn GpuSampler>>;

    /// Load and reflect a graphics shader program (vertex + fragment)
    fn create_graphics_shader(&mut self, desc: &GraphicsShaderDesc)
        -> Result<Box<dyn GpuShader>>;

    /// Load and reflect a compute shader program
    fn create_compute_shader(&mut self, desc: &ComputeShaderDesc) -> Result<Box<dyn GpuShader>>;

    /// Build a graphics pipeline from fixed-function state, a shader
    /// program, and the resolved render-target set
    fn create_graphics_pipeline(
        &mut self,
        desc: &crate::pipeline::state::GraphicsPipelineDesc,
        attachments: &ResolvedAttachments<'_>,
        shader: &dyn GpuShader,
    ) -> Result<Box<dyn GpuPipeline>>;

    /// Build a compute pipeline from a shader program
    fn create_compute_pipeline(&mut self, shader: &dyn GpuShader) -> Result<Box<dyn GpuPipeline>>;

    fn create_semaphore(&mut self) -> Result<Box<dyn GpuSemaphore>>;

    // ===== Command replay =====

    /// Open the frame's command buffer for replay
    fn begin_commands(&mut self, frame_index: usize) -> Result<()>;

    /// Close the frame's command buffer and submit it, optionally
    /// signalling a semaphore for the external present surface
    fn submit_commands(
        &mut self,
        frame_index: usize,
        signal: Option<&dyn GpuSemaphore>,
    ) -> Result<()>;

    fn cmd_push_marker(&mut self, label: &str);

    fn cmd_pop_marker(&mut self);

    /// Begin a pipeline scope. Graphics pipelines carry their resolved
    /// render targets; compute pipelines pass `None`.
    fn cmd_begin_pipeline(
        &mut self,
        pipeline: &dyn GpuPipeline,
        attachments: Option<&ResolvedAttachments<'_>>,
    ) -> Result<()>;

    fn cmd_end_pipeline(&mut self) -> Result<()>;

    /// Bind a resolved descriptor set at the given slot
    fn cmd_bind_descriptor_set(
        &mut self,
        pipeline: &dyn GpuPipeline,
        slot: DescriptorSlot,
        bindings: &[ResolvedDescriptor<'_>],
        lifetime: DescriptorLifetime,
        frame_index: usize,
    ) -> Result<()>;

    fn cmd_bind_vertex_buffer(&mut self, buffer: &dyn GpuBuffer, offset: u64) -> Result<()>;

    fn cmd_bind_index_buffer(
        &mut self,
        buffer: &dyn GpuBuffer,
        offset: u64,
        index_type: IndexType,
    ) -> Result<()>;

    fn cmd_push_constants(
        &mut self,
        pipeline: &dyn GpuPipeline,
        offset: u32,
        data: &[u8],
    ) -> Result<()>;

    fn cmd_set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    fn cmd_set_scissor(&mut self, scissor: Rect2D) -> Result<()>;

    fn cmd_draw(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) -> Result<()>;

    /// Draw without vertex input; the shader fetches vertex data itself
    fn cmd_draw_bindless(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) -> Result<()>;

    fn cmd_draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<()>;

    fn cmd_draw_indirect(
        &mut self,
        buffer: &dyn GpuBuffer,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) -> Result<()>;

    fn cmd_draw_indirect_count(
        &mut self,
        buffer: &dyn GpuBuffer,
        offset: u64,
        count_buffer: &dyn GpuBuffer,
        count_offset: u64,
        max_draw_count: u32,
        stride: u32,
    ) -> Result<()>;

    fn cmd_dispatch(&mut self, group_count: [u32; 3]) -> Result<()>;

    fn cmd_dispatch_indirect(&mut self, buffer: &dyn GpuBuffer, offset: u64) -> Result<()>;

    fn cmd_copy_buffer(
        &mut self,
        src: &dyn GpuBuffer,
        dst: &dyn GpuBuffer,
        src_offset: u64,
        dst_offset: u64,
        size: u64,
    ) -> Result<()>;

    fn cmd_pipeline_barrier(
        &mut self,
        barrier: PipelineBarrierKind,
        buffer: &dyn GpuBuffer,
    ) -> Result<()>;
}
