//! Backend-agnostic vocabulary
//!
//! Closed enumerations and plain-data description structs shared by every
//! backend: pixel formats, usage flags, barrier intents, descriptor slots,
//! and the create/load descriptors accepted from asset/config code.

use bitflags::bitflags;

use crate::pipeline::state::CompareOp;

// ============================================================================
// Formats
// ============================================================================

/// Pixel format for images and textures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum PixelFormat {
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    B8G8R8A8_SRGB,
    B8G8R8A8_UNORM,
    R16G16B16A16_SFLOAT,
    R32_UINT,
    R32_SFLOAT,
    D16_UNORM,
    D32_FLOAT,
    D24_UNORM_S8_UINT,
    D32_FLOAT_S8_UINT,
}

impl PixelFormat {
    /// Whether this is a depth or depth/stencil format
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            PixelFormat::D16_UNORM
                | PixelFormat::D32_FLOAT
                | PixelFormat::D24_UNORM_S8_UINT
                | PixelFormat::D32_FLOAT_S8_UINT
        )
    }

    /// Whether this format carries a stencil aspect
    pub fn has_stencil(&self) -> bool {
        matches!(
            self,
            PixelFormat::D24_UNORM_S8_UINT | PixelFormat::D32_FLOAT_S8_UINT
        )
    }
}

/// Vertex attribute format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum VertexFormat {
    R32_SFLOAT,
    R32G32_SFLOAT,
    R32G32B32_SFLOAT,
    R32G32B32A32_SFLOAT,
    R32_UINT,
    R32G32B32A32_UINT,
    R8G8B8A8_UNORM,
}

// ============================================================================
// Usage flags
// ============================================================================

bitflags! {
    /// Buffer usage flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const VERTEX       = 1 << 0;
        const INDEX        = 1 << 1;
        const UNIFORM      = 1 << 2;
        const STORAGE      = 1 << 3;
        const INDIRECT     = 1 << 4;
        const TRANSFER_SRC = 1 << 5;
        const TRANSFER_DST = 1 << 6;
    }
}

bitflags! {
    /// Image usage flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageUsage: u32 {
        const RENDER_TARGET = 1 << 0;
        const DEPTH_STENCIL = 1 << 1;
        const SAMPLED       = 1 << 2;
        const STORAGE       = 1 << 3;
        const TRANSFER_SRC  = 1 << 4;
        const TRANSFER_DST  = 1 << 5;
    }
}

// ============================================================================
// Index buffers
// ============================================================================

/// Index buffer element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    /// 16-bit indices (max 65535 vertices)
    U16,
    /// 32-bit indices (max ~4 billion vertices)
    U32,
}

impl IndexType {
    /// Size in bytes of one index element
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

// ============================================================================
// Render graph usage declarations
// ============================================================================

/// Attachment load behavior when a pass starts writing a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadMode {
    /// Clear to the declared clear value
    Clear,
    /// Preserve existing contents
    Load,
    /// Contents undefined; cheapest when fully overwritten
    DontCare,
}

/// Pipeline stage at which a pass reads a declared resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadStage {
    VertexShader,
    PixelShader,
    ComputeShader,
    Transfer,
    IndirectArgs,
}

/// How a pass writes a declared resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteMode {
    RenderTarget,
    DepthStencil,
    Storage,
    Transfer,
}

// ============================================================================
// Descriptor slots
// ============================================================================

/// The 3-tier descriptor set convention consumed by every shader
///
/// Set 0 holds frame-global data, set 1 per-pass data, set 2 per-draw data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorSlot {
    Global,
    PerPass,
    PerDraw,
}

impl DescriptorSlot {
    /// Concrete descriptor set index for this slot
    pub fn index(&self) -> u32 {
        match self {
            DescriptorSlot::Global => 0,
            DescriptorSlot::PerPass => 1,
            DescriptorSlot::PerDraw => 2,
        }
    }
}

/// Lifetime of a built backend descriptor object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorLifetime {
    /// Lives for the process lifetime
    Static,
    /// Recycled every `FRAMES_IN_FLIGHT` frames
    PerFrame,
}

// ============================================================================
// Pipeline barriers
// ============================================================================

bitflags! {
    /// Pipeline stage mask, backend-agnostic
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StageFlags: u32 {
        const TOP_OF_PIPE     = 1 << 0;
        const DRAW_INDIRECT   = 1 << 1;
        const VERTEX_INPUT    = 1 << 2;
        const VERTEX_SHADER   = 1 << 3;
        const FRAGMENT_SHADER = 1 << 4;
        const COMPUTE_SHADER  = 1 << 5;
        const TRANSFER        = 1 << 6;
        const BOTTOM_OF_PIPE  = 1 << 7;
    }
}

bitflags! {
    /// Memory access mask, backend-agnostic
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        const INDIRECT_COMMAND_READ = 1 << 0;
        const INDEX_READ            = 1 << 1;
        const VERTEX_ATTRIBUTE_READ = 1 << 2;
        const SHADER_READ           = 1 << 3;
        const SHADER_WRITE          = 1 << 4;
        const TRANSFER_READ         = 1 << 5;
        const TRANSFER_WRITE        = 1 << 6;
    }
}

/// Source/destination synchronization scopes of a barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierScopes {
    pub src_stages: StageFlags,
    pub dst_stages: StageFlags,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
}

/// Closed set of buffer barrier intents
///
/// Call sites pick the intent; the concrete stage/access tuples below keep
/// them backend-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineBarrierKind {
    /// Compute shader writes consumed by a later compute dispatch
    ComputeWriteToComputeRead,
    /// Compute shader writes consumed as indirect draw/dispatch arguments
    ComputeWriteToIndirectRead,
    /// Compute shader writes consumed by a vertex shader
    ComputeWriteToVertexRead,
    /// Compute shader writes consumed by a fragment shader
    ComputeWriteToPixelRead,
    /// Compute shader writes consumed by a transfer (copy/readback)
    ComputeWriteToTransferRead,
    /// Transfer writes consumed by a compute dispatch
    TransferWriteToComputeRead,
    /// Transfer writes consumed as vertex/index input
    TransferWriteToVertexInput,
}

impl PipelineBarrierKind {
    /// The predefined stage/access tuple for this intent
    pub fn scopes(&self) -> BarrierScopes {
        match self {
            PipelineBarrierKind::ComputeWriteToComputeRead => BarrierScopes {
                src_stages: StageFlags::COMPUTE_SHADER,
                dst_stages: StageFlags::COMPUTE_SHADER,
                src_access: AccessFlags::SHADER_WRITE,
                dst_access: AccessFlags::SHADER_READ,
            },
            PipelineBarrierKind::ComputeWriteToIndirectRead => BarrierScopes {
                src_stages: StageFlags::COMPUTE_SHADER,
                dst_stages: StageFlags::DRAW_INDIRECT,
                src_access: AccessFlags::SHADER_WRITE,
                dst_access: AccessFlags::INDIRECT_COMMAND_READ,
            },
            PipelineBarrierKind::ComputeWriteToVertexRead => BarrierScopes {
                src_stages: StageFlags::COMPUTE_SHADER,
                dst_stages: StageFlags::VERTEX_SHADER,
                src_access: AccessFlags::SHADER_WRITE,
                dst_access: AccessFlags::SHADER_READ,
            },
            PipelineBarrierKind::ComputeWriteToPixelRead => BarrierScopes {
                src_stages: StageFlags::COMPUTE_SHADER,
                dst_stages: StageFlags::FRAGMENT_SHADER,
                src_access: AccessFlags::SHADER_WRITE,
                dst_access: AccessFlags::SHADER_READ,
            },
            PipelineBarrierKind::ComputeWriteToTransferRead => BarrierScopes {
                src_stages: StageFlags::COMPUTE_SHADER,
                dst_stages: StageFlags::TRANSFER,
                src_access: AccessFlags::SHADER_WRITE,
                dst_access: AccessFlags::TRANSFER_READ,
            },
            PipelineBarrierKind::TransferWriteToComputeRead => BarrierScopes {
                src_stages: StageFlags::TRANSFER,
                dst_stages: StageFlags::COMPUTE_SHADER,
                src_access: AccessFlags::TRANSFER_WRITE,
                dst_access: AccessFlags::SHADER_READ,
            },
            PipelineBarrierKind::TransferWriteToVertexInput => BarrierScopes {
                src_stages: StageFlags::TRANSFER,
                dst_stages: StageFlags::VERTEX_INPUT,
                src_access: AccessFlags::TRANSFER_WRITE,
                dst_access: AccessFlags::VERTEX_ATTRIBUTE_READ
                    | AccessFlags::INDEX_READ,
            },
        }
    }
}

// ============================================================================
// Viewport / clear values
// ============================================================================

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

/// 2D rectangle
#[derive(Debug, Clone, Copy)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Clear value for an attachment
#[derive(Debug, Clone, Copy)]
pub enum ClearValue {
    /// Color clear value (RGBA)
    Color([f32; 4]),
    /// Depth/stencil clear value
    DepthStencil { depth: f32, stencil: u32 },
}

// ============================================================================
// Resource descriptors
// ============================================================================

/// Descriptor for creating a buffer
#[derive(Debug, Clone)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: u64,
    /// Buffer usage flags
    pub usage: BufferUsage,
}

/// Descriptor for creating a render-target / storage image
#[derive(Debug, Clone)]
pub struct ImageDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: PixelFormat,
    /// Usage flags
    pub usage: ImageUsage,
}

/// Read-only properties of a created image
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub usage: ImageUsage,
}

// ===== TEXTURE DATA =====

/// Data for a single layer of a texture array
#[derive(Debug, Clone)]
pub struct TextureLayerData {
    /// Target layer index (0-based)
    pub layer: u32,
    /// Raw pixel bytes for this layer
    pub data: Vec<u8>,
}

/// Data to upload to a texture at creation time
#[derive(Debug, Clone)]
pub enum TextureData {
    /// Single image data (for simple textures, or layer 0 of an array)
    Single(Vec<u8>),

    /// Per-layer data for array textures.
    /// Only the layers listed are uploaded; others remain uninitialized.
    Layers(Vec<TextureLayerData>),
}

/// Descriptor for creating a sampled texture
#[derive(Debug, Clone)]
pub struct TextureDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: PixelFormat,
    /// Number of array layers (1 = simple 2D texture, >1 = texture array)
    pub array_layers: u32,
    /// Number of mip levels (1 = no mipmaps)
    pub mip_levels: u32,
    /// Optional initial data to upload at creation time
    pub data: Option<TextureData>,
}

/// Read-only properties of a created texture
#[derive(Debug, Clone)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub array_layers: u32,
    pub mip_levels: u32,
}

impl TextureInfo {
    /// Returns true if this texture is a texture array (array_layers > 1)
    pub fn is_array(&self) -> bool {
        self.array_layers > 1
    }
}

// ===== SAMPLERS =====

/// Texture filtering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// Texture addressing mode outside [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

/// Border color for `AddressMode::ClampToBorder`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BorderColor {
    OpaqueBlack,
    OpaqueWhite,
    TransparentBlack,
}

/// Descriptor for creating a sampler
#[derive(Debug, Clone)]
pub struct SamplerDesc {
    pub mag_filter: FilterMode,
    pub min_filter: FilterMode,
    pub mipmap_filter: FilterMode,
    pub address_mode: AddressMode,
    /// Max anisotropy (None = disabled)
    pub anisotropy: Option<f32>,
    /// Comparison sampler for shadow sampling (None = regular sampling)
    pub compare: Option<CompareOp>,
    pub border: BorderColor,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: FilterMode::Linear,
            address_mode: AddressMode::Repeat,
            anisotropy: None,
            compare: None,
            border: BorderColor::OpaqueBlack,
        }
    }
}

// ===== SHADERS =====

/// Descriptor for loading a graphics shader program
///
/// Paths point at compiled SPIR-V bytecode; they are opaque to this core and
/// handed to the backend as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphicsShaderDesc {
    pub vertex_path: String,
    pub fragment_path: String,
}

/// Descriptor for loading a compute shader program
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComputeShaderDesc {
    pub path: String,
}

// ===== MODELS =====

/// Standard interleaved model vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: glam::Vec3,
    pub normal: glam::Vec3,
    pub uv: glam::Vec2,
}

/// Descriptor for creating a model (vertex + index buffer pair)
#[derive(Debug, Clone)]
pub struct ModelDesc {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

/// Output of a finished frame, handed to the externally-owned present
/// surface
#[derive(Debug, Clone, Copy)]
pub struct FrameOutput {
    /// Finished color image
    pub image: crate::handle::ImageId,
    /// Optional depth image rendered alongside
    pub depth_image: Option<crate::handle::DepthImageId>,
    /// Semaphore the presenter must wait on before consuming the image
    pub wait_semaphore: Option<crate::handle::GpuSemaphoreId>,
}

/// Indirect draw arguments layout (matches the GPU-side struct)
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawIndirectArgs {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
}

/// Indirect dispatch arguments layout (matches the GPU-side struct)
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DispatchIndirectArgs {
    pub group_count_x: u32,
    pub group_count_y: u32,
    pub group_count_z: u32,
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
