//! Typed resource IDs
//!
//! Every GPU-facing object is addressed through an opaque, copyable ID
//! scoped to its owning handler. IDs are generational slot-map keys:
//! index + generation, so a destroyed-and-recycled slot invalidates all
//! previously handed-out IDs for it and stale lookups fail instead of
//! aliasing a new object.
//!
//! The null key doubles as the "unset/invalid" sentinel; `Default` yields
//! it, so description structs can leave ID fields unbound.

use slotmap::{new_key_type, Key};

new_key_type! {
    /// GPU buffer (vertex/index/uniform/storage/indirect)
    pub struct BufferId;

    /// Color render-target / storage image
    pub struct ImageId;

    /// Depth/stencil image
    pub struct DepthImageId;

    /// Sampled 2D texture
    pub struct TextureId;

    /// Sampled 2D texture array
    pub struct TextureArrayId;

    /// Texture sampler
    pub struct SamplerId;

    /// Model (vertex + index buffer pair)
    pub struct ModelId;

    /// Graphics shader program (vertex + fragment stages)
    pub struct GraphicsShaderId;

    /// Compute shader program
    pub struct ComputeShaderId;

    /// Graphics pipeline object
    pub struct GraphicsPipelineId;

    /// Compute pipeline object
    pub struct ComputePipelineId;

    /// GPU semaphore (cross-queue / present synchronization)
    pub struct GpuSemaphoreId;

    /// Pooled command list
    pub struct CommandListId;
}

/// Common helpers shared by every resource ID kind
pub trait ResourceId: Key {
    /// The reserved "unset/invalid" sentinel for this ID kind
    fn invalid() -> Self {
        Self::null()
    }

    /// Whether this ID refers to an allocated slot (it may still be stale)
    fn is_valid(&self) -> bool {
        !self.is_null()
    }

    /// Stable 64-bit representation, used for content hashing
    fn raw(&self) -> u64 {
        self.data().as_ffi()
    }
}

impl<T: Key> ResourceId for T {}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
