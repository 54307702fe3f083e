//! Vulkan resource objects
//!
//! Backend objects returned through the `GpuBackend` factory methods.
//! Every object shares the `GpuContext` and destroys its Vulkan handles on
//! drop; ownership and ID bookkeeping live in the core's handlers.

use std::any::Any;
use std::sync::Arc;

use ash::vk;
use gpu_allocator::vulkan::Allocation;

use pulsar_renderer::backend::reflection::ShaderReflection;
use pulsar_renderer::backend::types::{ImageInfo, TextureInfo};
use pulsar_renderer::backend::{
    GpuBuffer, GpuImage, GpuSampler, GpuSemaphore, GpuShader, GpuTexture,
};
use pulsar_renderer::engine_error;
use pulsar_renderer::error::{Error, Result};

use crate::vulkan_context::GpuContext;

// ============================================================================
// Buffer
// ============================================================================

pub struct VulkanBuffer {
    ctx: Arc<GpuContext>,
    pub(crate) buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: u64,
}

impl VulkanBuffer {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        buffer: vk::Buffer,
        allocation: Allocation,
        size: u64,
    ) -> Self {
        Self {
            ctx,
            buffer,
            allocation: Some(allocation),
            size,
        }
    }
}

impl GpuBuffer for VulkanBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        unsafe {
            if let Some(allocation) = &self.allocation {
                let mapped_ptr = allocation
                    .mapped_ptr()
                    .ok_or_else(|| {
                        Error::BackendError("Buffer is not CPU-accessible".to_string())
                    })?
                    .as_ptr() as *mut u8;

                std::ptr::copy_nonoverlapping(
                    data.as_ptr(),
                    mapped_ptr.offset(offset as isize),
                    data.len(),
                );
                Ok(())
            } else {
                engine_error!("pulsar::vulkan", "Buffer update failed: no GPU allocation");
                Err(Error::BackendError("Buffer has no allocation".to_string()))
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanBuffer {
    fn drop(&mut self) {
        unsafe {
            if let Some(allocation) = self.allocation.take() {
                // Don't panic if the lock fails; the buffer must still die
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}

// ============================================================================
// Image
// ============================================================================

pub struct VulkanImage {
    ctx: Arc<GpuContext>,
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    allocation: Option<Allocation>,
    info: ImageInfo,
}

impl VulkanImage {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        image: vk::Image,
        view: vk::ImageView,
        allocation: Allocation,
        info: ImageInfo,
    ) -> Self {
        Self {
            ctx,
            image,
            view,
            allocation: Some(allocation),
            info,
        }
    }

    /// Raw image view, for external presentation layers
    pub fn image_view(&self) -> vk::ImageView {
        self.view
    }

    /// Raw image, for external presentation layers
    pub fn image(&self) -> vk::Image {
        self.image
    }
}

impl GpuImage for VulkanImage {
    fn info(&self) -> &ImageInfo {
        &self.info
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanImage {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_image_view(self.view, None);
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_image(self.image, None);
        }
    }
}

// ============================================================================
// Texture
// ============================================================================

pub struct VulkanTexture {
    ctx: Arc<GpuContext>,
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    allocation: Option<Allocation>,
    info: TextureInfo,
}

impl VulkanTexture {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        image: vk::Image,
        view: vk::ImageView,
        allocation: Allocation,
        info: TextureInfo,
    ) -> Self {
        Self {
            ctx,
            image,
            view,
            allocation: Some(allocation),
            info,
        }
    }
}

impl GpuTexture for VulkanTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanTexture {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_image_view(self.view, None);
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_image(self.image, None);
        }
    }
}

// ============================================================================
// Sampler
// ============================================================================

pub struct VulkanSampler {
    ctx: Arc<GpuContext>,
    pub(crate) sampler: vk::Sampler,
}

impl VulkanSampler {
    pub(crate) fn new(ctx: Arc<GpuContext>, sampler: vk::Sampler) -> Self {
        Self { ctx, sampler }
    }
}

impl GpuSampler for VulkanSampler {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanSampler {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_sampler(self.sampler, None);
        }
    }
}

// ============================================================================
// Shader
// ============================================================================

pub struct VulkanShader {
    ctx: Arc<GpuContext>,
    /// Shader modules with their stage, in pipeline-stage order
    pub(crate) modules: Vec<(vk::ShaderModule, vk::ShaderStageFlags)>,
    reflection: ShaderReflection,
}

impl VulkanShader {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        modules: Vec<(vk::ShaderModule, vk::ShaderStageFlags)>,
        reflection: ShaderReflection,
    ) -> Self {
        Self {
            ctx,
            modules,
            reflection,
        }
    }
}

impl GpuShader for VulkanShader {
    fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanShader {
    fn drop(&mut self) {
        unsafe {
            for (module, _) in self.modules.drain(..) {
                self.ctx.device.destroy_shader_module(module, None);
            }
        }
    }
}

// ============================================================================
// Semaphore
// ============================================================================

pub struct VulkanSemaphore {
    ctx: Arc<GpuContext>,
    pub(crate) semaphore: vk::Semaphore,
}

impl VulkanSemaphore {
    pub(crate) fn new(ctx: Arc<GpuContext>, semaphore: vk::Semaphore) -> Self {
        Self { ctx, semaphore }
    }

    /// Raw semaphore, for external presentation layers
    pub fn semaphore(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl GpuSemaphore for VulkanSemaphore {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanSemaphore {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_semaphore(self.semaphore, None);
        }
    }
}
