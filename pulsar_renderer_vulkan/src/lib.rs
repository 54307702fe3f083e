/*!
# Pulsar Renderer - Vulkan Backend

Vulkan implementation of the `pulsar_renderer` backend seam.

Built on the Ash bindings with gpu-allocator for memory management and
spirq for SPIR-V reflection. The backend owns instance/device/queue setup,
per-frame command buffers and fences, and descriptor pools; swapchain and
presentation mechanics stay with the embedding application, which can reach
the raw handles through [`VulkanBackend::device`] and friends.

```no_run
use pulsar_renderer::pulsar::{Renderer, RendererConfig};
use pulsar_renderer_vulkan::VulkanBackend;

# fn run(window: &winit::window::Window) -> pulsar_renderer::error::Result<()> {
let config = RendererConfig::default();
let backend = VulkanBackend::new(window, &config)?;
let mut renderer = Renderer::new(Box::new(backend), config);
renderer.begin_frame()?;
# Ok(())
# }
```
*/

mod conversion;
mod vulkan;
mod vulkan_context;
mod vulkan_pipeline;
mod vulkan_resources;

#[cfg(feature = "vulkan-validation")]
mod debug;

pub use vulkan::VulkanBackend;
pub use vulkan_pipeline::VulkanPipeline;
pub use vulkan_resources::{
    VulkanBuffer, VulkanImage, VulkanSampler, VulkanSemaphore, VulkanShader, VulkanTexture,
};
