//! GpuContext - Shared GPU resources for all Vulkan objects
//!
//! Contains everything resource objects need for cleanup and uploads:
//! - Device for Vulkan API calls
//! - Allocator for memory management
//! - Queue for one-shot upload submission

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

/// Shared GPU context for all Vulkan resources.
///
/// Shared (via `Arc`) by every resource object (buffers, images, pipelines)
/// so device/allocator/queue references are not duplicated per resource.
///
/// Note: device and instance destruction is handled by
/// `VulkanBackend::drop()` to keep the teardown order explicit.
pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator (shared, requires mutex for thread safety).
    /// Wrapped in ManuallyDrop so it can be dropped BEFORE the device.
    pub allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    /// Graphics queue for upload submission
    pub graphics_queue: vk::Queue,

    /// Graphics queue family index
    pub graphics_queue_family: u32,
}

impl GpuContext {
    pub fn new(
        device: ash::Device,
        allocator: Arc<Mutex<Allocator>>,
        graphics_queue: vk::Queue,
        graphics_queue_family: u32,
    ) -> Self {
        Self {
            device,
            allocator: ManuallyDrop::new(allocator),
            graphics_queue,
            graphics_queue_family,
        }
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        // Device destruction is handled by VulkanBackend::drop(); nothing
        // to do here.
    }
}
