//! VulkanBackend - Vulkan implementation of the GpuBackend trait

use std::ffi::CString;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use pulsar_renderer::backend::reflection::{
    BindingType, ReflectedBinding, ReflectedPushConstant, ShaderReflection, ShaderStageFlags,
};
use pulsar_renderer::backend::types::{
    BufferDesc, BufferUsage, ComputeShaderDesc, DescriptorLifetime, DescriptorSlot,
    GraphicsShaderDesc, ImageDesc, ImageInfo, ImageUsage, IndexType, PipelineBarrierKind,
    Rect2D, SamplerDesc, TextureData, TextureDesc, TextureInfo, Viewport,
};
use pulsar_renderer::backend::{
    GpuBackend, GpuBuffer, GpuImage, GpuPipeline, GpuSampler, GpuSemaphore, GpuShader,
    GpuTexture, ResolvedAttachments, ResolvedDescriptor, ResolvedResource,
};
use pulsar_renderer::error::{Error, Result};
use pulsar_renderer::frame_resource::{FrameResource, FRAMES_IN_FLIGHT};
use pulsar_renderer::pipeline::state::GraphicsPipelineDesc;
use pulsar_renderer::renderer::RendererConfig;
use pulsar_renderer::{engine_bail, engine_bail_warn, engine_err, engine_error, engine_info};

use crate::conversion::*;
use crate::vulkan_context::GpuContext;
use crate::vulkan_pipeline::{
    as_vulkan_image, build_compute_pipeline, build_graphics_pipeline, VulkanPipeline,
};
use crate::vulkan_resources::{
    VulkanBuffer, VulkanImage, VulkanSampler, VulkanSemaphore, VulkanShader, VulkanTexture,
};

/// Hard fence timeout. Expiry is treated as a GPU hang and is fatal.
const FENCE_TIMEOUT_NS: u64 = 5_000_000_000;

/// Per-frame-in-flight command state
struct FrameCommands {
    pool: vk::CommandPool,
    buffer: vk::CommandBuffer,
    fence: vk::Fence,
    /// Pool for `DescriptorLifetime::PerFrame` sets, reset every frame tick
    descriptor_pool: vk::DescriptorPool,
}

/// State of the command buffer currently being replayed into
struct RecordState {
    command_buffer: vk::CommandBuffer,
    render_pass_open: bool,
}

/// Vulkan backend
///
/// Owns instance, device, queues, allocator, per-frame command state, and
/// descriptor pools. Swapchain/present mechanics stay external; the window
/// is only consulted during creation to pick a present-capable queue
/// family.
pub struct VulkanBackend {
    _entry: ash::Entry,
    instance: ash::Instance,
    physical_device: vk::PhysicalDevice,
    device: ash::Device,

    graphics_queue: vk::Queue,
    graphics_queue_family: u32,

    allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    frames: FrameResource<FrameCommands, FRAMES_IN_FLIGHT>,

    /// Pools for `DescriptorLifetime::Static` sets (grows when exhausted)
    static_descriptor_pools: Vec<vk::DescriptorPool>,

    /// Sampler used for combined-image-sampler bindings fed by a bare
    /// texture descriptor
    default_sampler: vk::Sampler,

    record: Option<RecordState>,

    /// Debug-utils device fns for command markers (validation builds)
    debug_utils_device: Option<ash::ext::debug_utils::Device>,

    #[cfg(feature = "vulkan-validation")]
    debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,

    /// Shared GPU context for all resources
    gpu_context: Arc<GpuContext>,
}

impl VulkanBackend {
    /// Create a new Vulkan backend
    ///
    /// # Arguments
    ///
    /// * `window` - Game window; used only to pick a present-capable queue
    /// * `config` - Renderer configuration
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(
        window: &W,
        config: &RendererConfig,
    ) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load().map_err(|e| {
                engine_error!("pulsar::vulkan", "Failed to load Vulkan library: {:?}", e);
                Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
            })?;

            let app_name = CString::new(config.app_name.as_str())
                .unwrap_or_else(|_| CString::new("Pulsar Application").unwrap());
            let (major, minor, patch) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"Pulsar")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let display_handle = window.display_handle().map_err(|e| {
                engine_error!("pulsar::vulkan", "Failed to get display handle: {}", e);
                Error::InitializationFailed(format!("Failed to get display handle: {}", e))
            })?;
            let mut extension_names =
                ash_window::enumerate_required_extensions(display_handle.as_raw())
                    .map_err(|e| {
                        engine_error!(
                            "pulsar::vulkan",
                            "Failed to get required extensions: {}",
                            e
                        );
                        Error::InitializationFailed(format!(
                            "Failed to get required extensions: {}",
                            e
                        ))
                    })?
                    .to_vec();

            let validation = Self::validation_enabled(config);
            if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            let layer_names = if validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry.create_instance(&create_info, None).map_err(|e| {
                engine_error!("pulsar::vulkan", "Failed to create Vulkan instance: {:?}", e);
                Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
            })?;

            #[cfg(feature = "vulkan-validation")]
            let debug_messenger = if validation {
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);
                let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(crate::debug::messenger_severity())
                    .message_type(crate::debug::messenger_types())
                    .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));
                let messenger = debug_utils
                    .create_debug_utils_messenger(&debug_info, None)
                    .map_err(|e| {
                        engine_error!(
                            "pulsar::vulkan",
                            "Failed to create debug messenger: {:?}",
                            e
                        );
                        Error::InitializationFailed(format!(
                            "Failed to create debug messenger: {:?}",
                            e
                        ))
                    })?;
                Some((debug_utils, messenger))
            } else {
                None
            };

            // Temporary surface for present-capable queue selection.
            // Presentation itself is owned externally.
            let window_handle = window.window_handle().map_err(|e| {
                engine_error!("pulsar::vulkan", "Failed to get window handle: {}", e);
                Error::InitializationFailed(format!("Failed to get window handle: {}", e))
            })?;
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| {
                engine_error!("pulsar::vulkan", "Failed to create surface: {:?}", e);
                Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
            })?;
            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            let physical_devices = instance.enumerate_physical_devices().map_err(|e| {
                engine_error!(
                    "pulsar::vulkan",
                    "Failed to enumerate physical devices: {:?}",
                    e
                );
                Error::InitializationFailed(format!(
                    "Failed to enumerate physical devices: {:?}",
                    e
                ))
            })?;
            let physical_device = physical_devices.into_iter().next().ok_or_else(|| {
                engine_error!("pulsar::vulkan", "No Vulkan-capable GPU found");
                Error::InitializationFailed("No Vulkan-capable GPU found".to_string())
            })?;

            // Prefer a graphics queue family that can also present
            let queue_families =
                instance.get_physical_device_queue_family_properties(physical_device);
            let graphics_family_index = queue_families
                .iter()
                .enumerate()
                .filter(|(_, qf)| {
                    qf.queue_flags
                        .contains(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)
                })
                .map(|(i, _)| i as u32)
                .find(|&i| {
                    surface_loader
                        .get_physical_device_surface_support(physical_device, i, surface)
                        .unwrap_or(false)
                })
                .or_else(|| {
                    queue_families
                        .iter()
                        .enumerate()
                        .find(|(_, qf)| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                        .map(|(i, _)| i as u32)
                })
                .ok_or_else(|| {
                    engine_error!("pulsar::vulkan", "No graphics queue family found");
                    Error::InitializationFailed("No graphics queue family found".to_string())
                })?;

            surface_loader.destroy_surface(surface, None);

            let queue_priorities = [1.0];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_family_index)
                .queue_priorities(&queue_priorities)];

            let device_extension_names = vec![ash::khr::swapchain::NAME.as_ptr()];

            let device_features = vk::PhysicalDeviceFeatures::default()
                .sampler_anisotropy(true)
                .multi_draw_indirect(true);

            let mut features12 = vk::PhysicalDeviceVulkan12Features::default()
                .draw_indirect_count(true);

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .enabled_features(&device_features)
                .push_next(&mut features12);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    engine_error!("pulsar::vulkan", "Failed to create logical device: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                })?;

            let graphics_queue = device.get_device_queue(graphics_family_index, 0);

            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| {
                engine_error!("pulsar::vulkan", "Failed to create GPU allocator: {:?}", e);
                Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
            })?;
            let allocator_arc = Arc::new(Mutex::new(allocator));

            let gpu_context = Arc::new(GpuContext::new(
                device.clone(),
                Arc::clone(&allocator_arc),
                graphics_queue,
                graphics_family_index,
            ));

            // Per-frame command state
            let mut frame_commands = Vec::with_capacity(FRAMES_IN_FLIGHT);
            for _ in 0..FRAMES_IN_FLIGHT {
                let pool_info = vk::CommandPoolCreateInfo::default()
                    .queue_family_index(graphics_family_index)
                    .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
                let pool = device.create_command_pool(&pool_info, None).map_err(|e| {
                    engine_error!("pulsar::vulkan", "Failed to create command pool: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create command pool: {:?}", e))
                })?;

                let alloc_info = vk::CommandBufferAllocateInfo::default()
                    .command_pool(pool)
                    .level(vk::CommandBufferLevel::PRIMARY)
                    .command_buffer_count(1);
                let buffers = device.allocate_command_buffers(&alloc_info).map_err(|e| {
                    engine_error!(
                        "pulsar::vulkan",
                        "Failed to allocate command buffer: {:?}",
                        e
                    );
                    Error::InitializationFailed(format!(
                        "Failed to allocate command buffer: {:?}",
                        e
                    ))
                })?;

                // Signaled so the first frame-start wait passes immediately
                let fence_info =
                    vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
                let fence = device.create_fence(&fence_info, None).map_err(|e| {
                    engine_error!("pulsar::vulkan", "Failed to create frame fence: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create fence: {:?}", e))
                })?;

                let descriptor_pool = Self::create_descriptor_pool(&device)?;

                frame_commands.push(FrameCommands {
                    pool,
                    buffer: buffers[0],
                    fence,
                    descriptor_pool,
                });
            }
            let mut frame_iter = frame_commands.into_iter();
            let frames = FrameResource::from_fn(|_| frame_iter.next().unwrap());

            let static_descriptor_pools = vec![Self::create_descriptor_pool(&device)?];

            // Default sampler for combined-image-sampler bindings
            let sampler_info = vk::SamplerCreateInfo::default()
                .mag_filter(vk::Filter::LINEAR)
                .min_filter(vk::Filter::LINEAR)
                .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
                .address_mode_u(vk::SamplerAddressMode::REPEAT)
                .address_mode_v(vk::SamplerAddressMode::REPEAT)
                .address_mode_w(vk::SamplerAddressMode::REPEAT)
                .max_lod(vk::LOD_CLAMP_NONE);
            let default_sampler = device.create_sampler(&sampler_info, None).map_err(|e| {
                engine_error!("pulsar::vulkan", "Failed to create default sampler: {:?}", e);
                Error::InitializationFailed(format!("Failed to create sampler: {:?}", e))
            })?;

            let debug_utils_device = if validation {
                Some(ash::ext::debug_utils::Device::new(&instance, &device))
            } else {
                None
            };

            engine_info!(
                "pulsar::vulkan",
                "Vulkan backend initialized (queue family {}, validation: {})",
                graphics_family_index,
                validation
            );

            Ok(Self {
                _entry: entry,
                instance,
                physical_device,
                device,
                graphics_queue,
                graphics_queue_family: graphics_family_index,
                allocator: ManuallyDrop::new(allocator_arc),
                frames,
                static_descriptor_pools,
                default_sampler,
                record: None,
                debug_utils_device,
                #[cfg(feature = "vulkan-validation")]
                debug_messenger,
                gpu_context,
            })
        }
    }

    #[cfg(feature = "vulkan-validation")]
    fn validation_enabled(config: &RendererConfig) -> bool {
        config.enable_validation
    }

    #[cfg(not(feature = "vulkan-validation"))]
    fn validation_enabled(_config: &RendererConfig) -> bool {
        false
    }

    /// Raw device, for the external presentation layer
    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    /// Raw instance, for the external presentation layer
    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    /// Raw physical device, for the external presentation layer
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Graphics queue and its family index
    pub fn graphics_queue(&self) -> (vk::Queue, u32) {
        (self.graphics_queue, self.graphics_queue_family)
    }

    /// Create a descriptor pool with fixed capacity.
    /// Called during init and when a static pool is exhausted.
    fn create_descriptor_pool(device: &ash::Device) -> Result<vk::DescriptorPool> {
        let pool_sizes = [
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: 2048,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::SAMPLED_IMAGE,
                descriptor_count: 1024,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::SAMPLER,
                descriptor_count: 256,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::STORAGE_IMAGE,
                descriptor_count: 1024,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: 1024,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::STORAGE_BUFFER,
                descriptor_count: 1024,
            },
        ];
        let info = vk::DescriptorPoolCreateInfo::default()
            .pool_sizes(&pool_sizes)
            .max_sets(1024);

        unsafe {
            device.create_descriptor_pool(&info, None).map_err(|e| {
                engine_error!("pulsar::vulkan", "Failed to create descriptor pool: {:?}", e);
                Error::InitializationFailed(format!("Failed to create descriptor pool: {:?}", e))
            })
        }
    }

    fn command_buffer(&self) -> Result<vk::CommandBuffer> {
        self.record
            .as_ref()
            .map(|r| r.command_buffer)
            .ok_or_else(|| {
                Error::InvalidOperation(
                    "command recorded outside begin_commands/submit_commands".to_string(),
                )
            })
    }

    /// SPIR-V reflection via spirq
    fn reflect_shader(code: &[u32], stage_flags: ShaderStageFlags) -> Result<ShaderReflection> {
        let entry_points = spirq::ReflectConfig::new()
            .spv(code)
            .ref_all_rscs(true)
            .reflect()
            .map_err(|e| engine_err!("pulsar::vulkan", "SPIR-V reflection failed: {:?}", e))?;

        let mut bindings = Vec::new();
        let mut push_constants = Vec::new();

        for entry_point in &entry_points {
            for var in entry_point.vars.iter() {
                match var {
                    spirq::var::Variable::Descriptor {
                        name,
                        desc_bind,
                        desc_ty,
                        nbind,
                        ..
                    } => {
                        let binding_type = Self::spirq_desc_type_to_binding_type(desc_ty.clone())?;
                        bindings.push(ReflectedBinding::new(
                            name.clone().unwrap_or_default(),
                            desc_bind.set(),
                            desc_bind.bind(),
                            binding_type,
                            (*nbind).max(1),
                            stage_flags,
                        ));
                    }
                    spirq::var::Variable::PushConstant { name, ty } => {
                        push_constants.push(ReflectedPushConstant {
                            name: name.clone().unwrap_or_default(),
                            stage_flags,
                            size: ty.nbyte().map(|s| s as u32),
                        });
                    }
                    _ => {}
                }
            }
        }

        Ok(ShaderReflection {
            bindings,
            push_constants,
        })
    }

    /// Convert spirq descriptor type to renderer BindingType
    fn spirq_desc_type_to_binding_type(desc_ty: spirq::ty::DescriptorType) -> Result<BindingType> {
        use spirq::ty::DescriptorType;
        match desc_ty {
            DescriptorType::UniformBuffer() => Ok(BindingType::UniformBuffer),
            DescriptorType::StorageBuffer(..) => Ok(BindingType::StorageBuffer),
            DescriptorType::CombinedImageSampler() => Ok(BindingType::CombinedImageSampler),
            DescriptorType::SampledImage() => Ok(BindingType::SampledImage),
            DescriptorType::StorageImage(..) => Ok(BindingType::StorageImage),
            DescriptorType::Sampler() => Ok(BindingType::Sampler),
            other => {
                engine_bail!(
                    "pulsar::vulkan",
                    "Unsupported SPIR-V descriptor type: {:?}",
                    other
                );
            }
        }
    }

    /// Load a SPIR-V file and create its module + reflection
    fn load_shader_module(
        &self,
        path: &str,
        stage_flags: ShaderStageFlags,
    ) -> Result<(vk::ShaderModule, ShaderReflection)> {
        let bytes = std::fs::read(path)
            .map_err(|e| engine_err!("pulsar::vulkan", "Failed to read shader '{}': {}", path, e))?;

        if bytes.len() % 4 != 0 {
            engine_bail_warn!(
                "pulsar::vulkan",
                "Shader '{}' not 4-byte aligned (size: {} bytes)",
                path,
                bytes.len()
            );
        }

        let code_u32: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code_u32);
        let module = unsafe {
            self.device
                .create_shader_module(&create_info, None)
                .map_err(|e| {
                    engine_err!(
                        "pulsar::vulkan",
                        "Failed to create shader module '{}': {:?}",
                        path,
                        e
                    )
                })?
        };

        let reflection = Self::reflect_shader(&code_u32, stage_flags)?;
        Ok((module, reflection))
    }

    /// One-shot command buffer submit + wait, for uploads
    unsafe fn submit_one_shot<F: FnOnce(vk::CommandBuffer)>(&self, record: F) -> Result<()> {
        let pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(self.graphics_queue_family)
            .flags(vk::CommandPoolCreateFlags::TRANSIENT);
        let pool = self
            .device
            .create_command_pool(&pool_info, None)
            .map_err(|e| engine_err!("pulsar::vulkan", "Failed to create upload pool: {:?}", e))?;

        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);
        let buffers = match self.device.allocate_command_buffers(&alloc_info) {
            Ok(buffers) => buffers,
            Err(e) => {
                self.device.destroy_command_pool(pool, None);
                return Err(engine_err!(
                    "pulsar::vulkan",
                    "Failed to allocate upload buffer: {:?}",
                    e
                ));
            }
        };
        let cb = buffers[0];

        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        self.device
            .begin_command_buffer(cb, &begin_info)
            .map_err(|e| engine_err!("pulsar::vulkan", "Failed to begin upload buffer: {:?}", e))?;

        record(cb);

        self.device
            .end_command_buffer(cb)
            .map_err(|e| engine_err!("pulsar::vulkan", "Failed to end upload buffer: {:?}", e))?;

        let command_buffers = [cb];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
        self.device
            .queue_submit(self.graphics_queue, &[submit_info], vk::Fence::null())
            .map_err(|e| engine_err!("pulsar::vulkan", "Failed to submit upload: {:?}", e))?;
        self.device
            .queue_wait_idle(self.graphics_queue)
            .map_err(|e| engine_err!("pulsar::vulkan", "Failed to wait for upload: {:?}", e))?;

        self.device.destroy_command_pool(pool, None);
        Ok(())
    }

    fn buffer_usage_to_vk(usage: BufferUsage) -> vk::BufferUsageFlags {
        let mut flags = vk::BufferUsageFlags::empty();
        if usage.contains(BufferUsage::VERTEX) {
            flags |= vk::BufferUsageFlags::VERTEX_BUFFER;
        }
        if usage.contains(BufferUsage::INDEX) {
            flags |= vk::BufferUsageFlags::INDEX_BUFFER;
        }
        if usage.contains(BufferUsage::UNIFORM) {
            flags |= vk::BufferUsageFlags::UNIFORM_BUFFER;
        }
        if usage.contains(BufferUsage::STORAGE) {
            flags |= vk::BufferUsageFlags::STORAGE_BUFFER;
        }
        if usage.contains(BufferUsage::INDIRECT) {
            flags |= vk::BufferUsageFlags::INDIRECT_BUFFER;
        }
        if usage.contains(BufferUsage::TRANSFER_SRC) {
            flags |= vk::BufferUsageFlags::TRANSFER_SRC;
        }
        if usage.contains(BufferUsage::TRANSFER_DST) {
            flags |= vk::BufferUsageFlags::TRANSFER_DST;
        }
        flags
    }

    fn image_usage_to_vk(usage: ImageUsage) -> vk::ImageUsageFlags {
        let mut flags = vk::ImageUsageFlags::empty();
        if usage.contains(ImageUsage::RENDER_TARGET) {
            flags |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
        }
        if usage.contains(ImageUsage::DEPTH_STENCIL) {
            flags |= vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT;
        }
        if usage.contains(ImageUsage::SAMPLED) {
            flags |= vk::ImageUsageFlags::SAMPLED;
        }
        if usage.contains(ImageUsage::STORAGE) {
            flags |= vk::ImageUsageFlags::STORAGE;
        }
        if usage.contains(ImageUsage::TRANSFER_SRC) {
            flags |= vk::ImageUsageFlags::TRANSFER_SRC;
        }
        if usage.contains(ImageUsage::TRANSFER_DST) {
            flags |= vk::ImageUsageFlags::TRANSFER_DST;
        }
        flags
    }

    fn as_vulkan_buffer<'a>(buffer: &'a dyn GpuBuffer) -> Result<&'a VulkanBuffer> {
        buffer
            .as_any()
            .downcast_ref::<VulkanBuffer>()
            .ok_or_else(|| {
                engine_err!("pulsar::vulkan", "foreign buffer object passed to Vulkan backend")
            })
    }

    fn as_vulkan_pipeline<'a>(pipeline: &'a dyn GpuPipeline) -> Result<&'a VulkanPipeline> {
        pipeline
            .as_any()
            .downcast_ref::<VulkanPipeline>()
            .ok_or_else(|| {
                engine_err!("pulsar::vulkan", "foreign pipeline object passed to Vulkan backend")
            })
    }

    fn as_vulkan_shader<'a>(shader: &'a dyn GpuShader) -> Result<&'a VulkanShader> {
        shader
            .as_any()
            .downcast_ref::<VulkanShader>()
            .ok_or_else(|| {
                engine_err!("pulsar::vulkan", "foreign shader object passed to Vulkan backend")
            })
    }
}

impl GpuBackend for VulkanBackend {
    fn begin_frame(&mut self, frame_index: usize) -> Result<()> {
        let frame = self.frames.get(frame_index);
        unsafe {
            // The sole blocking point: wait until the GPU finished the
            // submission that last used this frame slot
            self.device
                .wait_for_fences(&[frame.fence], true, FENCE_TIMEOUT_NS)
                .map_err(|e| match e {
                    vk::Result::TIMEOUT => engine_err!(
                        "pulsar::vulkan",
                        "frame fence timeout after {} ms - treating as GPU hang",
                        FENCE_TIMEOUT_NS / 1_000_000
                    ),
                    other => engine_err!(
                        "pulsar::vulkan",
                        "failed to wait for frame fence: {:?}",
                        other
                    ),
                })?;

            // Recycle this slot's per-frame descriptor sets
            self.device
                .reset_descriptor_pool(
                    frame.descriptor_pool,
                    vk::DescriptorPoolResetFlags::empty(),
                )
                .map_err(|e| {
                    engine_err!("pulsar::vulkan", "failed to reset descriptor pool: {:?}", e)
                })?;
        }
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.device
                .device_wait_idle()
                .map_err(|e| engine_err!("pulsar::vulkan", "Failed to wait idle: {:?}", e))
        }
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Box<dyn GpuBuffer>> {
        unsafe {
            let usage = Self::buffer_usage_to_vk(desc.usage) | vk::BufferUsageFlags::TRANSFER_DST;

            let buffer_create_info = vk::BufferCreateInfo::default()
                .size(desc.size)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = self
                .device
                .create_buffer(&buffer_create_info, None)
                .map_err(|e| {
                    engine_err!(
                        "pulsar::vulkan",
                        "Failed to create buffer of size {} bytes: {:?}",
                        desc.size,
                        e
                    )
                })?;

            let requirements = self.device.get_buffer_memory_requirements(buffer);

            let allocation = self
                .allocator
                .lock()
                .unwrap()
                .allocate(&gpu_allocator::vulkan::AllocationCreateDesc {
                    name: "buffer",
                    requirements,
                    location: gpu_allocator::MemoryLocation::CpuToGpu,
                    linear: true,
                    allocation_scheme: gpu_allocator::vulkan::AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_e| {
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!(
                        "pulsar::vulkan",
                        "Out of GPU memory for buffer (required: {:.2} MB)",
                        size_mb
                    );
                    Error::OutOfMemory
                })?;

            self.device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
                .map_err(|e| {
                    engine_err!("pulsar::vulkan", "Failed to bind buffer memory: {:?}", e)
                })?;

            Ok(Box::new(VulkanBuffer::new(
                Arc::clone(&self.gpu_context),
                buffer,
                allocation,
                desc.size,
            )))
        }
    }

    fn create_image(&mut self, desc: &ImageDesc) -> Result<Box<dyn GpuImage>> {
        unsafe {
            let format = pixel_format_to_vk(desc.format);
            let aspect_mask = if desc.format.is_depth() {
                vk::ImageAspectFlags::DEPTH
            } else {
                vk::ImageAspectFlags::COLOR
            };

            let image_create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(format)
                .extent(vk::Extent3D {
                    width: desc.width,
                    height: desc.height,
                    depth: 1,
                })
                .mip_levels(1)
                .array_layers(1)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(Self::image_usage_to_vk(desc.usage))
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = self
                .device
                .create_image(&image_create_info, None)
                .map_err(|e| engine_err!("pulsar::vulkan", "Failed to create image: {:?}", e))?;

            let requirements = self.device.get_image_memory_requirements(image);
            let allocation = self
                .allocator
                .lock()
                .unwrap()
                .allocate(&gpu_allocator::vulkan::AllocationCreateDesc {
                    name: "image",
                    requirements,
                    location: gpu_allocator::MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: gpu_allocator::vulkan::AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_e| {
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!(
                        "pulsar::vulkan",
                        "Out of GPU memory for image (size: {}x{}, {:.2} MB)",
                        desc.width,
                        desc.height,
                        size_mb
                    );
                    Error::OutOfMemory
                })?;

            self.device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
                .map_err(|e| {
                    engine_err!("pulsar::vulkan", "Failed to bind image memory: {:?}", e)
                })?;

            let view_create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            let view = self
                .device
                .create_image_view(&view_create_info, None)
                .map_err(|e| {
                    engine_err!("pulsar::vulkan", "Failed to create image view: {:?}", e)
                })?;

            Ok(Box::new(VulkanImage::new(
                Arc::clone(&self.gpu_context),
                image,
                view,
                allocation,
                ImageInfo {
                    width: desc.width,
                    height: desc.height,
                    format: desc.format,
                    usage: desc.usage,
                },
            )))
        }
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<Box<dyn GpuTexture>> {
        unsafe {
            let format = pixel_format_to_vk(desc.format);
            let array_layers = desc.array_layers.max(1);
            let mip_levels = desc.mip_levels.max(1);

            let view_type = if array_layers > 1 {
                vk::ImageViewType::TYPE_2D_ARRAY
            } else {
                vk::ImageViewType::TYPE_2D
            };

            let image_create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(format)
                .extent(vk::Extent3D {
                    width: desc.width,
                    height: desc.height,
                    depth: 1,
                })
                .mip_levels(mip_levels)
                .array_layers(array_layers)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = self
                .device
                .create_image(&image_create_info, None)
                .map_err(|e| {
                    engine_err!("pulsar::vulkan", "Failed to create texture image: {:?}", e)
                })?;

            let requirements = self.device.get_image_memory_requirements(image);
            let allocation = self
                .allocator
                .lock()
                .unwrap()
                .allocate(&gpu_allocator::vulkan::AllocationCreateDesc {
                    name: "texture",
                    requirements,
                    location: gpu_allocator::MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: gpu_allocator::vulkan::AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_e| {
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!(
                        "pulsar::vulkan",
                        "Out of GPU memory for texture (size: {}x{}, layers: {}, {:.2} MB)",
                        desc.width,
                        desc.height,
                        array_layers,
                        size_mb
                    );
                    Error::OutOfMemory
                })?;

            self.device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
                .map_err(|e| {
                    engine_err!("pulsar::vulkan", "Failed to bind texture memory: {:?}", e)
                })?;

            let view_create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(view_type)
                .format(format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: mip_levels,
                    base_array_layer: 0,
                    layer_count: array_layers,
                });

            let view = self
                .device
                .create_image_view(&view_create_info, None)
                .map_err(|e| {
                    engine_err!("pulsar::vulkan", "Failed to create texture view: {:?}", e)
                })?;

            // Collect upload items: (layer index, pixel bytes)
            let upload_items: Vec<(u32, &[u8])> = match &desc.data {
                Some(TextureData::Single(data)) => vec![(0, data.as_slice())],
                Some(TextureData::Layers(layers)) => {
                    for layer_data in layers {
                        if layer_data.layer >= array_layers {
                            engine_bail!(
                                "pulsar::vulkan",
                                "Layer index {} exceeds array_layers {}",
                                layer_data.layer,
                                array_layers
                            );
                        }
                    }
                    layers.iter().map(|ld| (ld.layer, ld.data.as_slice())).collect()
                }
                None => vec![],
            };

            // Stage and upload level 0 of each provided layer, then move
            // the whole image to SHADER_READ_ONLY
            let mut staging: Vec<(vk::Buffer, gpu_allocator::vulkan::Allocation)> = Vec::new();
            for (layer_index, data) in &upload_items {
                let staging_info = vk::BufferCreateInfo::default()
                    .size(data.len() as u64)
                    .usage(vk::BufferUsageFlags::TRANSFER_SRC)
                    .sharing_mode(vk::SharingMode::EXCLUSIVE);
                let staging_buffer = self
                    .device
                    .create_buffer(&staging_info, None)
                    .map_err(|e| {
                        engine_err!(
                            "pulsar::vulkan",
                            "Failed to create staging buffer for layer {}: {:?}",
                            layer_index,
                            e
                        )
                    })?;
                let staging_requirements =
                    self.device.get_buffer_memory_requirements(staging_buffer);
                let staging_allocation = self
                    .allocator
                    .lock()
                    .unwrap()
                    .allocate(&gpu_allocator::vulkan::AllocationCreateDesc {
                        name: "texture_staging_buffer",
                        requirements: staging_requirements,
                        location: gpu_allocator::MemoryLocation::CpuToGpu,
                        linear: true,
                        allocation_scheme:
                            gpu_allocator::vulkan::AllocationScheme::GpuAllocatorManaged,
                    })
                    .map_err(|_e| {
                        engine_error!(
                            "pulsar::vulkan",
                            "Out of GPU memory for texture staging buffer layer {}",
                            layer_index
                        );
                        Error::OutOfMemory
                    })?;
                self.device
                    .bind_buffer_memory(
                        staging_buffer,
                        staging_allocation.memory(),
                        staging_allocation.offset(),
                    )
                    .map_err(|e| {
                        engine_err!(
                            "pulsar::vulkan",
                            "Failed to bind staging memory for layer {}: {:?}",
                            layer_index,
                            e
                        )
                    })?;

                let mapped_ptr = staging_allocation
                    .mapped_ptr()
                    .ok_or_else(|| {
                        engine_err!(
                            "pulsar::vulkan",
                            "Staging buffer is not mapped for layer {}",
                            layer_index
                        )
                    })?
                    .as_ptr() as *mut u8;
                std::ptr::copy_nonoverlapping(data.as_ptr(), mapped_ptr, data.len());

                staging.push((staging_buffer, staging_allocation));
            }

            self.submit_one_shot(|cb| unsafe {
                let barrier_to_transfer = vk::ImageMemoryBarrier::default()
                    .old_layout(vk::ImageLayout::UNDEFINED)
                    .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                    .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .image(image)
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        base_mip_level: 0,
                        level_count: mip_levels,
                        base_array_layer: 0,
                        layer_count: array_layers,
                    })
                    .src_access_mask(vk::AccessFlags::empty())
                    .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE);
                self.device.cmd_pipeline_barrier(
                    cb,
                    vk::PipelineStageFlags::TOP_OF_PIPE,
                    vk::PipelineStageFlags::TRANSFER,
                    vk::DependencyFlags::empty(),
                    &[],
                    &[],
                    &[barrier_to_transfer],
                );

                for ((layer_index, _), (staging_buffer, _)) in
                    upload_items.iter().zip(staging.iter())
                {
                    let region = vk::BufferImageCopy::default()
                        .buffer_offset(0)
                        .buffer_row_length(0)
                        .buffer_image_height(0)
                        .image_subresource(vk::ImageSubresourceLayers {
                            aspect_mask: vk::ImageAspectFlags::COLOR,
                            mip_level: 0,
                            base_array_layer: *layer_index,
                            layer_count: 1,
                        })
                        .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
                        .image_extent(vk::Extent3D {
                            width: desc.width,
                            height: desc.height,
                            depth: 1,
                        });
                    self.device.cmd_copy_buffer_to_image(
                        cb,
                        *staging_buffer,
                        image,
                        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                        &[region],
                    );
                }

                let barrier_to_shader = vk::ImageMemoryBarrier::default()
                    .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                    .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                    .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .image(image)
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        base_mip_level: 0,
                        level_count: mip_levels,
                        base_array_layer: 0,
                        layer_count: array_layers,
                    })
                    .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                    .dst_access_mask(vk::AccessFlags::SHADER_READ);
                self.device.cmd_pipeline_barrier(
                    cb,
                    vk::PipelineStageFlags::TRANSFER,
                    vk::PipelineStageFlags::FRAGMENT_SHADER
                        | vk::PipelineStageFlags::COMPUTE_SHADER,
                    vk::DependencyFlags::empty(),
                    &[],
                    &[],
                    &[barrier_to_shader],
                );
            })?;

            for (staging_buffer, staging_allocation) in staging {
                self.device.destroy_buffer(staging_buffer, None);
                self.allocator.lock().unwrap().free(staging_allocation).ok();
            }

            Ok(Box::new(VulkanTexture::new(
                Arc::clone(&self.gpu_context),
                image,
                view,
                allocation,
                TextureInfo {
                    width: desc.width,
                    height: desc.height,
                    format: desc.format,
                    array_layers,
                    mip_levels,
                },
            )))
        }
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<Box<dyn GpuSampler>> {
        unsafe {
            let address_mode = address_mode_to_vk(desc.address_mode);
            let mut info = vk::SamplerCreateInfo::default()
                .mag_filter(filter_to_vk(desc.mag_filter))
                .min_filter(filter_to_vk(desc.min_filter))
                .mipmap_mode(mipmap_filter_to_vk(desc.mipmap_filter))
                .address_mode_u(address_mode)
                .address_mode_v(address_mode)
                .address_mode_w(address_mode)
                .border_color(border_color_to_vk(desc.border))
                .max_lod(vk::LOD_CLAMP_NONE);

            if let Some(anisotropy) = desc.anisotropy {
                info = info.anisotropy_enable(true).max_anisotropy(anisotropy);
            }
            if let Some(compare) = desc.compare {
                info = info
                    .compare_enable(true)
                    .compare_op(compare_op_to_vk(compare));
            }

            let sampler = self
                .device
                .create_sampler(&info, None)
                .map_err(|e| engine_err!("pulsar::vulkan", "Failed to create sampler: {:?}", e))?;

            Ok(Box::new(VulkanSampler::new(
                Arc::clone(&self.gpu_context),
                sampler,
            )))
        }
    }

    fn create_graphics_shader(
        &mut self,
        desc: &GraphicsShaderDesc,
    ) -> Result<Box<dyn GpuShader>> {
        let (vs_module, vs_reflection) =
            self.load_shader_module(&desc.vertex_path, ShaderStageFlags::VERTEX)?;
        let (fs_module, fs_reflection) =
            self.load_shader_module(&desc.fragment_path, ShaderStageFlags::FRAGMENT)?;

        let reflection = ShaderReflection::merge(&vs_reflection, &fs_reflection)?;

        Ok(Box::new(VulkanShader::new(
            Arc::clone(&self.gpu_context),
            vec![
                (vs_module, vk::ShaderStageFlags::VERTEX),
                (fs_module, vk::ShaderStageFlags::FRAGMENT),
            ],
            reflection,
        )))
    }

    fn create_compute_shader(&mut self, desc: &ComputeShaderDesc) -> Result<Box<dyn GpuShader>> {
        let (module, reflection) =
            self.load_shader_module(&desc.path, ShaderStageFlags::COMPUTE)?;

        Ok(Box::new(VulkanShader::new(
            Arc::clone(&self.gpu_context),
            vec![(module, vk::ShaderStageFlags::COMPUTE)],
            reflection,
        )))
    }

    fn create_graphics_pipeline(
        &mut self,
        desc: &GraphicsPipelineDesc,
        attachments: &ResolvedAttachments<'_>,
        shader: &dyn GpuShader,
    ) -> Result<Box<dyn GpuPipeline>> {
        let vk_shader = Self::as_vulkan_shader(shader)?;
        let pipeline = build_graphics_pipeline(&self.gpu_context, desc, attachments, vk_shader)?;
        Ok(Box::new(pipeline))
    }

    fn create_compute_pipeline(&mut self, shader: &dyn GpuShader) -> Result<Box<dyn GpuPipeline>> {
        let vk_shader = Self::as_vulkan_shader(shader)?;
        let pipeline = build_compute_pipeline(&self.gpu_context, vk_shader)?;
        Ok(Box::new(pipeline))
    }

    fn create_semaphore(&mut self) -> Result<Box<dyn GpuSemaphore>> {
        unsafe {
            let semaphore = self
                .device
                .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                .map_err(|e| {
                    engine_err!("pulsar::vulkan", "Failed to create semaphore: {:?}", e)
                })?;
            Ok(Box::new(VulkanSemaphore::new(
                Arc::clone(&self.gpu_context),
                semaphore,
            )))
        }
    }

    fn begin_commands(&mut self, frame_index: usize) -> Result<()> {
        if self.record.is_some() {
            engine_bail!(
                "pulsar::vulkan",
                "begin_commands while a command buffer is already recording"
            );
        }
        let frame = self.frames.get(frame_index);
        unsafe {
            self.device
                .reset_command_buffer(frame.buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| {
                    engine_err!("pulsar::vulkan", "Failed to reset command buffer: {:?}", e)
                })?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            self.device
                .begin_command_buffer(frame.buffer, &begin_info)
                .map_err(|e| {
                    engine_err!("pulsar::vulkan", "Failed to begin command buffer: {:?}", e)
                })?;
        }
        self.record = Some(RecordState {
            command_buffer: frame.buffer,
            render_pass_open: false,
        });
        Ok(())
    }

    fn submit_commands(
        &mut self,
        frame_index: usize,
        signal: Option<&dyn GpuSemaphore>,
    ) -> Result<()> {
        let record = self.record.take().ok_or_else(|| {
            Error::InvalidOperation("submit_commands without begin_commands".to_string())
        })?;
        if record.render_pass_open {
            engine_bail!(
                "pulsar::vulkan",
                "submit_commands with an open render pass"
            );
        }

        let frame = self.frames.get(frame_index);
        unsafe {
            self.device.end_command_buffer(record.command_buffer).map_err(|e| {
                engine_err!("pulsar::vulkan", "Failed to end command buffer: {:?}", e)
            })?;

            self.device.reset_fences(&[frame.fence]).map_err(|e| {
                engine_err!("pulsar::vulkan", "Failed to reset frame fence: {:?}", e)
            })?;

            let command_buffers = [record.command_buffer];
            let mut submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

            let signal_semaphores;
            if let Some(semaphore) = signal {
                let vk_semaphore = semaphore
                    .as_any()
                    .downcast_ref::<VulkanSemaphore>()
                    .ok_or_else(|| {
                        engine_err!(
                            "pulsar::vulkan",
                            "foreign semaphore object passed to Vulkan backend"
                        )
                    })?;
                signal_semaphores = [vk_semaphore.semaphore];
                submit_info = submit_info.signal_semaphores(&signal_semaphores);
            }

            self.device
                .queue_submit(self.graphics_queue, &[submit_info], frame.fence)
                .map_err(|e| {
                    engine_err!("pulsar::vulkan", "Failed to submit commands: {:?}", e)
                })?;
        }
        Ok(())
    }

    fn cmd_push_marker(&mut self, label: &str) {
        if let (Some(debug_utils), Some(record)) = (&self.debug_utils_device, &self.record) {
            if let Ok(name) = CString::new(label) {
                let label_info = vk::DebugUtilsLabelEXT::default().label_name(&name);
                unsafe {
                    debug_utils.cmd_begin_debug_utils_label(record.command_buffer, &label_info);
                }
            }
        }
    }

    fn cmd_pop_marker(&mut self) {
        if let (Some(debug_utils), Some(record)) = (&self.debug_utils_device, &self.record) {
            unsafe {
                debug_utils.cmd_end_debug_utils_label(record.command_buffer);
            }
        }
    }

    fn cmd_begin_pipeline(
        &mut self,
        pipeline: &dyn GpuPipeline,
        attachments: Option<&ResolvedAttachments<'_>>,
    ) -> Result<()> {
        let cb = self.command_buffer()?;
        let vk_pipeline = Self::as_vulkan_pipeline(pipeline)?;

        unsafe {
            if attachments.is_some() && vk_pipeline.bind_point == vk::PipelineBindPoint::GRAPHICS {
                // The pipeline owns its render pass and framebuffer, built
                // from the description's concrete target identities
                let render_pass_info = vk::RenderPassBeginInfo::default()
                    .render_pass(vk_pipeline.render_pass)
                    .framebuffer(vk_pipeline.framebuffer)
                    .render_area(vk::Rect2D {
                        offset: vk::Offset2D { x: 0, y: 0 },
                        extent: vk_pipeline.extent,
                    })
                    .clear_values(&vk_pipeline.clear_values);
                self.device.cmd_begin_render_pass(
                    cb,
                    &render_pass_info,
                    vk::SubpassContents::INLINE,
                );

                let viewport = vk::Viewport::default()
                    .width(vk_pipeline.extent.width as f32)
                    .height(vk_pipeline.extent.height as f32)
                    .min_depth(0.0)
                    .max_depth(1.0);
                self.device.cmd_set_viewport(cb, 0, &[viewport]);
                let scissor = vk::Rect2D {
                    offset: vk::Offset2D { x: 0, y: 0 },
                    extent: vk_pipeline.extent,
                };
                self.device.cmd_set_scissor(cb, 0, &[scissor]);

                if let Some(record) = &mut self.record {
                    record.render_pass_open = true;
                }
            }

            self.device
                .cmd_bind_pipeline(cb, vk_pipeline.bind_point, vk_pipeline.pipeline);
        }
        Ok(())
    }

    fn cmd_end_pipeline(&mut self) -> Result<()> {
        let cb = self.command_buffer()?;
        if let Some(record) = &mut self.record {
            if record.render_pass_open {
                unsafe {
                    self.device.cmd_end_render_pass(cb);
                }
                record.render_pass_open = false;
            }
        }
        Ok(())
    }

    fn cmd_bind_descriptor_set(
        &mut self,
        pipeline: &dyn GpuPipeline,
        slot: DescriptorSlot,
        bindings: &[ResolvedDescriptor<'_>],
        lifetime: DescriptorLifetime,
        frame_index: usize,
    ) -> Result<()> {
        if bindings.is_empty() {
            return Ok(());
        }

        let cb = self.command_buffer()?;
        let vk_pipeline = Self::as_vulkan_pipeline(pipeline)?;
        let set_index = slot.index();
        if set_index as usize >= vk_pipeline.set_layouts.len() {
            engine_bail!(
                "pulsar::vulkan",
                "descriptor slot {:?} out of range (pipeline has {} set layouts)",
                slot,
                vk_pipeline.set_layouts.len()
            );
        }
        let ds_layout = vk_pipeline.set_layouts[set_index as usize];
        let layouts = [ds_layout];

        // Allocate from the lifetime's pool. Static pools grow when
        // exhausted; the per-frame pool is reset every frame tick.
        let descriptor_set = unsafe {
            match lifetime {
                DescriptorLifetime::Static => {
                    let current_pool = *self.static_descriptor_pools.last().unwrap();
                    let allocate_info = vk::DescriptorSetAllocateInfo::default()
                        .descriptor_pool(current_pool)
                        .set_layouts(&layouts);
                    match self.device.allocate_descriptor_sets(&allocate_info) {
                        Ok(sets) => sets[0],
                        Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY) => {
                            let new_pool = Self::create_descriptor_pool(&self.device)?;
                            self.static_descriptor_pools.push(new_pool);
                            engine_info!(
                                "pulsar::vulkan",
                                "Static descriptor pool exhausted, created new pool (total: {})",
                                self.static_descriptor_pools.len()
                            );
                            let retry_info = vk::DescriptorSetAllocateInfo::default()
                                .descriptor_pool(new_pool)
                                .set_layouts(&layouts);
                            self.device
                                .allocate_descriptor_sets(&retry_info)
                                .map_err(|e| {
                                    engine_err!(
                                        "pulsar::vulkan",
                                        "Failed to allocate descriptor set after pool growth: {:?}",
                                        e
                                    )
                                })?[0]
                        }
                        Err(e) => {
                            return Err(engine_err!(
                                "pulsar::vulkan",
                                "Failed to allocate descriptor set: {:?}",
                                e
                            ))
                        }
                    }
                }
                DescriptorLifetime::PerFrame => {
                    let pool = self.frames.get(frame_index).descriptor_pool;
                    let allocate_info = vk::DescriptorSetAllocateInfo::default()
                        .descriptor_pool(pool)
                        .set_layouts(&layouts);
                    self.device
                        .allocate_descriptor_sets(&allocate_info)
                        .map_err(|e| {
                            engine_err!(
                                "pulsar::vulkan",
                                "Failed to allocate per-frame descriptor set: {:?}",
                                e
                            )
                        })?[0]
                }
            }
        };

        // Two passes: collect infos first so their addresses are stable,
        // then build the writes referencing them
        let mut buffer_infos: Vec<vk::DescriptorBufferInfo> = Vec::new();
        let mut image_infos: Vec<vk::DescriptorImageInfo> = Vec::new();

        for binding in bindings {
            match &binding.resource {
                ResolvedResource::Buffer(buffer) => {
                    let vk_buffer = Self::as_vulkan_buffer(*buffer)?;
                    buffer_infos.push(
                        vk::DescriptorBufferInfo::default()
                            .buffer(vk_buffer.buffer)
                            .offset(0)
                            .range(vk::WHOLE_SIZE),
                    );
                }
                ResolvedResource::Texture(texture) | ResolvedResource::TextureArray(texture) => {
                    let vk_texture = texture
                        .as_any()
                        .downcast_ref::<VulkanTexture>()
                        .ok_or_else(|| {
                            engine_err!(
                                "pulsar::vulkan",
                                "foreign texture object passed to Vulkan backend"
                            )
                        })?;
                    image_infos.push(
                        vk::DescriptorImageInfo::default()
                            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                            .image_view(vk_texture.view)
                            .sampler(self.default_sampler),
                    );
                }
                ResolvedResource::Image(image) => {
                    let vk_image = as_vulkan_image(*image)?;
                    image_infos.push(
                        vk::DescriptorImageInfo::default()
                            .image_layout(vk::ImageLayout::GENERAL)
                            .image_view(vk_image.view),
                    );
                }
                ResolvedResource::Sampler(sampler) => {
                    let vk_sampler = sampler
                        .as_any()
                        .downcast_ref::<VulkanSampler>()
                        .ok_or_else(|| {
                            engine_err!(
                                "pulsar::vulkan",
                                "foreign sampler object passed to Vulkan backend"
                            )
                        })?;
                    image_infos.push(
                        vk::DescriptorImageInfo::default().sampler(vk_sampler.sampler),
                    );
                }
            }
        }

        let mut writes: Vec<vk::WriteDescriptorSet> = Vec::new();
        let mut buffer_idx = 0usize;
        let mut image_idx = 0usize;
        for binding in bindings {
            let write = vk::WriteDescriptorSet::default()
                .dst_set(descriptor_set)
                .dst_binding(binding.binding)
                .dst_array_element(0)
                .descriptor_type(binding_type_to_vk(binding.binding_type));
            match &binding.resource {
                ResolvedResource::Buffer(_) => {
                    writes.push(write.buffer_info(std::slice::from_ref(&buffer_infos[buffer_idx])));
                    buffer_idx += 1;
                }
                _ => {
                    writes.push(write.image_info(std::slice::from_ref(&image_infos[image_idx])));
                    image_idx += 1;
                }
            }
        }

        unsafe {
            self.device.update_descriptor_sets(&writes, &[]);
            self.device.cmd_bind_descriptor_sets(
                cb,
                vk_pipeline.bind_point,
                vk_pipeline.layout,
                set_index,
                &[descriptor_set],
                &[],
            );
        }
        Ok(())
    }

    fn cmd_bind_vertex_buffer(&mut self, buffer: &dyn GpuBuffer, offset: u64) -> Result<()> {
        let cb = self.command_buffer()?;
        let vk_buffer = Self::as_vulkan_buffer(buffer)?;
        unsafe {
            self.device
                .cmd_bind_vertex_buffers(cb, 0, &[vk_buffer.buffer], &[offset]);
        }
        Ok(())
    }

    fn cmd_bind_index_buffer(
        &mut self,
        buffer: &dyn GpuBuffer,
        offset: u64,
        index_type: IndexType,
    ) -> Result<()> {
        let cb = self.command_buffer()?;
        let vk_buffer = Self::as_vulkan_buffer(buffer)?;
        unsafe {
            self.device.cmd_bind_index_buffer(
                cb,
                vk_buffer.buffer,
                offset,
                index_type_to_vk(index_type),
            );
        }
        Ok(())
    }

    fn cmd_push_constants(
        &mut self,
        pipeline: &dyn GpuPipeline,
        offset: u32,
        data: &[u8],
    ) -> Result<()> {
        let cb = self.command_buffer()?;
        let vk_pipeline = Self::as_vulkan_pipeline(pipeline)?;
        if vk_pipeline.push_constant_stages.is_empty() {
            engine_bail!(
                "pulsar::vulkan",
                "push constants recorded for a pipeline without a reflected push constant block"
            );
        }
        unsafe {
            self.device.cmd_push_constants(
                cb,
                vk_pipeline.layout,
                vk_pipeline.push_constant_stages,
                offset,
                data,
            );
        }
        Ok(())
    }

    fn cmd_set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        let cb = self.command_buffer()?;
        unsafe {
            let vk_viewport = vk::Viewport::default()
                .x(viewport.x)
                .y(viewport.y)
                .width(viewport.width)
                .height(viewport.height)
                .min_depth(viewport.min_depth)
                .max_depth(viewport.max_depth);
            self.device.cmd_set_viewport(cb, 0, &[vk_viewport]);
        }
        Ok(())
    }

    fn cmd_set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        let cb = self.command_buffer()?;
        unsafe {
            let vk_scissor = vk::Rect2D {
                offset: vk::Offset2D {
                    x: scissor.x,
                    y: scissor.y,
                },
                extent: vk::Extent2D {
                    width: scissor.width,
                    height: scissor.height,
                },
            };
            self.device.cmd_set_scissor(cb, 0, &[vk_scissor]);
        }
        Ok(())
    }

    fn cmd_draw(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) -> Result<()> {
        let cb = self.command_buffer()?;
        unsafe {
            self.device
                .cmd_draw(cb, vertex_count, instance_count, first_vertex, first_instance);
        }
        Ok(())
    }

    fn cmd_draw_bindless(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) -> Result<()> {
        // No vertex input to bind; the shader pulls vertex data itself
        let cb = self.command_buffer()?;
        unsafe {
            self.device
                .cmd_draw(cb, vertex_count, instance_count, first_vertex, first_instance);
        }
        Ok(())
    }

    fn cmd_draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<()> {
        let cb = self.command_buffer()?;
        unsafe {
            self.device.cmd_draw_indexed(
                cb,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            );
        }
        Ok(())
    }

    fn cmd_draw_indirect(
        &mut self,
        buffer: &dyn GpuBuffer,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) -> Result<()> {
        let cb = self.command_buffer()?;
        let vk_buffer = Self::as_vulkan_buffer(buffer)?;
        unsafe {
            self.device
                .cmd_draw_indirect(cb, vk_buffer.buffer, offset, draw_count, stride);
        }
        Ok(())
    }

    fn cmd_draw_indirect_count(
        &mut self,
        buffer: &dyn GpuBuffer,
        offset: u64,
        count_buffer: &dyn GpuBuffer,
        count_offset: u64,
        max_draw_count: u32,
        stride: u32,
    ) -> Result<()> {
        let cb = self.command_buffer()?;
        let vk_buffer = Self::as_vulkan_buffer(buffer)?;
        let vk_count_buffer = Self::as_vulkan_buffer(count_buffer)?;
        unsafe {
            self.device.cmd_draw_indirect_count(
                cb,
                vk_buffer.buffer,
                offset,
                vk_count_buffer.buffer,
                count_offset,
                max_draw_count,
                stride,
            );
        }
        Ok(())
    }

    fn cmd_dispatch(&mut self, group_count: [u32; 3]) -> Result<()> {
        let cb = self.command_buffer()?;
        unsafe {
            self.device
                .cmd_dispatch(cb, group_count[0], group_count[1], group_count[2]);
        }
        Ok(())
    }

    fn cmd_dispatch_indirect(&mut self, buffer: &dyn GpuBuffer, offset: u64) -> Result<()> {
        let cb = self.command_buffer()?;
        let vk_buffer = Self::as_vulkan_buffer(buffer)?;
        unsafe {
            self.device
                .cmd_dispatch_indirect(cb, vk_buffer.buffer, offset);
        }
        Ok(())
    }

    fn cmd_copy_buffer(
        &mut self,
        src: &dyn GpuBuffer,
        dst: &dyn GpuBuffer,
        src_offset: u64,
        dst_offset: u64,
        size: u64,
    ) -> Result<()> {
        let cb = self.command_buffer()?;
        let vk_src = Self::as_vulkan_buffer(src)?;
        let vk_dst = Self::as_vulkan_buffer(dst)?;
        unsafe {
            let region = vk::BufferCopy {
                src_offset,
                dst_offset,
                size,
            };
            self.device
                .cmd_copy_buffer(cb, vk_src.buffer, vk_dst.buffer, &[region]);
        }
        Ok(())
    }

    fn cmd_pipeline_barrier(
        &mut self,
        barrier: PipelineBarrierKind,
        buffer: &dyn GpuBuffer,
    ) -> Result<()> {
        let cb = self.command_buffer()?;
        let vk_buffer = Self::as_vulkan_buffer(buffer)?;
        let scopes = barrier.scopes();
        unsafe {
            let buffer_barrier = vk::BufferMemoryBarrier::default()
                .src_access_mask(access_flags_to_vk(scopes.src_access))
                .dst_access_mask(access_flags_to_vk(scopes.dst_access))
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .buffer(vk_buffer.buffer)
                .offset(0)
                .size(vk::WHOLE_SIZE);
            self.device.cmd_pipeline_barrier(
                cb,
                stage_flags_to_vk(scopes.src_stages),
                stage_flags_to_vk(scopes.dst_stages),
                vk::DependencyFlags::empty(),
                &[],
                &[buffer_barrier],
                &[],
            );
        }
        Ok(())
    }
}

impl Drop for VulkanBackend {
    fn drop(&mut self) {
        unsafe {
            // Wait for the device to finish before tearing anything down
            self.device.device_wait_idle().ok();

            for frame in self.frames.iter() {
                self.device.destroy_fence(frame.fence, None);
                self.device.destroy_descriptor_pool(frame.descriptor_pool, None);
                self.device.destroy_command_pool(frame.pool, None);
            }
            for &pool in &self.static_descriptor_pools {
                self.device.destroy_descriptor_pool(pool, None);
            }
            self.device.destroy_sampler(self.default_sampler, None);

            // Free allocator pages BEFORE destroying the device: drop the
            // backend's Arc, then the GpuContext's ManuallyDrop Arc once it
            // is the sole owner
            ManuallyDrop::drop(&mut self.allocator);
            if let Some(ctx) = Arc::get_mut(&mut self.gpu_context) {
                ManuallyDrop::drop(&mut ctx.allocator);
            }

            #[cfg(feature = "vulkan-validation")]
            if let Some((debug_utils, messenger)) = &self.debug_messenger {
                debug_utils.destroy_debug_utils_messenger(*messenger, None);
            }

            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}
