//! Vulkan pipeline objects
//!
//! A graphics pipeline owns everything derived from its description at
//! cache-miss time: the VkRenderPass and VkFramebuffer built from the
//! description's concrete render-target identities, the descriptor set
//! layouts built from shader reflection, and the pipeline layout. Binding
//! the pipeline therefore begins its render pass with the right targets
//! without any per-frame lookup.

use std::any::Any;
use std::sync::Arc;

use ash::vk;

use pulsar_renderer::backend::reflection::ShaderReflection;
use pulsar_renderer::backend::{GpuImage, GpuPipeline, GpuShader, ResolvedAttachments};
use pulsar_renderer::engine_err;
use pulsar_renderer::error::Result;
use pulsar_renderer::pipeline::state::GraphicsPipelineDesc;

use crate::conversion::*;
use crate::vulkan_context::GpuContext;
use crate::vulkan_resources::{VulkanImage, VulkanShader};

pub struct VulkanPipeline {
    ctx: Arc<GpuContext>,
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) layout: vk::PipelineLayout,
    pub(crate) set_layouts: Vec<vk::DescriptorSetLayout>,
    pub(crate) bind_point: vk::PipelineBindPoint,
    /// Stages covered by the reflected push constant ranges
    pub(crate) push_constant_stages: vk::ShaderStageFlags,
    /// Graphics only; null for compute
    pub(crate) render_pass: vk::RenderPass,
    /// Graphics only; null for compute
    pub(crate) framebuffer: vk::Framebuffer,
    pub(crate) extent: vk::Extent2D,
    pub(crate) clear_values: Vec<vk::ClearValue>,
    reflection: ShaderReflection,
}

impl GpuPipeline for VulkanPipeline {
    fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanPipeline {
    fn drop(&mut self) {
        unsafe {
            if self.framebuffer != vk::Framebuffer::null() {
                self.ctx.device.destroy_framebuffer(self.framebuffer, None);
            }
            if self.render_pass != vk::RenderPass::null() {
                self.ctx.device.destroy_render_pass(self.render_pass, None);
            }
            self.ctx.device.destroy_pipeline(self.pipeline, None);
            self.ctx.device.destroy_pipeline_layout(self.layout, None);
            for layout in self.set_layouts.drain(..) {
                self.ctx.device.destroy_descriptor_set_layout(layout, None);
            }
        }
    }
}

/// Downcast a core image reference to the Vulkan object
pub(crate) fn as_vulkan_image<'a>(
    image: &'a dyn pulsar_renderer::backend::GpuImage,
) -> Result<&'a VulkanImage> {
    image
        .as_any()
        .downcast_ref::<VulkanImage>()
        .ok_or_else(|| engine_err!("pulsar::vulkan", "foreign image object passed to Vulkan backend"))
}

/// Create one descriptor set layout per reflected set index
///
/// Sets with no reflected bindings get an empty layout so set indices stay
/// contiguous in the pipeline layout.
fn build_set_layouts(
    ctx: &GpuContext,
    reflection: &ShaderReflection,
) -> Result<Vec<vk::DescriptorSetLayout>> {
    let set_count = reflection
        .bindings
        .iter()
        .map(|b| b.set + 1)
        .max()
        .unwrap_or(0);

    let mut layouts = Vec::with_capacity(set_count as usize);
    for set in 0..set_count {
        let bindings: Vec<vk::DescriptorSetLayoutBinding> = reflection
            .bindings
            .iter()
            .filter(|b| b.set == set)
            .map(|b| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(b.binding)
                    .descriptor_type(binding_type_to_vk(b.binding_type))
                    .descriptor_count(b.count)
                    .stage_flags(shader_stages_to_vk(b.stage_flags))
            })
            .collect();

        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
        let layout = unsafe {
            ctx.device
                .create_descriptor_set_layout(&create_info, None)
                .map_err(|e| {
                    engine_err!(
                        "pulsar::vulkan",
                        "Failed to create descriptor set layout for set {}: {:?}",
                        set,
                        e
                    )
                })?
        };
        layouts.push(layout);
    }
    Ok(layouts)
}

/// Push constant ranges from reflection (one range per block with a size)
fn build_push_constant_ranges(
    reflection: &ShaderReflection,
) -> (Vec<vk::PushConstantRange>, vk::ShaderStageFlags) {
    let mut ranges = Vec::new();
    let mut stages = vk::ShaderStageFlags::empty();
    for pc in &reflection.push_constants {
        if let Some(size) = pc.size {
            let stage_flags = shader_stages_to_vk(pc.stage_flags);
            stages |= stage_flags;
            ranges.push(vk::PushConstantRange {
                stage_flags,
                offset: 0,
                size,
            });
        }
    }
    (ranges, stages)
}

/// Build a graphics pipeline plus its render pass and framebuffer
pub(crate) fn build_graphics_pipeline(
    ctx: &Arc<GpuContext>,
    desc: &GraphicsPipelineDesc,
    attachments: &ResolvedAttachments<'_>,
    shader: &VulkanShader,
) -> Result<VulkanPipeline> {
    unsafe {
        let device = &ctx.device;

        // ===== Render pass from the resolved attachment set =====

        let mut attachment_descs = Vec::new();
        let mut color_refs = Vec::new();
        let mut attachment_views = Vec::new();
        let mut clear_values = Vec::new();

        for color in &attachments.colors {
            let image = as_vulkan_image(color.image)?;
            let info = image.info();
            let load_op = load_mode_to_vk(color.load);
            // Loading preserved contents needs a matching initial layout
            let initial_layout = if color.load == pulsar_renderer::backend::types::LoadMode::Load {
                vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL
            } else {
                vk::ImageLayout::UNDEFINED
            };

            color_refs.push(
                vk::AttachmentReference::default()
                    .attachment(attachment_descs.len() as u32)
                    .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL),
            );
            attachment_descs.push(
                vk::AttachmentDescription::default()
                    .format(pixel_format_to_vk(info.format))
                    .samples(sample_count_to_vk(desc.multisample.sample_count))
                    .load_op(load_op)
                    .store_op(vk::AttachmentStoreOp::STORE)
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(initial_layout)
                    .final_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL),
            );
            attachment_views.push(image.view);
            clear_values.push(vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: color.clear_color,
                },
            });
        }

        let mut depth_ref = vk::AttachmentReference::default();
        let has_depth = attachments.depth.is_some();
        if let Some(depth) = &attachments.depth {
            let image = as_vulkan_image(depth.image)?;
            let info = image.info();
            let initial_layout = if depth.load == pulsar_renderer::backend::types::LoadMode::Load {
                vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
            } else {
                vk::ImageLayout::UNDEFINED
            };

            depth_ref = vk::AttachmentReference::default()
                .attachment(attachment_descs.len() as u32)
                .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);
            attachment_descs.push(
                vk::AttachmentDescription::default()
                    .format(pixel_format_to_vk(info.format))
                    .samples(sample_count_to_vk(desc.multisample.sample_count))
                    .load_op(load_mode_to_vk(depth.load))
                    .store_op(vk::AttachmentStoreOp::STORE)
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(initial_layout)
                    .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
            );
            attachment_views.push(image.view);
            clear_values.push(vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: depth.clear_depth,
                    stencil: depth.clear_stencil,
                },
            });
        }

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs);
        if has_depth {
            subpass = subpass.depth_stencil_attachment(&depth_ref);
        }

        let (stage_mask, access_mask) = if has_depth {
            (
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                    | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                    | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            )
        } else {
            (
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            )
        };
        let dependency = vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(stage_mask)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(stage_mask)
            .dst_access_mask(access_mask);

        let render_pass_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachment_descs)
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(std::slice::from_ref(&dependency));

        let render_pass = device
            .create_render_pass(&render_pass_info, None)
            .map_err(|e| engine_err!("pulsar::vulkan", "Failed to create render pass: {:?}", e))?;

        // ===== Framebuffer over the concrete target views =====

        let (width, height) = attachments.extent();
        let framebuffer_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass)
            .attachments(&attachment_views)
            .width(width)
            .height(height)
            .layers(1);

        let framebuffer = device
            .create_framebuffer(&framebuffer_info, None)
            .map_err(|e| engine_err!("pulsar::vulkan", "Failed to create framebuffer: {:?}", e))?;

        // ===== Layouts from reflection =====

        let set_layouts = build_set_layouts(ctx, shader.reflection())?;
        let (push_constant_ranges, push_constant_stages) =
            build_push_constant_ranges(shader.reflection());

        let mut layout_info = vk::PipelineLayoutCreateInfo::default();
        if !set_layouts.is_empty() {
            layout_info = layout_info.set_layouts(&set_layouts);
        }
        if !push_constant_ranges.is_empty() {
            layout_info = layout_info.push_constant_ranges(&push_constant_ranges);
        }
        let layout = device
            .create_pipeline_layout(&layout_info, None)
            .map_err(|e| engine_err!("pulsar::vulkan", "Failed to create pipeline layout: {:?}", e))?;

        // ===== Shader stages =====

        let entry_point = c"main";
        let shader_stages: Vec<vk::PipelineShaderStageCreateInfo> = shader
            .modules
            .iter()
            .map(|(module, stage)| {
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(*stage)
                    .module(*module)
                    .name(entry_point)
            })
            .collect();

        // ===== Fixed-function state =====

        let vertex_bindings: Vec<vk::VertexInputBindingDescription> = desc
            .vertex_layout
            .bindings
            .iter()
            .map(|binding| vk::VertexInputBindingDescription {
                binding: binding.binding,
                stride: binding.stride,
                input_rate: match binding.input_rate {
                    pulsar_renderer::pipeline::state::VertexInputRate::Vertex => {
                        vk::VertexInputRate::VERTEX
                    }
                    pulsar_renderer::pipeline::state::VertexInputRate::Instance => {
                        vk::VertexInputRate::INSTANCE
                    }
                },
            })
            .collect();

        let vertex_attributes: Vec<vk::VertexInputAttributeDescription> = desc
            .vertex_layout
            .attributes
            .iter()
            .map(|attribute| vk::VertexInputAttributeDescription {
                location: attribute.location,
                binding: attribute.binding,
                format: vertex_format_to_vk(attribute.format),
                offset: attribute.offset,
            })
            .collect();

        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&vertex_bindings)
            .vertex_attribute_descriptions(&vertex_attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(topology_to_vk(desc.topology))
            .primitive_restart_enable(false);

        let viewports = [vk::Viewport::default()];
        let scissors = [vk::Rect2D::default()];
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterization_state = {
            let mut info = vk::PipelineRasterizationStateCreateInfo::default()
                .depth_clamp_enable(false)
                .rasterizer_discard_enable(false)
                .polygon_mode(polygon_mode_to_vk(desc.rasterization.polygon_mode))
                .line_width(1.0)
                .cull_mode(cull_mode_to_vk(desc.rasterization.cull_mode))
                .front_face(front_face_to_vk(desc.rasterization.front_face));
            if let Some(bias) = desc.rasterization.depth_bias {
                info = info
                    .depth_bias_enable(true)
                    .depth_bias_constant_factor(bias.constant_factor)
                    .depth_bias_slope_factor(bias.slope_factor)
                    .depth_bias_clamp(bias.clamp);
            } else {
                info = info.depth_bias_enable(false);
            }
            info
        };

        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(desc.depth_stencil.depth_test_enable)
            .depth_write_enable(desc.depth_stencil.depth_write_enable)
            .depth_compare_op(compare_op_to_vk(desc.depth_stencil.depth_compare_op))
            .depth_bounds_test_enable(false)
            .stencil_test_enable(desc.depth_stencil.stencil_test_enable)
            .front(stencil_op_state_to_vk(&desc.depth_stencil.front))
            .back(stencil_op_state_to_vk(&desc.depth_stencil.back));

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(sample_count_to_vk(desc.multisample.sample_count))
            .alpha_to_coverage_enable(desc.multisample.alpha_to_coverage);

        // One blend attachment per color target, sharing the described state
        let blend_attachment = {
            let blend = &desc.color_blend;
            let mask = &blend.color_write_mask;
            let mut write_mask = vk::ColorComponentFlags::empty();
            if mask.r {
                write_mask |= vk::ColorComponentFlags::R;
            }
            if mask.g {
                write_mask |= vk::ColorComponentFlags::G;
            }
            if mask.b {
                write_mask |= vk::ColorComponentFlags::B;
            }
            if mask.a {
                write_mask |= vk::ColorComponentFlags::A;
            }

            let mut attachment = vk::PipelineColorBlendAttachmentState::default()
                .color_write_mask(write_mask)
                .blend_enable(blend.blend_enable);
            if blend.blend_enable {
                attachment = attachment
                    .src_color_blend_factor(blend_factor_to_vk(blend.src_color_factor))
                    .dst_color_blend_factor(blend_factor_to_vk(blend.dst_color_factor))
                    .color_blend_op(blend_op_to_vk(blend.color_blend_op))
                    .src_alpha_blend_factor(blend_factor_to_vk(blend.src_alpha_factor))
                    .dst_alpha_blend_factor(blend_factor_to_vk(blend.dst_alpha_factor))
                    .alpha_blend_op(blend_op_to_vk(blend.alpha_blend_op));
            }
            attachment
        };
        let blend_attachments = vec![blend_attachment; attachments.colors.len()];
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        // ===== Pipeline =====

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .depth_stencil_state(&depth_stencil_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(render_pass)
            .subpass(0);

        let pipelines = device
            .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
            .map_err(|e| {
                engine_err!("pulsar::vulkan", "Failed to create graphics pipeline: {:?}", e.1)
            })?;

        Ok(VulkanPipeline {
            ctx: Arc::clone(ctx),
            pipeline: pipelines[0],
            layout,
            set_layouts,
            bind_point: vk::PipelineBindPoint::GRAPHICS,
            push_constant_stages,
            render_pass,
            framebuffer,
            extent: vk::Extent2D { width, height },
            clear_values,
            reflection: shader.reflection().clone(),
        })
    }
}

/// Build a compute pipeline
pub(crate) fn build_compute_pipeline(
    ctx: &Arc<GpuContext>,
    shader: &VulkanShader,
) -> Result<VulkanPipeline> {
    unsafe {
        let device = &ctx.device;

        let set_layouts = build_set_layouts(ctx, shader.reflection())?;
        let (push_constant_ranges, push_constant_stages) =
            build_push_constant_ranges(shader.reflection());

        let mut layout_info = vk::PipelineLayoutCreateInfo::default();
        if !set_layouts.is_empty() {
            layout_info = layout_info.set_layouts(&set_layouts);
        }
        if !push_constant_ranges.is_empty() {
            layout_info = layout_info.push_constant_ranges(&push_constant_ranges);
        }
        let layout = device
            .create_pipeline_layout(&layout_info, None)
            .map_err(|e| engine_err!("pulsar::vulkan", "Failed to create pipeline layout: {:?}", e))?;

        let (module, stage) = shader
            .modules
            .first()
            .copied()
            .ok_or_else(|| engine_err!("pulsar::vulkan", "compute shader has no module"))?;

        let entry_point = c"main";
        let stage_info = vk::PipelineShaderStageCreateInfo::default()
            .stage(stage)
            .module(module)
            .name(entry_point);

        let pipeline_info = vk::ComputePipelineCreateInfo::default()
            .stage(stage_info)
            .layout(layout);

        let pipelines = device
            .create_compute_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
            .map_err(|e| {
                engine_err!("pulsar::vulkan", "Failed to create compute pipeline: {:?}", e.1)
            })?;

        Ok(VulkanPipeline {
            ctx: Arc::clone(ctx),
            pipeline: pipelines[0],
            layout,
            set_layouts,
            bind_point: vk::PipelineBindPoint::COMPUTE,
            push_constant_stages,
            render_pass: vk::RenderPass::null(),
            framebuffer: vk::Framebuffer::null(),
            extent: vk::Extent2D::default(),
            clear_values: Vec::new(),
            reflection: shader.reflection().clone(),
        })
    }
}
