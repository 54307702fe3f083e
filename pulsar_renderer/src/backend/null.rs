//! Null backend
//!
//! A `GpuBackend` that touches no GPU: every call is recorded into a shared
//! log, resources are plain host objects, and buffer updates land in host
//! memory. Used by the unit and integration tests to assert dispatch order
//! and creation counts, and usable for headless runs of render code.

use std::any::Any;
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

use crate::backend::reflection::ShaderReflection;
use crate::backend::types::{
    BufferDesc, ComputeShaderDesc, DescriptorLifetime, DescriptorSlot, GraphicsShaderDesc,
    ImageDesc, ImageInfo, IndexType, PipelineBarrierKind, Rect2D, SamplerDesc, TextureDesc,
    TextureInfo, Viewport,
};
use crate::backend::{
    GpuBackend, GpuBuffer, GpuImage, GpuPipeline, GpuSampler, GpuSemaphore, GpuShader,
    GpuTexture, ResolvedAttachments, ResolvedDescriptor,
};
use crate::error::Result;
use crate::pipeline::state::GraphicsPipelineDesc;

/// Shared call log handle
pub type CallLog = Arc<Mutex<Vec<String>>>;

// ============================================================================
// Null resources
// ============================================================================

/// Buffer backed by host memory; updates are observable in tests
pub struct NullBuffer {
    size: u64,
    data: Mutex<Vec<u8>>,
}

impl NullBuffer {
    /// Snapshot of the buffer contents
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }
}

impl GpuBuffer for NullBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut storage = self.data.lock().unwrap();
        let end = offset as usize + data.len();
        if end > storage.len() {
            return Err(crate::error::Error::InvalidResource(format!(
                "buffer update out of bounds: {} > {}",
                end,
                storage.len()
            )));
        }
        storage[offset as usize..end].copy_from_slice(data);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct NullImage {
    info: ImageInfo,
}

impl GpuImage for NullImage {
    fn info(&self) -> &ImageInfo {
        &self.info
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct NullTexture {
    info: TextureInfo,
}

impl GpuTexture for NullTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct NullSampler;

impl GpuSampler for NullSampler {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct NullShader {
    reflection: ShaderReflection,
}

impl GpuShader for NullShader {
    fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct NullPipeline {
    reflection: ShaderReflection,
}

impl GpuPipeline for NullPipeline {
    fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct NullSemaphore;

impl GpuSemaphore for NullSemaphore {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Null backend
// ============================================================================

/// Backend that records every call and creates host-only objects
pub struct NullBackend {
    calls: CallLog,
    /// Reflection data returned for shader paths; unknown paths reflect
    /// to empty
    shader_reflections: FxHashMap<String, ShaderReflection>,
}

impl NullBackend {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            shader_reflections: FxHashMap::default(),
        }
    }

    /// Handle to the shared call log; clone before boxing the backend
    pub fn call_log(&self) -> CallLog {
        Arc::clone(&self.calls)
    }

    /// Configure the reflection returned for a shader path
    pub fn set_shader_reflection(&mut self, path: &str, reflection: ShaderReflection) {
        self.shader_reflections.insert(path.to_string(), reflection);
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn reflection_for(&self, path: &str) -> ShaderReflection {
        self.shader_reflections
            .get(path)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuBackend for NullBackend {
    fn begin_frame(&mut self, frame_index: usize) -> Result<()> {
        self.record(format!("begin_frame:{}", frame_index));
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        self.record("wait_idle".to_string());
        Ok(())
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Box<dyn GpuBuffer>> {
        self.record(format!("create_buffer:{}", desc.size));
        Ok(Box::new(NullBuffer {
            size: desc.size,
            data: Mutex::new(vec![0; desc.size as usize]),
        }))
    }

    fn create_image(&mut self, desc: &ImageDesc) -> Result<Box<dyn GpuImage>> {
        self.record(format!("create_image:{}x{}", desc.width, desc.height));
        Ok(Box::new(NullImage {
            info: ImageInfo {
                width: desc.width,
                height: desc.height,
                format: desc.format,
                usage: desc.usage,
            },
        }))
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<Box<dyn GpuTexture>> {
        self.record(format!(
            "create_texture:{}x{}x{}",
            desc.width, desc.height, desc.array_layers
        ));
        Ok(Box::new(NullTexture {
            info: TextureInfo {
                width: desc.width,
                height: desc.height,
                format: desc.format,
                array_layers: desc.array_layers,
                mip_levels: desc.mip_levels,
            },
        }))
    }

    fn create_sampler(&mut self, _desc: &SamplerDesc) -> Result<Box<dyn GpuSampler>> {
        self.record("create_sampler".to_string());
        Ok(Box::new(NullSampler))
    }

    fn create_graphics_shader(
        &mut self,
        desc: &GraphicsShaderDesc,
    ) -> Result<Box<dyn GpuShader>> {
        self.record(format!(
            "create_graphics_shader:{}:{}",
            desc.vertex_path, desc.fragment_path
        ));
        let vs = self.reflection_for(&desc.vertex_path);
        let fs = self.reflection_for(&desc.fragment_path);
        Ok(Box::new(NullShader {
            reflection: ShaderReflection::merge(&vs, &fs)?,
        }))
    }

    fn create_compute_shader(&mut self, desc: &ComputeShaderDesc) -> Result<Box<dyn GpuShader>> {
        self.record(format!("create_compute_shader:{}", desc.path));
        Ok(Box::new(NullShader {
            reflection: self.reflection_for(&desc.path),
        }))
    }

    fn create_graphics_pipeline(
        &mut self,
        _desc: &GraphicsPipelineDesc,
        attachments: &ResolvedAttachments<'_>,
        shader: &dyn GpuShader,
    ) -> Result<Box<dyn GpuPipeline>> {
        self.record(format!(
            "create_graphics_pipeline:{}c{}",
            attachments.colors.len(),
            if attachments.depth.is_some() { ":depth" } else { "" }
        ));
        Ok(Box::new(NullPipeline {
            reflection: shader.reflection().clone(),
        }))
    }

    fn create_compute_pipeline(&mut self, shader: &dyn GpuShader) -> Result<Box<dyn GpuPipeline>> {
        self.record("create_compute_pipeline".to_string());
        Ok(Box::new(NullPipeline {
            reflection: shader.reflection().clone(),
        }))
    }

    fn create_semaphore(&mut self) -> Result<Box<dyn GpuSemaphore>> {
        self.record("create_semaphore".to_string());
        Ok(Box::new(NullSemaphore))
    }

    fn begin_commands(&mut self, frame_index: usize) -> Result<()> {
        self.record(format!("begin_commands:{}", frame_index));
        Ok(())
    }

    fn submit_commands(
        &mut self,
        frame_index: usize,
        signal: Option<&dyn GpuSemaphore>,
    ) -> Result<()> {
        self.record(format!(
            "submit_commands:{}{}",
            frame_index,
            if signal.is_some() { ":signal" } else { "" }
        ));
        Ok(())
    }

    fn cmd_push_marker(&mut self, label: &str) {
        self.record(format!("push_marker:{}", label));
    }

    fn cmd_pop_marker(&mut self) {
        self.record("pop_marker".to_string());
    }

    fn cmd_begin_pipeline(
        &mut self,
        _pipeline: &dyn GpuPipeline,
        attachments: Option<&ResolvedAttachments<'_>>,
    ) -> Result<()> {
        self.record(format!(
            "begin_pipeline:{}",
            if attachments.is_some() { "graphics" } else { "compute" }
        ));
        Ok(())
    }

    fn cmd_end_pipeline(&mut self) -> Result<()> {
        self.record("end_pipeline".to_string());
        Ok(())
    }

    fn cmd_bind_descriptor_set(
        &mut self,
        _pipeline: &dyn GpuPipeline,
        slot: DescriptorSlot,
        bindings: &[ResolvedDescriptor<'_>],
        lifetime: DescriptorLifetime,
        _frame_index: usize,
    ) -> Result<()> {
        self.record(format!(
            "bind_descriptor_set:{}:{}:{:?}",
            slot.index(),
            bindings.len(),
            lifetime
        ));
        Ok(())
    }

    fn cmd_bind_vertex_buffer(&mut self, _buffer: &dyn GpuBuffer, offset: u64) -> Result<()> {
        self.record(format!("bind_vertex_buffer:{}", offset));
        Ok(())
    }

    fn cmd_bind_index_buffer(
        &mut self,
        _buffer: &dyn GpuBuffer,
        offset: u64,
        index_type: IndexType,
    ) -> Result<()> {
        self.record(format!("bind_index_buffer:{}:{:?}", offset, index_type));
        Ok(())
    }

    fn cmd_push_constants(
        &mut self,
        _pipeline: &dyn GpuPipeline,
        offset: u32,
        data: &[u8],
    ) -> Result<()> {
        self.record(format!("push_constants:{}:{}", offset, data.len()));
        Ok(())
    }

    fn cmd_set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.record(format!(
            "set_viewport:{}x{}",
            viewport.width as u32, viewport.height as u32
        ));
        Ok(())
    }

    fn cmd_set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.record(format!("set_scissor:{}x{}", scissor.width, scissor.height));
        Ok(())
    }

    fn cmd_draw(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) -> Result<()> {
        self.record(format!(
            "draw:{}:{}:{}:{}",
            vertex_count, instance_count, first_vertex, first_instance
        ));
        Ok(())
    }

    fn cmd_draw_bindless(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) -> Result<()> {
        self.record(format!(
            "draw_bindless:{}:{}:{}:{}",
            vertex_count, instance_count, first_vertex, first_instance
        ));
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
        self.record(format!(
            "draw_indexed:{}:{}:{}:{}:{}",
            index_count, instance_count, first_index, vertex_offset, first_instance
        ));
        Ok(())
    }

    fn cmd_draw_indirect(
        &mut self,
        _buffer: &dyn GpuBuffer,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) -> Result<()> {
        self.record(format!("draw_indirect:{}:{}:{}", offset, draw_count, stride));
        Ok(())
    }

    fn cmd_draw_indirect_count(
        &mut self,
        _buffer: &dyn GpuBuffer,
        offset: u64,
        _count_buffer: &dyn GpuBuffer,
        count_offset: u64,
        max_draw_count: u32,
        stride: u32,
    ) -> Result<()> {
        self.record(format!(
            "draw_indirect_count:{}:{}:{}:{}",
            offset, count_offset, max_draw_count, stride
        ));
        Ok(())
    }

    fn cmd_dispatch(&mut self, group_count: [u32; 3]) -> Result<()> {
        self.record(format!(
            "dispatch:{}:{}:{}",
            group_count[0], group_count[1], group_count[2]
        ));
        Ok(())
    }

    fn cmd_dispatch_indirect(&mut self, _buffer: &dyn GpuBuffer, offset: u64) -> Result<()> {
        self.record(format!("dispatch_indirect:{}", offset));
        Ok(())
    }

    fn cmd_copy_buffer(
        &mut self,
        _src: &dyn GpuBuffer,
        _dst: &dyn GpuBuffer,
        src_offset: u64,
        dst_offset: u64,
        size: u64,
    ) -> Result<()> {
        self.record(format!("copy_buffer:{}:{}:{}", src_offset, dst_offset, size));
        Ok(())
    }

    fn cmd_pipeline_barrier(
        &mut self,
        barrier: PipelineBarrierKind,
        _buffer: &dyn GpuBuffer,
    ) -> Result<()> {
        self.record(format!("pipeline_barrier:{:?}", barrier));
        Ok(())
    }
}
