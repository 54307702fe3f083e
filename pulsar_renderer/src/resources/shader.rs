//! Shader handler
//!
//! Loads compiled shader bytecode through the backend and keeps the
//! reflected binding data alongside. Programs are deduplicated by source
//! path: loading the same paths twice returns the existing ID.

use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::backend::reflection::ShaderReflection;
use crate::backend::types::{ComputeShaderDesc, GraphicsShaderDesc};
use crate::backend::{GpuBackend, GpuShader};
use crate::error::{Error, Result};
use crate::handle::{ComputeShaderId, GraphicsShaderId};

struct ShaderEntry {
    gpu: Box<dyn GpuShader>,
}

/// Handler owning all shader programs
#[derive(Default)]
pub struct ShaderHandler {
    graphics: SlotMap<GraphicsShaderId, ShaderEntry>,
    compute: SlotMap<ComputeShaderId, ShaderEntry>,
    graphics_by_path: FxHashMap<GraphicsShaderDesc, GraphicsShaderId>,
    compute_by_path: FxHashMap<ComputeShaderDesc, ComputeShaderId>,
}

impl ShaderHandler {
    pub fn new() -> Self {
        Self {
            graphics: SlotMap::with_key(),
            compute: SlotMap::with_key(),
            graphics_by_path: FxHashMap::default(),
            compute_by_path: FxHashMap::default(),
        }
    }

    /// Load a graphics shader program, reusing an already-loaded one with
    /// the same source paths
    pub fn load_graphics(
        &mut self,
        backend: &mut dyn GpuBackend,
        desc: &GraphicsShaderDesc,
    ) -> Result<GraphicsShaderId> {
        if let Some(&id) = self.graphics_by_path.get(desc) {
            return Ok(id);
        }
        let gpu = backend.create_graphics_shader(desc)?;
        let id = self.graphics.insert(ShaderEntry { gpu });
        self.graphics_by_path.insert(desc.clone(), id);
        Ok(id)
    }

    /// Load a compute shader program, reusing an already-loaded one with
    /// the same source path
    pub fn load_compute(
        &mut self,
        backend: &mut dyn GpuBackend,
        desc: &ComputeShaderDesc,
    ) -> Result<ComputeShaderId> {
        if let Some(&id) = self.compute_by_path.get(desc) {
            return Ok(id);
        }
        let gpu = backend.create_compute_shader(desc)?;
        let id = self.compute.insert(ShaderEntry { gpu });
        self.compute_by_path.insert(desc.clone(), id);
        Ok(id)
    }

    /// Destroy a graphics shader program
    pub fn destroy_graphics(&mut self, id: GraphicsShaderId) -> bool {
        self.graphics_by_path.retain(|_, v| *v != id);
        self.graphics.remove(id).is_some()
    }

    /// Destroy a compute shader program
    pub fn destroy_compute(&mut self, id: ComputeShaderId) -> bool {
        self.compute_by_path.retain(|_, v| *v != id);
        self.compute.remove(id).is_some()
    }

    /// Resolve a graphics shader ID
    pub fn get_graphics(&self, id: GraphicsShaderId) -> Result<&dyn GpuShader> {
        self.graphics
            .get(id)
            .map(|entry| entry.gpu.as_ref())
            .ok_or_else(|| {
                Error::InvalidResource(format!("stale or invalid graphics shader id {:?}", id))
            })
    }

    /// Resolve a compute shader ID
    pub fn get_compute(&self, id: ComputeShaderId) -> Result<&dyn GpuShader> {
        self.compute
            .get(id)
            .map(|entry| entry.gpu.as_ref())
            .ok_or_else(|| {
                Error::InvalidResource(format!("stale or invalid compute shader id {:?}", id))
            })
    }

    /// Reflection data of a graphics program
    pub fn graphics_reflection(&self, id: GraphicsShaderId) -> Result<&ShaderReflection> {
        self.get_graphics(id).map(|gpu| gpu.reflection())
    }

    /// Reflection data of a compute program
    pub fn compute_reflection(&self, id: ComputeShaderId) -> Result<&ShaderReflection> {
        self.get_compute(id).map(|gpu| gpu.reflection())
    }

    /// Number of loaded programs (graphics + compute)
    pub fn len(&self) -> usize {
        self.graphics.len() + self.compute.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphics.is_empty() && self.compute.is_empty()
    }
}

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
