//! Pipeline cache
//!
//! Pipelines are deduplicated by a content hash over their description:
//! fixed-function state, shader identity, and the concrete render-target
//! identities. `create_*` hashes first and linearly scans the known
//! pipelines — a hit returns the existing ID without touching the backend,
//! so call sites re-describe their pipelines every frame for free. Only on
//! a miss are the render-target bindings resolved, the shader reflection
//! consulted, and a backend pipeline built. Nothing is ever evicted.

use slotmap::SlotMap;

use crate::backend::reflection::ShaderReflection;
use crate::backend::{
    GpuBackend, GpuPipeline, ResolvedAttachments, ResolvedColorAttachment,
    ResolvedDepthAttachment,
};
use crate::engine_debug;
use crate::error::{Error, Result};
use crate::handle::{ComputePipelineId, GraphicsPipelineId};
use crate::pipeline::state::{ComputePipelineDesc, GraphicsPipelineDesc};
use crate::resources::RenderResources;

struct GraphicsEntry {
    desc: GraphicsPipelineDesc,
    gpu: Box<dyn GpuPipeline>,
}

struct ComputeEntry {
    gpu: Box<dyn GpuPipeline>,
}

/// Cache of deduplicated pipeline objects
#[derive(Default)]
pub struct PipelineCache {
    graphics: SlotMap<GraphicsPipelineId, GraphicsEntry>,
    compute: SlotMap<ComputePipelineId, ComputeEntry>,
    // Linear scan over (hash, id); pipeline counts stay small
    graphics_lookup: Vec<(u64, GraphicsPipelineId)>,
    compute_lookup: Vec<(u64, ComputePipelineId)>,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create a graphics pipeline for this description
    ///
    /// Idempotent: identically-hashing descriptions return the same ID and
    /// create exactly one backend object.
    pub fn create_graphics(
        &mut self,
        backend: &mut dyn GpuBackend,
        resources: &RenderResources,
        desc: &GraphicsPipelineDesc,
    ) -> Result<GraphicsPipelineId> {
        let hash = desc.content_hash();
        if let Some(&(_, id)) = self.graphics_lookup.iter().find(|(h, _)| *h == hash) {
            return Ok(id);
        }

        let attachments = resolve_attachments(resources, desc)?;
        let shader = resources.shaders.get_graphics(desc.shader)?;
        let gpu = backend.create_graphics_pipeline(desc, &attachments, shader)?;

        let id = self.graphics.insert(GraphicsEntry {
            desc: desc.clone(),
            gpu,
        });
        self.graphics_lookup.push((hash, id));
        engine_debug!(
            "pulsar::PipelineCache",
            "built graphics pipeline {:?} (hash {:#018x}, {} cached)",
            id,
            hash,
            self.graphics_lookup.len()
        );
        Ok(id)
    }

    /// Get or create a compute pipeline for this description
    pub fn create_compute(
        &mut self,
        backend: &mut dyn GpuBackend,
        resources: &RenderResources,
        desc: &ComputePipelineDesc,
    ) -> Result<ComputePipelineId> {
        let hash = desc.content_hash();
        if let Some(&(_, id)) = self.compute_lookup.iter().find(|(h, _)| *h == hash) {
            return Ok(id);
        }

        let shader = resources.shaders.get_compute(desc.shader)?;
        let gpu = backend.create_compute_pipeline(shader)?;

        let id = self.compute.insert(ComputeEntry { gpu });
        self.compute_lookup.push((hash, id));
        engine_debug!(
            "pulsar::PipelineCache",
            "built compute pipeline {:?} (hash {:#018x}, {} cached)",
            id,
            hash,
            self.compute_lookup.len()
        );
        Ok(id)
    }

    /// Resolve a graphics pipeline ID to its backend object
    pub fn graphics_pipeline(&self, id: GraphicsPipelineId) -> Result<&dyn GpuPipeline> {
        self.graphics
            .get(id)
            .map(|entry| entry.gpu.as_ref())
            .ok_or_else(|| {
                Error::InvalidResource(format!("stale or invalid graphics pipeline id {:?}", id))
            })
    }

    /// The description a graphics pipeline was created from
    pub fn graphics_desc(&self, id: GraphicsPipelineId) -> Result<&GraphicsPipelineDesc> {
        self.graphics
            .get(id)
            .map(|entry| &entry.desc)
            .ok_or_else(|| {
                Error::InvalidResource(format!("stale or invalid graphics pipeline id {:?}", id))
            })
    }

    /// Resolve a compute pipeline ID to its backend object
    pub fn compute_pipeline(&self, id: ComputePipelineId) -> Result<&dyn GpuPipeline> {
        self.compute
            .get(id)
            .map(|entry| entry.gpu.as_ref())
            .ok_or_else(|| {
                Error::InvalidResource(format!("stale or invalid compute pipeline id {:?}", id))
            })
    }

    /// Reflection data of a graphics pipeline
    pub fn graphics_reflection(&self, id: GraphicsPipelineId) -> Result<&ShaderReflection> {
        self.graphics_pipeline(id).map(|p| p.reflection())
    }

    /// Reflection data of a compute pipeline
    pub fn compute_reflection(&self, id: ComputePipelineId) -> Result<&ShaderReflection> {
        self.compute_pipeline(id).map(|p| p.reflection())
    }

    /// Number of cached pipelines (graphics + compute)
    pub fn len(&self) -> usize {
        self.graphics.len() + self.compute.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphics.is_empty() && self.compute.is_empty()
    }
}

/// Resolve a graphics description's render-target IDs to backend objects
pub(crate) fn resolve_attachments<'a>(
    resources: &'a RenderResources,
    desc: &GraphicsPipelineDesc,
) -> Result<ResolvedAttachments<'a>> {
    let mut colors = Vec::with_capacity(desc.color_targets.len());
    for target in &desc.color_targets {
        colors.push(ResolvedColorAttachment {
            image: resources.images.get_image(target.image)?,
            load: target.load,
            clear_color: target.clear_color,
        });
    }
    let depth = match &desc.depth_target {
        Some(target) => Some(ResolvedDepthAttachment {
            image: resources.images.get_depth_image(target.image)?,
            load: target.load,
            clear_depth: target.clear_depth,
            clear_stencil: target.clear_stencil,
        }),
        None => None,
    };
    Ok(ResolvedAttachments { colors, depth })
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
