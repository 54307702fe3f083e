//! Model handler
//!
//! A model is a vertex buffer + index buffer pair created and destroyed
//! together. The handler composes the buffer handler: both buffers are
//! regular `BufferId`s, so command recording binds them like any other
//! buffer.

use slotmap::SlotMap;

use crate::backend::types::{BufferDesc, BufferUsage, IndexType, ModelDesc, ModelVertex};
use crate::backend::GpuBackend;
use crate::engine_bail;
use crate::error::{Error, Result};
use crate::handle::{BufferId, ModelId};
use crate::resources::buffer::BufferHandler;

/// A created model
#[derive(Debug, Clone, Copy)]
pub struct Model {
    pub vertex_buffer: BufferId,
    pub index_buffer: BufferId,
    pub vertex_count: u32,
    pub index_count: u32,
    pub index_type: IndexType,
}

/// Handler owning all models
#[derive(Default)]
pub struct ModelHandler {
    models: SlotMap<ModelId, Model>,
}

impl ModelHandler {
    pub fn new() -> Self {
        Self {
            models: SlotMap::with_key(),
        }
    }

    /// Create a model, uploading vertex and index data
    pub fn create(
        &mut self,
        backend: &mut dyn GpuBackend,
        buffers: &mut BufferHandler,
        desc: &ModelDesc,
    ) -> Result<ModelId> {
        if desc.vertices.is_empty() || desc.indices.is_empty() {
            engine_bail!(
                "pulsar::ModelHandler",
                "model needs vertices and indices (got {} / {})",
                desc.vertices.len(),
                desc.indices.len()
            );
        }

        let vertex_bytes = std::mem::size_of::<ModelVertex>() * desc.vertices.len();
        let vertex_buffer = buffers.create(
            backend,
            &BufferDesc {
                size: vertex_bytes as u64,
                usage: BufferUsage::VERTEX | BufferUsage::TRANSFER_DST,
            },
        )?;
        buffers.update_typed(vertex_buffer, 0, &desc.vertices)?;

        let index_bytes = std::mem::size_of::<u32>() * desc.indices.len();
        let index_buffer = buffers.create(
            backend,
            &BufferDesc {
                size: index_bytes as u64,
                usage: BufferUsage::INDEX | BufferUsage::TRANSFER_DST,
            },
        )?;
        buffers.update_typed(index_buffer, 0, &desc.indices)?;

        Ok(self.models.insert(Model {
            vertex_buffer,
            index_buffer,
            vertex_count: desc.vertices.len() as u32,
            index_count: desc.indices.len() as u32,
            index_type: IndexType::U32,
        }))
    }

    /// Destroy a model together with its buffers
    pub fn destroy(&mut self, buffers: &mut BufferHandler, id: ModelId) -> bool {
        match self.models.remove(id) {
            Some(model) => {
                buffers.destroy(model.vertex_buffer);
                buffers.destroy(model.index_buffer);
                true
            }
            None => false,
        }
    }

    /// Resolve a model ID
    pub fn get(&self, id: ModelId) -> Result<&Model> {
        self.models
            .get(id)
            .ok_or_else(|| Error::InvalidResource(format!("stale or invalid model id {:?}", id)))
    }

    pub fn contains(&self, id: ModelId) -> bool {
        self.models.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
