//! Sampler handler

use slotmap::SlotMap;

use crate::backend::types::SamplerDesc;
use crate::backend::{GpuBackend, GpuSampler};
use crate::error::{Error, Result};
use crate::handle::SamplerId;

struct SamplerEntry {
    gpu: Box<dyn GpuSampler>,
}

/// Handler owning all samplers
///
/// Typical clients only ever create a handful of samplers and keep them for
/// the process lifetime.
#[derive(Default)]
pub struct SamplerHandler {
    samplers: SlotMap<SamplerId, SamplerEntry>,
}

impl SamplerHandler {
    pub fn new() -> Self {
        Self {
            samplers: SlotMap::with_key(),
        }
    }

    /// Create a sampler
    pub fn create(
        &mut self,
        backend: &mut dyn GpuBackend,
        desc: &SamplerDesc,
    ) -> Result<SamplerId> {
        let gpu = backend.create_sampler(desc)?;
        Ok(self.samplers.insert(SamplerEntry { gpu }))
    }

    /// Destroy a sampler and recycle its ID
    pub fn destroy(&mut self, id: SamplerId) -> bool {
        self.samplers.remove(id).is_some()
    }

    /// Resolve a sampler ID
    pub fn get(&self, id: SamplerId) -> Result<&dyn GpuSampler> {
        self.samplers
            .get(id)
            .map(|entry| entry.gpu.as_ref())
            .ok_or_else(|| Error::InvalidResource(format!("stale or invalid sampler id {:?}", id)))
    }

    pub fn contains(&self, id: SamplerId) -> bool {
        self.samplers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.samplers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samplers.is_empty()
    }
}

#[cfg(test)]
#[path = "sampler_tests.rs"]
mod tests;
