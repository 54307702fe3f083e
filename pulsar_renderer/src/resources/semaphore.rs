//! GPU semaphore handler
//!
//! Semaphores synchronize the renderer's last submission with external
//! consumers, primarily the externally-owned present surface.

use slotmap::SlotMap;

use crate::backend::{GpuBackend, GpuSemaphore};
use crate::error::{Error, Result};
use crate::handle::GpuSemaphoreId;

struct SemaphoreEntry {
    gpu: Box<dyn GpuSemaphore>,
}

/// Handler owning all GPU semaphores
#[derive(Default)]
pub struct SemaphoreHandler {
    semaphores: SlotMap<GpuSemaphoreId, SemaphoreEntry>,
}

impl SemaphoreHandler {
    pub fn new() -> Self {
        Self {
            semaphores: SlotMap::with_key(),
        }
    }

    /// Create a semaphore
    pub fn create(&mut self, backend: &mut dyn GpuBackend) -> Result<GpuSemaphoreId> {
        let gpu = backend.create_semaphore()?;
        Ok(self.semaphores.insert(SemaphoreEntry { gpu }))
    }

    /// Destroy a semaphore and recycle its ID
    pub fn destroy(&mut self, id: GpuSemaphoreId) -> bool {
        self.semaphores.remove(id).is_some()
    }

    /// Resolve a semaphore ID
    pub fn get(&self, id: GpuSemaphoreId) -> Result<&dyn GpuSemaphore> {
        self.semaphores
            .get(id)
            .map(|entry| entry.gpu.as_ref())
            .ok_or_else(|| {
                Error::InvalidResource(format!("stale or invalid semaphore id {:?}", id))
            })
    }

    pub fn contains(&self, id: GpuSemaphoreId) -> bool {
        self.semaphores.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.semaphores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.semaphores.is_empty()
    }
}
