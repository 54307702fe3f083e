//! Buffer handler
//!
//! Owns every GPU buffer, addressed by generational `BufferId`. Temporary
//! buffers carry a frames-to-live counter decremented at each frame-start
//! tick; on expiry the backend object is destroyed and the ID slot is
//! recycled, so per-frame scratch buffers need no manual tracking at call
//! sites.

use slotmap::SlotMap;

use crate::backend::types::BufferDesc;
use crate::backend::{GpuBackend, GpuBuffer};
use crate::engine_warn;
use crate::error::{Error, Result};
use crate::handle::BufferId;

struct BufferEntry {
    gpu: Box<dyn GpuBuffer>,
}

/// A buffer scheduled for delayed destruction
struct TemporaryBuffer {
    id: BufferId,
    /// Frame-start ticks this buffer remains valid for
    frames_remaining: u32,
}

/// Handler owning all GPU buffers
#[derive(Default)]
pub struct BufferHandler {
    buffers: SlotMap<BufferId, BufferEntry>,
    temporaries: Vec<TemporaryBuffer>,
}

impl BufferHandler {
    pub fn new() -> Self {
        Self {
            buffers: SlotMap::with_key(),
            temporaries: Vec::new(),
        }
    }

    /// Create a buffer with unmanaged lifetime
    pub fn create(
        &mut self,
        backend: &mut dyn GpuBackend,
        desc: &BufferDesc,
    ) -> Result<BufferId> {
        let gpu = backend.create_buffer(desc)?;
        Ok(self.buffers.insert(BufferEntry { gpu }))
    }

    /// Create a temporary buffer valid for the creation frame plus the next
    /// `lifetime_frames` frame-start ticks
    ///
    /// # Arguments
    ///
    /// * `lifetime_frames` - Number of frame-start ticks the buffer stays
    ///   resolvable for (must be > 0)
    pub fn create_temporary(
        &mut self,
        backend: &mut dyn GpuBackend,
        desc: &BufferDesc,
        lifetime_frames: u32,
    ) -> Result<BufferId> {
        debug_assert!(lifetime_frames > 0, "temporary buffer lifetime must be > 0");
        let id = self.create(backend, desc)?;
        self.temporaries.push(TemporaryBuffer {
            id,
            frames_remaining: lifetime_frames,
        });
        Ok(id)
    }

    /// Destroy a buffer and recycle its ID
    ///
    /// Returns false if the ID was already stale.
    pub fn destroy(&mut self, id: BufferId) -> bool {
        self.temporaries.retain(|t| t.id != id);
        self.buffers.remove(id).is_some()
    }

    /// Resolve an ID to its backend object
    pub fn get(&self, id: BufferId) -> Result<&dyn GpuBuffer> {
        self.buffers
            .get(id)
            .map(|entry| entry.gpu.as_ref())
            .ok_or_else(|| Error::InvalidResource(format!("stale or invalid buffer id {:?}", id)))
    }

    /// Resolve an ID, returning None for stale IDs
    pub fn try_get(&self, id: BufferId) -> Option<&dyn GpuBuffer> {
        self.buffers.get(id).map(|entry| entry.gpu.as_ref())
    }

    /// Whether the ID currently resolves
    pub fn contains(&self, id: BufferId) -> bool {
        self.buffers.contains_key(id)
    }

    /// Update buffer contents
    pub fn update(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<()> {
        self.get(id)?.update(offset, data)
    }

    /// Update buffer contents from a typed slice
    pub fn update_typed<T: bytemuck::Pod>(
        &self,
        id: BufferId,
        offset: u64,
        data: &[T],
    ) -> Result<()> {
        self.update(id, offset, bytemuck::cast_slice(data))
    }

    /// Number of live buffers
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Whether no buffers are live
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Frame-start tick: age temporaries, destroying the expired ones
    pub fn begin_frame(&mut self) {
        let mut expired = Vec::new();
        for temp in &mut self.temporaries {
            if temp.frames_remaining == 0 {
                expired.push(temp.id);
            } else {
                temp.frames_remaining -= 1;
            }
        }
        if !expired.is_empty() {
            self.temporaries.retain(|t| !expired.contains(&t.id));
            for id in expired {
                if self.buffers.remove(id).is_none() {
                    engine_warn!(
                        "pulsar::BufferHandler",
                        "temporary buffer {:?} was destroyed before expiry",
                        id
                    );
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
