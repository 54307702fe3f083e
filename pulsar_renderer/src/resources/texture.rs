//! Texture handler
//!
//! Owns sampled textures and texture arrays under separate ID kinds.
//! Upload data travels in the descriptor (`TextureData::Single` for plain
//! textures, `TextureData::Layers` for full or partial array uploads).

use slotmap::SlotMap;

use crate::backend::types::{TextureDesc, TextureInfo};
use crate::backend::{GpuBackend, GpuTexture};
use crate::engine_bail;
use crate::error::{Error, Result};
use crate::handle::{TextureArrayId, TextureId};

struct TextureEntry {
    gpu: Box<dyn GpuTexture>,
}

/// Handler owning all sampled textures and texture arrays
#[derive(Default)]
pub struct TextureHandler {
    textures: SlotMap<TextureId, TextureEntry>,
    arrays: SlotMap<TextureArrayId, TextureEntry>,
}

impl TextureHandler {
    pub fn new() -> Self {
        Self {
            textures: SlotMap::with_key(),
            arrays: SlotMap::with_key(),
        }
    }

    /// Create a simple 2D texture (array_layers must be 1)
    pub fn create_texture(
        &mut self,
        backend: &mut dyn GpuBackend,
        desc: &TextureDesc,
    ) -> Result<TextureId> {
        if desc.array_layers != 1 {
            engine_bail!(
                "pulsar::TextureHandler",
                "create_texture with array_layers = {}; use create_texture_array",
                desc.array_layers
            );
        }
        let gpu = backend.create_texture(desc)?;
        Ok(self.textures.insert(TextureEntry { gpu }))
    }

    /// Create a texture array (array_layers must be > 1)
    pub fn create_texture_array(
        &mut self,
        backend: &mut dyn GpuBackend,
        desc: &TextureDesc,
    ) -> Result<TextureArrayId> {
        if desc.array_layers < 2 {
            engine_bail!(
                "pulsar::TextureHandler",
                "create_texture_array with array_layers = {}; use create_texture",
                desc.array_layers
            );
        }
        let gpu = backend.create_texture(desc)?;
        Ok(self.arrays.insert(TextureEntry { gpu }))
    }

    /// Destroy a texture and recycle its ID
    pub fn destroy_texture(&mut self, id: TextureId) -> bool {
        self.textures.remove(id).is_some()
    }

    /// Destroy a texture array and recycle its ID
    pub fn destroy_texture_array(&mut self, id: TextureArrayId) -> bool {
        self.arrays.remove(id).is_some()
    }

    /// Resolve a texture ID
    pub fn get_texture(&self, id: TextureId) -> Result<&dyn GpuTexture> {
        self.textures
            .get(id)
            .map(|entry| entry.gpu.as_ref())
            .ok_or_else(|| Error::InvalidResource(format!("stale or invalid texture id {:?}", id)))
    }

    /// Resolve a texture array ID
    pub fn get_texture_array(&self, id: TextureArrayId) -> Result<&dyn GpuTexture> {
        self.arrays
            .get(id)
            .map(|entry| entry.gpu.as_ref())
            .ok_or_else(|| {
                Error::InvalidResource(format!("stale or invalid texture array id {:?}", id))
            })
    }

    /// Properties of a texture
    pub fn texture_info(&self, id: TextureId) -> Result<&TextureInfo> {
        self.get_texture(id).map(|gpu| gpu.info())
    }

    /// Properties of a texture array
    pub fn texture_array_info(&self, id: TextureArrayId) -> Result<&TextureInfo> {
        self.get_texture_array(id).map(|gpu| gpu.info())
    }

    pub fn contains_texture(&self, id: TextureId) -> bool {
        self.textures.contains_key(id)
    }

    pub fn contains_texture_array(&self, id: TextureArrayId) -> bool {
        self.arrays.contains_key(id)
    }

    /// Number of live textures (simple + arrays)
    pub fn len(&self) -> usize {
        self.textures.len() + self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty() && self.arrays.is_empty()
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
