//! Name-based descriptor sets
//!
//! Call sites bind resources by shader variable name instead of numeric
//! set/binding slots. The set is just an ordered bag of
//! `{name hash, resource ID}` pairs, independent of any concrete shader
//! layout; slot resolution is deferred until the set is consumed against a
//! pipeline's reflection data (see `pipeline::binder`).
//!
//! No validation happens at bind time. A name that no shader ever declares
//! is legitimate — the same set is commonly bound to many pipelines, each
//! consuming a subset of it.

use crate::handle::{
    BufferId, ImageId, SamplerId, TextureArrayId, TextureId,
};

/// 32-bit FNV-1a hash of a descriptor name
///
/// `const fn`, so call sites can hash well-known names at compile time:
///
/// ```
/// use pulsar_renderer::descriptor_set::descriptor_name_hash;
/// const ALBEDO: u32 = descriptor_name_hash("u_albedo");
/// assert_eq!(ALBEDO, descriptor_name_hash("u_albedo"));
/// ```
pub const fn descriptor_name_hash(name: &str) -> u32 {
    let bytes = name.as_bytes();
    let mut hash: u32 = 0x811c9dc5;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(0x0100_0193);
        i += 1;
    }
    hash
}

/// Resource bound by a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorResource {
    /// Texture sampler
    Sampler(SamplerId),
    /// Sampled 2D texture
    Texture(TextureId),
    /// Sampled 2D texture array
    TextureArray(TextureArrayId),
    /// Storage image
    Image(ImageId),
    /// Uniform or storage buffer
    Buffer(BufferId),
}

/// One name→resource binding inside a descriptor set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    /// 32-bit hash of the shader variable name
    pub name_hash: u32,
    /// Bound resource
    pub resource: DescriptorResource,
}

/// Ordered bag of name-hash→resource bindings
///
/// Rebinding an existing name hash overwrites the entry in place (the
/// resource kind may change); a new name hash appends. The set is a value
/// type: the command list clones the current bindings at record time, so
/// mutating a set after binding never affects already-recorded commands.
#[derive(Debug, Clone, Default)]
pub struct DescriptorSet {
    descriptors: Vec<Descriptor>,
}

impl DescriptorSet {
    /// Create an empty descriptor set
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
        }
    }

    /// Bind a sampler by name
    pub fn bind_sampler(&mut self, name: &str, sampler: SamplerId) {
        self.bind_hashed(descriptor_name_hash(name), DescriptorResource::Sampler(sampler));
    }

    /// Bind a texture by name
    pub fn bind_texture(&mut self, name: &str, texture: TextureId) {
        self.bind_hashed(descriptor_name_hash(name), DescriptorResource::Texture(texture));
    }

    /// Bind a texture array by name
    pub fn bind_texture_array(&mut self, name: &str, array: TextureArrayId) {
        self.bind_hashed(
            descriptor_name_hash(name),
            DescriptorResource::TextureArray(array),
        );
    }

    /// Bind a storage image by name
    pub fn bind_image(&mut self, name: &str, image: ImageId) {
        self.bind_hashed(descriptor_name_hash(name), DescriptorResource::Image(image));
    }

    /// Bind a uniform/storage buffer by name
    pub fn bind_buffer(&mut self, name: &str, buffer: BufferId) {
        self.bind_hashed(descriptor_name_hash(name), DescriptorResource::Buffer(buffer));
    }

    /// Bind a resource by precomputed name hash
    ///
    /// Overwrites an existing same-hash entry in place, otherwise appends.
    pub fn bind_hashed(&mut self, name_hash: u32, resource: DescriptorResource) {
        if let Some(existing) = self
            .descriptors
            .iter_mut()
            .find(|d| d.name_hash == name_hash)
        {
            existing.resource = resource;
        } else {
            self.descriptors.push(Descriptor { name_hash, resource });
        }
    }

    /// The accumulated bindings, in bind order
    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether no bindings have been made
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Remove all bindings
    pub fn clear(&mut self) {
        self.descriptors.clear();
    }
}

#[cfg(test)]
#[path = "descriptor_set_tests.rs"]
mod tests;
