//! Reflection-driven descriptor resolution
//!
//! Turns the name-hash bindings accumulated in a `DescriptorSet` into
//! concrete (set, binding) assignments by matching against a pipeline's
//! reflected bindings. A name the pipeline never declares is logged and
//! skipped — the same descriptor set is commonly bound to many pipelines,
//! each consuming a subset. A name reflected at inconsistent set indices
//! is a content error.

use crate::backend::reflection::{BindingType, ShaderReflection};
use crate::backend::types::DescriptorSlot;
use crate::backend::{ResolvedDescriptor, ResolvedResource};
use crate::descriptor_set::{Descriptor, DescriptorResource};
use crate::error::Result;
use crate::resources::RenderResources;
use crate::{engine_bail, engine_debug, engine_warn};

/// A descriptor resolved to its concrete set/binding, still at ID level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedBindingIds {
    /// Binding index within the slot's set
    pub binding: u32,
    /// Resource type the shader expects
    pub binding_type: BindingType,
    /// Descriptor count (>1 for arrays)
    pub count: u32,
    /// The bound resource
    pub resource: DescriptorResource,
}

/// Whether a bound resource kind can feed a reflected binding type
fn kinds_compatible(resource: &DescriptorResource, binding_type: BindingType) -> bool {
    match resource {
        DescriptorResource::Buffer(_) => matches!(
            binding_type,
            BindingType::UniformBuffer | BindingType::StorageBuffer
        ),
        DescriptorResource::Texture(_) | DescriptorResource::TextureArray(_) => matches!(
            binding_type,
            BindingType::CombinedImageSampler | BindingType::SampledImage
        ),
        DescriptorResource::Image(_) => matches!(binding_type, BindingType::StorageImage),
        DescriptorResource::Sampler(_) => matches!(binding_type, BindingType::Sampler),
    }
}

/// Resolve a descriptor set's accumulated bindings against a pipeline's
/// reflection, for the set index implied by `slot`
///
/// Returns the resolvable bindings in accumulation order. Unresolved names
/// and type mismatches are skipped with a log; a name reflected at multiple
/// inconsistent set indices is an error.
pub fn resolve_descriptor_set(
    slot: DescriptorSlot,
    descriptors: &[Descriptor],
    reflection: &ShaderReflection,
) -> Result<Vec<ResolvedBindingIds>> {
    let mut resolved = Vec::with_capacity(descriptors.len());

    for descriptor in descriptors {
        let matches: Vec<_> = reflection
            .find_by_name_hash(descriptor.name_hash)
            .collect();

        if matches.is_empty() {
            // The pipeline simply does not use this name
            engine_debug!(
                "pulsar::binder",
                "descriptor name hash {:#010x} has no reflected binding; skipped",
                descriptor.name_hash
            );
            continue;
        }

        let first_set = matches[0].set;
        if matches.iter().any(|m| m.set != first_set) {
            engine_bail!(
                "pulsar::binder",
                "descriptor name '{}' reflected at inconsistent set indices ({:?})",
                matches[0].name,
                matches.iter().map(|m| m.set).collect::<Vec<_>>()
            );
        }

        if first_set != slot.index() {
            // The name lives in another slot's set; it resolves when that
            // slot is bound
            engine_debug!(
                "pulsar::binder",
                "descriptor name '{}' belongs to set {}, not slot {:?}; skipped",
                matches[0].name,
                first_set,
                slot
            );
            continue;
        }

        let binding = matches[0];
        if !kinds_compatible(&descriptor.resource, binding.binding_type) {
            engine_warn!(
                "pulsar::binder",
                "descriptor '{}' bound as {:?} but shader expects {:?}; skipped",
                binding.name,
                descriptor.resource,
                binding.binding_type
            );
            continue;
        }

        resolved.push(ResolvedBindingIds {
            binding: binding.binding,
            binding_type: binding.binding_type,
            count: binding.count,
            resource: descriptor.resource,
        });
    }

    Ok(resolved)
}

/// Attach backend objects to ID-level resolved bindings
pub fn attach_resources<'a>(
    resolved: &[ResolvedBindingIds],
    resources: &'a RenderResources,
) -> Result<Vec<ResolvedDescriptor<'a>>> {
    let mut attached = Vec::with_capacity(resolved.len());
    for binding in resolved {
        let resource = match binding.resource {
            DescriptorResource::Sampler(id) => {
                ResolvedResource::Sampler(resources.samplers.get(id)?)
            }
            DescriptorResource::Texture(id) => {
                ResolvedResource::Texture(resources.textures.get_texture(id)?)
            }
            DescriptorResource::TextureArray(id) => {
                ResolvedResource::TextureArray(resources.textures.get_texture_array(id)?)
            }
            DescriptorResource::Image(id) => {
                ResolvedResource::Image(resources.images.get_image(id)?)
            }
            DescriptorResource::Buffer(id) => {
                ResolvedResource::Buffer(resources.buffers.get(id)?)
            }
        };
        attached.push(ResolvedDescriptor {
            binding: binding.binding,
            binding_type: binding.binding_type,
            count: binding.count,
            resource,
        });
    }
    Ok(attached)
}

#[cfg(test)]
#[path = "binder_tests.rs"]
mod tests;
