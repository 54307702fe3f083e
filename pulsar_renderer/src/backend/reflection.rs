//! Shader reflection data
//!
//! Backends parse compiled shader bytecode at shader-creation time and
//! surface the result in this backend-agnostic form. The pipeline layer
//! resolves name-based descriptor sets against these bindings, so call
//! sites never hard-code set/binding numbers.

use bitflags::bitflags;

use crate::descriptor_set::descriptor_name_hash;
use crate::error::Result;
use crate::engine_bail;

bitflags! {
    /// Shader stage visibility flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX   = 1 << 0;
        const FRAGMENT = 1 << 1;
        const COMPUTE  = 1 << 2;
    }
}

/// Type of resource at a reflected binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingType {
    /// Uniform buffer (read-only structured data)
    UniformBuffer,
    /// Storage buffer (read/write)
    StorageBuffer,
    /// Combined image sampler (texture + sampler in one binding)
    CombinedImageSampler,
    /// Sampled image without sampler
    SampledImage,
    /// Storage image (read/write in compute)
    StorageImage,
    /// Standalone sampler
    Sampler,
}

/// One descriptor binding reflected from shader bytecode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedBinding {
    /// Variable name as declared in the shader
    pub name: String,
    /// 32-bit hash of `name`, precomputed for resolution
    pub name_hash: u32,
    /// Descriptor set index
    pub set: u32,
    /// Binding index within the set
    pub binding: u32,
    /// Resource type at this binding
    pub binding_type: BindingType,
    /// Number of descriptors (>1 for arrays)
    pub count: u32,
    /// Stages that access this binding
    pub stage_flags: ShaderStageFlags,
}

impl ReflectedBinding {
    /// Build a binding, hashing the name
    pub fn new(
        name: impl Into<String>,
        set: u32,
        binding: u32,
        binding_type: BindingType,
        count: u32,
        stage_flags: ShaderStageFlags,
    ) -> Self {
        let name = name.into();
        let name_hash = descriptor_name_hash(&name);
        Self {
            name,
            name_hash,
            set,
            binding,
            binding_type,
            count,
            stage_flags,
        }
    }
}

/// A push constant block reflected from shader bytecode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedPushConstant {
    /// Block name as declared in the shader
    pub name: String,
    /// Stages that access the block
    pub stage_flags: ShaderStageFlags,
    /// Block size in bytes (None when the compiler omitted it)
    pub size: Option<u32>,
}

/// Complete reflection data for a shader program
///
/// For graphics programs this is already merged across the vertex and
/// fragment stages; for compute programs it covers the single stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderReflection {
    /// Descriptor bindings, in reflection order
    pub bindings: Vec<ReflectedBinding>,
    /// Push constant blocks
    pub push_constants: Vec<ReflectedPushConstant>,
}

impl ShaderReflection {
    /// Reflection with no bindings at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge reflection data from two shader stages of one program
    ///
    /// The same set+binding appearing in both stages must agree on its type;
    /// stage flags are OR-ed together. Distinct bindings are concatenated.
    pub fn merge(a: &ShaderReflection, b: &ShaderReflection) -> Result<ShaderReflection> {
        let mut bindings: Vec<ReflectedBinding> = a.bindings.clone();

        for other in &b.bindings {
            if let Some(existing) = bindings
                .iter_mut()
                .find(|x| x.set == other.set && x.binding == other.binding)
            {
                if existing.binding_type != other.binding_type {
                    engine_bail!(
                        "pulsar::reflection",
                        "Binding '{}' (set={}, binding={}) has conflicting types across stages: {:?} vs {:?}",
                        existing.name,
                        existing.set,
                        existing.binding,
                        existing.binding_type,
                        other.binding_type
                    );
                }
                existing.stage_flags |= other.stage_flags;
            } else {
                bindings.push(other.clone());
            }
        }

        let mut push_constants: Vec<ReflectedPushConstant> = a.push_constants.clone();
        for other in &b.push_constants {
            if let Some(existing) = push_constants.iter_mut().find(|p| p.name == other.name) {
                // Same push constant block in both stages: merge stage flags
                existing.stage_flags |= other.stage_flags;
            } else {
                push_constants.push(other.clone());
            }
        }

        Ok(ShaderReflection {
            bindings,
            push_constants,
        })
    }

    /// Find a binding by precomputed name hash
    pub fn find_by_name_hash(&self, name_hash: u32) -> impl Iterator<Item = &ReflectedBinding> {
        self.bindings.iter().filter(move |b| b.name_hash == name_hash)
    }
}

#[cfg(test)]
#[path = "reflection_tests.rs"]
mod tests;
