/*!
# Pulsar Renderer

Backend-agnostic renderer core for a real-time game client.

Game/UI code describes rendering work declaratively — resources, passes,
draws — while an explicit low-overhead GPU API (Vulkan) executes underneath.
The core provides:

- **CommandList**: deferred command recording, replayed exactly once in
  order through the backend seam
- **RenderGraph**: per-frame pass registration with transient resource
  tracking and token resolution
- **DescriptorSet**: name-hash based resource binding, resolved against
  shader reflection at use time
- **PipelineCache**: content-hash deduplicated pipeline objects
- **Resource handlers**: typed generational IDs, delayed-destruction
  temporary buffers, per-frame-in-flight resource rings

Backend implementations (see `pulsar_renderer_vulkan`) implement the
`backend::GpuBackend` trait; `backend::null::NullBackend` replays commands
without a GPU for tests and headless runs.
*/

// Internal modules
pub mod backend;
pub mod command;
pub mod descriptor_set;
pub mod error;
pub mod frame_resource;
pub mod graph;
pub mod handle;
pub mod log;
pub mod pipeline;
pub mod renderer;
pub mod resources;

// Main pulsar namespace module
pub mod pulsar {
    // Error types
    pub use crate::error::{Error, Result};

    // Renderer facade
    pub use crate::renderer::{RenderContext, Renderer, RendererConfig, RendererStats};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Command recording
    pub use crate::command::{Command, CommandList, CommandListPool, PipelineHandle};

    // Render graph
    pub use crate::graph::{
        GraphBuilder, GraphResource, GraphResources, GraphToken, ReadToken, RenderGraph,
        WriteToken,
    };

    // Descriptor sets
    pub use crate::descriptor_set::{
        descriptor_name_hash, Descriptor, DescriptorResource, DescriptorSet,
    };

    // Typed resource IDs
    pub use crate::handle::*;

    // Per-frame resources
    pub use crate::frame_resource::{FrameResource, FRAMES_IN_FLIGHT};

    // Backend seam and vocabulary
    pub use crate::backend::types::*;
    pub use crate::backend::{GpuBackend, GpuBuffer, GpuImage, GpuPipeline, GpuSampler,
        GpuSemaphore, GpuShader, GpuTexture};

    // Pipelines
    pub use crate::pipeline::state::*;
    pub use crate::pipeline::PipelineCache;

    // Resource handlers
    pub use crate::resources::*;
}

// Re-export math library at crate root
pub use glam;
