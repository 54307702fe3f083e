//! Resource handlers
//!
//! One handler per resource kind, each owning a generational slot map of
//! backend objects. `RenderResources` bundles them and runs the per-frame
//! lifetime tick for delayed-destruction resources.

pub mod buffer;
pub mod image;
pub mod model;
pub mod sampler;
pub mod semaphore;
pub mod shader;
pub mod texture;

pub use buffer::BufferHandler;
pub use image::ImageHandler;
pub use model::{Model, ModelHandler};
pub use sampler::SamplerHandler;
pub use semaphore::SemaphoreHandler;
pub use shader::ShaderHandler;
pub use texture::TextureHandler;

/// All resource handlers of one renderer
#[derive(Default)]
pub struct RenderResources {
    pub buffers: BufferHandler,
    pub images: ImageHandler,
    pub textures: TextureHandler,
    pub models: ModelHandler,
    pub shaders: ShaderHandler,
    pub samplers: SamplerHandler,
    pub semaphores: SemaphoreHandler,
}

impl RenderResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame-start tick: age every delayed-destruction resource
    pub fn begin_frame(&mut self) {
        self.buffers.begin_frame();
        self.images.begin_frame();
    }
}
