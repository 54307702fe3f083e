//! Image handler
//!
//! Owns color/storage images and depth images under separate ID kinds.
//! Transient images allocated by the render graph builder use the same
//! delayed-destruction mechanism as temporary buffers, with a lifetime of
//! `FRAMES_IN_FLIGHT` frame-start ticks.

use slotmap::SlotMap;

use crate::backend::types::{ImageDesc, ImageInfo};
use crate::backend::{GpuBackend, GpuImage};
use crate::engine_bail;
use crate::error::{Error, Result};
use crate::frame_resource::FRAMES_IN_FLIGHT;
use crate::handle::{DepthImageId, ImageId};

struct ImageEntry {
    gpu: Box<dyn GpuImage>,
}

struct TransientImage {
    id: ImageId,
    frames_remaining: u32,
}

struct TransientDepthImage {
    id: DepthImageId,
    frames_remaining: u32,
}

/// Handler owning all color and depth images
#[derive(Default)]
pub struct ImageHandler {
    images: SlotMap<ImageId, ImageEntry>,
    depth_images: SlotMap<DepthImageId, ImageEntry>,
    transient_images: Vec<TransientImage>,
    transient_depth_images: Vec<TransientDepthImage>,
}

impl ImageHandler {
    pub fn new() -> Self {
        Self {
            images: SlotMap::with_key(),
            depth_images: SlotMap::with_key(),
            transient_images: Vec::new(),
            transient_depth_images: Vec::new(),
        }
    }

    /// Create a color/storage image
    pub fn create_image(
        &mut self,
        backend: &mut dyn GpuBackend,
        desc: &ImageDesc,
    ) -> Result<ImageId> {
        if desc.format.is_depth() {
            engine_bail!(
                "pulsar::ImageHandler",
                "create_image called with depth format {:?}; use create_depth_image",
                desc.format
            );
        }
        let gpu = backend.create_image(desc)?;
        Ok(self.images.insert(ImageEntry { gpu }))
    }

    /// Create a depth/stencil image
    pub fn create_depth_image(
        &mut self,
        backend: &mut dyn GpuBackend,
        desc: &ImageDesc,
    ) -> Result<DepthImageId> {
        if !desc.format.is_depth() {
            engine_bail!(
                "pulsar::ImageHandler",
                "create_depth_image called with color format {:?}; use create_image",
                desc.format
            );
        }
        let gpu = backend.create_image(desc)?;
        Ok(self.depth_images.insert(ImageEntry { gpu }))
    }

    /// Create a transient color image for the current frame
    ///
    /// Destroyed automatically after `FRAMES_IN_FLIGHT` frame-start ticks.
    pub fn create_transient_image(
        &mut self,
        backend: &mut dyn GpuBackend,
        desc: &ImageDesc,
    ) -> Result<ImageId> {
        let id = self.create_image(backend, desc)?;
        self.transient_images.push(TransientImage {
            id,
            frames_remaining: FRAMES_IN_FLIGHT as u32,
        });
        Ok(id)
    }

    /// Create a transient depth image for the current frame
    pub fn create_transient_depth_image(
        &mut self,
        backend: &mut dyn GpuBackend,
        desc: &ImageDesc,
    ) -> Result<DepthImageId> {
        let id = self.create_depth_image(backend, desc)?;
        self.transient_depth_images.push(TransientDepthImage {
            id,
            frames_remaining: FRAMES_IN_FLIGHT as u32,
        });
        Ok(id)
    }

    /// Destroy a color image and recycle its ID
    pub fn destroy_image(&mut self, id: ImageId) -> bool {
        self.transient_images.retain(|t| t.id != id);
        self.images.remove(id).is_some()
    }

    /// Destroy a depth image and recycle its ID
    pub fn destroy_depth_image(&mut self, id: DepthImageId) -> bool {
        self.transient_depth_images.retain(|t| t.id != id);
        self.depth_images.remove(id).is_some()
    }

    /// Resolve a color image ID
    pub fn get_image(&self, id: ImageId) -> Result<&dyn GpuImage> {
        self.images
            .get(id)
            .map(|entry| entry.gpu.as_ref())
            .ok_or_else(|| Error::InvalidResource(format!("stale or invalid image id {:?}", id)))
    }

    /// Resolve a depth image ID
    pub fn get_depth_image(&self, id: DepthImageId) -> Result<&dyn GpuImage> {
        self.depth_images
            .get(id)
            .map(|entry| entry.gpu.as_ref())
            .ok_or_else(|| {
                Error::InvalidResource(format!("stale or invalid depth image id {:?}", id))
            })
    }

    /// Properties of a color image
    pub fn image_info(&self, id: ImageId) -> Result<&ImageInfo> {
        self.get_image(id).map(|gpu| gpu.info())
    }

    /// Properties of a depth image
    pub fn depth_image_info(&self, id: DepthImageId) -> Result<&ImageInfo> {
        self.get_depth_image(id).map(|gpu| gpu.info())
    }

    pub fn contains_image(&self, id: ImageId) -> bool {
        self.images.contains_key(id)
    }

    pub fn contains_depth_image(&self, id: DepthImageId) -> bool {
        self.depth_images.contains_key(id)
    }

    /// Number of live images (color + depth)
    pub fn len(&self) -> usize {
        self.images.len() + self.depth_images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.depth_images.is_empty()
    }

    /// Frame-start tick: age transient images, destroying the expired ones
    pub fn begin_frame(&mut self) {
        let mut expired_images = Vec::new();
        for t in &mut self.transient_images {
            if t.frames_remaining == 0 {
                expired_images.push(t.id);
            } else {
                t.frames_remaining -= 1;
            }
        }
        self.transient_images.retain(|t| !expired_images.contains(&t.id));
        for id in expired_images {
            self.images.remove(id);
        }

        let mut expired_depth = Vec::new();
        for t in &mut self.transient_depth_images {
            if t.frames_remaining == 0 {
                expired_depth.push(t.id);
            } else {
                t.frames_remaining -= 1;
            }
        }
        self.transient_depth_images.retain(|t| !expired_depth.contains(&t.id));
        for id in expired_depth {
            self.depth_images.remove(id);
        }
    }
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;
