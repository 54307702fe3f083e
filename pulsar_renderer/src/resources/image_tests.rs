/// Tests for the image handler

use super::*;
use crate::backend::null::NullBackend;
use crate::backend::types::{ImageDesc, ImageUsage, PixelFormat};

fn color_desc() -> ImageDesc {
    ImageDesc {
        width: 320,
        height: 180,
        format: PixelFormat::R8G8B8A8_UNORM,
        usage: ImageUsage::RENDER_TARGET | ImageUsage::SAMPLED,
    }
}

fn depth_desc() -> ImageDesc {
    ImageDesc {
        width: 320,
        height: 180,
        format: PixelFormat::D32_FLOAT,
        usage: ImageUsage::DEPTH_STENCIL,
    }
}

#[test]
fn test_create_color_image() {
    let mut backend = NullBackend::new();
    let mut handler = ImageHandler::new();

    let id = handler.create_image(&mut backend, &color_desc()).unwrap();
    let info = handler.image_info(id).unwrap();
    assert_eq!((info.width, info.height), (320, 180));
}

#[test]
fn test_create_depth_image() {
    let mut backend = NullBackend::new();
    let mut handler = ImageHandler::new();

    let id = handler.create_depth_image(&mut backend, &depth_desc()).unwrap();
    assert!(handler.contains_depth_image(id));
}

#[test]
fn test_create_image_rejects_depth_format() {
    let mut backend = NullBackend::new();
    let mut handler = ImageHandler::new();

    assert!(handler.create_image(&mut backend, &depth_desc()).is_err());
    assert!(handler.is_empty());
}

#[test]
fn test_create_depth_image_rejects_color_format() {
    let mut backend = NullBackend::new();
    let mut handler = ImageHandler::new();

    assert!(handler.create_depth_image(&mut backend, &color_desc()).is_err());
}

#[test]
fn test_destroy_recycles_image_id() {
    let mut backend = NullBackend::new();
    let mut handler = ImageHandler::new();

    let id = handler.create_image(&mut backend, &color_desc()).unwrap();
    assert!(handler.destroy_image(id));
    assert!(handler.get_image(id).is_err());

    let next = handler.create_image(&mut backend, &color_desc()).unwrap();
    assert_ne!(id, next);
    assert!(handler.get_image(id).is_err());
}

#[test]
fn test_transient_image_expires_after_frames_in_flight() {
    let mut backend = NullBackend::new();
    let mut handler = ImageHandler::new();

    let id = handler
        .create_transient_image(&mut backend, &color_desc())
        .unwrap();

    for _ in 0..crate::frame_resource::FRAMES_IN_FLIGHT {
        handler.begin_frame();
        assert!(handler.contains_image(id));
    }

    handler.begin_frame();
    assert!(!handler.contains_image(id));
}

#[test]
fn test_transient_depth_image_expires() {
    let mut backend = NullBackend::new();
    let mut handler = ImageHandler::new();

    let id = handler
        .create_transient_depth_image(&mut backend, &depth_desc())
        .unwrap();

    for _ in 0..crate::frame_resource::FRAMES_IN_FLIGHT {
        handler.begin_frame();
    }
    handler.begin_frame();
    assert!(!handler.contains_depth_image(id));
}

#[test]
fn test_non_transient_images_survive_ticks() {
    let mut backend = NullBackend::new();
    let mut handler = ImageHandler::new();

    let id = handler.create_image(&mut backend, &color_desc()).unwrap();
    for _ in 0..10 {
        handler.begin_frame();
    }
    assert!(handler.contains_image(id));
}
