/// Tests for the renderer facade

use super::*;
use crate::backend::null::NullBackend;
use crate::backend::types::{BufferDesc, BufferUsage, ImageDesc, ImageUsage, PixelFormat};

fn renderer() -> (Renderer, crate::backend::null::CallLog) {
    let backend = NullBackend::new();
    let log = backend.call_log();
    (
        Renderer::new(Box::new(backend), RendererConfig::default()),
        log,
    )
}

#[test]
fn test_begin_frame_advances_index_and_waits() {
    let (mut r, log) = renderer();
    assert_eq!(r.frame_index(), 0);

    r.begin_frame().unwrap();
    r.begin_frame().unwrap();
    assert_eq!(r.frame_index(), 2);

    let calls = log.lock().unwrap().clone();
    assert_eq!(calls, vec!["begin_frame:1", "begin_frame:2"]);
}

#[test]
fn test_begin_frame_ticks_temporary_lifetimes() {
    let (mut r, _log) = renderer();

    let temp = r
        .create_temporary_buffer(
            &BufferDesc {
                size: 64,
                usage: BufferUsage::STORAGE,
            },
            1,
        )
        .unwrap();

    r.begin_frame().unwrap();
    assert!(r.resources.buffers.contains(temp));

    r.begin_frame().unwrap();
    assert!(!r.resources.buffers.contains(temp));
}

#[test]
fn test_default_config() {
    let config = RendererConfig::default();
    assert_eq!(config.app_name, "Pulsar Application");
    assert_eq!(config.app_version, (1, 0, 0));
}

#[test]
fn test_stats_reset_each_frame() {
    let (mut r, _log) = renderer();
    r.begin_frame().unwrap();
    assert_eq!(r.stats().draw_calls, 0);
    assert_eq!(r.stats().dispatches, 0);
}

#[test]
fn test_frame_output_validates_image() {
    let (mut r, _log) = renderer();

    let image = r
        .create_image(&ImageDesc {
            width: 64,
            height: 64,
            format: PixelFormat::B8G8R8A8_UNORM,
            usage: ImageUsage::RENDER_TARGET | ImageUsage::TRANSFER_SRC,
        })
        .unwrap();

    let output = r.frame_output(image, None).unwrap();
    assert_eq!(output.image, image);
    assert!(output.wait_semaphore.is_none());

    // A stale image is rejected
    r.resources.images.destroy_image(image);
    assert!(r.frame_output(image, None).is_err());
}

#[test]
fn test_frame_output_carries_present_semaphore() {
    let (mut r, _log) = renderer();

    let semaphore = r.create_present_semaphore().unwrap();
    let image = r
        .create_image(&ImageDesc {
            width: 64,
            height: 64,
            format: PixelFormat::B8G8R8A8_UNORM,
            usage: ImageUsage::RENDER_TARGET,
        })
        .unwrap();

    let output = r.frame_output(image, None).unwrap();
    assert_eq!(output.wait_semaphore, Some(semaphore));
}

#[test]
fn test_wait_idle_reaches_backend() {
    let (r, log) = renderer();
    r.wait_idle().unwrap();
    assert!(log.lock().unwrap().iter().any(|c| c == "wait_idle"));
}
