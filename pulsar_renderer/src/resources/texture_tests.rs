/// Tests for the texture handler

use super::*;
use crate::backend::null::NullBackend;
use crate::backend::types::{PixelFormat, TextureData, TextureDesc, TextureLayerData};

fn texture_desc(layers: u32) -> TextureDesc {
    TextureDesc {
        width: 64,
        height: 64,
        format: PixelFormat::R8G8B8A8_SRGB,
        array_layers: layers,
        mip_levels: 1,
        data: None,
    }
}

#[test]
fn test_create_simple_texture() {
    let mut backend = NullBackend::new();
    let mut handler = TextureHandler::new();

    let id = handler.create_texture(&mut backend, &texture_desc(1)).unwrap();
    let info = handler.texture_info(id).unwrap();
    assert_eq!(info.array_layers, 1);
    assert!(!info.is_array());
}

#[test]
fn test_create_texture_rejects_arrays() {
    let mut backend = NullBackend::new();
    let mut handler = TextureHandler::new();

    assert!(handler.create_texture(&mut backend, &texture_desc(4)).is_err());
}

#[test]
fn test_create_texture_array() {
    let mut backend = NullBackend::new();
    let mut handler = TextureHandler::new();

    let id = handler
        .create_texture_array(&mut backend, &texture_desc(6))
        .unwrap();
    let info = handler.texture_array_info(id).unwrap();
    assert_eq!(info.array_layers, 6);
    assert!(info.is_array());
}

#[test]
fn test_create_texture_array_rejects_single_layer() {
    let mut backend = NullBackend::new();
    let mut handler = TextureHandler::new();

    assert!(handler
        .create_texture_array(&mut backend, &texture_desc(1))
        .is_err());
}

#[test]
fn test_texture_with_initial_data() {
    let mut backend = NullBackend::new();
    let mut handler = TextureHandler::new();

    let mut desc = texture_desc(1);
    desc.data = Some(TextureData::Single(vec![0xFF; 64 * 64 * 4]));
    assert!(handler.create_texture(&mut backend, &desc).is_ok());
}

#[test]
fn test_texture_array_with_partial_layer_data() {
    let mut backend = NullBackend::new();
    let mut handler = TextureHandler::new();

    let mut desc = texture_desc(4);
    desc.data = Some(TextureData::Layers(vec![TextureLayerData {
        layer: 2,
        data: vec![0x80; 64 * 64 * 4],
    }]));
    assert!(handler.create_texture_array(&mut backend, &desc).is_ok());
}

#[test]
fn test_destroy_recycles_texture_id() {
    let mut backend = NullBackend::new();
    let mut handler = TextureHandler::new();

    let id = handler.create_texture(&mut backend, &texture_desc(1)).unwrap();
    assert!(handler.destroy_texture(id));
    assert!(handler.get_texture(id).is_err());

    let next = handler.create_texture(&mut backend, &texture_desc(1)).unwrap();
    assert_ne!(id, next);
}

#[test]
fn test_texture_and_array_ids_are_independent() {
    let mut backend = NullBackend::new();
    let mut handler = TextureHandler::new();

    let tex = handler.create_texture(&mut backend, &texture_desc(1)).unwrap();
    let arr = handler
        .create_texture_array(&mut backend, &texture_desc(2))
        .unwrap();

    handler.destroy_texture(tex);
    assert!(handler.contains_texture_array(arr));
    assert_eq!(handler.len(), 1);
}
