/// Tests for the shader handler

use super::*;
use crate::backend::null::NullBackend;
use crate::backend::reflection::{BindingType, ReflectedBinding, ShaderReflection, ShaderStageFlags};
use crate::backend::types::{ComputeShaderDesc, GraphicsShaderDesc};

fn graphics_desc() -> GraphicsShaderDesc {
    GraphicsShaderDesc {
        vertex_path: "shaders/forward.vert.spv".to_string(),
        fragment_path: "shaders/forward.frag.spv".to_string(),
    }
}

#[test]
fn test_load_graphics_shader() {
    let mut backend = NullBackend::new();
    let mut handler = ShaderHandler::new();

    let id = handler.load_graphics(&mut backend, &graphics_desc()).unwrap();
    assert!(handler.get_graphics(id).is_ok());
    assert_eq!(handler.len(), 1);
}

#[test]
fn test_same_paths_load_once() {
    let mut backend = NullBackend::new();
    let log = backend.call_log();
    let mut handler = ShaderHandler::new();

    let first = handler.load_graphics(&mut backend, &graphics_desc()).unwrap();
    let second = handler.load_graphics(&mut backend, &graphics_desc()).unwrap();

    assert_eq!(first, second);
    let creates = log
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c.starts_with("create_graphics_shader"))
        .count();
    assert_eq!(creates, 1);
}

#[test]
fn test_different_paths_load_separately() {
    let mut backend = NullBackend::new();
    let mut handler = ShaderHandler::new();

    let first = handler.load_graphics(&mut backend, &graphics_desc()).unwrap();
    let second = handler
        .load_graphics(
            &mut backend,
            &GraphicsShaderDesc {
                vertex_path: "shaders/depth_only.vert.spv".to_string(),
                fragment_path: "shaders/depth_only.frag.spv".to_string(),
            },
        )
        .unwrap();

    assert_ne!(first, second);
    assert_eq!(handler.len(), 2);
}

#[test]
fn test_reflection_comes_from_backend() {
    let mut backend = NullBackend::new();
    backend.set_shader_reflection(
        "shaders/forward.vert.spv",
        ShaderReflection {
            bindings: vec![ReflectedBinding::new(
                "u_globals",
                0,
                0,
                BindingType::UniformBuffer,
                1,
                ShaderStageFlags::VERTEX,
            )],
            push_constants: vec![],
        },
    );

    let mut handler = ShaderHandler::new();
    let id = handler.load_graphics(&mut backend, &graphics_desc()).unwrap();

    let reflection = handler.graphics_reflection(id).unwrap();
    assert_eq!(reflection.bindings.len(), 1);
    assert_eq!(reflection.bindings[0].name, "u_globals");
}

#[test]
fn test_load_compute_shader() {
    let mut backend = NullBackend::new();
    let mut handler = ShaderHandler::new();

    let desc = ComputeShaderDesc {
        path: "shaders/radix_count.comp.spv".to_string(),
    };
    let id = handler.load_compute(&mut backend, &desc).unwrap();
    assert!(handler.compute_reflection(id).is_ok());

    // Dedup by path
    let again = handler.load_compute(&mut backend, &desc).unwrap();
    assert_eq!(id, again);
}

#[test]
fn test_destroy_allows_reload() {
    let mut backend = NullBackend::new();
    let mut handler = ShaderHandler::new();

    let id = handler.load_graphics(&mut backend, &graphics_desc()).unwrap();
    assert!(handler.destroy_graphics(id));
    assert!(handler.get_graphics(id).is_err());

    // The path mapping was dropped with the program
    let reloaded = handler.load_graphics(&mut backend, &graphics_desc()).unwrap();
    assert_ne!(id, reloaded);
    assert!(handler.get_graphics(reloaded).is_ok());
}
