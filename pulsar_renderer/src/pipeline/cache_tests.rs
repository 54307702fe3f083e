/// Tests for the pipeline cache

use super::*;
use crate::backend::null::NullBackend;
use crate::backend::types::{GraphicsShaderDesc, ComputeShaderDesc, ImageDesc, ImageUsage, LoadMode, PixelFormat};
use crate::resources::RenderResources;
use crate::pipeline::state::{
    ColorBlendState, ColorTargetBinding, DepthStencilState, GraphicsPipelineDesc,
    MultisampleState, PrimitiveTopology, RasterizationState, VertexLayout,
};

struct Fixture {
    backend: NullBackend,
    resources: RenderResources,
    cache: PipelineCache,
    desc: GraphicsPipelineDesc,
}

fn fixture() -> Fixture {
    let mut backend = NullBackend::new();
    let mut resources = RenderResources::new();

    let shader = resources
        .shaders
        .load_graphics(
            &mut backend,
            &GraphicsShaderDesc {
                vertex_path: "shaders/forward.vert.spv".to_string(),
                fragment_path: "shaders/forward.frag.spv".to_string(),
            },
        )
        .unwrap();

    let image = resources
        .images
        .create_image(
            &mut backend,
            &ImageDesc {
                width: 640,
                height: 360,
                format: PixelFormat::R8G8B8A8_UNORM,
                usage: ImageUsage::RENDER_TARGET,
            },
        )
        .unwrap();

    let desc = GraphicsPipelineDesc {
        shader,
        vertex_layout: VertexLayout::default(),
        topology: PrimitiveTopology::TriangleList,
        rasterization: RasterizationState::default(),
        depth_stencil: DepthStencilState::default(),
        color_blend: ColorBlendState::default(),
        multisample: MultisampleState::default(),
        color_targets: vec![ColorTargetBinding {
            image,
            load: LoadMode::Clear,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }],
        depth_target: None,
    };

    Fixture {
        backend,
        resources,
        cache: PipelineCache::new(),
        desc,
    }
}

fn count_backend_pipelines(log: &crate::backend::null::CallLog) -> usize {
    log.lock()
        .unwrap()
        .iter()
        .filter(|c| c.starts_with("create_graphics_pipeline"))
        .count()
}

#[test]
fn test_create_builds_pipeline_on_miss() {
    let mut f = fixture();
    let log = f.backend.call_log();

    let id = f
        .cache
        .create_graphics(&mut f.backend, &f.resources, &f.desc)
        .unwrap();

    assert!(f.cache.graphics_pipeline(id).is_ok());
    assert_eq!(count_backend_pipelines(&log), 1);
    assert_eq!(f.cache.len(), 1);
}

#[test]
fn test_identical_descriptions_return_same_id() {
    let mut f = fixture();
    let log = f.backend.call_log();

    let first = f
        .cache
        .create_graphics(&mut f.backend, &f.resources, &f.desc)
        .unwrap();
    let second = f
        .cache
        .create_graphics(&mut f.backend, &f.resources, &f.desc.clone())
        .unwrap();

    // Same ID, exactly one backend pipeline object
    assert_eq!(first, second);
    assert_eq!(count_backend_pipelines(&log), 1);
    assert_eq!(f.cache.len(), 1);
}

#[test]
fn test_create_is_cheap_to_call_every_frame() {
    let mut f = fixture();
    let log = f.backend.call_log();

    let first = f
        .cache
        .create_graphics(&mut f.backend, &f.resources, &f.desc)
        .unwrap();
    for _ in 0..100 {
        let id = f
            .cache
            .create_graphics(&mut f.backend, &f.resources, &f.desc)
            .unwrap();
        assert_eq!(id, first);
    }
    assert_eq!(count_backend_pipelines(&log), 1);
}

#[test]
fn test_different_state_creates_new_pipeline() {
    let mut f = fixture();

    let first = f
        .cache
        .create_graphics(&mut f.backend, &f.resources, &f.desc)
        .unwrap();

    let mut wireframe = f.desc.clone();
    wireframe.rasterization.polygon_mode = crate::pipeline::state::PolygonMode::Line;
    let second = f
        .cache
        .create_graphics(&mut f.backend, &f.resources, &wireframe)
        .unwrap();

    assert_ne!(first, second);
    assert_eq!(f.cache.len(), 2);
}

#[test]
fn test_missing_render_target_fails_creation() {
    let mut f = fixture();

    let mut broken = f.desc.clone();
    broken.color_targets[0].image = crate::handle::ImageId::default();
    assert!(f
        .cache
        .create_graphics(&mut f.backend, &f.resources, &broken)
        .is_err());
    assert!(f.cache.is_empty());
}

#[test]
fn test_missing_shader_fails_creation() {
    let mut f = fixture();

    let mut broken = f.desc.clone();
    broken.shader = crate::handle::GraphicsShaderId::default();
    assert!(f
        .cache
        .create_graphics(&mut f.backend, &f.resources, &broken)
        .is_err());
}

#[test]
fn test_compute_pipeline_dedup() {
    let mut f = fixture();
    let log = f.backend.call_log();

    let shader = f
        .resources
        .shaders
        .load_compute(
            &mut f.backend,
            &ComputeShaderDesc {
                path: "shaders/cull.comp.spv".to_string(),
            },
        )
        .unwrap();

    let desc = crate::pipeline::state::ComputePipelineDesc { shader };
    let first = f
        .cache
        .create_compute(&mut f.backend, &f.resources, &desc)
        .unwrap();
    let second = f
        .cache
        .create_compute(&mut f.backend, &f.resources, &desc)
        .unwrap();

    assert_eq!(first, second);
    let creates = log
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c.as_str() == "create_compute_pipeline")
        .count();
    assert_eq!(creates, 1);
}

#[test]
fn test_pipeline_reflection_follows_shader() {
    use crate::backend::reflection::{BindingType, ReflectedBinding, ShaderReflection, ShaderStageFlags};

    let mut backend = NullBackend::new();
    backend.set_shader_reflection(
        "shaders/lit.vert.spv",
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

    let mut resources = RenderResources::new();
    let shader = resources
        .shaders
        .load_graphics(
            &mut backend,
            &GraphicsShaderDesc {
                vertex_path: "shaders/lit.vert.spv".to_string(),
                fragment_path: "shaders/lit.frag.spv".to_string(),
            },
        )
        .unwrap();
    let image = resources
        .images
        .create_image(
            &mut backend,
            &ImageDesc {
                width: 64,
                height: 64,
                format: PixelFormat::R8G8B8A8_UNORM,
                usage: ImageUsage::RENDER_TARGET,
            },
        )
        .unwrap();

    let mut cache = PipelineCache::new();
    let id = cache
        .create_graphics(
            &mut backend,
            &resources,
            &GraphicsPipelineDesc {
                shader,
                vertex_layout: VertexLayout::default(),
                topology: PrimitiveTopology::TriangleList,
                rasterization: RasterizationState::default(),
                depth_stencil: DepthStencilState::default(),
                color_blend: ColorBlendState::default(),
                multisample: MultisampleState::default(),
                color_targets: vec![ColorTargetBinding {
                    image,
                    load: LoadMode::Clear,
                    clear_color: [0.0; 4],
                }],
                depth_target: None,
            },
        )
        .unwrap();

    let reflection = cache.graphics_reflection(id).unwrap();
    assert_eq!(reflection.bindings.len(), 1);
    assert_eq!(reflection.bindings[0].name, "u_globals");
}
