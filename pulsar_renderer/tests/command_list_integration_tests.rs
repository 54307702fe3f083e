/// Command list integration tests
///
/// Exercises recording/replay through the full renderer stack (handlers,
/// pipeline cache, dispatch) against the null backend.

use pulsar_renderer::backend::null::{CallLog, NullBackend};
use pulsar_renderer::backend::reflection::{
    BindingType, ReflectedBinding, ShaderReflection, ShaderStageFlags,
};
use pulsar_renderer::pulsar::*;

struct Frame {
    renderer: Renderer,
    log: CallLog,
}

fn frame() -> Frame {
    let mut backend = NullBackend::new();
    let log = backend.call_log();
    backend.set_shader_reflection(
        "shaders/scene.vert.spv",
        ShaderReflection {
            bindings: vec![
                ReflectedBinding::new(
                    "u_globals",
                    0,
                    0,
                    BindingType::UniformBuffer,
                    1,
                    ShaderStageFlags::VERTEX,
                ),
                ReflectedBinding::new(
                    "u_object",
                    2,
                    0,
                    BindingType::UniformBuffer,
                    1,
                    ShaderStageFlags::VERTEX,
                ),
            ],
            push_constants: vec![],
        },
    );
    Frame {
        renderer: Renderer::new(Box::new(backend), RendererConfig::default()),
        log,
    }
}

fn replay_calls(log: &CallLog) -> Vec<String> {
    let calls = log.lock().unwrap().clone();
    let start = calls
        .iter()
        .position(|c| c.starts_with("begin_commands"))
        .expect("no replay happened");
    calls[start..].to_vec()
}

fn scene_pipeline(renderer: &mut Renderer) -> (GraphicsPipelineId, ImageId) {
    let image = renderer
        .create_image(&ImageDesc {
            width: 512,
            height: 512,
            format: PixelFormat::R8G8B8A8_UNORM,
            usage: ImageUsage::RENDER_TARGET,
        })
        .unwrap();
    let shader = renderer
        .load_graphics_shader(&GraphicsShaderDesc {
            vertex_path: "shaders/scene.vert.spv".to_string(),
            fragment_path: "shaders/scene.frag.spv".to_string(),
        })
        .unwrap();

    let pipeline = renderer
        .create_graphics_pipeline(&GraphicsPipelineDesc {
                shader,
                vertex_layout: VertexLayout {
                    bindings: vec![VertexBinding {
                        binding: 0,
                        stride: 32,
                        input_rate: VertexInputRate::Vertex,
                    }],
                    attributes: vec![VertexAttribute {
                        location: 0,
                        binding: 0,
                        format: VertexFormat::R32G32B32_SFLOAT,
                        offset: 0,
                    }],
                },
                topology: PrimitiveTopology::TriangleList,
                rasterization: RasterizationState::default(),
                depth_stencil: DepthStencilState::default(),
                color_blend: ColorBlendState::default(),
                multisample: MultisampleState::default(),
                color_targets: vec![ColorTargetBinding {
                    image,
                    load: LoadMode::Clear,
                    clear_color: [0.1, 0.1, 0.1, 1.0],
                }],
                depth_target: None,
            },
        )
        .unwrap();
    (pipeline, image)
}

fn execute(renderer: &mut Renderer, list: &CommandList) -> Result<()> {
    let mut ctx = renderer.render_context();
    let mut exec = pulsar_renderer::command::ExecuteContext::new(
        &mut *ctx.backend,
        &*ctx.resources,
        &*ctx.pipelines,
        ctx.frame_index,
        None,
        &mut *ctx.stats,
    );
    list.execute(&mut exec)
}

#[test]
fn test_model_draw_replays_in_order() {
    let mut f = frame();
    let (pipeline, _image) = scene_pipeline(&mut f.renderer);

    // A unit quad
    let vertex = |x: f32, y: f32| ModelVertex {
        position: glam::Vec3::new(x, y, 0.0),
        normal: glam::Vec3::Z,
        uv: glam::Vec2::new(x, y),
    };
    let model = f
        .renderer
        .create_model(&ModelDesc {
            vertices: vec![
                vertex(0.0, 0.0),
                vertex(1.0, 0.0),
                vertex(1.0, 1.0),
                vertex(0.0, 1.0),
            ],
            indices: vec![0, 1, 2, 2, 3, 0],
        })
        .unwrap();

    let model_data = *f.renderer.resources.models.get(model).unwrap();

    let mut list = CommandList::new("scene");
    list.push_marker("scene draw");
    list.begin_pipeline(pipeline).unwrap();
    list.bind_model(&model_data);
    list.draw_indexed(model_data.index_count, 1, 0, 0, 0);
    list.end_pipeline().unwrap();
    list.pop_marker().unwrap();

    execute(&mut f.renderer, &list).unwrap();

    assert_eq!(
        replay_calls(&f.log),
        [
            "begin_commands:0",
            "push_marker:scene draw",
            "begin_pipeline:graphics",
            "bind_vertex_buffer:0",
            "bind_index_buffer:0:U32",
            "draw_indexed:6:1:0:0:0",
            "end_pipeline",
            "pop_marker",
            "submit_commands:0",
        ]
    );
}

#[test]
fn test_descriptor_binding_resolves_only_matching_slot_names() {
    let mut f = frame();
    let (pipeline, _image) = scene_pipeline(&mut f.renderer);

    let globals = f
        .renderer
        .create_buffer(&BufferDesc {
            size: 256,
            usage: BufferUsage::UNIFORM,
        })
        .unwrap();

    // "u_globals" lives in set 0, "u_object" in set 2, "u_unknown" nowhere
    let mut set = DescriptorSet::new();
    set.bind_buffer("u_globals", globals);
    set.bind_buffer("u_object", globals);
    set.bind_buffer("u_unknown", globals);

    let mut list = CommandList::new("bind");
    list.begin_pipeline(pipeline).unwrap();
    list.bind_descriptor_set(DescriptorSlot::Global, &set, DescriptorLifetime::PerFrame, 0);
    list.bind_descriptor_set(DescriptorSlot::PerDraw, &set, DescriptorLifetime::PerFrame, 0);
    list.draw_bindless(3, 1, 0, 0);
    list.end_pipeline().unwrap();

    execute(&mut f.renderer, &list).unwrap();

    let calls = replay_calls(&f.log);
    // Slot 0 resolves u_globals only; slot 2 resolves u_object only
    assert!(calls.iter().any(|c| c == "bind_descriptor_set:0:1:PerFrame"));
    assert!(calls.iter().any(|c| c == "bind_descriptor_set:2:1:PerFrame"));
}

#[test]
fn test_indirect_draw_chain() {
    let mut f = frame();
    let (pipeline, _image) = scene_pipeline(&mut f.renderer);

    let args = f
        .renderer
        .create_buffer(&BufferDesc {
            size: std::mem::size_of::<DrawIndirectArgs>() as u64 * 8,
            usage: BufferUsage::STORAGE | BufferUsage::INDIRECT,
        })
        .unwrap();
    let count = f
        .renderer
        .create_buffer(&BufferDesc {
            size: 4,
            usage: BufferUsage::STORAGE | BufferUsage::INDIRECT,
        })
        .unwrap();

    let mut list = CommandList::new("indirect");
    list.pipeline_barrier(PipelineBarrierKind::ComputeWriteToIndirectRead, args);
    list.begin_pipeline(pipeline).unwrap();
    list.draw_indirect(args, 0, 8, 16);
    list.draw_indirect_count(args, 0, count, 0, 8, 16);
    list.end_pipeline().unwrap();

    execute(&mut f.renderer, &list).unwrap();

    let calls = replay_calls(&f.log);
    assert!(calls
        .iter()
        .any(|c| c == "pipeline_barrier:ComputeWriteToIndirectRead"));
    assert!(calls.iter().any(|c| c == "draw_indirect:0:8:16"));
    assert!(calls.iter().any(|c| c == "draw_indirect_count:0:0:8:16"));
    assert_eq!(f.renderer.stats().draw_calls, 2);
}

#[test]
fn test_copy_buffer_roundtrip_through_replay() {
    let mut f = frame();

    let src = f
        .renderer
        .create_buffer(&BufferDesc {
            size: 128,
            usage: BufferUsage::STORAGE | BufferUsage::TRANSFER_SRC,
        })
        .unwrap();
    let dst = f
        .renderer
        .create_buffer(&BufferDesc {
            size: 128,
            usage: BufferUsage::STORAGE | BufferUsage::TRANSFER_DST,
        })
        .unwrap();

    let mut list = CommandList::new("copy");
    list.copy_buffer(src, dst, 0, 64, 64);

    execute(&mut f.renderer, &list).unwrap();
    assert!(replay_calls(&f.log)
        .iter()
        .any(|c| c == "copy_buffer:0:64:64"));
}
