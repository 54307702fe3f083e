/// Tests for the render graph state machine

use super::RenderGraph;
use crate::backend::null::NullBackend;
use crate::backend::types::{
    ImageDesc, ImageUsage, LoadMode, PixelFormat, ReadStage, WriteMode,
};
use crate::graph::builder::GraphToken;
use crate::handle::ImageId;
use crate::renderer::{Renderer, RendererConfig};
use std::sync::{Arc, Mutex};

fn renderer() -> (Renderer, crate::backend::null::CallLog) {
    let backend = NullBackend::new();
    let log = backend.call_log();
    (
        Renderer::new(Box::new(backend), RendererConfig::default()),
        log,
    )
}

fn image_desc() -> ImageDesc {
    ImageDesc {
        width: 128,
        height: 128,
        format: PixelFormat::R8G8B8A8_UNORM,
        usage: ImageUsage::RENDER_TARGET,
    }
}

#[test]
fn test_add_pass_registers() {
    let mut graph = RenderGraph::new("frame");
    let added = graph.add_pass("geometry", (), |_, _| true, |_, _, _| Ok(()));
    assert!(added);
    assert_eq!(graph.pass_count(), 1);
}

#[test]
fn test_duplicate_pass_name_returns_false() {
    let mut graph = RenderGraph::new("frame");
    assert!(graph.add_pass("geometry", (), |_, _| true, |_, _, _| Ok(())));
    assert!(!graph.add_pass("geometry", (), |_, _| true, |_, _, _| Ok(())));
    assert_eq!(graph.pass_count(), 1);
}

#[test]
fn test_setup_runs_passes_in_registration_order() {
    let (mut renderer, _log) = renderer();
    let order = Arc::new(Mutex::new(Vec::new()));

    let mut graph = RenderGraph::new("frame");
    for name in ["first", "second", "third"] {
        let order = Arc::clone(&order);
        graph.add_pass(
            name,
            name.to_string(),
            move |data, _| {
                order.lock().unwrap().push(data.clone());
                true
            },
            |_, _, _| Ok(()),
        );
    }

    let mut ctx = renderer.render_context();
    graph.setup(&mut ctx).unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
}

#[test]
fn test_pass_returning_false_is_excluded() {
    let (mut renderer, _log) = renderer();
    let executed = Arc::new(Mutex::new(Vec::new()));

    let mut graph = RenderGraph::new("frame");
    for (name, runs) in [("on", true), ("off", false), ("on again", true)] {
        let executed = Arc::clone(&executed);
        graph.add_pass(
            name,
            name.to_string(),
            move |_, _| runs,
            move |data, _, _| {
                executed.lock().unwrap().push(data.clone());
                Ok(())
            },
        );
    }

    let mut ctx = renderer.render_context();
    graph.setup(&mut ctx).unwrap();
    assert_eq!(graph.executing_pass_count(), 2);

    graph.execute(&mut ctx).unwrap();
    assert_eq!(*executed.lock().unwrap(), vec!["on", "on again"]);
}

#[test]
fn test_execute_without_setup_fails() {
    let (mut renderer, _log) = renderer();
    let mut graph = RenderGraph::new("frame");
    graph.add_pass("p", (), |_, _| true, |_, _, _| Ok(()));

    let mut ctx = renderer.render_context();
    assert!(graph.execute(&mut ctx).is_err());
}

#[test]
fn test_setup_twice_fails() {
    let (mut renderer, _log) = renderer();
    let mut graph = RenderGraph::new("frame");

    let mut ctx = renderer.render_context();
    graph.setup(&mut ctx).unwrap();
    assert!(graph.setup(&mut ctx).is_err());
}

#[test]
fn test_add_pass_after_setup_is_rejected() {
    let (mut renderer, _log) = renderer();
    let mut graph = RenderGraph::new("frame");

    let mut ctx = renderer.render_context();
    graph.setup(&mut ctx).unwrap();
    assert!(!graph.add_pass("late", (), |_, _| true, |_, _, _| Ok(())));
}

// ============================================================================
// Tests: Tokens and tracked resources
// ============================================================================

#[derive(Default)]
struct TokenPassData {
    write_token: Option<crate::graph::WriteToken>,
    image: ImageId,
}

#[test]
fn test_token_round_trip_returns_original_id() {
    let (mut renderer, _log) = renderer();

    let image = renderer.create_image(&image_desc()).unwrap();

    let resolved = Arc::new(Mutex::new(None));
    let resolved_in_pass = Arc::clone(&resolved);

    let mut graph = RenderGraph::new("frame");
    graph.add_pass(
        "probe",
        TokenPassData {
            image,
            ..TokenPassData::default()
        },
        |data, builder| {
            data.write_token =
                Some(builder.write(data.image, WriteMode::RenderTarget, LoadMode::Clear));
            true
        },
        move |data, resources, _| {
            let id = resources.image(data.write_token.unwrap())?;
            *resolved_in_pass.lock().unwrap() = Some(id);
            Ok(())
        },
    );

    renderer.execute_graph(&mut graph).unwrap();
    assert_eq!(resolved.lock().unwrap().unwrap(), image);
}

#[test]
fn test_same_id_declared_twice_returns_same_token_index() {
    let (mut renderer, _log) = renderer();

    let image = renderer.create_image(&image_desc()).unwrap();

    let indices = Arc::new(Mutex::new((usize::MAX, usize::MAX)));
    let indices_in_pass = Arc::clone(&indices);

    let mut graph = RenderGraph::new("frame");
    graph.add_pass(
        "dedup",
        image,
        move |image, builder| {
            let write = builder.write(*image, WriteMode::RenderTarget, LoadMode::Clear);
            let read = builder.read(*image, ReadStage::PixelShader);
            *indices_in_pass.lock().unwrap() = (write.index(), read.index());
            true
        },
        |_, _, _| Ok(()),
    );

    let mut ctx = renderer.render_context();
    graph.setup(&mut ctx).unwrap();

    let (write_index, read_index) = *indices.lock().unwrap();
    assert_eq!(write_index, read_index);
}

#[test]
fn test_tokens_across_passes_share_tracking() {
    let (mut renderer, _log) = renderer();

    let image = renderer.create_image(&image_desc()).unwrap();

    let indices = Arc::new(Mutex::new(Vec::new()));

    let mut graph = RenderGraph::new("frame");
    let indices_a = Arc::clone(&indices);
    graph.add_pass(
        "writer",
        image,
        move |image, builder| {
            let token = builder.write(*image, WriteMode::RenderTarget, LoadMode::Clear);
            indices_a.lock().unwrap().push(token.index());
            true
        },
        |_, _, _| Ok(()),
    );
    let indices_b = Arc::clone(&indices);
    graph.add_pass(
        "reader",
        image,
        move |image, builder| {
            let token = builder.read(*image, ReadStage::PixelShader);
            indices_b.lock().unwrap().push(token.index());
            true
        },
        |_, _, _| Ok(()),
    );

    let mut ctx = renderer.render_context();
    graph.setup(&mut ctx).unwrap();

    let indices = indices.lock().unwrap();
    // First-seen wins: the reader resolves to the writer's entry
    assert_eq!(indices[0], indices[1]);
}

#[test]
fn test_builder_created_image_is_transient() {
    let (mut renderer, _log) = renderer();

    let created = Arc::new(Mutex::new(None));
    let created_in_pass = Arc::clone(&created);

    let mut graph = RenderGraph::new("frame");
    graph.add_pass(
        "transient",
        (),
        move |_, builder| {
            let id = builder.create_image(&image_desc()).unwrap();
            *created_in_pass.lock().unwrap() = Some(id);
            true
        },
        |_, _, _| Ok(()),
    );

    renderer.execute_graph(&mut graph).unwrap();
    let id = created.lock().unwrap().unwrap();
    assert!(renderer.resources.images.contains_image(id));

    // The transient image expires after the in-flight window
    for _ in 0..crate::frame_resource::FRAMES_IN_FLIGHT + 1 {
        renderer.begin_frame().unwrap();
    }
    assert!(!renderer.resources.images.contains_image(id));
}

#[test]
fn test_execute_wraps_passes_in_one_marker_scope() {
    let (mut renderer, log) = renderer();

    let mut graph = RenderGraph::new("main graph");
    graph.add_pass(
        "noop",
        (),
        |_, _| true,
        |_, _, cmd| {
            cmd.push_marker("inner");
            cmd.pop_marker()
        },
    );

    renderer.execute_graph(&mut graph).unwrap();

    let calls = log.lock().unwrap().clone();
    let start = calls
        .iter()
        .position(|c| c.starts_with("begin_commands"))
        .unwrap();
    assert_eq!(
        calls[start..],
        [
            "begin_commands:0",
            "push_marker:main graph",
            "push_marker:inner",
            "pop_marker",
            "pop_marker",
            "submit_commands:0",
        ]
    );
}

#[test]
fn test_graph_is_spent_after_execute() {
    let (mut renderer, _log) = renderer();
    let mut graph = RenderGraph::new("frame");
    graph.add_pass("p", (), |_, _| true, |_, _, _| Ok(()));

    renderer.execute_graph(&mut graph).unwrap();

    let mut ctx = renderer.render_context();
    assert!(graph.execute(&mut ctx).is_err());
}
