//! Per-frame protocol against the recording backend.

use approx::assert_relative_eq;
use voxen_render::{clear_color, DrawOutcome, Renderer, SkipReason};
use voxen_test::{FrameOp, RecordingBackend};

fn ready_renderer(backend: RecordingBackend) -> Renderer<RecordingBackend> {
    let mut renderer = Renderer::new(backend);
    renderer.initialize().unwrap();
    renderer
}

#[test]
fn draw_before_initialize_is_noop() {
    let backend = RecordingBackend::new();
    let handle = backend.handle();
    let mut renderer = Renderer::new(backend);

    let outcome = renderer.draw().unwrap();
    assert_eq!(outcome, DrawOutcome::Skipped(SkipReason::NotReady));
    assert!(handle.calls().is_empty());
    assert_eq!(renderer.frame_number(), 0);
}

#[test]
fn draw_while_minimized_is_noop() {
    let backend = RecordingBackend::new();
    let handle = backend.handle();
    let mut renderer = ready_renderer(backend);
    handle.clear_calls();
    handle.set_minimized(true);

    let outcome = renderer.draw().unwrap();
    assert_eq!(outcome, DrawOutcome::Skipped(SkipReason::Minimized));
    assert!(handle.calls().is_empty());
    assert_eq!(renderer.frame_number(), 0);

    handle.set_minimized(false);
    assert!(matches!(
        renderer.draw().unwrap(),
        DrawOutcome::Presented { .. }
    ));
}

#[test]
fn frame_runs_operations_in_protocol_order() {
    let backend = RecordingBackend::new();
    let handle = backend.handle();
    let mut renderer = ready_renderer(backend);
    handle.clear_calls();

    renderer.draw().unwrap();

    assert_eq!(
        handle.frame_ops(),
        vec![
            FrameOp::WaitFence,
            FrameOp::ResetFence,
            FrameOp::ResetCommandBuffer,
            FrameOp::AcquireImage,
            FrameOp::BeginCommands,
            FrameOp::BeginRenderPass,
            FrameOp::EndRenderPass,
            FrameOp::EndCommands,
            FrameOp::Submit,
            FrameOp::Present,
        ]
    );
}

#[test]
fn fence_is_signaled_before_first_draw() {
    let backend = RecordingBackend::new();
    let handle = backend.handle();
    let mut renderer = ready_renderer(backend);

    assert!(handle.fence_signaled());
    assert!(renderer.draw().is_ok());
}

#[test]
fn unsignaled_fence_times_out_on_first_draw() {
    let mut renderer = ready_renderer(RecordingBackend::new().with_unsignaled_fence());

    let err = renderer.draw().unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(renderer.frame_number(), 0);
}

#[test]
fn frame_number_counts_successful_draws() {
    let mut renderer = ready_renderer(RecordingBackend::new());
    for expected in 1..=5 {
        renderer.draw().unwrap();
        assert_eq!(renderer.frame_number(), expected);
    }
}

#[test]
fn failed_present_does_not_advance_frame() {
    let backend = RecordingBackend::new();
    let handle = backend.handle();
    let mut renderer = ready_renderer(backend);

    renderer.draw().unwrap();
    handle.fail_frame_op(Some(FrameOp::Present));
    assert!(renderer.draw().is_err());
    assert_eq!(renderer.frame_number(), 1);
}

#[test]
fn acquire_timeout_stops_the_frame() {
    let backend = RecordingBackend::new();
    let handle = backend.handle();
    let mut renderer = ready_renderer(backend);
    handle.clear_calls();
    handle.fail_frame_op(Some(FrameOp::AcquireImage));

    let err = renderer.draw().unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(handle.frame_ops().last(), Some(&FrameOp::AcquireImage));
}

#[test]
fn clear_color_pulses_with_frame_number() {
    let backend = RecordingBackend::new();
    let handle = backend.handle();
    let mut renderer = ready_renderer(backend);

    for _ in 0..200 {
        renderer.draw().unwrap();
    }

    let clears = handle.clear_colors();
    assert_eq!(clears.len(), 200);
    for (frame, clear) in clears.iter().enumerate() {
        assert_eq!(*clear, clear_color(frame as u64));
        assert!((0.0..=1.0).contains(&clear.z));
    }
    assert_relative_eq!(clears[0].z, 0.0);
    assert_relative_eq!(clears[120].z, 1.0_f32.sin(), epsilon = 1e-6);
}

#[test]
fn images_cycle_through_the_swapchain() {
    let mut renderer = ready_renderer(RecordingBackend::new().with_image_count(2));
    let indices: Vec<_> = (0..4)
        .map(|_| match renderer.draw().unwrap() {
            DrawOutcome::Presented { image_index } => image_index,
            DrawOutcome::Skipped(reason) => panic!("unexpected skip: {reason:?}"),
        })
        .collect();
    assert_eq!(indices, vec![0, 1, 0, 1]);
}

#[test]
fn draw_after_shutdown_is_noop() {
    let backend = RecordingBackend::new();
    let handle = backend.handle();
    let mut renderer = ready_renderer(backend);
    renderer.shutdown();
    handle.clear_calls();

    assert_eq!(
        renderer.draw().unwrap(),
        DrawOutcome::Skipped(SkipReason::NotReady)
    );
    assert!(handle.calls().is_empty());
}
