//! Bring-up and teardown ordering against the recording backend.

use voxen_gpu::GpuError;
use voxen_render::{BringUpStep, Renderer};
use voxen_test::{Call, FakeResource, RecordingBackend};

#[test]
fn bring_up_runs_every_step_in_order() {
    let backend = RecordingBackend::new();
    let handle = backend.handle();
    let mut renderer = Renderer::new(backend);

    renderer.initialize().unwrap();
    assert!(renderer.is_ready());

    let steps: Vec<BringUpStep> = handle
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Acquire(step) => Some(step),
            _ => None,
        })
        .collect();
    assert_eq!(steps, BringUpStep::ORDER.to_vec());
}

#[test]
fn teardown_is_exact_reverse_of_creation() {
    let backend = RecordingBackend::new().with_image_count(2);
    let handle = backend.handle();
    let mut renderer = Renderer::new(backend);

    renderer.initialize().unwrap();
    renderer.shutdown();

    let mut created = handle.created();
    let released = handle.released();
    assert_eq!(released.first(), Some(&FakeResource::RenderSemaphore));
    assert_eq!(released.last(), Some(&FakeResource::Instance));

    created.reverse();
    assert_eq!(released, created);
    assert_eq!(renderer.resource_count(), 0);
}

#[test]
fn shutdown_waits_for_idle_before_releasing() {
    let backend = RecordingBackend::new();
    let handle = backend.handle();
    let mut renderer = Renderer::new(backend);

    renderer.initialize().unwrap();
    handle.clear_calls();
    renderer.shutdown();

    let calls = handle.calls();
    assert_eq!(calls.first(), Some(&Call::WaitIdle));
    assert!(calls[1..].iter().all(|call| matches!(call, Call::Release(_))));
}

#[test]
fn second_shutdown_releases_nothing() {
    let backend = RecordingBackend::new();
    let handle = backend.handle();
    let mut renderer = Renderer::new(backend);

    renderer.initialize().unwrap();
    renderer.shutdown();
    let released = handle.released().len();

    renderer.shutdown();
    assert_eq!(handle.released().len(), released);
    assert!(!renderer.is_ready());
}

#[test]
fn drop_releases_everything() {
    let backend = RecordingBackend::new();
    let handle = backend.handle();
    {
        let mut renderer = Renderer::new(backend);
        renderer.initialize().unwrap();
    }
    assert_eq!(handle.released().len(), handle.created().len());
    assert_eq!(handle.released().last(), Some(&FakeResource::Instance));
}

#[test]
fn failed_step_rolls_back_what_was_acquired() {
    let backend = RecordingBackend::new().failing_at(BringUpStep::RenderPass);
    let handle = backend.handle();
    let mut renderer = Renderer::new(backend);

    let err = renderer.initialize().unwrap_err();
    assert!(matches!(err, GpuError::Vulkan(_)));
    assert!(!renderer.is_ready());
    assert_eq!(renderer.resource_count(), 0);

    let mut created = handle.created();
    assert!(!created.contains(&FakeResource::RenderPass));
    created.reverse();
    assert_eq!(handle.released(), created);
}

#[test]
fn failure_midway_through_a_step_releases_partial_objects() {
    let backend = RecordingBackend::new()
        .with_image_count(3)
        .failing_after(BringUpStep::Framebuffers, 1);
    let handle = backend.handle();
    let mut renderer = Renderer::new(backend);

    assert!(renderer.initialize().is_err());

    let released = handle.released();
    assert_eq!(released.first(), Some(&FakeResource::Framebuffer(0)));
    assert!(!released.contains(&FakeResource::Framebuffer(1)));
    assert_eq!(released.last(), Some(&FakeResource::Instance));
}

#[test]
fn failed_device_selection_releases_surface_and_instance() {
    let backend = RecordingBackend::new().failing_at(BringUpStep::PhysicalDevice);
    let handle = backend.handle();
    let mut renderer = Renderer::new(backend);

    assert!(renderer.initialize().is_err());
    assert_eq!(
        handle.released(),
        vec![
            FakeResource::Surface,
            FakeResource::DebugMessenger,
            FakeResource::Instance
        ]
    );
}

#[test]
fn second_initialize_is_rejected() {
    let mut renderer = Renderer::new(RecordingBackend::new());
    renderer.initialize().unwrap();
    assert!(matches!(
        renderer.initialize(),
        Err(GpuError::InvalidState(_))
    ));
    assert!(renderer.is_ready());
}
