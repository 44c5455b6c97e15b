//! The engine: owns the renderer and forwards ticks to it.

use tracing::info;
use voxen_gpu::Result;
use voxen_render::{DrawOutcome, RenderBackend, Renderer};

/// Top-level running instance of the engine, owned by the application.
pub struct Engine<B: RenderBackend> {
    renderer: Option<Renderer<B>>,
}

impl<B: RenderBackend> Default for Engine<B> {
    fn default() -> Self {
        Self { renderer: None }
    }
}

impl<B: RenderBackend> Engine<B> {
    /// Create an engine with no renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct the renderer over `backend` and bring it up.
    ///
    /// On failure the renderer has already released what it acquired and is
    /// not kept.
    pub fn initialize(&mut self, backend: B) -> Result<()> {
        let mut renderer = Renderer::new(backend);
        renderer.initialize()?;
        self.renderer = Some(renderer);
        info!("Engine initialized");
        Ok(())
    }

    /// Draw a frame if there is a renderer.
    pub fn tick(&mut self) -> Result<Option<DrawOutcome>> {
        self.renderer.as_mut().map(Renderer::draw).transpose()
    }

    /// Shut the renderer down and drop it.
    pub fn shutdown(&mut self) {
        if let Some(mut renderer) = self.renderer.take() {
            renderer.shutdown();
        }
    }

    /// Frames presented so far.
    pub fn frame_number(&self) -> u64 {
        self.renderer.as_ref().map_or(0, Renderer::frame_number)
    }

    /// Get the renderer, if initialized.
    pub const fn renderer(&self) -> Option<&Renderer<B>> {
        self.renderer.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxen_render::BringUpStep;
    use voxen_test::RecordingBackend;

    #[test]
    fn tick_without_renderer_does_nothing() {
        let mut engine: Engine<RecordingBackend> = Engine::new();
        assert!(engine.tick().unwrap().is_none());
        assert_eq!(engine.frame_number(), 0);
    }

    #[test]
    fn tick_forwards_to_draw() {
        let mut engine = Engine::new();
        engine.initialize(RecordingBackend::new()).unwrap();

        let outcome = engine.tick().unwrap();
        assert!(matches!(outcome, Some(DrawOutcome::Presented { .. })));
        assert_eq!(engine.frame_number(), 1);
    }

    #[test]
    fn failed_initialize_keeps_no_renderer() {
        let mut engine = Engine::new();
        let result = engine.initialize(RecordingBackend::new().failing_at(BringUpStep::Device));
        assert!(result.is_err());
        assert!(engine.renderer().is_none());
    }

    #[test]
    fn shutdown_releases_renderer() {
        let backend = RecordingBackend::new();
        let handle = backend.handle();
        let mut engine = Engine::new();
        engine.initialize(backend).unwrap();

        engine.shutdown();
        assert!(engine.renderer().is_none());
        assert_eq!(handle.released().len(), handle.created().len());
    }
}
