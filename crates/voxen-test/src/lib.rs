//! Test support for the Voxen engine.
//!
//! Provides [`RecordingBackend`], a fake graphics backend that records
//! every call in order and can be told to fail at a chosen point.

pub mod recording;

pub use recording::{Call, FakeResource, FrameOp, RecordingBackend, RecordingHandle};
