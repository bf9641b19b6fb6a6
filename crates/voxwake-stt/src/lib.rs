//! Transcription source abstraction for VoxWake
//!
//! This crate defines the `SpeechEngine` trait that platform recognition
//! backends implement, and the `TranscriptionSource` that wraps an engine
//! into a continuous, restartable revision stream. The source owns the
//! producer side of the pipeline; consumers only ever see its channels.

pub mod engine;
pub mod engines;
pub mod source;
pub mod types;

pub use engine::{EngineSink, SessionEnd, SpeechEngine};
pub use source::{SourceChannels, TranscriptionSource};
pub use types::{SourceConfig, TranscriptRevision};
