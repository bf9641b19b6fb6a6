//! Core types for the transcription source

use std::time::Instant;

/// One snapshot of the recognizer's current hypothesis. Revisions for the
/// same utterance extend or replace earlier text; `is_final` marks the
/// engine's committed result for the segment.
#[derive(Debug, Clone)]
pub struct TranscriptRevision {
    pub text: String,
    pub is_final: bool,
    pub timestamp: Instant,
}

/// Transcription source configuration
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Capacity of the revision channel toward the controller
    pub revision_capacity: usize,
    /// Capacity of the audio-level channel; stale samples are dropped
    pub level_capacity: usize,
    /// Exponential smoothing factor for audio levels, 0.0–1.0
    pub level_smoothing: f32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            revision_capacity: 64,
            level_capacity: 32,
            level_smoothing: 0.3,
        }
    }
}
