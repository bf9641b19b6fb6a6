//! Command capture between wake word and execution word.

pub mod buffer;

pub use buffer::{BufferEvent, CommandBuffer};
