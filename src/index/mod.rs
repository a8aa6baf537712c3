//! Index construction: the in-memory segment model and the batched builder.

pub mod builder;
pub mod segment;

pub use builder::{BatchPhase, BuildOptions, BuildProgress, build};
pub use segment::{Document, Posting, Segment};
