//! Exercise template discovery and navigation manifest.
//!
//! Walks a source tree for exercise page templates, recognizes the
//! `weekN/exM.html` and `shader/shader_exM.html` layouts, and produces the
//! ordered manifest that drives the site navigation.

pub mod descriptor;
pub mod discovery;
pub mod tree;

pub use descriptor::{ExerciseDescriptor, Group, Manifest, NavRecord};
pub use discovery::{to_slash, Discovery, Templates};
pub use tree::{FsTree, MemoryTree, SourceTree};
