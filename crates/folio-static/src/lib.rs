//! Static site builder for the exercise documentation.
//!
//! Publishes every exercise page with its script inlined, a landing page
//! carrying the generated navigation, and a copy of the static resources.

pub mod assets;
pub mod builder;
pub mod format;
pub mod inline;
pub mod templates;

pub use builder::{BuildConfig, BuildError, BuildResult, StaticBuilder};
pub use format::{FormatError, FormatOptions, Formatter};
pub use inline::{InlineError, Placeholder};
