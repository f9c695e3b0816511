//! Report modules.
//!
//! Composition of the fixed page sequence, text charts, and rendering to
//! Markdown or JSON.

pub mod chart;
pub mod composer;
pub mod generator;

pub use composer::compose;
pub use generator::renderer_for;
