// src/extractors/mod.rs
pub mod engine;
pub mod legacy;
pub mod path;
pub mod process;
pub mod selector;

// Re-export key extraction types for convenience
pub use engine::ExtractEngine;
pub use legacy::{Strategy, StrategySpec};
pub use path::PathQuery;
pub use process::{ProcessSpec, ProcessStep};
pub use selector::{resolve, Matched};
