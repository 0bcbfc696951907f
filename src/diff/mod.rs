/// Image comparison module
///
/// This module handles:
/// - The pixel diff primitive and its per-mode tolerances (engine.rs)
/// - Running comparisons off the update loop, all modes at once (adapter.rs)

pub mod engine;
pub mod adapter;

pub use adapter::{compare, compare_all_modes, SharedEngine};
pub use engine::{DiffEngine, EngineSettings, PixelDiffEngine};
