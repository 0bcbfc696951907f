//! Reference/candidate image comparison
//!
//! Candidates are ranked by how closely they match one reference image,
//! under three sensitivity modes, and shown side by side with a slider
//! wipe or a diff overlay.

pub mod compose;
pub mod config;
pub mod diff;
pub mod error;
pub mod loader;
pub mod state;

pub use config::Settings;
pub use error::{CompareError, Result};
