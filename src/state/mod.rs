/// State management module
///
/// This module handles all application state, including:
/// - Shared data structures (data.rs)
/// - The candidate store, its ranking and selection (store.rs, ranking.rs)
/// - Comparison jobs handed to the async runtime (job.rs)
/// - The interaction state machine and edge labels (view.rs, labels.rs)
/// - The session tying it all together, and its snapshot (session.rs, snapshot.rs)

pub mod data;
pub mod job;
pub mod labels;
pub mod ranking;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod view;

pub use data::{CandidateId, HighlightColor, SensitivityMode};
pub use session::{Effects, Session};
pub use snapshot::{CurrentView, ListEntry, Snapshot};
pub use view::{Input, PointerButton, Reveal, ViewMode};
