//! The page engine: block-state mirror, node bookkeeping, visibility, change
//! watching, the undo toast, and the orchestration tying them together.

pub mod marker;
pub mod orchestrator;
pub mod registry;
pub mod toast;
pub mod visibility;
pub mod watcher;

pub use marker::ProcessedMarker;
pub use orchestrator::{
    is_own_mutation, Context, Engine, NodeOutcome, ScanReport, BUTTON_ALWAYS_CLASS, BUTTON_CLASS,
    BUTTON_HOVER_CLASS,
};
pub use registry::{project, BlockRegistry};
pub use toast::{ToastController, TOAST_CLASS, TOAST_FADING_CLASS, TOAST_UNDO_CLASS};
pub use visibility::{Visibility, VisibilityController, HIDDEN_CLASS, HIDING_CLASS};
pub use watcher::{ChangeWatcher, WatchState};
