//! quick-block: suppresses content by author on a live, client-rendered
//! timeline and keeps the suppression consistent across reloads and
//! execution contexts.
//!
//! The page engine observes a host document, resolves the author of each
//! timeline item, hides items by blocked authors and injects a block control
//! into the rest. The block list lives in a persisted store shared with other
//! contexts, such as the control panel.

pub mod cli;
pub mod dom;
pub mod engine;
pub mod panel;
pub mod resolve;
pub mod store;
pub mod types;

// Re-export commonly used types at the crate root
pub use dom::{Document, Element, MutationRecord};
pub use engine::{
    BlockRegistry, ChangeWatcher, Engine, NodeOutcome, ProcessedMarker, ScanReport,
    ToastController, Visibility, VisibilityController, WatchState,
};
pub use panel::{ControlPanel, ExportFile, ImportReport, PanelStats};
pub use resolve::{Author, AuthorResolver, HandleResolver, MarkupContract, TimelineMarkupV1};
pub use store::{FileStore, MemoryStore, PersistedStore, StorageArea, StoreChange};
pub use types::{
    canonicalize, BlockError, BlockMode, BlockResult, BlockedUser, ButtonVisibility, Config,
    Timings,
};
