//! In-memory host document: the element tree the page engine observes.
//!
//! The engine never owns content nodes. It holds [`Element`] handles only for
//! the duration of a scan and keeps [`WeakElement`]s anywhere longer lived.

pub mod document;
pub mod element;

pub use document::{Document, MutationRecord, WeakDocument};
pub use element::{ClickHandler, Element, NodeId, WeakElement};
