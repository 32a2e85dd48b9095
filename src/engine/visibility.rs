//! Visibility controller: the two-phase hide transition.

use std::time::Duration;

use crate::dom::Element;

/// Transient class applied while the hide transition runs.
pub const HIDING_CLASS: &str = "extension-hiding";
/// Terminal hidden class.
pub const HIDDEN_CLASS: &str = "extension-hidden";

/// Visual state of a content node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hiding,
    Hidden,
}

/// Applies and retracts suppression on content nodes. Every operation is a
/// class toggle, so repeating one has no further effect.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityController {
    transition: Duration,
}

impl VisibilityController {
    pub fn new(transition: Duration) -> Self {
        Self { transition }
    }

    pub fn state(&self, node: &Element) -> Visibility {
        if node.has_class(HIDDEN_CLASS) {
            Visibility::Hidden
        } else if node.has_class(HIDING_CLASS) {
            Visibility::Hiding
        } else {
            Visibility::Visible
        }
    }

    /// Whether the node is hidden or on its way there.
    pub fn is_suppressed(&self, node: &Element) -> bool {
        self.state(node) != Visibility::Visible
    }

    /// Hide a node. Animated hides pass through [`HIDING_CLASS`] for the
    /// transition delay; the deferred step only completes if the node is
    /// still in that state, so an `unhide` during the transition wins.
    ///
    /// Animated hides spawn onto the current `LocalSet`.
    pub fn hide(&self, node: &Element, animated: bool) {
        if !animated {
            node.add_class(HIDDEN_CLASS);
            node.remove_class(HIDING_CLASS);
            return;
        }
        if self.is_suppressed(node) {
            return;
        }
        node.add_class(HIDING_CLASS);

        let weak = node.downgrade();
        let delay = self.transition;
        tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            if let Some(node) = weak.upgrade() {
                if node.has_class(HIDING_CLASS) {
                    node.add_class(HIDDEN_CLASS);
                    node.remove_class(HIDING_CLASS);
                }
            }
        });
    }

    /// Remove both the transient and the terminal hidden state.
    pub fn unhide(&self, node: &Element) {
        node.remove_class(HIDDEN_CLASS);
        node.remove_class(HIDING_CLASS);
    }
}
