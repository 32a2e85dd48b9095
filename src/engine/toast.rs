//! Undo toast: a single transient notification.

use std::rc::Rc;
use std::time::Duration;

use crate::dom::{Document, Element};

pub const TOAST_CLASS: &str = "quick-block-toast";
pub const TOAST_MESSAGE_CLASS: &str = "quick-block-toast-message";
pub const TOAST_UNDO_CLASS: &str = "quick-block-toast-undo";
pub const TOAST_FADING_CLASS: &str = "quick-block-toast-fading";

/// Shows at most one toast at a time.
///
/// The wait and fade timers of a toast are never cancelled; they act on a
/// weak handle and removal is idempotent, so a toast dismissed early simply
/// makes them no-ops.
pub struct ToastController {
    document: Document,
    wait: Duration,
    fade: Duration,
}

impl ToastController {
    pub fn new(document: Document, wait: Duration, fade: Duration) -> Self {
        Self {
            document,
            wait,
            fade,
        }
    }

    /// The toast currently in the document, if any.
    pub fn current(&self) -> Option<Element> {
        self.document.query_first(|el| el.has_class(TOAST_CLASS))
    }

    /// Remove every toast in the document.
    pub fn dismiss_all(&self) {
        for toast in self.document.query_all(|el| el.has_class(TOAST_CLASS)) {
            self.document.remove(&toast);
        }
    }

    /// Show "Hidden @user" with an undo control. Clicking undo runs `on_undo`
    /// and removes the toast at once. Spawns its timers onto the current
    /// `LocalSet`.
    pub fn show(&self, display_username: &str, on_undo: Rc<dyn Fn()>) -> Element {
        self.dismiss_all();

        let doc = &self.document;
        let message = doc
            .create_element("span")
            .with_class(TOAST_MESSAGE_CLASS)
            .with_text(&format!("Hidden @{display_username}"));
        let undo = doc
            .create_element("button")
            .with_class(TOAST_UNDO_CLASS)
            .with_text("Undo");
        let toast = doc
            .create_element("div")
            .with_class(TOAST_CLASS)
            .with_child(message)
            .with_child(undo.clone());

        let weak_toast = toast.downgrade();
        let weak_doc = doc.downgrade();
        undo.on_click(Rc::new(move |_| {
            on_undo();
            if let (Some(toast), Some(doc)) = (weak_toast.upgrade(), weak_doc.upgrade()) {
                doc.remove(&toast);
            }
        }));

        doc.append_child(&doc.body(), &toast);

        let weak_toast = toast.downgrade();
        let weak_doc = doc.downgrade();
        let (wait, fade) = (self.wait, self.fade);
        tokio::task::spawn_local(async move {
            tokio::time::sleep(wait).await;
            let Some(toast) = weak_toast.upgrade().filter(Element::is_connected) else {
                return;
            };
            toast.add_class(TOAST_FADING_CLASS);
            toast.set_attr("style", "animation: fadeOut 0.3s ease-out forwards");
            drop(toast);

            tokio::time::sleep(fade).await;
            if let (Some(toast), Some(doc)) = (weak_toast.upgrade(), weak_doc.upgrade()) {
                doc.remove(&toast);
            }
        });

        toast
    }
}
