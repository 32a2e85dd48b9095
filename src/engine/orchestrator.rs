//! Page engine: wires resolution, registry, visibility, the watcher and the
//! toast into the scan / block / unblock control flow.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::dom::{Document, Element, MutationRecord};
use crate::resolve::{Author, AuthorResolver, HandleResolver, TimelineMarkupV1};
use crate::store::{load_config, PersistedStore};
use crate::types::{
    canonicalize, BlockResult, BlockedUser, ButtonVisibility, Config, Timings, BLOCKED_USERS_KEY,
};

use super::marker::ProcessedMarker;
use super::registry::BlockRegistry;
use super::toast::{ToastController, TOAST_CLASS};
use super::visibility::VisibilityController;
use super::watcher::ChangeWatcher;

/// Class of the injected block control.
pub const BUTTON_CLASS: &str = "quick-block-btn";
/// Extra class on the control when it is shown on hover only.
pub const BUTTON_HOVER_CLASS: &str = "quick-block-btn-hover";
/// Extra class on the control when it is always shown.
pub const BUTTON_ALWAYS_CLASS: &str = "quick-block-btn-always";

/// What a scan did with one content node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutcome {
    /// No author could be resolved; the node is left alone.
    Unresolved,
    /// The author is blocked; the node was hidden without animation.
    Hidden(String),
    /// A block control was injected for the author.
    Controlled(String),
}

/// Totals of one scan pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Qualifying nodes evaluated for the first time.
    pub examined: usize,
    pub hidden: usize,
    pub controls: usize,
    pub unresolved: usize,
}

/// Everything one page context needs, built once at startup and passed
/// explicitly to every operation.
pub struct Context {
    pub document: Document,
    pub store: Rc<dyn PersistedStore>,
    pub registry: BlockRegistry,
    pub resolver: Box<dyn AuthorResolver>,
    pub marker: ProcessedMarker,
    pub visibility: VisibilityController,
    pub toast: ToastController,
    pub watcher: Rc<ChangeWatcher>,
    pub timings: Timings,
    config: Cell<Config>,
    scans: Cell<u64>,
    tasks: RefCell<Vec<JoinHandle<()>>>,
}

impl Drop for Context {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}

/// Handle to a running page context. Clones share the same context.
///
/// All methods must be called from within a `tokio::task::LocalSet`.
#[derive(Clone)]
pub struct Engine {
    ctx: Rc<Context>,
}

/// Non-owning engine handle held by DOM callbacks and background tasks.
#[derive(Clone)]
struct WeakEngine(Weak<Context>);

impl WeakEngine {
    fn upgrade(&self) -> Option<Engine> {
        self.0.upgrade().map(|ctx| Engine { ctx })
    }
}

impl Engine {
    /// Build an engine for the current timeline markup with default timings.
    pub fn new(document: Document, store: Rc<dyn PersistedStore>) -> Self {
        Self::with_resolver(
            document,
            store,
            Box::new(HandleResolver::new(TimelineMarkupV1)),
            Timings::default(),
        )
    }

    /// Build an engine with an explicit resolver strategy and timings.
    pub fn with_resolver(
        document: Document,
        store: Rc<dyn PersistedStore>,
        resolver: Box<dyn AuthorResolver>,
        timings: Timings,
    ) -> Self {
        let ctx = Context {
            registry: BlockRegistry::new(store.clone()),
            toast: ToastController::new(document.clone(), timings.toast_wait, timings.toast_fade),
            visibility: VisibilityController::new(timings.hide_transition),
            watcher: Rc::new(ChangeWatcher::new(timings.debounce)),
            marker: ProcessedMarker::new(),
            document,
            store,
            resolver,
            timings,
            config: Cell::new(Config::default()),
            scans: Cell::new(0),
            tasks: RefCell::new(Vec::new()),
        };
        Self { ctx: Rc::new(ctx) }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn document(&self) -> &Document {
        &self.ctx.document
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.ctx.registry
    }

    pub fn watcher(&self) -> &ChangeWatcher {
        &self.ctx.watcher
    }

    pub fn toast(&self) -> &ToastController {
        &self.ctx.toast
    }

    pub fn visibility(&self) -> &VisibilityController {
        &self.ctx.visibility
    }

    /// Config as read at startup. Later writes from other contexts are not
    /// picked up until the next start.
    pub fn config(&self) -> Config {
        self.ctx.config.get()
    }

    /// Number of full scans run so far, the initial one included.
    pub fn scan_count(&self) -> u64 {
        self.ctx.scans.get()
    }

    fn downgrade(&self) -> WeakEngine {
        WeakEngine(Rc::downgrade(&self.ctx))
    }

    /// Initialise the context: load the block list and config, scan what is
    /// already rendered, then start observing the document and the store.
    pub async fn start(&self) -> BlockResult<()> {
        let changes = self.ctx.store.subscribe();

        self.ctx.registry.reload().await?;
        let config = load_config(self.ctx.store.as_ref()).await?;
        self.ctx.config.set(config);

        let report = self.scan();
        log::info!(
            "Engine started: {} blocked users, {} nodes examined",
            self.ctx.registry.len(),
            report.examined
        );

        let mutations = self.ctx.document.observe();
        let watcher = self.ctx.watcher.clone();
        let weak = self.downgrade();
        let watch_task = tokio::task::spawn_local(async move {
            watcher
                .run(mutations, |record| !is_own_mutation(record), |batch| {
                    if let Some(engine) = weak.upgrade() {
                        engine.on_mutations(batch);
                    }
                })
                .await;
        });

        let weak = self.downgrade();
        let sync_task = tokio::task::spawn_local(async move {
            let mut changes = changes;
            loop {
                let reload = match changes.recv().await {
                    Ok(change) => change.touches_local(BLOCKED_USERS_KEY),
                    Err(RecvError::Lagged(missed)) => {
                        log::warn!("Missed {missed} store change notifications, reloading");
                        true
                    }
                    Err(RecvError::Closed) => break,
                };
                if !reload {
                    continue;
                }
                let Some(engine) = weak.upgrade() else {
                    break;
                };
                if let Err(e) = engine.reload().await {
                    log::error!("Failed to reload block list: {e}");
                }
            }
        });

        self.ctx.tasks.borrow_mut().extend([watch_task, sync_task]);
        Ok(())
    }

    /// Stop observing the document and the store.
    pub fn stop(&self) {
        for task in self.ctx.tasks.borrow_mut().drain(..) {
            task.abort();
        }
    }

    fn on_mutations(&self, batch: &[MutationRecord]) {
        for record in batch {
            for removed in &record.removed {
                self.ctx.marker.forget_subtree(removed);
            }
        }
        self.scan();
    }

    /// Evaluate every qualifying node that has not been evaluated yet.
    pub fn scan(&self) -> ScanReport {
        let ctx = &self.ctx;
        ctx.scans.set(ctx.scans.get() + 1);
        ctx.marker.sweep();

        let mut report = ScanReport::default();
        for node in ctx.document.query_all(|el| ctx.resolver.qualifies(el)) {
            if ctx.marker.is_marked(&node) {
                continue;
            }
            report.examined += 1;
            match self.process(&node) {
                NodeOutcome::Unresolved => report.unresolved += 1,
                NodeOutcome::Hidden(_) => report.hidden += 1,
                NodeOutcome::Controlled(_) => report.controls += 1,
            }
            ctx.marker.mark(&node);
        }
        log::debug!("Scan {}: {:?}", ctx.scans.get(), report);
        report
    }

    /// Classify one node and either hide it or give it a block control.
    pub fn process(&self, node: &Element) -> NodeOutcome {
        let Some(author) = self.ctx.resolver.resolve(node) else {
            return NodeOutcome::Unresolved;
        };
        if self.ctx.registry.contains(&author.canonical_username) {
            self.ctx.visibility.hide(node, false);
            return NodeOutcome::Hidden(author.canonical_username);
        }
        self.inject_control(node, &author);
        NodeOutcome::Controlled(author.canonical_username)
    }

    fn inject_control(&self, node: &Element, author: &Author) {
        if node.find_first(|el| el.has_class(BUTTON_CLASS)).is_some() {
            return;
        }
        let doc = &self.ctx.document;
        let visibility_class = match self.config().button_visibility {
            ButtonVisibility::Hover => BUTTON_HOVER_CLASS,
            ButtonVisibility::Always => BUTTON_ALWAYS_CLASS,
        };
        let button = doc
            .create_element("button")
            .with_class(BUTTON_CLASS)
            .with_class(visibility_class)
            .with_attr("data-username", &author.display_username)
            .with_attr("data-user-id", &author.identity_hint)
            .with_attr("title", &format!("Block @{}", author.display_username))
            .with_text("B");

        let weak = self.downgrade();
        let weak_node = node.downgrade();
        let author = author.clone();
        button.on_click(Rc::new(move |_| {
            let (Some(engine), Some(node)) = (weak.upgrade(), weak_node.upgrade()) else {
                return;
            };
            let author = author.clone();
            tokio::task::spawn_local(async move {
                if let Err(e) = engine.block(&author, &node).await {
                    log::error!("Failed to block @{}: {e}", author.display_username);
                }
            });
        }));

        let host = self
            .ctx
            .resolver
            .control_anchor(node)
            .and_then(|anchor| anchor.parent())
            .unwrap_or_else(|| node.clone());
        set_position_relative(&host);
        doc.append_child(&host, &button);
    }

    /// Block an author in response to a click on `node`'s control.
    ///
    /// The record is persisted before anything is hidden, so other contexts
    /// reacting to the change notification see a list consistent with the
    /// page.
    pub async fn block(&self, author: &Author, node: &Element) -> BlockResult<()> {
        let config = self.config();
        let record = BlockedUser::new(
            &author.display_username,
            Some(&author.identity_hint),
            config.block_mode,
        );
        let canonical = record.canonical_username.clone();
        self.ctx.registry.add(record).await?;
        log::info!("Blocked @{} ({})", author.display_username, config.block_mode.name());

        self.ctx.visibility.hide(node, true);
        let others: Vec<Element> = self
            .nodes_by(&canonical)
            .into_iter()
            .filter(|other| other != node)
            .collect();
        for other in &others {
            self.ctx.visibility.hide(other, true);
        }
        log::debug!("Hid {} more nodes from @{canonical}", others.len());

        let weak = self.downgrade();
        let name = canonical.clone();
        self.ctx.toast.show(
            &author.display_username,
            Rc::new(move || {
                let Some(engine) = weak.upgrade() else {
                    return;
                };
                let name = name.clone();
                tokio::task::spawn_local(async move {
                    if let Err(e) = engine.unblock(&name).await {
                        log::error!("Failed to undo block of @{name}: {e}");
                    }
                });
            }),
        );
        Ok(())
    }

    /// Unblock a user and reveal their content. Returns whether a persisted
    /// record was removed.
    pub async fn unblock(&self, name: &str) -> BlockResult<bool> {
        let canonical = canonicalize(name);
        let removed = self.ctx.registry.remove(&canonical).await?;
        let shown = self.unhide_author(&canonical);
        log::info!("Unblocked @{canonical}, {shown} nodes revealed");
        Ok(removed)
    }

    /// Reload the registry after an external change and bring the page in
    /// line with it.
    pub async fn reload(&self) -> BlockResult<()> {
        self.ctx.registry.reload().await?;
        self.reconcile();
        Ok(())
    }

    /// Hide nodes of blocked authors that are still visible, and reveal
    /// suppressed nodes whose author is no longer blocked.
    pub fn reconcile(&self) {
        let ctx = &self.ctx;
        for node in ctx.document.query_all(|el| ctx.resolver.qualifies(el)) {
            let Some(author) = ctx.resolver.resolve(&node) else {
                continue;
            };
            let blocked = ctx.registry.contains(&author.canonical_username);
            let suppressed = ctx.visibility.is_suppressed(&node);
            if blocked && !suppressed {
                ctx.visibility.hide(&node, false);
            } else if !blocked && suppressed {
                ctx.visibility.unhide(&node);
                self.inject_control(&node, &author);
            }
        }
    }

    /// Hide every present node authored by `canonical`. Returns how many
    /// nodes matched.
    pub fn hide_author(&self, canonical: &str, animated: bool) -> usize {
        let nodes = self.nodes_by(canonical);
        for node in &nodes {
            self.ctx.visibility.hide(node, animated);
        }
        nodes.len()
    }

    /// Reveal every present node authored by `canonical`.
    pub fn unhide_author(&self, canonical: &str) -> usize {
        let nodes = self.nodes_by(canonical);
        for node in &nodes {
            self.ctx.visibility.unhide(node);
        }
        nodes.len()
    }

    /// Present content nodes resolving to the given author.
    pub fn nodes_by(&self, name: &str) -> Vec<Element> {
        let ctx = &self.ctx;
        let canonical = canonicalize(name);
        ctx.document
            .query_all(|el| ctx.resolver.qualifies(el))
            .into_iter()
            .filter(|node| {
                ctx.resolver
                    .resolve(node)
                    .is_some_and(|a| a.canonical_username == canonical)
            })
            .collect()
    }
}

/// Set `position: relative` on an element, keeping its other inline styles.
fn set_position_relative(el: &Element) {
    let style = el.attr("style").unwrap_or_default();
    let mut declarations: Vec<&str> = style
        .split(';')
        .map(str::trim)
        .filter(|decl| {
            let property = decl.split(':').next().unwrap_or_default().trim();
            !decl.is_empty() && !property.eq_ignore_ascii_case("position")
        })
        .collect();
    declarations.push("position: relative");
    el.set_attr("style", &declarations.join("; "));
}

fn is_engine_owned(el: &Element) -> bool {
    el.has_class(BUTTON_CLASS) || el.has_class(TOAST_CLASS)
}

/// Whether a record only adds or removes the engine's own controls/toasts.
pub fn is_own_mutation(record: &MutationRecord) -> bool {
    let mut touched = record.added.iter().chain(record.removed.iter()).peekable();
    touched.peek().is_some() && touched.all(is_engine_owned)
}
