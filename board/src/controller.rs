//! Board state controller: the single owner of the live widget collection.
//!
//! DESIGN
//! ======
//! Every mutation lands in the local `WidgetStore` first and is then handed
//! to the persistence worker. The interaction engine only proposes changes
//! as actions; the controller applies them, so the collection is never
//! mutated from two places during a pointer-move burst.
//!
//! Creation is the one round-trip the controller awaits: a widget appears
//! locally only after the store has assigned its id.
//!
//! ERROR HANDLING
//! ==============
//! Synchronous failures are returned to the caller. Write failures arrive
//! later from the worker and are collected for `take_errors`. Local state
//! is never rolled back; `reload` is the manual reconciliation path. A late
//! failure for a widget that is already gone is logged and dropped, except
//! for deletes, which the user should hear about.

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

use std::collections::HashSet;
use std::sync::Arc;

use canvas::consts::{PLACEMENT_MARGIN, PLACEMENT_RESERVE};
use canvas::content::{TodoEdit, TodoList};
use canvas::doc::{UnknownKind, Widget, WidgetId, WidgetKind, WidgetStore, default_size};
use canvas::engine::{Action, InteractionEngine};
use canvas::geometry::{Point, Size};
use canvas::input::Button;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ControllerConfig;
use crate::error::ErrorCode;
use crate::persistence::{EnqueueError, PersistFailure, PersistQueue, PersistRequest, spawn_persistence_worker};
use crate::store::{ComponentStore, DashboardResolver, ImageFile, ImageUploader, NewComponent, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("dashboard has not been resolved")]
    DashboardNotResolved,
    #[error("could not resolve dashboard: {0}")]
    Setup(#[source] StoreError),
    #[error("widget {0} not found")]
    WidgetNotFound(WidgetId),
    #[error("widget {id} is a {kind}, expected {expected}")]
    WrongKind { id: WidgetId, kind: WidgetKind, expected: WidgetKind },
    #[error(transparent)]
    UnknownKind(#[from] UnknownKind),
    #[error(transparent)]
    Queue(#[from] EnqueueError),
    #[error("{op} failed for widget {id}: {source}")]
    Persist { id: WidgetId, op: &'static str, source: StoreError },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorCode for BoardError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DashboardNotResolved => "E_DASHBOARD_NOT_RESOLVED",
            Self::Setup(StoreError::NotAuthenticated) => "E_NOT_AUTHENTICATED",
            Self::Setup(_) => "E_SETUP_FAILED",
            Self::WidgetNotFound(_) => "E_WIDGET_NOT_FOUND",
            Self::WrongKind { .. } => "E_WRONG_KIND",
            Self::UnknownKind(_) => "E_UNKNOWN_KIND",
            Self::Queue(e) => e.error_code(),
            Self::Persist { .. } => "E_PERSIST_FAILED",
            Self::Store(e) => e.error_code(),
        }
    }
}

/// Owns the widgets of the active dashboard and mediates every change to them.
pub struct BoardController {
    dashboard_id: Option<Uuid>,
    widgets: WidgetStore,
    engine: InteractionEngine,
    store: Arc<dyn ComponentStore>,
    queue: PersistQueue,
    failures: mpsc::UnboundedReceiver<PersistFailure>,
    errors: Vec<BoardError>,
    /// Widgets whose z-order changed locally but whose style write is not queued yet.
    stale_styles: HashSet<WidgetId>,
    rng: StdRng,
}

impl BoardController {
    /// Create a controller and spawn its persistence worker.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(store: Arc<dyn ComponentStore>, config: &ControllerConfig) -> Self {
        let (queue, failures) = spawn_persistence_worker(store.clone(), config.queue_capacity);
        let mut engine = InteractionEngine::with_policy(config.policy);
        engine.set_surface(Point::default(), config.surface);
        Self {
            dashboard_id: None,
            widgets: WidgetStore::new(),
            engine,
            store,
            queue,
            failures,
            errors: Vec::new(),
            stale_styles: HashSet::new(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Use a seeded generator for palette and placement choices.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // =========================================================================
    // SESSION
    // =========================================================================

    /// Resolve the user's dashboard once and load its widgets.
    ///
    /// Later calls return the already-resolved id without touching the store.
    ///
    /// # Errors
    ///
    /// `Setup` when there is no signed-in user or resolution fails; the
    /// controller stays unresolved and widget creation remains blocked.
    pub async fn start_session(&mut self, resolver: &dyn DashboardResolver) -> Result<Uuid, BoardError> {
        if let Some(id) = self.dashboard_id {
            return Ok(id);
        }
        let dashboard_id = match resolver.get_or_create_dashboard().await {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "dashboard resolution failed");
                return Err(BoardError::Setup(e));
            }
        };
        info!(%dashboard_id, "dashboard resolved");
        self.load_for_dashboard(dashboard_id).await?;
        Ok(dashboard_id)
    }

    /// Replace local state with every widget stored for `dashboard_id`.
    ///
    /// Records with an unknown kind are skipped. Returns the number loaded.
    ///
    /// # Errors
    ///
    /// `Store` when the fetch fails; local state is left untouched.
    pub async fn load_for_dashboard(&mut self, dashboard_id: Uuid) -> Result<usize, BoardError> {
        let records = match self.store.fetch_components(dashboard_id).await {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, %dashboard_id, "fetch components failed");
                return Err(e.into());
            }
        };

        let mut widgets = Vec::with_capacity(records.len());
        for record in records {
            let id = record.id;
            match record.into_widget() {
                Ok(widget) => widgets.push(widget),
                Err(e) => warn!(%id, error = %e, "skipping stored component"),
            }
        }

        let count = widgets.len();
        self.widgets.load_snapshot(widgets);
        self.stale_styles.clear();
        self.dashboard_id = Some(dashboard_id);
        info!(%dashboard_id, count, "dashboard loaded");
        Ok(count)
    }

    /// Re-fetch the current dashboard, discarding unsaved local divergence.
    ///
    /// # Errors
    ///
    /// `DashboardNotResolved` before a session starts; `Store` on fetch failure.
    pub async fn reload(&mut self) -> Result<usize, BoardError> {
        let dashboard_id = self.require_dashboard()?;
        self.load_for_dashboard(dashboard_id).await
    }

    // =========================================================================
    // CREATION
    // =========================================================================

    /// Create a widget of `kind` with its default content and style.
    ///
    /// Without a position the widget is placed at a random spot inside the
    /// known surface. The widget is added locally only after the store
    /// confirms it, on top of every existing widget.
    ///
    /// # Errors
    ///
    /// `DashboardNotResolved` before a session starts; `Store` when the insert fails.
    pub async fn add_widget(&mut self, kind: WidgetKind, position: Option<Point>) -> Result<WidgetId, BoardError> {
        let dashboard_id = self.require_dashboard()?;
        self.make_z_headroom();
        let model = kind.model();
        let mut style = model.initial_style(&mut self.rng);
        style.set_z_index(self.widgets.next_z());
        let position = match position {
            Some(p) => p.sanitized(),
            None => self.default_position(),
        };

        let new = NewComponent::new(dashboard_id, kind, model.initial_content(), position, default_size(), &style);
        let record = match self.store.insert_component(new).await {
            Ok(record) => record,
            Err(e) => {
                error!(error = %e, %kind, "create widget failed");
                return Err(e.into());
            }
        };

        let widget = record.into_widget()?;
        let id = widget.id;
        debug!(%id, %kind, z = widget.z_index(), "widget created");
        self.widgets.insert(widget);
        Ok(id)
    }

    /// Create a widget from a canvas drop carrying a kind tag.
    ///
    /// The client-space drop point is translated to board space and clamped
    /// at the surface's top-left corner.
    ///
    /// # Errors
    ///
    /// `UnknownKind` for an unrecognized tag, otherwise as [`Self::add_widget`].
    pub async fn drop_widget(&mut self, tag: &str, client: Point) -> Result<WidgetId, BoardError> {
        let kind: WidgetKind = tag.trim().parse()?;
        let board = self.engine.surface.to_board(client.sanitized());
        let position = Point::new(board.x.max(0.0), board.y.max(0.0));
        self.add_widget(kind, Some(position)).await
    }

    fn default_position(&mut self) -> Point {
        let surface = self.engine.surface;
        if !surface.is_bounded() {
            return Point::new(PLACEMENT_MARGIN, PLACEMENT_MARGIN);
        }
        let rx: f64 = self.rng.random();
        let ry: f64 = self.rng.random();
        Point::new(
            (rx * (surface.size.width - PLACEMENT_RESERVE)).max(PLACEMENT_MARGIN),
            (ry * (surface.size.height - PLACEMENT_RESERVE)).max(PLACEMENT_MARGIN),
        )
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Move a widget and bring it to the front.
    ///
    /// Non-finite coordinates are stored as 0. The local position changes
    /// regardless of whether the write can be queued. A raise whose style
    /// write could not be queued is retried on the next move or save.
    ///
    /// # Errors
    ///
    /// `WidgetNotFound`, or `Queue` when a write could not be queued.
    pub fn move_widget(&mut self, id: WidgetId, position: Point) -> Result<(), BoardError> {
        let position = position.sanitized();
        let widget = self.widgets.get_mut(&id).ok_or(BoardError::WidgetNotFound(id))?;
        widget.position = position;
        self.make_z_headroom();
        if let Some(z) = self.widgets.bring_to_front(&id) {
            debug!(%id, z, "widget raised");
            self.stale_styles.insert(id);
        }

        let style = self.flush_style(id);
        let moved = self.queue.enqueue(PersistRequest::Position { id, position });
        style?;
        moved?;
        Ok(())
    }

    /// Queue the style write for a widget whose z-order is ahead of the store.
    fn flush_style(&mut self, id: WidgetId) -> Result<(), BoardError> {
        if !self.stale_styles.contains(&id) {
            return Ok(());
        }
        let Some(widget) = self.widgets.get(&id) else {
            self.stale_styles.remove(&id);
            return Ok(());
        };
        self.queue.enqueue(PersistRequest::Style { id, style: widget.style.to_value() })?;
        self.stale_styles.remove(&id);
        Ok(())
    }

    /// Renumber z-orders when they reach the ceiling; the changed styles are persisted.
    fn make_z_headroom(&mut self) {
        let changed = self.widgets.ensure_z_headroom();
        if changed.is_empty() {
            return;
        }
        info!(count = changed.len(), "z-order renumbered");
        for id in changed {
            self.stale_styles.insert(id);
            if let Err(e) = self.flush_style(id) {
                self.report(e);
            }
        }
    }

    /// Set a widget's size locally, respecting the minimum. Not persisted.
    ///
    /// Returns the size actually applied.
    ///
    /// # Errors
    ///
    /// `WidgetNotFound`.
    pub fn resize_widget(&mut self, id: WidgetId, size: Size) -> Result<Size, BoardError> {
        let size = size.sanitized().at_least(self.engine.min_size);
        let widget = self.widgets.get_mut(&id).ok_or(BoardError::WidgetNotFound(id))?;
        widget.size = size;
        Ok(size)
    }

    /// Persist a widget's current size. Called once when a resize ends.
    ///
    /// # Errors
    ///
    /// `WidgetNotFound`, or `Queue` when the write could not be queued.
    pub fn commit_size(&mut self, id: WidgetId) -> Result<(), BoardError> {
        let size = self.widgets.get(&id).ok_or(BoardError::WidgetNotFound(id))?.size;
        self.queue.enqueue(PersistRequest::Size { id, size })?;
        Ok(())
    }

    /// Replace a widget's content.
    ///
    /// # Errors
    ///
    /// `WidgetNotFound`, or `Queue` when the write could not be queued.
    pub fn update_content(&mut self, id: WidgetId, content: String) -> Result<(), BoardError> {
        let widget = self.widgets.get_mut(&id).ok_or(BoardError::WidgetNotFound(id))?;
        widget.content.clone_from(&content);
        self.queue.enqueue(PersistRequest::Content { id, content })?;
        Ok(())
    }

    /// Apply an item edit to a todo-list widget. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// `WidgetNotFound`, `WrongKind` for other kinds, or `Queue`.
    pub fn edit_todo(&mut self, id: WidgetId, edit: &TodoEdit) -> Result<bool, BoardError> {
        let widget = self.widgets.get(&id).ok_or(BoardError::WidgetNotFound(id))?;
        if widget.kind != WidgetKind::TodoList {
            return Err(BoardError::WrongKind { id, kind: widget.kind, expected: WidgetKind::TodoList });
        }
        let mut list = TodoList::parse(&widget.content);
        if !list.apply(edit) {
            return Ok(false);
        }
        self.update_content(id, list.to_content())?;
        Ok(true)
    }

    /// Flip the display-only expanded flag. Returns the new value.
    ///
    /// # Errors
    ///
    /// `WidgetNotFound`.
    pub fn toggle_expanded(&mut self, id: WidgetId) -> Result<bool, BoardError> {
        let widget = self.widgets.get_mut(&id).ok_or(BoardError::WidgetNotFound(id))?;
        widget.expanded = !widget.expanded;
        Ok(widget.expanded)
    }

    /// Remove a widget locally and queue its deletion. Never rolled back.
    ///
    /// # Errors
    ///
    /// `WidgetNotFound`, or `Queue` when the delete could not be queued.
    pub fn delete_widget(&mut self, id: WidgetId) -> Result<(), BoardError> {
        self.widgets.remove(&id).ok_or(BoardError::WidgetNotFound(id))?;
        self.stale_styles.remove(&id);
        debug!(%id, "widget deleted locally");
        self.queue.enqueue(PersistRequest::Delete { id })?;
        Ok(())
    }

    /// Remove every widget of the dashboard, locally and remotely.
    ///
    /// Callers confirm with the user first. Pending writes are flushed
    /// before the bulk delete so none of them lands afterwards.
    ///
    /// # Errors
    ///
    /// `DashboardNotResolved`, `Queue` when the worker is gone, or `Store`
    /// when the bulk delete fails.
    pub async fn clear_dashboard(&mut self) -> Result<usize, BoardError> {
        let dashboard_id = self.require_dashboard()?;
        let removed = self.widgets.clear();
        self.stale_styles.clear();
        if !self.engine.cancel().is_empty() {
            debug!("active gesture abandoned by clear");
        }
        self.settle().await?;
        if let Err(e) = self.store.delete_all_for_dashboard(dashboard_id).await {
            error!(error = %e, %dashboard_id, "clear dashboard failed");
            return Err(e.into());
        }
        info!(%dashboard_id, removed, "dashboard cleared");
        Ok(removed)
    }

    /// Upload an image and make its public URL the widget's content.
    ///
    /// # Errors
    ///
    /// `WidgetNotFound`, `WrongKind` for non-image widgets, `Store` when the
    /// upload fails (content is left unchanged), or `Queue`.
    pub async fn upload_image(
        &mut self,
        id: WidgetId,
        uploader: &dyn ImageUploader,
        file: &ImageFile,
    ) -> Result<String, BoardError> {
        let widget = self.widgets.get(&id).ok_or(BoardError::WidgetNotFound(id))?;
        if widget.kind != WidgetKind::Image {
            return Err(BoardError::WrongKind { id, kind: widget.kind, expected: WidgetKind::Image });
        }
        let url = match uploader.upload_image(file).await {
            Ok(url) => url,
            Err(e) => {
                error!(error = %e, %id, file = %file.name, "image upload failed");
                return Err(e.into());
            }
        };
        self.update_content(id, url.clone())?;
        Ok(url)
    }

    // =========================================================================
    // EXPLICIT SAVE
    // =========================================================================

    /// Write a widget's content now and wait for the store to confirm.
    ///
    /// Queued writes are flushed first so an older queued edit cannot land
    /// after this one.
    ///
    /// # Errors
    ///
    /// `WidgetNotFound`, `Queue` when the worker is gone, or `Persist` when
    /// the store rejects the write.
    pub async fn save_widget(&mut self, id: WidgetId) -> Result<(), BoardError> {
        let content = self.widgets.get(&id).ok_or(BoardError::WidgetNotFound(id))?.content.clone();
        self.flush_style(id)?;
        self.settle().await?;
        if let Err(e) = self.store.update_content(id, &content).await {
            error!(%id, error = %e, "save widget failed");
            return Err(BoardError::Persist { id, op: "update_content", source: e });
        }
        info!(%id, "widget saved");
        Ok(())
    }

    /// Retry pending style writes, flush the queue, and stamp every
    /// component of the dashboard as saved. Returns the widget count.
    ///
    /// # Errors
    ///
    /// `DashboardNotResolved`, `Queue`, or `Store` when the stamp fails.
    pub async fn save_all(&mut self) -> Result<usize, BoardError> {
        let dashboard_id = self.require_dashboard()?;
        let pending: Vec<WidgetId> = self.stale_styles.iter().copied().collect();
        for id in pending {
            self.flush_style(id)?;
        }
        self.settle().await?;
        if let Err(e) = self.store.touch_dashboard(dashboard_id).await {
            error!(%dashboard_id, error = %e, "save all failed");
            return Err(e.into());
        }
        let count = self.widgets.len();
        info!(%dashboard_id, count, "dashboard saved");
        Ok(count)
    }

    // =========================================================================
    // POINTER INPUT
    // =========================================================================

    /// Report the board surface's client-space origin and size.
    pub fn set_surface(&mut self, origin: Point, size: Size) {
        self.engine.set_surface(origin, size);
    }

    /// Feed a pointer press. Starts a drag or resize when it lands on a
    /// widget's header or handle.
    pub fn pointer_down(&mut self, client: Point, button: Button) -> Vec<Action> {
        self.engine.on_pointer_down(client, button, &self.widgets)
    }

    /// Feed a pointer move from the root surface and apply the result.
    pub fn pointer_move(&mut self, client: Point) -> Vec<Action> {
        let actions = self.engine.on_pointer_move(client, &self.widgets);
        self.apply_actions(&actions);
        actions
    }

    /// Feed a pointer release from the root surface and apply the result.
    pub fn pointer_up(&mut self) -> Vec<Action> {
        let actions = self.engine.on_pointer_up();
        self.apply_actions(&actions);
        actions
    }

    /// Abandon the active gesture. A partial resize is reverted.
    pub fn cancel_gesture(&mut self) -> Vec<Action> {
        let actions = self.engine.cancel();
        self.apply_actions(&actions);
        actions
    }

    fn apply_actions(&mut self, actions: &[Action]) {
        for action in actions {
            let result = match action {
                Action::WidgetMoved { id, position } => self.move_widget(*id, *position),
                Action::WidgetResized { id, size } => self.resize_widget(*id, *size).map(|_| ()),
                Action::ResizeFinished { id, size } => {
                    self.resize_widget(*id, *size).and_then(|_| self.commit_size(*id))
                }
                Action::ResizeReverted { id, size } => self.restore_size(*id, *size),
                Action::SetTextSelection(_) | Action::SetCursor(_) | Action::RenderNeeded => Ok(()),
            };
            match result {
                Ok(()) => {}
                Err(BoardError::WidgetNotFound(id)) => debug!(%id, "gesture target vanished"),
                Err(e) => self.report(e),
            }
        }
    }

    /// Put back a size captured before a gesture, without the minimum clamp.
    fn restore_size(&mut self, id: WidgetId, size: Size) -> Result<(), BoardError> {
        let widget = self.widgets.get_mut(&id).ok_or(BoardError::WidgetNotFound(id))?;
        widget.size = size;
        Ok(())
    }

    /// Record an error for `take_errors`. Repeats of the last queue error
    /// are collapsed so a drag against a full queue reports once.
    fn report(&mut self, e: BoardError) {
        if let (Some(BoardError::Queue(last)), BoardError::Queue(current)) = (self.errors.last(), &e) {
            if last == current {
                debug!(error = %e, "repeated queue error collapsed");
                return;
            }
        }
        warn!(error = %e, "board update failed");
        self.errors.push(e);
    }

    // =========================================================================
    // ERRORS & SYNC
    // =========================================================================

    /// Drain failures collected since the last call, oldest first.
    pub fn take_errors(&mut self) -> Vec<BoardError> {
        while let Ok(PersistFailure { id, op, error }) = self.failures.try_recv() {
            if op != "delete_component" && self.widgets.get(&id).is_none() {
                debug!(%id, op, error = %error, "dropping failure for removed widget");
                continue;
            }
            self.errors.push(BoardError::Persist { id, op, source: error });
        }
        std::mem::take(&mut self.errors)
    }

    /// Wait until every queued write has been attempted.
    ///
    /// # Errors
    ///
    /// `Queue(Stopped)` when the worker is gone.
    pub async fn settle(&self) -> Result<(), BoardError> {
        self.queue.barrier().await?;
        Ok(())
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    #[must_use]
    pub fn dashboard_id(&self) -> Option<Uuid> {
        self.dashboard_id
    }

    #[must_use]
    pub fn widgets(&self) -> &WidgetStore {
        &self.widgets
    }

    #[must_use]
    pub fn widget(&self, id: WidgetId) -> Option<&Widget> {
        self.widgets.get(&id)
    }

    /// Widgets in draw order, bottom first.
    #[must_use]
    pub fn render_order(&self) -> Vec<&Widget> {
        self.widgets.sorted_for_render()
    }

    #[must_use]
    pub fn engine(&self) -> &InteractionEngine {
        &self.engine
    }

    fn require_dashboard(&self) -> Result<Uuid, BoardError> {
        self.dashboard_id.ok_or(BoardError::DashboardNotResolved)
    }
}
