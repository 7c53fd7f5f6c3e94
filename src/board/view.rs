//! Board view: owns one board's cache for as long as the board is open.
//!
//! Mounting fetches the board, then columns, then tasks, and starts two
//! workers: a refetch worker that re-pulls stale collections whenever the
//! cache changes (never during a drag), and a pump that feeds the realtime
//! channel into the [`EventApplier`]. Disposing the view reverts an active
//! drag, leaves the channel and mutes in-flight command completions.

use std::sync::Arc;
use std::time::Duration;

use boardsync_common::{Board, BoardId, ChannelScope};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::access::{ArchivedFlag, DragGate, PermissionCheck, StaticPermissions};
use super::cache::{BoardCache, CacheHandle, Collection, FetchApplied};
use super::channel::{ChannelMessage, RealtimeChannel, Subscription};
use super::client::BoardApi;
use super::drag::{DragItem, DragSession, DragState, DropOutcome, HoverOutcome, HoverTarget};
use super::mutator::{self, InFlight, ReconcilingMutator};
use super::notify::{Notification, Notifier};
use super::realtime::EventApplier;
use crate::errors::{DragRejection, SyncError};

/// Re-pull every stale collection, columns before tasks.
///
/// Stops early when a drag is in progress and skips collections with an
/// unanswered command; whatever was not fetched stays stale for the next
/// pass.
pub async fn refresh_stale(
    api: &dyn BoardApi,
    cache: &CacheHandle,
) -> Result<Vec<(Collection, FetchApplied)>, SyncError> {
    let board_id = cache.read(|c| c.board_id());
    let mut applied = Vec::new();
    for collection in cache.read(|c| c.refetchable_collections()) {
        if cache.read(|c| c.is_dragging()) {
            break;
        }
        let ticket = cache.read(|c| c.begin_fetch(collection));
        let outcome = match collection {
            Collection::Columns => {
                let columns = api.fetch_columns(board_id).await?;
                cache.write(|c| c.complete_columns_fetch(ticket, columns))
            }
            Collection::Tasks => {
                let tasks = api.fetch_tasks(board_id).await?;
                cache.write(|c| c.complete_tasks_fetch(ticket, tasks))
            }
        };
        tracing::debug!(board = %board_id, ?collection, ?outcome, "refetched");
        applied.push((collection, outcome));
    }
    Ok(applied)
}

pub struct ViewOptions {
    pub permissions: Arc<dyn PermissionCheck>,
    /// Channel and scope to join; `None` for a view without pushes.
    pub realtime: Option<(RealtimeChannel, ChannelScope)>,
    /// Delay before the refetch worker retries after a failed fetch.
    pub refetch_retry: Duration,
    pub notifier: Notifier,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            permissions: Arc::new(StaticPermissions::allow_all()),
            realtime: None,
            refetch_retry: Duration::from_secs(2),
            notifier: Notifier::default(),
        }
    }
}

/// Result of ending a drag through the view.
#[derive(Debug)]
pub struct Dropped {
    pub outcome: DropOutcome,
    /// The confirming command, when the drop changed the order.
    pub command: Option<InFlight>,
}

pub struct BoardView {
    board_id: BoardId,
    api: Arc<dyn BoardApi>,
    cache: CacheHandle,
    session: DragSession,
    mutator: ReconcilingMutator,
    applier: EventApplier,
    notifier: Notifier,
    shutdown: CancellationToken,
    subscription: Option<Subscription>,
    workers: Vec<JoinHandle<()>>,
    refetch_retry: Duration,
}

impl BoardView {
    pub async fn mount(board_id: BoardId, api: Arc<dyn BoardApi>, options: ViewOptions) -> Result<Self, SyncError> {
        let board = api.fetch_board(board_id).await?;
        let archived = ArchivedFlag::new(board.archived);
        let cache = CacheHandle::new(BoardCache::new(board_id));
        cache.write(|c| c.set_board(board));
        refresh_stale(api.as_ref(), &cache).await?;

        let gate = DragGate::new(board_id, options.permissions, archived);
        let mut view = Self {
            board_id,
            api: Arc::clone(&api),
            cache: cache.clone(),
            session: DragSession::new(gate),
            mutator: ReconcilingMutator::new(api, cache.clone(), options.notifier.clone()),
            applier: EventApplier::new(cache),
            notifier: options.notifier,
            shutdown: CancellationToken::new(),
            subscription: None,
            workers: Vec::new(),
            refetch_retry: options.refetch_retry,
        };
        view.spawn_refetch_worker();

        if let Some((channel, scope)) = options.realtime {
            let (tx, rx) = mpsc::channel(256);
            view.subscription = Some(channel.subscribe(scope, tx));
            view.attach_events(rx);
        }

        tracing::info!(
            board = %board_id,
            columns = view.cache.read(|c| c.columns().len()),
            tasks = view.cache.read(|c| c.tasks().len()),
            "board mounted"
        );
        Ok(view)
    }

    /// Feed realtime messages from `rx` into this board's cache. Used for
    /// the view's own subscription and for hosts that share one
    /// workspace-wide channel across several boards.
    pub fn attach_events(&mut self, mut rx: mpsc::Receiver<ChannelMessage>) {
        let applier = self.applier.clone();
        let shutdown = self.shutdown.clone();
        self.workers.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Some(ChannelMessage::Event(event)) => {
                            applier.apply(&event);
                        }
                        Some(ChannelMessage::Reconnected) => applier.reconnected(),
                        None => break,
                    },
                }
            }
        }));
    }

    fn spawn_refetch_worker(&mut self) {
        let api = Arc::clone(&self.api);
        let cache = self.cache.clone();
        let shutdown = self.shutdown.clone();
        let retry = self.refetch_retry;
        let notifier = self.notifier.clone();
        let board_id = self.board_id;
        self.workers.push(tokio::spawn(async move {
            let mut revisions = cache.subscribe();
            loop {
                revisions.borrow_and_update();
                let pending = cache.read(|c| !c.refetchable_collections().is_empty());
                if pending {
                    let result = tokio::select! {
                        _ = shutdown.cancelled() => break,
                        result = refresh_stale(api.as_ref(), &cache) => result,
                    };
                    match result {
                        Ok(_) => continue,
                        Err(e) if e.is_transient() => {
                            tracing::warn!(error = %e, "background refetch failed, retrying");
                            tokio::select! {
                                _ = shutdown.cancelled() => break,
                                _ = tokio::time::sleep(retry) => continue,
                            }
                        }
                        // Retrying cannot help; wait for the next change instead.
                        Err(e) => {
                            tracing::warn!(error = %e, "background refetch failed");
                            notifier.error(format!("Could not refresh board {board_id}: {e}"));
                        }
                    }
                }
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    changed = revisions.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        }));
    }

    pub fn board_id(&self) -> BoardId {
        self.board_id
    }

    pub fn board(&self) -> Option<Board> {
        self.cache.read(|c| c.board().cloned())
    }

    pub fn cache(&self) -> &CacheHandle {
        &self.cache
    }

    pub fn archived(&self) -> &ArchivedFlag {
        self.session.gate().archived()
    }

    pub fn drag_state(&self) -> DragState {
        self.session.state()
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    // ── Drag ─────────────────────────────────────────────────────────

    pub fn begin_drag(&mut self, item: DragItem) -> Result<(), DragRejection> {
        self.cache.write(|c| self.session.start(c, item))
    }

    pub fn hover(&mut self, target: HoverTarget) -> HoverOutcome {
        self.cache.write(|c| self.session.hover(c, target))
    }

    pub fn drop_on(&mut self, target: Option<HoverTarget>) -> Dropped {
        let (outcome, staged) = self.cache.write(|c| {
            let outcome = self.session.drop_on(c, target);
            let staged = match &outcome {
                DropOutcome::Committed(completed) => mutator::stage(c, completed),
                DropOutcome::NoOp(_) => None,
            };
            (outcome, staged)
        });
        let command = staged.map(|command| self.mutator.send(command));
        Dropped { outcome, command }
    }

    pub fn cancel_drag(&mut self) -> bool {
        self.cache.write(|c| self.session.cancel(c))
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Manual reload of both collections. A failure here is surfaced.
    pub async fn refresh(&self) -> Result<(), SyncError> {
        self.cache.write(|c| {
            c.invalidate(Collection::Columns);
            c.invalidate(Collection::Tasks);
        });
        if let Err(e) = refresh_stale(self.api.as_ref(), &self.cache).await {
            self.notifier.error(format!("Could not refresh board {}: {}", self.board_id, e));
            return Err(e);
        }
        Ok(())
    }

    // ── Teardown ─────────────────────────────────────────────────────

    /// Tear down and wait for the channel to be left and workers to stop.
    pub async fn dispose(mut self) {
        self.teardown();
        if let Some(subscription) = self.subscription.take() {
            subscription.close().await;
        }
        for worker in self.workers.drain(..) {
            let _ = worker.await;
        }
        tracing::info!(board = %self.board_id, "board disposed");
    }

    fn teardown(&mut self) {
        if self.session.is_active() {
            self.cache.write(|c| self.session.cancel(c));
        }
        self.mutator.shutdown();
        self.shutdown.cancel();
        if let Some(subscription) = &self.subscription {
            subscription.unsubscribe();
        }
    }
}

impl Drop for BoardView {
    fn drop(&mut self) {
        self.teardown();
    }
}
