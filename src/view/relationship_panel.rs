use crate::application_port::*;
use crate::domain_model::*;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// What a profile page or user card renders for one target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    /// Last view received from the core. `None` until the first resolve lands.
    pub view: Option<RelationshipView>,
    /// Diagnostic for the most recent failed operation, shown next to the
    /// last-known view.
    pub last_error: Option<String>,
    /// Intent to re-issue on retry after a failed command.
    pub pending_retry: Option<FollowIntent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelOutcome {
    Applied,
    /// A result issued later has already been applied.
    Superseded,
    Failed,
    /// The panel was unmounted; nothing was applied.
    Abandoned,
    /// The action is not available for this viewer.
    Unavailable,
}

struct Shared {
    state: PanelState,
    applied_seq: u64,
    /// Sequence of the failure behind `last_error`.
    failed_seq: u64,
}

/// Caller-side holder of the cached [`RelationshipView`] for one
/// `(viewer, target)` pair.
pub struct RelationshipPanel {
    viewer: Option<UserId>,
    target: UserId,
    resolver: Arc<dyn FollowResolver>,
    commands: Arc<dyn FollowCommandHandler>,
    next_seq: AtomicU64,
    shared: Mutex<Shared>,
    unmounted: CancellationToken,
}

impl RelationshipPanel {
    pub fn new(
        viewer: Option<UserId>,
        target: UserId,
        resolver: Arc<dyn FollowResolver>,
        commands: Arc<dyn FollowCommandHandler>,
    ) -> Self {
        Self {
            viewer,
            target,
            resolver,
            commands,
            next_seq: AtomicU64::new(0),
            shared: Mutex::new(Shared {
                state: PanelState::default(),
                applied_seq: 0,
                failed_seq: 0,
            }),
            unmounted: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> PanelState {
        self.lock().state.clone()
    }

    /// Whether the follow button is shown at all.
    pub fn can_act(&self) -> bool {
        matches!(&self.viewer, Some(viewer) if viewer != &self.target)
    }

    pub fn unmount(&self) {
        self.unmounted.cancel();
    }

    pub async fn refresh(&self) -> PanelOutcome {
        let seq = self.issue();
        let resolved = self
            .guarded(self.resolver.resolve(self.viewer.as_ref(), &self.target))
            .await;
        match resolved {
            None => PanelOutcome::Abandoned,
            Some(Ok(view)) => self.apply(seq, view),
            Some(Err(e)) => self.fail(seq, e.to_string(), None),
        }
    }

    /// Issue the inverse of the currently displayed state.
    pub async fn toggle(&self) -> PanelOutcome {
        let shown = self.lock().state.view.map(|v| v.is_following);
        let Some(is_following) = shown else {
            debug!(profile = %self.target, "toggle before first resolve ignored");
            return PanelOutcome::Unavailable;
        };
        self.run(FollowIntent::toggle_from(is_following)).await
    }

    pub async fn retry(&self) -> PanelOutcome {
        let pending = self.lock().state.pending_retry;
        match pending {
            Some(intent) => self.run(intent).await,
            None => self.refresh().await,
        }
    }

    async fn run(&self, intent: FollowIntent) -> PanelOutcome {
        if !self.can_act() {
            return PanelOutcome::Unavailable;
        }
        let Some(actor) = self.viewer.as_ref() else {
            return PanelOutcome::Unavailable;
        };

        let seq = self.issue();
        let executed = self
            .guarded(self.commands.execute(actor, &self.target, intent))
            .await;
        match executed {
            None => PanelOutcome::Abandoned,
            Some(Ok(view)) => self.apply(seq, view),
            Some(Err(e)) => self.fail(seq, e.to_string(), Some(intent)),
        }
    }

    async fn guarded<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            _ = self.unmounted.cancelled() => None,
            out = fut => (!self.unmounted.is_cancelled()).then_some(out),
        }
    }

    fn issue(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn apply(&self, seq: u64, view: RelationshipView) -> PanelOutcome {
        let mut shared = self.lock();
        if seq <= shared.applied_seq {
            debug!(profile = %self.target, seq, "stale result dropped");
            return PanelOutcome::Superseded;
        }
        shared.applied_seq = seq;
        shared.state.view = Some(view);
        // a newer failure keeps its diagnostic and retry
        if seq > shared.failed_seq {
            shared.state.last_error = None;
            shared.state.pending_retry = None;
        }
        PanelOutcome::Applied
    }

    /// Keeps the last-known view; only the diagnostic changes.
    fn fail(&self, seq: u64, error: String, retry: Option<FollowIntent>) -> PanelOutcome {
        warn!(profile = %self.target, "relationship update failed: {error}");
        let mut shared = self.lock();
        if seq <= shared.applied_seq {
            return PanelOutcome::Superseded;
        }
        if seq < shared.failed_seq {
            return PanelOutcome::Superseded;
        }
        shared.failed_seq = seq;
        shared.state.last_error = Some(error);
        shared.state.pending_retry = retry;
        PanelOutcome::Failed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{RealFollowCommandHandler, RealFollowResolver};
    use crate::domain_port::StoreError;
    use crate::testing::RecordingStore;
    use std::time::Duration;

    fn panel(store: &Arc<RecordingStore>, viewer: Option<&str>, target: &str) -> RelationshipPanel {
        RelationshipPanel::new(
            viewer.map(UserId::from),
            target.into(),
            Arc::new(RealFollowResolver::new(store.clone())),
            Arc::new(RealFollowCommandHandler::new(
                store.clone(),
                CountStrategy::Optimistic,
            )),
        )
    }

    #[tokio::test]
    async fn toggle_flips_displayed_state() {
        let store = Arc::new(RecordingStore::memory());
        let panel = panel(&store, Some("u2"), "u1");

        assert_eq!(panel.refresh().await, PanelOutcome::Applied);
        assert_eq!(panel.state().view, Some(RelationshipView::new(false, 0)));

        assert_eq!(panel.toggle().await, PanelOutcome::Applied);
        assert_eq!(panel.state().view, Some(RelationshipView::new(true, 1)));

        assert_eq!(panel.toggle().await, PanelOutcome::Applied);
        assert_eq!(panel.state().view, Some(RelationshipView::new(false, 0)));
    }

    #[tokio::test]
    async fn failed_command_keeps_last_view_and_can_retry() {
        let store = Arc::new(RecordingStore::memory());
        let panel = panel(&store, Some("u2"), "u1");
        panel.refresh().await;

        store.fail_creates_with(StoreError::Timeout {
            origin: "insert".into(),
        });
        assert_eq!(panel.toggle().await, PanelOutcome::Failed);
        let state = panel.state();
        assert_eq!(state.view, Some(RelationshipView::new(false, 0)));
        assert!(state.last_error.is_some());
        assert_eq!(state.pending_retry, Some(FollowIntent::Follow));

        store.clear_failures();
        assert_eq!(panel.retry().await, PanelOutcome::Applied);
        let state = panel.state();
        assert_eq!(state.view, Some(RelationshipView::new(true, 1)));
        assert_eq!(state.last_error, None);
        assert_eq!(state.pending_retry, None);
    }

    #[tokio::test]
    async fn anonymous_viewer_cannot_act() {
        let store = Arc::new(RecordingStore::memory());
        let panel = panel(&store, None, "u1");
        panel.refresh().await;

        assert!(!panel.can_act());
        assert_eq!(panel.toggle().await, PanelOutcome::Unavailable);
        assert_eq!(store.calls().create_edge, 0);
    }

    #[tokio::test]
    async fn own_profile_cannot_act() {
        let store = Arc::new(RecordingStore::memory());
        let panel = panel(&store, Some("u1"), "u1");
        panel.refresh().await;

        assert_eq!(panel.toggle().await, PanelOutcome::Unavailable);
        assert_eq!(panel.state().view, Some(RelationshipView::new(false, 0)));
    }

    #[tokio::test]
    async fn unmount_abandons_in_flight_refresh() {
        let store = Arc::new(RecordingStore::memory().with_latency(Duration::from_millis(50)));
        let panel = Arc::new(panel(&store, Some("u2"), "u1"));

        let refresh = {
            let panel = panel.clone();
            tokio::spawn(async move { panel.refresh().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        panel.unmount();

        assert_eq!(refresh.await.unwrap(), PanelOutcome::Abandoned);
        assert_eq!(panel.state(), PanelState::default());
    }

    /// Reads immediately, then holds the answer back before returning it.
    struct SlowResolver {
        inner: RealFollowResolver,
        hold: Duration,
    }

    #[async_trait::async_trait]
    impl FollowResolver for SlowResolver {
        async fn resolve(
            &self,
            viewer: Option<&UserId>,
            target: &UserId,
        ) -> Result<RelationshipView, StoreError> {
            let view = self.inner.resolve(viewer, target).await;
            tokio::time::sleep(self.hold).await;
            view
        }

        async fn resolve_many(
            &self,
            viewer: Option<&UserId>,
            targets: &[UserId],
        ) -> Result<Vec<RelationshipView>, StoreError> {
            self.inner.resolve_many(viewer, targets).await
        }
    }

    /// First command succeeds after a delay, every later one fails at once.
    struct SlowThenFailing {
        calls: std::sync::atomic::AtomicUsize,
        hold: Duration,
    }

    #[async_trait::async_trait]
    impl FollowCommandHandler for SlowThenFailing {
        async fn execute(
            &self,
            _actor: &UserId,
            _target: &UserId,
            _intent: FollowIntent,
        ) -> Result<RelationshipView, CommandError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(self.hold).await;
                Ok(RelationshipView::new(true, 1))
            } else {
                Err(CommandError::StoreFailure(StoreError::Timeout {
                    origin: "delete".into(),
                }))
            }
        }
    }

    #[tokio::test]
    async fn older_success_keeps_newer_failure_retryable() {
        let store = Arc::new(RecordingStore::memory());
        let panel = Arc::new(RelationshipPanel::new(
            Some("u2".into()),
            "u1".into(),
            Arc::new(RealFollowResolver::new(store)),
            Arc::new(SlowThenFailing {
                calls: std::sync::atomic::AtomicUsize::new(0),
                hold: Duration::from_millis(50),
            }),
        ));

        let slow_follow = {
            let panel = panel.clone();
            tokio::spawn(async move { panel.run(FollowIntent::Follow).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(panel.run(FollowIntent::Unfollow).await, PanelOutcome::Failed);
        assert_eq!(slow_follow.await.unwrap(), PanelOutcome::Applied);

        let state = panel.state();
        assert_eq!(state.view, Some(RelationshipView::new(true, 1)));
        assert!(state.last_error.is_some());
        assert_eq!(state.pending_retry, Some(FollowIntent::Unfollow));
    }

    #[tokio::test]
    async fn stale_refresh_does_not_overwrite_newer_command() {
        let store = Arc::new(RecordingStore::memory());
        let commands = Arc::new(RealFollowCommandHandler::new(
            store.clone(),
            CountStrategy::Optimistic,
        ));
        let slow = RelationshipPanel::new(
            Some("u2".into()),
            "u1".into(),
            Arc::new(SlowResolver {
                inner: RealFollowResolver::new(store.clone()),
                hold: Duration::from_millis(50),
            }),
            commands,
        );
        let panel = Arc::new(slow);

        // seed the displayed state without waiting on the slow resolver
        panel.apply(panel.issue(), RelationshipView::new(false, 0));

        let stale_refresh = {
            let panel = panel.clone();
            tokio::spawn(async move { panel.refresh().await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(panel.toggle().await, PanelOutcome::Applied);
        assert_eq!(stale_refresh.await.unwrap(), PanelOutcome::Superseded);
        assert_eq!(panel.state().view, Some(RelationshipView::new(true, 1)));
    }
}
