//! In-memory undo/redo history over full-state snapshots.

use parking_lot::Mutex;

/// A captured full-state serialization of the live editing surface.
pub type HistoryState = String;

/// Callback invoked with the state to restore on undo/redo.
pub type RestoreFn = Box<dyn Fn(&str) + Send + Sync>;

/// Callback invoked after every history transition.
pub type ChangeFn = Box<dyn Fn(HistoryStatus) + Send + Sync>;

/// Observable history status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryStatus {
    /// Whether an undo step is available.
    pub can_undo: bool,
    /// Whether a redo step is available.
    pub can_redo: bool,
    /// Depth of the undo stack (including the current state).
    pub undo_depth: usize,
    /// Depth of the redo stack.
    pub redo_depth: usize,
}

/// What the manager is doing right now.
///
/// Capturing and restoring are mutually exclusive with everything else:
/// a `save_state` observed while the phase is not [`HistoryPhase::Idle`]
/// is suppressed, which is what keeps a restore from re-capturing itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryPhase {
    Idle,
    Capturing,
    Restoring,
}

struct HistoryInner {
    undo: Vec<HistoryState>,
    redo: Vec<HistoryState>,
    phase: HistoryPhase,
    disposed: bool,
}

impl HistoryInner {
    fn status(&self) -> HistoryStatus {
        HistoryStatus {
            // The bottom entry is the current state, not a previous one.
            can_undo: self.undo.len() > 1,
            can_redo: !self.redo.is_empty(),
            undo_depth: self.undo.len(),
            redo_depth: self.redo.len(),
        }
    }
}

/// Session-local undo/redo stack of full-state snapshots.
///
/// The editing surface pushes a serialized state on every observed
/// mutation; `undo`/`redo` hand a previous state back through the
/// on-restore callback. Replaying a state does not capture a new one: the
/// manager is in the `Restoring` phase for the duration of the callback
/// and suppresses re-entrant `save_state` calls.
///
/// # Example
///
/// ```rust
/// use folio_core::HistoryManager;
///
/// let history = HistoryManager::new(50);
/// history.save_state("s1");
/// history.save_state("s2");
/// assert!(history.can_undo());
/// assert!(history.undo());
/// assert_eq!(history.current_state().as_deref(), Some("s1"));
/// ```
pub struct HistoryManager {
    inner: Mutex<HistoryInner>,
    max_depth: usize,
    on_restore: Option<RestoreFn>,
    on_change: Option<ChangeFn>,
}

impl HistoryManager {
    /// Creates a manager bounded at `max_depth` retained states.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            inner: Mutex::new(HistoryInner {
                undo: Vec::new(),
                redo: Vec::new(),
                phase: HistoryPhase::Idle,
                disposed: false,
            }),
            max_depth: max_depth.max(2),
            on_restore: None,
            on_change: None,
        }
    }

    /// Sets the callback that receives the state to restore on undo/redo.
    #[must_use]
    pub fn with_on_restore(mut self, callback: RestoreFn) -> Self {
        self.on_restore = Some(callback);
        self
    }

    /// Sets the observer notified after every transition.
    #[must_use]
    pub fn with_on_change(mut self, callback: ChangeFn) -> Self {
        self.on_change = Some(callback);
        self
    }

    /// Captures a new state.
    ///
    /// Clears the redo branch and evicts the oldest state beyond the depth
    /// bound. Returns `false` when the capture was suppressed — the
    /// manager was disposed, mid-restore, or already capturing.
    pub fn save_state(&self, state: impl Into<HistoryState>) -> bool {
        let status = {
            let mut inner = self.inner.lock();
            if inner.disposed || inner.phase != HistoryPhase::Idle {
                tracing::debug!(phase = ?inner.phase, "state capture suppressed");
                return false;
            }
            inner.phase = HistoryPhase::Capturing;
            inner.redo.clear();
            inner.undo.push(state.into());
            if inner.undo.len() > self.max_depth {
                inner.undo.remove(0);
            }
            inner.status()
        };

        // Observers run in the Capturing phase, so a change handler that
        // calls save_state again is suppressed rather than looping.
        self.emit(status);
        self.inner.lock().phase = HistoryPhase::Idle;
        true
    }

    /// Steps back one state, delivering it through the on-restore
    /// callback. Returns `false` when there is nothing to undo.
    pub fn undo(&self) -> bool {
        self.step(true)
    }

    /// Steps forward one state, symmetric to [`HistoryManager::undo`].
    pub fn redo(&self) -> bool {
        self.step(false)
    }

    fn step(&self, backward: bool) -> bool {
        let state = {
            let mut inner = self.inner.lock();
            if inner.disposed || inner.phase != HistoryPhase::Idle {
                return false;
            }
            let state = if backward {
                if inner.undo.len() <= 1 {
                    return false;
                }
                let current = inner.undo.pop().unwrap_or_default();
                inner.redo.push(current);
                inner.undo.last().cloned().unwrap_or_default()
            } else {
                let Some(next) = inner.redo.pop() else {
                    return false;
                };
                inner.undo.push(next.clone());
                next
            };
            inner.phase = HistoryPhase::Restoring;
            state
        };

        if let Some(on_restore) = &self.on_restore {
            on_restore(&state);
        }

        let status = {
            let mut inner = self.inner.lock();
            inner.phase = HistoryPhase::Idle;
            inner.status()
        };
        self.emit(status);
        true
    }

    /// Whether an undo step is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.inner.lock().status().can_undo
    }

    /// Whether a redo step is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.inner.lock().status().can_redo
    }

    /// The current state, if any has been captured.
    #[must_use]
    pub fn current_state(&self) -> Option<HistoryState> {
        self.inner.lock().undo.last().cloned()
    }

    /// Returns the observable status.
    #[must_use]
    pub fn get_history_status(&self) -> HistoryStatus {
        self.inner.lock().status()
    }

    /// Clears all history and stops accepting captures.
    pub fn dispose(&self) {
        let mut inner = self.inner.lock();
        inner.undo.clear();
        inner.redo.clear();
        inner.disposed = true;
    }

    fn emit(&self, status: HistoryStatus) {
        if let Some(on_change) = &self.on_change {
            on_change(status);
        }
    }
}

impl std::fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.get_history_status();
        f.debug_struct("HistoryManager")
            .field("status", &status)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn empty_history_cannot_step() {
        let history = HistoryManager::new(10);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(!history.undo());
        assert!(!history.redo());
        assert!(history.current_state().is_none());
    }

    #[test]
    fn single_state_is_current_not_previous() {
        let history = HistoryManager::new(10);
        history.save_state("s1");
        assert!(!history.can_undo());
        assert_eq!(history.current_state().as_deref(), Some("s1"));
    }

    #[test]
    fn undo_twice_then_redo_once() {
        let history = HistoryManager::new(10);
        history.save_state("s1");
        history.save_state("s2");
        history.save_state("s3");

        assert!(history.undo());
        assert!(history.undo());
        assert_eq!(history.current_state().as_deref(), Some("s1"));
        assert!(history.can_redo());

        assert!(history.redo());
        assert_eq!(history.current_state().as_deref(), Some("s2"));
    }

    #[test]
    fn new_capture_clears_redo_branch() {
        let history = HistoryManager::new(10);
        history.save_state("s1");
        history.save_state("s2");
        history.undo();
        assert!(history.can_redo());

        history.save_state("s2'");
        assert!(!history.can_redo());
        assert_eq!(history.current_state().as_deref(), Some("s2'"));
    }

    #[test]
    fn undo_redo_symmetry() {
        let history = HistoryManager::new(32);
        for i in 1..=5 {
            history.save_state(format!("s{i}"));
        }
        let before = history.current_state();
        for _ in 0..4 {
            assert!(history.undo());
        }
        for _ in 0..4 {
            assert!(history.redo());
        }
        assert_eq!(history.current_state(), before);
    }

    #[test]
    fn depth_bound_evicts_oldest_first() {
        let history = HistoryManager::new(3);
        for i in 1..=5 {
            history.save_state(format!("s{i}"));
        }
        let status = history.get_history_status();
        assert_eq!(status.undo_depth, 3);

        // Walk back to the oldest retained state.
        while history.undo() {}
        assert_eq!(history.current_state().as_deref(), Some("s3"));
    }

    #[test]
    fn restore_callback_receives_state() {
        let restored: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&restored);
        let history = HistoryManager::new(10)
            .with_on_restore(Box::new(move |state| sink.lock().push(state.to_string())));

        history.save_state("s1");
        history.save_state("s2");
        history.undo();
        history.redo();

        assert_eq!(*restored.lock(), vec!["s1".to_string(), "s2".to_string()]);
    }

    #[test]
    fn on_change_fires_for_every_transition() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let history = HistoryManager::new(10).with_on_change(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        history.save_state("s1");
        history.save_state("s2");
        history.undo();
        history.redo();
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn restore_cannot_recapture_itself() {
        // The editing surface's mutation observer fires while a state is
        // being replayed; that capture must be suppressed.
        let slot: Arc<std::sync::OnceLock<Arc<HistoryManager>>> =
            Arc::new(std::sync::OnceLock::new());
        let slot_in_callback = Arc::clone(&slot);
        let history = Arc::new(HistoryManager::new(10).with_on_restore(Box::new(move |_| {
            if let Some(history) = slot_in_callback.get() {
                assert!(!history.save_state("from-restore"));
            }
        })));
        let _ = slot.set(Arc::clone(&history));

        history.save_state("s1");
        history.save_state("s2");
        assert!(history.undo());

        // The nested capture was rejected: the redo branch survived and
        // the current state is the restored one.
        assert!(history.can_redo());
        assert_eq!(history.current_state().as_deref(), Some("s1"));
    }

    #[test]
    fn dispose_clears_and_rejects_captures() {
        let history = HistoryManager::new(10);
        history.save_state("s1");
        history.dispose();
        assert!(!history.save_state("s2"));
        assert!(history.current_state().is_none());
        assert!(!history.undo());
    }
}
