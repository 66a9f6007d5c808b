//! Casewell Notification Layer
//!
//! A bounded-lifetime, timer-driven queue of transient user notifications
//! (toasts), decoupled from any single UI action. Every toast owns an
//! independent cancellable timer; `dismiss` is idempotent, and dropping the
//! [`Notifier`] cancels all pending timers so nothing fires into a
//! torn-down UI.
//!
//! Timers use `tokio::time`, so tests drive them with a paused clock.

#![warn(missing_docs)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Default toast lifetime
pub const DEFAULT_DURATION: Duration = Duration::from_millis(3000);

/// Visual flavor of a toast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastKind {
    /// Operation completed
    Success,
    /// Operation failed
    Error,
    /// Neutral information
    Info,
    /// Something needs attention
    Warning,
}

/// One ephemeral notification
#[derive(Debug, Clone)]
pub struct Toast {
    /// Monotonically increasing identifier
    pub id: u64,
    /// User-facing text
    pub message: String,
    /// Visual flavor
    pub kind: ToastKind,
    /// Lifetime before auto-dismissal
    pub duration: Duration,
}

/// Partial update to a displayed toast
///
/// Applying a patch never resets the toast's timer.
#[derive(Debug, Clone, Default)]
pub struct ToastPatch {
    /// New message text
    pub message: Option<String>,
    /// New kind
    pub kind: Option<ToastKind>,
}

#[derive(Default)]
struct NotifierState {
    toasts: Vec<Toast>,
    timers: HashMap<u64, JoinHandle<()>>,
}

struct Inner {
    state: Mutex<NotifierState>,
    next_id: AtomicU64,
    default_duration: Duration,
}

impl Inner {
    fn dismiss(&self, id: u64) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.toasts.retain(|t| t.id != id);
        if let Some(handle) = state.timers.remove(&id) {
            handle.abort();
        }
    }
}

/// Timer-driven queue of cancellable notifications
///
/// Must live inside a tokio runtime; `show` spawns the auto-dismiss timer.
/// Deliberately not `Clone`: the session owns exactly one, and teardown is
/// tied to its drop.
pub struct Notifier {
    inner: Arc<Inner>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION)
    }
}

impl Notifier {
    /// Create a notifier with the given default toast lifetime
    pub fn new(default_duration: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(NotifierState::default()),
                next_id: AtomicU64::new(0),
                default_duration,
            }),
        }
    }

    /// Enqueue a toast and schedule its auto-dismissal
    ///
    /// Returns the toast id, usable with [`dismiss`](Self::dismiss) and
    /// [`update`](Self::update) before the timer fires.
    pub fn show(&self, message: impl Into<String>, kind: ToastKind, duration: Duration) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let toast = Toast {
            id,
            message: message.into(),
            kind,
            duration,
        };

        // The timer holds only a weak reference: a pending timer must not
        // keep a dropped notifier's state alive.
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(inner) = weak.upgrade() {
                debug!(id, "toast expired");
                inner.dismiss(id);
            }
        });

        let mut state = self.lock();
        state.toasts.push(toast);
        state.timers.insert(id, handle);
        id
    }

    /// `show` with the default duration
    pub fn show_default(&self, message: impl Into<String>, kind: ToastKind) -> u64 {
        self.show(message, kind, self.inner.default_duration)
    }

    /// Success toast with the default duration
    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.show_default(message, ToastKind::Success)
    }

    /// Error toast with the default duration
    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.show_default(message, ToastKind::Error)
    }

    /// Info toast with the default duration
    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.show_default(message, ToastKind::Info)
    }

    /// Warning toast with the default duration
    pub fn warning(&self, message: impl Into<String>) -> u64 {
        self.show_default(message, ToastKind::Warning)
    }

    /// Remove a toast and cancel its pending timer
    ///
    /// Idempotent: dismissing twice, or an id that already expired, is a
    /// no-op.
    pub fn dismiss(&self, id: u64) {
        self.inner.dismiss(id);
    }

    /// Mutate a displayed toast without resetting its timer
    ///
    /// No-op when the toast is already gone.
    pub fn update(&self, id: u64, patch: ToastPatch) {
        let mut state = self.lock();
        if let Some(toast) = state.toasts.iter_mut().find(|t| t.id == id) {
            if let Some(message) = patch.message {
                toast.message = message;
            }
            if let Some(kind) = patch.kind {
                toast.kind = kind;
            }
        }
    }

    /// Snapshot of the currently displayed toasts, in show order
    pub fn toasts(&self) -> Vec<Toast> {
        self.lock().toasts.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NotifierState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        for (_, handle) in state.timers.drain() {
            handle.abort();
        }
        state.toasts.clear();
    }
}
