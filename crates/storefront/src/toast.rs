//! Single-slot toast notifier.
//!
//! There is exactly one display slot. Showing a toast while another is
//! visible replaces its content and restarts the hide timer; the stale timer
//! is aborted and, should it already be running, its generation no longer
//! matches so it leaves the slot alone.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use rink_rental_core::Severity;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Class every toast body carries regardless of severity.
pub const BASE_CLASS: &str = "toast";

/// The display slot a [`ToastNotifier`] renders into.
pub trait ToastSurface: Send + Sync {
    /// Render the toast and make it visible.
    ///
    /// Must apply `severity.style_class()` and clear every other severity's
    /// class.
    fn show(&self, title: &str, message: &str, severity: Severity);

    /// Hide the toast without destroying the slot.
    fn hide(&self);
}

#[derive(Debug, Default)]
struct HideTimer {
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

/// Shows transient notifications and hides them after a timeout.
pub struct ToastNotifier {
    surface: Option<Arc<dyn ToastSurface>>,
    default_duration: Duration,
    timer: Arc<Mutex<HideTimer>>,
}

impl std::fmt::Debug for ToastNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToastNotifier")
            .field("attached", &self.surface.is_some())
            .field("default_duration", &self.default_duration)
            .finish_non_exhaustive()
    }
}

impl ToastNotifier {
    /// Create a notifier rendering into `surface`.
    #[must_use]
    pub fn new(surface: Arc<dyn ToastSurface>, default_duration: Duration) -> Self {
        Self {
            surface: Some(surface),
            default_duration,
            timer: Arc::new(Mutex::new(HideTimer::default())),
        }
    }

    /// Create a notifier for a page without a toast slot.
    ///
    /// Every call is a no-op.
    #[must_use]
    pub fn detached(default_duration: Duration) -> Self {
        Self {
            surface: None,
            default_duration,
            timer: Arc::new(Mutex::new(HideTimer::default())),
        }
    }

    /// Whether a display slot is present.
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.surface.is_some()
    }

    /// Show a toast for the default duration.
    pub fn notify(&self, title: &str, message: &str, severity: Severity) {
        self.notify_for(title, message, severity, self.default_duration);
    }

    /// Show a toast for `duration`, replacing whatever is displayed.
    ///
    /// The hide timer runs on the current Tokio runtime. Outside a runtime
    /// the toast is shown but never hidden.
    pub fn notify_for(&self, title: &str, message: &str, severity: Severity, duration: Duration) {
        let Some(surface) = &self.surface else {
            debug!(%severity, message, "No toast slot on page, skipping");
            return;
        };

        let Ok(mut timer) = self.timer.lock() else {
            warn!("Toast timer lock poisoned");
            return;
        };

        if let Some(stale) = timer.pending.take() {
            stale.abort();
        }
        timer.generation = timer.generation.wrapping_add(1);
        let generation = timer.generation;

        surface.show(title, message, severity);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No Tokio runtime, toast will not auto-hide");
            return;
        };

        let surface = Arc::clone(surface);
        let state = Arc::clone(&self.timer);
        timer.pending = Some(runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            let Ok(mut timer) = state.lock() else {
                return;
            };
            if timer.generation == generation {
                timer.pending = None;
                surface.hide();
            }
        }));
    }
}

/// What a [`MemorySurface`] currently displays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToastSnapshot {
    pub visible: bool,
    pub title: String,
    pub message: String,
    pub classes: BTreeSet<String>,
    /// Number of times the slot has been shown.
    pub shown: u64,
}

impl ToastSnapshot {
    /// Severity whose style is currently applied.
    #[must_use]
    pub fn severity(&self) -> Option<Severity> {
        Severity::ALL
            .into_iter()
            .find(|s| self.classes.contains(s.style_class()))
    }
}

/// In-memory toast slot.
///
/// Cheaply cloneable; clones share the same slot.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    inner: Arc<RwLock<ToastSnapshot>>,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySurface {
    #[must_use]
    pub fn new() -> Self {
        let mut classes = BTreeSet::new();
        classes.insert(BASE_CLASS.to_string());
        Self {
            inner: Arc::new(RwLock::new(ToastSnapshot {
                classes,
                ..ToastSnapshot::default()
            })),
        }
    }

    /// Current contents of the slot.
    #[must_use]
    pub fn snapshot(&self) -> ToastSnapshot {
        self.inner
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl ToastSurface for MemorySurface {
    fn show(&self, title: &str, message: &str, severity: Severity) {
        let Ok(mut toast) = self.inner.write() else {
            return;
        };
        for other in Severity::ALL {
            toast.classes.remove(other.style_class());
        }
        toast.classes.insert(severity.style_class().to_string());
        toast.title = title.to_string();
        toast.message = message.to_string();
        toast.visible = true;
        toast.shown += 1;
        info!(%severity, title, message, "Toast shown");
    }

    fn hide(&self) {
        if let Ok(mut toast) = self.inner.write() {
            toast.visible = false;
            debug!("Toast hidden");
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::sleep;

    use super::*;

    const MS: Duration = Duration::from_millis(1);

    fn notifier() -> (ToastNotifier, MemorySurface) {
        let surface = MemorySurface::new();
        let notifier = ToastNotifier::new(Arc::new(surface.clone()), Duration::from_millis(3000));
        (notifier, surface)
    }

    async fn settle(duration: Duration) {
        sleep(duration).await;
        tokio::task::yield_now().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_toast_hides_after_default_duration() {
        let (notifier, surface) = notifier();
        notifier.notify("Success", "Added to cart", Severity::Success);

        settle(MS * 2999).await;
        assert!(surface.snapshot().visible);

        settle(MS * 2).await;
        let toast = surface.snapshot();
        assert!(!toast.visible);
        // Hiding keeps the content and the slot.
        assert_eq!(toast.message, "Added to cart");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_then_slow_keeps_second_toast() {
        let (notifier, surface) = notifier();
        notifier.notify_for("Notice", "first", Severity::Normal, MS * 1000);
        settle(MS * 500).await;
        notifier.notify_for("Error", "second", Severity::Error, MS * 5000);

        // The first toast's timer would have fired here.
        settle(MS * 1000).await;
        let toast = surface.snapshot();
        assert!(toast.visible);
        assert_eq!(toast.message, "second");

        settle(MS * 4001).await;
        assert!(!surface.snapshot().visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_then_fast_hides_on_second_timer() {
        let (notifier, surface) = notifier();
        notifier.notify_for("Notice", "first", Severity::Normal, MS * 5000);
        settle(MS * 500).await;
        notifier.notify_for("Success", "second", Severity::Success, MS * 1000);

        settle(MS * 1001).await;
        let toast = surface.snapshot();
        assert!(!toast.visible);
        assert_eq!(toast.message, "second");

        // A later toast is not closed early by the first call's stale timer.
        notifier.notify_for("Notice", "third", Severity::Normal, MS * 10_000);
        settle(MS * 4000).await;
        assert!(surface.snapshot().visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toast_can_be_shown_again_after_hiding() {
        let (notifier, surface) = notifier();
        notifier.notify_for("Notice", "one", Severity::Normal, MS * 10);
        settle(MS * 20).await;
        assert!(!surface.snapshot().visible);

        notifier.notify_for("Notice", "two", Severity::Normal, MS * 10);
        let toast = surface.snapshot();
        assert!(toast.visible);
        assert_eq!(toast.message, "two");
        assert_eq!(toast.shown, 2);
    }

    #[test]
    fn test_severity_styles_are_exclusive() {
        let surface = MemorySurface::new();
        surface.show("Success", "ok", Severity::Success);
        surface.show("Error", "bad", Severity::Error);

        let toast = surface.snapshot();
        assert_eq!(toast.severity(), Some(Severity::Error));
        assert!(toast.classes.contains(BASE_CLASS));
        assert!(!toast.classes.contains(Severity::Success.style_class()));
        assert_eq!(toast.classes.len(), 2);
    }

    #[test]
    fn test_detached_notifier_is_noop() {
        let notifier = ToastNotifier::detached(Duration::from_millis(3000));
        assert!(!notifier.is_attached());
        notifier.notify("Error", "Network error", Severity::Error);
    }

    #[test]
    fn test_notify_outside_runtime_still_shows() {
        let (notifier, surface) = notifier();
        notifier.notify("Notice", "no runtime", Severity::Normal);
        assert!(surface.snapshot().visible);
    }
}
