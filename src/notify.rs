//! User-facing notifications.
//!
//! The data layer emits fire-and-forget [`Notification`] values; an
//! out-of-scope display surface renders and auto-dismisses them. The sink is
//! injected rather than ambient so tests and embedders can substitute their
//! own.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

/// Default display duration when the caller does not override it.
pub const DEFAULT_DURATION_MS: u64 = 5000;

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
  Success,
  Error,
  Warning,
  Info,
}

impl NotificationKind {
  /// Title used when the caller does not provide one.
  pub fn default_title(self) -> &'static str {
    match self {
      NotificationKind::Success => "Success",
      NotificationKind::Error => "Error",
      NotificationKind::Warning => "Warning",
      NotificationKind::Info => "Info",
    }
  }
}

/// A notification payload for the display surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
  pub kind: NotificationKind,
  pub title: String,
  pub message: String,
  pub duration_ms: u64,
}

impl Notification {
  /// Create a notification with kind defaults for title and duration.
  pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
    Self {
      kind,
      title: kind.default_title().to_string(),
      message: message.into(),
      duration_ms: DEFAULT_DURATION_MS,
    }
  }

  pub fn with_title(mut self, title: impl Into<String>) -> Self {
    self.title = title.into();
    self
  }

  pub fn with_duration(mut self, duration_ms: u64) -> Self {
    self.duration_ms = duration_ms;
    self
  }
}

/// Destination for notifications. Delivery is best-effort.
pub trait NotificationSink: Send + Sync {
  fn push(&self, notification: Notification);
}

/// Cheaply cloneable handle used by the data layer to emit notifications.
#[derive(Clone)]
pub struct Notifier {
  sink: Arc<dyn NotificationSink>,
  duration_ms: u64,
}

impl Notifier {
  pub fn new(sink: impl NotificationSink + 'static) -> Self {
    Self {
      sink: Arc::new(sink),
      duration_ms: DEFAULT_DURATION_MS,
    }
  }

  /// Display duration applied to notifications emitted through the
  /// convenience methods. Explicit [`Notifier::notify`] calls keep their own.
  pub fn with_default_duration(mut self, duration_ms: u64) -> Self {
    self.duration_ms = duration_ms;
    self
  }

  /// A notifier that drops everything. For embedders without a display
  /// surface and for tests that don't care about notifications.
  pub fn disabled() -> Self {
    struct NoopSink;
    impl NotificationSink for NoopSink {
      fn push(&self, _notification: Notification) {}
    }
    Self::new(NoopSink)
  }

  pub fn notify(&self, notification: Notification) {
    self.sink.push(notification);
  }

  fn emit(&self, kind: NotificationKind, message: impl Into<String>) {
    self.notify(Notification::new(kind, message).with_duration(self.duration_ms));
  }

  pub fn success(&self, message: impl Into<String>) {
    self.emit(NotificationKind::Success, message);
  }

  pub fn error(&self, message: impl Into<String>) {
    self.emit(NotificationKind::Error, message);
  }

  pub fn warning(&self, message: impl Into<String>) {
    self.emit(NotificationKind::Warning, message);
  }

  pub fn info(&self, message: impl Into<String>) {
    self.emit(NotificationKind::Info, message);
  }
}

impl std::fmt::Debug for Notifier {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Notifier").finish_non_exhaustive()
  }
}

/// Sink that accumulates notifications in memory.
///
/// The display surface can drain it on every frame; tests inspect it.
#[derive(Default)]
pub struct MemorySink {
  notifications: Mutex<Vec<Notification>>,
}

impl MemorySink {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
    // A sink holds no invariants worth poisoning over
    self
      .notifications
      .lock()
      .unwrap_or_else(std::sync::PoisonError::into_inner)
  }

  /// Copy of everything pushed so far.
  pub fn snapshot(&self) -> Vec<Notification> {
    self.lock().clone()
  }

  /// Remove and return everything pushed so far.
  pub fn drain(&self) -> Vec<Notification> {
    std::mem::take(&mut *self.lock())
  }
}

impl NotificationSink for MemorySink {
  fn push(&self, notification: Notification) {
    self.lock().push(notification);
  }
}

impl NotificationSink for Arc<MemorySink> {
  fn push(&self, notification: Notification) {
    self.as_ref().push(notification);
  }
}

/// Sink that forwards notifications into an unbounded channel, for
/// event-loop style consumers.
pub struct ChannelSink {
  tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
  /// Create a sink and the receiver the display surface reads from.
  pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }
}

impl NotificationSink for ChannelSink {
  fn push(&self, notification: Notification) {
    // Receiver may be gone; notifications carry no delivery guarantee.
    let _ = self.tx.send(notification);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_filled_per_kind() {
    let n = Notification::new(NotificationKind::Success, "saved");
    assert_eq!(n.title, "Success");
    assert_eq!(n.duration_ms, DEFAULT_DURATION_MS);

    let n = Notification::new(NotificationKind::Error, "boom");
    assert_eq!(n.title, "Error");
  }

  #[test]
  fn test_overrides_win() {
    let n = Notification::new(NotificationKind::Info, "heads up")
      .with_title("FYI")
      .with_duration(1500);
    assert_eq!(n.title, "FYI");
    assert_eq!(n.duration_ms, 1500);
  }

  #[test]
  fn test_memory_sink_captures_in_order() {
    let sink = Arc::new(MemorySink::new());
    let notifier = Notifier::new(Arc::clone(&sink));

    notifier.success("first");
    notifier.warning("second");

    let seen = sink.snapshot();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].kind, NotificationKind::Success);
    assert_eq!(seen[0].message, "first");
    assert_eq!(seen[1].kind, NotificationKind::Warning);

    sink.drain();
    assert!(sink.snapshot().is_empty());
  }

  #[test]
  fn test_notifier_default_duration_applies_to_convenience_methods() {
    let sink = Arc::new(MemorySink::new());
    let notifier = Notifier::new(Arc::clone(&sink)).with_default_duration(2500);

    notifier.success("saved");
    notifier.notify(Notification::new(NotificationKind::Info, "kept"));

    let seen = sink.snapshot();
    assert_eq!(seen[0].duration_ms, 2500);
    // Explicitly built notifications keep their own duration
    assert_eq!(seen[1].duration_ms, DEFAULT_DURATION_MS);
  }

  #[tokio::test]
  async fn test_channel_sink_forwards() {
    let (sink, mut rx) = ChannelSink::new();
    let notifier = Notifier::new(sink);

    notifier.error("it broke");

    let n = rx.recv().await.expect("notification");
    assert_eq!(n.kind, NotificationKind::Error);
    assert_eq!(n.message, "it broke");
  }

  #[test]
  fn test_disabled_notifier_drops_silently() {
    let notifier = Notifier::disabled();
    notifier.info("nobody hears this");
  }
}
