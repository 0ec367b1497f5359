//! Poll-based fetch state for event-loop UIs.
//!
//! A `Query<T>` owns one remote read and its lifecycle: `Idle` until
//! started, `Loading` while the request is in flight, then `Success` or
//! `Error` until the next interaction. The display surface calls `fetch()`
//! to start, `poll()` on every tick, and renders from `state()`.
//!
//! # Example
//!
//! ```ignore
//! let client = cached_client.clone();
//! let mut profile = Query::new(move || {
//!   let client = client.clone();
//!   async move { client.profile(false).await }
//! });
//!
//! profile.fetch();
//!
//! // In the event loop tick:
//! if profile.poll() {
//!   // state changed, re-render
//! }
//!
//! match profile.state() {
//!   QueryState::Idle | QueryState::Loading => render_spinner(),
//!   QueryState::Success(p) => render_profile(p),
//!   QueryState::Error(e) => render_banner(e.user_message()),
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};

/// Lifecycle of a remote read. Exactly one state holds at a time from the
/// caller's perspective; `Loading` only while a request is in flight.
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  Idle,
  Loading,
  Success(T),
  Error(Error),
}

type QueryFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;

/// An in-flight request: the channel its result arrives on, and the task
/// driving it.
struct Pending<T> {
  rx: mpsc::UnboundedReceiver<Result<T>>,
  task: JoinHandle<()>,
}

/// One remote read with loading/error state and stale tracking.
pub struct Query<T> {
  state: QueryState<T>,
  fetcher: Box<dyn Fn() -> QueryFuture<T> + Send + Sync>,
  pending: Option<Pending<T>>,
  fetched_at: Option<Instant>,
  stale_time: Duration,
  cancel_on_drop: bool,
}

impl<T: Send + 'static> Query<T> {
  /// Create a query around a fetcher closure. The closure is called once
  /// per `fetch()`/`refetch()` and returns the future to drive.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      pending: None,
      fetched_at: None,
      stale_time: Duration::from_secs(300),
      cancel_on_drop: false,
    }
  }

  /// Age after which a successful result reads as stale.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  /// Abort the in-flight request when this query is dropped or refetched.
  ///
  /// Off by default: the request then runs to completion and its result is
  /// discarded.
  pub fn with_cancel_on_drop(mut self, cancel: bool) -> Self {
    self.cancel_on_drop = cancel;
    self
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    match &self.state {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&Error> {
    match &self.state {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }

  pub fn is_loading(&self) -> bool {
    matches!(self.state, QueryState::Loading)
  }

  /// True once a successful result has outlived the stale time.
  pub fn is_stale(&self) -> bool {
    if !matches!(self.state, QueryState::Success(_)) {
      return false;
    }
    match self.fetched_at {
      Some(at) => at.elapsed() >= self.stale_time,
      None => true,
    }
  }

  /// Start the fetch. A no-op while a request is already in flight.
  pub fn fetch(&mut self) {
    if self.is_loading() {
      return;
    }
    self.spawn();
  }

  /// Restart the fetch, discarding any in-flight request.
  pub fn refetch(&mut self) {
    if let Some(pending) = self.pending.take() {
      if self.cancel_on_drop {
        pending.task.abort();
      }
    }
    self.spawn();
  }

  /// Drain the in-flight request, if it finished. Returns true when the
  /// state changed. Call from the event loop tick.
  pub fn poll(&mut self) -> bool {
    let Some(pending) = &mut self.pending else {
      return false;
    };

    let next_state = match pending.rx.try_recv() {
      Ok(Ok(data)) => {
        self.fetched_at = Some(Instant::now());
        QueryState::Success(data)
      }
      Ok(Err(error)) => QueryState::Error(error),
      Err(mpsc::error::TryRecvError::Empty) => return false,
      // Sender dropped without delivering a result
      Err(mpsc::error::TryRecvError::Disconnected) => QueryState::Error(Error::Cancelled),
    };

    self.state = next_state;
    self.pending = None;
    true
  }

  fn spawn(&mut self) {
    let (tx, rx) = mpsc::unbounded_channel();
    let future = (self.fetcher)();
    let task = tokio::spawn(async move {
      // The receiver may be gone by completion; that's the discard path
      let _ = tx.send(future.await);
    });

    self.state = QueryState::Loading;
    self.pending = Some(Pending { rx, task });
  }
}

impl<T> Drop for Query<T> {
  fn drop(&mut self) {
    if self.cancel_on_drop {
      if let Some(pending) = self.pending.take() {
        pending.task.abort();
      }
    }
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("in_flight", &self.pending.is_some())
      .field("stale_time", &self.stale_time)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;

  /// Query whose fetcher counts invocations and sleeps `delay_ms` before
  /// yielding the invocation number.
  fn counting_query(counter: Arc<AtomicU32>, delay_ms: u64) -> Query<u32> {
    Query::new(move || {
      let counter = Arc::clone(&counter);
      async move {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        Ok(counter.fetch_add(1, Ordering::SeqCst))
      }
    })
  }

  async fn settle<T: Send + 'static>(query: &mut Query<T>) {
    for _ in 0..100 {
      tokio::time::sleep(Duration::from_millis(5)).await;
      if query.poll() {
        return;
      }
    }
    panic!("query never settled");
  }

  #[tokio::test]
  async fn test_lifecycle_idle_loading_success() {
    let mut query = Query::new(|| async { Ok("amira".to_string()) });
    assert!(matches!(query.state(), QueryState::Idle));
    assert!(!query.poll());

    query.fetch();
    assert!(query.is_loading());
    assert!(query.data().is_none());

    settle(&mut query).await;
    assert_eq!(query.data().map(String::as_str), Some("amira"));
    assert!(!query.is_stale());
  }

  #[tokio::test]
  async fn test_error_state_keeps_structured_kind() {
    let mut query: Query<u32> = Query::new(|| async {
      Err(Error::Authorization {
        message: "expired".to_string(),
      })
    });

    query.fetch();
    settle(&mut query).await;

    assert_eq!(
      query.error().map(Error::kind),
      Some(crate::error::ErrorKind::Authorization)
    );
    assert!(query.data().is_none());
  }

  #[tokio::test]
  async fn test_zero_stale_time_is_immediately_stale() {
    let mut query = Query::new(|| async { Ok(7u32) }).with_stale_time(Duration::ZERO);
    query.fetch();
    settle(&mut query).await;
    assert!(query.is_stale());
  }

  #[tokio::test]
  async fn test_fetch_during_flight_does_not_restart() {
    let counter = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(Arc::clone(&counter), 30);

    query.fetch();
    query.fetch();
    query.fetch();
    settle(&mut query).await;

    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_refetch_discards_first_result() {
    let counter = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(Arc::clone(&counter), 30);

    query.fetch();
    tokio::time::sleep(Duration::from_millis(5)).await;
    query.refetch();
    settle(&mut query).await;

    // Both fetchers ran, but only the second result was delivered
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert_eq!(query.data(), Some(&1));
  }

  #[tokio::test]
  async fn test_cancel_on_drop_aborts_the_request() {
    let counter = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(Arc::clone(&counter), 40).with_cancel_on_drop(true);

    query.fetch();
    tokio::time::sleep(Duration::from_millis(5)).await;
    drop(query);

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_default_drop_lets_the_request_finish() {
    let counter = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(Arc::clone(&counter), 40);

    query.fetch();
    tokio::time::sleep(Duration::from_millis(5)).await;
    drop(query);

    // Fire-and-forget: the result is discarded but the request completes
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }
}
