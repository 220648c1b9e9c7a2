//! Spawn-and-poll result slot for background loads.
//!
//! A `Query<T>` runs its fetcher on a tokio task and hands the outcome back
//! through a channel, so the owner never blocks on the load itself.
//!
//! # Example
//!
//! ```ignore
//! let images = image_resources.clone();
//! let mut query = Query::new(move || {
//!     let images = images.clone();
//!     async move { images.load("https://example.com/cat.png").await.map_err(|e| e.to_string()) }
//! });
//!
//! // Start fetching
//! query.fetch();
//!
//! // On every tick
//! if query.poll() {
//!     // State changed, re-render
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Fetcher is running
  Loading,
  /// Fetcher finished with a value
  Success(T),
  /// Fetcher failed or its task went away
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;

type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

/// Background fetch with a pollable result.
pub struct Query<T> {
  state: QueryState<T>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
}

impl<T: Send + 'static> Query<T> {
  /// Create a new query. The fetcher is called once per `fetch()` or
  /// `refetch()`.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      receiver: None,
    }
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  /// Start fetching unless a fetch is already running.
  pub fn fetch(&mut self) {
    if self.state.is_loading() {
      return;
    }
    self.start_fetch();
  }

  /// Restart the fetch, discarding any pending outcome.
  pub fn refetch(&mut self) {
    self.receiver = None;
    self.start_fetch();
  }

  /// Move a finished outcome into the state without blocking.
  ///
  /// Returns `true` if the state changed.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(outcome) => {
        self.finish(Some(outcome));
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.finish(None);
        true
      }
    }
  }

  /// Wait for the pending fetch, if any, to finish.
  pub async fn settle(&mut self) {
    if let Some(rx) = &mut self.receiver {
      let outcome = rx.recv().await;
      self.finish(outcome);
    }
  }

  fn finish(&mut self, outcome: Option<Result<T, String>>) {
    self.state = match outcome {
      Some(Ok(data)) => QueryState::Success(data),
      Some(Err(error)) => QueryState::Error(error),
      // Sender dropped without sending
      None => QueryState::Error("Query was cancelled".to_string()),
    };
    self.receiver = None;
  }

  fn start_fetch(&mut self) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = QueryState::Loading;

    let future = (self.fetcher)();
    tokio::spawn(async move {
      let result = future.await;
      // Receiver may have been dropped by a refetch
      let _ = tx.send(result);
    });
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[tokio::test]
  async fn test_query_success() {
    let mut query = Query::new(|| async { Ok::<_, String>(vec![1, 2, 3]) });

    assert!(matches!(query.state(), QueryState::Idle));

    query.fetch();
    assert!(query.is_loading());

    query.settle().await;

    assert_eq!(query.state().data(), Some(&vec![1, 2, 3]));
  }

  #[tokio::test]
  async fn test_query_error() {
    let mut query: Query<i32> = Query::new(|| async { Err("feed exploded".to_string()) });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.poll());
    assert_eq!(query.state().error(), Some("feed exploded"));
  }

  #[tokio::test]
  async fn test_poll_before_completion_is_unchanged() {
    let mut query = Query::new(|| async {
      tokio::time::sleep(Duration::from_millis(100)).await;
      Ok::<_, String>(42)
    });

    assert!(!query.poll());
    query.fetch();
    assert!(!query.poll());
    assert!(query.is_loading());
  }

  #[tokio::test]
  async fn test_fetch_while_loading_is_noop() {
    let counter = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
    let counter_clone = counter.clone();

    let mut query = Query::new(move || {
      let counter = counter_clone.clone();
      async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok::<_, String>(counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst))
      }
    });

    query.fetch();
    query.fetch();
    query.settle().await;

    assert_eq!(query.state().data(), Some(&0));
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_refetch_discards_pending() {
    let counter = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
    let counter_clone = counter.clone();

    let mut query = Query::new(move || {
      let counter = counter_clone.clone();
      async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok::<_, String>(counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst))
      }
    });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;

    query.refetch();
    tokio::time::sleep(Duration::from_millis(100)).await;

    query.poll();
    // Only the second fetch should have completed and been received
    assert_eq!(query.state().data(), Some(&1));
  }

  #[tokio::test]
  async fn test_settle_without_fetch_is_noop() {
    let mut query = Query::new(|| async { Ok::<_, String>(1) });
    query.settle().await;
    assert!(matches!(query.state(), QueryState::Idle));
  }
}
