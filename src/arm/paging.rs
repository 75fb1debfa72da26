//! Streaming enumeration over cursor-paginated listings
//!
//! A producer task fetches pages and hands their items one at a time to a
//! single consumer, paired with a one-shot terminal outcome. The outcome only
//! means something once the item channel has been drained, so [`Enumeration`]
//! exposes it through [`Enumeration::finish`], which drains first.

use crate::error::{Result, VaultScoutError};
use serde::Deserialize;
use std::future::Future;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// One page of a Resource Manager listing
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "nextLink", default)]
    pub next_link: Option<String>,
}

impl<T> Page<T> {
    pub fn new(value: Vec<T>, next_link: Option<String>) -> Self {
        Self { value, next_link }
    }

    /// A page with no continuation cursor
    pub fn last(value: Vec<T>) -> Self {
        Self::new(value, None)
    }

    /// The continuation cursor, if more data exists. ARM occasionally sends
    /// `"nextLink": ""` on the final page.
    pub fn continuation(&self) -> Option<&str> {
        self.next_link.as_deref().filter(|link| !link.is_empty())
    }
}

/// Items of an in-flight enumeration plus its terminal outcome
#[derive(Debug)]
pub struct Enumeration<T> {
    items: mpsc::Receiver<T>,
    outcome: oneshot::Receiver<VaultScoutError>,
    producer: JoinHandle<()>,
}

impl<T> Enumeration<T> {
    /// Next item in page order, or `None` once the producer is done
    pub async fn next(&mut self) -> Option<T> {
        self.items.recv().await
    }

    /// Drain whatever is left, then report how the enumeration ended.
    pub async fn finish(mut self) -> Result<()> {
        while self.items.recv().await.is_some() {}

        match self.outcome.await {
            Ok(err) => Err(err),
            // Sender dropped without a value: success, unless the producer died.
            Err(_) => match self.producer.await {
                Ok(()) => Ok(()),
                Err(e) => Err(VaultScoutError::Fetch(format!(
                    "enumeration task failed: {}",
                    e
                ))),
            },
        }
    }

    /// Drain every item, then check the outcome
    pub async fn collect(mut self) -> Result<Vec<T>> {
        let mut all_items = Vec::new();
        while let Some(item) = self.items.recv().await {
            all_items.push(item);
        }
        self.finish().await?;
        Ok(all_items)
    }
}

/// Start draining a paginated listing.
///
/// `first` is called exactly once for the first page. Every following page is
/// fetched by `next` with the previous page's continuation cursor. Fetching
/// stops at the first page without a cursor, at the first error, or when the
/// consumer drops the [`Enumeration`].
pub fn enumerate<T, First, FirstFut, Next, NextFut>(first: First, mut next: Next) -> Enumeration<T>
where
    T: Send + 'static,
    First: FnOnce() -> FirstFut + Send + 'static,
    FirstFut: Future<Output = Result<Page<T>>> + Send + 'static,
    Next: FnMut(String) -> NextFut + Send + 'static,
    NextFut: Future<Output = Result<Page<T>>> + Send + 'static,
{
    // Capacity 1 is the closest tokio gets to an unbuffered handoff.
    let (item_tx, items) = mpsc::channel(1);
    let (outcome_tx, outcome) = oneshot::channel();

    let producer = tokio::spawn(async move {
        let mut page_number = 1usize;
        let mut fetched = first().await;

        loop {
            let page = match fetched {
                Ok(page) => page,
                Err(e) => {
                    tracing::debug!("Page {} failed: {}", page_number, e);
                    let _ = outcome_tx.send(e);
                    return;
                }
            };

            let cursor = page.continuation().map(str::to_owned);
            tracing::debug!(
                "Page {}: {} items, more: {}",
                page_number,
                page.value.len(),
                cursor.is_some()
            );

            for item in page.value {
                if item_tx.send(item).await.is_err() {
                    tracing::debug!("Consumer dropped the enumeration, stopping");
                    return;
                }
            }

            let Some(cursor) = cursor else {
                return;
            };

            page_number += 1;
            fetched = next(cursor).await;
        }
    });

    Enumeration {
        items,
        outcome,
        producer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Scripted = Arc<Mutex<VecDeque<Result<Page<u32>>>>>;

    /// Builds an enumeration over a scripted list of page results and counts
    /// calls to each fetcher.
    fn scripted(
        pages: Vec<Result<Page<u32>>>,
    ) -> (Enumeration<u32>, Arc<AtomicUsize>, Arc<AtomicUsize>, Arc<Mutex<Vec<String>>>) {
        let script: Scripted = Arc::new(Mutex::new(pages.into()));
        let first_calls = Arc::new(AtomicUsize::new(0));
        let next_calls = Arc::new(AtomicUsize::new(0));
        let cursors = Arc::new(Mutex::new(Vec::new()));

        let first_script = script.clone();
        let first_counter = first_calls.clone();
        let next_script = script;
        let next_counter = next_calls.clone();
        let seen_cursors = cursors.clone();

        let enumeration = enumerate(
            move || {
                first_counter.fetch_add(1, Ordering::SeqCst);
                let page = first_script.lock().unwrap().pop_front();
                async move { page.unwrap_or_else(|| Ok(Page::last(vec![]))) }
            },
            move |cursor| {
                next_counter.fetch_add(1, Ordering::SeqCst);
                seen_cursors.lock().unwrap().push(cursor);
                let page = next_script.lock().unwrap().pop_front();
                async move { page.unwrap_or_else(|| Ok(Page::last(vec![]))) }
            },
        );

        (enumeration, first_calls, next_calls, cursors)
    }

    fn more(value: Vec<u32>, cursor: &str) -> Result<Page<u32>> {
        Ok(Page::new(value, Some(cursor.to_string())))
    }

    #[tokio::test]
    async fn test_yields_every_item_in_page_order() {
        let (enumeration, first_calls, next_calls, cursors) = scripted(vec![
            more(vec![1, 2], "c1"),
            more(vec![3], "c2"),
            Ok(Page::last(vec![4, 5])),
        ]);

        let items = enumeration.collect().await.unwrap();
        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(next_calls.load(Ordering::SeqCst), 2);
        assert_eq!(*cursors.lock().unwrap(), vec!["c1", "c2"]);
    }

    #[tokio::test]
    async fn test_single_page_never_calls_next() {
        let (enumeration, first_calls, next_calls, _) =
            scripted(vec![Ok(Page::last(vec![7]))]);

        assert_eq!(enumeration.collect().await.unwrap(), vec![7]);
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(next_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_pages_are_followed() {
        let (enumeration, _, _, _) = scripted(vec![
            more(vec![], "c1"),
            more(vec![], "c2"),
            Ok(Page::last(vec![9])),
        ]);
        assert_eq!(enumeration.collect().await.unwrap(), vec![9]);
    }

    #[tokio::test]
    async fn test_empty_next_link_ends_enumeration() {
        let (enumeration, _, next_calls, _) =
            scripted(vec![Ok(Page::new(vec![1], Some(String::new())))]);
        assert_eq!(enumeration.collect().await.unwrap(), vec![1]);
        assert_eq!(next_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_error_on_first_page() {
        let (mut enumeration, _, next_calls, _) =
            scripted(vec![Err(VaultScoutError::Fetch("boom".into()))]);

        assert!(enumeration.next().await.is_none());
        let outcome = enumeration.finish().await;
        assert!(matches!(outcome, Err(VaultScoutError::Fetch(msg)) if msg == "boom"));
        assert_eq!(next_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_error_on_later_page_keeps_earlier_items_only() {
        let (mut enumeration, _, next_calls, _) = scripted(vec![
            more(vec![1, 2], "c1"),
            more(vec![3], "c2"),
            Err(VaultScoutError::Fetch("page 3".into())),
            Ok(Page::last(vec![99])),
        ]);

        let mut seen = Vec::new();
        while let Some(item) = enumeration.next().await {
            seen.push(item);
        }
        assert_eq!(seen, vec![1, 2, 3]);
        assert!(matches!(
            enumeration.finish().await,
            Err(VaultScoutError::Fetch(msg)) if msg == "page 3"
        ));
        assert_eq!(next_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_collect_surfaces_error() {
        let (enumeration, _, _, _) = scripted(vec![
            more(vec![1], "c1"),
            Err(VaultScoutError::Fetch("gone".into())),
        ]);
        assert!(enumeration.collect().await.is_err());
    }

    #[tokio::test]
    async fn test_finish_drains_before_reading_outcome() {
        let (mut enumeration, _, _, _) = scripted(vec![
            more(vec![1, 2, 3], "c1"),
            Ok(Page::last(vec![4, 5, 6])),
        ]);

        // Take one item, leave the producer blocked on the rest.
        assert_eq!(enumeration.next().await, Some(1));
        assert!(enumeration.finish().await.is_ok());
    }

    /// A page that always points at another one
    fn endless_page(value: Vec<u32>) -> Result<Page<u32>> {
        Ok(Page::new(value, Some("again".to_string())))
    }

    #[tokio::test]
    async fn test_fetch_ahead_is_bounded_by_consumer() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let first_fetches = fetches.clone();
        let next_fetches = fetches.clone();

        let mut enumeration = enumerate(
            move || {
                first_fetches.fetch_add(1, Ordering::SeqCst);
                async { endless_page(vec![1, 2]) }
            },
            move |_| {
                next_fetches.fetch_add(1, Ordering::SeqCst);
                async { endless_page(vec![3, 4]) }
            },
        );

        // Nothing consumed: item 1 sits in the channel, the producer waits on item 2.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fetches.load(Ordering::SeqCst), 1);

        // Taking item 1 lets item 2 in and the next page is fetched; item 3 then waits.
        assert_eq!(enumeration.next().await, Some(1));
        tokio::time::sleep(Duration::from_millis(50)).await;
        let after_one = fetches.load(Ordering::SeqCst);
        assert!(after_one <= 2, "fetched {} pages after one item", after_one);

        // An idle consumer holds the producer where it is.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fetches.load(Ordering::SeqCst), after_one);

        assert_eq!(enumeration.next().await, Some(2));
        assert_eq!(enumeration.next().await, Some(3));
    }

    #[tokio::test]
    async fn test_producer_stops_when_consumer_drops() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let first_fetches = fetches.clone();
        let next_fetches = fetches.clone();

        let mut enumeration = enumerate(
            move || {
                first_fetches.fetch_add(1, Ordering::SeqCst);
                async { endless_page(vec![0, 1, 2]) }
            },
            move |_| {
                next_fetches.fetch_add(1, Ordering::SeqCst);
                async { endless_page(vec![0, 1, 2]) }
            },
        );

        assert_eq!(enumeration.next().await, Some(0));
        drop(enumeration);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let settled = fetches.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fetches.load(Ordering::SeqCst), settled);
        assert!(settled <= 2);
    }

    #[test]
    fn test_page_deserializes_arm_shape() {
        let page: Page<serde_json::Value> = serde_json::from_str(
            r#"{"value":[{"id":"a"},{"id":"b"}],"nextLink":"https://management.azure.com/next"}"#,
        )
        .unwrap();
        assert_eq!(page.value.len(), 2);
        assert_eq!(page.continuation(), Some("https://management.azure.com/next"));

        let last: Page<serde_json::Value> = serde_json::from_str(r#"{"value":[]}"#).unwrap();
        assert!(last.continuation().is_none());
    }
}
