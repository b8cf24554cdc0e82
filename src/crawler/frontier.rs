//! Crawl frontier and visited-set bookkeeping
//!
//! The frontier is the shared work queue of `(source, target)` pairs. Next to
//! the queue it keeps a drain counter of outstanding items, i.e. items that
//! were enqueued but not yet marked done. The queue being empty says nothing
//! about completion, because a worker that is still mid-fetch may enqueue new
//! links at any moment. Completion is the counter reaching zero.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::{watch, Notify};

/// A link waiting to be checked
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrontierItem {
    /// Page the link was found on; `None` only for the start URL
    pub source: Option<String>,

    /// Normalized, fragment-free URL to check
    pub target: String,
}

impl FrontierItem {
    /// The crawl's start URL, which has no referring page
    pub fn seed(target: impl Into<String>) -> Self {
        Self {
            source: None,
            target: target.into(),
        }
    }

    /// A link discovered on `source`
    pub fn discovered(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            target: target.into(),
        }
    }

    /// Key under which anomalies of this link are reported ("" for the seed)
    pub fn source_key(&self) -> &str {
        self.source.as_deref().unwrap_or("")
    }
}

/// Bounded, concurrency-safe work queue with a drain counter
///
/// # Capacity
///
/// `push` waits while the queue holds `capacity` items. Only the
/// orchestrator seeds through it. Workers enqueue through
/// `push_discovered`, which never waits: a worker blocked on a full queue
/// still holds an outstanding item, and if every worker did that nobody
/// would be left to consume. The capacity therefore bounds seeding and is a
/// soft limit for discovered links.
#[derive(Debug)]
pub struct Frontier {
    queue: Mutex<VecDeque<FrontierItem>>,
    capacity: usize,
    item_ready: Notify,
    space_ready: Notify,
    outstanding: watch::Sender<usize>,
}

impl Frontier {
    pub fn new(capacity: usize) -> Self {
        let (outstanding, _) = watch::channel(0);

        Self {
            queue: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            item_ready: Notify::new(),
            space_ready: Notify::new(),
            outstanding,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<FrontierItem>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueues an item, waiting while the queue is at capacity
    pub async fn push(&self, item: FrontierItem) {
        loop {
            let space = self.space_ready.notified();

            {
                let mut queue = self.lock();
                if queue.len() < self.capacity {
                    self.outstanding.send_modify(|n| *n += 1);
                    queue.push_back(item);
                    drop(queue);
                    self.item_ready.notify_one();
                    return;
                }
            }

            space.await;
        }
    }

    /// Enqueues an item found by a worker without waiting for capacity
    pub fn push_discovered(&self, item: FrontierItem) {
        let mut queue = self.lock();
        self.outstanding.send_modify(|n| *n += 1);
        queue.push_back(item);

        if queue.len() > self.capacity {
            tracing::trace!(
                "Frontier above capacity: {} queued, capacity {}",
                queue.len(),
                self.capacity
            );
        }

        drop(queue);
        self.item_ready.notify_one();
    }

    /// Dequeues the next item, waiting while the queue is empty
    ///
    /// The returned item stays outstanding until `task_done` is called for it.
    pub async fn pop(&self) -> FrontierItem {
        loop {
            let ready = self.item_ready.notified();

            {
                let mut queue = self.lock();
                if let Some(item) = queue.pop_front() {
                    let more = !queue.is_empty();
                    drop(queue);

                    self.space_ready.notify_one();
                    if more {
                        // Pass the wakeup on so idle workers pick up the rest
                        self.item_ready.notify_one();
                    }
                    return item;
                }
            }

            ready.await;
        }
    }

    /// Marks one dequeued item as fully processed
    pub fn task_done(&self) {
        self.outstanding.send_modify(|n| *n = n.saturating_sub(1));
    }

    /// Returns a guard that marks one item done when dropped
    ///
    /// Holding the guard across processing keeps the drain counter correct
    /// even if processing unwinds.
    pub fn done_guard(&self) -> DoneGuard<'_> {
        DoneGuard { frontier: self }
    }

    /// Waits until every enqueued item has been marked done
    pub async fn wait_drained(&self) {
        let mut outstanding = self.outstanding.subscribe();
        // The sender lives as long as `self`, so this cannot fail
        let _ = outstanding.wait_for(|n| *n == 0).await;
    }

    /// Number of items enqueued but not yet marked done
    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// Number of items currently waiting in the queue
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Marks a frontier item done on drop
#[derive(Debug)]
pub struct DoneGuard<'a> {
    frontier: &'a Frontier,
}

impl Drop for DoneGuard<'_> {
    fn drop(&mut self) {
        self.frontier.task_done();
    }
}

/// Set of every URL dispatched for checking during one crawl
///
/// Grows monotonically. `insert` is an atomic test-and-set, so at most one
/// worker ever dispatches a given URL.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `url`; returns false if it was already present
    pub fn insert(&self, url: &str) -> bool {
        let mut urls = self.lock();
        if urls.contains(url) {
            return false;
        }
        urls.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_item_source_key() {
        assert_eq!(FrontierItem::seed("http://a/").source_key(), "");
        assert_eq!(
            FrontierItem::discovered("http://a/", "http://a/b").source_key(),
            "http://a/"
        );
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let frontier = Frontier::new(10);
        frontier.push(FrontierItem::seed("one")).await;
        frontier.push_discovered(FrontierItem::discovered("one", "two"));

        assert_eq!(frontier.pop().await.target, "one");
        assert_eq!(frontier.pop().await.target, "two");
        assert!(frontier.is_empty());
    }

    #[tokio::test]
    async fn test_outstanding_counts_until_done() {
        let frontier = Frontier::new(10);
        frontier.push(FrontierItem::seed("one")).await;
        assert_eq!(frontier.outstanding(), 1);

        let _item = frontier.pop().await;
        // Dequeued but not done
        assert!(frontier.is_empty());
        assert_eq!(frontier.outstanding(), 1);

        frontier.task_done();
        assert_eq!(frontier.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_drained_immediately_when_nothing_outstanding() {
        let frontier = Frontier::new(10);
        tokio::time::timeout(Duration::from_secs(1), frontier.wait_drained())
            .await
            .expect("empty frontier should be drained");
    }

    #[tokio::test]
    async fn test_not_drained_while_item_in_flight() {
        let frontier = Frontier::new(10);
        frontier.push(FrontierItem::seed("one")).await;
        let _item = frontier.pop().await;

        let result =
            tokio::time::timeout(Duration::from_millis(50), frontier.wait_drained()).await;
        assert!(result.is_err(), "queue is empty but work is still in flight");
    }

    #[tokio::test]
    async fn test_in_flight_item_can_extend_the_crawl() {
        let frontier = Arc::new(Frontier::new(10));
        frontier.push(FrontierItem::seed("one")).await;

        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.wait_drained().await })
        };

        let item = frontier.pop().await;
        {
            let _done = frontier.done_guard();
            frontier.push_discovered(FrontierItem::discovered(item.target, "two"));
        }
        assert!(!waiter.is_finished());

        let _second = frontier.pop().await;
        frontier.task_done();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("drain should complete")
            .unwrap();
    }

    #[tokio::test]
    async fn test_pop_waits_for_push() {
        let frontier = Arc::new(Frontier::new(10));

        let popper = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.pop().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        frontier.push_discovered(FrontierItem::discovered("a", "b"));

        let item = tokio::time::timeout(Duration::from_secs(1), popper)
            .await
            .expect("pop should wake up")
            .unwrap();
        assert_eq!(item.target, "b");
    }

    #[tokio::test]
    async fn test_push_waits_for_capacity() {
        let frontier = Arc::new(Frontier::new(1));
        frontier.push(FrontierItem::seed("one")).await;

        let pusher = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.push(FrontierItem::seed("two")).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pusher.is_finished());
        assert_eq!(frontier.len(), 1);

        assert_eq!(frontier.pop().await.target, "one");
        tokio::time::timeout(Duration::from_secs(1), pusher)
            .await
            .expect("push should proceed once space frees up")
            .unwrap();
        assert_eq!(frontier.len(), 1);
    }

    #[tokio::test]
    async fn test_push_discovered_ignores_capacity() {
        let frontier = Frontier::new(1);
        frontier.push_discovered(FrontierItem::discovered("a", "b"));
        frontier.push_discovered(FrontierItem::discovered("a", "c"));
        assert_eq!(frontier.len(), 2);
        assert_eq!(frontier.outstanding(), 2);
    }

    #[test]
    fn test_visited_insert_is_test_and_set() {
        let visited = VisitedSet::new();
        assert!(visited.insert("http://a/"));
        assert!(!visited.insert("http://a/"));
        assert!(visited.contains("http://a/"));
        assert!(!visited.contains("http://a/b"));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_visited_concurrent_inserts_admit_one_winner() {
        let visited = Arc::new(VisitedSet::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let visited = Arc::clone(&visited);
                std::thread::spawn(move || visited.insert("http://a/contended"))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(visited.len(), 1);
    }
}
