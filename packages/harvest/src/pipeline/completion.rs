//! Drain detection for the shared backlog.
//!
//! [`Completion`] owns the backlog cursor and the in-flight count. Lanes take
//! work through [`Completion::claim`], which hands out a [`Claim`] guard; the
//! guard releases the in-flight slot when dropped, so a lane that returns an
//! error (or whose future is dropped mid-entry) still counts as finished. Once
//! the cursor is exhausted and nothing is in flight, the drain callback runs
//! exactly once.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

type DrainCallback = Box<dyn FnOnce() + Send>;

/// Shared cursor + in-flight counter with a fire-once drain callback.
pub struct Completion {
    total: usize,
    cursor: AtomicUsize,
    in_flight: AtomicUsize,
    fired: AtomicBool,
    on_drain: Mutex<Option<DrainCallback>>,
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("total", &self.total)
            .field("cursor", &self.claimed())
            .field("in_flight", &self.in_flight())
            .field("fired", &self.is_drained())
            .finish()
    }
}

impl Completion {
    /// Track a backlog of `total` entries.
    ///
    /// An empty backlog is drained from the start, so `on_drain` runs
    /// immediately.
    pub fn new(total: usize, on_drain: impl FnOnce() + Send + 'static) -> Self {
        let completion = Self {
            total,
            cursor: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            fired: AtomicBool::new(false),
            on_drain: Mutex::new(Some(Box::new(on_drain))),
        };
        if total == 0 {
            completion.fire();
        }
        completion
    }

    /// Backlog size.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Positions handed out so far (never exceeds `total`).
    pub fn claimed(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Entries currently being processed.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Whether the drain callback has run.
    pub fn is_drained(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Claim the next backlog position, or `None` once the backlog is exhausted.
    ///
    /// The in-flight slot is taken before the cursor moves so a concurrent
    /// release can never observe "exhausted and idle" while a claim is
    /// half-made.
    pub fn claim(&self) -> Option<Claim<'_>> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);

        let claimed = self
            .cursor
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |cursor| {
                (cursor < self.total).then_some(cursor + 1)
            });

        match claimed {
            Ok(index) => Some(Claim {
                completion: self,
                index,
            }),
            Err(_) => {
                self.release();
                None
            }
        }
    }

    fn release(&self) {
        let previous = self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if previous == 1 && self.claimed() >= self.total {
            self.fire();
        }
    }

    fn fire(&self) {
        if self.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        let callback = self
            .on_drain
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(callback) = callback {
            tracing::debug!(total = self.total, "backlog drained");
            callback();
        }
    }
}

/// One claimed backlog position. Dropping it marks the entry finished.
#[must_use = "dropping a claim immediately releases it"]
pub struct Claim<'a> {
    completion: &'a Completion,
    index: usize,
}

impl Claim<'_> {
    /// Position of the claimed entry in the backlog.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.completion.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let fired = Arc::new(AtomicUsize::new(0));
        let hook = fired.clone();
        (fired, move || {
            hook.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_empty_backlog_fires_immediately() {
        let (fired, hook) = counter();
        let completion = Completion::new(0, hook);

        assert!(completion.is_drained());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(completion.claim().is_none());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_claims_are_sequential_and_capped() {
        let (_, hook) = counter();
        let completion = Completion::new(2, hook);

        let first = completion.claim().unwrap();
        let second = completion.claim().unwrap();
        assert_eq!((first.index(), second.index()), (0, 1));
        assert!(completion.claim().is_none());
        assert_eq!(completion.claimed(), 2);
    }

    #[test]
    fn test_fires_only_after_last_claim_released() {
        let (fired, hook) = counter();
        let completion = Completion::new(2, hook);

        let first = completion.claim().unwrap();
        let second = completion.claim().unwrap();
        drop(first);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(completion.claim().is_none());
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        drop(second);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(completion.in_flight(), 0);
    }

    #[test]
    fn test_release_on_unwind_path() {
        let (fired, hook) = counter();
        let completion = Completion::new(1, hook);

        let result: Result<(), &str> = (|| {
            let _claim = completion.claim().unwrap();
            Err("phase failed")
        })();

        assert!(result.is_err());
        assert_eq!(completion.in_flight(), 0);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    /// Runs `lanes` loops over a backlog of `delays.len()` entries where entry
    /// `i` takes `delays[i]` ms, and checks the drain invariants.
    fn drain_with_timings(lanes: usize, delays: Vec<u64>) -> Result<(), TestCaseError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();

        let total = delays.len();
        let held = Arc::new(AtomicUsize::new(0));
        let fired = Arc::new(AtomicUsize::new(0));
        let held_at_fire = Arc::new(AtomicUsize::new(usize::MAX));

        let completion = {
            let held = held.clone();
            let fired = fired.clone();
            let held_at_fire = held_at_fire.clone();
            Completion::new(total, move || {
                held_at_fire.store(held.load(Ordering::SeqCst), Ordering::SeqCst);
                fired.fetch_add(1, Ordering::SeqCst);
            })
        };

        runtime.block_on(async {
            let lanes = (0..lanes).map(|_| {
                let completion = &completion;
                let held = held.clone();
                let delays = &delays;
                async move {
                    while let Some(claim) = completion.claim() {
                        held.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(delays[claim.index()])).await;
                        held.fetch_sub(1, Ordering::SeqCst);
                        drop(claim);
                    }
                }
            });
            futures::future::join_all(lanes).await;
        });

        prop_assert_eq!(fired.load(Ordering::SeqCst), 1);
        prop_assert_eq!(held_at_fire.load(Ordering::SeqCst), 0);
        prop_assert_eq!(completion.claimed(), total);
        prop_assert_eq!(completion.in_flight(), 0);
        Ok(())
    }

    proptest! {
        #[test]
        fn prop_fires_exactly_once_after_drain(
            (lanes, delays) in (1usize..20).prop_flat_map(|n| {
                (1..=n, proptest::collection::vec(0u64..50, n))
            })
        ) {
            drain_with_timings(lanes, delays)?;
        }
    }
}
