//! Lane scheduler: fans the backlog out over a fixed number of sessions.
//!
//! Each lane owns one session and loops: claim the next backlog position,
//! extract it, store the result, repeat. Lanes never wait for each other, so
//! a lane stuck on a heavy event does not hold back the rest. All lanes are
//! polled on the calling task; concurrency comes from the sessions doing their
//! work out of process while a lane is suspended.
//!
//! The first error from any lane ends the whole run: remaining lane futures
//! are dropped and the error is returned to the caller.

use futures::future::try_join_all;
use std::sync::OnceLock;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::error::{HarvestError, HarvestResult};
use crate::pipeline::completion::Completion;
use crate::pipeline::extract::EntryExtractor;
use crate::traits::page::PageClient;
use crate::traits::progress::{LaneProgress, ProgressSink};
use crate::types::entry::{FullEntry, IndexEntry};

/// Status reported on every lane once the backlog is drained.
pub const FINISHED_STATUS: &str = "All jobs finished!";

/// Drives an [`EntryExtractor`] over a backlog with one lane per session.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    extractor: EntryExtractor,
}

impl Scheduler {
    pub fn new(extractor: EntryExtractor) -> Self {
        Self { extractor }
    }

    /// Extract every entry of `backlog`, returning results in backlog order.
    ///
    /// One lane is opened per session, up to the backlog length; surplus
    /// sessions stay idle. Results are only assembled once the completion
    /// detector has seen the backlog drain.
    pub async fn run<P: PageClient>(
        &self,
        backlog: &[IndexEntry],
        sessions: &[P],
        progress: &dyn ProgressSink,
    ) -> HarvestResult<Vec<FullEntry>> {
        let total = backlog.len();
        let lanes = sessions.len().min(total);
        let per_lane = if lanes == 0 { 0 } else { total / lanes };

        let (drained_tx, mut drained_rx) = oneshot::channel();
        let completion = Completion::new(total, move || {
            let _ = drained_tx.send(());
        });
        let slots: Vec<OnceLock<FullEntry>> = (0..total).map(|_| OnceLock::new()).collect();

        info!(entries = total, lanes, "spawning lanes");
        try_join_all(sessions.iter().take(lanes).enumerate().map(|(lane, page)| {
            self.lane(
                page,
                backlog,
                &completion,
                &slots,
                LaneProgress::new(progress, lane, per_lane),
            )
        }))
        .await?;

        if drained_rx.try_recv().is_err() {
            return Err(HarvestError::Incomplete {
                claimed: completion.claimed(),
                total,
            });
        }

        for lane in 0..lanes {
            progress.update(lane, per_lane, per_lane, FINISHED_STATUS);
        }
        progress.message(FINISHED_STATUS);

        slots
            .into_iter()
            .map(|slot| {
                slot.into_inner().ok_or(HarvestError::Incomplete {
                    claimed: completion.claimed(),
                    total,
                })
            })
            .collect()
    }

    async fn lane<P: PageClient>(
        &self,
        page: &P,
        backlog: &[IndexEntry],
        completion: &Completion,
        slots: &[OnceLock<FullEntry>],
        mut progress: LaneProgress<'_>,
    ) -> HarvestResult<()> {
        while let Some(claim) = completion.claim() {
            let index = claim.index();
            let entry = &backlog[index];
            debug!(lane = progress.lane(), index, entry = %entry.id, "claimed entry");

            let full = self.extractor.extract(page, entry, &progress).await?;
            let stored = slots[index].set(full).is_ok();
            debug_assert!(stored, "backlog position {index} claimed twice");

            progress.entry_done();
            drop(claim);
        }

        debug!(lane = progress.lane(), completed = progress.completed(), "lane finished");
        Ok(())
    }
}
