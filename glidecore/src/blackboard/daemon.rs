//! Background merge task.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::board::Blackboard;

/// Spawns the task that performs scheduled merges.
///
/// Bursts of [`Blackboard::schedule_merge`] calls between two wake-ups are
/// coalesced into one merge. The task stops when `cancellation` fires.
pub fn spawn_merge_daemon(blackboard: Arc<Blackboard>, cancellation: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!("Merge daemon started");

        loop {
            tokio::select! {
                _ = blackboard.merge_requested() => {
                    blackboard.merge_if_scheduled();
                }
                _ = cancellation.cancelled() => {
                    tracing::debug!("Merge daemon stopped");
                    break;
                }
            }
        }
    })
}
