//! Pushes pending macro transactions to the responder.
//!
//! The whole pending log travels as one `SYNC_MACROS` message.  Delivery is
//! at-most-once: a batch leaves the log when it is taken, and is put back at
//! the front only if the send itself fails, ahead of anything appended in
//! the meantime.

use macrolink_core::{ChannelError, TransactionLog, WireMessage};
use tracing::{debug, warn};

use crate::application::fire_macros::CommandSink;

/// Sends every pending transaction in `log` through `sink`.
///
/// Returns how many transactions were sent; an empty log sends nothing.
///
/// # Errors
///
/// Returns the [`ChannelError`] from the failed send after re-queueing the
/// batch.
pub async fn push_pending(
    log: &TransactionLog,
    sink: &mut dyn CommandSink,
) -> Result<usize, ChannelError> {
    let batch = log.take_all();
    if batch.is_empty() {
        return Ok(0);
    }

    let count = batch.len();
    let message = WireMessage::SyncMacros(batch);
    match sink.send(&message).await {
        Ok(()) => {
            debug!(count, "macro transactions pushed");
            Ok(count)
        }
        Err(e) => {
            warn!(count, error = %e, "macro sync failed; transactions re-queued");
            if let WireMessage::SyncMacros(batch) = message {
                log.requeue_front(batch);
            }
            Err(e)
        }
    }
}
