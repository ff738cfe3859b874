//! Per-key mailbox messages
//!
//! TigerStyle: Bounded queues with explicit limits, no silent drops.
//!
//! Each actor owns the receiving half of a bounded `mpsc` channel. Callers
//! enqueue an [`Envelope`] and wait on its oneshot reply. An envelope
//! dispatched through the directory also carries the key's pending-work
//! slot; the actor releases it once the operation has run, whether or not
//! the caller is still waiting.

use crate::directory::PendingGuard;
use smartcache_core::error::Result;
use smartcache_core::io::TimeProvider;
use std::fmt;
use tokio::sync::{mpsc, oneshot};

/// Sending half of a key's mailbox
pub type MailboxSender = mpsc::Sender<Envelope>;

/// Receiving half of a key's mailbox (owned by the actor task)
pub type MailboxReceiver = mpsc::Receiver<Envelope>;

/// Create a mailbox holding at most `depth` queued envelopes
pub fn mailbox(depth: usize) -> (MailboxSender, MailboxReceiver) {
    debug_assert!(depth > 0, "mailbox depth must be positive");
    mpsc::channel(depth)
}

/// Operations a key actor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Read the in-memory flag
    IsBreached,
    /// Mark the key breached; replies `true` only on the transition
    Add,
    /// Clear the durable record and the flag
    Remove,
}

impl Operation {
    /// Stable name used in logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            Operation::IsBreached => "is_breached",
            Operation::Add => "add",
            Operation::Remove => "remove",
        }
    }

    /// Whether the operation touches the durable store
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Operation::IsBreached)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A message in a key's mailbox
#[derive(Debug)]
pub struct Envelope {
    /// The requested operation
    pub operation: Operation,
    /// Channel to send the response
    pub reply_tx: oneshot::Sender<Result<bool>>,
    /// When the message was enqueued (monotonic timestamp in ms)
    pub enqueued_at_ms: u64,
    /// Pending-work slot held until the actor has finished the operation
    pending: Option<PendingGuard>,
}

impl Envelope {
    /// Create a new envelope stamped with the given time provider
    pub fn new_with_time(
        operation: Operation,
        reply_tx: oneshot::Sender<Result<bool>>,
        time: &dyn TimeProvider,
    ) -> Self {
        Self {
            operation,
            reply_tx,
            enqueued_at_ms: time.monotonic_ms(),
            pending: None,
        }
    }

    /// Attach the key's pending-work slot
    pub(crate) fn with_pending(mut self, pending: PendingGuard) -> Self {
        self.pending = Some(pending);
        self
    }

    /// Release the pending-work slot and deliver `result`
    ///
    /// Must only be called after the operation has finished with the store.
    pub fn complete(self, result: Result<bool>) {
        drop(self.pending);
        // Caller may have timed out and dropped the receiver
        let _ = self.reply_tx.send(result);
    }

    /// Time this message has been waiting in milliseconds
    pub fn wait_time_ms_with_time(&self, time: &dyn TimeProvider) -> u64 {
        time.monotonic_ms().saturating_sub(self.enqueued_at_ms)
    }
}
