//! The caller's side of a running pipeline.
//!
//! [`Pipeline`] is what [`crate::create`] returns: the entry-point handles,
//! the output stream fed by the collector, and the collector's own handle,
//! whose exit signal is the pipeline's terminal status. Feed payloads with
//! [`Pipeline::feed`], signal end-of-input with [`Pipeline::close`], and
//! drain results with [`Pipeline::out`] until a terminal value appears.

use std::fmt;

use crate::runtime::{ExitReason, WorkerHandle, WorkerId};

/// One step of the pipeline's output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output<P> {
    /// A payload forwarded verbatim from a terminal worker.
    Message(P),
    /// Every terminal branch completed normally; the stream is exhausted.
    Done,
    /// A worker terminated abnormally with this reason; the pipeline has
    /// collapsed and no further payloads will arrive.
    Failed(String),
}

/// A running pipeline.
///
/// Valid from [`crate::create`]'s return until a terminal [`Output`] has
/// been observed; after that, [`Pipeline::out`] keeps returning the same
/// terminal value.
pub struct Pipeline<P> {
    entries: Vec<WorkerHandle<P>>,
    output: flume::Receiver<P>,
    collector: WorkerHandle<P>,
}

impl<P> Pipeline<P> {
    pub(crate) fn new(
        entries: Vec<WorkerHandle<P>>,
        output: flume::Receiver<P>,
        collector: WorkerHandle<P>,
    ) -> Self {
        Self {
            entries,
            output,
            collector,
        }
    }

    /// The topmost workers, the ones that accept caller payloads.
    ///
    /// Handles can be cloned and kept; note that any kept clone holds the
    /// corresponding mailbox open, delaying the end-of-input cascade that
    /// [`Pipeline::close`] starts.
    #[must_use]
    pub fn entry_points(&self) -> &[WorkerHandle<P>] {
        &self.entries
    }

    /// The collector's id, for telling this pipeline's termination apart
    /// from any other in logs.
    #[must_use]
    pub fn collector_id(&self) -> WorkerId {
        self.collector.id()
    }

    /// Signal end-of-input by dropping the entry handles.
    ///
    /// Entry workers see their mailboxes close once no other sender clones
    /// remain, finish their receive loops, and the resulting normal-exit
    /// cascade runs down to the collector, which ends the stream with
    /// [`Output::Done`].
    pub fn close(&mut self) {
        self.entries.clear();
    }

    /// Await the next output.
    ///
    /// Yields every forwarded payload (per-upstream order preserved), then
    /// exactly one terminal value: [`Output::Done`] after a clean
    /// completion or [`Output::Failed`] after a collapse. Payloads that
    /// were forwarded before a failure are still delivered first.
    pub async fn out(&self) -> Output<P> {
        match self.output.recv_async().await {
            Ok(payload) => Output::Message(payload),
            Err(_) => match self.collector.exited().await {
                ExitReason::Normal => Output::Done,
                ExitReason::Abnormal(reason) => Output::Failed(reason),
            },
        }
    }
}

impl<P: Clone> Pipeline<P> {
    /// Deliver a payload to every entry point.
    ///
    /// Fire-and-forget: no delivery confirmation, no backpressure. After
    /// [`Pipeline::close`] this is a no-op.
    pub fn feed(&self, msg: P) {
        for entry in &self.entries {
            entry.send(msg.clone());
        }
    }
}

impl<P> fmt::Debug for Pipeline<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("entry_points", &self.entries.len())
            .field("collector", &self.collector.id())
            .finish()
    }
}
