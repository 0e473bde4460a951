//! Worker handles and termination signals.
//!
//! A [`WorkerHandle`] is the only way the rest of the system addresses a
//! running worker: it carries the mailbox sender for application payloads,
//! the control sender used by the link protocol, and a watch receiver that
//! publishes the worker's [`ExitReason`] exactly once.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::monitor::Control;

/// Process-unique identifier for a spawned worker.
///
/// Ids are allocated from a crate-wide atomic counter, so two pipelines never
/// reuse an id within one process. Useful for logging and for telling a
/// collector's termination apart from unrelated events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerId(u64);

impl WorkerId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        WorkerId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// Why a worker stopped.
///
/// `Normal` is produced by a body that returns `Ok(())` (typically after its
/// input closed). Everything else is `Abnormal` and carries the reason that
/// will cascade through the link graph: a body error, a panic payload, or a
/// kill reason supplied by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// The body finished on its own terms.
    Normal,
    /// The body failed, panicked, or was killed with the given reason.
    Abnormal(String),
}

impl ExitReason {
    /// Returns `true` for [`ExitReason::Normal`].
    #[must_use]
    pub fn is_normal(&self) -> bool {
        matches!(self, ExitReason::Normal)
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Normal => write!(f, "normal"),
            ExitReason::Abnormal(reason) => write!(f, "{reason}"),
        }
    }
}

/// One peer's termination, observable from another task.
///
/// Wraps the watch receiver so observers can await the single transition
/// from "running" (`None`) to `Some(reason)`.
pub(crate) struct ExitSignal {
    peer: WorkerId,
    rx: watch::Receiver<Option<ExitReason>>,
}

impl ExitSignal {
    pub(crate) fn new(peer: WorkerId, rx: watch::Receiver<Option<ExitReason>>) -> Self {
        Self { peer, rx }
    }

    pub(crate) fn peer(&self) -> WorkerId {
        self.peer
    }

    /// Resolves once the peer has terminated.
    ///
    /// A watch channel whose sender vanished without publishing a reason is
    /// reported as an abnormal `noproc` exit; it means the peer task was torn
    /// down outside the normal shutdown path.
    pub(crate) async fn exited(&mut self) -> ExitReason {
        match self.rx.wait_for(Option::is_some).await {
            Ok(reason) => (*reason).clone().unwrap_or(ExitReason::Normal),
            Err(_) => ExitReason::Abnormal("noproc".to_string()),
        }
    }
}

/// Addressable reference to a running worker.
///
/// Handles are cheap to clone and never control the worker's lifetime; they
/// address its mailbox and allow its termination to be observed. All sends
/// are asynchronous fire-and-forget: delivering to a worker that has already
/// terminated is a silent no-op.
pub struct WorkerHandle<P> {
    id: WorkerId,
    mailbox: flume::Sender<P>,
    control: flume::Sender<Control>,
    exit: watch::Receiver<Option<ExitReason>>,
}

impl<P> WorkerHandle<P> {
    pub(crate) fn new(
        id: WorkerId,
        mailbox: flume::Sender<P>,
        control: flume::Sender<Control>,
        exit: watch::Receiver<Option<ExitReason>>,
    ) -> Self {
        Self {
            id,
            mailbox,
            control,
            exit,
        }
    }

    /// This worker's process-unique id.
    #[must_use]
    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Deliver a payload to the worker's mailbox.
    ///
    /// Never blocks and never fails: payloads sent to a terminated worker are
    /// dropped, matching fire-and-forget delivery.
    pub fn send(&self, msg: P) {
        let _ = self.mailbox.send(msg);
    }

    /// Terminate the worker with an abnormal reason.
    ///
    /// The reason cascades through the link graph exactly like a body
    /// failure, so killing any worker collapses its whole pipeline.
    pub fn kill(&self, reason: impl Into<String>) {
        let _ = self.control.send(Control::Kill(reason.into()));
    }

    /// Whether the worker has neither terminated nor been torn down.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.exit.borrow().is_none() && !self.mailbox.is_disconnected()
    }

    /// Wait for the worker to terminate and return its reason.
    pub async fn exited(&self) -> ExitReason {
        let mut signal = self.exit_signal();
        signal.exited().await
    }

    /// A fresh observer of this worker's termination.
    pub(crate) fn exit_signal(&self) -> ExitSignal {
        ExitSignal::new(self.id, self.exit.clone())
    }

    /// Ask the worker to watch `signal` and die with any abnormal reason it
    /// publishes. Returns `false` if the worker's control channel is already
    /// gone.
    pub(crate) fn link(&self, signal: ExitSignal) -> bool {
        self.control.send(Control::Link(signal)).is_ok()
    }
}

impl<P> Clone for WorkerHandle<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            mailbox: self.mailbox.clone(),
            control: self.control.clone(),
            exit: self.exit.clone(),
        }
    }
}

impl<P> fmt::Debug for WorkerHandle<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}
