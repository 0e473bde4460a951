//! The tail monitor appended after every user topology.
//!
//! The collector is the sole downstream of every terminal worker and the
//! sole upstream of the caller. It forwards terminal payloads verbatim,
//! counts clean branch completions, and re-raises the first failure it
//! observes, so the caller tracks one exit signal instead of one per branch.

use tokio::sync::watch;

use super::handle::{ExitReason, WorkerHandle, WorkerId};
use super::monitor::{LinkEvent, LinkMonitor};

/// Spawn the collector for a pipeline with `branches` terminal branches.
///
/// Returns its handle (terminal workers link to it like any successor) and
/// the caller-facing output receiver. The receiver yields every forwarded
/// payload and then disconnects once the collector terminates.
pub(crate) fn spawn_collector<P>(branches: usize) -> (WorkerHandle<P>, flume::Receiver<P>)
where
    P: Send + 'static,
{
    let id = WorkerId::next();
    let (mail_tx, mail_rx) = flume::unbounded();
    let (ctl_tx, ctl_rx) = flume::unbounded();
    let (exit_tx, exit_rx) = watch::channel(None);
    let (out_tx, out_rx) = flume::unbounded();

    let handle = WorkerHandle::new(id, mail_tx, ctl_tx, exit_rx);

    tokio::spawn(async move {
        let reason = collect(branches, &mail_rx, LinkMonitor::new(ctl_rx), &out_tx).await;
        tracing::debug!(collector = %id, reason = %reason, "collector finished");
        let _ = exit_tx.send(Some(reason));
    });

    (handle, out_rx)
}

/// Trap loop: payloads are forwarded as they arrive, peer exits are counted
/// rather than cascaded.
async fn collect<P>(
    branches: usize,
    mailbox: &flume::Receiver<P>,
    mut monitor: LinkMonitor,
    output: &flume::Sender<P>,
) -> ExitReason {
    let mut finished = 0usize;
    let mut mailbox_open = true;

    loop {
        tokio::select! {
            biased;
            msg = mailbox.recv_async(), if mailbox_open => match msg {
                Ok(payload) => {
                    let _ = output.send(payload);
                }
                Err(_) => mailbox_open = false,
            },
            event = monitor.event() => match event {
                LinkEvent::PeerExit(peer, ExitReason::Normal) => {
                    finished += 1;
                    tracing::debug!(%peer, finished, branches, "terminal branch completed");
                    if finished == branches {
                        // Payloads enqueued before the final exit are still
                        // owed to the caller; a worker publishes its sends
                        // before its exit reason, so one drain sees them all.
                        while let Ok(payload) = mailbox.try_recv() {
                            let _ = output.send(payload);
                        }
                        return ExitReason::Normal;
                    }
                }
                LinkEvent::PeerExit(peer, reason) => {
                    tracing::debug!(%peer, %reason, "terminal branch failed, collapsing");
                    return reason;
                }
                LinkEvent::Kill(reason) => return ExitReason::Abnormal(reason),
            },
        }
    }
}
