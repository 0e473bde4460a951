//! The worker start-up protocol.
//!
//! Workers are never spawned directly: [`spawn_worker`] runs the start
//! handshake inside the fresh task and only acks the builder once every
//! downstream link is installed. The ordering is what makes construction
//! safe: a worker is announced to its parent strictly after it is wired to
//! live successors, so the level above always receives usable handles.

use std::any::Any;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::{oneshot, watch};

use crate::options::{Options, NEXT};
use crate::worker::{Worker, WorkerContext};

use super::handle::{ExitReason, ExitSignal, WorkerHandle, WorkerId};
use super::monitor::{LinkEvent, LinkMonitor};

/// Start-up refused: a downstream peer was already gone.
pub(crate) struct StartAborted {
    pub(crate) worker: WorkerId,
}

enum StartAck {
    Ready,
    DeadSuccessor,
}

/// Spawn one worker wired to `successors` and wait for its start-up ack.
///
/// On success the returned handle addresses a running worker whose body has
/// been handed the options bag with `(NEXT, successors)` prepended. On
/// failure the task has already terminated with reason `Normal` and nothing
/// was linked to it.
pub(crate) async fn spawn_worker<P>(
    worker: Arc<dyn Worker<P>>,
    options: Options<P>,
    successors: Vec<WorkerHandle<P>>,
) -> Result<WorkerHandle<P>, StartAborted>
where
    P: Clone + Send + 'static,
{
    let id = WorkerId::next();
    let (mail_tx, mail_rx) = flume::unbounded();
    let (ctl_tx, ctl_rx) = flume::unbounded();
    let (exit_tx, exit_rx) = watch::channel(None);
    let (ack_tx, ack_rx) = oneshot::channel();

    let handle = WorkerHandle::new(id, mail_tx, ctl_tx, exit_rx.clone());

    tokio::spawn(async move {
        let mut monitor = LinkMonitor::new(ctl_rx);

        for peer in &successors {
            // An earlier sibling's failure may have taken the successors
            // down between build steps; bail out quietly if so. The peer is
            // re-checked after linking to close the gap between the
            // aliveness probe and the control send.
            let linked = peer.is_alive()
                && peer.link(ExitSignal::new(id, exit_rx.clone()))
                && peer.is_alive();
            if !linked {
                tracing::debug!(worker = %id, peer = %peer.id(), "successor dead at start-up");
                let _ = ack_tx.send(StartAck::DeadSuccessor);
                let _ = exit_tx.send(Some(ExitReason::Normal));
                return;
            }
            monitor.watch(peer.exit_signal());
        }

        if ack_tx.send(StartAck::Ready).is_err() {
            // Builder gone; nothing will ever feed this worker.
            let _ = exit_tx.send(Some(ExitReason::Normal));
            return;
        }

        let mut bag = options;
        bag.prepend_peers(NEXT, successors);
        let mut ctx = WorkerContext::new(mail_rx, bag);

        let reason = drive(worker.as_ref(), &mut ctx, &mut monitor).await;
        tracing::debug!(worker = %id, reason = %reason, "worker exited");

        // The exit reason must be visible before the context (and with it
        // this worker's downstream mailbox senders) is dropped; otherwise a
        // downstream peer could read the closed mailbox as clean end-of-input
        // while this worker actually failed.
        let _ = exit_tx.send(Some(reason));
        drop(ctx);
    });

    match ack_rx.await {
        Ok(StartAck::Ready) => Ok(handle),
        _ => Err(StartAborted { worker: id }),
    }
}

/// Run the body until it finishes or a link event terminates the worker.
///
/// The monitor is polled with priority so an abnormal peer exit is observed
/// before the mailbox closure it causes.
async fn drive<P>(
    worker: &dyn Worker<P>,
    ctx: &mut WorkerContext<P>,
    monitor: &mut LinkMonitor,
) -> ExitReason
where
    P: Clone + Send + 'static,
{
    let body = std::panic::AssertUnwindSafe(worker.run(ctx)).catch_unwind();
    tokio::pin!(body);

    loop {
        tokio::select! {
            biased;
            event = monitor.event() => match event {
                // Normal peer exits do not propagate; end-of-input arrives
                // through mailbox closure instead.
                LinkEvent::PeerExit(_, ExitReason::Normal) => {}
                LinkEvent::PeerExit(peer, reason) => {
                    tracing::debug!(peer = %peer, reason = %reason, "linked peer failed");
                    return reason;
                }
                LinkEvent::Kill(reason) => return ExitReason::Abnormal(reason),
            },
            outcome = &mut body => {
                return match outcome {
                    Ok(Ok(())) => ExitReason::Normal,
                    Ok(Err(err)) => ExitReason::Abnormal(err.reason().to_string()),
                    Err(payload) => ExitReason::Abnormal(panic_reason(payload.as_ref())),
                };
            }
        }
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked".to_string()
    }
}
