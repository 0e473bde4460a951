//! Link monitoring for worker tasks.
//!
//! Every worker loop selects on [`LinkMonitor::event`] alongside its body.
//! The monitor owns the worker's control channel (link installation, kill
//! requests) and the set of peer exit signals collected so far, and turns
//! both into a single stream of [`LinkEvent`]s.

use futures_util::future::select_all;

use super::handle::{ExitReason, ExitSignal, WorkerId};

/// Out-of-band instructions delivered on a worker's control channel.
pub(crate) enum Control {
    /// Watch the given peer; its abnormal exit becomes this worker's exit.
    Link(ExitSignal),
    /// Terminate with the given abnormal reason.
    Kill(String),
}

/// Something the worker loop must react to.
pub(crate) enum LinkEvent {
    /// A linked peer terminated with the given reason.
    PeerExit(WorkerId, ExitReason),
    /// A kill request arrived on the control channel.
    Kill(String),
}

pub(crate) struct LinkMonitor {
    control: flume::Receiver<Control>,
    control_open: bool,
    peers: Vec<ExitSignal>,
}

impl LinkMonitor {
    pub(crate) fn new(control: flume::Receiver<Control>) -> Self {
        Self {
            control,
            control_open: true,
            peers: Vec::new(),
        }
    }

    /// Start watching a peer. Used by the starter for downstream links;
    /// upstream links arrive as [`Control::Link`] messages.
    pub(crate) fn watch(&mut self, signal: ExitSignal) {
        self.peers.push(signal);
    }

    /// The next link event.
    ///
    /// Pends forever once the control channel is closed and no watched peer
    /// remains, leaving the worker's fate to its body alone. Cancel-safe:
    /// link installations are committed to `self` as they arrive.
    pub(crate) async fn event(&mut self) -> LinkEvent {
        loop {
            if !self.control_open && self.peers.is_empty() {
                return std::future::pending().await;
            }
            tokio::select! {
                ctl = self.control.recv_async(), if self.control_open => match ctl {
                    Ok(Control::Link(signal)) => self.peers.push(signal),
                    Ok(Control::Kill(reason)) => return LinkEvent::Kill(reason),
                    Err(_) => self.control_open = false,
                },
                (idx, reason) = next_peer_exit(&mut self.peers), if !self.peers.is_empty() => {
                    let signal = self.peers.swap_remove(idx);
                    return LinkEvent::PeerExit(signal.peer(), reason);
                }
            }
        }
    }
}

/// Resolves with the index and reason of the first watched peer to exit.
async fn next_peer_exit(peers: &mut [ExitSignal]) -> (usize, ExitReason) {
    if peers.is_empty() {
        return std::future::pending().await;
    }
    let waits = peers.iter_mut().enumerate().map(|(idx, signal)| {
        Box::pin(async move {
            let reason = signal.exited().await;
            (idx, reason)
        })
    });
    let (resolved, _, _) = select_all(waits).await;
    resolved
}
