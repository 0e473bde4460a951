//! Worker execution: handles, links, the start handshake, and the collector.
//!
//! Everything in this module is about *running* a topology. Each worker is a
//! tokio task owning a flume mailbox; termination is published once on a
//! watch channel; links are rendered as exit-signal observation. Workers do
//! not trap: an abnormal peer exit terminates them with the same reason,
//! which is how a failure anywhere cascades to the collector at the tail.

mod collector;
mod handle;
mod monitor;
mod spawn;

pub use handle::{ExitReason, WorkerHandle, WorkerId};

pub(crate) use collector::spawn_collector;
pub(crate) use spawn::{spawn_worker, StartAborted};
