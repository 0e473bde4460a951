//! The contract every worker body honors.
//!
//! A body is an object implementing [`Worker`]: it receives payloads through
//! [`WorkerContext::get`], forwards them with [`WorkerContext::send`], and
//! decides its own exit. Returning `Ok(())` is a normal termination (the
//! usual shape is a receive loop that ends when the input closes); returning
//! an error, panicking, or being killed is an abnormal one whose reason
//! collapses the pipeline.
//!
//! # Examples
//!
//! A forwarder that passes everything through until its input closes:
//!
//! ```
//! use async_trait::async_trait;
//! use chainline::{Worker, WorkerContext, WorkerError};
//!
//! struct Forward;
//!
//! #[async_trait]
//! impl Worker<String> for Forward {
//!     async fn run(&self, ctx: &mut WorkerContext<String>) -> Result<(), WorkerError> {
//!         while let Some(msg) = ctx.get().await {
//!             ctx.send(msg);
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::options::{Options, NEXT};

/// A user-supplied worker body.
///
/// Implementations should be small and focused; composition happens at the
/// topology level, not inside bodies.
#[async_trait]
pub trait Worker<P>: Send + Sync {
    /// Run the body to completion.
    ///
    /// # Returns
    /// * `Ok(())` - normal termination, counted toward end-of-stream
    /// * `Err(WorkerError)` - abnormal termination; the reason cascades
    ///   through the link graph and surfaces at the pipeline output
    async fn run(&self, ctx: &mut WorkerContext<P>) -> Result<(), WorkerError>;
}

/// Abnormal termination reason produced by a worker body.
#[derive(Debug, Error, Diagnostic)]
#[error("{reason}")]
#[diagnostic(
    code(chainline::worker::failed),
    help("The reason is delivered verbatim to the pipeline output.")
)]
pub struct WorkerError {
    reason: String,
}

impl WorkerError {
    /// A failure with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The reason that will cascade to the pipeline output.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl From<&str> for WorkerError {
    fn from(reason: &str) -> Self {
        Self::new(reason)
    }
}

impl From<String> for WorkerError {
    fn from(reason: String) -> Self {
        Self::new(reason)
    }
}

/// Execution environment handed to a running body.
///
/// Owns the worker's mailbox and its options bag (with the `NEXT` peers
/// entry already installed at the head). Dropping the context is what closes
/// the downstream mailboxes, so a worker's clean exit doubles as its
/// end-of-input signal to the level below.
pub struct WorkerContext<P> {
    mailbox: flume::Receiver<P>,
    options: Options<P>,
}

impl<P> WorkerContext<P> {
    pub(crate) fn new(mailbox: flume::Receiver<P>, options: Options<P>) -> Self {
        Self { mailbox, options }
    }

    /// Await the next payload.
    ///
    /// Returns `None` once every upstream sender is gone: end of input.
    /// Control traffic never appears here; the mailbox carries application
    /// payloads only.
    pub async fn get(&mut self) -> Option<P> {
        self.mailbox.recv_async().await.ok()
    }

    /// The options bag, including the injected `NEXT` entry.
    #[must_use]
    pub fn options(&self) -> &Options<P> {
        &self.options
    }
}

impl<P: Clone> WorkerContext<P> {
    /// Forward a payload to every downstream peer.
    pub fn send(&self, msg: P) {
        self.send_to(NEXT, msg);
    }

    /// Deliver a payload to every addressable handle bound to `tag`.
    ///
    /// Non-addressable entries under the tag are skipped silently; the
    /// returned recipient count lets strict callers treat zero as a
    /// configuration bug. Delivery is fire-and-forget and unordered across
    /// recipients.
    pub fn send_to(&self, tag: &str, msg: P) -> usize {
        let peers = self.options.peers(tag);
        if peers.is_empty() {
            tracing::trace!(tag, "send_to found no addressable recipients");
            return 0;
        }
        for peer in &peers {
            peer.send(msg.clone());
        }
        peers.len()
    }
}
