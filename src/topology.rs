//! Declarative pipeline topologies.
//!
//! A [`Topology`] is pure data: a tree whose leaves are worker bodies and
//! whose interior nodes say how stages connect. [`crate::create`] turns it
//! into a running graph; nothing here has side effects.
//!
//! # Examples
//!
//! A two-stage chain whose second stage fans in from two parallel branches:
//!
//! ```
//! use async_trait::async_trait;
//! use chainline::{Options, Topology, Worker, WorkerContext, WorkerError};
//!
//! # struct Forward;
//! # #[async_trait]
//! # impl Worker<String> for Forward {
//! #     async fn run(&self, ctx: &mut WorkerContext<String>) -> Result<(), WorkerError> {
//! #         while let Some(msg) = ctx.get().await {
//! #             ctx.send(msg);
//! #         }
//! #         Ok(())
//! #     }
//! # }
//! let topology = Topology::chain(vec![
//!     Topology::element(Forward, Options::new()),
//!     Topology::fan_in(vec![
//!         Topology::element(Forward, Options::new()),
//!         Topology::element(Forward, Options::new()),
//!     ]),
//! ]);
//!
//! // Both fan-in branches terminate the pipeline.
//! assert_eq!(topology.outlets(), 2);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::options::Options;
use crate::worker::Worker;

/// A declarative description of a pipeline.
pub enum Topology<P> {
    /// A single worker.
    Element {
        /// The body to run.
        worker: Arc<dyn Worker<P>>,
        /// Caller options handed to the body untouched.
        options: Options<P>,
    },
    /// Parallel sub-topologies fanning into a common successor.
    FanIn(Vec<Topology<P>>),
    /// An ordered sequence of sub-topologies, each feeding the next.
    Chain(Vec<Topology<P>>),
}

impl<P> Topology<P> {
    /// A single-worker topology.
    #[must_use]
    pub fn element(worker: impl Worker<P> + 'static, options: Options<P>) -> Self {
        Topology::Element {
            worker: Arc::new(worker),
            options,
        }
    }

    /// A fan-in of parallel sub-topologies.
    #[must_use]
    pub fn fan_in(children: Vec<Topology<P>>) -> Self {
        Topology::FanIn(children)
    }

    /// A pipeline of sub-topologies in order.
    #[must_use]
    pub fn chain(children: Vec<Topology<P>>) -> Self {
        Topology::Chain(children)
    }

    /// Number of terminal branches: the workers that will link directly into
    /// the collector when this topology runs.
    ///
    /// An element contributes one; a chain contributes whatever its last
    /// stage does; a fan-in contributes the sum over its branches. Empty
    /// chains and fan-ins contribute zero and are rejected by
    /// [`crate::create`] before anything is spawned.
    #[must_use]
    pub fn outlets(&self) -> usize {
        match self {
            Topology::Element { .. } => 1,
            Topology::Chain(children) => children.last().map_or(0, Topology::outlets),
            Topology::FanIn(children) => children.iter().map(Topology::outlets).sum(),
        }
    }
}

impl<P> fmt::Debug for Topology<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topology::Element { options, .. } => f
                .debug_struct("Element")
                .field("options", options)
                .finish_non_exhaustive(),
            Topology::FanIn(children) => f.debug_tuple("FanIn").field(children).finish(),
            Topology::Chain(children) => f.debug_tuple("Chain").field(children).finish(),
        }
    }
}
