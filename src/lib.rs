//! ```text
//! Topology ──► create ─┬─► Collector (tail monitor)
//!                      │        ▲  ▲
//!                      │   link │  │ payloads
//!                      │        │  │
//!                      └─► Workers (built back-to-front, linked down)
//!                               ▲
//!                               │ feed
//!                      Pipeline ┴─► out ─► Message… / Done / Failed
//! ```
//!
//! Chainline is a runtime for process pipelines: graphs of independently
//! running workers that communicate by asynchronous message passing. A
//! caller describes the topology declaratively (a chain, a fan-in of
//! parallel chains, a single worker), [`create`] turns it into running tokio
//! tasks, and a [`Pipeline`] handle feeds payloads in and streams results
//! out. Failure of any worker collapses the whole pipeline and surfaces as a
//! structured terminal value.
//!
//! Construction runs back-to-front so every worker starts against live
//! downstream handles, and every worker links to its successors before it is
//! announced; the collector at the tail is the only participant that traps
//! peer exits instead of cascading them.

pub mod builder;
pub mod options;
pub mod pipeline;
pub mod runtime;
pub mod topology;
pub mod worker;

pub use builder::{create, BuildError};
pub use options::{OptionEntry, Options, NEXT};
pub use pipeline::{Output, Pipeline};
pub use runtime::{ExitReason, WorkerHandle, WorkerId};
pub use topology::Topology;
pub use worker::{Worker, WorkerContext, WorkerError};
