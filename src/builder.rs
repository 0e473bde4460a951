//! Turning a topology into a running pipeline.
//!
//! Construction walks the tree back-to-front so every worker is spawned
//! with live successor handles: the collector first, then the last stage,
//! then the stage feeding it, and so on up to the entry points. Shape
//! validation happens before anything is spawned, so a malformed tree never
//! leaves tasks behind.

use futures_util::future::BoxFuture;
use miette::Diagnostic;
use thiserror::Error;
use tracing::instrument;

use crate::pipeline::Pipeline;
use crate::runtime::{spawn_collector, spawn_worker, WorkerHandle, WorkerId};
use crate::topology::Topology;

/// Errors surfaced while constructing a pipeline.
#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    /// A chain with no stages has no defined terminal branch.
    #[error("chain topology has no stages")]
    #[diagnostic(
        code(chainline::build::empty_chain),
        help("Give every chain at least one child topology.")
    )]
    EmptyChain,

    /// A fan-in with no branches has nothing to fan in.
    #[error("fan-in topology has no branches")]
    #[diagnostic(
        code(chainline::build::empty_fan_in),
        help("Give every fan-in at least one child topology.")
    )]
    EmptyFanIn,

    /// A starter observed a dead successor and refused to come up.
    #[error("{worker} aborted start-up: a downstream peer had already terminated")]
    #[diagnostic(
        code(chainline::build::start_aborted),
        help("A worker elsewhere in the topology terminated during construction.")
    )]
    StartAborted {
        /// The worker whose start-up was refused.
        worker: WorkerId,
    },
}

/// Build and start a pipeline from a topology.
///
/// Validates the tree, spawns the collector, then constructs the graph
/// back-to-front. On success the returned [`Pipeline`] holds the entry-point
/// handles and the output stream; on failure the partial graph is torn down
/// through the link discipline and no task survives.
///
/// # Examples
///
/// ```no_run
/// use async_trait::async_trait;
/// use chainline::{create, Options, Output, Topology, Worker, WorkerContext, WorkerError};
///
/// # struct Forward;
/// # #[async_trait]
/// # impl Worker<String> for Forward {
/// #     async fn run(&self, ctx: &mut WorkerContext<String>) -> Result<(), WorkerError> {
/// #         while let Some(msg) = ctx.get().await {
/// #             ctx.send(msg);
/// #         }
/// #         Ok(())
/// #     }
/// # }
/// # async fn example() -> Result<(), chainline::BuildError> {
/// let mut pipeline = create(Topology::chain(vec![
///     Topology::element(Forward, Options::new()),
///     Topology::element(Forward, Options::new()),
/// ]))
/// .await?;
///
/// pipeline.feed("hello".to_string());
/// pipeline.close();
/// assert_eq!(pipeline.out().await, Output::Message("hello".to_string()));
/// assert_eq!(pipeline.out().await, Output::Done);
/// # Ok(())
/// # }
/// ```
#[instrument(skip(topology), err)]
pub async fn create<P>(topology: Topology<P>) -> Result<Pipeline<P>, BuildError>
where
    P: Clone + Send + 'static,
{
    validate(&topology)?;

    let branches = topology.outlets();
    let (collector, output) = spawn_collector(branches);
    tracing::debug!(collector = %collector.id(), branches, "collector started");

    match build(topology, vec![collector.clone()]).await {
        Ok(entries) => {
            tracing::debug!(entry_points = entries.len(), "pipeline constructed");
            Ok(Pipeline::new(entries, output, collector))
        }
        Err(err) => {
            // Already-started workers are linked downstream; killing the
            // collector cascades back up through them, so nothing leaks.
            collector.kill("construction aborted");
            Err(err)
        }
    }
}

fn validate<P>(topology: &Topology<P>) -> Result<(), BuildError> {
    match topology {
        Topology::Element { .. } => Ok(()),
        Topology::Chain(children) => {
            if children.is_empty() {
                return Err(BuildError::EmptyChain);
            }
            children.iter().try_for_each(validate)
        }
        Topology::FanIn(children) => {
            if children.is_empty() {
                return Err(BuildError::EmptyFanIn);
            }
            children.iter().try_for_each(validate)
        }
    }
}

/// Construct `topology` so that its terminal workers feed `successors`,
/// returning the handles the level above must feed.
fn build<P>(
    topology: Topology<P>,
    successors: Vec<WorkerHandle<P>>,
) -> BoxFuture<'static, Result<Vec<WorkerHandle<P>>, BuildError>>
where
    P: Clone + Send + 'static,
{
    Box::pin(async move {
        match topology {
            Topology::Element { worker, options } => {
                let handle = spawn_worker(worker, options, successors)
                    .await
                    .map_err(|aborted| BuildError::StartAborted {
                        worker: aborted.worker,
                    })?;
                Ok(vec![handle])
            }
            Topology::FanIn(children) => {
                let mut handles = Vec::new();
                for child in children {
                    handles.extend(build(child, successors.clone()).await?);
                }
                Ok(handles)
            }
            Topology::Chain(children) => {
                let mut current = successors;
                for child in children.into_iter().rev() {
                    current = build(child, current).await?;
                }
                Ok(current)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use crate::runtime::ExitReason;
    use crate::worker::{Worker, WorkerContext, WorkerError};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Quit;

    #[async_trait]
    impl Worker<String> for Quit {
        async fn run(&self, _ctx: &mut WorkerContext<String>) -> Result<(), WorkerError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn starter_refuses_dead_successor() {
        let (collector, _output) = spawn_collector::<String>(1);
        let quick = spawn_worker(Arc::new(Quit) as Arc<dyn Worker<String>>, Options::new(), vec![collector])
            .await
            .map_err(|_| ())
            .expect("first worker starts against a live collector");

        // The body returns immediately; wait until its exit is published.
        assert_eq!(quick.exited().await, ExitReason::Normal);

        let refused = spawn_worker(
            Arc::new(Quit) as Arc<dyn Worker<String>>,
            Options::new(),
            vec![quick],
        )
        .await;
        assert!(refused.is_err(), "linking to a dead successor must abort");
    }

    #[tokio::test]
    async fn validate_rejects_empty_shapes() {
        assert!(matches!(
            create(Topology::<String>::chain(vec![])).await,
            Err(BuildError::EmptyChain)
        ));
        assert!(matches!(
            create(Topology::<String>::fan_in(vec![])).await,
            Err(BuildError::EmptyFanIn)
        ));
        assert!(matches!(
            create(Topology::<String>::chain(vec![
                Topology::element(Quit, Options::new()),
                Topology::fan_in(vec![]),
            ]))
            .await,
            Err(BuildError::EmptyFanIn)
        ));
    }
}
