#![allow(dead_code)]

pub mod workers;

pub use workers::*;

use chainline::{Options, Output, Pipeline, Topology};

/// A single forwarding stage.
pub fn forward() -> Topology<String> {
    Topology::element(Forward, Options::new())
}

/// Collect every payload from the pipeline until a terminal value arrives.
pub async fn drain(pipeline: &Pipeline<String>) -> (Vec<String>, Output<String>) {
    let mut messages = Vec::new();
    loop {
        match pipeline.out().await {
            Output::Message(msg) => messages.push(msg),
            terminal => return (messages, terminal),
        }
    }
}
