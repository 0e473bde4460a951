use std::time::Duration;

use chainline::{create, Options, Output, Topology};
use tokio::time::timeout;

mod common;
use common::*;

const TICK: Duration = Duration::from_secs(5);

#[tokio::test]
async fn linear_chain_preserves_order() {
    let mut pipeline = create(Topology::chain(vec![forward(), forward()]))
        .await
        .unwrap();

    pipeline.feed("a".to_string());
    pipeline.feed("b".to_string());
    pipeline.close();

    let (messages, terminal) = timeout(TICK, drain(&pipeline)).await.unwrap();
    assert_eq!(messages, vec!["a", "b"]);
    assert_eq!(terminal, Output::Done);
}

#[tokio::test]
async fn single_element_pipeline() {
    let mut pipeline = create(forward()).await.unwrap();

    pipeline.feed("solo".to_string());
    pipeline.close();

    let (messages, terminal) = timeout(TICK, drain(&pipeline)).await.unwrap();
    assert_eq!(messages, vec!["solo"]);
    assert_eq!(terminal, Output::Done);
}

#[tokio::test]
async fn doubler_emits_each_payload_twice() {
    let mut pipeline = create(Topology::chain(vec![
        forward(),
        Topology::element(Doubler, Options::new()),
    ]))
    .await
    .unwrap();

    pipeline.feed("1".to_string());
    pipeline.close();

    let (messages, terminal) = timeout(TICK, drain(&pipeline)).await.unwrap();
    assert_eq!(messages, vec!["1", "1"]);
    assert_eq!(terminal, Output::Done);
}

#[tokio::test]
async fn chain_into_fan_in_duplicates_across_branches() {
    let mut pipeline = create(Topology::chain(vec![
        forward(),
        Topology::fan_in(vec![forward(), forward()]),
    ]))
    .await
    .unwrap();
    assert_eq!(pipeline.entry_points().len(), 1);

    pipeline.feed("x".to_string());
    pipeline.close();

    let (messages, terminal) = timeout(TICK, drain(&pipeline)).await.unwrap();
    assert_eq!(messages, vec!["x", "x"]);
    assert_eq!(terminal, Output::Done);
}

#[tokio::test]
async fn fan_in_merges_independent_entries() {
    let mut pipeline = create(Topology::fan_in(vec![forward(), forward()]))
        .await
        .unwrap();
    assert_eq!(pipeline.entry_points().len(), 2);

    let left = &pipeline.entry_points()[0];
    let right = &pipeline.entry_points()[1];
    left.send("l1".to_string());
    left.send("l2".to_string());
    right.send("r1".to_string());
    right.send("r2".to_string());
    right.send("r3".to_string());
    pipeline.close();

    let (mut messages, terminal) = timeout(TICK, drain(&pipeline)).await.unwrap();
    messages.sort();
    assert_eq!(messages, vec!["l1", "l2", "r1", "r2", "r3"]);
    assert_eq!(terminal, Output::Done);
}

#[tokio::test]
async fn per_upstream_order_is_preserved() {
    let mut pipeline = create(Topology::chain(vec![forward(), forward(), forward()]))
        .await
        .unwrap();

    let expected: Vec<String> = (0..50).map(|i| format!("msg-{i:02}")).collect();
    for msg in &expected {
        pipeline.feed(msg.clone());
    }
    pipeline.close();

    let (messages, terminal) = timeout(TICK, drain(&pipeline)).await.unwrap();
    assert_eq!(messages, expected);
    assert_eq!(terminal, Output::Done);
}

#[tokio::test]
async fn out_keeps_returning_the_terminal_value() {
    let mut pipeline = create(forward()).await.unwrap();
    pipeline.close();

    assert_eq!(timeout(TICK, pipeline.out()).await.unwrap(), Output::Done);
    assert_eq!(timeout(TICK, pipeline.out()).await.unwrap(), Output::Done);
}

#[tokio::test]
async fn pipelines_are_isolated() {
    let mut first = create(Topology::chain(vec![forward(), forward()]))
        .await
        .unwrap();
    let mut second = create(Topology::chain(vec![
        forward(),
        Topology::element(CrashOn { reason: "boom" }, Options::new()),
    ]))
    .await
    .unwrap();

    second.feed("trigger".to_string());
    let (_, crashed) = timeout(TICK, drain(&second)).await.unwrap();
    assert_eq!(crashed, Output::Failed("boom".to_string()));

    // The healthy pipeline never notices.
    first.feed("still".to_string());
    first.feed("here".to_string());
    first.close();
    let (messages, terminal) = timeout(TICK, drain(&first)).await.unwrap();
    assert_eq!(messages, vec!["still", "here"]);
    assert_eq!(terminal, Output::Done);
}

#[tokio::test]
async fn options_route_to_peers_in_other_pipelines() {
    let mut audit = create(forward()).await.unwrap();
    let audit_entry = audit.entry_points()[0].clone();

    let mut main = create(Topology::element(
        Tee { tag: "audit" },
        Options::new().with_peer("audit", audit_entry),
    ))
    .await
    .unwrap();

    main.feed("x".to_string());
    main.close();

    let (messages, terminal) = timeout(TICK, drain(&main)).await.unwrap();
    assert_eq!(messages, vec!["x"]);
    assert_eq!(terminal, Output::Done);

    audit.close();
    let (messages, terminal) = timeout(TICK, drain(&audit)).await.unwrap();
    assert_eq!(messages, vec!["x"]);
    assert_eq!(terminal, Output::Done);
}
