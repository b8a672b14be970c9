use super::mock::{MockDriver, MockState};
use crate::{
    error::InitError,
    outcome::FlushOutcome,
    sink::{Sink, postgres::DatabaseSink},
};
use chrono::{TimeZone, Utc};
use connectors::sql::base::connection::ConnectionState;
use model::{
    execution::connection::{ConnectionConfig, PayloadMode},
    records::{batch::Batch, record::Record},
};
use serde_json::{Value, json};
use std::{
    sync::{Arc, atomic::Ordering},
    time::Duration,
};
use tokio::sync::Notify;
use tracing_test::traced_test;

fn config() -> ConnectionConfig {
    ConnectionConfig::new("db.local", "5432", "logs", "events")
}

fn waiting_config() -> ConnectionConfig {
    config().with_result_wait(Duration::from_secs(1))
}

fn hello_batch() -> Batch {
    let ts = Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap();
    Batch::new(
        "app.logs",
        vec![Record::from_value(ts, json!({"msg": "hello"})).unwrap()],
    )
}

async fn sink(
    state: &Arc<MockState>,
    config: ConnectionConfig,
) -> DatabaseSink<MockDriver> {
    DatabaseSink::init(MockDriver::new(state.clone()), config)
        .await
        .unwrap()
}

/// Lets spawned tasks on the current-thread test runtime make progress.
async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_init_creates_table_once_then_inserts() {
    let state = Arc::new(MockState::default());
    let mut sink = sink(&state, waiting_config()).await;

    let executed = state.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(
        executed[0].sql,
        r#"CREATE TABLE IF NOT EXISTS "events" (data json);"#
    );

    let outcome = sink.flush(&hello_batch()).await;
    assert_eq!(outcome, FlushOutcome::Ok);

    let executed = state.executed();
    assert_eq!(executed.len(), 2);
    assert_eq!(
        executed.iter().filter(|s| s.sql.starts_with("CREATE")).count(),
        1
    );

    let insert = &executed[1];
    assert_eq!(insert.sql.matches(r#""events""#).count(), 1);
    assert_eq!(insert.params.len(), 1);

    let rows: Value = serde_json::from_str(&insert.params[0]).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);

    let row = rows[0].as_object().unwrap();
    let keys: Vec<_> = row.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["msg", "date"]);
    assert_eq!(row["msg"], "hello");
    assert_eq!(row["date"].as_f64(), Some(1_700_000_000.5));

    let metrics = sink.metrics();
    assert_eq!(metrics.flushes, 1);
    assert_eq!(metrics.records_written, 1);
    assert_eq!(metrics.deferred_count, 0);
}

#[tokio::test]
async fn test_literal_payload_embeds_document() {
    let state = Arc::new(MockState::default());
    let mut sink = sink(&state, waiting_config().with_payload(PayloadMode::Literal)).await;

    assert_eq!(sink.flush(&hello_batch()).await, FlushOutcome::Ok);

    let inserts = state.inserts();
    assert_eq!(inserts.len(), 1);
    assert!(inserts[0].params.is_empty());
    assert!(
        inserts[0]
            .sql
            .contains(r#"json_array_elements('[{"msg":"hello","date":1700000000.5}]')"#)
    );
}

#[tokio::test]
async fn test_escaped_table_is_reused_for_every_statement() {
    let state = Arc::new(MockState::default());
    let config = ConnectionConfig::new("db.local", "5432", "logs", r#"odd"name"#)
        .with_result_wait(Duration::from_secs(1));
    let mut sink = sink(&state, config).await;

    assert_eq!(sink.table().as_str(), r#""odd""name""#);
    sink.flush(&hello_batch()).await;
    sink.flush(&hello_batch()).await;

    for statement in state.executed() {
        assert_eq!(statement.sql.matches(r#""odd""name""#).count(), 1);
    }
}

#[tokio::test]
async fn test_unhealthy_connection_resets_and_retries() {
    let state = Arc::new(MockState::default());
    let mut sink = sink(&state, config()).await;

    state.closed.store(true, Ordering::SeqCst);
    assert_eq!(sink.flush(&hello_batch()).await, FlushOutcome::Retry);
    assert!(state.inserts().is_empty());

    // The reconnect runs in the background and is picked up next cycle.
    settle().await;
    assert_eq!(state.connects.load(Ordering::SeqCst), 2);

    assert_eq!(sink.flush(&hello_batch()).await, FlushOutcome::Ok);
    settle().await;
    assert_eq!(state.inserts().len(), 1);
    assert_eq!(sink.metrics().retry_count, 1);
}

#[tokio::test]
async fn test_retry_while_reconnect_keeps_failing() {
    let state = Arc::new(MockState::default());
    let mut sink = sink(&state, config()).await;

    state.closed.store(true, Ordering::SeqCst);
    state.refuse_connect.store(true, Ordering::SeqCst);

    for _ in 0..3 {
        assert_eq!(sink.flush(&hello_batch()).await, FlushOutcome::Retry);
        settle().await;
    }
    assert!(state.inserts().is_empty());
    assert_eq!(sink.connection().state(), ConnectionState::Failed);
}

#[tokio::test]
#[traced_test]
async fn test_rejected_statement_is_error_and_connection_survives() {
    let state = Arc::new(MockState::default());
    let mut sink = sink(&state, waiting_config()).await;

    state.fail_next.store(true, Ordering::SeqCst);
    assert_eq!(sink.flush(&hello_batch()).await, FlushOutcome::Error);
    assert!(logs_contain("invalid input syntax for type json"));

    assert_eq!(sink.flush(&hello_batch()).await, FlushOutcome::Ok);
    assert_eq!(state.inserts().len(), 2);

    let metrics = sink.metrics();
    assert_eq!(metrics.failure_count, 1);
    assert_eq!(metrics.records_written, 1);
}

#[tokio::test]
async fn test_connection_lost_mid_statement_is_error() {
    let state = Arc::new(MockState::default());
    let mut sink = sink(&state, waiting_config()).await;

    state.drop_next.store(true, Ordering::SeqCst);
    assert_eq!(sink.flush(&hello_batch()).await, FlushOutcome::Error);
    assert_eq!(state.connects.load(Ordering::SeqCst), 1);

    // Next cycle notices the closed link and starts the reconnect.
    assert_eq!(sink.flush(&hello_batch()).await, FlushOutcome::Retry);
    settle().await;

    assert_eq!(sink.flush(&hello_batch()).await, FlushOutcome::Ok);
    assert_eq!(state.connects.load(Ordering::SeqCst), 2);

    let metrics = sink.metrics();
    assert_eq!(metrics.failure_count, 1);
    assert_eq!(metrics.retry_count, 1);
}

#[tokio::test]
async fn test_empty_batch_is_flushed_as_empty_array() {
    let state = Arc::new(MockState::default());
    let mut sink = sink(&state, waiting_config()).await;

    assert_eq!(sink.flush(&Batch::default()).await, FlushOutcome::Ok);

    let inserts = state.inserts();
    assert_eq!(inserts.len(), 1);
    assert_eq!(inserts[0].params, vec!["[]".to_string()]);
    assert_eq!(sink.metrics().records_written, 0);
}

#[tokio::test]
async fn test_pending_result_is_optimistic_ok() {
    let gate = Arc::new(Notify::new());
    let state = MockState::gated(gate.clone());
    let mut sink = sink(&state, config()).await;

    assert_eq!(sink.flush(&hello_batch()).await, FlushOutcome::Ok);
    settle().await;
    assert_eq!(sink.connection().state(), ConnectionState::Busy);
    assert_eq!(sink.metrics().deferred_count, 1);
    assert!(state.inserts().is_empty());

    gate.notify_one();
    sink.exit().await;

    assert_eq!(state.inserts().len(), 1);
    assert_eq!(sink.metrics().deferred_failures, 0);
}

#[tokio::test]
async fn test_bounded_wait_falls_back_to_deferred_ok() {
    let gate = Arc::new(Notify::new());
    let state = MockState::gated(gate.clone());
    let config = config().with_result_wait(Duration::from_millis(20));
    let mut sink = sink(&state, config).await;

    assert_eq!(sink.flush(&hello_batch()).await, FlushOutcome::Ok);
    assert_eq!(sink.metrics().deferred_count, 1);

    gate.notify_one();
    sink.exit().await;
    assert_eq!(state.inserts().len(), 1);
}

#[tokio::test]
#[traced_test]
async fn test_deferred_failure_is_counted_on_exit() {
    let gate = Arc::new(Notify::new());
    let state = MockState::gated(gate.clone());
    let mut sink = sink(&state, config()).await;

    state.fail_next.store(true, Ordering::SeqCst);
    assert_eq!(sink.flush(&hello_batch()).await, FlushOutcome::Ok);

    gate.notify_one();
    sink.exit().await;

    assert_eq!(sink.metrics().deferred_failures, 1);
    assert!(logs_contain("deferred_failures=1"));
}

#[tokio::test]
async fn test_exit_twice_is_harmless() {
    let state = Arc::new(MockState::default());
    let mut sink = sink(&state, waiting_config()).await;

    sink.flush(&hello_batch()).await;
    sink.exit().await;
    sink.exit().await;

    assert_eq!(sink.connection().state(), ConnectionState::Disconnected);
    assert_eq!(sink.flush(&hello_batch()).await, FlushOutcome::Error);
    assert_eq!(state.inserts().len(), 1);
}

#[tokio::test]
async fn test_schema_failure_aborts_init() {
    let state = Arc::new(MockState::default());
    state.fail_ddl.store(true, Ordering::SeqCst);

    let result = DatabaseSink::init(MockDriver::new(state.clone()), config()).await;

    match result {
        Err(err @ InitError::Schema { .. }) => {
            assert!(!err.is_transient());
            assert!(err.to_string().contains(r#""events""#));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("init should fail"),
    }
    assert!(state.executed().is_empty());
}

#[tokio::test]
async fn test_connect_failure_aborts_init() {
    let state = Arc::new(MockState::default());
    state.refuse_connect.store(true, Ordering::SeqCst);

    let result = DatabaseSink::init(MockDriver::new(state.clone()), config()).await;

    match result {
        Err(err @ InitError::Connect { .. }) => {
            assert!(err.is_transient());
            assert!(err.to_string().contains("db.local:5432/logs"));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("init should fail"),
    }
}

#[tokio::test]
async fn test_blank_settings_fall_back_to_defaults() {
    let state = Arc::new(MockState::default());
    let sink = sink(&state, ConnectionConfig::new("", "", "", "")).await;

    assert_eq!(sink.connection().config().host, "127.0.0.1");
    assert_eq!(sink.connection().config().database, "fluentbit");
    assert_eq!(sink.table().as_str(), r#""fluentbit""#);
}
