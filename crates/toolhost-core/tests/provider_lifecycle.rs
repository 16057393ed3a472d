//! Connection and registry behaviour against in-process fake servers

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map, Value};
use toolhost_core::config::{ServerConfig, TransportConfig};
use toolhost_core::logging::NoOpLogger;
use toolhost_core::tools::fake::{FakeServer, FakeTransportFactory};
use toolhost_core::tools::{ConnectionState, ProviderConnection, ProviderRegistry, RetryPolicy, ToolError};
use toolhost_core::ToolOutput;

fn config(name: &str) -> ServerConfig {
    ServerConfig::new(name, TransportConfig::stdio("fake-server", Vec::<String>::new()))
}

fn connection(name: &str, server: FakeServer) -> ProviderConnection {
    let factory = FakeTransportFactory::new().with_server(name, server);
    ProviderConnection::new(config(name), Arc::new(factory), Arc::new(NoOpLogger::new()))
}

fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[tokio::test(start_paused = true)]
async fn concurrent_first_listings_share_one_request() {
    let server = FakeServer::with_tool_names(&["a", "b"]).with_list_delay(Duration::from_millis(50));
    let stats = server.stats();
    let conn = connection("slow", server);
    conn.initialize().await.unwrap();

    let (first, second, third) = tokio::join!(conn.list_tools(), conn.list_tools(), conn.list_tools());
    let first = first.unwrap();
    assert!(Arc::ptr_eq(&first, &second.unwrap()));
    assert!(Arc::ptr_eq(&first, &third.unwrap()));
    assert_eq!(stats.list_calls(), 1);

    // Later callers hit the cache
    assert_eq!(conn.list_tools().await.unwrap().len(), 2);
    assert_eq!(stats.list_calls(), 1);

    conn.cleanup().await;
}

#[tokio::test(start_paused = true)]
async fn failing_tool_is_attempted_max_retries_plus_one_times() {
    for (max_retries, expected) in [(2u32, 3u32), (1, 2)] {
        let server = FakeServer::echo().failing_calls(u32::MAX);
        let stats = server.stats();
        let conn = connection("echo", server)
            .with_retry_policy(RetryPolicy::new(max_retries, Duration::from_secs(1)));
        conn.initialize().await.unwrap();

        let started = tokio::time::Instant::now();
        let err = conn
            .execute_tool("echo", args(json!({ "message": "hi" })))
            .await
            .unwrap_err();

        match err {
            ToolError::Execution { tool, attempts, .. } => {
                assert_eq!(tool, "echo");
                assert_eq!(attempts, expected);
            }
            other => panic!("expected Execution, got {other:?}"),
        }
        assert_eq!(stats.call_calls() as u32, expected);
        // One delay between consecutive attempts
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(u64::from(expected - 1)));
        assert!(waited < Duration::from_secs(u64::from(expected)));

        conn.cleanup().await;
    }
}

#[tokio::test(start_paused = true)]
async fn transient_failure_recovers_within_budget() {
    let server = FakeServer::echo().failing_calls(2);
    let stats = server.stats();
    let conn = connection("echo", server);
    conn.initialize().await.unwrap();

    let output = conn
        .execute_tool("echo", args(json!({ "message": "again" })))
        .await
        .unwrap();
    assert_eq!(output.to_text(), "Echo: again");
    assert_eq!(stats.call_calls(), 3);

    conn.cleanup().await;
}

#[tokio::test]
async fn tool_error_results_are_returned_not_retried() {
    let server = FakeServer::with_tool_names(&["flaky"])
        .with_handler(|_, _| Ok(ToolOutput::from_parts(vec!["upstream said no".to_string()], true, None)));
    let stats = server.stats();
    let conn = connection("flaky", server);
    conn.initialize().await.unwrap();

    let output = conn.execute_tool("flaky", Map::new()).await.unwrap();
    assert!(output.is_error);
    assert_eq!(stats.call_calls(), 1);

    conn.cleanup().await;
}

#[tokio::test]
async fn cleanup_is_idempotent() {
    let server = FakeServer::echo();
    let stats = server.stats();
    let conn = connection("echo", server);
    conn.initialize().await.unwrap();

    conn.cleanup().await;
    conn.cleanup().await;

    assert_eq!(conn.state(), ConnectionState::Closed);
    assert_eq!(stats.closes(), 1);
    assert!(matches!(conn.list_tools().await, Err(ToolError::NotInitialized(_))));
}

#[tokio::test]
async fn cleanup_after_failed_initialize() {
    let server = FakeServer::echo().failing_connect();
    let stats = server.stats();
    let conn = connection("down", server);

    let err = conn.initialize().await.unwrap_err();
    assert!(matches!(err, ToolError::Connection { ref server, .. } if server == "down"));
    assert_eq!(conn.state(), ConnectionState::Closed);

    conn.cleanup().await;
    assert_eq!(conn.state(), ConnectionState::Closed);
    assert_eq!(stats.connects(), 1);
    assert_eq!(stats.closes(), 0);
}

#[tokio::test]
async fn first_registered_provider_wins() {
    let first = FakeServer::with_tool_names(&["shared", "only_first"]);
    let second = FakeServer::with_tool_names(&["shared", "only_second"]);
    let factory = FakeTransportFactory::new()
        .with_server("first", first)
        .with_server("second", second);
    let registry = ProviderRegistry::from_configs(
        vec![config("first"), config("second")],
        Arc::new(factory),
        Arc::new(NoOpLogger::new()),
    );
    registry.initialize_all().await.unwrap();

    assert_eq!(registry.find_provider_for("shared").await.unwrap().name(), "first");
    assert_eq!(registry.find_provider_for("only_second").await.unwrap().name(), "second");
    assert!(registry.find_provider_for("missing").await.is_none());
    assert_eq!(registry.tool_count().await, 4);

    registry.cleanup_all().await;
}

#[tokio::test]
async fn failed_startup_stops_and_cleans_up_earlier_providers() {
    let p1 = FakeServer::with_tool_names(&["one"]);
    let p3 = FakeServer::with_tool_names(&["three"]);
    let (p1_stats, p3_stats) = (p1.stats(), p3.stats());
    let factory = Arc::new(
        FakeTransportFactory::new()
            .with_server("p1", p1)
            .with_server("p2", FakeServer::echo().failing_connect())
            .with_server("p3", p3),
    );
    let registry = ProviderRegistry::from_configs(
        vec![config("p1"), config("p2"), config("p3")],
        factory.clone(),
        Arc::new(NoOpLogger::new()),
    );

    let err = registry.initialize_all().await.unwrap_err();
    assert!(matches!(err, ToolError::Connection { ref server, .. } if server == "p2"));
    assert_eq!(factory.connect_log(), vec!["p1".to_string(), "p2".to_string()]);
    assert_eq!(p1_stats.closes(), 1);
    assert_eq!(p3_stats.connects(), 0);
    assert_eq!(registry.providers()[0].state(), ConnectionState::Closed);
    assert_eq!(registry.providers()[2].state(), ConnectionState::Unconnected);
}
