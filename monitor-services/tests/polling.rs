//! Aggregation and poller lifecycle tests against a local mock upstream
//!
//! Run with: cargo test -p monitor-services --test polling

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use monitor_core::{AccountIdentity, Credential, OutcomeStatus};
use monitor_grvt::GrvtClient;
use monitor_services::{Aggregator, Poller, Roster};
use rust_decimal_macros::dec;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Mock upstream: equity per sub-account id, a 500 for `broken`, a request
/// counter, and an optional per-request delay.
#[derive(Clone)]
struct Upstream {
    requests: Arc<AtomicUsize>,
    delay: Duration,
}

async fn summary(
    State(upstream): State<Upstream>,
    Path(sub): Path<String>,
) -> axum::response::Response {
    upstream.requests.fetch_add(1, Ordering::SeqCst);

    if !upstream.delay.is_zero() {
        tokio::time::sleep(upstream.delay).await;
    }

    match sub.as_str() {
        "broken" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "acc-1" => Json(json!({ "result": { "total_equity": 100, "margin_usage_ratio": 0.2 } }))
            .into_response(),
        "acc-3" => Json(json!({ "result": { "total_equity": 200, "margin_usage_ratio": 0.4 } }))
            .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn serve(delay: Duration) -> (SocketAddr, Arc<AtomicUsize>) {
    let requests = Arc::new(AtomicUsize::new(0));
    let upstream = Upstream {
        requests: Arc::clone(&requests),
        delay,
    };
    let app = Router::new()
        .route("/v1/accounts/{sub}/summary", get(summary))
        .with_state(upstream);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock upstream");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, requests)
}

fn account(label: &str, sub_id: &str) -> AccountIdentity {
    AccountIdentity::new(label, Credential::new("key", "secret", sub_id))
}

fn three_account_roster() -> Roster {
    Roster::new(vec![
        account("alpha", "acc-1"),
        account("beta", "broken"),
        account("gamma", "acc-3"),
    ])
}

fn aggregator_for(addr: SocketAddr) -> Aggregator {
    Aggregator::new(GrvtClient::with_base_url(
        format!("http://{}", addr),
        Duration::from_secs(2),
    ))
}

#[tokio::test]
async fn test_aggregate_isolates_failures_and_preserves_roster_order() {
    let (addr, _) = serve(Duration::ZERO).await;
    let snapshot = aggregator_for(addr).aggregate(&three_account_roster()).await;

    // One row per roster slot, in roster order, failures included
    assert_eq!(snapshot.account_count, 3);
    let labels: Vec<&str> = snapshot
        .accounts
        .iter()
        .map(|row| row.identity.label.as_str())
        .collect();
    assert_eq!(labels, ["alpha", "beta", "gamma"]);

    assert_eq!(snapshot.accounts[0].record.status, OutcomeStatus::Connected);
    assert_eq!(snapshot.accounts[1].record.status, OutcomeStatus::ServerError(500));
    assert_eq!(snapshot.accounts[2].record.status, OutcomeStatus::Connected);

    // The failed row contributes zero to the total, not null
    assert_eq!(snapshot.total_equity, dec!(300));
    assert_eq!(snapshot.accounts[1].record.equity, dec!(0));

    // Mean over all rows, the failed one counted at zero: (20 + 0 + 40) / 3
    assert_eq!(snapshot.average_margin_ratio_percent, dec!(20));
}

#[tokio::test]
async fn test_aggregate_empty_roster_is_not_an_error() {
    let (addr, requests) = serve(Duration::ZERO).await;
    let snapshot = aggregator_for(addr).aggregate(&Roster::default()).await;

    assert!(snapshot.accounts.is_empty());
    assert_eq!(snapshot.account_count, 0);
    assert_eq!(snapshot.total_equity, dec!(0));
    assert_eq!(requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_aggregate_is_idempotent_between_upstream_changes() {
    let (addr, _) = serve(Duration::ZERO).await;
    let aggregator = aggregator_for(addr);
    let roster = three_account_roster();

    let first = aggregator.aggregate(&roster).await;
    let second = aggregator.aggregate(&roster).await;

    for (a, b) in first.accounts.iter().zip(second.accounts.iter()) {
        assert_eq!(a.record.status, b.record.status);
        assert_eq!(a.record.equity, b.record.equity);
        assert_eq!(a.record.margin_ratio_percent, b.record.margin_ratio_percent);
    }
    assert_eq!(first.total_equity, second.total_equity);
}

#[tokio::test]
async fn test_poller_publishes_on_start_and_on_trigger() {
    let (addr, _) = serve(Duration::ZERO).await;
    // Interval long enough that only the immediate first tick and the manual
    // trigger produce cycles within this test.
    let mut poller = Poller::new(aggregator_for(addr), three_account_roster(), Duration::from_secs(60));

    assert!(poller.latest().is_none());
    let mut rx = poller.subscribe();

    poller.start();
    assert!(poller.is_running());

    rx.changed().await.unwrap();
    let first = rx.borrow_and_update().clone().unwrap();
    assert_eq!(first.total_equity, dec!(300));

    poller.trigger();
    rx.changed().await.unwrap();
    let second = rx.borrow_and_update().clone().unwrap();
    assert_eq!(second.total_equity, dec!(300));
    assert!(second.generated_at >= first.generated_at);

    poller.stop().await;
}

#[tokio::test]
async fn test_poller_stop_prevents_further_cycles() {
    let (addr, requests) = serve(Duration::ZERO).await;
    let mut poller = Poller::new(
        aggregator_for(addr),
        three_account_roster(),
        Duration::from_millis(50),
    );
    let mut rx = poller.subscribe();

    poller.start();
    rx.changed().await.unwrap();

    poller.stop().await;
    assert!(!poller.is_running());

    let after_stop = requests.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(requests.load(Ordering::SeqCst), after_stop);

    // Triggering while idle is a no-op
    poller.trigger();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(requests.load(Ordering::SeqCst), after_stop);
}

/// A stop request wins the race against an already-due tick: stopping right
/// after start, before the poll task has run, must not let the immediate
/// first tick schedule a cycle.
#[tokio::test]
async fn test_stop_beats_pending_tick_no_extra_cycle() {
    let (addr, requests) = serve(Duration::ZERO).await;
    let mut poller = Poller::new(
        aggregator_for(addr),
        three_account_roster(),
        Duration::from_millis(1),
    );

    poller.start();
    poller.stop().await;

    assert_eq!(requests.load(Ordering::SeqCst), 0);
    assert!(poller.latest().is_none());
}

#[tokio::test]
async fn test_rapid_triggers_coalesce_into_bounded_cycles() {
    // Every request takes 200ms, so a cycle is comfortably in flight while
    // the triggers below arrive.
    let (addr, requests) = serve(Duration::from_millis(200)).await;
    let roster = Roster::new(vec![account("alpha", "acc-1")]);
    let mut poller = Poller::new(aggregator_for(addr), roster, Duration::from_secs(60));
    let mut rx = poller.subscribe();

    poller.start();

    // Fire a burst while the first cycle is still running.
    for _ in 0..5 {
        poller.trigger();
    }

    rx.changed().await.unwrap();
    tokio::time::sleep(Duration::from_millis(800)).await;
    poller.stop().await;

    // At most: the start cycle plus one queued rerun from the whole burst.
    let total = requests.load(Ordering::SeqCst);
    assert!(total >= 1, "expected at least the start cycle, saw {}", total);
    assert!(total <= 2, "burst of triggers must coalesce, saw {} cycles", total);
}

#[tokio::test]
async fn test_poller_restart_after_stop() {
    let (addr, _) = serve(Duration::ZERO).await;
    let mut poller = Poller::new(
        aggregator_for(addr),
        Roster::new(vec![account("alpha", "acc-1")]),
        Duration::from_secs(60),
    );

    poller.start();
    let mut rx = poller.subscribe();
    rx.changed().await.unwrap();
    poller.stop().await;

    poller.start();
    assert!(poller.is_running());
    poller.trigger();
    rx.changed().await.unwrap();
    let snapshot = rx.borrow_and_update().clone().unwrap();
    assert_eq!(snapshot.total_equity, dec!(100));

    poller.stop().await;
}
