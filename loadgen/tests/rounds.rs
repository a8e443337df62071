//! Round pacing and join-barrier semantics, verified against a local server.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tokio_util::sync::CancellationToken;

use loadgen::{ConstantRate, LoadGenerator};

/// Spawns a server that sleeps, then counts each completed request.
async fn spawn_target(delay: Duration) -> (String, Arc<AtomicUsize>) {
    let completed = Arc::new(AtomicUsize::new(0));

    let handler = {
        let completed = Arc::clone(&completed);
        move || {
            let completed = Arc::clone(&completed);
            async move {
                tokio::time::sleep(delay).await;
                completed.fetch_add(1, Ordering::SeqCst);
                "ok"
            }
        }
    };
    let app = Router::new().route("/", get(handler));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), completed)
}

#[tokio::test]
async fn round_dispatches_exactly_rate_requests_and_awaits_them() {
    let (target, completed) = spawn_target(Duration::from_millis(50)).await;
    let generator = LoadGenerator::new(target, ConstantRate(10));

    let dispatched = generator.run_round(&CancellationToken::new()).await;

    assert_eq!(dispatched, 10);
    // The round must not return before every dispatched request finished.
    assert_eq!(completed.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn cancelled_round_stops_ticking_but_awaits_in_flight_requests() {
    let (target, completed) = spawn_target(Duration::from_millis(50)).await;
    let generator = LoadGenerator::new(target, ConstantRate(10));

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            cancel.cancel();
        }
    });

    let dispatched = generator.run_round(&cancel).await;

    assert!(dispatched >= 1, "at least the immediate tick fires");
    assert!(dispatched < 10, "cancellation must stop further ticks");
    assert_eq!(completed.load(Ordering::SeqCst), dispatched);
}

#[tokio::test]
async fn failed_dispatches_do_not_abort_the_round() {
    // Nothing listens on this port; every dispatch fails.
    let generator = LoadGenerator::new("http://127.0.0.1:9", ConstantRate(5));

    let dispatched = generator.run_round(&CancellationToken::new()).await;
    assert_eq!(dispatched, 5);
}
