mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{build, wait_until, Recorder};
use dynapool::{
    EventKind, HandlerError, HandlerRegistry, Outcome, PoolConfig, ReceiptError, Request,
    RequestType, RuntimeError, SubmitError,
};
use tokio_util::sync::CancellationToken;

const SLOW: RequestType = RequestType(5);

fn single_worker() -> PoolConfig {
    PoolConfig {
        queue_capacity: 32,
        min_workers: 1,
        max_workers: 1,
        ..PoolConfig::default()
    }
}

/// Handler that sleeps `ms` without looking at its token.
fn stubborn(ms: u64, started: Arc<AtomicU32>) -> HandlerRegistry<()> {
    HandlerRegistry::new().with_fn(SLOW, move |_p: Arc<()>, _ctx: CancellationToken| {
        started.fetch_add(1, Ordering::SeqCst);
        async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(())
        }
    })
}

#[tokio::test]
async fn stop_drains_queued_requests_before_returning() {
    let recorder = Recorder::new();
    let started = Arc::new(AtomicU32::new(0));
    let pool = build(single_worker(), stubborn(2, started.clone()), &recorder);
    pool.start().unwrap();

    let mut receipts = Vec::new();
    for _ in 0..5 {
        let (req, receipt) = Request::new(SLOW, ())
            .with_timeout(Duration::from_secs(1))
            .tracked();
        pool.submit(req);
        receipts.push(receipt);
    }

    pool.stop(Duration::from_secs(2)).await.unwrap();
    for receipt in receipts {
        assert_eq!(
            receipt.outcome().await.unwrap(),
            Outcome::Succeeded { attempts: 1 }
        );
    }
    assert_eq!(started.load(Ordering::SeqCst), 5);

    assert_eq!(recorder.count(EventKind::ShutdownRequested), 1);
    assert_eq!(recorder.count(EventKind::AllStoppedWithin), 1);
    assert_eq!(recorder.count(EventKind::GraceExceeded), 0);
    let stopped = recorder.of(EventKind::WorkerStopped);
    assert_eq!(stopped.len(), 1);
    assert_eq!(stopped[0].reason.as_deref(), Some("queue_closed"));
    assert!(pool.live_workers().is_empty());
}

#[tokio::test]
async fn submit_after_stop_never_reaches_a_worker() {
    let recorder = Recorder::new();
    let started = Arc::new(AtomicU32::new(0));
    let pool = build(single_worker(), stubborn(1, started.clone()), &recorder);
    pool.start().unwrap();
    pool.stop(Duration::from_secs(1)).await.unwrap();
    assert!(pool.is_closed());

    let (req, receipt) = Request::new(SLOW, ()).tracked();
    assert_eq!(pool.try_submit(req), Err(SubmitError::Closed));
    pool.submit(Request::new(SLOW, ()));

    assert_eq!(receipt.outcome().await, Err(ReceiptError::Discarded));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(started.load(Ordering::SeqCst), 0);
    assert_eq!(pool.metrics().dropped, 2);
}

#[tokio::test]
async fn grace_exceeded_reports_stuck_workers() {
    let recorder = Recorder::new();
    let started = Arc::new(AtomicU32::new(0));
    let pool = build(single_worker(), stubborn(200, started.clone()), &recorder);
    pool.start().unwrap();
    let ids = pool.live_workers();
    assert_eq!(ids.len(), 1);

    let (req, receipt) = Request::new(SLOW, ())
        .with_timeout(Duration::from_secs(2))
        .tracked();
    pool.submit(req);
    assert!(wait_until(Duration::from_secs(1), || started.load(Ordering::SeqCst) == 1).await);

    let begun = Instant::now();
    let err = pool.stop(Duration::from_millis(20)).await.unwrap_err();
    match &err {
        RuntimeError::GraceExceeded { grace, stuck } => {
            assert_eq!(*grace, Duration::from_millis(20));
            assert_eq!(stuck, &ids);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(err.as_label(), "runtime_grace_exceeded");
    // The in-flight attempt is not preempted; stop waits for it.
    assert!(begun.elapsed() < Duration::from_secs(2));

    assert_eq!(
        receipt.outcome().await.unwrap(),
        Outcome::Succeeded { attempts: 1 }
    );
    assert_eq!(recorder.count(EventKind::GraceExceeded), 1);
    assert_eq!(recorder.count(EventKind::AllStoppedWithin), 0);
    let stopped = recorder.of(EventKind::WorkerStopped);
    assert_eq!(stopped[0].reason.as_deref(), Some("forced"));
}

#[tokio::test]
async fn forced_stop_abandons_remaining_retries() {
    let recorder = Recorder::new();
    let started = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&started);
    // Fails every attempt, but only once its token is cancelled.
    let handlers = HandlerRegistry::new().with_fn(SLOW, move |_p: Arc<()>, ctx: CancellationToken| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move {
            ctx.cancelled().await;
            Err(HandlerError::fail("interrupted"))
        }
    });
    let pool = build(single_worker(), handlers, &recorder);
    pool.start().unwrap();

    let (req, receipt) = Request::new(SLOW, ())
        .with_timeout(Duration::from_secs(5))
        .with_max_retries(3)
        .tracked();
    pool.submit(req);
    assert!(wait_until(Duration::from_secs(1), || started.load(Ordering::SeqCst) == 1).await);

    let err = pool.stop(Duration::from_millis(10)).await.unwrap_err();
    assert!(matches!(err, RuntimeError::GraceExceeded { .. }));

    assert_eq!(
        receipt.outcome().await.unwrap(),
        Outcome::Abandoned { attempts: 1 }
    );
    assert_eq!(started.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.count(EventKind::RequestAbandoned), 1);
    assert_eq!(pool.metrics().abandoned, 1);
}

#[tokio::test]
async fn stop_is_idempotent() {
    let recorder = Recorder::new();
    let pool = build(single_worker(), stubborn(1, Arc::default()), &recorder);
    pool.start().unwrap();

    pool.stop(Duration::from_secs(1)).await.unwrap();
    pool.stop(Duration::from_secs(1)).await.unwrap();
    pool.shutdown().await.unwrap();
    assert_eq!(recorder.count(EventKind::ShutdownRequested), 1);
}

#[tokio::test]
async fn racing_stop_calls_share_the_outcome() {
    let recorder = Recorder::new();
    let started = Arc::new(AtomicU32::new(0));
    let pool = build(single_worker(), stubborn(100, started.clone()), &recorder);
    pool.start().unwrap();
    let ids = pool.live_workers();

    pool.submit(Request::new(SLOW, ()).with_timeout(Duration::from_secs(2)));
    assert!(wait_until(Duration::from_secs(1), || started.load(Ordering::SeqCst) == 1).await);

    let (first, second) = tokio::join!(
        pool.stop(Duration::from_millis(10)),
        pool.stop(Duration::from_secs(5)),
    );
    for res in [first, second] {
        match res {
            Err(RuntimeError::GraceExceeded { grace, stuck }) => {
                assert_eq!(grace, Duration::from_millis(10));
                assert_eq!(stuck, ids);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
    assert!(matches!(
        pool.shutdown().await,
        Err(RuntimeError::GraceExceeded { .. })
    ));
    assert_eq!(recorder.count(EventKind::ShutdownRequested), 1);
    assert_eq!(recorder.count(EventKind::GraceExceeded), 1);
}

#[tokio::test]
async fn scaler_stops_with_the_pool() {
    let recorder = Recorder::new();
    let cfg = PoolConfig {
        min_workers: 0,
        max_workers: 3,
        load_threshold: 0,
        scale_interval: Duration::from_millis(1),
        ..single_worker()
    };
    let pool = build(cfg, stubborn(1, Arc::default()), &recorder);
    pool.start().unwrap();
    pool.stop(Duration::from_secs(1)).await.unwrap();

    pool.submit(Request::new(SLOW, ()));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(pool.worker_count(), 0);
    assert!(pool.live_workers().is_empty());
}

#[tokio::test]
async fn invalid_config_is_rejected_at_build() {
    let cfg = PoolConfig {
        min_workers: 3,
        max_workers: 1,
        ..PoolConfig::default()
    };
    let err = dynapool::Dispatcher::<()>::builder(cfg).build().err().unwrap();
    assert!(matches!(err, RuntimeError::InvalidConfig { .. }));
}
