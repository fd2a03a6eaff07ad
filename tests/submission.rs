mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{build, small_pool_config, Recorder};
use dynapool::{
    EventKind, HandlerRegistry, Outcome, PoolConfig, ReceiptError, Request, RequestType,
    SubmitError,
};
use tokio_util::sync::CancellationToken;

const ECHO: RequestType = RequestType(1);

fn echo_handlers(calls: Arc<AtomicUsize>) -> HandlerRegistry<u32> {
    HandlerRegistry::new().with_fn(ECHO, move |_n: Arc<u32>, _ctx: CancellationToken| {
        let calls = Arc::clone(&calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
}

#[tokio::test]
async fn fifteen_rapid_submissions_drop_exactly_five() {
    let recorder = Recorder::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let pool = build(small_pool_config(), echo_handlers(calls.clone()), &recorder);
    pool.start().unwrap();

    let mut receipts = Vec::new();
    for n in 0..15 {
        let (req, receipt) = Request::new(ECHO, n)
            .with_timeout(Duration::from_secs(1))
            .tracked();
        pool.submit(req);
        receipts.push(receipt);
    }
    assert_eq!(pool.metrics().dropped, 5);
    assert_eq!(pool.metrics().queued, 10);

    let mut succeeded = 0;
    let mut discarded = 0;
    for receipt in receipts {
        match receipt.outcome().await {
            Ok(Outcome::Succeeded { attempts: 1 }) => succeeded += 1,
            Err(ReceiptError::Discarded) => discarded += 1,
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert_eq!((succeeded, discarded), (10, 5));

    pool.stop(Duration::from_secs(1)).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 10);

    let drops = recorder.of(EventKind::RequestDropped);
    assert_eq!(drops.len(), 5, "each drop reported exactly once");
    assert!(drops.iter().all(|e| e.reason.as_deref() == Some("queue_full")));
    assert_eq!(recorder.count(EventKind::RequestSucceeded), 10);

    let m = pool.metrics();
    assert_eq!((m.submitted, m.dropped, m.succeeded), (15, 5, 10));
}

#[tokio::test]
async fn eight_requests_fit_without_scaling() {
    let recorder = Recorder::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let pool = build(small_pool_config(), echo_handlers(calls.clone()), &recorder);
    pool.start().unwrap();
    // Let workers and the scaler's immediate first tick run on an empty queue.
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }

    let mut receipts = Vec::new();
    for n in 0..8 {
        let (req, receipt) = Request::new(ECHO, n)
            .with_timeout(Duration::from_secs(1))
            .tracked();
        assert_eq!(pool.try_submit(req), Ok(()));
        receipts.push(receipt);
    }
    for receipt in receipts {
        assert_eq!(
            receipt.outcome().await.unwrap(),
            Outcome::Succeeded { attempts: 1 }
        );
    }
    assert_eq!(pool.worker_count(), 2);

    pool.stop(Duration::from_secs(1)).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 8);
    assert_eq!(pool.metrics().dropped, 0);
    assert_eq!(recorder.count(EventKind::ScaledUp), 0);
    assert_eq!(recorder.count(EventKind::WorkerStarted), 2);
}

#[tokio::test]
async fn try_submit_reports_full_then_closed() {
    let recorder = Recorder::new();
    let cfg = PoolConfig {
        queue_capacity: 1,
        min_workers: 0,
        max_workers: 1,
        ..PoolConfig::default()
    };
    let pool = build(cfg, echo_handlers(Arc::default()), &recorder);

    let (first, first_receipt) = Request::new(ECHO, 1).tracked();
    assert_eq!(pool.try_submit(first), Ok(()));
    assert_eq!(
        pool.try_submit(Request::new(ECHO, 2)),
        Err(SubmitError::Full { capacity: 1 })
    );

    pool.stop(Duration::from_millis(100)).await.unwrap();

    let (late, late_receipt) = Request::new(ECHO, 3).tracked();
    assert_eq!(pool.try_submit(late), Err(SubmitError::Closed));
    assert_eq!(late_receipt.outcome().await, Err(ReceiptError::Discarded));

    // Nobody ever picked the first request up.
    assert_eq!(
        first_receipt.outcome().await.unwrap(),
        Outcome::Abandoned { attempts: 0 }
    );

    let m = pool.metrics();
    assert_eq!((m.submitted, m.dropped, m.abandoned), (3, 2, 1));
}

#[tokio::test]
async fn unknown_request_type_is_unhandled() {
    let recorder = Recorder::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let pool = build(small_pool_config(), echo_handlers(calls.clone()), &recorder);
    pool.start().unwrap();

    let (req, receipt) = Request::new(RequestType(42), 0).with_max_retries(3).tracked();
    pool.submit(req);
    assert_eq!(receipt.outcome().await.unwrap(), Outcome::Unhandled);

    pool.stop(Duration::from_secs(1)).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(pool.metrics().unhandled, 1);

    let missing = recorder.of(EventKind::HandlerMissing);
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].request_type, Some(RequestType(42)));
    assert_eq!(recorder.count(EventKind::AttemptStarting), 0);
}

#[tokio::test]
async fn events_carry_increasing_sequence_numbers() {
    let recorder = Recorder::new();
    let pool = build(small_pool_config(), echo_handlers(Arc::default()), &recorder);
    pool.start().unwrap();

    let (req, receipt) = Request::new(ECHO, 7).tracked();
    pool.submit(req);
    receipt.outcome().await.unwrap();
    pool.stop(Duration::from_secs(1)).await.unwrap();

    let events = recorder.events();
    assert!(events.windows(2).all(|w| w[0].seq < w[1].seq));
    assert_eq!(
        events.last().map(|e| e.kind),
        Some(EventKind::AllStoppedWithin)
    );
}
