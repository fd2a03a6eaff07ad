mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{build, wait_until, Recorder};
use dynapool::{
    EventKind, HandlerRegistry, PoolConfig, Request, RequestType, RuntimeError, ScaleDecision,
};
use tokio_util::sync::CancellationToken;

const WORK: RequestType = RequestType(3);

fn sleeping_handlers(ms: u64) -> HandlerRegistry<u32> {
    HandlerRegistry::new().with_fn(WORK, move |_n: Arc<u32>, _ctx: CancellationToken| async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(())
    })
}

#[tokio::test]
async fn scale_once_grows_one_worker_per_tick_up_to_max() {
    let recorder = Recorder::new();
    let cfg = PoolConfig {
        queue_capacity: 10,
        min_workers: 1,
        max_workers: 3,
        load_threshold: 2,
        ..PoolConfig::default()
    };
    let policy = cfg.scale_policy();
    let pool = build(cfg, sleeping_handlers(1), &recorder);
    pool.add_worker().unwrap();

    for n in 0..5 {
        pool.submit(Request::new(WORK, n));
    }
    assert_eq!(pool.load(), 5);

    assert_eq!(pool.scale_once(&policy), ScaleDecision::Grow);
    assert_eq!(pool.worker_count(), 2);
    assert_eq!(pool.scale_once(&policy), ScaleDecision::Grow);
    assert_eq!(pool.worker_count(), 3);
    assert_eq!(pool.scale_once(&policy), ScaleDecision::Hold, "already at max");
    assert_eq!(pool.worker_count(), 3);

    pool.stop(Duration::from_secs(1)).await.unwrap();
    let ups = recorder.of(EventKind::ScaledUp);
    assert_eq!(ups.len(), 2);
    assert!(ups.iter().all(|e| e.load == Some(5)));
    assert_eq!(pool.metrics().succeeded, 5);
}

#[tokio::test]
async fn scale_once_shrinks_idle_pool_down_to_min() {
    let recorder = Recorder::new();
    let cfg = PoolConfig {
        min_workers: 1,
        max_workers: 4,
        load_threshold: 4,
        ..PoolConfig::default()
    };
    let policy = cfg.scale_policy();
    let pool = build(cfg, sleeping_handlers(1), &recorder);
    for _ in 0..3 {
        pool.add_worker().unwrap();
    }

    assert_eq!(pool.scale_once(&policy), ScaleDecision::Shrink);
    assert_eq!(pool.worker_count(), 2);
    assert_eq!(pool.scale_once(&policy), ScaleDecision::Shrink);
    assert_eq!(pool.worker_count(), 1);
    assert_eq!(pool.scale_once(&policy), ScaleDecision::Hold, "at min");

    assert!(
        wait_until(Duration::from_secs(1), || pool.live_workers().len() == 1).await,
        "two workers should consume the stop signals"
    );

    pool.stop(Duration::from_secs(1)).await.unwrap();
    assert_eq!(recorder.count(EventKind::ScaledDown), 2);
    let by_signal = recorder
        .of(EventKind::WorkerStopped)
        .into_iter()
        .filter(|e| e.reason.as_deref() == Some("stop_signal"))
        .count();
    assert_eq!(by_signal, 2);
}

#[tokio::test]
async fn add_worker_refuses_past_max() {
    let recorder = Recorder::new();
    let cfg = PoolConfig {
        min_workers: 0,
        max_workers: 2,
        ..PoolConfig::default()
    };
    let pool = build(cfg, sleeping_handlers(1), &recorder);

    let a = pool.add_worker().unwrap();
    let b = pool.add_worker().unwrap();
    assert!(b > a, "worker ids are monotonic");
    assert!(matches!(
        pool.add_worker(),
        Err(RuntimeError::AtCapacity { max: 2 })
    ));
    assert_eq!(pool.worker_count(), 2);

    pool.stop(Duration::from_secs(1)).await.unwrap();
    assert!(matches!(pool.add_worker(), Err(RuntimeError::Closed)));
}

#[tokio::test]
async fn remove_worker_is_a_noop_at_min() {
    let recorder = Recorder::new();
    let cfg = PoolConfig {
        min_workers: 2,
        max_workers: 4,
        ..PoolConfig::default()
    };
    let pool = build(cfg, sleeping_handlers(1), &recorder);
    pool.start().unwrap();
    assert_eq!(pool.worker_count(), 2);

    assert!(!pool.remove_worker(2));
    assert_eq!(pool.worker_count(), 2);
    assert!(pool.remove_worker(1));
    assert_eq!(pool.worker_count(), 1);
    assert!(!pool.remove_worker(1));

    pool.stop(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn worker_count_stays_within_bounds_under_load() {
    let recorder = Recorder::new();
    let cfg = PoolConfig {
        queue_capacity: 64,
        min_workers: 1,
        max_workers: 4,
        load_threshold: 4,
        scale_interval: Duration::from_millis(2),
        ..PoolConfig::default()
    };
    let pool = build(cfg, sleeping_handlers(3), &recorder);
    pool.start().unwrap();

    let stop_sampling = Arc::new(AtomicBool::new(false));
    let sampler = {
        let pool = Arc::clone(&pool);
        let stop = Arc::clone(&stop_sampling);
        tokio::spawn(async move {
            let mut seen = Vec::new();
            while !stop.load(Ordering::SeqCst) {
                seen.push(pool.worker_count());
                tokio::time::sleep(Duration::from_micros(500)).await;
            }
            seen
        })
    };

    for n in 0..200u32 {
        pool.submit(Request::new(WORK, n).with_timeout(Duration::from_secs(1)));
        if n % 20 == 0 {
            tokio::task::yield_now().await;
        }
    }

    assert!(
        wait_until(Duration::from_secs(5), || {
            let m = pool.metrics();
            m.completed() + m.dropped == 200
        })
        .await,
        "every request is either processed or dropped"
    );
    assert!(
        wait_until(Duration::from_secs(2), || pool.worker_count() == 1).await,
        "idle pool shrinks back to min"
    );

    stop_sampling.store(true, Ordering::SeqCst);
    let seen = sampler.await.unwrap();
    assert!(seen.iter().all(|&w| (1..=4).contains(&w)), "{seen:?}");
    assert!(pool.live_workers().len() <= 4);

    pool.stop(Duration::from_secs(2)).await.unwrap();
    assert!(recorder.count(EventKind::ScaledUp) >= 1);
    assert_eq!(pool.metrics().succeeded + pool.metrics().dropped, 200);
}
