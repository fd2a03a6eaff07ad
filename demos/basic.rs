//! # Example: basic
//!
//! Minimal pool: two request types, fire-and-forget submission, one tracked
//! request awaited through its receipt, then a graceful stop.
//!
//! ## Flow
//! ```text
//! Dispatcher::builder(cfg)
//!   ├─► with_handlers(GREET → greet, SUM → sum)
//!   ├─► with_subscribers([LogWriter])
//!   └─► build() → start()        (min_workers + scaler)
//!
//! submit(GREET × 3) ─► queue ─► workers ─► RequestSucceeded
//! submit(SUM).tracked() ─► Receipt::outcome() ─► Succeeded { attempts: 1 }
//! stop(1s) ─► ShutdownRequested ─► drain ─► AllStoppedWithin
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=dynapool=debug cargo run --example basic
//! ```

use std::sync::Arc;
use std::time::Duration;

use dynapool::{
    Dispatcher, HandlerError, HandlerRegistry, LogWriter, PoolConfig, Request, RequestType,
    Subscribe,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const GREET: RequestType = RequestType(1);
const SUM: RequestType = RequestType(2);

#[derive(Debug)]
enum Job {
    Greet(String),
    Sum(Vec<i64>),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "dynapool=info".into()))
        .init();

    // 1. Handlers per request type
    let handlers = HandlerRegistry::new()
        .with_fn(GREET, |job: Arc<Job>, _ctx: CancellationToken| async move {
            match job.as_ref() {
                Job::Greet(name) => {
                    println!("[greet] hello, {name}");
                    Ok(())
                }
                other => Err(HandlerError::fatal(format!("greet got {other:?}"))),
            }
        })
        .with_fn(SUM, |job: Arc<Job>, _ctx: CancellationToken| async move {
            match job.as_ref() {
                Job::Sum(xs) => {
                    println!("[sum] {}", xs.iter().sum::<i64>());
                    Ok(())
                }
                other => Err(HandlerError::fatal(format!("sum got {other:?}"))),
            }
        });

    // 2. Pool with the tracing-backed subscriber
    let cfg = PoolConfig {
        queue_capacity: 16,
        min_workers: 2,
        max_workers: 4,
        load_threshold: 8,
        ..PoolConfig::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let pool = Dispatcher::builder(cfg)
        .with_handlers(handlers)
        .with_subscribers(subs)
        .build()?;
    pool.start()?;

    // 3. Fire-and-forget
    for name in ["ada", "grace", "linus"] {
        pool.submit(Request::new(GREET, Job::Greet(name.to_string())));
    }

    // 4. Tracked request
    let (req, receipt) = Request::new(SUM, Job::Sum(vec![1, 2, 3, 4]))
        .with_timeout(Duration::from_millis(50))
        .tracked();
    pool.submit(req);
    println!("[main] sum outcome: {:?}", receipt.outcome().await?);

    // 5. Graceful stop
    pool.stop(Duration::from_secs(1)).await?;
    println!("[main] metrics: {:?}", pool.metrics());
    Ok(())
}
