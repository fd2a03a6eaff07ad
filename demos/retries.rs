//! # Example: retries
//!
//! Demonstrates per-attempt timeouts and the retry budget:
//! - a flaky handler that fails twice, then succeeds on attempt 3;
//! - a slow handler submitted with `Duration::ZERO`, which falls back to the
//!   10ms default timeout and exhausts its budget;
//! - a handler returning a fatal error, which is never retried.
//!
//! ## Flow
//! ```text
//! FLAKY: attempt 1 ─► Fail ─► attempt 2 ─► Fail ─► attempt 3 ─► Ok   → Succeeded { attempts: 3 }
//! SLOW:  attempt 1 ─► 10ms timeout ─► attempt 2 ─► 10ms timeout      → Exhausted { attempts: 2 }
//! FATAL: attempt 1 ─► Fatal                                          → Rejected  { attempts: 1 }
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=dynapool=debug cargo run --example retries
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dynapool::{
    Dispatcher, HandlerError, HandlerRegistry, LogWriter, PoolConfig, Request, RequestType,
    Subscribe,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const FLAKY: RequestType = RequestType(1);
const SLOW: RequestType = RequestType(2);
const FATAL: RequestType = RequestType(3);

static FLAKY_CALLS: AtomicU32 = AtomicU32::new(0);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "dynapool=info".into()))
        .init();

    let handlers = HandlerRegistry::new()
        .with_fn(FLAKY, |_: Arc<()>, _ctx: CancellationToken| async {
            let n = FLAKY_CALLS.fetch_add(1, Ordering::Relaxed) + 1;
            if n <= 2 {
                Err(HandlerError::fail(format!("boom #{n}")))
            } else {
                Ok(())
            }
        })
        .with_fn(SLOW, |_: Arc<()>, ctx: CancellationToken| async move {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(1)) => Ok(()),
                _ = ctx.cancelled() => Err(HandlerError::fail("cancelled")),
            }
        })
        .with_fn(FATAL, |_: Arc<()>, _ctx: CancellationToken| async {
            Err(HandlerError::fatal("malformed payload"))
        });

    let cfg = PoolConfig {
        min_workers: 3,
        max_workers: 3,
        ..PoolConfig::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let pool = Dispatcher::builder(cfg)
        .with_handlers(handlers)
        .with_subscribers(subs)
        .build()?;
    pool.start()?;

    let (flaky, flaky_rx) = Request::new(FLAKY, ()).with_max_retries(3).tracked();
    let (slow, slow_rx) = Request::new(SLOW, ()).with_max_retries(1).tracked();
    let (fatal, fatal_rx) = Request::new(FATAL, ()).with_max_retries(5).tracked();
    pool.submit(flaky);
    pool.submit(slow);
    pool.submit(fatal);

    println!("[main] flaky: {:?}", flaky_rx.outcome().await?);
    println!("[main] slow:  {:?}", slow_rx.outcome().await?);
    println!("[main] fatal: {:?}", fatal_rx.outcome().await?);

    pool.stop(Duration::from_secs(1)).await?;
    println!("[main] metrics: {:?}", pool.metrics());
    Ok(())
}
