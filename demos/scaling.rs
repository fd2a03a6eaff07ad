//! # Example: scaling
//!
//! Shows the scaling loop reacting to queue pressure: a burst of slow
//! requests pushes the queue depth over `load_threshold`, the pool grows one
//! worker per tick up to `max_workers`, then shrinks back to `min_workers`
//! once the queue drains below 75% of the threshold.
//!
//! ## Flow
//! ```text
//! burst(60) ─► queue depth 32 (28 dropped)
//! scaler tick: load > 6  && workers < 5 ─► ScaledUp   (×3)
//! ...drain...
//! scaler tick: load < 4.5 && workers > 2 ─► ScaledDown (×3)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example scaling
//! ```

use std::sync::Arc;
use std::time::Duration;

use dynapool::{Dispatcher, HandlerRegistry, LogWriter, PoolConfig, Request, RequestType, Subscribe};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const WORK: RequestType = RequestType(1);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "dynapool=info".into()))
        .init();

    let handlers = HandlerRegistry::new().with_fn(WORK, |_n: Arc<u32>, ctx: CancellationToken| async move {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(20)) => Ok(()),
            _ = ctx.cancelled() => Ok(()),
        }
    });

    let cfg = PoolConfig {
        queue_capacity: 32,
        min_workers: 2,
        max_workers: 5,
        load_threshold: 6,
        scale_interval: Duration::from_millis(10),
        ..PoolConfig::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let pool = Dispatcher::builder(cfg)
        .with_handlers(handlers)
        .with_subscribers(subs)
        .build()?;
    pool.start()?;

    for n in 0..60 {
        pool.submit(Request::new(WORK, n).with_timeout(Duration::from_millis(100)));
    }

    for _ in 0..20 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let m = pool.metrics();
        println!(
            "[main] workers={} queued={} succeeded={} dropped={}",
            m.workers, m.queued, m.succeeded, m.dropped
        );
    }

    pool.shutdown().await?;
    println!("[main] success rate {:.2}", pool.metrics().success_rate());
    Ok(())
}
