#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dynapool::{Dispatcher, Event, EventKind, HandlerRegistry, PoolConfig, Subscribe};

/// Subscriber that keeps every event it sees.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn of(&self, kind: EventKind) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.of(kind).len()
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }

    fn queue_capacity(&self) -> usize {
        16 * 1024
    }
}

/// Pool from the reference scenario: capacity 10, 2..=5 workers, threshold 6.
pub fn small_pool_config() -> PoolConfig {
    PoolConfig {
        queue_capacity: 10,
        min_workers: 2,
        max_workers: 5,
        load_threshold: 6,
        ..PoolConfig::default()
    }
}

pub fn build<P>(
    cfg: PoolConfig,
    handlers: HandlerRegistry<P>,
    recorder: &Arc<Recorder>,
) -> Arc<Dispatcher<P>>
where
    P: Send + Sync + 'static,
{
    Dispatcher::builder(cfg)
        .with_handlers(handlers)
        .with_subscribers(vec![recorder.clone() as Arc<dyn Subscribe>])
        .build()
        .expect("valid config")
}

/// Polls `cond` every millisecond until it holds or `limit` passes.
pub async fn wait_until(limit: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    cond()
}
