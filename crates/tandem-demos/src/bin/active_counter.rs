//! Active Counter - how many action iterations fit in one second?

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use tandem_sync::{Action, ActiveObject, LoopControl, WorkerConfig};
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct Counter {
    count: AtomicU64,
}

impl Action for Counter {
    fn action(&self, _control: &LoopControl) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let counter = ActiveObject::with_config(Counter::default(), WorkerConfig::new("counter"));

    println!("How many increments can the worker do in 1s?");
    counter.start()?;
    thread::sleep(Duration::from_secs(1));
    counter.stop();

    println!("Answer: {}", counter.action().count.load(Ordering::Relaxed));
    Ok(())
}
