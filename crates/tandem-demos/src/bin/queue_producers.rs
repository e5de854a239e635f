//! Queue Producers - ten producers released at once, one consumer draining

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tandem_stress::StressHarness;
use tandem_sync::BlockingPriorityQueue;
use tracing_subscriber::EnvFilter;

const PRODUCERS: usize = 10;
const SEQUENCE: [i32; 10] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 0];

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let queue = Arc::new(BlockingPriorityQueue::new());
    let expected = PRODUCERS * SEQUENCE.len();

    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let mut received = Vec::with_capacity(expected);
            while received.len() < expected {
                // Retry policy is ours: keep polling with short timeouts
                if let Some(value) = queue.pop(Duration::from_millis(100)) {
                    received.push(value);
                }
            }
            received
        })
    };

    let producer = Arc::clone(&queue);
    let mut harness = StressHarness::<PRODUCERS>::new(move || {
        for value in SEQUENCE {
            producer.insert(value);
        }
    })?;
    let report = harness.start_test();

    let received = consumer
        .join()
        .map_err(|_| anyhow::anyhow!("consumer thread panicked"))?;

    let mut counts = [0usize; 10];
    for value in &received {
        counts[*value as usize] += 1;
    }

    println!("Producers finished in {:?}", report.elapsed);
    println!("Received {} items", received.len());
    for (value, count) in counts.iter().enumerate() {
        println!("  {value}: {count}");
    }
    Ok(())
}
