//! Stress Increment - 100 threads bump a mutex-protected counter at once

use std::sync::Arc;

use parking_lot::Mutex;
use tandem_stress::StressHarness;
use tracing_subscriber::EnvFilter;

const THREADS: usize = 100;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let counter = Arc::new(Mutex::new(0usize));
    let shared = Arc::clone(&counter);
    let mut tester = StressHarness::<THREADS>::new(move || *shared.lock() += 1)?;

    println!("Tester is usable?: {}", tester.is_usable());
    let report = tester.start_test();
    println!("Test started!");
    println!("Tester is usable?: {}", tester.is_usable());

    let value = *counter.lock();
    println!("Counter after test: {value} (expected {THREADS}) in {:?}", report.elapsed);

    if value == THREADS && report.is_clean() {
        println!("Test passed!");
    } else {
        println!("Data race detected!");
    }
    Ok(())
}
