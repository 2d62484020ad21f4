//! Fan-out behavior under load

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use modreg_exec::{Error, FanOut};
use pretty_assertions::assert_eq;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_results_in_job_order() {
    let jobs: Vec<u64> = (0..50).collect();

    let out = FanOut::new(10)
        .run(jobs, |j| async move {
            // Later jobs finish first.
            tokio::time::sleep(Duration::from_millis(50 - j)).await;
            j * 2
        })
        .await
        .unwrap();

    assert_eq!(out, (0..50).map(|j| j * 2).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_never_exceeds_workers() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let counters = (Arc::clone(&in_flight), Arc::clone(&peak));
    FanOut::new(3)
        .run((0..30).collect::<Vec<u32>>(), move |_| {
            let (in_flight, peak) = (Arc::clone(&counters.0), Arc::clone(&counters.1));
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await
        .unwrap();

    assert!(peak.load(Ordering::SeqCst) <= 3);
    assert!(peak.load(Ordering::SeqCst) >= 1);
    assert_eq!(in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blocking_jobs() {
    let out = FanOut::default()
        .run_blocking(vec!["a", "bb", "ccc"], |s: &str| s.len())
        .await
        .unwrap();

    assert_eq!(out, vec![1, 2, 3]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_panicking_job_reported() {
    let result = FanOut::default()
        .run_blocking(vec![1, 2, 3], |j: i32| {
            if j == 2 {
                panic!("job {} exploded", j);
            }
            j
        })
        .await;

    assert!(matches!(result, Err(Error::Join(_))));
}
