//! Concurrent access tests for write_atomic locking

use modreg_fs::io;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::tempdir;

#[test]
fn test_concurrent_writes_no_corruption() {
    let dir = tempdir().unwrap();
    let path = Arc::new(dir.path().join("status.json"));

    let num_threads = 8;
    let writes_per_thread = 25;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let path = Arc::clone(&path);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait();
                for i in 0..writes_per_thread {
                    let content = format!("{{\"writer\":{},\"write\":{}}}", thread_id, i);
                    io::write_text(&path, &content).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread should not panic");
    }

    // The final file is one complete write, never an interleaving.
    let content = std::fs::read_to_string(path.as_ref()).unwrap();
    assert!(content.starts_with("{\"writer\":"), "got: {}", content);
    assert!(content.ends_with('}'), "got: {}", content);
    assert_eq!(content.matches("writer").count(), 1);
}
