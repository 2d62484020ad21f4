//! Bounded fan-out over a job list.
//!
//! Every job is queued up front; at most `min(max_workers, jobs)` run at a
//! time. Jobs compute outside any lock and take the collector lock only to
//! store their result.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{Error, Result};

pub const DEFAULT_MAX_WORKERS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanOut {
    max_workers: usize,
}

impl Default for FanOut {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORKERS)
    }
}

impl FanOut {
    /// A pool of at most `max_workers` concurrent jobs (at least one).
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Worker count for a batch of `jobs`.
    pub fn workers_for(&self, jobs: usize) -> usize {
        self.max_workers.min(jobs)
    }

    /// Run an async job function over every job. Results come back in job
    /// order; completion order is unspecified.
    pub async fn run<J, R, F, Fut>(&self, jobs: Vec<J>, f: F) -> Result<Vec<R>>
    where
        J: Send + 'static,
        R: Send + 'static,
        F: Fn(J) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let total = jobs.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let semaphore = Arc::new(Semaphore::new(self.workers_for(total)));
        let results: Arc<Mutex<Vec<Option<R>>>> =
            Arc::new(Mutex::new((0..total).map(|_| None).collect()));
        let f = Arc::new(f);
        let mut tasks = JoinSet::new();

        for (slot, job) in jobs.into_iter().enumerate() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| Error::Closed)?;
            let results = Arc::clone(&results);
            let f = Arc::clone(&f);
            tasks.spawn(async move {
                let value = f(job).await;
                drop(permit);
                let mut guard = results.lock().map_err(|_| Error::Poisoned)?;
                guard[slot] = Some(value);
                Ok::<(), Error>(())
            });
        }

        while let Some(joined) = tasks.join_next().await {
            joined??;
        }

        let collected = Arc::try_unwrap(results)
            .map_err(|_| Error::Poisoned)?
            .into_inner()
            .map_err(|_| Error::Poisoned)?;
        collected
            .into_iter()
            .map(|value| value.ok_or(Error::Poisoned))
            .collect()
    }

    /// Run a blocking job function over every job on tokio's blocking
    /// threads, bounded the same way as [`FanOut::run`].
    pub async fn run_blocking<J, R, F>(&self, jobs: Vec<J>, f: F) -> Result<Vec<R>>
    where
        J: Send + 'static,
        R: Send + 'static,
        F: Fn(J) -> R + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let joined = self
            .run(jobs, move |job| {
                let f = Arc::clone(&f);
                tokio::task::spawn_blocking(move || f(job))
            })
            .await?;
        joined
            .into_iter()
            .map(|r| r.map_err(Error::from))
            .collect()
    }
}
