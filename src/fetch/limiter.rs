use std::future::Future;
use std::pin::Pin;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, Duration, Instant};

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// FIFO request throttle.
///
/// Tasks submitted through [`execute`](RateLimiter::execute) run strictly in
/// submission order, one at a time, with at least `60_000 / requests_per_minute`
/// milliseconds between the start of consecutive tasks. A single worker task
/// drains the queue, so the spacing invariant holds no matter how many callers
/// submit concurrently. Queued tasks cannot be cancelled; dropping the caller's
/// future only discards the result.
pub struct RateLimiter {
    jobs: mpsc::UnboundedSender<Job>,
    min_interval: Duration,
}

impl RateLimiter {
    /// Spawns the queue worker; must be called from within a tokio runtime.
    pub fn new(requests_per_minute: u32) -> Self {
        let min_interval = Duration::from_millis(60_000 / u64::from(requests_per_minute.max(1)));
        let (jobs, queue) = mpsc::unbounded_channel();
        tokio::spawn(run_queue(queue, min_interval));
        Self { jobs, min_interval }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Queues `task` and resolves with its output once it has run. A task that
    /// fails reports the failure to its own caller only; the queue moves on to
    /// the next task regardless.
    pub async fn execute<T, F>(&self, task: F) -> T
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (done, result) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let _ = done.send(task.await);
        });
        self.jobs
            .send(job)
            .expect("rate limiter worker outlives the handle that feeds it");
        result
            .await
            .expect("queued task always runs to completion")
    }
}

async fn run_queue(mut jobs: mpsc::UnboundedReceiver<Job>, min_interval: Duration) {
    let mut last_dispatch: Option<Instant> = None;
    while let Some(job) = jobs.recv().await {
        if let Some(last) = last_dispatch {
            let elapsed = last.elapsed();
            if elapsed < min_interval {
                sleep(min_interval - elapsed).await;
            }
        }
        last_dispatch = Some(Instant::now());
        job.await;
    }
}
