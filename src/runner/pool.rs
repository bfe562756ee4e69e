use crate::error::BenchResult;
use crossbeam_channel::unbounded;
use log::debug;
use std::thread;

/// Runs `task` over all `jobs` on at most `workers` threads.
///
/// Jobs are handed out in input order. Every finished job is passed to
/// `on_complete` on the calling thread, in completion order. If `on_complete`
/// fails, no further jobs are started and the error is returned once the
/// running ones have finished.
pub fn run_pool<J, R, T, C>(jobs: Vec<J>, workers: usize, task: T, mut on_complete: C) -> BenchResult<()>
where
    J: Send,
    R: Send,
    T: Fn(J) -> R + Sync,
    C: FnMut(R) -> BenchResult<()>,
{
    let (job_tx, job_rx) = unbounded::<J>();
    let (done_tx, done_rx) = unbounded::<R>();
    for job in jobs {
        // The receiver is alive in this scope, so sending cannot fail.
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    let task = &task;
    thread::scope(move |scope| {
        for worker in 0..workers.max(1) {
            let job_rx = job_rx.clone();
            let done_tx = done_tx.clone();
            scope.spawn(move || {
                for job in job_rx.iter() {
                    if done_tx.send(task(job)).is_err() {
                        debug!("Worker {} stopped: results are no longer collected.", worker);
                        break;
                    }
                }
            });
        }
        drop(done_tx);
        drop(job_rx);

        for result in done_rx.iter() {
            on_complete(result)?;
        }
        Ok(())
    })
}
