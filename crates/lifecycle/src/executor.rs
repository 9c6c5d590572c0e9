//! Deadline-bounded execution of an attempt
//!
//! The attempt runs on its own thread. The caller waits for at most the
//! deadline; on expiry the attempt's [`CancelToken`] is cancelled and the
//! caller gets [`AttemptOutcome::TimedOut`] without waiting for the thread.
//! Work that ignores the token keeps running detached, but its result is
//! discarded, so a late completion can never be recorded as a success.

use crate::context::CancelToken;
use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a deadline-bounded attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome<T> {
    /// Finished before the deadline
    Completed(T),
    /// Deadline expired first
    TimedOut { elapsed: Duration },
    /// The attempt panicked
    Panicked,
}

impl<T> AttemptOutcome<T> {
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

/// Run `f` with a deadline
///
/// Returns an error only if the worker thread could not be spawned.
pub fn run_with_deadline<T, F>(timeout: Duration, f: F) -> io::Result<AttemptOutcome<T>>
where
    T: Send + 'static,
    F: FnOnce(CancelToken) -> T + Send + 'static,
{
    let token = CancelToken::new();
    let worker_token = token.clone();
    let (tx, rx) = mpsc::channel();
    let started = Instant::now();

    thread::Builder::new()
        .name("hostops-attempt".to_string())
        .spawn(move || {
            // The receiver is gone once the deadline passed.
            let _ = tx.send(f(worker_token));
        })?;

    match rx.recv_timeout(timeout) {
        Ok(value) => Ok(AttemptOutcome::Completed(value)),
        Err(mpsc::RecvTimeoutError::Timeout) => {
            token.cancel();
            let elapsed = started.elapsed();
            log::debug!("attempt exceeded deadline of {:?}, cancelled", timeout);
            Ok(AttemptOutcome::TimedOut { elapsed })
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Ok(AttemptOutcome::Panicked),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_completes_within_deadline() {
        let outcome = run_with_deadline(Duration::from_secs(5), |_| 42).unwrap();
        assert_eq!(outcome, AttemptOutcome::Completed(42));
    }

    #[test]
    fn test_times_out_and_cancels() {
        let observed = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&observed);
        let (done_tx, done_rx) = mpsc::channel();

        let outcome = run_with_deadline(Duration::from_millis(50), move |token| {
            while !token.is_cancelled() {
                thread::sleep(Duration::from_millis(5));
            }
            seen.store(true, Ordering::SeqCst);
            let _ = done_tx.send(());
            "late"
        })
        .unwrap();

        assert!(outcome.is_timed_out());
        if let AttemptOutcome::TimedOut { elapsed } = outcome {
            assert!(elapsed >= Duration::from_millis(50));
        }

        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(observed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_ignoring_cancellation_still_times_out() {
        let outcome = run_with_deadline(Duration::from_millis(20), |_| {
            thread::sleep(Duration::from_millis(300));
            1
        })
        .unwrap();
        assert!(outcome.is_timed_out());
    }

    #[test]
    fn test_panic_is_reported() {
        let outcome: AttemptOutcome<()> =
            run_with_deadline(Duration::from_secs(5), |_| panic!("attempt blew up")).unwrap();
        assert_eq!(outcome, AttemptOutcome::Panicked);
    }
}
