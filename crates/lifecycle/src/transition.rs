//! Phase transitions
//!
//! | From                  | To           | Method       |
//! |-----------------------|--------------|--------------|
//! | Initializing          | Processing   | [`Status::begin`] |
//! | Processing            | Processing   | [`Status::begin`] (interrupted attempt resumed) |
//! | Processing            | Succeeded    | [`Status::succeed`] |
//! | Processing            | Failed       | [`Status::fail`] |
//! | Processing            | Initializing | [`Status::abandon`] |
//! | Succeeded, Failed     | Initializing | [`Status::reset`] |
//!
//! Anything else is a [`TransitionError`] and leaves the status untouched.

use crate::types::{Phase, Status};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// A transition not allowed from the current phase
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid phase transition from {from} to {to}")]
pub struct TransitionError {
    pub from: Phase,
    pub to: Phase,
}

impl Status {
    fn guard(&self, to: Phase, allowed: &[Phase]) -> Result<(), TransitionError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(TransitionError {
                from: self.phase,
                to,
            })
        }
    }

    /// Start an execution attempt
    pub fn begin(&mut self) -> Result<(), TransitionError> {
        self.guard(Phase::Processing, &[Phase::Initializing, Phase::Processing])?;
        self.phase = Phase::Processing;
        Ok(())
    }

    /// Record a completed attempt
    pub fn succeed(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.guard(Phase::Succeeded, &[Phase::Processing])?;
        self.phase = Phase::Succeeded;
        self.failure_reason = None;
        self.failure_message = None;
        self.last_execution_time = Some(now);
        Ok(())
    }

    /// Record a failed attempt
    pub fn fail(
        &mut self,
        reason: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.guard(Phase::Failed, &[Phase::Processing])?;
        self.phase = Phase::Failed;
        self.failure_reason = Some(reason.into());
        self.failure_message = Some(message.into());
        self.last_execution_time = Some(now);
        Ok(())
    }

    /// Give up an attempt before anything ran, so it is retried later
    pub fn abandon(&mut self) -> Result<(), TransitionError> {
        self.guard(Phase::Initializing, &[Phase::Processing])?;
        self.phase = Phase::Initializing;
        Ok(())
    }

    /// Leave a quiescent phase because of drift or a re-run request
    pub fn reset(&mut self) -> Result<(), TransitionError> {
        self.guard(Phase::Initializing, &[Phase::Succeeded, Phase::Failed])?;
        self.phase = Phase::Initializing;
        self.failure_reason = None;
        self.failure_message = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_happy_path() {
        let mut status = Status::default();
        status.begin().unwrap();
        assert_eq!(status.phase, Phase::Processing);

        status.succeed(at(100)).unwrap();
        assert_eq!(status.phase, Phase::Succeeded);
        assert_eq!(status.last_execution_time, Some(at(100)));
        assert!(status.failure_reason.is_none());
    }

    #[test]
    fn test_failure_then_reset() {
        let mut status = Status::default();
        status.begin().unwrap();
        status.fail("ExecutionFailed", "exit code 2", at(5)).unwrap();
        assert_eq!(status.phase, Phase::Failed);
        assert_eq!(status.failure_reason.as_deref(), Some("ExecutionFailed"));
        assert_eq!(status.failure_message.as_deref(), Some("exit code 2"));

        status.reset().unwrap();
        assert_eq!(status.phase, Phase::Initializing);
        assert!(status.failure_reason.is_none());
        assert_eq!(status.last_execution_time, Some(at(5)));
    }

    #[test]
    fn test_success_clears_previous_failure() {
        let mut status = Status::default();
        status.begin().unwrap();
        status.fail("ExecutionFailed", "boom", at(1)).unwrap();
        status.reset().unwrap();
        status.begin().unwrap();
        status.succeed(at(2)).unwrap();
        assert!(status.failure_message.is_none());
    }

    #[test]
    fn test_begin_resumes_interrupted_attempt() {
        let mut status = Status {
            phase: Phase::Processing,
            ..Default::default()
        };
        assert!(status.begin().is_ok());
    }

    #[test]
    fn test_abandon_returns_to_initializing() {
        let mut status = Status::default();
        status.begin().unwrap();
        status.abandon().unwrap();
        assert_eq!(status.phase, Phase::Initializing);
        assert!(status.last_execution_time.is_none());
    }

    #[test]
    fn test_invalid_transitions_leave_status_untouched() {
        let mut status = Status::default();
        status.begin().unwrap();
        status.succeed(at(1)).unwrap();
        let before = status.clone();

        let err = status.begin().unwrap_err();
        assert_eq!(
            err,
            TransitionError {
                from: Phase::Succeeded,
                to: Phase::Processing
            }
        );
        assert!(status.succeed(at(2)).is_err());
        assert!(status.fail("x", "y", at(2)).is_err());
        assert!(status.abandon().is_err());
        assert_eq!(status, before);

        let mut fresh = Status::default();
        assert!(fresh.reset().is_err());
        assert!(fresh.succeed(at(1)).is_err());
        assert_eq!(
            err.to_string(),
            "invalid phase transition from Succeeded to Processing"
        );
    }
}
