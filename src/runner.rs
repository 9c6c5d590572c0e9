//! Execution engine seam
//!
//! The reconciler prepares everything an attempt needs into an
//! [`Invocation`] and hands it to a [`PlaybookRunner`]. How the playbook is
//! actually run (unpacking the archive, invoking the engine on the node) is
//! the runner's business.
//!
//! Use [`ScriptedRunner`] for testing without an execution engine:
//!
//! ```
//! use hostops::runner::{ScriptedRunner, Step};
//!
//! let runner = ScriptedRunner::new();
//! runner.push(Step::Fail("exit code 2".into()));
//! assert_eq!(runner.invocations().len(), 0);
//! ```

use lifecycle::CancelToken;
use playbook::CachedPlaybook;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

/// Everything one execution attempt needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Record kind, e.g. `hostconfigs`
    pub kind: &'static str,
    /// `namespace/name` of the record
    pub record: String,
    pub node_name: String,
    /// Resolved values document, empty when none was given
    pub values: String,
    /// Resolved inline playbook text, empty when none was given
    pub local_playbook: String,
    /// Verified archive, when the playbook is packaged remotely
    pub remote_playbook: Option<CachedPlaybook>,
    /// Deadline of the whole attempt
    pub timeout: Duration,
}

/// Runs prepared playbooks
///
/// `run` is called on a worker thread. When the deadline passes the token is
/// cancelled and the result is discarded, so implementations should poll
/// [`CancelToken::is_cancelled`] and stop early.
pub trait PlaybookRunner: Send + Sync {
    fn run(&self, invocation: &Invocation, cancel: &CancelToken) -> anyhow::Result<()>;

    /// Release whatever a record left behind before it is deleted
    fn cleanup(&self, _kind: &str, _record: &str, _node_name: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Scripted behavior of one [`ScriptedRunner`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Succeed,
    Fail(String),
    /// Run until cancelled
    Hang,
    /// Take this long, then succeed
    Sleep(Duration),
}

#[derive(Debug, Default)]
struct Script {
    steps: VecDeque<Step>,
    invocations: Vec<Invocation>,
    cleanups: Vec<String>,
    cleanup_failure: Option<String>,
}

/// Runner that plays back queued [`Step`]s, succeeding once the queue is empty
///
/// Clones share the same script, so a test can keep a handle while the
/// reconciler owns another.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    script: Arc<Mutex<Script>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, step: Step) {
        self.lock().steps.push_back(step);
    }

    /// Make every cleanup call fail with `message`
    pub fn fail_cleanup(&self, message: impl Into<String>) {
        self.lock().cleanup_failure = Some(message.into());
    }

    /// Invocations seen so far, in call order
    pub fn invocations(&self) -> Vec<Invocation> {
        self.lock().invocations.clone()
    }

    /// Records cleaned up so far
    pub fn cleanups(&self) -> Vec<String> {
        self.lock().cleanups.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PlaybookRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation, cancel: &CancelToken) -> anyhow::Result<()> {
        let step = {
            let mut script = self.lock();
            script.invocations.push(invocation.clone());
            script.steps.pop_front().unwrap_or(Step::Succeed)
        };

        match step {
            Step::Succeed => Ok(()),
            Step::Fail(message) => anyhow::bail!(message),
            Step::Hang => {
                while !cancel.is_cancelled() {
                    thread::sleep(Duration::from_millis(5));
                }
                anyhow::bail!("cancelled")
            }
            Step::Sleep(duration) => {
                thread::sleep(duration);
                Ok(())
            }
        }
    }

    fn cleanup(&self, _kind: &str, record: &str, _node_name: &str) -> anyhow::Result<()> {
        let mut script = self.lock();
        if let Some(message) = &script.cleanup_failure {
            anyhow::bail!("{message}");
        }
        script.cleanups.push(record.to_string());
        Ok(())
    }
}
