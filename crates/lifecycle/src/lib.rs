//! # Lifecycle
//!
//! Phase lifecycle of declarative configuration records.
//!
//! A record moves `Initializing -> Processing -> Succeeded | Failed` and is
//! reset to `Initializing` when its desired configuration drifts or a re-run
//! is requested. This crate holds the pieces of that loop that do not depend
//! on where records live or what an attempt does.
//!
//! ## Core Concepts
//!
//! - **Phase / Status**: the persisted lifecycle state of a record
//! - **Transitions**: the only legal ways to change a [`Status`]
//! - **decide**: maps phase, [`Mode`] and [`Signals`] to the next [`Action`]
//! - **run_with_deadline**: runs an attempt under a deadline with cancellation
//!
//! ## Example
//!
//! ```
//! use lifecycle::{Action, Mode, Phase, Signals, Status, decide};
//!
//! let mut status = Status::default();
//! assert_eq!(decide(status.phase, Mode::Continuous, Signals::default()), Action::Execute);
//!
//! status.begin()?;
//! status.succeed(chrono::Utc::now())?;
//!
//! let stable = Signals { stable: true, rerun: false };
//! assert_eq!(decide(status.phase, Mode::Continuous, stable), Action::Idle);
//! assert_eq!(status.phase, Phase::Succeeded);
//! # Ok::<(), lifecycle::TransitionError>(())
//! ```

pub mod context;
pub mod executor;
pub mod planner;
pub mod transition;
pub mod types;

// Re-export main types at crate root
pub use context::{CancelToken, Clock, FixedClock, SystemClock};
pub use executor::{AttemptOutcome, run_with_deadline};
pub use planner::decide;
pub use transition::TransitionError;
pub use types::{Action, Mode, Phase, Signals, Status};
