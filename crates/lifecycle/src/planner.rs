//! Reconcile decision - what a pass should do with a record

use crate::types::{Action, Mode, Phase, Signals};

/// Decide the next action for a record
///
/// A record that is stable and has no re-run request never moves; this is
/// the idempotency guarantee. `Processing` at the start of a pass means a
/// previous attempt was interrupted, so it is attempted again.
pub fn decide(phase: Phase, mode: Mode, signals: Signals) -> Action {
    match phase {
        Phase::Initializing | Phase::Processing => Action::Execute,
        Phase::Succeeded => {
            let drifted = mode == Mode::Continuous && !signals.stable;
            if signals.rerun || drifted {
                Action::Reset
            } else {
                Action::Idle
            }
        }
        Phase::Failed => {
            if signals.rerun || !signals.stable {
                Action::Reset
            } else {
                Action::Idle
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STABLE: Signals = Signals {
        stable: true,
        rerun: false,
    };
    const DRIFTED: Signals = Signals {
        stable: false,
        rerun: false,
    };
    const RERUN: Signals = Signals {
        stable: true,
        rerun: true,
    };

    #[test]
    fn test_pending_phases_execute() {
        for mode in [Mode::Continuous, Mode::OneShot] {
            for signals in [STABLE, DRIFTED, RERUN] {
                assert_eq!(decide(Phase::Initializing, mode, signals), Action::Execute);
                assert_eq!(decide(Phase::Processing, mode, signals), Action::Execute);
            }
        }
    }

    #[test]
    fn test_stable_records_stay_put() {
        for mode in [Mode::Continuous, Mode::OneShot] {
            assert_eq!(decide(Phase::Succeeded, mode, STABLE), Action::Idle);
            assert_eq!(decide(Phase::Failed, mode, STABLE), Action::Idle);
        }
    }

    #[test]
    fn test_drift_resets_continuous_records() {
        assert_eq!(
            decide(Phase::Succeeded, Mode::Continuous, DRIFTED),
            Action::Reset
        );
        assert_eq!(decide(Phase::Failed, Mode::Continuous, DRIFTED), Action::Reset);
    }

    #[test]
    fn test_one_shot_ignores_drift_after_success() {
        assert_eq!(decide(Phase::Succeeded, Mode::OneShot, DRIFTED), Action::Idle);
        assert_eq!(decide(Phase::Failed, Mode::OneShot, DRIFTED), Action::Reset);
    }

    #[test]
    fn test_rerun_always_resets_quiescent_records() {
        for mode in [Mode::Continuous, Mode::OneShot] {
            assert_eq!(decide(Phase::Succeeded, mode, RERUN), Action::Reset);
            assert_eq!(decide(Phase::Failed, mode, RERUN), Action::Reset);
        }
    }
}
