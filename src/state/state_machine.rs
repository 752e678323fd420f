use thiserror::Error;

use crate::dao::models::TimerEntity;

/// High-level phases a rental session timer can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    /// Timer exists but no session is running; it can be configured freely.
    Idle,
    /// A session is running and accruing time and price.
    Active,
    /// A session is running but accrual is frozen.
    Paused,
    /// A countdown session ran to completion.
    Expired,
    /// An operator ended the session before completion.
    Stopped,
}

/// Commands that can be applied to a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Change duration, mode, or price.
    Configure,
    /// Begin a session.
    Start,
    /// Freeze accrual.
    Pause,
    /// Thaw accrual after a pause.
    Resume,
    /// End the session early.
    Stop,
    /// Countdown reached zero.
    Expire,
    /// Return a finished timer to idle.
    Clear,
}

/// Error returned when a command cannot be applied in the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {command:?} cannot be applied while {from:?}")]
pub struct InvalidTransition {
    /// The phase the timer was in when the invalid command was received.
    pub from: TimerPhase,
    /// The command that cannot be applied from this phase.
    pub command: TimerCommand,
}

impl TimerPhase {
    /// Derive the phase from a timer's persisted status flags.
    pub fn of(timer: &TimerEntity) -> Self {
        if timer.expired && timer.manually_stopped {
            TimerPhase::Stopped
        } else if timer.expired {
            TimerPhase::Expired
        } else if timer.paused {
            TimerPhase::Paused
        } else if timer.is_active {
            TimerPhase::Active
        } else {
            TimerPhase::Idle
        }
    }
}

/// Validate a command against the current phase and return the next phase.
pub fn compute_transition(
    from: TimerPhase,
    command: TimerCommand,
) -> Result<TimerPhase, InvalidTransition> {
    let next = match (from, command) {
        (TimerPhase::Idle, TimerCommand::Configure) => TimerPhase::Idle,
        (TimerPhase::Active, TimerCommand::Configure) => TimerPhase::Active,
        (TimerPhase::Paused, TimerCommand::Configure) => TimerPhase::Paused,
        (TimerPhase::Idle, TimerCommand::Start) => TimerPhase::Active,
        (TimerPhase::Active, TimerCommand::Pause) => TimerPhase::Paused,
        (TimerPhase::Paused, TimerCommand::Resume) => TimerPhase::Active,
        (TimerPhase::Active | TimerPhase::Paused, TimerCommand::Stop) => TimerPhase::Stopped,
        (TimerPhase::Active, TimerCommand::Expire) => TimerPhase::Expired,
        (TimerPhase::Expired | TimerPhase::Stopped, TimerCommand::Clear) => TimerPhase::Idle,
        (from, command) => return Err(InvalidTransition { from, command }),
    };

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn idle_timer() -> TimerEntity {
        TimerEntity::idle("Station 1".into(), Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn fresh_timer_is_idle() {
        assert_eq!(TimerPhase::of(&idle_timer()), TimerPhase::Idle);
    }

    #[test]
    fn phase_derivation_follows_status_flags() {
        let mut timer = idle_timer();

        timer.is_active = true;
        assert_eq!(TimerPhase::of(&timer), TimerPhase::Active);

        timer.paused = true;
        assert_eq!(TimerPhase::of(&timer), TimerPhase::Paused);

        timer.paused = false;
        timer.expired = true;
        assert_eq!(TimerPhase::of(&timer), TimerPhase::Expired);

        timer.manually_stopped = true;
        assert_eq!(TimerPhase::of(&timer), TimerPhase::Stopped);
    }

    #[test]
    fn full_happy_path_through_session() {
        let mut phase = TimerPhase::Idle;
        phase = compute_transition(phase, TimerCommand::Configure).unwrap();
        phase = compute_transition(phase, TimerCommand::Start).unwrap();
        assert_eq!(phase, TimerPhase::Active);

        phase = compute_transition(phase, TimerCommand::Pause).unwrap();
        assert_eq!(phase, TimerPhase::Paused);

        phase = compute_transition(phase, TimerCommand::Resume).unwrap();
        assert_eq!(phase, TimerPhase::Active);

        phase = compute_transition(phase, TimerCommand::Expire).unwrap();
        assert_eq!(phase, TimerPhase::Expired);

        phase = compute_transition(phase, TimerCommand::Clear).unwrap();
        assert_eq!(phase, TimerPhase::Idle);
    }

    #[test]
    fn stop_works_from_active_and_paused() {
        assert_eq!(
            compute_transition(TimerPhase::Active, TimerCommand::Stop).unwrap(),
            TimerPhase::Stopped
        );
        assert_eq!(
            compute_transition(TimerPhase::Paused, TimerCommand::Stop).unwrap(),
            TimerPhase::Stopped
        );
    }

    #[test]
    fn reconfiguration_allowed_mid_session() {
        assert_eq!(
            compute_transition(TimerPhase::Active, TimerCommand::Configure).unwrap(),
            TimerPhase::Active
        );
        assert_eq!(
            compute_transition(TimerPhase::Paused, TimerCommand::Configure).unwrap(),
            TimerPhase::Paused
        );
    }

    #[test]
    fn start_requires_idle() {
        for from in [
            TimerPhase::Active,
            TimerPhase::Paused,
            TimerPhase::Expired,
            TimerPhase::Stopped,
        ] {
            let err = compute_transition(from, TimerCommand::Start).unwrap_err();
            assert_eq!(err.from, from);
            assert_eq!(err.command, TimerCommand::Start);
        }
    }

    #[test]
    fn finished_timers_reject_everything_but_clear() {
        for from in [TimerPhase::Expired, TimerPhase::Stopped] {
            for command in [
                TimerCommand::Configure,
                TimerCommand::Start,
                TimerCommand::Pause,
                TimerCommand::Resume,
                TimerCommand::Stop,
                TimerCommand::Expire,
            ] {
                assert!(compute_transition(from, command).is_err());
            }
            assert_eq!(
                compute_transition(from, TimerCommand::Clear).unwrap(),
                TimerPhase::Idle
            );
        }
    }
}
