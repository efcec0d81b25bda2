//! Command handling for case correlation streams.

pub mod command_handler;
pub mod commands;
pub mod expiry;
pub mod material;

pub use command_handler::{CaseCommandHandler, CommandOutcome, HandlerError};
pub use commands::{
    CaseCommand, CaseEjected, DefendantsRecorded, MaterialRef, MaterialTimerExpired,
    ReceivedForm, TimerExpired, EXPIRE_MATERIAL_COMMAND,
};
pub use expiry::ExpiryCoordinator;
pub use material::MaterialExpiryTracker;

use crate::aggregate::CaseEvent;
use crate::reducer::{Reduction, TimerAction};

/// Events to persist and timer actions to run once they are persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decision {
    pub events: Vec<CaseEvent>,
    pub timers: Vec<TimerAction>,
}

impl Decision {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.timers.is_empty()
    }

    pub fn with_event(mut self, event: CaseEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_timer(mut self, action: TimerAction) -> Self {
        if action != TimerAction::Keep {
            self.timers.push(action);
        }
        self
    }

    pub fn push_reduction(&mut self, reduction: Reduction) {
        self.events.push(CaseEvent::SubmissionProcessed(reduction.outcome));
        if reduction.timer != TimerAction::Keep {
            self.timers.push(reduction.timer);
        }
    }
}

impl From<Reduction> for Decision {
    fn from(reduction: Reduction) -> Self {
        let mut decision = Decision::default();
        decision.push_reduction(reduction);
        decision
    }
}
