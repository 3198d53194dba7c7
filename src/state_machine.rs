// Copyright 2025 Cowboy AI, LLC.

//! State machine contract for document lifecycles
//!
//! Each document status is a closed enum implementing
//! [`MealyStateTransitions`]: the next state depends on the current state
//! AND the input. [`MealyStateTransitions::next_state`] is the single
//! transition table for a status type; everything else (legality checks,
//! error reporting) derives from it, so the whole lifecycle of a document can
//! be audited in one `match`.

use crate::errors::{DomainError, DomainResult};
use std::fmt::Debug;

/// Input to a state machine transition
pub trait TransitionInput: Debug + Clone + Send + Sync {
    /// Operation name used in errors and logs (e.g. `"approve"`)
    fn description(&self) -> &'static str;
}

/// Trait for types that can be used as states in a state machine
pub trait State: Debug + Clone + PartialEq + Eq + Send + Sync {
    /// Get the name of this state for logging/debugging
    fn name(&self) -> &'static str;

    /// Check if this is a terminal state
    fn is_terminal(&self) -> bool {
        false
    }
}

/// Mealy Machine: output state depends on current state AND input
pub trait MealyStateTransitions: State {
    /// The input type for transitions
    type Input: TransitionInput;

    /// Entity name reported in transition errors
    const ENTITY_TYPE: &'static str;

    /// The transition table. `None` means the input is not accepted here.
    fn next_state(&self, input: &Self::Input) -> Option<Self>;

    /// Check if a transition to `target` is valid given the input
    fn can_transition_to(&self, target: &Self, input: &Self::Input) -> bool {
        self.next_state(input).as_ref() == Some(target)
    }

    /// Check if the input is accepted from this state at all
    fn accepts(&self, input: &Self::Input) -> bool {
        self.next_state(input).is_some()
    }

    /// Resolve the next state or fail with an error naming the current state
    fn apply(&self, input: &Self::Input) -> DomainResult<Self> {
        self.next_state(input)
            .ok_or_else(|| DomainError::InvalidStateTransition {
                entity_type: Self::ENTITY_TYPE.to_string(),
                from: self.name().to_string(),
                operation: input.description().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Gate {
        Closed,
        Open,
        Locked,
    }

    #[derive(Debug, Clone)]
    enum GateInput {
        Open,
        Close,
        Lock,
    }

    impl TransitionInput for GateInput {
        fn description(&self) -> &'static str {
            match self {
                GateInput::Open => "open",
                GateInput::Close => "close",
                GateInput::Lock => "lock",
            }
        }
    }

    impl State for Gate {
        fn name(&self) -> &'static str {
            match self {
                Gate::Closed => "CLOSED",
                Gate::Open => "OPEN",
                Gate::Locked => "LOCKED",
            }
        }

        fn is_terminal(&self) -> bool {
            matches!(self, Gate::Locked)
        }
    }

    impl MealyStateTransitions for Gate {
        type Input = GateInput;
        const ENTITY_TYPE: &'static str = "Gate";

        fn next_state(&self, input: &GateInput) -> Option<Self> {
            match (self, input) {
                (Gate::Closed, GateInput::Open) => Some(Gate::Open),
                (Gate::Open, GateInput::Close) => Some(Gate::Closed),
                (Gate::Closed, GateInput::Lock) => Some(Gate::Locked),
                _ => None,
            }
        }
    }

    #[test]
    fn test_apply_follows_table() {
        assert_eq!(Gate::Closed.apply(&GateInput::Open).unwrap(), Gate::Open);
        assert!(Gate::Closed.can_transition_to(&Gate::Locked, &GateInput::Lock));
        assert!(!Gate::Open.accepts(&GateInput::Lock));
    }

    #[test]
    fn test_apply_rejection_names_current_state() {
        let err = Gate::Locked.apply(&GateInput::Open).unwrap_err();
        match err {
            DomainError::InvalidStateTransition {
                entity_type,
                from,
                operation,
            } => {
                assert_eq!(entity_type, "Gate");
                assert_eq!(from, "LOCKED");
                assert_eq!(operation, "open");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
