use core::convert::Infallible;
use serde::{Deserialize, Serialize};

use crate::{Machine, StateNode, StatePath, Step, ToggleConfig};

/// Minimal start/stop actor whose context is provided as input.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToggleState {
    Idle,
    Running,
}

impl StateNode for ToggleState {
    fn path(&self) -> StatePath {
        match self {
            Self::Idle => StatePath::new(&["idle"]),
            Self::Running => StatePath::new(&["running"]),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleContext {
    pub rating: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToggleEvent {
    Start,
    Stop,
}

#[derive(Clone, Debug, Default)]
pub struct ToggleMachine {
    input: ToggleConfig,
}

impl ToggleMachine {
    pub fn new(input: ToggleConfig) -> Self {
        Self { input }
    }
}

impl Machine for ToggleMachine {
    type State = ToggleState;
    type Context = ToggleContext;
    type Event = ToggleEvent;
    type Effect = Infallible;

    const ID: &'static str = "toggle";

    fn initial(&mut self) -> Step<Self> {
        let context = ToggleContext {
            rating: self.input.default_rating,
        };
        Step::new(ToggleState::Idle, context)
    }

    fn transition(
        &mut self,
        state: &ToggleState,
        context: &ToggleContext,
        event: ToggleEvent,
    ) -> Option<Step<Self>> {
        match (state, event) {
            (ToggleState::Idle, ToggleEvent::Start) => {
                Some(Step::new(ToggleState::Running, *context))
            }
            (ToggleState::Running, ToggleEvent::Stop) => {
                Some(Step::new(ToggleState::Idle, *context))
            }
            _ => None,
        }
    }
}
