//! Function-pointer finite state machine engine for the motion state.
//!
//! Classic embedded FSM pattern:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  StateTable                                              │
//! │  ┌─────────┬───────────┬──────────┬───────────────────┐  │
//! │  │ State   │ on_enter  │ on_exit  │ on_update         │  │
//! │  ├─────────┼───────────┼──────────┼───────────────────┤  │
//! │  │ Idle    │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  │ Moving  │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  │ Mopping │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  └─────────┴───────────┴──────────┴───────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and remembers the state it
//! left so callers can detect edges.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// What the tool is doing right now.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MotionState {
    #[default]
    Idle = 0,
    Moving = 1,
    Mopping = 2,
}

impl MotionState {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 3;

    /// Convert an index back to `MotionState`.  Out-of-range indices fall
    /// back to `Idle` in release builds.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Moving,
            2 => Self::Mopping,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Idle
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<MotionState>;

/// Static descriptor for a single FSM state.
pub struct StateDescriptor {
    pub id: MotionState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `MotionState as usize`.
    table: [StateDescriptor; MotionState::COUNT],
    current: usize,
    previous: usize,
    tick_count: u64,
    state_entry_tick: u64,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; MotionState::COUNT], initial: MotionState) -> Self {
        Self {
            table,
            current: initial as usize,
            previous: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("motion FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.  Returns the new state when a
    /// transition happened.
    pub fn tick(&mut self, ctx: &mut FsmContext) -> Option<MotionState> {
        self.tick_count += 1;
        ctx.ticks_in_state = self.tick_count - self.state_entry_tick;
        ctx.total_ticks = self.tick_count;

        let next = (self.table[self.current].on_update)(ctx)?;
        if next as usize == self.current {
            return None;
        }
        self.transition(next, ctx);
        Some(next)
    }

    /// Force an immediate transition, bypassing `on_update`.
    pub fn force_transition(&mut self, next: MotionState, ctx: &mut FsmContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> MotionState {
        MotionState::from_index(self.current)
    }

    /// The state left by the most recent transition.
    pub fn previous_state(&self) -> MotionState {
        MotionState::from_index(self.previous)
    }

    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    fn transition(&mut self, next: MotionState, ctx: &mut FsmContext) {
        let next_idx = next as usize;

        info!(
            "motion: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.previous = self.current;
        self.current = next_idx;
        self.state_entry_tick = self.tick_count;
        ctx.ticks_in_state = 0;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
