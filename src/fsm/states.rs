//! Concrete state handler functions and table builder.
//!
//! ```text
//!  IDLE ──[movement]──▶ MOVING ──[≥ N cycles in window, in position]──▶ MOPPING
//!    │                     ▲                                              │
//!    └──[N cycles]─────────┼──────────────────────────────────────────────┤
//!                          └──────────[no cycle > max_cycle_ticks]────────┘
//!
//!  Any state ──[inactivity]──▶ IDLE
//! ```

use super::context::FsmContext;
use super::{MotionState, StateDescriptor};
use log::{debug, info};

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; MotionState::COUNT] {
    [
        // Index 0 — Idle
        StateDescriptor {
            id: MotionState::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1 — Moving
        StateDescriptor {
            id: MotionState::Moving,
            name: "Moving",
            on_enter: None,
            on_exit: None,
            on_update: moving_update,
        },
        // Index 2 — Mopping
        StateDescriptor {
            id: MotionState::Mopping,
            name: "Mopping",
            on_enter: Some(mopping_enter),
            on_exit: Some(mopping_exit),
            on_update: mopping_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut FsmContext) {
    ctx.clear_cycles();
    debug!("IDLE: tool at rest");
}

fn idle_update(ctx: &mut FsmContext) -> Option<MotionState> {
    if ctx.observation.inactive {
        return None;
    }
    if ctx.activation_met() {
        return Some(MotionState::Mopping);
    }
    if ctx.observation.moving {
        return Some(MotionState::Moving);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  MOVING — carried or handled, not (yet) cleaning
// ═══════════════════════════════════════════════════════════════════════════

fn moving_update(ctx: &mut FsmContext) -> Option<MotionState> {
    if ctx.observation.inactive {
        return Some(MotionState::Idle);
    }
    if ctx.activation_met() {
        return Some(MotionState::Mopping);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  MOPPING — confirmed back-and-forth cleaning strokes
// ═══════════════════════════════════════════════════════════════════════════

fn mopping_enter(ctx: &mut FsmContext) {
    info!(
        "MOPPING: {} cycles within {} ticks",
        ctx.cycles_in_window(ctx.now),
        ctx.activation_window_ticks
    );
}

fn mopping_exit(ctx: &mut FsmContext) {
    // Re-entry needs a fresh activation burst.
    ctx.clear_cycles();
}

fn mopping_update(ctx: &mut FsmContext) -> Option<MotionState> {
    if ctx.observation.inactive {
        return Some(MotionState::Idle);
    }
    let silent = ctx
        .ticks_since_last_cycle(ctx.now)
        .is_none_or(|t| t > ctx.max_cycle_ticks);
    if silent {
        debug!("MOPPING: no cycle for more than {} ticks", ctx.max_cycle_ticks);
        return Some(MotionState::Moving);
    }
    None
}
