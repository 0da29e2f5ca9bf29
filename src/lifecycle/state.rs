//! Process lifecycle state machine.
//!
//! # States
//! ```text
//! Uninitialized → Configured → Running → Terminating → Terminated
//! ```
//!
//! Transitions only move one step forward. `Terminated` is absorbing.

use std::sync::atomic::{AtomicU8, Ordering};

use thiserror::Error;

use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LifecycleState {
    Uninitialized = 0,
    Configured = 1,
    Running = 2,
    Terminating = 3,
    Terminated = 4,
}

impl LifecycleState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => LifecycleState::Uninitialized,
            1 => LifecycleState::Configured,
            2 => LifecycleState::Running,
            3 => LifecycleState::Terminating,
            _ => LifecycleState::Terminated,
        }
    }

    /// The only state reachable from this one.
    pub fn next(self) -> Option<Self> {
        match self {
            LifecycleState::Uninitialized => Some(LifecycleState::Configured),
            LifecycleState::Configured => Some(LifecycleState::Running),
            LifecycleState::Running => Some(LifecycleState::Terminating),
            LifecycleState::Terminating => Some(LifecycleState::Terminated),
            LifecycleState::Terminated => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("transition {from:?} → {to:?} skips or reverses a state")]
    InvalidTransition { from: LifecycleState, to: LifecycleState },

    #[error("lifecycle is {actual:?}, expected {expected:?}")]
    UnexpectedState {
        expected: LifecycleState,
        actual: LifecycleState,
    },
}

/// Atomic holder for the single per-process lifecycle state.
#[derive(Debug)]
pub struct StateCell {
    raw: AtomicU8,
}

impl StateCell {
    pub fn new() -> Self {
        Self {
            raw: AtomicU8::new(LifecycleState::Uninitialized as u8),
        }
    }

    pub fn get(&self) -> LifecycleState {
        LifecycleState::from_u8(self.raw.load(Ordering::Acquire))
    }

    /// Move `from` → `to`. Fails without effect if the current state is not
    /// `from`; exactly one of several racing callers succeeds.
    pub fn advance(&self, from: LifecycleState, to: LifecycleState) -> Result<(), LifecycleError> {
        if from.next() != Some(to) {
            return Err(LifecycleError::InvalidTransition { from, to });
        }

        self.raw
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|actual| LifecycleError::UnexpectedState {
                expected: from,
                actual: LifecycleState::from_u8(actual),
            })?;

        metrics::set_lifecycle_state(to as u8);
        tracing::debug!(from = ?from, to = ?to, "Lifecycle transition");
        Ok(())
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
