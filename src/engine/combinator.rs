// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Combinators and the per-frame combinator state machine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Boolean used to fold a contribution into the accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Combinator {
    /// Kernel `fuse`
    Union,
    /// Kernel `common`
    Intersection,
    /// Kernel `cut`
    Difference,
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::Union => write!(f, "union"),
            Combinator::Intersection => write!(f, "intersection"),
            Combinator::Difference => write!(f, "difference"),
        }
    }
}

/// What the next merge in a frame does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Replace the accumulator with the contribution
    Assign,
    /// Combine accumulator and contribution
    Apply(Combinator),
}

/// Position in the combinator sequence `Assign, c, c, c, ...` of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinatorState {
    AwaitingFirst(Combinator),
    Steady(Combinator),
}

impl CombinatorState {
    pub fn new(combinator: Combinator) -> Self {
        CombinatorState::AwaitingFirst(combinator)
    }

    pub fn combinator(&self) -> Combinator {
        match *self {
            CombinatorState::AwaitingFirst(c) | CombinatorState::Steady(c) => c,
        }
    }

    /// The step the next merge will take, without consuming it
    pub fn peek(&self) -> Step {
        match *self {
            CombinatorState::AwaitingFirst(_) => Step::Assign,
            CombinatorState::Steady(c) => Step::Apply(c),
        }
    }

    /// State after one successful merge
    pub fn advanced(&self) -> Self {
        CombinatorState::Steady(self.combinator())
    }

    pub fn has_merged(&self) -> bool {
        matches!(self, CombinatorState::Steady(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_assigns_then_repeats() {
        let mut state = CombinatorState::new(Combinator::Difference);
        assert_eq!(state.peek(), Step::Assign);
        state = state.advanced();
        for _ in 0..3 {
            assert_eq!(state.peek(), Step::Apply(Combinator::Difference));
            state = state.advanced();
        }
        assert!(state.has_merged());
    }

    #[test]
    fn test_peek_does_not_advance() {
        let state = CombinatorState::new(Combinator::Union);
        assert_eq!(state.peek(), Step::Assign);
        assert_eq!(state.peek(), Step::Assign);
        assert!(!state.has_merged());
    }
}
