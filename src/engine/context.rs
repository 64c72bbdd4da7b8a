// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Execution context: the current accumulator, its combinator state and the
//! frames suspended by open scopes

use super::combinator::{Combinator, CombinatorState, Step};
use super::scope::ScopeId;
use crate::error::{CsgError, Result};
use crate::kernel::Kernel;
use tracing::debug;

/// Accumulator and combinator state of one nesting level
pub(crate) struct Frame<K: Kernel> {
    pub(crate) accumulator: K::Solid,
    pub(crate) state: CombinatorState,
}

impl<K: Kernel> Frame<K> {
    pub(crate) fn new(accumulator: K::Solid, combinator: Combinator) -> Self {
        Self {
            accumulator,
            state: CombinatorState::new(combinator),
        }
    }
}

/// A parent frame put aside while the scope `scope` is open
pub(crate) struct Suspended<K: Kernel> {
    pub(crate) parent: Frame<K>,
    pub(crate) scope: ScopeId,
}

/// State of one script execution.
///
/// Every operation takes the context explicitly, so independent executions
/// never share an accumulator.
pub struct Context<K: Kernel> {
    pub(crate) kernel: K,
    pub(crate) frame: Frame<K>,
    pub(crate) suspended: Vec<Suspended<K>>,
}

impl<K: Kernel> Context<K> {
    /// Fresh context whose root scope fuses its contributions
    pub fn new(kernel: K) -> Self {
        Self::with_combinator(kernel, Combinator::Union)
    }

    pub fn with_combinator(kernel: K, combinator: Combinator) -> Self {
        let root = kernel.null_solid();
        Self {
            kernel,
            frame: Frame::new(root, combinator),
            suspended: Vec::new(),
        }
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Number of open scopes above the root
    pub fn depth(&self) -> usize {
        self.suspended.len()
    }

    pub fn combinator_state(&self) -> CombinatorState {
        self.frame.state
    }

    /// Current accumulator
    pub fn object(&self) -> &K::Solid {
        &self.frame.accumulator
    }

    pub(crate) fn object_mut(&mut self) -> &mut K::Solid {
        &mut self.frame.accumulator
    }

    /// Fold `contribution` into the current accumulator with the next combinator step.
    ///
    /// A missing or null contribution is rejected before anything changes. The
    /// combined value is computed first, so a kernel failure leaves both the
    /// accumulator and the combinator state untouched.
    pub fn merge(&mut self, contribution: impl Into<Option<K::Solid>>) -> Result<()> {
        let contribution = match contribution.into() {
            Some(solid) if !self.kernel.is_null(&solid) => solid,
            _ => return Err(CsgError::InvalidContribution),
        };

        let step = self.frame.state.peek();
        let merged = match step {
            Step::Assign => contribution,
            Step::Apply(Combinator::Union) => {
                self.kernel.fuse(&self.frame.accumulator, &contribution)?
            }
            Step::Apply(Combinator::Intersection) => {
                self.kernel.common(&self.frame.accumulator, &contribution)?
            }
            Step::Apply(Combinator::Difference) => {
                self.kernel.cut(&self.frame.accumulator, &contribution)?
            }
        };

        self.frame.accumulator = merged;
        self.frame.state = self.frame.state.advanced();
        debug!(?step, depth = self.depth(), "Merged contribution");
        Ok(())
    }

    /// Consume the context and return the root accumulator
    pub fn finish(self) -> Result<K::Solid> {
        self.ensure_closed()?;
        Ok(self.frame.accumulator)
    }

    /// Root accumulator, failing while scopes are still open
    pub fn result(&self) -> Result<&K::Solid> {
        self.ensure_closed()?;
        Ok(&self.frame.accumulator)
    }

    pub(crate) fn ensure_closed(&self) -> Result<()> {
        match self.suspended.len() {
            0 => Ok(()),
            open => Err(CsgError::UnclosedScopes { open }),
        }
    }
}

impl<K: Kernel + Default> Default for Context<K> {
    fn default() -> Self {
        Self::new(K::default())
    }
}
