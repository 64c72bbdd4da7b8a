// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Nested composition scopes.
//!
//! Entering a scope suspends the current frame and installs a fresh one.
//! Closing it runs an optional finishing operation on the nested accumulator,
//! restores the parent and merges the nested result into it as a single
//! contribution. Aborting restores the parent without merging anything.

use super::combinator::Combinator;
use super::context::{Context, Frame, Suspended};
use crate::error::{CsgError, Result};
use crate::kernel::Kernel;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an opened scope, unique across all contexts of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl ScopeId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    fn next() -> Self {
        Self(NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ticket returned by `enter_scope`; must be closed or aborted exactly once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeHandle {
    id: ScopeId,
    depth: usize,
}

impl ScopeHandle {
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Nesting depth of the scope, 1 for a scope opened at the root
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl<K: Kernel> Context<K> {
    /// Open a scope seeded with the null solid
    pub fn enter_scope(&mut self, combinator: Combinator) -> ScopeHandle {
        let seed = self.kernel.null_solid();
        self.enter_scope_with_seed(combinator, seed)
    }

    /// Open a scope whose accumulator starts as `seed`
    pub fn enter_scope_with_seed(&mut self, combinator: Combinator, seed: K::Solid) -> ScopeHandle {
        let id = ScopeId::next();
        let parent = std::mem::replace(&mut self.frame, Frame::new(seed, combinator));
        self.suspended.push(Suspended { parent, scope: id });
        let handle = ScopeHandle {
            id,
            depth: self.suspended.len(),
        };
        debug!(scope = %id, depth = handle.depth, %combinator, "Entered scope");
        handle
    }

    /// Innermost open scope, `None` at the root
    pub fn current_scope(&self) -> Option<ScopeId> {
        self.suspended.last().map(|s| s.scope)
    }

    pub fn is_open(&self, handle: ScopeHandle) -> bool {
        self.suspended.iter().any(|s| s.scope == handle.id)
    }

    fn check_innermost(&self, handle: ScopeHandle) -> Result<()> {
        let innermost = self.current_scope();
        if innermost == Some(handle.id) {
            Ok(())
        } else {
            Err(CsgError::ScopeOrderViolation {
                scope: handle.id,
                innermost,
            })
        }
    }

    /// Close the innermost scope and merge its result into the parent
    pub fn close_scope(&mut self, handle: ScopeHandle) -> Result<()> {
        self.close_scope_with(handle, |_| Ok(()))
    }

    /// Close the innermost scope, running `finish` on the nested accumulator first.
    ///
    /// If `finish` fails the scope is aborted and the error returned. A scope
    /// that is still empty skips both `finish` and the upward merge.
    pub fn close_scope_with<F>(&mut self, handle: ScopeHandle, finish: F) -> Result<()>
    where
        F: FnOnce(&mut Context<K>) -> Result<()>,
    {
        self.check_innermost(handle)?;

        let empty = self.kernel.is_null(&self.frame.accumulator);
        if !empty {
            if let Err(err) = finish(self) {
                // The finisher may have closed or aborted the scope itself
                if self.is_open(handle) {
                    self.abort_scope(handle)?;
                }
                return Err(err);
            }
            // Finishers must leave the scope stack as they found it
            self.check_innermost(handle)?;
        }

        let Some(Suspended { parent, .. }) = self.suspended.pop() else {
            return Err(CsgError::ScopeOrderViolation {
                scope: handle.id,
                innermost: None,
            });
        };
        let finished = std::mem::replace(&mut self.frame, parent);

        if self.kernel.is_null(&finished.accumulator) {
            warn!(scope = %handle.id, "Closed empty scope, nothing merged");
            return Ok(());
        }
        debug!(scope = %handle.id, depth = self.depth(), "Closing scope");
        self.merge(finished.accumulator)
    }

    /// Restore the parent of `handle`'s scope, discarding the partial result and
    /// every scope opened inside it. Nothing is merged.
    pub fn abort_scope(&mut self, handle: ScopeHandle) -> Result<()> {
        let Some(position) = self.suspended.iter().position(|s| s.scope == handle.id) else {
            return Err(CsgError::ScopeOrderViolation {
                scope: handle.id,
                innermost: self.current_scope(),
            });
        };
        let discarded = self.suspended.len() - position;
        let mut unwound = self.suspended.split_off(position);
        let restored = unwound.remove(0);
        self.frame = restored.parent;
        debug!(scope = %handle.id, discarded, "Aborted scope");
        Ok(())
    }

    /// Open a scope tied to the returned guard
    pub fn scope(&mut self, combinator: Combinator) -> ScopeGuard<'_, K> {
        let handle = self.enter_scope(combinator);
        ScopeGuard {
            ctx: self,
            handle,
            done: false,
        }
    }

    /// Run `body` in a nested scope and merge its result on success
    pub fn with_scope<T, B>(&mut self, combinator: Combinator, body: B) -> Result<T>
    where
        B: FnOnce(&mut Context<K>) -> Result<T>,
    {
        self.with_scope_finishing(combinator, body, |_| Ok(()))
    }

    /// Run `body` in a nested scope, apply `finish` to its result, then merge it
    pub fn with_scope_finishing<T, B, F>(&mut self, combinator: Combinator, body: B, finish: F) -> Result<T>
    where
        B: FnOnce(&mut Context<K>) -> Result<T>,
        F: FnOnce(&mut Context<K>) -> Result<()>,
    {
        let mut guard = self.scope(combinator);
        let value = body(&mut *guard)?;
        guard.finish_with(finish)?;
        Ok(value)
    }
}

/// Open scope that is aborted when dropped without being finished
pub struct ScopeGuard<'c, K: Kernel> {
    ctx: &'c mut Context<K>,
    handle: ScopeHandle,
    done: bool,
}

impl<K: Kernel> ScopeGuard<'_, K> {
    pub fn handle(&self) -> ScopeHandle {
        self.handle
    }

    /// Close the scope and merge its result into the parent
    pub fn finish(self) -> Result<()> {
        self.finish_with(|_| Ok(()))
    }

    pub fn finish_with<F>(mut self, finish: F) -> Result<()>
    where
        F: FnOnce(&mut Context<K>) -> Result<()>,
    {
        self.done = true;
        let result = self.ctx.close_scope_with(self.handle, finish);
        if result.is_err() && self.ctx.is_open(self.handle) {
            // Out of order close: unwind everything down to this scope
            self.ctx.abort_scope(self.handle)?;
        }
        result
    }
}

impl<K: Kernel> Deref for ScopeGuard<'_, K> {
    type Target = Context<K>;

    fn deref(&self) -> &Context<K> {
        self.ctx
    }
}

impl<K: Kernel> DerefMut for ScopeGuard<'_, K> {
    fn deref_mut(&mut self) -> &mut Context<K> {
        self.ctx
    }
}

impl<K: Kernel> Drop for ScopeGuard<'_, K> {
    fn drop(&mut self) {
        if !self.done && self.ctx.is_open(self.handle) {
            // Cannot fail: the scope is known to be open
            let _ = self.ctx.abort_scope(self.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{named, SymbolicKernel};
    use crate::error::KernelError;

    fn context() -> Context<SymbolicKernel> {
        Context::new(SymbolicKernel)
    }

    #[test]
    fn test_scope_result_merges_as_one_contribution() {
        let mut ctx = context();
        ctx.merge(named("a")).unwrap();
        let handle = ctx.enter_scope(Combinator::Difference);
        ctx.merge(named("b")).unwrap();
        ctx.merge(named("c")).unwrap();
        ctx.close_scope(handle).unwrap();
        assert_eq!(ctx.object().to_string(), "fuse(a, cut(b, c))");
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn test_out_of_order_close_changes_nothing() {
        let mut ctx = context();
        let outer = ctx.enter_scope(Combinator::Union);
        ctx.merge(named("a")).unwrap();
        let inner = ctx.enter_scope(Combinator::Union);
        ctx.merge(named("b")).unwrap();

        let err = ctx.close_scope(outer).unwrap_err();
        assert!(matches!(
            err,
            CsgError::ScopeOrderViolation { scope, innermost: Some(i) } if scope == outer.id() && i == inner.id()
        ));
        assert_eq!(ctx.depth(), 2);
        assert_eq!(ctx.object().to_string(), "b");

        ctx.close_scope(inner).unwrap();
        ctx.close_scope(outer).unwrap();
        assert_eq!(ctx.object().to_string(), "fuse(a, b)");
    }

    #[test]
    fn test_double_close_rejected() {
        let mut ctx = context();
        let handle = ctx.enter_scope(Combinator::Union);
        ctx.merge(named("a")).unwrap();
        ctx.close_scope(handle).unwrap();
        assert!(matches!(
            ctx.close_scope(handle),
            Err(CsgError::ScopeOrderViolation { innermost: None, .. })
        ));
        assert_eq!(ctx.object().to_string(), "a");
    }

    #[test]
    fn test_handle_from_other_context_rejected() {
        let mut first = context();
        let mut second = context();
        let foreign = first.enter_scope(Combinator::Union);
        let own = second.enter_scope(Combinator::Union);
        assert!(second.close_scope(foreign).is_err());
        assert!(second.is_open(own));
    }

    #[test]
    fn test_empty_scope_leaves_parent_untouched() {
        let mut ctx = context();
        ctx.merge(named("a")).unwrap();
        let before = ctx.combinator_state();
        let handle = ctx.enter_scope(Combinator::Intersection);
        ctx.close_scope_with(handle, |_| Err(CsgError::InvalidContribution))
            .unwrap();
        assert_eq!(ctx.object().to_string(), "a");
        assert_eq!(ctx.combinator_state(), before);
    }

    #[test]
    fn test_seeded_scope_merges_seed() {
        let mut ctx = context();
        let handle = ctx.enter_scope_with_seed(Combinator::Union, named("seed"));
        ctx.close_scope(handle).unwrap();
        assert_eq!(ctx.object().to_string(), "seed");
    }

    #[test]
    fn test_finisher_acts_on_nested_accumulator() {
        let mut ctx = context();
        ctx.merge(named("a")).unwrap();
        let handle = ctx.enter_scope(Combinator::Union);
        ctx.merge(named("b")).unwrap();
        ctx.close_scope_with(handle, |inner| {
            let solid = inner.object_mut();
            *solid = named(&format!("rotate({solid})"));
            Ok(())
        })
        .unwrap();
        assert_eq!(ctx.object().to_string(), "fuse(a, rotate(b))");
    }

    #[test]
    fn test_failing_finisher_aborts_scope() {
        let mut ctx = context();
        ctx.merge(named("a")).unwrap();
        let handle = ctx.enter_scope(Combinator::Union);
        ctx.merge(named("b")).unwrap();
        let err = ctx
            .close_scope_with(handle, |_| Err(KernelError::invalid("nope").into()))
            .unwrap_err();
        assert!(matches!(err, CsgError::Kernel(_)));
        assert_eq!(ctx.depth(), 0);
        assert_eq!(ctx.object().to_string(), "a");
    }

    #[test]
    fn test_abort_unwinds_nested_scopes() {
        let mut ctx = context();
        ctx.merge(named("a")).unwrap();
        let outer = ctx.enter_scope(Combinator::Union);
        ctx.merge(named("b")).unwrap();
        ctx.enter_scope(Combinator::Union);
        ctx.enter_scope(Combinator::Union);
        ctx.abort_scope(outer).unwrap();
        assert_eq!(ctx.depth(), 0);
        assert_eq!(ctx.object().to_string(), "a");
    }

    #[test]
    fn test_guard_drop_aborts() {
        let mut ctx = context();
        ctx.merge(named("a")).unwrap();
        {
            let mut guard = ctx.scope(Combinator::Union);
            guard.merge(named("b")).unwrap();
        }
        assert_eq!(ctx.depth(), 0);
        assert_eq!(ctx.object().to_string(), "a");
    }

    #[test]
    fn test_error_in_body_propagates_through_all_scopes() {
        let mut ctx = context();
        ctx.merge(named("a")).unwrap();
        let result: Result<()> = ctx.with_scope(Combinator::Union, |ctx| {
            ctx.merge(named("b"))?;
            ctx.with_scope(Combinator::Difference, |ctx| {
                ctx.merge(named("c"))?;
                ctx.merge(named("!d"))
            })
        });
        assert!(matches!(result, Err(CsgError::Kernel(KernelError::Boolean(_)))));
        assert_eq!(ctx.depth(), 0);
        assert_eq!(ctx.object().to_string(), "a");
    }

    #[test]
    fn test_with_scope_returns_body_value() {
        let mut ctx = context();
        let depth = ctx
            .with_scope(Combinator::Union, |ctx| {
                ctx.merge(named("a"))?;
                Ok(ctx.depth())
            })
            .unwrap();
        assert_eq!(depth, 1);
        assert_eq!(ctx.object().to_string(), "a");
    }

    #[test]
    fn test_unclosed_scopes_reported() {
        let mut ctx = context();
        ctx.enter_scope(Combinator::Union);
        ctx.enter_scope(Combinator::Union);
        assert!(matches!(ctx.result(), Err(CsgError::UnclosedScopes { open: 2 })));
    }
}
