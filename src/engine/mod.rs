// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Composition engine: combinator stack, scopes and operations

mod combinator;
mod context;
mod ops;
mod scope;
pub mod selection;

#[cfg(test)]
pub(crate) mod testing;

pub use combinator::{Combinator, CombinatorState, Step};
pub use context::Context;
pub use scope::{ScopeGuard, ScopeHandle, ScopeId};
pub use selection::EdgeSelection;
