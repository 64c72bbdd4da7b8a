// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types shared by the kernel adapter and the composition engine

use crate::engine::ScopeId;
use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a geometry kernel.
#[derive(Debug, Error)]
pub enum KernelError {
    /// Malformed primitive or operation parameters
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Geometry collapsed to something without volume or area
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    /// An operation that needs real geometry was given the null solid
    #[error("{0} requires a non-null solid")]
    NullSolid(&'static str),

    /// Boolean operation could not produce a result
    #[error("boolean operation failed: {0}")]
    Boolean(String),

    /// The kernel does not implement the requested capability
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Kernel specific failure
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl KernelError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::Degenerate(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }
}

/// Result type for kernel calls
pub type KernelResult<T> = std::result::Result<T, KernelError>;

/// Errors raised by the composition engine.
#[derive(Debug, Error)]
pub enum CsgError {
    /// An absent or null value was submitted as a contribution
    #[error("invalid contribution: a non-null solid is required")]
    InvalidContribution,

    /// A scope handle was closed while it was not the innermost open scope
    #[error("scope {scope} closed out of order (innermost open scope: {})", .innermost.map(|id| id.to_string()).unwrap_or_else(|| "none".into()))]
    ScopeOrderViolation {
        scope: ScopeId,
        innermost: Option<ScopeId>,
    },

    /// The root result was requested while scopes were still open
    #[error("{open} scope(s) still open")]
    UnclosedScopes { open: usize },

    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CsgError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CsgError>;
