// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe CSG
//!
//! Scripted constructive solid geometry. Solids are composed on a stack of
//! combinator scopes (union, intersection, difference), each scope merging
//! into its parent as a single contribution once it closes. Models are written
//! as `.poc` scripts or driven directly through [`Context`], and exported as
//! binary STL.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod io;
pub mod kernel;
pub mod script;

pub use config::{EngineConfig, ExportConfig, KernelConfig};
pub use engine::{Combinator, Context, EdgeSelection, ScopeGuard, ScopeHandle, ScopeId};
pub use error::{CsgError, KernelError};
pub use geometry::{BoundingBox, Mesh, MeshKernel};
pub use kernel::{Kernel, Profile};
pub use script::{parse_script, Interpreter, ScriptError};

use anyhow::{Context as _, Result};
use std::path::Path;

/// Run a script and mesh the resulting model with default settings
pub fn render(source: &str) -> Result<Mesh> {
    render_with(source, &EngineConfig::default())
}

/// Run a script and mesh the resulting model
pub fn render_with(source: &str, config: &EngineConfig) -> Result<Mesh> {
    let mut ctx = Context::new(MeshKernel::new(config.kernel));
    script::run(source, &mut ctx)?;
    let model = ctx.result()?;
    let mesh = ctx
        .kernel()
        .create_mesh(model, config.export.tolerance)
        .context("script produced no solid")?;
    Ok(mesh)
}

/// Render a script file
pub fn render_file(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    render(&source).with_context(|| format!("failed to render {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_box() {
        let mesh = render("box([0, 0, 0], [10, 10, 10]);").unwrap();
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn test_render_empty_script_fails() {
        let err = render("// nothing here").unwrap_err();
        assert!(err.to_string().contains("no solid"));
    }
}
