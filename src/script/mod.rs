// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! `.poc` modelling scripts: parser and interpreter

mod interpreter;
mod parser;
mod value;

pub use interpreter::Interpreter;
pub use parser::{parse_script, Arg, BinaryOp, Call, Expr, Program, Statement};
pub use value::{Selector, Value};

use crate::engine::Context;
use crate::error::CsgError;
use crate::geometry::MeshKernel;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    /// Source text does not match the grammar; the message carries the position
    #[error("parse error:\n{0}")]
    Parse(String),

    #[error("line {line}: {message}")]
    Runtime { line: usize, message: String },

    #[error("line {line}: {source}")]
    Csg {
        line: usize,
        #[source]
        source: CsgError,
    },
}

impl ScriptError {
    pub fn runtime(line: usize, message: impl Into<String>) -> Self {
        Self::Runtime {
            line,
            message: message.into(),
        }
    }

    pub fn csg(line: usize, source: impl Into<CsgError>) -> Self {
        Self::Csg {
            line,
            source: source.into(),
        }
    }

    /// Source line the error was raised on, if known
    pub fn line(&self) -> Option<usize> {
        match self {
            ScriptError::Parse(_) => None,
            ScriptError::Runtime { line, .. } | ScriptError::Csg { line, .. } => Some(*line),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScriptError>;

/// Parse `source` and execute it against `ctx`
pub fn run(source: &str, ctx: &mut Context<MeshKernel>) -> Result<Interpreter> {
    let program = parse_script(source)?;
    let mut interpreter = Interpreter::new();
    interpreter.run(ctx, &program)?;
    Ok(interpreter)
}
