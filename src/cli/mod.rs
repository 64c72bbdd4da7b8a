// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI subsystem: script discovery, batch rendering and reporting

pub mod reporter;
pub mod runner;

pub use reporter::Reporter;
pub use runner::{
    checksum, collect_inputs, plan_jobs, ModelInfo, RenderJob, RenderOutcome, Runner,
    SCRIPT_EXTENSION,
};
