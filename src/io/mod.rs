// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - mesh export

mod stl;

pub use stl::{
    export, save_stl, write_stl, ExportSource, DEFAULT_TOLERANCE, HEADER_LEN, TRIANGLE_LEN,
};
