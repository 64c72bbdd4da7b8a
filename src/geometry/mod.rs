// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - polygon solids, profiles, meshes and the reference kernel

mod bbox;
pub mod csg;
mod fillet;
mod mesh;
mod mesh_kernel;
pub mod primitives;
mod profile;
mod solid;
mod sweep;
pub mod topology;

pub use bbox::BoundingBox;
pub use mesh::{Mesh, Triangle, Vertex};
pub use mesh_kernel::MeshKernel;
pub use profile::{Edge, EdgeAdjacency, Face, Wire};
pub use solid::Solid;
