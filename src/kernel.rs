// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry kernel adapter.
//!
//! The composition engine never looks inside a solid: everything it needs
//! from geometry goes through this trait. Booleans return new values and leave
//! their operands alone, while transforms and edge treatments mutate the solid
//! they are given. Any failure is reported as a [`KernelError`] and propagated
//! unchanged by the engine.

use crate::error::KernelResult;
use crate::geometry::{BoundingBox, Mesh};
use nalgebra::{Matrix4, Point3, Vector3};
use std::fmt::Debug;
use std::path::Path;

/// Planar profile accepted by sweeps
#[derive(Debug, Clone)]
pub enum Profile<E, W, F> {
    Edge(E),
    Wire(W),
    Face(F),
}

/// Profile type of a particular kernel
pub type KernelProfile<K> =
    Profile<<K as Kernel>::Edge, <K as Kernel>::Wire, <K as Kernel>::Face>;

pub trait Kernel: Sized {
    type Solid: Clone + Debug;
    type Edge: Clone + Debug;
    type Wire: Clone + Debug;
    type Face: Clone + Debug;

    /// The "nothing built yet" solid that seeds every scope
    fn null_solid(&self) -> Self::Solid;
    fn is_null(&self, solid: &Self::Solid) -> bool;

    // Primitives

    fn create_box(&self, p1: Point3<f64>, p2: Point3<f64>) -> KernelResult<Self::Solid>;
    fn create_cylinder(
        &self,
        p1: Point3<f64>,
        p2: Point3<f64>,
        radius: f64,
    ) -> KernelResult<Self::Solid>;
    fn create_cone(
        &self,
        p1: Point3<f64>,
        p2: Point3<f64>,
        radius1: f64,
        radius2: f64,
    ) -> KernelResult<Self::Solid>;
    fn create_torus(
        &self,
        p1: Point3<f64>,
        p2: Point3<f64>,
        ring_radius: f64,
        radius: f64,
    ) -> KernelResult<Self::Solid>;
    fn create_text(
        &self,
        height: f64,
        depth: f64,
        text: &str,
        font: Option<&Path>,
    ) -> KernelResult<Self::Solid>;

    // Profiles

    fn create_line(&self, start: Point3<f64>, end: Point3<f64>) -> KernelResult<Self::Edge>;
    /// Arc from `start` to `end` around `center`
    fn create_arc(
        &self,
        start: Point3<f64>,
        end: Point3<f64>,
        center: Point3<f64>,
    ) -> KernelResult<Self::Edge>;
    fn create_circle(
        &self,
        center: Point3<f64>,
        normal: Vector3<f64>,
        radius: f64,
    ) -> KernelResult<Self::Edge>;
    fn create_wire(&self, edges: &[Self::Edge]) -> KernelResult<Self::Wire>;
    fn create_face(&self, wire: &Self::Wire) -> KernelResult<Self::Face>;

    // Sweeps

    /// Extrude a closed profile along the vector `p2 - p1`
    fn extrude(
        &self,
        profile: &KernelProfile<Self>,
        p1: Point3<f64>,
        p2: Point3<f64>,
    ) -> KernelResult<Self::Solid>;
    /// Revolve a face by `angle` radians around the axis through `p1` and `p2`
    fn revolve(
        &self,
        face: &Self::Face,
        p1: Point3<f64>,
        p2: Point3<f64>,
        angle: f64,
    ) -> KernelResult<Self::Solid>;
    fn loft(
        &self,
        profiles: &[KernelProfile<Self>],
        ruled: bool,
        tolerance: f64,
    ) -> KernelResult<Self::Solid>;
    fn pipe(&self, face: &Self::Face, path: &Self::Wire) -> KernelResult<Self::Solid>;

    // Booleans

    fn fuse(&self, a: &Self::Solid, b: &Self::Solid) -> KernelResult<Self::Solid>;
    fn cut(&self, a: &Self::Solid, b: &Self::Solid) -> KernelResult<Self::Solid>;
    fn common(&self, a: &Self::Solid, b: &Self::Solid) -> KernelResult<Self::Solid>;

    // In-place modifications

    /// Rotate by `angle` radians around `axis` through `center`
    fn rotate(
        &self,
        solid: &mut Self::Solid,
        angle: f64,
        axis: Vector3<f64>,
        center: Point3<f64>,
    ) -> KernelResult<()>;
    fn translate(&self, solid: &mut Self::Solid, delta: Vector3<f64>) -> KernelResult<()>;
    fn transform(&self, solid: &mut Self::Solid, matrix: &Matrix4<f64>) -> KernelResult<()>;
    fn scale(&self, solid: &mut Self::Solid, center: Point3<f64>, factor: f64)
        -> KernelResult<()>;
    /// Reflect in the plane through `origin` with the given normal
    fn mirror(
        &self,
        solid: &mut Self::Solid,
        origin: Point3<f64>,
        normal: Vector3<f64>,
    ) -> KernelResult<()>;
    fn fillet(
        &self,
        solid: &mut Self::Solid,
        radius: f64,
        edges: &[Self::Edge],
    ) -> KernelResult<()>;
    fn chamfer(
        &self,
        solid: &mut Self::Solid,
        distance: f64,
        edges: &[Self::Edge],
    ) -> KernelResult<()>;

    // Meshing and inquiries

    fn create_mesh(&self, solid: &Self::Solid, tolerance: f64) -> KernelResult<Mesh>;
    fn edges(&self, solid: &Self::Solid) -> KernelResult<Vec<Self::Edge>>;
    fn faces(&self, solid: &Self::Solid) -> KernelResult<Vec<Self::Face>>;
    fn vertices(&self, solid: &Self::Solid) -> KernelResult<Vec<Point3<f64>>>;
    fn wires(&self, solid: &Self::Solid) -> KernelResult<Vec<Self::Wire>>;
    fn bounding_box(&self, solid: &Self::Solid) -> KernelResult<BoundingBox>;
    fn centre_of_mass(&self, solid: &Self::Solid) -> KernelResult<Point3<f64>>;
    fn volume(&self, solid: &Self::Solid) -> KernelResult<f64>;
}
