// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polygonal reference implementation of the kernel adapter

use super::profile::{Edge, Face, Wire};
use super::{fillet, primitives, sweep, topology, BoundingBox, Mesh, Solid};
use crate::config::KernelConfig;
use crate::error::{KernelError, KernelResult};
use crate::kernel::{Kernel, KernelProfile, Profile};
use nalgebra::{Matrix4, Point3, Rotation3, Translation3, Unit, Vector3};
use std::path::Path;
use tracing::trace;

/// Kernel working on planar polygon solids with BSP booleans
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshKernel {
    config: KernelConfig,
}

impl MeshKernel {
    pub fn new(config: KernelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    fn profile_loop<'a>(&self, profile: &'a KernelProfile<Self>) -> KernelResult<&'a [Point3<f64>]> {
        match profile {
            Profile::Face(face) => face.outline(),
            Profile::Wire(wire) if wire.is_closed() => Ok(wire.points()),
            Profile::Edge(edge) if edge.is_closed() => Ok(edge.points()),
            _ => Err(KernelError::invalid("profile must be closed")),
        }
    }
}

impl Kernel for MeshKernel {
    type Solid = Solid;
    type Edge = Edge;
    type Wire = Wire;
    type Face = Face;

    fn null_solid(&self) -> Solid {
        Solid::null()
    }

    fn is_null(&self, solid: &Solid) -> bool {
        solid.is_null()
    }

    fn create_box(&self, p1: Point3<f64>, p2: Point3<f64>) -> KernelResult<Solid> {
        primitives::cuboid(p1, p2)
    }

    fn create_cylinder(&self, p1: Point3<f64>, p2: Point3<f64>, radius: f64) -> KernelResult<Solid> {
        if radius <= 0.0 {
            return Err(KernelError::invalid(format!(
                "cylinder radius {radius} must be positive"
            )));
        }
        primitives::frustum(p1, p2, radius, radius, self.config.segments)
    }

    fn create_cone(
        &self,
        p1: Point3<f64>,
        p2: Point3<f64>,
        radius1: f64,
        radius2: f64,
    ) -> KernelResult<Solid> {
        primitives::frustum(p1, p2, radius1, radius2, self.config.segments)
    }

    fn create_torus(
        &self,
        p1: Point3<f64>,
        p2: Point3<f64>,
        ring_radius: f64,
        radius: f64,
    ) -> KernelResult<Solid> {
        primitives::torus(p1, p2, ring_radius, radius, self.config.segments)
    }

    fn create_text(
        &self,
        _height: f64,
        _depth: f64,
        text: &str,
        _font: Option<&Path>,
    ) -> KernelResult<Solid> {
        Err(KernelError::unsupported(format!(
            "text solids need a font outline backend (text {text:?})"
        )))
    }

    fn create_line(&self, start: Point3<f64>, end: Point3<f64>) -> KernelResult<Edge> {
        Edge::line(start, end)
    }

    fn create_arc(
        &self,
        start: Point3<f64>,
        end: Point3<f64>,
        center: Point3<f64>,
    ) -> KernelResult<Edge> {
        Edge::arc(start, end, center, self.config.segments)
    }

    fn create_circle(
        &self,
        center: Point3<f64>,
        normal: Vector3<f64>,
        radius: f64,
    ) -> KernelResult<Edge> {
        Edge::circle(center, normal, radius, self.config.segments)
    }

    fn create_wire(&self, edges: &[Edge]) -> KernelResult<Wire> {
        Wire::from_edges(edges)
    }

    fn create_face(&self, wire: &Wire) -> KernelResult<Face> {
        Face::from_wire(wire)
    }

    fn extrude(
        &self,
        profile: &KernelProfile<Self>,
        p1: Point3<f64>,
        p2: Point3<f64>,
    ) -> KernelResult<Solid> {
        sweep::extrude_loop(self.profile_loop(profile)?, p2 - p1)
    }

    fn revolve(
        &self,
        face: &Face,
        p1: Point3<f64>,
        p2: Point3<f64>,
        angle: f64,
    ) -> KernelResult<Solid> {
        sweep::revolve_face(face, p1, p2, angle, self.config.segments)
    }

    fn loft(
        &self,
        profiles: &[KernelProfile<Self>],
        ruled: bool,
        tolerance: f64,
    ) -> KernelResult<Solid> {
        let loops = profiles
            .iter()
            .map(|profile| self.profile_loop(profile).map(<[_]>::to_vec))
            .collect::<KernelResult<Vec<_>>>()?;
        sweep::loft_loops(&loops, ruled, tolerance)
    }

    fn pipe(&self, face: &Face, path: &Wire) -> KernelResult<Solid> {
        sweep::pipe_face(face, path)
    }

    fn fuse(&self, a: &Solid, b: &Solid) -> KernelResult<Solid> {
        trace!(left = a.polygons().len(), right = b.polygons().len(), "fuse");
        a.union(b)
    }

    fn cut(&self, a: &Solid, b: &Solid) -> KernelResult<Solid> {
        trace!(left = a.polygons().len(), right = b.polygons().len(), "cut");
        a.difference(b)
    }

    fn common(&self, a: &Solid, b: &Solid) -> KernelResult<Solid> {
        trace!(left = a.polygons().len(), right = b.polygons().len(), "common");
        a.intersection(b)
    }

    fn rotate(
        &self,
        solid: &mut Solid,
        angle: f64,
        axis: Vector3<f64>,
        center: Point3<f64>,
    ) -> KernelResult<()> {
        let axis = Unit::try_new(axis, 1e-12)
            .ok_or_else(|| KernelError::invalid("rotation axis has zero length"))?;
        let rotation = Rotation3::from_axis_angle(&axis, angle).to_homogeneous();
        let matrix = Translation3::from(center.coords).to_homogeneous()
            * rotation
            * Translation3::from(-center.coords).to_homogeneous();
        solid.transform(&matrix)
    }

    fn translate(&self, solid: &mut Solid, delta: Vector3<f64>) -> KernelResult<()> {
        solid.transform(&Matrix4::new_translation(&delta))
    }

    fn transform(&self, solid: &mut Solid, matrix: &Matrix4<f64>) -> KernelResult<()> {
        let last_row = [matrix[(3, 0)], matrix[(3, 1)], matrix[(3, 2)], matrix[(3, 3)]];
        if last_row != [0.0, 0.0, 0.0, 1.0] {
            return Err(KernelError::invalid("only affine transforms are supported"));
        }
        solid.transform(matrix)
    }

    fn scale(&self, solid: &mut Solid, center: Point3<f64>, factor: f64) -> KernelResult<()> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(KernelError::invalid(format!(
                "scale factor {factor} must be positive"
            )));
        }
        let matrix = Translation3::from(center.coords).to_homogeneous()
            * Matrix4::new_scaling(factor)
            * Translation3::from(-center.coords).to_homogeneous();
        solid.transform(&matrix)
    }

    fn mirror(
        &self,
        solid: &mut Solid,
        origin: Point3<f64>,
        normal: Vector3<f64>,
    ) -> KernelResult<()> {
        let n = normal
            .try_normalize(1e-12)
            .ok_or_else(|| KernelError::invalid("mirror normal has zero length"))?;
        // Householder reflection about the plane through `origin`
        let reflection = nalgebra::Matrix3::identity() - n * n.transpose() * 2.0;
        let mut matrix = reflection.to_homogeneous();
        let offset = origin.coords - reflection * origin.coords;
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&offset);
        solid.transform(&matrix)
    }

    fn fillet(&self, solid: &mut Solid, radius: f64, edges: &[Edge]) -> KernelResult<()> {
        *solid = fillet::fillet(solid, edges, radius, self.config.fillet_segments)?;
        Ok(())
    }

    fn chamfer(&self, solid: &mut Solid, distance: f64, edges: &[Edge]) -> KernelResult<()> {
        *solid = fillet::chamfer(solid, edges, distance)?;
        Ok(())
    }

    fn create_mesh(&self, solid: &Solid, tolerance: f64) -> KernelResult<Mesh> {
        solid.require("mesh")?;
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(KernelError::invalid(format!(
                "mesh tolerance {tolerance} must be positive"
            )));
        }
        Ok(solid.to_mesh(tolerance))
    }

    fn edges(&self, solid: &Solid) -> KernelResult<Vec<Edge>> {
        Ok(topology::edges(solid.require("edges")?, self.config.feature_angle_deg))
    }

    fn faces(&self, solid: &Solid) -> KernelResult<Vec<Face>> {
        Ok(topology::faces(solid.require("faces")?))
    }

    fn vertices(&self, solid: &Solid) -> KernelResult<Vec<Point3<f64>>> {
        Ok(topology::vertices(
            solid.require("vertices")?,
            self.config.feature_angle_deg,
        ))
    }

    fn wires(&self, solid: &Solid) -> KernelResult<Vec<Wire>> {
        Ok(topology::wires(solid.require("wires")?))
    }

    fn bounding_box(&self, solid: &Solid) -> KernelResult<BoundingBox> {
        Ok(solid.require("bounding box")?.bounding_box())
    }

    fn centre_of_mass(&self, solid: &Solid) -> KernelResult<Point3<f64>> {
        solid
            .require("centre of mass")?
            .centre_of_mass()
            .ok_or_else(|| KernelError::degenerate("solid has no volume"))
    }

    fn volume(&self, solid: &Solid) -> KernelResult<f64> {
        Ok(solid.require("volume")?.volume())
    }
}
