// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Primitive, postfix, group and inquiry operations on a context

use super::combinator::Combinator;
use super::context::Context;
use super::selection::EdgeSelection;
use crate::error::Result;
use crate::geometry::BoundingBox;
use crate::kernel::{Kernel, KernelProfile};
use nalgebra::{Matrix4, Point3, Vector3};
use std::f64::consts::PI;
use std::path::Path;

/// Primitives: each builds one solid and merges it
impl<K: Kernel> Context<K> {
    pub fn box_(&mut self, p1: Point3<f64>, p2: Point3<f64>) -> Result<()> {
        let solid = self.kernel.create_box(p1, p2)?;
        self.merge(solid)
    }

    pub fn cylinder(&mut self, p1: Point3<f64>, p2: Point3<f64>, radius: f64) -> Result<()> {
        let solid = self.kernel.create_cylinder(p1, p2, radius)?;
        self.merge(solid)
    }

    pub fn cone(&mut self, p1: Point3<f64>, p2: Point3<f64>, radius1: f64, radius2: f64) -> Result<()> {
        let solid = self.kernel.create_cone(p1, p2, radius1, radius2)?;
        self.merge(solid)
    }

    /// Sphere built from a revolved quarter disc and its mirror image.
    /// Only the finished sphere touches the context.
    pub fn sphere(&mut self, center: Point3<f64>, radius: f64) -> Result<()> {
        let k = &self.kernel;
        let origin = Point3::origin();
        let x = Point3::new(1.0, 0.0, 0.0);
        let y = Point3::new(0.0, 1.0, 0.0);

        let edges = [
            k.create_arc(x, y, origin)?,
            k.create_line(y, origin)?,
            k.create_line(origin, x)?,
        ];
        let face = k.create_face(&k.create_wire(&edges)?)?;
        let half = k.revolve(&face, origin, x, 2.0 * PI)?;
        let mut other_half = half.clone();
        k.mirror(&mut other_half, origin, Vector3::x())?;
        let mut sphere = k.fuse(&half, &other_half)?;
        k.scale(&mut sphere, origin, radius)?;
        k.translate(&mut sphere, center.coords)?;

        self.merge(sphere)
    }

    pub fn torus(
        &mut self,
        p1: Point3<f64>,
        p2: Point3<f64>,
        ring_radius: f64,
        radius: f64,
    ) -> Result<()> {
        let solid = self.kernel.create_torus(p1, p2, ring_radius, radius)?;
        self.merge(solid)
    }

    pub fn text(&mut self, height: f64, depth: f64, text: &str, font: Option<&Path>) -> Result<()> {
        let solid = self.kernel.create_text(height, depth, text, font)?;
        self.merge(solid)
    }

    pub fn extrude(&mut self, profile: &KernelProfile<K>, p1: Point3<f64>, p2: Point3<f64>) -> Result<()> {
        let solid = self.kernel.extrude(profile, p1, p2)?;
        self.merge(solid)
    }

    pub fn revolve(
        &mut self,
        face: &K::Face,
        p1: Point3<f64>,
        p2: Point3<f64>,
        angle: f64,
    ) -> Result<()> {
        let solid = self.kernel.revolve(face, p1, p2, angle)?;
        self.merge(solid)
    }

    pub fn loft(&mut self, profiles: &[KernelProfile<K>], ruled: bool, tolerance: f64) -> Result<()> {
        let solid = self.kernel.loft(profiles, ruled, tolerance)?;
        self.merge(solid)
    }

    pub fn pipe(&mut self, face: &K::Face, path: &K::Wire) -> Result<()> {
        let solid = self.kernel.pipe(face, path)?;
        self.merge(solid)
    }
}

/// Postfix operations: modify the current accumulator in place
impl<K: Kernel> Context<K> {
    pub fn rotate(&mut self, angle: f64, axis: Vector3<f64>, center: Point3<f64>) -> Result<()> {
        self.kernel
            .rotate(&mut self.frame.accumulator, angle, axis, center)?;
        Ok(())
    }

    pub fn translate(&mut self, delta: Vector3<f64>) -> Result<()> {
        self.kernel.translate(&mut self.frame.accumulator, delta)?;
        Ok(())
    }

    pub fn transform(&mut self, matrix: &Matrix4<f64>) -> Result<()> {
        self.kernel.transform(&mut self.frame.accumulator, matrix)?;
        Ok(())
    }

    pub fn fillet<'a>(&mut self, radius: f64, selection: impl Into<EdgeSelection<'a, K::Edge>>) -> Result<()>
    where
        K::Edge: 'a,
    {
        let edges = self.select_edges(selection.into())?;
        self.kernel
            .fillet(&mut self.frame.accumulator, radius, &edges)?;
        Ok(())
    }

    pub fn chamfer<'a>(&mut self, distance: f64, selection: impl Into<EdgeSelection<'a, K::Edge>>) -> Result<()>
    where
        K::Edge: 'a,
    {
        let edges = self.select_edges(selection.into())?;
        self.kernel
            .chamfer(&mut self.frame.accumulator, distance, &edges)?;
        Ok(())
    }

    fn select_edges(&self, selection: EdgeSelection<'_, K::Edge>) -> Result<Vec<K::Edge>> {
        Ok(selection.resolve(|| self.kernel.edges(&self.frame.accumulator))?)
    }
}

/// Group operations: run `body` in a nested scope merged as one contribution
impl<K: Kernel> Context<K> {
    pub fn union<T>(&mut self, body: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.with_scope(Combinator::Union, body)
    }

    pub fn intersection<T>(&mut self, body: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.with_scope(Combinator::Intersection, body)
    }

    pub fn difference<T>(&mut self, body: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.with_scope(Combinator::Difference, body)
    }

    /// Fuse the contents of `body`, then apply `finish` to the fused result
    pub fn op<T>(
        &mut self,
        finish: impl FnOnce(&mut Self) -> Result<()>,
        body: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.with_scope_finishing(Combinator::Union, body, finish)
    }

    pub fn rotated<T>(
        &mut self,
        angle: f64,
        axis: Vector3<f64>,
        center: Point3<f64>,
        body: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.op(move |ctx| ctx.rotate(angle, axis, center), body)
    }

    pub fn translated<T>(
        &mut self,
        delta: Vector3<f64>,
        body: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.op(move |ctx| ctx.translate(delta), body)
    }

    pub fn transformed<T>(
        &mut self,
        matrix: Matrix4<f64>,
        body: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.op(move |ctx| ctx.transform(&matrix), body)
    }

    pub fn filleted<'a, T>(
        &mut self,
        radius: f64,
        selection: impl Into<EdgeSelection<'a, K::Edge>>,
        body: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T>
    where
        K::Edge: 'a,
    {
        let selection = selection.into();
        self.op(move |ctx| ctx.fillet(radius, selection), body)
    }

    pub fn chamfered<'a, T>(
        &mut self,
        distance: f64,
        selection: impl Into<EdgeSelection<'a, K::Edge>>,
        body: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T>
    where
        K::Edge: 'a,
    {
        let selection = selection.into();
        self.op(move |ctx| ctx.chamfer(distance, selection), body)
    }
}

/// Inquiries about the current accumulator
impl<K: Kernel> Context<K> {
    pub fn bbox(&self) -> Result<BoundingBox> {
        Ok(self.kernel.bounding_box(&self.frame.accumulator)?)
    }

    pub fn centre_of_mass(&self) -> Result<Point3<f64>> {
        Ok(self.kernel.centre_of_mass(&self.frame.accumulator)?)
    }

    pub fn center_of_mass(&self) -> Result<Point3<f64>> {
        self.centre_of_mass()
    }

    pub fn volume(&self) -> Result<f64> {
        Ok(self.kernel.volume(&self.frame.accumulator)?)
    }

    pub fn edges(&self) -> Result<Vec<K::Edge>> {
        Ok(self.kernel.edges(&self.frame.accumulator)?)
    }

    pub fn faces(&self) -> Result<Vec<K::Face>> {
        Ok(self.kernel.faces(&self.frame.accumulator)?)
    }

    pub fn vertices(&self) -> Result<Vec<Point3<f64>>> {
        Ok(self.kernel.vertices(&self.frame.accumulator)?)
    }

    pub fn wires(&self) -> Result<Vec<K::Wire>> {
        Ok(self.kernel.wires(&self.frame.accumulator)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{named, SymbolicKernel};
    use crate::error::CsgError;

    fn context() -> Context<SymbolicKernel> {
        Context::new(SymbolicKernel)
    }

    fn origin() -> Point3<f64> {
        Point3::origin()
    }

    #[test]
    fn test_postfix_does_not_advance_combinator() {
        let mut ctx = context();
        ctx.box_(origin(), Point3::new(1.0, 1.0, 1.0)).unwrap();
        let state = ctx.combinator_state();
        ctx.rotate(1.0, Vector3::z(), origin()).unwrap();
        ctx.translate(Vector3::x()).unwrap();
        assert_eq!(ctx.combinator_state(), state);
        assert_eq!(ctx.object().to_string(), "translate(rotate(box))");
    }

    #[test]
    fn test_postfix_on_empty_accumulator_fails() {
        let mut ctx = context();
        assert!(matches!(
            ctx.rotate(1.0, Vector3::z(), origin()),
            Err(CsgError::Kernel(_))
        ));
    }

    #[test]
    fn test_fillet_selection_forms() {
        let mut ctx = context();
        ctx.merge(named("a")).unwrap();
        ctx.fillet(0.1, EdgeSelection::All).unwrap();
        assert_eq!(ctx.object().to_string(), "fillet(a, [e0 e1 e2 e3])");

        let mut ctx = context();
        ctx.merge(named("a")).unwrap();
        ctx.chamfer(0.1, EdgeSelection::matching(|e: &String| e.ends_with('1') || e.ends_with('3')))
            .unwrap();
        assert_eq!(ctx.object().to_string(), "chamfer(a, [e1 e3])");

        let mut ctx = context();
        ctx.merge(named("a")).unwrap();
        ctx.fillet(0.1, vec!["x".to_string()]).unwrap();
        assert_eq!(ctx.object().to_string(), "fillet(a, [x])");
    }

    #[test]
    fn test_group_operations_nest() {
        let mut ctx = context();
        ctx.merge(named("a")).unwrap();
        ctx.difference(|ctx| {
            ctx.merge(named("b"))?;
            ctx.intersection(|ctx| {
                ctx.merge(named("c"))?;
                ctx.merge(named("d"))
            })
        })
        .unwrap();
        assert_eq!(ctx.object().to_string(), "fuse(a, cut(b, common(c, d)))");
    }

    #[test]
    fn test_op_applies_finisher_to_group() {
        let mut ctx = context();
        ctx.merge(named("a")).unwrap();
        ctx.rotated(1.0, Vector3::z(), origin(), |ctx| {
            ctx.merge(named("b"))?;
            ctx.merge(named("c"))
        })
        .unwrap();
        assert_eq!(ctx.object().to_string(), "fuse(a, rotate(fuse(b, c)))");
    }

    #[test]
    fn test_failing_finisher_leaves_parent() {
        let mut ctx = context();
        ctx.merge(named("a")).unwrap();
        let result = ctx.filleted(-1.0, EdgeSelection::All, |ctx| ctx.merge(named("b")));
        assert!(result.is_err());
        assert_eq!(ctx.depth(), 0);
        assert_eq!(ctx.object().to_string(), "a");
    }

    #[test]
    fn test_sphere_merges_once() {
        let mut ctx = Context::with_combinator(SymbolicKernel, Combinator::Difference);
        ctx.merge(named("a")).unwrap();
        ctx.sphere(Point3::new(1.0, 2.0, 3.0), 2.0).unwrap();
        assert_eq!(
            ctx.object().to_string(),
            "cut(a, translate(scale(fuse(revolve(face(wire(arc, line, line))), mirror(revolve(face(wire(arc, line, line))))))))"
        );
    }

    #[test]
    fn test_failed_sphere_leaks_nothing() {
        let mut ctx = context();
        ctx.merge(named("a")).unwrap();
        let state = ctx.combinator_state();
        assert!(ctx.sphere(origin(), -1.0).is_err());
        assert_eq!(ctx.object().to_string(), "a");
        assert_eq!(ctx.combinator_state(), state);
    }

    #[test]
    fn test_inquiries_on_empty_context_fail() {
        let ctx = context();
        assert!(ctx.bbox().is_err());
        assert!(ctx.volume().is_err());
    }
}
