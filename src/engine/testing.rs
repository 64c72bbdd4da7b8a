// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel double that records operations as expressions, for engine tests

use crate::error::{KernelError, KernelResult};
use crate::geometry::{BoundingBox, Mesh};
use crate::kernel::{Kernel, KernelProfile, Profile};
use nalgebra::{Matrix4, Point3, Vector3};
use std::fmt;
use std::path::Path;

/// Symbolic solid: the expression that built it.
/// Names containing `!` make any boolean involving them fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Sym {
    Null,
    Expr(String),
}

impl fmt::Display for Sym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sym::Null => write!(f, "null"),
            Sym::Expr(expr) => write!(f, "{expr}"),
        }
    }
}

pub fn named(name: &str) -> Sym {
    Sym::Expr(name.to_string())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolicKernel;

impl SymbolicKernel {
    fn expr<'a>(&self, solid: &'a Sym, operation: &'static str) -> KernelResult<&'a str> {
        match solid {
            Sym::Null => Err(KernelError::NullSolid(operation)),
            Sym::Expr(expr) => Ok(expr),
        }
    }

    fn boolean(&self, name: &'static str, a: &Sym, b: &Sym) -> KernelResult<Sym> {
        let (a, b) = (self.expr(a, name)?, self.expr(b, name)?);
        if a.contains('!') || b.contains('!') {
            return Err(KernelError::Boolean(format!("{name} refused {a} and {b}")));
        }
        Ok(Sym::Expr(format!("{name}({a}, {b})")))
    }

    fn wrap(&self, solid: &mut Sym, name: &'static str, args: &str) -> KernelResult<()> {
        let inner = self.expr(solid, name)?;
        *solid = Sym::Expr(if args.is_empty() {
            format!("{name}({inner})")
        } else {
            format!("{name}({inner}, {args})")
        });
        Ok(())
    }

    fn profile_name(profile: &KernelProfile<Self>) -> &str {
        match profile {
            Profile::Edge(name) | Profile::Wire(name) | Profile::Face(name) => name,
        }
    }
}

impl Kernel for SymbolicKernel {
    type Solid = Sym;
    type Edge = String;
    type Wire = String;
    type Face = String;

    fn null_solid(&self) -> Sym {
        Sym::Null
    }

    fn is_null(&self, solid: &Sym) -> bool {
        *solid == Sym::Null
    }

    fn create_box(&self, _p1: Point3<f64>, _p2: Point3<f64>) -> KernelResult<Sym> {
        Ok(named("box"))
    }

    fn create_cylinder(&self, _p1: Point3<f64>, _p2: Point3<f64>, radius: f64) -> KernelResult<Sym> {
        if radius <= 0.0 {
            return Err(KernelError::invalid("radius"));
        }
        Ok(named("cylinder"))
    }

    fn create_cone(&self, _p1: Point3<f64>, _p2: Point3<f64>, _r1: f64, _r2: f64) -> KernelResult<Sym> {
        Ok(named("cone"))
    }

    fn create_torus(&self, _p1: Point3<f64>, _p2: Point3<f64>, _r1: f64, _r2: f64) -> KernelResult<Sym> {
        Ok(named("torus"))
    }

    fn create_text(&self, _h: f64, _d: f64, text: &str, _font: Option<&Path>) -> KernelResult<Sym> {
        Ok(Sym::Expr(format!("text({text})")))
    }

    fn create_line(&self, _start: Point3<f64>, _end: Point3<f64>) -> KernelResult<String> {
        Ok("line".into())
    }

    fn create_arc(&self, _s: Point3<f64>, _e: Point3<f64>, _c: Point3<f64>) -> KernelResult<String> {
        Ok("arc".into())
    }

    fn create_circle(&self, _c: Point3<f64>, _n: Vector3<f64>, _r: f64) -> KernelResult<String> {
        Ok("circle".into())
    }

    fn create_wire(&self, edges: &[String]) -> KernelResult<String> {
        Ok(format!("wire({})", edges.join(", ")))
    }

    fn create_face(&self, wire: &String) -> KernelResult<String> {
        Ok(format!("face({wire})"))
    }

    fn extrude(&self, profile: &KernelProfile<Self>, _p1: Point3<f64>, _p2: Point3<f64>) -> KernelResult<Sym> {
        Ok(Sym::Expr(format!("extrude({})", Self::profile_name(profile))))
    }

    fn revolve(&self, face: &String, _p1: Point3<f64>, _p2: Point3<f64>, angle: f64) -> KernelResult<Sym> {
        if angle <= 0.0 {
            return Err(KernelError::invalid("angle"));
        }
        Ok(Sym::Expr(format!("revolve({face})")))
    }

    fn loft(&self, profiles: &[KernelProfile<Self>], _ruled: bool, _tolerance: f64) -> KernelResult<Sym> {
        let names: Vec<&str> = profiles.iter().map(Self::profile_name).collect();
        Ok(Sym::Expr(format!("loft({})", names.join(", "))))
    }

    fn pipe(&self, face: &String, path: &String) -> KernelResult<Sym> {
        Ok(Sym::Expr(format!("pipe({face}, {path})")))
    }

    fn fuse(&self, a: &Sym, b: &Sym) -> KernelResult<Sym> {
        self.boolean("fuse", a, b)
    }

    fn cut(&self, a: &Sym, b: &Sym) -> KernelResult<Sym> {
        self.boolean("cut", a, b)
    }

    fn common(&self, a: &Sym, b: &Sym) -> KernelResult<Sym> {
        self.boolean("common", a, b)
    }

    fn rotate(&self, solid: &mut Sym, _angle: f64, _axis: Vector3<f64>, _center: Point3<f64>) -> KernelResult<()> {
        self.wrap(solid, "rotate", "")
    }

    fn translate(&self, solid: &mut Sym, _delta: Vector3<f64>) -> KernelResult<()> {
        self.wrap(solid, "translate", "")
    }

    fn transform(&self, solid: &mut Sym, _matrix: &Matrix4<f64>) -> KernelResult<()> {
        self.wrap(solid, "transform", "")
    }

    fn scale(&self, solid: &mut Sym, _center: Point3<f64>, factor: f64) -> KernelResult<()> {
        if factor <= 0.0 {
            return Err(KernelError::invalid("factor"));
        }
        self.wrap(solid, "scale", "")
    }

    fn mirror(&self, solid: &mut Sym, _origin: Point3<f64>, _normal: Vector3<f64>) -> KernelResult<()> {
        self.wrap(solid, "mirror", "")
    }

    fn fillet(&self, solid: &mut Sym, radius: f64, edges: &[String]) -> KernelResult<()> {
        if radius <= 0.0 {
            return Err(KernelError::invalid("fillet radius"));
        }
        self.wrap(solid, "fillet", &format!("[{}]", edges.join(" ")))
    }

    fn chamfer(&self, solid: &mut Sym, distance: f64, edges: &[String]) -> KernelResult<()> {
        if distance <= 0.0 {
            return Err(KernelError::invalid("chamfer distance"));
        }
        self.wrap(solid, "chamfer", &format!("[{}]", edges.join(" ")))
    }

    fn create_mesh(&self, solid: &Sym, _tolerance: f64) -> KernelResult<Mesh> {
        self.expr(solid, "mesh")?;
        Ok(Mesh::new())
    }

    fn edges(&self, solid: &Sym) -> KernelResult<Vec<String>> {
        self.expr(solid, "edges")?;
        Ok((0..4).map(|i| format!("e{i}")).collect())
    }

    fn faces(&self, solid: &Sym) -> KernelResult<Vec<String>> {
        self.expr(solid, "faces")?;
        Ok(vec!["f0".into()])
    }

    fn vertices(&self, solid: &Sym) -> KernelResult<Vec<Point3<f64>>> {
        self.expr(solid, "vertices")?;
        Ok(vec![Point3::origin()])
    }

    fn wires(&self, solid: &Sym) -> KernelResult<Vec<String>> {
        self.expr(solid, "wires")?;
        Ok(vec!["w0".into()])
    }

    fn bounding_box(&self, solid: &Sym) -> KernelResult<BoundingBox> {
        self.expr(solid, "bounding box")?;
        Ok(BoundingBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)))
    }

    fn centre_of_mass(&self, solid: &Sym) -> KernelResult<Point3<f64>> {
        self.expr(solid, "centre of mass")?;
        Ok(Point3::new(0.5, 0.5, 0.5))
    }

    fn volume(&self, solid: &Sym) -> KernelResult<f64> {
        self.expr(solid, "volume")?;
        Ok(1.0)
    }
}
