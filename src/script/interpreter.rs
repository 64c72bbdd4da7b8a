// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Tree-walking interpreter binding script calls to context operations

use super::parser::{Call, Expr, Program, Statement};
use super::value::{Selector, Value};
use super::{Result, ScriptError};
use crate::engine::{Combinator, Context, EdgeSelection};
use crate::geometry::{BoundingBox, Edge, Face, MeshKernel, Wire};
use crate::kernel::{Kernel, Profile};
use ahash::AHashMap;
use nalgebra::{Matrix4, Point3, Rotation3, Unit, Vector3};
use std::f64::consts::{PI, TAU};
use std::path::Path;
use tracing::{debug, info};

/// Evaluated call arguments, looked up by name first and then by position
struct Args {
    function: String,
    line: usize,
    positional: Vec<Value>,
    named: AHashMap<String, Value>,
}

impl Args {
    fn error(&self, message: impl std::fmt::Display) -> ScriptError {
        ScriptError::runtime(self.line, format!("{}: {message}", self.function))
    }

    fn get(&self, index: usize, name: &str) -> Option<&Value> {
        self.named.get(name).or_else(|| self.positional.get(index))
    }

    fn value(&self, index: usize, name: &str) -> Result<&Value> {
        self.get(index, name)
            .ok_or_else(|| self.error(format_args!("missing argument '{name}'")))
    }

    fn convert<'v, T>(
        &self,
        value: &'v Value,
        name: &str,
        convert: impl FnOnce(&'v Value) -> std::result::Result<T, String>,
    ) -> Result<T> {
        convert(value).map_err(|message| self.error(format_args!("argument '{name}': {message}")))
    }

    fn number(&self, index: usize, name: &str) -> Result<f64> {
        self.convert(self.value(index, name)?, name, Value::as_number)
    }

    fn number_or(&self, index: usize, name: &str, default: f64) -> Result<f64> {
        match self.get(index, name) {
            Some(value) => self.convert(value, name, Value::as_number),
            None => Ok(default),
        }
    }

    fn bool_or(&self, index: usize, name: &str, default: bool) -> Result<bool> {
        match self.get(index, name) {
            Some(value) => self.convert(value, name, Value::as_bool),
            None => Ok(default),
        }
    }

    fn string(&self, index: usize, name: &str) -> Result<&str> {
        self.convert(self.value(index, name)?, name, Value::as_str)
    }

    fn vector(&self, index: usize, name: &str) -> Result<Vector3<f64>> {
        self.convert(self.value(index, name)?, name, Value::as_vector)
    }

    fn point(&self, index: usize, name: &str) -> Result<Point3<f64>> {
        self.convert(self.value(index, name)?, name, Value::as_point)
    }

    fn point_or(&self, index: usize, name: &str, default: Point3<f64>) -> Result<Point3<f64>> {
        match self.get(index, name) {
            Some(value) => self.convert(value, name, Value::as_point),
            None => Ok(default),
        }
    }

    fn matrix(&self, index: usize, name: &str) -> Result<Matrix4<f64>> {
        self.convert(self.value(index, name)?, name, Value::as_matrix)
    }

    fn face(&self, index: usize, name: &str) -> Result<&Face> {
        self.convert(self.value(index, name)?, name, Value::as_face)
    }

    fn profile(&self, index: usize, name: &str) -> Result<Profile<Edge, Wire, Face>> {
        self.convert(self.value(index, name)?, name, Value::as_profile)
    }

    /// Optional edge selection: a selector, a list of edges, or every edge when absent
    fn edges(&self, index: usize, name: &str) -> Result<EdgeSelection<'static, Edge>> {
        match self.get(index, name) {
            None => Ok(EdgeSelection::All),
            Some(Value::Selector(selector)) => Ok(selector.clone().into_selection()),
            Some(Value::List(items)) => items
                .iter()
                .map(|item| self.convert(item, name, Value::as_edge).cloned())
                .collect::<Result<Vec<_>>>()
                .map(EdgeSelection::Explicit),
            Some(other) => Err(self.error(format_args!(
                "argument '{name}': expected selector or edge list, found {}",
                other.type_name()
            ))),
        }
    }

    /// Same arguments without the first `count` positional values
    fn shifted(mut self, count: usize, function: &str) -> Args {
        let count = count.min(self.positional.len());
        self.positional.drain(..count);
        self.function = function.to_string();
        self
    }
}

/// Edge treatment or transformation applied to the accumulator in place
enum Postfix {
    Rotate {
        angle: f64,
        axis: Vector3<f64>,
        center: Point3<f64>,
    },
    Translate(Vector3<f64>),
    Transform(Matrix4<f64>),
    Fillet(f64, EdgeSelection<'static, Edge>),
    Chamfer(f64, EdgeSelection<'static, Edge>),
}

impl Postfix {
    fn from_args(name: &str, args: &Args) -> Result<Option<Postfix>> {
        Ok(Some(match name {
            "rotate" => Postfix::Rotate {
                angle: args.number(0, "angle")?,
                axis: args.vector(1, "axis")?,
                center: args.point_or(2, "center", Point3::origin())?,
            },
            "translate" => Postfix::Translate(args.vector(0, "delta")?),
            "transform" => Postfix::Transform(args.matrix(0, "matrix")?),
            "fillet" => Postfix::Fillet(args.number(0, "radius")?, args.edges(1, "edges")?),
            "chamfer" => Postfix::Chamfer(args.number(0, "distance")?, args.edges(1, "edges")?),
            _ => return Ok(None),
        }))
    }

    fn apply(self, ctx: &mut Context<MeshKernel>) -> crate::error::Result<()> {
        match self {
            Postfix::Rotate {
                angle,
                axis,
                center,
            } => ctx.rotate(angle, axis, center),
            Postfix::Translate(delta) => ctx.translate(delta),
            Postfix::Transform(matrix) => ctx.transform(&matrix),
            Postfix::Fillet(radius, edges) => ctx.fillet(radius, edges),
            Postfix::Chamfer(distance, edges) => ctx.chamfer(distance, edges),
        }
    }
}

/// Executes a parsed program against a context.
///
/// Variables live in one flat namespace shared by every block. Values printed
/// with `echo` are kept in order and also logged.
pub struct Interpreter {
    variables: AHashMap<String, Value>,
    output: Vec<String>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let mut variables = AHashMap::new();
        variables.insert("pi".to_string(), Value::Number(PI));
        variables.insert("tau".to_string(), Value::Number(TAU));
        Self {
            variables,
            output: Vec::new(),
        }
    }

    /// Lines printed by `echo`
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn run(&mut self, ctx: &mut Context<MeshKernel>, program: &Program) -> Result<()> {
        self.execute_all(ctx, &program.statements)
    }

    fn execute_all(&mut self, ctx: &mut Context<MeshKernel>, statements: &[Statement]) -> Result<()> {
        statements
            .iter()
            .try_for_each(|statement| self.execute(ctx, statement))
    }

    fn execute(&mut self, ctx: &mut Context<MeshKernel>, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Assign { name, value, line } => {
                let value = self.eval(ctx, value, *line)?;
                self.variables.insert(name.clone(), value);
                Ok(())
            }
            Statement::Call { call, line } => self.call_statement(ctx, call, *line),
            Statement::Block { call, body, line } => self.block(ctx, call, body, *line),
        }
    }

    fn args(&mut self, ctx: &Context<MeshKernel>, call: &Call, line: usize) -> Result<Args> {
        let mut positional = Vec::new();
        let mut named = AHashMap::new();
        for arg in &call.args {
            let value = self.eval(ctx, &arg.value, line)?;
            match &arg.name {
                Some(name) => {
                    named.insert(name.clone(), value);
                }
                None => positional.push(value),
            }
        }
        Ok(Args {
            function: call.name.clone(),
            line,
            positional,
            named,
        })
    }

    /// Primitives merge into the context, postfix operations modify it in place.
    /// Any other call is evaluated for its side effects.
    fn call_statement(&mut self, ctx: &mut Context<MeshKernel>, call: &Call, line: usize) -> Result<()> {
        let args = self.args(ctx, call, line)?;
        let csg = |e: crate::error::CsgError| ScriptError::csg(line, e);

        if let Some(postfix) = Postfix::from_args(&call.name, &args)? {
            return postfix.apply(ctx).map_err(csg);
        }

        match call.name.as_str() {
            "box" => ctx.box_(args.point(0, "p1")?, args.point(1, "p2")?),
            "cylinder" => ctx.cylinder(
                args.point(0, "p1")?,
                args.point(1, "p2")?,
                args.number(2, "radius")?,
            ),
            "cone" => ctx.cone(
                args.point(0, "p1")?,
                args.point(1, "p2")?,
                args.number(2, "radius1")?,
                args.number(3, "radius2")?,
            ),
            "sphere" => ctx.sphere(args.point(0, "center")?, args.number(1, "radius")?),
            "torus" => ctx.torus(
                args.point(0, "p1")?,
                args.point(1, "p2")?,
                args.number(2, "ring_radius")?,
                args.number(3, "radius")?,
            ),
            "text" => {
                let font = match args.get(3, "font") {
                    Some(value) => Some(args.convert(value, "font", Value::as_str)?),
                    None => None,
                };
                ctx.text(
                    args.number(0, "height")?,
                    args.number(1, "depth")?,
                    args.string(2, "text")?,
                    font.map(Path::new),
                )
            }
            "extrude" => ctx.extrude(
                &args.profile(0, "profile")?,
                args.point(1, "p1")?,
                args.point(2, "p2")?,
            ),
            "revolve" => ctx.revolve(
                args.face(0, "face")?,
                args.point(1, "p1")?,
                args.point(2, "p2")?,
                args.number_or(3, "angle", TAU)?,
            ),
            "loft" => {
                let profiles = args
                    .convert(args.value(0, "profiles")?, "profiles", Value::as_list)?
                    .iter()
                    .map(|profile| args.convert(profile, "profiles", Value::as_profile))
                    .collect::<Result<Vec<_>>>()?;
                ctx.loft(
                    &profiles,
                    args.bool_or(1, "ruled", true)?,
                    args.number_or(2, "tolerance", 1e-6)?,
                )
            }
            "pipe" => {
                let path = args.convert(args.value(1, "path")?, "path", Value::as_wire)?;
                ctx.pipe(args.face(0, "face")?, path)
            }
            _ => {
                self.call_function(ctx, call, args)?;
                return Ok(());
            }
        }
        .map_err(csg)
    }

    /// Group blocks open a nested scope around their body
    fn block(
        &mut self,
        ctx: &mut Context<MeshKernel>,
        call: &Call,
        body: &[Statement],
        line: usize,
    ) -> Result<()> {
        let args = self.args(ctx, call, line)?;
        let postfix = |name: &str, args: Args| -> Result<Option<Postfix>> {
            match Postfix::from_args(name, &args)? {
                Some(postfix) => Ok(Some(postfix)),
                None => Err(args.error(format_args!("unknown operation '{name}'"))),
            }
        };

        let (combinator, finisher) = match call.name.as_str() {
            "union" => (Combinator::Union, None),
            "intersection" => (Combinator::Intersection, None),
            "difference" => (Combinator::Difference, None),
            "rotated" => (Combinator::Union, postfix("rotate", args)?),
            "translated" => (Combinator::Union, postfix("translate", args)?),
            "transformed" => (Combinator::Union, postfix("transform", args)?),
            "filleted" => (Combinator::Union, postfix("fillet", args)?),
            "chamfered" => (Combinator::Union, postfix("chamfer", args)?),
            "op" => {
                let operation = args.string(0, "operation")?.to_string();
                (Combinator::Union, postfix(&operation, args.shifted(1, &operation))?)
            }
            other => {
                return Err(ScriptError::runtime(
                    line,
                    format!("'{other}' cannot open a block"),
                ))
            }
        };

        debug!(block = %call.name, %combinator, line, "Entering block");
        let mut scope = ctx.scope(combinator);
        // An error here drops the guard, which aborts the scope
        self.execute_all(&mut scope, body)?;
        match finisher {
            Some(postfix) => scope.finish_with(move |ctx| postfix.apply(ctx)),
            None => scope.finish(),
        }
        .map_err(|e| ScriptError::csg(line, e))
    }

    fn eval(&mut self, ctx: &Context<MeshKernel>, expr: &Expr, line: usize) -> Result<Value> {
        let runtime = |message: String| ScriptError::runtime(line, message);

        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Vector(items) => items
                .iter()
                .map(|item| self.eval(ctx, item, line))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            Expr::Var(name) => self
                .variables
                .get(name)
                .cloned()
                .ok_or_else(|| runtime(format!("undefined variable '{name}'"))),
            Expr::Call(call) => {
                let args = self.args(ctx, call, line)?;
                self.call_function(ctx, call, args)
            }
            Expr::Neg(inner) => self.eval(ctx, inner, line)?.negate().map_err(runtime),
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(ctx, lhs, line)?;
                let rhs = self.eval(ctx, rhs, line)?;
                Value::binary(*op, lhs, rhs).map_err(runtime)
            }
            Expr::Index(list, position) => {
                let list = self.eval(ctx, list, line)?;
                let position = self.eval(ctx, position, line)?;
                list.index(&position).map_err(runtime)
            }
        }
    }

    /// Functions returning a value; inquiries read the current accumulator
    fn call_function(&mut self, ctx: &Context<MeshKernel>, call: &Call, args: Args) -> Result<Value> {
        let kernel = ctx.kernel();
        let line = args.line;
        let csg = |e: crate::error::CsgError| ScriptError::csg(line, e);
        let geometry = |e: crate::error::KernelError| ScriptError::csg(line, e);

        Ok(match call.name.as_str() {
            "line" => Value::Edge(
                kernel
                    .create_line(args.point(0, "start")?, args.point(1, "end")?)
                    .map_err(geometry)?,
            ),
            "arc" => Value::Edge(
                kernel
                    .create_arc(
                        args.point(0, "start")?,
                        args.point(1, "end")?,
                        args.point(2, "center")?,
                    )
                    .map_err(geometry)?,
            ),
            "circle" => Value::Edge(
                kernel
                    .create_circle(
                        args.point(0, "center")?,
                        args.vector(1, "normal")?,
                        args.number(2, "radius")?,
                    )
                    .map_err(geometry)?,
            ),
            "wire" => {
                // wire([e1, e2]) or wire(e1, e2)
                let items = match args.positional.as_slice() {
                    [Value::List(items)] => items.as_slice(),
                    items => items,
                };
                let edges = items
                    .iter()
                    .map(|item| args.convert(item, "edges", Value::as_edge).cloned())
                    .collect::<Result<Vec<_>>>()?;
                Value::Wire(kernel.create_wire(&edges).map_err(geometry)?)
            }
            "face" => {
                let wire = match args.value(0, "wire")? {
                    Value::Edge(edge) => kernel
                        .create_wire(std::slice::from_ref(edge))
                        .map_err(geometry)?,
                    other => args.convert(other, "wire", Value::as_wire)?.clone(),
                };
                Value::Face(kernel.create_face(&wire).map_err(geometry)?)
            }
            "polygon" => {
                let points = args
                    .convert(args.value(0, "points")?, "points", Value::as_list)?
                    .iter()
                    .map(|p| args.convert(p, "points", Value::as_point))
                    .collect::<Result<Vec<_>>>()?;
                if points.len() < 3 {
                    return Err(args.error("a polygon needs at least 3 points"));
                }
                let edges = points
                    .iter()
                    .zip(points.iter().cycle().skip(1))
                    .map(|(a, b)| kernel.create_line(*a, *b))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(geometry)?;
                let wire = kernel.create_wire(&edges).map_err(geometry)?;
                Value::Face(kernel.create_face(&wire).map_err(geometry)?)
            }
            "translation" => Value::Matrix(Matrix4::new_translation(&args.vector(0, "delta")?)),
            "rotation" => {
                let angle = args.number(0, "angle")?;
                let axis = args.vector(1, "axis")?;
                let center = args.point_or(2, "center", Point3::origin())?;
                if axis.norm() < 1e-12 {
                    return Err(args.error("rotation axis must be non-zero"));
                }
                let rotation = Rotation3::from_axis_angle(&Unit::new_normalize(axis), angle);
                Value::Matrix(
                    Matrix4::new_translation(&center.coords)
                        * rotation.to_homogeneous()
                        * Matrix4::new_translation(&-center.coords),
                )
            }
            "scaling" => match args.value(0, "factor")? {
                Value::Number(factor) => Value::Matrix(Matrix4::new_scaling(*factor)),
                other => Value::Matrix(Matrix4::new_nonuniform_scaling(
                    &args.convert(other, "factor", Value::as_vector)?,
                )),
            },
            "parallel" => Value::Selector(Selector::Parallel(args.vector(0, "axis")?)),
            "within" => Value::Selector(Selector::Within(BoundingBox::new(
                args.point(0, "min")?,
                args.point(1, "max")?,
            ))),
            "convex" => Value::Selector(Selector::Convex),
            "bbox" => {
                let bounds = ctx.bbox().map_err(csg)?;
                Value::List(vec![Value::point(bounds.min), Value::point(bounds.max)])
            }
            "centre_of_mass" | "center_of_mass" => Value::point(ctx.centre_of_mass().map_err(csg)?),
            "volume" => Value::Number(ctx.volume().map_err(csg)?),
            "edges" => Value::List(ctx.edges().map_err(csg)?.into_iter().map(Value::Edge).collect()),
            "faces" => Value::List(ctx.faces().map_err(csg)?.into_iter().map(Value::Face).collect()),
            "vertices" => Value::List(
                ctx.vertices()
                    .map_err(csg)?
                    .into_iter()
                    .map(Value::point)
                    .collect(),
            ),
            "wires" => Value::List(ctx.wires().map_err(csg)?.into_iter().map(Value::Wire).collect()),
            "len" => match args.value(0, "value")? {
                Value::List(items) => Value::Number(items.len() as f64),
                Value::Str(s) => Value::Number(s.chars().count() as f64),
                other => {
                    return Err(args.error(format_args!("cannot take len of {}", other.type_name())))
                }
            },
            "radians" => Value::Number(args.number(0, "degrees")?.to_radians()),
            "sqrt" => Value::Number(args.number(0, "x")?.sqrt()),
            "sin" => Value::Number(args.number(0, "x")?.sin()),
            "cos" => Value::Number(args.number(0, "x")?.cos()),
            "abs" => Value::Number(args.number(0, "x")?.abs()),
            "echo" => {
                let text = args
                    .positional
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                info!(line, "{text}");
                self.output.push(text);
                Value::List(Vec::new())
            }
            name => {
                return Err(ScriptError::runtime(
                    line,
                    format!("unknown function '{name}'"),
                ))
            }
        })
    }
}
