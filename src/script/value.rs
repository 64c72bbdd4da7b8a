// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Runtime values of the script interpreter

use super::parser::BinaryOp;
use crate::engine::selection::{convex, parallel_to, within};
use crate::engine::EdgeSelection;
use crate::geometry::{BoundingBox, Edge, Face, Wire};
use crate::kernel::Profile;
use nalgebra::{Matrix4, Point3, Vector3};
use std::fmt;

/// Edge filter built by `parallel`, `within` or `convex`
#[derive(Debug, Clone)]
pub enum Selector {
    Parallel(Vector3<f64>),
    Within(BoundingBox),
    Convex,
}

impl Selector {
    pub fn into_selection(self) -> EdgeSelection<'static, Edge> {
        match self {
            Selector::Parallel(axis) => EdgeSelection::matching(parallel_to(axis)),
            Selector::Within(bounds) => EdgeSelection::matching(within(bounds)),
            Selector::Convex => EdgeSelection::matching(convex),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Str(String),
    /// Vectors and lists share one representation
    List(Vec<Value>),
    Edge(Edge),
    Wire(Wire),
    Face(Face),
    Matrix(Matrix4<f64>),
    Selector(Selector),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Edge(_) => "edge",
            Value::Wire(_) => "wire",
            Value::Face(_) => "face",
            Value::Matrix(_) => "matrix",
            Value::Selector(_) => "selector",
        }
    }

    pub fn point(p: Point3<f64>) -> Self {
        Value::List(vec![Value::Number(p.x), Value::Number(p.y), Value::Number(p.z)])
    }

    fn mismatch(&self, expected: &str) -> String {
        format!("expected {expected}, found {}", self.type_name())
    }

    pub fn as_number(&self) -> Result<f64, String> {
        match self {
            Value::Number(n) => Ok(*n),
            other => Err(other.mismatch("number")),
        }
    }

    pub fn as_bool(&self) -> Result<bool, String> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(other.mismatch("bool")),
        }
    }

    pub fn as_str(&self) -> Result<&str, String> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn as_list(&self) -> Result<&[Value], String> {
        match self {
            Value::List(items) => Ok(items),
            other => Err(other.mismatch("list")),
        }
    }

    pub fn as_vector(&self) -> Result<Vector3<f64>, String> {
        let items = self.as_list()?;
        match items {
            [x, y, z] => Ok(Vector3::new(x.as_number()?, y.as_number()?, z.as_number()?)),
            _ => Err(format!("expected 3 components, found {}", items.len())),
        }
    }

    pub fn as_point(&self) -> Result<Point3<f64>, String> {
        self.as_vector().map(Point3::from)
    }

    pub fn as_edge(&self) -> Result<&Edge, String> {
        match self {
            Value::Edge(edge) => Ok(edge),
            other => Err(other.mismatch("edge")),
        }
    }

    pub fn as_face(&self) -> Result<&Face, String> {
        match self {
            Value::Face(face) => Ok(face),
            other => Err(other.mismatch("face")),
        }
    }

    pub fn as_wire(&self) -> Result<&Wire, String> {
        match self {
            Value::Wire(wire) => Ok(wire),
            other => Err(other.mismatch("wire")),
        }
    }

    pub fn as_matrix(&self) -> Result<Matrix4<f64>, String> {
        match self {
            Value::Matrix(m) => Ok(*m),
            other => Err(other.mismatch("matrix")),
        }
    }

    pub fn as_profile(&self) -> Result<Profile<Edge, Wire, Face>, String> {
        match self {
            Value::Edge(edge) => Ok(Profile::Edge(edge.clone())),
            Value::Wire(wire) => Ok(Profile::Wire(wire.clone())),
            Value::Face(face) => Ok(Profile::Face(face.clone())),
            other => Err(other.mismatch("edge, wire or face")),
        }
    }

    /// Element `position` of a list, counted from zero
    pub fn index(self, position: &Value) -> Result<Value, String> {
        let position = position.as_number()?;
        let mut items = match self {
            Value::List(items) => items,
            other => return Err(format!("cannot index a {}", other.type_name())),
        };
        if position.fract() != 0.0 || position < 0.0 || position >= items.len() as f64 {
            return Err(format!(
                "index {position} out of range for list of length {}",
                items.len()
            ));
        }
        Ok(items.swap_remove(position as usize))
    }

    pub fn negate(self) -> Result<Value, String> {
        match self {
            Value::Number(n) => Ok(Value::Number(-n)),
            Value::List(items) => items
                .into_iter()
                .map(Value::negate)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            other => Err(format!("cannot negate a {}", other.type_name())),
        }
    }

    /// Arithmetic on numbers, component-wise on vectors, composition on matrices
    pub fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, String> {
        use Value::*;

        match (op, lhs, rhs) {
            (_, Number(a), Number(b)) => arithmetic(op, a, b).map(Number),
            (BinaryOp::Add | BinaryOp::Sub, List(a), List(b)) => {
                if a.len() != b.len() {
                    return Err(format!(
                        "vector length mismatch: {} and {}",
                        a.len(),
                        b.len()
                    ));
                }
                a.into_iter()
                    .zip(b)
                    .map(|(x, y)| Value::binary(op, x, y))
                    .collect::<Result<Vec<_>, _>>()
                    .map(List)
            }
            (BinaryOp::Mul | BinaryOp::Div, List(a), Number(b)) => a
                .into_iter()
                .map(|x| Value::binary(op, x, Number(b)))
                .collect::<Result<Vec<_>, _>>()
                .map(List),
            (BinaryOp::Mul, Number(a), List(b)) => b
                .into_iter()
                .map(|y| Value::binary(op, Number(a), y))
                .collect::<Result<Vec<_>, _>>()
                .map(List),
            (BinaryOp::Mul, Matrix(a), Matrix(b)) => Ok(Matrix(a * b)),
            (BinaryOp::Add, Str(a), Str(b)) => Ok(Str(a + &b)),
            (op, lhs, rhs) => Err(format!(
                "cannot apply {} to {} and {}",
                symbol(op),
                lhs.type_name(),
                rhs.type_name()
            )),
        }
    }
}

fn arithmetic(op: BinaryOp, a: f64, b: f64) -> Result<f64, String> {
    match op {
        BinaryOp::Add => Ok(a + b),
        BinaryOp::Sub => Ok(a - b),
        BinaryOp::Mul => Ok(a * b),
        BinaryOp::Div if b == 0.0 => Err("division by zero".into()),
        BinaryOp::Div => Ok(a / b),
    }
}

fn symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Edge(edge) => {
                let (a, b) = (edge.start(), edge.end());
                write!(
                    f,
                    "edge([{}, {}, {}] -> [{}, {}, {}])",
                    a.x, a.y, a.z, b.x, b.y, b.z
                )
            }
            Value::Wire(wire) => write!(f, "wire({} points)", wire.points().len()),
            Value::Face(face) => write!(f, "face(area {})", face.area()),
            Value::Matrix(_) => write!(f, "matrix"),
            Value::Selector(selector) => write!(f, "{selector:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(x: f64, y: f64, z: f64) -> Value {
        Value::point(Point3::new(x, y, z))
    }

    #[test]
    fn test_vector_arithmetic() {
        let sum = Value::binary(BinaryOp::Add, vector(1.0, 2.0, 3.0), vector(1.0, 1.0, 1.0)).unwrap();
        assert_eq!(sum.as_vector().unwrap(), Vector3::new(2.0, 3.0, 4.0));

        let scaled = Value::binary(BinaryOp::Mul, Value::Number(2.0), vector(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(scaled.as_vector().unwrap(), Vector3::new(2.0, 4.0, 6.0));

        let halved = Value::binary(BinaryOp::Div, vector(2.0, 4.0, 6.0), Value::Number(2.0)).unwrap();
        assert_eq!(halved.as_point().unwrap(), Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_type_errors() {
        let err = Value::binary(BinaryOp::Sub, Value::Number(1.0), vector(0.0, 0.0, 0.0)).unwrap_err();
        assert_eq!(err, "cannot apply - to number and list");
        assert!(Value::binary(BinaryOp::Div, Value::Number(1.0), Value::Number(0.0)).is_err());
        assert!(Value::Bool(true).negate().is_err());
        assert_eq!(
            Value::Number(1.0).as_vector().unwrap_err(),
            "expected list, found number"
        );
    }

    #[test]
    fn test_index() {
        let list = vector(4.0, 5.0, 6.0);
        assert_eq!(list.clone().index(&Value::Number(2.0)).unwrap().as_number().unwrap(), 6.0);
        assert!(list.clone().index(&Value::Number(3.0)).is_err());
        assert!(list.index(&Value::Number(0.5)).is_err());
        assert!(Value::Number(1.0).index(&Value::Number(0.0)).is_err());
    }

    #[test]
    fn test_display() {
        let value = Value::List(vec![Value::Number(1.5), Value::Str("a".into()), Value::Bool(false)]);
        assert_eq!(value.to_string(), "[1.5, a, false]");
    }

    #[test]
    fn test_selectors_filter_edges() {
        let edges = vec![
            Edge::line(Point3::origin(), Point3::new(0.0, 0.0, 1.0)).unwrap(),
            Edge::line(Point3::origin(), Point3::new(1.0, 0.0, 0.0)).unwrap(),
        ];
        let selected = Selector::Parallel(Vector3::z())
            .into_selection()
            .resolve(|| Ok::<_, ()>(edges))
            .unwrap();
        assert_eq!(selected.len(), 1);
    }
}
