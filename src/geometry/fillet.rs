// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Rounding and bevelling of straight crease edges.
//!
//! Every edge gets a prismatic tool swept along it: a cutter removing the
//! material outside the rounding for convex edges, or a filler adding it
//! for concave ones. Tools overshoot the solid slightly so their faces never
//! coincide with faces of the solid.

use super::profile::Edge;
use super::sweep::extrude_loop;
use super::Solid;
use crate::error::{KernelError, KernelResult};
use nalgebra::{Point3, Rotation3, Unit, Vector3};
use tracing::debug;

/// Relative size of the overshoot of each tool
const OVERSHOOT: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Profile {
    Round { segments: u32 },
    Bevel,
}

/// Round `edges` of `solid` with the given radius
pub fn fillet(solid: &Solid, edges: &[Edge], radius: f64, segments: u32) -> KernelResult<Solid> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(KernelError::invalid(format!(
            "fillet radius {radius} must be positive"
        )));
    }
    apply(solid, edges, radius, Profile::Round { segments: segments.max(1) })
}

/// Bevel `edges` of `solid`, cutting back `distance` along both faces
pub fn chamfer(solid: &Solid, edges: &[Edge], distance: f64) -> KernelResult<Solid> {
    if !distance.is_finite() || distance <= 0.0 {
        return Err(KernelError::invalid(format!(
            "chamfer distance {distance} must be positive"
        )));
    }
    apply(solid, edges, distance, Profile::Bevel)
}

fn apply(solid: &Solid, edges: &[Edge], size: f64, profile: Profile) -> KernelResult<Solid> {
    solid.require("fillet")?;
    let mut cutters: Option<Solid> = None;
    let mut fillers: Option<Solid> = None;

    for edge in edges {
        let Some((tool, convex)) = edge_tool(edge, size, profile)? else {
            continue;
        };
        let slot = if convex { &mut cutters } else { &mut fillers };
        *slot = Some(match slot.take() {
            Some(existing) => existing.union(&tool)?,
            None => tool,
        });
    }

    debug!(
        edges = edges.len(),
        cut = cutters.is_some(),
        filled = fillers.is_some(),
        "Rounding edges"
    );

    let mut result = solid.clone();
    if let Some(cutters) = cutters {
        result = result.difference(&cutters)?;
    }
    if let Some(fillers) = fillers {
        result = result.union(&fillers)?;
    }
    Ok(result)
}

/// Tool prism for one edge and whether it is a cutter. Flat edges need no tool.
fn edge_tool(edge: &Edge, size: f64, profile: Profile) -> KernelResult<Option<(Solid, bool)>> {
    let adjacency = edge.adjacency().ok_or_else(|| {
        KernelError::invalid("only edges taken from a solid can be rounded")
    })?;
    if edge.is_closed() {
        return Err(KernelError::unsupported("rounding closed edges"));
    }

    let [n1, n2] = adjacency.normals;
    let opening = n1.dot(&n2).clamp(-1.0, 1.0).acos();
    if opening < 1e-6 {
        return Ok(None);
    }
    if std::f64::consts::PI - opening < 1e-6 {
        return Err(KernelError::degenerate("faces at the edge fold back onto each other"));
    }

    // Half the turn between the face normals
    let beta = opening * 0.5;
    let radius = match profile {
        Profile::Round { .. } => size,
        Profile::Bevel => size / beta.tan(),
    };
    let setback = radius * beta.tan();
    let length = edge.length();
    if setback * 2.0 >= length {
        return Err(KernelError::invalid(format!(
            "rounding of {size} needs {setback:.6} on each side of an edge only {length:.6} long"
        )));
    }

    let sign = if adjacency.convex { 1.0 } else { -1.0 };
    let direction = edge.direction();
    let bisector = (n1 + n2).normalize();
    let margin = (setback * OVERSHOOT).max(1e-6);

    let start = edge.start() - direction * margin;
    let centre = start - bisector * (sign * radius / beta.cos());
    let t1 = centre + n1 * (sign * radius);
    let t2 = centre + n2 * (sign * radius);

    let mut section: Vec<Point3<f64>> = Vec::new();
    section.push(start + bisector * (sign * margin));
    section.push(t1 + n1 * (sign * margin));
    match profile {
        Profile::Bevel => {
            section.push(t1);
            section.push(t2);
        }
        Profile::Round { segments } => {
            let axis = Unit::new_normalize(n1.cross(&n2));
            for k in 0..=segments {
                let turn = Rotation3::from_axis_angle(&axis, opening * k as f64 / segments as f64);
                let normal: Vector3<f64> = turn * n1;
                section.push(centre + normal * (sign * radius));
            }
        }
    }
    section.push(t2 + n2 * (sign * margin));

    let tool = extrude_loop(&section, direction * (length + 2.0 * margin))?;
    Ok(Some((tool, adjacency.convex)))
}
