// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Edges, wires and planar faces

use super::csg::newell_normal;
use super::primitives::frame;
use crate::error::{KernelError, KernelResult};
use nalgebra::{Point3, Unit, Vector3};
use std::f64::consts::PI;

/// Distance under which two profile points are considered the same
pub const POINT_TOLERANCE: f64 = 1e-7;

/// The two faces meeting at a crease edge of a solid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeAdjacency {
    /// Outward normals of the faces on either side
    pub normals: [Vector3<f64>; 2],
    /// True when the material lies inside the angle formed by the faces
    pub convex: bool,
}

/// Polyline edge. Closed edges do not repeat their first point.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    points: Vec<Point3<f64>>,
    closed: bool,
    adjacency: Option<EdgeAdjacency>,
}

impl Edge {
    pub fn line(start: Point3<f64>, end: Point3<f64>) -> KernelResult<Self> {
        if (end - start).norm() < POINT_TOLERANCE {
            return Err(KernelError::invalid("line endpoints coincide"));
        }
        Ok(Self {
            points: vec![start, end],
            closed: false,
            adjacency: None,
        })
    }

    /// Shorter circular arc from `start` to `end` around `center`
    pub fn arc(
        start: Point3<f64>,
        end: Point3<f64>,
        center: Point3<f64>,
        segments: u32,
    ) -> KernelResult<Self> {
        let from = start - center;
        let to = end - center;
        let radius = from.norm();
        if radius < POINT_TOLERANCE {
            return Err(KernelError::invalid("arc start coincides with its centre"));
        }
        if (to.norm() - radius).abs() > 1e-6 * radius.max(1.0) {
            return Err(KernelError::invalid(
                "arc endpoints are not equidistant from the centre",
            ));
        }
        let normal = from.cross(&to).try_normalize(1e-12).ok_or_else(|| {
            KernelError::invalid("arc endpoints are collinear with the centre")
        })?;

        let angle = (from.dot(&to) / (radius * to.norm())).clamp(-1.0, 1.0).acos();
        let steps = ((segments.max(3) as f64) * angle / (2.0 * PI)).ceil().max(1.0) as usize;
        let s = from / radius;
        let t = normal.cross(&s);

        let mut points = Vec::with_capacity(steps + 1);
        points.push(start);
        for k in 1..steps {
            let phi = angle * k as f64 / steps as f64;
            points.push(center + (s * phi.cos() + t * phi.sin()) * radius);
        }
        points.push(end);

        Ok(Self {
            points,
            closed: false,
            adjacency: None,
        })
    }

    /// Full circle in the plane through `center` normal to `normal`
    pub fn circle(
        center: Point3<f64>,
        normal: Vector3<f64>,
        radius: f64,
        segments: u32,
    ) -> KernelResult<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(KernelError::invalid("circle radius must be positive"));
        }
        let axis = Unit::try_new(normal, 1e-12)
            .ok_or_else(|| KernelError::invalid("circle normal has zero length"))?;
        let (u, v) = frame(&axis);
        let segments = segments.max(3) as usize;
        let points = (0..segments)
            .map(|i| {
                let angle = 2.0 * PI * i as f64 / segments as f64;
                center + (u * angle.cos() + v * angle.sin()) * radius
            })
            .collect();
        Ok(Self {
            points,
            closed: true,
            adjacency: None,
        })
    }

    /// Straight crease between two faces of a solid
    pub(crate) fn crease(start: Point3<f64>, end: Point3<f64>, adjacency: EdgeAdjacency) -> Self {
        Self {
            points: vec![start, end],
            closed: false,
            adjacency: Some(adjacency),
        }
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn start(&self) -> Point3<f64> {
        self.points[0]
    }

    pub fn end(&self) -> Point3<f64> {
        if self.closed {
            self.points[0]
        } else {
            self.points[self.points.len() - 1]
        }
    }

    pub fn length(&self) -> f64 {
        polyline_length(&self.points, self.closed)
    }

    /// Unit chord direction, zero for closed edges
    pub fn direction(&self) -> Vector3<f64> {
        (self.end() - self.start())
            .try_normalize(1e-12)
            .unwrap_or_else(Vector3::zeros)
    }

    /// True for open edges whose chord is parallel (or anti-parallel) to `axis`
    pub fn is_parallel_to(&self, axis: &Vector3<f64>, tolerance: f64) -> bool {
        match axis.try_normalize(1e-12) {
            Some(axis) if !self.closed => (1.0 - self.direction().dot(&axis).abs()) < tolerance,
            _ => false,
        }
    }

    pub fn adjacency(&self) -> Option<&EdgeAdjacency> {
        self.adjacency.as_ref()
    }

    /// Angle between the normals of the faces meeting at this edge
    pub fn dihedral_angle(&self) -> Option<f64> {
        self.adjacency
            .map(|adj| adj.normals[0].dot(&adj.normals[1]).clamp(-1.0, 1.0).acos())
    }

    fn reversed_points(&self) -> Vec<Point3<f64>> {
        self.points.iter().rev().copied().collect()
    }
}

/// Connected chain of edges
#[derive(Debug, Clone, PartialEq)]
pub struct Wire {
    points: Vec<Point3<f64>>,
    closed: bool,
}

impl Wire {
    /// Chain edges end to end, reversing edges where that makes them connect
    pub fn from_edges(edges: &[Edge]) -> KernelResult<Self> {
        let (first, rest) = edges
            .split_first()
            .ok_or_else(|| KernelError::invalid("a wire needs at least one edge"))?;

        if first.closed {
            if !rest.is_empty() {
                return Err(KernelError::invalid(
                    "a closed edge cannot be combined with other edges",
                ));
            }
            return Ok(Self {
                points: first.points.clone(),
                closed: true,
            });
        }

        let mut points = first.points.clone();
        let mut remaining: Vec<&Edge> = rest.iter().collect();
        while !remaining.is_empty() {
            let tail = points[points.len() - 1];
            let head = points[0];
            let close = |a: Point3<f64>, b: Point3<f64>| (a - b).norm() < POINT_TOLERANCE * 10.0;

            let position = remaining.iter().position(|edge| {
                !edge.closed
                    && (close(edge.start(), tail)
                        || close(edge.end(), tail)
                        || close(edge.end(), head)
                        || close(edge.start(), head))
            });
            let Some(index) = position else {
                return Err(KernelError::invalid("edges do not form a connected wire"));
            };
            let edge = remaining.remove(index);

            if close(edge.start(), tail) {
                points.extend_from_slice(&edge.points[1..]);
            } else if close(edge.end(), tail) {
                points.extend(edge.reversed_points().into_iter().skip(1));
            } else if close(edge.end(), head) {
                let mut joined = edge.points[..edge.points.len() - 1].to_vec();
                joined.extend(points);
                points = joined;
            } else {
                let mut joined: Vec<Point3<f64>> = edge.reversed_points();
                joined.pop();
                joined.extend(points);
                points = joined;
            }
        }

        let closed = points.len() > 3 && (points[0] - points[points.len() - 1]).norm() < POINT_TOLERANCE * 10.0;
        if closed {
            points.pop();
        }
        Ok(Self { points, closed })
    }

    pub(crate) fn from_loop(points: Vec<Point3<f64>>) -> Self {
        Self {
            points,
            closed: true,
        }
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn length(&self) -> f64 {
        polyline_length(&self.points, self.closed)
    }
}

/// Planar face made of one or more coplanar patches
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    patches: Vec<Vec<Point3<f64>>>,
    normal: Vector3<f64>,
}

impl Face {
    /// Face bounded by a closed planar wire
    pub fn from_wire(wire: &Wire) -> KernelResult<Self> {
        if !wire.closed || wire.points.len() < 3 {
            return Err(KernelError::invalid("a face needs a closed wire"));
        }
        let normal = newell_normal(&wire.points)
            .try_normalize(1e-14)
            .ok_or_else(|| KernelError::degenerate("wire encloses no area"))?;

        let origin = wire.points[0];
        let scale = wire.length().max(1.0);
        if wire
            .points
            .iter()
            .any(|p| normal.dot(&(p - origin)).abs() > 1e-6 * scale)
        {
            return Err(KernelError::invalid("wire is not planar"));
        }

        Ok(Self {
            patches: vec![wire.points.clone()],
            normal,
        })
    }

    pub(crate) fn from_patches(patches: Vec<Vec<Point3<f64>>>, normal: Vector3<f64>) -> Self {
        Self { patches, normal }
    }

    pub fn normal(&self) -> Vector3<f64> {
        self.normal
    }

    /// The single boundary loop of a face built from one wire
    pub fn outline(&self) -> KernelResult<&[Point3<f64>]> {
        match self.patches.as_slice() {
            [single] => Ok(single),
            _ => Err(KernelError::unsupported(
                "operation needs a face with a single boundary loop",
            )),
        }
    }

    pub fn area(&self) -> f64 {
        self.patches
            .iter()
            .map(|patch| newell_normal(patch).norm() * 0.5)
            .sum()
    }
}

pub(crate) fn polyline_length(points: &[Point3<f64>], closed: bool) -> f64 {
    let open: f64 = points.windows(2).map(|w| (w[1] - w[0]).norm()).sum();
    if closed && points.len() > 1 {
        open + (points[0] - points[points.len() - 1]).norm()
    } else {
        open
    }
}

fn point_at_length(points: &[Point3<f64>], closed: bool, target: f64) -> Point3<f64> {
    let count = points.len();
    let segment_count = if closed { count } else { count.saturating_sub(1) };
    let mut walked = 0.0;
    for i in 0..segment_count {
        let a = points[i];
        let b = points[(i + 1) % count];
        let length = (b - a).norm();
        if walked + length >= target && length > 0.0 {
            return a + (b - a) * ((target - walked) / length);
        }
        walked += length;
    }
    points[count - 1]
}

/// Resample a closed loop to `count` points spaced evenly by arc length
pub(crate) fn resample_loop(points: &[Point3<f64>], count: usize) -> Vec<Point3<f64>> {
    let perimeter = polyline_length(points, true);
    (0..count)
        .map(|k| point_at_length(points, true, perimeter * k as f64 / count as f64))
        .collect()
}

/// Ear-clipping triangulation of a simple planar loop.
/// Triangles keep the winding of the loop.
pub(crate) fn triangulate(points: &[Point3<f64>], normal: &Vector3<f64>) -> KernelResult<Vec<[usize; 3]>> {
    if points.len() < 3 {
        return Err(KernelError::degenerate("loop has fewer than three points"));
    }
    let axis = Unit::try_new(*normal, 1e-14)
        .ok_or_else(|| KernelError::degenerate("loop normal has zero length"))?;
    let (u, v) = frame(&axis);
    let flat: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (p.coords.dot(&u), p.coords.dot(&v)))
        .collect();

    let cross = |a: usize, b: usize, c: usize| {
        let (ax, ay) = flat[a];
        let (bx, by) = flat[b];
        let (cx, cy) = flat[c];
        (bx - ax) * (cy - ay) - (by - ay) * (cx - ax)
    };

    let mut area2 = 0.0;
    for i in 0..flat.len() {
        let (x0, y0) = flat[i];
        let (x1, y1) = flat[(i + 1) % flat.len()];
        area2 += x0 * y1 - x1 * y0;
    }
    if area2.abs() < 1e-18 {
        return Err(KernelError::degenerate("loop encloses no area"));
    }
    let sign = area2.signum();
    let epsilon = area2.abs() * 1e-12;

    let mut remaining: Vec<usize> = (0..points.len()).collect();
    let mut triangles = Vec::with_capacity(points.len() - 2);

    while remaining.len() > 3 {
        let m = remaining.len();
        let mut clipped = false;

        for k in 0..m {
            let prev = remaining[(k + m - 1) % m];
            let cur = remaining[k];
            let next = remaining[(k + 1) % m];
            if sign * cross(prev, cur, next) <= epsilon {
                continue;
            }
            let blocked = remaining.iter().any(|&other| {
                other != prev
                    && other != cur
                    && other != next
                    && sign * cross(prev, cur, other) >= 0.0
                    && sign * cross(cur, next, other) >= 0.0
                    && sign * cross(next, prev, other) >= 0.0
            });
            if blocked {
                continue;
            }
            triangles.push([prev, cur, next]);
            remaining.remove(k);
            clipped = true;
            break;
        }

        if !clipped {
            // Only collinear or self-touching corners left; drop a flat one and retry
            let flat_corner = (0..m).find(|&k| {
                let prev = remaining[(k + m - 1) % m];
                let next = remaining[(k + 1) % m];
                (sign * cross(prev, remaining[k], next)).abs() <= epsilon
            });
            match flat_corner {
                Some(k) => {
                    remaining.remove(k);
                }
                None => return Err(KernelError::invalid("loop is self-intersecting")),
            }
        }
    }

    if sign * cross(remaining[0], remaining[1], remaining[2]) > epsilon {
        triangles.push([remaining[0], remaining[1], remaining[2]]);
    }
    Ok(triangles)
}
