// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Sweeping planar loops into solids: extrusion, revolution, lofting and pipes

use super::csg::{newell_normal, Polygon};
use super::profile::{resample_loop, triangulate, Face, Wire, POINT_TOLERANCE};
use super::Solid;
use crate::error::{KernelError, KernelResult};
use nalgebra::{Point3, Rotation3, Unit, Vector3};
use std::f64::consts::PI;

/// Sections inserted between two loops of a smooth loft
const SMOOTH_LOFT_STEPS: usize = 4;

/// Extrude a closed loop along `offset`
pub fn extrude_loop(outline: &[Point3<f64>], offset: Vector3<f64>) -> KernelResult<Solid> {
    let normal = loop_normal(outline)?;
    if offset.norm() < POINT_TOLERANCE {
        return Err(KernelError::invalid("extrusion vector has zero length"));
    }
    if normal.dot(&offset).abs() < 1e-9 * offset.norm() {
        return Err(KernelError::degenerate(
            "extrusion vector lies in the plane of the profile",
        ));
    }
    let top: Vec<Point3<f64>> = outline.iter().map(|p| p + offset).collect();
    stitch(&[outline.to_vec(), top], false)
}

/// Revolve a face by `angle` radians around the axis through `p1` and `p2`
pub fn revolve_face(
    face: &Face,
    p1: Point3<f64>,
    p2: Point3<f64>,
    angle: f64,
    segments: u32,
) -> KernelResult<Solid> {
    let outline = face.outline()?;
    let axis = Unit::try_new(p2 - p1, 1e-12)
        .ok_or_else(|| KernelError::invalid("revolution axis has zero length"))?;
    if !angle.is_finite() || angle.abs() < 1e-9 || angle.abs() > 2.0 * PI + 1e-9 {
        return Err(KernelError::invalid(format!(
            "revolution angle {angle} must lie in (0, 2π]"
        )));
    }
    let direction = axis.into_inner();
    check_one_side_of_axis(outline, &face.normal(), &p1, &direction)?;

    let full_turn = angle.abs() >= 2.0 * PI - 1e-9;
    let steps = ((segments.max(3) as f64) * angle.abs() / (2.0 * PI))
        .ceil()
        .max(1.0) as usize;
    let steps = if full_turn { steps.max(3) } else { steps };

    // Points on the axis stay fixed while the rest sweeps around it
    let mut profile: Vec<Point3<f64>> = Vec::with_capacity(outline.len());
    for p in outline {
        let on_axis = (p - p1).cross(&direction).norm() < POINT_TOLERANCE;
        profile.push(if on_axis {
            p1 + direction * (p - p1).dot(&direction)
        } else {
            *p
        });
    }

    let section_count = if full_turn { steps } else { steps + 1 };
    let sections: Vec<Vec<Point3<f64>>> = (0..section_count)
        .map(|k| {
            let rotation = Rotation3::from_axis_angle(&axis, angle * k as f64 / steps as f64);
            profile
                .iter()
                .map(|p| p1 + rotation * (p - p1))
                .collect()
        })
        .collect();

    stitch(&sections, full_turn)
}

/// Loft through closed loops, straight between them when `ruled`, smooth otherwise
pub fn loft_loops(
    loops: &[Vec<Point3<f64>>],
    ruled: bool,
    tolerance: f64,
) -> KernelResult<Solid> {
    if loops.len() < 2 {
        return Err(KernelError::invalid("loft needs at least two profiles"));
    }
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return Err(KernelError::invalid("loft tolerance must be positive"));
    }

    let count = loops.iter().map(Vec::len).max().unwrap_or(0);
    let reference = loop_normal(&loops[0])?;
    let mut sections = Vec::with_capacity(loops.len());
    for outline in loops {
        let mut section = if outline.len() == count {
            outline.clone()
        } else {
            resample_loop(outline, count)
        };
        if loop_normal(&section)?.dot(&reference) < 0.0 {
            section[1..].reverse();
        }
        sections.push(section);
    }

    for pair in sections.windows(2) {
        let gap = pair[0]
            .iter()
            .zip(&pair[1])
            .map(|(a, b)| (b - a).norm())
            .fold(0.0, f64::max);
        if gap < tolerance {
            return Err(KernelError::degenerate("consecutive loft profiles coincide"));
        }
    }

    if !ruled && sections.len() > 2 {
        sections = smooth_sections(&sections);
    }
    stitch(&sections, false)
}

/// Sweep a face along a path, carrying the profile with parallel-transport frames
pub fn pipe_face(face: &Face, path: &Wire) -> KernelResult<Solid> {
    let outline = face.outline()?;
    let mut spine: Vec<Point3<f64>> = path.points().to_vec();
    if path.is_closed() {
        spine.push(spine[0]);
    }
    spine.dedup_by(|a, b| (*a - *b).norm() < POINT_TOLERANCE);
    if spine.len() < 2 {
        return Err(KernelError::invalid("pipe path is too short"));
    }

    let segment_direction = |i: usize| (spine[i + 1] - spine[i]).normalize();
    let last = spine.len() - 1;
    let mut tangents = Vec::with_capacity(spine.len());
    tangents.push(segment_direction(0));
    for i in 1..last {
        let bisector = segment_direction(i - 1) + segment_direction(i);
        tangents.push(
            bisector
                .try_normalize(1e-9)
                .ok_or_else(|| KernelError::degenerate("pipe path doubles back on itself"))?,
        );
    }
    tangents.push(segment_direction(last - 1));

    if face.normal().dot(&tangents[0]).abs() < 1e-9 {
        return Err(KernelError::degenerate("pipe profile is tangent to the path"));
    }

    let origin = spine[0];
    let mut frame = Rotation3::identity();
    let mut sections = Vec::with_capacity(spine.len());
    for (i, point) in spine.iter().enumerate() {
        if i > 0 {
            let turn = Rotation3::rotation_between(&tangents[i - 1], &tangents[i])
                .ok_or_else(|| KernelError::degenerate("pipe path reverses direction"))?;
            frame = turn * frame;
        }
        sections.push(
            outline
                .iter()
                .map(|q| point + frame * (q - origin))
                .collect::<Vec<_>>(),
        );
    }

    stitch(&sections, false)
}

fn loop_normal(outline: &[Point3<f64>]) -> KernelResult<Vector3<f64>> {
    if outline.len() < 3 {
        return Err(KernelError::invalid("profile must be a closed loop"));
    }
    newell_normal(outline)
        .try_normalize(1e-14)
        .ok_or_else(|| KernelError::degenerate("profile encloses no area"))
}

fn check_one_side_of_axis(
    outline: &[Point3<f64>],
    normal: &Vector3<f64>,
    origin: &Point3<f64>,
    axis: &Vector3<f64>,
) -> KernelResult<()> {
    // Only meaningful when the axis lies in the plane of the profile
    if normal.dot(axis).abs() > 1e-6 {
        return Ok(());
    }
    let sides: Vec<f64> = outline
        .iter()
        .map(|p| (p - origin).cross(axis).dot(normal))
        .filter(|side| side.abs() > POINT_TOLERANCE)
        .collect();
    let positive = sides.iter().any(|s| *s > 0.0);
    let negative = sides.iter().any(|s| *s < 0.0);
    if positive && negative {
        Err(KernelError::invalid("profile crosses the revolution axis"))
    } else {
        Ok(())
    }
}

/// Catmull-Rom interpolation between corresponding points of the sections
fn smooth_sections(sections: &[Vec<Point3<f64>>]) -> Vec<Vec<Point3<f64>>> {
    let n = sections.len();
    let mut smooth = Vec::with_capacity((n - 1) * SMOOTH_LOFT_STEPS + 1);
    for i in 0..n - 1 {
        let p0 = &sections[i.saturating_sub(1)];
        let p1 = &sections[i];
        let p2 = &sections[i + 1];
        let p3 = &sections[(i + 2).min(n - 1)];
        for step in 0..SMOOTH_LOFT_STEPS {
            let t = step as f64 / SMOOTH_LOFT_STEPS as f64;
            let (t2, t3) = (t * t, t * t * t);
            let section = (0..p1.len())
                .map(|j| {
                    let (a, b, c, d) = (p0[j].coords, p1[j].coords, p2[j].coords, p3[j].coords);
                    Point3::from(
                        (b * 2.0
                            + (c - a) * t
                            + (a * 2.0 - b * 5.0 + c * 4.0 - d) * t2
                            + (b * 3.0 - a - c * 3.0 + d) * t3)
                            * 0.5,
                    )
                })
                .collect();
            smooth.push(section);
        }
    }
    smooth.push(sections[n - 1].clone());
    smooth
}

/// Close a sequence of equally sized loops into a solid.
/// Open sequences are capped at both ends; `wrap` joins the last loop back to the first.
fn stitch(sections: &[Vec<Point3<f64>>], wrap: bool) -> KernelResult<Solid> {
    let mut polygons = Vec::new();
    let pairs = if wrap { sections.len() } else { sections.len() - 1 };

    for i in 0..pairs {
        let a = &sections[i];
        let b = &sections[(i + 1) % sections.len()];
        let m = a.len();
        for j in 0..m {
            let k = (j + 1) % m;
            side_polygons(&[a[j], a[k], b[k], b[j]], &mut polygons);
        }
    }

    if !wrap {
        let first = &sections[0];
        let last = &sections[sections.len() - 1];
        let mut start_cap = first.clone();
        start_cap.reverse();
        cap_polygons(&start_cap, &mut polygons)?;
        cap_polygons(last, &mut polygons)?;
    }

    if polygons.is_empty() {
        return Err(KernelError::degenerate("sweep produced no surface"));
    }
    let solid = Solid::from_polygons(polygons);
    if solid.volume().abs() < 1e-15 {
        return Err(KernelError::degenerate("sweep encloses no volume"));
    }
    Ok(solid)
}

fn side_polygons(quad: &[Point3<f64>; 4], out: &mut Vec<Polygon>) {
    let mut points: Vec<Point3<f64>> = quad.to_vec();
    points.dedup_by(|a, b| (*a - *b).norm() < POINT_TOLERANCE);
    if points.len() > 1 && (points[0] - points[points.len() - 1]).norm() < POINT_TOLERANCE {
        points.pop();
    }
    if points.len() < 3 {
        return;
    }

    if points.len() == 4 {
        let planar = Polygon::new(points.clone()).map(|polygon| {
            points
                .iter()
                .all(|p| polygon.plane.signed_distance(p).abs() < 1e-9)
        });
        if planar != Some(true) {
            out.extend(Polygon::new(vec![points[0], points[1], points[2]]));
            out.extend(Polygon::new(vec![points[0], points[2], points[3]]));
            return;
        }
    }
    out.extend(Polygon::new(points));
}

fn cap_polygons(outline: &[Point3<f64>], out: &mut Vec<Polygon>) -> KernelResult<()> {
    let normal = loop_normal(outline)?;
    for [a, b, c] in triangulate(outline, &normal)? {
        out.extend(Polygon::new(vec![outline[a], outline[b], outline[c]]));
    }
    Ok(())
}
