// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric primitives generator

use super::csg::Polygon;
use super::Solid;
use crate::error::{KernelError, KernelResult};
use nalgebra::{Point3, Unit, Vector3};
use std::f64::consts::PI;

/// Smallest extent accepted for a primitive dimension
const MIN_EXTENT: f64 = 1e-9;

/// Orthonormal vectors `(u, v)` with `u × v = axis`
pub(crate) fn frame(axis: &Unit<Vector3<f64>>) -> (Vector3<f64>, Vector3<f64>) {
    let helper = if axis.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = helper.cross(axis.as_ref()).normalize();
    let v = axis.cross(&u);
    (u, v)
}

fn axis_between(p1: &Point3<f64>, p2: &Point3<f64>, what: &str) -> KernelResult<(Unit<Vector3<f64>>, f64)> {
    let delta = p2 - p1;
    let length = delta.norm();
    if !length.is_finite() || length < MIN_EXTENT {
        return Err(KernelError::invalid(format!("{what} axis has zero length")));
    }
    Ok((Unit::new_unchecked(delta / length), length))
}

fn check_radius(value: f64, name: &str) -> KernelResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(KernelError::invalid(format!("{name} must be a finite non-negative number")));
    }
    Ok(())
}

fn polygon(vertices: Vec<Point3<f64>>) -> KernelResult<Polygon> {
    Polygon::new(vertices).ok_or_else(|| KernelError::degenerate("primitive face has no area"))
}

/// Axis-aligned box spanned by two opposite corners
pub fn cuboid(p1: Point3<f64>, p2: Point3<f64>) -> KernelResult<Solid> {
    let min = p1.inf(&p2);
    let max = p1.sup(&p2);
    let size = max - min;
    if size.min() < MIN_EXTENT {
        return Err(KernelError::invalid(format!(
            "box corners {p1} and {p2} do not span a volume"
        )));
    }

    let corner = |i: usize| {
        Point3::new(
            if i & 1 != 0 { max.x } else { min.x },
            if i & 2 != 0 { max.y } else { min.y },
            if i & 4 != 0 { max.z } else { min.z },
        )
    };

    // Faces listed -x, +x, -y, +y, -z, +z with outward winding
    let faces = [
        [0, 4, 6, 2],
        [1, 3, 7, 5],
        [0, 1, 5, 4],
        [2, 6, 7, 3],
        [0, 2, 3, 1],
        [4, 5, 7, 6],
    ];

    let polygons = faces
        .iter()
        .map(|face| polygon(face.iter().map(|&i| corner(i)).collect()))
        .collect::<KernelResult<Vec<_>>>()?;
    Ok(Solid::from_oriented(polygons))
}

/// Truncated cone around the axis `p1 → p2`; equal radii give a cylinder
pub fn frustum(
    p1: Point3<f64>,
    p2: Point3<f64>,
    radius1: f64,
    radius2: f64,
    segments: u32,
) -> KernelResult<Solid> {
    check_radius(radius1, "radius1")?;
    check_radius(radius2, "radius2")?;
    if radius1 < MIN_EXTENT && radius2 < MIN_EXTENT {
        return Err(KernelError::invalid("cone needs at least one positive radius"));
    }
    let (axis, _) = axis_between(&p1, &p2, "cone")?;
    let (u, v) = frame(&axis);
    let segments = segments.max(3) as usize;

    let ring = |center: &Point3<f64>, radius: f64| -> Vec<Point3<f64>> {
        (0..segments)
            .map(|i| {
                let angle = 2.0 * PI * i as f64 / segments as f64;
                center + (u * angle.cos() + v * angle.sin()) * radius
            })
            .collect()
    };
    let bottom = ring(&p1, radius1);
    let top = ring(&p2, radius2);

    let mut polygons = Vec::with_capacity(segments + 2);
    if radius1 >= MIN_EXTENT {
        polygons.push(polygon(bottom.iter().rev().copied().collect())?);
    }
    if radius2 >= MIN_EXTENT {
        polygons.push(polygon(top.clone())?);
    }

    for i in 0..segments {
        let next = (i + 1) % segments;
        let side = if radius2 < MIN_EXTENT {
            vec![bottom[i], bottom[next], p2]
        } else if radius1 < MIN_EXTENT {
            vec![p1, top[next], top[i]]
        } else {
            vec![bottom[i], bottom[next], top[next], top[i]]
        };
        polygons.push(polygon(side)?);
    }

    Ok(Solid::from_oriented(polygons))
}

/// Torus centred on `p1` whose ring lies in the plane normal to `p2 - p1`
pub fn torus(
    p1: Point3<f64>,
    p2: Point3<f64>,
    ring_radius: f64,
    radius: f64,
    segments: u32,
) -> KernelResult<Solid> {
    check_radius(ring_radius, "ring radius")?;
    check_radius(radius, "tube radius")?;
    if radius < MIN_EXTENT || ring_radius <= radius {
        return Err(KernelError::invalid(format!(
            "torus tube radius {radius} must be positive and smaller than ring radius {ring_radius}"
        )));
    }
    let (axis, _) = axis_between(&p1, &p2, "torus")?;
    let (u, v) = frame(&axis);
    let ring_segments = segments.max(3) as usize;
    let tube_segments = (segments / 2).max(3) as usize;

    let point = |i: usize, j: usize| {
        let theta = 2.0 * PI * (i % ring_segments) as f64 / ring_segments as f64;
        let phi = 2.0 * PI * (j % tube_segments) as f64 / tube_segments as f64;
        let radial = u * theta.cos() + v * theta.sin();
        p1 + radial * (ring_radius + radius * phi.cos()) + axis.into_inner() * (radius * phi.sin())
    };

    let mut polygons = Vec::with_capacity(ring_segments * tube_segments);
    for i in 0..ring_segments {
        for j in 0..tube_segments {
            polygons.push(polygon(vec![
                point(i, j),
                point(i + 1, j),
                point(i + 1, j + 1),
                point(i, j + 1),
            ])?);
        }
    }
    Ok(Solid::from_oriented(polygons))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_from_any_corners() {
        let solid = cuboid(Point3::new(2.0, 1.0, 1.0), Point3::new(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(solid.polygons().len(), 6);
        assert!((solid.volume() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_flat_box_rejected() {
        let err = cuboid(Point3::origin(), Point3::new(1.0, 1.0, 0.0)).unwrap_err();
        assert!(matches!(err, KernelError::InvalidParameter(_)));
    }

    #[test]
    fn test_cylinder_volume_approaches_exact() {
        let solid = frustum(Point3::origin(), Point3::new(0.0, 0.0, 2.0), 1.0, 1.0, 64).unwrap();
        let exact = PI * 2.0;
        assert!(solid.volume() > 0.0);
        assert!((solid.volume() - exact).abs() / exact < 0.01);
    }

    #[test]
    fn test_cone_with_apex() {
        let solid = frustum(Point3::origin(), Point3::new(0.0, 0.0, 3.0), 1.0, 0.0, 64).unwrap();
        let exact = PI / 3.0 * 3.0;
        assert!((solid.volume() - exact).abs() / exact < 0.01);
    }

    #[test]
    fn test_cone_axis_along_x_is_outward() {
        let solid = frustum(Point3::origin(), Point3::new(-2.0, 0.0, 0.0), 1.0, 0.5, 32).unwrap();
        assert!(solid.volume() > 0.0);
    }

    #[test]
    fn test_torus_volume() {
        let solid = torus(Point3::origin(), Point3::new(0.0, 0.0, 1.0), 3.0, 1.0, 96).unwrap();
        let exact = 2.0 * PI * PI * 3.0;
        assert!((solid.volume() - exact).abs() / exact < 0.02);
    }

    #[test]
    fn test_torus_rejects_fat_tube() {
        assert!(torus(Point3::origin(), Point3::new(0.0, 0.0, 1.0), 1.0, 2.0, 16).is_err());
    }
}
