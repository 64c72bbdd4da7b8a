// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polygonal solid used by the mesh kernel

use super::csg::{self, Polygon};
use super::{BoundingBox, Mesh, Triangle, Vertex};
use crate::error::{KernelError, KernelResult};
use nalgebra::{Matrix4, Point3, Vector3};

/// Closed polygonal solid, or the null solid that stands for "nothing built yet"
#[derive(Debug, Clone, Default)]
pub struct Solid {
    polygons: Vec<Polygon>,
    defined: bool,
}

impl Solid {
    /// The null solid
    pub fn null() -> Self {
        Self::default()
    }

    /// Solid bounded by `polygons`, outward orientation is restored if needed
    pub fn from_polygons(mut polygons: Vec<Polygon>) -> Self {
        if signed_volume(&polygons) < 0.0 {
            for polygon in &mut polygons {
                polygon.flip();
            }
        }
        Self {
            polygons,
            defined: true,
        }
    }

    /// Wrap polygons whose orientation is already known to be outward
    pub(crate) fn from_oriented(polygons: Vec<Polygon>) -> Self {
        Self {
            polygons,
            defined: true,
        }
    }

    pub fn is_null(&self) -> bool {
        !self.defined
    }

    /// Non-null solid with no boundary, e.g. the intersection of disjoint solids
    pub fn is_empty(&self) -> bool {
        self.defined && self.polygons.is_empty()
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub(crate) fn require(&self, operation: &'static str) -> KernelResult<&Self> {
        if self.is_null() {
            Err(KernelError::NullSolid(operation))
        } else {
            Ok(self)
        }
    }

    pub fn union(&self, other: &Solid) -> KernelResult<Solid> {
        self.require("fuse")?;
        other.require("fuse")?;
        Ok(Self::from_oriented(csg::union(&self.polygons, &other.polygons)))
    }

    pub fn difference(&self, other: &Solid) -> KernelResult<Solid> {
        self.require("cut")?;
        other.require("cut")?;
        Ok(Self::from_oriented(csg::difference(&self.polygons, &other.polygons)))
    }

    pub fn intersection(&self, other: &Solid) -> KernelResult<Solid> {
        self.require("common")?;
        other.require("common")?;
        Ok(Self::from_oriented(csg::intersection(&self.polygons, &other.polygons)))
    }

    /// Apply an affine transform; reflections reverse winding so faces stay outward
    pub fn transform(&mut self, matrix: &Matrix4<f64>) -> KernelResult<()> {
        self.require("transform")?;
        let linear = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let determinant = linear.determinant();
        if !determinant.is_finite() || determinant.abs() < 1e-12 {
            return Err(KernelError::degenerate("transform matrix is singular"));
        }

        let mut transformed = Vec::with_capacity(self.polygons.len());
        for polygon in &self.polygons {
            let mut vertices: Vec<Point3<f64>> = polygon
                .vertices
                .iter()
                .map(|v| matrix.transform_point(v))
                .collect();
            if determinant < 0.0 {
                vertices.reverse();
            }
            // Non-uniform scaling can flatten tiny slivers; those simply vanish
            if let Some(polygon) = Polygon::new(vertices) {
                transformed.push(polygon);
            }
        }
        self.polygons = transformed;
        Ok(())
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.polygons.iter().flat_map(|p| p.vertices.iter()))
    }

    pub fn volume(&self) -> f64 {
        signed_volume(&self.polygons)
    }

    /// Centre of mass of a homogeneous solid, `None` when it has no volume
    pub fn centre_of_mass(&self) -> Option<Point3<f64>> {
        let mut total = 0.0;
        let mut moment = Vector3::zeros();
        for polygon in &self.polygons {
            for [a, b, c] in polygon.triangles() {
                let volume = a.coords.dot(&b.coords.cross(&c.coords)) / 6.0;
                total += volume;
                moment += (a.coords + b.coords + c.coords) * (volume / 4.0);
            }
        }
        if total.abs() < 1e-15 {
            None
        } else {
            Some(Point3::from(moment / total))
        }
    }

    /// Triangulate into an indexed mesh, welding vertices closer than `tolerance`
    pub fn to_mesh(&self, tolerance: f64) -> Mesh {
        let triangle_estimate: usize = self
            .polygons
            .iter()
            .map(|p| p.vertices.len().saturating_sub(2))
            .sum();
        let mut mesh = Mesh::with_capacity(triangle_estimate * 3, triangle_estimate);
        for polygon in &self.polygons {
            for [a, b, c] in polygon.triangles() {
                let i0 = mesh.add_vertex(Vertex::at(a));
                let i1 = mesh.add_vertex(Vertex::at(b));
                let i2 = mesh.add_vertex(Vertex::at(c));
                mesh.add_triangle(Triangle::new([i0, i1, i2]));
            }
        }
        mesh.weld_vertices(tolerance);
        mesh.remove_orphaned_vertices();
        mesh.recompute_normals();
        mesh
    }

    /// Ray-parity point containment test
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        // An irregular direction keeps the ray off edges of axis aligned geometry
        let direction = Vector3::new(0.5773, 0.5774, 0.5772).normalize();
        let mut crossings = 0;
        for polygon in &self.polygons {
            for [a, b, c] in polygon.triangles() {
                if ray_hits_triangle(point, &direction, &a, &b, &c) {
                    crossings += 1;
                }
            }
        }
        crossings % 2 == 1
    }
}

fn signed_volume(polygons: &[Polygon]) -> f64 {
    polygons
        .iter()
        .flat_map(|p| p.triangles())
        .map(|[a, b, c]| a.coords.dot(&b.coords.cross(&c.coords)) / 6.0)
        .sum()
}

/// Möller–Trumbore intersection, counting only hits in front of the origin
fn ray_hits_triangle(
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> bool {
    const EPS: f64 = 1e-12;
    let edge1 = b - a;
    let edge2 = c - a;
    let h = direction.cross(&edge2);
    let det = edge1.dot(&h);
    if det.abs() < EPS {
        return false;
    }
    let inv = 1.0 / det;
    let s = origin - a;
    let u = inv * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return false;
    }
    let q = s.cross(&edge1);
    let v = inv * direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return false;
    }
    inv * edge2.dot(&q) > EPS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::primitives;

    fn unit_box() -> Solid {
        primitives::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0)).unwrap()
    }

    #[test]
    fn test_null_solid_rejects_booleans() {
        let err = Solid::null().union(&unit_box()).unwrap_err();
        assert!(matches!(err, KernelError::NullSolid("fuse")));
    }

    #[test]
    fn test_disjoint_intersection_is_empty_not_null() {
        let far = primitives::cuboid(Point3::new(2.0, 2.0, 2.0), Point3::new(3.0, 3.0, 3.0)).unwrap();
        let common = unit_box().intersection(&far).unwrap();
        assert!(common.is_empty());
        assert!(!common.is_null());
        assert_eq!(common.volume(), 0.0);
    }

    #[test]
    fn test_mirror_keeps_volume_positive() {
        let mut solid = unit_box();
        let mirror = Matrix4::new_nonuniform_scaling(&Vector3::new(-1.0, 1.0, 1.0));
        solid.transform(&mirror).unwrap();
        assert!((solid.volume() - 1.0).abs() < 1e-12);
        assert!((solid.bounding_box().min.x + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_centre_of_mass_of_box() {
        let com = unit_box().centre_of_mass().unwrap();
        assert!((com - Point3::new(0.5, 0.5, 0.5)).norm() < 1e-12);
    }

    #[test]
    fn test_contains() {
        let solid = unit_box();
        assert!(solid.contains(&Point3::new(0.5, 0.5, 0.5)));
        assert!(!solid.contains(&Point3::new(1.5, 0.5, 0.5)));
    }

    #[test]
    fn test_to_mesh_welds_shared_corners() {
        let mesh = unit_box().to_mesh(1e-6);
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        assert!((mesh.volume() - 1.0).abs() < 1e-12);
    }
}
