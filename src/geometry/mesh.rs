// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh representation and utilities

use super::BoundingBox;
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Vertex with position and normal
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Vertex {
    pub fn at(position: Point3<f64>) -> Self {
        Self { position, normal: Vector3::zeros() }
    }
}

/// Triangle defined by three vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }

    pub fn is_degenerate(&self) -> bool {
        let [a, b, c] = self.indices;
        a == b || b == c || a == c
    }
}

/// Triangular mesh: ordered vertices plus index triples into them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn vertex(&self, index: usize) -> Point3<f64> {
        self.vertices[index].position
    }

    /// Positions of the three corners of every triangle, in index order
    pub fn triangle_positions(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        self.triangles.iter().map(move |t| {
            [
                self.vertices[t.indices[0]].position,
                self.vertices[t.indices[1]].position,
                self.vertices[t.indices[2]].position,
            ]
        })
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.vertices.iter().map(|v| &v.position))
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Append another mesh without any boolean processing
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);

        for triangle in &other.triangles {
            self.triangles.push(Triangle::new([
                triangle.indices[0] + offset,
                triangle.indices[1] + offset,
                triangle.indices[2] + offset,
            ]));
        }
    }

    /// Signed volume enclosed by the mesh (positive for outward winding)
    pub fn volume(&self) -> f64 {
        self.triangle_positions()
            .map(|[a, b, c]| a.coords.dot(&b.coords.cross(&c.coords)) / 6.0)
            .sum()
    }

    /// Weld vertices that fall into the same cell of a grid with the given spacing.
    /// Triangle indices are remapped and triangles that collapse are dropped.
    /// Returns the number of vertices removed.
    pub fn weld_vertices(&mut self, epsilon: f64) -> usize {
        if self.vertices.is_empty() || epsilon <= 0.0 {
            return 0;
        }

        let original_count = self.vertices.len();
        let mut cells: AHashMap<(i64, i64, i64), usize> = AHashMap::new();
        let mut new_vertices: Vec<Vertex> = Vec::with_capacity(original_count);
        let mut remap: Vec<usize> = Vec::with_capacity(original_count);

        for vertex in &self.vertices {
            let p = vertex.position;
            let key = (
                (p.x / epsilon).round() as i64,
                (p.y / epsilon).round() as i64,
                (p.z / epsilon).round() as i64,
            );
            let index = *cells.entry(key).or_insert_with(|| {
                new_vertices.push(*vertex);
                new_vertices.len() - 1
            });
            remap.push(index);
        }

        for triangle in &mut self.triangles {
            for index in &mut triangle.indices {
                *index = remap[*index];
            }
        }
        self.triangles.retain(|t| !t.is_degenerate());
        self.vertices = new_vertices;

        original_count - self.vertices.len()
    }

    /// Remove vertices not referenced by any triangle.
    /// Returns the number of vertices removed.
    pub fn remove_orphaned_vertices(&mut self) -> usize {
        let mut used = vec![false; self.vertices.len()];
        for triangle in &self.triangles {
            for &index in &triangle.indices {
                used[index] = true;
            }
        }

        let mut remap = vec![0; self.vertices.len()];
        let mut kept = Vec::with_capacity(self.vertices.len());
        for (old_index, vertex) in self.vertices.iter().enumerate() {
            if used[old_index] {
                remap[old_index] = kept.len();
                kept.push(*vertex);
            }
        }

        for triangle in &mut self.triangles {
            for index in &mut triangle.indices {
                *index = remap[*index];
            }
        }

        let removed = self.vertices.len() - kept.len();
        self.vertices = kept;
        removed
    }

    /// Recompute vertex normals as area-weighted averages of face normals
    pub fn recompute_normals(&mut self) {
        let mut sums: Vec<Vector3<f64>> = vec![Vector3::zeros(); self.vertices.len()];

        for triangle in &self.triangles {
            let [i0, i1, i2] = triangle.indices;
            let edge1 = self.vertices[i1].position - self.vertices[i0].position;
            let edge2 = self.vertices[i2].position - self.vertices[i0].position;
            // Cross product length is twice the area, which is the weight we want
            let face_normal = edge1.cross(&edge2);
            for &index in &triangle.indices {
                sums[index] += face_normal;
            }
        }

        for (vertex, sum) in self.vertices.iter_mut().zip(sums) {
            vertex.normal = sum
                .try_normalize(1e-12)
                .unwrap_or_else(|| Vector3::new(0.0, 0.0, 1.0));
        }
    }
}
