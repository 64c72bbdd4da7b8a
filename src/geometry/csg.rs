// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CSG (Constructive Solid Geometry) operations using BSP trees
//!
//! Solids are sets of planar convex polygons. Each boolean builds a BSP tree
//! per operand, clips the polygons of one operand against the tree of the
//! other and reassembles the surviving pieces.

use nalgebra::{Point3, Vector3};

/// Distance below which a point is treated as lying on a plane
pub const PLANE_EPSILON: f64 = 1e-7;

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

/// Oriented plane `normal · x = w`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector3<f64>,
    pub w: f64,
}

impl Plane {
    pub fn new(normal: Vector3<f64>, w: f64) -> Self {
        Self { normal, w }
    }

    pub fn through(point: &Point3<f64>, normal: Vector3<f64>) -> Self {
        Self::new(normal, normal.dot(&point.coords))
    }

    /// Plane of a polygon using Newell's method, `None` when the points have no area
    pub fn from_points(points: &[Point3<f64>]) -> Option<Self> {
        let normal = newell_normal(points).try_normalize(1e-14)?;
        let centroid = points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            / points.len() as f64;
        Some(Self::new(normal, normal.dot(&centroid)))
    }

    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) - self.w
    }

    pub fn flipped(&self) -> Self {
        Self::new(-self.normal, -self.w)
    }

    /// Sort `polygon` into one of the four output lists, splitting it when it spans the plane
    fn split_polygon(
        &self,
        polygon: &Polygon,
        coplanar_front: &mut Vec<Polygon>,
        coplanar_back: &mut Vec<Polygon>,
        front: &mut Vec<Polygon>,
        back: &mut Vec<Polygon>,
    ) {
        let mut polygon_type = 0u8;
        let types: Vec<u8> = polygon
            .vertices
            .iter()
            .map(|v| {
                let t = self.signed_distance(v);
                let kind = if t < -PLANE_EPSILON {
                    BACK
                } else if t > PLANE_EPSILON {
                    FRONT
                } else {
                    COPLANAR
                };
                polygon_type |= kind;
                kind
            })
            .collect();

        match polygon_type {
            COPLANAR => {
                if self.normal.dot(&polygon.plane.normal) > 0.0 {
                    coplanar_front.push(polygon.clone());
                } else {
                    coplanar_back.push(polygon.clone());
                }
            }
            FRONT => front.push(polygon.clone()),
            BACK => back.push(polygon.clone()),
            _ => {
                let n = polygon.vertices.len();
                let mut f = Vec::with_capacity(n + 1);
                let mut b = Vec::with_capacity(n + 1);
                for i in 0..n {
                    let j = (i + 1) % n;
                    let (ti, tj) = (types[i], types[j]);
                    let (vi, vj) = (polygon.vertices[i], polygon.vertices[j]);
                    if ti != BACK {
                        f.push(vi);
                    }
                    if ti != FRONT {
                        b.push(vi);
                    }
                    if (ti | tj) == SPANNING {
                        let t = (self.w - self.normal.dot(&vi.coords))
                            / self.normal.dot(&(vj - vi));
                        let v = vi + (vj - vi) * t;
                        f.push(v);
                        b.push(v);
                    }
                }
                if f.len() >= 3 {
                    front.push(Polygon::with_plane(f, polygon.plane));
                }
                if b.len() >= 3 {
                    back.push(Polygon::with_plane(b, polygon.plane));
                }
            }
        }
    }
}

/// Planar convex polygon with counter-clockwise winding around its normal
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<Point3<f64>>,
    pub plane: Plane,
}

impl Polygon {
    /// Build a polygon from its corners, `None` when the corners enclose no area
    pub fn new(vertices: Vec<Point3<f64>>) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }
        let plane = Plane::from_points(&vertices)?;
        Some(Self { vertices, plane })
    }

    fn with_plane(vertices: Vec<Point3<f64>>, plane: Plane) -> Self {
        Self { vertices, plane }
    }

    pub fn flip(&mut self) {
        self.vertices.reverse();
        self.plane = self.plane.flipped();
    }

    pub fn normal(&self) -> Vector3<f64> {
        self.plane.normal
    }

    pub fn centroid(&self) -> Point3<f64> {
        let sum = self
            .vertices
            .iter()
            .fold(Vector3::zeros(), |acc, v| acc + v.coords);
        Point3::from(sum / self.vertices.len() as f64)
    }

    pub fn area(&self) -> f64 {
        newell_normal(&self.vertices).norm() * 0.5
    }

    /// Fan triangles of the (convex) polygon
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        let first = self.vertices[0];
        self.vertices
            .windows(2)
            .skip(1)
            .map(move |pair| [first, pair[0], pair[1]])
    }
}

/// Unnormalised polygon normal whose length is twice the polygon area
pub fn newell_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut normal = Vector3::zeros();
    for (i, current) in points.iter().enumerate() {
        let next = points[(i + 1) % points.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal
}

/// BSP tree node
#[derive(Debug, Clone, Default)]
struct BspNode {
    plane: Option<Plane>,
    front: Option<Box<BspNode>>,
    back: Option<Box<BspNode>>,
    polygons: Vec<Polygon>,
}

impl BspNode {
    fn new(polygons: Vec<Polygon>) -> Self {
        let mut node = Self::default();
        node.build(polygons);
        node
    }

    fn build(&mut self, polygons: Vec<Polygon>) {
        if polygons.is_empty() {
            return;
        }
        let plane = *self.plane.get_or_insert(polygons[0].plane);

        let mut front = Vec::new();
        let mut back = Vec::new();
        let mut coplanar = Vec::new();
        for polygon in &polygons {
            let mut coplanar_back = Vec::new();
            plane.split_polygon(polygon, &mut coplanar, &mut coplanar_back, &mut front, &mut back);
            coplanar.append(&mut coplanar_back);
        }
        self.polygons.append(&mut coplanar);

        if !front.is_empty() {
            self.front
                .get_or_insert_with(|| Box::new(BspNode::default()))
                .build(front);
        }
        if !back.is_empty() {
            self.back
                .get_or_insert_with(|| Box::new(BspNode::default()))
                .build(back);
        }
    }

    fn all_polygons(&self) -> Vec<Polygon> {
        let mut result = self.polygons.clone();
        if let Some(front) = &self.front {
            result.extend(front.all_polygons());
        }
        if let Some(back) = &self.back {
            result.extend(back.all_polygons());
        }
        result
    }

    /// Remove the parts of `polygons` that lie inside this tree's solid
    fn clip_polygons(&self, polygons: &[Polygon]) -> Vec<Polygon> {
        let Some(plane) = self.plane else {
            return polygons.to_vec();
        };

        let mut front = Vec::new();
        let mut back = Vec::new();
        for polygon in polygons {
            let mut coplanar_front = Vec::new();
            let mut coplanar_back = Vec::new();
            plane.split_polygon(polygon, &mut coplanar_front, &mut coplanar_back, &mut front, &mut back);
            front.append(&mut coplanar_front);
            back.append(&mut coplanar_back);
        }

        let mut result = match &self.front {
            Some(node) => node.clip_polygons(&front),
            None => front,
        };
        if let Some(node) = &self.back {
            result.extend(node.clip_polygons(&back));
        }
        result
    }

    fn clip_to(&mut self, other: &BspNode) {
        self.polygons = other.clip_polygons(&self.polygons);
        if let Some(front) = &mut self.front {
            front.clip_to(other);
        }
        if let Some(back) = &mut self.back {
            back.clip_to(other);
        }
    }

    /// Swap solid space and empty space
    fn invert(&mut self) {
        for polygon in &mut self.polygons {
            polygon.flip();
        }
        if let Some(plane) = &mut self.plane {
            *plane = plane.flipped();
        }
        if let Some(front) = &mut self.front {
            front.invert();
        }
        if let Some(back) = &mut self.back {
            back.invert();
        }
        std::mem::swap(&mut self.front, &mut self.back);
    }
}

/// Polygons of `a ∪ b`
pub fn union(a: &[Polygon], b: &[Polygon]) -> Vec<Polygon> {
    // An empty tree clips nothing, so empty operands are handled up front
    if a.is_empty() || b.is_empty() {
        return [a, b].concat();
    }
    let mut tree_a = BspNode::new(a.to_vec());
    let mut tree_b = BspNode::new(b.to_vec());

    tree_a.clip_to(&tree_b);
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_a.build(tree_b.all_polygons());
    tree_a.all_polygons()
}

/// Polygons of `a − b`
pub fn difference(a: &[Polygon], b: &[Polygon]) -> Vec<Polygon> {
    if a.is_empty() || b.is_empty() {
        return a.to_vec();
    }
    let mut tree_a = BspNode::new(a.to_vec());
    let mut tree_b = BspNode::new(b.to_vec());

    tree_a.invert();
    tree_a.clip_to(&tree_b);
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_a.build(tree_b.all_polygons());
    tree_a.invert();
    tree_a.all_polygons()
}

/// Polygons of `a ∩ b`
pub fn intersection(a: &[Polygon], b: &[Polygon]) -> Vec<Polygon> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut tree_a = BspNode::new(a.to_vec());
    let mut tree_b = BspNode::new(b.to_vec());

    tree_a.invert();
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_a.clip_to(&tree_b);
    tree_b.clip_to(&tree_a);
    tree_a.build(tree_b.all_polygons());
    tree_a.invert();
    tree_a.all_polygons()
}
