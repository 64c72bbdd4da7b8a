// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boundary topology recovered from a polygonal solid.
//!
//! Coplanar polygons are grouped into faces. Edges are the creases where two
//! faces meet at an angle above the feature threshold, merged along their line
//! so that a box has exactly twelve of them regardless of how the boolean
//! engine fragmented its polygons.

use super::csg::Polygon;
use super::profile::{Edge, EdgeAdjacency, Face, Wire};
use super::Solid;
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};

/// Grid used to match coincident points
const KEY_RESOLUTION: f64 = 1e-6;
/// Distance under which points are treated as lying on a line
const LINE_TOLERANCE: f64 = 1e-6;

type PointKey = (i64, i64, i64);

fn key(p: &Point3<f64>) -> PointKey {
    (
        (p.x / KEY_RESOLUTION).round() as i64,
        (p.y / KEY_RESOLUTION).round() as i64,
        (p.z / KEY_RESOLUTION).round() as i64,
    )
}

/// Coplanar polygons of a solid sharing one outward normal
#[derive(Debug, Clone)]
struct FaceGroup {
    normal: Vector3<f64>,
    w: f64,
    polygons: Vec<usize>,
}

fn group_faces(polygons: &[Polygon]) -> (Vec<FaceGroup>, Vec<usize>) {
    let mut groups: Vec<FaceGroup> = Vec::new();
    let mut face_of = Vec::with_capacity(polygons.len());
    for (index, polygon) in polygons.iter().enumerate() {
        let plane = polygon.plane;
        let existing = groups.iter().position(|g| {
            1.0 - g.normal.dot(&plane.normal) < 1e-10
                && (g.w - plane.w).abs() < 1e-7 * plane.w.abs().max(1.0)
        });
        let face = match existing {
            Some(face) => face,
            None => {
                groups.push(FaceGroup {
                    normal: plane.normal,
                    w: plane.w,
                    polygons: Vec::new(),
                });
                groups.len() - 1
            }
        };
        groups[face].polygons.push(index);
        face_of.push(face);
    }
    (groups, face_of)
}

pub fn faces(solid: &Solid) -> Vec<Face> {
    let polygons = solid.polygons();
    let (groups, _) = group_faces(polygons);
    groups
        .into_iter()
        .map(|group| {
            let patches = group
                .polygons
                .iter()
                .map(|&i| polygons[i].vertices.clone())
                .collect();
            Face::from_patches(patches, group.normal)
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    a: Point3<f64>,
    b: Point3<f64>,
    polygon: usize,
    face: usize,
}

fn segments(polygons: &[Polygon], face_of: &[usize]) -> Vec<Segment> {
    polygons
        .iter()
        .enumerate()
        .flat_map(|(index, polygon)| {
            let n = polygon.vertices.len();
            (0..n).map(move |i| Segment {
                a: polygon.vertices[i],
                b: polygon.vertices[(i + 1) % n],
                polygon: index,
                face: face_of[index],
            })
        })
        .collect()
}

/// Parameter interval of `other` on the line `origin + t·direction`,
/// `None` unless both of its endpoints lie on that line
fn interval_on_line(
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
    other: &Segment,
) -> Option<(f64, f64)> {
    let project = |p: &Point3<f64>| {
        let t = (p - origin).dot(direction);
        let off_line = (p - (origin + direction * t)).norm();
        (off_line < LINE_TOLERANCE).then_some(t)
    };
    let ta = project(&other.a)?;
    let tb = project(&other.b)?;
    Some((ta.min(tb), ta.max(tb)))
}

#[derive(Debug, Clone, Copy)]
struct Crease {
    a: Point3<f64>,
    b: Point3<f64>,
    adjacency: EdgeAdjacency,
}

/// Sharp edges of a solid, one per maximal straight crease between two faces
pub fn edges(solid: &Solid, feature_angle_deg: f64) -> Vec<Edge> {
    let polygons = solid.polygons();
    let (groups, face_of) = group_faces(polygons);
    let segments = segments(polygons, &face_of);
    let threshold = feature_angle_deg.to_radians().cos();

    let mut by_key: AHashMap<(PointKey, PointKey), Vec<usize>> = AHashMap::new();
    for (index, segment) in segments.iter().enumerate() {
        by_key
            .entry((key(&segment.a), key(&segment.b)))
            .or_default()
            .push(index);
    }

    let mut creases: AHashMap<(usize, usize), Vec<Crease>> = AHashMap::new();
    for segment in &segments {
        let f = segment.face;
        let direction = match (segment.b - segment.a).try_normalize(1e-12) {
            Some(direction) => direction,
            None => continue,
        };
        let length = (segment.b - segment.a).norm();

        // Neighbours as (segment, overlap start, overlap end) along this segment
        let mut neighbours: Vec<(usize, f64, f64)> = by_key
            .get(&(key(&segment.b), key(&segment.a)))
            .into_iter()
            .flatten()
            .map(|&t| (t, 0.0, length))
            .collect();

        if neighbours.is_empty() {
            // T-junctions leave the neighbour split into pieces, or longer than us
            for (t, other) in segments.iter().enumerate() {
                if other.polygon == segment.polygon || (other.b - other.a).dot(&direction) >= 0.0 {
                    continue;
                }
                if let Some((lo, hi)) = interval_on_line(&segment.a, &direction, other) {
                    let (lo, hi) = (lo.max(0.0), hi.min(length));
                    if hi - lo > LINE_TOLERANCE {
                        neighbours.push((t, lo, hi));
                    }
                }
            }
        }

        for (t, lo, hi) in neighbours {
            let other = &segments[t];
            let g = other.face;
            if g == f || f > g {
                continue;
            }
            let (n1, n2) = (groups[f].normal, groups[g].normal);
            if n1.dot(&n2) > threshold {
                continue;
            }
            let a = segment.a + direction * lo;
            let b = segment.a + direction * hi;
            let midpoint = Point3::from((a.coords + b.coords) * 0.5);
            let convex = n1.dot(&(polygons[other.polygon].centroid() - midpoint)) < 1e-12;
            creases.entry((f, g)).or_default().push(Crease {
                a,
                b,
                adjacency: EdgeAdjacency {
                    normals: [n1, n2],
                    convex,
                },
            });
        }
    }

    let mut pairs: Vec<(usize, usize)> = creases.keys().copied().collect();
    pairs.sort_unstable();

    let mut result = Vec::new();
    for pair in pairs {
        let mut pending = creases.remove(&pair).unwrap_or_default();
        while let Some(first) = pending.pop() {
            let Some(direction) = (first.b - first.a).try_normalize(1e-12) else {
                continue;
            };
            let origin = first.a;
            let mut intervals = vec![(0.0, (first.b - first.a).norm())];
            pending.retain(|crease| {
                let piece = Segment {
                    a: crease.a,
                    b: crease.b,
                    polygon: 0,
                    face: 0,
                };
                match interval_on_line(&origin, &direction, &piece) {
                    Some(interval) => {
                        intervals.push(interval);
                        false
                    }
                    None => true,
                }
            });

            intervals.sort_by(|x, y| x.0.total_cmp(&y.0));
            let mut merged: Vec<(f64, f64)> = Vec::new();
            for (lo, hi) in intervals {
                match merged.last_mut() {
                    Some(last) if lo <= last.1 + LINE_TOLERANCE => last.1 = last.1.max(hi),
                    _ => merged.push((lo, hi)),
                }
            }
            for (lo, hi) in merged {
                result.push(Edge::crease(
                    origin + direction * lo,
                    origin + direction * hi,
                    first.adjacency,
                ));
            }
        }
    }
    result
}

/// Distinct end points of the sharp edges
pub fn vertices(solid: &Solid, feature_angle_deg: f64) -> Vec<Point3<f64>> {
    let mut seen = AHashMap::new();
    let mut points = Vec::new();
    for edge in edges(solid, feature_angle_deg) {
        for p in [edge.start(), edge.end()] {
            seen.entry(key(&p)).or_insert_with(|| {
                points.push(p);
            });
        }
    }
    points
}

/// Boundary loops of every face
pub fn wires(solid: &Solid) -> Vec<Wire> {
    let polygons = solid.polygons();
    let (groups, face_of) = group_faces(polygons);
    let segments = segments(polygons, &face_of);

    let mut wires = Vec::new();
    for (face, group) in groups.iter().enumerate() {
        let face_segments: Vec<&Segment> = segments.iter().filter(|s| s.face == face).collect();
        match boundary_loops(&face_segments) {
            Some(loops) => wires.extend(loops.into_iter().map(Wire::from_loop)),
            None => wires.extend(
                group
                    .polygons
                    .iter()
                    .map(|&i| Wire::from_loop(polygons[i].vertices.clone())),
            ),
        }
    }
    wires
}

/// Chain the segments that are not shared by two polygons of the same face.
/// `None` when they do not close into loops.
fn boundary_loops(face_segments: &[&Segment]) -> Option<Vec<Vec<Point3<f64>>>> {
    let mut directed: AHashMap<(PointKey, PointKey), usize> = AHashMap::new();
    for segment in face_segments {
        *directed.entry((key(&segment.a), key(&segment.b))).or_default() += 1;
    }
    let boundary: Vec<&Segment> = face_segments
        .iter()
        .copied()
        .filter(|s| !directed.contains_key(&(key(&s.b), key(&s.a))))
        .collect();

    let mut starting_at: AHashMap<PointKey, Vec<usize>> = AHashMap::new();
    for (index, segment) in boundary.iter().enumerate() {
        starting_at.entry(key(&segment.a)).or_default().push(index);
    }

    let mut used = vec![false; boundary.len()];
    let mut loops = Vec::new();
    for start in 0..boundary.len() {
        if used[start] {
            continue;
        }
        let mut points = Vec::new();
        let mut current = start;
        loop {
            used[current] = true;
            points.push(boundary[current].a);
            let end = key(&boundary[current].b);
            if end == key(&boundary[start].a) {
                break;
            }
            current = *starting_at.get(&end)?.iter().find(|&&i| !used[i])?;
        }
        let points = drop_collinear(points);
        if points.len() >= 3 {
            loops.push(points);
        }
    }
    Some(loops)
}

fn drop_collinear(points: Vec<Point3<f64>>) -> Vec<Point3<f64>> {
    let n = points.len();
    if n < 4 {
        return points;
    }
    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            let chord = next - prev;
            let offset = (points[i] - prev).cross(&chord).norm();
            offset > LINE_TOLERANCE * chord.norm().max(1.0)
        })
        .map(|i| points[i])
        .collect()
}
