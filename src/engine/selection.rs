// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Edge selection for fillet and chamfer

use crate::geometry::{BoundingBox, Edge};
use nalgebra::Vector3;
use std::fmt;

/// Which edges of the current accumulator an edge treatment applies to
pub enum EdgeSelection<'a, E> {
    /// Every edge of the accumulator
    All,
    /// Edges of the accumulator accepted by the predicate
    Predicate(Box<dyn Fn(&E) -> bool + 'a>),
    /// Exactly these edges
    Explicit(Vec<E>),
}

impl<'a, E> EdgeSelection<'a, E> {
    pub fn matching(predicate: impl Fn(&E) -> bool + 'a) -> Self {
        EdgeSelection::Predicate(Box::new(predicate))
    }

    /// Whether resolving needs the accumulator's edges
    pub fn needs_edges(&self) -> bool {
        !matches!(self, EdgeSelection::Explicit(_))
    }

    /// Turn the selection into a concrete edge list, given the accumulator's edges
    pub fn resolve<Err>(self, edges: impl FnOnce() -> Result<Vec<E>, Err>) -> Result<Vec<E>, Err> {
        Ok(match self {
            EdgeSelection::All => edges()?,
            EdgeSelection::Predicate(predicate) => {
                edges()?.into_iter().filter(|edge| predicate(edge)).collect()
            }
            EdgeSelection::Explicit(edges) => edges,
        })
    }
}

impl<E> Default for EdgeSelection<'_, E> {
    fn default() -> Self {
        EdgeSelection::All
    }
}

impl<E> From<Vec<E>> for EdgeSelection<'_, E> {
    fn from(edges: Vec<E>) -> Self {
        EdgeSelection::Explicit(edges)
    }
}

impl<E: fmt::Debug> fmt::Debug for EdgeSelection<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeSelection::All => write!(f, "All"),
            EdgeSelection::Predicate(_) => write!(f, "Predicate(..)"),
            EdgeSelection::Explicit(edges) => f.debug_tuple("Explicit").field(edges).finish(),
        }
    }
}

/// Straight edges running along `axis`
pub fn parallel_to(axis: Vector3<f64>) -> impl Fn(&Edge) -> bool {
    move |edge| edge.is_parallel_to(&axis, 1e-6)
}

/// Edges lying entirely inside `bounds`
pub fn within(bounds: BoundingBox) -> impl Fn(&Edge) -> bool {
    move |edge| edge.points().iter().all(|p| bounds.contains(p, 1e-9))
}

/// Convex edges only
pub fn convex(edge: &Edge) -> bool {
    edge.adjacency().is_some_and(|adjacency| adjacency.convex)
}
