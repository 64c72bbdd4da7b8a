// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Binary STL export

use crate::engine::Context;
use crate::error::{CsgError, Result};
use crate::geometry::Mesh;
use crate::kernel::Kernel;
use std::io::{self, Write};
use std::path::Path;
use stl_io::{Normal, Triangle as StlTriangle, Vertex as StlVertex};
use tempfile::NamedTempFile;
use tracing::info;

/// Meshing tolerance used when none is given
pub const DEFAULT_TOLERANCE: f64 = 0.001;

/// Size of the binary STL header plus triangle count
pub const HEADER_LEN: u64 = 84;
/// Size of one binary STL triangle record
pub const TRIANGLE_LEN: u64 = 50;

/// What to export: a solid still to be meshed, or a finished mesh
#[derive(Debug, Clone, Copy)]
pub enum ExportSource<'a, S> {
    Solid(&'a S),
    Mesh(&'a Mesh),
}

/// Encode `mesh` as binary STL. Normals and attribute bytes are written as zeros.
pub fn write_stl<W: Write>(mesh: &Mesh, writer: &mut W) -> io::Result<()> {
    if u32::try_from(mesh.triangle_count()).is_err() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "too many triangles for binary STL",
        ));
    }

    let vertex = |index: usize| {
        let p = mesh.vertex(index);
        StlVertex::new([p.x as f32, p.y as f32, p.z as f32])
    };
    let triangles: Vec<StlTriangle> = mesh
        .triangles
        .iter()
        .map(|tri| StlTriangle {
            normal: Normal::new([0.0, 0.0, 0.0]),
            vertices: [
                vertex(tri.indices[0]),
                vertex(tri.indices[1]),
                vertex(tri.indices[2]),
            ],
        })
        .collect();

    stl_io::write_stl(writer, triangles.iter())
}

/// Write `mesh` to `path` through a temporary file in the same directory,
/// renamed into place only once fully written
pub fn save_stl(mesh: &Mesh, path: &Path) -> Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(directory).map_err(|e| CsgError::io(path, e))?;
    write_stl(mesh, &mut temp).map_err(|e| CsgError::io(path, e))?;
    temp.as_file().sync_all().map_err(|e| CsgError::io(path, e))?;
    temp.persist(path).map_err(|e| CsgError::io(path, e.error))?;
    Ok(())
}

/// Mesh `source` if needed and save it as binary STL. Returns the triangle count.
pub fn export<K: Kernel>(
    kernel: &K,
    source: ExportSource<'_, K::Solid>,
    path: impl AsRef<Path>,
    tolerance: f64,
) -> Result<usize> {
    let path = path.as_ref();
    let meshed;
    let mesh = match source {
        ExportSource::Mesh(mesh) => mesh,
        ExportSource::Solid(solid) => {
            meshed = kernel.create_mesh(solid, tolerance)?;
            &meshed
        }
    };

    save_stl(mesh, path)?;
    info!(
        path = %path.display(),
        triangles = mesh.triangle_count(),
        "Exported STL"
    );
    Ok(mesh.triangle_count())
}

impl<K: Kernel> Context<K> {
    /// Export the root accumulator; every scope must be closed
    pub fn export(&self, path: impl AsRef<Path>, tolerance: f64) -> Result<usize> {
        let solid = self.result()?;
        export(self.kernel(), ExportSource::Solid(solid), path, tolerance)
    }
}
