// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Binary STL export of composed models

use anyhow::Result;
use nalgebra::Point3;
use polyframe_csg::io::{self, ExportSource, HEADER_LEN, TRIANGLE_LEN};
use polyframe_csg::{Combinator, Context, CsgError, Kernel, MeshKernel};
use std::fs;

fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
    Point3::new(x, y, z)
}

fn model() -> Result<Context<MeshKernel>> {
    let mut ctx = Context::new(MeshKernel::default());
    ctx.difference(|ctx| {
        ctx.box_(p(0.0, 0.0, 0.0), p(2.0, 2.0, 1.0))?;
        ctx.cylinder(p(1.0, 1.0, -1.0), p(1.0, 1.0, 2.0), 0.5)
    })?;
    Ok(ctx)
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

#[test]
fn file_length_matches_triangle_count() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("part.stl");

    let triangles = model()?.export(&path, io::DEFAULT_TOLERANCE)?;
    let bytes = fs::read(&path)?;

    assert!(triangles > 0);
    assert_eq!(bytes.len() as u64, HEADER_LEN + TRIANGLE_LEN * triangles as u64);
    assert_eq!(read_u32(&bytes, 80) as usize, triangles);
    Ok(())
}

#[test]
fn header_and_normals_are_zero() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("part.stl");
    let triangles = model()?.export(&path, io::DEFAULT_TOLERANCE)?;
    let bytes = fs::read(&path)?;

    assert!(bytes[..80].iter().all(|&b| b == 0));
    for t in 0..triangles {
        let record = &bytes[84 + 50 * t..84 + 50 * (t + 1)];
        assert!(record[..12].iter().all(|&b| b == 0));
        assert_eq!(&record[48..], &[0, 0]);
    }
    Ok(())
}

#[test]
fn exporting_twice_is_byte_identical() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let first = dir.path().join("first.stl");
    let second = dir.path().join("second.stl");

    let ctx = model()?;
    ctx.export(&first, io::DEFAULT_TOLERANCE)?;
    ctx.export(&second, io::DEFAULT_TOLERANCE)?;
    assert_eq!(fs::read(&first)?, fs::read(&second)?);

    // A freshly built identical model produces the same bytes
    let third = dir.path().join("third.stl");
    model()?.export(&third, io::DEFAULT_TOLERANCE)?;
    assert_eq!(fs::read(&first)?, fs::read(&third)?);
    Ok(())
}

#[test]
fn vertices_are_written_as_f32() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("cube.stl");

    let mut ctx = Context::new(MeshKernel::default());
    ctx.box_(p(0.0, 0.0, 0.0), p(1.5, 2.5, 3.5))?;
    let triangles = ctx.export(&path, io::DEFAULT_TOLERANCE)?;
    assert_eq!(triangles, 12);

    let bytes = fs::read(&path)?;
    let mut max = [f32::MIN; 3];
    for t in 0..triangles {
        for v in 0..3 {
            for (axis, slot) in max.iter_mut().enumerate() {
                let offset = 84 + 50 * t + 12 + 12 * v + 4 * axis;
                let value = f32::from_le_bytes([
                    bytes[offset],
                    bytes[offset + 1],
                    bytes[offset + 2],
                    bytes[offset + 3],
                ]);
                *slot = slot.max(value);
            }
        }
    }
    assert_eq!(max, [1.5, 2.5, 3.5]);
    Ok(())
}

#[test]
fn export_needs_closed_scopes() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("open.stl");

    let mut ctx = model()?;
    let _scope = ctx.enter_scope(Combinator::Union);
    let err = ctx.export(&path, io::DEFAULT_TOLERANCE).unwrap_err();
    assert!(matches!(err, CsgError::UnclosedScopes { open: 1 }));
    assert!(!path.exists());
    Ok(())
}

#[test]
fn failed_write_keeps_previous_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("part.stl");
    fs::write(&path, b"previous")?;

    // Meshing fails before anything is written
    let empty = Context::new(MeshKernel::default());
    assert!(empty.export(&path, io::DEFAULT_TOLERANCE).is_err());
    assert_eq!(fs::read(&path)?, b"previous");
    Ok(())
}

#[test]
fn export_of_existing_mesh() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("mesh.stl");

    let kernel = MeshKernel::default();
    let solid = kernel.create_box(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))?;
    let mesh = kernel.create_mesh(&solid, io::DEFAULT_TOLERANCE)?;

    let written = io::export(&kernel, ExportSource::Mesh(&mesh), &path, io::DEFAULT_TOLERANCE)?;
    assert_eq!(written, mesh.triangle_count());
    assert_eq!(fs::metadata(&path)?.len(), HEADER_LEN + TRIANGLE_LEN * written as u64);
    Ok(())
}
