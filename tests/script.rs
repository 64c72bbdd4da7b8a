// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scripts rendered end to end

use anyhow::Result;
use approx::assert_relative_eq;
use polyframe_csg::script::{self, ScriptError};
use polyframe_csg::{render, render_file, Context, MeshKernel};

fn run(source: &str) -> std::result::Result<Context<MeshKernel>, ScriptError> {
    let mut ctx = Context::new(MeshKernel::default());
    script::run(source, &mut ctx)?;
    Ok(ctx)
}

#[test]
fn bracket_with_holes() -> Result<()> {
    let source = r#"
        // L-shaped bracket with a slot
        thickness = 0.5;
        difference {
            union {
                box([0, 0, 0], [4, 2, thickness]);
                box([0, 0, 0], [thickness, 2, 3]);
            }
            box([2, 0.75, -1], [3, 1.25, 1]);
        }
    "#;
    let ctx = run(source)?;
    let expected = 4.0 * 2.0 * 0.5 + 0.5 * 2.0 * 2.5 - 1.0 * 0.5 * 0.5;
    assert_relative_eq!(ctx.volume()?, expected, epsilon = 1e-9);
    Ok(())
}

#[test]
fn transforms_compose_as_matrices() -> Result<()> {
    let source = "
        box([0,0,0], [1,1,1]);
        transform(translation([10, 0, 0]) * rotation(pi, [0, 0, 1]));
    ";
    let ctx = run(source)?;
    let bounds = ctx.bbox()?;
    assert_relative_eq!(bounds.min.x, 9.0, epsilon = 1e-9);
    assert_relative_eq!(bounds.max.x, 10.0, epsilon = 1e-9);
    assert_relative_eq!(bounds.min.y, -1.0, epsilon = 1e-9);
    Ok(())
}

#[test]
fn revolve_and_loft_profiles() -> Result<()> {
    let source = "
        ring = polygon([[2,0,0], [3,0,0], [3,0,1], [2,0,1]]);
        revolve(ring, [0,0,0], [0,0,1]);
    ";
    let ctx = run(source)?;
    let exact = std::f64::consts::PI * (9.0 - 4.0);
    assert_relative_eq!(ctx.volume()?, exact, max_relative = 0.02);

    let source = "
        loft([circle([0,0,0], [0,0,1], 1), circle([0,0,2], [0,0,1], 0.5)]);
    ";
    let ctx = run(source)?;
    let frustum = std::f64::consts::PI * 2.0 / 3.0 * (1.0 + 0.5 + 0.25);
    assert_relative_eq!(ctx.volume()?, frustum, max_relative = 0.02);
    Ok(())
}

#[test]
fn chamfered_block_with_selector() -> Result<()> {
    let source = "
        chamfered(0.1, parallel([0, 0, 1])) {
            box([0,0,0], [1,1,1]);
        }
        echo(len(edges()));
    ";
    let mut ctx = Context::new(MeshKernel::default());
    let interpreter = script::run(source, &mut ctx)?;
    assert_relative_eq!(ctx.volume()?, 1.0 - 4.0 * 0.005, epsilon = 1e-9);
    assert_eq!(interpreter.output().len(), 1);
    Ok(())
}

#[test]
fn inquiries_feed_later_statements() -> Result<()> {
    let source = "
        box([0,0,0], [1,2,3]);
        bounds = bbox();
        size = bounds[1];
        echo(bounds, volume());
    ";
    let mut ctx = Context::new(MeshKernel::default());
    let interpreter = script::run(source, &mut ctx)?;
    assert_eq!(interpreter.output(), ["[[0, 0, 0], [1, 2, 3]], 6"]);
    Ok(())
}

#[test]
fn errors_report_lines() {
    let err = run("box([0,0,0], [1,1,1]);\n\nsphere([0,0,0], -2);").err().unwrap();
    assert_eq!(err.line(), Some(3));

    let err = run("box([0,0,0], [1,1,1])").err().unwrap();
    assert!(matches!(err, ScriptError::Parse(_)));
}

#[test]
fn render_produces_mesh() -> Result<()> {
    let mesh = render("sphere([0,0,0], 1);")?;
    assert!(mesh.triangle_count() > 0);
    let bounds = mesh.bounding_box();
    assert_relative_eq!(bounds.max.x, 1.0, epsilon = 1e-9);
    Ok(())
}

#[test]
fn render_file_reads_script() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("cube.poc");
    std::fs::write(&path, "box([0,0,0], [1,1,1]);")?;
    assert_eq!(render_file(&path)?.triangle_count(), 12);

    assert!(render_file(dir.path().join("missing.poc")).is_err());
    Ok(())
}
