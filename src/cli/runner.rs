// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Script discovery and rendering jobs for the command line

use crate::config::EngineConfig;
use crate::engine::Context;
use crate::geometry::{BoundingBox, MeshKernel};
use crate::kernel::Kernel;
use crate::script;
use anyhow::{bail, Context as _, Result};
use indicatif::ProgressBar;
use nalgebra::Point3;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use walkdir::WalkDir;

/// Extension of modelling scripts
pub const SCRIPT_EXTENSION: &str = "poc";

/// One script to render and where its STL goes
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Result of a successful render
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub triangles: usize,
    pub duration: Duration,
    /// SHA-256 of the written file, when requested
    pub checksum: Option<String>,
    pub echoed: Vec<String>,
}

/// Summary of a model for `info`
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub bounding_box: BoundingBox,
    pub volume: f64,
    pub centre_of_mass: Point3<f64>,
    pub edges: usize,
    pub faces: usize,
    pub triangles: usize,
    pub echoed: Vec<String>,
}

/// Expand the given paths into script files. Directories are walked for
/// `.poc` files; explicit files are taken as they are.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .map(|entry| entry.into_path())
                .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == SCRIPT_EXTENSION))
                .collect();
            // Sort for consistent ordering
            found.sort();
            inputs.extend(found);
        } else if path.is_file() {
            inputs.push(path.clone());
        } else {
            bail!("input not found: {}", path.display());
        }
    }

    Ok(inputs)
}

/// Pair every input with its output path.
///
/// With a single input, `output` names the STL file. With several inputs it
/// names a directory. Without `output` each STL lands next to its script.
pub fn plan_jobs(inputs: Vec<PathBuf>, output: Option<&Path>) -> Vec<RenderJob> {
    let single = inputs.len() == 1;
    inputs
        .into_iter()
        .map(|input| {
            let output = match output {
                Some(path) if single => path.to_path_buf(),
                Some(dir) => dir.join(stl_name(&input)),
                None => input.with_extension("stl"),
            };
            RenderJob { input, output }
        })
        .collect()
}

fn stl_name(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or(input.as_os_str());
    Path::new(stem).with_extension("stl")
}

/// SHA-256 of a file's contents, hex encoded
pub fn checksum(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Runs scripts with one engine configuration
pub struct Runner {
    config: EngineConfig,
    checksum: bool,
}

impl Runner {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            checksum: false,
        }
    }

    pub fn with_checksum(mut self, enabled: bool) -> Self {
        self.checksum = enabled;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute a script file, returning its finished context and echo output
    fn execute(&self, input: &Path) -> Result<(Context<MeshKernel>, Vec<String>)> {
        let source = std::fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input.display()))?;
        let mut ctx = Context::new(MeshKernel::new(self.config.kernel));
        let interpreter = script::run(&source, &mut ctx)
            .with_context(|| format!("failed to run {}", input.display()))?;
        Ok((ctx, interpreter.output().to_vec()))
    }

    pub fn render(&self, job: &RenderJob) -> Result<RenderOutcome> {
        let start = Instant::now();
        let (ctx, echoed) = self.execute(&job.input)?;
        let triangles = ctx
            .export(&job.output, self.config.export.tolerance)
            .with_context(|| format!("failed to export {}", job.output.display()))?;
        let duration = start.elapsed();

        let checksum = if self.checksum {
            Some(checksum(&job.output)?)
        } else {
            None
        };

        Ok(RenderOutcome {
            input: job.input.clone(),
            output: job.output.clone(),
            triangles,
            duration,
            checksum,
            echoed,
        })
    }

    /// Render every job in parallel. Results keep the order of `jobs`.
    pub fn render_all(
        &self,
        jobs: &[RenderJob],
        progress: Option<&ProgressBar>,
    ) -> Vec<(RenderJob, Result<RenderOutcome>)> {
        jobs.par_iter()
            .map(|job| {
                let result = self.render(job);
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                (job.clone(), result)
            })
            .collect()
    }

    pub fn inspect(&self, input: &Path) -> Result<ModelInfo> {
        let (ctx, echoed) = self.execute(input)?;
        let model = ctx.result()?;
        let kernel = ctx.kernel();

        Ok(ModelInfo {
            bounding_box: kernel.bounding_box(model)?,
            volume: kernel.volume(model)?,
            centre_of_mass: kernel.centre_of_mass(model)?,
            edges: kernel.edges(model)?.len(),
            faces: kernel.faces(model)?.len(),
            triangles: kernel
                .create_mesh(model, self.config.export.tolerance)?
                .triangle_count(),
            echoed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn write_script(dir: &Path, name: &str, source: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, source).unwrap();
        path
    }

    #[test]
    fn test_collect_inputs_walks_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        write_script(dir.path(), "b.poc", "");
        write_script(dir.path(), "notes.txt", "");
        write_script(&dir.path().join("nested"), "a.poc", "");

        let inputs = collect_inputs(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(inputs.len(), 2);
        assert!(inputs.iter().all(|p| p.extension().unwrap() == "poc"));
    }

    #[test]
    fn test_collect_inputs_rejects_missing_path() {
        assert!(collect_inputs(&[PathBuf::from("/no/such/script.poc")]).is_err());
    }

    #[test]
    fn test_plan_jobs() {
        let single = plan_jobs(vec![PathBuf::from("a.poc")], Some(Path::new("out.stl")));
        assert_eq!(single[0].output, PathBuf::from("out.stl"));

        let many = plan_jobs(
            vec![PathBuf::from("x/a.poc"), PathBuf::from("y/b.poc")],
            Some(Path::new("build")),
        );
        assert_eq!(many[1].output, PathBuf::from("build/b.stl"));

        let beside = plan_jobs(vec![PathBuf::from("x/a.poc")], None);
        assert_eq!(beside[0].output, PathBuf::from("x/a.stl"));
    }

    #[test]
    fn test_render_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_script(
            dir.path(),
            "part.poc",
            "difference { box([0,0,0], [2,2,2]); cylinder([1,1,-1], [1,1,3], 0.5); }",
        );
        let runner = Runner::new(EngineConfig::default()).with_checksum(true);
        let job = RenderJob {
            input,
            output: dir.path().join("part.stl"),
        };

        let first = runner.render(&job).unwrap();
        let second = runner.render(&job).unwrap();
        assert!(first.triangles > 0);
        assert_eq!(first.checksum, second.checksum);
        assert_eq!(
            std::fs::metadata(&job.output).unwrap().len(),
            84 + 50 * first.triangles as u64
        );
    }

    #[test]
    fn test_render_all_reports_each_job() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_script(dir.path(), "good.poc", "box([0,0,0], [1,1,1]);");
        let bad = write_script(dir.path(), "bad.poc", "box([0,0,0]);");
        let jobs = plan_jobs(vec![good, bad], Some(dir.path()));

        let results = Runner::new(EngineConfig::default()).render_all(&jobs, None);
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
        assert!(!jobs[1].output.exists());
    }

    #[test]
    fn test_inspect() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_script(dir.path(), "cube.poc", "box([0,0,0], [1,2,3]); echo(volume());");
        let info = Runner::new(EngineConfig::default()).inspect(&input).unwrap();
        assert_relative_eq!(info.volume, 6.0, epsilon = 1e-9);
        assert_relative_eq!(info.centre_of_mass.z, 1.5, epsilon = 1e-9);
        assert_eq!(info.edges, 12);
        assert_eq!(info.faces, 6);
        assert_eq!(info.echoed, vec!["6".to_string()]);
    }
}
