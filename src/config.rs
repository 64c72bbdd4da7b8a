// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Engine configuration

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File picked up by [`EngineConfig::load`] from the working directory
pub const CONFIG_FILE: &str = "polyframe.toml";

/// Tessellation settings of the mesh kernel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Segments used for a full circle
    pub segments: u32,
    /// Chords used for the arc of a rounded edge
    pub fillet_segments: u32,
    /// Minimum angle in degrees between two faces for their shared edge to count
    pub feature_angle_deg: f64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            segments: 32,
            fillet_segments: 8,
            feature_angle_deg: 0.5,
        }
    }
}

/// Mesh export settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Meshing tolerance handed to the kernel
    pub tolerance: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { tolerance: 0.001 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub kernel: KernelConfig,
    pub export: ExportConfig,
}

impl EngineConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: EngineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `polyframe.toml` if present, then apply environment variable overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(segments) = std::env::var("POLYFRAME_SEGMENTS") {
            self.kernel.segments = segments
                .parse()
                .with_context(|| format!("POLYFRAME_SEGMENTS is not a count: {segments}"))?;
        }

        if let Ok(segments) = std::env::var("POLYFRAME_FILLET_SEGMENTS") {
            self.kernel.fillet_segments = segments
                .parse()
                .with_context(|| format!("POLYFRAME_FILLET_SEGMENTS is not a count: {segments}"))?;
        }

        if let Ok(angle) = std::env::var("POLYFRAME_FEATURE_ANGLE") {
            self.kernel.feature_angle_deg = angle
                .parse()
                .with_context(|| format!("POLYFRAME_FEATURE_ANGLE is not a number: {angle}"))?;
        }

        if let Ok(tolerance) = std::env::var("POLYFRAME_TOLERANCE") {
            self.export.tolerance = tolerance
                .parse()
                .with_context(|| format!("POLYFRAME_TOLERANCE is not a number: {tolerance}"))?;
        }

        Ok(())
    }

    /// Reject settings the kernel cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.kernel.segments < 3 {
            bail!("kernel.segments must be at least 3, got {}", self.kernel.segments);
        }
        if self.kernel.fillet_segments == 0 {
            bail!("kernel.fillet_segments must be at least 1");
        }
        if !(0.0..90.0).contains(&self.kernel.feature_angle_deg) {
            bail!(
                "kernel.feature_angle_deg must lie in [0, 90), got {}",
                self.kernel.feature_angle_deg
            );
        }
        if !self.export.tolerance.is_finite() || self.export.tolerance <= 0.0 {
            bail!("export.tolerance must be positive, got {}", self.export.tolerance);
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}
