// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use super::runner::{ModelInfo, RenderOutcome};
use colored::*;
use std::path::Path;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report one rendered script
    pub fn report_render(outcome: &RenderOutcome, verbose: bool) {
        println!(
            "{} {} {} {}",
            "✅".green(),
            outcome.input.display().to_string().cyan(),
            "->".bright_black(),
            outcome.output.display()
        );
        if verbose {
            println!(
                "  {} {}  {} {}",
                "Triangles:".bright_black(),
                outcome.triangles.to_string().cyan(),
                "Time:".bright_black(),
                Self::format_duration(outcome.duration).yellow()
            );
            for line in &outcome.echoed {
                println!("  {} {}", "echo:".bright_black(), line);
            }
        }
        if let Some(ref checksum) = outcome.checksum {
            println!("  {} {}", "sha256:".bright_black(), checksum);
        }
    }

    /// Report model properties
    pub fn report_info(file: &Path, info: &ModelInfo) {
        let bounds = &info.bounding_box;
        let (min, max, com) = (bounds.min, bounds.max, info.centre_of_mass);

        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Model:".bold(), file.display().to_string().cyan());
        println!("{}", "━".repeat(80).bright_black());
        Self::print_metric(
            "Bounding box",
            &format!(
                "[{:.4}, {:.4}, {:.4}] - [{:.4}, {:.4}, {:.4}]",
                min.x, min.y, min.z, max.x, max.y, max.z
            ),
        );
        Self::print_metric("Volume", &format!("{:.6}", info.volume));
        Self::print_metric(
            "Centre of mass",
            &format!("[{:.4}, {:.4}, {:.4}]", com.x, com.y, com.z),
        );
        Self::print_metric("Edges", &info.edges.to_string());
        Self::print_metric("Faces", &info.faces.to_string());
        Self::print_metric("Triangles", &info.triangles.to_string());
        for line in &info.echoed {
            println!("  {} {}", "echo:".bright_black(), line);
        }
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Totals after a batch render
    pub fn report_summary(rendered: usize, failed: usize, elapsed: Duration) {
        println!("\n{}", "Summary".bold());
        println!("  {} {}", "Rendered:".bright_black(), rendered.to_string().green());
        let failed_text = failed.to_string();
        println!(
            "  {} {}",
            "Failed:".bright_black(),
            if failed > 0 { failed_text.red() } else { failed_text.green() }
        );
        println!(
            "  {} {}",
            "Time:".bright_black(),
            Self::format_duration(elapsed).yellow()
        );
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("{} {}", "❌ Error:".red().bold(), message);
    }

    fn print_metric(name: &str, value: &str) {
        println!("  {} {}", format!("{name}:").bright_black(), value.cyan());
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }
}
