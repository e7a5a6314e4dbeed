// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use serde::{Deserialize, Serialize};

use crate::types::{CollisionPolicy, ConversionSettings};

/// Persistent engine settings. These seed the option set of new jobs; a
/// front-end may override any of them per job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default rasterisation resolution for new jobs.
    pub default_dpi: u32,
    /// Default JPEG quality for new jobs.
    pub default_jpeg_quality: u8,
    /// Default collision policy for new jobs.
    pub default_collision: CollisionPolicy,
    /// Whether batch runs write a CSV failure log by default.
    pub write_failure_log: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_dpi: 144,
            default_jpeg_quality: 90,
            default_collision: CollisionPolicy::Overwrite,
            write_failure_log: true,
        }
    }
}

impl EngineConfig {
    /// Build a job option set seeded from this configuration.
    pub fn settings(&self) -> ConversionSettings {
        ConversionSettings {
            render_dpi: self.default_dpi,
            jpeg_quality: self.default_jpeg_quality,
            collision: self.default_collision,
            write_failure_log: self.write_failure_log,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_seeds_job_settings() {
        let config = EngineConfig {
            default_dpi: 300,
            default_jpeg_quality: 75,
            default_collision: CollisionPolicy::AutoRename,
            write_failure_log: false,
        };

        let settings = config.settings();
        assert_eq!(settings.render_dpi, 300);
        assert_eq!(settings.jpeg_quality, 75);
        assert_eq!(settings.collision, CollisionPolicy::AutoRename);
        assert!(!settings.write_failure_log);
        assert!(settings.page_range.is_empty());
    }
}
