// Configuration for the chi-square test engine
//
// Loaded from TOML (e.g. qbreak.toml) or built in code. Every field has a
// default, so a partial file only overrides what it names.

use crate::error::{BreakpointError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Knobs shared by every evaluation in a run
///
/// # Example
/// ```
/// use qbreak::stat_test::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.default_significance, 0.05);
/// assert!(config.yates_correction);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// pcrit used by the `insert_*_default` helpers
    ///
    /// - 0.05 (default): 95% confidence
    /// - 0.01: stricter, fewer false alarms on consistency claims
    /// - 0.10: looser
    pub default_significance: f64,

    /// Apply Yates' continuity correction to 2x2 independence tests
    ///
    /// Only affects tables with exactly one degree of freedom.
    pub yates_correction: bool,

    /// Relative weight of the expected outcome in a classical point mass
    ///
    /// Every other outcome gets weight 1. Default: 2^16.
    pub point_mass_weight: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_significance: 0.05,
            yates_correction: true,
            point_mass_weight: 65536.0,
        }
    }
}

impl EngineConfig {
    /// 99% confidence
    pub fn strict() -> Self {
        Self {
            default_significance: 0.01,
            ..Self::default()
        }
    }

    /// 90% confidence
    pub fn permissive() -> Self {
        Self {
            default_significance: 0.10,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        validate_pcrit(self.default_significance)?;

        if !self.point_mass_weight.is_finite() || self.point_mass_weight <= 1.0 {
            return Err(BreakpointError::config(format!(
                "point_mass_weight must be finite and > 1, got {}",
                self.point_mass_weight
            )));
        }

        Ok(())
    }

    /// Parse and validate a TOML document
    ///
    /// ```
    /// use qbreak::stat_test::EngineConfig;
    ///
    /// let config = EngineConfig::from_toml_str("yates_correction = false").unwrap();
    /// assert!(!config.yates_correction);
    /// assert_eq!(config.default_significance, 0.05);
    /// ```
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self =
            toml::from_str(content).context("Failed to parse engine configuration")?;
        config
            .validate()
            .context("Invalid engine configuration")?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
    }
}

/// pcrit must lie in (0, 1]
pub(crate) fn validate_pcrit(pcrit: f64) -> Result<()> {
    if pcrit > 0.0 && pcrit <= 1.0 {
        Ok(())
    } else {
        Err(BreakpointError::config(format!(
            "significance threshold must be in (0, 1], got {}",
            pcrit
        )))
    }
}
