//! Analysis configuration.
//!
//! Every field has a conventional default, so `AnalysisConfig::default()`
//! reproduces the standard readmission comparison: Welch t-tests, Yates
//! corrected χ², and the usual "expected count ≥ 5" validity rule.

use serde::Deserialize;

use crate::error::AnalysisError;

/// Tunables for a single analysis run.
///
/// # Examples
///
/// ```
/// use u_abtest::config::AnalysisConfig;
///
/// let config = AnalysisConfig::default()
///     .with_equal_variance(true)
///     .with_min_expected_count(10.0);
/// assert!(config.validate().is_ok());
///
/// let parsed = AnalysisConfig::from_json_str(r#"{ "yates_correction": false }"#).unwrap();
/// assert!(!parsed.yates_correction);
/// assert_eq!(parsed.min_expected_count, 5.0);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// χ² results with any expected cell below this are flagged low-confidence.
    pub min_expected_count: f64,
    /// Apply the Yates continuity correction to the 2×2 table.
    pub yates_correction: bool,
    /// Use the pooled-variance Student test instead of Welch.
    pub equal_variance: bool,
    /// Minimum observed values per group before a t-test is attempted.
    pub min_observations_per_group: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_expected_count: 5.0,
            yates_correction: true,
            equal_variance: false,
            min_observations_per_group: 2,
        }
    }
}

impl AnalysisConfig {
    /// Parses a JSON object; absent fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, AnalysisError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_min_expected_count(mut self, count: f64) -> Self {
        self.min_expected_count = count;
        self
    }

    pub fn with_yates_correction(mut self, enabled: bool) -> Self {
        self.yates_correction = enabled;
        self
    }

    pub fn with_equal_variance(mut self, enabled: bool) -> Self {
        self.equal_variance = enabled;
        self
    }

    pub fn with_min_observations_per_group(mut self, n: usize) -> Self {
        self.min_observations_per_group = n;
        self
    }

    /// Checks ranges.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InvalidConfig`] if `min_expected_count` is negative
    /// or non-finite, or `min_observations_per_group < 2` (a sample variance
    /// needs two observations).
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.min_expected_count.is_finite() || self.min_expected_count < 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "min_expected_count must be a non-negative number, got {}",
                self.min_expected_count
            )));
        }
        if self.min_observations_per_group < 2 {
            return Err(AnalysisError::InvalidConfig(format!(
                "min_observations_per_group must be at least 2, got {}",
                self.min_observations_per_group
            )));
        }
        Ok(())
    }
}
