//! Run configuration.
//!
//! Three knobs shape a run:
//! - `decision_count` (D): number of candidate decisions
//! - `convergence_threshold`: largest pairwise L1 distance within a clique
//!   that still counts as agreement; at or above it no sharpening happens
//! - `sharpen_power`: exponent mapping the distance ratio onto the small end
//!   of the rank multiplier; smaller values sharpen more gently

use std::str::FromStr;

use crate::error::{Error, Result};

/// Default clique-disagreement threshold for sharpening.
pub const DEFAULT_CONVERGENCE_THRESHOLD: f64 = 0.3;

/// Default exponent for the sharpening ratio.
pub const DEFAULT_SHARPEN_POWER: f64 = 0.3;

/// Decision count used by [`ConvergenceConfig::default`].
pub const DEFAULT_DECISION_COUNT: usize = 30;

/// Environment variable for the decision count.
pub const ENV_DECISIONS: &str = "UNIPOLAR_DECISIONS";
/// Environment variable for the convergence threshold.
pub const ENV_THRESHOLD: &str = "UNIPOLAR_THRESHOLD";
/// Environment variable for the sharpen power.
pub const ENV_POWER: &str = "UNIPOLAR_POWER";

/// Configuration for a convergence run. Fixed for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ConvergenceConfig {
    /// Number of candidate decisions (D)
    pub decision_count: usize,
    /// Sharpen only when the clique's max pairwise L1 distance is below this
    #[cfg_attr(feature = "serde", serde(default = "default_threshold"))]
    pub convergence_threshold: f64,
    /// Exponent applied to `diff_max / threshold`
    #[cfg_attr(feature = "serde", serde(default = "default_power"))]
    pub sharpen_power: f64,
}

#[cfg(feature = "serde")]
fn default_threshold() -> f64 {
    DEFAULT_CONVERGENCE_THRESHOLD
}

#[cfg(feature = "serde")]
fn default_power() -> f64 {
    DEFAULT_SHARPEN_POWER
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DECISION_COUNT)
    }
}

impl ConvergenceConfig {
    /// Config for `decision_count` decisions with default threshold and power.
    pub const fn new(decision_count: usize) -> Self {
        Self {
            decision_count,
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
            sharpen_power: DEFAULT_SHARPEN_POWER,
        }
    }

    /// Replace the convergence threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    /// Replace the sharpen power.
    pub fn with_power(mut self, power: f64) -> Self {
        self.sharpen_power = power;
        self
    }

    /// Create config from environment variables, defaulting unset ones.
    ///
    /// A variable that is set but does not parse is an error rather than
    /// a silent fallback.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            decision_count: env_or(ENV_DECISIONS, DEFAULT_DECISION_COUNT)?,
            convergence_threshold: env_or(ENV_THRESHOLD, DEFAULT_CONVERGENCE_THRESHOLD)?,
            sharpen_power: env_or(ENV_POWER, DEFAULT_SHARPEN_POWER)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every value is in range.
    pub fn validate(&self) -> Result<()> {
        if self.decision_count == 0 {
            return Err(Error::InvalidConfig(
                "decision count must be at least 1".to_string(),
            ));
        }
        if !(self.convergence_threshold.is_finite() && self.convergence_threshold > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "convergence threshold must be finite and positive, got {}",
                self.convergence_threshold
            )));
        }
        if !(self.sharpen_power.is_finite() && self.sharpen_power > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "sharpen power must be finite and positive, got {}",
                self.sharpen_power
            )));
        }
        Ok(())
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::InvalidConfig(format!("{key}={raw:?}: {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConvergenceConfig::default();
        assert_eq!(config.decision_count, 30);
        assert_eq!(config.convergence_threshold, 0.3);
        assert_eq!(config.sharpen_power, 0.3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides() {
        let config = ConvergenceConfig::new(4).with_threshold(0.5).with_power(1.0);
        assert_eq!(config.decision_count, 4);
        assert_eq!(config.convergence_threshold, 0.5);
        assert_eq!(config.sharpen_power, 1.0);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            ConvergenceConfig::new(0).validate(),
            Err(Error::InvalidConfig(_))
        ));
        for threshold in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(
                ConvergenceConfig::new(3).with_threshold(threshold).validate().is_err(),
                "threshold {} should be rejected",
                threshold
            );
        }
        for power in [0.0, -0.3, f64::NAN] {
            assert!(
                ConvergenceConfig::new(3).with_power(power).validate().is_err(),
                "power {} should be rejected",
                power
            );
        }
    }

    #[test]
    fn env_parsing() {
        // Private keys so parallel tests never race on the public ones
        std::env::set_var("UNIPOLAR_TEST_DECISIONS", " 12 ");
        std::env::set_var("UNIPOLAR_TEST_BAD", "many");

        assert_eq!(env_or("UNIPOLAR_TEST_DECISIONS", 1usize).unwrap(), 12);
        assert_eq!(env_or("UNIPOLAR_TEST_UNSET", 0.25f64).unwrap(), 0.25);
        assert!(matches!(
            env_or("UNIPOLAR_TEST_BAD", 1usize),
            Err(Error::InvalidConfig(_))
        ));
    }
}
