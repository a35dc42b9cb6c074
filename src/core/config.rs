//! Escort configuration with documented constants
//!
//! All tunable numbers are collected here with explanations of their purpose
//! and how they interact with each other.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{EscortError, Result};

/// Configuration for the escort service and the reference campaign host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscortConfig {
    // === CLOCK ===
    /// Number of ticks the campaign host runs per in-game hour
    ///
    /// The per-hour validity check fires once every this many ticks.
    /// Lower = the safety net catches a dead leader sooner when ticking stalls.
    pub ticks_per_hour: u32,

    /// Number of in-game hours per day
    ///
    /// Daily stipend and service experience are paid once per day.
    pub hours_per_day: u32,

    /// Run the coarse per-hour leader validity check
    ///
    /// The per-tick loop performs the same check. The hourly pass only
    /// matters when the host suspends ticking (scene transitions, menus).
    pub hourly_validity_check: bool,

    // === PROGRESSION ===
    /// Experience awarded once for every conflict the follower joins
    pub battle_join_experience: u32,

    /// Experience awarded each day the relationship stays active
    pub daily_service_experience: u32,

    // === WAGES ===
    /// Flat daily stipend paid regardless of tier
    pub stipend_base: u32,

    /// Additional daily stipend per service tier
    ///
    /// At the defaults, a tier 3 follower earns 10 + 3 × 5 = 25 per day.
    pub stipend_per_tier: u32,

    // === MOVEMENT ===
    /// Distance under which follower and leader count as co-located
    ///
    /// Position mirroring leaves the follower where it is inside this radius.
    pub position_epsilon: f32,
}

impl Default for EscortConfig {
    fn default() -> Self {
        Self {
            ticks_per_hour: 4,
            hours_per_day: 24,
            hourly_validity_check: true,

            battle_join_experience: 50,
            daily_service_experience: 10,

            stipend_base: 10,
            stipend_per_tier: 5,

            position_epsilon: 0.01,
        }
    }
}

impl EscortConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text, defaulting missing keys
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: EscortConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Daily stipend owed at a given service tier
    pub fn stipend_for_tier(&self, tier: u32) -> u32 {
        self.stipend_base
            .saturating_add(self.stipend_per_tier.saturating_mul(tier))
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.ticks_per_hour == 0 {
            return Err(EscortError::InvalidConfig(
                "ticks_per_hour must be at least 1".into(),
            ));
        }

        if self.hours_per_day == 0 {
            return Err(EscortError::InvalidConfig(
                "hours_per_day must be at least 1".into(),
            ));
        }

        if self.position_epsilon.is_nan() || self.position_epsilon <= 0.0 {
            return Err(EscortError::InvalidConfig(format!(
                "position_epsilon ({}) must be positive",
                self.position_epsilon
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EscortConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EscortConfig::from_toml_str("stipend_base = 40\nticks_per_hour = 2\n")
            .expect("partial config should parse");

        assert_eq!(config.stipend_base, 40);
        assert_eq!(config.ticks_per_hour, 2);
        assert_eq!(config.hours_per_day, 24);
        assert!(config.hourly_validity_check);
    }

    #[test]
    fn test_zero_ticks_per_hour_rejected() {
        let err = EscortConfig::from_toml_str("ticks_per_hour = 0").unwrap_err();
        assert!(matches!(err, EscortError::InvalidConfig(_)));
    }

    #[test]
    fn test_bad_position_epsilon_rejected() {
        for epsilon in [0.0, -1.0, f32::NAN] {
            let config = EscortConfig {
                position_epsilon: epsilon,
                ..EscortConfig::default()
            };
            assert!(matches!(config.validate(), Err(EscortError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = EscortConfig::from_toml_str("stipend_base = \"lots\"").unwrap_err();
        assert!(matches!(err, EscortError::TomlError(_)));
    }

    #[test]
    fn test_stipend_scales_with_tier() {
        let config = EscortConfig::default();
        assert_eq!(config.stipend_for_tier(0), 10);
        assert_eq!(config.stipend_for_tier(3), 25);
    }
}
