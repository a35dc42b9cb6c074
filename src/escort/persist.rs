//! Versioned save record for the relationship
//!
//! Fields added in later versions carry serde defaults, so a record written
//! by an older build loads cleanly.

use serde::{Deserialize, Serialize};

use crate::core::error::{EscortError, Result};
use crate::escort::state::RelationshipState;

/// Current save format version.
///
/// Version 1 records carried no `reserve` or `prior_visibility`.
pub const SAVE_VERSION: u32 = 2;

fn legacy_version() -> u32 {
    1
}

/// A saved relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscortSave {
    #[serde(default = "legacy_version")]
    pub version: u32,
    #[serde(default)]
    pub state: RelationshipState,
}

impl EscortSave {
    pub fn new(state: RelationshipState) -> Self {
        Self {
            version: SAVE_VERSION,
            state,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let save: EscortSave = serde_json::from_str(json)?;
        if save.version > SAVE_VERSION {
            return Err(EscortError::UnsupportedSaveVersion {
                found: save.version,
                newest: SAVE_VERSION,
            });
        }
        Ok(save)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::HeroId;

    #[test]
    fn test_current_version_roundtrip() {
        let mut state = RelationshipState::new();
        state.begin(HeroId(9), false).unwrap();
        state.set_reserve(true);

        let json = EscortSave::new(state.clone()).to_json().unwrap();
        let loaded = EscortSave::from_json(&json).unwrap();

        assert_eq!(loaded.version, SAVE_VERSION);
        assert_eq!(loaded.state, state);
    }

    #[test]
    fn test_version_one_record_defaults_new_fields() {
        let json = r#"{"version":1,"state":{"is_active":true,"leader":3,"pending_release":false}}"#;
        let loaded = EscortSave::from_json(json).unwrap();

        assert_eq!(loaded.version, 1);
        assert!(loaded.state.is_active());
        assert_eq!(loaded.state.leader(), Some(HeroId(3)));
        assert!(loaded.state.prior_visibility());
        assert!(!loaded.state.reserve());
    }

    #[test]
    fn test_unversioned_record_treated_as_legacy() {
        let loaded = EscortSave::from_json(r#"{"state":{}}"#).unwrap();
        assert_eq!(loaded.version, 1);
        assert!(!loaded.state.is_active());
    }

    #[test]
    fn test_newer_version_rejected() {
        let err = EscortSave::from_json(r#"{"version":99,"state":{}}"#).unwrap_err();
        assert!(matches!(
            err,
            EscortError::UnsupportedSaveVersion { found: 99, newest: SAVE_VERSION }
        ));
    }
}
