//! Towns and castles parties can enter
//!
//! A settlement's owner keeps its gates shut to bandits and to any faction
//! it is at war with.

use serde::{Deserialize, Serialize};

use crate::core::types::{FactionId, SettlementId, Vec2};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    pub id: SettlementId,
    pub name: String,
    pub position: Vec2,
    /// Unowned settlements admit everyone but bandits
    pub owner: Option<FactionId>,
}

impl Settlement {
    pub fn new(id: SettlementId, name: String, position: Vec2, owner: Option<FactionId>) -> Self {
        Self {
            id,
            name,
            position,
            owner,
        }
    }

    /// Does the owner let a party of `faction` in?
    pub fn admits(
        &self,
        faction: FactionId,
        is_bandit: bool,
        at_war: impl Fn(FactionId, FactionId) -> bool,
    ) -> bool {
        if is_bandit {
            return false;
        }
        !self.owner.is_some_and(|owner| at_war(owner, faction))
    }
}
