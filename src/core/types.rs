//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Game tick counter (simulation time unit)
pub type Tick = u64;

/// Unique identifier for a party (a unit moving on the campaign map)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartyId(pub u32);

/// Unique identifier for a hero (a character who can lead a party)
///
/// This is the opaque reference persisted for the leader. It is resolved
/// back to a live party through the host after every reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeroId(pub u32);

/// Unique identifier for factions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactionId(pub u32);

impl FactionId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Settlement identifier for campaign map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SettlementId(pub u32);

/// Identifier of a conflict (battle, siege or raid)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConflictId(pub u32);

/// Which side of a conflict a party fights on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleSide {
    Attacker,
    Defender,
}

impl BattleSide {
    pub fn opposite(&self) -> Self {
        match self {
            Self::Attacker => Self::Defender,
            Self::Defender => Self::Attacker,
        }
    }
}

/// Campaign clock mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeControl {
    Stop,
    #[default]
    Play,
    FastForward,
}

/// 2D position on the campaign map
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0001 {
            Self { x: self.x / len, y: self.y / len }
        } else {
            Self::default()
        }
    }

    /// Step toward `target` by at most `max_step`, landing exactly on it when close
    pub fn step_toward(&self, target: &Self, max_step: f32) -> Self {
        if self.distance(target) <= max_step {
            return *target;
        }
        *self + (*target - *self).normalize() * max_step
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_id_hash() {
        use std::collections::HashMap;
        let mut map: HashMap<PartyId, &str> = HashMap::new();
        map.insert(PartyId(1), "vanguard");
        assert_eq!(map.get(&PartyId(1)), Some(&"vanguard"));
        assert_eq!(map.get(&PartyId(2)), None);
    }

    #[test]
    fn test_battle_side_opposite() {
        assert_eq!(BattleSide::Attacker.opposite(), BattleSide::Defender);
        assert_eq!(BattleSide::Defender.opposite(), BattleSide::Attacker);
    }

    #[test]
    fn test_step_toward() {
        let from = Vec2::new(0.0, 0.0);
        let to = Vec2::new(10.0, 0.0);

        let step = from.step_toward(&to, 4.0);
        assert!((step.x - 4.0).abs() < 1e-5);

        // Close enough snaps onto the target
        let snap = Vec2::new(9.5, 0.0).step_toward(&to, 4.0);
        assert_eq!(snap, to);
    }
}
