//! Parties and their movement on the campaign map
//!
//! Parties are groups of troops that move across the campaign map. The
//! movement step only ever follows the party's current directive; deciding
//! on directives is the job of whoever drives the campaign.

use serde::{Deserialize, Serialize};

use crate::core::types::{ConflictId, FactionId, HeroId, PartyId, SettlementId, Vec2};
use crate::host::MovementDirective;

/// Default distance a party covers per tick
pub const DEFAULT_PARTY_SPEED: f32 = 1.0;

/// Result of movement execution
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementResult {
    NoOrders,
    Moving,
    Arrived,
    /// Inactive, garrisoned or fighting
    Stationary,
}

/// A party on the campaign map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    pub id: PartyId,
    pub name: String,
    pub faction: FactionId,
    pub leader: Option<HeroId>,
    pub position: Vec2,
    pub speed: f32,
    /// Inactive parties do not move on their own or seek encounters
    pub active: bool,
    pub visible_on_map: bool,
    pub rendered: bool,
    pub movement: MovementDirective,
    pub settlement: Option<SettlementId>,
    pub conflict: Option<ConflictId>,
    pub in_encounter: bool,
    /// Picks random destinations when left to its own devices
    pub wanders: bool,
}

impl Party {
    pub fn new(id: PartyId, name: String, faction: FactionId, position: Vec2) -> Self {
        Self {
            id,
            name,
            faction,
            leader: None,
            position,
            speed: DEFAULT_PARTY_SPEED,
            active: true,
            visible_on_map: true,
            rendered: true,
            movement: MovementDirective::Independent,
            settlement: None,
            conflict: None,
            in_encounter: false,
            wanders: false,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Can the party move by itself this tick?
    pub fn can_move(&self) -> bool {
        self.active && self.settlement.is_none() && self.conflict.is_none()
    }

    /// Step toward `target` for one tick
    ///
    /// `target` is resolved by the caller from the directive, since escort
    /// targets live in other parties.
    pub fn execute_movement(&mut self, target: Option<Vec2>) -> MovementResult {
        if !self.can_move() {
            return MovementResult::Stationary;
        }

        let Some(target) = target else {
            return MovementResult::NoOrders;
        };

        if self.position == target {
            return MovementResult::Arrived;
        }

        self.position = self.position.step_toward(&target, self.speed);
        if self.position == target {
            if let MovementDirective::MoveTo(_) = self.movement {
                self.movement = MovementDirective::Independent;
            }
            MovementResult::Arrived
        } else {
            MovementResult::Moving
        }
    }
}
