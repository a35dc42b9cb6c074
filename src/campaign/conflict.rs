//! Conflicts on the campaign layer
//!
//! A conflict is any battle, siege or raid between two sides. Each side is
//! an ordered list of parties; the first one leads. Resolution of the
//! fighting itself is out of scope here: a conflict simply runs for a number
//! of ticks or until it is ended explicitly.

use serde::{Deserialize, Serialize};

use crate::core::types::{BattleSide, ConflictId, PartyId, Vec2};

/// Kind of conflict, for logs only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictKind {
    FieldBattle,
    Siege,
    Raid,
}

/// A running or finished conflict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    pub id: ConflictId,
    pub kind: ConflictKind,
    pub position: Vec2,
    pub attackers: Vec<PartyId>,
    pub defenders: Vec<PartyId>,
    /// Ticks left before the conflict resolves by itself
    pub ticks_remaining: Option<u32>,
    pub finished: bool,
}

impl Conflict {
    pub fn new(id: ConflictId, kind: ConflictKind, attacker: PartyId, defender: PartyId, position: Vec2) -> Self {
        Self {
            id,
            kind,
            position,
            attackers: vec![attacker],
            defenders: vec![defender],
            ticks_remaining: None,
            finished: false,
        }
    }

    pub fn with_duration(mut self, ticks: u32) -> Self {
        self.ticks_remaining = Some(ticks);
        self
    }

    pub fn side(&self, side: BattleSide) -> &[PartyId] {
        match side {
            BattleSide::Attacker => &self.attackers,
            BattleSide::Defender => &self.defenders,
        }
    }

    pub fn side_of(&self, party: PartyId) -> Option<BattleSide> {
        if self.attackers.contains(&party) {
            Some(BattleSide::Attacker)
        } else if self.defenders.contains(&party) {
            Some(BattleSide::Defender)
        } else {
            None
        }
    }

    /// Leading party of a side
    pub fn leader_of(&self, side: BattleSide) -> Option<PartyId> {
        self.side(side).first().copied()
    }

    pub fn join(&mut self, party: PartyId, side: BattleSide) {
        if self.side_of(party).is_some() {
            return;
        }
        match side {
            BattleSide::Attacker => self.attackers.push(party),
            BattleSide::Defender => self.defenders.push(party),
        }
    }

    pub fn participants(&self) -> impl Iterator<Item = PartyId> + '_ {
        self.attackers.iter().chain(self.defenders.iter()).copied()
    }

    /// Count down one tick; true when the conflict just resolved
    pub fn advance(&mut self) -> bool {
        if self.finished {
            return false;
        }
        match self.ticks_remaining.as_mut() {
            Some(0) => {
                self.finished = true;
                true
            }
            Some(ticks) => {
                *ticks -= 1;
                if *ticks == 0 {
                    self.finished = true;
                }
                self.finished
            }
            None => false,
        }
    }
}

/// Events for campaign logs
#[derive(Debug, Clone)]
pub enum ConflictEvent {
    Started { conflict: ConflictId, attacker: PartyId, defender: PartyId },
    Joined { conflict: ConflictId, party: PartyId, side: BattleSide },
    Ended { conflict: ConflictId },
}
