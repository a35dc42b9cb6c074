//! Persisted record of the follow relationship
//!
//! The only mutable, persisted entity in the escort core. It is created once
//! and mutated in place for the lifetime of the process; loading a save
//! copies fields into the existing record instead of replacing it.

use serde::{Deserialize, Serialize};

use crate::core::error::{EscortError, Result};
use crate::core::types::HeroId;

/// The follow relationship between the follower and its leader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipState {
    is_active: bool,
    leader: Option<HeroId>,
    pending_release: bool,
    prior_visibility: bool,
    reserve: bool,
}

impl Default for RelationshipState {
    fn default() -> Self {
        Self {
            is_active: false,
            leader: None,
            pending_release: false,
            prior_visibility: true,
            reserve: false,
        }
    }
}

impl RelationshipState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn leader(&self) -> Option<HeroId> {
        self.leader
    }

    /// Cleanup is owed on the next tick
    pub fn pending_release(&self) -> bool {
        self.pending_release
    }

    /// Map visibility captured when the relationship began
    pub fn prior_visibility(&self) -> bool {
        self.prior_visibility
    }

    pub fn reserve(&self) -> bool {
        self.reserve
    }

    /// Start following `leader`
    ///
    /// Clears any reserve flag. Fails while a relationship is already active
    /// or a release is still waiting for cleanup.
    pub fn begin(&mut self, leader: HeroId, prior_visibility: bool) -> Result<()> {
        if self.is_active {
            return Err(EscortError::InvalidTransition(format!(
                "already following {:?}",
                self.leader
            )));
        }
        if self.pending_release {
            return Err(EscortError::InvalidTransition(
                "previous release has not been cleaned up".into(),
            ));
        }

        self.is_active = true;
        self.leader = Some(leader);
        self.prior_visibility = prior_visibility;
        self.reserve = false;
        Ok(())
    }

    /// End the relationship and mark cleanup as owed
    ///
    /// Returns the leader that was being followed.
    pub fn release(&mut self) -> Result<HeroId> {
        let Some(leader) = self.leader.filter(|_| self.is_active) else {
            return Err(EscortError::InvalidTransition(
                "not following anyone".into(),
            ));
        };

        self.is_active = false;
        self.leader = None;
        self.pending_release = true;
        Ok(leader)
    }

    /// Cleanup ran; the one-tick release window is over
    pub fn complete_release(&mut self) {
        self.pending_release = false;
    }

    pub fn set_reserve(&mut self, reserve: bool) {
        self.reserve = reserve;
    }

    /// Copy a loaded record into this one, repairing broken invariants
    pub fn load_from(&mut self, loaded: RelationshipState) {
        let RelationshipState {
            is_active,
            leader,
            pending_release,
            prior_visibility,
            reserve,
        } = loaded;

        self.is_active = is_active && leader.is_some();
        self.leader = if self.is_active { leader } else { None };
        // An active record without a leader still owes the follower its cleanup
        self.pending_release = (pending_release || is_active) && !self.is_active;
        self.prior_visibility = prior_visibility;
        self.reserve = reserve;
    }

    /// True when the documented invariants hold
    pub fn is_consistent(&self) -> bool {
        let leader_matches = self.is_active == self.leader.is_some();
        let release_exclusive = !(self.pending_release && self.is_active);
        leader_matches && release_exclusive
    }
}
