//! Escort movement directives and position mirroring

use crate::core::error::{EscortError, Result};
use crate::core::types::PartyId;
use crate::host::{HostSimulation, MovementDirective};

/// Issues follow/hold directives and keeps the follower on top of its leader
#[derive(Debug, Clone, Copy)]
pub struct EscortMovementController {
    position_epsilon: f32,
}

impl EscortMovementController {
    pub fn new(position_epsilon: f32) -> Self {
        Self { position_epsilon }
    }

    /// Hand the follower's movement AI an escort directive on the leader
    pub fn escort(
        &self,
        host: &mut dyn HostSimulation,
        follower: PartyId,
        leader_party: PartyId,
    ) -> Result<()> {
        if host.movement(follower) == Some(MovementDirective::Escort(leader_party)) {
            return Ok(());
        }
        host.set_movement(follower, MovementDirective::Escort(leader_party))
    }

    /// Give the follower its own movement AI back
    pub fn release(&self, host: &mut dyn HostSimulation, follower: PartyId) -> Result<()> {
        host.set_movement(follower, MovementDirective::Independent)
    }

    /// Tell some other party to stop where it is
    pub fn hold(&self, host: &mut dyn HostSimulation, party: PartyId) -> Result<()> {
        host.set_movement(party, MovementDirective::Hold)
    }

    /// Snap the follower onto the leader's position
    ///
    /// Returns true when the follower had to be moved. Drift within the
    /// position epsilon is left alone.
    pub fn mirror_position(
        &self,
        host: &mut dyn HostSimulation,
        follower: PartyId,
        leader_party: PartyId,
    ) -> Result<bool> {
        let target = host
            .party_position(leader_party)
            .ok_or(EscortError::PartyNotFound(leader_party))?;
        if self.co_located(host, follower, leader_party) {
            return Ok(false);
        }
        host.set_party_position(follower, target)?;
        Ok(true)
    }

    /// Are both parties close enough to count as the same place?
    pub fn co_located(
        &self,
        host: &dyn HostSimulation,
        follower: PartyId,
        leader_party: PartyId,
    ) -> bool {
        match (host.party_position(follower), host.party_position(leader_party)) {
            (Some(a), Some(b)) => a.distance(&b) <= self.position_epsilon,
            _ => false,
        }
    }

    /// Stop the follower's own AI and encounter seeking
    pub fn suppress_initiative(&self, host: &mut dyn HostSimulation, follower: PartyId) -> Result<()> {
        if host.is_party_active(follower) {
            host.set_party_active(follower, false)?;
        }
        Ok(())
    }

    pub fn restore_initiative(&self, host: &mut dyn HostSimulation, follower: PartyId) -> Result<()> {
        if !host.is_party_active(follower) {
            host.set_party_active(follower, true)?;
        }
        Ok(())
    }
}
