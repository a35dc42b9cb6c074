//! Battle participation for the follower
//!
//! When the leader turns up as a side in a conflict, the follower is pushed
//! into the same conflict on the matching side. The join goes through the
//! host's generic two-sided encounter primitive, so sieges, raids and field
//! battles are all handled by one call.

use crate::core::types::{BattleSide, ConflictId, PartyId};
use crate::host::HostSimulation;

/// What a join attempt did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Leader is not fighting
    LeaderNotInConflict,
    /// Follower is held back on purpose
    Reserved,
    /// Follower already sits in a conflict or encounter
    FollowerBusy,
    /// A join for this conflict was already requested
    AlreadyRequested(ConflictId),
    Requested { conflict: ConflictId, side: BattleSide },
    Failed { conflict: ConflictId, reason: String },
}

/// Drives the follower into the leader's conflict, once per conflict
#[derive(Debug, Clone, Default)]
pub struct BattleParticipationCoordinator {
    requested: Option<ConflictId>,
}

impl BattleParticipationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conflict a join was last requested for
    pub fn requested(&self) -> Option<ConflictId> {
        self.requested
    }

    /// Forget the last request (relationship ended)
    pub fn reset(&mut self) {
        self.requested = None;
    }

    /// Try to put the follower into the leader's current conflict
    ///
    /// Failures are reported, never retried here: the next tick's detection
    /// retries naturally while the conflict is still running.
    pub fn try_join(
        &mut self,
        host: &mut dyn HostSimulation,
        follower: PartyId,
        leader_party: PartyId,
        reserve: bool,
    ) -> JoinOutcome {
        let Some(conflict) = host.conflict_of(leader_party) else {
            return JoinOutcome::LeaderNotInConflict;
        };

        if reserve {
            return JoinOutcome::Reserved;
        }

        if host.conflict_of(follower).is_some() || host.in_encounter(follower) {
            return JoinOutcome::FollowerBusy;
        }

        if self.requested == Some(conflict) {
            return JoinOutcome::AlreadyRequested(conflict);
        }

        let Some(side) = host.conflict_side(conflict, leader_party) else {
            return JoinOutcome::Failed {
                conflict,
                reason: "leader has no side in the conflict".into(),
            };
        };

        let Some(enemy) = host.side_leader(conflict, side.opposite()) else {
            return JoinOutcome::Failed {
                conflict,
                reason: "opposing side has no leading party".into(),
            };
        };

        // Host only lets active parties take part in encounters
        let was_active = host.is_party_active(follower);
        if !was_active {
            if let Err(e) = host.set_party_active(follower, true) {
                return JoinOutcome::Failed { conflict, reason: e.to_string() };
            }
        }

        // Keep the relative roles so the host resolves the follower like any
        // formation member of the leader's side
        let result = match side {
            BattleSide::Attacker => host.start_encounter(follower, enemy),
            BattleSide::Defender => host.start_encounter(enemy, follower),
        };

        match result {
            Ok(()) => {
                tracing::info!(?conflict, ?side, ?enemy, "follower joined leader's conflict");
                self.requested = Some(conflict);
                JoinOutcome::Requested { conflict, side }
            }
            Err(e) => {
                tracing::warn!(?conflict, error = %e, "host rejected conflict join");
                if !was_active {
                    if let Err(e) = host.set_party_active(follower, false) {
                        tracing::warn!(
                            ?follower,
                            error = %e,
                            "could not deactivate follower after failed join"
                        );
                    }
                }
                JoinOutcome::Failed { conflict, reason: e.to_string() }
            }
        }
    }
}
