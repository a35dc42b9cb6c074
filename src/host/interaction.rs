//! Host-initiated actions that may be intercepted

use serde::{Deserialize, Serialize};

use crate::core::types::PartyId;

/// Every pathway where the host could break the illusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterceptionPoint {
    /// Host starts an encounter with the follower as attacker or defender
    EncounterStart,
    /// Host merges the follower's party into another
    PartyMerge,
    /// Host restarts an encounter involving the follower
    EncounterRestart,
    /// Host AI decides another party is engaging the follower
    AiEngagement,
    /// Host's on-interaction callback between the follower and another party
    Interaction,
    /// Host renders a nameplate for the follower as a standalone party
    Nameplate,
    /// Host offers "leave / abandon unit" while inside the leader's party
    LeaveUnitOption,
}

impl InterceptionPoint {
    pub const ALL: [InterceptionPoint; 7] = [
        Self::EncounterStart,
        Self::PartyMerge,
        Self::EncounterRestart,
        Self::AiEngagement,
        Self::Interaction,
        Self::Nameplate,
        Self::LeaveUnitOption,
    ];

    /// Does this pathway involve a second party?
    pub fn is_two_sided(&self) -> bool {
        !matches!(self, Self::Nameplate | Self::LeaveUnitOption)
    }
}

/// A host-initiated action: (actor, other, intent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub point: InterceptionPoint,
    pub actor: PartyId,
    pub other: Option<PartyId>,
}

impl Interaction {
    pub fn encounter_start(attacker: PartyId, defender: PartyId) -> Self {
        Self { point: InterceptionPoint::EncounterStart, actor: attacker, other: Some(defender) }
    }

    pub fn merge(party: PartyId, into: PartyId) -> Self {
        Self { point: InterceptionPoint::PartyMerge, actor: party, other: Some(into) }
    }

    pub fn encounter_restart(attacker: PartyId, defender: PartyId) -> Self {
        Self { point: InterceptionPoint::EncounterRestart, actor: attacker, other: Some(defender) }
    }

    /// `pursuer`'s AI evaluates whether it is engaging `target`
    pub fn engagement(pursuer: PartyId, target: PartyId) -> Self {
        Self { point: InterceptionPoint::AiEngagement, actor: pursuer, other: Some(target) }
    }

    pub fn interaction(party: PartyId, other: PartyId) -> Self {
        Self { point: InterceptionPoint::Interaction, actor: party, other: Some(other) }
    }

    pub fn nameplate(party: PartyId) -> Self {
        Self { point: InterceptionPoint::Nameplate, actor: party, other: None }
    }

    pub fn leave_option(party: PartyId) -> Self {
        Self { point: InterceptionPoint::LeaveUnitOption, actor: party, other: None }
    }

    /// Does this action touch the given party on either end?
    pub fn involves(&self, party: PartyId) -> bool {
        self.actor == party || self.other == Some(party)
    }

    /// The party on the far side from `party`, if `party` is involved
    pub fn counterpart_of(&self, party: PartyId) -> Option<PartyId> {
        if self.actor == party {
            self.other
        } else if self.other == Some(party) {
            Some(self.actor)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counterpart() {
        let i = Interaction::encounter_start(PartyId(1), PartyId(2));
        assert_eq!(i.counterpart_of(PartyId(1)), Some(PartyId(2)));
        assert_eq!(i.counterpart_of(PartyId(2)), Some(PartyId(1)));
        assert_eq!(i.counterpart_of(PartyId(3)), None);
    }

    #[test]
    fn test_one_sided_points() {
        assert!(!InterceptionPoint::Nameplate.is_two_sided());
        assert!(!InterceptionPoint::LeaveUnitOption.is_two_sided());
        assert!(InterceptionPoint::AiEngagement.is_two_sided());

        let plate = Interaction::nameplate(PartyId(7));
        assert!(plate.involves(PartyId(7)));
        assert_eq!(plate.counterpart_of(PartyId(7)), None);
    }
}
