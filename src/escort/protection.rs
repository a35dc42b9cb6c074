//! Protection interceptors
//!
//! A fixed catalog of strategies, one per host pathway that could target,
//! merge or engage the follower, or show UI that gives it away. Every
//! strategy answers "given (actor, other, intent), allow or deny?" and shares
//! one hostility predicate. They only read state; side effects they ask for
//! (holding a pursuer in place) are carried out by the orchestrator.

use ahash::AHashMap;

use crate::core::types::{HeroId, PartyId};
use crate::escort::notice::Notice;
use crate::escort::state::RelationshipState;
use crate::host::{HostView, Interaction, InterceptionPoint};

/// Why an action was blocked and what should follow from it
#[derive(Debug, Clone, PartialEq)]
pub struct Suppression {
    pub point: InterceptionPoint,
    pub notice: Option<Notice>,
    /// Party that should be ordered to hold position instead of pursuing
    pub hold: Option<PartyId>,
}

/// Decision for one intercepted action
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Allow,
    Suppress(Suppression),
}

impl Verdict {
    pub fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppress(_))
    }

    fn suppress(point: InterceptionPoint) -> Self {
        Self::Suppress(Suppression { point, notice: None, hold: None })
    }
}

/// Everything an interceptor may look at
pub struct InterceptContext<'a> {
    pub host: &'a dyn HostView,
    pub state: &'a RelationshipState,
    pub follower: PartyId,
}

impl<'a> InterceptContext<'a> {
    pub fn leader(&self) -> Option<HeroId> {
        self.state.leader()
    }

    pub fn leader_party(&self) -> Option<PartyId> {
        self.leader().and_then(|hero| self.host.party_led_by(hero))
    }

    pub fn leader_name(&self) -> String {
        self.leader()
            .and_then(|hero| self.host.hero_name(hero))
            .unwrap_or_else(|| "your lord".to_string())
    }

    pub fn party_name(&self, party: PartyId) -> String {
        self.host
            .party_name(party)
            .unwrap_or_else(|| format!("Party {}", party.0))
    }

    /// Is `other` hostile to the follower's current leader?
    pub fn is_hostile(&self, other: PartyId) -> bool {
        match self.leader_party() {
            Some(leader_party) => is_hostile_to_leader(self.host, leader_party, other),
            None => false,
        }
    }

    /// The other party in a two-sided action, if it is hostile to the leader
    fn hostile_counterpart(&self, interaction: &Interaction) -> Option<PartyId> {
        interaction
            .counterpart_of(self.follower)
            .filter(|other| self.is_hostile(*other))
    }
}

/// Shared hostility predicate
///
/// Bandits and factions at war with the leader's faction are hostile. The
/// leader's own party and faction never are.
pub fn is_hostile_to_leader(host: &dyn HostView, leader_party: PartyId, other: PartyId) -> bool {
    if other == leader_party {
        return false;
    }

    let Some(other_faction) = host.party_faction(other) else {
        return false;
    };
    let Some(leader_faction) = host.party_faction(leader_party) else {
        return false;
    };

    if other_faction == leader_faction {
        return false;
    }

    host.is_bandit_faction(other_faction) || host.at_war(leader_faction, other_faction)
}

/// One allow/deny strategy for one interception point
pub trait Interceptor {
    fn point(&self) -> InterceptionPoint;
    fn evaluate(&self, ctx: &InterceptContext<'_>, interaction: &Interaction) -> Verdict;
}

/// Hostile encounters against the follower
#[derive(Debug, Default)]
pub struct EncounterStartGuard;

impl Interceptor for EncounterStartGuard {
    fn point(&self) -> InterceptionPoint {
        InterceptionPoint::EncounterStart
    }

    fn evaluate(&self, ctx: &InterceptContext<'_>, interaction: &Interaction) -> Verdict {
        let Some(other) = ctx.hostile_counterpart(interaction) else {
            return Verdict::Allow;
        };
        Verdict::Suppress(Suppression {
            point: self.point(),
            notice: Some(Notice::AvoidedWhileServing {
                party: ctx.party_name(other),
                leader: ctx.leader_name(),
            }),
            hold: None,
        })
    }
}

/// Forced merges of the follower's party
#[derive(Debug, Default)]
pub struct MergeGuard;

impl Interceptor for MergeGuard {
    fn point(&self) -> InterceptionPoint {
        InterceptionPoint::PartyMerge
    }

    fn evaluate(&self, ctx: &InterceptContext<'_>, interaction: &Interaction) -> Verdict {
        let Some(other) = ctx.hostile_counterpart(interaction) else {
            return Verdict::Allow;
        };
        Verdict::Suppress(Suppression {
            point: self.point(),
            notice: Some(Notice::MergeRefused {
                party: ctx.party_name(other),
                leader: ctx.leader_name(),
            }),
            hold: None,
        })
    }
}

#[derive(Debug, Default)]
pub struct EncounterRestartGuard;

impl Interceptor for EncounterRestartGuard {
    fn point(&self) -> InterceptionPoint {
        InterceptionPoint::EncounterRestart
    }

    fn evaluate(&self, ctx: &InterceptContext<'_>, interaction: &Interaction) -> Verdict {
        match ctx.hostile_counterpart(interaction) {
            Some(_) => Verdict::suppress(self.point()),
            None => Verdict::Allow,
        }
    }
}

/// Host AI deciding some party is engaging the follower
///
/// The engagement is forced to false and the pursuer is told to hold.
#[derive(Debug, Default)]
pub struct EngagementGuard;

impl Interceptor for EngagementGuard {
    fn point(&self) -> InterceptionPoint {
        InterceptionPoint::AiEngagement
    }

    fn evaluate(&self, ctx: &InterceptContext<'_>, interaction: &Interaction) -> Verdict {
        let Some(pursuer) = ctx.hostile_counterpart(interaction) else {
            return Verdict::Allow;
        };
        Verdict::Suppress(Suppression {
            point: self.point(),
            notice: None,
            hold: Some(pursuer),
        })
    }
}

#[derive(Debug, Default)]
pub struct InteractionGuard;

impl Interceptor for InteractionGuard {
    fn point(&self) -> InterceptionPoint {
        InterceptionPoint::Interaction
    }

    fn evaluate(&self, ctx: &InterceptContext<'_>, interaction: &Interaction) -> Verdict {
        match ctx.hostile_counterpart(interaction) {
            Some(_) => Verdict::suppress(self.point()),
            None => Verdict::Allow,
        }
    }
}

/// Standalone nameplate for the follower: hidden and non-interactive
#[derive(Debug, Default)]
pub struct NameplateGuard;

impl Interceptor for NameplateGuard {
    fn point(&self) -> InterceptionPoint {
        InterceptionPoint::Nameplate
    }

    fn evaluate(&self, _ctx: &InterceptContext<'_>, _interaction: &Interaction) -> Verdict {
        Verdict::suppress(self.point())
    }
}

/// "Leave / abandon unit" options while serving
#[derive(Debug, Default)]
pub struct LeaveOptionGuard;

impl Interceptor for LeaveOptionGuard {
    fn point(&self) -> InterceptionPoint {
        InterceptionPoint::LeaveUnitOption
    }

    fn evaluate(&self, _ctx: &InterceptContext<'_>, _interaction: &Interaction) -> Verdict {
        Verdict::suppress(self.point())
    }
}

/// All registered interceptors, one per interception point
pub struct ProtectionInterceptorSet {
    interceptors: AHashMap<InterceptionPoint, Box<dyn Interceptor>>,
}

impl ProtectionInterceptorSet {
    /// Empty set: everything is allowed
    pub fn empty() -> Self {
        Self {
            interceptors: AHashMap::new(),
        }
    }

    /// Full catalog
    pub fn with_defaults() -> Self {
        let mut set = Self::empty();
        set.register(Box::new(EncounterStartGuard));
        set.register(Box::new(MergeGuard));
        set.register(Box::new(EncounterRestartGuard));
        set.register(Box::new(EngagementGuard));
        set.register(Box::new(InteractionGuard));
        set.register(Box::new(NameplateGuard));
        set.register(Box::new(LeaveOptionGuard));
        set
    }

    /// Register a strategy, replacing any previous one for the same point
    pub fn register(&mut self, interceptor: Box<dyn Interceptor>) {
        self.interceptors.insert(interceptor.point(), interceptor);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub fn evaluate(&self, ctx: &InterceptContext<'_>, interaction: &Interaction) -> Verdict {
        if !ctx.state.is_active() || !interaction.involves(ctx.follower) {
            return Verdict::Allow;
        }

        match self.interceptors.get(&interaction.point) {
            Some(interceptor) => interceptor.evaluate(ctx, interaction),
            None => Verdict::Allow,
        }
    }
}

impl Default for ProtectionInterceptorSet {
    fn default() -> Self {
        Self::with_defaults()
    }
}
