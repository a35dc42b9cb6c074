//! Campaign world - a self-contained host simulation
//!
//! Owns parties, heroes, factions, settlements and conflicts and advances
//! them one tick at a time. Everything the escort core needs is exposed
//! through [`HostView`] and [`HostSimulation`]; callbacks are queued as
//! [`HostEvent`]s for the driver to pump.

use std::collections::VecDeque;

use ahash::AHashSet;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::campaign::conflict::{Conflict, ConflictEvent, ConflictKind};
use crate::campaign::party::Party;
use crate::campaign::settlement::Settlement;
use crate::core::error::{EscortError, Result};
use crate::core::types::{
    BattleSide, ConflictId, FactionId, HeroId, PartyId, SettlementId, Tick, TimeControl, Vec2,
};
use crate::host::{HostEvent, HostSimulation, HostView, MenuContext, MovementDirective};

/// How far a wandering party strays per new destination
const WANDER_RADIUS: f32 = 6.0;

/// Distance at which hostile parties try to engage
const DEFAULT_ENGAGE_RANGE: f32 = 1.5;

/// Ticks a host-opened conflict lasts before resolving
const DEFAULT_CONFLICT_TICKS: u32 = 8;

/// A faction parties and settlements belong to
#[derive(Debug, Clone)]
pub struct Faction {
    pub id: FactionId,
    pub name: String,
    pub is_bandit: bool,
}

/// A character who can lead a party
#[derive(Debug, Clone)]
pub struct Hero {
    pub id: HeroId,
    pub name: String,
    pub alive: bool,
    pub party: Option<PartyId>,
}

/// Campaign clock
#[derive(Debug, Clone, Copy)]
pub struct CampaignClock {
    pub tick: Tick,
    pub ticks_per_hour: u32,
    pub hours_per_day: u32,
}

impl CampaignClock {
    fn advance(&mut self) -> (bool, bool) {
        self.tick += 1;
        let per_hour = u64::from(self.ticks_per_hour.max(1));
        let per_day = per_hour * u64::from(self.hours_per_day.max(1));
        (self.tick % per_hour == 0, self.tick % per_day == 0)
    }
}

impl Default for CampaignClock {
    fn default() -> Self {
        Self {
            tick: 0,
            ticks_per_hour: 4,
            hours_per_day: 24,
        }
    }
}

/// The whole campaign layer
#[derive(Debug, Clone)]
pub struct CampaignWorld {
    parties: Vec<Party>,
    heroes: Vec<Hero>,
    factions: Vec<Faction>,
    wars: AHashSet<(FactionId, FactionId)>,
    settlements: Vec<Settlement>,
    conflicts: Vec<Conflict>,
    clock: CampaignClock,

    /// The party the UI belongs to; menus and clock changes follow it
    player: Option<PartyId>,
    camera: Option<PartyId>,
    menu: MenuContext,
    time: TimeControl,
    visual_layer: bool,

    engage_range: f32,
    conflict_ticks: Option<u32>,
    /// Host refreshes the player's map flag every this many ticks
    visibility_reset_interval: Option<Tick>,

    encounter_requests: u32,
    reject_next_encounter: bool,
    deferred_joins: bool,
    pending_joins: Vec<(PartyId, PartyId)>,

    pending_events: VecDeque<HostEvent>,
    conflict_log: Vec<ConflictEvent>,
    rng: ChaCha8Rng,

    next_party: u32,
    next_hero: u32,
    next_faction: u32,
    next_settlement: u32,
    next_conflict: u32,
}

impl Default for CampaignWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl CampaignWorld {
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            parties: Vec::new(),
            heroes: Vec::new(),
            factions: Vec::new(),
            wars: AHashSet::new(),
            settlements: Vec::new(),
            conflicts: Vec::new(),
            clock: CampaignClock::default(),
            player: None,
            camera: None,
            menu: MenuContext::None,
            time: TimeControl::Play,
            visual_layer: false,
            engage_range: DEFAULT_ENGAGE_RANGE,
            conflict_ticks: Some(DEFAULT_CONFLICT_TICKS),
            visibility_reset_interval: None,
            encounter_requests: 0,
            reject_next_encounter: false,
            deferred_joins: false,
            pending_joins: Vec::new(),
            pending_events: VecDeque::new(),
            conflict_log: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            next_party: 1,
            next_hero: 1,
            next_faction: 1,
            next_settlement: 1,
            next_conflict: 1,
        }
    }

    pub fn with_clock(mut self, ticks_per_hour: u32, hours_per_day: u32) -> Self {
        self.clock.ticks_per_hour = ticks_per_hour;
        self.clock.hours_per_day = hours_per_day;
        self
    }

    // === SETUP ===

    pub fn add_faction(&mut self, name: impl Into<String>, is_bandit: bool) -> FactionId {
        let id = FactionId::new(self.next_faction);
        self.next_faction += 1;
        self.factions.push(Faction {
            id,
            name: name.into(),
            is_bandit,
        });
        id
    }

    pub fn declare_war(&mut self, a: FactionId, b: FactionId) {
        self.wars.insert(war_key(a, b));
    }

    pub fn make_peace(&mut self, a: FactionId, b: FactionId) {
        self.wars.remove(&war_key(a, b));
    }

    /// Spawn a leaderless party; the first one spawned becomes the player's
    pub fn spawn_party(&mut self, name: impl Into<String>, faction: FactionId, position: Vec2) -> PartyId {
        let id = PartyId(self.next_party);
        self.next_party += 1;
        self.parties.push(Party::new(id, name.into(), faction, position));
        if self.player.is_none() {
            self.player = Some(id);
            self.camera = Some(id);
        }
        id
    }

    /// Spawn a party led by a freshly created hero
    pub fn spawn_lord(&mut self, name: &str, faction: FactionId, position: Vec2) -> (HeroId, PartyId) {
        let party = self.spawn_party(format!("{}'s Party", name), faction, position);
        let hero = self.assign_leader(name, party);
        (hero, party)
    }

    /// Spawn a party that roams on its own
    pub fn spawn_wanderer(&mut self, name: impl Into<String>, faction: FactionId, position: Vec2) -> PartyId {
        let id = self.spawn_party(name, faction, position);
        if let Some(party) = self.party_mut(id) {
            party.wanders = true;
        }
        id
    }

    /// Create a hero leading `party`
    pub fn assign_leader(&mut self, name: impl Into<String>, party: PartyId) -> HeroId {
        let id = HeroId(self.next_hero);
        self.next_hero += 1;
        self.heroes.push(Hero {
            id,
            name: name.into(),
            alive: true,
            party: Some(party),
        });
        if let Some(p) = self.party_mut(party) {
            p.leader = Some(id);
        }
        id
    }

    pub fn add_settlement(
        &mut self,
        name: impl Into<String>,
        position: Vec2,
        owner: Option<FactionId>,
    ) -> SettlementId {
        let id = SettlementId(self.next_settlement);
        self.next_settlement += 1;
        self.settlements.push(Settlement::new(id, name.into(), position, owner));
        id
    }

    pub fn set_player(&mut self, party: PartyId) {
        self.player = Some(party);
    }

    pub fn set_visual_layer_support(&mut self, supported: bool) {
        self.visual_layer = supported;
    }

    /// Duration of conflicts opened through encounters; `None` never resolves
    pub fn set_conflict_duration(&mut self, ticks: Option<u32>) {
        self.conflict_ticks = ticks;
    }

    pub fn set_visibility_reset_interval(&mut self, interval: Option<Tick>) {
        self.visibility_reset_interval = interval.filter(|&ticks| ticks > 0);
    }

    /// Queue encounter placements until the next campaign tick
    pub fn set_deferred_joins(&mut self, deferred: bool) {
        self.deferred_joins = deferred;
    }

    /// Refuse the next encounter request
    pub fn reject_next_encounter(&mut self) {
        self.reject_next_encounter = true;
    }

    // === WORLD CHANGES ===

    pub fn kill_hero(&mut self, hero: HeroId) {
        if let Some(h) = self.heroes.iter_mut().find(|h| h.id == hero) {
            h.alive = false;
            tracing::info!(?hero, name = %h.name, "hero died");
        }
    }

    /// Remove a party from the map entirely
    pub fn destroy_party(&mut self, party: PartyId) {
        self.parties.retain(|p| p.id != party);
        for conflict in &mut self.conflicts {
            conflict.attackers.retain(|&p| p != party);
            conflict.defenders.retain(|&p| p != party);
        }
        if self.camera == Some(party) {
            self.camera = None;
        }
        tracing::info!(?party, "party destroyed");
    }

    /// Open a conflict that runs until [`Self::end_conflict`]
    pub fn open_conflict(&mut self, attacker: PartyId, defender: PartyId) -> Result<ConflictId> {
        self.open_conflict_with(attacker, defender, ConflictKind::FieldBattle, None)
    }

    pub fn open_conflict_with(
        &mut self,
        attacker: PartyId,
        defender: PartyId,
        kind: ConflictKind,
        duration: Option<u32>,
    ) -> Result<ConflictId> {
        let position = self.require_party(defender)?.position;
        for party in [attacker, defender] {
            if self.require_party(party)?.conflict.is_some() {
                return Err(EscortError::HostRejected(format!("{:?} is already fighting", party)));
            }
        }

        let id = ConflictId(self.next_conflict);
        self.next_conflict += 1;
        let mut conflict = Conflict::new(id, kind, attacker, defender, position);
        if let Some(ticks) = duration {
            conflict = conflict.with_duration(ticks);
        }
        self.conflicts.push(conflict);

        for party in [attacker, defender] {
            if let Some(p) = self.party_mut(party) {
                p.conflict = Some(id);
            }
        }

        tracing::info!(conflict = ?id, ?kind, ?attacker, ?defender, "conflict started");
        self.conflict_log.push(ConflictEvent::Started { conflict: id, attacker, defender });
        self.pending_events.push_back(HostEvent::ConflictStarted { conflict: id });
        Ok(id)
    }

    pub fn end_conflict(&mut self, conflict: ConflictId) -> Result<()> {
        let index = self
            .conflicts
            .iter()
            .position(|c| c.id == conflict)
            .ok_or_else(|| EscortError::HostRejected(format!("{:?} is not running", conflict)))?;
        let finished = self.conflicts.remove(index);

        let player = self.player;
        let mut player_fought = false;
        for id in finished.participants() {
            if let Some(party) = self.party_mut(id) {
                party.conflict = None;
                party.in_encounter = false;
                player_fought |= player == Some(id);
            }
        }
        if player_fought {
            self.menu = MenuContext::None;
        }
        self.pending_joins
            .retain(|(a, d)| !finished.participants().any(|p| p == *a || p == *d));

        tracing::info!(?conflict, "conflict ended");
        self.conflict_log.push(ConflictEvent::Ended { conflict });
        self.pending_events.push_back(HostEvent::ConflictEnded { conflict });
        Ok(())
    }

    /// Open a wait menu inside the player's current settlement
    pub fn open_wait_menu(&mut self) -> Result<()> {
        let player = self
            .player
            .ok_or_else(|| EscortError::HostRejected("no player party".into()))?;
        if self.current_settlement(player).is_none() {
            return Err(EscortError::HostRejected("player is not in a settlement".into()));
        }
        self.menu = MenuContext::Wait;
        Ok(())
    }

    // === QUERIES ===

    pub fn party(&self, id: PartyId) -> Option<&Party> {
        self.parties.iter().find(|p| p.id == id)
    }

    pub fn parties(&self) -> &[Party] {
        &self.parties
    }

    pub fn settlement(&self, id: SettlementId) -> Option<&Settlement> {
        self.settlements.iter().find(|s| s.id == id)
    }

    pub fn conflict(&self, id: ConflictId) -> Option<&Conflict> {
        self.conflicts.iter().find(|c| c.id == id)
    }

    pub fn conflict_log(&self) -> &[ConflictEvent] {
        &self.conflict_log
    }

    pub fn player(&self) -> Option<PartyId> {
        self.player
    }

    pub fn current_tick(&self) -> Tick {
        self.clock.tick
    }

    /// Rendered state on the visual layer; `None` for unknown parties
    pub fn is_rendered(&self, party: PartyId) -> Option<bool> {
        self.party(party).map(|p| p.rendered)
    }

    /// Encounter requests received so far, rejected ones included
    pub fn encounter_requests(&self) -> u32 {
        self.encounter_requests
    }

    /// Queue the session-start callback (new game or loaded save)
    pub fn start_session(&mut self) {
        self.pending_events.push_back(HostEvent::SessionStarted);
    }

    pub fn next_event(&mut self) -> Option<HostEvent> {
        self.pending_events.pop_front()
    }

    /// Hostile pairs close enough to engage, as (pursuer, target)
    ///
    /// Only active parties pursue. The driver decides whether each
    /// engagement actually happens.
    pub fn check_engagements(&self) -> Vec<(PartyId, PartyId)> {
        let mut engagements = Vec::new();
        for pursuer in self.parties.iter().filter(|p| p.can_move()) {
            for target in &self.parties {
                if target.id == pursuer.id
                    || target.settlement.is_some()
                    || target.conflict.is_some()
                    || pursuer.position.distance(&target.position) > self.engage_range
                {
                    continue;
                }
                if self.parties_hostile(pursuer, target) {
                    engagements.push((pursuer.id, target.id));
                }
            }
        }
        engagements
    }

    // === TICK ===

    /// Advance the campaign by one tick and queue the resulting callbacks
    pub fn campaign_tick(&mut self) {
        // Deferred joins land one tick late
        for (attacker, defender) in std::mem::take(&mut self.pending_joins) {
            if let Err(e) = self.place_encounter(attacker, defender) {
                tracing::debug!(?attacker, ?defender, error = %e, "deferred encounter dropped");
            }
        }

        self.wander();
        self.move_parties();

        let resolved: Vec<ConflictId> = self
            .conflicts
            .iter_mut()
            .filter_map(|c| c.advance().then_some(c.id))
            .collect();
        for conflict in resolved {
            if let Err(e) = self.end_conflict(conflict) {
                tracing::debug!(?conflict, error = %e, "conflict already gone");
            }
        }

        let (hour, day) = self.clock.advance();

        if let (Some(interval), Some(player)) = (self.visibility_reset_interval, self.player) {
            if self.clock.tick % interval == 0 {
                if let Some(party) = self.party_mut(player) {
                    party.visible_on_map = true;
                }
            }
        }

        self.pending_events.push_back(HostEvent::Tick);
        if hour {
            self.pending_events.push_back(HostEvent::HourElapsed);
        }
        if day {
            self.pending_events.push_back(HostEvent::DayElapsed);
        }
    }

    fn wander(&mut self) {
        for party in &mut self.parties {
            if !party.wanders || !party.can_move() || party.movement != MovementDirective::Independent {
                continue;
            }
            let offset = Vec2::new(
                self.rng.gen_range(-WANDER_RADIUS..=WANDER_RADIUS),
                self.rng.gen_range(-WANDER_RADIUS..=WANDER_RADIUS),
            );
            party.movement = MovementDirective::MoveTo(party.position + offset);
        }
    }

    fn move_parties(&mut self) {
        let targets: Vec<Option<Vec2>> = self
            .parties
            .iter()
            .map(|p| match p.movement {
                MovementDirective::Escort(other) => self.party(other).map(|o| o.position),
                MovementDirective::MoveTo(point) => Some(point),
                MovementDirective::Independent | MovementDirective::Hold => None,
            })
            .collect();

        for (party, target) in self.parties.iter_mut().zip(targets) {
            party.execute_movement(target);
        }
    }

    // === INTERNALS ===

    fn party_mut(&mut self, id: PartyId) -> Option<&mut Party> {
        self.parties.iter_mut().find(|p| p.id == id)
    }

    fn require_party(&self, id: PartyId) -> Result<&Party> {
        self.party(id).ok_or(EscortError::PartyNotFound(id))
    }

    fn require_party_mut(&mut self, id: PartyId) -> Result<&mut Party> {
        self.party_mut(id).ok_or(EscortError::PartyNotFound(id))
    }

    fn hero(&self, id: HeroId) -> Option<&Hero> {
        self.heroes.iter().find(|h| h.id == id)
    }

    fn faction(&self, id: FactionId) -> Option<&Faction> {
        self.factions.iter().find(|f| f.id == id)
    }

    fn parties_hostile(&self, a: &Party, b: &Party) -> bool {
        if a.faction == b.faction {
            return false;
        }
        self.is_bandit_faction(a.faction) || self.is_bandit_faction(b.faction) || self.at_war(a.faction, b.faction)
    }

    /// Put two parties into a conflict together
    fn place_encounter(&mut self, attacker: PartyId, defender: PartyId) -> Result<()> {
        let attacker_conflict = self.require_party(attacker)?.conflict;
        let defender_conflict = self.require_party(defender)?.conflict;

        match (attacker_conflict, defender_conflict) {
            (Some(_), Some(_)) => Err(EscortError::HostRejected(
                "both parties are already fighting".into(),
            )),
            (Some(conflict), None) => self.join_conflict(conflict, attacker, defender),
            (None, Some(conflict)) => self.join_conflict(conflict, defender, attacker),
            (None, None) => {
                let conflict = self.open_conflict_with(
                    attacker,
                    defender,
                    ConflictKind::FieldBattle,
                    self.conflict_ticks,
                )?;
                for party in [attacker, defender] {
                    if let Some(p) = self.party_mut(party) {
                        p.in_encounter = true;
                    }
                }
                tracing::debug!(?conflict, "encounter opened a new conflict");
                Ok(())
            }
        }
    }

    /// `joiner` takes the side opposite `anchor` in `conflict`
    fn join_conflict(&mut self, conflict: ConflictId, anchor: PartyId, joiner: PartyId) -> Result<()> {
        let entry = self
            .conflicts
            .iter_mut()
            .find(|c| c.id == conflict)
            .ok_or_else(|| EscortError::HostRejected(format!("{:?} is not running", conflict)))?;
        let side = entry
            .side_of(anchor)
            .ok_or_else(|| EscortError::HostRejected(format!("{:?} has no side", anchor)))?
            .opposite();
        entry.join(joiner, side);

        let party = self.require_party_mut(joiner)?;
        party.conflict = Some(conflict);
        party.in_encounter = true;

        tracing::info!(?conflict, party = ?joiner, ?side, "party joined conflict");
        self.conflict_log.push(ConflictEvent::Joined { conflict, party: joiner, side });
        Ok(())
    }
}

fn war_key(a: FactionId, b: FactionId) -> (FactionId, FactionId) {
    if a.0 <= b.0 {
        (a, b)
    } else {
        (b, a)
    }
}

impl HostView for CampaignWorld {
    fn party_exists(&self, party: PartyId) -> bool {
        self.party(party).is_some()
    }

    fn party_name(&self, party: PartyId) -> Option<String> {
        self.party(party).map(|p| p.name.clone())
    }

    fn party_position(&self, party: PartyId) -> Option<Vec2> {
        self.party(party).map(|p| p.position)
    }

    fn party_faction(&self, party: PartyId) -> Option<FactionId> {
        self.party(party).map(|p| p.faction)
    }

    fn is_party_active(&self, party: PartyId) -> bool {
        self.party(party).is_some_and(|p| p.active)
    }

    fn is_visible_on_map(&self, party: PartyId) -> bool {
        self.party(party).is_some_and(|p| p.visible_on_map)
    }

    fn movement(&self, party: PartyId) -> Option<MovementDirective> {
        self.party(party).map(|p| p.movement)
    }

    fn camera_focus(&self) -> Option<PartyId> {
        self.camera
    }

    fn hero_name(&self, hero: HeroId) -> Option<String> {
        self.hero(hero).map(|h| h.name.clone())
    }

    fn is_hero_alive(&self, hero: HeroId) -> bool {
        self.hero(hero).is_some_and(|h| h.alive)
    }

    fn party_led_by(&self, hero: HeroId) -> Option<PartyId> {
        self.hero(hero).and_then(|h| h.party)
    }

    fn is_bandit_faction(&self, faction: FactionId) -> bool {
        self.faction(faction).is_some_and(|f| f.is_bandit)
    }

    fn at_war(&self, a: FactionId, b: FactionId) -> bool {
        self.wars.contains(&war_key(a, b))
    }

    fn conflict_of(&self, party: PartyId) -> Option<ConflictId> {
        self.party(party).and_then(|p| p.conflict)
    }

    fn conflict_side(&self, conflict: ConflictId, party: PartyId) -> Option<BattleSide> {
        self.conflict(conflict).and_then(|c| c.side_of(party))
    }

    fn side_leader(&self, conflict: ConflictId, side: BattleSide) -> Option<PartyId> {
        self.conflict(conflict).and_then(|c| c.leader_of(side))
    }

    fn in_encounter(&self, party: PartyId) -> bool {
        self.party(party).is_some_and(|p| p.in_encounter)
    }

    fn current_settlement(&self, party: PartyId) -> Option<SettlementId> {
        self.party(party).and_then(|p| p.settlement)
    }

    fn menu_context(&self) -> MenuContext {
        self.menu
    }

    fn time_control(&self) -> TimeControl {
        self.time
    }

    fn supports_visual_layer(&self) -> bool {
        self.visual_layer
    }
}

impl HostSimulation for CampaignWorld {
    fn set_party_position(&mut self, party: PartyId, position: Vec2) -> Result<()> {
        self.require_party_mut(party)?.position = position;
        Ok(())
    }

    fn set_visible_on_map(&mut self, party: PartyId, visible: bool) -> Result<()> {
        self.require_party_mut(party)?.visible_on_map = visible;
        Ok(())
    }

    fn set_party_active(&mut self, party: PartyId, active: bool) -> Result<()> {
        self.require_party_mut(party)?.active = active;
        Ok(())
    }

    fn set_movement(&mut self, party: PartyId, directive: MovementDirective) -> Result<()> {
        self.require_party_mut(party)?.movement = directive;
        Ok(())
    }

    fn set_camera_focus(&mut self, party: PartyId) -> Result<()> {
        self.require_party(party)?;
        self.camera = Some(party);
        Ok(())
    }

    fn set_visual_rendered(&mut self, party: PartyId, rendered: bool) -> Result<()> {
        if !self.visual_layer {
            return Err(EscortError::VisualLayerUnavailable(
                "world renders no visual layer".into(),
            ));
        }
        self.require_party_mut(party)?.rendered = rendered;
        Ok(())
    }

    fn start_encounter(&mut self, attacker: PartyId, defender: PartyId) -> Result<()> {
        self.encounter_requests += 1;
        if std::mem::take(&mut self.reject_next_encounter) {
            return Err(EscortError::HostRejected("encounter refused".into()));
        }

        for party in [attacker, defender] {
            if !self.require_party(party)?.active {
                return Err(EscortError::HostRejected(format!(
                    "{:?} is inactive and cannot take part in encounters",
                    party
                )));
            }
        }

        if self.deferred_joins {
            self.pending_joins.push((attacker, defender));
            return Ok(());
        }
        self.place_encounter(attacker, defender)
    }

    fn finish_encounter(&mut self, party: PartyId) -> Result<()> {
        self.require_party_mut(party)?.in_encounter = false;
        if self.player == Some(party) {
            self.menu = MenuContext::None;
        }
        Ok(())
    }

    fn begin_settlement_entry(&mut self, party: PartyId, settlement: SettlementId) -> Result<()> {
        let target = self
            .settlement(settlement)
            .ok_or_else(|| EscortError::HostRejected(format!("{:?} does not exist", settlement)))?;
        let faction = self.require_party(party)?.faction;
        if !target.admits(faction, self.is_bandit_faction(faction), |a, b| self.at_war(a, b)) {
            return Err(EscortError::HostRejected(format!(
                "{} keeps its gates shut to {:?}",
                target.name, party
            )));
        }
        let position = target.position;
        let is_player = self.player == Some(party);

        let p = self.require_party_mut(party)?;
        p.settlement = Some(settlement);
        p.position = position;
        if is_player {
            // Entering goes through an encounter that stays open inside
            p.in_encounter = true;
            self.menu = MenuContext::Menu;
            self.time = TimeControl::Stop;
        }

        tracing::debug!(?party, ?settlement, "entered settlement");
        self.pending_events
            .push_back(HostEvent::SettlementEntered { party, settlement });
        Ok(())
    }

    fn leave_settlement(&mut self, party: PartyId) -> Result<()> {
        let Some(settlement) = self.require_party_mut(party)?.settlement.take() else {
            return Ok(());
        };

        tracing::debug!(?party, ?settlement, "left settlement");
        self.pending_events
            .push_back(HostEvent::SettlementLeft { party, settlement });
        Ok(())
    }

    fn end_wait_menu(&mut self) -> Result<()> {
        if self.menu == MenuContext::Wait {
            self.menu = MenuContext::Menu;
        }
        Ok(())
    }

    fn exit_to_previous_menu(&mut self) -> Result<()> {
        self.menu = MenuContext::None;
        Ok(())
    }

    fn set_time_control(&mut self, mode: TimeControl) {
        self.time = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (CampaignWorld, FactionId, FactionId) {
        let mut world = CampaignWorld::new();
        let vlandia = world.add_faction("Vlandia", false);
        let battania = world.add_faction("Battania", false);
        world.declare_war(vlandia, battania);
        (world, vlandia, battania)
    }

    #[test]
    fn test_first_party_is_player() {
        let (mut world, vlandia, _) = setup();
        let player = world.spawn_party("Player", vlandia, Vec2::default());
        world.spawn_party("Other", vlandia, Vec2::default());
        assert_eq!(world.player(), Some(player));
        assert_eq!(world.camera_focus(), Some(player));
    }

    #[test]
    fn test_war_is_symmetric() {
        let (mut world, vlandia, battania) = setup();
        assert!(world.at_war(battania, vlandia));
        world.make_peace(battania, vlandia);
        assert!(!world.at_war(vlandia, battania));
    }

    #[test]
    fn test_encounter_joins_opposite_side() {
        let (mut world, vlandia, battania) = setup();
        let a = world.spawn_party("A", vlandia, Vec2::default());
        let b = world.spawn_party("B", battania, Vec2::default());
        let c = world.spawn_party("C", vlandia, Vec2::default());

        let conflict = world.open_conflict(a, b).unwrap();
        world.start_encounter(c, b).unwrap();

        assert_eq!(world.conflict_side(conflict, c), Some(BattleSide::Attacker));
        assert!(world.in_encounter(c));
    }

    #[test]
    fn test_inactive_party_cannot_encounter() {
        let (mut world, vlandia, battania) = setup();
        let a = world.spawn_party("A", vlandia, Vec2::default());
        let b = world.spawn_party("B", battania, Vec2::default());
        world.set_party_active(a, false).unwrap();

        assert!(world.start_encounter(a, b).is_err());
        assert_eq!(world.encounter_requests(), 1);
        assert!(world.conflict_of(a).is_none());
    }

    #[test]
    fn test_deferred_join_lands_next_tick() {
        let (mut world, vlandia, battania) = setup();
        let a = world.spawn_party("A", vlandia, Vec2::default());
        let b = world.spawn_party("B", battania, Vec2::default());
        let c = world.spawn_party("C", vlandia, Vec2::default());
        let conflict = world.open_conflict(a, b).unwrap();
        world.set_deferred_joins(true);

        world.start_encounter(c, b).unwrap();
        assert!(world.conflict_of(c).is_none());

        world.campaign_tick();
        assert_eq!(world.conflict_of(c), Some(conflict));
    }

    #[test]
    fn test_conflict_resolves_after_duration() {
        let (mut world, vlandia, battania) = setup();
        let a = world.spawn_party("A", vlandia, Vec2::default());
        let b = world.spawn_party("B", battania, Vec2::default());
        let conflict = world
            .open_conflict_with(a, b, ConflictKind::Raid, Some(2))
            .unwrap();

        world.campaign_tick();
        assert!(world.conflict(conflict).is_some());
        world.campaign_tick();
        assert!(world.conflict(conflict).is_none());
        assert!(world.conflict_of(a).is_none());

        let events: Vec<_> = std::iter::from_fn(|| world.next_event()).collect();
        assert!(events.contains(&HostEvent::ConflictEnded { conflict }));
    }

    #[test]
    fn test_clock_fires_hour_and_day() {
        let mut world = CampaignWorld::new().with_clock(2, 3);
        let mut hours = 0;
        let mut days = 0;
        for _ in 0..6 {
            world.campaign_tick();
            while let Some(event) = world.next_event() {
                match event {
                    HostEvent::HourElapsed => hours += 1,
                    HostEvent::DayElapsed => days += 1,
                    _ => {}
                }
            }
        }
        assert_eq!(hours, 3);
        assert_eq!(days, 1);
    }

    #[test]
    fn test_escort_directive_moves_party() {
        let (mut world, vlandia, _) = setup();
        let a = world.spawn_party("A", vlandia, Vec2::new(0.0, 0.0));
        let b = world.spawn_party("B", vlandia, Vec2::new(3.0, 0.0));
        world.set_movement(a, MovementDirective::Escort(b)).unwrap();

        for _ in 0..3 {
            world.campaign_tick();
        }
        assert_eq!(world.party_position(a), Some(Vec2::new(3.0, 0.0)));
    }

    #[test]
    fn test_settlement_entry_opens_menu_for_player() {
        let (mut world, vlandia, _) = setup();
        let player = world.spawn_party("Player", vlandia, Vec2::default());
        let town = world.add_settlement("Pravend", Vec2::new(2.0, 2.0), Some(vlandia));

        world.begin_settlement_entry(player, town).unwrap();
        assert_eq!(world.menu_context(), MenuContext::Menu);
        assert_eq!(world.time_control(), TimeControl::Stop);
        assert_eq!(world.party_position(player), Some(Vec2::new(2.0, 2.0)));

        world.open_wait_menu().unwrap();
        assert_eq!(world.menu_context(), MenuContext::Wait);
    }

    #[test]
    fn test_enemy_refused_entry() {
        let (mut world, vlandia, battania) = setup();
        let raider = world.spawn_party("Caladog's Party", battania, Vec2::default());
        let town = world.add_settlement("Pravend", Vec2::new(2.0, 2.0), Some(vlandia));

        let err = world.begin_settlement_entry(raider, town).unwrap_err();
        assert!(matches!(err, EscortError::HostRejected(_)));
        assert_eq!(world.current_settlement(raider), None);
        assert!(world.next_event().is_none());

        world.make_peace(vlandia, battania);
        world.begin_settlement_entry(raider, town).unwrap();
        assert_eq!(world.current_settlement(raider), Some(town));
    }

    #[test]
    fn test_engagements_need_hostility_and_range() {
        let (mut world, vlandia, battania) = setup();
        let looters = world.add_faction("Looters", true);
        let a = world.spawn_party("A", vlandia, Vec2::new(0.0, 0.0));
        let b = world.spawn_party("B", battania, Vec2::new(1.0, 0.0));
        world.spawn_party("Far", battania, Vec2::new(50.0, 0.0));
        world.spawn_party("Friend", vlandia, Vec2::new(0.5, 0.0));
        let bandit = world.spawn_party("Looters", looters, Vec2::new(0.0, 1.0));

        let engagements = world.check_engagements();
        assert!(engagements.contains(&(b, a)));
        assert!(engagements.contains(&(bandit, a)));
        assert!(engagements.iter().all(|(_, t)| world.party_position(*t).is_some_and(|p| p.x < 10.0)));
    }

    #[test]
    fn test_host_visibility_refresh() {
        let (mut world, vlandia, _) = setup();
        let player = world.spawn_party("Player", vlandia, Vec2::default());
        world.set_visibility_reset_interval(Some(2));
        world.set_visible_on_map(player, false).unwrap();

        world.campaign_tick();
        assert!(!world.is_visible_on_map(player));
        world.campaign_tick();
        assert!(world.is_visible_on_map(player));
    }
}
