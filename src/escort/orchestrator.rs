//! Tick orchestrator - the escort state machine
//!
//! Ties the relationship record, the visibility illusion, escort movement,
//! battle participation and the protection interceptors together. All
//! work happens synchronously inside host callbacks; nothing here spawns,
//! blocks or awaits.
//!
//! Phases:
//! - `Idle`: not following anyone
//! - `Following`: active, follower outside any conflict
//! - `InConflict`: active, follower fighting in the leader's conflict
//! - `Releasing`: relationship ended, cleanup owed on the next tick

use serde::{Deserialize, Serialize};

use crate::core::config::EscortConfig;
use crate::core::error::{EscortError, Result};
use crate::core::types::{HeroId, PartyId, SettlementId, TimeControl};
use crate::escort::battle::{BattleParticipationCoordinator, JoinOutcome};
use crate::escort::movement::EscortMovementController;
use crate::escort::notice::{Notice, NoticeLog};
use crate::escort::persist::EscortSave;
use crate::escort::protection::{InterceptContext, ProtectionInterceptorSet, Verdict};
use crate::escort::state::RelationshipState;
use crate::escort::visibility::VisibilityIllusionController;
use crate::host::{HostEvent, HostSimulation, HostView, Interaction, MenuContext};
use crate::services::{
    DialogueService, FollowCommand, ProgressionService, RewardService, TriggerContext,
};

/// Where the state machine currently sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscortPhase {
    Idle,
    Following,
    InConflict,
    Releasing,
}

impl EscortPhase {
    /// Phases in which the relationship is active
    pub fn is_engaged(&self) -> bool {
        matches!(self, Self::Following | Self::InConflict)
    }
}

/// Why the relationship ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseKind {
    Voluntary,
    /// Leader dead, leaderless or its party gone
    Forced,
}

/// Collaborators handed to event callbacks
pub struct Services<'a> {
    pub progression: &'a mut dyn ProgressionService,
    pub rewards: &'a mut dyn RewardService,
    pub dialogue: &'a mut dyn DialogueService,
}

/// The escort state machine for one follower
pub struct TickOrchestrator {
    follower: PartyId,
    config: EscortConfig,
    state: RelationshipState,
    phase: EscortPhase,
    visibility: VisibilityIllusionController,
    movement: EscortMovementController,
    battle: BattleParticipationCoordinator,
    protection: ProtectionInterceptorSet,
    notices: NoticeLog,
    /// Clock mode to restore once the follower leaves a settlement
    resume_time: Option<TimeControl>,
    /// Last running clock mode seen while the follower was out on the map
    running_time: Option<TimeControl>,
}

impl TickOrchestrator {
    /// Build the orchestrator once at system start
    ///
    /// Probes the host for a fine-grained visual layer and picks the
    /// matching hider.
    pub fn new<H: HostView>(follower: PartyId, config: EscortConfig, host: &H) -> Self {
        let visibility = VisibilityIllusionController::probe(host.supports_visual_layer());
        let movement = EscortMovementController::new(config.position_epsilon);

        Self {
            follower,
            config,
            state: RelationshipState::new(),
            phase: EscortPhase::Idle,
            visibility,
            movement,
            battle: BattleParticipationCoordinator::new(),
            protection: ProtectionInterceptorSet::with_defaults(),
            notices: NoticeLog::new(),
            resume_time: None,
            running_time: running_mode(host, follower),
        }
    }

    /// Swap the interceptor catalog
    pub fn with_protection(mut self, protection: ProtectionInterceptorSet) -> Self {
        self.protection = protection;
        self
    }

    pub fn follower(&self) -> PartyId {
        self.follower
    }

    pub fn config(&self) -> &EscortConfig {
        &self.config
    }

    pub fn state(&self) -> &RelationshipState {
        &self.state
    }

    pub fn phase(&self) -> EscortPhase {
        self.phase
    }

    pub fn visibility(&self) -> &VisibilityIllusionController {
        &self.visibility
    }

    pub fn notices(&self) -> &NoticeLog {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    /// Party currently led by the leader, if it can be resolved
    pub fn leader_party<H: HostView + ?Sized>(&self, host: &H) -> Option<PartyId> {
        self.state.leader().and_then(|hero| host.party_led_by(hero))
    }

    // === COMMANDS ===

    /// Start following `leader`
    pub fn begin_following<H: HostSimulation>(&mut self, host: &mut H, leader: HeroId) -> Result<()> {
        let host: &mut dyn HostSimulation = host;

        if self.state.is_active() {
            return Err(EscortError::InvalidTransition(
                "already following a leader".into(),
            ));
        }
        if self.phase == EscortPhase::Releasing {
            self.cleanup(host);
        }

        let leader_party = validate_leader(host, leader).map_err(EscortError::LeaderUnavailable)?;
        if leader_party == self.follower {
            return Err(EscortError::InvalidTransition("cannot follow yourself".into()));
        }

        self.note_running_time(host);
        let prior_visibility = host.is_visible_on_map(self.follower);
        self.state.begin(leader, prior_visibility)?;
        self.visibility.sync_original_visibility(prior_visibility);
        self.battle.reset();
        self.phase = EscortPhase::Following;

        let follower = self.follower;
        log_step("escort directive", self.movement.escort(host, follower, leader_party));
        log_step("hide follower", self.visibility.hide(host, follower));
        log_step("camera focus", host.set_camera_focus(leader_party));

        let leader_name = hero_name(host, leader);
        tracing::info!(?leader, ?leader_party, prior_visibility, "began following");
        self.notices.push(Notice::EnteredService { leader: leader_name });
        Ok(())
    }

    /// End the relationship voluntarily
    ///
    /// Cleanup runs on the next tick.
    pub fn end_following<H: HostSimulation>(&mut self, host: &mut H) -> Result<()> {
        if !self.state.is_active() {
            return Err(EscortError::InvalidTransition("not following anyone".into()));
        }
        self.release(host, ReleaseKind::Voluntary, "released by request")
    }

    /// Hold the follower out of battle joins
    pub fn set_reserve(&mut self, reserve: bool) {
        if self.state.reserve() != reserve {
            tracing::info!(reserve, "reserve flag changed");
        }
        self.state.set_reserve(reserve);
    }

    /// Run a command picked from a dialogue trigger
    pub fn execute<H: HostSimulation>(
        &mut self,
        host: &mut H,
        command: FollowCommand,
        speaker: HeroId,
    ) -> Result<()> {
        match command {
            FollowCommand::Begin => self.begin_following(host, speaker),
            FollowCommand::End if self.state.leader() == Some(speaker) => self.end_following(host),
            FollowCommand::End => Err(EscortError::InvalidTransition(format!(
                "{:?} is not the current leader",
                speaker
            ))),
        }
    }

    /// Context dialogue trigger conditions are evaluated against
    pub fn trigger_context<H: HostView>(&self, host: &H, speaker: HeroId) -> TriggerContext {
        let speaker_leads_active_party = host.is_hero_alive(speaker)
            && host
                .party_led_by(speaker)
                .is_some_and(|party| party != self.follower && host.is_party_active(party));

        TriggerContext {
            speaker,
            speaker_leads_active_party,
            relationship_active: self.state.is_active(),
            current_leader: self.state.leader(),
        }
    }

    // === HOST CALLBACKS ===

    /// Entry point for every host event
    ///
    /// Never fails: internal errors are logged and the callback returns.
    pub fn handle_event<H: HostSimulation>(
        &mut self,
        host: &mut H,
        services: &mut Services<'_>,
        event: HostEvent,
    ) {
        let host: &mut dyn HostSimulation = host;

        let result = match event {
            HostEvent::SessionStarted => {
                self.register_triggers(&mut *services.dialogue);
                Ok(())
            }
            HostEvent::Tick => self.on_tick(host, services),
            HostEvent::HourElapsed => self.on_hour(host),
            HostEvent::DayElapsed => {
                self.on_day(services);
                Ok(())
            }
            HostEvent::SettlementEntered { party, settlement } => {
                self.on_settlement_entered(host, party, settlement)
            }
            HostEvent::SettlementLeft { party, settlement } => {
                self.on_settlement_left(host, party, settlement)
            }
            HostEvent::ConflictStarted { conflict } => {
                tracing::debug!(?conflict, "conflict started");
                Ok(())
            }
            HostEvent::ConflictEnded { conflict } => {
                self.on_conflict_ended(host);
                tracing::debug!(?conflict, "conflict ended");
                Ok(())
            }
        };

        if let Err(e) = result {
            tracing::warn!(?event, error = %e, "escort step failed");
        }
    }

    /// Ask the interceptors about a host-initiated action
    ///
    /// Suppressions carry their notice and any hold order out to the host.
    pub fn intercept<H: HostSimulation>(&mut self, host: &mut H, interaction: &Interaction) -> Verdict {
        let verdict = {
            let view: &dyn HostView = &*host;
            let ctx = InterceptContext {
                host: view,
                state: &self.state,
                follower: self.follower,
            };
            self.protection.evaluate(&ctx, interaction)
        };

        if let Verdict::Suppress(suppression) = &verdict {
            tracing::debug!(point = ?suppression.point, ?interaction, "interaction suppressed");
            if let Some(notice) = &suppression.notice {
                self.notices.push(notice.clone());
            }
            if let Some(pursuer) = suppression.hold {
                log_step("hold pursuer", self.movement.hold(host, pursuer));
            }
        }

        verdict
    }

    // === PERSISTENCE ===

    pub fn save(&self) -> EscortSave {
        EscortSave::new(self.state.clone())
    }

    /// Load a saved relationship into the existing record
    pub fn restore<H: HostSimulation>(&mut self, host: &mut H, save: EscortSave) {
        self.state.load_from(save.state);
        self.visibility
            .sync_original_visibility(self.state.prior_visibility());
        self.battle.reset();
        self.resume_time = None;

        self.phase = if self.state.pending_release() {
            EscortPhase::Releasing
        } else if !self.state.is_active() {
            EscortPhase::Idle
        } else if host.conflict_of(self.follower).is_some() {
            EscortPhase::InConflict
        } else {
            EscortPhase::Following
        };

        if self.phase == EscortPhase::Following {
            if let Some(leader_party) = self.leader_party(host) {
                log_step("escort directive", self.movement.escort(host, self.follower, leader_party));
            }
        }

        tracing::info!(phase = ?self.phase, version = save.version, "relationship restored");
    }

    // === STEPS ===

    fn on_tick(&mut self, host: &mut dyn HostSimulation, services: &mut Services<'_>) -> Result<()> {
        self.note_running_time(host);
        match self.phase {
            EscortPhase::Idle => return Ok(()),
            EscortPhase::Releasing => {
                self.cleanup(host);
                return Ok(());
            }
            EscortPhase::Following | EscortPhase::InConflict => {}
        }

        let leader_party = match self.check_leader(host) {
            Ok(party) => party,
            Err(reason) => return self.release(host, ReleaseKind::Forced, &reason),
        };
        let follower = self.follower;

        // Visibility first
        log_step("maintain illusion", self.visibility.maintain(host, follower, leader_party));

        // Then conflict detection
        if self.phase == EscortPhase::InConflict && host.conflict_of(follower).is_none() {
            self.leave_conflict(host, leader_party);
        }
        if self.phase == EscortPhase::Following {
            self.detect_conflict(host, services, leader_party);
        }

        // Position is the host's business while fighting
        if self.phase != EscortPhase::Following || host.current_settlement(follower).is_some() {
            return Ok(());
        }

        log_step("mirror position", self.movement.mirror_position(host, follower, leader_party));
        if !self.awaiting_conflict(host, leader_party) {
            log_step("suppress initiative", self.movement.suppress_initiative(host, follower));
        }
        Ok(())
    }

    fn on_hour(&mut self, host: &mut dyn HostSimulation) -> Result<()> {
        if !self.config.hourly_validity_check || !self.state.is_active() {
            return Ok(());
        }
        match self.check_leader(host) {
            Ok(_) => Ok(()),
            Err(reason) => self.release(host, ReleaseKind::Forced, &reason),
        }
    }

    fn on_day(&mut self, services: &mut Services<'_>) {
        if !self.state.is_active() {
            return;
        }
        let tier = services.progression.current_tier();
        let stipend = self.config.stipend_for_tier(tier);
        services.rewards.pay_daily_stipend(stipend);
        services
            .progression
            .award_experience(self.config.daily_service_experience, "daily service");
        tracing::debug!(tier, stipend, "daily service paid");
    }

    fn on_settlement_entered(
        &mut self,
        host: &mut dyn HostSimulation,
        party: PartyId,
        settlement: SettlementId,
    ) -> Result<()> {
        if !self.state.is_active() || self.leader_party(host) != Some(party) {
            return Ok(());
        }

        let follower = self.follower;
        if host.current_settlement(follower) == Some(settlement) {
            return Ok(());
        }

        // The host stops the clock on entry, so a stopped clock here already
        // belongs to some earlier visit
        self.resume_time = running_mode(&*host, follower).or(self.running_time);
        if host.current_settlement(follower).is_some() {
            host.leave_settlement(follower)?;
        }
        host.begin_settlement_entry(follower, settlement)?;
        tracing::info!(?settlement, "follower entering settlement with leader");
        Ok(())
    }

    fn on_settlement_left(
        &mut self,
        host: &mut dyn HostSimulation,
        party: PartyId,
        settlement: SettlementId,
    ) -> Result<()> {
        if !self.state.is_active() || self.leader_party(host) != Some(party) {
            return Ok(());
        }

        let follower = self.follower;
        if host.current_settlement(follower).is_none() {
            return Ok(());
        }

        if host.menu_context() == MenuContext::Wait {
            host.end_wait_menu()?;
        }
        if host.in_encounter(follower) {
            host.finish_encounter(follower)?;
        } else if host.menu_context() != MenuContext::None {
            host.exit_to_previous_menu()?;
        }
        host.leave_settlement(follower)?;

        if let Some(mode) = self.resume_time.take().or(self.running_time) {
            host.set_time_control(mode);
        }
        tracing::info!(?settlement, "follower left settlement with leader");
        Ok(())
    }

    fn note_running_time(&mut self, host: &dyn HostSimulation) {
        if let Some(mode) = running_mode(host, self.follower) {
            self.running_time = Some(mode);
        }
    }

    fn on_conflict_ended(&mut self, host: &mut dyn HostSimulation) {
        if self.phase != EscortPhase::InConflict || host.conflict_of(self.follower).is_some() {
            return;
        }
        if let Some(leader_party) = self.leader_party(host) {
            self.leave_conflict(host, leader_party);
        }
    }

    fn detect_conflict(
        &mut self,
        host: &mut dyn HostSimulation,
        services: &mut Services<'_>,
        leader_party: PartyId,
    ) {
        let follower = self.follower;

        // Host may have dragged the follower in on its own
        if host.conflict_of(follower).is_some() {
            self.phase = EscortPhase::InConflict;
            return;
        }

        match self.battle.try_join(host, follower, leader_party, self.state.reserve()) {
            JoinOutcome::Requested { conflict, side } => {
                services
                    .progression
                    .award_experience(self.config.battle_join_experience, "joined battle");
                if host.conflict_of(follower).is_some() {
                    self.phase = EscortPhase::InConflict;
                }
                tracing::info!(?conflict, ?side, phase = ?self.phase, "joined leader's conflict");
            }
            JoinOutcome::Failed { conflict, reason } => {
                tracing::warn!(?conflict, %reason, "conflict join failed, will retry next tick");
                self.notices.push(Notice::JoinFailed { reason });
            }
            _ => {}
        }
    }

    fn leave_conflict(&mut self, host: &mut dyn HostSimulation, leader_party: PartyId) {
        self.phase = EscortPhase::Following;
        tracing::info!("follower's conflict ended, back to following");
        log_step("escort directive", self.movement.escort(host, self.follower, leader_party));
    }

    /// Follower was flagged active to take part in the leader's conflict
    fn awaiting_conflict(&self, host: &dyn HostSimulation, leader_party: PartyId) -> bool {
        self.battle
            .requested()
            .is_some_and(|conflict| host.conflict_of(leader_party) == Some(conflict))
    }

    fn check_leader(&self, host: &dyn HostSimulation) -> std::result::Result<PartyId, String> {
        let leader = self
            .state
            .leader()
            .ok_or_else(|| "no leader recorded".to_string())?;
        validate_leader(host, leader)
    }

    fn release(
        &mut self,
        host: &mut dyn HostSimulation,
        kind: ReleaseKind,
        reason: &str,
    ) -> Result<()> {
        let leader = self.state.release()?;
        self.phase = EscortPhase::Releasing;
        self.battle.reset();

        let leader_name = hero_name(host, leader);
        match kind {
            ReleaseKind::Voluntary => {
                tracing::info!(?leader, reason, "relationship released");
                self.notices.push(Notice::LeftService { leader: leader_name });
            }
            ReleaseKind::Forced => {
                tracing::warn!(?leader, reason, "relationship force-released");
                self.notices
                    .push(Notice::ServiceEndedLeaderUnavailable { leader: leader_name });
            }
        }
        Ok(())
    }

    /// One-shot cleanup after a release; always completes
    fn cleanup(&mut self, host: &mut dyn HostSimulation) {
        let follower = self.follower;
        let prior_visibility = self.state.prior_visibility();

        log_step(
            "restore visibility",
            self.visibility.restore(host, follower, prior_visibility),
        );
        log_step("independent movement", self.movement.release(host, follower));
        log_step("restore initiative", self.movement.restore_initiative(host, follower));
        log_step("camera focus", host.set_camera_focus(follower));

        self.state.complete_release();
        self.phase = EscortPhase::Idle;
        self.resume_time = None;
        tracing::info!(prior_visibility, "release cleanup complete");
    }

    fn register_triggers(&self, dialogue: &mut dyn DialogueService) {
        dialogue.register_begin_following_trigger(
            Box::new(|ctx: &TriggerContext| {
                !ctx.relationship_active && ctx.speaker_leads_active_party
            }),
            FollowCommand::Begin,
        );
        dialogue.register_end_following_trigger(
            Box::new(|ctx: &TriggerContext| {
                ctx.relationship_active && ctx.current_leader == Some(ctx.speaker)
            }),
            FollowCommand::End,
        );
        tracing::debug!("dialogue triggers registered");
    }
}

/// Leader alive, leading a party, and that party still active
fn validate_leader(host: &dyn HostSimulation, leader: HeroId) -> std::result::Result<PartyId, String> {
    if !host.is_hero_alive(leader) {
        return Err(format!("{:?} is dead", leader));
    }
    let party = host
        .party_led_by(leader)
        .ok_or_else(|| format!("{:?} leads no party", leader))?;
    if !host.party_exists(party) {
        return Err(format!("{:?} no longer exists", party));
    }
    if !host.is_party_active(party) {
        return Err(format!("{:?} is inactive", party));
    }
    Ok(party)
}

/// Clock mode, if it is running and the follower is out on the map
fn running_mode<H: HostView + ?Sized>(host: &H, follower: PartyId) -> Option<TimeControl> {
    let mode = host.time_control();
    (mode != TimeControl::Stop && host.current_settlement(follower).is_none()).then_some(mode)
}

fn hero_name(host: &dyn HostSimulation, hero: HeroId) -> String {
    host.hero_name(hero)
        .unwrap_or_else(|| format!("Hero {}", hero.0))
}

fn log_step<T>(step: &'static str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(step, error = %e, "escort step failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::world::CampaignWorld;
    use crate::core::types::Vec2;
    use crate::services::{ExperienceLedger, Purse, TriggerRegistry};

    struct Harness {
        world: CampaignWorld,
        orchestrator: TickOrchestrator,
        ledger: ExperienceLedger,
        purse: Purse,
        dialogue: TriggerRegistry,
        player: PartyId,
        hero: HeroId,
        lord: PartyId,
    }

    impl Harness {
        fn new() -> Self {
            let mut world = CampaignWorld::new();
            let vlandia = world.add_faction("Vlandia", false);
            let player = world.spawn_party("Player", vlandia, Vec2::new(0.0, 0.0));
            let (hero, lord) = world.spawn_lord("Derthert", vlandia, Vec2::new(5.0, 5.0));
            let orchestrator = TickOrchestrator::new(player, EscortConfig::default(), &world);
            Self {
                world,
                orchestrator,
                ledger: ExperienceLedger::default(),
                purse: Purse::default(),
                dialogue: TriggerRegistry::new(),
                player,
                hero,
                lord,
            }
        }

        fn event(&mut self, event: HostEvent) {
            let mut services = Services {
                progression: &mut self.ledger,
                rewards: &mut self.purse,
                dialogue: &mut self.dialogue,
            };
            self.orchestrator.handle_event(&mut self.world, &mut services, event);
        }
    }

    #[test]
    fn test_begin_following() {
        let mut h = Harness::new();
        h.orchestrator.begin_following(&mut h.world, h.hero).unwrap();

        assert_eq!(h.orchestrator.phase(), EscortPhase::Following);
        assert!(h.orchestrator.state().is_active());
        assert!(!h.world.is_visible_on_map(h.player));
        assert_eq!(h.world.camera_focus(), Some(h.lord));
    }

    #[test]
    fn test_tick_mirrors_and_deactivates() {
        let mut h = Harness::new();
        h.orchestrator.begin_following(&mut h.world, h.hero).unwrap();
        h.event(HostEvent::Tick);

        assert_eq!(h.world.party_position(h.player), h.world.party_position(h.lord));
        assert!(!h.world.is_party_active(h.player));
    }

    #[test]
    fn test_cannot_follow_self() {
        let mut h = Harness::new();
        let own_hero = h.world.assign_leader("Player Hero", h.player);
        let err = h.orchestrator.begin_following(&mut h.world, own_hero).unwrap_err();
        assert!(matches!(err, EscortError::InvalidTransition(_)));
        assert_eq!(h.orchestrator.phase(), EscortPhase::Idle);
    }

    #[test]
    fn test_begin_with_dead_leader_rejected() {
        let mut h = Harness::new();
        h.world.kill_hero(h.hero);
        let err = h.orchestrator.begin_following(&mut h.world, h.hero).unwrap_err();
        assert!(matches!(err, EscortError::LeaderUnavailable(_)));
        assert!(!h.orchestrator.state().is_active());
    }

    #[test]
    fn test_end_when_idle_rejected() {
        let mut h = Harness::new();
        assert!(h.orchestrator.end_following(&mut h.world).is_err());
    }

    #[test]
    fn test_begin_during_release_window_cleans_up_first() {
        let mut h = Harness::new();
        h.orchestrator.begin_following(&mut h.world, h.hero).unwrap();
        h.orchestrator.end_following(&mut h.world).unwrap();
        assert_eq!(h.orchestrator.phase(), EscortPhase::Releasing);

        h.orchestrator.begin_following(&mut h.world, h.hero).unwrap();
        assert_eq!(h.orchestrator.phase(), EscortPhase::Following);
        assert!(!h.orchestrator.state().pending_release());
        // Prior visibility captured after the cleanup restored it
        assert!(h.orchestrator.state().prior_visibility());
    }

    #[test]
    fn test_session_start_registers_triggers() {
        let mut h = Harness::new();
        h.event(HostEvent::SessionStarted);
        assert_eq!(h.dialogue.len(), 2);

        let ctx = h.orchestrator.trigger_context(&h.world, h.hero);
        assert_eq!(h.dialogue.available(&ctx), vec![FollowCommand::Begin]);

        h.orchestrator.execute(&mut h.world, FollowCommand::Begin, h.hero).unwrap();
        let ctx = h.orchestrator.trigger_context(&h.world, h.hero);
        assert_eq!(h.dialogue.available(&ctx), vec![FollowCommand::End]);
    }

    #[test]
    fn test_repeated_session_start_keeps_two_triggers() {
        let mut h = Harness::new();
        h.event(HostEvent::SessionStarted);
        h.event(HostEvent::SessionStarted);
        assert_eq!(h.dialogue.len(), 2);
    }

    #[test]
    fn test_end_command_from_stranger_rejected() {
        let mut h = Harness::new();
        h.orchestrator.begin_following(&mut h.world, h.hero).unwrap();
        let err = h
            .orchestrator
            .execute(&mut h.world, FollowCommand::End, HeroId(999))
            .unwrap_err();
        assert!(matches!(err, EscortError::InvalidTransition(_)));
        assert!(h.orchestrator.state().is_active());
    }

    #[test]
    fn test_daily_stipend_scales_with_tier() {
        let mut h = Harness::new();
        h.event(HostEvent::DayElapsed);
        assert!(h.purse.payments.is_empty(), "no stipend while idle");

        h.orchestrator.begin_following(&mut h.world, h.hero).unwrap();
        h.ledger.total = 1000; // tier 2 at 500 per tier
        h.event(HostEvent::DayElapsed);

        assert_eq!(h.purse.payments, vec![20]);
        assert_eq!(h.ledger.total, 1010);
    }

    #[test]
    fn test_hourly_check_can_be_disabled() {
        let mut h = Harness::new();
        h.orchestrator.config.hourly_validity_check = false;
        h.orchestrator.begin_following(&mut h.world, h.hero).unwrap();
        h.world.kill_hero(h.hero);

        h.event(HostEvent::HourElapsed);
        assert!(h.orchestrator.state().is_active());

        // The per-tick check still catches it
        h.event(HostEvent::Tick);
        assert_eq!(h.orchestrator.phase(), EscortPhase::Releasing);
    }

    #[test]
    fn test_restore_resyncs_visibility_mirror() {
        let mut h = Harness::new();
        h.world.set_visible_on_map(h.player, false).unwrap();
        h.orchestrator.begin_following(&mut h.world, h.hero).unwrap();
        let save = h.orchestrator.save();

        let mut fresh = TickOrchestrator::new(h.player, EscortConfig::default(), &h.world);
        assert!(fresh.visibility().original_visibility());
        fresh.restore(&mut h.world, save);

        assert_eq!(fresh.phase(), EscortPhase::Following);
        assert!(!fresh.visibility().original_visibility());
        assert_eq!(fresh.state().leader(), Some(h.hero));
    }
}
