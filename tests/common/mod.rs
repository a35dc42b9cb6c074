//! Shared campaign fixture for the integration tests

#![allow(dead_code)]

use enlisted::campaign::CampaignWorld;
use enlisted::core::types::{FactionId, HeroId, PartyId, SettlementId, Vec2};
use enlisted::core::EscortConfig;
use enlisted::escort::{Notice, Services, TickOrchestrator};
use enlisted::host::HostEvent;
use enlisted::services::{ExperienceLedger, Purse, TriggerRegistry};

pub struct Campaign {
    pub world: CampaignWorld,
    pub orchestrator: TickOrchestrator,
    pub ledger: ExperienceLedger,
    pub purse: Purse,
    pub dialogue: TriggerRegistry,
    pub vlandia: FactionId,
    pub player: PartyId,
    pub hero: HeroId,
    pub lord: PartyId,
    pub enemy: PartyId,
    pub bandits: PartyId,
    pub town: SettlementId,
}

impl Campaign {
    pub fn new() -> Self {
        Self::with_world(CampaignWorld::new(), EscortConfig::default())
    }

    pub fn with_world(mut world: CampaignWorld, config: EscortConfig) -> Self {
        let vlandia = world.add_faction("Vlandia", false);
        let battania = world.add_faction("Battania", false);
        let looters = world.add_faction("Looters", true);
        world.declare_war(vlandia, battania);

        let player = world.spawn_party("Player", vlandia, Vec2::new(0.0, 0.0));
        let (hero, lord) = world.spawn_lord("Derthert", vlandia, Vec2::new(5.0, 5.0));
        let (_, enemy) = world.spawn_lord("Caladog", battania, Vec2::new(6.0, 5.0));
        let bandits = world.spawn_party("Looters", looters, Vec2::new(1.0, 1.0));
        let town = world.add_settlement("Pravend", Vec2::new(8.0, 8.0), Some(vlandia));

        let orchestrator = TickOrchestrator::new(player, config, &world);

        Self {
            world,
            orchestrator,
            ledger: ExperienceLedger::default(),
            purse: Purse::default(),
            dialogue: TriggerRegistry::new(),
            vlandia,
            player,
            hero,
            lord,
            enemy,
            bandits,
            town,
        }
    }

    /// Deliver one callback straight to the orchestrator
    pub fn event(&mut self, event: HostEvent) {
        let mut services = Services {
            progression: &mut self.ledger,
            rewards: &mut self.purse,
            dialogue: &mut self.dialogue,
        };
        self.orchestrator.handle_event(&mut self.world, &mut services, event);
    }

    /// Deliver every callback the world has queued
    pub fn pump(&mut self) {
        while let Some(event) = self.world.next_event() {
            self.event(event);
        }
    }

    /// One full campaign tick
    pub fn tick(&mut self) {
        self.world.campaign_tick();
        self.pump();
    }

    pub fn begin(&mut self) {
        self.orchestrator
            .begin_following(&mut self.world, self.hero)
            .expect("leader should be valid");
    }

    pub fn forced_release_notices(&mut self) -> usize {
        self.orchestrator
            .drain_notices()
            .iter()
            .filter(|n| n.is_forced_release())
            .count()
    }

    pub fn notices(&mut self) -> Vec<Notice> {
        self.orchestrator.drain_notices()
    }
}
