//! Enlisted - headless scenario runner
//!
//! Builds a small campaign, enlists the player with a lord and runs the
//! escort core tick by tick: a settlement visit, a field battle, bandits
//! that never get to the hidden player, and optionally the lord's death.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use enlisted::campaign::CampaignWorld;
use enlisted::core::types::{HeroId, PartyId, SettlementId, Tick, Vec2};
use enlisted::core::{EscortConfig, Result};
use enlisted::escort::{Services, TickOrchestrator};
use enlisted::host::{HostSimulation, HostView, Interaction, MovementDirective};
use enlisted::services::{ExperienceLedger, Purse, TriggerRegistry};

/// Ticks the lord lingers inside a settlement
const VISIT_TICKS: Tick = 12;

/// Enlisted - follow a lord across the campaign map
#[derive(Parser, Debug)]
#[command(name = "enlisted")]
#[command(about = "Run a headless campaign with the player serving in a lord's party")]
struct Args {
    /// Number of campaign ticks to simulate
    #[arg(long, default_value_t = 240)]
    ticks: u64,

    /// Random seed for reproducible runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// TOML file with escort tunables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Kill the lord on this tick to exercise the forced release
    #[arg(long)]
    kill_leader_at: Option<u64>,

    /// Write the final save record to this path
    #[arg(long)]
    save: Option<PathBuf>,

    /// Verbose output (debug-level logs)
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// What the lord is up to
#[derive(Debug, Clone, Copy)]
enum LordPlan {
    TravelTo(SettlementId),
    Visit { settlement: SettlementId, leave_at: Tick },
    March(Vec2),
}

struct Scenario {
    world: CampaignWorld,
    orchestrator: TickOrchestrator,
    ledger: ExperienceLedger,
    purse: Purse,
    dialogue: TriggerRegistry,
    player: PartyId,
    hero: HeroId,
    lord: PartyId,
    plan: LordPlan,
}

impl Scenario {
    fn build(seed: u64, config: EscortConfig) -> Self {
        let mut world =
            CampaignWorld::with_seed(seed).with_clock(config.ticks_per_hour, config.hours_per_day);
        world.set_visibility_reset_interval(Some(config.ticks_per_hour.into()));

        let vlandia = world.add_faction("Vlandia", false);
        let battania = world.add_faction("Battania", false);
        let looters = world.add_faction("Looters", true);
        world.declare_war(vlandia, battania);

        let player = world.spawn_party("Player", vlandia, Vec2::new(0.0, 0.0));
        let (hero, lord) = world.spawn_lord("Derthert", vlandia, Vec2::new(2.0, 1.0));
        let town = world.add_settlement("Pravend", Vec2::new(10.0, 4.0), Some(vlandia));
        world.add_settlement("Marunath", Vec2::new(40.0, 20.0), Some(battania));

        let (_, raider) = world.spawn_lord("Caladog", battania, Vec2::new(32.0, 14.0));
        if let Err(e) = world.set_movement(raider, MovementDirective::MoveTo(Vec2::new(26.0, 12.0))) {
            tracing::warn!(error = %e, "could not order the raiding party");
        }
        world.spawn_wanderer("Looters", looters, Vec2::new(14.0, 6.0));
        world.spawn_wanderer("Sea Raiders", looters, Vec2::new(6.0, -3.0));

        let orchestrator = TickOrchestrator::new(player, config, &world);
        tracing::info!(hider = orchestrator.visibility().hider_name(), "campaign built");

        Self {
            world,
            orchestrator,
            ledger: ExperienceLedger::default(),
            purse: Purse::default(),
            dialogue: TriggerRegistry::new(),
            player,
            hero,
            lord,
            plan: LordPlan::TravelTo(town),
        }
    }

    /// Feed every queued host callback to the orchestrator
    fn pump(&mut self) {
        while let Some(event) = self.world.next_event() {
            let mut services = Services {
                progression: &mut self.ledger,
                rewards: &mut self.purse,
                dialogue: &mut self.dialogue,
            };
            self.orchestrator.handle_event(&mut self.world, &mut services, event);
        }
    }

    /// Talk to the lord and pick whatever the dialogue offers
    fn enlist(&mut self) {
        let ctx = self.orchestrator.trigger_context(&self.world, self.hero);
        for command in self.dialogue.available(&ctx) {
            if let Err(e) = self.orchestrator.execute(&mut self.world, command, self.hero) {
                tracing::warn!(?command, error = %e, "dialogue command failed");
            }
        }
    }

    fn run(&mut self, ticks: u64, kill_leader_at: Option<u64>) {
        self.world.start_session();
        self.pump();
        self.enlist();

        for _ in 0..ticks {
            self.world.campaign_tick();
            let tick = self.world.current_tick();

            if kill_leader_at == Some(tick) {
                self.world.kill_hero(self.hero);
            }

            self.drive_lord(tick);
            self.resolve_engagements();
            self.pump();

            for notice in self.orchestrator.drain_notices() {
                println!("[tick {:>4}] {}", tick, notice);
            }
        }
    }

    fn drive_lord(&mut self, tick: Tick) {
        let Some(position) = self.world.party_position(self.lord) else {
            return;
        };
        if self.world.conflict_of(self.lord).is_some() || !self.world.is_hero_alive(self.hero) {
            return;
        }

        let plan = self.plan;
        let result = match plan {
            LordPlan::TravelTo(settlement) => {
                let Some(target) = self.world.settlement(settlement).map(|s| s.position) else {
                    return;
                };
                if position == target {
                    self.plan = LordPlan::Visit { settlement, leave_at: tick + VISIT_TICKS };
                    self.world.begin_settlement_entry(self.lord, settlement)
                } else {
                    self.world.set_movement(self.lord, MovementDirective::MoveTo(target))
                }
            }
            LordPlan::Visit { leave_at, .. } if tick == leave_at - VISIT_TICKS / 2 => {
                self.world.open_wait_menu()
            }
            LordPlan::Visit { settlement, leave_at } if tick >= leave_at => {
                let front = Vec2::new(30.0, 13.0);
                tracing::info!(?settlement, "lord departs for the front");
                self.plan = LordPlan::March(front);
                self.world
                    .leave_settlement(self.lord)
                    .and_then(|_| self.world.set_movement(self.lord, MovementDirective::MoveTo(front)))
            }
            LordPlan::Visit { .. } => Ok(()),
            LordPlan::March(front) if self.world.movement(self.lord) == Some(MovementDirective::Independent) => {
                self.world.set_movement(self.lord, MovementDirective::MoveTo(front))
            }
            LordPlan::March(_) => Ok(()),
        };

        if let Err(e) = result {
            tracing::warn!(plan = ?self.plan, error = %e, "lord's order failed");
        }
    }

    /// Let hostile parties engage, routing anything touching the player
    /// through the interceptors first
    fn resolve_engagements(&mut self) {
        for (pursuer, target) in self.world.check_engagements() {
            if self.world.conflict_of(pursuer).is_some() || self.world.conflict_of(target).is_some() {
                continue;
            }

            if pursuer == self.player || target == self.player {
                let engagement = Interaction::engagement(pursuer, target);
                if self.orchestrator.intercept(&mut self.world, &engagement).is_suppressed() {
                    continue;
                }
                let encounter = Interaction::encounter_start(pursuer, target);
                if self.orchestrator.intercept(&mut self.world, &encounter).is_suppressed() {
                    continue;
                }
            }

            if let Err(e) = self.world.start_encounter(pursuer, target) {
                tracing::debug!(?pursuer, ?target, error = %e, "engagement refused by host");
            }
        }
    }

    fn report(&self) {
        println!();
        println!("=== ENLISTED ===");
        println!("Phase:        {:?}", self.orchestrator.phase());
        println!("Leader:       {:?}", self.orchestrator.state().leader());
        println!("Experience:   {}", self.ledger.total);
        println!("Gold:         {}", self.purse.gold);
        println!("Encounters:   {}", self.world.encounter_requests());
        println!("Conflicts:    {}", self.world.conflict_log().len());
        println!(
            "Player:       visible={} active={}",
            self.world.is_visible_on_map(self.player),
            self.world.is_party_active(self.player)
        );
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "enlisted=debug" } else { "enlisted=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = match &args.config {
        Some(path) => EscortConfig::load(path)?,
        None => EscortConfig::default(),
    };

    tracing::info!(ticks = args.ticks, seed = args.seed, "enlisted starting");

    let mut scenario = Scenario::build(args.seed, config);
    scenario.run(args.ticks, args.kill_leader_at);
    scenario.report();

    if let Some(path) = &args.save {
        std::fs::write(path, scenario.orchestrator.save().to_json()?)?;
        tracing::info!(path = %path.display(), "save written");
    }

    Ok(())
}
