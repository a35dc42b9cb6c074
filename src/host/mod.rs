//! Host interception surface
//!
//! The escort core never reaches into the simulation directly. Everything it
//! reads goes through [`HostView`], everything it writes goes through
//! [`HostSimulation`]. Interceptors only ever receive a `&dyn HostView`, so
//! the follower's flags stay single-writer.

pub mod events;
pub mod interaction;

pub use events::HostEvent;
pub use interaction::{Interaction, InterceptionPoint};

use serde::{Deserialize, Serialize};

use crate::core::error::{EscortError, Result};
use crate::core::types::{
    BattleSide, ConflictId, FactionId, HeroId, PartyId, SettlementId, TimeControl, Vec2,
};

/// High-level movement directive handed to the host's own movement AI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MovementDirective {
    /// The party's own AI decides where to go
    Independent,
    /// Shadow another party
    Escort(PartyId),
    /// Stay where you are
    Hold,
    /// Travel to a point
    MoveTo(Vec2),
}

impl Default for MovementDirective {
    fn default() -> Self {
        Self::Independent
    }
}

/// Which kind of UI context is currently open on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MenuContext {
    #[default]
    None,
    /// A regular menu (settlement, encounter)
    Menu,
    /// A wait-style menu that keeps time running until dismissed
    Wait,
}

/// Read-only queries the core may make against the host
pub trait HostView {
    // === PARTIES ===
    fn party_exists(&self, party: PartyId) -> bool;
    fn party_name(&self, party: PartyId) -> Option<String>;
    fn party_position(&self, party: PartyId) -> Option<Vec2>;
    fn party_faction(&self, party: PartyId) -> Option<FactionId>;
    /// Activation flag: inactive parties do not run their own AI or seek encounters
    fn is_party_active(&self, party: PartyId) -> bool;
    fn is_visible_on_map(&self, party: PartyId) -> bool;
    fn movement(&self, party: PartyId) -> Option<MovementDirective>;
    fn camera_focus(&self) -> Option<PartyId>;

    // === HEROES ===
    fn hero_name(&self, hero: HeroId) -> Option<String>;
    fn is_hero_alive(&self, hero: HeroId) -> bool;
    /// Party currently led by this hero, if any
    fn party_led_by(&self, hero: HeroId) -> Option<PartyId>;

    // === FACTIONS ===
    fn is_bandit_faction(&self, faction: FactionId) -> bool;
    fn at_war(&self, a: FactionId, b: FactionId) -> bool;

    // === CONFLICTS ===
    fn conflict_of(&self, party: PartyId) -> Option<ConflictId>;
    fn conflict_side(&self, conflict: ConflictId, party: PartyId) -> Option<BattleSide>;
    /// Leading party of one side of a conflict
    fn side_leader(&self, conflict: ConflictId, side: BattleSide) -> Option<PartyId>;
    fn in_encounter(&self, party: PartyId) -> bool;

    // === SETTLEMENTS & UI ===
    fn current_settlement(&self, party: PartyId) -> Option<SettlementId>;
    fn menu_context(&self) -> MenuContext;
    fn time_control(&self) -> TimeControl;

    /// Capability probe: does the host expose a fine-grained visual layer?
    fn supports_visual_layer(&self) -> bool {
        false
    }
}

/// Mutations the core may request from the host
///
/// Every call may be rejected; callers treat a rejection as transient.
pub trait HostSimulation: HostView {
    fn set_party_position(&mut self, party: PartyId, position: Vec2) -> Result<()>;
    fn set_visible_on_map(&mut self, party: PartyId, visible: bool) -> Result<()>;
    fn set_party_active(&mut self, party: PartyId, active: bool) -> Result<()>;
    fn set_movement(&mut self, party: PartyId, directive: MovementDirective) -> Result<()>;
    fn set_camera_focus(&mut self, party: PartyId) -> Result<()>;

    /// Hide or show the rendered representation of a party
    fn set_visual_rendered(&mut self, party: PartyId, rendered: bool) -> Result<()> {
        let _ = (party, rendered);
        Err(EscortError::VisualLayerUnavailable(
            "host exposes no visual layer".into(),
        ))
    }

    /// Generic two-sided encounter primitive
    ///
    /// If either party already fights in a conflict, the other joins it on
    /// the opposite side. Otherwise a fresh conflict is opened.
    fn start_encounter(&mut self, attacker: PartyId, defender: PartyId) -> Result<()>;
    fn finish_encounter(&mut self, party: PartyId) -> Result<()>;

    fn begin_settlement_entry(&mut self, party: PartyId, settlement: SettlementId) -> Result<()>;
    fn leave_settlement(&mut self, party: PartyId) -> Result<()>;
    fn end_wait_menu(&mut self) -> Result<()>;
    fn exit_to_previous_menu(&mut self) -> Result<()>;
    fn set_time_control(&mut self, mode: TimeControl);
}
