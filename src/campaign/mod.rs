//! Campaign layer: an in-memory host the escort core runs against
//!
//! Parties move across a flat map, enter settlements and fight in
//! conflicts. [`CampaignWorld`] implements the host traits so the core can
//! be driven end-to-end.

pub mod conflict;
pub mod party;
pub mod settlement;
pub mod world;

pub use conflict::{Conflict, ConflictEvent, ConflictKind};
pub use party::{MovementResult, Party};
pub use settlement::Settlement;
pub use world::{CampaignClock, CampaignWorld, Faction, Hero};
