//! The escort core
//!
//! Keeps the follower glued to its leader: one persisted relationship
//! record, a per-tick synchronization step, battle participation and the
//! protection interceptors.

pub mod battle;
pub mod movement;
pub mod notice;
pub mod orchestrator;
pub mod persist;
pub mod protection;
pub mod state;
pub mod visibility;

pub use battle::{BattleParticipationCoordinator, JoinOutcome};
pub use movement::EscortMovementController;
pub use notice::{Notice, NoticeLog};
pub use orchestrator::{EscortPhase, ReleaseKind, Services, TickOrchestrator};
pub use persist::{EscortSave, SAVE_VERSION};
pub use protection::{
    is_hostile_to_leader, InterceptContext, Interceptor, ProtectionInterceptorSet, Suppression, Verdict,
};
pub use state::RelationshipState;
pub use visibility::{CoarseFlagHider, FineGrainedHider, VisibilityIllusionController, VisualHider};
