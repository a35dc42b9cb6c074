use serde::{Deserialize, Serialize};

use crate::core::types::{ConflictId, PartyId, SettlementId};

/// Callbacks the host fires into the escort core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostEvent {
    SessionStarted,
    Tick,
    HourElapsed,
    DayElapsed,
    SettlementEntered { party: PartyId, settlement: SettlementId },
    SettlementLeft { party: PartyId, settlement: SettlementId },
    ConflictStarted { conflict: ConflictId },
    ConflictEnded { conflict: ConflictId },
}
