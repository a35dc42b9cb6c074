//! User-visible notices raised by the escort core

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Oldest notices are dropped once the log holds this many
pub const NOTICE_LOG_CAPACITY: usize = 64;

/// Something the player should be told about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    EnteredService { leader: String },
    /// Voluntary end of service
    LeftService { leader: String },
    /// Involuntary end: the leader or its party is gone
    ServiceEndedLeaderUnavailable { leader: String },
    AvoidedWhileServing { party: String, leader: String },
    MergeRefused { party: String, leader: String },
    JoinFailed { reason: String },
}

impl Notice {
    /// Forced releases must be distinguishable from voluntary ones
    pub fn is_forced_release(&self) -> bool {
        matches!(self, Self::ServiceEndedLeaderUnavailable { .. })
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnteredService { leader } => write!(f, "You now ride with {}.", leader),
            Self::LeftService { leader } => write!(f, "You have left the service of {}.", leader),
            Self::ServiceEndedLeaderUnavailable { leader } => {
                write!(f, "Service ended: {} is no longer able to lead.", leader)
            }
            Self::AvoidedWhileServing { party, leader } => {
                write!(f, "{} avoids you while you serve {}.", party, leader)
            }
            Self::MergeRefused { party, leader } => {
                write!(f, "{} cannot take you in while you serve {}.", party, leader)
            }
            Self::JoinFailed { reason } => write!(f, "Could not join the battle: {}", reason),
        }
    }
}

/// Bounded log the host drains to display notices
#[derive(Debug, Clone, Default)]
pub struct NoticeLog {
    entries: VecDeque<Notice>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notice: Notice) {
        tracing::info!(notice = %notice, "notice");
        if self.entries.len() == NOTICE_LOG_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(notice);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.entries.iter()
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        self.entries.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_is_bounded() {
        let mut log = NoticeLog::new();
        for i in 0..(NOTICE_LOG_CAPACITY + 5) {
            log.push(Notice::JoinFailed { reason: i.to_string() });
        }
        assert_eq!(log.len(), NOTICE_LOG_CAPACITY);

        // The oldest five were evicted
        let first = log.iter().next().unwrap();
        assert_eq!(first, &Notice::JoinFailed { reason: "5".into() });
    }

    #[test]
    fn test_forced_release_text_differs() {
        let voluntary = Notice::LeftService { leader: "Derthert".into() };
        let forced = Notice::ServiceEndedLeaderUnavailable { leader: "Derthert".into() };

        assert!(!voluntary.is_forced_release());
        assert!(forced.is_forced_release());
        assert_ne!(voluntary.to_string(), forced.to_string());
    }

    #[test]
    fn test_drain_empties_log() {
        let mut log = NoticeLog::new();
        log.push(Notice::EnteredService { leader: "Rhagaea".into() });
        assert_eq!(log.drain().len(), 1);
        assert!(log.is_empty());
    }
}
