//! Narrow interfaces to collaborators outside the escort core
//!
//! Progression, dialogue and rewards live elsewhere. The core only needs the
//! handful of calls below. The in-memory implementations back the demo
//! binary and the tests.

use crate::core::types::HeroId;

/// Experience and service tier
pub trait ProgressionService {
    fn award_experience(&mut self, amount: u32, reason: &str);
    fn current_tier(&self) -> u32;
}

/// Wages
pub trait RewardService {
    fn pay_daily_stipend(&mut self, amount: u32);
}

/// What the dialogue system hands back when a registered trigger is picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowCommand {
    Begin,
    End,
}

/// What a trigger condition may look at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerContext {
    pub speaker: HeroId,
    pub speaker_leads_active_party: bool,
    pub relationship_active: bool,
    pub current_leader: Option<HeroId>,
}

pub type TriggerCondition = Box<dyn Fn(&TriggerContext) -> bool>;

/// Conversation triggers for starting and ending service
pub trait DialogueService {
    fn register_begin_following_trigger(&mut self, condition: TriggerCondition, command: FollowCommand);
    fn register_end_following_trigger(&mut self, condition: TriggerCondition, command: FollowCommand);
}

/// Experience ledger with tiers every `experience_per_tier` points
#[derive(Debug, Clone)]
pub struct ExperienceLedger {
    pub total: u32,
    pub experience_per_tier: u32,
    pub max_tier: u32,
    pub history: Vec<(u32, String)>,
}

impl ExperienceLedger {
    pub fn new(experience_per_tier: u32, max_tier: u32) -> Self {
        Self {
            total: 0,
            experience_per_tier: experience_per_tier.max(1),
            max_tier,
            history: Vec::new(),
        }
    }
}

impl Default for ExperienceLedger {
    fn default() -> Self {
        Self::new(500, 6)
    }
}

impl ProgressionService for ExperienceLedger {
    fn award_experience(&mut self, amount: u32, reason: &str) {
        self.total = self.total.saturating_add(amount);
        self.history.push((amount, reason.to_string()));
        tracing::debug!(amount, reason, total = self.total, "experience awarded");
    }

    fn current_tier(&self) -> u32 {
        (self.total / self.experience_per_tier).min(self.max_tier)
    }
}

/// Purse that records every stipend paid
#[derive(Debug, Clone, Default)]
pub struct Purse {
    pub gold: u64,
    pub payments: Vec<u32>,
}

impl RewardService for Purse {
    fn pay_daily_stipend(&mut self, amount: u32) {
        self.gold += amount as u64;
        self.payments.push(amount);
    }
}

struct RegisteredTrigger {
    condition: TriggerCondition,
    command: FollowCommand,
}

/// Dialogue registry that offers whichever triggers currently apply
#[derive(Default)]
pub struct TriggerRegistry {
    triggers: Vec<RegisteredTrigger>,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// One trigger per command; a later registration wins
    fn replace(&mut self, trigger: RegisteredTrigger) {
        self.triggers.retain(|t| t.command != trigger.command);
        self.triggers.push(trigger);
    }

    /// Commands whose condition holds for this conversation
    pub fn available(&self, ctx: &TriggerContext) -> Vec<FollowCommand> {
        self.triggers
            .iter()
            .filter(|t| (t.condition)(ctx))
            .map(|t| t.command)
            .collect()
    }
}

impl DialogueService for TriggerRegistry {
    fn register_begin_following_trigger(&mut self, condition: TriggerCondition, command: FollowCommand) {
        self.replace(RegisteredTrigger { condition, command });
    }

    fn register_end_following_trigger(&mut self, condition: TriggerCondition, command: FollowCommand) {
        self.replace(RegisteredTrigger { condition, command });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_from_experience() {
        let mut ledger = ExperienceLedger::new(100, 3);
        assert_eq!(ledger.current_tier(), 0);

        ledger.award_experience(250, "battle");
        assert_eq!(ledger.current_tier(), 2);

        ledger.award_experience(1000, "campaign");
        assert_eq!(ledger.current_tier(), 3, "tier is capped");
        assert_eq!(ledger.history.len(), 2);
    }

    #[test]
    fn test_purse_records_payments() {
        let mut purse = Purse::default();
        purse.pay_daily_stipend(25);
        purse.pay_daily_stipend(30);
        assert_eq!(purse.gold, 55);
        assert_eq!(purse.payments, vec![25, 30]);
    }

    #[test]
    fn test_registry_filters_by_condition() {
        let mut registry = TriggerRegistry::new();
        registry.register_begin_following_trigger(
            Box::new(|ctx| !ctx.relationship_active),
            FollowCommand::Begin,
        );
        registry.register_end_following_trigger(
            Box::new(|ctx| ctx.relationship_active),
            FollowCommand::End,
        );

        let ctx = TriggerContext {
            speaker: HeroId(1),
            speaker_leads_active_party: true,
            relationship_active: false,
            current_leader: None,
        };
        assert_eq!(registry.available(&ctx), vec![FollowCommand::Begin]);
    }
}
