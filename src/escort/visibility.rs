//! Visibility illusion for the follower
//!
//! Hides the follower's map presence and keeps the camera on the leader.
//! The host does not know about the relationship and may silently flip the
//! visibility flag back, so [`VisibilityIllusionController::maintain`] runs
//! every tick as a reconciliation step: compare desired with observed and
//! correct the drift.

use crate::core::error::{EscortError, Result};
use crate::core::types::PartyId;
use crate::host::HostSimulation;

/// One way of hiding and showing a party
pub trait VisualHider {
    fn name(&self) -> &'static str;
    fn hide(&self, host: &mut dyn HostSimulation, party: PartyId) -> Result<()>;
    fn show(&self, host: &mut dyn HostSimulation, party: PartyId, visible: bool) -> Result<()>;
}

/// Map-visibility flag only
#[derive(Debug, Clone, Copy, Default)]
pub struct CoarseFlagHider;

impl VisualHider for CoarseFlagHider {
    fn name(&self) -> &'static str {
        "coarse"
    }

    fn hide(&self, host: &mut dyn HostSimulation, party: PartyId) -> Result<()> {
        host.set_visible_on_map(party, false)
    }

    fn show(&self, host: &mut dyn HostSimulation, party: PartyId, visible: bool) -> Result<()> {
        host.set_visible_on_map(party, visible)
    }
}

/// Map-visibility flag plus the host's rendered visual layer
#[derive(Debug, Clone, Copy, Default)]
pub struct FineGrainedHider;

impl VisualHider for FineGrainedHider {
    fn name(&self) -> &'static str {
        "fine-grained"
    }

    fn hide(&self, host: &mut dyn HostSimulation, party: PartyId) -> Result<()> {
        host.set_visible_on_map(party, false)?;
        host.set_visual_rendered(party, false)
    }

    fn show(&self, host: &mut dyn HostSimulation, party: PartyId, visible: bool) -> Result<()> {
        host.set_visible_on_map(party, visible)?;
        host.set_visual_rendered(party, visible)
    }
}

/// Hides the follower and re-asserts the illusion every tick
pub struct VisibilityIllusionController {
    hider: Box<dyn VisualHider>,
    /// Mirror of the persisted prior visibility
    original_visibility: bool,
}

impl std::fmt::Debug for VisibilityIllusionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityIllusionController")
            .field("hider", &self.hider.name())
            .field("original_visibility", &self.original_visibility)
            .finish()
    }
}

impl VisibilityIllusionController {
    /// Pick a hider by probing the host's capabilities once
    pub fn probe(supports_visual_layer: bool) -> Self {
        let hider: Box<dyn VisualHider> = if supports_visual_layer {
            Box::new(FineGrainedHider)
        } else {
            Box::new(CoarseFlagHider)
        };
        tracing::debug!(hider = hider.name(), "visibility hider selected");
        Self::with_hider(hider)
    }

    pub fn with_hider(hider: Box<dyn VisualHider>) -> Self {
        Self {
            hider,
            original_visibility: true,
        }
    }

    pub fn hider_name(&self) -> &'static str {
        self.hider.name()
    }

    pub fn original_visibility(&self) -> bool {
        self.original_visibility
    }

    /// Resynchronize the mirror from the persisted prior visibility
    pub fn sync_original_visibility(&mut self, visible: bool) {
        self.original_visibility = visible;
    }

    /// Hide the follower from the map
    pub fn hide(&mut self, host: &mut dyn HostSimulation, follower: PartyId) -> Result<()> {
        match self.hider.hide(host, follower) {
            Err(EscortError::VisualLayerUnavailable(reason)) => {
                self.fall_back(&reason);
                self.hider.hide(host, follower)
            }
            other => other,
        }
    }

    /// Show the follower again with the visibility it had before
    pub fn restore(
        &mut self,
        host: &mut dyn HostSimulation,
        follower: PartyId,
        prior_visibility: bool,
    ) -> Result<()> {
        self.original_visibility = prior_visibility;
        match self.hider.show(host, follower, prior_visibility) {
            Err(EscortError::VisualLayerUnavailable(reason)) => {
                self.fall_back(&reason);
                self.hider.show(host, follower, prior_visibility)
            }
            other => other,
        }
    }

    /// Correct any drift the host introduced since the last tick
    ///
    /// Returns true when something had to be re-asserted.
    pub fn maintain(
        &mut self,
        host: &mut dyn HostSimulation,
        follower: PartyId,
        leader_party: PartyId,
    ) -> Result<bool> {
        let mut corrected = false;

        if host.is_visible_on_map(follower) {
            tracing::debug!(?follower, "visibility drifted, re-hiding");
            self.hide(host, follower)?;
            host.set_camera_focus(leader_party)?;
            corrected = true;
        } else if host.camera_focus() != Some(leader_party) {
            host.set_camera_focus(leader_party)?;
            corrected = true;
        }

        Ok(corrected)
    }

    fn fall_back(&mut self, reason: &str) {
        tracing::warn!(
            reason,
            from = self.hider.name(),
            "visual layer unavailable, falling back to map flag"
        );
        self.hider = Box::new(CoarseFlagHider);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::world::CampaignWorld;
    use crate::core::types::Vec2;
    use crate::host::HostView;

    fn world_with_party(visual_layer: bool) -> (CampaignWorld, PartyId, PartyId) {
        let mut world = CampaignWorld::new();
        world.set_visual_layer_support(visual_layer);
        let kingdom = world.add_faction("Vlandia", false);
        let player = world.spawn_party("Player", kingdom, Vec2::new(0.0, 0.0));
        let lord = world.spawn_party("Lord", kingdom, Vec2::new(3.0, 3.0));
        (world, player, lord)
    }

    #[test]
    fn test_hide_is_idempotent() {
        let (mut world, player, _) = world_with_party(false);
        let mut controller = VisibilityIllusionController::probe(world.supports_visual_layer());

        controller.hide(&mut world, player).unwrap();
        let once = world.is_visible_on_map(player);
        controller.hide(&mut world, player).unwrap();
        assert_eq!(world.is_visible_on_map(player), once);
        assert!(!once);
    }

    #[test]
    fn test_restore_is_idempotent() {
        let (mut world, player, _) = world_with_party(true);
        let mut controller = VisibilityIllusionController::probe(true);

        controller.hide(&mut world, player).unwrap();
        controller.restore(&mut world, player, true).unwrap();
        controller.restore(&mut world, player, true).unwrap();

        assert!(world.is_visible_on_map(player));
        assert_eq!(world.is_rendered(player), Some(true));
    }

    #[test]
    fn test_fine_grained_hides_render_layer() {
        let (mut world, player, _) = world_with_party(true);
        let mut controller = VisibilityIllusionController::probe(true);
        assert_eq!(controller.hider_name(), "fine-grained");

        controller.hide(&mut world, player).unwrap();
        assert_eq!(world.is_rendered(player), Some(false));
    }

    #[test]
    fn test_falls_back_when_visual_layer_missing() {
        let (mut world, player, _) = world_with_party(false);
        // Claim support the host does not have
        let mut controller = VisibilityIllusionController::with_hider(Box::new(FineGrainedHider));

        controller.hide(&mut world, player).unwrap();

        assert!(!world.is_visible_on_map(player));
        assert_eq!(controller.hider_name(), "coarse");
    }

    #[test]
    fn test_maintain_corrects_drift() {
        let (mut world, player, lord) = world_with_party(false);
        let mut controller = VisibilityIllusionController::probe(false);

        controller.hide(&mut world, player).unwrap();
        world.set_camera_focus(lord).unwrap();
        assert!(!controller.maintain(&mut world, player, lord).unwrap());

        // Host resets the flag on its own
        world.set_visible_on_map(player, true).unwrap();
        world.set_camera_focus(player).unwrap();

        assert!(controller.maintain(&mut world, player, lord).unwrap());
        assert!(!world.is_visible_on_map(player));
        assert_eq!(world.camera_focus(), Some(lord));
    }
}
