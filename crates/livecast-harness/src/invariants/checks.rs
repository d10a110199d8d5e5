//! Standard invariant checks.
//!
//! These capture what must be true for every viewer sharing the slot, not
//! specific scenarios.

use livecast_core::video::embed_url_for;

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// Broadcasting implies a non-empty embed derived from the requested URL.
///
/// A viewer that shows the slot as live must be playing exactly the video
/// its URL field names.
pub struct BroadcastHasEmbed;

impl Invariant for BroadcastHasEmbed {
    fn name(&self) -> &'static str {
        "broadcast_has_embed"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for viewer in state.viewers.iter().filter(|v| v.is_broadcasting) {
            let expected = embed_url_for(&viewer.requested_url);
            if viewer.active_embed_url.is_empty() || viewer.active_embed_url != expected {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "viewer {}: broadcasting with embed {:?}, url {:?} derives {:?}",
                        viewer.id, viewer.active_embed_url, viewer.requested_url, expected
                    ),
                });
            }
        }
        Ok(())
    }
}

/// The like flag never goes from true back to false.
pub struct LikeMonotonicity;

impl Invariant for LikeMonotonicity {
    fn name(&self) -> &'static str {
        "like_monotonicity"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for viewer in &state.viewers {
            if let Some(step) = viewer.like_history.windows(2).position(|w| w[0] && !w[1]) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("viewer {}: like flag cleared at step {}", viewer.id, step + 1),
                });
            }
        }
        Ok(())
    }
}

/// At most one viewer broadcasts as owner.
///
/// Holds once viewers have settled; mid-race a rejected claim may still be
/// optimistic.
pub struct SingleOwner;

impl Invariant for SingleOwner {
    fn name(&self) -> &'static str {
        "single_owner"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let owners: Vec<_> = state
            .viewers
            .iter()
            .filter(|v| v.is_owner && v.is_broadcasting)
            .map(|v| v.id.as_str())
            .collect();
        if owners.len() > 1 {
            return Err(Violation {
                invariant: self.name(),
                message: format!("viewers {owners:?} all broadcast as owner"),
            });
        }
        Ok(())
    }
}

/// A broadcasting owner is the streamer of the live slot.
///
/// Holds once viewers have settled.
pub struct OwnerHoldsSlot;

impl Invariant for OwnerHoldsSlot {
    fn name(&self) -> &'static str {
        "owner_holds_slot"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(slot) = state.live_slot() else {
            return Ok(());
        };
        for viewer in state.viewers.iter().filter(|v| v.is_owner && v.is_broadcasting) {
            if viewer.id != slot.streamer_id {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "viewer {} broadcasts as owner but {} holds the live slot",
                        viewer.id, slot.streamer_id
                    ),
                });
            }
        }
        Ok(())
    }
}
