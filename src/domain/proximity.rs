/// Activation policy: which single chest the player may open.
///
/// Pure functions over positions, no side effects.
///
/// ### Claim (no chest active)
/// ┌─────────────────────────────────────┬───────────┐
/// │ Condition                           │ Candidate │
/// ├─────────────────────────────────────┼───────────┤
/// │ chest opened or matched             │ NO        │
/// │ player touched it this frame        │ YES       │
/// │ centre distance <= interact radius  │ YES       │
/// │ otherwise                           │ NO        │
/// └─────────────────────────────────────┴───────────┘
/// Nearest candidate wins; ties go to the lower id.
///
/// ### Hold / release (a chest is active)
/// ┌─────────────────────────────────────┬───────────┐
/// │ chest opened or matched             │ RELEASE   │
/// │ player body flush against the chest │ KEEP      │
/// │ centre distance >= release radius   │ RELEASE   │
/// │ otherwise                           │ KEEP      │
/// └─────────────────────────────────────┴───────────┘
/// While one chest is active no other chest is considered, even a closer one.

use super::chest::{Chest, ChestId, ChestRegistry};
use super::entity::PLAYER_HALF;
use super::physics::{Aabb, Point};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Activation {
    Idle,
    Kept(ChestId),
    Claimed(ChestId),
    Released(ChestId),
}

impl Activation {
    /// The active chest after applying this decision.
    pub fn active(self) -> Option<ChestId> {
        match self {
            Activation::Kept(id) | Activation::Claimed(id) => Some(id),
            Activation::Idle | Activation::Released(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActivationPolicy {
    interact_distance: f32,
    release_distance: f32,
}

impl ActivationPolicy {
    /// `release` below `interact` would let a claim drop on the next frame,
    /// so it is raised to `interact`.
    pub fn new(interact: f32, release: f32) -> Self {
        ActivationPolicy {
            interact_distance: interact,
            release_distance: release.max(interact),
        }
    }

    pub fn is_candidate(&self, chest: &Chest, player: Point, contact: Option<ChestId>) -> bool {
        chest.is_selectable()
            && (contact == Some(chest.id) || chest.pos().distance(player) <= self.interact_distance)
    }

    fn holds(&self, chest: &Chest, player: Point) -> bool {
        chest.pos().distance(player) < self.release_distance
    }

    pub fn update(
        &self,
        active: Option<ChestId>,
        player: Point,
        contact: Option<ChestId>,
        chests: &ChestRegistry,
    ) -> Activation {
        if let Some(id) = active {
            let body = Aabb::new(player, PLAYER_HALF.0, PLAYER_HALF.1);
            return match chests.get(id) {
                Some(c) if c.is_selectable() && (c.body.touches(&body) || self.holds(c, player)) =>
                {
                    Activation::Kept(id)
                }
                _ => Activation::Released(id),
            };
        }

        chests
            .iter()
            .filter(|c| self.is_candidate(c, player, contact))
            .map(|c| (c.id, c.pos().distance(player)))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map_or(Activation::Idle, |(id, _)| Activation::Claimed(id))
    }
}
