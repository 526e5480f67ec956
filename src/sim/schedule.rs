/// Deferred follow-up actions.
///
/// Each entry closes over the picks it will restore and counts down in
/// milliseconds of frame time. Entries that reach zero during `advance` are
/// returned in scheduling order; the caller applies them.

use crate::domain::chest::ChestId;
use crate::domain::selection::Pick;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FollowUp {
    /// Mismatch settled: re-cover both chests and return both items.
    ReturnPair { first: Pick, second: Pick },
    /// Hazard penalty over: re-cover the chest and unfreeze the player.
    RestoreHazard { pick: Pick },
}

impl FollowUp {
    pub fn involves(&self, chest: ChestId) -> bool {
        match self {
            FollowUp::ReturnPair { first, second } => first.chest == chest || second.chest == chest,
            FollowUp::RestoreHazard { pick } => pick.chest == chest,
        }
    }
}

#[derive(Clone, Debug)]
struct Deferred {
    remaining_ms: u64,
    action: FollowUp,
}

#[derive(Clone, Debug, Default)]
pub struct Schedule {
    queue: Vec<Deferred>,
}

impl Schedule {
    pub fn new() -> Self {
        Schedule { queue: Vec::new() }
    }

    pub fn push(&mut self, delay_ms: u64, action: FollowUp) {
        self.queue.push(Deferred { remaining_ms: delay_ms, action });
    }

    /// Advance all timers by `dt_ms`; drain and return the due actions.
    pub fn advance(&mut self, dt_ms: u64) -> Vec<FollowUp> {
        let mut due = Vec::new();
        self.queue.retain_mut(|d| {
            d.remaining_ms = d.remaining_ms.saturating_sub(dt_ms);
            if d.remaining_ms == 0 {
                due.push(d.action);
                false
            } else {
                true
            }
        });
        due
    }

    pub fn involves(&self, chest: ChestId) -> bool {
        self.queue.iter().any(|d| d.action.involves(chest))
    }

    pub fn is_hazard_pending(&self, chest: ChestId) -> bool {
        self.queue.iter().any(|d| {
            matches!(d.action, FollowUp::RestoreHazard { pick } if pick.chest == chest)
        })
    }

    pub fn clear(&mut self) { self.queue.clear(); }

    #[cfg(test)]
    pub fn len(&self) -> usize { self.queue.len() }
    #[cfg(test)]
    pub fn is_empty(&self) -> bool { self.queue.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::{ItemId, ItemKind};

    fn pick(chest: usize) -> Pick {
        Pick { chest: ChestId(chest), item: ItemId(chest), kind: ItemKind::Picture(1) }
    }

    #[test]
    fn fires_once_when_delay_elapses() {
        let mut s = Schedule::new();
        s.push(1000, FollowUp::RestoreHazard { pick: pick(3) });
        assert!(s.advance(600).is_empty());
        assert!(s.is_hazard_pending(ChestId(3)));
        assert_eq!(s.advance(400), vec![FollowUp::RestoreHazard { pick: pick(3) }]);
        assert!(s.is_empty());
        assert!(s.advance(1000).is_empty());
    }

    #[test]
    fn due_actions_keep_scheduling_order() {
        let mut s = Schedule::new();
        let a = FollowUp::ReturnPair { first: pick(0), second: pick(1) };
        let b = FollowUp::RestoreHazard { pick: pick(2) };
        s.push(500, a);
        s.push(200, b);
        assert_eq!(s.advance(1000), vec![a, b]);
    }

    #[test]
    fn involves_both_chests_of_a_pair() {
        let mut s = Schedule::new();
        s.push(10, FollowUp::ReturnPair { first: pick(4), second: pick(7) });
        assert!(s.involves(ChestId(4)) && s.involves(ChestId(7)));
        assert!(!s.involves(ChestId(5)));
        assert!(!s.is_hazard_pending(ChestId(4)));
    }

    #[test]
    fn zero_delay_fires_on_next_advance() {
        let mut s = Schedule::new();
        s.push(0, FollowUp::RestoreHazard { pick: pick(1) });
        assert_eq!(s.len(), 1);
        assert_eq!(s.advance(0).len(), 1);
    }
}
