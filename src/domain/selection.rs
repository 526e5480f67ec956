/// Pending selection and the pair verdict.
///
/// The pending list holds revealed-but-unresolved picks in selection order.
/// It never holds more than two; the second pick is evaluated against the
/// first as soon as it lands and the list is emptied by the evaluation.

use crate::error::SelectError;

use super::chest::ChestId;
use super::item::{ItemId, ItemKind};

pub const CAPACITY: usize = 2;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Pick {
    pub chest: ChestId,
    pub item: ItemId,
    pub kind: ItemKind,
}

#[derive(Clone, Debug, Default)]
pub struct PendingSelection {
    picks: Vec<Pick>,
}

impl PendingSelection {
    pub fn new() -> Self {
        PendingSelection { picks: Vec::with_capacity(CAPACITY) }
    }

    pub fn push(&mut self, pick: Pick) -> Result<(), SelectError> {
        if self.picks.len() >= CAPACITY {
            return Err(SelectError::SelectionFull);
        }
        self.picks.push(pick);
        Ok(())
    }

    /// Remove the most recent pick.
    pub fn pop(&mut self) -> Option<Pick> {
        self.picks.pop()
    }

    /// Drain both picks once the pair is complete, first pick first.
    pub fn take_pair(&mut self) -> Option<(Pick, Pick)> {
        if self.picks.len() < CAPACITY {
            return None;
        }
        let second = self.picks.pop()?;
        let first = self.picks.pop()?;
        Some((first, second))
    }

    pub fn len(&self) -> usize { self.picks.len() }
    pub fn clear(&mut self) { self.picks.clear(); }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool { self.picks.is_empty() }

    #[cfg(test)]
    pub fn contains(&self, chest: ChestId) -> bool {
        self.picks.iter().any(|p| p.chest == chest)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Verdict {
    Match,
    Mismatch,
}

pub fn evaluate(first: &Pick, second: &Pick) -> Verdict {
    if first.kind == second.kind && !first.kind.is_hazard() {
        Verdict::Match
    } else {
        Verdict::Mismatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pick(chest: usize, kind: u8) -> Pick {
        Pick { chest: ChestId(chest), item: ItemId(chest), kind: ItemKind::Picture(kind) }
    }

    #[test]
    fn pair_drains_in_selection_order() {
        let mut p = PendingSelection::new();
        p.push(pick(4, 2)).unwrap();
        assert_eq!(p.take_pair(), None);
        p.push(pick(9, 2)).unwrap();
        let (a, b) = p.take_pair().unwrap();
        assert_eq!((a.chest, b.chest), (ChestId(4), ChestId(9)));
        assert!(p.is_empty());
    }

    #[test]
    fn third_push_rejected() {
        let mut p = PendingSelection::new();
        p.push(pick(0, 1)).unwrap();
        p.push(pick(1, 2)).unwrap();
        assert_eq!(p.push(pick(2, 3)), Err(SelectError::SelectionFull));
        assert_eq!(p.len(), 2);
        assert!(!p.contains(ChestId(2)));
    }

    #[test]
    fn verdicts() {
        assert_eq!(evaluate(&pick(0, 3), &pick(1, 3)), Verdict::Match);
        assert_eq!(evaluate(&pick(0, 3), &pick(1, 4)), Verdict::Mismatch);
        let hazard = Pick { chest: ChestId(5), item: ItemId(5), kind: ItemKind::Hazard };
        assert_eq!(evaluate(&hazard, &hazard), Verdict::Mismatch);
    }
}
