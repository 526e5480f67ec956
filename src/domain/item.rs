/// Item kinds and the pool of revealed item tokens.
///
/// A kind is a plain tag. Mapping kinds to glyphs, colors or sound is the
/// presentation layer's job; nothing in the core branches on picture ids.

use super::chest::ChestId;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ItemKind {
    /// Freezes the player for the penalty delay; never pairs.
    Hazard,
    /// A pairable picture, identified by its board integer.
    Picture(u8),
}

impl ItemKind {
    pub fn from_id(id: u8, hazard_id: u8) -> Self {
        if id == hazard_id {
            ItemKind::Hazard
        } else {
            ItemKind::Picture(id)
        }
    }

    pub fn is_hazard(self) -> bool {
        matches!(self, ItemKind::Hazard)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ItemId(pub usize);

/// A token revealed from a chest.
#[derive(Clone, Debug)]
pub struct Item {
    pub kind: ItemKind,
    /// Back-reference only; the registry owns the chest.
    pub chest: ChestId,
    /// Set when the item was part of a match. Resolved items stay visible.
    pub resolved: bool,
    /// False once the item went back to the pool.
    pub active: bool,
}

/// Slot pool: discarded items free their slot for the next reveal.
#[derive(Clone, Debug, Default)]
pub struct ItemPool {
    slots: Vec<Item>,
}

impl ItemPool {
    pub fn new() -> Self {
        ItemPool { slots: Vec::with_capacity(8) }
    }

    pub fn spawn(&mut self, kind: ItemKind, chest: ChestId) -> ItemId {
        let item = Item { kind, chest, resolved: false, active: true };
        if let Some(idx) = self.slots.iter().position(|s| !s.active) {
            self.slots[idx] = item;
            ItemId(idx)
        } else {
            self.slots.push(item);
            ItemId(self.slots.len() - 1)
        }
    }

    #[cfg(test)]
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.slots.get(id.0).filter(|s| s.active)
    }

    /// Retire permanently as part of a match.
    pub fn resolve(&mut self, id: ItemId) {
        if let Some(item) = self.slots.get_mut(id.0) {
            item.resolved = true;
        }
    }

    /// Return to the pool (mismatch or hazard restore).
    pub fn discard(&mut self, id: ItemId) {
        if let Some(item) = self.slots.get_mut(id.0) {
            if !item.resolved {
                item.active = false;
            }
        }
    }

    /// The visible item sitting on `chest`, if any.
    pub fn on_chest(&self, chest: ChestId) -> Option<&Item> {
        self.active().find(|i| i.chest == chest)
    }

    pub fn active(&self) -> impl Iterator<Item = &Item> {
        self.slots.iter().filter(|s| s.active)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hazard_id_maps_to_hazard() {
        assert_eq!(ItemKind::from_id(0, 0), ItemKind::Hazard);
        assert_eq!(ItemKind::from_id(3, 0), ItemKind::Picture(3));
        assert_eq!(ItemKind::from_id(0, 9), ItemKind::Picture(0));
    }

    #[test]
    fn discarded_slot_is_reused() {
        let mut pool = ItemPool::new();
        let a = pool.spawn(ItemKind::Picture(1), ChestId(0));
        let b = pool.spawn(ItemKind::Picture(2), ChestId(1));
        pool.discard(a);
        assert!(pool.get(a).is_none());
        let c = pool.spawn(ItemKind::Picture(5), ChestId(4));
        assert_eq!(c, a);
        assert_eq!(pool.get(c).map(|i| i.chest), Some(ChestId(4)));
        assert_eq!(pool.active().count(), 2);
        assert!(pool.get(b).is_some());
    }

    #[test]
    fn resolved_items_survive_discard() {
        let mut pool = ItemPool::new();
        let a = pool.spawn(ItemKind::Picture(1), ChestId(0));
        pool.resolve(a);
        pool.discard(a);
        let item = pool.get(a).expect("resolved item stays active");
        assert!(item.resolved);
        assert_eq!(pool.on_chest(ChestId(0)).map(|i| i.kind), Some(ItemKind::Picture(1)));
    }
}
