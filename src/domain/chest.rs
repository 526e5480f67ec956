/// Chests: the covered boxes on the grid, and the registry that owns them.
///
/// ## Lifecycle
///
/// ┌───────────┬─────────────────────┬─────────────────────────────┐
/// │ Operation │ Precondition        │ Effect                      │
/// ├───────────┼─────────────────────┼─────────────────────────────┤
/// │ open      │ !opened && !matched │ opened = true, returns kind │
/// │ open      │ opened or matched   │ Err(AlreadyOpened)          │
/// │ close     │ !matched            │ opened = false              │
/// │ close     │ matched             │ no-op                       │
/// │ lock      │ any                 │ matched = true (idempotent) │
/// └───────────┴─────────────────────┴─────────────────────────────┘
///
/// A locked chest stays `opened` so every "is it selectable" check can
/// look at `opened` alone while still treating `matched` as final.

use std::fmt;

use crate::error::SelectError;

use super::board::{Board, Geometry};
use super::item::ItemKind;
use super::physics::{Aabb, Point};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct ChestId(pub usize);

impl fmt::Display for ChestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Chest {
    pub id: ChestId,
    pub row: usize,
    pub col: usize,
    pub body: Aabb,
    pub kind: ItemKind,
    pub opened: bool,
    pub matched: bool,
}

impl Chest {
    pub fn pos(&self) -> Point {
        self.body.center
    }

    /// Can this chest be opened right now?
    pub fn is_selectable(&self) -> bool {
        !self.opened && !self.matched
    }
}

#[derive(Clone, Debug, Default)]
pub struct ChestRegistry {
    chests: Vec<Chest>,
}

impl ChestRegistry {
    /// One chest per board cell, ids in row-major order.
    pub fn initialize(board: &Board, geometry: &Geometry) -> Self {
        let chests = board
            .cells()
            .enumerate()
            .map(|(i, (row, col, kind))| Chest {
                id: ChestId(i),
                row,
                col,
                body: geometry.chest_body(row, col),
                kind,
                opened: false,
                matched: false,
            })
            .collect();
        ChestRegistry { chests }
    }

    pub fn get(&self, id: ChestId) -> Option<&Chest> {
        self.chests.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chest> {
        self.chests.iter()
    }

    pub fn len(&self) -> usize {
        self.chests.len()
    }

    pub fn selectable(&self, id: ChestId) -> bool {
        self.get(id).is_some_and(Chest::is_selectable)
    }

    /// Collision bodies for the physics step.
    pub fn bodies(&self) -> impl Iterator<Item = (ChestId, Aabb)> + '_ {
        self.chests.iter().map(|c| (c.id, c.body))
    }

    pub fn open(&mut self, id: ChestId) -> Result<ItemKind, SelectError> {
        let chest = self.chests.get_mut(id.0).ok_or(SelectError::UnknownChest(id))?;
        if !chest.is_selectable() {
            return Err(SelectError::AlreadyOpened(id));
        }
        chest.opened = true;
        Ok(chest.kind)
    }

    /// Re-cover a chest. Matched chests are final and ignore this.
    pub fn close(&mut self, id: ChestId) {
        if let Some(chest) = self.chests.get_mut(id.0) {
            if !chest.matched {
                chest.opened = false;
            }
        }
    }

    pub fn lock(&mut self, id: ChestId) {
        if let Some(chest) = self.chests.get_mut(id.0) {
            chest.matched = true;
        }
    }

    #[cfg(test)]
    pub fn matched_count(&self) -> usize {
        self.chests.iter().filter(|c| c.matched).count()
    }
}
