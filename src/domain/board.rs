/// Board layout: an immutable rows × cols table of item kinds, plus the
/// geometry that places each cell in world space.
///
/// Construction validates the pairing invariant: apart from the hazard id,
/// every item id appears an even number of times. That makes the win target
/// `pairs = (cells - hazards) / 2` a property of the board.

use std::collections::BTreeMap;

use crate::error::BoardError;

use super::item::ItemKind;
use super::physics::{Aabb, Point};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<ItemKind>,
}

impl Board {
    /// Build from a table of item integers. `hazard_id` is the reserved id.
    pub fn from_rows(table: &[Vec<u8>], hazard_id: u8) -> Result<Self, BoardError> {
        let rows = table.len();
        let cols = table.first().map_or(0, |r| r.len());
        if rows == 0 || cols == 0 {
            return Err(BoardError::Empty);
        }

        let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
        let mut cells = Vec::with_capacity(rows * cols);
        for (r, row) in table.iter().enumerate() {
            if row.len() != cols {
                return Err(BoardError::Ragged { row: r, expected: cols, found: row.len() });
            }
            for &id in row {
                let kind = ItemKind::from_id(id, hazard_id);
                if !kind.is_hazard() {
                    *counts.entry(id).or_default() += 1;
                }
                cells.push(kind);
            }
        }

        if let Some((&item, &count)) = counts.iter().find(|&(_, &c)| c % 2 != 0) {
            return Err(BoardError::Unpaired { item, count });
        }
        if counts.is_empty() {
            return Err(BoardError::NoPairs);
        }

        Ok(Board { rows, cols, cells })
    }

    pub fn rows(&self) -> usize { self.rows }
    pub fn cols(&self) -> usize { self.cols }
    pub fn len(&self) -> usize { self.cells.len() }

    #[cfg(test)]
    pub fn item_at(&self, row: usize, col: usize) -> Option<ItemKind> {
        if row < self.rows && col < self.cols {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    /// Cells in row-major order with their grid position.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, ItemKind)> + '_ {
        let cols = self.cols;
        self.cells.iter().enumerate().map(move |(i, &k)| (i / cols, i % cols, k))
    }

    pub fn hazard_count(&self) -> usize {
        self.cells.iter().filter(|k| k.is_hazard()).count()
    }

    /// Matches needed to win.
    pub fn pairs(&self) -> u32 {
        ((self.len() - self.hazard_count()) / 2) as u32
    }
}

/// Where grid cells sit in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    /// Centre of cell (0, 0).
    pub origin: Point,
    pub pitch_x: f32,
    pub pitch_y: f32,
    pub chest_half_w: f32,
    pub chest_half_h: f32,
}

impl Geometry {
    pub fn cell_center(&self, row: usize, col: usize) -> Point {
        Point::new(
            self.origin.x + col as f32 * self.pitch_x,
            self.origin.y + row as f32 * self.pitch_y,
        )
    }

    pub fn chest_body(&self, row: usize, col: usize) -> Aabb {
        Aabb::new(self.cell_center(row, col), self.chest_half_w, self.chest_half_h)
    }

    /// Walkable area: half a pitch of margin around the outer cell centres.
    pub fn arena(&self, board: &Board) -> Aabb {
        let w = board.cols() as f32 * self.pitch_x;
        let h = board.rows() as f32 * self.pitch_y;
        let min = Point::new(
            self.origin.x - self.pitch_x / 2.0,
            self.origin.y - self.pitch_y / 2.0,
        );
        Aabb::new(Point::new(min.x + w / 2.0, min.y + h / 2.0), w / 2.0, h / 2.0)
    }

    /// Player start: horizontally centred, in the corridor above the
    /// middle row (below the only row on one-row boards).
    pub fn spawn(&self, board: &Board) -> Point {
        let arena = self.arena(board);
        let corridor = (board.rows() / 2).max(1) as f32 - 0.5;
        Point::new(arena.center.x, self.origin.y + corridor * self.pitch_y)
    }
}
