/// Continuous-space collision for the player against chest bodies.
///
/// Coordinates are world units (one unit renders as one terminal cell).
/// `y` grows downward. Bodies are axis-aligned boxes given by centre and
/// half extents.
///
/// Movement is resolved along the single axis the player is moving on:
///   - the target is clamped into the arena
///   - every chest body crossed by the swept path stops the player at
///     flush contact; the nearest such body is reported as the contact
///
/// A flush edge does not count as overlap, so the player can slide along
/// a chest after bumping into it.

use super::chest::ChestId;
use super::entity::MoveDir;

/// Tolerance for flush contact after a snap.
const EPS: f32 = 1e-4;

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Aabb {
    pub center: Point,
    pub half_w: f32,
    pub half_h: f32,
}

impl Aabb {
    pub const fn new(center: Point, half_w: f32, half_h: f32) -> Self {
        Aabb { center, half_w, half_h }
    }

    pub fn min_x(&self) -> f32 { self.center.x - self.half_w }
    pub fn max_x(&self) -> f32 { self.center.x + self.half_w }
    pub fn min_y(&self) -> f32 { self.center.y - self.half_h }
    pub fn max_y(&self) -> f32 { self.center.y + self.half_h }

    /// Strict overlap; touching edges do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min_x() < other.max_x() - EPS
            && self.max_x() > other.min_x() + EPS
            && self.min_y() < other.max_y() - EPS
            && self.max_y() > other.min_y() + EPS
    }

    /// Overlap or flush contact; shared edges and corners count.
    pub fn touches(&self, other: &Aabb) -> bool {
        self.min_x() <= other.max_x() + EPS
            && self.max_x() >= other.min_x() - EPS
            && self.min_y() <= other.max_y() + EPS
            && self.max_y() >= other.min_y() - EPS
    }

    /// Clamp a centre point so a body of the given half extents stays inside.
    pub fn clamp_inside(&self, p: Point, half_w: f32, half_h: f32) -> Point {
        let lo_x = self.min_x() + half_w;
        let hi_x = (self.max_x() - half_w).max(lo_x);
        let lo_y = self.min_y() + half_h;
        let hi_y = (self.max_y() - half_h).max(lo_y);
        Point::new(p.x.clamp(lo_x, hi_x), p.y.clamp(lo_y, hi_y))
    }
}

/// Result of one movement step.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Motion {
    pub pos: Point,
    /// Chest the player pushed against this step.
    pub contact: Option<ChestId>,
}

/// Move a body of `half` extents from `pos` by `distance` along `dir`.
pub fn move_body<I>(
    pos: Point,
    half: (f32, f32),
    dir: Option<MoveDir>,
    distance: f32,
    arena: &Aabb,
    bodies: I,
) -> Motion
where
    I: IntoIterator<Item = (ChestId, Aabb)>,
{
    let dir = match dir {
        Some(d) if distance > 0.0 => d,
        _ => return Motion { pos, contact: None },
    };
    let (hw, hh) = half;
    let (dx, dy) = dir.delta();
    let target = arena.clamp_inside(
        Point::new(pos.x + dx * distance, pos.y + dy * distance),
        hw,
        hh,
    );

    // Sweep the whole path so a long step cannot tunnel through a chest.
    let swept = Aabb::new(
        Point::new((pos.x + target.x) / 2.0, (pos.y + target.y) / 2.0),
        (target.x - pos.x).abs() / 2.0 + hw,
        (target.y - pos.y).abs() / 2.0 + hh,
    );

    let mut resolved = target;
    let mut contact = None;
    for (id, body) in bodies {
        if !swept.overlaps(&body) {
            continue;
        }
        // Flush-contact stop along the axis of motion, never behind the start.
        match dir {
            MoveDir::Right => {
                let stop = (body.min_x() - hw).max(pos.x);
                if stop <= resolved.x { resolved.x = stop; contact = Some(id); }
            }
            MoveDir::Left => {
                let stop = (body.max_x() + hw).min(pos.x);
                if stop >= resolved.x { resolved.x = stop; contact = Some(id); }
            }
            MoveDir::Down => {
                let stop = (body.min_y() - hh).max(pos.y);
                if stop <= resolved.y { resolved.y = stop; contact = Some(id); }
            }
            MoveDir::Up => {
                let stop = (body.max_y() + hh).min(pos.y);
                if stop >= resolved.y { resolved.y = stop; contact = Some(id); }
            }
        }
    }

    Motion { pos: resolved, contact }
}
