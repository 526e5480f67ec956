/// Player entity and per-frame input.

use super::physics::Point;

/// Player collision half extents (world units).
pub const PLAYER_HALF: (f32, f32) = (1.0, 0.5);

/// Movement direction (continuous while key held)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Left,
    Right,
    Up,
    Down,
}

impl MoveDir {
    /// Unit step; `y` grows downward.
    pub fn delta(self) -> (f32, f32) {
        match self {
            MoveDir::Left => (-1.0, 0.0),
            MoveDir::Right => (1.0, 0.0),
            MoveDir::Up => (0.0, -1.0),
            MoveDir::Down => (0.0, 1.0),
        }
    }
}

/// Frame input: held movement plus the confirm edge.
/// `confirm` is true exactly once per press, never while held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub movement: Option<MoveDir>,
    pub confirm: bool,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Point,
    pub facing: MoveDir,
    /// Moved during the last frame (drives the walk animation).
    pub moving: bool,
    /// False while frozen by a hazard penalty or after the round ended.
    pub interactive: bool,
}

impl Player {
    pub fn new(pos: Point) -> Self {
        Player {
            pos,
            facing: MoveDir::Down,
            moving: false,
            interactive: true,
        }
    }

    /// Stop and refuse input.
    pub fn freeze(&mut self) {
        self.interactive = false;
        self.moving = false;
    }
}
