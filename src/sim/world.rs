/// WorldState: the single owned context for one running round.
///
/// ## Ownership
///
/// Everything a round mutates lives here and nowhere else:
///   - `board`     - the layout as loaded. **Never mutated** after load.
///   - `chests`    - per-box state, rebuilt from `board` on every restart.
///   - `items`     - revealed item tokens.
///   - `pending`   - revealed-but-unresolved picks (at most two).
///   - `active`    - the one chest the player may open right now.
///   - `round`     - match count, countdown, outcome.
///   - `schedule`  - deferred follow-ups (mismatch return, hazard restore).
///
/// `step::restart_round` resets all of it from `board` in one place.
///
/// ## Coordinates
///
/// World units are terminal cells; `y` grows downward. The renderer centres
/// the arena in the terminal and adds a fixed offset, nothing else.

use crate::config::{GameConfig, RoundConfig};
use crate::domain::board::{Board, Geometry};
use crate::domain::chest::{ChestId, ChestRegistry};
use crate::domain::entity::Player;
use crate::domain::item::ItemPool;
use crate::domain::physics::Aabb;
use crate::domain::proximity::ActivationPolicy;
use crate::domain::selection::PendingSelection;

use super::round::RoundState;
use super::schedule::Schedule;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
    Over,
}

pub struct WorldState {
    // ── Layout ──
    pub board: Board,
    pub geometry: Geometry,
    pub arena: Aabb,

    // ── Round data ──
    pub chests: ChestRegistry,
    pub items: ItemPool,
    pub pending: PendingSelection,
    pub active: Option<ChestId>,
    pub player: Player,
    pub round: RoundState,
    pub schedule: Schedule,

    // ── Tuning ──
    pub policy: ActivationPolicy,
    pub timing: RoundConfig,
    pub player_speed: f32,

    // ── Meta ──
    pub phase: Phase,
    pub paused: bool,

    // ── UI ──
    pub message: String,
    pub message_timer_ms: u64,
    /// Free-running clock for blink and walk animation.
    pub anim_ms: u64,
}

impl WorldState {
    pub fn new(board: Board, geometry: Geometry, config: &GameConfig) -> Self {
        let chests = ChestRegistry::initialize(&board, &geometry);
        let arena = geometry.arena(&board);
        let player = Player::new(geometry.spawn(&board));
        let round = RoundState::new(board.pairs(), config.round.countdown_secs);
        WorldState {
            board,
            geometry,
            arena,
            chests,
            items: ItemPool::new(),
            pending: PendingSelection::new(),
            active: None,
            player,
            round,
            schedule: Schedule::new(),
            policy: ActivationPolicy::new(
                config.motion.interact_distance,
                config.motion.release_distance,
            ),
            timing: config.round.clone(),
            player_speed: config.motion.player_speed,
            phase: Phase::Title,
            paused: false,
            message: String::new(),
            message_timer_ms: 0,
            anim_ms: 0,
        }
    }

    pub fn set_message(&mut self, msg: &str, duration_ms: u64) {
        self.message = msg.to_string();
        self.message_timer_ms = duration_ms;
    }

    /// Count the message timer down; clears the line when it runs out.
    pub fn age_message(&mut self, dt_ms: u64) {
        if self.message_timer_ms == 0 {
            return;
        }
        self.message_timer_ms = self.message_timer_ms.saturating_sub(dt_ms);
        if self.message_timer_ms == 0 {
            self.message.clear();
        }
    }

    /// Chest is showing a hazard that has not been restored yet.
    pub fn is_penalized(&self, chest: ChestId) -> bool {
        self.schedule.is_hazard_pending(chest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::layout;

    #[test]
    fn new_world_starts_on_title_with_full_round() {
        let board = layout::default_board(0).unwrap();
        let world = WorldState::new(board, layout::standard_geometry(), &GameConfig::default());
        assert_eq!(world.phase, Phase::Title);
        assert_eq!(world.chests.len(), 16);
        assert_eq!(world.round.pairs, 7);
        assert_eq!(world.round.time_remaining, 30);
        assert!(world.player.interactive);
        assert!(world.active.is_none());
    }

    #[test]
    fn message_expires() {
        let board = layout::default_board(0).unwrap();
        let mut world = WorldState::new(board, layout::standard_geometry(), &GameConfig::default());
        world.set_message("hi", 100);
        world.age_message(60);
        assert_eq!(world.message, "hi");
        world.age_message(60);
        assert!(world.message.is_empty());
    }
}
