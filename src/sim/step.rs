/// Controller hooks: the host loop calls into these, nothing calls back.
///
///   - `on_frame`   - every render frame, with the elapsed milliseconds
///   - `on_tick`    - once per countdown interval
///   - `on_confirm` - the confirm edge (also reached through `on_frame`)
///
/// Frame processing order:
///   1. Deferred follow-ups (mismatch return, hazard restore)
///   2. Player movement against chest bodies
///   3. Activation (claim / keep / release)
///   4. Confirm
///
/// Follow-ups keep running after the round is over so revealed boxes still
/// settle, but only `restart_round` can make the player interactive again
/// once an outcome is set.

use crate::domain::chest::{ChestId, ChestRegistry};
use crate::domain::entity::{FrameInput, MoveDir, Player, PLAYER_HALF};
use crate::domain::physics;
use crate::domain::proximity::Activation;
use crate::domain::selection::{self, Pick, Verdict, CAPACITY};
use crate::error::SelectError;

use super::event::GameEvent;
use super::round::{Outcome, RoundState, TickResult};
use super::schedule::FollowUp;
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Hooks
// ══════════════════════════════════════════════════════════════

pub fn on_frame(world: &mut WorldState, input: FrameInput, dt_ms: u64) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if world.phase == Phase::Title || world.paused {
        return events;
    }

    world.anim_ms = world.anim_ms.wrapping_add(dt_ms);
    world.age_message(dt_ms);

    for action in world.schedule.advance(dt_ms) {
        apply_follow_up(world, action, &mut events);
    }

    if world.phase != Phase::Playing || !world.player.interactive {
        world.player.moving = false;
        return events;
    }

    let contact = resolve_player_movement(world, input.movement, dt_ms);
    resolve_activation(world, contact, &mut events);

    if input.confirm {
        events.extend(on_confirm(world));
    }
    events
}

/// One countdown second.
pub fn on_tick(world: &mut WorldState) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if world.phase != Phase::Playing || world.paused {
        return events;
    }
    match world.round.tick() {
        TickResult::Stopped => {}
        TickResult::Counted(remaining) => events.push(GameEvent::TimeChanged { remaining }),
        TickResult::Expired => {
            events.push(GameEvent::TimeChanged { remaining: 0 });
            finish_round(world, Outcome::Lost, &mut events);
        }
    }
    events
}

/// Open the active chest. Illegal confirms are logged and dropped.
pub fn on_confirm(world: &mut WorldState) -> Vec<GameEvent> {
    let Some(id) = world.active else {
        return Vec::new();
    };
    match select(world, id) {
        Ok(events) => events,
        Err(e) => {
            log::debug!("confirm on chest {id} ignored: {e}");
            Vec::new()
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Selection and resolution
// ══════════════════════════════════════════════════════════════

/// Reveal chest `id` and resolve whatever that completes.
///
/// All guards run before any mutation, so a rejected call leaves the world
/// untouched.
pub fn select(world: &mut WorldState, id: ChestId) -> Result<Vec<GameEvent>, SelectError> {
    if world.phase != Phase::Playing || world.round.is_over() || !world.player.interactive {
        return Err(SelectError::InvalidSelection);
    }
    if world.chests.get(id).is_none() {
        return Err(SelectError::UnknownChest(id));
    }
    if !world.chests.selectable(id) {
        return Err(SelectError::AlreadyOpened(id));
    }
    if world.pending.len() >= CAPACITY {
        return Err(SelectError::SelectionFull);
    }

    let kind = world.chests.open(id)?;
    if world.active == Some(id) {
        world.active = None;
    }
    let item = world.items.spawn(kind, id);
    let pick = Pick { chest: id, item, kind };
    world.pending.push(pick)?;
    log::debug!("chest {id} opened: {kind:?}");

    let mut events = vec![GameEvent::ItemRevealed { chest: id, kind }];
    if kind.is_hazard() {
        trigger_hazard(world, &mut events);
    } else if let Some((first, second)) = world.pending.take_pair() {
        resolve_pair(world, first, second, &mut events);
    }
    Ok(events)
}

fn resolve_pair(world: &mut WorldState, first: Pick, second: Pick, events: &mut Vec<GameEvent>) {
    match selection::evaluate(&first, &second) {
        Verdict::Match => {
            for pick in [first, second] {
                world.chests.lock(pick.chest);
                world.items.resolve(pick.item);
            }
            events.push(GameEvent::PairMatched { first: first.chest, second: second.chest });
            let target_reached = world.round.record_match();
            log::debug!(
                "match {} + {} ({}/{})",
                first.chest, second.chest, world.round.match_count, world.round.pairs,
            );
            if target_reached {
                finish_round(world, Outcome::Won, events);
            }
        }
        Verdict::Mismatch => {
            log::debug!("mismatch {} + {}", first.chest, second.chest);
            world.schedule.push(world.timing.settle_ms, FollowUp::ReturnPair { first, second });
            events.push(GameEvent::PairMismatched { first: first.chest, second: second.chest });
        }
    }
}

/// The hazard never pairs: take it straight back off the pending list and
/// freeze the player until the restore fires.
fn trigger_hazard(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let Some(pick) = world.pending.pop() else {
        return;
    };
    world.player.freeze();
    world.active = None;
    world.schedule.push(world.timing.penalty_ms, FollowUp::RestoreHazard { pick });
    log::debug!("hazard at chest {}, frozen for {} ms", pick.chest, world.timing.penalty_ms);
    events.push(GameEvent::HazardTriggered { chest: pick.chest });
}

fn apply_follow_up(world: &mut WorldState, action: FollowUp, events: &mut Vec<GameEvent>) {
    match action {
        FollowUp::ReturnPair { first, second } => {
            for pick in [first, second] {
                world.chests.close(pick.chest);
                world.items.discard(pick.item);
            }
            events.push(GameEvent::PairReturned { first: first.chest, second: second.chest });
        }
        FollowUp::RestoreHazard { pick } => {
            world.chests.close(pick.chest);
            world.items.discard(pick.item);
            if world.phase == Phase::Playing && !world.round.is_over() {
                world.player.interactive = true;
            }
            events.push(GameEvent::HazardCleared { chest: pick.chest });
        }
    }
}

/// Single writer for the terminal outcome. A second caller is a no-op.
fn finish_round(world: &mut WorldState, outcome: Outcome, events: &mut Vec<GameEvent>) {
    if !world.round.conclude(outcome) {
        return;
    }
    world.player.freeze();
    world.active = None;
    world.phase = Phase::Over;
    log::info!(
        "round over: {:?} with {}/{} pairs, {}s left",
        outcome, world.round.match_count, world.round.pairs, world.round.time_remaining,
    );
    events.push(match outcome {
        Outcome::Won => GameEvent::RoundWon,
        _ => GameEvent::RoundLost,
    });
}

// ══════════════════════════════════════════════════════════════
// Movement and activation
// ══════════════════════════════════════════════════════════════

/// Returns the chest pushed against this frame, if any.
fn resolve_player_movement(
    world: &mut WorldState,
    movement: Option<MoveDir>,
    dt_ms: u64,
) -> Option<ChestId> {
    let distance = world.player_speed * dt_ms as f32 / 1000.0;
    let motion = physics::move_body(
        world.player.pos,
        PLAYER_HALF,
        movement,
        distance,
        &world.arena,
        world.chests.bodies(),
    );
    if let Some(dir) = movement {
        world.player.facing = dir;
    }
    world.player.moving = motion.pos != world.player.pos;
    world.player.pos = motion.pos;
    motion.contact
}

fn resolve_activation(
    world: &mut WorldState,
    contact: Option<ChestId>,
    events: &mut Vec<GameEvent>,
) {
    let decision = world.policy.update(world.active, world.player.pos, contact, &world.chests);
    match decision {
        Activation::Claimed(chest) => {
            log::debug!("chest {chest} active");
            events.push(GameEvent::ChestClaimed { chest });
        }
        Activation::Released(chest) => events.push(GameEvent::ChestReleased { chest }),
        Activation::Kept(_) | Activation::Idle => {}
    }
    world.active = decision.active();
}

// ══════════════════════════════════════════════════════════════
// Round lifecycle
// ══════════════════════════════════════════════════════════════

/// Rebuild every piece of round data from the immutable board and start
/// playing.
pub fn restart_round(world: &mut WorldState) {
    world.chests = ChestRegistry::initialize(&world.board, &world.geometry);
    world.items.clear();
    world.pending.clear();
    world.schedule.clear();
    world.active = None;
    world.player = Player::new(world.geometry.spawn(&world.board));
    world.round = RoundState::new(world.board.pairs(), world.timing.countdown_secs);
    world.phase = Phase::Playing;
    world.paused = false;
    world.message.clear();
    world.message_timer_ms = 0;
    log::info!(
        "round start: {} chests, {} pairs, {}s",
        world.chests.len(), world.round.pairs, world.round.time_remaining,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::board::Board;
    use crate::domain::item::ItemKind;
    use crate::domain::physics::Point;
    use crate::sim::layout;
    use proptest::prelude::*;

    // Default layout, ids row-major:
    //   row 0:  4 2 6 3    ->  0  1  2  3
    //   row 1:  7 0 1 5    ->  4  5  6  7
    //   row 2:  3 1 4 6    ->  8  9 10 11
    //   row 3:  0 5 7 2    -> 12 13 14 15
    const HAZARD: ChestId = ChestId(5);

    fn playing_on(board: Board) -> WorldState {
        let mut w = WorldState::new(board, layout::standard_geometry(), &GameConfig::default());
        restart_round(&mut w);
        w
    }

    fn playing() -> WorldState {
        playing_on(layout::default_board(0).unwrap())
    }

    fn chests_of(w: &WorldState, kind: ItemKind) -> Vec<ChestId> {
        w.chests.iter().filter(|c| c.kind == kind).map(|c| c.id).collect()
    }

    fn idle(w: &mut WorldState, ms: u64) -> Vec<GameEvent> {
        on_frame(w, FrameInput::default(), ms)
    }

    fn flags(w: &WorldState) -> Vec<(bool, bool)> {
        w.chests.iter().map(|c| (c.opened, c.matched)).collect()
    }

    // ── Resolver ──

    #[test]
    fn matching_pair_locks_both() {
        let mut w = playing();
        assert_eq!(chests_of(&w, ItemKind::Picture(3)), vec![ChestId(3), ChestId(8)]);
        select(&mut w, ChestId(3)).unwrap();
        assert_eq!(w.pending.len(), 1);
        let events = select(&mut w, ChestId(8)).unwrap();

        assert!(events.contains(&GameEvent::PairMatched { first: ChestId(3), second: ChestId(8) }));
        assert_eq!(w.round.match_count, 1);
        assert!(w.chests.get(ChestId(3)).unwrap().matched);
        assert!(w.chests.get(ChestId(8)).unwrap().matched);
        assert!(w.pending.is_empty());
        assert!(w.items.on_chest(ChestId(3)).unwrap().resolved);
        assert!(w.schedule.is_empty());
    }

    #[test]
    fn mismatch_returns_boxes_after_settle() {
        let mut w = playing();
        let before = flags(&w);
        select(&mut w, ChestId(0)).unwrap();
        let events = select(&mut w, ChestId(1)).unwrap();
        let mismatch = GameEvent::PairMismatched { first: ChestId(0), second: ChestId(1) };
        assert!(events.contains(&mismatch));
        assert!(w.pending.is_empty());
        assert!(w.chests.get(ChestId(0)).unwrap().opened);

        // Still revealed, and locked against reselection, until the settle delay ends.
        assert!(idle(&mut w, 999).is_empty());
        assert_eq!(select(&mut w, ChestId(0)), Err(SelectError::AlreadyOpened(ChestId(0))));

        let events = idle(&mut w, 1);
        assert_eq!(events, vec![GameEvent::PairReturned { first: ChestId(0), second: ChestId(1) }]);
        assert_eq!(flags(&w), before);
        assert_eq!(w.items.active().count(), 0);
        assert_eq!(w.round.match_count, 0);
    }

    #[test]
    fn reselecting_opened_chest_changes_nothing() {
        let mut w = playing();
        select(&mut w, ChestId(2)).unwrap();
        let before = flags(&w);
        assert_eq!(select(&mut w, ChestId(2)), Err(SelectError::AlreadyOpened(ChestId(2))));
        assert_eq!(flags(&w), before);
        assert_eq!(w.pending.len(), 1);
    }

    #[test]
    fn unknown_chest_is_rejected() {
        let mut w = playing();
        assert_eq!(select(&mut w, ChestId(99)), Err(SelectError::UnknownChest(ChestId(99))));
    }

    #[test]
    fn matched_chest_cannot_be_selected() {
        let mut w = playing();
        select(&mut w, ChestId(3)).unwrap();
        select(&mut w, ChestId(8)).unwrap();
        assert_eq!(select(&mut w, ChestId(8)), Err(SelectError::AlreadyOpened(ChestId(8))));
        assert_eq!(w.round.match_count, 1);
    }

    // ── Hazard ──

    #[test]
    fn hazard_freezes_then_restores() {
        let mut w = playing();
        let events = select(&mut w, HAZARD).unwrap();
        assert!(events.contains(&GameEvent::HazardTriggered { chest: HAZARD }));
        assert!(w.chests.get(HAZARD).unwrap().opened);
        assert!(w.pending.is_empty());
        assert!(!w.player.interactive);
        assert!(w.is_penalized(HAZARD));
        assert_eq!(select(&mut w, ChestId(0)), Err(SelectError::InvalidSelection));

        // Frozen: movement input is ignored.
        let start = w.player.pos;
        on_frame(&mut w, FrameInput { movement: Some(MoveDir::Left), confirm: false }, 500);
        assert_eq!(w.player.pos, start);

        let events = idle(&mut w, 500);
        assert_eq!(events, vec![GameEvent::HazardCleared { chest: HAZARD }]);
        let chest = w.chests.get(HAZARD).unwrap();
        assert!(!chest.opened && !chest.matched);
        assert!(w.player.interactive);
        assert!(w.items.on_chest(HAZARD).is_none());
        assert_eq!(w.round.match_count, 0);
    }

    #[test]
    fn hazard_leaves_first_pick_pending() {
        let mut w = playing();
        select(&mut w, ChestId(3)).unwrap();
        select(&mut w, HAZARD).unwrap();
        assert_eq!(w.pending.len(), 1);
        assert!(w.pending.contains(ChestId(3)));

        idle(&mut w, 1000);
        select(&mut w, ChestId(8)).unwrap();
        assert_eq!(w.round.match_count, 1);
    }

    // ── Round outcome ──

    #[test]
    fn all_pairs_win() {
        let mut w = playing();
        let mut events = Vec::new();
        for id in 1..=7 {
            for chest in chests_of(&w, ItemKind::Picture(id)) {
                events.extend(select(&mut w, chest).unwrap());
            }
        }
        assert_eq!(w.round.match_count, 7);
        assert_eq!(w.round.outcome(), Outcome::Won);
        assert_eq!(w.phase, Phase::Over);
        assert_eq!(events.last(), Some(&GameEvent::RoundWon));
        assert!(!w.player.interactive);

        // Terminal: ticks stop and selection is closed.
        assert!(on_tick(&mut w).is_empty());
        assert_eq!(w.round.time_remaining, 30);
        assert_eq!(select(&mut w, HAZARD), Err(SelectError::InvalidSelection));
    }

    #[test]
    fn thirty_ticks_lose() {
        let mut w = playing();
        select(&mut w, ChestId(3)).unwrap();
        select(&mut w, ChestId(8)).unwrap();
        for n in (1..30).rev() {
            assert_eq!(on_tick(&mut w), vec![GameEvent::TimeChanged { remaining: n }]);
        }
        assert!(!w.round.is_over());
        let events = on_tick(&mut w);
        assert_eq!(events, vec![GameEvent::TimeChanged { remaining: 0 }, GameEvent::RoundLost]);
        assert_eq!(w.round.outcome(), Outcome::Lost);

        // Frozen afterwards.
        assert_eq!(select(&mut w, ChestId(0)), Err(SelectError::InvalidSelection));
        assert_eq!(w.round.match_count, 1);
        assert!(on_tick(&mut w).is_empty());
    }

    #[test]
    fn win_on_last_second_is_kept() {
        let mut w = playing();
        for id in 1..=6 {
            for chest in chests_of(&w, ItemKind::Picture(id)) {
                select(&mut w, chest).unwrap();
            }
        }
        w.round.time_remaining = 1;
        for chest in chests_of(&w, ItemKind::Picture(7)) {
            select(&mut w, chest).unwrap();
        }
        assert!(on_tick(&mut w).is_empty());
        assert_eq!(w.round.outcome(), Outcome::Won);
        assert_eq!(w.round.time_remaining, 1);
    }

    #[test]
    fn follow_up_after_loss_does_not_unfreeze() {
        let mut w = playing();
        select(&mut w, HAZARD).unwrap();
        w.round.time_remaining = 1;
        on_tick(&mut w);
        assert_eq!(w.round.outcome(), Outcome::Lost);

        let events = idle(&mut w, 1000);
        assert_eq!(events, vec![GameEvent::HazardCleared { chest: HAZARD }]);
        assert!(!w.chests.get(HAZARD).unwrap().opened);
        assert!(!w.player.interactive);
        assert_eq!(w.phase, Phase::Over);
    }

    #[test]
    fn title_and_pause_ignore_hooks() {
        let board = layout::default_board(0).unwrap();
        let mut w = WorldState::new(board, layout::standard_geometry(), &GameConfig::default());
        let start = w.player.pos;
        on_frame(&mut w, FrameInput { movement: Some(MoveDir::Left), confirm: true }, 500);
        assert!(on_tick(&mut w).is_empty());
        assert_eq!(w.player.pos, start);
        assert_eq!(select(&mut w, ChestId(0)), Err(SelectError::InvalidSelection));

        restart_round(&mut w);
        w.paused = true;
        assert!(on_tick(&mut w).is_empty());
        assert_eq!(w.round.time_remaining, 30);
    }

    #[test]
    fn restart_resets_everything() {
        let mut w = playing();
        select(&mut w, ChestId(3)).unwrap();
        select(&mut w, ChestId(8)).unwrap();
        select(&mut w, HAZARD).unwrap();
        on_tick(&mut w);
        restart_round(&mut w);
        assert_eq!(w.round, RoundState::new(7, 30));
        assert_eq!(w.chests.matched_count(), 0);
        assert!(w.schedule.is_empty() && w.pending.is_empty());
        assert!(w.player.interactive);
        assert_eq!(w.items.active().count(), 0);
    }

    // ── Movement / activation ──

    #[test]
    fn standing_between_rows_claims_nearest_then_confirm_opens() {
        let mut w = playing();
        // Chest 6 at (32,10) and chest 10 at (32,16): equal distance, lower id wins.
        w.player.pos = Point::new(32.0, 13.0);
        assert_eq!(idle(&mut w, 16), vec![GameEvent::ChestClaimed { chest: ChestId(6) }]);
        assert_eq!(w.active, Some(ChestId(6)));

        let events = on_frame(&mut w, FrameInput { movement: None, confirm: true }, 16);
        let revealed = GameEvent::ItemRevealed { chest: ChestId(6), kind: ItemKind::Picture(1) };
        assert!(events.contains(&revealed));
        assert_eq!(w.active, None);
        assert_eq!(w.pending.len(), 1);
    }

    #[test]
    fn walking_away_releases() {
        let mut w = playing();
        w.player.pos = Point::new(32.0, 13.0);
        idle(&mut w, 16);
        let right = FrameInput { movement: Some(MoveDir::Right), confirm: false };
        let events = on_frame(&mut w, right, 500);
        assert_eq!(events, vec![GameEvent::ChestReleased { chest: ChestId(6) }]);
        assert_eq!(w.active, None);
        assert!(!w.chests.get(ChestId(6)).unwrap().opened);
    }

    #[test]
    fn pushing_into_chest_stops_and_claims_it() {
        let mut w = playing();
        // In row 1's lane, between chest 5 (x 17..23) and chest 6 (x 29..35).
        w.player.pos = Point::new(26.0, 10.0);
        let right = FrameInput { movement: Some(MoveDir::Right), confirm: false };
        let events = on_frame(&mut w, right, 1000);
        assert_eq!(w.player.pos, Point::new(28.0, 10.0));
        assert_eq!(events, vec![GameEvent::ChestClaimed { chest: ChestId(6) }]);
        assert_eq!(w.player.facing, MoveDir::Right);
    }

    #[test]
    fn chest_claimed_by_contact_stays_active_while_flush() {
        let mut config = GameConfig::default();
        config.motion.interact_distance = 1.0;
        config.motion.release_distance = 1.0;
        let board = layout::default_board(0).unwrap();
        let mut w = WorldState::new(board, layout::standard_geometry(), &config);
        restart_round(&mut w);
        w.player.pos = Point::new(26.0, 10.0);
        let right = FrameInput { movement: Some(MoveDir::Right), confirm: false };

        let claimed = on_frame(&mut w, right, 1000);
        assert_eq!(claimed, vec![GameEvent::ChestClaimed { chest: ChestId(6) }]);
        // Centre distance 4 is past the release radius, but the player is still flush.
        assert!(idle(&mut w, 16).is_empty());
        assert!(on_frame(&mut w, right, 16).is_empty());
        assert_eq!(w.active, Some(ChestId(6)));
        assert_eq!(w.player.pos, Point::new(28.0, 10.0));

        let left = FrameInput { movement: Some(MoveDir::Left), confirm: false };
        let released = on_frame(&mut w, left, 100);
        assert_eq!(released, vec![GameEvent::ChestReleased { chest: ChestId(6) }]);
    }

    #[test]
    fn confirm_without_active_chest_is_ignored() {
        let mut w = playing();
        assert!(on_confirm(&mut w).is_empty());
        assert!(w.pending.is_empty());
    }

    // ── Board-wide properties ──

    /// One-row board: `pairs` shuffled pairs 1..=pairs plus `hazards` zeros.
    fn shuffled_board() -> impl Strategy<Value = Vec<u8>> {
        (1u8..=8, 0usize..=3).prop_flat_map(|(pairs, hazards)| {
            let mut cells: Vec<u8> = (1..=pairs).flat_map(|p| [p, p]).collect();
            cells.extend(std::iter::repeat(0).take(hazards));
            Just(cells).prop_shuffle()
        })
    }

    proptest! {
        #[test]
        fn selecting_every_pair_wins_at_exactly_pairs(cells in shuffled_board()) {
            let board = Board::from_rows(&[cells.clone()], 0).unwrap();
            let pairs = board.pairs();
            let mut w = playing_on(board);
            let max_id = cells.iter().copied().max().unwrap_or(0);
            for id in 1..=max_id {
                for chest in chests_of(&w, ItemKind::Picture(id)) {
                    prop_assert!(w.round.match_count < pairs);
                    select(&mut w, chest).unwrap();
                    prop_assert!(w.pending.len() <= CAPACITY);
                }
            }
            prop_assert_eq!(w.round.match_count, pairs);
            prop_assert_eq!(w.round.outcome(), Outcome::Won);
        }

        #[test]
        fn random_play_keeps_invariants(
            cells in shuffled_board(),
            moves in proptest::collection::vec((0usize..20, 0u64..1500), 1..60),
        ) {
            let board = Board::from_rows(&[cells], 0).unwrap();
            let pairs = board.pairs();
            let mut w = playing_on(board);
            for (pick, dt) in moves {
                let _ = select(&mut w, ChestId(pick));
                idle(&mut w, dt);
                prop_assert!(w.pending.len() <= CAPACITY);
                prop_assert!(w.round.match_count <= pairs);
                prop_assert_eq!(w.chests.matched_count() as u32, w.round.match_count * 2);
                // No hazard is ever matched.
                prop_assert!(w.chests.iter().all(|c| !(c.matched && c.kind.is_hazard())));
            }
            // Once everything settles, only matched boxes and a lone pending
            // pick stay uncovered.
            idle(&mut w, 10_000);
            prop_assert!(w
                .chests
                .iter()
                .all(|c| c.matched || !c.opened || w.pending.contains(c.id)));
        }
    }
}
