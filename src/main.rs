/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::path::Path;
use std::time::{Duration, Instant};

use crossterm::event::{
    KeyCode, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};

use config::GameConfig;
use domain::entity::FrameInput;
use sim::event::GameEvent;
use sim::layout;
use sim::step;
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::{Sfx, SoundEngine};

/// Longest frame fed to the simulation; a stalled terminal must not
/// teleport the player or skip the settle delay in one step.
const MAX_FRAME_MS: u64 = 100;

const KEYS_START: &[KeyCode] = &[KeyCode::Enter];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q')];

fn main() {
    let config = GameConfig::load();
    init_logging(&config.log_file);

    // Board problems are fatal and reported before the terminal changes mode.
    let board = match layout::load_board(&config.board) {
        Ok(b) => b,
        Err(e) => {
            log::error!("invalid board: {e}");
            eprintln!("Error: invalid board: {e}");
            std::process::exit(1);
        }
    };
    let mut world = WorldState::new(board, layout::standard_geometry(), &config);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }
    let enhanced = enable_key_release();

    let sound = SoundEngine::new();
    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config, enhanced);

    if enhanced {
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        log::error!("game error: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Boxmatch!");
    if world.round.is_over() {
        println!(
            "Last round: {:?}, {}/{} pairs",
            world.round.outcome(),
            world.round.match_count,
            world.round.pairs
        );
    }
}

/// stdout belongs to the terminal UI, so log records go to a file.
/// If the file cannot be opened, logging stays off.
fn init_logging(path: &Path) {
    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: could not open log file {}: {e}", path.display());
            return;
        }
    };
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
}

/// Ask the terminal for key Release events; falls back to hold timeouts.
fn enable_key_release() -> bool {
    if !matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
        return false;
    }
    execute!(
        std::io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok()
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    enhanced: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = enhanced;
    let mut gp = GamepadState::new(&config.gamepad);
    let frame_sleep = Duration::from_millis(config.motion.frame_ms);
    let tick_interval = config.round.tick_interval_ms;

    let mut last_frame = Instant::now();
    let mut tick_acc_ms: u64 = 0;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(world, &kb, &gp) {
            break;
        }

        let dt_ms = (last_frame.elapsed().as_millis() as u64).min(MAX_FRAME_MS);
        last_frame = Instant::now();

        if world.paused {
            world.anim_ms = world.anim_ms.wrapping_add(dt_ms);
        } else {
            let input = merge_input(kb.frame_input(), &gp);
            let mut events = step::on_frame(world, input, dt_ms);

            if world.phase == Phase::Playing {
                tick_acc_ms += dt_ms;
                while tick_acc_ms >= tick_interval {
                    tick_acc_ms -= tick_interval;
                    events.extend(step::on_tick(world));
                }
            } else {
                tick_acc_ms = 0;
            }
            present_events(world, sound, &events);
        }

        renderer.render(world)?;
        std::thread::sleep(frame_sleep);
    }

    Ok(())
}

fn merge_input(keyboard: FrameInput, gp: &GamepadState) -> FrameInput {
    FrameInput {
        movement: keyboard.movement.or_else(|| gp.movement()),
        confirm: keyboard.confirm || gp.confirm_pressed(),
    }
}

/// Sound and the message line for events the core emitted.
fn present_events(world: &mut WorldState, sound: Option<&SoundEngine>, events: &[GameEvent]) {
    for event in events {
        if let (Some(sfx), Some(effect)) = (sound, Sfx::for_event(event)) {
            sfx.play(effect);
        }
        match event {
            GameEvent::PairMatched { .. } => {
                let msg = format!("Match! {}/{}", world.round.match_count, world.round.pairs);
                world.set_message(&msg, 1500);
            }
            GameEvent::PairMismatched { .. } => world.set_message("No match", 1000),
            GameEvent::HazardTriggered { .. } => {
                let msg = format!("Trapped for {:.1}s!", world.timing.penalty_ms as f32 / 1000.0);
                world.set_message(&msg, world.timing.penalty_ms);
            }
            GameEvent::RoundWon => world.set_message("All pairs found!", 0),
            GameEvent::RoundLost => world.set_message("Time is up", 0),
            _ => {}
        }
    }
}

/// Phase transitions and global keys. Returns true to quit.
fn handle_meta(world: &mut WorldState, kb: &InputState, gp: &GamepadState) -> bool {
    let esc = kb.any_pressed(&[KeyCode::Esc]) || gp.cancel_pressed();
    let start = kb.any_pressed(KEYS_START) || gp.restart_pressed();

    match world.phase {
        Phase::Title => {
            if kb.any_pressed(KEYS_QUIT) || esc {
                return true;
            }
            if start {
                step::restart_round(world);
            }
        }
        Phase::Playing | Phase::Over => {
            if kb.any_pressed(&[KeyCode::F(1)]) && world.phase == Phase::Playing {
                world.paused = !world.paused;
                log::debug!("paused: {}", world.paused);
                return false;
            }
            if esc {
                world.paused = false;
                world.phase = Phase::Title;
            } else if kb.any_pressed(KEYS_RESTART)
                || gp.restart_pressed()
                || (world.phase == Phase::Over && start)
            {
                step::restart_round(world);
            } else if kb.any_pressed(KEYS_QUIT) && (world.paused || world.phase == Phase::Over) {
                return true;
            }
        }
    }
    false
}
