/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub round: RoundConfig,
    pub motion: MotionConfig,
    pub board: BoardConfig,
    pub gamepad: GamepadConfig,
    pub log_file: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoundConfig {
    pub countdown_secs: u32,
    pub tick_interval_ms: u64,
    pub settle_ms: u64,   // mismatch pair stays revealed this long
    pub penalty_ms: u64,  // hazard freeze
}

#[derive(Clone, Debug, PartialEq)]
pub struct MotionConfig {
    pub player_speed: f32,       // world units per second
    pub interact_distance: f32,
    pub release_distance: f32,
    pub frame_ms: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoardConfig {
    pub hazard: u8,
    pub file: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    round: TomlRound,
    #[serde(default)]
    motion: TomlMotion,
    #[serde(default)]
    board: TomlBoard,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlRound {
    #[serde(default = "default_countdown")]
    countdown_secs: u32,
    #[serde(default = "default_tick_interval")]
    tick_interval_ms: u64,
    #[serde(default = "default_settle")]
    settle_ms: u64,
    #[serde(default = "default_penalty")]
    penalty_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlMotion {
    #[serde(default = "default_player_speed")]
    player_speed: f32,
    #[serde(default = "default_interact")]
    interact_distance: f32,
    #[serde(default = "default_release")]
    release_distance: f32,
    #[serde(default = "default_frame")]
    frame_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlBoard {
    #[serde(default)]
    hazard: u8,
    #[serde(default)]
    file: String,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_log_file")]
    log_file: String,
}

// ── Defaults ──

fn default_countdown() -> u32 { 30 }
fn default_tick_interval() -> u64 { 1000 }
fn default_settle() -> u64 { 1000 }
fn default_penalty() -> u64 { 1000 }
fn default_player_speed() -> f32 { 18.0 }
fn default_interact() -> f32 { 3.0 }
fn default_release() -> f32 { 4.5 }
fn default_frame() -> u64 { 16 }

fn default_confirm() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_restart() -> Vec<String> { vec!["Start".into()] }
fn default_log_file() -> String { "boxmatch.log".into() }

impl Default for TomlRound {
    fn default() -> Self {
        TomlRound {
            countdown_secs: default_countdown(),
            tick_interval_ms: default_tick_interval(),
            settle_ms: default_settle(),
            penalty_ms: default_penalty(),
        }
    }
}

impl Default for TomlMotion {
    fn default() -> Self {
        TomlMotion {
            player_speed: default_player_speed(),
            interact_distance: default_interact(),
            release_distance: default_release(),
            frame_ms: default_frame(),
        }
    }
}

impl Default for TomlBoard {
    fn default() -> Self {
        TomlBoard { hazard: 0, file: String::new() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            restart: default_restart(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { log_file: default_log_file() }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/boxmatch`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse a config document; relative paths resolve against CWD.
    #[cfg(test)]
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(toml_cfg, &[]))
    }

    fn from_toml(t: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let file = if t.board.file.trim().is_empty() {
            None
        } else {
            Some(resolve_path(t.board.file.trim(), search_dirs))
        };

        let mut cfg = GameConfig {
            round: RoundConfig {
                countdown_secs: t.round.countdown_secs,
                tick_interval_ms: t.round.tick_interval_ms,
                settle_ms: t.round.settle_ms,
                penalty_ms: t.round.penalty_ms,
            },
            motion: MotionConfig {
                player_speed: t.motion.player_speed,
                interact_distance: t.motion.interact_distance,
                release_distance: t.motion.release_distance,
                frame_ms: t.motion.frame_ms,
            },
            board: BoardConfig { hazard: t.board.hazard, file },
            gamepad: GamepadConfig {
                confirm: t.gamepad.confirm,
                cancel: t.gamepad.cancel,
                restart: t.gamepad.restart,
            },
            log_file: PathBuf::from(t.general.log_file),
        };
        cfg.sanitize();
        cfg
    }

    /// Clamp values that would make a round unplayable.
    /// Runs before the logger exists (it is configured from here), so
    /// problems go to stderr like the loader's own warnings.
    fn sanitize(&mut self) {
        if self.round.countdown_secs == 0 {
            eprintln!("Warning: countdown_secs = 0 is not playable, using 1");
            self.round.countdown_secs = 1;
        }
        if self.round.tick_interval_ms == 0 {
            eprintln!("Warning: tick_interval_ms = 0, using {}", default_tick_interval());
            self.round.tick_interval_ms = default_tick_interval();
        }
        if !(self.motion.player_speed > 0.0) {
            eprintln!("Warning: player_speed must be positive, using {}", default_player_speed());
            self.motion.player_speed = default_player_speed();
        }
        if !(self.motion.interact_distance >= 0.0) {
            self.motion.interact_distance = default_interact();
        }
        if !(self.motion.release_distance >= self.motion.interact_distance) {
            eprintln!(
                "Warning: release_distance {} below interact_distance {}, raising it",
                self.motion.release_distance, self.motion.interact_distance,
            );
            self.motion.release_distance = self.motion.interact_distance;
        }
        self.motion.frame_ms = self.motion.frame_ms.clamp(1, 100);
    }
}

fn resolve_path(raw: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    search_dirs.iter()
        .map(|d| d.join(path))
        .find(|p| p.is_file())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Candidate directories to search: exe dir + CWD + XDG data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/boxmatch");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, GameConfig::default());
        assert_eq!(cfg.round.countdown_secs, 30);
        assert_eq!(cfg.round.tick_interval_ms, 1000);
        assert_eq!(cfg.board.hazard, 0);
        assert_eq!(cfg.board.file, None);
        assert_eq!(cfg.log_file, PathBuf::from("boxmatch.log"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[round]\ncountdown_secs = 45\n\n[board]\nhazard = 9\nfile = \"boards/big.txt\"\n",
        ).unwrap();
        assert_eq!(cfg.round.countdown_secs, 45);
        assert_eq!(cfg.round.settle_ms, 1000);
        assert_eq!(cfg.board.hazard, 9);
        assert_eq!(cfg.board.file, Some(PathBuf::from("boards/big.txt")));
        assert_eq!(cfg.motion.player_speed, 18.0);
    }

    #[test]
    fn unplayable_values_are_clamped() {
        let cfg = GameConfig::from_toml_str(
            "[round]\ncountdown_secs = 0\ntick_interval_ms = 0\n\
             [motion]\nplayer_speed = -2.0\ninteract_distance = 6.0\n\
             release_distance = 2.0\nframe_ms = 0\n",
        ).unwrap();
        assert_eq!(cfg.round.countdown_secs, 1);
        assert_eq!(cfg.round.tick_interval_ms, 1000);
        assert_eq!(cfg.motion.player_speed, 18.0);
        assert_eq!(cfg.motion.release_distance, 6.0);
        assert_eq!(cfg.motion.frame_ms, 1);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(GameConfig::from_toml_str("[round]\ncountdown_secs = \"soon\"\n").is_err());
    }
}
