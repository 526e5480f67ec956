/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// World units map 1:1 to terminal cells. The arena is centred
/// horizontally below the HUD; `origin()` gives its top-left corner.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::chest::{Chest, ChestId};
use crate::domain::item::ItemKind;
use crate::domain::physics::{Aabb, Point};
use crate::sim::round::Outcome;
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every cell, so row gaps on VTE terminals
    /// match the cell colour.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// One column per char; everything drawn here is single-width.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Glyph table ──

/// Picture glyphs, indexed by picture id. Only the renderer knows these.
const PICTURES: [(char, Color); 12] = [
    ('✿', Color::Rgb { r: 255, g: 150, b: 200 }),
    ('♣', Color::Rgb { r: 80, g: 220, b: 80 }),
    ('♥', Color::Rgb { r: 255, g: 70, b: 90 }),
    ('♦', Color::Rgb { r: 255, g: 160, b: 40 }),
    ('♠', Color::Rgb { r: 140, g: 160, b: 255 }),
    ('★', Color::Rgb { r: 255, g: 230, b: 60 }),
    ('♪', Color::Rgb { r: 120, g: 230, b: 230 }),
    ('☀', Color::Rgb { r: 255, g: 200, b: 100 }),
    ('☂', Color::Rgb { r: 190, g: 120, b: 255 }),
    ('☯', Color::Rgb { r: 230, g: 230, b: 230 }),
    ('♞', Color::Rgb { r: 200, g: 170, b: 120 }),
    ('✚', Color::Rgb { r: 120, g: 255, b: 160 }),
];

const HAZARD_GLYPH: (char, Color) = ('☠', Color::Rgb { r: 255, g: 60, b: 60 });

fn item_glyph(kind: ItemKind) -> (char, Color) {
    match kind {
        ItemKind::Hazard => HAZARD_GLYPH,
        ItemKind::Picture(n) => PICTURES[n as usize % PICTURES.len()],
    }
}

/// How a chest looks this frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ChestLook {
    Covered,
    Active,
    Opened,
    /// Wrong pair, waiting to be covered again.
    Mismatched,
    Penalized,
    Matched,
}

fn chest_look(w: &WorldState, chest: &Chest) -> ChestLook {
    if chest.matched {
        ChestLook::Matched
    } else if w.is_penalized(chest.id) {
        ChestLook::Penalized
    } else if chest.opened && w.schedule.involves(chest.id) {
        ChestLook::Mismatched
    } else if chest.opened {
        ChestLook::Opened
    } else if w.active == Some(chest.id) {
        ChestLook::Active
    } else {
        ChestLook::Covered
    }
}

/// The item shown on top of a chest. Only live pool items are drawn, so a
/// pair returned to the pool shows covered even before the chest repaints.
fn revealed_item(w: &WorldState, chest: ChestId) -> Option<ItemKind> {
    w.items.on_chest(chest).map(|item| item.kind)
}

/// Terminal rectangle `(col, row, w, h)` covered by `body`, relative to the
/// arena's top-left corner.
fn body_rect(body: &Aabb, arena: &Aabb) -> (usize, usize, usize, usize) {
    let col = (body.min_x() - arena.min_x()).max(0.0).floor() as usize;
    let row = (body.min_y() - arena.min_y()).max(0.0).floor() as usize;
    let w = (body.half_w * 2.0).round() as usize + 1;
    let h = (body.half_h * 2.0).round() as usize + 1;
    (col, row, w, h)
}

fn point_cell(p: Point, arena: &Aabb) -> (usize, usize) {
    (
        (p.x - arena.min_x()).max(0.0).floor() as usize,
        (p.y - arena.min_y()).max(0.0).floor() as usize,
    )
}

// ── Renderer ──

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const GOLD: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const GREEN: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const RED: Color = Color::Rgb { r: 255, g: 60, b: 60 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame.
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.front.clear();
        match world.phase {
            Phase::Title => self.compose_title(world),
            Phase::Playing => self.compose_game(world),
            Phase::Over => {
                self.compose_game(world);
                self.compose_banner(world);
            }
        }
        if world.paused {
            self.compose_pause_overlay(world);
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colours; ResetColor would fall back to the terminal default.
        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    /// Top-left terminal cell of the arena (inside its border).
    fn origin(&self, w: &WorldState) -> (usize, usize) {
        let arena_w = (w.arena.half_w * 2.0).ceil() as usize;
        (self.front.width.saturating_sub(arena_w) / 2, MAP_ROW + 1)
    }

    fn compose_game(&mut self, w: &WorldState) {
        // ── HUD row ──
        let hud = format!(
            " BOXMATCH   Time {:>3}   Pairs {}/{} ",
            w.round.time_remaining, w.round.match_count, w.round.pairs,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
        if w.round.time_remaining <= crate::ui::sound::WARN_SECONDS {
            let blink = (w.anim_ms / 250) % 2 == 0 || w.round.is_over();
            let fg = if blink { RED } else { Color::White };
            let text = format!("{:>3}", w.round.time_remaining);
            self.front.put_str(17, HUD_ROW, &text, fg, HUD_BG);
        }

        // ── Arena border ──
        let (ox, oy) = self.origin(w);
        let aw = (w.arena.half_w * 2.0).ceil() as usize;
        let ah = (w.arena.half_h * 2.0).ceil() as usize;
        let (fx, fy) = (ox.saturating_sub(1), oy - 1);
        self.compose_frame(fx, fy, aw + 2, ah + 2, Color::DarkGrey, Color::Reset);

        // ── Chests ──
        for chest in w.chests.iter() {
            let (col, row, cw, ch) = body_rect(&chest.body, &w.arena);
            self.compose_chest(w, chest, ox + col, oy + row, cw, ch);
        }

        // ── Player ──
        let (px, py) = point_cell(w.player.pos, &w.arena);
        let fg = if w.player.interactive || w.round.is_over() { GREEN } else { RED };
        let glyph = if w.player.moving && (w.anim_ms / 150) % 2 == 1 { '&' } else { '@' };
        self.front.set(ox + px, oy + py, Cell::new(glyph, fg, Color::Reset));

        // ── Message bar ──
        let msg_row = oy + ah + 2;
        if !w.message.is_empty() && msg_row < self.front.height {
            self.front.fill_row(msg_row, MSG_BG);
            let msg = format!(" ◈ {} ", w.message);
            self.front.put_str(0, msg_row, &msg, Color::Black, MSG_BG);
        }

        // ── Help bar ──
        let help_row = msg_row + 1;
        if help_row < self.front.height {
            let help = " ←→↑↓/WASD:Move  Space/Z:Open  F1:Pause  R:Restart  ESC:Title";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_frame(&mut self, x: usize, y: usize, w: usize, h: usize, fg: Color, bg: Color) {
        if w < 2 || h < 2 {
            return;
        }
        for i in 1..w - 1 {
            self.front.set(x + i, y, Cell::new('─', fg, bg));
            self.front.set(x + i, y + h - 1, Cell::new('─', fg, bg));
        }
        for j in 1..h - 1 {
            self.front.set(x, y + j, Cell::new('│', fg, bg));
            self.front.set(x + w - 1, y + j, Cell::new('│', fg, bg));
        }
        self.front.set(x, y, Cell::new('┌', fg, bg));
        self.front.set(x + w - 1, y, Cell::new('┐', fg, bg));
        self.front.set(x, y + h - 1, Cell::new('└', fg, bg));
        self.front.set(x + w - 1, y + h - 1, Cell::new('┘', fg, bg));
    }

    fn compose_chest(
        &mut self,
        w: &WorldState,
        chest: &Chest,
        x: usize,
        y: usize,
        cw: usize,
        ch: usize,
    ) {
        let look = chest_look(w, chest);
        let blink = (w.anim_ms / 200) % 2 == 0;
        let (border, bg) = match look {
            ChestLook::Covered => (Color::Rgb { r: 150, g: 110, b: 60 }, Color::Reset),
            ChestLook::Active => {
                (Color::Rgb { r: 100, g: 220, b: 255 }, Color::Rgb { r: 30, g: 50, b: 70 })
            }
            ChestLook::Opened => (GOLD, Color::Reset),
            ChestLook::Mismatched => (Color::Rgb { r: 200, g: 100, b: 60 }, Color::Reset),
            ChestLook::Penalized if blink => (RED, Color::Rgb { r: 70, g: 10, b: 10 }),
            ChestLook::Penalized => (RED, Color::Reset),
            ChestLook::Matched => (GREEN, Color::Rgb { r: 10, g: 45, b: 20 }),
        };
        self.compose_frame(x, y, cw, ch, border, bg);
        for j in 1..ch.saturating_sub(1) {
            for i in 1..cw.saturating_sub(1) {
                self.front.set(x + i, y + j, Cell::new(' ', Color::White, bg));
            }
        }

        let (glyph, fg) = match (revealed_item(w, chest.id), look) {
            (Some(kind), _) => item_glyph(kind),
            (None, ChestLook::Active) => ('?', Color::White),
            (None, _) => ('?', Color::DarkGrey),
        };
        self.front.set(x + cw / 2, y + ch / 2, Cell::new(glyph, fg, bg));
        if look == ChestLook::Active {
            self.front.set(x + cw / 2, y.saturating_sub(1), Cell::new('▼', border, Color::Reset));
        }
    }

    fn compose_banner(&mut self, w: &WorldState) {
        let (ox, oy) = self.origin(w);
        let ah = (w.arena.half_h * 2.0).ceil() as usize;
        let (label, color) = match w.round.outcome() {
            Outcome::Won => ("★  YOU WIN!  ★", GOLD),
            Outcome::Lost => ("✕  YOU LOSE!  ✕", RED),
            Outcome::InProgress => return,
        };
        let box_w = 32usize;
        let aw = (w.arena.half_w * 2.0).ceil() as usize;
        let bx = ox + aw.saturating_sub(box_w) / 2;
        let by = oy + ah / 2 - 2;
        let bg = Color::Rgb { r: 30, g: 30, b: 30 };
        for j in 0..5 {
            for i in 0..box_w {
                self.front.set(bx + i, by + j, Cell::new(' ', Color::White, bg));
            }
        }
        self.compose_frame(bx, by, box_w, 5, color, bg);
        let lx = bx + box_w.saturating_sub(label.chars().count()) / 2;
        self.front.put_str(lx, by + 1, label, color, bg);
        let hint = "ENTER: again  ESC: title";
        let hx = bx + box_w.saturating_sub(hint.len()) / 2;
        self.front.put_str(hx, by + 3, hint, Color::DarkGrey, bg);
    }

    fn compose_title(&mut self, w: &WorldState) {
        let title = [
            r" ___              __  __        _        _    ",
            r"| _ ) ___ __ __  |  \/  | __ _ | |_  __ | |_  ",
            r"| _ \/ _ \\ \ /  | |\/| |/ _` ||  _|/ _|| ' \ ",
            r"|___/\___//_\_\  |_|  |_|\__,_| \__|\__||_||_|",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_centered(2 + i, line, GOLD, Color::Reset);
        }

        let goal = format!(
            "Find all {} pairs in {} seconds. Beware of {}.",
            w.board.pairs(), w.timing.countdown_secs, HAZARD_GLYPH.0,
        );
        self.front.put_centered(8, &goal, GREEN, Color::Reset);

        let menu = [
            ("ENTER", "Start"),
            ("Q", "Quit"),
        ];
        for (i, (key, what)) in menu.iter().enumerate() {
            let line = format!("{key:>7}   {what:<10}");
            self.front.put_centered(11 + i, &line, Color::White, Color::Reset);
        }

        let help = [
            "Controls",
            "  ←→↑↓ / WASD    Move next to a box",
            "  Space / Z      Open the highlighted box",
            "  F1 Pause   R Restart   ESC Title",
        ];
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { GOLD } else { Color::DarkGrey };
            self.front.put_str(8, 15 + i, line, color, Color::Reset);
        }

        if !w.message.is_empty() {
            let row = self.front.height.saturating_sub(1);
            self.front.fill_row(row, MSG_BG);
            self.front.put_str(0, row, &format!(" ◈ {} ", w.message), Color::Black, MSG_BG);
        }
    }

    fn compose_pause_overlay(&mut self, w: &WorldState) {
        let bg = Color::Rgb { r: 40, g: 40, b: 40 };
        let blink = (w.anim_ms / 400) % 2 == 0;
        let (box_w, box_h) = (30usize, 8usize);
        let bx = self.front.width.saturating_sub(box_w) / 2;
        let by = MAP_ROW + 4;
        for j in 0..box_h {
            for i in 0..box_w {
                self.front.set(bx + i, by + j, Cell::new(' ', Color::White, bg));
            }
        }
        self.compose_frame(bx, by, box_w, box_h, GOLD, bg);
        let label = if blink { "▶  PAUSED  ◀" } else { "   PAUSED   " };
        self.front.put_str(bx + (box_w - 12) / 2, by + 1, label, GOLD, bg);
        let key_c = Color::Rgb { r: 100, g: 200, b: 255 };
        self.front.put_str(bx + 3, by + 3, "F1   Resume", key_c, bg);
        self.front.put_str(bx + 3, by + 4, "R    Restart round", key_c, bg);
        self.front.put_str(bx + 3, by + 5, "ESC  Back to title", key_c, bg);
    }
}
