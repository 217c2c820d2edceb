/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Each grid cell is `CELL_W` columns by `CELL_H` rows. With sprites loaded,
/// every terminal cell is an upper-half-block whose fg/bg are two stacked
/// sprite pixels. Without sprites, cells fall back to colored glyphs.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::position::Position;
use crate::sim::world::WorldState;
use super::sprites::{Rgb, Sprite, SpriteSet, SUB};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
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

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect()
    }
}

// ── Renderer ──

const CELL_W: usize = SUB;
const CELL_H: usize = SUB / 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// Gap between the map and the gold panel.
const PANEL_GAP: usize = 3;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const UPPER_HALF: char = '\u{2580}';

// Glyph fallback palette
const FLOOR_FALLBACK: Rgb = (48, 44, 52);
const PLAYER_FALLBACK: Color = Color::Rgb { r: 90, g: 170, b: 255 };
const ITEM_FALLBACK: Color = Color::Rgb { r: 255, g: 210, b: 60 };
const ENEMY_FALLBACK: Color = Color::Rgb { r: 230, g: 60, b: 60 };

fn rgb(c: Rgb) -> Color {
    Color::Rgb { r: c.0, g: c.1, b: c.2 }
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
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
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState, sprites: Option<&SpriteSet>) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.compose(world, sprites);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
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
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, w: &WorldState, sprites: Option<&SpriteSet>) {
        self.front.clear();
        let buf_w = self.front.width;
        let view = w.viewport;

        // ── HUD row ──
        let hud = format!(" GRID GAME   ({:>2},{:>2}) ", w.player.pos.row, w.player.pos.col);
        for x in 0..buf_w {
            self.front.set(x, HUD_ROW, Cell::new(' ', Color::White, HUD_BG));
        }
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Map (viewport) ──
        for pos in view.cells() {
            let Some((vr, vc)) = view.to_view(pos) else { continue };
            let col = vc * CELL_W;
            let row = MAP_ROW + vr * CELL_H;
            match sprites {
                Some(set) => self.compose_cell_sprite(w, set, pos, col, row),
                None => self.compose_cell_glyph(w, pos, col, row),
            }
        }

        // ── Gold panel (right of the map) ──
        let panel_x = view.width * CELL_W + PANEL_GAP;
        self.front.put_str(panel_x, MAP_ROW, &format!("Gold: {}", w.gold), Color::Yellow, Cell::BASE_BG);
        self.front.put_str(panel_x, MAP_ROW + 2, &format!("Items: {}", w.items.len()), Color::DarkGrey, Cell::BASE_BG);

        // ── Message bar ──
        let map_bottom = MAP_ROW + view.height * CELL_H;
        let msg_row = map_bottom + 1;
        if !w.message.is_empty() {
            let msg = format!(" {} ", w.message);
            self.front.put_str(0, msg_row, &msg, Color::Black, Color::Rgb { r: 200, g: 180, b: 50 });
        }

        // ── Help bar ──
        let help = " WASD/Arrows: Move   Esc/Q: Quit";
        self.front.put_str(0, map_bottom + 2, help, Color::DarkGrey, Cell::BASE_BG);
    }

    /// Sprite stack on `pos`, bottom first: floor, player, item, enemy.
    fn layers<'a>(w: &WorldState, set: &'a SpriteSet, pos: Position) -> Vec<&'a Sprite> {
        let mut layers = vec![&set.floor];
        if w.player.pos == pos { layers.push(&set.player); }
        if w.items.iter().any(|i| i.pos() == pos) { layers.push(&set.item); }
        if w.enemies.iter().any(|e| e.pos == pos) { layers.push(&set.enemy); }
        layers
    }

    /// Topmost opaque pixel of the stack at sprite coords (x, y).
    fn stacked_pixel(layers: &[&Sprite], x: usize, y: usize) -> Option<Rgb> {
        layers.iter().rev().find_map(|s| s.pixel(x, y))
    }

    fn compose_cell_sprite(&mut self, w: &WorldState, set: &SpriteSet, pos: Position, col: usize, row: usize) {
        let layers = Self::layers(w, set, pos);
        for cy in 0..CELL_H {
            for cx in 0..CELL_W {
                let top = Self::stacked_pixel(&layers, cx, cy * 2).map(rgb).unwrap_or(Cell::BASE_BG);
                let bottom = Self::stacked_pixel(&layers, cx, cy * 2 + 1).map(rgb).unwrap_or(Cell::BASE_BG);
                self.front.set(col + cx, row + cy, Cell::new(UPPER_HALF, top, bottom));
            }
        }
    }

    fn compose_cell_glyph(&mut self, w: &WorldState, pos: Position, col: usize, row: usize) {
        let floor = rgb(FLOOR_FALLBACK);
        for cy in 0..CELL_H {
            for cx in 0..CELL_W {
                self.front.set(col + cx, row + cy, Cell::new(' ', Color::DarkGrey, floor));
            }
        }

        // Later draws win, matching the sprite stacking order.
        let mut glyph = None;
        if w.player.pos == pos { glyph = Some(('@', PLAYER_FALLBACK)); }
        if w.items.iter().any(|i| i.pos() == pos) { glyph = Some(('$', ITEM_FALLBACK)); }
        if w.enemies.iter().any(|e| e.pos == pos) { glyph = Some(('E', ENEMY_FALLBACK)); }

        match glyph {
            Some((ch, fg)) => {
                for cy in 0..CELL_H {
                    self.front.set(col + 1, row + cy, Cell::new(ch, fg, floor));
                    self.front.set(col + 2, row + cy, Cell::new(ch, fg, floor));
                }
            }
            None => self.front.set(col + 1, row, Cell::new('.', Color::DarkGrey, floor)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::{CollectableItem, Enemy};

    fn world() -> WorldState {
        let mut w = WorldState::with_seed(&GameConfig::default(), 4);
        w.items.clear();
        w.enemies.clear();
        w
    }

    fn renderer(w: usize, h: usize) -> Renderer {
        let mut r = Renderer::new();
        r.front.resize(w, h);
        r.back.resize(w, h);
        r
    }

    fn flat(c: Rgb) -> Sprite {
        let mut img = image::RgbaImage::new(4, 4);
        for p in img.pixels_mut() {
            *p = image::Rgba([c.0, c.1, c.2, 255]);
        }
        Sprite::from_image(&img)
    }

    fn sprite_set() -> SpriteSet {
        SpriteSet {
            player: flat((0, 0, 255)),
            enemy: flat((255, 0, 0)),
            item: flat((255, 255, 0)),
            floor: flat((0, 80, 0)),
        }
    }

    /// Screen column/row of the top-left of grid cell `pos`.
    fn origin(w: &WorldState, pos: Position) -> (usize, usize) {
        let (vr, vc) = w.viewport.to_view(pos).unwrap();
        (vc * CELL_W, MAP_ROW + vr * CELL_H)
    }

    #[test]
    fn gold_label_tracks_counter() {
        let mut w = world();
        w.gold = 7;
        let mut r = renderer(100, 40);
        r.compose(&w, None);
        let panel_x = 14 * CELL_W + PANEL_GAP;
        assert!(r.front.row_text(MAP_ROW)[panel_x..].starts_with("Gold: 7"));
    }

    #[test]
    fn glyph_fallback_draws_entities() {
        let mut w = world();
        let item = Position::new(14, 15);
        let enemy = Position::new(16, 15);
        w.items.push(CollectableItem::new(item));
        w.enemies.push(Enemy::new(0, enemy));
        let mut r = renderer(100, 40);
        r.compose(&w, None);

        let (x, y) = origin(&w, w.player.pos);
        assert_eq!(r.front.get(x + 1, y).ch, '@');
        let (x, y) = origin(&w, item);
        assert_eq!(r.front.get(x + 2, y + 1).ch, '$');
        let (x, y) = origin(&w, enemy);
        assert_eq!(r.front.get(x + 1, y).ch, 'E');
        let (x, y) = origin(&w, Position::new(10, 10));
        assert_eq!(r.front.get(x + 1, y).ch, '.');
    }

    #[test]
    fn enemy_draws_over_player() {
        let mut w = world();
        w.enemies.push(Enemy::new(0, w.player.pos));
        let mut r = renderer(100, 40);
        r.compose(&w, Some(&sprite_set()));
        let (x, y) = origin(&w, w.player.pos);
        let cell = r.front.get(x, y);
        assert_eq!(cell.ch, UPPER_HALF);
        assert_eq!(cell.fg, Color::Rgb { r: 255, g: 0, b: 0 });
    }

    #[test]
    fn sprite_cells_use_floor_then_entity() {
        let w = world();
        let mut r = renderer(100, 40);
        r.compose(&w, Some(&sprite_set()));

        let (x, y) = origin(&w, Position::new(10, 10));
        assert_eq!(r.front.get(x, y).bg, Color::Rgb { r: 0, g: 80, b: 0 });
        let (x, y) = origin(&w, w.player.pos);
        assert_eq!(r.front.get(x + 3, y + 1).fg, Color::Rgb { r: 0, g: 0, b: 255 });
    }

    #[test]
    fn transparent_pixels_show_floor() {
        let w = world();
        let mut set = sprite_set();
        set.player = Sprite::from_image(&image::RgbaImage::new(4, 4));
        let mut r = renderer(100, 40);
        r.compose(&w, Some(&set));
        let (x, y) = origin(&w, w.player.pos);
        assert_eq!(r.front.get(x, y).fg, Color::Rgb { r: 0, g: 80, b: 0 });
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let mut w = world();
        w.set_message("hello");
        let mut r = renderer(10, 3);
        r.compose(&w, Some(&sprite_set()));
        r.compose(&w, None);
        assert!(r.front.row_text(HUD_ROW).starts_with(" GRID GAME"));
    }

    #[test]
    fn message_bar_shows_last_message() {
        let mut w = world();
        w.set_message("+1 gold");
        let mut r = renderer(100, 40);
        r.compose(&w, None);
        let msg_row = MAP_ROW + 12 * CELL_H + 1;
        assert!(r.front.row_text(msg_row).starts_with(" +1 gold "));
    }
}
