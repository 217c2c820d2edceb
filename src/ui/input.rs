/// Keyboard input.
///
/// The game is driven by key presses: every Press or Repeat event counts as
/// one press, the same way a held key auto-repeats. Release events are
/// ignored. `wait_events()` blocks until something arrives (or the timeout
/// passes) and then drains everything pending.

use std::io;
use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::position::MoveDir;

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

pub struct InputState {
    /// Key presses (Press or Repeat) collected during the last drain, in order.
    pub presses: Vec<KeyEvent>,

    /// The terminal was resized during the last drain.
    pub resized: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            presses: Vec::with_capacity(8),
            resized: false,
        }
    }

    /// Block up to `timeout` for the first event, then drain the rest
    /// without blocking. Returns true if anything arrived.
    pub fn wait_events(&mut self, timeout: Duration) -> io::Result<bool> {
        self.drain(timeout, poll, event::read)
    }

    fn drain<P, R>(&mut self, timeout: Duration, mut poll_fn: P, mut read_fn: R) -> io::Result<bool>
    where
        P: FnMut(Duration) -> io::Result<bool>,
        R: FnMut() -> io::Result<Event>,
    {
        self.presses.clear();
        self.resized = false;

        if !poll_fn(timeout)? {
            return Ok(false);
        }

        while poll_fn(Duration::ZERO)? {
            match read_fn()? {
                Event::Key(key) => self.record(key),
                Event::Resize(..) => self.resized = true,
                _ => {}
            }
        }

        Ok(!self.presses.is_empty() || self.resized)
    }

    fn record(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Release {
            self.presses.push(key);
        }
    }

    /// Check if any press this drain is Ctrl+C or a quit key.
    pub fn quit_pressed(&self) -> bool {
        self.presses.iter().any(|k| is_quit(k))
    }
}

pub fn is_quit(key: &KeyEvent) -> bool {
    let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL)
        && (key.code == KeyCode::Char('c') || key.code == KeyCode::Char('C'));
    ctrl_c || KEYS_QUIT.contains(&key.code)
}

/// Map a key to a move. Non-movement keys give None.
pub fn movement_for(code: KeyCode) -> Option<MoveDir> {
    if KEYS_UP.contains(&code) {
        Some(MoveDir::Up)
    } else if KEYS_DOWN.contains(&code) {
        Some(MoveDir::Down)
    } else if KEYS_LEFT.contains(&code) {
        Some(MoveDir::Left)
    } else if KEYS_RIGHT.contains(&code) {
        Some(MoveDir::Right)
    } else {
        None
    }
}
