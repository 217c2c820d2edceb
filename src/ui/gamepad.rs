/// Gamepad input tracker using gilrs.
///
/// Each D-pad or left-stick press counts as one move, like a key press.
/// The quit button list is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Movement
///   Select                →  Quit

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::position::MoveDir;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical face/menu button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South        => Some(Btn::A),
            Button::East         => Some(Btn::B),
            Button::West         => Some(Btn::X),
            Button::North        => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start        => Some(Btn::Start),
            Button::Select       => Some(Btn::Select),
            _ => None,
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Moves pressed since the last `update()`, in order.
    moves: Vec<MoveDir>,
    /// Buttons pressed since the last `update()`.
    pressed: Vec<Btn>,

    // Stick direction currently held, for edge detection.
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_dir: Option<MoveDir>,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_x: f32,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_y: f32,

    quit_buttons: Vec<Btn>,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(e) => {
                    log::warn!("gamepad support unavailable: {e}");
                    (None, false)
                }
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        let mut state = GamepadState::offline();
        #[cfg(feature = "gamepad")]
        {
            state.gilrs = gilrs_opt;
        }
        state.connected = connected;
        state
    }

    /// State with no backend attached; never reports input on its own.
    fn offline() -> Self {
        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: None,
            moves: Vec::with_capacity(4),
            pressed: Vec::with_capacity(4),
            stick_dir: None,
            stick_x: 0.0,
            stick_y: 0.0,
            quit_buttons: vec![Btn::Select],
            connected: false,
        }
    }

    /// Load button mapping from config. An empty or unrecognized list keeps the default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        let quit: Vec<Btn> = cfg.quit.iter().filter_map(|s| Btn::from_name(s)).collect();
        if !quit.is_empty() {
            self.quit_buttons = quit;
        }
    }

    pub fn update(&mut self) {
        self.moves.clear();
        self.pressed.clear();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.press_button(btn);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                    self.update_stick();
                }
                EventType::Connected => { self.connected = true; }
                EventType::Disconnected => {
                    self.connected = false;
                    self.stick_dir = None;
                    self.stick_x = 0.0;
                    self.stick_y = 0.0;
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn press_button(&mut self, gilrs_btn: Button) {
        let dir = match gilrs_btn {
            Button::DPadUp    => Some(MoveDir::Up),
            Button::DPadDown  => Some(MoveDir::Down),
            Button::DPadLeft  => Some(MoveDir::Left),
            Button::DPadRight => Some(MoveDir::Right),
            _ => None,
        };
        if let Some(d) = dir {
            self.moves.push(d);
        } else if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.pressed.push(btn);
        }
    }

    /// A stick move fires once when it crosses the deadzone, not while held.
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn update_stick(&mut self) {
        let dir = stick_direction(self.stick_x, self.stick_y);
        if dir.is_some() && dir != self.stick_dir {
            self.moves.extend(dir);
        }
        self.stick_dir = dir;
    }

    // ── Action queries ──

    pub fn moves(&self) -> &[MoveDir] {
        &self.moves
    }

    pub fn quit_pressed(&self) -> bool {
        self.pressed.iter().any(|b| self.quit_buttons.contains(b))
    }
}

/// Dominant stick axis beyond the deadzone. gilrs reports +Y as up.
#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
fn stick_direction(x: f32, y: f32) -> Option<MoveDir> {
    if x.abs() < STICK_DEADZONE && y.abs() < STICK_DEADZONE {
        None
    } else if y.abs() >= x.abs() {
        Some(if y > 0.0 { MoveDir::Up } else { MoveDir::Down })
    } else {
        Some(if x > 0.0 { MoveDir::Right } else { MoveDir::Left })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_names_are_case_insensitive() {
        assert_eq!(Btn::from_name("select"), Some(Btn::Select));
        assert_eq!(Btn::from_name("Back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("south"), Some(Btn::A));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn stick_direction_uses_dominant_axis() {
        assert_eq!(stick_direction(0.1, 0.1), None);
        assert_eq!(stick_direction(0.9, 0.3), Some(MoveDir::Right));
        assert_eq!(stick_direction(-0.9, 0.3), Some(MoveDir::Left));
        assert_eq!(stick_direction(0.2, 0.8), Some(MoveDir::Up));
        assert_eq!(stick_direction(0.2, -0.8), Some(MoveDir::Down));
    }

    #[test]
    fn held_stick_moves_once() {
        let mut gp = GamepadState::offline();
        gp.moves.clear();
        gp.stick_x = 0.9;
        gp.update_stick();
        gp.update_stick();
        assert_eq!(gp.moves(), &[MoveDir::Right]);

        gp.stick_x = 0.0;
        gp.update_stick();
        gp.stick_x = 0.9;
        gp.update_stick();
        assert_eq!(gp.moves(), &[MoveDir::Right, MoveDir::Right]);
    }

    #[test]
    fn quit_mapping_from_config() {
        let mut gp = GamepadState::offline();
        gp.load_button_config(&GamepadConfig { quit: vec!["Start".into(), "bogus".into()] });
        gp.pressed.push(Btn::Select);
        assert!(!gp.quit_pressed());
        gp.pressed.push(Btn::Start);
        assert!(gp.quit_pressed());

        // Unrecognized names keep the current mapping.
        gp.load_button_config(&GamepadConfig { quit: vec!["bogus".into()] });
        assert!(gp.quit_pressed());
    }
}
