//! Keyboard command surface.
//!
//! Each hotkey maps to one [`Command`], which maps 1:1 onto an engine
//! operation. Held inputs (the `c` key and the left mouse button) are not
//! commands; they select the drag target through [`drag_target`].

use glam::Vec2;

use crate::engine::Engine;
use crate::input::{Input, KeyCode, KeyPress, MouseButton};

/// One-shot actions triggered by a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `x`: explosion at the canvas centre.
    ExplodeCenter,
    /// `X`: explosion at the last pointer position.
    ExplodeAtPointer,
    /// `r`: respawn a filled disk.
    RespawnFilled,
    /// `e`: respawn a hollow ring.
    RespawnEmpty,
    /// `1`-`9`: place that many heavy particles.
    HeavyParticles(usize),
    /// `d`: remove all heavy particles.
    ClearHeavyParticles,
    /// `p`: pause or resume stepping.
    TogglePause,
    /// `s`: zero every velocity.
    Stop,
}

/// What the caller has to do after a command ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// The command was rejected by the engine; state is unchanged.
    Rejected,
    /// Pausing is owned by the frame clock, not the engine.
    TogglePause,
}

impl Command {
    /// Map a key press to a command.
    pub fn from_press(press: KeyPress) -> Option<Self> {
        match press.key {
            KeyCode::X if press.shift => Some(Command::ExplodeAtPointer),
            KeyCode::X => Some(Command::ExplodeCenter),
            KeyCode::R => Some(Command::RespawnFilled),
            KeyCode::E => Some(Command::RespawnEmpty),
            KeyCode::D => Some(Command::ClearHeavyParticles),
            KeyCode::P => Some(Command::TogglePause),
            KeyCode::S => Some(Command::Stop),
            KeyCode::Digit(d) if d >= 1 => Some(Command::HeavyParticles(d as usize)),
            _ => None,
        }
    }

    /// Run the command against `engine`. `pointer` is in canvas units.
    pub fn execute(self, engine: &mut Engine, pointer: Vec2) -> Outcome {
        log::debug!("command {:?}", self);
        let center = engine.canvas().center();
        let config = engine.config();
        let strength = config.explosion_strength;
        let radius = config.spawn_radius;
        let ring_width = config.ring_width;

        match self {
            Command::ExplodeCenter => engine.explode(center, strength),
            Command::ExplodeAtPointer => engine.explode(pointer, strength),
            Command::RespawnFilled => engine.respawn_filled(center, radius),
            Command::RespawnEmpty => engine.respawn_empty(center, radius, ring_width),
            Command::HeavyParticles(k) => {
                if engine.set_heavy_particles(k).is_err() {
                    return Outcome::Rejected;
                }
            }
            Command::ClearHeavyParticles => engine.clear_heavy_particles(),
            Command::TogglePause => return Outcome::TogglePause,
            Command::Stop => engine.stop(),
        }
        Outcome::Done
    }
}

/// Current drag target: the pointer while the left button is held,
/// otherwise the canvas centre while `c` is held.
pub fn drag_target(input: &Input, canvas_center: Vec2) -> Option<Vec2> {
    if input.mouse_held(MouseButton::Left) {
        Some(input.pointer())
    } else if input.key_held(KeyCode::C) {
        Some(canvas_center)
    } else {
        None
    }
}

/// A row of the hotkey cheat sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hotkey {
    pub keys: &'static str,
    pub description: &'static str,
}

/// Every hotkey and what it does.
pub const HOTKEYS: &[Hotkey] = &[
    Hotkey { keys: "x", description: "explosion at the centre of the screen" },
    Hotkey { keys: "X", description: "explosion at the mouse position" },
    Hotkey { keys: "r", description: "respawn particles as a filled circle" },
    Hotkey { keys: "e", description: "respawn particles as a hollow ring" },
    Hotkey {
        keys: "1-9",
        description: "place N invisible heavy particles on the corners of a regular N-gon around the centre",
    },
    Hotkey { keys: "d", description: "remove all heavy particles" },
    Hotkey { keys: "c", description: "while held, drag every particle towards the centre" },
    Hotkey { keys: "LMB", description: "while held, drag every particle towards the cursor" },
    Hotkey { keys: "p", description: "pause; the motion blur trail stays on screen" },
    Hotkey { keys: "s", description: "stop every particle in place" },
];

/// Log the cheat sheet at `info` level.
pub fn log_hotkeys() {
    for hotkey in HOTKEYS {
        log::info!("{:>4}  {}", hotkey.keys, hotkey.description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Canvas, SimConfig};
    use crate::output::ChannelLayout;
    use crate::spawn::SpawnContext;

    fn press(key: KeyCode, shift: bool) -> Option<Command> {
        Command::from_press(KeyPress { key, shift })
    }

    fn engine() -> Engine {
        let mut e = Engine::with_spawner(
            SimConfig::default(),
            Canvas::new(800.0, 600.0),
            ChannelLayout::PositionOpacity,
            SpawnContext::from_seed(4),
        )
        .unwrap();
        e.resize(100).unwrap();
        e
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(press(KeyCode::X, false), Some(Command::ExplodeCenter));
        assert_eq!(press(KeyCode::X, true), Some(Command::ExplodeAtPointer));
        assert_eq!(press(KeyCode::R, false), Some(Command::RespawnFilled));
        assert_eq!(press(KeyCode::E, false), Some(Command::RespawnEmpty));
        assert_eq!(press(KeyCode::D, false), Some(Command::ClearHeavyParticles));
        assert_eq!(press(KeyCode::P, false), Some(Command::TogglePause));
        assert_eq!(press(KeyCode::S, false), Some(Command::Stop));
        assert_eq!(press(KeyCode::Digit(4), false), Some(Command::HeavyParticles(4)));
        assert_eq!(press(KeyCode::Digit(0), false), None);
        assert_eq!(press(KeyCode::C, false), None);
    }

    #[test]
    fn test_heavy_command() {
        let mut e = engine();
        assert_eq!(Command::HeavyParticles(3).execute(&mut e, Vec2::ZERO), Outcome::Done);
        assert_eq!(e.heavy_particles().len(), 3);
        Command::ClearHeavyParticles.execute(&mut e, Vec2::ZERO);
        assert!(e.heavy_particles().is_empty());
    }

    #[test]
    fn test_explode_at_pointer() {
        let mut e = engine();
        e.stop();
        let pointer = Vec2::new(-1000.0, 300.0);
        Command::ExplodeAtPointer.execute(&mut e, pointer);
        // every particle lies to the right of the pointer
        assert!(e.particles().iter().all(|p| p.velocity.x > 0.0));
    }

    #[test]
    fn test_respawn_empty_uses_ring() {
        let mut e = engine();
        Command::RespawnEmpty.execute(&mut e, Vec2::ZERO);
        let center = e.canvas().center();
        let r = e.config().spawn_radius;
        let half = e.config().ring_width / 2.0;
        for p in e.particles() {
            let d = p.position.distance(center);
            assert!(d >= r - half - 1e-3 && d <= r + half + 1e-3);
        }
    }

    #[test]
    fn test_pause_is_left_to_caller() {
        let mut e = engine();
        assert_eq!(Command::TogglePause.execute(&mut e, Vec2::ZERO), Outcome::TogglePause);
    }

    #[test]
    fn test_drag_target_priority() {
        let mut input = Input::new((800, 600), Vec2::new(800.0, 600.0));
        let center = Vec2::new(400.0, 300.0);
        assert_eq!(drag_target(&input, center), None);

        input.press(KeyCode::C);
        assert_eq!(drag_target(&input, center), Some(center));
    }

    #[test]
    fn test_hotkeys_cover_commands() {
        for keys in ["x", "X", "r", "e", "1-9", "d", "c", "LMB", "p", "s"] {
            assert!(HOTKEYS.iter().any(|h| h.keys == keys), "missing {keys}");
        }
    }
}
