//! Input handling.
//!
//! [`Input`] turns raw window events into the state the command layer
//! needs: keys pressed this frame (in arrival order), keys and buttons
//! currently held, and the pointer position in canvas coordinates.

use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton as WinitMouseButton, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    fn from_winit(btn: WinitMouseButton) -> Option<Self> {
        match btn {
            WinitMouseButton::Left => Some(MouseButton::Left),
            WinitMouseButton::Right => Some(MouseButton::Right),
            WinitMouseButton::Middle => Some(MouseButton::Middle),
            _ => None,
        }
    }
}

/// Keys the session reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    C,
    D,
    E,
    P,
    R,
    S,
    X,
    /// Digit row `0`-`9`.
    Digit(u8),
    Shift,
    Escape,
    Other,
}

impl KeyCode {
    /// Numeric value of a digit key.
    pub fn digit(self) -> Option<u8> {
        match self {
            KeyCode::Digit(d) => Some(d),
            _ => None,
        }
    }
}

impl From<WinitKeyCode> for KeyCode {
    fn from(key: WinitKeyCode) -> Self {
        match key {
            WinitKeyCode::KeyC => KeyCode::C,
            WinitKeyCode::KeyD => KeyCode::D,
            WinitKeyCode::KeyE => KeyCode::E,
            WinitKeyCode::KeyP => KeyCode::P,
            WinitKeyCode::KeyR => KeyCode::R,
            WinitKeyCode::KeyS => KeyCode::S,
            WinitKeyCode::KeyX => KeyCode::X,

            WinitKeyCode::Digit0 | WinitKeyCode::Numpad0 => KeyCode::Digit(0),
            WinitKeyCode::Digit1 | WinitKeyCode::Numpad1 => KeyCode::Digit(1),
            WinitKeyCode::Digit2 | WinitKeyCode::Numpad2 => KeyCode::Digit(2),
            WinitKeyCode::Digit3 | WinitKeyCode::Numpad3 => KeyCode::Digit(3),
            WinitKeyCode::Digit4 | WinitKeyCode::Numpad4 => KeyCode::Digit(4),
            WinitKeyCode::Digit5 | WinitKeyCode::Numpad5 => KeyCode::Digit(5),
            WinitKeyCode::Digit6 | WinitKeyCode::Numpad6 => KeyCode::Digit(6),
            WinitKeyCode::Digit7 | WinitKeyCode::Numpad7 => KeyCode::Digit(7),
            WinitKeyCode::Digit8 | WinitKeyCode::Numpad8 => KeyCode::Digit(8),
            WinitKeyCode::Digit9 | WinitKeyCode::Numpad9 => KeyCode::Digit(9),

            WinitKeyCode::ShiftLeft | WinitKeyCode::ShiftRight => KeyCode::Shift,
            WinitKeyCode::Escape => KeyCode::Escape,
            _ => KeyCode::Other,
        }
    }
}

/// A key that went down this frame, with the Shift state at that moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: KeyCode,
    pub shift: bool,
}

/// Keyboard and mouse state.
#[derive(Debug, Default)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    keys_pressed: Vec<KeyPress>,
    mouse_held: HashSet<MouseButton>,
    /// Pointer in canvas units, origin bottom-left.
    pointer: Vec2,
    /// Window size in physical pixels.
    window_size: (u32, u32),
    /// Canvas size in simulation units.
    canvas_size: Vec2,
}

impl Input {
    pub fn new(window_size: (u32, u32), canvas_size: Vec2) -> Self {
        Self {
            window_size,
            canvas_size,
            pointer: canvas_size * 0.5,
            ..Default::default()
        }
    }

    // ========== Key Queries ==========

    /// Keys that went down since the last [`Input::begin_frame`], oldest first.
    pub fn pressed(&self) -> &[KeyPress] {
        &self.keys_pressed
    }

    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn shift_held(&self) -> bool {
        self.key_held(KeyCode::Shift)
    }

    // ========== Mouse Queries ==========

    pub fn mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    /// Last pointer position in canvas coordinates.
    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    // ========== Frame bookkeeping ==========

    /// Clear per-frame state. Held keys and buttons persist.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
    }

    /// Update sizes after a window resize.
    pub fn set_sizes(&mut self, window_size: (u32, u32), canvas_size: Vec2) {
        self.window_size = window_size;
        self.canvas_size = canvas_size;
    }

    /// Forget held state, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.keys_held.clear();
        self.mouse_held.clear();
    }

    /// Map a physical cursor position to canvas coordinates (Y up).
    pub fn window_to_canvas(&self, x: f64, y: f64) -> Vec2 {
        let (w, h) = self.window_size;
        if w == 0 || h == 0 {
            return self.pointer;
        }
        let fx = x as f32 / w as f32;
        let fy = y as f32 / h as f32;
        Vec2::new(fx * self.canvas_size.x, (1.0 - fy) * self.canvas_size.y)
    }

    pub(crate) fn press(&mut self, key: KeyCode) {
        // auto-repeat shows up as repeated presses of a held key
        if self.keys_held.insert(key) {
            let shift = self.shift_held();
            self.keys_pressed.push(KeyPress { key, shift });
        }
    }

    pub(crate) fn release(&mut self, key: KeyCode) {
        self.keys_held.remove(&key);
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    let key = KeyCode::from(code);
                    match event.state {
                        ElementState::Pressed => self.press(key),
                        ElementState::Released => self.release(key),
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(btn) = MouseButton::from_winit(*button) {
                    match state {
                        ElementState::Pressed => {
                            self.mouse_held.insert(btn);
                        }
                        ElementState::Released => {
                            self.mouse_held.remove(&btn);
                        }
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.pointer = self.window_to_canvas(position.x, position.y);
            }

            WindowEvent::Focused(false) => self.release_all(),

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_state() {
        let mut input = Input::new((800, 600), Vec2::new(800.0, 600.0));
        assert!(!input.key_held(KeyCode::C));

        input.press(KeyCode::C);
        assert!(input.key_held(KeyCode::C));
        assert_eq!(input.pressed().len(), 1);

        // a repeat while held is not a new press
        input.press(KeyCode::C);
        assert_eq!(input.pressed().len(), 1);

        input.begin_frame();
        assert!(input.key_held(KeyCode::C));
        assert!(input.pressed().is_empty());

        input.release(KeyCode::C);
        assert!(!input.key_held(KeyCode::C));
    }

    #[test]
    fn test_shift_recorded_with_press() {
        let mut input = Input::new((800, 600), Vec2::new(800.0, 600.0));
        input.press(KeyCode::Shift);
        input.press(KeyCode::X);
        let last = input.pressed().last().copied().unwrap();
        assert_eq!(last, KeyPress { key: KeyCode::X, shift: true });
    }

    #[test]
    fn test_window_to_canvas_flips_y() {
        let input = Input::new((1600, 1200), Vec2::new(800.0, 600.0));
        assert_eq!(input.window_to_canvas(0.0, 0.0), Vec2::new(0.0, 600.0));
        assert_eq!(input.window_to_canvas(800.0, 600.0), Vec2::new(400.0, 300.0));
        assert_eq!(input.window_to_canvas(1600.0, 1200.0), Vec2::new(800.0, 0.0));
    }

    #[test]
    fn test_digit() {
        assert_eq!(KeyCode::from(WinitKeyCode::Digit7).digit(), Some(7));
        assert_eq!(KeyCode::from(WinitKeyCode::KeyX).digit(), None);
    }
}
