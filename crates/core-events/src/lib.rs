//! Event types and listener plumbing for the runtime core.
//!
//! Events arrive from the host's event pump as a tagged variant. Listeners
//! observe them in priority order; a listener that handles an event
//! *consumes* it by replacing it with the [`Event::None`] sentinel, which
//! downstream listeners ignore. The frontmost long operation is effectively
//! the highest-priority listener via its `on_event` hook in the machine.
//!
//! The core also latches a small set of process-wide input states from the
//! stream (modifier keys, mouse position and button phases) so operations
//! can poll them between events.

use core_model::Point;
use std::fmt;

bitflags::bitflags! {
    /// Modifier keys tracked by the latched input state.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct ModMask: u8 {
        const SHIFT = 0b0000_0001;
        const CTRL  = 0b0000_0010;
    }
}

/// Key identities the core cares about. The host maps its native key
/// symbols into these before queueing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Return,
    Space,
    Escape,
    Up,
    Down,
    Left,
    Right,
    LeftCtrl,
    RightCtrl,
    LeftShift,
    RightShift,
    Char(char),
}

impl KeyCode {
    pub fn is_ctrl(self) -> bool {
        matches!(self, KeyCode::LeftCtrl | KeyCode::RightCtrl)
    }

    pub fn is_shift(self) -> bool {
        matches!(self, KeyCode::LeftShift | KeyCode::RightShift)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    WheelUp,
    WheelDown,
}

/// The event variant delivered to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Event {
    /// Consumed sentinel; listeners must ignore it.
    #[default]
    None,
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    MouseDown(MouseButton),
    MouseUp(MouseButton),
    MouseMotion(Point),
    /// Window activation change; carries whether the mouse is inside.
    Active { mouse_inside_window: bool },
}

impl Event {
    pub fn is_none(&self) -> bool {
        matches!(self, Event::None)
    }

    /// Mark the event consumed so later listeners skip it.
    pub fn consume(&mut self) {
        *self = Event::None;
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A prioritized event observer. Smaller numbers run earlier.
pub trait EventListener {
    fn on_event(&mut self, event: &mut Event);
}

/// Phase of a latched mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonPhase {
    #[default]
    Idle,
    Pressed,
    PressedAndReleased,
}

impl ButtonPhase {
    /// Numeric form exposed to bytecode (0 / 1 / 2).
    pub fn as_int(self) -> i32 {
        match self {
            ButtonPhase::Idle => 0,
            ButtonPhase::Pressed => 1,
            ButtonPhase::PressedAndReleased => 2,
        }
    }
}

/// Process-wide input states latched from the event stream.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub modifiers: ModMask,
    pub mouse_inside_window: bool,
    pub mouse_pos: Point,
    /// Tick of the most recent mouse motion; `None` before any motion.
    pub last_mouse_move: Option<u64>,
    pub left_button: ButtonPhase,
    pub right_button: ButtonPhase,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            mouse_inside_window: true,
            ..Self::default()
        }
    }

    /// Observe an event before listener fan-out. `now` is the current tick.
    pub fn latch(&mut self, event: &Event, now: u64) {
        match event {
            Event::KeyDown(code) => {
                if code.is_ctrl() {
                    self.modifiers.insert(ModMask::CTRL);
                }
                if code.is_shift() {
                    self.modifiers.insert(ModMask::SHIFT);
                }
            }
            Event::KeyUp(code) => {
                if code.is_ctrl() {
                    self.modifiers.remove(ModMask::CTRL);
                }
                if code.is_shift() {
                    self.modifiers.remove(ModMask::SHIFT);
                }
            }
            Event::MouseDown(button) => match button {
                MouseButton::Left => self.left_button = ButtonPhase::Pressed,
                MouseButton::Right => self.right_button = ButtonPhase::Pressed,
                _ => {}
            },
            Event::MouseUp(button) => {
                let phase = match button {
                    MouseButton::Left => Some(&mut self.left_button),
                    MouseButton::Right => Some(&mut self.right_button),
                    _ => None,
                };
                if let Some(phase) = phase {
                    if *phase == ButtonPhase::Pressed {
                        *phase = ButtonPhase::PressedAndReleased;
                    }
                }
            }
            Event::MouseMotion(pos) => {
                self.mouse_pos = *pos;
                self.last_mouse_move = Some(now);
            }
            Event::Active {
                mouse_inside_window,
            } => {
                self.mouse_inside_window = *mouse_inside_window;
            }
            Event::None => {}
        }
    }

    pub fn ctrl_pressed(&self) -> bool {
        self.modifiers.contains(ModMask::CTRL)
    }

    pub fn shift_pressed(&self) -> bool {
        self.modifiers.contains(ModMask::SHIFT)
    }

    /// Zero both latched button phases (the `FlushMouseClicks` operation).
    pub fn flush_mouse_clicks(&mut self) {
        self.left_button = ButtonPhase::Idle;
        self.right_button = ButtonPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_latching_tracks_down_and_up() {
        let mut state = InputState::new();
        state.latch(&Event::KeyDown(KeyCode::LeftCtrl), 0);
        assert!(state.ctrl_pressed());
        state.latch(&Event::KeyUp(KeyCode::LeftCtrl), 1);
        assert!(!state.ctrl_pressed());
    }

    #[test]
    fn button_phase_progression() {
        let mut state = InputState::new();
        assert_eq!(state.left_button.as_int(), 0);
        state.latch(&Event::MouseDown(MouseButton::Left), 0);
        assert_eq!(state.left_button.as_int(), 1);
        state.latch(&Event::MouseUp(MouseButton::Left), 1);
        assert_eq!(state.left_button.as_int(), 2);

        // A release with no prior press does not fabricate a click.
        state.flush_mouse_clicks();
        state.latch(&Event::MouseUp(MouseButton::Left), 2);
        assert_eq!(state.left_button.as_int(), 0);
    }

    #[test]
    fn motion_updates_position_and_move_tick() {
        let mut state = InputState::new();
        assert_eq!(state.last_mouse_move, None);
        state.latch(&Event::MouseMotion(Point::new(10, 20)), 555);
        assert_eq!(state.mouse_pos, Point::new(10, 20));
        assert_eq!(state.last_mouse_move, Some(555));
    }

    #[test]
    fn consumed_events_read_as_none() {
        let mut event = Event::KeyDown(KeyCode::Return);
        assert!(!event.is_none());
        event.consume();
        assert!(event.is_none());
    }
}
