use crate::longop::LongOperation;
use crate::machine::Machine;
use core_events::{Event, KeyCode, MouseButton};
use core_model::RuntimeResult;

/// Milliseconds of mouse stillness required before the auto-mode timer
/// may advance, so the user can aim at a button without the page turning
/// under them.
const AUTO_MODE_MOUSE_GRACE_MS: u64 = 2000;

/// Pause at a text stop: waits for advance input, or for the auto-mode
/// timer derived from the current page's character count.
pub struct PauseLongOperation {
    automode_time: u64,
    time_at_last_pass: u64,
    total_time: u64,
    is_done: bool,
}

impl PauseLongOperation {
    pub fn new(machine: &mut Machine) -> Self {
        let chars = machine.text().page_ref().number_of_chars_on_page();
        let automode_time = machine.text().auto_time(chars) as u64;
        let now = machine.now();
        machine.text_mut().set_in_pause_state(true);
        Self {
            automode_time,
            time_at_last_pass: now,
            total_time: 0,
            is_done: false,
        }
    }

    fn automode_timer_fired(&mut self, machine: &Machine) -> bool {
        let now = machine.now();
        let time_since_last_pass = now.saturating_sub(self.time_at_last_pass);
        self.time_at_last_pass = now;

        // Only advance while the mouse has been still; recent motion means
        // the user is interacting with the screen.
        let mouse_recent = matches!(
            machine.input().last_mouse_move,
            Some(moved) if moved + AUTO_MODE_MOUSE_GRACE_MS > now
        );
        if !mouse_recent {
            self.total_time += time_since_last_pass;
            return self.total_time >= self.automode_time;
        }
        false
    }
}

impl LongOperation for PauseLongOperation {
    fn step(&mut self, machine: &mut Machine) -> RuntimeResult<bool> {
        if machine.text().globals().auto_mode
            && self.automode_timer_fired(machine)
            && !machine.sound().koe_playing()
        {
            self.is_done = true;
        }

        if machine.should_fast_forward() {
            self.is_done = true;
        }

        if self.is_done {
            // Stop any playing voice before continuing.
            machine.sound_mut().koe_stop();
            machine.text_mut().set_in_pause_state(false);
        }
        Ok(self.is_done)
    }

    fn on_event(&mut self, machine: &mut Machine, event: &mut Event) {
        match *event {
            Event::MouseUp(MouseButton::Left) => {
                // Respond on release only; a press that hides the
                // interface must not also advance the page.
                if machine.graphics.interface_hidden {
                    machine.graphics.interface_hidden = false;
                } else {
                    self.is_done = true;
                }
                event.consume();
            }
            Event::KeyDown(code) => {
                let handled = if machine.graphics.interface_hidden {
                    machine.graphics.interface_hidden = false;
                    true
                } else if code.is_ctrl() && machine.text().globals().ctrl_key_skip {
                    self.is_done = true;
                    true
                } else if code == KeyCode::Space {
                    machine.graphics.interface_hidden = true;
                    true
                } else if code == KeyCode::Return {
                    self.is_done = true;
                    true
                } else {
                    false
                };
                if handled {
                    event.consume();
                }
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "PauseLongOperation"
    }
}
