use crate::longop::LongOperation;
use crate::machine::Machine;
use core_events::{Event, MouseButton};
use core_model::RuntimeResult;
use core_script::ReferenceCursor;

/// Scripted wait. Completion conditions OR together: deadline reached, a
/// supplied predicate fires, break-on-click got a mouse button, or
/// break-on-ctrl observed a Ctrl press. On click-break the store register
/// receives +1 (left) or −1 (right); on a non-click completion with
/// click-break armed it receives 0.
pub struct WaitLongOperation {
    target_time: Option<u64>,
    break_on_clicks: bool,
    button_pressed: i32,
    break_on_event: Option<Box<dyn Fn(&Machine) -> bool>>,
    break_on_ctrl: bool,
    ctrl_pressed: bool,
    save_click_location: Option<(ReferenceCursor, ReferenceCursor)>,
}

impl WaitLongOperation {
    pub fn new(machine: &Machine) -> Self {
        Self {
            target_time: None,
            break_on_clicks: false,
            button_pressed: 0,
            break_on_event: None,
            break_on_ctrl: machine.text().globals().ctrl_key_skip,
            ctrl_pressed: false,
            save_click_location: None,
        }
    }

    pub fn wait_milliseconds(mut self, machine: &Machine, time_ms: u64) -> Self {
        self.target_time = Some(machine.now() + time_ms);
        self
    }

    pub fn break_on_clicks(mut self) -> Self {
        self.break_on_clicks = true;
        self
    }

    pub fn break_on_event(mut self, predicate: impl Fn(&Machine) -> bool + 'static) -> Self {
        self.break_on_event = Some(Box::new(predicate));
        self
    }

    /// Record the cursor position into two integer references on click.
    pub fn save_click_location(mut self, x: ReferenceCursor, y: ReferenceCursor) -> Self {
        self.break_on_clicks = true;
        self.save_click_location = Some((x, y));
        self
    }

    fn record_cursor_position(&self, machine: &mut Machine) -> RuntimeResult<()> {
        if let Some((x, y)) = self.save_click_location {
            let pos = machine.input().mouse_pos;
            x.write_int(machine, pos.x)?;
            y.write_int(machine, pos.y)?;
        }
        Ok(())
    }
}

impl LongOperation for WaitLongOperation {
    fn step(&mut self, machine: &mut Machine) -> RuntimeResult<bool> {
        let mut done = self.ctrl_pressed || machine.should_fast_forward();

        if !done {
            if let Some(target) = self.target_time {
                done = machine.now() >= target;
            }
        }
        if !done {
            if let Some(predicate) = &self.break_on_event {
                done = predicate(machine);
            }
        }

        if self.break_on_clicks {
            if self.button_pressed != 0 {
                done = true;
                self.record_cursor_position(machine)?;
                machine.set_store_register_value(self.button_pressed);
            } else if done {
                self.record_cursor_position(machine)?;
                machine.set_store_register_value(0);
            }
        }

        Ok(done)
    }

    fn on_event(&mut self, _machine: &mut Machine, event: &mut Event) {
        match *event {
            Event::MouseDown(MouseButton::Left) if self.break_on_clicks => {
                self.button_pressed = 1;
                event.consume();
            }
            Event::MouseDown(MouseButton::Right) if self.break_on_clicks => {
                self.button_pressed = -1;
                event.consume();
            }
            Event::KeyDown(code) if self.break_on_ctrl && code.is_ctrl() => {
                self.ctrl_pressed = true;
                event.consume();
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "WaitLongOperation"
    }
}
