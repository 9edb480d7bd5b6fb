use crate::longop::LongOperation;
use crate::machine::Machine;
use core_events::{Event, MouseButton};
use core_model::{Point, RuntimeResult};
use core_object::{GraphicsObject, Layer};

/// Hit test against one button object. Supplied by the host because pixel
/// extents live with the renderer; tests use plain rectangles.
pub type ButtonHitTest = Box<dyn Fn(&GraphicsObject, Point) -> bool>;

/// Override frames published on the button parameter while interacting.
const BUTTON_STATE_NORMAL: i32 = 0;
const BUTTON_STATE_HIT: i32 = 1;
const BUTTON_STATE_PUSHED: i32 = 2;

/// Modal loop over the foreground objects marked as buttons in one group:
/// hovering publishes "hit" override frames, a left-click release over a
/// button returns its number, a right-click release returns −1 when
/// cancellable.
pub struct ButtonObjectSelectLongOperation {
    group: i32,
    cancellable: bool,
    hit_test: ButtonHitTest,
    result: Option<i32>,
    pressed_object: Option<usize>,
}

impl ButtonObjectSelectLongOperation {
    pub fn new(group: i32, cancellable: bool, hit_test: ButtonHitTest) -> Self {
        Self {
            group,
            cancellable,
            hit_test,
            result: None,
            pressed_object: None,
        }
    }

    fn group_members(&self, machine: &Machine) -> Vec<usize> {
        machine
            .graphics
            .layers
            .allocated(Layer::Foreground)
            .filter(|(_, object)| {
                object.params.button.is_button && object.params.button.group == self.group
            })
            .map(|(index, _)| index)
            .collect()
    }

    fn object_under(&self, machine: &Machine, pos: Point) -> Option<usize> {
        self.group_members(machine).into_iter().find(|&index| {
            machine
                .graphics
                .layers
                .object(Layer::Foreground, index)
                .is_some_and(|object| (self.hit_test)(object, pos))
        })
    }

    fn publish_states(&self, machine: &mut Machine, hovered: Option<usize>) {
        for index in self.group_members(machine) {
            let state = if Some(index) == self.pressed_object {
                BUTTON_STATE_PUSHED
            } else if Some(index) == hovered {
                BUTTON_STATE_HIT
            } else {
                BUTTON_STATE_NORMAL
            };
            if let Ok(object) = machine
                .graphics
                .layers
                .object_mut(Layer::Foreground, index)
            {
                object.params.button.state = state;
            }
        }
    }
}

impl LongOperation for ButtonObjectSelectLongOperation {
    fn step(&mut self, machine: &mut Machine) -> RuntimeResult<bool> {
        if let Some(result) = self.result {
            // Clear override frames before handing back control.
            self.pressed_object = None;
            self.publish_states(machine, None);
            machine.set_store_register_value(result);
            return Ok(true);
        }
        Ok(false)
    }

    fn on_event(&mut self, machine: &mut Machine, event: &mut Event) {
        match *event {
            Event::MouseMotion(pos) => {
                let hovered = self.object_under(machine, pos);
                self.publish_states(machine, hovered);
            }
            Event::MouseDown(MouseButton::Left) => {
                let pos = machine.input().mouse_pos;
                self.pressed_object = self.object_under(machine, pos);
                self.publish_states(machine, self.pressed_object);
                event.consume();
            }
            Event::MouseUp(MouseButton::Left) => {
                let pos = machine.input().mouse_pos;
                if let Some(index) = self.object_under(machine, pos) {
                    let number = machine
                        .graphics
                        .layers
                        .object(Layer::Foreground, index)
                        .map(|object| object.params.button.button_number)
                        .unwrap_or(index as i32);
                    self.result = Some(number);
                }
                self.pressed_object = None;
                event.consume();
            }
            Event::MouseUp(MouseButton::Right) => {
                if self.cancellable {
                    self.result = Some(-1);
                }
                event.consume();
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "ButtonObjectSelectLongOperation"
    }
}
