use crate::longop::LongOperation;
use crate::machine::Machine;
use core_config::SelBtnConfig;
use core_events::{Event, MouseButton};
use core_model::{Point, Rect, RuntimeResult};

/// One choice offered to the user.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub text: String,
    pub enabled: bool,
}

/// Textual selection: installs selection mode on the active text window,
/// pushes each visible option with its callback index, and waits for the
/// collaborator to report a chosen index, which lands in the store
/// register.
pub struct SelectLongOperation {
    options: Vec<SelectOption>,
    installed: bool,
}

impl SelectLongOperation {
    pub fn new(options: Vec<SelectOption>) -> Self {
        Self {
            options,
            installed: false,
        }
    }

    fn install(&mut self, machine: &mut Machine) {
        machine.text_mut().set_in_selection_mode(true);
        for (index, option) in self.options.iter().enumerate() {
            if option.enabled {
                machine.text_mut().add_selection_item(&option.text, index);
            }
        }
        self.installed = true;
    }
}

impl LongOperation for SelectLongOperation {
    fn step(&mut self, machine: &mut Machine) -> RuntimeResult<bool> {
        if !self.installed {
            self.install(machine);
        }
        if let Some(chosen) = machine.text().selected_option() {
            machine.set_store_register_value(chosen as i32);
            machine.text_mut().set_in_selection_mode(false);
            return Ok(true);
        }
        Ok(false)
    }

    fn name(&self) -> &'static str {
        "SelectLongOperation"
    }
}

/// Hover state of one laid-out selection button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ButtonState {
    Normal,
    Hover,
    Pressed,
    Disabled,
}

struct LaidOutButton {
    area: Rect,
    option_index: usize,
    state: ButtonState,
}

/// Graphical selection: option buttons laid out per `SELBTN` configuration
/// with normal/hover/pressed/disabled frames; clicks map to option
/// indices.
pub struct SelectBtnLongOperation {
    buttons: Vec<LaidOutButton>,
    /// Pattern indices for the four button states, from configuration.
    frames: [i32; 4],
    chosen: Option<i32>,
    cancellable: bool,
}

impl SelectBtnLongOperation {
    /// Height fallback for configurations that omit a vertical step.
    const DEFAULT_ROW_HEIGHT: i32 = 40;
    /// Button width is renderer-determined; the core tracks a hit band.
    const ROW_WIDTH: i32 = 400;

    pub fn new(config: &SelBtnConfig, options: &[SelectOption], cancellable: bool) -> Self {
        let row_height = if config.step_y > 0 {
            config.step_y
        } else {
            Self::DEFAULT_ROW_HEIGHT
        };
        let buttons = options
            .iter()
            .enumerate()
            .map(|(index, option)| LaidOutButton {
                area: Rect::rec(
                    config.base_x,
                    config.base_y + index as i32 * row_height,
                    Self::ROW_WIDTH,
                    row_height,
                ),
                option_index: index,
                state: if option.enabled {
                    ButtonState::Normal
                } else {
                    ButtonState::Disabled
                },
            })
            .collect();
        Self {
            buttons,
            frames: config.frames,
            chosen: None,
            cancellable,
        }
    }

    /// Pattern number currently shown for an option's button.
    pub fn frame_for(&self, option_index: usize) -> i32 {
        let state = self
            .buttons
            .iter()
            .find(|button| button.option_index == option_index)
            .map(|button| button.state)
            .unwrap_or(ButtonState::Disabled);
        match state {
            ButtonState::Normal => self.frames[0],
            ButtonState::Hover => self.frames[1],
            ButtonState::Pressed => self.frames[2],
            ButtonState::Disabled => self.frames[3],
        }
    }

    fn update_hover(&mut self, pos: Point) {
        for button in &mut self.buttons {
            if button.state == ButtonState::Disabled {
                continue;
            }
            let inside = button.area.contains(pos);
            button.state = match (inside, button.state) {
                (true, ButtonState::Pressed) => ButtonState::Pressed,
                (true, _) => ButtonState::Hover,
                (false, _) => ButtonState::Normal,
            };
        }
    }

    fn hit(&self, pos: Point) -> Option<usize> {
        self.buttons
            .iter()
            .find(|button| button.state != ButtonState::Disabled && button.area.contains(pos))
            .map(|button| button.option_index)
    }
}

impl LongOperation for SelectBtnLongOperation {
    fn step(&mut self, machine: &mut Machine) -> RuntimeResult<bool> {
        if let Some(chosen) = self.chosen {
            machine.set_store_register_value(chosen);
            return Ok(true);
        }
        Ok(false)
    }

    fn on_event(&mut self, machine: &mut Machine, event: &mut Event) {
        match *event {
            Event::MouseMotion(pos) => {
                self.update_hover(pos);
            }
            Event::MouseDown(MouseButton::Left) => {
                let pos = machine.input().mouse_pos;
                for button in &mut self.buttons {
                    if button.state != ButtonState::Disabled && button.area.contains(pos) {
                        button.state = ButtonState::Pressed;
                    }
                }
                event.consume();
            }
            Event::MouseUp(MouseButton::Left) => {
                let pos = machine.input().mouse_pos;
                if let Some(index) = self.hit(pos) {
                    self.chosen = Some(index as i32);
                }
                event.consume();
            }
            Event::MouseUp(MouseButton::Right) if self.cancellable => {
                self.chosen = Some(-1);
                event.consume();
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "SelectBtnLongOperation"
    }
}
