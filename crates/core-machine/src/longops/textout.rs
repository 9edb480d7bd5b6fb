use crate::longop::{AfterLongOpDecorator, LongOperation, PageFinalizer};
use crate::longops::PauseLongOperation;
use crate::machine::Machine;
use core_events::{Event, MouseButton};
use core_model::{RuntimeError, RuntimeResult};
use unicode_segmentation::UnicodeSegmentation;

/// Opening/closing brackets of a speaker-name escape; the bracketed name
/// renders as a single display unit.
const NAME_OPEN: &str = "\u{3010}";
const NAME_CLOSE: &str = "\u{3011}";

/// Typewriter text output: emits one display unit (grapheme or bracketed
/// name) every `message_speed` milliseconds, greedily under any of the
/// fast-forward modes. A full page pushes a pause wrapped in a new-page
/// finalizer and resumes on the fresh page.
pub struct TextoutLongOperation {
    graphemes: Vec<String>,
    position: usize,
    no_wait: bool,
}

impl TextoutLongOperation {
    pub fn new(machine: &Machine, text: String) -> Self {
        let graphemes = text.graphemes(true).map(str::to_string).collect();
        // Inside a ruby gloss the whole gloss renders at once.
        let no_wait = machine.text().page_ref().in_ruby_gloss();
        Self {
            graphemes,
            position: 0,
            no_wait,
        }
    }

    pub fn set_no_wait(&mut self) {
        self.no_wait = true;
    }

    fn exhausted(&self) -> bool {
        self.position >= self.graphemes.len()
    }

    fn rest_from(&self, position: usize) -> String {
        self.graphemes[position..].concat()
    }

    /// Emit the bracketed name starting at the current position as one
    /// display unit.
    fn display_name(&mut self, machine: &mut Machine) -> RuntimeResult<bool> {
        let mut end = self.position + 1;
        while end < self.graphemes.len() && self.graphemes[end] != NAME_CLOSE {
            end += 1;
        }
        if end >= self.graphemes.len() {
            return Err(RuntimeError::BadFormat(
                "opening name bracket without a closing bracket".into(),
            ));
        }

        let name = self.graphemes[self.position + 1..end].concat();
        self.position = end + 1;
        let next_char = self
            .graphemes
            .get(self.position)
            .cloned()
            .unwrap_or_default();
        machine.text_mut().page().name(&name, &next_char);
        Ok(self.exhausted())
    }

    /// Emit one display unit. Returns true when the whole string has been
    /// rendered; sets `paused` when a page break was pushed.
    fn display_one_more_character(
        &mut self,
        machine: &mut Machine,
        paused: &mut bool,
    ) -> RuntimeResult<bool> {
        if self.exhausted() {
            return Ok(true);
        }
        if self.graphemes[self.position] == NAME_OPEN {
            return self.display_name(machine);
        }

        let ch = self.graphemes[self.position].clone();
        let rest = self.rest_from(self.position + 1);
        let rendered = machine.text_mut().page().character(&ch, &rest);
        if rendered {
            self.position += 1;
        }

        if machine.text().page_ref().is_full() {
            *paused = true;
            let pause = PauseLongOperation::new(machine);
            machine.push_long_operation(Box::new(AfterLongOpDecorator::new(
                Box::new(pause),
                PageFinalizer::NewPage,
            )));
        }
        Ok(self.exhausted())
    }

    fn display_as_much_as_we_can_then_pause(
        &mut self,
        machine: &mut Machine,
    ) -> RuntimeResult<bool> {
        let mut paused = false;
        loop {
            let done = self.display_one_more_character(machine, &mut paused)?;
            if done {
                return Ok(true);
            }
            if paused {
                return Ok(false);
            }
        }
    }
}

impl LongOperation for TextoutLongOperation {
    fn step(&mut self, machine: &mut Machine) -> RuntimeResult<bool> {
        if !machine.text().system_visible() {
            return Err(RuntimeError::BadFormat(
                "textout while the text system is hidden".into(),
            ));
        }

        if self.no_wait {
            return self.display_as_much_as_we_can_then_pause(machine);
        }

        let now = machine.now();
        let elapsed = now.saturating_sub(machine.textout_pacing.time_at_last_pass);
        machine.textout_pacing.time_at_last_pass = now;

        machine.textout_pacing.next_character_countdown -= elapsed as i64;
        if machine.textout_pacing.next_character_countdown <= 0 {
            machine.textout_pacing.next_character_countdown =
                machine.text().globals().message_speed as i64;
            let mut paused = false;
            self.display_one_more_character(machine, &mut paused)
        } else {
            Ok(false)
        }
    }

    fn on_event(&mut self, _machine: &mut Machine, event: &mut Event) {
        match *event {
            // A click release drains the rest of the string immediately.
            Event::MouseUp(MouseButton::Left) => {
                self.no_wait = true;
                event.consume();
            }
            Event::KeyDown(code) if code.is_ctrl() => {
                self.no_wait = true;
                event.consume();
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "TextoutLongOperation"
    }
}
