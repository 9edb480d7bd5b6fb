//! Contract between the runtime core and the text-rendering collaborator.
//!
//! The core never rasterizes text. Operation handlers and long operations
//! drive an implementation of [`TextServices`] supplied by the host: a
//! typewriter long operation feeds characters one display unit at a time,
//! pauses consult the auto-mode timing, and selections install a selection
//! mode on the active window. Anything visual behind these calls is the
//! collaborator's business.

use core_model::Point;
use serde::{Deserialize, Serialize};

/// Persisted, user-tweakable text settings (part of global save state).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextGlobals {
    /// Milliseconds per character during typewriter output.
    pub message_speed: u32,
    pub message_no_wait: bool,
    pub auto_mode: bool,
    /// Base auto-mode delay in milliseconds.
    pub auto_mode_base_time: u32,
    /// Additional auto-mode milliseconds per printed character.
    pub auto_char_time: u32,
    /// Whether a held Ctrl skips through text.
    pub ctrl_key_skip: bool,
}

impl Default for TextGlobals {
    fn default() -> Self {
        Self {
            message_speed: 30,
            message_no_wait: false,
            auto_mode: false,
            auto_mode_base_time: 100,
            auto_char_time: 100,
            ctrl_key_skip: true,
        }
    }
}

/// Handle onto the current text page.
pub trait TextPage {
    fn number_of_chars_on_page(&self) -> usize;
    fn in_ruby_gloss(&self) -> bool;
    fn is_full(&self) -> bool;
    /// Render one display unit. Returns false when the page had no room
    /// (the caller is expected to page-break and retry).
    fn character(&mut self, ch: &str, rest: &str) -> bool;
    /// Render a speaker name as a single display unit.
    fn name(&mut self, name: &str, next_char: &str);
    fn hard_brake(&mut self);
    fn reset_indentation(&mut self);
    fn font_size(&mut self, size: i32);
    fn font_colour(&mut self, colour: i32);
    fn set_insertion_point_x(&mut self, x: i32);
    fn set_insertion_point_y(&mut self, y: i32);
}

/// The full text-system surface the core drives.
pub trait TextServices {
    fn page(&mut self) -> &mut dyn TextPage;
    fn page_ref(&self) -> &dyn TextPage;

    /// Auto-mode wait time for a page with `chars` printed characters.
    fn auto_time(&self, chars: usize) -> u32;

    /// Classify upcoming text as previously read (affects colour/skip).
    fn set_kidoku_read(&mut self, read: bool);

    fn set_in_pause_state(&mut self, in_pause: bool);
    fn set_in_selection_mode(&mut self, in_selection: bool);

    /// Record the page into the backlog.
    fn snapshot(&mut self);
    fn new_page_on_window(&mut self, window: i32);
    fn active_window(&self) -> i32;
    fn hide_all_text_windows(&mut self);
    fn set_mouse_position(&mut self, pos: Point);

    /// Push one visible selection option (selection mode must be active).
    fn add_selection_item(&mut self, text: &str, option_index: usize);
    /// The option chosen by the user, once one exists.
    fn selected_option(&self) -> Option<usize>;

    fn globals(&self) -> &TextGlobals;
    fn globals_mut(&mut self) -> &mut TextGlobals;
    fn replace_globals(&mut self, globals: TextGlobals);

    /// Whether scripted no-wait is in force (set by bytecode, distinct
    /// from the user preference in [`TextGlobals::message_no_wait`]).
    fn script_message_nowait(&self) -> bool;
    fn set_script_message_nowait(&mut self, nowait: bool);

    /// Whether the text system is visible at all; textout while hidden is
    /// a scripting error.
    fn system_visible(&self) -> bool;

    /// Record savepoint-visible text state (window contents at the moment
    /// a savepoint is taken).
    fn take_savepoint_snapshot(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn globals_defaults_are_sane() {
        let globals = TextGlobals::default();
        assert!(globals.message_speed > 0);
        assert!(!globals.auto_mode);
        assert!(globals.ctrl_key_skip);
    }
}
