//! Shared fixtures: an in-memory scriptor plus fake text/sound
//! collaborators whose observable state the tests can reach from outside
//! the machine.
#![allow(dead_code)]

use core_config::GameConfig;
use core_machine::{modules, Machine, MachineParts, MemoryScriptor};
use core_media::{SoundGlobals, SoundServices};
use core_memory::MemoryConfig;
use core_model::{FixedClock, Point, ScriptLocation};
use core_text::{TextGlobals, TextPage, TextServices};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
pub struct FakePageState {
    pub rendered: String,
    pub names: Vec<String>,
    pub chars_on_page: usize,
    pub page_capacity: Option<usize>,
    pub in_ruby_gloss: bool,
    pub hard_breaks: usize,
}

#[derive(Default)]
pub struct FakeTextState {
    pub page: FakePageState,
    pub auto_time_per_char: u32,
    pub kidoku_read: Option<bool>,
    pub in_pause_state: bool,
    pub in_selection_mode: bool,
    pub selection_items: Vec<(String, usize)>,
    pub selected: Option<usize>,
    pub snapshots: usize,
    pub new_pages: usize,
    pub savepoint_snapshots: usize,
    pub hidden: bool,
    pub script_nowait: bool,
}

struct PageHandle {
    state: Rc<RefCell<FakeTextState>>,
}

impl TextPage for PageHandle {
    fn number_of_chars_on_page(&self) -> usize {
        self.state.borrow().page.chars_on_page
    }

    fn in_ruby_gloss(&self) -> bool {
        self.state.borrow().page.in_ruby_gloss
    }

    fn is_full(&self) -> bool {
        let state = self.state.borrow();
        state
            .page
            .page_capacity
            .is_some_and(|cap| state.page.chars_on_page >= cap)
    }

    fn character(&mut self, ch: &str, _rest: &str) -> bool {
        let mut state = self.state.borrow_mut();
        if state
            .page
            .page_capacity
            .is_some_and(|cap| state.page.chars_on_page >= cap)
        {
            return false;
        }
        state.page.rendered.push_str(ch);
        state.page.chars_on_page += 1;
        true
    }

    fn name(&mut self, name: &str, _next_char: &str) {
        self.state.borrow_mut().page.names.push(name.to_string());
    }

    fn hard_brake(&mut self) {
        self.state.borrow_mut().page.hard_breaks += 1;
    }

    fn reset_indentation(&mut self) {}

    fn font_size(&mut self, _size: i32) {}

    fn font_colour(&mut self, _colour: i32) {}

    fn set_insertion_point_x(&mut self, _x: i32) {}

    fn set_insertion_point_y(&mut self, _y: i32) {}
}

pub struct FakeTextSystem {
    state: Rc<RefCell<FakeTextState>>,
    globals: TextGlobals,
    page_handle: PageHandle,
}

impl FakeTextSystem {
    pub fn new() -> (Self, Rc<RefCell<FakeTextState>>) {
        let state = Rc::new(RefCell::new(FakeTextState {
            auto_time_per_char: 50,
            ..FakeTextState::default()
        }));
        (
            Self {
                state: Rc::clone(&state),
                globals: TextGlobals::default(),
                page_handle: PageHandle {
                    state: Rc::clone(&state),
                },
            },
            state,
        )
    }
}

impl TextServices for FakeTextSystem {
    fn page(&mut self) -> &mut dyn TextPage {
        &mut self.page_handle
    }

    fn page_ref(&self) -> &dyn TextPage {
        &self.page_handle
    }

    fn auto_time(&self, chars: usize) -> u32 {
        self.state.borrow().auto_time_per_char * chars as u32
    }

    fn set_kidoku_read(&mut self, read: bool) {
        self.state.borrow_mut().kidoku_read = Some(read);
    }

    fn set_in_pause_state(&mut self, in_pause: bool) {
        self.state.borrow_mut().in_pause_state = in_pause;
    }

    fn set_in_selection_mode(&mut self, in_selection: bool) {
        self.state.borrow_mut().in_selection_mode = in_selection;
    }

    fn snapshot(&mut self) {
        self.state.borrow_mut().snapshots += 1;
    }

    fn new_page_on_window(&mut self, _window: i32) {
        let mut state = self.state.borrow_mut();
        state.new_pages += 1;
        state.page.chars_on_page = 0;
        state.page.rendered.clear();
    }

    fn active_window(&self) -> i32 {
        0
    }

    fn hide_all_text_windows(&mut self) {
        self.state.borrow_mut().hidden = true;
    }

    fn set_mouse_position(&mut self, _pos: Point) {}

    fn add_selection_item(&mut self, text: &str, option_index: usize) {
        self.state
            .borrow_mut()
            .selection_items
            .push((text.to_string(), option_index));
    }

    fn selected_option(&self) -> Option<usize> {
        self.state.borrow().selected
    }

    fn globals(&self) -> &TextGlobals {
        &self.globals
    }

    fn globals_mut(&mut self) -> &mut TextGlobals {
        &mut self.globals
    }

    fn replace_globals(&mut self, globals: TextGlobals) {
        self.globals = globals;
    }

    fn script_message_nowait(&self) -> bool {
        self.state.borrow().script_nowait
    }

    fn set_script_message_nowait(&mut self, nowait: bool) {
        self.state.borrow_mut().script_nowait = nowait;
    }

    fn system_visible(&self) -> bool {
        !self.state.borrow().hidden
    }

    fn take_savepoint_snapshot(&mut self) {
        self.state.borrow_mut().savepoint_snapshots += 1;
    }
}

pub struct FakeSoundSystem {
    koe_playing: Rc<RefCell<bool>>,
    koe_stops: Rc<RefCell<usize>>,
    globals: SoundGlobals,
}

impl FakeSoundSystem {
    pub fn new() -> (Self, Rc<RefCell<bool>>, Rc<RefCell<usize>>) {
        let koe_playing = Rc::new(RefCell::new(false));
        let koe_stops = Rc::new(RefCell::new(0));
        (
            Self {
                koe_playing: Rc::clone(&koe_playing),
                koe_stops: Rc::clone(&koe_stops),
                globals: SoundGlobals::default(),
            },
            koe_playing,
            koe_stops,
        )
    }
}

impl SoundServices for FakeSoundSystem {
    fn koe_playing(&self) -> bool {
        *self.koe_playing.borrow()
    }

    fn koe_stop(&mut self) {
        *self.koe_playing.borrow_mut() = false;
        *self.koe_stops.borrow_mut() += 1;
    }

    fn globals(&self) -> &SoundGlobals {
        &self.globals
    }

    fn replace_globals(&mut self, globals: SoundGlobals) {
        self.globals = globals;
    }
}

pub struct Fixture {
    pub machine: Machine,
    pub clock: Rc<FixedClock>,
    pub text: Rc<RefCell<FakeTextState>>,
    pub koe_playing: Rc<RefCell<bool>>,
    pub koe_stops: Rc<RefCell<usize>>,
}

/// Boot a machine over the given scriptor, starting at scenario 0 offset 0.
pub fn boot(scriptor: MemoryScriptor) -> Fixture {
    boot_at(scriptor, ScriptLocation::new(0, 0))
}

pub fn boot_at(scriptor: MemoryScriptor, start: ScriptLocation) -> Fixture {
    let (text, text_state) = FakeTextSystem::new();
    let (sound, koe_playing, koe_stops) = FakeSoundSystem::new();
    let clock = Rc::new(FixedClock::at(0));
    let registry = modules::standard_registry()
        .expect("standard registry builds")
        .into_shared();
    let machine = Machine::new(
        MachineParts {
            scriptor: Box::new(scriptor),
            registry,
            clock: Rc::clone(&clock) as Rc<dyn core_model::Clock>,
            text: Box::new(text),
            sound: Box::new(sound),
            config: GameConfig::default(),
            memory_config: MemoryConfig::default(),
        },
        start,
    )
    .expect("machine boots");
    Fixture {
        machine,
        clock,
        text: text_state,
        koe_playing,
        koe_stops,
    }
}
