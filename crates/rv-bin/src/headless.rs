//! Headless collaborators and the smoke scenario.
//!
//! Text renders into the log, sound commands drain into nowhere, and the
//! event pump produces nothing. Useful for CI and for validating the
//! interpreter core without a windowing backend.

use anyhow::Result;
use core_config::GameConfig;
use core_machine::{modules, Machine, MachineParts, MemoryScriptor};
use core_media::{SoundGlobals, SoundServices};
use core_memory::MemoryConfig;
use core_model::{MonotonicClock, Point, ScriptLocation};
use core_script::{BinaryOp, Expr, Instruction};
use core_text::{TextGlobals, TextPage, TextServices};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::info;

/// Upper bound on one frame's worth of stepping before yielding.
const FRAME_BUDGET: Duration = Duration::from_millis(16);

#[derive(Default)]
struct LogPage {
    line: String,
    chars: usize,
}

impl TextPage for LogPage {
    fn number_of_chars_on_page(&self) -> usize {
        self.chars
    }
    fn in_ruby_gloss(&self) -> bool {
        false
    }
    fn is_full(&self) -> bool {
        false
    }
    fn character(&mut self, ch: &str, _rest: &str) -> bool {
        self.line.push_str(ch);
        self.chars += 1;
        true
    }
    fn name(&mut self, name: &str, _next_char: &str) {
        info!(target: "text", speaker = name);
    }
    fn hard_brake(&mut self) {
        if !self.line.is_empty() {
            info!(target: "text", line = %self.line);
            self.line.clear();
        }
    }
    fn reset_indentation(&mut self) {}
    fn font_size(&mut self, _size: i32) {}
    fn font_colour(&mut self, _colour: i32) {}
    fn set_insertion_point_x(&mut self, _x: i32) {}
    fn set_insertion_point_y(&mut self, _y: i32) {}
}

#[derive(Default)]
struct LogTextSystem {
    page: LogPage,
    globals: TextGlobals,
    script_nowait: bool,
}

impl TextServices for LogTextSystem {
    fn page(&mut self) -> &mut dyn TextPage {
        &mut self.page
    }
    fn page_ref(&self) -> &dyn TextPage {
        &self.page
    }
    fn auto_time(&self, chars: usize) -> u32 {
        self.globals.auto_mode_base_time + self.globals.auto_char_time * chars as u32
    }
    fn set_kidoku_read(&mut self, _read: bool) {}
    fn set_in_pause_state(&mut self, _in_pause: bool) {}
    fn set_in_selection_mode(&mut self, _in_selection: bool) {}
    fn snapshot(&mut self) {}
    fn new_page_on_window(&mut self, _window: i32) {
        self.page.hard_brake();
        self.page.chars = 0;
    }
    fn active_window(&self) -> i32 {
        0
    }
    fn hide_all_text_windows(&mut self) {}
    fn set_mouse_position(&mut self, _pos: Point) {}
    fn add_selection_item(&mut self, text: &str, option_index: usize) {
        info!(target: "text", option = option_index, %text, "selection item");
    }
    fn selected_option(&self) -> Option<usize> {
        // No input source: always pick the first option.
        Some(0)
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
        self.script_nowait
    }
    fn set_script_message_nowait(&mut self, nowait: bool) {
        self.script_nowait = nowait;
    }
    fn system_visible(&self) -> bool {
        true
    }
    fn take_savepoint_snapshot(&mut self) {}
}

#[derive(Default)]
struct NullSound {
    globals: SoundGlobals,
}

impl SoundServices for NullSound {
    fn koe_playing(&self) -> bool {
        false
    }
    fn koe_stop(&mut self) {}
    fn globals(&self) -> &SoundGlobals {
        &self.globals
    }
    fn replace_globals(&mut self, globals: SoundGlobals) {
        self.globals = globals;
    }
}

fn smoke_scenario() -> MemoryScriptor {
    const INT_A: i32 = 0;
    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(
        0,
        vec![
            Instruction::Line(1),
            Instruction::Expression(Expr::binary(
                BinaryOp::Assign,
                Expr::simple_ref(INT_A, 0),
                Expr::int(7),
            )),
            Instruction::Kidoku(0),
            Instruction::Textout("Reverie core online.".into()),
            Instruction::Line(2),
            Instruction::Expression(Expr::binary(
                BinaryOp::AddAssign,
                Expr::simple_ref(INT_A, 0),
                Expr::int(3),
            )),
            Instruction::End,
        ],
    );
    scriptor
}

/// Build a machine over the smoke scenario and drive the host loop until
/// it halts. Returns the process exit code.
pub fn run_demo(start_scenario: i32) -> Result<i32> {
    let registry = modules::standard_registry()
        .map_err(|err| anyhow::anyhow!("registry: {err}"))?
        .into_shared();

    let mut text = LogTextSystem::default();
    text.globals.message_no_wait = true;

    let mut machine = Machine::new(
        MachineParts {
            scriptor: Box::new(smoke_scenario()),
            registry,
            clock: Rc::new(MonotonicClock::new()),
            text: Box::new(text),
            sound: Box::new(NullSound::default()),
            config: GameConfig::default(),
            memory_config: MemoryConfig::default(),
        },
        ScriptLocation::new(start_scenario, 0),
    )
    .map_err(|err| anyhow::anyhow!("boot: {err}"))?;

    // The host loop: step within the frame budget, then yield. A real
    // host interleaves collaborator frame-render and input-poll calls at
    // the yield point.
    while !machine.is_halted() {
        let frame_start = Instant::now();
        while !machine.is_halted() && frame_start.elapsed() < FRAME_BUDGET {
            if let Err(err) = machine.step() {
                // Only user-presentable errors escape the step loop.
                eprintln!("fatal: {err}");
                return Ok(1);
            }
        }
        std::thread::sleep(Duration::from_millis(1));
    }

    info!(target: "driver", "smoke scenario halted cleanly");
    Ok(0)
}
