use crate::call_stack::{CallStack, FrameKind, SavedFrame, StackFrame};
use crate::environment::MachineEnvironment;
use crate::graphics::GraphicsState;
use crate::longop::LongOperation;
use crate::registry::{parse_signature, ModuleRegistry, OpHandler};
use crate::scriptor::Scriptor;
use core_config::GameConfig;
use core_events::{Event, EventListener, InputState};
use core_media::{MixerQueue, SoundServices};
use core_memory::{
    IntBank, IntMemoryLocation, KidokuTable, Memory, MemoryAccess, MemoryConfig, StrBank,
    StrMemoryLocation,
};
use core_model::{Clock, RuntimeError, RuntimeResult, ScenarioConfig, ScriptLocation};
use core_script::{CommandElement, Expr, Instruction};
use core_text::TextServices;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// Typewriter pacing shared across consecutive textout operations, so
/// per-character timing stays continuous when one operation ends and the
/// next begins.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TextoutPacing {
    pub time_at_last_pass: u64,
    pub next_character_countdown: i64,
}

type LineAction = Box<dyn FnMut(&mut Machine)>;

/// Everything a machine is built from. The registry is shared and
/// immutable; the collaborators are owned.
pub struct MachineParts {
    pub scriptor: Box<dyn Scriptor>,
    pub registry: Arc<ModuleRegistry>,
    pub clock: Rc<dyn Clock>,
    pub text: Box<dyn TextServices>,
    pub sound: Box<dyn SoundServices>,
    pub config: GameConfig,
    pub memory_config: MemoryConfig,
}

/// Serializable machine state for save slots: the current line, the
/// savepoint call stack (never the live one) and the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineStateSnapshot {
    pub line: i32,
    pub savepoint_frames: Vec<SavedFrame>,
    pub environment: MachineEnvironment,
}

/// The virtual machine: memory, flow control, and execution state.
pub struct Machine {
    memory: Memory,
    kidoku: KidokuTable,
    store_register: i32,

    call_stack: CallStack,
    savepoint_frames: Vec<SavedFrame>,

    registry: Arc<ModuleRegistry>,
    scriptor: Box<dyn Scriptor>,
    clock: Rc<dyn Clock>,

    text: Box<dyn TextServices>,
    sound: Box<dyn SoundServices>,
    mixer: MixerQueue,
    pub graphics: GraphicsState,

    config: GameConfig,
    env: MachineEnvironment,
    input: InputState,
    listeners: Vec<(i32, Box<dyn EventListener>)>,
    line_actions: HashMap<(i32, i32), LineAction>,

    halted: bool,
    line: i32,
    mark_savepoints: bool,
    replaying_graphics_stack: bool,
    fast_forward_forced: bool,

    /// (module-type, module-id, opcode, overload) and name of the command
    /// currently dispatching, for graphics-stack recording.
    executing_command: Option<((i32, i32, i32, u8), String)>,
    pub(crate) textout_pacing: TextoutPacing,
}

impl Machine {
    pub fn new(parts: MachineParts, starting_location: ScriptLocation) -> RuntimeResult<Self> {
        let MachineParts {
            scriptor,
            registry,
            clock,
            text,
            sound,
            config,
            memory_config,
        } = parts;

        let mut machine = Machine {
            memory: Memory::new(&memory_config),
            kidoku: KidokuTable::new(),
            store_register: 0,
            call_stack: CallStack::new(),
            savepoint_frames: Vec::new(),
            registry,
            scriptor,
            clock,
            text,
            sound,
            mixer: MixerQueue::new(),
            graphics: GraphicsState::with_object_ceiling(config.object_max),
            config,
            env: MachineEnvironment::default(),
            input: InputState::new(),
            listeners: Vec::new(),
            line_actions: HashMap::new(),
            halted: false,
            line: 0,
            mark_savepoints: true,
            replaying_graphics_stack: false,
            fast_forward_forced: false,
            executing_command: None,
            textout_pacing: TextoutPacing::default(),
        };

        machine
            .call_stack
            .push(StackFrame::new(starting_location, FrameKind::Root));
        machine.mark_savepoint()?;
        Ok(machine)
    }

    // ------------------------------------------------------------------
    // Accessors

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn store_register_value(&self) -> i32 {
        self.store_register
    }

    pub fn set_store_register_value(&mut self, value: i32) {
        self.store_register = value;
    }

    pub fn line_number(&self) -> i32 {
        self.line
    }

    /// Scenario number of the topmost frame.
    pub fn scene_number(&self) -> i32 {
        self.call_stack
            .top()
            .map(|frame| frame.pos.scenario)
            .unwrap_or(0)
    }

    pub fn location(&self) -> Option<ScriptLocation> {
        self.call_stack.top().map(|frame| frame.pos)
    }

    pub fn scenario_config(&self) -> ScenarioConfig {
        self.scriptor.scenario_config(self.scene_number())
    }

    /// Text encoding tag (0-3) of the current scenario.
    pub fn text_encoding(&self) -> i32 {
        self.scenario_config().text_encoding.tag()
    }

    pub fn now(&self) -> u64 {
        self.clock.ticks()
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn kidoku(&self) -> &KidokuTable {
        &self.kidoku
    }

    pub fn kidoku_mut(&mut self) -> &mut KidokuTable {
        &mut self.kidoku
    }

    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    pub fn call_stack_mut(&mut self) -> &mut CallStack {
        &mut self.call_stack
    }

    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    pub fn scriptor(&self) -> &dyn Scriptor {
        self.scriptor.as_ref()
    }

    pub fn text(&self) -> &dyn TextServices {
        self.text.as_ref()
    }

    pub fn text_mut(&mut self) -> &mut dyn TextServices {
        self.text.as_mut()
    }

    pub fn sound(&self) -> &dyn SoundServices {
        self.sound.as_ref()
    }

    pub fn sound_mut(&mut self) -> &mut dyn SoundServices {
        self.sound.as_mut()
    }

    pub fn mixer(&self) -> &MixerQueue {
        &self.mixer
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn env(&self) -> &MachineEnvironment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut MachineEnvironment {
        &mut self.env
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn set_replaying_graphics_stack(&mut self, replaying: bool) {
        self.replaying_graphics_stack = replaying;
    }

    pub fn replaying_graphics_stack(&self) -> bool {
        self.replaying_graphics_stack
    }

    pub fn set_forced_fast_forward(&mut self, forced: bool) {
        self.fast_forward_forced = forced;
    }

    /// True while input or mode asks to rush through scripted delays.
    pub fn should_fast_forward(&self) -> bool {
        self.fast_forward_forced
            || (self.input.ctrl_pressed() && self.text.globals().ctrl_key_skip)
    }

    // ------------------------------------------------------------------
    // State control

    /// Register a hook run when a line marker for (scenario, line) executes.
    pub fn add_line_action(
        &mut self,
        scenario: i32,
        line: i32,
        action: impl FnMut(&mut Machine) + 'static,
    ) {
        self.line_actions.insert((scenario, line), Box::new(action));
    }

    pub fn add_event_listener(&mut self, priority: i32, listener: Box<dyn EventListener>) {
        self.listeners.push((priority, listener));
        self.listeners.sort_by_key(|(p, _)| *p);
    }

    /// Gate for implicit savepoints; controlled purely from bytecode.
    pub fn set_mark_savepoints(&mut self, mark: bool) {
        self.mark_savepoints = mark;
    }

    /// Capture the savepoint snapshot: the call stack (real frames), the
    /// graphics stack and the text page state.
    pub fn mark_savepoint(&mut self) -> RuntimeResult<()> {
        let snapshot = self.call_stack.clone_stack()?;
        self.savepoint_frames = snapshot.to_saved_frames();
        self.graphics.take_savepoint_snapshot();
        self.text.take_savepoint_snapshot();
        Ok(())
    }

    /// Savepoint taken by implicit triggers (message / seen-top / selcom),
    /// honouring the bytecode override.
    pub fn mark_savepoint_implicit(&mut self) -> RuntimeResult<()> {
        if self.mark_savepoints {
            self.mark_savepoint()?;
        }
        Ok(())
    }

    pub fn savepoint_frames(&self) -> &[SavedFrame] {
        &self.savepoint_frames
    }

    /// Clears all call stacks. Local memory is untouched; this runs right
    /// before a load.
    pub fn reset(&mut self) {
        self.call_stack.clear();
        self.savepoint_frames.clear();
        self.graphics.reset();
        self.text.hide_all_text_windows();
        self.halted = false;
    }

    /// Reset scenario-local state, keeping the call stack.
    pub fn local_reset(&mut self) {
        self.savepoint_frames.clear();
        self.memory
            .partial_reset_local(core_memory::LocalMemory::default());
        self.graphics.reset();
    }

    pub fn state_snapshot(&self) -> MachineStateSnapshot {
        MachineStateSnapshot {
            line: self.line,
            savepoint_frames: self.savepoint_frames.clone(),
            environment: self.env.clone(),
        }
    }

    /// Restore machine state from a save slot. The live stack is rebuilt
    /// from the savepoint frames.
    pub fn restore_state(&mut self, snapshot: MachineStateSnapshot) {
        self.line = snapshot.line;
        self.env = snapshot.environment;
        self.call_stack = CallStack::from_saved_frames(snapshot.savepoint_frames.clone());
        self.savepoint_frames = snapshot.savepoint_frames;
        self.halted = self.call_stack.is_empty();
    }

    // ------------------------------------------------------------------
    // Long operations

    /// Push a long operation above the current frame. Control passes to it
    /// instead of normal bytecode until it reports completion.
    pub fn push_long_operation(&mut self, op: Box<dyn LongOperation>) {
        let pos = self
            .call_stack
            .top()
            .map(|frame| frame.pos)
            .unwrap_or_default();
        self.call_stack.push(StackFrame::long_op(pos, op));
    }

    pub fn current_long_operation_name(&self) -> Option<&'static str> {
        let top = self.call_stack.top()?;
        top.long_op.as_ref().map(|op| op.name())
    }

    // ------------------------------------------------------------------
    // Driver

    /// Run until halted. Only `UserPresentable` errors escape.
    pub fn run(&mut self) -> RuntimeResult<()> {
        while !self.halted {
            self.step()?;
        }
        Ok(())
    }

    /// Advance the machine by one unit of work: one bytecode instruction
    /// or one tick of the topmost long operation.
    ///
    /// Recoverable errors are logged with the current (scenario, line) tag
    /// and the instruction pointer advances past the offender so the same
    /// instruction cannot loop.
    pub fn step(&mut self) -> RuntimeResult<()> {
        if self.halted {
            return Ok(());
        }

        match self.step_inner() {
            Ok(()) => Ok(()),
            Err(err) if !err.is_recoverable() => Err(err),
            Err(RuntimeError::UnimplementedOpcode {
                module_type,
                module_id,
                opcode,
                overload,
                name,
            }) => {
                self.advance_ip();
                warn!(
                    target: "machine.unimplemented",
                    scenario = self.scene_number(),
                    line = self.line,
                    key = %format!("<{module_type}:{module_id}:{opcode},{overload}>"),
                    name = %name,
                    "unimplemented opcode"
                );
                self.executing_command = None;
                Ok(())
            }
            Err(err) => {
                self.advance_ip();
                error!(
                    target: "machine",
                    scenario = self.scene_number(),
                    line = self.line,
                    operation = self
                        .executing_command
                        .as_ref()
                        .map(|(_, name)| name.as_str())
                        .unwrap_or(""),
                    %err,
                    "error during step"
                );
                self.executing_command = None;
                Ok(())
            }
        }
    }

    fn step_inner(&mut self) -> RuntimeResult<()> {
        let Some(top) = self.call_stack.top() else {
            error!(target: "machine", "stack underflow");
            self.halt();
            return Ok(());
        };

        if top.kind == FrameKind::LongOp {
            self.execute_top_long_operation()
        } else {
            let instruction = self.scriptor.resolve_instruction(top.pos)?;
            self.execute_instruction(instruction)
        }
    }

    fn execute_top_long_operation(&mut self) -> RuntimeResult<()> {
        self.call_stack.lock()?;
        let result = match self.call_stack.take_top_long_op() {
            Some(mut op) => {
                let result = op.step(self);
                self.call_stack.restore_top_long_op(op);
                result
            }
            // A frame restored from a snapshot has no live operation;
            // treat it as immediately complete.
            None => Ok(true),
        };
        self.call_stack.unlock();

        if result? {
            self.call_stack.pop()?;
        }
        Ok(())
    }

    /// Execute one resolved instruction.
    pub fn execute_instruction(&mut self, instruction: Instruction) -> RuntimeResult<()> {
        match instruction {
            Instruction::Kidoku(num) => {
                if self.scenario_config().enable_message_savepoint
                    && self.text.page_ref().number_of_chars_on_page() == 0
                {
                    self.mark_savepoint_implicit()?;
                }
                let scene = self.scene_number();
                let read = self.kidoku.has_been_read(scene, num);
                self.text.set_kidoku_read(read);
                self.kidoku.record_kidoku(scene, num);
                self.advance_ip();
                Ok(())
            }
            Instruction::Line(num) => {
                self.line = num;
                let key = (self.scene_number(), num);
                if let Some(mut action) = self.line_actions.remove(&key) {
                    action(self);
                    self.line_actions.insert(key, action);
                }
                self.advance_ip();
                Ok(())
            }
            Instruction::Command(command) => self.dispatch_command(&command),
            Instruction::Expression(expr) => {
                trace!(
                    target: "machine.trace",
                    scenario = self.scene_number(),
                    line = self.line,
                    expr = %expr.debug_string(),
                    "expression"
                );
                expr.execute(self)?;
                self.advance_ip();
                Ok(())
            }
            Instruction::Textout(text) => {
                trace!(target: "machine.text", %text);
                self.perform_textout(&text)?;
                self.advance_ip();
                Ok(())
            }
            Instruction::End => {
                self.halt();
                Ok(())
            }
        }
    }

    /// Look up and invoke a command's operation.
    pub fn dispatch_command(&mut self, command: &CommandElement) -> RuntimeResult<()> {
        let registry = Arc::clone(&self.registry);
        let Some(op) = registry.resolve(command) else {
            return Err(unimplemented_error(command, ""));
        };

        trace!(
            target: "machine.trace",
            scenario = self.scene_number(),
            line = self.line,
            name = op.name.as_str(),
            command = %command,
            "dispatch"
        );

        self.executing_command = Some((command.key(), op.name.clone()));
        let result = match &op.handler {
            OpHandler::Unsupported => Err(unimplemented_error(command, &op.name)),
            OpHandler::Special(handler) => handler.execute(self, command),
            OpHandler::Normal(handler) => (|| {
                let args = parse_signature(self, handler.signature(), &command.params)?;
                if let Some(value) = handler.execute(self, &args)? {
                    self.store_register = value;
                }
                self.advance_ip();
                Ok(())
            })(),
        };
        // On error the command identity stays set so the step loop can tag
        // its log line with the operation name.
        if result.is_ok() {
            self.executing_command = None;
        }
        result
    }

    /// Record the currently dispatching command onto the graphics stack so
    /// a load can replay it. Call from inside a stack-building operation.
    pub fn record_graphics_command(&mut self, args: Vec<core_object::GraphicsStackValue>) {
        if let Some((key, name)) = self.executing_command.clone() {
            let entry = core_object::GraphicsStackEntry::new(name)
                .with_key(key)
                .with_args(args);
            self.graphics.record_command(entry);
        }
    }

    /// Replay graphics-stack entries against this machine, rebuilding the
    /// object table. The instruction pointer never moves during replay.
    pub fn replay_graphics_stack(
        &mut self,
        entries: Vec<core_object::GraphicsStackEntry>,
    ) -> RuntimeResult<()> {
        self.replaying_graphics_stack = true;
        for entry in entries {
            let Some((module_type, module_id, opcode, overload)) = entry.key else {
                debug!(target: "machine", command = %entry.command, "skipping keyless graphics entry");
                continue;
            };
            let params = entry
                .args
                .iter()
                .map(|value| match value {
                    core_object::GraphicsStackValue::Int(v) => Expr::int(*v),
                    core_object::GraphicsStackValue::Str(v) => Expr::str(v.clone()),
                })
                .collect();
            let command = CommandElement::new(module_type, module_id, opcode, overload)
                .with_params(params);
            if let Err(err) = self.dispatch_command(&command) {
                warn!(target: "machine", command = %entry.command, %err, "graphics replay failed");
            }
        }
        self.replaying_graphics_stack = false;
        Ok(())
    }

    /// Advance the instruction pointer of the topmost real frame; halts
    /// when the scenario runs out.
    pub fn advance_ip(&mut self) {
        if self.replaying_graphics_stack {
            return;
        }
        let Some(frame) = self.call_stack.top_real_frame_mut() else {
            return;
        };
        match self.scriptor.next(frame.pos) {
            Ok(next) => {
                frame.pos = next;
                if !self.scriptor.has_next(next) {
                    self.halted = true;
                }
            }
            Err(_) => self.halted = true,
        }
    }

    /// Jump the topmost real frame within its scenario.
    pub fn jump_to_offset(&mut self, offset: usize) -> RuntimeResult<()> {
        let scenario = self
            .call_stack
            .top_real_frame()
            .map(|frame| frame.pos.scenario)
            .ok_or(RuntimeError::NoStackFrame)?;
        let location = self.scriptor.load(scenario, offset)?;
        if let Some(frame) = self.call_stack.top_real_frame_mut() {
            frame.pos = location;
        }
        Ok(())
    }

    /// Push a subroutine frame at `location`. The caller's return position
    /// must already be advanced.
    pub fn push_call_frame(&mut self, location: ScriptLocation, kind: FrameKind) {
        self.call_stack.push(StackFrame::new(location, kind));
    }

    /// Pop frames until a real frame has been removed (subroutine return).
    pub fn return_from_call(&mut self) -> RuntimeResult<()> {
        loop {
            let Some(top) = self.call_stack.top() else {
                return Err(RuntimeError::StackUnderflow);
            };
            let was_real = top.kind.is_real();
            if was_real && top.kind == FrameKind::Root {
                return Err(RuntimeError::StackUnderflow);
            }
            self.call_stack.pop()?;
            if was_real {
                return Ok(());
            }
        }
    }

    // ------------------------------------------------------------------
    // Text output

    /// Feed scripted text to the text collaborator through a typewriter
    /// long operation. Fast-forward modes drain it immediately.
    pub fn perform_textout(&mut self, text: &str) -> RuntimeResult<()> {
        // Prime the shared pacing when no previous textout left a partial
        // countdown; continuity across consecutive textouts stays intact.
        if self.textout_pacing.next_character_countdown <= 0 {
            self.textout_pacing.next_character_countdown =
                self.text.globals().message_speed as i64;
            self.textout_pacing.time_at_last_pass = self.now();
        }
        let mut op = crate::longops::TextoutLongOperation::new(self, text.to_string());
        if self.should_fast_forward()
            || self.text.globals().message_no_wait
            || self.text.script_message_nowait()
        {
            op.set_no_wait();
        }
        // Run it once; push only when it could not finish immediately.
        if !op.step(self)? {
            self.push_long_operation(Box::new(op));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Events

    /// Deliver one event: latch input state, then offer it to the stacked
    /// long operations top-down and the registered listeners in priority
    /// order. A handler that consumes the event stops propagation.
    pub fn dispatch_event(&mut self, event: &mut Event) {
        let now = self.clock.ticks();
        self.input.latch(event, now);

        let mut index = self.call_stack.len();
        while index > 0 && !event.is_none() {
            index -= 1;
            if let Some(mut op) = self.call_stack.take_long_op_at(index) {
                op.on_event(self, event);
                self.call_stack.restore_long_op_at(index, op);
            }
        }

        if event.is_none() {
            return;
        }
        let mut listeners = std::mem::take(&mut self.listeners);
        for (_, listener) in listeners.iter_mut() {
            listener.on_event(event);
            if event.is_none() {
                break;
            }
        }
        self.listeners = listeners;
    }
}

fn unimplemented_error(command: &CommandElement, name: &str) -> RuntimeError {
    RuntimeError::UnimplementedOpcode {
        module_type: command.module_type,
        module_id: command.module_id,
        opcode: command.opcode,
        overload: command.overload,
        name: name.to_string(),
    }
}

// ----------------------------------------------------------------------
// Memory routing

impl MemoryAccess for Machine {
    fn read_int(&self, loc: IntMemoryLocation) -> RuntimeResult<i32> {
        if loc.bank == IntBank::L {
            return match self.call_stack.top_real_frame() {
                Some(frame) => frame.int_l.get_bits(loc.bitwidth, loc.index),
                None => Ok(0),
            };
        }
        match self.memory.int_bank(loc.bank) {
            Some(bank) => bank.get_bits(loc.bitwidth, loc.index),
            None => Ok(0),
        }
    }

    fn write_int(&mut self, loc: IntMemoryLocation, value: i32) -> RuntimeResult<()> {
        if loc.bank == IntBank::L {
            return match self.call_stack.top_real_frame_mut() {
                Some(frame) => frame.int_l.set_bits(loc.bitwidth, loc.index, value),
                None => Err(RuntimeError::NoStackFrame),
            };
        }
        match self.memory.int_bank_mut(loc.bank) {
            Some(bank) => bank.set_bits(loc.bitwidth, loc.index, value),
            None => Err(RuntimeError::NoStackFrame),
        }
    }

    fn read_str(&self, loc: StrMemoryLocation) -> RuntimeResult<String> {
        if loc.bank == StrBank::K {
            return match self.call_stack.top_real_frame() {
                Some(frame) => frame.str_k.get(loc.index).cloned(),
                None => Ok(String::new()),
            };
        }
        match self.memory.str_bank(loc.bank) {
            Some(bank) => bank.get(loc.index).cloned(),
            None => Ok(String::new()),
        }
    }

    fn write_str(&mut self, loc: StrMemoryLocation, value: String) -> RuntimeResult<()> {
        if loc.bank == StrBank::K {
            return match self.call_stack.top_real_frame_mut() {
                Some(frame) => frame.str_k.set(loc.index, value),
                None => Err(RuntimeError::NoStackFrame),
            };
        }
        match self.memory.str_bank_mut(loc.bank) {
            Some(bank) => bank.set(loc.index, value),
            None => Err(RuntimeError::NoStackFrame),
        }
    }

    fn store_register(&self) -> i32 {
        self.store_register
    }

    fn set_store_register(&mut self, value: i32) {
        self.store_register = value;
    }
}
