use crate::machine::Machine;
use core_events::Event;
use core_model::RuntimeResult;

/// A cooperative task layered on the call stack.
///
/// `step` runs at most once per driver tick, with the call stack locked;
/// any pushes or pops the operation makes are deferred until the step
/// finishes, so they become visible on the next tick, never earlier.
/// Returning `true` completes the operation and pops its frame.
pub trait LongOperation {
    fn step(&mut self, machine: &mut Machine) -> RuntimeResult<bool>;

    /// Offered every event before lower-priority listeners. Consume the
    /// event (`event.consume()`) to stop further propagation.
    fn on_event(&mut self, machine: &mut Machine, event: &mut Event) {
        let _ = (machine, event);
    }

    /// Diagnostic label.
    fn name(&self) -> &'static str;
}

/// Finalizers available to the after-long-op decorator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFinalizer {
    /// Snapshot the page into the backlog and open a new page on the
    /// active window.
    NewPage,
    /// Reset indentation and insert a hard break on the current page.
    NewParagraph,
}

impl PageFinalizer {
    fn run(self, machine: &mut Machine) {
        match self {
            PageFinalizer::NewPage => {
                let text = machine.text_mut();
                text.snapshot();
                let window = text.active_window();
                text.new_page_on_window(window);
            }
            PageFinalizer::NewParagraph => {
                let page = machine.text_mut().page();
                page.reset_indentation();
                page.hard_brake();
            }
        }
    }
}

/// Wraps another long operation so a finalizer runs exactly once when the
/// inner operation completes.
pub struct AfterLongOpDecorator {
    inner: Box<dyn LongOperation>,
    finalizer: PageFinalizer,
    fired: bool,
}

impl AfterLongOpDecorator {
    pub fn new(inner: Box<dyn LongOperation>, finalizer: PageFinalizer) -> Self {
        Self {
            inner,
            finalizer,
            fired: false,
        }
    }
}

impl LongOperation for AfterLongOpDecorator {
    fn step(&mut self, machine: &mut Machine) -> RuntimeResult<bool> {
        let done = self.inner.step(machine)?;
        if done && !self.fired {
            self.fired = true;
            self.finalizer.run(machine);
        }
        Ok(done)
    }

    fn on_event(&mut self, machine: &mut Machine, event: &mut Event) {
        self.inner.on_event(machine, event);
    }

    fn name(&self) -> &'static str {
        "AfterLongOpDecorator"
    }
}
