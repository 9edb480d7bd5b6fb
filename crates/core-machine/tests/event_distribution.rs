//! Listener fan-out and latched input state at the machine level.

mod common;

use common::boot;
use core_events::{Event, EventListener, KeyCode, MouseButton};
use core_machine::MemoryScriptor;
use core_script::{CommandElement, Instruction};
use std::cell::RefCell;
use std::rc::Rc;

struct Recorder {
    seen: Rc<RefCell<Vec<String>>>,
    label: &'static str,
    consume: bool,
}

impl EventListener for Recorder {
    fn on_event(&mut self, event: &mut Event) {
        if event.is_none() {
            return;
        }
        self.seen.borrow_mut().push(self.label.to_string());
        if self.consume {
            event.consume();
        }
    }
}

fn end_only() -> MemoryScriptor {
    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(0, vec![Instruction::End]);
    scriptor
}

#[test]
fn listeners_run_in_priority_order_and_consumption_stops_fanout() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut fixture = boot(end_only());
    fixture.machine.add_event_listener(
        10,
        Box::new(Recorder {
            seen: Rc::clone(&seen),
            label: "late",
            consume: false,
        }),
    );
    fixture.machine.add_event_listener(
        1,
        Box::new(Recorder {
            seen: Rc::clone(&seen),
            label: "early",
            consume: true,
        }),
    );

    let mut event = Event::KeyDown(KeyCode::Char('a'));
    fixture.machine.dispatch_event(&mut event);

    assert!(event.is_none());
    assert_eq!(*seen.borrow(), vec!["early".to_string()]);
}

#[test]
fn frontmost_long_operation_outranks_listeners() {
    // A wait with click-break consumes the click before any listener.
    let seen = Rc::new(RefCell::new(Vec::new()));
    let wait = Instruction::Command(
        CommandElement::new(0, 4, 101, 0)
            .with_params(vec![core_script::Expr::int(1000)]),
    );
    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(0, vec![wait, Instruction::End]);

    let mut fixture = boot(scriptor);
    fixture.machine.add_event_listener(
        0,
        Box::new(Recorder {
            seen: Rc::clone(&seen),
            label: "listener",
            consume: false,
        }),
    );
    fixture.machine.step().unwrap(); // push the wait

    let mut event = Event::MouseDown(MouseButton::Left);
    fixture.machine.dispatch_event(&mut event);
    assert!(event.is_none());
    assert!(seen.borrow().is_empty(), "the long operation consumed it");
}

#[test]
fn input_state_latches_and_flush_click_opcode_clears() {
    let flush = Instruction::Command(CommandElement::new(0, 4, 331, 0));
    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(0, vec![flush, Instruction::End]);

    let mut fixture = boot(scriptor);
    fixture
        .machine
        .dispatch_event(&mut Event::MouseDown(MouseButton::Left));
    fixture
        .machine
        .dispatch_event(&mut Event::MouseUp(MouseButton::Left));
    assert_eq!(fixture.machine.input().left_button.as_int(), 2);

    fixture
        .machine
        .dispatch_event(&mut Event::KeyDown(KeyCode::LeftShift));
    assert!(fixture.machine.input().shift_pressed());

    fixture.machine.step().unwrap(); // FlushClick
    assert_eq!(fixture.machine.input().left_button.as_int(), 0);
    assert!(fixture.machine.input().shift_pressed(), "flush only clears buttons");
}

#[test]
fn unhandled_events_pass_through_unconsumed() {
    let mut fixture = boot(end_only());
    let mut event = Event::KeyDown(KeyCode::Char('z'));
    fixture.machine.dispatch_event(&mut event);
    assert!(!event.is_none());
}
