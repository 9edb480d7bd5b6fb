//! Registry semantics and the object-operation surface: module keys,
//! parameter shapes, mutator opcodes, promotion and graphics replay.

mod common;

use common::boot;
use core_events::{Event, MouseButton};
use core_machine::{modules, MemoryScriptor, Module, ModuleRegistry};
use core_model::{Point, Rect, RuntimeError};
use core_object::{Drawer, Layer};
use core_script::{CommandElement, Expr, Instruction};

fn obj_fg(opcode: i32, params: Vec<Expr>) -> Instruction {
    Instruction::Command(CommandElement::new(1, 81, opcode, 0).with_params(params))
}

fn obj_fg_create(opcode: i32, params: Vec<Expr>) -> Instruction {
    Instruction::Command(CommandElement::new(1, 71, opcode, 0).with_params(params))
}

#[test]
fn duplicate_module_key_is_rejected() {
    let mut registry = ModuleRegistry::new();
    registry
        .attach_module(Module::new("First", 7, 7))
        .unwrap();
    let result = registry.attach_module(Module::new("Second", 7, 7));
    assert!(matches!(
        result,
        Err(RuntimeError::DuplicateModule {
            module_type: 7,
            module_id: 7
        })
    ));
}

#[test]
fn duplicate_opcode_within_a_module_is_rejected() {
    let mut module = Module::new("M", 0, 9);
    module.add_unsupported(1, 0, "first").unwrap();
    assert!(module.add_unsupported(1, 0, "second").is_err());
    // A different overload of the same opcode is fine.
    module.add_unsupported(1, 1, "third").unwrap();
}

#[test]
fn standard_registry_resolves_names() {
    let registry = modules::standard_registry().unwrap();
    let goto = CommandElement::new(0, 1, 0, 0);
    assert_eq!(registry.command_name(&goto), Some("goto"));
    let missing = CommandElement::new(0, 1, 777, 0);
    assert_eq!(registry.command_name(&missing), None);
    assert!(registry.module(1, 81).is_some());
    assert!(registry.module(1, 82).is_some());
}

#[test]
fn object_creation_and_movement_through_opcodes() {
    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(
        0,
        vec![
            obj_fg_create(1000, vec![Expr::int(4), Expr::str("chara"), Expr::int(1)]),
            obj_fg(1000, vec![Expr::int(4), Expr::int(120), Expr::int(80)]),
            obj_fg(1008, vec![Expr::int(4), Expr::int(128)]),
            Instruction::End,
        ],
    );

    let mut fixture = boot(scriptor);
    fixture.machine.run().unwrap();

    let object = fixture
        .machine
        .graphics
        .layers
        .object(Layer::Foreground, 4)
        .expect("object allocated");
    assert!(matches!(
        object.drawer,
        Some(Drawer::File { ref filename, .. }) if filename == "chara"
    ));
    assert!(object.params.visible);
    assert_eq!((object.params.x, object.params.y), (120, 80));
    assert_eq!(object.params.alpha_source, 128);

    // Creation and movement were recorded for replay.
    assert_eq!(fixture.machine.graphics.stack().len(), 2);
}

#[test]
fn defaulted_parameters_substitute_when_absent() {
    // objOfFile's third parameter (visibility) defaults to 0.
    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(
        0,
        vec![
            obj_fg_create(1000, vec![Expr::int(1), Expr::str("bg")]),
            Instruction::End,
        ],
    );

    let mut fixture = boot(scriptor);
    fixture.machine.run().unwrap();
    let object = fixture
        .machine
        .graphics
        .layers
        .object(Layer::Foreground, 1)
        .unwrap();
    assert!(!object.params.visible);
}

#[test]
fn mutator_opcode_animates_and_end_opcode_snaps() {
    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(
        0,
        vec![
            // objEveMove buf=2 to (100, 200) over 100ms
            obj_fg(
                2000,
                vec![
                    Expr::int(2),
                    Expr::int(100),
                    Expr::int(200),
                    Expr::int(100),
                ],
            ),
            Instruction::End,
        ],
    );

    let mut fixture = boot(scriptor);
    fixture.machine.step().unwrap();

    fixture.clock.set(50);
    fixture.machine.graphics.layers.execute(50).unwrap();
    let object = fixture
        .machine
        .graphics
        .layers
        .object(Layer::Foreground, 2)
        .unwrap();
    assert_eq!((object.params.x, object.params.y), (50, 100));

    // Force-complete by opcode.
    let end = CommandElement::new(1, 81, 4000, 0).with_params(vec![Expr::int(2)]);
    fixture.machine.dispatch_command(&end).unwrap();
    let object = fixture
        .machine
        .graphics
        .layers
        .object(Layer::Foreground, 2)
        .unwrap();
    assert_eq!((object.params.x, object.params.y), (100, 200));
    assert_eq!(object.mutator_count(), 0);
}

#[test]
fn animation_drawer_advances_with_the_layer_tick() {
    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(
        0,
        vec![
            // objOfAnm buf=0, 5 frames, 40ms each, looping
            obj_fg_create(
                1100,
                vec![
                    Expr::int(0),
                    Expr::str("drift"),
                    Expr::int(5),
                    Expr::int(40),
                ],
            ),
            Instruction::End,
        ],
    );

    let mut fixture = boot(scriptor);
    fixture.machine.step().unwrap();

    fixture.machine.graphics.layers.execute(200).unwrap();
    let object = fixture
        .machine
        .graphics
        .layers
        .object(Layer::Foreground, 0)
        .unwrap();
    let animator = object.drawer.as_ref().unwrap().animator().unwrap();
    // (200 / 40) mod 5 == 0 under Loop.
    assert_eq!(animator.current_frame, 0);
    assert!(animator.playing);

    fixture.machine.graphics.layers.execute(90).unwrap();
    let object = fixture
        .machine
        .graphics
        .layers
        .object(Layer::Foreground, 0)
        .unwrap();
    assert_eq!(
        object.drawer.as_ref().unwrap().animator().unwrap().current_frame,
        2
    );
}

#[test]
fn stopping_animation_freezes_on_final_frame() {
    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(
        0,
        vec![
            obj_fg_create(
                1101,
                vec![
                    Expr::int(0),
                    Expr::str("burst"),
                    Expr::int(5),
                    Expr::int(40),
                ],
            ),
            Instruction::End,
        ],
    );

    let mut fixture = boot(scriptor);
    fixture.machine.step().unwrap();
    fixture.machine.graphics.layers.execute(200).unwrap();

    let object = fixture
        .machine
        .graphics
        .layers
        .object(Layer::Foreground, 0)
        .unwrap();
    let animator = object.drawer.as_ref().unwrap().animator().unwrap();
    assert_eq!(animator.current_frame, 4);
    assert!(!animator.playing);
}

#[test]
fn wipe_opcode_promotes_background_objects() {
    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(
        0,
        vec![
            // fg[5] plain, bg[5] populated, then wipe.
            obj_fg_create(1000, vec![Expr::int(5), Expr::str("old"), Expr::int(1)]),
            Instruction::Command(
                CommandElement::new(1, 72, 1000, 0).with_params(vec![
                    Expr::int(5),
                    Expr::str("new"),
                    Expr::int(1),
                ]),
            ),
            Instruction::Command(CommandElement::new(1, 33, 73, 0)),
            Instruction::End,
        ],
    );

    let mut fixture = boot(scriptor);
    fixture.machine.run().unwrap();

    let fg = fixture
        .machine
        .graphics
        .layers
        .object(Layer::Foreground, 5)
        .unwrap();
    assert!(matches!(
        fg.drawer,
        Some(Drawer::File { ref filename, .. }) if filename == "new"
    ));
    assert!(fixture
        .machine
        .graphics
        .layers
        .object(Layer::Background, 5)
        .is_none());
}

#[test]
fn graphics_stack_replay_rebuilds_objects() {
    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(
        0,
        vec![
            obj_fg_create(1000, vec![Expr::int(3), Expr::str("bg01"), Expr::int(1)]),
            obj_fg(1000, vec![Expr::int(3), Expr::int(10), Expr::int(20)]),
            Instruction::End,
        ],
    );

    let mut fixture = boot(scriptor);
    fixture.machine.run().unwrap();
    let recorded = fixture.machine.graphics.stack().clone();
    assert_eq!(recorded.len(), 2);

    // A fresh machine rebuilt purely from the recorded entries.
    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(0, vec![Instruction::End]);
    let mut fresh = boot(scriptor);
    fresh
        .machine
        .replay_graphics_stack(recorded.iter().cloned().collect())
        .unwrap();

    let object = fresh
        .machine
        .graphics
        .layers
        .object(Layer::Foreground, 3)
        .expect("replayed object");
    assert!(matches!(
        object.drawer,
        Some(Drawer::File { ref filename, .. }) if filename == "bg01"
    ));
    assert_eq!((object.params.x, object.params.y), (10, 20));
    // Replay re-records the same entries.
    assert_eq!(fresh.machine.graphics.stack().len(), 2);
    // The instruction pointer never moved during replay.
    assert!(!fresh.machine.is_halted());
}

#[test]
fn button_object_select_maps_clicks_to_button_numbers() {
    let objbtn = Instruction::Command(
        CommandElement::new(0, 2, 20, 0).with_params(vec![Expr::int(7), Expr::int(1)]),
    );
    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(0, vec![objbtn, Instruction::End]);

    let mut fixture = boot(scriptor);
    // Two button objects in group 7 with explicit hit areas.
    for (slot, number, area) in [
        (1usize, 10, Rect::rec(0, 0, 50, 50)),
        (2usize, 20, Rect::rec(100, 0, 50, 50)),
    ] {
        let object = fixture
            .machine
            .graphics
            .layers
            .object_mut(Layer::Foreground, slot)
            .unwrap();
        object.params.button.is_button = true;
        object.params.button.group = 7;
        object.params.button.button_number = number;
        object.params.own_clip = Some(area);
    }

    fixture.machine.step().unwrap(); // dispatch, push the modal loop

    // Hover over the second button publishes its hit frame.
    fixture
        .machine
        .dispatch_event(&mut Event::MouseMotion(Point::new(120, 10)));
    let hovered = fixture
        .machine
        .graphics
        .layers
        .object(Layer::Foreground, 2)
        .unwrap();
    assert_eq!(hovered.params.button.state, 1);

    // Click-release over it resolves to its button number.
    fixture
        .machine
        .dispatch_event(&mut Event::MouseDown(MouseButton::Left));
    fixture
        .machine
        .dispatch_event(&mut Event::MouseUp(MouseButton::Left));
    fixture.machine.step().unwrap();
    assert_eq!(fixture.machine.store_register_value(), 20);

    // Override frames cleared on exit.
    let released = fixture
        .machine
        .graphics
        .layers
        .object(Layer::Foreground, 2)
        .unwrap();
    assert_eq!(released.params.button.state, 0);
}

#[test]
fn button_object_select_right_click_cancels() {
    let objbtn = Instruction::Command(
        CommandElement::new(0, 2, 20, 0).with_params(vec![Expr::int(7), Expr::int(1)]),
    );
    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(0, vec![objbtn, Instruction::End]);

    let mut fixture = boot(scriptor);
    fixture.machine.step().unwrap();
    fixture
        .machine
        .dispatch_event(&mut Event::MouseDown(MouseButton::Right));
    fixture
        .machine
        .dispatch_event(&mut Event::MouseUp(MouseButton::Right));
    fixture.machine.step().unwrap();
    assert_eq!(fixture.machine.store_register_value(), -1);
}

#[test]
fn selection_installs_options_and_stores_choice() {
    let select = Instruction::Command(
        CommandElement::new(0, 2, 1, 0).with_params(vec![
            Expr::str("Stay"),
            Expr::str("Leave"),
        ]),
    );
    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(0, vec![select, Instruction::End]);

    let mut fixture = boot(scriptor);
    fixture.machine.step().unwrap(); // dispatch: push the selection
    fixture.machine.step().unwrap(); // first tick installs options
    {
        let state = fixture.text.borrow();
        assert!(state.in_selection_mode);
        assert_eq!(
            state.selection_items,
            vec![("Stay".to_string(), 0), ("Leave".to_string(), 1)]
        );
    }

    fixture.text.borrow_mut().selected = Some(1);
    fixture.machine.step().unwrap();
    assert_eq!(fixture.machine.store_register_value(), 1);
    assert!(!fixture.text.borrow().in_selection_mode);

    fixture.machine.step().unwrap();
    assert!(fixture.machine.is_halted());
}
