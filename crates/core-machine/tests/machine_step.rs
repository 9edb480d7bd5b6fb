//! Driver-loop behaviour: halting, expression side effects, call frames
//! and stack-bank scoping.

mod common;

use common::boot;
use core_machine::{FrameKind, Machine, MemoryScriptor};
use core_memory::{IntBank, IntMemoryLocation, MemoryAccess};
use core_script::{BinaryOp, CommandElement, Expr, Instruction};

const INT_A: i32 = 0;

fn assign(index: i32, value: i32) -> Instruction {
    Instruction::Expression(Expr::binary(
        BinaryOp::Assign,
        Expr::simple_ref(INT_A, index),
        Expr::int(value),
    ))
}

fn add_assign(index: i32, value: i32) -> Instruction {
    Instruction::Expression(Expr::binary(
        BinaryOp::AddAssign,
        Expr::simple_ref(INT_A, index),
        Expr::int(value),
    ))
}

#[test]
fn end_halts_after_one_step() {
    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(0, vec![Instruction::End]);
    scriptor.add_scenario(1, vec![Instruction::Line(1), Instruction::End]);

    let mut fixture = boot(scriptor);
    assert!(!fixture.machine.is_halted());
    fixture.machine.step().unwrap();
    assert!(fixture.machine.is_halted());

    // Further steps are no-ops.
    fixture.machine.step().unwrap();
    assert!(fixture.machine.is_halted());
}

#[test]
fn line_and_expression_sequence_updates_memory() {
    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(
        0,
        vec![
            Instruction::Line(1),
            assign(0, 7),
            Instruction::Line(2),
            add_assign(0, 3),
            Instruction::End,
        ],
    );

    let mut fixture = boot(scriptor);
    fixture.machine.run().unwrap();

    assert!(fixture.machine.is_halted());
    assert_eq!(fixture.machine.line_number(), 2);
    assert_eq!(
        fixture
            .machine
            .read_int(IntMemoryLocation::full(IntBank::A, 0))
            .unwrap(),
        10
    );
}

#[test]
fn running_off_the_end_of_a_scenario_halts() {
    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(0, vec![Instruction::Line(1)]);

    let mut fixture = boot(scriptor);
    fixture.machine.step().unwrap();
    assert!(fixture.machine.is_halted());
}

#[test]
fn gosub_and_ret_nest_stack_banks() {
    // gosub to offset 4, write intL[0] in the callee, return, read
    // intL[0] in the caller: recursion sees fresh cells.
    const INT_L: i32 = 11;
    let gosub = Instruction::Command(
        CommandElement::new(0, 1, 5, 0).with_params(vec![Expr::int(4)]),
    );
    let ret = Instruction::Command(CommandElement::new(0, 1, 10, 0));

    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(
        0,
        vec![
            // caller: intL[0] = 5; gosub; intA[1] = intL[0]; End
            Instruction::Expression(Expr::binary(
                BinaryOp::Assign,
                Expr::simple_ref(INT_L, 0),
                Expr::int(5),
            )),
            gosub,
            Instruction::Expression(Expr::binary(
                BinaryOp::Assign,
                Expr::simple_ref(INT_A, 1),
                Expr::simple_ref(INT_L, 0),
            )),
            Instruction::End,
            // callee: intL[0] = 99; intA[2] = intL[0]; ret
            Instruction::Expression(Expr::binary(
                BinaryOp::Assign,
                Expr::simple_ref(INT_L, 0),
                Expr::int(99),
            )),
            Instruction::Expression(Expr::binary(
                BinaryOp::Assign,
                Expr::simple_ref(INT_A, 2),
                Expr::simple_ref(INT_L, 0),
            )),
            ret,
        ],
    );

    let mut fixture = boot(scriptor);
    fixture.machine.run().unwrap();

    let read =
        |m: &Machine, i| m.read_int(IntMemoryLocation::full(IntBank::A, i)).unwrap();
    // The callee saw its own fresh intL cell.
    assert_eq!(read(&fixture.machine, 2), 99);
    // The caller's cell was untouched by the callee's write.
    assert_eq!(read(&fixture.machine, 1), 5);
}

#[test]
fn farcall_pushes_a_frame_into_another_scenario() {
    let farcall = Instruction::Command(
        CommandElement::new(0, 1, 12, 0).with_params(vec![Expr::int(7)]),
    );
    let rtl = Instruction::Command(CommandElement::new(0, 1, 13, 0));

    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(0, vec![farcall, assign(0, 1), Instruction::End]);
    scriptor.add_scenario(7, vec![assign(3, 42), rtl]);

    let mut fixture = boot(scriptor);
    fixture.machine.step().unwrap(); // farcall
    assert_eq!(fixture.machine.scene_number(), 7);
    assert_eq!(
        fixture.machine.call_stack().top().unwrap().kind,
        FrameKind::Farcall
    );
    fixture.machine.run().unwrap();

    assert_eq!(
        fixture
            .machine
            .read_int(IntMemoryLocation::full(IntBank::A, 3))
            .unwrap(),
        42
    );
    assert_eq!(
        fixture
            .machine
            .read_int(IntMemoryLocation::full(IntBank::A, 0))
            .unwrap(),
        1
    );
}

#[test]
fn unimplemented_opcode_is_skipped_not_fatal() {
    // Module 0:1 opcode 3 is registered as an unsupported placeholder;
    // opcode 999 is entirely unknown. Both log and advance.
    let unsupported = Instruction::Command(CommandElement::new(0, 1, 3, 0));
    let unknown = Instruction::Command(CommandElement::new(9, 9, 999, 0));

    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(
        0,
        vec![unsupported, unknown, assign(0, 5), Instruction::End],
    );

    let mut fixture = boot(scriptor);
    fixture.machine.run().unwrap();
    assert_eq!(
        fixture
            .machine
            .read_int(IntMemoryLocation::full(IntBank::A, 0))
            .unwrap(),
        5
    );
}

#[test]
fn kidoku_markers_record_and_classify() {
    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(
        0,
        vec![
            Instruction::Kidoku(10),
            Instruction::Kidoku(11),
            Instruction::End,
        ],
    );

    let mut fixture = boot(scriptor);
    fixture.machine.step().unwrap();
    // First encounter: not previously read, now recorded.
    assert_eq!(fixture.text.borrow().kidoku_read, Some(false));
    assert!(fixture.machine.kidoku().has_been_read(0, 10));

    fixture.machine.step().unwrap();
    assert_eq!(fixture.text.borrow().kidoku_read, Some(false));
    assert!(fixture.machine.kidoku().has_been_read(0, 11));
}

#[test]
fn store_register_opcode_writes_the_register() {
    // Sys SceneNum stores the current scenario number.
    let scene_num = Instruction::Command(CommandElement::new(0, 4, 516, 0));
    let mut scriptor = MemoryScriptor::new();
    scriptor.add_scenario(3, vec![scene_num, Instruction::End]);

    let mut fixture = common::boot_at(scriptor, core_model::ScriptLocation::new(3, 0));
    fixture.machine.step().unwrap();
    assert_eq!(fixture.machine.store_register_value(), 3);
}
