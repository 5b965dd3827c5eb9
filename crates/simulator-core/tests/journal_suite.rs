//! Journal integration coverage: exact undo across every state layer,
//! rollback of faulting handlers, and full-reset semantics.

#![allow(
    clippy::pedantic,
    clippy::nursery,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::too_many_lines
)]

use log as _;
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

use simulator_core::{
    abi, Catalog, Fault, FieldConstraint, InstrLength, InstructionDef, InstructionField,
    InstructionFormat, MachineCode, ProgramImage, Rv32, Simulator, SimulatorSettings, Xlen,
    DEFAULT_HEAP_BEGIN, DEFAULT_STACK_BEGIN,
};

const ADDI_X5_X0_7: u32 = 0x0070_0293;
const ADDI_X6_X0_8: u32 = 0x0080_0313;
const ADD_X7_X5_X6: u32 = 0x0062_83B3;
const ADDI_SP_SP_NEG4: u32 = 0xFFC1_0113;
const SW_X5_0_SP: u32 = 0x0051_2023;
const BEQ_X5_X5_8: u32 = 0x0052_8463;
const LUI_X5_1: u32 = 0x0000_12B7;
const LUI_X5_0X10000: u32 = 0x1000_02B7;
const LW_X6_0_X5: u32 = 0x0002_A303;
const FLW_F1_0_X5: u32 = 0x0002_A087;
const ADDI_A0_X0_9: u32 = 0x0090_0513;
const ADDI_A0_X0_10: u32 = 0x00A0_0513;
const ADDI_A1_X0_16: u32 = 0x0100_0593;
const ECALL: u32 = 0x0000_0073;
const EBREAK: u32 = 0x0010_0073;

fn program(words: &[u32]) -> ProgramImage {
    let mut image = ProgramImage::new("test");
    image.text = words
        .iter()
        .map(|bits| MachineCode::new(u64::from(*bits), InstrLength::Four))
        .collect();
    image
}

fn boot(words: &[u32]) -> Simulator<Rv32> {
    Simulator::new(program(words), SimulatorSettings::default()).unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    x5: u32,
    sp: u32,
    a0: u32,
    pc: u32,
    stack_word: u32,
    heap_end: u32,
    cache_accesses: u64,
    cache_misses: u64,
}

fn capture(sim: &Simulator<Rv32>) -> Snapshot {
    Snapshot {
        x5: sim.reg(abi::T0),
        sp: Rv32::to_addr(sim.reg(abi::SP)),
        a0: sim.reg(abi::A0),
        pc: Rv32::to_addr(sim.pc()),
        stack_word: sim.memory().load_word(DEFAULT_STACK_BEGIN - 4),
        heap_end: sim.heap_end(),
        cache_accesses: sim.cache().accesses(),
        cache_misses: sim.cache().misses(),
    }
}

#[test]
fn undo_walks_every_state_layer_back_bit_for_bit() {
    let mut sim = boot(&[
        ADDI_X5_X0_7,
        ADDI_SP_SP_NEG4,
        SW_X5_0_SP,
        ADDI_A0_X0_9,
        ADDI_A1_X0_16,
        ECALL,
    ]);

    let mut snapshots = Vec::new();
    for _ in 0..6 {
        snapshots.push(capture(&sim));
        sim.step().unwrap();
    }
    assert_eq!(sim.memory().load_word(DEFAULT_STACK_BEGIN - 4), 7);
    assert_eq!(sim.heap_end(), DEFAULT_HEAP_BEGIN + 16);

    for expected in snapshots.iter().rev() {
        let batch = sim.undo();
        assert!(!batch.is_empty());
        assert_eq!(&capture(&sim), expected);
    }
    assert!(!sim.can_undo());
    assert_eq!(sim.cycles(), 0);
}

#[test]
fn undo_restores_float_registers() {
    let mut image = program(&[LUI_X5_0X10000, FLW_F1_0_X5]);
    image.data = 1.5_f32.to_le_bytes().to_vec();
    let mut sim = Simulator::<Rv32>::new(image, SimulatorSettings::default()).unwrap();
    sim.step().unwrap();
    sim.step().unwrap();
    assert_eq!(sim.freg(1), 0xFFFF_FFFF_3FC0_0000);

    sim.undo();
    assert_eq!(sim.freg(1), 0);
    sim.undo();
    assert_eq!(Rv32::to_addr(sim.pc()), 0);
}

#[test]
fn undo_rewinds_cache_counters_exactly() {
    let mut sim = boot(&[LUI_X5_1, LW_X6_0_X5]);
    sim.step().unwrap();
    sim.step().unwrap();
    assert_eq!(sim.cache().accesses(), 1);
    assert_eq!(sim.cache().misses(), 1);

    sim.undo();
    assert_eq!(sim.cache().accesses(), 0);
    assert_eq!(sim.cache().misses(), 0);
    assert_eq!(sim.cache().hits(), 0);

    // The recorded line set was rewound too, so replaying the load
    // misses again instead of hitting.
    sim.step().unwrap();
    assert_eq!(sim.cache().accesses(), 1);
    assert_eq!(sim.cache().misses(), 1);
    assert_eq!(sim.cache().hits(), 0);
}

#[test]
fn undo_rewinds_a_taken_branch() {
    let mut sim = boot(&[ADDI_X5_X0_7, BEQ_X5_X5_8, ADDI_X6_X0_8, ADD_X7_X5_X6]);
    sim.step().unwrap();
    sim.step().unwrap();
    assert!(sim.branched());
    assert_eq!(Rv32::to_addr(sim.pc()), 12);

    sim.undo();
    assert_eq!(Rv32::to_addr(sim.pc()), 4);
    assert_eq!(sim.cycles(), 1);

    // Unjournaled writes sit outside the history and survive the rewind.
    sim.set_reg_no_journal(abi::T1, 5);
    sim.undo();
    assert_eq!(Rv32::to_addr(sim.pc()), 0);
    assert_eq!(sim.reg(abi::T0), 0);
    assert_eq!(sim.reg(abi::T1), 5);
}

#[test]
fn undo_with_no_history_is_a_quiet_no_op() {
    let mut sim = boot(&[ADDI_X5_X0_7]);
    let batch = sim.undo();
    assert!(batch.is_empty());
    assert_eq!(sim.cycles(), 0);
    assert_eq!(Rv32::to_addr(sim.pc()), 0);
}

#[test]
fn undo_clears_a_recorded_exit_code() {
    let mut sim = boot(&[ADDI_A0_X0_10, ECALL]);
    sim.run().unwrap();
    assert_eq!(sim.exit_code(), Some(0));
    assert_eq!(sim.cycles(), 2);

    sim.undo();
    assert_eq!(sim.exit_code(), None);
    assert_eq!(sim.cycles(), 1);
    assert_eq!(Rv32::to_addr(sim.pc()), 4);
}

const BOOM_CONSTRAINTS: &[FieldConstraint] =
    &[FieldConstraint::require(InstructionField::Opcode, 0b010_1011)];

fn boom(sim: &mut Simulator<Rv32>, _code: MachineCode) -> Result<(), Fault> {
    sim.set_reg(abi::T0, 77);
    sim.store_word(0x1000_0000, 0xAAAA_AAAA);
    sim.add_heap_space(8)?;
    Err(Fault::UninitializedAccess { addr: 0x2000_0000 })
}

#[test]
fn faulting_handler_rolls_back_partial_mutations() {
    let mut catalog = Catalog::<Rv32>::new();
    catalog
        .register(InstructionDef {
            name: "boom",
            format: InstructionFormat::new(InstrLength::Four, BOOM_CONSTRAINTS),
            eval: boom,
        })
        .unwrap();
    let mut sim = Simulator::with_catalog(
        program(&[0x0000_002B]),
        SimulatorSettings::default(),
        catalog,
    );

    let fault = sim.step().unwrap_err();
    assert_eq!(fault, Fault::UninitializedAccess { addr: 0x2000_0000 });
    assert_eq!(sim.reg(abi::T0), 0);
    assert_eq!(sim.memory().load_word(0x1000_0000), 0);
    assert_eq!(sim.heap_end(), DEFAULT_HEAP_BEGIN);
    assert_eq!(Rv32::to_addr(sim.pc()), 0);
    // The attempt still costs a cycle but leaves nothing to undo.
    assert_eq!(sim.cycles(), 1);
    assert!(!sim.can_undo());
}

#[test]
fn reset_returns_to_the_loaded_image() {
    let mut sim = boot(&[ADDI_X5_X0_7, ADDI_X6_X0_8, EBREAK]);
    sim.set_args(vec!["alpha".to_owned()]);
    sim.step().unwrap();
    sim.step().unwrap();
    assert_eq!(sim.reg(abi::T0), 7);

    sim.reset(true);
    assert_eq!(sim.cycles(), 0);
    assert_eq!(Rv32::to_addr(sim.pc()), 0);
    assert_eq!(sim.reg(abi::T0), 0);
    assert_eq!(sim.stdout(), "");
    assert_eq!(sim.args(), ["alpha".to_owned()]);
    assert_eq!(sim.reg(abi::A0), 2);
    assert_eq!(Rv32::to_addr(sim.reg(abi::SP)), sim.reg(abi::A1));

    sim.reset(false);
    assert!(sim.args().is_empty());
    assert_eq!(Rv32::to_addr(sim.reg(abi::SP)), DEFAULT_STACK_BEGIN);
}

#[test]
fn history_length_tracks_cycles() {
    let mut sim = boot(&[ADDI_X5_X0_7, ADDI_X6_X0_8, ADD_X7_X5_X6]);
    for _ in 0..3 {
        sim.step().unwrap();
    }
    assert!(sim.can_undo());
    assert_eq!(sim.cycles(), 3);
    for _ in 0..3 {
        sim.undo();
    }
    assert!(!sim.can_undo());
    assert_eq!(sim.cycles(), 0);
}
