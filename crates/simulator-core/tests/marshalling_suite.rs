//! Argument marshalling integration coverage: argv block layout, register
//! seeding, width-dependent alignment, and unwinding.

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

use std::sync::{Arc, Mutex};

use simulator_core::{
    abi, InstrLength, MachineCode, Memory, ProgramImage, Rv32, Rv64, SimObserver, SimUpdate,
    Simulator, SimulatorSettings, Xlen, DEFAULT_STACK_BEGIN,
};

const ADDI_X5_X0_7: u32 = 0x0070_0293;
const EBREAK: u32 = 0x0010_0073;

fn program(name: &str, words: &[u32]) -> ProgramImage {
    let mut image = ProgramImage::new(name);
    image.text = words
        .iter()
        .map(|bits| MachineCode::new(u64::from(*bits), InstrLength::Four))
        .collect();
    image
}

fn read_cstr(mem: &Memory, mut addr: u32) -> String {
    let mut out = String::new();
    loop {
        let byte = mem.load_byte(addr);
        if byte == 0 {
            break;
        }
        out.push(char::from(byte as u8));
        addr = addr.wrapping_add(1);
    }
    out
}

#[test]
fn argv_block_lays_out_pointers_then_strings() {
    let image = program("prog", &[EBREAK]);
    let mut sim = Simulator::<Rv32>::new(image, SimulatorSettings::default()).unwrap();
    sim.set_args(vec!["alpha".to_owned(), "beta".to_owned()]);

    let argv = Rv32::to_addr(sim.reg(abi::A1));
    assert_eq!(sim.reg(abi::A0), 3);
    assert_eq!(Rv32::to_addr(sim.reg(abi::SP)), argv);
    assert_eq!(argv, 0x7FFF_FFD0);

    // Pointer words ascend from argv, NUL terminated.
    let prog_ptr = sim.memory().load_word(argv);
    let alpha_ptr = sim.memory().load_word(argv + 4);
    let beta_ptr = sim.memory().load_word(argv + 8);
    assert_eq!(sim.memory().load_word(argv + 12), 0);
    assert_eq!(prog_ptr, 0x7FFF_FFEB);
    assert_eq!(alpha_ptr, 0x7FFF_FFE5);
    assert_eq!(beta_ptr, 0x7FFF_FFE0);

    assert_eq!(read_cstr(sim.memory(), prog_ptr), "prog");
    assert_eq!(read_cstr(sim.memory(), alpha_ptr), "alpha");
    assert_eq!(read_cstr(sim.memory(), beta_ptr), "beta");
}

#[test]
fn register_width_sets_the_pointer_block_alignment() {
    let image = program("prog", &[EBREAK]);
    let mut sim = Simulator::<Rv64>::new(image, SimulatorSettings::default()).unwrap();
    sim.set_args(Vec::new());

    let argv = Rv64::to_addr(sim.reg(abi::A1));
    assert_eq!(sim.reg(abi::A0), 1);
    assert_eq!(argv % 8, 0);
    assert_eq!(argv, 0x7FFF_FFE0);
    assert_eq!(sim.memory().load_word(argv), 0x7FFF_FFEB);
    assert_eq!(read_cstr(sim.memory(), 0x7FFF_FFEB), "prog");
}

#[test]
fn clear_args_unwinds_the_stack_block() {
    let image = program("prog", &[EBREAK]);
    let mut sim = Simulator::<Rv32>::new(image, SimulatorSettings::default()).unwrap();
    let clean_footprint = sim.memory().word_footprint();

    sim.set_args(vec!["alpha".to_owned()]);
    assert!(sim.memory().word_footprint() > clean_footprint);

    sim.clear_args();
    assert!(sim.args().is_empty());
    assert_eq!(Rv32::to_addr(sim.reg(abi::SP)), DEFAULT_STACK_BEGIN);
    assert_eq!(sim.memory().word_footprint(), clean_footprint);
    assert_eq!(sim.memory().load_byte(0x7FFF_FFEB), 0);
}

#[test]
fn set_args_replaces_the_previous_marshalling() {
    let image = program("prog", &[EBREAK]);
    let mut sim = Simulator::<Rv32>::new(image, SimulatorSettings::default()).unwrap();
    sim.set_args(vec!["aa".to_owned()]);
    sim.set_args(vec!["bb".to_owned(), "cc".to_owned()]);

    assert_eq!(sim.reg(abi::A0), 3);
    let argv = Rv32::to_addr(sim.reg(abi::A1));
    assert_eq!(
        read_cstr(sim.memory(), sim.memory().load_word(argv)),
        "prog"
    );
    assert_eq!(
        read_cstr(sim.memory(), sim.memory().load_word(argv + 4)),
        "bb"
    );
    assert_eq!(
        read_cstr(sim.memory(), sim.memory().load_word(argv + 8)),
        "cc"
    );
}

#[test]
fn disabled_register_seeding_skips_marshalling() {
    let settings = SimulatorSettings {
        set_registers_on_init: false,
        ..SimulatorSettings::default()
    };
    let image = program("prog", &[EBREAK]);
    let mut sim = Simulator::<Rv32>::new(image, settings).unwrap();
    let clean_footprint = sim.memory().word_footprint();

    sim.set_args(vec!["x".to_owned()]);
    assert_eq!(sim.args(), ["x".to_owned()]);
    assert_eq!(sim.reg(abi::SP), 0);
    assert_eq!(sim.reg(abi::A0), 0);
    assert_eq!(sim.memory().word_footprint(), clean_footprint);
}

struct RecordingObserver {
    events: Arc<Mutex<Vec<SimUpdate>>>,
}

impl SimObserver for RecordingObserver {
    fn on_update(&mut self, update: SimUpdate) {
        self.events.lock().unwrap().push(update);
    }
}

#[test]
fn marshalling_notifies_the_observer() {
    let image = program("prog", &[EBREAK]);
    let mut sim = Simulator::<Rv32>::new(image, SimulatorSettings::default()).unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    sim.set_observer(Box::new(RecordingObserver {
        events: Arc::clone(&events),
    }));

    sim.set_args(vec!["a".to_owned()]);
    let base = Rv32::to_addr(sim.reg(abi::A1));

    let seen = events.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            SimUpdate::Register {
                index: abi::SP,
                value: u64::from(base),
            },
            SimUpdate::Register {
                index: abi::A0,
                value: 2,
            },
            SimUpdate::Register {
                index: abi::A1,
                value: u64::from(base),
            },
            SimUpdate::Memory { addr: base },
        ]
    );
}

#[test]
fn marshalled_arguments_survive_undo() {
    let image = program("prog", &[ADDI_X5_X0_7]);
    let mut sim = Simulator::<Rv32>::new(image, SimulatorSettings::default()).unwrap();
    sim.set_args(vec!["z".to_owned()]);
    assert!(!sim.can_undo());
    let sp_after_marshal = Rv32::to_addr(sim.reg(abi::SP));
    let argv0 = sim.memory().load_word(sp_after_marshal);

    sim.step().unwrap();
    sim.undo();

    assert_eq!(Rv32::to_addr(sim.reg(abi::SP)), sp_after_marshal);
    assert_eq!(sim.memory().load_word(sp_after_marshal), argv0);
    assert_eq!(read_cstr(sim.memory(), argv0), "prog");
    assert!(!sim.can_undo());
}
