//! Base instruction set: the 4-byte integer subset plus a small
//! single-precision float group, each entry declared as a format and a
//! width-generic evaluator.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::unnecessary_wraps
)]

use crate::fault::Fault;
use crate::isa::catalog::{Catalog, CatalogError, InstructionDef};
use crate::isa::code::{InstrLength, InstructionField, MachineCode};
use crate::isa::format::{FieldConstraint, InstructionFormat};
use crate::simulator::Simulator;
use crate::state::{abi, Xlen};

const OP: u32 = 0b011_0011;
const OP_IMM: u32 = 0b001_0011;
const LOAD: u32 = 0b000_0011;
const STORE: u32 = 0b010_0011;
const BRANCH: u32 = 0b110_0011;
const LUI: u32 = 0b011_0111;
const AUIPC: u32 = 0b001_0111;
const JAL: u32 = 0b110_1111;
const JALR: u32 = 0b110_0111;
const LOAD_FP: u32 = 0b000_0111;
const STORE_FP: u32 = 0b010_0111;
const OP_FP: u32 = 0b101_0011;

const NAN_BOX: u64 = 0xFFFF_FFFF_0000_0000;

macro_rules! def {
    ($name:literal, [$($field:ident = $value:expr),+ $(,)?], $eval:expr) => {{
        const CONSTRAINTS: &[FieldConstraint] = &[
            $(FieldConstraint::require(InstructionField::$field, $value)),+
        ];
        InstructionDef {
            name: $name,
            format: InstructionFormat::new(InstrLength::Four, CONSTRAINTS),
            eval: $eval,
        }
    }};
}

/// Builds the shipped instruction catalog for one width variant.
///
/// # Errors
///
/// Returns a [`CatalogError`] if the definition table is internally
/// inconsistent; a successful build proves the set unambiguous.
pub fn base_catalog<X: Xlen>() -> Result<Catalog<X>, CatalogError> {
    let defs = [
        def!("add", [Opcode = OP, Funct3 = 0b000, Funct7 = 0b000_0000], eval_add::<X>),
        def!("sub", [Opcode = OP, Funct3 = 0b000, Funct7 = 0b010_0000], eval_sub::<X>),
        def!("sll", [Opcode = OP, Funct3 = 0b001, Funct7 = 0b000_0000], eval_sll::<X>),
        def!("slt", [Opcode = OP, Funct3 = 0b010, Funct7 = 0b000_0000], eval_slt::<X>),
        def!("sltu", [Opcode = OP, Funct3 = 0b011, Funct7 = 0b000_0000], eval_sltu::<X>),
        def!("xor", [Opcode = OP, Funct3 = 0b100, Funct7 = 0b000_0000], eval_xor::<X>),
        def!("srl", [Opcode = OP, Funct3 = 0b101, Funct7 = 0b000_0000], eval_srl::<X>),
        def!("sra", [Opcode = OP, Funct3 = 0b101, Funct7 = 0b010_0000], eval_sra::<X>),
        def!("or", [Opcode = OP, Funct3 = 0b110, Funct7 = 0b000_0000], eval_or::<X>),
        def!("and", [Opcode = OP, Funct3 = 0b111, Funct7 = 0b000_0000], eval_and::<X>),
        def!("addi", [Opcode = OP_IMM, Funct3 = 0b000], eval_addi::<X>),
        def!("slti", [Opcode = OP_IMM, Funct3 = 0b010], eval_slti::<X>),
        def!("sltiu", [Opcode = OP_IMM, Funct3 = 0b011], eval_sltiu::<X>),
        def!("xori", [Opcode = OP_IMM, Funct3 = 0b100], eval_xori::<X>),
        def!("ori", [Opcode = OP_IMM, Funct3 = 0b110], eval_ori::<X>),
        def!("andi", [Opcode = OP_IMM, Funct3 = 0b111], eval_andi::<X>),
        def!(
            "slli",
            [Opcode = OP_IMM, Funct3 = 0b001, Funct7 = 0b000_0000],
            eval_slli::<X>
        ),
        def!(
            "srli",
            [Opcode = OP_IMM, Funct3 = 0b101, Funct7 = 0b000_0000],
            eval_srli::<X>
        ),
        def!(
            "srai",
            [Opcode = OP_IMM, Funct3 = 0b101, Funct7 = 0b010_0000],
            eval_srai::<X>
        ),
        def!("lb", [Opcode = LOAD, Funct3 = 0b000], eval_lb::<X>),
        def!("lh", [Opcode = LOAD, Funct3 = 0b001], eval_lh::<X>),
        def!("lw", [Opcode = LOAD, Funct3 = 0b010], eval_lw::<X>),
        def!("lbu", [Opcode = LOAD, Funct3 = 0b100], eval_lbu::<X>),
        def!("lhu", [Opcode = LOAD, Funct3 = 0b101], eval_lhu::<X>),
        def!("sb", [Opcode = STORE, Funct3 = 0b000], eval_sb::<X>),
        def!("sh", [Opcode = STORE, Funct3 = 0b001], eval_sh::<X>),
        def!("sw", [Opcode = STORE, Funct3 = 0b010], eval_sw::<X>),
        def!("beq", [Opcode = BRANCH, Funct3 = 0b000], eval_beq::<X>),
        def!("bne", [Opcode = BRANCH, Funct3 = 0b001], eval_bne::<X>),
        def!("blt", [Opcode = BRANCH, Funct3 = 0b100], eval_blt::<X>),
        def!("bge", [Opcode = BRANCH, Funct3 = 0b101], eval_bge::<X>),
        def!("bltu", [Opcode = BRANCH, Funct3 = 0b110], eval_bltu::<X>),
        def!("bgeu", [Opcode = BRANCH, Funct3 = 0b111], eval_bgeu::<X>),
        def!("lui", [Opcode = LUI], eval_lui::<X>),
        def!("auipc", [Opcode = AUIPC], eval_auipc::<X>),
        def!("jal", [Opcode = JAL], eval_jal::<X>),
        def!("jalr", [Opcode = JALR, Funct3 = 0b000], eval_jalr::<X>),
        def!("ecall", [Entire = 0x0000_0073], eval_ecall::<X>),
        def!("ebreak", [Entire = 0x0010_0073], eval_ebreak::<X>),
        def!("flw", [Opcode = LOAD_FP, Funct3 = 0b010], eval_flw::<X>),
        def!("fsw", [Opcode = STORE_FP, Funct3 = 0b010], eval_fsw::<X>),
        def!("fadd.s", [Opcode = OP_FP, Funct7 = 0b000_0000], eval_fadd_s::<X>),
        def!("fsub.s", [Opcode = OP_FP, Funct7 = 0b000_0100], eval_fsub_s::<X>),
    ];
    let mut catalog = Catalog::new();
    for def in defs {
        catalog.register(def)?;
    }
    Ok(catalog)
}

const fn i_imm(raw: u32) -> i32 {
    (raw as i32) >> 20
}

const fn s_imm(raw: u32) -> i32 {
    (((raw as i32) >> 25) << 5) | (((raw >> 7) & 0x1F) as i32)
}

const fn b_imm(raw: u32) -> i32 {
    let sign = ((raw as i32) >> 31) << 12;
    let imm11 = (((raw >> 7) & 0x1) << 11) as i32;
    let imm10_5 = (((raw >> 25) & 0x3F) << 5) as i32;
    let imm4_1 = (((raw >> 8) & 0xF) << 1) as i32;
    sign | imm11 | imm10_5 | imm4_1
}

const fn j_imm(raw: u32) -> i32 {
    let sign = ((raw as i32) >> 31) << 20;
    let imm19_12 = (raw & 0x000F_F000) as i32;
    let imm11 = (((raw >> 20) & 0x1) << 11) as i32;
    let imm10_1 = (((raw >> 21) & 0x3FF) << 1) as i32;
    sign | imm19_12 | imm11 | imm10_1
}

const fn u_imm(raw: u32) -> i32 {
    (raw & 0xFFFF_F000) as i32
}

fn rd(code: MachineCode) -> usize {
    code.field(InstructionField::Rd) as usize
}

fn rs1(code: MachineCode) -> usize {
    code.field(InstructionField::Rs1) as usize
}

fn rs2(code: MachineCode) -> usize {
    code.field(InstructionField::Rs2) as usize
}

fn box_f32(value: f32) -> u64 {
    NAN_BOX | u64::from(value.to_bits())
}

fn unbox_f32(bits: u64) -> f32 {
    if bits >> 32 == 0xFFFF_FFFF {
        f32::from_bits(bits as u32)
    } else {
        f32::from_bits(0x7FC0_0000)
    }
}

fn reg_reg_op<X: Xlen>(
    sim: &mut Simulator<X>,
    code: MachineCode,
    op: fn(X::Reg, X::Reg) -> X::Reg,
) -> Result<(), Fault> {
    let lhs = sim.reg(rs1(code));
    let rhs = sim.reg(rs2(code));
    sim.set_reg(rd(code), op(lhs, rhs));
    sim.increment_pc(code.length().bytes());
    Ok(())
}

fn reg_imm_op<X: Xlen>(
    sim: &mut Simulator<X>,
    code: MachineCode,
    op: fn(X::Reg, X::Reg) -> X::Reg,
) -> Result<(), Fault> {
    let lhs = sim.reg(rs1(code));
    let imm = X::from_i32(i_imm(code.word()));
    sim.set_reg(rd(code), op(lhs, imm));
    sim.increment_pc(code.length().bytes());
    Ok(())
}

fn shift_imm_op<X: Xlen>(
    sim: &mut Simulator<X>,
    code: MachineCode,
    op: fn(X::Reg, u32) -> X::Reg,
) -> Result<(), Fault> {
    let value = sim.reg(rs1(code));
    let amount = code.field(InstructionField::Shamt);
    sim.set_reg(rd(code), op(value, amount));
    sim.increment_pc(code.length().bytes());
    Ok(())
}

fn load_op<X: Xlen>(
    sim: &mut Simulator<X>,
    code: MachineCode,
    read: fn(&mut Simulator<X>, u32) -> Result<X::Reg, Fault>,
) -> Result<(), Fault> {
    let base = sim.reg(rs1(code));
    let addr = X::to_addr(X::wrapping_add(base, X::from_i32(i_imm(code.word()))));
    let value = read(sim, addr)?;
    sim.set_reg(rd(code), value);
    sim.increment_pc(code.length().bytes());
    Ok(())
}

fn store_op<X: Xlen>(
    sim: &mut Simulator<X>,
    code: MachineCode,
    write: fn(&mut Simulator<X>, u32, X::Reg) -> Result<(), Fault>,
) -> Result<(), Fault> {
    let base = sim.reg(rs1(code));
    let addr = X::to_addr(X::wrapping_add(base, X::from_i32(s_imm(code.word()))));
    let value = sim.reg(rs2(code));
    write(sim, addr, value)?;
    sim.increment_pc(code.length().bytes());
    Ok(())
}

fn branch_op<X: Xlen>(
    sim: &mut Simulator<X>,
    code: MachineCode,
    taken: fn(X::Reg, X::Reg) -> bool,
) -> Result<(), Fault> {
    let lhs = sim.reg(rs1(code));
    let rhs = sim.reg(rs2(code));
    if taken(lhs, rhs) {
        let target = X::wrapping_add(sim.pc(), X::from_i32(b_imm(code.word())));
        sim.set_pc(target);
        sim.mark_branched();
    } else {
        sim.increment_pc(code.length().bytes());
    }
    Ok(())
}

fn float_op<X: Xlen>(
    sim: &mut Simulator<X>,
    code: MachineCode,
    op: fn(f32, f32) -> f32,
) -> Result<(), Fault> {
    let lhs = unbox_f32(sim.freg(rs1(code)));
    let rhs = unbox_f32(sim.freg(rs2(code)));
    sim.set_freg(rd(code), box_f32(op(lhs, rhs)));
    sim.increment_pc(code.length().bytes());
    Ok(())
}

fn eval_add<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    reg_reg_op(sim, code, X::wrapping_add)
}

fn eval_sub<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    reg_reg_op(sim, code, X::wrapping_sub)
}

fn eval_sll<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    reg_reg_op(sim, code, |a, b| X::shl(a, X::to_u64(b) as u32))
}

fn eval_slt<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    reg_reg_op(sim, code, |a, b| X::from_u32(u32::from(X::lt_signed(a, b))))
}

fn eval_sltu<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    reg_reg_op(sim, code, |a, b| {
        X::from_u32(u32::from(X::lt_unsigned(a, b)))
    })
}

fn eval_xor<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    reg_reg_op(sim, code, X::xor)
}

fn eval_srl<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    reg_reg_op(sim, code, |a, b| X::shr(a, X::to_u64(b) as u32))
}

fn eval_sra<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    reg_reg_op(sim, code, |a, b| X::sra(a, X::to_u64(b) as u32))
}

fn eval_or<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    reg_reg_op(sim, code, X::or)
}

fn eval_and<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    reg_reg_op(sim, code, X::and)
}

fn eval_addi<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    reg_imm_op(sim, code, X::wrapping_add)
}

fn eval_slti<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    reg_imm_op(sim, code, |a, b| X::from_u32(u32::from(X::lt_signed(a, b))))
}

fn eval_sltiu<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    reg_imm_op(sim, code, |a, b| {
        X::from_u32(u32::from(X::lt_unsigned(a, b)))
    })
}

fn eval_xori<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    reg_imm_op(sim, code, X::xor)
}

fn eval_ori<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    reg_imm_op(sim, code, X::or)
}

fn eval_andi<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    reg_imm_op(sim, code, X::and)
}

fn eval_slli<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    shift_imm_op(sim, code, X::shl)
}

fn eval_srli<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    shift_imm_op(sim, code, X::shr)
}

fn eval_srai<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    shift_imm_op(sim, code, X::sra)
}

fn eval_lb<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    load_op(sim, code, |sim, addr| {
        Ok(X::from_i32(i32::from(sim.load_byte_cached(addr)? as u8 as i8)))
    })
}

fn eval_lh<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    load_op(sim, code, |sim, addr| {
        Ok(X::from_i32(i32::from(
            sim.load_half_cached(addr)? as u16 as i16
        )))
    })
}

fn eval_lw<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    load_op(sim, code, |sim, addr| {
        Ok(X::from_i32(sim.load_word_cached(addr)? as i32))
    })
}

fn eval_lbu<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    load_op(sim, code, |sim, addr| {
        Ok(X::from_u32(sim.load_byte_cached(addr)?))
    })
}

fn eval_lhu<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    load_op(sim, code, |sim, addr| {
        Ok(X::from_u32(sim.load_half_cached(addr)?))
    })
}

fn eval_sb<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    store_op(sim, code, |sim, addr, value| {
        sim.store_byte_cached(addr, X::to_u64(value) as u32)
    })
}

fn eval_sh<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    store_op(sim, code, |sim, addr, value| {
        sim.store_half_cached(addr, X::to_u64(value) as u32)
    })
}

fn eval_sw<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    store_op(sim, code, |sim, addr, value| {
        sim.store_word_cached(addr, X::to_u64(value) as u32)
    })
}

fn eval_beq<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    branch_op(sim, code, |a, b| a == b)
}

fn eval_bne<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    branch_op(sim, code, |a, b| a != b)
}

fn eval_blt<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    branch_op(sim, code, X::lt_signed)
}

fn eval_bge<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    branch_op(sim, code, |a, b| !X::lt_signed(a, b))
}

fn eval_bltu<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    branch_op(sim, code, X::lt_unsigned)
}

fn eval_bgeu<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    branch_op(sim, code, |a, b| !X::lt_unsigned(a, b))
}

fn eval_lui<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    sim.set_reg(rd(code), X::from_i32(u_imm(code.word())));
    sim.increment_pc(code.length().bytes());
    Ok(())
}

fn eval_auipc<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    let value = X::wrapping_add(sim.pc(), X::from_i32(u_imm(code.word())));
    sim.set_reg(rd(code), value);
    sim.increment_pc(code.length().bytes());
    Ok(())
}

fn eval_jal<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    let pc = sim.pc();
    let link = X::wrapping_add(pc, X::from_u32(code.length().bytes()));
    sim.set_reg(rd(code), link);
    sim.set_pc(X::wrapping_add(pc, X::from_i32(j_imm(code.word()))));
    sim.mark_jumped();
    Ok(())
}

fn eval_jalr<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    let base = sim.reg(rs1(code));
    let link = X::wrapping_add(sim.pc(), X::from_u32(code.length().bytes()));
    let target = X::and(
        X::wrapping_add(base, X::from_i32(i_imm(code.word()))),
        X::from_i32(-2),
    );
    sim.set_reg(rd(code), link);
    sim.set_pc(target);
    sim.mark_jumped();
    Ok(())
}

fn eval_ebreak<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    sim.mark_ebreak();
    sim.increment_pc(code.length().bytes());
    Ok(())
}

fn eval_ecall<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    match X::to_u64(sim.reg(abi::A0)) {
        1 => {
            let value = X::to_i64(sim.reg(abi::A1));
            sim.append_console(&value.to_string());
        }
        4 => {
            let mut addr = X::to_addr(sim.reg(abi::A1));
            let mut text = String::new();
            loop {
                let byte = sim.load_byte(addr);
                if byte == 0 {
                    break;
                }
                text.push(char::from(byte as u8));
                addr = addr.wrapping_add(1);
            }
            sim.append_console(&text);
        }
        9 => {
            let bytes = X::to_addr(sim.reg(abi::A1));
            let previous = sim.heap_end();
            sim.add_heap_space(bytes)?;
            sim.set_reg(abi::A0, X::from_u32(previous));
        }
        10 => {
            sim.record_exit(0);
            sim.set_pc(X::from_u32(sim.max_pc()));
            return Ok(());
        }
        11 => {
            let byte = (X::to_u64(sim.reg(abi::A1)) & 0xFF) as u8;
            sim.append_console(&char::from(byte).to_string());
        }
        17 => {
            let status = X::to_i64(sim.reg(abi::A1)) as i32;
            sim.record_exit(status);
            sim.set_pc(X::from_u32(sim.max_pc()));
            return Ok(());
        }
        _ => {}
    }
    sim.increment_pc(code.length().bytes());
    Ok(())
}

fn eval_flw<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    let base = sim.reg(rs1(code));
    let addr = X::to_addr(X::wrapping_add(base, X::from_i32(i_imm(code.word()))));
    let word = sim.load_word_cached(addr)?;
    sim.set_freg(rd(code), NAN_BOX | u64::from(word));
    sim.increment_pc(code.length().bytes());
    Ok(())
}

fn eval_fsw<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    let base = sim.reg(rs1(code));
    let addr = X::to_addr(X::wrapping_add(base, X::from_i32(s_imm(code.word()))));
    let bits = sim.freg(rs2(code)) as u32;
    sim.store_word_cached(addr, bits)?;
    sim.increment_pc(code.length().bytes());
    Ok(())
}

fn eval_fadd_s<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    float_op(sim, code, |a, b| a + b)
}

fn eval_fsub_s<X: Xlen>(sim: &mut Simulator<X>, code: MachineCode) -> Result<(), Fault> {
    float_op(sim, code, |a, b| a - b)
}
