//! The orchestrator: fetch, dispatch, and execution of one program on one
//! width variant, with journaled mutation, undo, breakpoints, heap and
//! stack bookkeeping, and calling-convention argument marshalling.

use std::collections::{HashMap, HashSet};

use log::{error, trace};

use crate::cache::{AccessKind, CacheRecorder};
use crate::fault::Fault;
use crate::isa::{base_catalog, Catalog, CatalogError, InstrLength, MachineCode};
use crate::journal::{Diff, History, StepTransaction};
use crate::mem::{policy, MemSize, Memory};
use crate::observer::{NullObserver, SimObserver, SimUpdate};
use crate::program::ProgramImage;
use crate::settings::SimulatorSettings;
use crate::state::{abi, ArchState, Xlen};

/// One loaded program plus everything needed to execute, inspect, and
/// rewind it.
///
/// The width variant is fixed at the type level; all register traffic
/// goes through [`Xlen`] so the same instruction handlers drive every
/// width. Mutations made by handlers are journaled per step; a completed
/// step can be undone exactly and a faulting one is rolled back before
/// the fault is reported.
pub struct Simulator<X: Xlen> {
    state: ArchState<X>,
    memory: Memory,
    catalog: Catalog<X>,
    history: History<X>,
    tx: StepTransaction<X>,
    cache: CacheRecorder,
    settings: SimulatorSettings,
    breakpoints: HashSet<u32>,
    inst_offsets: HashMap<u32, usize>,
    program_name: String,
    args: Vec<String>,
    start_pc: u32,
    has_main: bool,
    cycles: u64,
    ebreak_hit: bool,
    branched: bool,
    jumped: bool,
    ecall_msg: String,
    stdout: String,
    exit_code: Option<i32>,
    observer: Box<dyn SimObserver + Send>,
    id: usize,
}

impl<X: Xlen> Simulator<X> {
    /// Loads `program` under the shipped instruction catalog.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the shipped instruction table fails
    /// its registration checks.
    pub fn new(program: ProgramImage, settings: SimulatorSettings) -> Result<Self, CatalogError> {
        Ok(Self::with_catalog(program, settings, base_catalog::<X>()?))
    }

    /// Loads `program` under a caller-built catalog.
    #[must_use]
    pub fn with_catalog(
        program: ProgramImage,
        settings: SimulatorSettings,
        catalog: Catalog<X>,
    ) -> Self {
        let heap_begin = settings.layout.heap_begin;
        let mut sim = Self {
            state: ArchState::new(heap_begin),
            memory: Memory::new(),
            catalog,
            history: History::new(),
            tx: StepTransaction::new(),
            cache: CacheRecorder::default(),
            settings,
            breakpoints: HashSet::new(),
            inst_offsets: HashMap::new(),
            program_name: String::new(),
            args: Vec::new(),
            start_pc: 0,
            has_main: false,
            cycles: 0,
            ebreak_hit: false,
            branched: false,
            jumped: false,
            ecall_msg: String::new(),
            stdout: String::new(),
            exit_code: None,
            observer: Box::new(NullObserver),
            id: 0,
        };
        sim.load(program);
        sim
    }

    #[allow(clippy::cast_possible_truncation)]
    fn load(&mut self, program: ProgramImage) {
        let layout = self.settings.layout;
        let mut cursor = layout.text_begin;
        for (index, code) in program.text.iter().enumerate() {
            self.inst_offsets
                .insert(cursor.wrapping_sub(layout.text_begin), index);
            let mut bits = code.bits();
            for _ in 0..code.length().bytes() {
                self.memory.store_byte(cursor, (bits & 0xFF) as u32);
                bits >>= 8;
                cursor = cursor.wrapping_add(1);
            }
        }
        self.state.set_max_pc(cursor);

        let mut data_cursor = layout.static_begin;
        for byte in &program.data {
            self.memory.store_byte(data_cursor, u32::from(*byte));
            data_cursor = data_cursor.wrapping_add(1);
        }
        self.state
            .set_heap_end(self.state.heap_end().max(data_cursor));

        self.start_pc = program.start_pc.unwrap_or(layout.text_begin);
        self.has_main = program.has_global("main");
        if self.has_main {
            // running off the end of a `main` that returns must terminate
            self.settings.ecall_only_exit = false;
        }
        self.program_name = program.name;
        self.seed_registers();
    }

    fn seed_registers(&mut self) {
        let layout = self.settings.layout;
        self.state.set_pc(X::from_u32(self.start_pc));
        if self.settings.set_registers_on_init {
            self.state.set_reg(abi::SP, X::from_u32(layout.stack_begin));
            self.state
                .set_reg(abi::GP, X::from_u32(layout.static_begin));
            if self.has_main {
                self.state
                    .set_reg(abi::RA, X::from_u32(self.state.max_pc()));
                let value = X::to_u64(self.state.reg(abi::RA));
                self.observer.on_update(SimUpdate::Register {
                    index: abi::RA,
                    value,
                });
            }
        }
    }

    /// Replaces the out-of-band update receiver.
    pub fn set_observer(&mut self, observer: Box<dyn SimObserver + Send>) {
        self.observer = observer;
    }

    /// Instance identifier, free for the embedder's use.
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Sets the instance identifier.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_id(&mut self, id: usize) {
        self.id = id;
    }

    /// Execution policy this instance runs under.
    #[must_use]
    pub const fn settings(&self) -> &SimulatorSettings {
        &self.settings
    }

    /// Backing memory, for inspection.
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Cache instrumentation counters.
    #[must_use]
    pub const fn cache(&self) -> &CacheRecorder {
        &self.cache
    }

    /// Instruction catalog in effect.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog<X> {
        &self.catalog
    }

    /// Steps executed since the last reset, counting faulted attempts.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Recorded exit code, if any.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Console output accumulated across completed steps.
    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Console output of the current step only.
    #[must_use]
    pub fn ecall_message(&self) -> &str {
        &self.ecall_msg
    }

    /// True when the last step ran an `ebreak`.
    #[must_use]
    pub const fn ebreak_hit(&self) -> bool {
        self.ebreak_hit
    }

    /// True when the last step took a conditional branch.
    #[must_use]
    pub const fn branched(&self) -> bool {
        self.branched
    }

    /// True when the last step ran an unconditional jump.
    #[must_use]
    pub const fn jumped(&self) -> bool {
        self.jumped
    }

    /// One past the last loaded text byte.
    #[must_use]
    pub const fn max_pc(&self) -> u32 {
        self.state.max_pc()
    }

    /// First unallocated heap byte.
    #[must_use]
    pub const fn heap_end(&self) -> u32 {
        self.state.heap_end()
    }

    /// Marshalled program arguments, excluding the program name.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// True when at least one step can be undone.
    #[must_use]
    pub const fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Whether execution has finished: with `ecall_only_exit`, once an
    /// exit code is recorded; otherwise once the PC passes loaded text.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn is_done(&self) -> bool {
        if self.settings.ecall_only_exit {
            self.exit_code.is_some()
        } else {
            (X::to_addr(self.state.pc()) as i32) >= (self.state.max_pc() as i32)
        }
    }

    /// Instruction index loaded at `addr`, if any.
    #[must_use]
    pub fn instruction_order_at(&self, addr: u32) -> Option<usize> {
        let offset = addr.wrapping_sub(self.settings.layout.text_begin);
        self.inst_offsets.get(&offset).copied()
    }

    /// Flips the breakpoint on the text offset `offset` and returns the
    /// new membership.
    pub fn toggle_breakpoint(&mut self, offset: u32) -> bool {
        if self.breakpoints.contains(&offset) {
            self.breakpoints.remove(&offset);
            false
        } else {
            self.breakpoints.insert(offset);
            true
        }
    }

    /// Whether the run loop should pause here: an `ebreak` in the last
    /// step, exclusive-or the instruction just executed carrying a
    /// registered breakpoint.
    #[must_use]
    pub fn at_breakpoint(&self) -> bool {
        let location = X::to_addr(self.state.pc()).wrapping_sub(self.settings.layout.text_begin);
        if !self.inst_offsets.contains_key(&location) {
            return self.ebreak_hit;
        }
        self.ebreak_hit ^ self.breakpoints.contains(&location.wrapping_sub(4))
    }

    /// Current value of integer register `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 32 or more.
    #[must_use]
    pub fn reg(&self, index: usize) -> X::Reg {
        self.state.reg(index)
    }

    /// Journaled write to integer register `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 32 or more.
    pub fn set_reg(&mut self, index: usize, value: X::Reg) {
        self.tx.record_before(Diff::Register {
            index,
            value: self.state.reg(index),
        });
        self.state.set_reg(index, value);
        self.tx.record_after(Diff::Register {
            index,
            value: self.state.reg(index),
        });
    }

    /// Unjournaled write to integer register `index`, for initialization.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 32 or more.
    pub fn set_reg_no_journal(&mut self, index: usize, value: X::Reg) {
        self.state.set_reg(index, value);
    }

    /// Raw bit pattern of floating-point register `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 32 or more.
    #[must_use]
    pub fn freg(&self, index: usize) -> u64 {
        self.state.freg(index)
    }

    /// Journaled write to floating-point register `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 32 or more.
    pub fn set_freg(&mut self, index: usize, bits: u64) {
        self.tx.record_before(Diff::FloatRegister {
            index,
            bits: self.state.freg(index),
        });
        self.state.set_freg(index, bits);
        self.tx.record_after(Diff::FloatRegister {
            index,
            bits: self.state.freg(index),
        });
    }

    /// Unjournaled write to floating-point register `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 32 or more.
    pub fn set_freg_no_journal(&mut self, index: usize, bits: u64) {
        self.state.set_freg(index, bits);
    }

    /// Current program counter.
    #[must_use]
    pub fn pc(&self) -> X::Reg {
        self.state.pc()
    }

    /// Journaled program-counter write.
    pub fn set_pc(&mut self, value: X::Reg) {
        self.tx.record_before(Diff::Pc {
            value: self.state.pc(),
        });
        self.state.set_pc(value);
        self.tx.record_after(Diff::Pc {
            value: self.state.pc(),
        });
    }

    /// Unjournaled program-counter write, for initialization.
    pub fn set_pc_no_journal(&mut self, value: X::Reg) {
        self.state.set_pc(value);
    }

    /// Journaled program-counter advance by `bytes`.
    pub fn increment_pc(&mut self, bytes: u32) {
        let next = X::wrapping_add(self.state.pc(), X::from_u32(bytes));
        self.set_pc(next);
    }

    /// Unvalidated byte load.
    #[must_use]
    pub fn load_byte(&self, addr: u32) -> u32 {
        self.memory.load_byte(addr)
    }

    /// Unvalidated halfword load.
    #[must_use]
    pub fn load_half(&self, addr: u32) -> u32 {
        self.memory.load_half(addr)
    }

    /// Unvalidated word load.
    #[must_use]
    pub fn load_word(&self, addr: u32) -> u32 {
        self.memory.load_word(addr)
    }

    /// Unvalidated long load.
    #[must_use]
    pub fn load_long(&self, addr: u32) -> u64 {
        self.memory.load_long(addr)
    }

    fn check_gap(&self, addr: u32, size: MemSize) -> Result<(), Fault> {
        if self.settings.allow_access_between_stack_and_heap {
            return Ok(());
        }
        policy::validate_gap_access(
            addr,
            size,
            self.state.heap_end(),
            X::to_addr(self.state.reg(abi::SP)),
        )
    }

    fn validated_read(&mut self, addr: u32, size: MemSize) -> Result<(), Fault> {
        if self.settings.aligned_addresses {
            policy::validate_alignment(addr, size)?;
        }
        self.check_gap(addr, size)?;
        self.tx.record_before(Diff::CacheAccess {
            state: self.cache.snapshot(),
        });
        self.cache.touch(addr, AccessKind::Read);
        self.tx.record_after(Diff::CacheAccess {
            state: self.cache.snapshot(),
        });
        Ok(())
    }

    fn validated_write(
        &mut self,
        addr: u32,
        gap: MemSize,
        text_window: MemSize,
        align: MemSize,
    ) -> Result<(), Fault> {
        if self.settings.aligned_addresses {
            policy::validate_alignment(addr, align)?;
        }
        if !self.settings.mutable_text {
            policy::validate_text_store(
                addr,
                text_window,
                self.settings.layout.text_begin,
                self.state.max_pc(),
            )?;
        }
        self.check_gap(addr, gap)?;
        self.tx.record_before(Diff::CacheAccess {
            state: self.cache.snapshot(),
        });
        self.cache.touch(addr, AccessKind::Write);
        Ok(())
    }

    /// Validated, cache-instrumented byte load.
    ///
    /// # Errors
    ///
    /// Faults on an alignment or access-policy violation.
    pub fn load_byte_cached(&mut self, addr: u32) -> Result<u32, Fault> {
        self.validated_read(addr, MemSize::Byte)?;
        Ok(self.memory.load_byte(addr))
    }

    /// Validated, cache-instrumented halfword load.
    ///
    /// # Errors
    ///
    /// Faults on an alignment or access-policy violation.
    pub fn load_half_cached(&mut self, addr: u32) -> Result<u32, Fault> {
        self.validated_read(addr, MemSize::Half)?;
        Ok(self.memory.load_half(addr))
    }

    /// Validated, cache-instrumented word load.
    ///
    /// # Errors
    ///
    /// Faults on an alignment or access-policy violation.
    pub fn load_word_cached(&mut self, addr: u32) -> Result<u32, Fault> {
        self.validated_read(addr, MemSize::Word)?;
        Ok(self.memory.load_word(addr))
    }

    /// Validated, cache-instrumented long load.
    ///
    /// # Errors
    ///
    /// Faults on an alignment or access-policy violation.
    pub fn load_long_cached(&mut self, addr: u32) -> Result<u64, Fault> {
        self.validated_read(addr, MemSize::Long)?;
        Ok(self.memory.load_long(addr))
    }

    fn journal_store_before(&mut self, addr: u32) {
        self.tx.record_before(Diff::MemoryWord {
            addr,
            value: self.memory.load_word(addr),
        });
    }

    fn journal_store_after(&mut self, addr: u32) {
        self.tx.record_after(Diff::MemoryWord {
            addr,
            value: self.memory.load_word(addr),
        });
    }

    /// Journaled byte store, without access validation.
    pub fn store_byte(&mut self, addr: u32, value: u32) {
        self.journal_store_before(addr);
        self.memory.store_byte(addr, value);
        self.journal_store_after(addr);
        self.refresh_text_listing(addr, MemSize::Byte);
    }

    /// Journaled halfword store, without access validation.
    pub fn store_half(&mut self, addr: u32, value: u32) {
        self.journal_store_before(addr);
        self.memory.store_half(addr, value);
        self.journal_store_after(addr);
        self.refresh_text_listing(addr, MemSize::Half);
    }

    /// Journaled word store, without access validation.
    pub fn store_word(&mut self, addr: u32, value: u32) {
        self.journal_store_before(addr);
        self.memory.store_word(addr, value);
        self.journal_store_after(addr);
        self.refresh_text_listing(addr, MemSize::Word);
    }

    /// Journaled long store, without access validation. The journal
    /// records the two covered words.
    pub fn store_long(&mut self, addr: u32, value: u64) {
        self.journal_store_before(addr);
        self.journal_store_before(addr.wrapping_add(4));
        self.memory.store_long(addr, value);
        self.journal_store_after(addr);
        self.journal_store_after(addr.wrapping_add(4));
        self.refresh_text_listing(addr, MemSize::Long);
    }

    /// Validated, cache-instrumented byte store.
    ///
    /// # Errors
    ///
    /// Faults on an alignment or access-policy violation; nothing is
    /// written on a fault.
    pub fn store_byte_cached(&mut self, addr: u32, value: u32) -> Result<(), Fault> {
        self.validated_write(addr, MemSize::Byte, MemSize::Byte, MemSize::Byte)?;
        self.store_byte(addr, value);
        self.tx.record_after(Diff::CacheAccess {
            state: self.cache.snapshot(),
        });
        Ok(())
    }

    /// Validated, cache-instrumented halfword store.
    ///
    /// # Errors
    ///
    /// Faults on an alignment or access-policy violation; nothing is
    /// written on a fault.
    pub fn store_half_cached(&mut self, addr: u32, value: u32) -> Result<(), Fault> {
        self.validated_write(addr, MemSize::Half, MemSize::Half, MemSize::Half)?;
        self.store_half(addr, value);
        self.tx.record_after(Diff::CacheAccess {
            state: self.cache.snapshot(),
        });
        Ok(())
    }

    /// Validated, cache-instrumented word store.
    ///
    /// # Errors
    ///
    /// Faults on an alignment or access-policy violation; nothing is
    /// written on a fault.
    pub fn store_word_cached(&mut self, addr: u32, value: u32) -> Result<(), Fault> {
        self.validated_write(addr, MemSize::Word, MemSize::Word, MemSize::Word)?;
        self.store_word(addr, value);
        self.tx.record_after(Diff::CacheAccess {
            state: self.cache.snapshot(),
        });
        Ok(())
    }

    /// Validated, cache-instrumented long store.
    ///
    /// Strict alignment and the read-only-text window both check at word
    /// size here, not long; the stack/heap gap check covers the full
    /// eight bytes.
    ///
    /// # Errors
    ///
    /// Faults on an alignment or access-policy violation; nothing is
    /// written on a fault.
    pub fn store_long_cached(&mut self, addr: u32, value: u64) -> Result<(), Fault> {
        self.validated_write(addr, MemSize::Long, MemSize::Word, MemSize::Word)?;
        self.store_long(addr, value);
        self.tx.record_after(Diff::CacheAccess {
            state: self.cache.snapshot(),
        });
        Ok(())
    }

    fn refresh_text_listing(&mut self, addr: u32, size: MemSize) {
        let text_begin = self.settings.layout.text_begin;
        let max_pc = self.state.max_pc();
        let last = addr.wrapping_add(size.bytes()).wrapping_sub(1);
        let inside = |a: u32| a >= text_begin && a < max_pc;
        if !inside(addr) && !inside(last) {
            return;
        }
        let aligned = addr & !0b11;
        let offset = aligned.wrapping_sub(text_begin);
        let code = self.memory.load_word(aligned);
        self.observer
            .on_update(SimUpdate::TextListing { offset, code });
        if aligned != addr && aligned.wrapping_add(3) < max_pc {
            let code = self.memory.load_word(aligned.wrapping_add(4));
            self.observer.on_update(SimUpdate::TextListing {
                offset: offset.wrapping_add(4),
                code,
            });
        }
    }

    /// Journaled heap-break growth by `bytes`.
    ///
    /// # Errors
    ///
    /// Faults when the grown heap would reach the stack pointer; the
    /// break is unchanged on a fault.
    pub fn add_heap_space(&mut self, bytes: u32) -> Result<(), Fault> {
        policy::validate_heap_growth(
            self.state.heap_end(),
            bytes,
            X::to_addr(self.state.reg(abi::SP)),
        )?;
        self.tx.record_before(Diff::HeapEnd {
            value: self.state.heap_end(),
        });
        self.state
            .set_heap_end(self.state.heap_end().wrapping_add(bytes));
        self.tx.record_after(Diff::HeapEnd {
            value: self.state.heap_end(),
        });
        Ok(())
    }

    /// Journaled byte-wise copy of `len` bytes; returns `dest`.
    pub fn memcpy(&mut self, dest: u32, src: u32, len: u32) -> u32 {
        for i in 0..len {
            let byte = self.memory.load_byte(src.wrapping_add(i));
            self.store_byte(dest.wrapping_add(i), byte);
        }
        dest
    }

    /// Journaled byte-wise fill of `len` bytes; returns `dest`.
    pub fn memset(&mut self, dest: u32, byte: u32, len: u32) -> u32 {
        for i in 0..len {
            self.store_byte(dest.wrapping_add(i), byte);
        }
        dest
    }

    #[allow(clippy::missing_const_for_fn)]
    pub(crate) fn mark_branched(&mut self) {
        self.branched = true;
    }

    #[allow(clippy::missing_const_for_fn)]
    pub(crate) fn mark_jumped(&mut self) {
        self.jumped = true;
    }

    #[allow(clippy::missing_const_for_fn)]
    pub(crate) fn mark_ebreak(&mut self) {
        self.ebreak_hit = true;
    }

    pub(crate) fn append_console(&mut self, text: &str) {
        self.ecall_msg.push_str(text);
    }

    #[allow(clippy::missing_const_for_fn)]
    pub(crate) fn record_exit(&mut self, code: i32) {
        self.exit_code = Some(code);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn fetch(&self) -> Result<MachineCode, Fault> {
        let pc = X::to_addr(self.state.pc());
        let first = self.memory.load_half(pc) as u16;
        let length = InstrLength::from_first_halfword(first).inspect_err(|_| {
            error!("cannot size an instruction beginning {first:#06x} at pc {pc:#010x}");
        })?;
        let mut bits = u64::from(first);
        for i in 1..length.halfwords() {
            let half = u64::from(self.memory.load_half(pc.wrapping_add(2 * i)));
            bits |= half << (16 * i);
        }
        Ok(MachineCode::new(bits, length))
    }

    fn apply_diff(&mut self, diff: &Diff<X>) {
        match diff {
            Diff::Register { index, value } => self.state.set_reg(*index, *value),
            Diff::FloatRegister { index, bits } => self.state.set_freg(*index, *bits),
            Diff::Pc { value } => self.state.set_pc(*value),
            Diff::MemoryWord { addr, value } => self.memory.store_word(*addr, *value),
            Diff::HeapEnd { value } => self.state.set_heap_end(*value),
            Diff::CacheAccess { state } => self.cache.restore(state.clone()),
        }
    }

    /// Fetches, resolves, and executes one instruction, returning the
    /// batch of values written.
    ///
    /// A fault raised after the handler has begun mutating state rolls
    /// the step back, leaving everything but the cycle counter as it was.
    ///
    /// # Errors
    ///
    /// Faults on an exhausted step budget, an undecodable instruction,
    /// or any fault the handler raises.
    pub fn step(&mut self) -> Result<Vec<Diff<X>>, Fault> {
        if let Some(limit) = self.settings.max_steps {
            if self.cycles >= limit {
                return Err(Fault::BudgetExceeded { limit });
            }
        }
        self.branched = false;
        self.jumped = false;
        self.ebreak_hit = false;
        self.ecall_msg.clear();
        self.cycles += 1;
        self.tx.begin();

        let code = self.fetch()?;
        let Some(def) = self.catalog.lookup(code) else {
            error!(
                "no instruction matches {:#010x} at pc {:#010x}; check for a jump into the middle of an instruction",
                code.bits(),
                X::to_addr(self.state.pc()),
            );
            return Err(Fault::UnknownInstruction { code: code.bits() });
        };
        let (name, eval) = (def.name, def.eval);
        trace!(
            "cycle {} pc {:#010x} {name}",
            self.cycles,
            X::to_addr(self.state.pc()),
        );
        if let Err(fault) = eval(self, code) {
            for diff in self.tx.take_rollback() {
                self.apply_diff(&diff);
            }
            return Err(fault);
        }

        let written = self.tx.commit(&mut self.history);
        self.stdout.push_str(&self.ecall_msg);
        if self.is_done() && self.exit_code.is_none() {
            #[allow(clippy::cast_possible_truncation)]
            let code = X::to_i64(self.state.reg(abi::A0)) as i32;
            self.exit_code = Some(code);
        }
        Ok(written)
    }

    /// Undoes the most recent completed step and returns the batch that
    /// was replayed; empty when there is nothing to undo. Any recorded
    /// exit code is cleared either way.
    pub fn undo(&mut self) -> Vec<Diff<X>> {
        self.exit_code = None;
        if !self.can_undo() {
            return Vec::new();
        }
        let batch = self.history.pop().unwrap_or_default();
        for diff in &batch {
            self.apply_diff(diff);
        }
        self.cycles -= 1;
        batch
    }

    /// Steps until execution finishes.
    ///
    /// # Errors
    ///
    /// Stops at the first fault and returns it.
    pub fn run(&mut self) -> Result<(), Fault> {
        while !self.is_done() {
            self.step()?;
        }
        Ok(())
    }

    /// Steps once to get off a pause point, then steps until execution
    /// finishes or [`at_breakpoint`](Self::at_breakpoint) pauses it.
    ///
    /// # Errors
    ///
    /// Stops at the first fault and returns it.
    pub fn run_to_breakpoint(&mut self) -> Result<(), Fault> {
        if !self.is_done() {
            self.step()?;
        }
        while !self.is_done() && !self.at_breakpoint() {
            self.step()?;
        }
        Ok(())
    }

    /// Rewinds every completed step, clears transient state and the
    /// cycle counter, and unwinds marshalled arguments; with `keep_args`
    /// the arguments are marshalled again afterwards.
    pub fn reset(&mut self, keep_args: bool) {
        while self.can_undo() {
            self.undo();
        }
        self.branched = false;
        self.jumped = false;
        self.ebreak_hit = false;
        self.ecall_msg.clear();
        self.stdout.clear();
        self.cycles = 0;
        self.exit_code = None;
        let args = std::mem::take(&mut self.args);
        self.unmarshal_args();
        self.seed_registers();
        if keep_args {
            self.args = args;
            self.marshal_args();
        }
    }

    /// Replaces the program arguments and marshals them onto the stack.
    pub fn set_args(&mut self, args: Vec<String>) {
        self.unmarshal_args();
        self.args = args;
        self.marshal_args();
    }

    /// Unwinds marshalled arguments from the stack and forgets them.
    pub fn clear_args(&mut self) {
        self.unmarshal_args();
        self.args.clear();
    }

    fn unmarshal_args(&mut self) {
        if !self.settings.set_registers_on_init {
            return;
        }
        let stack_begin = self.settings.layout.stack_begin;
        let mut sp = X::to_addr(self.state.reg(abi::SP));
        while sp < stack_begin {
            self.memory.remove_byte(sp);
            sp = sp.wrapping_add(1);
            self.state.set_reg(abi::SP, X::from_u32(sp));
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn marshal_args(&mut self) {
        if !self.settings.set_registers_on_init {
            return;
        }
        let mut names = Vec::with_capacity(1 + self.args.len());
        names.push(self.program_name.clone());
        names.extend(self.args.iter().cloned());

        let mut argv = Vec::with_capacity(names.len());
        for arg in &names {
            let mut sp = X::to_addr(self.state.reg(abi::SP)).wrapping_sub(1);
            self.store_byte(sp, 0);
            self.state.set_reg(abi::SP, X::from_u32(sp));
            for ch in arg.chars().rev() {
                sp = X::to_addr(self.state.reg(abi::SP)).wrapping_sub(1);
                self.store_byte(sp, u32::from(ch));
                self.state.set_reg(abi::SP, X::from_u32(sp));
            }
            argv.push(sp);
        }

        let mut sp = X::to_addr(self.state.reg(abi::SP));
        sp = sp.wrapping_sub(sp % (X::BITS / 8));
        sp = sp.wrapping_sub(4);
        self.store_word(sp, 0);
        for base in argv.iter().rev() {
            sp = sp.wrapping_sub(4);
            self.store_word(sp, *base);
        }

        self.state.set_reg(abi::A0, X::from_u32(names.len() as u32));
        self.state.set_reg(abi::A1, X::from_u32(sp));
        self.state.set_reg(abi::SP, X::from_u32(sp));
        for index in [abi::SP, abi::A0, abi::A1] {
            let value = X::to_u64(self.state.reg(index));
            self.observer.on_update(SimUpdate::Register { index, value });
        }
        self.observer.on_update(SimUpdate::Memory { addr: sp });
    }
}
