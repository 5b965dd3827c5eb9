use super::width::Xlen;

/// Architectural register file and core pointers for one width variant.
///
/// Thirty-two integer registers at the instance width, thirty-two
/// floating-point registers held as raw 64-bit patterns, the program
/// counter, and the two bookkeeping addresses every instance carries:
/// the end of loaded text (`max_pc`) and the current heap break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchState<X: Xlen> {
    regs: [X::Reg; 32],
    fregs: [u64; 32],
    pc: X::Reg,
    max_pc: u32,
    heap_end: u32,
}

impl<X: Xlen> ArchState<X> {
    /// Fresh state with every register zeroed and the heap break seeded.
    #[must_use]
    pub fn new(heap_begin: u32) -> Self {
        Self {
            regs: [X::Reg::default(); 32],
            fregs: [0; 32],
            pc: X::Reg::default(),
            max_pc: 0,
            heap_end: heap_begin,
        }
    }

    /// Current value of integer register `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 32 or more.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn reg(&self, index: usize) -> X::Reg {
        self.regs[index]
    }

    /// Writes integer register `index`; writes to register zero are
    /// discarded.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 32 or more.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_reg(&mut self, index: usize, value: X::Reg) {
        if index != abi::ZERO {
            self.regs[index] = value;
        }
    }

    /// Raw bit pattern of floating-point register `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 32 or more.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn freg(&self, index: usize) -> u64 {
        self.fregs[index]
    }

    /// Writes the raw bit pattern of floating-point register `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 32 or more.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_freg(&mut self, index: usize, bits: u64) {
        self.fregs[index] = bits;
    }

    /// Current program counter.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn pc(&self) -> X::Reg {
        self.pc
    }

    /// Replaces the program counter.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_pc(&mut self, value: X::Reg) {
        self.pc = value;
    }

    /// One past the last loaded text byte.
    #[must_use]
    pub const fn max_pc(&self) -> u32 {
        self.max_pc
    }

    /// Records the end of loaded text.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_max_pc(&mut self, value: u32) {
        self.max_pc = value;
    }

    /// Current heap break: the first unallocated heap byte.
    #[must_use]
    pub const fn heap_end(&self) -> u32 {
        self.heap_end
    }

    /// Moves the heap break.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_heap_end(&mut self, value: u32) {
        self.heap_end = value;
    }
}

/// Conventional register numbers for the calling convention this crate
/// marshals arguments against.
pub mod abi {
    /// x0, hardwired zero.
    pub const ZERO: usize = 0;
    /// x1, return address.
    pub const RA: usize = 1;
    /// x2, stack pointer.
    pub const SP: usize = 2;
    /// x3, global pointer.
    pub const GP: usize = 3;
    /// x4, thread pointer.
    pub const TP: usize = 4;
    /// x5, temporary.
    pub const T0: usize = 5;
    /// x6, temporary.
    pub const T1: usize = 6;
    /// x7, temporary.
    pub const T2: usize = 7;
    /// x8, saved register / frame pointer.
    pub const S0: usize = 8;
    /// x9, saved register.
    pub const S1: usize = 9;
    /// x10, first argument / return value.
    pub const A0: usize = 10;
    /// x11, second argument.
    pub const A1: usize = 11;
    /// x12, third argument.
    pub const A2: usize = 12;
    /// x13, fourth argument.
    pub const A3: usize = 13;
    /// x14, fifth argument.
    pub const A4: usize = 14;
    /// x15, sixth argument.
    pub const A5: usize = 15;
    /// x16, seventh argument.
    pub const A6: usize = 16;
    /// x17, eighth argument.
    pub const A7: usize = 17;
    /// x18, saved register.
    pub const S2: usize = 18;
    /// x19, saved register.
    pub const S3: usize = 19;
    /// x20, saved register.
    pub const S4: usize = 20;
    /// x21, saved register.
    pub const S5: usize = 21;
    /// x22, saved register.
    pub const S6: usize = 22;
    /// x23, saved register.
    pub const S7: usize = 23;
    /// x24, saved register.
    pub const S8: usize = 24;
    /// x25, saved register.
    pub const S9: usize = 25;
    /// x26, saved register.
    pub const S10: usize = 26;
    /// x27, saved register.
    pub const S11: usize = 27;
    /// x28, temporary.
    pub const T3: usize = 28;
    /// x29, temporary.
    pub const T4: usize = 29;
    /// x30, temporary.
    pub const T5: usize = 30;
    /// x31, temporary.
    pub const T6: usize = 31;
}
