use thiserror::Error;

use crate::mem::MemSize;

/// Fault classes used for diagnostics aggregation and run-loop policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Access address failed the required size-class alignment test.
    Alignment,
    /// Machine code could not be resolved to a catalog entry or length.
    Decode,
    /// Segment policy violation: text writes, stack/heap gap, heap growth.
    MemoryPolicy,
    /// Step budget overrun condition.
    Budget,
}

/// Stable fault taxonomy raised by the fetch/decode/execute pipeline.
///
/// Alignment, memory-policy, and budget faults are checked before any state
/// mutation and are recoverable at the run-loop boundary. Decode faults end
/// the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Fault {
    /// Strict alignment mode rejected the access address.
    #[error("address {addr:#010x} is not {size} aligned")]
    Misaligned {
        /// Offending byte address.
        addr: u32,
        /// Size class whose alignment test failed.
        size: MemSize,
    },
    /// No registered instruction format matches the fetched machine code.
    #[error("no instruction matches machine code {code:#010x}")]
    UnknownInstruction {
        /// Raw machine-code bits that failed to resolve.
        code: u64,
    },
    /// The first halfword announced an instruction length beyond 8 bytes.
    #[error("instruction lengths beyond 8 bytes are not supported (first halfword {first_halfword:#06x})")]
    UnsupportedLength {
        /// Halfword fetched at the program counter.
        first_halfword: u16,
    },
    /// Store targeted the loaded text segment while text is immutable.
    #[error("store into read-only program text at {addr:#010x}")]
    ReadOnlyText {
        /// Offending byte address.
        addr: u32,
    },
    /// Access fell into the uninitialized gap between heap end and stack.
    #[error("access to uninitialized memory between stack and heap at {addr:#010x}")]
    UninitializedAccess {
        /// Offending byte address.
        addr: u32,
    },
    /// Heap growth would reach or pass the current stack pointer.
    #[error("heap growth to {requested:#010x} would collide with the stack")]
    HeapCollision {
        /// Heap end the rejected growth would have produced.
        requested: u32,
    },
    /// The per-run step counter reached the configured maximum.
    #[error("step budget of {limit} instructions exhausted")]
    BudgetExceeded {
        /// Configured maximum number of steps.
        limit: u64,
    },
}

impl Fault {
    /// Returns the diagnostics fault class for this fault.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::Misaligned { .. } => FaultClass::Alignment,
            Self::UnknownInstruction { .. } | Self::UnsupportedLength { .. } => FaultClass::Decode,
            Self::ReadOnlyText { .. }
            | Self::UninitializedAccess { .. }
            | Self::HeapCollision { .. } => FaultClass::MemoryPolicy,
            Self::BudgetExceeded { .. } => FaultClass::Budget,
        }
    }

    /// Faults the run loop may report and continue past after adjusting
    /// settings; decode faults end the run instead.
    #[must_use]
    pub const fn is_recoverable(self) -> bool {
        !matches!(self.class(), FaultClass::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::{Fault, FaultClass};
    use crate::mem::MemSize;

    #[test]
    fn class_mapping_matches_fault_taxonomy() {
        assert_eq!(
            Fault::Misaligned {
                addr: 0x1001,
                size: MemSize::Word
            }
            .class(),
            FaultClass::Alignment
        );
        assert_eq!(
            Fault::UnknownInstruction { code: 0 }.class(),
            FaultClass::Decode
        );
        assert_eq!(
            Fault::UnsupportedLength {
                first_halfword: 0xFFFF
            }
            .class(),
            FaultClass::Decode
        );
        assert_eq!(
            Fault::ReadOnlyText { addr: 0 }.class(),
            FaultClass::MemoryPolicy
        );
        assert_eq!(
            Fault::UninitializedAccess { addr: 0x2000_0000 }.class(),
            FaultClass::MemoryPolicy
        );
        assert_eq!(
            Fault::HeapCollision {
                requested: 0x7FFF_FFF0
            }
            .class(),
            FaultClass::MemoryPolicy
        );
        assert_eq!(
            Fault::BudgetExceeded { limit: 10 }.class(),
            FaultClass::Budget
        );
    }

    #[test]
    fn decode_faults_are_the_only_unrecoverable_class() {
        assert!(!Fault::UnknownInstruction { code: 0x13 }.is_recoverable());
        assert!(!Fault::UnsupportedLength {
            first_halfword: 0xFFFF
        }
        .is_recoverable());
        assert!(Fault::Misaligned {
            addr: 1,
            size: MemSize::Half
        }
        .is_recoverable());
        assert!(Fault::BudgetExceeded { limit: 0 }.is_recoverable());
        assert!(Fault::ReadOnlyText { addr: 4 }.is_recoverable());
    }

    #[test]
    fn display_names_the_offending_location() {
        let text = Fault::Misaligned {
            addr: 0x1001,
            size: MemSize::Word,
        }
        .to_string();
        assert!(text.contains("0x00001001"));
        assert!(text.contains("word"));
    }
}
