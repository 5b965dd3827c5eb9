//! Execution core for a multi-width RISC-V teaching simulator.

/// Cache-access instrumentation with rewindable counters.
pub mod cache;
pub use cache::{AccessKind, CacheRecorder, RecorderState, DEFAULT_LINE_BYTES};

/// Fault taxonomy raised by the fetch/decode/execute pipeline.
pub mod fault;
pub use fault::{Fault, FaultClass};

/// Instruction encodings, formats, the resolution catalog, and the base
/// instruction set.
pub mod isa;
pub use isa::{
    base_catalog, Catalog, CatalogError, EvalFn, FieldConstraint, InstrLength, InstructionDef,
    InstructionField, InstructionFormat, MachineCode,
};

/// Per-step mutation journal: diffs, transactions, and history.
pub mod journal;
pub use journal::{Diff, History, StepTransaction};

/// Memory model primitives and access policy validators.
pub mod mem;
pub use mem::{
    byte_mask, byte_shift, word_address, MemSize, Memory, SegmentLayout, DEFAULT_HEAP_BEGIN,
    DEFAULT_STACK_BEGIN, DEFAULT_STATIC_BEGIN, DEFAULT_TEXT_BEGIN,
};

/// Out-of-band update notifications for embedders.
pub mod observer;
pub use observer::{NullObserver, SimObserver, SimUpdate};

/// Loadable program images.
pub mod program;
pub use program::ProgramImage;

/// Execution policy settings.
pub mod settings;
pub use settings::{SimulatorSettings, DEFAULT_MAX_STEPS};

/// The fetch/decode/execute orchestrator.
pub mod simulator;
pub use simulator::Simulator;

/// Architectural state: register files and the width abstraction.
pub mod state;
pub use state::{abi, ArchState, Rv128, Rv16, Rv32, Rv64, Xlen};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
