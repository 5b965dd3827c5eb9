//! Instruction encoding and dispatch: machine-code containers, declared
//! bit-field formats, and the catalog that resolves fetched codes to
//! handlers.

/// Shipped base instruction table.
pub mod base;
/// Dispatch catalog with registration-time overlap analysis.
pub mod catalog;
/// Machine-code container, lengths, and field slices.
pub mod code;
/// Declarative encoding formats.
pub mod format;

pub use base::base_catalog;
pub use catalog::{Catalog, CatalogError, EvalFn, InstructionDef};
pub use code::{InstrLength, InstructionField, MachineCode};
pub use format::{FieldConstraint, InstructionFormat};
