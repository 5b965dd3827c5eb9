//! Architectural state: the register file and the width variants it is
//! generic over.

/// Register file and core pointers.
pub mod registers;
/// Register-width trait and its four variants.
pub mod width;

pub use registers::{abi, ArchState};
pub use width::{Rv128, Rv16, Rv32, Rv64, Xlen};
