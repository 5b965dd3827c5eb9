//! Access policy validators.
//!
//! Memory itself is total and infallible; every policy decision (strict
//! alignment, the stack/heap gap, text immutability, heap growth) lives in
//! these checks, run by the simulator before the underlying access.

use crate::fault::Fault;
use crate::mem::MemSize;

/// Rejects addresses failing the size class's natural alignment.
///
/// # Errors
///
/// Returns [`Fault::Misaligned`] when `addr mod size != 0`.
pub const fn validate_alignment(addr: u32, size: MemSize) -> Result<(), Fault> {
    if size.is_aligned(addr) {
        Ok(())
    } else {
        Err(Fault::Misaligned { addr, size })
    }
}

/// Rejects accesses falling strictly between the heap end and the stack
/// pointer. Both the access base and its upper bound are tested.
///
/// # Errors
///
/// Returns [`Fault::UninitializedAccess`] when either end of the access
/// interval lies in the open gap.
pub const fn validate_gap_access(
    addr: u32,
    size: MemSize,
    heap_end: u32,
    stack_pointer: u32,
) -> Result<(), Fault> {
    let upper = addr.wrapping_add(size.bytes());
    if (addr > heap_end && addr < stack_pointer) || (upper > heap_end && upper < stack_pointer) {
        Err(Fault::UninitializedAccess { addr })
    } else {
        Ok(())
    }
}

/// Rejects stores whose window overlaps the loaded text segment.
///
/// The window opens `window.bytes() - 1` bytes below `text_begin` and closes
/// at `max_pc` inclusive, evaluated in the signed 32-bit domain so a text
/// base of zero keeps its just-below-zero guard band.
///
/// # Errors
///
/// Returns [`Fault::ReadOnlyText`] when the store falls in the window.
#[allow(clippy::cast_possible_wrap)]
pub const fn validate_text_store(
    addr: u32,
    window: MemSize,
    text_begin: u32,
    max_pc: u32,
) -> Result<(), Fault> {
    let a = addr as i32 as i64;
    let lo = (text_begin as i32 as i64) + 1 - (window.bytes() as i64);
    let hi = max_pc as i32 as i64;
    if lo <= a && a <= hi {
        Err(Fault::ReadOnlyText { addr })
    } else {
        Ok(())
    }
}

/// Rejects heap growth that would reach or pass the stack pointer.
///
/// # Errors
///
/// Returns [`Fault::HeapCollision`] when `heap_end + bytes >= stack_pointer`.
pub const fn validate_heap_growth(
    heap_end: u32,
    bytes: u32,
    stack_pointer: u32,
) -> Result<(), Fault> {
    let requested = heap_end.wrapping_add(bytes);
    if requested >= stack_pointer {
        Err(Fault::HeapCollision { requested })
    } else {
        Ok(())
    }
}
