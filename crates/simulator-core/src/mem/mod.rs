//! Memory model primitives: size classes, the sparse word-granular store,
//! segment layout, and access policy validators.

/// Segment base address configuration.
pub mod layout;
/// Alignment, gap, text, and heap policy helpers.
pub mod policy;
/// Access size classes with alignment predicates.
pub mod size;
/// Sparse little-endian backing store.
pub mod sparse;

pub use layout::{
    SegmentLayout, DEFAULT_HEAP_BEGIN, DEFAULT_STACK_BEGIN, DEFAULT_STATIC_BEGIN,
    DEFAULT_TEXT_BEGIN,
};
pub use policy::{
    validate_alignment, validate_gap_access, validate_heap_growth, validate_text_store,
};
pub use size::MemSize;
pub use sparse::{byte_mask, byte_shift, word_address, Memory};
