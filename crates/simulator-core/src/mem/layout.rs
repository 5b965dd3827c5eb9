/// Default base of the program text segment.
pub const DEFAULT_TEXT_BEGIN: u32 = 0x0000_0000;
/// Default base of the static data segment.
pub const DEFAULT_STATIC_BEGIN: u32 = 0x1000_0000;
/// Default initial heap end.
pub const DEFAULT_HEAP_BEGIN: u32 = 0x1000_8000;
/// Default initial stack pointer sentinel.
pub const DEFAULT_STACK_BEGIN: u32 = 0x7FFF_FFF0;

/// Segment base addresses a simulator is constructed with.
///
/// The bases are configuration supplied by the embedder, not computed by the
/// core; the defaults match the conventional teaching layout with text at
/// the bottom of the address space and the stack just below `0x8000_0000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SegmentLayout {
    /// First byte of program text; instruction copying starts here.
    pub text_begin: u32,
    /// First byte of the static data segment.
    pub static_begin: u32,
    /// Initial heap end before any data is loaded.
    pub heap_begin: u32,
    /// Initial stack pointer; argument marshalling walks down from here.
    pub stack_begin: u32,
}

impl Default for SegmentLayout {
    fn default() -> Self {
        Self {
            text_begin: DEFAULT_TEXT_BEGIN,
            static_begin: DEFAULT_STATIC_BEGIN,
            heap_begin: DEFAULT_HEAP_BEGIN,
            stack_begin: DEFAULT_STACK_BEGIN,
        }
    }
}

const fn assert_default_segment_order() {
    assert!(DEFAULT_TEXT_BEGIN < DEFAULT_STATIC_BEGIN);
    assert!(DEFAULT_STATIC_BEGIN < DEFAULT_HEAP_BEGIN);
    assert!(DEFAULT_HEAP_BEGIN < DEFAULT_STACK_BEGIN);
}

const _: () = assert_default_segment_order();

#[cfg(test)]
mod tests {
    use super::SegmentLayout;

    #[test]
    fn default_layout_matches_conventional_bases() {
        let layout = SegmentLayout::default();
        assert_eq!(layout.text_begin, 0x0000_0000);
        assert_eq!(layout.static_begin, 0x1000_0000);
        assert_eq!(layout.heap_begin, 0x1000_8000);
        assert_eq!(layout.stack_begin, 0x7FFF_FFF0);
    }
}
