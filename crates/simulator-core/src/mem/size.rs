use core::fmt;

/// Size classes for memory accesses, each with a natural alignment equal to
/// its byte width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum MemSize {
    /// Single byte access.
    Byte = 1,
    /// 16-bit halfword access.
    Half = 2,
    /// 32-bit word access.
    Word = 4,
    /// 64-bit long access.
    Long = 8,
    /// 128-bit quad access.
    Quad = 16,
}

impl MemSize {
    /// Number of bytes covered by one access of this size class.
    #[must_use]
    pub const fn bytes(self) -> u32 {
        self as u32
    }

    /// Tests the natural alignment requirement `addr mod size == 0`.
    #[must_use]
    pub const fn is_aligned(self, addr: u32) -> bool {
        addr % self.bytes() == 0
    }
}

impl fmt::Display for MemSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Byte => "byte",
            Self::Half => "half",
            Self::Word => "word",
            Self::Long => "long",
            Self::Quad => "quad",
        })
    }
}
