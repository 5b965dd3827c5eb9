use crate::fault::Fault;

/// Byte length of one instruction, announced by the continuation bits of its
/// first halfword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum InstrLength {
    /// Compressed 16-bit encoding.
    Two = 2,
    /// Standard 32-bit encoding.
    Four = 4,
    /// Extended 48-bit encoding.
    Six = 6,
    /// Extended 64-bit encoding.
    Eight = 8,
}

impl InstrLength {
    /// Length in bytes.
    #[must_use]
    pub const fn bytes(self) -> u32 {
        self as u32
    }

    /// Number of 16-bit parcels making up the instruction.
    #[must_use]
    pub const fn halfwords(self) -> u32 {
        self.bytes() / 2
    }

    /// Decodes the length from the first fetched halfword.
    ///
    /// Two unless the low two bits are `11`; four unless the low five bits
    /// are `11111`; six when the low six bits are `011111`; eight when the
    /// low seven bits are `0111111`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::UnsupportedLength`] for the reserved patterns that
    /// announce encodings longer than 8 bytes.
    pub const fn from_first_halfword(first: u16) -> Result<Self, Fault> {
        if first & 0b11 != 0b11 {
            Ok(Self::Two)
        } else if first & 0b1_1111 != 0b1_1111 {
            Ok(Self::Four)
        } else if first & 0b11_1111 == 0b01_1111 {
            Ok(Self::Six)
        } else if first & 0b111_1111 == 0b011_1111 {
            Ok(Self::Eight)
        } else {
            Err(Fault::UnsupportedLength {
                first_halfword: first,
            })
        }
    }
}

/// Named bit slices of the 32-bit base encoding.
///
/// Slices address the low word of the machine code; the variable-length
/// container may carry more bits, but every discriminating field of the
/// shipped formats lives in the first word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum InstructionField {
    /// The whole low word.
    Entire,
    /// Primary opcode, bits 0..7.
    Opcode,
    /// Destination register, bits 7..12.
    Rd,
    /// Minor opcode, bits 12..15.
    Funct3,
    /// First source register, bits 15..20.
    Rs1,
    /// Second source register, bits 20..25.
    Rs2,
    /// Major opcode extension, bits 25..32.
    Funct7,
    /// Two-bit extension used by fused formats, bits 25..27.
    Funct2,
    /// Third source register, bits 27..32.
    Rs3,
    /// Shift amount, bits 20..25.
    Shamt,
    /// I-type immediate slice, bits 20..32.
    ImmI,
    /// Low S-type immediate slice, bits 7..12.
    ImmSBottom,
    /// High S-type immediate slice, bits 25..32.
    ImmSTop,
    /// U-type immediate slice, bits 12..32.
    ImmU,
}

impl InstructionField {
    /// Bit range of the field as `(low, high)`, high exclusive.
    #[must_use]
    pub const fn range(self) -> (u32, u32) {
        match self {
            Self::Entire => (0, 32),
            Self::Opcode => (0, 7),
            Self::Rd | Self::ImmSBottom => (7, 12),
            Self::Funct3 => (12, 15),
            Self::Rs1 => (15, 20),
            Self::Rs2 | Self::Shamt => (20, 25),
            Self::Funct7 | Self::ImmSTop => (25, 32),
            Self::Funct2 => (25, 27),
            Self::Rs3 => (27, 32),
            Self::ImmI => (20, 32),
            Self::ImmU => (12, 32),
        }
    }
}

/// One fetched instruction: raw bits plus the announced byte length.
///
/// Bits beyond the low word are kept for 6- and 8-byte encodings; field
/// extraction always addresses the low word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MachineCode {
    bits: u64,
    length: InstrLength,
}

impl MachineCode {
    /// Wraps raw bits with their announced length.
    #[must_use]
    pub const fn new(bits: u64, length: InstrLength) -> Self {
        Self { bits, length }
    }

    /// Raw instruction bits.
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.bits
    }

    /// Low 32 bits, where every discriminating field lives.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn word(self) -> u32 {
        (self.bits & 0xFFFF_FFFF) as u32
    }

    /// Announced byte length.
    #[must_use]
    pub const fn length(self) -> InstrLength {
        self.length
    }

    /// Extracts a named field from the low word.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn field(self, field: InstructionField) -> u32 {
        let (lo, hi) = field.range();
        let mask = if hi - lo >= 32 {
            u32::MAX
        } else {
            (1u32 << (hi - lo)) - 1
        };
        ((self.bits >> lo) as u32) & mask
    }

    /// Writes a named field into the low word, truncating `value` to the
    /// field width.
    pub const fn set_field(&mut self, field: InstructionField, value: u32) {
        let (lo, hi) = field.range();
        let mask = if hi - lo >= 32 {
            0xFFFF_FFFFu64
        } else {
            (1u64 << (hi - lo)) - 1
        };
        self.bits = (self.bits & !(mask << lo)) | (((value as u64) & mask) << lo);
    }
}
