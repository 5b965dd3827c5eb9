use core::fmt::Debug;
use core::hash::Hash;

/// Register-width variant of a simulator instance.
///
/// Exactly one implementation is selected per instance, at construction,
/// through the type parameter; instruction evaluators are written once
/// against this trait instead of once per width. The address space stays
/// 32-bit for every variant: register values used as addresses pass through
/// [`Xlen::to_addr`].
pub trait Xlen: Copy + Clone + Debug + PartialEq + Eq + Hash + Default + 'static {
    /// Raw register cell.
    type Reg: Copy
        + Clone
        + Debug
        + Default
        + PartialEq
        + Eq
        + PartialOrd
        + Ord
        + Hash
        + 'static;

    /// Register width in bits.
    const BITS: u32;

    /// Truncates or zero-extends a 32-bit value into a register.
    #[must_use]
    fn from_u32(value: u32) -> Self::Reg;

    /// Truncates or sign-extends a signed 32-bit value into a register.
    #[must_use]
    fn from_i32(value: i32) -> Self::Reg;

    /// Truncates or zero-extends a 64-bit value into a register.
    #[must_use]
    fn from_u64(value: u64) -> Self::Reg;

    /// Register value as a byte address: narrower registers sign-extend,
    /// wider ones keep their low 32 bits.
    #[must_use]
    fn to_addr(value: Self::Reg) -> u32;

    /// Low 64 register bits, zero-extended.
    #[must_use]
    fn to_u64(value: Self::Reg) -> u64;

    /// Register value as a signed 64-bit number; narrower registers
    /// sign-extend, the 128-bit variant keeps its low 64 bits.
    #[must_use]
    fn to_i64(value: Self::Reg) -> i64;

    /// Modular addition at register width.
    #[must_use]
    fn wrapping_add(a: Self::Reg, b: Self::Reg) -> Self::Reg;

    /// Modular subtraction at register width.
    #[must_use]
    fn wrapping_sub(a: Self::Reg, b: Self::Reg) -> Self::Reg;

    /// Bitwise and.
    #[must_use]
    fn and(a: Self::Reg, b: Self::Reg) -> Self::Reg;

    /// Bitwise or.
    #[must_use]
    fn or(a: Self::Reg, b: Self::Reg) -> Self::Reg;

    /// Bitwise exclusive or.
    #[must_use]
    fn xor(a: Self::Reg, b: Self::Reg) -> Self::Reg;

    /// Logical left shift; the amount wraps at the register width.
    #[must_use]
    fn shl(value: Self::Reg, amount: u32) -> Self::Reg;

    /// Logical right shift; the amount wraps at the register width.
    #[must_use]
    fn shr(value: Self::Reg, amount: u32) -> Self::Reg;

    /// Arithmetic right shift; the amount wraps at the register width.
    #[must_use]
    fn sra(value: Self::Reg, amount: u32) -> Self::Reg;

    /// Signed less-than at register width.
    #[must_use]
    fn lt_signed(a: Self::Reg, b: Self::Reg) -> bool;

    /// Unsigned less-than at register width.
    #[must_use]
    fn lt_unsigned(a: Self::Reg, b: Self::Reg) -> bool;
}

macro_rules! impl_xlen {
    ($width:ident, $reg:ty, $sreg:ty, $bits:expr) => {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_possible_wrap,
            clippy::cast_lossless
        )]
        impl Xlen for $width {
            type Reg = $reg;

            const BITS: u32 = $bits;

            fn from_u32(value: u32) -> Self::Reg {
                value as $reg
            }

            fn from_i32(value: i32) -> Self::Reg {
                value as $reg
            }

            fn from_u64(value: u64) -> Self::Reg {
                value as $reg
            }

            fn to_addr(value: Self::Reg) -> u32 {
                (value as $sreg) as i64 as u32
            }

            fn to_u64(value: Self::Reg) -> u64 {
                value as u64
            }

            fn to_i64(value: Self::Reg) -> i64 {
                (value as $sreg) as i64
            }

            fn wrapping_add(a: Self::Reg, b: Self::Reg) -> Self::Reg {
                a.wrapping_add(b)
            }

            fn wrapping_sub(a: Self::Reg, b: Self::Reg) -> Self::Reg {
                a.wrapping_sub(b)
            }

            fn and(a: Self::Reg, b: Self::Reg) -> Self::Reg {
                a & b
            }

            fn or(a: Self::Reg, b: Self::Reg) -> Self::Reg {
                a | b
            }

            fn xor(a: Self::Reg, b: Self::Reg) -> Self::Reg {
                a ^ b
            }

            fn shl(value: Self::Reg, amount: u32) -> Self::Reg {
                value.wrapping_shl(amount)
            }

            fn shr(value: Self::Reg, amount: u32) -> Self::Reg {
                value.wrapping_shr(amount)
            }

            fn sra(value: Self::Reg, amount: u32) -> Self::Reg {
                (value as $sreg).wrapping_shr(amount) as $reg
            }

            fn lt_signed(a: Self::Reg, b: Self::Reg) -> bool {
                (a as $sreg) < (b as $sreg)
            }

            fn lt_unsigned(a: Self::Reg, b: Self::Reg) -> bool {
                a < b
            }
        }
    };
}

/// 16-bit register-width variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rv16;

/// 32-bit register-width variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rv32;

/// 64-bit register-width variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rv64;

/// 128-bit register-width variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rv128;

impl_xlen!(Rv16, u16, i16, 16);
impl_xlen!(Rv32, u32, i32, 32);
impl_xlen!(Rv64, u64, i64, 64);
impl_xlen!(Rv128, u128, i128, 128);

#[cfg(test)]
mod tests {
    use super::{Rv128, Rv16, Rv32, Rv64, Xlen};

    #[test]
    fn conversions_truncate_and_extend_per_width() {
        assert_eq!(Rv16::from_u32(0x0001_0005), 0x0005);
        assert_eq!(Rv32::from_u32(0xFFFF_FFFF), 0xFFFF_FFFF);
        assert_eq!(Rv64::from_i32(-1), u64::MAX);
        assert_eq!(Rv128::from_i32(-2), u128::MAX - 1);
        assert_eq!(Rv64::from_u32(0x8000_0000), 0x8000_0000);
    }

    #[test]
    fn addresses_sign_extend_from_narrow_registers() {
        assert_eq!(Rv16::to_addr(0x8000), 0xFFFF_8000);
        assert_eq!(Rv16::to_addr(0x7FFF), 0x7FFF);
        assert_eq!(Rv32::to_addr(0xFFFF_FFFF), 0xFFFF_FFFF);
        assert_eq!(Rv64::to_addr(0x1_2345_6789), 0x2345_6789);
        assert_eq!(Rv128::to_addr(0xAB_0000_0001), 0x0000_0001);
    }

    #[test]
    fn arithmetic_wraps_at_register_width() {
        assert_eq!(Rv32::wrapping_add(0x7FFF_FFFF, 1), 0x8000_0000);
        assert_eq!(Rv16::wrapping_add(0xFFFF, 1), 0);
        assert_eq!(Rv64::wrapping_sub(0, 1), u64::MAX);
        assert_eq!(Rv128::wrapping_add(u128::MAX, 2), 1);
    }

    #[test]
    fn shifts_wrap_their_amount_at_register_width() {
        assert_eq!(Rv32::shl(1, 33), 2);
        assert_eq!(Rv16::shl(1, 17), 2);
        assert_eq!(Rv32::shr(0x8000_0000, 31), 1);
        assert_eq!(Rv32::sra(0x8000_0000, 31), 0xFFFF_FFFF);
        assert_eq!(Rv64::sra(0x8000_0000_0000_0000, 63), u64::MAX);
    }

    #[test]
    fn comparisons_respect_signedness() {
        assert!(Rv32::lt_signed(0xFFFF_FFFF, 0));
        assert!(!Rv32::lt_unsigned(0xFFFF_FFFF, 0));
        assert!(Rv16::lt_signed(0x8000, 0x7FFF));
        assert!(Rv16::lt_unsigned(0x7FFF, 0x8000));
    }

    #[test]
    fn signed_views_extend_to_sixty_four_bits() {
        assert_eq!(Rv16::to_i64(0xFFFF), -1);
        assert_eq!(Rv32::to_i64(0x8000_0000), i64::from(i32::MIN));
        assert_eq!(Rv64::to_u64(42), 42);
        assert_eq!(Rv128::to_i64(u128::from(u64::MAX)), -1);
    }
}
