// Licensed under the Apache-2.0 license

//! Bit-field helpers for POWER register layouts.
//!
//! POWER documentation numbers register bits MSB-first: bit 0 is the most
//! significant bit. These helpers keep register definitions in that
//! numbering so they can be checked against the hardware manuals directly.

/// Single bit `bit` of a 32-bit register, MSB-0 numbering.
#[must_use]
pub const fn ppc_bit32(bit: u32) -> u32 {
    0x8000_0000 >> bit
}

/// Bits `first..=last` of a 32-bit register, MSB-0 numbering.
#[must_use]
pub const fn ppc_bitmask32(first: u32, last: u32) -> u32 {
    (u32::MAX >> first) & (u32::MAX << (31 - last))
}

/// Single bit `bit` of a 64-bit register, MSB-0 numbering.
#[must_use]
pub const fn ppc_bit64(bit: u32) -> u64 {
    0x8000_0000_0000_0000 >> bit
}

/// Extract the field selected by `mask` from `value`, right-aligned.
#[must_use]
pub const fn get_field(mask: u32, value: u32) -> u32 {
    (value & mask) >> mask.trailing_zeros()
}

/// Replace the field selected by `mask` in `value` with `field`.
///
/// Bits of `field` that do not fit in the mask are dropped.
#[must_use]
pub const fn set_field(mask: u32, value: u32, field: u32) -> u32 {
    (value & !mask) | ((field << mask.trailing_zeros()) & mask)
}
