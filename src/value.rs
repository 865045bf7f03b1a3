// SPDX-License-Identifier: Apache-2.0

//! Concrete bit-vector numerals.

use std::fmt;

use bitvec::prelude::*;

/// A fixed-width unsigned numeral; index 0 of `bits` is the LSB.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BvValue {
    bits: BitVec,
}

impl BvValue {
    pub fn from_bits(bits: BitVec) -> Self {
        BvValue { bits }
    }

    /// Builds a `width`-bit numeral from `value`, truncating modulo 2^width.
    pub fn from_u64(value: u64, width: usize) -> Self {
        let bits = (0..width)
            .map(|i| i < 64 && (value >> i) & 1 == 1)
            .collect();
        BvValue { bits }
    }

    pub fn zero(width: usize) -> Self {
        BvValue {
            bits: BitVec::repeat(false, width),
        }
    }

    pub fn width(&self) -> usize {
        self.bits.len()
    }

    pub fn bit(&self, index: usize) -> bool {
        self.bits[index]
    }

    pub fn bits(&self) -> &BitSlice {
        &self.bits
    }

    /// The value as a `u64`, when every set bit fits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.bits.iter_ones().any(|i| i >= 64) {
            return None;
        }
        Some(
            self.bits
                .iter_ones()
                .fold(0u64, |acc, i| acc | (1u64 << i)),
        )
    }
}

impl fmt::Display for BvValue {
    /// SMT-LIB binary literal, most significant bit first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#b")?;
        for bit in self.bits.iter().rev() {
            write!(f, "{}", if *bit { '1' } else { '0' })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_u64_truncates() {
        let v = BvValue::from_u64(0x1f, 4);
        assert_eq!(v.to_u64(), Some(0xf));
        assert_eq!(v.width(), 4);
        assert_eq!(v.to_string(), "#b1111");
    }

    #[test]
    fn test_wide_values() {
        let mut bits: BitVec = BitVec::repeat(false, 70);
        bits.set(65, true);
        let v = BvValue::from_bits(bits);
        assert_eq!(v.to_u64(), None);
        assert_eq!(BvValue::from_u64(5, 70).to_u64(), Some(5));
    }

    #[test]
    fn test_display_msb_first() {
        assert_eq!(BvValue::from_u64(0b0110, 4).to_string(), "#b0110");
        assert_eq!(BvValue::zero(2).to_string(), "#b00");
    }
}
