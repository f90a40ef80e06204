//! Growable bit sequence shared by every codec as its output format.
//!
//! [`BitStream`] stores one `bool` per bit, 0-indexed in emission order.
//! Integers are appended big-endian (most significant bit first), which is
//! also the order [`BitReader`] reads them back in.
//!
//! # Example
//! ```
//! use textcodecs::bitstream::{BitReader, BitStream};
//!
//! let mut bits = BitStream::new();
//! bits.push_bits(0b101, 3);
//! bits.push_u8(0x0F);
//! assert_eq!(bits.to_string(), "10100001111");
//!
//! let mut reader = BitReader::new(&bits);
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! assert_eq!(reader.read_bits(8).unwrap(), 0x0F);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// An append-only, randomly readable sequence of bits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BitStream {
    bits: Vec<bool>,
}

impl BitStream {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self { bits: Vec::new() }
    }

    /// Create an empty stream with room for `capacity` bits.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: Vec::with_capacity(capacity),
        }
    }

    /// Number of bits in the stream.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether the stream holds no bits.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Append a single bit.
    pub fn push_bit(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// Append the low `width` bits of `value`, most significant first.
    ///
    /// # Panics
    /// Panics if `width > 64`.
    pub fn push_bits(&mut self, value: u64, width: usize) {
        assert!(width <= 64, "bit width {width} exceeds 64");
        self.bits.reserve(width);
        for shift in (0..width).rev() {
            self.bits.push((value >> shift) & 1 == 1);
        }
    }

    /// Append an 8-bit big-endian field.
    pub fn push_u8(&mut self, value: u8) {
        self.push_bits(value as u64, 8);
    }

    /// Append a 16-bit big-endian field.
    pub fn push_u16(&mut self, value: u16) {
        self.push_bits(value as u64, 16);
    }

    /// Append a 32-bit big-endian field.
    pub fn push_u32(&mut self, value: u32) {
        self.push_bits(value as u64, 32);
    }

    /// Append a 64-bit big-endian field.
    pub fn push_u64(&mut self, value: u64) {
        self.push_bits(value, 64);
    }

    /// Append anything with a natural bit encoding: scalars, other streams,
    /// and ordered containers of those (element by element).
    pub fn append<T: AppendBits + ?Sized>(&mut self, value: &T) {
        value.append_to(self);
    }

    /// Remove and return the last bit.
    pub fn pop(&mut self) -> Option<bool> {
        self.bits.pop()
    }

    /// Read the bit at `index`.
    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    /// Overwrite the bit at `index`, returning the previous value, or `None`
    /// if `index` is out of range.
    pub fn set(&mut self, index: usize, bit: bool) -> Option<bool> {
        self.bits
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, bit))
    }

    /// Iterate over the bits in order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    /// The bits as a slice.
    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    /// Render as one `'0'` or `'1'` per bit.
    pub fn to_bit_string(&self) -> String {
        self.bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
    }
}

impl std::ops::Index<usize> for BitStream {
    type Output = bool;

    fn index(&self, index: usize) -> &bool {
        &self.bits[index]
    }
}

impl fmt::Display for BitStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bit_string())
    }
}

impl FromStr for BitStream {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(Error::format(format!("unexpected character {other:?}"))),
            })
            .collect()
    }
}

impl FromIterator<bool> for BitStream {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

impl Extend<bool> for BitStream {
    fn extend<I: IntoIterator<Item = bool>>(&mut self, iter: I) {
        self.bits.extend(iter);
    }
}

impl<'a> IntoIterator for &'a BitStream {
    type Item = bool;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, bool>>;

    fn into_iter(self) -> Self::IntoIter {
        self.bits.iter().copied()
    }
}

/// Types with a natural bit encoding that can be appended to a [`BitStream`].
pub trait AppendBits {
    /// Append this value's bits to `bits`.
    fn append_to(&self, bits: &mut BitStream);
}

impl AppendBits for bool {
    fn append_to(&self, bits: &mut BitStream) {
        bits.push_bit(*self);
    }
}

macro_rules! append_unsigned {
    ($($t:ty),*) => {
        $(
            impl AppendBits for $t {
                fn append_to(&self, bits: &mut BitStream) {
                    bits.push_bits(*self as u64, <$t>::BITS as usize);
                }
            }
        )*
    };
}

append_unsigned!(u8, u16, u32, u64);

impl AppendBits for BitStream {
    fn append_to(&self, bits: &mut BitStream) {
        bits.bits.extend_from_slice(&self.bits);
    }
}

impl<T: AppendBits> AppendBits for [T] {
    fn append_to(&self, bits: &mut BitStream) {
        for item in self {
            item.append_to(bits);
        }
    }
}

impl<T: AppendBits, const N: usize> AppendBits for [T; N] {
    fn append_to(&self, bits: &mut BitStream) {
        self.as_slice().append_to(bits);
    }
}

impl<T: AppendBits> AppendBits for Vec<T> {
    fn append_to(&self, bits: &mut BitStream) {
        self.as_slice().append_to(bits);
    }
}

impl AppendBits for str {
    fn append_to(&self, bits: &mut BitStream) {
        self.as_bytes().append_to(bits);
    }
}

impl<T: AppendBits + ?Sized> AppendBits for &T {
    fn append_to(&self, bits: &mut BitStream) {
        (**self).append_to(bits);
    }
}

/// Sequential reader over a [`BitStream`].
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bits: &'a BitStream,
    position: usize,
}

impl<'a> BitReader<'a> {
    /// Start reading at the first bit.
    pub fn new(bits: &'a BitStream) -> Self {
        Self { bits, position: 0 }
    }

    /// Read one bit.
    ///
    /// # Errors
    /// Returns [`Error::Format`] at the end of the stream.
    pub fn read_bit(&mut self) -> Result<bool> {
        let bit = self
            .bits
            .get(self.position)
            .ok_or_else(|| Error::format("unexpected end of bit stream"))?;
        self.position += 1;
        Ok(bit)
    }

    /// Read a `width`-bit big-endian field (`width <= 64`).
    ///
    /// # Errors
    /// Returns [`Error::Format`] if fewer than `width` bits remain; nothing is
    /// consumed in that case.
    pub fn read_bits(&mut self, width: usize) -> Result<u64> {
        debug_assert!(width <= 64);
        if width > self.remaining() {
            return Err(Error::format(format!(
                "truncated field: requested {width} bits, {} available",
                self.remaining()
            )));
        }
        let value = self.bits.bits[self.position..self.position + width]
            .iter()
            .fold(0u64, |acc, &b| (acc << 1) | b as u64);
        self.position += width;
        Ok(value)
    }

    /// Number of unread bits.
    pub fn remaining(&self) -> usize {
        self.bits.len() - self.position
    }

    /// Index of the next bit to read.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether every bit has been read.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}
