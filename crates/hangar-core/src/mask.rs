// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! # Fixed-Width Bit Masks
//!
//! `BitMask<W>` is a set of positions `0..W::BITS` stored in a single unsigned
//! primitive. The allocation engine uses it for candidate sets: one mask per
//! craft slot listing the hangar slots it may use, and the transposed mask per
//! hangar slot listing the craft slots that may use it.
//!
//! The width of `W` is the hard capacity bound of everything built on top of
//! it. Operations never allocate and compile down to a handful of integer
//! instructions.
//!
//! Besides the usual set algebra the type offers the two primitives the
//! canonical-order backtracking search is built on:
//!
//! - `lowest`: isolates the lowest set bit (`x & !(x - 1)`).
//! - `above`: all positions strictly above the lowest set bit (`!(x | (x - 1))`),
//!   or every position when the mask is empty.
//!
//! ```rust
//! use hangar_core::mask::BitMask;
//!
//! let m: BitMask<u16> = [1, 4, 6].into_iter().collect();
//! assert_eq!(m.len(), 3);
//! assert_eq!(m.lowest(), BitMask::single(1));
//! assert_eq!((m & BitMask::single(4).above()).first(), Some(6));
//! ```

use num_traits::{PrimInt, Unsigned};

/// A set of positions backed by the unsigned primitive `W`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BitMask<W> {
    bits: W,
}

impl<W> BitMask<W>
where
    W: PrimInt + Unsigned,
{
    /// Number of positions the mask can hold.
    pub const WIDTH: usize = std::mem::size_of::<W>() * 8;

    /// The empty set.
    #[inline(always)]
    pub fn empty() -> Self {
        Self { bits: W::zero() }
    }

    /// The set containing every position `0..WIDTH`.
    #[inline(always)]
    pub fn full() -> Self {
        Self {
            bits: W::max_value(),
        }
    }

    /// The set containing positions `0..len`.
    #[inline]
    pub fn prefix(len: usize) -> Self {
        debug_assert!(
            len <= Self::WIDTH,
            "called `BitMask::prefix` with length out of bounds: the width is {} but the length is {}",
            Self::WIDTH,
            len
        );

        if len >= Self::WIDTH {
            Self::full()
        } else {
            Self {
                bits: (W::one() << len) - W::one(),
            }
        }
    }

    /// Wraps raw bits.
    #[inline(always)]
    pub fn from_bits(bits: W) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    #[inline(always)]
    pub fn bits(&self) -> W {
        self.bits
    }

    /// The set containing only `pos`.
    #[inline(always)]
    pub fn single(pos: usize) -> Self {
        debug_assert!(
            pos < Self::WIDTH,
            "called `BitMask::single` with position out of bounds: the width is {} but the position is {}",
            Self::WIDTH,
            pos
        );

        Self {
            bits: W::one() << pos,
        }
    }

    #[inline(always)]
    pub fn contains(&self, pos: usize) -> bool {
        debug_assert!(
            pos < Self::WIDTH,
            "called `BitMask::contains` with position out of bounds: the width is {} but the position is {}",
            Self::WIDTH,
            pos
        );

        (self.bits & (W::one() << pos)) != W::zero()
    }

    #[inline(always)]
    pub fn insert(&mut self, pos: usize) {
        self.bits = self.bits | Self::single(pos).bits;
    }

    #[inline(always)]
    pub fn remove(&mut self, pos: usize) {
        self.bits = self.bits & !Self::single(pos).bits;
    }

    /// Inserts or removes `pos` depending on `value`.
    #[inline(always)]
    pub fn set(&mut self, pos: usize, value: bool) {
        if value {
            self.insert(pos);
        } else {
            self.remove(pos);
        }
    }

    /// Number of positions in the set.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bits == W::zero()
    }

    /// Isolates the lowest position of the set; empty if the set is empty.
    #[inline(always)]
    pub fn lowest(&self) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self {
            bits: self.bits & !(self.bits - W::one()),
        }
    }

    /// All positions strictly above the lowest position of `self`.
    ///
    /// For an empty mask this is every position, so a search that has not
    /// picked anything yet at some depth may start from the bottom.
    #[inline(always)]
    pub fn above(&self) -> Self {
        if self.is_empty() {
            return Self::full();
        }
        let low = self.lowest().bits;
        Self {
            bits: !(low | (low - W::one())),
        }
    }

    /// Returns the lowest position of the set.
    #[inline(always)]
    pub fn first(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.bits.trailing_zeros() as usize)
        }
    }

    #[inline(always)]
    pub fn intersects(&self, other: Self) -> bool {
        (self.bits & other.bits) != W::zero()
    }

    #[inline(always)]
    pub fn is_subset_of(&self, other: Self) -> bool {
        (self.bits & !other.bits) == W::zero()
    }

    #[inline(always)]
    pub fn union(&self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    #[inline(always)]
    pub fn intersection(&self, other: Self) -> Self {
        Self {
            bits: self.bits & other.bits,
        }
    }

    #[inline(always)]
    pub fn difference(&self, other: Self) -> Self {
        Self {
            bits: self.bits & !other.bits,
        }
    }

    /// Iterates over the positions in ascending order.
    #[inline]
    pub fn iter(&self) -> BitMaskIter<W> {
        BitMaskIter { rest: *self }
    }
}

impl<W> std::ops::BitAnd for BitMask<W>
where
    W: PrimInt + Unsigned,
{
    type Output = Self;

    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self::Output {
        self.intersection(rhs)
    }
}

impl<W> std::ops::BitOr for BitMask<W>
where
    W: PrimInt + Unsigned,
{
    type Output = Self;

    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl<W> std::ops::Not for BitMask<W>
where
    W: PrimInt + Unsigned,
{
    type Output = Self;

    #[inline(always)]
    fn not(self) -> Self::Output {
        Self { bits: !self.bits }
    }
}

impl<W> std::ops::BitAndAssign for BitMask<W>
where
    W: PrimInt + Unsigned,
{
    #[inline(always)]
    fn bitand_assign(&mut self, rhs: Self) {
        self.bits = self.bits & rhs.bits;
    }
}

impl<W> std::ops::BitOrAssign for BitMask<W>
where
    W: PrimInt + Unsigned,
{
    #[inline(always)]
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits = self.bits | rhs.bits;
    }
}

impl<W> FromIterator<usize> for BitMask<W>
where
    W: PrimInt + Unsigned,
{
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut mask = Self::empty();
        for pos in iter {
            mask.insert(pos);
        }
        mask
    }
}

impl<W> IntoIterator for BitMask<W>
where
    W: PrimInt + Unsigned,
{
    type Item = usize;
    type IntoIter = BitMaskIter<W>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<W> std::fmt::Debug for BitMask<W>
where
    W: PrimInt + Unsigned,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BitMask")?;
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<W> std::fmt::Display for BitMask<W>
where
    W: PrimInt + Unsigned,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Ascending iterator over the positions of a `BitMask`.
#[derive(Clone)]
pub struct BitMaskIter<W> {
    rest: BitMask<W>,
}

impl<W> std::fmt::Debug for BitMaskIter<W>
where
    W: PrimInt + Unsigned,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitMaskIter").field("rest", &self.rest).finish()
    }
}

impl<W> Iterator for BitMaskIter<W>
where
    W: PrimInt + Unsigned,
{
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let pos = self.rest.first()?;
        self.rest = self.rest.difference(self.rest.lowest());
        Some(pos)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.rest.len();
        (len, Some(len))
    }
}

impl<W> ExactSizeIterator for BitMaskIter<W> where W: PrimInt + Unsigned {}

impl<W> std::iter::FusedIterator for BitMaskIter<W> where W: PrimInt + Unsigned {}
