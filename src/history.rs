//! Shift registers used to track global and path history.

use bitvec::prelude::*;

/// A fixed-capacity history register.
///
/// Bit 0 is always the most-recently inserted bit. Inserting a new bit moves
/// every other bit up by one position, and the oldest bit falls off the end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRegister {
    data: BitVec<usize, Lsb0>,
    len: usize,
}

// NOTE: This *reverses* the all of the bits and presents them in a format
// where the leftmost bit is the oldest (index n) and the rightmost bit is
// the newest (index 0).
impl std::fmt::Display for HistoryRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let x: String = self.data.as_bitslice().iter().by_vals()
            .map(|b| if b { '1' } else { '0' })
            .rev()
            .collect();
        write!(f, "{}", x)
    }
}

impl HistoryRegister {
    /// Create a register with the specified length in bits.
    /// All bits in the register are initialized to zero.
    pub fn new(len: usize) -> Self {
        Self {
            data: bitvec![usize, Lsb0; 0; len],
            len,
        }
    }

    pub fn len(&self) -> usize { self.len }
    pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Clear all bits.
    pub fn reset(&mut self) {
        self.data.fill(false);
    }

    /// Shift the register by one bit and insert a new bit at index 0.
    /// The oldest bit is discarded.
    pub fn shift_in(&mut self, bit: bool) {
        if self.is_empty() {
            return;
        }
        self.data.shift_right(1);
        self.data.set(0, bit);
    }
}

impl HistoryRegister {
    /// Read the newest `n` bits as an integer. The newest bit ends up as the
    /// most-significant bit of the result.
    pub fn prefix(&self, n: usize) -> u64 {
        let n = n.min(self.len);
        assert!(n <= 64, "prefix of {} bits doesn't fit in a u64", n);
        self.data[..n].iter().by_vals()
            .fold(0, |acc, b| (acc << 1) | b as u64)
    }

    /// Fold [with XOR] the newest `in_size` bits into `out_size` bits.
    ///
    /// Bits are consumed newest-first in chunks of `out_size`. Within a chunk
    /// the first bit consumed ends up most-significant, and any trailing
    /// partial chunk is XOR'ed in as-is.
    pub fn fold(&self, in_size: usize, out_size: usize) -> u64 {
        assert!((1..64).contains(&out_size), "invalid fold width {}", out_size);
        let n = in_size.min(self.len);
        self.data[..n].chunks(out_size).fold(0, |res, chunk| {
            let val = chunk.iter().by_vals()
                .fold(0u64, |acc, b| (acc << 1) | b as u64);
            res ^ val
        })
    }
}
