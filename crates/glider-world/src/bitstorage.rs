//! Fixed-width integers packed into longs.
//!
//! Two layouts exist on the wire. Spanning storage (before 1.16) packs entries back to back so
//! one entry may straddle two longs; padded storage (1.16 onwards) leaves the high bits of each
//! long unused so that no entry crosses a boundary.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitStorage {
    bits: u8,
    size: usize,
    padded: bool,
    data: Vec<u64>,
}

impl BitStorage {
    pub fn new(bits: u8, size: usize, padded: bool) -> Self {
        Self {
            bits,
            size,
            padded,
            data: vec![0; Self::longs_for(bits, size, padded)],
        }
    }

    /// Longs needed for `size` entries of `bits` each.
    pub fn longs_for(bits: u8, size: usize, padded: bool) -> usize {
        let bits = bits as usize;
        if bits == 0 {
            return 0;
        }
        if padded {
            let per_long = 64 / bits;
            (size + per_long - 1) / per_long
        } else {
            (size * bits + 63) / 64
        }
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn is_padded(&self) -> bool {
        self.padded
    }

    pub fn data(&self) -> &[u64] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u64> {
        self.data
    }

    fn mask(&self) -> u64 {
        if self.bits >= 64 {
            u64::MAX
        } else {
            (1u64 << self.bits) - 1
        }
    }

    /// Long index and bit offset of entry `index`.
    fn locate(&self, index: usize) -> (usize, usize) {
        let bits = self.bits as usize;
        if self.padded {
            let per_long = 64 / bits;
            (index / per_long, (index % per_long) * bits)
        } else {
            ((index * bits) / 64, (index * bits) % 64)
        }
    }

    pub fn get(&self, index: usize) -> u32 {
        if self.bits == 0 || index >= self.size {
            return 0;
        }
        let bits = self.bits as usize;
        let (long_index, bit_offset) = self.locate(index);
        let mut value = self.data[long_index] >> bit_offset;
        if bit_offset + bits > 64 {
            let bits_in_next = bit_offset + bits - 64;
            value |= (self.data[long_index + 1] & ((1u64 << bits_in_next) - 1)) << (bits - bits_in_next);
        }
        (value & self.mask()) as u32
    }

    pub fn set(&mut self, index: usize, value: u32) {
        if self.bits == 0 || index >= self.size {
            return;
        }
        let bits = self.bits as usize;
        let mask = self.mask();
        let value = value as u64 & mask;
        let (long_index, bit_offset) = self.locate(index);

        self.data[long_index] &= !(mask << bit_offset);
        self.data[long_index] |= value << bit_offset;

        if bit_offset + bits > 64 {
            let bits_in_next = bit_offset + bits - 64;
            let next = &mut self.data[long_index + 1];
            *next &= !((1u64 << bits_in_next) - 1);
            *next |= value >> (bits - bits_in_next);
        }
    }

    /// Copies every entry into storage with a different width or layout.
    pub fn repack(&self, bits: u8, padded: bool) -> BitStorage {
        let mut out = BitStorage::new(bits, self.size, padded);
        for index in 0..self.size {
            out.set(index, self.get(index));
        }
        out
    }
}

/// Bits needed to tell `count` different values apart. 0 for one or no values.
pub fn bits_for(count: usize) -> u8 {
    if count <= 1 {
        0
    } else {
        (usize::BITS - (count - 1).leading_zeros()) as u8
    }
}
