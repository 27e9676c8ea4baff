//! In-memory paletted storage for block states and biomes.
//!
//! Values are kept in a local palette with packed indices whose width grows as new values are
//! added. The wire palette of a given version is built from this by the serializer.

use crate::bitstorage::{bits_for, BitStorage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PalettedContainer {
    palette: Vec<u32>,
    storage: BitStorage,
}

impl PalettedContainer {
    /// `size` entries all holding `value`.
    pub fn single(size: usize, value: u32) -> Self {
        Self {
            palette: vec![value],
            storage: BitStorage::new(0, size, true),
        }
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Distinct values in order of first insertion. May hold values no entry uses any more.
    pub fn palette(&self) -> &[u32] {
        &self.palette
    }

    pub fn bits(&self) -> u8 {
        self.storage.bits()
    }

    /// Palette index of entry `index`.
    pub fn palette_index(&self, index: usize) -> usize {
        self.storage.get(index) as usize
    }

    pub fn get(&self, index: usize) -> u32 {
        self.palette
            .get(self.palette_index(index))
            .copied()
            .unwrap_or(self.palette[0])
    }

    pub fn set(&mut self, index: usize, value: u32) {
        if index >= self.len() {
            return;
        }
        let palette_index = match self.palette.iter().position(|&v| v == value) {
            Some(existing) => existing,
            None => {
                self.palette.push(value);
                let needed = bits_for(self.palette.len());
                if needed > self.storage.bits() {
                    self.storage = self.storage.repack(needed, true);
                }
                self.palette.len() - 1
            }
        };
        self.storage.set(index, palette_index as u32);
    }

    /// Every value in entry order.
    pub fn values(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len()).map(move |index| self.get(index))
    }

    pub fn fill(&mut self, value: u32) {
        *self = Self::single(self.len(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_value() {
        let container = PalettedContainer::single(4096, 7);
        assert_eq!(container.bits(), 0);
        assert_eq!(container.get(0), 7);
        assert_eq!(container.get(4095), 7);
        assert!(container.values().all(|v| v == 7));
    }

    #[test]
    fn test_growth_keeps_values() {
        let mut container = PalettedContainer::single(64, 0);
        for index in 0..64 {
            container.set(index, (index % 20) as u32);
        }
        assert_eq!(container.palette().len(), 20);
        assert_eq!(container.bits(), 5);
        for index in 0..64 {
            assert_eq!(container.get(index), (index % 20) as u32);
        }
    }

    #[test]
    fn test_fill_resets_palette() {
        let mut container = PalettedContainer::single(64, 0);
        container.set(3, 9);
        container.fill(2);
        assert_eq!(container.palette(), &[2]);
        assert_eq!(container.get(3), 2);
    }
}
