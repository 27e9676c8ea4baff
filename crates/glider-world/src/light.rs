/// Bytes in one light layer of a section: 4096 nibbles.
pub const LIGHT_SECTION_SIZE: usize = 2048;

/// Light levels (0-15) of one 16x16x16 section, two blocks per byte, low nibble first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightSection {
    data: Box<[u8; LIGHT_SECTION_SIZE]>,
}

impl Default for LightSection {
    fn default() -> Self {
        Self::new()
    }
}

impl LightSection {
    /// All dark.
    pub fn new() -> Self {
        Self::filled(0)
    }

    /// Every block at `level`.
    pub fn filled(level: u8) -> Self {
        let level = level & 0x0F;
        Self {
            data: Box::new([level | (level << 4); LIGHT_SECTION_SIZE]),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let data: [u8; LIGHT_SECTION_SIZE] = bytes.try_into().ok()?;
        Some(Self {
            data: Box::new(data),
        })
    }

    fn index(x: usize, y: usize, z: usize) -> usize {
        (y << 8) | (z << 4) | x
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        let index = Self::index(x & 15, y & 15, z & 15);
        let byte = self.data[index >> 1];
        if index & 1 == 0 {
            byte & 0x0F
        } else {
            byte >> 4
        }
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, level: u8) {
        let index = Self::index(x & 15, y & 15, z & 15);
        let byte = &mut self.data[index >> 1];
        let level = level & 0x0F;
        if index & 1 == 0 {
            *byte = (*byte & 0xF0) | level;
        } else {
            *byte = (*byte & 0x0F) | (level << 4);
        }
    }

    /// True when every level is 0. Such sections go in the "empty" light masks.
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&b| b == 0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nibble_order() {
        let mut light = LightSection::new();
        light.set(0, 0, 0, 15);
        light.set(1, 0, 0, 3);
        assert_eq!(light.as_bytes()[0], 0x3F);
        assert_eq!(light.get(0, 0, 0), 15);
        assert_eq!(light.get(1, 0, 0), 3);

        light.set(0, 1, 0, 7);
        assert_eq!(light.as_bytes()[128], 0x07);
    }

    #[test]
    fn test_empty_and_filled() {
        assert!(LightSection::new().is_empty());
        let full = LightSection::filled(15);
        assert!(!full.is_empty());
        assert!(full.as_bytes().iter().all(|&b| b == 0xFF));
        assert!(LightSection::from_bytes(&[0; 10]).is_none());
        assert_eq!(LightSection::from_bytes(full.as_bytes()), Some(full));
    }
}
