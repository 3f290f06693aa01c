use std::ops::{Index, IndexMut};

/// Number of colors in a palette.
pub const PALETTE_ENTRIES: usize = 256;

/// Size of the whole palette in bytes.
pub const PALETTE_SIZE: usize = PALETTE_ENTRIES * 3;

/// A single palette color.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl PaletteEntry {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// The 256 colors referenced by the pixel indices of an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: [PaletteEntry; PALETTE_ENTRIES],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            entries: [PaletteEntry::default(); PALETTE_ENTRIES],
        }
    }
}

impl Palette {
    /// Build a palette from packed `R, G, B` triples.
    ///
    /// Missing trailing entries stay black, extra bytes are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut palette = Self::default();

        for (entry, rgb) in palette.entries.iter_mut().zip(bytes.chunks_exact(3)) {
            *entry = PaletteEntry::new(rgb[0], rgb[1], rgb[2]);
        }

        palette
    }

    /// Pack the palette into its on-disk layout.
    pub fn to_bytes(&self) -> [u8; PALETTE_SIZE] {
        let mut bytes = [0u8; PALETTE_SIZE];

        for (rgb, entry) in bytes.chunks_exact_mut(3).zip(self.entries.iter()) {
            rgb.copy_from_slice(&[entry.red, entry.green, entry.blue]);
        }

        bytes
    }

    pub fn entries(&self) -> &[PaletteEntry; PALETTE_ENTRIES] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [PaletteEntry; PALETTE_ENTRIES] {
        &mut self.entries
    }
}

impl Index<u8> for Palette {
    type Output = PaletteEntry;

    fn index(&self, index: u8) -> &Self::Output {
        &self.entries[index as usize]
    }
}

impl IndexMut<u8> for Palette {
    fn index_mut(&mut self, index: u8) -> &mut Self::Output {
        &mut self.entries[index as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_layout() {
        let mut palette = Palette::default();
        palette[0] = PaletteEntry::new(1, 2, 3);
        palette[255] = PaletteEntry::new(4, 5, 6);

        let bytes = palette.to_bytes();
        assert_eq!(&bytes[..3], &[1, 2, 3]);
        assert_eq!(&bytes[765..], &[4, 5, 6]);
        assert!(bytes[3..765].iter().all(|b| *b == 0));

        assert_eq!(Palette::from_bytes(&bytes), palette);
    }

    #[test]
    fn short_input_leaves_black() {
        let palette = Palette::from_bytes(&[9, 8, 7, 6]);

        assert_eq!(palette[0], PaletteEntry::new(9, 8, 7));
        assert_eq!(palette[1], PaletteEntry::default());
    }
}
