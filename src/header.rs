use byteorder::{ByteOrder, LE};

use crate::io::{read_exact, ByteSource};
use crate::palette::PALETTE_SIZE;
use crate::picture::Error;

/// Identifier at the start of every XYZ file.
pub const MAGIC: [u8; 4] = *b"XYZ1";

/// Size of the header in bytes.
pub const HEADER_SIZE: usize = 8;

/// An XYZ file header. This must be included at the beginning
/// of a valid XYZ file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Identifier. Must be set to "XYZ1".
    pub magic: [u8; 4],

    /// Width of the image in pixels.
    pub width: u16,

    /// Height of the image in pixels.
    pub height: u16,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            magic: MAGIC,
            width: 0,
            height: 0,
        }
    }
}

impl Header {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,

            ..Default::default()
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];

        buf[..4].copy_from_slice(&self.magic);
        LE::write_u16(&mut buf[4..6], self.width);
        LE::write_u16(&mut buf[6..8], self.height);

        buf
    }

    /// Number of pixels, which is also the pixel buffer length in bytes.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Size of the decompressed payload: the palette followed by one index
    /// per pixel.
    pub fn payload_size(&self) -> usize {
        PALETTE_SIZE + self.pixel_count()
    }

    /// Read and validate a header. The magic is checked before the
    /// dimensions are read.
    pub fn read_from<S: ByteSource + ?Sized>(input: &mut S) -> Result<Self, Error> {
        let mut magic = [0u8; 4];
        read_exact(input, &mut magic)?;

        if magic != MAGIC {
            return Err(Error::InvalidIdentifier(magic));
        }

        let mut dimensions = [0u8; 4];
        read_exact(input, &mut dimensions)?;

        let header = Header {
            magic,
            width: LE::read_u16(&dimensions[0..2]),
            height: LE::read_u16(&dimensions[2..4]),
        };
        log::trace!("read header {}x{}", header.width, header.height);

        Ok(header)
    }
}

/// The format of the pixel buffer.
///
/// Files always store [`PixelFormat::Indexed8`], it is the only format
/// an image can be created with.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// No format, reported for invalid images
    None = 0,

    /// One byte per pixel referencing one of the 256 palette colors
    #[default]
    Indexed8 = 1,
}

impl PixelFormat {
    /// Bytes used by a single pixel, if the format is supported.
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            PixelFormat::None => None,
            PixelFormat::Indexed8 => Some(1),
        }
    }

    /// Whether pixels of this format reference the palette.
    pub fn is_indexed(self) -> bool {
        matches!(self, PixelFormat::Indexed8)
    }
}

impl TryFrom<u8> for PixelFormat {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::None,
            1 => Self::Indexed8,
            v => return Err(format!("invalid pixel format {v}")),
        })
    }
}

impl From<PixelFormat> for u8 {
    fn from(value: PixelFormat) -> Self {
        value as u8
    }
}
