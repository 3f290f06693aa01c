use std::{
    fmt,
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use thiserror::Error;

use crate::{
    compression::{Compressor, Deflate},
    header::{Header, PixelFormat, HEADER_SIZE},
    io::{write_all, ByteSink, ByteSource, ReadStatus},
    palette::{Palette, PALETTE_SIZE},
};

/// Marks a live image. Scrubbed on release.
const HANDLE_MARKER: [u8; 4] = *b"LXYZ";

/// Bumped whenever the layout of [`XyzImage`] changes.
const HANDLE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum Error {
    #[error("incorrect identifier, got {0:?}")]
    InvalidIdentifier([u8; 4]),

    #[error("compressed image exceeds twice the uncompressed size of {0} bytes")]
    ImageTooBig(usize),

    #[error("decompressed image is not {expected} bytes long, it is truncated or corrupt")]
    ImageSizeMismatch { expected: usize },

    #[error("unable to decompress the image")]
    Decompression(#[source] io::Error),

    #[error("unable to compress the image")]
    Compression(#[source] io::Error),

    #[error("the image is invalid or was released")]
    InvalidHandle,

    #[error("allocation of {0} bytes failed")]
    OutOfMemory(usize),

    #[error("pixel format {0:?} is not supported")]
    UnsupportedFormat(PixelFormat),

    #[error("output buffer of {0} bytes is not large enough")]
    BufferTooSmall(usize),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// An indexed color image: a 256 color palette and one palette index per
/// pixel.
///
/// Once [released](XyzImage::release) the image is invalid. Accessors then
/// return empty values and encoding fails with [`Error::InvalidHandle`].
pub struct XyzImage {
    marker: [u8; 4],
    version: u32,

    header: Header,
    format: PixelFormat,
    palette: Palette,
    bitmap: Vec<u8>,

    compressed_len: usize,
    compressor: Box<dyn Compressor>,
}

impl XyzImage {
    /// Create a black image. [`PixelFormat::Indexed8`] is the only supported
    /// format.
    pub fn new(width: u16, height: u16, format: PixelFormat) -> Result<Self, Error> {
        let bytes_per_pixel = format
            .bytes_per_pixel()
            .ok_or(Error::UnsupportedFormat(format))?;

        let header = Header::new(width, height);
        let bitmap = alloc_zeroed(header.pixel_count() * bytes_per_pixel)?;

        Ok(Self {
            marker: HANDLE_MARKER,
            version: HANDLE_VERSION,

            header,
            format,
            palette: Palette::default(),
            bitmap,

            compressed_len: 0,
            compressor: Box::new(Deflate::default()),
        })
    }

    /// Create an image from an existing palette and pixel indices.
    pub fn from_raw(width: u16, height: u16, palette: Palette, bitmap: Vec<u8>) -> Result<Self, Error> {
        let header = Header::new(width, height);
        if bitmap.len() != header.pixel_count() {
            return Err(Error::ImageSizeMismatch {
                expected: header.pixel_count(),
            });
        }

        Ok(Self {
            marker: HANDLE_MARKER,
            version: HANDLE_VERSION,

            header,
            format: PixelFormat::Indexed8,
            palette,
            bitmap,

            compressed_len: 0,
            compressor: Box::new(Deflate::default()),
        })
    }

    /// Decode the image from any [`ByteSource`], such as anything
    /// implementing [`Read`](std::io::Read).
    pub fn decode<I: ByteSource + ?Sized>(input: &mut I) -> Result<Self, Error> {
        Self::decode_with(input, Box::new(Deflate::default()))
    }

    /// Decode the image using `compressor` for decompression. The decoded
    /// image keeps it for later encodes.
    pub fn decode_with<I: ByteSource + ?Sized>(
        input: &mut I,
        compressor: Box<dyn Compressor>,
    ) -> Result<Self, Error> {
        let header = Header::read_from(input)?;
        let payload_size = header.payload_size();
        log::debug!(
            "decoding {}x{} image, {} bytes uncompressed",
            header.width,
            header.height,
            payload_size
        );

        let compressed = read_compressed(input, payload_size)?;

        let mut payload = alloc_zeroed(payload_size)?;
        let decompressed = match compressor.decompress(&compressed, &mut payload) {
            Ok(len) => len,
            Err(Error::BufferTooSmall(_)) => {
                log::debug!("payload decompresses to more than {payload_size} bytes");
                return Err(Error::ImageSizeMismatch {
                    expected: payload_size,
                });
            }
            Err(e) => return Err(e),
        };

        if decompressed != payload_size {
            log::debug!("payload decompressed to {decompressed} of {payload_size} bytes");
            return Err(Error::ImageSizeMismatch {
                expected: payload_size,
            });
        }

        let palette = Palette::from_bytes(&payload[..PALETTE_SIZE]);
        payload.drain(..PALETTE_SIZE);

        let mut image = Self::from_raw(header.width, header.height, palette, payload)?;
        image.compressed_len = compressed.len();
        image.compressor = compressor;

        Ok(image)
    }

    /// Encode the image into any [`ByteSink`], such as anything implementing
    /// [`Write`].
    pub fn encode<O: ByteSink + ?Sized>(&mut self, output: &mut O) -> Result<(), Error> {
        if !self.is_valid() {
            log::warn!("refusing to encode an invalid image");
            return Err(Error::InvalidHandle);
        }

        if !self.format.is_indexed() {
            return Err(Error::UnsupportedFormat(self.format));
        }

        let payload_size = self.header.payload_size();

        let mut payload = Vec::new();
        payload
            .try_reserve_exact(payload_size)
            .map_err(|_| Error::OutOfMemory(payload_size))?;
        payload.extend_from_slice(&self.palette.to_bytes());
        payload.extend_from_slice(&self.bitmap);

        let mut compressed = alloc_zeroed(payload_size)?;
        let compressed_len = match self.compressor.compress(&payload, &mut compressed) {
            Ok(len) => len,
            Err(Error::BufferTooSmall(_)) => {
                // Compression ratio is worse than 1, retry once with twice the room
                log::debug!("payload does not compress below {payload_size} bytes, retrying");
                compressed = alloc_zeroed(payload_size * 2)?;
                self.compressor.compress(&payload, &mut compressed)?
            }
            Err(e) => return Err(e),
        };
        drop(payload);

        if compressed_len == 0 || compressed_len > compressed.len() {
            return Err(Error::Compression(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("compressor reported {compressed_len} bytes"),
            )));
        }

        self.compressed_len = compressed_len;
        log::debug!(
            "encoding {}x{} image, {} bytes compressed",
            self.header.width,
            self.header.height,
            compressed_len
        );

        write_all(output, &self.header.to_bytes())?;
        write_all(output, &compressed[..compressed_len])?;

        Ok(())
    }

    /// Encode the image into a file at the given path.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        let mut out_file = BufWriter::new(File::create(path.as_ref())?);

        self.encode(&mut out_file)?;
        out_file.flush()?;

        Ok(())
    }

    /// Whether the image is live. Released images are invalid.
    pub fn is_valid(&self) -> bool {
        self.marker == HANDLE_MARKER && self.version == HANDLE_VERSION
    }

    /// Invalidate the image and free its pixel buffer.
    ///
    /// Returns `false` if the image was already invalid.
    pub fn release(&mut self) -> bool {
        if !self.is_valid() {
            return false;
        }

        self.marker[0] = b'!';

        self.bitmap = Vec::new();
        self.palette = Palette::default();
        self.compressed_len = 0;

        true
    }

    /// Width of the image in pixels, 0 when invalid.
    pub fn width(&self) -> u16 {
        if !self.is_valid() {
            return 0;
        }

        self.header.width
    }

    /// Height of the image in pixels, 0 when invalid.
    pub fn height(&self) -> u16 {
        if !self.is_valid() {
            return 0;
        }

        self.header.height
    }

    /// Format of the pixel buffer, [`PixelFormat::None`] when invalid.
    pub fn pixel_format(&self) -> PixelFormat {
        if !self.is_valid() {
            return PixelFormat::None;
        }

        self.format
    }

    /// The color palette. `None` when invalid or not indexed.
    pub fn palette(&self) -> Option<&Palette> {
        if !self.is_valid() || !self.format.is_indexed() {
            return None;
        }

        Some(&self.palette)
    }

    /// The color palette for editing. `None` when invalid or not indexed.
    pub fn palette_mut(&mut self) -> Option<&mut Palette> {
        if !self.is_valid() || !self.format.is_indexed() {
            return None;
        }

        Some(&mut self.palette)
    }

    /// The pixel buffer, one palette index per pixel in rows from the top.
    /// Empty when invalid.
    pub fn bitmap(&self) -> &[u8] {
        if !self.is_valid() {
            return &[];
        }

        &self.bitmap
    }

    /// The pixel buffer for editing. Empty when invalid.
    pub fn bitmap_mut(&mut self) -> &mut [u8] {
        if !self.is_valid() {
            return &mut [];
        }

        &mut self.bitmap
    }

    /// Size of the file if it was stored uncompressed, 0 when invalid.
    pub fn file_size(&self) -> usize {
        if !self.is_valid() {
            return 0;
        }

        HEADER_SIZE + self.header.payload_size()
    }

    /// Size of the file as last read or written, 0 when invalid.
    ///
    /// Only the header is counted for images that were never encoded.
    pub fn compressed_file_size(&self) -> usize {
        if !self.is_valid() {
            return 0;
        }

        HEADER_SIZE + self.compressed_len
    }

    /// Replace the compressor used by [`XyzImage::encode`]. `None` restores
    /// the default [`Deflate`] compressor.
    pub fn set_compressor(&mut self, compressor: Option<Box<dyn Compressor>>) {
        if !self.is_valid() {
            log::warn!("ignoring compressor change on an invalid image");
            return;
        }

        self.compressor = compressor.unwrap_or_else(|| Box::new(Deflate::default()));
    }

    /// Take the pixel buffer out of the image. Empty when invalid.
    pub fn into_raw(self) -> Vec<u8> {
        if !self.is_valid() {
            return Vec::new();
        }

        self.bitmap
    }
}

impl fmt::Debug for XyzImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XyzImage")
            .field("valid", &self.is_valid())
            .field("width", &self.header.width)
            .field("height", &self.header.height)
            .field("format", &self.format)
            .field("compressed_len", &self.compressed_len)
            .finish_non_exhaustive()
    }
}

/// Open an XYZ image from a file path.
pub fn open<P: AsRef<Path>>(path: P) -> Result<XyzImage, Error> {
    let mut input = BufReader::new(File::open(path.as_ref())?);

    XyzImage::decode(&mut input)
}

/// Read the compressed payload following the header.
///
/// The payload is expected to be smaller than `payload_size`. If it is not,
/// one more read of `payload_size` bytes is attempted, a payload that still
/// does not end is rejected.
fn read_compressed<I: ByteSource + ?Sized>(input: &mut I, payload_size: usize) -> Result<Vec<u8>, Error> {
    let mut compressed = alloc_zeroed(payload_size)?;

    let len = match input.read_bytes(&mut compressed)? {
        ReadStatus::EndOfStream(len) => len,
        ReadStatus::Complete => {
            log::debug!("compressed payload is at least {payload_size} bytes, growing buffer");
            compressed
                .try_reserve_exact(payload_size)
                .map_err(|_| Error::OutOfMemory(payload_size * 2))?;
            compressed.resize(payload_size * 2, 0);

            match input.read_bytes(&mut compressed[payload_size..])? {
                ReadStatus::EndOfStream(len) => payload_size + len,
                ReadStatus::Complete => return Err(Error::ImageTooBig(payload_size)),
            }
        }
    };

    compressed.truncate(len);
    Ok(compressed)
}

fn alloc_zeroed(len: usize) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| Error::OutOfMemory(len))?;
    buf.resize(len, 0);

    Ok(buf)
}
