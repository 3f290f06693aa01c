//! Compression of the palette and pixel payload.

use std::io::{ErrorKind, Read, Write};

use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};

use crate::picture::Error;

/// Compresses and decompresses the payload of an XYZ image.
///
/// Compressed data must be a zlib wrapped DEFLATE stream, otherwise other
/// readers of the format will not be able to load the file. Only
/// [`Compressor::compress`] is required, decompression defaults to [`inflate`].
pub trait Compressor: Send {
    /// Compress `input` into `output`, returning the number of bytes written.
    ///
    /// Must fail with [`Error::BufferTooSmall`] when the result does not fit.
    fn compress(&self, input: &[u8], output: &mut [u8]) -> Result<usize, Error>;

    /// Decompress `input` into `output`, returning the number of bytes written.
    ///
    /// Fails with [`Error::BufferTooSmall`] when the data does not fit.
    fn decompress(&self, input: &[u8], output: &mut [u8]) -> Result<usize, Error> {
        inflate(input, output)
    }
}

impl<F> Compressor for F
where
    F: Fn(&[u8], &mut [u8]) -> Result<usize, Error> + Send,
{
    fn compress(&self, input: &[u8], output: &mut [u8]) -> Result<usize, Error> {
        self(input, output)
    }
}

/// The default compressor, zlib DEFLATE.
#[derive(Debug, Clone, Copy)]
pub struct Deflate {
    level: Compression,
}

impl Default for Deflate {
    fn default() -> Self {
        Self {
            level: Compression::best(),
        }
    }
}

impl Deflate {
    pub fn new(level: Compression) -> Self {
        Self { level }
    }

    pub fn level(&self) -> Compression {
        self.level
    }
}

impl Compressor for Deflate {
    fn compress(&self, input: &[u8], output: &mut [u8]) -> Result<usize, Error> {
        let bound = compress_bound(input.len());

        let mut scratch = Vec::new();
        scratch
            .try_reserve_exact(bound)
            .map_err(|_| Error::OutOfMemory(bound))?;

        let mut encoder = ZlibEncoder::new(scratch, self.level);
        encoder.write_all(input).map_err(Error::Compression)?;
        let compressed = encoder.finish().map_err(Error::Compression)?;

        if compressed.len() > output.len() {
            log::trace!(
                "compressed {} bytes to {}, output only holds {}",
                input.len(),
                compressed.len(),
                output.len()
            );
            return Err(Error::BufferTooSmall(output.len()));
        }

        output[..compressed.len()].copy_from_slice(&compressed);
        Ok(compressed.len())
    }
}

/// Upper bound of the zlib compressed size of `len` bytes.
pub fn compress_bound(len: usize) -> usize {
    len + (len >> 12) + (len >> 14) + (len >> 25) + 13
}

/// Decompress a zlib stream into `output`.
///
/// Returns the decompressed length, which is less than `output.len()` if the
/// stream ended early. A stream holding more data than fits fails with
/// [`Error::BufferTooSmall`].
pub fn inflate(input: &[u8], output: &mut [u8]) -> Result<usize, Error> {
    let mut decoder = ZlibDecoder::new(input);

    let mut written = 0;
    while written < output.len() {
        match decoder.read(&mut output[written..]) {
            Ok(0) => return Ok(written),
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Decompression(e)),
        }
    }

    // Drive the stream to its end so trailing data and the checksum get checked
    let mut probe = [0u8; 1];
    loop {
        match decoder.read(&mut probe) {
            Ok(0) => return Ok(written),
            Ok(_) => return Err(Error::BufferTooSmall(output.len())),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Decompression(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 7) as u8).collect()
    }

    #[test]
    fn deflate_and_inflate() {
        let input = sample(1000);
        let mut compressed = vec![0u8; input.len()];
        let size = Deflate::default().compress(&input, &mut compressed).unwrap();
        assert!(size < input.len());

        let mut output = vec![0u8; input.len()];
        let len = Deflate::default().decompress(&compressed[..size], &mut output).unwrap();
        assert_eq!(len, input.len());
        assert_eq!(output, input);
    }

    #[test]
    fn output_too_small() {
        let input = sample(1000);
        let mut compressed = vec![0u8; 4];

        assert!(matches!(
            Deflate::default().compress(&input, &mut compressed),
            Err(Error::BufferTooSmall(4))
        ));
    }

    #[test]
    fn inflate_too_much_data() {
        let input = sample(100);
        let mut compressed = vec![0u8; compress_bound(input.len())];
        let size = Deflate::default().compress(&input, &mut compressed).unwrap();

        let mut output = vec![0u8; 99];
        assert!(matches!(
            inflate(&compressed[..size], &mut output),
            Err(Error::BufferTooSmall(99))
        ));
    }

    #[test]
    fn inflate_short_stream() {
        let input = sample(100);
        let mut compressed = vec![0u8; compress_bound(input.len())];
        let size = Deflate::default().compress(&input, &mut compressed).unwrap();

        let mut output = vec![0u8; 200];
        assert_eq!(inflate(&compressed[..size], &mut output).unwrap(), 100);
    }

    #[test]
    fn inflate_garbage() {
        let mut output = vec![0u8; 16];

        assert!(matches!(
            inflate(&[0xFF; 32], &mut output),
            Err(Error::Decompression(_))
        ));
    }

    #[test]
    fn closure_compressor() {
        let stored = |input: &[u8], output: &mut [u8]| -> Result<usize, Error> {
            Deflate::new(Compression::none()).compress(input, output)
        };

        let input = sample(300);
        let mut compressed = vec![0u8; compress_bound(input.len())];
        let size = stored.compress(&input, &mut compressed).unwrap();
        assert!(size > input.len());

        let mut output = vec![0u8; input.len()];
        assert_eq!(stored.decompress(&compressed[..size], &mut output).unwrap(), 300);
        assert_eq!(output, input);
    }
}
