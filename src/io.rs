//! Byte sources and sinks used by the decoder and encoder.
//!
//! Anything implementing [`Read`] or [`Write`] works out of the box. Other
//! transports can be plugged in through [`FnSource`] and [`FnSink`], which
//! forward every transfer to a closure together with some user data.

use std::io::{self, ErrorKind, Read, Write};

use crate::picture::Error;

/// Outcome of a successful read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// The whole buffer was filled.
    Complete,

    /// The input ended after this many bytes.
    EndOfStream(usize),
}

/// Somewhere the bytes of an XYZ image are read from.
pub trait ByteSource {
    /// Fill `buf` completely, or report how many bytes were read before
    /// the input ended. Running out of input is not an error.
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<ReadStatus, Error>;
}

/// Somewhere the bytes of an XYZ image are written to.
pub trait ByteSink {
    /// Write `buf`, returning how many bytes were written.
    fn write_bytes(&mut self, buf: &[u8]) -> Result<usize, Error>;
}

impl<R: Read> ByteSource for R {
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<ReadStatus, Error> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => return Ok(ReadStatus::EndOfStream(filled)),
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(ReadStatus::Complete)
    }
}

impl<W: Write> ByteSink for W {
    fn write_bytes(&mut self, buf: &[u8]) -> Result<usize, Error> {
        self.write_all(buf)?;
        Ok(buf.len())
    }
}

/// A [`ByteSource`] calling a closure with user data for every read.
pub struct FnSource<U, F> {
    userdata: U,
    read: F,
}

impl<U, F> FnSource<U, F>
where
    F: FnMut(&mut U, &mut [u8]) -> Result<ReadStatus, Error>,
{
    pub fn new(userdata: U, read: F) -> Self {
        Self { userdata, read }
    }

    pub fn userdata(&self) -> &U {
        &self.userdata
    }

    pub fn into_inner(self) -> U {
        self.userdata
    }
}

impl<U, F> ByteSource for FnSource<U, F>
where
    F: FnMut(&mut U, &mut [u8]) -> Result<ReadStatus, Error>,
{
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<ReadStatus, Error> {
        (self.read)(&mut self.userdata, buf)
    }
}

/// A [`ByteSink`] calling a closure with user data for every write.
pub struct FnSink<U, F> {
    userdata: U,
    write: F,
}

impl<U, F> FnSink<U, F>
where
    F: FnMut(&mut U, &[u8]) -> Result<usize, Error>,
{
    pub fn new(userdata: U, write: F) -> Self {
        Self { userdata, write }
    }

    pub fn userdata(&self) -> &U {
        &self.userdata
    }

    pub fn into_inner(self) -> U {
        self.userdata
    }
}

impl<U, F> ByteSink for FnSink<U, F>
where
    F: FnMut(&mut U, &[u8]) -> Result<usize, Error>,
{
    fn write_bytes(&mut self, buf: &[u8]) -> Result<usize, Error> {
        (self.write)(&mut self.userdata, buf)
    }
}

/// Read exactly `buf.len()` bytes. Hitting the end of input is an error here.
pub(crate) fn read_exact<S: ByteSource + ?Sized>(input: &mut S, buf: &mut [u8]) -> Result<(), Error> {
    match input.read_bytes(buf)? {
        ReadStatus::Complete => Ok(()),
        ReadStatus::EndOfStream(n) => Err(io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("expected {} bytes, input ended after {n}", buf.len()),
        )
        .into()),
    }
}

/// Write all of `buf`. A short write is an error.
pub(crate) fn write_all<S: ByteSink + ?Sized>(output: &mut S, buf: &[u8]) -> Result<(), Error> {
    let written = output.write_bytes(buf)?;
    if written != buf.len() {
        return Err(io::Error::new(
            ErrorKind::WriteZero,
            format!("wrote {written} of {} bytes", buf.len()),
        )
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn reader_reports_end_of_stream() {
        let mut input = Cursor::new(vec![1u8, 2, 3]);
        let mut buf = [0u8; 8];

        assert_eq!(input.read_bytes(&mut buf).unwrap(), ReadStatus::EndOfStream(3));
        assert_eq!(&buf[..3], &[1, 2, 3]);
    }

    #[test]
    fn exact_length_is_complete() {
        let mut input = Cursor::new(vec![1u8, 2, 3]);
        let mut buf = [0u8; 3];

        assert_eq!(input.read_bytes(&mut buf).unwrap(), ReadStatus::Complete);
        assert_eq!(input.read_bytes(&mut buf).unwrap(), ReadStatus::EndOfStream(0));
    }

    #[test]
    fn closure_source() {
        let mut source = FnSource::new(0u8, |counter: &mut u8, buf: &mut [u8]| {
            for b in buf.iter_mut() {
                *b = *counter;
                *counter += 1;
            }
            Ok(ReadStatus::Complete)
        });

        let mut buf = [0u8; 4];
        read_exact(&mut source, &mut buf).unwrap();
        assert_eq!(buf, [0, 1, 2, 3]);
        assert_eq!(*source.userdata(), 4);
    }

    #[test]
    fn short_write_fails() {
        let mut sink = FnSink::new((), |_: &mut (), buf: &[u8]| Ok(buf.len() / 2));

        assert!(matches!(write_all(&mut sink, &[0u8; 4]), Err(Error::Io(_))));
    }
}
