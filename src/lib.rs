//! XYZ is the indexed color image format of the RPG Maker 2000 and 2003
//! engines. A file holds a 256 color palette and one palette index per pixel,
//! compressed with zlib DEFLATE behind a short header.
//!
//! Reading and writing go through the [`ByteSource`] and [`ByteSink`] traits,
//! which every [`Read`](std::io::Read) and [`Write`](std::io::Write) already
//! implements. Closures can be used with [`FnSource`] and [`FnSink`].
//! Compression goes through the [`Compressor`] trait and can be replaced per
//! image.
//!
//! # Example
//! ## Creating and writing an XYZ
//! ```no_run
//! use xyzimage::{PaletteEntry, PixelFormat, XyzImage};
//!
//! // Create a black 2×2 image in memory. Nothing is compressed or encoded
//! // at this point.
//! let mut image = XyzImage::new(2, 2, PixelFormat::Indexed8).unwrap();
//!
//! image.palette_mut().unwrap()[5] = PaletteEntry::new(10, 20, 30);
//! image.bitmap_mut().fill(5);
//!
//! // Write it out to a file. This performs compression and encoding.
//! image.save("my_image.xyz").expect("Could not save the image");
//! ```
//!
//! ## Reading an XYZ from a file.
//! ```no_run
//! use std::fs::File;
//! use xyzimage::XyzImage;
//!
//! // Load it directly with the `open` function...
//! let image = xyzimage::open("my_image.xyz").expect("Could not open file");
//!
//! // ...or from something implementing Read.
//! let mut input_file = File::open("my_image.xyz").expect("Could not open image file");
//! let image2 = XyzImage::decode(&mut input_file);
//! ```

pub mod compression;
pub mod header;
pub mod io;
pub mod palette;
pub mod picture;

// ----------------------- //
// INLINED USEFUL FEATURES //
// ----------------------- //
#[doc(inline)]
pub use picture::{open, Error, XyzImage};

#[doc(inline)]
pub use header::PixelFormat;

#[doc(inline)]
pub use palette::{Palette, PaletteEntry};

#[doc(inline)]
pub use io::{ByteSink, ByteSource, FnSink, FnSource, ReadStatus};

#[doc(inline)]
pub use compression::{Compressor, Deflate};
