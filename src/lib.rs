// lib.rs -- RGB PNG encoder
// Copyright (c) 2018  Jeron A. Lau <jeron.lau@plopgrizzly.com>
// Licensed under the MIT LICENSE

//! Encode raw RGB pixel buffers into png files.
//!
//! Input is `width * height * 3` bytes of row-major 8-bit RGB with no row
//! padding; the dimensions come from the caller.  Output is a png file with
//! one IHDR, one IDAT and one IEND chunk.
//!
//! ```
//! let pixels = [10, 20, 30, 40, 50, 60];
//! let png = rgb_png::encode_png(&pixels, 2, 1, rgb_png::Compression::BEST).unwrap();
//! assert_eq!(&png[..8], &rgb_png::PNG_SIGNATURE);
//! ```

pub mod chunk;
pub mod crc;
mod encoder;
mod error;
pub mod filter;
pub mod header;
pub mod zlib;

pub use crate::chunk::{write_chunk, PNG_SIGNATURE};
pub use crate::crc::crc32;
pub use crate::encoder::{encode_png, write_png, Encoder};
pub use crate::error::{Error, Result};
pub use crate::filter::{filter, filter_with, FilterStrategy, FilterType};
pub use crate::header::{build_ihdr, Header};
pub use crate::zlib::{Compress, Compression, Deflater, ReferenceDeflater};
