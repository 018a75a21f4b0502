// encoder.rs -- RGB PNG encoder
// Copyright (c) 2018  Jeron A. Lau <jeron.lau@plopgrizzly.com>
// Licensed under the MIT LICENSE

// PNG:
//	PNG SIGNATURE, IHDR, IDAT, IEND

use std::io::Write;

use crate::chunk::{chunk_len, write_chunk, IDAT, IEND, IHDR, PNG_SIGNATURE};
use crate::error::Result;
use crate::filter::{filter_with, FilterStrategy};
use crate::header::Header;
use crate::zlib::{Compress, Compression, Deflater};

/// Turns RGB8 pixel buffers into png files.
///
/// ```
/// use rgb_png::{Compression, Encoder, FilterStrategy};
///
/// let pixels = [10, 20, 30, 40, 50, 60];
/// let png = Encoder::new()
/// 	.level(Compression::BEST)
/// 	.filter(FilterStrategy::Adaptive)
/// 	.encode(&pixels, 2, 1)
/// 	.unwrap();
/// assert_eq!(&png[1..4], b"PNG");
/// ```
#[derive(Clone, Debug)]
pub struct Encoder<C = Deflater> {
	compressor: C,
	level: Compression,
	filter: FilterStrategy,
}

impl Encoder<Deflater> {
	pub fn new() -> Encoder<Deflater> {
		Encoder {
			compressor: Deflater,
			level: Compression::DEFAULT,
			filter: FilterStrategy::None,
		}
	}
}

impl Default for Encoder<Deflater> {
	fn default() -> Encoder<Deflater> {
		Encoder::new()
	}
}

impl<C: Compress> Encoder<C> {
	pub fn level(mut self, level: Compression) -> Encoder<C> {
		self.level = level;
		self
	}

	pub fn filter(mut self, strategy: FilterStrategy) -> Encoder<C> {
		self.filter = strategy;
		self
	}

	/// Swaps the DEFLATE implementation.
	pub fn compressor<D: Compress>(self, compressor: D) -> Encoder<D> {
		Encoder {
			compressor,
			level: self.level,
			filter: self.filter,
		}
	}

	/// Writes a whole png file for `pixels` to `sink`.
	///
	/// Everything is validated, filtered and compressed before the first
	/// byte goes out, so bad dimensions or a bad buffer leave `sink`
	/// untouched.  A sink error can leave a partial file behind.
	pub fn write<W: Write>(&self, sink: &mut W, pixels: &[u8], width: u32,
		height: u32) -> Result<()>
	{
		log::debug!("encoding {}x{} png, level {}, {:?} filtering",
			width, height, self.level.level(), self.filter);

		let header = Header::rgb8(width, height)?;
		let filtered = filter_with(pixels, width, height, self.filter)?;
		let idat = self.compressor.compress(&filtered, self.level);
		chunk_len(idat.len())?;

		sink.write_all(&PNG_SIGNATURE)?;
		write_chunk(sink, IHDR, &header.to_bytes())?;
		write_chunk(sink, IDAT, &idat)?;
		write_chunk(sink, IEND, &[])?;
		sink.flush()?;

		log::debug!("{} filtered bytes compressed to a {} byte IDAT",
			filtered.len(), idat.len());
		Ok(())
	}

	/// Like `write`, into a new buffer.
	pub fn encode(&self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
		let mut out = Vec::new();
		self.write(&mut out, pixels, width, height)?;
		Ok(out)
	}
}

/// Encodes `pixels` (`width * height * 3` bytes, row-major RGB) as a png
/// file.
pub fn encode_png(pixels: &[u8], width: u32, height: u32, level: Compression)
	-> Result<Vec<u8>>
{
	Encoder::new().level(level).encode(pixels, width, height)
}

/// Writes `pixels` as a png file to `sink`.
pub fn write_png<W: Write>(sink: &mut W, pixels: &[u8], width: u32, height: u32,
	level: Compression) -> Result<()>
{
	Encoder::new().level(level).write(sink, pixels, width, height)
}
