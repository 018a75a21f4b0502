// header.rs -- RGB PNG encoder
// Copyright (c) 2018  Jeron A. Lau <jeron.lau@plopgrizzly.com>
// Licensed under the MIT LICENSE

use crate::chunk::MAX_CHUNK_LEN;
use crate::error::{Error, Result};

/// Bit depth this crate writes.
pub const BIT_DEPTH: u8 = 8;
/// Color type 2, truecolor.
pub const COLOR_TYPE_RGB: u8 = 2;
/// Bytes per pixel for 8-bit truecolor.
pub const BYTES_PER_PIXEL: usize = 3;

/// Header of a PNG image.
///
/// The fields are written as-is, only the dimensions are checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
	pub width: u32,
	pub height: u32,
	pub bit_depth: u8,
	pub color_type: u8,
	pub compression_method: u8,
	pub filter_method: u8,
	pub interlace_method: u8,
}

impl Header {
	/// 8-bit truecolor, deflate, adaptive filtering, no interlace.
	pub fn rgb8(width: u32, height: u32) -> Result<Header> {
		check_dimensions(width, height)?;
		Ok(Header {
			width,
			height,
			bit_depth: BIT_DEPTH,
			color_type: COLOR_TYPE_RGB,
			compression_method: 0,
			filter_method: 0,
			interlace_method: 0,
		})
	}

	/// The 13-byte IHDR chunk body.
	pub fn to_bytes(&self) -> [u8; 13] {
		let mut buf = [0u8; 13];
		buf[0..4].copy_from_slice(&self.width.to_be_bytes());
		buf[4..8].copy_from_slice(&self.height.to_be_bytes());
		buf[8] = self.bit_depth;
		buf[9] = self.color_type;
		buf[10] = self.compression_method;
		buf[11] = self.filter_method;
		buf[12] = self.interlace_method;
		buf
	}
}

/// Width and height must be png four-byte unsigned integers, and non-zero.
pub fn check_dimensions(width: u32, height: u32) -> Result<()> {
	let fits = |n: u32| n >= 1 && n as usize <= MAX_CHUNK_LEN;
	if !fits(width) || !fits(height) {
		return Err(Error::InvalidDimensions { width, height });
	}
	Ok(())
}

/// Encodes an IHDR body from its individual fields.
pub fn build_ihdr(width: u32, height: u32, bit_depth: u8, color_type: u8,
	compression_method: u8, filter_method: u8, interlace_method: u8)
	-> Result<[u8; 13]>
{
	check_dimensions(width, height)?;
	let header = Header {
		width,
		height,
		bit_depth,
		color_type,
		compression_method,
		filter_method,
		interlace_method,
	};
	Ok(header.to_bytes())
}
