// error.rs -- RGB PNG encoder
// Copyright (c) 2018  Jeron A. Lau <jeron.lau@plopgrizzly.com>
// Licensed under the MIT LICENSE

use std::io;
use thiserror::Error;

/// Everything that can make an encode fail.
#[derive(Error, Debug)]
pub enum Error {
	/// Chunk payload is longer than a png four-byte unsigned integer allows.
	#[error("chunk payload of {0} bytes exceeds 2^31 - 1")]
	OversizedChunk(usize),

	/// Width or height is zero or doesn't fit in 31 bits.
	#[error("invalid dimensions {width}x{height}")]
	InvalidDimensions { width: u32, height: u32 },

	/// Pixel buffer length disagrees with `width * height * 3`.
	#[error("pixel buffer is {actual} bytes, expected {expected}")]
	BufferSizeMismatch { expected: usize, actual: usize },

	/// Compression level outside `0..=9`.
	#[error("compression level {0} is outside 0..=9")]
	InvalidLevel(u8),

	/// The output sink rejected a write.
	#[error("sink write failed: {0}")]
	SinkWriteFailure(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
