// mod.rs -- RGB PNG encoder
// Copyright (c) 2018  Jeron A. Lau <jeron.lau@plopgrizzly.com>
// Licensed under the MIT LICENSE

//! zlib-wrapped DEFLATE, the only compression method png knows.

mod bits;
mod block;
mod huffman;
mod lz77;

use crate::error::{Error, Result};

/// Compression effort, 0 (store only) through 9 (smallest output).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Compression(u8);

impl Compression {
	pub const NONE: Compression = Compression(0);
	pub const FAST: Compression = Compression(1);
	pub const DEFAULT: Compression = Compression(6);
	pub const BEST: Compression = Compression(9);

	pub fn new(level: u8) -> Result<Compression> {
		if 9 < level {
			return Err(Error::InvalidLevel(level));
		}
		Ok(Compression(level))
	}

	pub fn level(self) -> u8 {
		self.0
	}
}

impl Default for Compression {
	fn default() -> Compression {
		Compression::DEFAULT
	}
}

/// Lossless byte-sequence compressor producing a zlib stream.
pub trait Compress {
	/// Compresses `data`.  The result must inflate back to exactly `data`.
	fn compress(&self, data: &[u8], level: Compression) -> Vec<u8>;
}

impl<'a, C: Compress + ?Sized> Compress for &'a C {
	fn compress(&self, data: &[u8], level: Compression) -> Vec<u8> {
		(**self).compress(data, level)
	}
}

/// This crate's own DEFLATE encoder.
#[derive(Clone, Copy, Debug, Default)]
pub struct Deflater;

impl Compress for Deflater {
	fn compress(&self, data: &[u8], level: Compression) -> Vec<u8> {
		let mut out = Vec::with_capacity(data.len() / 2 + 64);
		out.extend_from_slice(&zlib_header(level));
		let mut out = block::deflate(out, data, level);
		out.extend_from_slice(&adler32(data).to_be_bytes());
		out
	}
}

/// DEFLATE by the `deflate` crate, for checking this crate's encoder
/// against.  It has three effort settings; the levels map onto them.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReferenceDeflater;

impl Compress for ReferenceDeflater {
	fn compress(&self, data: &[u8], level: Compression) -> Vec<u8> {
		let setting = match level.level() {
			0..=3 => deflate::Compression::Fast,
			4..=6 => deflate::Compression::Default,
			_ => deflate::Compression::Best,
		};
		deflate::deflate_bytes_zlib_conf(data, setting)
	}
}

/// CMF and FLG bytes: deflate with a 32K window, no preset dictionary.
pub fn zlib_header(level: Compression) -> [u8; 2] {
	const CMF: u8 = 0x78;
	let flevel: u8 = match level.level() {
		0 | 1 => 0,
		2..=5 => 1,
		6 => 2,
		_ => 3,
	};
	let flg = flevel << 6;
	let fcheck = (31 - (CMF as u16 * 256 + flg as u16) % 31) % 31;
	[CMF, flg | fcheck as u8]
}

/// Adler-32 checksum, as ends a zlib stream.
pub fn adler32(data: &[u8]) -> u32 {
	const MOD: u32 = 65521;
	// Most bytes that can be summed before `b` could overflow.
	const NMAX: usize = 5552;

	let mut a = 1u32;
	let mut b = 0u32;
	for chunk in data.chunks(NMAX) {
		for &byte in chunk {
			a += byte as u32;
			b += a;
		}
		a %= MOD;
		b %= MOD;
	}
	b << 16 | a
}
