// crc.rs -- RGB PNG encoder
// Copyright (c) 2018  Jeron A. Lau <jeron.lau@plopgrizzly.com>
// Licensed under the MIT LICENSE

//! CRC-32 as used by png chunks (and zlib, gzip): reflected polynomial
//! `0xedb88320`, initial value and final xor `0xffff_ffff`.

const POLYNOMIAL: u32 = 0xedb8_8320;

static CRC32_TABLE: [u32; 256] = make_table();

const fn make_table() -> [u32; 256] {
	let mut table = [0u32; 256];
	let mut n = 0;
	while n < 256 {
		let mut c = n as u32;
		let mut k = 0;
		while k < 8 {
			c = if c & 1 != 0 { POLYNOMIAL ^ (c >> 1) } else { c >> 1 };
			k += 1;
		}
		table[n] = c;
		n += 1;
	}
	table
}

/// Running CRC-32, for checksums over data that isn't contiguous (a chunk's
/// type followed by its payload).
#[derive(Clone, Copy, Debug)]
pub struct Crc32 {
	r: u32,
}

impl Crc32 {
	pub fn new() -> Crc32 {
		Crc32 { r: 0xffff_ffff }
	}

	pub fn put(&mut self, bytes: &[u8]) -> &mut Crc32 {
		for &byte in bytes {
			let idx = byte ^ (self.r as u8);
			self.r = (self.r >> 8) ^ CRC32_TABLE[idx as usize];
		}
		self
	}

	/// Checksum of everything `put` so far.
	pub fn finish(&self) -> u32 {
		self.r ^ 0xffff_ffff
	}

	/// Checksum as it's stored in a chunk, then resets for the next one.
	pub fn finish_be(&mut self) -> [u8; 4] {
		let result = self.finish().to_be_bytes();
		self.r = 0xffff_ffff;
		result
	}
}

impl Default for Crc32 {
	fn default() -> Crc32 {
		Crc32::new()
	}
}

/// CRC-32 of `bytes`.
pub fn crc32(bytes: &[u8]) -> u32 {
	Crc32::new().put(bytes).finish()
}
