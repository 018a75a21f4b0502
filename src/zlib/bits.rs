// bits.rs -- RGB PNG encoder
// Copyright (c) 2018  Jeron A. Lau <jeron.lau@plopgrizzly.com>
// Licensed under the MIT LICENSE

/// Packs bit fields least-significant-bit first, as DEFLATE stores them.
pub struct BitWriter {
	out: Vec<u8>,
	acc: u64,
	nbits: u32,
}

impl BitWriter {
	pub fn new(out: Vec<u8>) -> BitWriter {
		BitWriter { out, acc: 0, nbits: 0 }
	}

	/// Appends the low `n` bits of `value` (n <= 32).
	#[inline]
	pub fn write_bits(&mut self, value: u32, n: u32) {
		debug_assert!(n <= 32);
		debug_assert!(n == 32 || value >> n == 0);
		self.acc |= (value as u64) << self.nbits;
		self.nbits += n;
		while self.nbits >= 8 {
			self.out.push(self.acc as u8);
			self.acc >>= 8;
			self.nbits -= 8;
		}
	}

	/// Pads with zero bits up to the next byte boundary.
	pub fn align(&mut self) {
		if self.nbits > 0 {
			self.out.push(self.acc as u8);
			self.acc = 0;
			self.nbits = 0;
		}
	}

	/// Raw bytes; the writer must be byte aligned.
	pub fn write_bytes(&mut self, bytes: &[u8]) {
		debug_assert_eq!(self.nbits, 0);
		self.out.extend_from_slice(bytes);
	}

	/// Total bits written so far.
	pub fn bit_len(&self) -> u64 {
		self.out.len() as u64 * 8 + self.nbits as u64
	}

	pub fn finish(mut self) -> Vec<u8> {
		self.align();
		self.out
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lsb_first() {
		let mut w = BitWriter::new(Vec::new());
		w.write_bits(1, 1);
		w.write_bits(1, 2);
		w.write_bits(0, 7);
		assert_eq!(w.bit_len(), 10);
		assert_eq!(w.finish(), vec![0x03, 0x00]);
	}

	#[test]
	fn wide_fields_cross_bytes() {
		let mut w = BitWriter::new(vec![0xaa]);
		w.write_bits(0b101, 3);
		w.write_bits(0xffff, 16);
		assert_eq!(w.finish(), vec![0xaa, 0xfd, 0xff, 0x07]);
	}

	#[test]
	fn align_then_bytes() {
		let mut w = BitWriter::new(Vec::new());
		w.write_bits(1, 3);
		w.align();
		w.write_bytes(&[9, 8]);
		assert_eq!(w.bit_len(), 24);
		assert_eq!(w.finish(), vec![1, 9, 8]);
	}
}
