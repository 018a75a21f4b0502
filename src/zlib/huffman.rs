// huffman.rs -- RGB PNG encoder
// Copyright (c) 2018  Jeron A. Lau <jeron.lau@plopgrizzly.com>
// Licensed under the MIT LICENSE

//! Length-limited Huffman codes, in the canonical form DEFLATE requires.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Longest code allowed for literal/length and distance codes.
pub const MAX_CODE_BITS: u8 = 15;
/// Longest code allowed for the code length alphabet.
pub const MAX_CODE_LENGTH_BITS: u8 = 7;

/// Order code length code lengths are stored in a dynamic block header.
pub const CODE_LENGTH_ORDER: [usize; 19] =
	[16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

/// Code lengths for `freqs`, none longer than `max_bits`.
///
/// Unused symbols get length 0.  At least two symbols always get a code, so
/// the code is complete even when fewer are used.
pub fn code_lengths(freqs: &[u32], max_bits: u8) -> Vec<u8> {
	let mut weights: Vec<u32> = freqs.to_vec();

	let mut used = weights.iter().filter(|&&f| f > 0).count();
	for w in weights.iter_mut() {
		if 2 <= used {
			break;
		}
		if *w == 0 {
			*w = 1;
			used += 1;
		}
	}

	loop {
		let lengths = tree_depths(&weights);
		if lengths.iter().all(|&l| l <= max_bits) {
			return lengths;
		}
		// Flattening the weights flattens the tree, eventually to a
		// balanced one, which always fits.
		for w in weights.iter_mut().filter(|w| **w > 0) {
			*w = (*w + 1) / 2;
		}
	}
}

/// Plain (unlimited) Huffman depths of every leaf with non-zero weight.
fn tree_depths(weights: &[u32]) -> Vec<u8> {
	// Nodes 0..n are leaves, internal nodes are pushed after them.
	let mut children: Vec<Option<(usize, usize)>> = vec![None; weights.len()];
	let mut heap = BinaryHeap::new();
	for (sym, &w) in weights.iter().enumerate() {
		if w > 0 {
			heap.push(Reverse((w as u64, sym)));
		}
	}

	while let Some(Reverse((wa, a))) = heap.pop() {
		let Reverse((wb, b)) = match heap.pop() {
			Some(node) => node,
			None => break,
		};
		children.push(Some((a, b)));
		heap.push(Reverse((wa + wb, children.len() - 1)));
	}

	let mut depth = vec![0u32; children.len()];
	for node in (0..children.len()).rev() {
		if let Some((a, b)) = children[node] {
			depth[a] = depth[node] + 1;
			depth[b] = depth[node] + 1;
		}
	}

	weights.iter().enumerate()
		.map(|(sym, &w)| if w > 0 { depth[sym].min(255) as u8 } else { 0 })
		.collect()
}

/// Canonical codes for `lengths`, bit-reversed so they can go straight into
/// an LSB-first bit writer.
pub fn canonical_codes(lengths: &[u8]) -> Vec<u16> {
	let mut bl_count = [0u16; 16];
	for &len in lengths {
		bl_count[len as usize] += 1;
	}
	bl_count[0] = 0;

	let mut next_code = [0u16; 16];
	let mut code = 0u16;
	for bits in 1..16 {
		code = (code + bl_count[bits - 1]) << 1;
		next_code[bits] = code;
	}

	lengths.iter().map(|&len| {
		if len == 0 {
			return 0;
		}
		let code = next_code[len as usize];
		next_code[len as usize] += 1;
		reverse_bits(code, len)
	}).collect()
}

fn reverse_bits(code: u16, len: u8) -> u16 {
	code.reverse_bits() >> (16 - len as u32)
}

/// One symbol of the run-length coded code length sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LengthSymbol {
	pub symbol: u8,
	pub extra: u8,
}

impl LengthSymbol {
	fn plain(len: u8) -> LengthSymbol {
		LengthSymbol { symbol: len, extra: 0 }
	}

	/// Number of extra bits following this symbol.
	pub fn extra_bits(&self) -> u32 {
		match self.symbol {
			16 => 2,
			17 => 3,
			18 => 7,
			_ => 0,
		}
	}
}

/// Run-length codes a code length sequence with symbols 16 (repeat
/// previous 3-6 times), 17 (3-10 zeros) and 18 (11-138 zeros).
pub fn encode_lengths(lengths: &[u8]) -> Vec<LengthSymbol> {
	let mut out = Vec::new();
	let mut i = 0;
	while i < lengths.len() {
		let len = lengths[i];
		let run = lengths[i..].iter().take_while(|&&l| l == len).count();
		let mut left = run;

		if len == 0 {
			while left >= 11 {
				let n = left.min(138);
				out.push(LengthSymbol { symbol: 18, extra: (n - 11) as u8 });
				left -= n;
			}
			if left >= 3 {
				out.push(LengthSymbol { symbol: 17, extra: (left - 3) as u8 });
				left = 0;
			}
		} else {
			out.push(LengthSymbol::plain(len));
			left -= 1;
			while left >= 3 {
				let n = left.min(6);
				out.push(LengthSymbol { symbol: 16, extra: (n - 3) as u8 });
				left -= n;
			}
		}

		for _ in 0..left {
			out.push(LengthSymbol::plain(len));
		}
		i += run;
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	fn kraft_sum(lengths: &[u8]) -> f64 {
		lengths.iter().filter(|&&l| l > 0).map(|&l| 0.5f64.powi(l as i32)).sum()
	}

	fn decode_lengths(symbols: &[LengthSymbol]) -> Vec<u8> {
		let mut out: Vec<u8> = Vec::new();
		for s in symbols {
			match s.symbol {
				16 => {
					let prev = *out.last().unwrap();
					for _ in 0..3 + s.extra { out.push(prev) }
				}
				17 => for _ in 0..3 + s.extra as usize { out.push(0) },
				18 => for _ in 0..11 + s.extra as usize { out.push(0) },
				l => out.push(l),
			}
		}
		out
	}

	#[test]
	fn textbook_example() {
		// Frequencies from RFC 1951 section 3.2.2's example alphabet.
		let lengths = code_lengths(&[10, 10, 10, 10, 20, 5, 2, 2], 15);
		assert_eq!(kraft_sum(&lengths), 1.0);
		assert!(lengths[4] <= lengths[0]);
		assert!(lengths[6] >= lengths[5]);
	}

	#[test]
	fn single_symbol_gets_a_partner() {
		let mut freqs = [0u32; 30];
		freqs[7] = 42;
		let lengths = code_lengths(&freqs, 15);
		assert_eq!(lengths[7], 1);
		assert_eq!(lengths.iter().filter(|&&l| l == 1).count(), 2);
		assert_eq!(kraft_sum(&lengths), 1.0);
	}

	#[test]
	fn nothing_used_still_gives_two_codes() {
		let lengths = code_lengths(&[0u32; 30], 15);
		assert_eq!(&lengths[..2], &[1, 1]);
		assert!(lengths[2..].iter().all(|&l| l == 0));
	}

	#[test]
	fn limit_is_enforced() {
		// Fibonacci weights make a maximally deep tree.
		let mut freqs = vec![1u32, 1];
		while freqs.len() < 30 {
			let n = freqs.len();
			freqs.push(freqs[n - 1] + freqs[n - 2]);
		}
		assert!(tree_depths(&freqs).iter().any(|&l| l > 15));

		let lengths = code_lengths(&freqs, 15);
		assert!(lengths.iter().all(|&l| 1 <= l && l <= 15));
		assert!(kraft_sum(&lengths) <= 1.0);

		let short = code_lengths(&freqs[..19], MAX_CODE_LENGTH_BITS);
		assert!(short.iter().all(|&l| l <= 7));
		assert!(kraft_sum(&short) <= 1.0);
	}

	#[test]
	fn canonical_codes_from_rfc() {
		// RFC 1951: lengths (3, 3, 3, 3, 3, 2, 4, 4) give codes
		// 010 011 100 101 110 00 1110 1111.
		let codes = canonical_codes(&[3, 3, 3, 3, 3, 2, 4, 4]);
		let expected = [0b010u16, 0b011, 0b100, 0b101, 0b110, 0b00, 0b1110, 0b1111];
		let lens = [3u8, 3, 3, 3, 3, 2, 4, 4];
		for i in 0..8 {
			assert_eq!(codes[i], reverse_bits(expected[i], lens[i]));
		}
	}

	#[test]
	fn run_length_coding_reverses() {
		let mut lengths = vec![8u8; 144];
		lengths.extend(vec![9u8; 112]);
		lengths.extend(vec![7u8; 24]);
		lengths.extend(vec![0u8; 150]);
		lengths.extend(&[5, 5, 0, 0, 3, 0, 0, 0, 4, 4, 4, 4]);
		let symbols = encode_lengths(&lengths);
		assert_eq!(decode_lengths(&symbols), lengths);
		assert!(symbols.len() < lengths.len() / 5);
		assert!(symbols.iter().all(|s| match s.symbol {
			16 => s.extra <= 3,
			17 => s.extra <= 7,
			18 => s.extra <= 127,
			l => l <= 15,
		}));
	}
}
