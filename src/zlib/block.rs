// block.rs -- RGB PNG encoder
// Copyright (c) 2018  Jeron A. Lau <jeron.lau@plopgrizzly.com>
// Licensed under the MIT LICENSE

//! Raw DEFLATE block writer.
//!
//! Input is tokenized once, then written in blocks of at most
//! `MAX_BLOCK_TOKENS` tokens.  Each block goes out as whichever of a stored,
//! fixed Huffman, or dynamic Huffman block is smallest.

use super::bits::BitWriter;
use super::huffman::{canonical_codes, code_lengths, encode_lengths, LengthSymbol,
	CODE_LENGTH_ORDER, MAX_CODE_BITS, MAX_CODE_LENGTH_BITS};
use super::lz77::{tokenize, Params, Token};
use super::Compression;

const MAX_BLOCK_TOKENS: usize = 16384;
const MAX_STORED: usize = 65535;

const END_OF_BLOCK: usize = 256;
const NUM_LITLEN: usize = 286;
const NUM_DIST: usize = 30;

const BTYPE_STORED: u32 = 0;
const BTYPE_FIXED: u32 = 1;
const BTYPE_DYNAMIC: u32 = 2;

static LENGTH_BASE: [u16; 29] = [
	3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31,
	35, 43, 51, 59, 67, 83, 99, 115, 131, 163, 195, 227, 258,
];
static LENGTH_EXTRA: [u8; 29] = [
	0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2,
	3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];
static DIST_BASE: [u16; 30] = [
	1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193,
	257, 385, 513, 769, 1025, 1537, 2049, 3073, 4097, 6145,
	8193, 12289, 16385, 24577,
];
static DIST_EXTRA: [u8; 30] = [
	0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6,
	7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13, 13,
];

/// Index into `LENGTH_BASE`; the symbol is `257` plus this.
fn length_code(length: u16) -> usize {
	LENGTH_BASE.partition_point(|&base| base <= length) - 1
}

fn dist_code(distance: u16) -> usize {
	DIST_BASE.partition_point(|&base| base <= distance) - 1
}

/// Code lengths and codes for one block's two alphabets.
struct Tables {
	lit_lengths: Vec<u8>,
	lit_codes: Vec<u16>,
	dist_lengths: Vec<u8>,
	dist_codes: Vec<u16>,
}

impl Tables {
	fn new(lit_lengths: Vec<u8>, dist_lengths: Vec<u8>) -> Tables {
		Tables {
			lit_codes: canonical_codes(&lit_lengths),
			dist_codes: canonical_codes(&dist_lengths),
			lit_lengths,
			dist_lengths,
		}
	}

	/// The fixed codes of RFC 1951 section 3.2.6.
	fn fixed() -> Tables {
		// All 288 lengths take part in code assignment, even though 286
		// and 287 never occur.
		let mut lit_lengths = vec![8u8; 288];
		for len in &mut lit_lengths[144..256] {
			*len = 9;
		}
		for len in &mut lit_lengths[256..280] {
			*len = 7;
		}
		Tables::new(lit_lengths, vec![5u8; NUM_DIST])
	}

	/// Bits needed for the symbols counted in `freqs`.
	fn cost(&self, freqs: &Frequencies) -> u64 {
		let mut bits = 0u64;
		for (sym, &f) in freqs.lit.iter().enumerate() {
			let extra = if sym > END_OF_BLOCK { LENGTH_EXTRA[sym - 257] } else { 0 };
			bits += f as u64 * (self.lit_lengths[sym] as u64 + extra as u64);
		}
		for (sym, &f) in freqs.dist.iter().enumerate() {
			bits += f as u64 * (self.dist_lengths[sym] as u64 + DIST_EXTRA[sym] as u64);
		}
		bits
	}

	fn write_symbol(&self, w: &mut BitWriter, sym: usize) {
		w.write_bits(self.lit_codes[sym] as u32, self.lit_lengths[sym] as u32);
	}

	fn write_tokens(&self, w: &mut BitWriter, tokens: &[Token]) {
		for token in tokens {
			match *token {
				Token::Literal(byte) => self.write_symbol(w, byte as usize),
				Token::Match { length, distance } => {
					let lc = length_code(length);
					self.write_symbol(w, 257 + lc);
					w.write_bits((length - LENGTH_BASE[lc]) as u32, LENGTH_EXTRA[lc] as u32);

					let dc = dist_code(distance);
					w.write_bits(self.dist_codes[dc] as u32, self.dist_lengths[dc] as u32);
					w.write_bits((distance - DIST_BASE[dc]) as u32, DIST_EXTRA[dc] as u32);
				}
			}
		}
		self.write_symbol(w, END_OF_BLOCK);
	}
}

struct Frequencies {
	lit: [u32; NUM_LITLEN],
	dist: [u32; NUM_DIST],
}

impl Frequencies {
	fn count(tokens: &[Token]) -> Frequencies {
		let mut freqs = Frequencies { lit: [0; NUM_LITLEN], dist: [0; NUM_DIST] };
		for token in tokens {
			match *token {
				Token::Literal(byte) => freqs.lit[byte as usize] += 1,
				Token::Match { length, distance } => {
					freqs.lit[257 + length_code(length)] += 1;
					freqs.dist[dist_code(distance)] += 1;
				}
			}
		}
		freqs.lit[END_OF_BLOCK] = 1;
		freqs
	}
}

/// Tables built for one block, plus how to describe them in its header.
struct Dynamic {
	tables: Tables,
	hlit: usize,
	hdist: usize,
	hclen: usize,
	cl_lengths: Vec<u8>,
	cl_codes: Vec<u16>,
	symbols: Vec<LengthSymbol>,
}

impl Dynamic {
	fn new(freqs: &Frequencies) -> Dynamic {
		let lit_lengths = code_lengths(&freqs.lit, MAX_CODE_BITS);
		let dist_lengths = code_lengths(&freqs.dist, MAX_CODE_BITS);

		let used = |lengths: &[u8]| lengths.iter().rposition(|&l| l != 0).map_or(0, |i| i + 1);
		let hlit = used(&lit_lengths).max(257);
		let hdist = used(&dist_lengths).max(1);

		let mut all = lit_lengths[..hlit].to_vec();
		all.extend_from_slice(&dist_lengths[..hdist]);
		let symbols = encode_lengths(&all);

		let mut cl_freqs = [0u32; 19];
		for s in &symbols {
			cl_freqs[s.symbol as usize] += 1;
		}
		let cl_lengths = code_lengths(&cl_freqs, MAX_CODE_LENGTH_BITS);
		let cl_codes = canonical_codes(&cl_lengths);
		let hclen = CODE_LENGTH_ORDER.iter()
			.rposition(|&sym| cl_lengths[sym] != 0)
			.map_or(0, |i| i + 1)
			.max(4);

		Dynamic {
			tables: Tables::new(lit_lengths, dist_lengths),
			hlit,
			hdist,
			hclen,
			cl_lengths,
			cl_codes,
			symbols,
		}
	}

	/// Header size after the 3 block type bits.
	fn header_bits(&self) -> u64 {
		let lengths: u64 = self.symbols.iter()
			.map(|s| self.cl_lengths[s.symbol as usize] as u64 + s.extra_bits() as u64)
			.sum();
		5 + 5 + 4 + 3 * self.hclen as u64 + lengths
	}

	fn write_header(&self, w: &mut BitWriter) {
		w.write_bits((self.hlit - 257) as u32, 5);
		w.write_bits((self.hdist - 1) as u32, 5);
		w.write_bits((self.hclen - 4) as u32, 4);
		for &sym in &CODE_LENGTH_ORDER[..self.hclen] {
			w.write_bits(self.cl_lengths[sym] as u32, 3);
		}
		for s in &self.symbols {
			let sym = s.symbol as usize;
			w.write_bits(self.cl_codes[sym] as u32, self.cl_lengths[sym] as u32);
			w.write_bits(s.extra as u32, s.extra_bits());
		}
	}
}

/// Size of `len` bytes as stored blocks, starting `at` bits into the output.
fn stored_bits(len: usize, at: u64) -> u64 {
	let blocks = ((len + MAX_STORED - 1) / MAX_STORED).max(1) as u64;
	let first_pad = (8 - (at + 3) % 8) % 8;
	first_pad + 3 + 32 + (blocks - 1) * (3 + 5 + 32) + 8 * len as u64
}

fn write_stored(w: &mut BitWriter, raw: &[u8], last: bool) {
	let mut rest = raw;
	loop {
		let n = rest.len().min(MAX_STORED);
		let final_piece = n == rest.len();
		w.write_bits((last && final_piece) as u32, 1);
		w.write_bits(BTYPE_STORED, 2);
		w.align();
		w.write_bytes(&(n as u16).to_le_bytes());
		w.write_bytes(&(!(n as u16)).to_le_bytes());
		w.write_bytes(&rest[..n]);
		rest = &rest[n..];
		if final_piece {
			break;
		}
	}
}

fn write_block(w: &mut BitWriter, tokens: &[Token], raw: &[u8], last: bool) {
	let freqs = Frequencies::count(tokens);
	let fixed = Tables::fixed();
	let dynamic = Dynamic::new(&freqs);

	let stored_cost = stored_bits(raw.len(), w.bit_len());
	let fixed_cost = 3 + fixed.cost(&freqs);
	let dynamic_cost = 3 + dynamic.header_bits() + dynamic.tables.cost(&freqs);

	log::trace!("block of {} tokens / {} bytes: stored {} fixed {} dynamic {} bits",
		tokens.len(), raw.len(), stored_cost, fixed_cost, dynamic_cost);

	if stored_cost <= fixed_cost && stored_cost <= dynamic_cost {
		write_stored(w, raw, last);
	} else if fixed_cost <= dynamic_cost {
		w.write_bits(last as u32, 1);
		w.write_bits(BTYPE_FIXED, 2);
		fixed.write_tokens(w, tokens);
	} else {
		w.write_bits(last as u32, 1);
		w.write_bits(BTYPE_DYNAMIC, 2);
		dynamic.write_header(w);
		dynamic.tables.write_tokens(w, tokens);
	}
}

/// Appends the raw DEFLATE stream for `data` to `out`.
pub fn deflate(out: Vec<u8>, data: &[u8], level: Compression) -> Vec<u8> {
	let mut w = BitWriter::new(out);

	if level.level() == 0 || data.is_empty() {
		write_stored(&mut w, data, true);
		return w.finish();
	}

	let tokens = tokenize(data, Params::for_level(level.level()));
	let blocks = (tokens.len() + MAX_BLOCK_TOKENS - 1) / MAX_BLOCK_TOKENS;
	let mut start = 0;
	for (i, block) in tokens.chunks(MAX_BLOCK_TOKENS).enumerate() {
		let span: usize = block.iter().map(Token::span).sum();
		write_block(&mut w, block, &data[start..start + span], i + 1 == blocks);
		start += span;
	}
	w.finish()
}
