// lz77.rs -- RGB PNG encoder
// Copyright (c) 2018  Jeron A. Lau <jeron.lau@plopgrizzly.com>
// Licensed under the MIT LICENSE

//! LZ77 parsing with hash chains over a 32 KiB window.

pub const WINDOW_SIZE: usize = 32768;
pub const MIN_MATCH: usize = 3;
pub const MAX_MATCH: usize = 258;

const WINDOW_MASK: usize = WINDOW_SIZE - 1;
const HASH_BITS: usize = 15;
const HASH_SIZE: usize = 1 << HASH_BITS;
const HASH_MASK: usize = HASH_SIZE - 1;
const NIL: usize = usize::max_value();

/// Length-3 matches farther back than this cost more than the literals.
const TOO_FAR: usize = 4096;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
	Literal(u8),
	/// Copy `length` bytes starting `distance` bytes back.
	Match { length: u16, distance: u16 },
}

impl Token {
	/// Number of input bytes this token stands for.
	pub fn span(&self) -> usize {
		match *self {
			Token::Literal(_) => 1,
			Token::Match { length, .. } => length as usize,
		}
	}
}

/// Search limits for one compression level.
#[derive(Clone, Copy, Debug)]
pub struct Params {
	/// Shorten the chain search once a match this long is in hand.
	pub good: usize,
	/// Don't look for a better match after one this long.
	pub lazy: usize,
	/// Stop searching at a match this long.
	pub nice: usize,
	/// Most chain links followed per search.
	pub chain: usize,
	/// Defer each match one byte to see if a longer one starts there.
	pub deferred: bool,
}

impl Params {
	/// Same trade-offs as zlib's configuration table.  Level 0 never
	/// reaches the matcher.
	pub fn for_level(level: u8) -> Params {
		let (good, lazy, nice, chain, deferred) = match level {
			0 | 1 => (4, 4, 8, 4, false),
			2 => (4, 5, 16, 8, false),
			3 => (4, 6, 32, 32, false),
			4 => (4, 4, 16, 16, true),
			5 => (8, 16, 32, 32, true),
			6 => (8, 16, 128, 128, true),
			7 => (8, 32, 128, 256, true),
			8 => (32, 128, 258, 1024, true),
			_ => (32, 258, 258, 4096, true),
		};
		Params { good, lazy, nice, chain, deferred }
	}
}

struct Matcher<'a> {
	data: &'a [u8],
	head: Vec<usize>,
	prev: Vec<usize>,
	params: Params,
}

impl<'a> Matcher<'a> {
	fn new(data: &'a [u8], params: Params) -> Matcher<'a> {
		Matcher {
			data,
			head: vec![NIL; HASH_SIZE],
			prev: vec![NIL; WINDOW_SIZE],
			params,
		}
	}

	#[inline]
	fn hash(&self, pos: usize) -> usize {
		let d = &self.data[pos..pos + MIN_MATCH];
		((d[0] as usize) << 10 ^ (d[1] as usize) << 5 ^ d[2] as usize) & HASH_MASK
	}

	fn insert(&mut self, pos: usize) {
		if pos + MIN_MATCH > self.data.len() {
			return;
		}
		let h = self.hash(pos);
		self.prev[pos & WINDOW_MASK] = self.head[h];
		self.head[h] = pos;
	}

	fn insert_range(&mut self, start: usize, end: usize) {
		for pos in start..end {
			self.insert(pos);
		}
	}

	/// Longest match for `pos` that beats `prev_len`, searched before `pos`
	/// itself is inserted.
	fn longest_match(&self, pos: usize, prev_len: usize) -> Option<(usize, usize)> {
		let data = self.data;
		let max_len = MAX_MATCH.min(data.len() - pos);
		if max_len < MIN_MATCH {
			return None;
		}

		let mut chain = self.params.chain;
		if prev_len >= self.params.good {
			chain >>= 2;
		}
		let mut best_len = prev_len.max(MIN_MATCH - 1);
		let mut best_dist = 0;
		if best_len >= max_len {
			return None;
		}

		let mut cand = self.head[self.hash(pos)];
		while cand != NIL && chain > 0 {
			let dist = pos - cand;
			if WINDOW_SIZE < dist {
				break;
			}
			if data[cand + best_len] == data[pos + best_len] {
				let len = data[cand..cand + max_len].iter()
					.zip(&data[pos..pos + max_len])
					.take_while(|(a, b)| a == b)
					.count();
				if len > best_len {
					best_len = len;
					best_dist = dist;
					if len >= self.params.nice || len == max_len {
						break;
					}
				}
			}
			let next = self.prev[cand & WINDOW_MASK];
			if next == NIL || next >= cand {
				break;
			}
			cand = next;
			chain -= 1;
		}

		if best_dist == 0 || (best_len == MIN_MATCH && TOO_FAR < best_dist) {
			return None;
		}
		Some((best_len, best_dist))
	}
}

fn push_match(tokens: &mut Vec<Token>, (length, distance): (usize, usize)) {
	tokens.push(Token::Match { length: length as u16, distance: distance as u16 });
}

/// Splits `data` into literals and back-references.
pub fn tokenize(data: &[u8], params: Params) -> Vec<Token> {
	let mut tokens = Vec::with_capacity(data.len() / 2);
	let mut m = Matcher::new(data, params);
	let mut pos = 0;

	if !params.deferred {
		while pos < data.len() {
			match m.longest_match(pos, 0) {
				Some(found) => {
					push_match(&mut tokens, found);
					m.insert_range(pos, pos + found.0);
					pos += found.0;
				}
				None => {
					tokens.push(Token::Literal(data[pos]));
					m.insert(pos);
					pos += 1;
				}
			}
		}
		return tokens;
	}

	// A match found at `pos - 1`, held back in case `pos` does better.
	let mut pending: Option<(usize, usize)> = None;
	while pos < data.len() {
		let prev_len = pending.map_or(0, |p| p.0);
		let found = m.longest_match(pos, prev_len);
		m.insert(pos);

		match (pending.take(), found) {
			(_, Some(better)) => {
				if prev_len > 0 {
					tokens.push(Token::Literal(data[pos - 1]));
				}
				if better.0 >= params.lazy {
					push_match(&mut tokens, better);
					m.insert_range(pos + 1, pos + better.0);
					pos += better.0;
				} else {
					pending = Some(better);
					pos += 1;
				}
			}
			(Some(held), None) => {
				push_match(&mut tokens, held);
				let end = pos - 1 + held.0;
				m.insert_range(pos + 1, end);
				pos = end;
			}
			(None, None) => {
				tokens.push(Token::Literal(data[pos]));
				pos += 1;
			}
		}
	}
	if let Some(held) = pending {
		push_match(&mut tokens, held);
	}

	tokens
}

#[cfg(test)]
mod tests {
	use super::*;

	fn expand(tokens: &[Token]) -> Vec<u8> {
		let mut out: Vec<u8> = Vec::new();
		for t in tokens {
			match *t {
				Token::Literal(b) => out.push(b),
				Token::Match { length, distance } => {
					assert!(MIN_MATCH <= length as usize && length as usize <= MAX_MATCH);
					assert!(1 <= distance as usize && distance as usize <= WINDOW_SIZE);
					let start = out.len() - distance as usize;
					for i in 0..length as usize {
						let b = out[start + i];
						out.push(b);
					}
				}
			}
		}
		out
	}

	fn sample() -> Vec<u8> {
		let mut data = b"abcabcabcabcabc hello hello hello world, hello world".to_vec();
		for i in 0..5000u32 {
			data.push((i * i % 251) as u8);
			if i % 7 == 0 {
				data.extend_from_slice(b"png!");
			}
		}
		data
	}

	#[test]
	fn every_level_expands_back() {
		let data = sample();
		for level in 1..=9 {
			let tokens = tokenize(&data, Params::for_level(level));
			assert_eq!(expand(&tokens), data, "level {}", level);
			assert_eq!(tokens.iter().map(Token::span).sum::<usize>(), data.len());
		}
	}

	#[test]
	fn runs_become_overlapping_matches() {
		let data = vec![7u8; 1000];
		let tokens = tokenize(&data, Params::for_level(6));
		assert_eq!(tokens[0], Token::Literal(7));
		assert_eq!(tokens[1], Token::Match { length: 258, distance: 1 });
		assert!(tokens.len() < 10);
		assert_eq!(expand(&tokens), data);
	}

	#[test]
	fn short_inputs_are_literals() {
		for level in 1..=9 {
			assert!(tokenize(b"", Params::for_level(level)).is_empty());
			assert_eq!(tokenize(b"ab", Params::for_level(level)),
				vec![Token::Literal(b'a'), Token::Literal(b'b')]);
		}
	}

	#[test]
	fn lazy_matching_finds_the_longer_match() {
		// At "bcdefgh" greedy takes "bcd" from the first copy; deferring one
		// byte finds the longer "cdefgh" run.
		let data = b"xbcdyzcdefghQbcdefgh";
		let greedy = tokenize(data, Params::for_level(1));
		let lazy = tokenize(data, Params::for_level(9));
		assert_eq!(expand(&greedy), data.to_vec());
		assert_eq!(expand(&lazy), data.to_vec());
		assert!(lazy.len() <= greedy.len());
		assert!(greedy.contains(&Token::Match { length: 3, distance: 12 }));
		assert!(lazy.contains(&Token::Match { length: 6, distance: 8 }));
	}

	#[test]
	fn matches_stay_inside_the_window() {
		let mut data: Vec<u8> = (0..40_000u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8).collect();
		let head = data[..64].to_vec();
		data.extend_from_slice(&head);
		let tokens = tokenize(&data, Params::for_level(9));
		assert_eq!(expand(&tokens), data);
	}
}
