// filter.rs -- RGB PNG encoder
// Copyright (c) 2018  Jeron A. Lau <jeron.lau@plopgrizzly.com>
// Licensed under the MIT LICENSE

//! Scanline filtering.
//!
//! Each row of the output is one filter type byte followed by the row's
//! filtered samples.  The default strategy writes every row with filter type
//! 0 (None), which copies the samples unchanged.

use crate::header::{check_dimensions, BYTES_PER_PIXEL};
use crate::error::{Error, Result};

/// Per-scanline predictor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterType {
	None = 0,
	Sub,
	Up,
	Average,
	Paeth,
}

impl FilterType {
	pub const ALL: [FilterType; 5] = [
		FilterType::None,
		FilterType::Sub,
		FilterType::Up,
		FilterType::Average,
		FilterType::Paeth,
	];

	pub fn from_u8(val: u8) -> Option<FilterType> {
		match val {
			0 => Some(FilterType::None),
			1 => Some(FilterType::Sub),
			2 => Some(FilterType::Up),
			3 => Some(FilterType::Average),
			4 => Some(FilterType::Paeth),
			_ => None,
		}
	}
}

/// How a filter type is picked for each row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterStrategy {
	/// Filter type 0 on every row.
	None,
	/// The same filter type on every row.
	Fixed(FilterType),
	/// Per row, the type with the smallest sum of absolute (signed) filtered
	/// bytes.
	Adaptive,
}

impl Default for FilterStrategy {
	fn default() -> FilterStrategy {
		FilterStrategy::None
	}
}

/// Length of a `width * height * 3` byte pixel buffer.
pub fn pixels_len(width: u32, height: u32) -> Result<usize> {
	(width as usize)
		.checked_mul(height as usize)
		.and_then(|n| n.checked_mul(BYTES_PER_PIXEL))
		.ok_or(Error::InvalidDimensions { width, height })
}

/// Length of the filtered stream: `height * (1 + width * 3)`.
pub fn filtered_len(width: u32, height: u32) -> Result<usize> {
	(width as usize)
		.checked_mul(BYTES_PER_PIXEL)
		.and_then(|n| n.checked_add(1))
		.and_then(|n| n.checked_mul(height as usize))
		.ok_or(Error::InvalidDimensions { width, height })
}

/// Filters `pixels` with filter type 0 on every row.
pub fn filter(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
	filter_with(pixels, width, height, FilterStrategy::None)
}

/// Filters a row-major RGB8 buffer of `width * height * 3` bytes.
pub fn filter_with(pixels: &[u8], width: u32, height: u32,
	strategy: FilterStrategy) -> Result<Vec<u8>>
{
	check_dimensions(width, height)?;
	let expected = pixels_len(width, height)?;
	if pixels.len() != expected {
		return Err(Error::BufferSizeMismatch { expected, actual: pixels.len() });
	}

	let stride = width as usize * BYTES_PER_PIXEL;
	let mut out = Vec::with_capacity(filtered_len(width, height)?);

	if strategy == FilterStrategy::None {
		for row in pixels.chunks_exact(stride) {
			out.push(FilterType::None as u8);
			out.extend_from_slice(row);
		}
		return Ok(out);
	}

	let zeros = vec![0u8; stride];
	let mut scratch = vec![0u8; stride];
	let mut prev: &[u8] = &zeros;
	let mut histogram = [0usize; 5];

	for row in pixels.chunks_exact(stride) {
		let ftype = match strategy {
			FilterStrategy::Fixed(t) => t,
			_ => pick_filter(row, prev, &mut scratch),
		};
		histogram[ftype as usize] += 1;

		out.push(ftype as u8);
		let start = out.len();
		out.resize(start + stride, 0);
		apply(ftype, row, prev, &mut out[start..]);

		prev = row;
	}

	log::trace!("filter types used (None, Sub, Up, Average, Paeth): {:?}", histogram);
	Ok(out)
}

/// Minimum sum of absolute differences, ties to the lower type.
fn pick_filter(row: &[u8], prev: &[u8], scratch: &mut [u8]) -> FilterType {
	let mut best = FilterType::None;
	let mut best_score = u64::max_value();
	for &ftype in &FilterType::ALL {
		apply(ftype, row, prev, scratch);
		let score: u64 = scratch.iter().map(|&b| (b as i8).unsigned_abs() as u64).sum();
		if score < best_score {
			best = ftype;
			best_score = score;
		}
	}
	best
}

fn apply(ftype: FilterType, row: &[u8], prev: &[u8], dst: &mut [u8]) {
	let bpp = BYTES_PER_PIXEL;
	match ftype {
		FilterType::None => dst.copy_from_slice(row),
		FilterType::Sub => {
			dst[..bpp].copy_from_slice(&row[..bpp]);
			for i in bpp..row.len() {
				dst[i] = row[i].wrapping_sub(row[i - bpp]);
			}
		}
		FilterType::Up => {
			for i in 0..row.len() {
				dst[i] = row[i].wrapping_sub(prev[i]);
			}
		}
		FilterType::Average => {
			for i in 0..bpp {
				dst[i] = row[i].wrapping_sub(prev[i] / 2);
			}
			for i in bpp..row.len() {
				let avg = (row[i - bpp] as u16 + prev[i] as u16) / 2;
				dst[i] = row[i].wrapping_sub(avg as u8);
			}
		}
		FilterType::Paeth => {
			for i in 0..bpp {
				dst[i] = row[i].wrapping_sub(paeth(0, prev[i], 0));
			}
			for i in bpp..row.len() {
				dst[i] = row[i].wrapping_sub(paeth(row[i - bpp], prev[i], prev[i - bpp]));
			}
		}
	}
}

/// Paeth predictor: whichever of left, above, upper-left is closest to
/// `a + b - c`.
fn paeth(a: u8, b: u8, c: u8) -> u8 {
	let p = a as i16 + b as i16 - c as i16;
	let pa = (p - a as i16).abs();
	let pb = (p - b as i16).abs();
	let pc = (p - c as i16).abs();

	if pa <= pb && pa <= pc {
		a
	} else if pb <= pc {
		b
	} else {
		c
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Undoes the filtering, as a png reader would.
	fn unfilter(filtered: &[u8], width: u32) -> Vec<u8> {
		let bpp = BYTES_PER_PIXEL;
		let stride = width as usize * bpp;
		let mut out: Vec<u8> = Vec::new();
		let mut prev = vec![0u8; stride];
		for line in filtered.chunks(stride + 1) {
			let ftype = FilterType::from_u8(line[0]).unwrap();
			let mut cur = line[1..].to_vec();
			for i in 0..stride {
				let left = if i >= bpp { cur[i - bpp] } else { 0 };
				let upper_left = if i >= bpp { prev[i - bpp] } else { 0 };
				let pred = match ftype {
					FilterType::None => 0,
					FilterType::Sub => left,
					FilterType::Up => prev[i],
					FilterType::Average => ((left as u16 + prev[i] as u16) / 2) as u8,
					FilterType::Paeth => paeth(left, prev[i], upper_left),
				};
				cur[i] = cur[i].wrapping_add(pred);
			}
			out.extend_from_slice(&cur);
			prev = cur;
		}
		out
	}

	fn gradient(width: u32, height: u32) -> Vec<u8> {
		let mut buf = Vec::new();
		for y in 0..height {
			for x in 0..width {
				buf.extend_from_slice(&[(x * 7) as u8, (y * 13) as u8, (x * y) as u8]);
			}
		}
		buf
	}

	#[test]
	fn two_by_one() {
		let out = filter(&[10, 20, 30, 40, 50, 60], 2, 1).unwrap();
		assert_eq!(out, vec![0, 10, 20, 30, 40, 50, 60]);
	}

	#[test]
	fn one_by_one_is_four_bytes() {
		let out = filter(&[1, 2, 3], 1, 1).unwrap();
		assert_eq!(out, vec![0, 1, 2, 3]);
	}

	#[test]
	fn none_prefixes_each_row() {
		let pixels = gradient(3, 4);
		let out = filter(&pixels, 3, 4).unwrap();
		assert_eq!(out.len(), filtered_len(3, 4).unwrap());
		for (line, row) in out.chunks(10).zip(pixels.chunks(9)) {
			assert_eq!(line[0], 0);
			assert_eq!(&line[1..], row);
		}
	}

	#[test]
	fn wrong_buffer_size() {
		match filter(&[0; 5], 2, 1) {
			Err(Error::BufferSizeMismatch { expected, actual }) => {
				assert_eq!((expected, actual), (6, 5));
			}
			other => panic!("expected BufferSizeMismatch, got {:?}", other),
		}
		assert!(filter(&[0; 7], 2, 1).is_err());
	}

	#[test]
	fn zero_width_is_rejected() {
		match filter(&[], 0, 3) {
			Err(Error::InvalidDimensions { .. }) => {}
			other => panic!("expected InvalidDimensions, got {:?}", other),
		}
	}

	#[test]
	fn sub_subtracts_the_pixel_to_the_left() {
		let out = filter_with(&[10, 20, 30, 15, 25, 5], 2, 1,
			FilterStrategy::Fixed(FilterType::Sub)).unwrap();
		assert_eq!(out, vec![1, 10, 20, 30, 5, 5, 231]);
	}

	#[test]
	fn up_subtracts_the_row_above() {
		let out = filter_with(&[10, 20, 30, 11, 22, 33], 1, 2,
			FilterStrategy::Fixed(FilterType::Up)).unwrap();
		assert_eq!(out, vec![2, 10, 20, 30, 2, 1, 2, 3]);
	}

	#[test]
	fn paeth_predictor() {
		assert_eq!(paeth(0, 0, 0), 0);
		assert_eq!(paeth(10, 20, 10), 20);
		assert_eq!(paeth(20, 10, 10), 20);
		assert_eq!(paeth(5, 9, 9), 5);
		assert_eq!(paeth(255, 0, 255), 0);
	}

	#[test]
	fn every_filter_type_reverses() {
		let pixels = gradient(5, 6);
		for &ftype in &FilterType::ALL {
			let out = filter_with(&pixels, 5, 6, FilterStrategy::Fixed(ftype)).unwrap();
			assert!(out.chunks(16).all(|line| line[0] == ftype as u8));
			assert_eq!(unfilter(&out, 5), pixels, "{:?}", ftype);
		}
	}

	#[test]
	fn adaptive_reverses_and_prefers_prediction() {
		let pixels = gradient(16, 8);
		let out = filter_with(&pixels, 16, 8, FilterStrategy::Adaptive).unwrap();
		assert_eq!(out.len(), filtered_len(16, 8).unwrap());
		assert_eq!(unfilter(&out, 16), pixels);
		// A smooth gradient should never be left unpredicted past row 0.
		assert!(out.chunks(49).skip(1).all(|line| line[0] != 0));
	}

	#[test]
	fn adaptive_keeps_none_for_flat_black() {
		let pixels = vec![0u8; 4 * 4 * 3];
		let out = filter_with(&pixels, 4, 4, FilterStrategy::Adaptive).unwrap();
		assert_eq!(out, filter(&pixels, 4, 4).unwrap());
	}
}
