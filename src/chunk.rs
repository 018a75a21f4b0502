// chunk.rs -- RGB PNG encoder
// Copyright (c) 2018  Jeron A. Lau <jeron.lau@plopgrizzly.com>
// Licensed under the MIT LICENSE

//! Chunk framing: length, type, data, CRC.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

use crate::crc::Crc32;
use crate::error::{Error, Result};

/// Every png file starts with these 8 bytes.
pub static PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];

/// Longest payload a chunk's length field may describe.
pub const MAX_CHUNK_LEN: usize = 0x7fff_ffff;

/// A 4-byte chunk type code.
pub type ChunkType = [u8; 4];

pub const IHDR: ChunkType = *b"IHDR";
pub const IDAT: ChunkType = *b"IDAT";
pub const IEND: ChunkType = *b"IEND";

/// Payload length as it goes in the length field.
pub fn chunk_len(len: usize) -> Result<u32> {
	if MAX_CHUNK_LEN < len {
		return Err(Error::OversizedChunk(len));
	}
	Ok(len as u32)
}

/// Frames `data` as a chunk of type `chunk_type` and appends it to `sink`.
///
/// Writes `12 + data.len()` bytes.  Nothing is written if the payload is too
/// long; a failing sink may leave the chunk truncated.
pub fn write_chunk<W: Write>(sink: &mut W, chunk_type: ChunkType, data: &[u8])
	-> Result<()>
{
	let len = chunk_len(data.len())?;

	let mut crc = Crc32::new();
	crc.put(&chunk_type).put(data);

	sink.write_u32::<BigEndian>(len)?;
	sink.write_all(&chunk_type)?;
	sink.write_all(data)?;
	sink.write_u32::<BigEndian>(crc.finish())?;
	Ok(())
}
