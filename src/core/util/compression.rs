// Copyright 2019 Zhizhesihai (Beijing) Technology Limited.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// See the License for the specific language governing permissions and
// limitations under the License.

use std::cmp::min;
use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::core::store::io::{DataInput, DataOutput};
use crate::core::util::bit_util::{BitsRequired, UnsignedShift};
use crate::error::ErrorKind::CorruptIndex;
use crate::error::Result;

const MEMORY_USAGE: i32 = 14;
// minimum length of a match
const MIN_MATCH: i32 = 4;
// maximum distance of a reference
const MAX_DISTANCE: i32 = 1 << 16;
// the last 5 bytes must be encoded as literals
const LAST_LITERALS: i32 = 5;

/// Window into a byte buffer: `(offset, length)`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct OffsetAndLength(pub usize, pub usize);

/// LZ4 compression and decompression routines, raw block format without
/// frame or size prefix.
pub struct LZ4;

impl LZ4 {
    fn hash(i: i32, hash_bits: i32) -> i32 {
        ((i as i64 * -1_640_531_535i64) as i32).unsigned_shift((32 - hash_bits) as usize)
    }

    fn read_int(buf: &[u8], i: usize) -> i32 {
        ((i32::from(buf[i])) << 24)
            | ((i32::from(buf[i + 1])) << 16)
            | ((i32::from(buf[i + 2])) << 8)
            | (i32::from(buf[i + 3]))
    }

    fn common_bytes(b: &[u8], o1: usize, o2: usize, limit: usize) -> i32 {
        debug_assert!(o1 < o2);
        let mut count = 0usize;
        while count < limit - o2 && b[o1 + count] == b[o2 + count] {
            count += 1;
        }
        count as i32
    }

    fn read_length<R: DataInput + ?Sized>(compressed: &mut R, mut len: i32) -> Result<i32> {
        let mut b = compressed.read_byte()?;
        while b == 0xffu8 {
            len += 0xff;
            b = compressed.read_byte()?;
        }
        Ok(len + i32::from(b))
    }

    /// Decompress at least `decompressed_len` bytes into `dest`, which must be
    /// able to hold the whole decompressed block. Returns the number of bytes
    /// produced.
    pub fn decompress<R: DataInput + ?Sized>(
        compressed: &mut R,
        decompressed_len: usize,
        dest: &mut [u8],
    ) -> Result<usize> {
        let dest_end = dest.len();
        let mut dest_off = 0;
        loop {
            let token = i32::from(compressed.read_byte()?);
            let mut literal_len = token.unsigned_shift(4);

            if literal_len != 0 {
                if literal_len == 0x0f {
                    literal_len = LZ4::read_length(compressed, literal_len)?;
                }
                let literal_len = literal_len as usize;
                if dest_off + literal_len > dest_end {
                    bail!(CorruptIndex(format!(
                        "lz4 literals overflow the block: {} > {}",
                        dest_off + literal_len,
                        dest_end
                    )));
                }
                compressed.read_bytes(dest, dest_off, literal_len)?;
                dest_off += literal_len;
            }

            if dest_off >= decompressed_len {
                break;
            }

            // matches
            let match_dec = i32::from(compressed.read_byte()?)
                | (i32::from(compressed.read_byte()?) << 8);
            if match_dec == 0 || match_dec as usize > dest_off {
                bail!(CorruptIndex(format!(
                    "lz4 reference out of range: {} at {}",
                    match_dec, dest_off
                )));
            }

            let mut match_len = token & 0x0f;
            if match_len == 0x0f {
                match_len = LZ4::read_length(compressed, match_len)?;
            }
            let match_len = (match_len + MIN_MATCH) as usize;
            if dest_off + match_len > dest_end {
                bail!(CorruptIndex(format!(
                    "lz4 match overflows the block: {} > {}",
                    dest_off + match_len,
                    dest_end
                )));
            }

            let ref_pos = dest_off - match_dec as usize;
            if (match_dec as usize) < match_len {
                // overlap -> naive incremental copy
                for i in 0..match_len {
                    dest[dest_off + i] = dest[ref_pos + i];
                }
            } else {
                let (lhs, rhs) = dest.split_at_mut(dest_off);
                rhs[0..match_len].copy_from_slice(&lhs[ref_pos..ref_pos + match_len]);
            }
            dest_off += match_len;
            if dest_off >= decompressed_len {
                break;
            }
        }
        Ok(dest_off)
    }

    fn encode_len<R: DataOutput + ?Sized>(l: i32, out: &mut R) -> Result<()> {
        let mut value = l;
        while value >= 0xff {
            out.write_byte(0xffu8)?;
            value -= 0xff;
        }
        out.write_byte((value & 0xff) as u8)
    }

    fn encode_literals<R: DataOutput + ?Sized>(
        bytes: &[u8],
        token: i32,
        anchor: usize,
        literal_len: usize,
        out: &mut R,
    ) -> Result<()> {
        out.write_byte(token as u8)?;

        // encode literal length
        if literal_len >= 0x0f {
            LZ4::encode_len(literal_len as i32 - 0x0f, out)?;
        }

        // encode literals
        out.write_bytes(bytes, anchor, literal_len)
    }

    fn encode_last_literals<R: DataOutput + ?Sized>(
        bytes: &[u8],
        anchor: usize,
        literal_len: usize,
        out: &mut R,
    ) -> Result<()> {
        let token: i32 = min(literal_len as i32, 0x0fi32) << 4;
        LZ4::encode_literals(bytes, token, anchor, literal_len, out)
    }

    fn encode_sequence<R: DataOutput + ?Sized>(
        bytes: &[u8],
        anchor: usize,
        match_ref: usize,
        match_off: usize,
        match_len: usize,
        out: &mut R,
    ) -> Result<()> {
        let literal_len = match_off - anchor;
        debug_assert!(match_len >= 4);
        // encode token
        let token: i32 = (0x0f.min(literal_len as i32) << 4) | 0x0f.min(match_len as i32 - 4);
        LZ4::encode_literals(bytes, token, anchor, literal_len, out)?;

        // encode match dec
        let match_dec = match_off - match_ref;
        debug_assert!(match_dec < 1 << 16);
        out.write_byte(match_dec as u8)?;
        out.write_byte((match_dec >> 8) as u8)?;
        // encode match len
        if match_len >= (MIN_MATCH + 0x0f) as usize {
            LZ4::encode_len(match_len as i32 - 0x0f - MIN_MATCH, out)?;
        }

        Ok(())
    }

    /// Compress `bytes[off..off + len]` into `out`. `ht` can be reused across
    /// calls but not shared.
    fn compress<R: DataOutput + ?Sized>(
        bytes: &[u8],
        off: usize,
        len: usize,
        out: &mut R,
        ht: &mut LZ4HashTable,
    ) -> Result<()> {
        let mut off_cur = off;
        let mut anchor = off;
        let end = off + len;

        off_cur += 1;

        if len > (LAST_LITERALS + MIN_MATCH) as usize {
            let limit = end - LAST_LITERALS as usize;
            let match_limit = limit - MIN_MATCH as usize;
            ht.reset(len as i32);
            let hash_log = ht.hash_log;
            'main: while off_cur <= limit {
                let mut refer: usize;
                loop {
                    if off_cur >= match_limit {
                        break 'main;
                    }
                    let v = LZ4::read_int(bytes, off_cur);
                    let h = LZ4::hash(v, hash_log) as usize;
                    refer = off + ht.table[h] as usize;
                    ht.table[h] = (off_cur - off) as i32;
                    if off_cur - refer < MAX_DISTANCE as usize && LZ4::read_int(bytes, refer) == v {
                        break;
                    }
                    off_cur += 1;
                }

                // compute match length
                let match_len = (MIN_MATCH
                    + LZ4::common_bytes(
                        bytes,
                        refer + MIN_MATCH as usize,
                        off_cur + MIN_MATCH as usize,
                        limit,
                    )) as usize;

                LZ4::encode_sequence(bytes, anchor, refer, off_cur, match_len, out)?;
                off_cur += match_len;
                anchor = off_cur;
            }
        }

        // last literals
        let literal_len = end - anchor;
        debug_assert!(literal_len >= LAST_LITERALS as usize || literal_len == len);
        LZ4::encode_last_literals(bytes, anchor, literal_len, out)
    }
}

#[derive(Default)]
struct LZ4HashTable {
    hash_log: i32,
    table: Vec<i32>,
}

impl LZ4HashTable {
    fn reset(&mut self, len: i32) {
        let bits_per_offset = (len - LAST_LITERALS).bits_required() as i32;
        let bits_per_offset_log = 32 - (bits_per_offset - 1).leading_zeros() as i32;
        self.hash_log = MEMORY_USAGE + 3 - bits_per_offset_log;
        self.table.clear();
        self.table.resize(1usize << self.hash_log, 0);
    }
}

/// A data compressor, the write side of `Decompress`.
pub trait Compress {
    fn compress(
        &mut self,
        bytes: &[u8],
        off: usize,
        len: usize,
        out: &mut impl DataOutput,
    ) -> Result<()>;
}

#[derive(Default)]
struct LZ4FastCompressor {
    ht: LZ4HashTable,
}

impl Compress for LZ4FastCompressor {
    fn compress(
        &mut self,
        bytes: &[u8],
        off: usize,
        len: usize,
        out: &mut impl DataOutput,
    ) -> Result<()> {
        LZ4::compress(bytes, off, len, out, &mut self.ht)
    }
}

/// Writes a vint compressed length followed by a raw deflate stream.
struct DeflateCompressor {
    level: u32,
}

impl Compress for DeflateCompressor {
    fn compress(
        &mut self,
        bytes: &[u8],
        off: usize,
        len: usize,
        out: &mut impl DataOutput,
    ) -> Result<()> {
        let mut encoder = DeflateEncoder::new(Vec::with_capacity(64), Compression::new(self.level));
        encoder.write_all(&bytes[off..off + len])?;
        let compressed = encoder.finish()?;
        out.write_vint(compressed.len() as i32)?;
        out.write_bytes(&compressed, 0, compressed.len())
    }
}

/// A decompressor.
pub trait Decompress: Clone {
    /// Decompress bytes that were stored between offsets `offset` and
    /// `offset + length` in the original stream from the compressed stream
    /// `input` to `bytes`. On return `bytes[bytes_position.0..]` holds the
    /// `bytes_position.1 == length` requested bytes. Implementations are free
    /// to resize `bytes`.
    ///
    /// * `input` - the input that stores the compressed stream
    /// * `original_length` - the length of the original data (before compression)
    /// * `offset` - bytes before this offset do not need to be decompressed
    /// * `length` - bytes after `offset + length` do not need to be decompressed
    fn decompress<R: DataInput + ?Sized>(
        &self,
        input: &mut R,
        original_length: usize,
        offset: usize,
        length: usize,
        bytes: &mut Vec<u8>,
        bytes_position: &mut OffsetAndLength,
    ) -> Result<()>;
}

#[derive(Clone)]
struct LZ4Decompressor;

impl Decompress for LZ4Decompressor {
    fn decompress<R: DataInput + ?Sized>(
        &self,
        input: &mut R,
        original_length: usize,
        offset: usize,
        length: usize,
        bytes: &mut Vec<u8>,
        bytes_position: &mut OffsetAndLength,
    ) -> Result<()> {
        debug_assert!(offset + length <= original_length);
        // 7 padding bytes, not required
        if bytes.len() < original_length + 7 {
            bytes.resize(original_length + 7, 0u8);
        }
        let decompressed_len =
            LZ4::decompress(input, offset + length, &mut bytes[..original_length])?;
        if decompressed_len < offset + length {
            bail!(CorruptIndex(format!(
                "lengths mismatch: {} < {}",
                decompressed_len,
                offset + length
            )));
        }
        bytes_position.0 = offset;
        bytes_position.1 = length;
        Ok(())
    }
}

#[derive(Clone, Default)]
struct DeflateDecompressor;

impl Decompress for DeflateDecompressor {
    fn decompress<R: DataInput + ?Sized>(
        &self,
        input: &mut R,
        original_length: usize,
        offset: usize,
        length: usize,
        bytes: &mut Vec<u8>,
        bytes_position: &mut OffsetAndLength,
    ) -> Result<()> {
        debug_assert!(offset + length <= original_length);
        let compressed_length = input.read_vint()?;
        if compressed_length < 0 {
            bail!(CorruptIndex(format!(
                "negative compressed length: {}",
                compressed_length
            )));
        }
        let compressed_length = compressed_length as usize;
        let mut compressed = vec![0u8; compressed_length];
        input.read_bytes(&mut compressed, 0, compressed_length)?;
        let mut decompressor = DeflateDecoder::new(&compressed[..]);

        bytes.clear();
        let size = decompressor
            .read_to_end(bytes)
            .map_err(|e| CorruptIndex(format!("invalid deflate stream: {}", e)))?;
        if size != original_length {
            bail!(CorruptIndex(format!(
                "lengths mismatch: {} != {}",
                size, original_length
            )));
        }
        bytes_position.0 = offset;
        bytes_position.1 = length;
        Ok(())
    }
}

/// A decompressor.
///
/// Current we support [`LZ4`](http://www.lz4.org) and
/// [`Deflate`](https://en.wikipedia.org/wiki/DEFLATE) two algorithms.
#[derive(Clone)]
pub struct Decompressor(DecompressorEnum);

#[derive(Clone)]
enum DecompressorEnum {
    LZ4(LZ4Decompressor),
    Deflate(DeflateDecompressor),
}

impl Decompress for Decompressor {
    fn decompress<R: DataInput + ?Sized>(
        &self,
        input: &mut R,
        original_length: usize,
        offset: usize,
        length: usize,
        bytes: &mut Vec<u8>,
        bytes_position: &mut OffsetAndLength,
    ) -> Result<()> {
        match &self.0 {
            DecompressorEnum::LZ4(d) => d.decompress(
                input,
                original_length,
                offset,
                length,
                bytes,
                bytes_position,
            ),
            DecompressorEnum::Deflate(d) => d.decompress(
                input,
                original_length,
                offset,
                length,
                bytes,
                bytes_position,
            ),
        }
    }
}

/// A compression mode. Tells how much effort should be spent on compression and
/// decompression of stored fields.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum CompressionMode {
    /// LZ4: trades compression ratio for speed.
    FAST,
    /// Deflate: trades speed for compression ratio.
    HighCompression,
}

/// A data compressor.
pub struct Compressor(CompressorEnum);

enum CompressorEnum {
    LZ4Fast(LZ4FastCompressor),
    Deflate(DeflateCompressor),
}

impl Compress for Compressor {
    fn compress(
        &mut self,
        bytes: &[u8],
        off: usize,
        len: usize,
        out: &mut impl DataOutput,
    ) -> Result<()> {
        match &mut self.0 {
            CompressorEnum::LZ4Fast(c) => c.compress(bytes, off, len, out),
            CompressorEnum::Deflate(c) => c.compress(bytes, off, len, out),
        }
    }
}

impl CompressionMode {
    pub fn new_compressor(self) -> Compressor {
        match self {
            CompressionMode::FAST => {
                Compressor(CompressorEnum::LZ4Fast(LZ4FastCompressor::default()))
            }
            // 6 is the default, higher than that is just a waste of cpu
            CompressionMode::HighCompression => {
                Compressor(CompressorEnum::Deflate(DeflateCompressor { level: 6 }))
            }
        }
    }

    pub fn new_decompressor(self) -> Decompressor {
        match self {
            CompressionMode::FAST => Decompressor(DecompressorEnum::LZ4(LZ4Decompressor {})),
            CompressionMode::HighCompression => {
                Decompressor(DecompressorEnum::Deflate(DeflateDecompressor::default()))
            }
        }
    }
}
