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

use crate::core::codec::stored_fields::MAX_METADATA_BITS;
use crate::core::store::io::{DataInput, IndexInput};
use crate::core::util::packed::{DirectPackedReader, PackedReaderIterator};
use crate::core::util::DocId;
use crate::error::ErrorKind::{CorruptIndex, IllegalArgument};
use crate::error::{Error, Result};

/// The two vints that open every chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub doc_base: DocId,
    pub chunk_docs: i32,
}

impl ChunkHeader {
    pub fn read<T: DataInput + ?Sized>(input: &mut T) -> Result<ChunkHeader> {
        let doc_base = read_count(input, "doc_base")?;
        let chunk_docs = read_count(input, "chunk_docs")?;
        if doc_base.checked_add(chunk_docs).is_none() {
            bail!(CorruptIndex(format!(
                "chunk overflows the doc id space: doc_base={} chunk_docs={}",
                doc_base, chunk_docs
            )));
        }
        Ok(ChunkHeader {
            doc_base,
            chunk_docs,
        })
    }

    pub fn last_doc(&self) -> DocId {
        self.doc_base.saturating_add(self.chunk_docs) - 1
    }
}

/// Where one document lives inside the decompressed payload of its chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkMetadata {
    pub doc_base: DocId,
    pub chunk_docs: i32,
    pub num_stored_fields: i32,
    pub offset: usize,
    pub length: usize,
    pub total_length: usize,
}

fn read_count<T: DataInput + ?Sized>(input: &mut T, what: &str) -> Result<i32> {
    let v = input.read_vint()?;
    if v < 0 {
        bail!(CorruptIndex(format!("negative {}: {}", what, v)));
    }
    Ok(v)
}

// decompressed chunks are addressed with 32-bit signed offsets
const MAX_CHUNK_LENGTH: usize = i32::max_value() as usize;

fn total_length_overflow(chunk_start: i64) -> Error {
    CorruptIndex(format!(
        "chunk at {}: decompressed length exceeds {} bytes",
        chunk_start, MAX_CHUNK_LENGTH
    ))
    .into()
}

fn add_length(sum: usize, length: i64, chunk_start: i64) -> Result<usize> {
    sum.checked_add(length as usize)
        .ok_or_else(|| total_length_overflow(chunk_start))
}

fn check_bits(bits: i32, what: &str) -> Result<()> {
    if bits < 0 || bits > MAX_METADATA_BITS {
        bail!(CorruptIndex(format!("{}={}", what, bits)));
    }
    Ok(())
}

impl ChunkMetadata {
    /// Reads the per-document tables of a chunk and extracts the entries of
    /// `doc_id`. The input must be positioned right after the chunk header and
    /// is left at the start of the compressed payload.
    pub fn read<T: IndexInput + ?Sized>(
        input: &mut T,
        header: &ChunkHeader,
        doc_id: DocId,
        packed_ints_version: i32,
        chunk_start: i64,
    ) -> Result<ChunkMetadata> {
        if doc_id < header.doc_base || doc_id > header.last_doc() {
            bail!(IllegalArgument(format!(
                "doc {} is not in chunk [{}, {}]",
                doc_id,
                header.doc_base,
                header.last_doc()
            )));
        }
        let chunk_docs = header.chunk_docs as usize;
        let index = (doc_id - header.doc_base) as usize;

        let num_stored_fields;
        let offset;
        let length;
        let total_length;
        if chunk_docs == 1 {
            num_stored_fields = read_count(input, "num_stored_fields")?;
            length = read_count(input, "length")? as usize;
            offset = 0;
            total_length = length;
        } else {
            // number of stored fields per document
            let bits_per_stored_fields = input.read_vint()?;
            if bits_per_stored_fields == 0 {
                num_stored_fields = read_count(input, "num_stored_fields")?;
            } else {
                check_bits(bits_per_stored_fields, "bits_per_stored_fields")?;
                let reader = DirectPackedReader::new(
                    packed_ints_version,
                    input.file_pointer(),
                    chunk_docs,
                    bits_per_stored_fields,
                )?;
                num_stored_fields = reader.get(input, index)? as i32;
                input.seek(reader.end_pointer())?;
            }

            // document lengths, summed up into offsets
            let bits_per_length = input.read_vint()?;
            if bits_per_length == 0 {
                let uniform = read_count(input, "length")? as usize;
                total_length = chunk_docs
                    .checked_mul(uniform)
                    .ok_or_else(|| total_length_overflow(chunk_start))?;
                offset = index * uniform;
                length = uniform;
            } else {
                check_bits(bits_per_length, "bits_per_length")?;
                let mut it =
                    PackedReaderIterator::new(packed_ints_version, chunk_docs, bits_per_length)?;
                let mut off = 0usize;
                for _ in 0..index {
                    off = add_length(off, it.next(input)?, chunk_start)?;
                }
                offset = off;
                length = it.next(input)? as usize;
                off = add_length(off, length as i64, chunk_start)?;
                for _ in index + 1..chunk_docs {
                    off = add_length(off, it.next(input)?, chunk_start)?;
                }
                total_length = off;
            }
        }

        if total_length > MAX_CHUNK_LENGTH {
            return Err(total_length_overflow(chunk_start));
        }

        // only the empty document has a serialized length of 0
        if (length == 0) != (num_stored_fields == 0) {
            bail!(CorruptIndex(format!(
                "chunk at {}: length={}, num_stored_fields={}",
                chunk_start, length, num_stored_fields
            )));
        }

        Ok(ChunkMetadata {
            doc_base: header.doc_base,
            chunk_docs: header.chunk_docs,
            num_stored_fields,
            offset,
            length,
            total_length,
        })
    }

    pub fn is_last_document(&self, doc_id: DocId) -> bool {
        doc_id == self.doc_base.saturating_add(self.chunk_docs) - 1
    }
}
