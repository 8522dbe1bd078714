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
use std::io::{self, Read};

use crate::core::codec::stored_fields::ChunkMetadata;
use crate::core::store::io::{ByteArrayDataInput, DataInput, IndexInput};
use crate::core::util::{
    DecodeBuffer, Decompress, Decompressor, OffsetAndLength, ScratchBuffer,
};
use crate::error::ErrorKind::{CorruptIndex, UnexpectedEOF};
use crate::error::Result;

/// How the compressed payload of a chunk is turned back into document bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePolicy {
    /// The payload is one compressed block, decoded in a single call.
    Buffered,
    /// The payload is a sequence of independently compressed blocks of
    /// `chunk_size` raw bytes each, decoded as the document is read.
    Sliced,
}

impl DecodePolicy {
    pub fn select(chunk_size: Option<usize>, total_length: usize) -> DecodePolicy {
        match chunk_size {
            Some(chunk_size) if total_length >= 2 * chunk_size => DecodePolicy::Sliced,
            _ => DecodePolicy::Buffered,
        }
    }
}

/// The decompressed bytes of one document.
pub struct DocumentBytes<'a> {
    buffer: DecodeBuffer<'a>,
    position: OffsetAndLength,
}

impl<'a> AsRef<[u8]> for DocumentBytes<'a> {
    fn as_ref(&self) -> &[u8] {
        &self.buffer.as_ref()[self.position.0..self.position.0 + self.position.1]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceState {
    /// Decompressed bytes are waiting to be read.
    Buffered,
    /// The buffer is drained but the document continues in the next slice.
    NeedsRefill,
    /// Every byte of the document has been handed out.
    Exhausted,
}

/// Reads one document of a sliced chunk, decompressing slices on demand.
///
/// The document starts at `offset < chunk_size` inside the first slice. Each
/// refill decompresses the next slice, but only up to the end of the document,
/// so reading never runs into the following document.
pub struct SlicedDocumentInput<'a> {
    input: &'a mut dyn IndexInput,
    decompressor: &'a Decompressor,
    chunk_size: usize,
    total_length: usize,
    length: usize,
    decompressed: usize,
    // raw offset inside the chunk payload where the next slice starts
    next_slice_start: usize,
    bytes: &'a mut Vec<u8>,
    position: OffsetAndLength,
}

impl<'a> SlicedDocumentInput<'a> {
    /// Decompresses the first slice. `input` must point at the start of the
    /// chunk payload.
    pub fn new(
        input: &'a mut dyn IndexInput,
        decompressor: &'a Decompressor,
        bytes: &'a mut Vec<u8>,
        chunk_size: usize,
        offset: usize,
        length: usize,
        total_length: usize,
    ) -> Result<SlicedDocumentInput<'a>> {
        if offset >= chunk_size {
            bail!(CorruptIndex(format!(
                "document offset {} is not inside the first slice of {} bytes",
                offset, chunk_size
            )));
        }
        debug_assert!(offset + length <= total_length);
        debug_assert!(total_length >= 2 * chunk_size);

        let mut position = OffsetAndLength::default();
        let first = min(length, chunk_size - offset);
        decompressor.decompress(
            &mut *input,
            chunk_size,
            offset,
            first,
            &mut *bytes,
            &mut position,
        )?;
        Ok(SlicedDocumentInput {
            input,
            decompressor,
            chunk_size,
            total_length,
            length,
            decompressed: first,
            next_slice_start: chunk_size,
            bytes,
            position,
        })
    }

    pub fn state(&self) -> SliceState {
        if self.position.1 > 0 {
            SliceState::Buffered
        } else if self.decompressed < self.length {
            SliceState::NeedsRefill
        } else {
            SliceState::Exhausted
        }
    }

    /// Bytes of the document decompressed so far.
    pub fn decompressed(&self) -> usize {
        self.decompressed
    }

    pub fn file_pointer(&self) -> i64 {
        self.input.file_pointer()
    }

    fn fill_buffer(&mut self) -> Result<()> {
        match self.state() {
            SliceState::Buffered => Ok(()),
            SliceState::Exhausted => bail!(UnexpectedEOF(format!(
                "read past the end of a {} byte document",
                self.length
            ))),
            SliceState::NeedsRefill => {
                if self.next_slice_start >= self.total_length {
                    bail!(CorruptIndex(format!(
                        "document needs {} more bytes past the end of the chunk",
                        self.length - self.decompressed
                    )));
                }
                let slice_length = min(self.total_length - self.next_slice_start, self.chunk_size);
                let to_decompress = min(self.length - self.decompressed, slice_length);
                self.decompressor.decompress(
                    &mut *self.input,
                    slice_length,
                    0,
                    to_decompress,
                    &mut *self.bytes,
                    &mut self.position,
                )?;
                self.decompressed += to_decompress;
                self.next_slice_start += slice_length;
                Ok(())
            }
        }
    }

    fn consume(&mut self, n: usize) {
        self.position.0 += n;
        self.position.1 -= n;
    }
}

impl<'a> DataInput for SlicedDocumentInput<'a> {
    fn read_byte(&mut self) -> Result<u8> {
        self.fill_buffer()?;
        let b = self.bytes[self.position.0];
        self.consume(1);
        Ok(b)
    }

    fn read_bytes(&mut self, b: &mut [u8], offset: usize, len: usize) -> Result<()> {
        let mut offset = offset;
        let mut len = len;
        while len > 0 {
            self.fill_buffer()?;
            let n = min(len, self.position.1);
            b[offset..offset + n]
                .copy_from_slice(&self.bytes[self.position.0..self.position.0 + n]);
            self.consume(n);
            offset += n;
            len -= n;
        }
        Ok(())
    }

    fn skip_bytes(&mut self, count: usize) -> Result<()> {
        let mut count = count;
        while count > 0 {
            self.fill_buffer()?;
            let n = min(count, self.position.1);
            self.consume(n);
            count -= n;
        }
        Ok(())
    }
}

impl<'a> Read for SlicedDocumentInput<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.state() == SliceState::Exhausted {
            return Ok(0);
        }
        self.fill_buffer()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        let size = min(buf.len(), self.position.1);
        buf[0..size].copy_from_slice(&self.bytes[self.position.0..self.position.0 + size]);
        self.consume(size);
        Ok(size)
    }
}

/// Byte source for the fields of one document.
pub enum DocumentInput<'a> {
    Bytes {
        input: ByteArrayDataInput<DocumentBytes<'a>>,
        // stream position once the block was decompressed
        end_pointer: i64,
    },
    Sliced(SlicedDocumentInput<'a>),
}

impl<'a> DocumentInput<'a> {
    /// Decompresses the document described by `metadata`. `input` must point
    /// at the start of the chunk payload.
    pub fn open(
        input: &'a mut dyn IndexInput,
        decompressor: &'a Decompressor,
        scratch: &'a mut ScratchBuffer,
        chunk_size: Option<usize>,
        metadata: &ChunkMetadata,
    ) -> Result<DocumentInput<'a>> {
        let policy = DecodePolicy::select(chunk_size, metadata.total_length);
        trace!(
            "chunk of doc {}: offset={} length={} total={} policy={:?}",
            metadata.doc_base,
            metadata.offset,
            metadata.length,
            metadata.total_length,
            policy
        );
        match (policy, chunk_size) {
            (DecodePolicy::Sliced, Some(chunk_size)) => {
                Ok(DocumentInput::Sliced(SlicedDocumentInput::new(
                    input,
                    decompressor,
                    scratch.shared(),
                    chunk_size,
                    metadata.offset,
                    metadata.length,
                    metadata.total_length,
                )?))
            }
            _ => {
                let mut buffer = scratch.acquire(metadata.total_length);
                let mut position = OffsetAndLength::default();
                decompressor.decompress(
                    &mut *input,
                    metadata.total_length,
                    metadata.offset,
                    metadata.length,
                    buffer.as_vec_mut(),
                    &mut position,
                )?;
                debug_assert_eq!(position.1, metadata.length);
                Ok(DocumentInput::Bytes {
                    input: ByteArrayDataInput::new(DocumentBytes { buffer, position }),
                    end_pointer: input.file_pointer(),
                })
            }
        }
    }

    /// Position in the segment stream after the bytes consumed so far.
    pub fn file_pointer(&self) -> i64 {
        match self {
            DocumentInput::Bytes { end_pointer, .. } => *end_pointer,
            DocumentInput::Sliced(s) => s.file_pointer(),
        }
    }
}

impl<'a> Read for DocumentInput<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            DocumentInput::Bytes { input, .. } => input.read(buf),
            DocumentInput::Sliced(s) => s.read(buf),
        }
    }
}

impl<'a> DataInput for DocumentInput<'a> {
    fn read_byte(&mut self) -> Result<u8> {
        match self {
            DocumentInput::Bytes { input, .. } => input.read_byte(),
            DocumentInput::Sliced(s) => s.read_byte(),
        }
    }

    fn read_bytes(&mut self, b: &mut [u8], offset: usize, len: usize) -> Result<()> {
        match self {
            DocumentInput::Bytes { input, .. } => input.read_bytes(b, offset, len),
            DocumentInput::Sliced(s) => s.read_bytes(b, offset, len),
        }
    }

    fn skip_bytes(&mut self, count: usize) -> Result<()> {
        match self {
            DocumentInput::Bytes { input, .. } => input.skip_bytes(count),
            DocumentInput::Sliced(s) => s.skip_bytes(count),
        }
    }
}

/// Consumes a whole chunk payload without keeping the bytes, leaving `input`
/// at the start of the next chunk.
pub fn skip_payload(
    input: &mut dyn IndexInput,
    decompressor: &Decompressor,
    scratch: &mut ScratchBuffer,
    chunk_size: Option<usize>,
    total_length: usize,
) -> Result<()> {
    if total_length == 0 {
        return Ok(());
    }
    let mut position = OffsetAndLength::default();
    match (DecodePolicy::select(chunk_size, total_length), chunk_size) {
        (DecodePolicy::Sliced, Some(chunk_size)) => {
            let mut start = 0;
            while start < total_length {
                let slice_length = min(total_length - start, chunk_size);
                decompressor.decompress(
                    &mut *input,
                    slice_length,
                    0,
                    slice_length,
                    scratch.shared(),
                    &mut position,
                )?;
                start += slice_length;
            }
        }
        _ => {
            let mut buffer = scratch.acquire(total_length);
            decompressor.decompress(
                input,
                total_length,
                0,
                total_length,
                buffer.as_vec_mut(),
                &mut position,
            )?;
        }
    }
    Ok(())
}
