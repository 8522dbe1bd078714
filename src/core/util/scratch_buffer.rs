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

/// Decoded blocks up to this size reuse the shared scratch buffer.
pub const DEFAULT_BUFFER_REUSE_THRESHOLD: usize = 1 << 15;

/// Scratch space for decompressed chunks.
///
/// Small blocks are decoded into one buffer that lives as long as the reader.
/// Larger ones get a buffer of their own that is dropped once the document
/// has been decoded, so one huge document does not pin its memory.
#[derive(Debug)]
pub struct ScratchBuffer {
    bytes: Vec<u8>,
    reuse_threshold: usize,
}

impl ScratchBuffer {
    pub fn new(reuse_threshold: usize) -> ScratchBuffer {
        ScratchBuffer {
            bytes: Vec::new(),
            reuse_threshold,
        }
    }

    pub fn acquire(&mut self, len: usize) -> DecodeBuffer<'_> {
        if len <= self.reuse_threshold {
            DecodeBuffer::Shared(&mut self.bytes)
        } else {
            DecodeBuffer::Owned(Vec::with_capacity(len))
        }
    }

    /// The shared buffer, used for slices that are at most one chunk long.
    pub fn shared(&mut self) -> &mut Vec<u8> {
        &mut self.bytes
    }

    pub fn reuse_threshold(&self) -> usize {
        self.reuse_threshold
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }
}

impl Default for ScratchBuffer {
    fn default() -> ScratchBuffer {
        ScratchBuffer::new(DEFAULT_BUFFER_REUSE_THRESHOLD)
    }
}

#[derive(Debug)]
pub enum DecodeBuffer<'a> {
    Shared(&'a mut Vec<u8>),
    Owned(Vec<u8>),
}

impl<'a> DecodeBuffer<'a> {
    pub fn as_vec_mut(&mut self) -> &mut Vec<u8> {
        match self {
            DecodeBuffer::Shared(v) => v,
            DecodeBuffer::Owned(v) => v,
        }
    }

    pub fn is_shared(&self) -> bool {
        match self {
            DecodeBuffer::Shared(_) => true,
            DecodeBuffer::Owned(_) => false,
        }
    }
}

impl<'a> AsRef<[u8]> for DecodeBuffer<'a> {
    fn as_ref(&self) -> &[u8] {
        match self {
            DecodeBuffer::Shared(v) => v.as_slice(),
            DecodeBuffer::Owned(v) => v.as_slice(),
        }
    }
}
