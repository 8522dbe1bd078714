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

use crate::core::store::io::{DataInput, IndexInput};

use crate::error::ErrorKind::{IllegalArgument, UnexpectedEOF};
use crate::error::Result;
use std::io::Read;

/// An in-memory `IndexInput` that owns its bytes.
pub struct ByteBufferIndexInput {
    buffer: Vec<u8>,
    pos: usize,
    name: String,
}

impl ByteBufferIndexInput {
    pub fn new(name: &str, buffer: Vec<u8>) -> ByteBufferIndexInput {
        ByteBufferIndexInput {
            buffer,
            pos: 0,
            name: name.to_string(),
        }
    }

    pub fn backing(&self) -> &[u8] {
        &self.buffer
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}

impl From<Vec<u8>> for ByteBufferIndexInput {
    fn from(f: Vec<u8>) -> ByteBufferIndexInput {
        ByteBufferIndexInput::new("ByteBufferIndexInput", f)
    }
}

impl DataInput for ByteBufferIndexInput {
    fn read_byte(&mut self) -> Result<u8> {
        if self.pos >= self.buffer.len() {
            bail!(UnexpectedEOF(format!(
                "read past EOF: pos={} (resource={})",
                self.pos, self.name
            )));
        }
        let b = self.buffer[self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn skip_bytes(&mut self, count: usize) -> Result<()> {
        if self.pos + count > self.buffer.len() {
            bail!(UnexpectedEOF(format!(
                "skip of {} bytes past EOF: pos={} (resource={})",
                count, self.pos, self.name
            )));
        }
        self.pos += count;
        Ok(())
    }
}

impl IndexInput for ByteBufferIndexInput {
    fn file_pointer(&self) -> i64 {
        self.pos as i64
    }

    fn seek(&mut self, pos: i64) -> Result<()> {
        if pos < 0 || pos > self.buffer.len() as i64 {
            bail!(IllegalArgument(format!(
                "position {} is beyond valid range of [0, {}]",
                pos,
                self.buffer.len()
            )))
        }
        self.pos = pos as usize;
        Ok(())
    }

    fn len(&self) -> u64 {
        self.buffer.len() as u64
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Read for ByteBufferIndexInput {
    fn read(&mut self, buf: &mut [u8]) -> ::std::io::Result<usize> {
        let read = (&self.buffer[self.pos..]).read(buf)?;
        self.pos += read;
        Ok(read)
    }
}
