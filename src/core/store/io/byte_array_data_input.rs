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

use crate::core::store::io::DataInput;

use crate::error::ErrorKind::UnexpectedEOF;
use crate::error::Result;
use std::io::Read;

/// DataInput backed by a byte array.
pub struct ByteArrayDataInput<T: AsRef<[u8]>> {
    bytes: T,
    pos: usize,
}

impl<T: AsRef<[u8]>> ByteArrayDataInput<T> {
    pub fn new(bytes: T) -> ByteArrayDataInput<T> {
        ByteArrayDataInput { bytes, pos: 0usize }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn length(&self) -> usize {
        self.bytes.as_ref().len()
    }

    fn check_remaining(&self, len: usize) -> Result<()> {
        if self.pos + len > self.length() {
            bail!(UnexpectedEOF(format!(
                "read of {} bytes at {} past the end of a {} byte array",
                len,
                self.pos,
                self.length()
            )));
        }
        Ok(())
    }
}

impl<T: AsRef<[u8]>> DataInput for ByteArrayDataInput<T> {
    fn read_byte(&mut self) -> Result<u8> {
        self.check_remaining(1)?;
        let b = self.bytes.as_ref()[self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn read_bytes(&mut self, b: &mut [u8], offset: usize, len: usize) -> Result<()> {
        self.check_remaining(len)?;
        b[offset..offset + len].copy_from_slice(&self.bytes.as_ref()[self.pos..self.pos + len]);
        self.pos += len;
        Ok(())
    }

    fn skip_bytes(&mut self, count: usize) -> Result<()> {
        self.check_remaining(count)?;
        self.pos += count;
        Ok(())
    }
}

impl<T: AsRef<[u8]>> Read for ByteArrayDataInput<T> {
    fn read(&mut self, buf: &mut [u8]) -> ::std::io::Result<usize> {
        let size = ::std::cmp::min(buf.len(), self.length() - self.pos);
        buf[0..size].copy_from_slice(&self.bytes.as_ref()[self.pos..self.pos + size]);
        self.pos += size;
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_stay_inside_the_array() {
        let mut input = ByteArrayDataInput::new(vec![1u8, 2, 3]);
        assert_eq!(input.read_byte().unwrap(), 1);
        let mut buf = [0u8; 2];
        input.read_bytes(&mut buf, 0, 2).unwrap();
        assert_eq!(buf, [2, 3]);
        assert_eq!(input.position(), input.length());
        assert!(input.read_byte().unwrap_err().is_unexpected_eof());
        assert!(input.skip_bytes(1).is_err());
    }
}
