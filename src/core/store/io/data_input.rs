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

use crate::error::ErrorKind::{CorruptIndex, IllegalArgument, UnexpectedEOF};
use crate::error::Result;

use byteorder::{BigEndian, ByteOrder};
use std::io::Read;

/// Abstract base for performing read operations of the segment's low-level
/// data types: big-endian fixed width integers, variable-length integers and
/// length-prefixed strings.
///
/// Every read that would run past the end of the underlying data fails with
/// `UnexpectedEOF`.
pub trait DataInput: Read {
    fn read_byte(&mut self) -> Result<u8> {
        let mut buffer = [0u8; 1];
        if self.read(&mut buffer)? != 1 {
            bail!(UnexpectedEOF(
                "Reached EOF when a single byte is expected".to_owned()
            ))
        } else {
            Ok(buffer[0])
        }
    }

    fn read_bytes(&mut self, b: &mut [u8], offset: usize, length: usize) -> Result<()> {
        let end = offset + length;
        if b.len() < end {
            bail!(IllegalArgument(format!(
                "Buffer too small: writing [{}, {}) to [0, {})",
                offset,
                end,
                b.len(),
            )));
        }

        let mut read = 0;
        while read < length {
            let n = self.read(&mut b[offset + read..end])?;
            if n == 0 {
                bail!(UnexpectedEOF(format!(
                    "Reached EOF when {} bytes are expected, got {}",
                    length, read
                )));
            }
            read += n;
        }
        Ok(())
    }

    fn read_short(&mut self) -> Result<i16> {
        let mut bytes = [0u8; 2];
        self.read_bytes(&mut bytes, 0, 2)?;
        Ok(BigEndian::read_i16(&bytes))
    }

    fn read_int(&mut self) -> Result<i32> {
        let mut bytes = [0u8; 4];
        self.read_bytes(&mut bytes, 0, 4)?;
        Ok(BigEndian::read_i32(&bytes))
    }

    fn read_long(&mut self) -> Result<i64> {
        let mut bytes = [0u8; 8];
        self.read_bytes(&mut bytes, 0, 8)?;
        Ok(BigEndian::read_i64(&bytes))
    }

    fn read_vint(&mut self) -> Result<i32> {
        let mut b = (self.read_byte()?) as i8;
        if b >= 0 {
            return Ok(i32::from(b));
        }

        let mut i = i32::from(b) & 0x7f;
        b = self.read_byte()? as i8;
        i |= (i32::from(b) & 0x7f) << 7;
        if b >= 0 {
            return Ok(i);
        }

        b = self.read_byte()? as i8;
        i |= (i32::from(b) & 0x7f) << 14;
        if b >= 0 {
            return Ok(i);
        }

        b = self.read_byte()? as i8;
        i |= (i32::from(b) & 0x7f) << 21;
        if b >= 0 {
            return Ok(i);
        }

        b = self.read_byte()? as i8;
        i |= (i32::from(b) & 0x0f) << 28;

        if (b as u8 & 0xf0) != 0 {
            bail!(CorruptIndex("Invalid vInt detected".to_owned()));
        }

        Ok(i)
    }

    fn read_vlong(&mut self) -> Result<i64> {
        let mut i = 0i64;
        let mut shift = 0;
        while shift <= 56 {
            let b = self.read_byte()?;
            i |= (i64::from(b) & 0x7f) << shift;
            if b < 0x80 {
                return Ok(i);
            }
            shift += 7;
        }
        bail!(CorruptIndex("Invalid vLong detected".to_owned()))
    }

    fn read_string(&mut self) -> Result<String> {
        let length = self.read_vint()?;
        if length < 0 {
            bail!(CorruptIndex(format!("Invalid string length {}", length)));
        }

        let mut buffer = vec![0u8; length as usize];
        self.read_bytes(&mut buffer, 0, length as usize)?;
        Ok(String::from_utf8(buffer)?)
    }

    fn skip_bytes(&mut self, count: usize) -> Result<()> {
        const SKIP_BUFFER_SIZE: usize = 1024;
        let mut skip_buffer = [0u8; SKIP_BUFFER_SIZE];
        let mut skipped = 0;

        while skipped < count {
            let step = ::std::cmp::min(SKIP_BUFFER_SIZE, count - skipped);
            self.read_bytes(&mut skip_buffer, 0, step)?;
            skipped += step;
        }
        Ok(())
    }
}

impl<'a> DataInput for &'a [u8] {
    fn read_byte(&mut self) -> Result<u8> {
        if self.is_empty() {
            bail!(UnexpectedEOF(
                "Reached EOF when a single byte is expected".to_owned()
            ));
        }
        let b = self[0];
        *self = &self[1..];
        Ok(b)
    }

    fn skip_bytes(&mut self, count: usize) -> Result<()> {
        if self.len() < count {
            bail!(UnexpectedEOF(format!(
                "Cannot skip {} bytes, only {} left",
                count,
                self.len()
            )));
        }

        *self = &self[count..];
        Ok(())
    }
}
