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

use crate::core::store::io::IndexInput;
use crate::core::util::packed::packed_misc::{byte_count, check_bits_per_value, check_version};
use crate::error::ErrorKind::IllegalArgument;
use crate::error::Result;

/// Random access to a header-less packed array that stays in the file.
///
/// Each `get` seeks the input, so callers that go on reading the stream
/// sequentially must reposition it, usually to `end_pointer()`.
pub struct DirectPackedReader {
    offset: i64,
    value_count: usize,
    bits_per_value: i32,
    byte_count: usize,
}

impl DirectPackedReader {
    pub fn new(
        packed_ints_version: i32,
        offset: i64,
        value_count: usize,
        bits_per_value: i32,
    ) -> Result<DirectPackedReader> {
        check_version(packed_ints_version)?;
        check_bits_per_value(bits_per_value)?;
        Ok(DirectPackedReader {
            offset,
            value_count,
            bits_per_value,
            byte_count: byte_count(packed_ints_version, value_count, bits_per_value),
        })
    }

    pub fn get<T: IndexInput + ?Sized>(&self, input: &mut T, index: usize) -> Result<i64> {
        if index >= self.value_count {
            bail!(IllegalArgument(format!(
                "index {} out of bounds for {} packed values",
                index, self.value_count
            )));
        }
        let bit_pos = index * self.bits_per_value as usize;
        let shift_in_byte = (bit_pos & 7) as i32;
        let num_bytes = (shift_in_byte + self.bits_per_value + 7) / 8;

        input.seek(self.offset + (bit_pos >> 3) as i64)?;
        let mut acc = 0u64;
        for _ in 0..num_bytes {
            acc = (acc << 8) | u64::from(input.read_byte()?);
        }
        let unused_low_bits = num_bytes * 8 - shift_in_byte - self.bits_per_value;
        let mask = (1u64 << self.bits_per_value) - 1;
        Ok(((acc >> unused_low_bits) & mask) as i64)
    }

    /// File offset right after the array, padding included.
    pub fn end_pointer(&self) -> i64 {
        self.offset + self.byte_count as i64
    }
}
