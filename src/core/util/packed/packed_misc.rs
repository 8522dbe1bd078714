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

use crate::core::store::io::{DataInput, DataOutput};
use crate::core::util::bit_util::BitsRequired;
use crate::error::ErrorKind::{FormatMismatch, IllegalArgument, IllegalState};
use crate::error::Result;

/// Arrays are padded to a whole number of 64-bit blocks.
pub const VERSION_START: i32 = 0;
/// Arrays take exactly as many bytes as their bits need.
pub const VERSION_BYTE_ALIGNED: i32 = 1;
pub const VERSION_MONOTONIC_WITHOUT_ZIGZAG: i32 = 2;
pub const VERSION_CURRENT: i32 = VERSION_MONOTONIC_WITHOUT_ZIGZAG;

/// Widest value the stored fields tables can hold.
pub const MAX_SUPPORTED_BITS_PER_VALUE: i32 = 32;

pub fn check_version(version: i32) -> Result<()> {
    if version < VERSION_START {
        bail!(FormatMismatch(format!(
            "Packed ints version is too old, should be at least {} (got {})",
            VERSION_START, version
        )))
    } else if version > VERSION_CURRENT {
        bail!(FormatMismatch(format!(
            "Packed ints version is too new, should be at most {} (got {})",
            VERSION_CURRENT, version
        )))
    } else {
        Ok(())
    }
}

pub(crate) fn check_bits_per_value(bits_per_value: i32) -> Result<()> {
    if bits_per_value < 1 || bits_per_value > MAX_SUPPORTED_BITS_PER_VALUE {
        bail!(IllegalArgument(format!(
            "bits_per_value must be in [1, {}], got {}",
            MAX_SUPPORTED_BITS_PER_VALUE, bits_per_value
        )));
    }
    Ok(())
}

/// Number of bytes a header-less packed array of `value_count` values of
/// `bits_per_value` bits occupies in the stream.
pub fn byte_count(packed_ints_version: i32, value_count: usize, bits_per_value: i32) -> usize {
    let bits = value_count * bits_per_value as usize;
    if packed_ints_version < VERSION_BYTE_ALIGNED {
        8 * long_count(value_count, bits_per_value)
    } else {
        (bits + 7) / 8
    }
}

/// Number of 64-bit blocks needed to hold the values.
pub fn long_count(value_count: usize, bits_per_value: i32) -> usize {
    (value_count * bits_per_value as usize + 63) / 64
}

pub fn max_value(bits_per_value: i32) -> i64 {
    if bits_per_value == 64 {
        i64::max_value()
    } else {
        !(!0i64 << bits_per_value)
    }
}

#[inline]
fn low_bits(value: u64, bits: i32) -> u64 {
    value & ((1u64 << bits) - 1)
}

/// Forward-only reader over a header-less packed array.
///
/// Values are pulled from the stream one byte at a time, so the stream is
/// never read ahead of the value being decoded. Once the last value has been
/// returned the stream is moved past the array's padding.
pub struct PackedReaderIterator {
    bits_per_value: i32,
    value_count: usize,
    byte_count: usize,
    bytes_read: usize,
    position: usize,
    pending: u64,
    pending_bits: i32,
}

impl PackedReaderIterator {
    pub fn new(
        packed_ints_version: i32,
        value_count: usize,
        bits_per_value: i32,
    ) -> Result<PackedReaderIterator> {
        check_version(packed_ints_version)?;
        check_bits_per_value(bits_per_value)?;
        Ok(PackedReaderIterator {
            bits_per_value,
            value_count,
            byte_count: byte_count(packed_ints_version, value_count, bits_per_value),
            bytes_read: 0,
            position: 0,
            pending: 0,
            pending_bits: 0,
        })
    }

    pub fn next<T: DataInput + ?Sized>(&mut self, input: &mut T) -> Result<i64> {
        if self.position >= self.value_count {
            bail!(IllegalState(format!(
                "all {} packed values have been read",
                self.value_count
            )));
        }
        while self.pending_bits < self.bits_per_value {
            let b = input.read_byte()?;
            self.bytes_read += 1;
            self.pending = (self.pending << 8) | u64::from(b);
            self.pending_bits += 8;
        }
        self.pending_bits -= self.bits_per_value;
        let value = low_bits(self.pending >> self.pending_bits, self.bits_per_value);
        self.pending = low_bits(self.pending, self.pending_bits);
        self.position += 1;

        if self.position == self.value_count {
            debug_assert!(self.bytes_read <= self.byte_count);
            input.skip_bytes(self.byte_count - self.bytes_read)?;
            self.bytes_read = self.byte_count;
        }
        Ok(value as i64)
    }

    pub fn bits_per_value(&self) -> i32 {
        self.bits_per_value
    }

}

/// Writes a header-less packed array, the counterpart of `PackedReaderIterator`.
pub struct PackedWriter {
    packed_ints_version: i32,
    value_count: usize,
    bits_per_value: i32,
    written: usize,
    bytes_written: usize,
    pending: u64,
    pending_bits: i32,
    finished: bool,
}

impl PackedWriter {
    pub fn new(
        packed_ints_version: i32,
        value_count: usize,
        bits_per_value: i32,
    ) -> Result<PackedWriter> {
        check_version(packed_ints_version)?;
        check_bits_per_value(bits_per_value)?;
        Ok(PackedWriter {
            packed_ints_version,
            value_count,
            bits_per_value,
            written: 0,
            bytes_written: 0,
            pending: 0,
            pending_bits: 0,
            finished: false,
        })
    }

    pub fn add<O: DataOutput + ?Sized>(&mut self, v: i64, out: &mut O) -> Result<()> {
        debug_assert!(!self.finished);
        if self.written >= self.value_count {
            bail!(IllegalState("Writing past end of stream".into()));
        }
        if v < 0 || v > max_value(self.bits_per_value) {
            bail!(IllegalArgument(format!(
                "{} needs {} bits, only {} available",
                v,
                v.bits_required(),
                self.bits_per_value
            )));
        }
        self.pending = (self.pending << self.bits_per_value) | v as u64;
        self.pending_bits += self.bits_per_value;
        while self.pending_bits >= 8 {
            self.pending_bits -= 8;
            out.write_byte((self.pending >> self.pending_bits) as u8)?;
            self.bytes_written += 1;
        }
        self.pending = low_bits(self.pending, self.pending_bits);
        self.written += 1;
        Ok(())
    }

    /// Pads missing values with zeros and writes the trailing bytes.
    pub fn finish<O: DataOutput + ?Sized>(&mut self, out: &mut O) -> Result<()> {
        debug_assert!(!self.finished);
        while self.written < self.value_count {
            self.add(0, out)?;
        }
        if self.pending_bits > 0 {
            out.write_byte((self.pending << (8 - self.pending_bits)) as u8)?;
            self.bytes_written += 1;
            self.pending = 0;
            self.pending_bits = 0;
        }
        let total = byte_count(self.packed_ints_version, self.value_count, self.bits_per_value);
        while self.bytes_written < total {
            out.write_byte(0)?;
            self.bytes_written += 1;
        }
        self.finished = true;
        Ok(())
    }

    pub fn bits_per_value(&self) -> i32 {
        self.bits_per_value
    }
}

/// Packs `values` into `out` in one go.
pub fn write_packed<O: DataOutput + ?Sized>(
    out: &mut O,
    packed_ints_version: i32,
    bits_per_value: i32,
    values: &[i64],
) -> Result<()> {
    let mut writer = PackedWriter::new(packed_ints_version, values.len(), bits_per_value)?;
    for &v in values {
        writer.add(v, out)?;
    }
    writer.finish(out)
}
