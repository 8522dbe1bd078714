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

//! Utility functions for reading and writing versioned headers.
//!
//! Writing codec headers is useful to ensure that a file is in
//! the format you think it is.

use crate::core::store::io::{DataInput, DataOutput};
use crate::error::ErrorKind::{CorruptIndex, FormatMismatch, IllegalArgument};
use crate::error::Result;

/// Constant to identify the start of a codec header.
pub const CODEC_MAGIC: i32 = 0x3FD7_6C17;

/// Writes a codec header, which records both a string to identify the file and a version number.
///
/// CodecHeader --> Magic,CodecName,Version
/// * Magic --> `DataOutput::write_int`. This identifies the start of the header. It is always
///   `CODEC_MAGIC`.
/// * CodecName --> `DataOutput::write_string`. This is a string to identify this file.
/// * Version --> `DataOutput::write_int`. Records the version of the file.
///
/// The length of a codec header depends only upon the name of the codec,
/// see `header_length`.
pub fn write_header<T: DataOutput + ?Sized>(out: &mut T, codec: &str, version: i32) -> Result<()> {
    let clen = codec.len();
    if clen >= 128 || !codec.is_ascii() {
        bail!(IllegalArgument(format!(
            "codec must be simple ASCII less than 128 characters, got {}[length={}]",
            codec, clen,
        )));
    }
    out.write_int(CODEC_MAGIC)?;
    out.write_string(codec)?;
    out.write_int(version)
}

/// Computes the length of a codec header.
pub fn header_length(codec: &str) -> usize {
    9 + codec.len()
}

/// Reads and validates a header previously written with `write_header`.
///
/// When reading a file, supply the expected codec name and an expected version
/// range (min_ver to max_ver). Returns the actual version.
pub fn check_header<T: DataInput + ?Sized>(
    data_input: &mut T,
    codec: &str,
    min_ver: i32,
    max_ver: i32,
) -> Result<i32> {
    let actual_header = data_input.read_int()?;
    if actual_header != CODEC_MAGIC {
        bail!(FormatMismatch(format!(
            "codec header mismatch: actual=0x{:X}, expected=0x{:X}",
            actual_header, CODEC_MAGIC
        )));
    }
    check_header_no_magic(data_input, codec, min_ver, max_ver)
}

/// Like `check_header` except this version assumes the first i32 has already
/// been read and validated from the input.
pub fn check_header_no_magic<T: DataInput + ?Sized>(
    data_input: &mut T,
    codec: &str,
    min_ver: i32,
    max_ver: i32,
) -> Result<i32> {
    let codec_len = data_input.read_vint()?;
    if codec_len < 0 {
        bail!(CorruptIndex(format!("invalid codec name length {}", codec_len)));
    }
    let mut actual_codec = vec![0u8; codec_len as usize];
    data_input.read_bytes(&mut actual_codec, 0, codec_len as usize)?;
    if actual_codec != codec.as_bytes() {
        bail!(FormatMismatch(format!(
            "codec mismatch: actual={}, expected={}",
            String::from_utf8_lossy(&actual_codec),
            codec
        )));
    }
    let actual_ver = data_input.read_int()?;
    if actual_ver < min_ver || actual_ver > max_ver {
        bail!(FormatMismatch(format!(
            "index format either too new or too old: {} <= {} <= {} doesn't hold",
            min_ver, actual_ver, max_ver
        )));
    }
    Ok(actual_ver)
}
