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

mod chunk_cursor;

pub use self::chunk_cursor::*;

mod chunk_metadata;

pub use self::chunk_metadata::*;

mod document_input;

pub use self::document_input::*;

mod stored_fields_reader;

pub use self::stored_fields_reader::*;

mod stored_fields_writer;

pub use self::stored_fields_writer::*;

use crate::core::util::{CompressionMode, DEFAULT_BUFFER_REUSE_THRESHOLD};

pub const CODEC_NAME_DAT: &str = "Lucene41StoredFieldsData";

pub const VERSION_START: i32 = 0;
/// Adds the chunk size to the header and enables sliced compression of big chunks.
pub const VERSION_BIG_CHUNKS: i32 = 1;
pub const VERSION_CURRENT: i32 = VERSION_BIG_CHUNKS;

pub const STRING: i32 = 0x00;
pub const BYTE_ARR: i32 = 0x01;
pub const NUMERIC_INT: i32 = 0x02;
pub const NUMERIC_FLOAT: i32 = 0x03;
pub const NUMERIC_LONG: i32 = 0x04;
pub const NUMERIC_DOUBLE: i32 = 0x05;

pub const TYPE_BITS: i32 = 3;
// 3 bits max value
pub const TYPE_MASK: i32 = 7;

/// Bit widths above this are rejected in chunk metadata.
pub const MAX_METADATA_BITS: i32 = 31;

/// Options for opening a `CompressingStoredFieldsReader`.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    pub compression_mode: CompressionMode,
    /// Codec name expected in the file header.
    pub codec_name: String,
    /// Decompressed blocks up to this many bytes reuse one scratch buffer.
    pub buffer_reuse_threshold: usize,
}

impl ReaderOptions {
    pub fn new(compression_mode: CompressionMode) -> ReaderOptions {
        ReaderOptions {
            compression_mode,
            ..Default::default()
        }
    }
}

impl Default for ReaderOptions {
    fn default() -> ReaderOptions {
        ReaderOptions {
            compression_mode: CompressionMode::FAST,
            codec_name: CODEC_NAME_DAT.to_string(),
            buffer_reuse_threshold: DEFAULT_BUFFER_REUSE_THRESHOLD,
        }
    }
}
