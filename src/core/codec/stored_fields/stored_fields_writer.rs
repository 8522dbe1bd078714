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

use crate::core::codec::codec_util::write_header;
use crate::core::codec::stored_fields::{
    BYTE_ARR, CODEC_NAME_DAT, NUMERIC_DOUBLE, NUMERIC_FLOAT, NUMERIC_INT, NUMERIC_LONG, STRING,
    TYPE_BITS, VERSION_BIG_CHUNKS, VERSION_CURRENT, VERSION_START,
};
use crate::core::store::io::DataOutput;
use crate::core::util::packed::{
    check_version, write_packed, VERSION_CURRENT as PACKED_VERSION_CURRENT,
};
use crate::core::util::{BitsRequired, Compress, CompressionMode, Compressor, DocId, VariantValue};
use crate::error::ErrorKind::IllegalArgument;
use crate::error::Result;

/// Writes a stored fields data file in the chunked layout read by
/// `CompressingStoredFieldsReader`.
///
/// Documents are buffered until at least `chunk_size` bytes or
/// `max_docs_per_chunk` documents are pending, then written out as one chunk.
/// A chunk whose payload reaches twice the chunk size is compressed in
/// independent slices of `chunk_size` bytes.
pub struct CompressingStoredFieldsWriter<O: DataOutput> {
    fields_stream: O,
    compressor: Compressor,
    version: i32,
    packed_ints_version: i32,
    chunk_size: usize,
    max_docs_per_chunk: usize,
    buffered_docs: Vec<u8>,
    // num of stored fields
    num_stored_fields: Vec<i32>,
    // end offsets in buffered_docs
    end_offsets: Vec<i32>,
    // doc ID at the beginning of the chunk
    doc_base: DocId,
    // doc_base + num_buffered_docs == current doc ID
    num_buffered_docs: usize,
    num_stored_fields_in_doc: usize,
    num_chunks: usize,
}

impl<O: DataOutput> CompressingStoredFieldsWriter<O> {
    pub fn new(
        output: O,
        compression_mode: CompressionMode,
        chunk_size: usize,
        max_docs_per_chunk: usize,
    ) -> Result<CompressingStoredFieldsWriter<O>> {
        Self::with_versions(
            output,
            compression_mode,
            chunk_size,
            max_docs_per_chunk,
            VERSION_CURRENT,
            PACKED_VERSION_CURRENT,
        )
    }

    /// Like `new`, with an explicit file format version and packed ints
    /// version. Files of `VERSION_START` have no chunk size in their header
    /// and never slice chunks.
    pub fn with_versions(
        mut output: O,
        compression_mode: CompressionMode,
        chunk_size: usize,
        max_docs_per_chunk: usize,
        version: i32,
        packed_ints_version: i32,
    ) -> Result<CompressingStoredFieldsWriter<O>> {
        if chunk_size == 0 || chunk_size > i32::max_value() as usize || max_docs_per_chunk == 0 {
            bail!(IllegalArgument(format!(
                "invalid chunk_size={} or max_docs_per_chunk={}",
                chunk_size, max_docs_per_chunk
            )));
        }
        if version < VERSION_START || version > VERSION_CURRENT {
            bail!(IllegalArgument(format!("unsupported version {}", version)));
        }
        check_version(packed_ints_version)?;

        write_header(&mut output, CODEC_NAME_DAT, version)?;
        if version >= VERSION_BIG_CHUNKS {
            output.write_vint(chunk_size as i32)?;
        }
        output.write_vint(packed_ints_version)?;

        Ok(CompressingStoredFieldsWriter {
            fields_stream: output,
            compressor: compression_mode.new_compressor(),
            version,
            packed_ints_version,
            chunk_size,
            max_docs_per_chunk,
            buffered_docs: Vec::with_capacity(chunk_size),
            num_stored_fields: vec![],
            end_offsets: vec![],
            doc_base: 0,
            num_buffered_docs: 0,
            num_stored_fields_in_doc: 0,
            num_chunks: 0,
        })
    }

    pub fn write_field(&mut self, field_number: u32, value: &VariantValue) -> Result<()> {
        let bits = match value {
            VariantValue::VString(_) => STRING,
            VariantValue::Binary(_) => BYTE_ARR,
            VariantValue::Int(_) => NUMERIC_INT,
            VariantValue::Float(_) => NUMERIC_FLOAT,
            VariantValue::Long(_) => NUMERIC_LONG,
            VariantValue::Double(_) => NUMERIC_DOUBLE,
        };
        self.num_stored_fields_in_doc += 1;
        let info_and_bits = (i64::from(field_number) << TYPE_BITS) | i64::from(bits);
        self.buffered_docs.write_vlong(info_and_bits)?;
        match value {
            VariantValue::VString(s) => self.buffered_docs.write_string(s)?,
            VariantValue::Binary(b) => {
                self.buffered_docs.write_vint(b.len() as i32)?;
                self.buffered_docs.write_bytes(b, 0, b.len())?;
            }
            VariantValue::Int(i) => self.buffered_docs.write_int(*i)?,
            VariantValue::Float(f) => self.buffered_docs.write_int(f.to_bits() as i32)?,
            VariantValue::Long(l) => self.buffered_docs.write_long(*l)?,
            VariantValue::Double(d) => self.buffered_docs.write_long(d.to_bits() as i64)?,
        }
        Ok(())
    }

    /// Appends a field with an arbitrary tag and payload.
    #[cfg(test)]
    pub(crate) fn write_raw_field(&mut self, info_and_bits: i64, payload: &[u8]) -> Result<()> {
        self.num_stored_fields_in_doc += 1;
        self.buffered_docs.write_vlong(info_and_bits)?;
        self.buffered_docs.write_bytes(payload, 0, payload.len())
    }

    pub fn finish_document(&mut self) -> Result<()> {
        self.num_stored_fields
            .push(self.num_stored_fields_in_doc as i32);
        self.num_stored_fields_in_doc = 0;
        self.end_offsets.push(self.buffered_docs.len() as i32);
        self.num_buffered_docs += 1;
        if self.trigger_flush() {
            self.flush()?;
        }
        Ok(())
    }

    /// Writes all fields of one document.
    pub fn add_document(&mut self, fields: &[(u32, VariantValue)]) -> Result<()> {
        for (field_number, value) in fields {
            self.write_field(*field_number, value)?;
        }
        self.finish_document()
    }

    fn trigger_flush(&self) -> bool {
        // chunks of at least chunk_size bytes
        self.buffered_docs.len() >= self.chunk_size
            || self.num_buffered_docs >= self.max_docs_per_chunk
    }

    /// Writes the buffered documents as a chunk, even if it is not full.
    pub fn flush(&mut self) -> Result<()> {
        if self.num_buffered_docs == 0 {
            return Ok(());
        }
        debug_assert_eq!(self.num_stored_fields_in_doc, 0);

        // transform end offsets into lengths
        let mut lengths = Vec::with_capacity(self.num_buffered_docs);
        let mut previous = 0;
        for &end in &self.end_offsets {
            lengths.push(end - previous);
            previous = end;
        }

        self.fields_stream.write_vint(self.doc_base)?;
        self.fields_stream
            .write_vint(self.num_buffered_docs as i32)?;
        Self::save_ints(
            &self.num_stored_fields,
            self.packed_ints_version,
            &mut self.fields_stream,
        )?;
        Self::save_ints(&lengths, self.packed_ints_version, &mut self.fields_stream)?;

        // compress stored fields to fields_stream
        let total = self.buffered_docs.len();
        let sliced = self.version >= VERSION_BIG_CHUNKS && total >= 2 * self.chunk_size;
        if sliced {
            // big chunk, slice it
            let mut compressed = 0usize;
            while compressed < total {
                self.compressor.compress(
                    &self.buffered_docs,
                    compressed,
                    self.chunk_size.min(total - compressed),
                    &mut self.fields_stream,
                )?;
                compressed += self.chunk_size;
            }
        } else if total > 0 {
            self.compressor.compress(
                &self.buffered_docs,
                0,
                total,
                &mut self.fields_stream,
            )?;
        }

        // reset
        self.doc_base += self.num_buffered_docs as DocId;
        self.num_buffered_docs = 0;
        self.num_stored_fields.clear();
        self.end_offsets.clear();
        self.buffered_docs.clear();
        self.num_chunks += 1;
        Ok(())
    }

    fn save_ints(values: &[i32], packed_ints_version: i32, out: &mut O) -> Result<()> {
        debug_assert!(!values.is_empty());
        if values.len() == 1 {
            out.write_vint(values[0])?;
        } else if values.iter().all(|&v| v == values[0]) {
            out.write_vint(0)?;
            out.write_vint(values[0])?;
        } else {
            let max = values.iter().cloned().max().unwrap_or(0);
            let bits_required = max.bits_required() as i32;
            out.write_vint(bits_required)?;
            let values: Vec<i64> = values.iter().map(|&v| i64::from(v)).collect();
            write_packed(out, packed_ints_version, bits_required, &values)?;
        }
        Ok(())
    }

    /// Number of documents written so far, including buffered ones.
    pub fn num_docs(&self) -> usize {
        self.doc_base as usize + self.num_buffered_docs
    }

    pub fn num_chunks(&self) -> usize {
        self.num_chunks
    }

    /// Flushes pending documents and hands back the output.
    pub fn finish(mut self) -> Result<O> {
        self.flush()?;
        Ok(self.fields_stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::codec::codec_util::{check_header, header_length};
    use crate::core::store::io::DataInput;

    #[test]
    fn test_header_layout() {
        let out = CompressingStoredFieldsWriter::new(Vec::new(), CompressionMode::FAST, 64, 8)
            .unwrap()
            .finish()
            .unwrap();
        let mut input: &[u8] = &out;
        assert_eq!(
            check_header(&mut input, CODEC_NAME_DAT, VERSION_START, VERSION_CURRENT).unwrap(),
            VERSION_BIG_CHUNKS
        );
        assert_eq!(input.read_vint().unwrap(), 64);
        assert_eq!(input.read_vint().unwrap(), PACKED_VERSION_CURRENT);
        assert!(input.is_empty());

        let out = CompressingStoredFieldsWriter::with_versions(
            Vec::new(),
            CompressionMode::FAST,
            64,
            8,
            VERSION_START,
            0,
        )
        .unwrap()
        .finish()
        .unwrap();
        assert_eq!(out.len(), header_length(CODEC_NAME_DAT) + 1);
    }

    #[test]
    fn test_empty_documents_write_no_payload() {
        let mut writer =
            CompressingStoredFieldsWriter::new(Vec::new(), CompressionMode::FAST, 64, 3).unwrap();
        for _ in 0..3 {
            writer.finish_document().unwrap();
        }
        assert_eq!(writer.num_chunks(), 1);
        let out = writer.finish().unwrap();
        let mut input: &[u8] = &out[header_length(CODEC_NAME_DAT) + 2..];
        // doc_base, chunk_docs, uniform 0 fields, uniform 0 bytes
        for expected in &[0, 3, 0, 0, 0, 0] {
            assert_eq!(input.read_vint().unwrap(), *expected);
        }
        assert!(input.is_empty());
    }

    #[test]
    fn test_flush_triggers() {
        let mut writer =
            CompressingStoredFieldsWriter::new(Vec::new(), CompressionMode::FAST, 16, 100).unwrap();
        writer
            .add_document(&[(0, VariantValue::from("0123456789abcdef"))])
            .unwrap();
        assert_eq!(writer.num_chunks(), 1);
        writer.add_document(&[(0, VariantValue::from(1i32))]).unwrap();
        assert_eq!(writer.num_chunks(), 1);
        assert_eq!(writer.num_docs(), 2);
        writer.flush().unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.num_chunks(), 2);

        assert!(
            CompressingStoredFieldsWriter::new(Vec::new(), CompressionMode::FAST, 0, 1).is_err()
        );
    }
}
