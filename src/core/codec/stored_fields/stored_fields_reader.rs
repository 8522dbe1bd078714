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

use crate::core::codec::codec_util::check_header;
use crate::core::codec::stored_fields::{
    skip_payload, ChunkCursor, ChunkHeader, ChunkMetadata, DocumentInput, ReaderOptions,
    BYTE_ARR, NUMERIC_DOUBLE, NUMERIC_FLOAT, NUMERIC_INT, NUMERIC_LONG, STRING, TYPE_BITS,
    TYPE_MASK, VERSION_BIG_CHUNKS, VERSION_CURRENT, VERSION_START,
};
use crate::core::doc::StoredFieldVisitor;
use crate::core::store::io::{DataInput, IndexInput};
use crate::core::util::{
    CompressionMode, Decompressor, DocId, ScratchBuffer, UnsignedShift,
};
use crate::error::ErrorKind::{CorruptIndex, EndOfData, IllegalArgument};
use crate::error::Result;

/// Reads documents from a compressed stored fields data file.
///
/// The reader is a forward-only cursor over the chunks of the file: documents
/// must be requested in non-decreasing order. Documents and whole chunks may
/// be skipped, and documents of the current chunk may be visited again, but a
/// document of an earlier chunk can not be reached anymore.
pub struct CompressingStoredFieldsReader {
    fields_stream: Box<dyn IndexInput>,
    version: i32,
    // absent for files written before VERSION_BIG_CHUNKS
    chunk_size: Option<usize>,
    packed_ints_version: i32,
    compression_mode: CompressionMode,
    decompressor: Decompressor,
    scratch: ScratchBuffer,
    cursor: ChunkCursor,
    next_doc: DocId,
}

impl CompressingStoredFieldsReader {
    pub fn open(
        input: Box<dyn IndexInput>,
        compression_mode: CompressionMode,
    ) -> Result<CompressingStoredFieldsReader> {
        Self::open_with_options(input, ReaderOptions::new(compression_mode))
    }

    /// Validates the header and leaves the reader in front of the first chunk.
    /// The input is dropped if this fails.
    pub fn open_with_options(
        mut fields_stream: Box<dyn IndexInput>,
        options: ReaderOptions,
    ) -> Result<CompressingStoredFieldsReader> {
        let version = check_header(
            fields_stream.as_mut(),
            &options.codec_name,
            VERSION_START,
            VERSION_CURRENT,
        )?;
        let chunk_size = if version >= VERSION_BIG_CHUNKS {
            let chunk_size = fields_stream.read_vint()?;
            if chunk_size <= 0 {
                bail!(CorruptIndex(format!(
                    "invalid chunk_size {} (resource={})",
                    chunk_size,
                    fields_stream.name()
                )));
            }
            Some(chunk_size as usize)
        } else {
            None
        };
        let packed_ints_version = fields_stream.read_vint()?;
        let first_chunk = fields_stream.file_pointer();

        debug!(
            "opened {}: version={} chunk_size={:?} packed_ints_version={} length={}",
            fields_stream.name(),
            version,
            chunk_size,
            packed_ints_version,
            fields_stream.len()
        );

        Ok(CompressingStoredFieldsReader {
            fields_stream,
            version,
            chunk_size,
            packed_ints_version,
            compression_mode: options.compression_mode,
            decompressor: options.compression_mode.new_decompressor(),
            scratch: ScratchBuffer::new(options.buffer_reuse_threshold),
            cursor: ChunkCursor::new(first_chunk),
            next_doc: 0,
        })
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn chunk_size(&self) -> Option<usize> {
        self.chunk_size
    }

    pub fn packed_ints_version(&self) -> i32 {
        self.packed_ints_version
    }

    pub fn compression_mode(&self) -> CompressionMode {
        self.compression_mode
    }

    pub fn cursor(&self) -> &ChunkCursor {
        &self.cursor
    }

    /// Feeds every stored field of `doc_id` to `visitor`.
    ///
    /// Fails with `EndOfData` when no chunk holds `doc_id`, and with
    /// `IllegalArgument` when `doc_id` lies in a chunk before the current one.
    pub fn visit_document<V: StoredFieldVisitor + ?Sized>(
        &mut self,
        doc_id: DocId,
        visitor: &mut V,
    ) -> Result<()> {
        if doc_id < 0 {
            bail!(IllegalArgument(format!("negative doc id {}", doc_id)));
        }
        let header = self.seek_chunk(doc_id)?;
        let metadata = ChunkMetadata::read(
            self.fields_stream.as_mut(),
            &header,
            doc_id,
            self.packed_ints_version,
            self.cursor.chunk_start(),
        )?;
        let last_in_chunk = metadata.is_last_document(doc_id);

        if metadata.num_stored_fields == 0 {
            if last_in_chunk {
                skip_payload(
                    self.fields_stream.as_mut(),
                    &self.decompressor,
                    &mut self.scratch,
                    self.chunk_size,
                    metadata.total_length,
                )?;
                self.cursor.set_chunk_end(self.fields_stream.file_pointer());
            }
            self.next_doc = doc_id + 1;
            return Ok(());
        }

        {
            let mut input = DocumentInput::open(
                self.fields_stream.as_mut(),
                &self.decompressor,
                &mut self.scratch,
                self.chunk_size,
                &metadata,
            )?;
            for _ in 0..metadata.num_stored_fields {
                let info_and_bits = input.read_vlong()?;
                let field_number = info_and_bits.unsigned_shift(TYPE_BITS as usize);
                if field_number > i64::from(u32::max_value()) {
                    bail!(CorruptIndex(format!(
                        "field number {} out of range in doc {}",
                        field_number, doc_id
                    )));
                }
                let bits = (info_and_bits & i64::from(TYPE_MASK)) as i32;
                Self::read_field(&mut input, visitor, field_number as u32, bits)?;
                self.cursor.record_field_end(input.file_pointer());
            }
        }
        if last_in_chunk {
            self.cursor.finish_chunk();
        }
        self.next_doc = doc_id + 1;
        Ok(())
    }

    /// Visits the document following the last visited one. Returns its id,
    /// or `None` once every document has been read.
    pub fn next_document<V: StoredFieldVisitor + ?Sized>(
        &mut self,
        visitor: &mut V,
    ) -> Result<Option<DocId>> {
        let doc_id = self.next_doc;
        match self.visit_document(doc_id, visitor) {
            Ok(()) => Ok(Some(doc_id)),
            Err(ref e) if e.is_end_of_data() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Moves the cursor onto the chunk holding `doc_id` and returns its
    /// header, with the stream positioned right after it.
    fn seek_chunk(&mut self, doc_id: DocId) -> Result<ChunkHeader> {
        let mut entered = None;
        while self.cursor.is_stale(doc_id) {
            let next_start = match self.cursor.chunk_end() {
                Some(end) => end,
                None => self.skip_chunk_tail()?,
            };
            if next_start >= self.fields_stream.len() as i64 {
                bail!(EndOfData(doc_id));
            }
            self.fields_stream.seek(next_start)?;
            let header = ChunkHeader::read(self.fields_stream.as_mut())?;
            self.cursor.enter_chunk(next_start, &header)?;
            debug!(
                "chunk at {}: doc_base={} chunk_docs={}",
                next_start, header.doc_base, header.chunk_docs
            );
            entered = Some(header);
        }

        if !self.cursor.covers(doc_id) {
            bail!(IllegalArgument(format!(
                "doc {} precedes the current chunk starting at doc {}, documents must be \
                 visited in increasing order",
                doc_id,
                self.cursor.doc_base()
            )));
        }

        match entered {
            Some(header) => Ok(header),
            None => {
                self.fields_stream.seek(self.cursor.chunk_start())?;
                ChunkHeader::read(self.fields_stream.as_mut())
            }
        }
    }

    /// Finds where the current chunk ends when its final document was not
    /// decoded, by consuming the chunk's payload.
    fn skip_chunk_tail(&mut self) -> Result<i64> {
        let chunk_start = self.cursor.chunk_start();
        debug!(
            "skipping unvisited documents of chunk at {} (docs {}..{})",
            chunk_start,
            self.cursor.doc_base(),
            self.cursor.documents_accounted_for()
        );
        self.fields_stream.seek(chunk_start)?;
        let header = ChunkHeader::read(self.fields_stream.as_mut())?;
        let metadata = ChunkMetadata::read(
            self.fields_stream.as_mut(),
            &header,
            header.last_doc(),
            self.packed_ints_version,
            chunk_start,
        )?;
        skip_payload(
            self.fields_stream.as_mut(),
            &self.decompressor,
            &mut self.scratch,
            self.chunk_size,
            metadata.total_length,
        )?;
        let chunk_end = self.fields_stream.file_pointer();
        self.cursor.set_chunk_end(chunk_end);
        Ok(chunk_end)
    }

    fn read_length(input: &mut impl DataInput, field_number: u32) -> Result<usize> {
        let length = input.read_vint()?;
        if length < 0 {
            bail!(CorruptIndex(format!(
                "negative length {} for field {}",
                length, field_number
            )));
        }
        Ok(length as usize)
    }

    fn read_field<V: StoredFieldVisitor + ?Sized>(
        input: &mut impl DataInput,
        visitor: &mut V,
        field_number: u32,
        bits: i32,
    ) -> Result<()> {
        match bits {
            BYTE_ARR => {
                let length = Self::read_length(input, field_number)?;
                let mut data = vec![0u8; length];
                input.read_bytes(&mut data, 0, length)?;
                visitor.binary_field(field_number, data)
            }
            STRING => {
                let length = Self::read_length(input, field_number)?;
                let mut data = vec![0u8; length];
                input.read_bytes(&mut data, 0, length)?;
                let value = String::from_utf8(data).map_err(|e| {
                    CorruptIndex(format!("invalid UTF-8 in field {}: {}", field_number, e))
                })?;
                visitor.string_field(field_number, value)
            }
            NUMERIC_INT => visitor.int_field(field_number, input.read_int()?),
            NUMERIC_FLOAT => {
                visitor.float_field(field_number, f32::from_bits(input.read_int()? as u32))
            }
            NUMERIC_LONG => visitor.long_field(field_number, input.read_long()?),
            NUMERIC_DOUBLE => {
                visitor.double_field(field_number, f64::from_bits(input.read_long()? as u64))
            }
            _ => bail!(CorruptIndex(format!(
                "unknown type flag {} for field {}",
                bits, field_number
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::codec::codec_util::{header_length, write_header};
    use crate::core::codec::stored_fields::{
        CompressingStoredFieldsWriter, DecodePolicy, CODEC_NAME_DAT,
    };
    use crate::core::doc::{DocumentStoredFieldVisitor, StoredField};
    use crate::core::store::io::{ByteBufferIndexInput, DataOutput};
    use crate::core::store::{Directory, MmapDirectory};
    use crate::core::util::packed::VERSION_CURRENT as PACKED_VERSION_CURRENT;
    use crate::core::util::{Compress, VariantValue};
    use crate::error::{Error, ErrorKind};

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use std::io::{self, Read};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    type Doc = Vec<(u32, VariantValue)>;

    fn write_segment(
        mode: CompressionMode,
        chunk_size: usize,
        max_docs_per_chunk: usize,
        docs: &[Doc],
    ) -> Vec<u8> {
        let mut writer =
            CompressingStoredFieldsWriter::new(Vec::new(), mode, chunk_size, max_docs_per_chunk)
                .unwrap();
        for doc in docs {
            writer.add_document(doc).unwrap();
        }
        writer.finish().unwrap()
    }

    fn open(bytes: Vec<u8>, mode: CompressionMode) -> CompressingStoredFieldsReader {
        CompressingStoredFieldsReader::open(Box::new(ByteBufferIndexInput::new("_0.fdt", bytes)), mode)
            .unwrap()
    }

    fn read_doc(reader: &mut CompressingStoredFieldsReader, doc_id: DocId) -> Result<Doc> {
        let mut visitor = DocumentStoredFieldVisitor::default();
        reader.visit_document(doc_id, &mut visitor)?;
        Ok(visitor
            .take_fields()
            .into_iter()
            .map(|f| (f.field_number, f.value))
            .collect())
    }

    fn assert_kind(err: Error, check: fn(&ErrorKind) -> bool) {
        assert!(check(err.kind()), "unexpected error {:?}", err.kind());
    }

    fn is_corrupt(kind: &ErrorKind) -> bool {
        match kind {
            ErrorKind::CorruptIndex(_) => true,
            _ => false,
        }
    }

    fn is_format_mismatch(kind: &ErrorKind) -> bool {
        match kind {
            ErrorKind::FormatMismatch(_) => true,
            _ => false,
        }
    }

    fn is_illegal_argument(kind: &ErrorKind) -> bool {
        match kind {
            ErrorKind::IllegalArgument(_) => true,
            _ => false,
        }
    }

    fn random_string(rng: &mut StdRng, max_len: usize) -> String {
        let len = rng.gen::<u32>() as usize % (max_len + 1);
        (0..len)
            .map(|_| match rng.gen::<u32>() % 10 {
                0 => 'ü',
                1 => '中',
                _ => (b'a' + (rng.gen::<u32>() % 26) as u8) as char,
            })
            .collect()
    }

    fn random_doc(rng: &mut StdRng, max_len: usize) -> Doc {
        let num_fields = rng.gen::<u32>() % 6;
        (0..num_fields)
            .map(|i| {
                let value = match rng.gen::<u32>() % 6 {
                    0 => VariantValue::VString(random_string(rng, max_len)),
                    1 => {
                        let len = rng.gen::<u32>() as usize % (max_len + 1);
                        VariantValue::Binary((0..len).map(|_| rng.gen::<u8>()).collect())
                    }
                    2 => VariantValue::Int(rng.gen()),
                    3 => VariantValue::Float(rng.gen()),
                    4 => VariantValue::Long(rng.gen()),
                    _ => VariantValue::Double(rng.gen()),
                };
                (i * 7 + rng.gen::<u32>() % 3, value)
            })
            .collect()
    }

    fn random_docs(rng: &mut StdRng, count: usize, max_len: usize) -> Vec<Doc> {
        (0..count).map(|_| random_doc(rng, max_len)).collect()
    }

    #[test]
    fn test_round_trip() {
        let mut rng = StdRng::seed_from_u64(0x00C0_FFEE);
        for mode in &[CompressionMode::FAST, CompressionMode::HighCompression] {
            for &(chunk_size, max_docs, max_len) in &[
                (16usize, 128usize, 300usize),
                (64, 4, 50),
                (1 << 10, 128, 100),
                (1 << 14, 1, 2000),
            ] {
                let docs = random_docs(&mut rng, 60, max_len);
                let bytes = write_segment(*mode, chunk_size, max_docs, &docs);
                let mut reader = open(bytes, *mode);
                assert_eq!(reader.chunk_size(), Some(chunk_size));

                let mut visitor = DocumentStoredFieldVisitor::default();
                for (i, doc) in docs.iter().enumerate() {
                    assert_eq!(reader.next_document(&mut visitor).unwrap(), Some(i as DocId));
                    let fields: Doc = visitor
                        .take_fields()
                        .into_iter()
                        .map(|f| (f.field_number, f.value))
                        .collect();
                    assert_eq!(&fields, doc, "doc {}", i);
                }
                assert_eq!(reader.next_document(&mut visitor).unwrap(), None);
                assert!(visitor.fields.is_empty());
            }
        }
    }

    #[test]
    fn test_two_document_chunk() {
        let mut payload = Vec::new();
        for s in &["abcde", "fghij"] {
            payload.write_vlong(i64::from(STRING)).unwrap();
            payload.write_string(s).unwrap();
        }
        assert_eq!(payload.len(), 14);

        let mut out = Vec::new();
        write_header(&mut out, CODEC_NAME_DAT, VERSION_CURRENT).unwrap();
        out.write_vint(1 << 14).unwrap();
        out.write_vint(PACKED_VERSION_CURRENT).unwrap();
        // doc_base, chunk_docs, uniform field count 1, uniform length 7
        for v in &[0, 2, 0, 1, 0, 7] {
            out.write_vint(*v).unwrap();
        }
        CompressionMode::FAST
            .new_compressor()
            .compress(&payload, 0, payload.len(), &mut out)
            .unwrap();

        let mut reader = open(out, CompressionMode::FAST);
        assert_eq!(
            read_doc(&mut reader, 0).unwrap(),
            vec![(0, VariantValue::from("abcde"))]
        );
        assert_eq!(
            read_doc(&mut reader, 1).unwrap(),
            vec![(0, VariantValue::from("fghij"))]
        );
        assert!(read_doc(&mut reader, 2).unwrap_err().is_end_of_data());
    }

    #[test]
    fn test_empty_chunk_reads_nothing_past_tables() {
        let mut out = Vec::new();
        write_header(&mut out, CODEC_NAME_DAT, VERSION_CURRENT).unwrap();
        out.write_vint(64).unwrap();
        out.write_vint(PACKED_VERSION_CURRENT).unwrap();
        for v in &[0, 3, 0, 0, 0, 0] {
            out.write_vint(*v).unwrap();
        }
        let bytes_with_one_chunk = out.clone();

        let mut reader = open(bytes_with_one_chunk, CompressionMode::FAST);
        for doc in 0..3 {
            assert!(read_doc(&mut reader, doc).unwrap().is_empty());
        }
        assert!(read_doc(&mut reader, 3).unwrap_err().is_end_of_data());

        // a second chunk right behind the tables of the empty one
        let mut writer =
            CompressingStoredFieldsWriter::new(Vec::new(), CompressionMode::FAST, 64, 8).unwrap();
        for _ in 0..3 {
            writer.finish_document().unwrap();
        }
        writer.flush().unwrap();
        writer
            .add_document(&[(4, VariantValue::from(12i32))])
            .unwrap();
        let bytes = writer.finish().unwrap();
        assert_eq!(&bytes[..out.len()], &out[..]);

        let mut reader = open(bytes, CompressionMode::FAST);
        let mut visitor = DocumentStoredFieldVisitor::default();
        for doc in 0..3 {
            assert_eq!(reader.next_document(&mut visitor).unwrap(), Some(doc));
            assert!(visitor.fields.is_empty());
        }
        assert_eq!(reader.next_document(&mut visitor).unwrap(), Some(3));
        assert_eq!(
            visitor.take_fields(),
            vec![StoredField::new(4, VariantValue::Int(12))]
        );
    }

    #[test]
    fn test_buffered_and_sliced_boundary() {
        let chunk_size = 64;
        for mode in &[CompressionMode::FAST, CompressionMode::HighCompression] {
            for &(text_len, policy) in &[(125usize, DecodePolicy::Buffered), (126, DecodePolicy::Sliced)]
            {
                let text: String = (0..text_len)
                    .map(|i| (b'a' + (i % 7) as u8) as char)
                    .collect();
                let mut doc = Vec::new();
                doc.write_vlong((3 << TYPE_BITS) | i64::from(STRING)).unwrap();
                doc.write_string(&text).unwrap();
                assert_eq!(doc.len(), text_len + 2);
                assert_eq!(DecodePolicy::select(Some(chunk_size), doc.len()), policy);

                let mut expected = Vec::new();
                write_header(&mut expected, CODEC_NAME_DAT, VERSION_CURRENT).unwrap();
                expected.write_vint(chunk_size as i32).unwrap();
                expected.write_vint(PACKED_VERSION_CURRENT).unwrap();
                for v in &[0, 1, 1, doc.len() as i32] {
                    expected.write_vint(*v).unwrap();
                }
                let mut compressor = mode.new_compressor();
                if policy == DecodePolicy::Sliced {
                    compressor.compress(&doc, 0, chunk_size, &mut expected).unwrap();
                    compressor
                        .compress(&doc, chunk_size, chunk_size, &mut expected)
                        .unwrap();
                } else {
                    compressor.compress(&doc, 0, doc.len(), &mut expected).unwrap();
                }

                let written = write_segment(
                    *mode,
                    chunk_size,
                    128,
                    &[vec![(3, VariantValue::from(text.clone()))]],
                );
                assert_eq!(written, expected);

                let mut reader = open(written, *mode);
                assert_eq!(
                    read_doc(&mut reader, 0).unwrap(),
                    vec![(3, VariantValue::from(text))]
                );
                assert!(read_doc(&mut reader, 1).unwrap_err().is_end_of_data());
            }
        }
    }

    #[test]
    fn test_end_of_data() {
        let empty = write_segment(CompressionMode::FAST, 64, 8, &[]);
        let mut reader = open(empty, CompressionMode::FAST);
        let err = read_doc(&mut reader, 0).unwrap_err();
        match err.kind() {
            ErrorKind::EndOfData(doc) => assert_eq!(*doc, 0),
            k => panic!("unexpected error {:?}", k),
        }

        let mut rng = StdRng::seed_from_u64(3);
        let docs = random_docs(&mut rng, 10, 40);
        let mut reader = open(write_segment(CompressionMode::FAST, 64, 3, &docs), CompressionMode::FAST);
        assert!(read_doc(&mut reader, 25).unwrap_err().is_end_of_data());
        assert!(read_doc(&mut reader, 25).unwrap_err().is_end_of_data());
        assert!(read_doc(&mut reader, 10).unwrap_err().is_end_of_data());

        let mut reader = open(write_segment(CompressionMode::FAST, 64, 3, &docs), CompressionMode::FAST);
        assert_eq!(read_doc(&mut reader, 9).unwrap(), docs[9]);
        assert!(read_doc(&mut reader, 10).unwrap_err().is_end_of_data());
    }

    #[test]
    fn test_skip_documents_and_chunks() {
        let mut rng = StdRng::seed_from_u64(11);
        for mode in &[CompressionMode::FAST, CompressionMode::HighCompression] {
            let docs = random_docs(&mut rng, 80, 120);
            let bytes = write_segment(*mode, 32, 5, &docs);
            for step in 1..12 {
                let mut reader = open(bytes.clone(), *mode);
                let mut doc = (rng.gen::<u32>() % 3) as usize;
                while doc < docs.len() {
                    assert_eq!(read_doc(&mut reader, doc as DocId).unwrap(), docs[doc]);
                    doc += step;
                }
                assert!(read_doc(&mut reader, docs.len() as DocId)
                    .unwrap_err()
                    .is_end_of_data());
            }

            // next_document resumes after the last visited document
            let mut reader = open(bytes.clone(), *mode);
            assert_eq!(read_doc(&mut reader, 41).unwrap(), docs[41]);
            let mut visitor = DocumentStoredFieldVisitor::default();
            assert_eq!(reader.next_document(&mut visitor).unwrap(), Some(42));
        }
    }

    #[test]
    fn test_revisit_and_regression() {
        let mut rng = StdRng::seed_from_u64(5);
        let docs: Vec<Doc> = (0..12)
            .map(|i| vec![(1, VariantValue::Int(i)), (2, VariantValue::from(random_string(&mut rng, 20)))])
            .collect();
        let mut reader = open(write_segment(CompressionMode::FAST, 1 << 10, 4, &docs), CompressionMode::FAST);

        // docs of the current chunk can be visited again
        assert_eq!(read_doc(&mut reader, 5).unwrap(), docs[5]);
        assert_eq!(read_doc(&mut reader, 7).unwrap(), docs[7]);
        assert_eq!(read_doc(&mut reader, 4).unwrap(), docs[4]);
        assert_eq!(read_doc(&mut reader, 8).unwrap(), docs[8]);

        // an earlier chunk is out of reach
        assert_kind(read_doc(&mut reader, 3).unwrap_err(), is_illegal_argument);
        assert_kind(read_doc(&mut reader, -1).unwrap_err(), is_illegal_argument);

        // the cursor is unharmed
        assert_eq!(read_doc(&mut reader, 11).unwrap(), docs[11]);
        assert!(read_doc(&mut reader, 12).unwrap_err().is_end_of_data());
    }

    struct FailingVisitor;

    impl StoredFieldVisitor for FailingVisitor {
        fn binary_field(&mut self, _: u32, _: Vec<u8>) -> Result<()> {
            bail!("binary rejected")
        }
        fn string_field(&mut self, _: u32, _: String) -> Result<()> {
            bail!("string rejected")
        }
        fn int_field(&mut self, _: u32, _: i32) -> Result<()> {
            bail!("int rejected")
        }
        fn long_field(&mut self, _: u32, _: i64) -> Result<()> {
            bail!("long rejected")
        }
        fn float_field(&mut self, _: u32, _: f32) -> Result<()> {
            bail!("float rejected")
        }
        fn double_field(&mut self, _: u32, _: f64) -> Result<()> {
            bail!("double rejected")
        }
    }

    #[test]
    fn test_visitor_error_aborts_document() {
        let docs: Vec<Doc> = (0..6)
            .map(|i| vec![(0, VariantValue::Long(i)), (1, VariantValue::Long(-i))])
            .collect();
        for mode in &[CompressionMode::FAST, CompressionMode::HighCompression] {
            let mut reader = open(write_segment(*mode, 1 << 10, 3, &docs), *mode);
            assert!(reader.visit_document(2, &mut FailingVisitor).is_err());
            // the chunk end was not learnt from doc 2 and is found again
            assert_eq!(read_doc(&mut reader, 3).unwrap(), docs[3]);
            assert_eq!(read_doc(&mut reader, 5).unwrap(), docs[5]);
        }
    }

    #[test]
    fn test_corrupt_documents() {
        let mut writer =
            CompressingStoredFieldsWriter::new(Vec::new(), CompressionMode::FAST, 1 << 10, 8)
                .unwrap();
        writer.add_document(&[(0, VariantValue::Int(1))]).unwrap();
        // type flag 6 does not exist
        writer.write_raw_field((1 << TYPE_BITS) | 6, &[0, 0, 0, 0]).unwrap();
        writer.finish_document().unwrap();
        // invalid UTF-8 in a string field
        writer
            .write_raw_field((2 << TYPE_BITS) | i64::from(STRING), &[2, 0xC3, 0x28])
            .unwrap();
        writer.finish_document().unwrap();
        writer.add_document(&[(3, VariantValue::Int(4))]).unwrap();
        let bytes = writer.finish().unwrap();

        let mut reader = open(bytes, CompressionMode::FAST);
        assert_eq!(read_doc(&mut reader, 0).unwrap(), vec![(0, VariantValue::Int(1))]);
        assert_kind(read_doc(&mut reader, 1).unwrap_err(), is_corrupt);
        assert_kind(read_doc(&mut reader, 2).unwrap_err(), is_corrupt);
        assert_eq!(read_doc(&mut reader, 3).unwrap(), vec![(3, VariantValue::Int(4))]);
    }

    #[test]
    fn test_length_and_field_count_mismatch() {
        let mut out = Vec::new();
        write_header(&mut out, CODEC_NAME_DAT, VERSION_CURRENT).unwrap();
        out.write_vint(64).unwrap();
        out.write_vint(PACKED_VERSION_CURRENT).unwrap();
        // one document with two fields and no bytes
        for v in &[0, 1, 2, 0] {
            out.write_vint(*v).unwrap();
        }
        let mut reader = open(out, CompressionMode::FAST);
        let err = read_doc(&mut reader, 0).unwrap_err();
        assert_kind(err, is_corrupt);
    }

    #[test]
    fn test_chunk_accounting_mismatch() {
        let docs: Vec<Doc> = (0..4).map(|i| vec![(0, VariantValue::Int(i))]).collect();
        let bytes = write_segment(CompressionMode::FAST, 1 << 10, 2, &docs);
        let mut reader = open(bytes.clone(), CompressionMode::FAST);
        assert_eq!(read_doc(&mut reader, 1).unwrap(), docs[1]);
        let second_chunk = reader.cursor().chunk_end().unwrap() as usize;

        // the second chunk claims to start at doc 5
        let mut patched = bytes;
        assert_eq!(patched[second_chunk], 2);
        patched[second_chunk] = 5;
        let mut reader = open(patched, CompressionMode::FAST);
        assert_eq!(read_doc(&mut reader, 0).unwrap(), docs[0]);
        assert_kind(read_doc(&mut reader, 2).unwrap_err(), is_corrupt);
    }

    fn segment_with_chunks(version: i32, chunks: &[&[i32]]) -> Vec<u8> {
        let mut out = Vec::new();
        write_header(&mut out, CODEC_NAME_DAT, version).unwrap();
        if version >= VERSION_BIG_CHUNKS {
            out.write_vint(64).unwrap();
        }
        out.write_vint(PACKED_VERSION_CURRENT).unwrap();
        for chunk in chunks {
            for v in chunk.iter() {
                out.write_vint(*v).unwrap();
            }
        }
        out
    }

    #[test]
    fn test_chunk_doc_count_overflow() {
        let bytes = segment_with_chunks(
            VERSION_CURRENT,
            &[&[0, 2, 0, 0, 0, 0], &[2, i32::max_value(), 0, 0, 0, 0]],
        );
        let mut reader = open(bytes, CompressionMode::FAST);
        assert!(read_doc(&mut reader, 0).unwrap().is_empty());
        assert!(read_doc(&mut reader, 1).unwrap().is_empty());
        assert_kind(read_doc(&mut reader, 2).unwrap_err(), is_corrupt);
        assert_eq!(reader.cursor().documents_accounted_for(), 2);
    }

    #[test]
    fn test_oversized_chunk_is_corrupt() {
        let bytes = segment_with_chunks(VERSION_START, &[&[0, 1000, 0, 1, 0, i32::max_value()]]);
        for mode in &[CompressionMode::FAST, CompressionMode::HighCompression] {
            let mut reader = open(bytes.clone(), *mode);
            assert_kind(read_doc(&mut reader, 0).unwrap_err(), is_corrupt);
            assert_kind(read_doc(&mut reader, 999).unwrap_err(), is_corrupt);
        }
    }

    #[test]
    fn test_header_mismatch() {
        let docs = vec![vec![(0, VariantValue::Int(1))]];
        let bytes = write_segment(CompressionMode::FAST, 64, 8, &docs);

        let wrong_codec = ReaderOptions {
            codec_name: "Lucene40StoredFieldsData".to_string(),
            ..Default::default()
        };
        let input = Box::new(ByteBufferIndexInput::new("_0.fdt", bytes.clone()));
        assert_kind(
            CompressingStoredFieldsReader::open_with_options(input, wrong_codec)
                .err()
                .unwrap(),
            is_format_mismatch,
        );

        let mut newer = bytes.clone();
        let version_at = header_length(CODEC_NAME_DAT) - 1;
        newer[version_at] = 2;
        let input = Box::new(ByteBufferIndexInput::new("_0.fdt", newer));
        assert_kind(
            CompressingStoredFieldsReader::open(input, CompressionMode::FAST)
                .err()
                .unwrap(),
            is_format_mismatch,
        );

        let truncated = bytes[..header_length(CODEC_NAME_DAT)].to_vec();
        let input = Box::new(ByteBufferIndexInput::new("_0.fdt", truncated));
        assert!(CompressingStoredFieldsReader::open(input, CompressionMode::FAST)
            .err()
            .unwrap()
            .is_unexpected_eof());
    }

    #[test]
    fn test_unsupported_packed_ints_version() {
        let docs = vec![
            vec![(0, VariantValue::Int(1))],
            vec![(0, VariantValue::Int(1)), (1, VariantValue::Int(2))],
        ];
        let mut bytes = write_segment(CompressionMode::FAST, 64, 8, &docs);
        let packed_version_at = header_length(CODEC_NAME_DAT) + 1;
        assert_eq!(i32::from(bytes[packed_version_at]), PACKED_VERSION_CURRENT);
        bytes[packed_version_at] = 9;

        let mut reader = open(bytes, CompressionMode::FAST);
        assert_eq!(reader.packed_ints_version(), 9);
        assert_kind(read_doc(&mut reader, 0).unwrap_err(), is_format_mismatch);
    }

    #[test]
    fn test_oldest_versions() {
        let mut rng = StdRng::seed_from_u64(21);
        let docs = random_docs(&mut rng, 30, 200);
        for mode in &[CompressionMode::FAST, CompressionMode::HighCompression] {
            let mut writer =
                CompressingStoredFieldsWriter::with_versions(Vec::new(), *mode, 16, 6, VERSION_START, 0)
                    .unwrap();
            for doc in &docs {
                writer.add_document(doc).unwrap();
            }
            let bytes = writer.finish().unwrap();

            let mut reader = open(bytes, *mode);
            assert_eq!(reader.version(), VERSION_START);
            assert_eq!(reader.chunk_size(), None);
            assert_eq!(reader.packed_ints_version(), 0);
            for (i, doc) in docs.iter().enumerate() {
                assert_eq!(&read_doc(&mut reader, i as DocId).unwrap(), doc);
            }
        }
    }

    #[test]
    fn test_owned_buffers_above_threshold() {
        let mut rng = StdRng::seed_from_u64(8);
        let docs = random_docs(&mut rng, 40, 100);
        let bytes = write_segment(CompressionMode::FAST, 1 << 12, 16, &docs);
        let options = ReaderOptions {
            buffer_reuse_threshold: 0,
            ..Default::default()
        };
        let input = Box::new(ByteBufferIndexInput::new("_0.fdt", bytes));
        let mut reader = CompressingStoredFieldsReader::open_with_options(input, options).unwrap();
        for (i, doc) in docs.iter().enumerate() {
            assert_eq!(&read_doc(&mut reader, i as DocId).unwrap(), doc);
        }
    }

    struct TrackedInput {
        inner: ByteBufferIndexInput,
        dropped: Arc<AtomicBool>,
    }

    impl Drop for TrackedInput {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    impl Read for TrackedInput {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl DataInput for TrackedInput {
        fn read_byte(&mut self) -> Result<u8> {
            self.inner.read_byte()
        }
    }

    impl IndexInput for TrackedInput {
        fn file_pointer(&self) -> i64 {
            self.inner.file_pointer()
        }
        fn seek(&mut self, pos: i64) -> Result<()> {
            self.inner.seek(pos)
        }
        fn len(&self) -> u64 {
            self.inner.len()
        }
        fn name(&self) -> &str {
            self.inner.name()
        }
    }

    #[test]
    fn test_input_released() {
        let bytes = write_segment(CompressionMode::FAST, 64, 8, &[vec![(0, VariantValue::Int(1))]]);

        let dropped = Arc::new(AtomicBool::new(false));
        let input = Box::new(TrackedInput {
            inner: ByteBufferIndexInput::new("_0.fdt", bytes.clone()),
            dropped: Arc::clone(&dropped),
        });
        assert!(CompressingStoredFieldsReader::open(input, CompressionMode::HighCompression).is_ok());
        assert!(dropped.load(Ordering::SeqCst));

        let dropped = Arc::new(AtomicBool::new(false));
        let mut corrupt = bytes;
        corrupt[0] = 0;
        let input = Box::new(TrackedInput {
            inner: ByteBufferIndexInput::new("_0.fdt", corrupt),
            dropped: Arc::clone(&dropped),
        });
        assert!(CompressingStoredFieldsReader::open(input, CompressionMode::FAST).is_err());
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_read_from_directory() {
        let dir = ::std::env::temp_dir().join(format!(
            "compressed-segment-reader-{}",
            ::std::process::id()
        ));
        ::std::fs::create_dir_all(&dir).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let docs = random_docs(&mut rng, 25, 300);
        let bytes = write_segment(CompressionMode::HighCompression, 64, 8, &docs);
        ::std::fs::write(dir.join("_0.fdt"), &bytes).unwrap();

        let directory = MmapDirectory::new(&dir).unwrap();
        let input = directory.open_input("_0.fdt").unwrap();
        let mut reader =
            CompressingStoredFieldsReader::open(input, CompressionMode::HighCompression).unwrap();
        for (i, doc) in docs.iter().enumerate() {
            assert_eq!(&read_doc(&mut reader, i as DocId).unwrap(), doc);
        }
        assert!(read_doc(&mut reader, docs.len() as DocId)
            .unwrap_err()
            .is_end_of_data());
        ::std::fs::remove_dir_all(&dir).unwrap();
    }
}
