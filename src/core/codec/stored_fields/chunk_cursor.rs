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

use crate::core::codec::stored_fields::ChunkHeader;
use crate::core::util::DocId;
use crate::error::ErrorKind::CorruptIndex;
use crate::error::Result;

/// Position of a reader within the chunk sequence of a segment.
///
/// The cursor only moves forward. `documents_accounted_for` is the number of
/// documents in all chunks entered so far, so a request for `doc_id` is
/// served by the current chunk iff `doc_base <= doc_id < documents_accounted_for`.
#[derive(Debug, Clone)]
pub struct ChunkCursor {
    chunk_start: i64,
    doc_base: DocId,
    chunk_docs: i32,
    documents_accounted_for: DocId,
    last_field_end: i64,
    // where the next chunk begins, once the current chunk's payload was consumed
    chunk_end: Option<i64>,
}

impl ChunkCursor {
    /// A cursor placed before the first chunk, which starts at `first_chunk_start`.
    pub fn new(first_chunk_start: i64) -> ChunkCursor {
        ChunkCursor {
            chunk_start: first_chunk_start,
            doc_base: 0,
            chunk_docs: 0,
            documents_accounted_for: 0,
            last_field_end: first_chunk_start,
            chunk_end: Some(first_chunk_start),
        }
    }

    pub fn is_stale(&self, doc_id: DocId) -> bool {
        self.documents_accounted_for <= doc_id
    }

    pub fn covers(&self, doc_id: DocId) -> bool {
        doc_id >= self.doc_base && doc_id < self.documents_accounted_for
    }

    /// Moves the cursor onto the chunk whose header was read at `chunk_start`.
    pub fn enter_chunk(&mut self, chunk_start: i64, header: &ChunkHeader) -> Result<()> {
        if header.chunk_docs <= 0 {
            bail!(CorruptIndex(format!(
                "chunk at {} holds no documents: chunk_docs={}",
                chunk_start, header.chunk_docs
            )));
        }
        if header.doc_base != self.documents_accounted_for {
            bail!(CorruptIndex(format!(
                "chunk at {} starts at doc {}, expected {}",
                chunk_start, header.doc_base, self.documents_accounted_for
            )));
        }
        let accounted = match self.documents_accounted_for.checked_add(header.chunk_docs) {
            Some(accounted) => accounted,
            None => bail!(CorruptIndex(format!(
                "chunk at {} overflows the doc id space: doc_base={} chunk_docs={}",
                chunk_start, header.doc_base, header.chunk_docs
            ))),
        };
        self.chunk_start = chunk_start;
        self.doc_base = header.doc_base;
        self.chunk_docs = header.chunk_docs;
        self.documents_accounted_for = accounted;
        self.last_field_end = chunk_start;
        self.chunk_end = None;
        Ok(())
    }

    pub fn record_field_end(&mut self, pointer: i64) {
        self.last_field_end = pointer;
    }

    /// Called once the final document of the chunk has been decoded: the
    /// next chunk begins where its last field ended.
    pub fn finish_chunk(&mut self) {
        self.chunk_end = Some(self.last_field_end);
    }

    pub fn set_chunk_end(&mut self, pointer: i64) {
        self.last_field_end = pointer;
        self.chunk_end = Some(pointer);
    }

    pub fn chunk_start(&self) -> i64 {
        self.chunk_start
    }

    pub fn chunk_end(&self) -> Option<i64> {
        self.chunk_end
    }

    pub fn doc_base(&self) -> DocId {
        self.doc_base
    }

    pub fn chunk_docs(&self) -> i32 {
        self.chunk_docs
    }

    pub fn documents_accounted_for(&self) -> DocId {
        self.documents_accounted_for
    }

    pub fn last_field_end(&self) -> i64 {
        self.last_field_end
    }
}
