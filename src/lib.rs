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

//! Forward-scanning reader for chunked, block-compressed stored fields
//! segments (the `Lucene41StoredFieldsData` layout).
//!
//! A segment groups documents into chunks that share one compression block;
//! per-document field counts and lengths live in packed integer tables in
//! front of the compressed payload. `CompressingStoredFieldsReader` walks the
//! chunks in increasing document order and hands every stored field to a
//! `StoredFieldVisitor`.

#![recursion_limit = "1024"]
#![cfg_attr(not(feature = "clippy"), allow(unknown_lints))]
#![allow(clippy::cast_lossless)]

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

extern crate byteorder;
extern crate flate2;
extern crate memmap;

pub mod core;
pub mod error;
