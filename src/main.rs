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

extern crate compressed_segment;

use std::env;
use std::io::{self, Write};
use std::process;

use compressed_segment::core::codec::stored_fields::CompressingStoredFieldsReader;
use compressed_segment::core::doc::StoredFieldVisitor;
use compressed_segment::core::store::{Directory, MmapDirectory};
use compressed_segment::core::util::{CompressionMode, VariantValue};
use compressed_segment::error::Result;

/// Writes one line per stored field.
struct PrintingVisitor<W: Write> {
    out: W,
}

impl<W: Write> PrintingVisitor<W> {
    fn print(&mut self, value: VariantValue) -> Result<()> {
        writeln!(self.out, "{}", value)?;
        Ok(())
    }
}

impl<W: Write> StoredFieldVisitor for PrintingVisitor<W> {
    fn binary_field(&mut self, _field_number: u32, value: Vec<u8>) -> Result<()> {
        self.print(VariantValue::Binary(value))
    }

    fn string_field(&mut self, _field_number: u32, value: String) -> Result<()> {
        self.print(VariantValue::VString(value))
    }

    fn int_field(&mut self, _field_number: u32, value: i32) -> Result<()> {
        self.print(VariantValue::Int(value))
    }

    fn long_field(&mut self, _field_number: u32, value: i64) -> Result<()> {
        self.print(VariantValue::Long(value))
    }

    fn float_field(&mut self, _field_number: u32, value: f32) -> Result<()> {
        self.print(VariantValue::Float(value))
    }

    fn double_field(&mut self, _field_number: u32, value: f64) -> Result<()> {
        self.print(VariantValue::Double(value))
    }
}

fn usage(program: &str) -> ! {
    eprintln!("usage: {} <directory> <file> [fast|high]", program);
    process::exit(1);
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let program = args
        .get(0)
        .map(String::as_str)
        .unwrap_or("read_compressed_segment");
    if args.len() < 3 || args.len() > 4 {
        usage(program);
    }
    let mode = match args.get(3).map(String::as_str) {
        None | Some("fast") => CompressionMode::FAST,
        Some("high") => CompressionMode::HighCompression,
        Some(_) => usage(program),
    };

    let directory = MmapDirectory::new(&args[1])?;
    let input = directory.open_input(&args[2])?;
    let mut reader = CompressingStoredFieldsReader::open(input, mode)?;

    let stdout = io::stdout();
    let mut visitor = PrintingVisitor { out: stdout.lock() };
    let mut docs = 0;
    while reader.next_document(&mut visitor)?.is_some() {
        docs += 1;
    }
    visitor.out.flush()?;
    eprintln!("{}: {} documents", directory, docs);
    Ok(())
}
