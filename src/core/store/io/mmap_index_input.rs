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

use crate::core::store::io::{DataInput, IndexInput};

use crate::error::ErrorKind::{IllegalArgument, UnexpectedEOF};
use crate::error::Result;
use memmap::Mmap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

/// `IndexInput` over a memory mapped file.
///
/// Empty files cannot be mapped, they are represented by an input without a
/// backing map.
#[derive(Clone)]
pub struct MmapIndexInput {
    map: Option<Arc<Mmap>>,
    position: usize,
    description: String,
}

impl MmapIndexInput {
    pub fn new(path: &Path) -> Result<MmapIndexInput> {
        Ok(MmapIndexInput {
            map: MmapIndexInput::mmap(path)?,
            position: 0,
            description: format!("MmapIndexInput(path=\"{}\")", path.display()),
        })
    }

    pub fn mmap(path: &Path) -> Result<Option<Arc<Mmap>>> {
        let file = File::open(path)?;
        let meta_data = file.metadata()?;
        if meta_data.len() == 0 {
            Ok(None)
        } else {
            let mmap = unsafe { Mmap::map(&file)? };
            Ok(Some(Arc::new(mmap)))
        }
    }

    #[inline]
    fn as_slice(&self) -> &[u8] {
        match self.map {
            Some(ref map) => &map[..],
            None => &[],
        }
    }
}

impl DataInput for MmapIndexInput {
    #[inline]
    fn read_byte(&mut self) -> Result<u8> {
        if self.position >= self.as_slice().len() {
            bail!(UnexpectedEOF(format!(
                "read past EOF: pos={} ({})",
                self.position, self.description
            )));
        }
        let b = self.as_slice()[self.position];
        self.position += 1;
        Ok(b)
    }

    fn read_bytes(&mut self, b: &mut [u8], offset: usize, len: usize) -> Result<()> {
        let available = self.as_slice().len().saturating_sub(self.position);
        if len > available {
            bail!(UnexpectedEOF(format!(
                "read past EOF: pos={}, wanted {} bytes, {} left ({})",
                self.position, len, available, self.description
            )));
        }
        let pos = self.position;
        b[offset..offset + len].copy_from_slice(&self.as_slice()[pos..pos + len]);
        self.position += len;
        Ok(())
    }

    fn skip_bytes(&mut self, count: usize) -> Result<()> {
        let pos = self.file_pointer() + count as i64;
        self.seek(pos)
    }
}

impl IndexInput for MmapIndexInput {
    fn file_pointer(&self) -> i64 {
        self.position as i64
    }

    fn seek(&mut self, pos: i64) -> Result<()> {
        if pos < 0 || pos as u64 > self.len() {
            bail!(IllegalArgument(format!(
                "seek to {} outside of [0, {}] ({})",
                pos,
                self.len(),
                self.description
            )));
        }
        self.position = pos as usize;
        Ok(())
    }

    #[inline]
    fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }

    fn name(&self) -> &str {
        &self.description
    }
}

impl Read for MmapIndexInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let pos = self.position.min(self.as_slice().len());
        let read = (&self.as_slice()[pos..]).read(buf)?;
        self.position = pos + read;
        Ok(read)
    }
}
