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

use crate::core::store::directory::Directory;
use crate::core::store::io::{IndexInput, MmapIndexInput};
use crate::error::ErrorKind::IllegalArgument;
use crate::error::Result;

use std::fmt;
use std::path::{Path, PathBuf};

/// Read-only file system `Directory` that memory maps the files it opens.
pub struct MmapDirectory {
    directory: PathBuf,
}

impl MmapDirectory {
    pub fn new<T: AsRef<Path> + ?Sized>(directory: &T) -> Result<MmapDirectory> {
        let directory = directory.as_ref();
        if !directory.is_dir() {
            bail!(IllegalArgument(format!(
                "Path {:?} does not exist or is not a directory",
                directory
            )));
        }
        Ok(MmapDirectory {
            directory: directory.to_path_buf(),
        })
    }

    pub fn resolve(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }
}

impl Directory for MmapDirectory {
    fn open_input(&self, name: &str) -> Result<Box<dyn IndexInput>> {
        let full_path = self.resolve(name);
        debug!("open input {:?}", full_path);
        Ok(Box::new(MmapIndexInput::new(&full_path)?))
    }
}

impl fmt::Display for MmapDirectory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MmapDirectory({})", self.directory.display())
    }
}
