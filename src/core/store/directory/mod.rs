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

use crate::core::store::io::IndexInput;
use crate::error::Result;

use std::fmt;

mod mmap_directory;

pub use self::mmap_directory::*;

/// A flat set of files that can be opened for reading by name.
pub trait Directory: fmt::Display {
    /// Opens a stream for reading an existing file.
    fn open_input(&self, name: &str) -> Result<Box<dyn IndexInput>>;
}
