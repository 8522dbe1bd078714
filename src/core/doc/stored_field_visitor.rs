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

use crate::error::Result;

/// Receives the stored fields of one document, in the order they were written.
///
/// Returning an error aborts the visit of the current document and is passed
/// on to the caller of `visit_document`.
pub trait StoredFieldVisitor {
    fn binary_field(&mut self, field_number: u32, value: Vec<u8>) -> Result<()>;
    fn string_field(&mut self, field_number: u32, value: String) -> Result<()>;
    fn int_field(&mut self, field_number: u32, value: i32) -> Result<()>;
    fn long_field(&mut self, field_number: u32, value: i64) -> Result<()>;
    fn float_field(&mut self, field_number: u32, value: f32) -> Result<()>;
    fn double_field(&mut self, field_number: u32, value: f64) -> Result<()>;
}
