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

use crate::core::doc::StoredFieldVisitor;
use crate::core::util::VariantValue;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredField {
    pub field_number: u32,
    pub value: VariantValue,
}

impl StoredField {
    pub fn new(field_number: u32, value: VariantValue) -> StoredField {
        StoredField {
            field_number,
            value,
        }
    }
}

/// A `StoredFieldVisitor` that collects every field of a document, optionally
/// restricted to a set of field numbers.
#[derive(Debug, Default)]
pub struct DocumentStoredFieldVisitor {
    pub fields: Vec<StoredField>,
    fields_to_add: Vec<u32>,
}

impl DocumentStoredFieldVisitor {
    pub fn new(fields_to_add: &[u32]) -> DocumentStoredFieldVisitor {
        DocumentStoredFieldVisitor {
            fields: vec![],
            fields_to_add: fields_to_add.to_vec(),
        }
    }

    fn needs_field(&self, field_number: u32) -> bool {
        self.fields_to_add.is_empty() || self.fields_to_add.contains(&field_number)
    }

    fn add(&mut self, field_number: u32, value: VariantValue) {
        if self.needs_field(field_number) {
            self.fields.push(StoredField::new(field_number, value));
        }
    }

    /// Hands out the collected fields and resets the visitor for the next document.
    pub fn take_fields(&mut self) -> Vec<StoredField> {
        ::std::mem::replace(&mut self.fields, vec![])
    }
}

impl StoredFieldVisitor for DocumentStoredFieldVisitor {
    fn binary_field(&mut self, field_number: u32, value: Vec<u8>) -> Result<()> {
        self.add(field_number, VariantValue::Binary(value));
        Ok(())
    }

    fn string_field(&mut self, field_number: u32, value: String) -> Result<()> {
        self.add(field_number, VariantValue::VString(value));
        Ok(())
    }

    fn int_field(&mut self, field_number: u32, value: i32) -> Result<()> {
        self.add(field_number, VariantValue::Int(value));
        Ok(())
    }

    fn long_field(&mut self, field_number: u32, value: i64) -> Result<()> {
        self.add(field_number, VariantValue::Long(value));
        Ok(())
    }

    fn float_field(&mut self, field_number: u32, value: f32) -> Result<()> {
        self.add(field_number, VariantValue::Float(value));
        Ok(())
    }

    fn double_field(&mut self, field_number: u32, value: f64) -> Result<()> {
        self.add(field_number, VariantValue::Double(value));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_selected_fields() {
        let mut visitor = DocumentStoredFieldVisitor::new(&[1, 3]);
        visitor.string_field(0, "skipped".into()).unwrap();
        visitor.string_field(1, "kept".into()).unwrap();
        visitor.long_field(3, 42).unwrap();
        visitor.double_field(2, 1.0).unwrap();

        let fields = visitor.take_fields();
        assert_eq!(
            fields,
            vec![
                StoredField::new(1, VariantValue::VString("kept".into())),
                StoredField::new(3, VariantValue::Long(42)),
            ]
        );
        assert!(visitor.fields.is_empty());
    }
}
