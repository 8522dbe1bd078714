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

use std::fmt;

/// A single decoded stored field value.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    VString(String),
    Binary(Vec<u8>),
}

impl fmt::Display for VariantValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VariantValue::Int(i) => write!(f, "{}", i),
            VariantValue::Long(l) => write!(f, "{}", l),
            VariantValue::Float(v) => write!(f, "{:.3}", v),
            VariantValue::Double(v) => write!(f, "{:.3}", v),
            VariantValue::VString(s) => write!(f, "{}", s),
            VariantValue::Binary(b) => write!(f, "{}", String::from_utf8_lossy(b)),
        }
    }
}

impl From<i32> for VariantValue {
    fn from(i: i32) -> Self {
        VariantValue::Int(i)
    }
}

impl From<i64> for VariantValue {
    fn from(l: i64) -> Self {
        VariantValue::Long(l)
    }
}

impl From<f32> for VariantValue {
    fn from(f: f32) -> Self {
        VariantValue::Float(f)
    }
}

impl From<f64> for VariantValue {
    fn from(d: f64) -> Self {
        VariantValue::Double(d)
    }
}

impl<'a> From<&'a str> for VariantValue {
    fn from(s: &'a str) -> Self {
        VariantValue::VString(s.to_string())
    }
}

impl From<String> for VariantValue {
    fn from(s: String) -> Self {
        VariantValue::VString(s)
    }
}

impl From<Vec<u8>> for VariantValue {
    fn from(b: Vec<u8>) -> Self {
        VariantValue::Binary(b)
    }
}
