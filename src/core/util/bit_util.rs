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

use std::mem::size_of;

pub trait UnsignedShift: Sized {
    fn unsigned_shift(&self, by: usize) -> Self;
}

macro_rules! impl_unsigned_shift {
    ($type: ty, $utype: ty) => {
        impl UnsignedShift for $type {
            #[inline]
            fn unsigned_shift(&self, by: usize) -> Self {
                (*self as $utype >> by) as $type
            }
        }
    };
}

impl_unsigned_shift!(i32, u32);
impl_unsigned_shift!(i64, u64);

// bits needed to write a non-negative value, at least 1
pub trait BitsRequired {
    fn bits_required(&self) -> u32;
}

macro_rules! impl_bits_required {
    ($type:ty, $width: expr) => {
        impl BitsRequired for $type {
            #[inline]
            fn bits_required(&self) -> u32 {
                1.max($width - (*self).leading_zeros())
            }
        }
    };
}

impl_bits_required!(i32, 32);
impl_bits_required!(u32, 32);
impl_bits_required!(i64, 64);
impl_bits_required!(u64, 64);
impl_bits_required!(usize, (size_of::<usize>() * 8) as u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_shift() {
        assert_eq!((-1i32).unsigned_shift(28), 0xF);
        assert_eq!((-8i64).unsigned_shift(61), 7);
        assert_eq!(16i32.unsigned_shift(3), 2);
    }

    #[test]
    fn test_bits_required() {
        assert_eq!(0i32.bits_required(), 1);
        assert_eq!(1i32.bits_required(), 1);
        assert_eq!(2i32.bits_required(), 2);
        assert_eq!(255u32.bits_required(), 8);
        assert_eq!(256i64.bits_required(), 9);
        assert_eq!(i32::max_value().bits_required(), 31);
        assert_eq!(usize::max_value().bits_required(), (size_of::<usize>() * 8) as u32);
    }
}
