// Copyright 2026 bytecache Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{
    fmt::{Debug, Display},
    ops::{BitAnd, Sub},
};

/// An unsigned trait that used by the utils.
pub trait Unsigned:
    Sub<Output = Self> + BitAnd<Output = Self> + Sized + From<u8> + Eq + Debug + Display + Clone + Copy
{
}

impl<U> Unsigned for U where
    U: Sub<Output = Self> + BitAnd<Output = Self> + Sized + From<u8> + Eq + Debug + Display + Clone + Copy
{
}

/// Check if the given value is a power of 2.
///
/// Note: zero is treated as a power of 2 here, callers that care must check it separately.
#[inline(always)]
pub fn is_pow2<U: Unsigned>(v: U) -> bool {
    v == U::from(0) || v & (v - U::from(1)) == U::from(0)
}

/// Debug assert that the given value is a power of 2.
#[inline(always)]
pub fn debug_assert_pow2<U: Unsigned>(v: U) {
    debug_assert!(is_pow2(v), "v: {}", v);
}

/// Round the given value up to the next power of 2.
///
/// Zero is rounded up to 1, so the result can always be used to build a `size - 1` mask.
#[inline(always)]
pub fn round_up_pow2(v: usize) -> usize {
    v.max(1).next_power_of_two()
}
