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

//! Shared components for bytecache.

/// Assertion helpers gated by the `strict_assertions` feature.
pub mod assert;
/// Bit manipulation helpers.
pub mod bits;
/// The unified error type.
pub mod error;
/// The FNV-1a hasher used for both slot and shard selection.
pub mod hasher;
/// Time sources for TTL bookkeeping.
pub mod time;
