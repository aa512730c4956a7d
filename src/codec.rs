// Copyright 2024 FastLabs Developers
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

//! Pluggable buffer compression.
//!
//! The writer thread applies the configured codec once per drained buffer
//! before handing the bytes to the file manager. On codec failure the writer
//! falls back to the raw bytes, so the file is always lossless.

use std::borrow::Cow;

#[cfg(feature = "zstd")]
const ZSTD_LEVEL: i32 = 3;

/// Codec failure.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// An LZ4 block failed to decode.
    #[cfg(feature = "lz4")]
    #[error("lz4 block decode failed: {0}")]
    Lz4(#[from] lz4_flex::block::DecompressError),
    /// A zstd frame failed to encode or decode.
    #[cfg(feature = "zstd")]
    #[error("zstd frame codec failed: {0}")]
    Zstd(#[from] std::io::Error),
}

/// Compression strategy applied to drained buffers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Codec {
    /// Output equals input.
    #[default]
    Identity,
    /// Fast block compression; the frame carries its uncompressed length.
    #[cfg(feature = "lz4")]
    Lz4,
    /// Higher-ratio compression with a self-describing frame.
    #[cfg(feature = "zstd")]
    Zstd,
}

impl Codec {
    /// Compresses `src`. Identity borrows the input unchanged.
    pub fn compress<'a>(&self, src: &'a [u8]) -> Result<Cow<'a, [u8]>, CodecError> {
        match self {
            Codec::Identity => Ok(Cow::Borrowed(src)),
            #[cfg(feature = "lz4")]
            Codec::Lz4 => Ok(Cow::Owned(lz4_flex::compress_prepend_size(src))),
            #[cfg(feature = "zstd")]
            Codec::Zstd => Ok(Cow::Owned(zstd::stream::encode_all(src, ZSTD_LEVEL)?)),
        }
    }

    /// Decompresses `src` produced by the matching [`compress`][Codec::compress].
    pub fn decompress<'a>(&self, src: &'a [u8]) -> Result<Cow<'a, [u8]>, CodecError> {
        match self {
            Codec::Identity => Ok(Cow::Borrowed(src)),
            #[cfg(feature = "lz4")]
            Codec::Lz4 => Ok(Cow::Owned(lz4_flex::decompress_size_prepended(src)?)),
            #[cfg(feature = "zstd")]
            Codec::Zstd => Ok(Cow::Owned(zstd::stream::decode_all(src)?)),
        }
    }
}
