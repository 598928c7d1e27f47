//! code-link turns source code into short tokens that fit in a URL fragment, and back again.
//!
//! A browser-based editor can share a snippet without storing it anywhere: the whole program
//! travels inside the link. To keep those links short, the text is
//!
//! - UTF-8 encoded,
//! - compressed with zstd at a fixed level,
//! - prefixed with a one-byte format marker, and
//! - written out in a 79-symbol alphabet that needs no escaping inside a URL fragment. This is
//!   denser than base64: 9 characters per 7 bytes.
//!
//! Decoding reverses each step. A link that fails at any step is reported as
//! [`LinkError::Corrupt`]; the stage that failed is kept inside for logging.
//!
//! The compression engine is loaded lazily, once, through an [`EngineLoader`]. This lets an
//! engine that needs slow, asynchronous setup be swapped in without changing callers.
//!
//! See the [`format`] module for the exact token layout.

mod codec;
mod compress;
mod config;
mod error;
mod escape;
mod lazy;

pub mod alphabet;
pub mod format;
pub mod fragment;
pub mod radix;

pub use self::alphabet::{ALPHABET, BASE};
pub use self::codec::{decode_with, encode_with, Format, LinkCodec};
pub use self::compress::{
    CompressionError, Compressor, EngineLoader, ZstdEngine, ZstdLoader, COMPRESSION_LEVEL,
};
pub use self::config::LinkConfig;
pub use self::error::{Error, LinkError, Result};
pub use self::escape::unescape;
pub use self::lazy::LazyEngine;

/// Fragment key used for tokens unless configured otherwise, as in `#code=<token>`.
pub const DEFAULT_MARKER: &str = "code";
