//! The compression engine behind link tokens.
//!
//! [`Compressor`] is the seam between the codec and whatever compresses the payload. The shipped
//! engine is [`ZstdEngine`], produced by [`ZstdLoader`]. It writes a single zstd frame with no
//! magic number (the token's format header takes its place), an explicit content size, and a
//! content checksum.

use crate::error::Error;
use byteorder::{ByteOrder, LittleEndian};
use futures_core::future::BoxFuture;
use std::{cell::RefCell, fmt};

thread_local! {
    static ZSTD_CCTX: RefCell<zstd_safe::CCtx<'static>> = RefCell::new(zstd_safe::CCtx::create());
    static ZSTD_DCTX: RefCell<zstd_safe::DCtx<'static>> = RefCell::new(zstd_safe::DCtx::create());
}

/// The one compression level used for every link.
pub const COMPRESSION_LEVEL: i32 = 19;

/// Largest window a link frame may use, as a power of two.
const WINDOW_LOG: u32 = 21;

/// Most output a frame can produce per input byte. A block takes at least 4 bytes (3 for the
/// header, 1 for an RLE byte) and holds at most 128 KiB.
const MAX_EXPANSION: usize = (128 << 10) / 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompressionError {
    ExceededSize { max: usize, actual: usize },
    ZstdInner(usize),
    Parsing(&'static str),
}

impl fmt::Display for CompressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionError::ExceededSize { max, actual } => write!(
                f,
                "Decompressed size is {} bytes, larger than max of {} bytes",
                actual, max
            ),
            CompressionError::ZstdInner(v) => {
                write!(f, "zstd failure, code {} ({})", v, zstd_safe::get_error_name(*v))
            }
            CompressionError::Parsing(s) => f.write_str(s),
        }
    }
}

impl std::error::Error for CompressionError {}

impl From<zstd_safe::ErrorCode> for CompressionError {
    fn from(value: zstd_safe::ErrorCode) -> Self {
        CompressionError::ZstdInner(value)
    }
}

/// A lossless byte compressor.
///
/// Implementations must be able to decompress anything they compressed, and must report every
/// decompression failure as a [`CompressionError`]. Both operations may be called concurrently
/// from many threads.
pub trait Compressor: Send + Sync {
    /// Compress `src` into a fresh buffer.
    fn compress(&self, src: &[u8]) -> Result<Vec<u8>, CompressionError>;

    /// Decompress `src`, failing if the result would be larger than `max_size`.
    fn decompress(&self, src: &[u8], max_size: usize) -> Result<Vec<u8>, CompressionError>;
}

/// Produces a [`Compressor`], possibly asynchronously.
///
/// Loading may be slow (fetching and instantiating a compression module, say), so the codec only
/// does it once and keeps the result; see [`LazyEngine`][crate::LazyEngine]. A failed load is
/// retried on the next use.
pub trait EngineLoader: Send + Sync {
    type Engine: Compressor;

    fn load(&self) -> BoxFuture<'_, Result<Self::Engine, Error>>;
}

/// Loads a [`ZstdEngine`] after checking that the linked zstd library supports the link format.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZstdLoader;

impl EngineLoader for ZstdLoader {
    type Engine = ZstdEngine;

    fn load(&self) -> BoxFuture<'_, Result<ZstdEngine, Error>> {
        Box::pin(async move { ZstdEngine::new(COMPRESSION_LEVEL) })
    }
}

/// zstd compression configured for link tokens.
#[derive(Clone, Debug)]
pub struct ZstdEngine {
    level: i32,
}

impl ZstdEngine {
    fn new(level: i32) -> Result<Self, Error> {
        let (min, max) = (zstd_safe::min_c_level(), zstd_safe::max_c_level());
        if !(min..=max).contains(&level) {
            return Err(Error::EngineLoad(format!(
                "compression level {} outside of supported range {}..={}",
                level, min, max
            )));
        }
        if zstd_safe::CCtx::try_create().is_none() || zstd_safe::DCtx::try_create().is_none() {
            return Err(Error::EngineLoad("couldn't allocate zstd contexts".into()));
        }
        Ok(Self { level })
    }
}

impl Compressor for ZstdEngine {
    fn compress(&self, src: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let mut dst = Vec::new();
        zstd_compress(src, &mut dst, self.level)?;
        Ok(dst)
    }

    fn decompress(&self, src: &[u8], max_size: usize) -> Result<Vec<u8>, CompressionError> {
        let mut dst = Vec::new();
        zstd_decompress(src, &mut dst, max_size)?;
        Ok(dst)
    }
}

/// Read the promised content size out of a magicless frame header.
fn decompressed_size(header: &[u8]) -> Result<usize, CompressionError> {
    let Some(&descriptor) = header.first() else {
        return Err(CompressionError::Parsing("not enough bytes in header"));
    };
    // Reserved bits and dictionary IDs are never set in a link frame, and the checksum always is.
    if descriptor & 0x1B != 0 {
        return Err(CompressionError::Parsing(
            "Incorrect zstd frame header descriptor for a link",
        ));
    }
    if descriptor & 0x04 == 0 {
        return Err(CompressionError::Parsing("Missing frame checksum"));
    }
    let size_flag = descriptor >> 6;
    let single_segment = descriptor & 0x20 != 0;
    if size_flag == 0 && !single_segment {
        return Err(CompressionError::Parsing("Missing frame content size"));
    }
    let offset = 1 + (!single_segment as usize);
    let size_len = [1usize, 2, 4, 8][size_flag as usize];
    let Some(field) = header.get(offset..offset + size_len) else {
        return Err(CompressionError::Parsing("Header isn't large enough"));
    };
    let size = LittleEndian::read_uint(field, size_len);
    // The 2-byte field is offset by 256, so it can never hold a size the 1-byte field could.
    let size = match size_len {
        2 => size + 256,
        4 if size < 65792 => {
            return Err(CompressionError::Parsing(
                "Didn't use minimal-length encoding of decompressed frame size",
            ))
        }
        8 if size < u32::MAX as u64 => {
            return Err(CompressionError::Parsing(
                "Didn't use minimal-length encoding of decompressed frame size",
            ))
        }
        _ => size,
    };
    usize::try_from(size).map_err(|_| CompressionError::Parsing("length too long"))
}

fn zstd_compress(
    input: &[u8],
    output: &mut Vec<u8>,
    level: i32,
) -> Result<usize, CompressionError> {
    use zstd_safe::*;
    ZSTD_CCTX.with_borrow_mut(|ctx| {
        // Configure the context for a single frame with the smallest header that still carries a
        // size and checksum.
        ctx.reset(ResetDirective::SessionAndParameters)?;
        ctx.set_parameter(CParameter::CompressionLevel(level))?;
        ctx.set_parameter(CParameter::DictIdFlag(false))?;
        ctx.set_parameter(CParameter::ChecksumFlag(true))?;
        ctx.set_parameter(CParameter::Format(FrameFormat::Magicless))?;
        ctx.set_parameter(CParameter::ContentSizeFlag(true))?;
        ctx.set_parameter(CParameter::WindowLog(WINDOW_LOG))?;
        ctx.set_pledged_src_size(Some(input.len() as u64))?;

        output.reserve(compress_bound(input.len()));
        let out_buffer = output.spare_capacity_mut();

        // SAFETY:
        // zstd only writes into the spare capacity handed to it, and reports how much it wrote.
        let used_len = unsafe {
            let out_buffer = core::slice::from_raw_parts_mut(
                out_buffer.as_mut_ptr() as *mut u8,
                out_buffer.len(),
            );
            let used_len = ctx.compress2(out_buffer, input)?;
            output.set_len(used_len + output.len());
            used_len
        };

        Ok(used_len)
    })
}

fn zstd_decompress(
    input: &[u8],
    output: &mut Vec<u8>,
    max_size: usize,
) -> Result<usize, CompressionError> {
    use zstd_safe::*;

    let out_size = decompressed_size(input)?;
    if out_size > input.len().saturating_mul(MAX_EXPANSION) {
        return Err(CompressionError::Parsing(
            "Promised size is larger than the frame could hold",
        ));
    }
    let final_size = out_size.saturating_add(output.len());
    if final_size > max_size {
        return Err(CompressionError::ExceededSize {
            max: max_size,
            actual: final_size,
        });
    }
    output.reserve(out_size);

    ZSTD_DCTX.with_borrow_mut(|dtx| {
        dtx.reset(ResetDirective::SessionAndParameters)?;
        dtx.set_parameter(DParameter::Format(FrameFormat::Magicless))?;
        dtx.set_parameter(DParameter::WindowLogMax(WINDOW_LOG))?;

        // SAFETY:
        // We're just passing the spare capacity directly to zstd to fill out,
        // then adjusting the vec up by how much zstd filled in.
        let out_buffer = output.spare_capacity_mut();
        let used_len = unsafe {
            let out_buffer = core::slice::from_raw_parts_mut(
                out_buffer.as_mut_ptr() as *mut u8,
                out_buffer.len(),
            );
            let used_len = dtx.decompress(out_buffer, input)?;
            output.set_len(used_len + output.len());
            used_len
        };
        if used_len != out_size {
            return Err(CompressionError::Parsing(
                "Decompressed size doesn't match promised size",
            ));
        }

        Ok(used_len)
    })
}
