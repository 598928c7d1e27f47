//! Turning source text into link tokens and back.
//!
//! [`LinkCodec`] is what the rest of an application uses. It owns the compression engine loader
//! and hands out tokens for the "share" action, and source text when a page loads with a link.
//! The stage functions [`encode_with`] and [`decode_with`] do the actual work against an already
//! loaded engine, and report exactly which stage failed.

use crate::compress::{Compressor, EngineLoader, ZstdLoader};
use crate::error::{Error, LinkError, Result};
use crate::{escape, fragment, radix, LazyEngine, LinkConfig};
use std::fmt;

/// Token formats. Encoded as the first byte of the payload, ahead of the compressed frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// A magicless zstd frame with content size and checksum.
    ZstdV1,
}

impl Format {
    /// The format new tokens are written in.
    pub const CURRENT: Format = Format::ZstdV1;
}

impl From<Format> for u8 {
    fn from(val: Format) -> u8 {
        match val {
            Format::ZstdV1 => 1,
        }
    }
}

impl TryFrom<u8> for Format {
    type Error = u8;
    fn try_from(val: u8) -> Result<Format, u8> {
        match val {
            1 => Ok(Format::ZstdV1),
            _ => Err(val),
        }
    }
}

/// Encode source text as a token using an already loaded engine.
pub fn encode_with<C: Compressor + ?Sized>(engine: &C, source: &str) -> Result<String> {
    let frame = engine
        .compress(source.as_bytes())
        .map_err(Error::Compress)?;
    let mut payload = Vec::with_capacity(frame.len() + 1);
    payload.push(u8::from(Format::CURRENT));
    payload.extend_from_slice(&frame);
    let token = radix::encode(&payload);
    tracing::debug!(
        source_len = source.len(),
        compressed_len = frame.len(),
        token_len = token.len(),
        "encoded link"
    );
    Ok(token)
}

/// Decode a token back into source text using an already loaded engine.
///
/// `max_len` caps the size of the decoded text in bytes.
pub fn decode_with<C: Compressor + ?Sized>(
    engine: &C,
    token: &str,
    max_len: usize,
) -> Result<String> {
    let token = escape::unescape(token)?;
    let payload = radix::decode(&token)?;
    let (&header, frame) = payload.split_first().ok_or(Error::BadHeader)?;
    match Format::try_from(header).map_err(Error::UnsupportedVersion)? {
        Format::ZstdV1 => {
            let raw = engine.decompress(frame, max_len)?;
            String::from_utf8(raw).map_err(|e| Error::Encoding(e.utf8_error()))
        }
    }
}

/// Converts source text to and from link tokens.
///
/// The compression engine is loaded on first use and shared by every later call. Loading
/// happens at most once at a time, and is tried again after a failure.
///
/// ```
/// # futures_executor::block_on(async {
/// let codec: code_link::LinkCodec = code_link::LinkCodec::default();
/// let token = codec.encode_for_link("print(\"hi\")").await.unwrap();
/// assert_eq!(codec.decode_from_link(&token).await.unwrap(), "print(\"hi\")");
/// # });
/// ```
pub struct LinkCodec<L: EngineLoader = ZstdLoader> {
    engine: LazyEngine<L>,
    config: LinkConfig,
}

impl<L: EngineLoader> LinkCodec<L> {
    pub fn new(loader: L) -> Self {
        Self::with_config(loader, LinkConfig::default())
    }

    pub fn with_config(loader: L, config: LinkConfig) -> Self {
        Self {
            engine: LazyEngine::new(loader),
            config,
        }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Turn source text into a token.
    ///
    /// Fails only if the compression engine can't be loaded ([`LinkError::Unavailable`]) or the
    /// engine itself breaks down ([`LinkError::Encode`]).
    pub async fn encode_for_link(&self, source: &str) -> Result<String, LinkError> {
        let engine = self.engine.get().await.map_err(LinkError::Unavailable)?;
        encode_with(engine, source).map_err(|e| {
            tracing::error!(error = %e, "failed to encode link");
            LinkError::Encode(e)
        })
    }

    /// Turn a token back into source text.
    ///
    /// Any failure to decode is reported as [`LinkError::Corrupt`].
    pub async fn decode_from_link(&self, token: &str) -> Result<String, LinkError> {
        let engine = self.engine.get().await.map_err(LinkError::Unavailable)?;
        decode_with(engine, token, self.config.decode_limit()).map_err(|e| {
            tracing::warn!(error = %e, token_len = token.len(), "shared link is corrupt");
            LinkError::Corrupt(e)
        })
    }

    /// Build a full share link for `source` on top of `base_url`.
    pub async fn share_url(&self, base_url: &str, source: &str) -> Result<String, LinkError> {
        let token = self.encode_for_link(source).await?;
        Ok(fragment::share_url(base_url, &self.config.marker, &token))
    }

    /// Load the source text shared in `url`, if there is any.
    ///
    /// `Ok(None)` means the URL carries no token. On [`LinkError::Corrupt`] the caller should fall
    /// back to its usual starting state.
    pub async fn load_from_url(&self, url: &str) -> Result<Option<String>, LinkError> {
        match fragment::extract_token(url, &self.config.marker) {
            Some(token) => self.decode_from_link(token).await.map(Some),
            None => Ok(None),
        }
    }
}

impl Default for LinkCodec<ZstdLoader> {
    fn default() -> Self {
        Self::new(ZstdLoader)
    }
}

impl<L: EngineLoader + fmt::Debug> fmt::Debug for LinkCodec<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LinkCodec")
            .field("engine", &self.engine)
            .field("config", &self.config)
            .finish()
    }
}
