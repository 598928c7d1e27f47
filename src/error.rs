use crate::compress::CompressionError;
use std::{fmt, str::Utf8Error};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A failure at one specific stage of turning a token back into source text, or of preparing the
/// compression engine.
///
/// These stay distinguishable for logging and testing. Callers of [`LinkCodec`][crate::LinkCodec]
/// only ever see them wrapped in a [`LinkError`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The token contains a character outside the link alphabet, or a malformed percent-escape.
    /// `index` is the byte offset into the token as it was handed to the decoder.
    Alphabet { index: usize, found: char },
    /// The token length doesn't describe a whole number of bytes.
    TruncatedStream { len: usize },
    /// A window of digits names a value that no byte window could have produced.
    BadWindow { index: usize },
    /// The decoded payload is empty, so there's no format header to read.
    BadHeader,
    /// The format header names a token format this version doesn't know.
    UnsupportedVersion(u8),
    /// Decompression failed: bad frame header, checksum mismatch, unexpected end of the frame, or
    /// the promised size was over the limit.
    CorruptStream(CompressionError),
    /// The decompressed bytes aren't valid UTF-8.
    Encoding(Utf8Error),
    /// The engine failed to compress. Only seen when encoding.
    Compress(CompressionError),
    /// The compression engine couldn't be initialized.
    EngineLoad(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Alphabet { index, found } => write!(
                f,
                "Character {:?} at offset {} is not in the link alphabet",
                found, index
            ),
            Error::TruncatedStream { len } => write!(
                f,
                "Token of {} characters doesn't end on a whole byte",
                len
            ),
            Error::BadWindow { index } => {
                write!(f, "Digit window at offset {} is out of range", index)
            }
            Error::BadHeader => f.write_str("Token has no format header"),
            Error::UnsupportedVersion(v) => write!(f, "Unsupported token format {}", v),
            Error::CorruptStream(ref err) => write!(f, "Failed decompression step: {}", err),
            Error::Encoding(ref err) => write!(f, "Decoded text isn't valid UTF-8: {}", err),
            Error::Compress(ref err) => write!(f, "Failed compression step: {}", err),
            Error::EngineLoad(ref err) => {
                write!(f, "Compression engine failed to load: {}", err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::CorruptStream(ref err) | Error::Compress(ref err) => Some(err),
            Error::Encoding(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<CompressionError> for Error {
    fn from(e: CompressionError) -> Self {
        Self::CorruptStream(e)
    }
}

impl From<Utf8Error> for Error {
    fn from(e: Utf8Error) -> Self {
        Self::Encoding(e)
    }
}

/// The error a user of [`LinkCodec`][crate::LinkCodec] sees.
///
/// Every decode failure is reported as [`LinkError::Corrupt`], whatever stage it came from: to
/// the end user, a link either works or it doesn't. The stage is still available through
/// [`LinkError::stage`] and [`std::error::Error::source`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkError {
    /// The link can't be turned back into source text.
    Corrupt(Error),
    /// The compression engine isn't available. Trying again may succeed.
    Unavailable(Error),
    /// Encoding failed. This isn't expected for any valid input.
    Encode(Error),
}

impl LinkError {
    /// The stage error behind this one.
    pub fn stage(&self) -> &Error {
        match self {
            LinkError::Corrupt(e) | LinkError::Unavailable(e) | LinkError::Encode(e) => e,
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, LinkError::Corrupt(_))
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LinkError::Corrupt(_) => f.write_str("The shared link is corrupt and can't be loaded"),
            LinkError::Unavailable(_) => f.write_str("The link codec isn't available right now"),
            LinkError::Encode(err) => write!(f, "Couldn't create a shared link: {}", err),
        }
    }
}

impl std::error::Error for LinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.stage())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn corrupt_display_hides_stage() {
        let stages = [
            Error::Alphabet { index: 3, found: '=' },
            Error::TruncatedStream { len: 10 },
            Error::CorruptStream(CompressionError::Parsing("Missing frame content size")),
            Error::BadHeader,
        ];
        let shown: Vec<String> = stages
            .iter()
            .map(|e| LinkError::Corrupt(e.clone()).to_string())
            .collect();
        assert!(shown.windows(2).all(|w| w[0] == w[1]));
        for (stage, err) in stages.iter().zip(stages.iter().cloned().map(LinkError::Corrupt)) {
            assert_eq!(err.stage(), stage);
            assert!(err.is_corrupt());
        }
    }

    #[test]
    fn source_chain() {
        use std::error::Error as _;
        let err = LinkError::Corrupt(Error::CorruptStream(CompressionError::ZstdInner(20)));
        let stage = err.source().unwrap();
        assert!(stage.source().is_some());
        let err = LinkError::Encode(Error::Compress(CompressionError::ZstdInner(20)));
        assert!(err.source().unwrap().source().is_some());
        assert!(err.to_string().contains("Failed compression step"));
    }
}
