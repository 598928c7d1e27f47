use educe::Educe;
use serde::{Deserialize, Serialize};

/// Settings for a [`LinkCodec`][crate::LinkCodec].
///
/// The token format itself has no knobs: the alphabet, windowing, and compression level are
/// fixed so that every link decodes everywhere. These settings only cover how tokens are placed
/// in URLs and how much a decoded link may expand to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Educe)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct LinkConfig {
    /// Key the token is stored under in the URL fragment, as in `#code=<token>`.
    #[educe(Default(expression = String::from(crate::DEFAULT_MARKER)))]
    pub marker: String,
    /// Refuse to decode links whose source text would be longer than this many bytes.
    pub max_source_len: Option<usize>,
}

impl LinkConfig {
    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn max_source_len(mut self, limit: Option<usize>) -> Self {
        self.max_source_len = limit;
        self
    }

    pub(crate) fn decode_limit(&self) -> usize {
        self.max_source_len.unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = LinkConfig::default();
        assert_eq!(config.marker, "code");
        assert_eq!(config.max_source_len, None);
        assert_eq!(config.decode_limit(), usize::MAX);
    }

    #[test]
    fn builder() {
        let config = LinkConfig::default().marker("src").max_source_len(Some(1 << 16));
        assert_eq!(config.marker, "src");
        assert_eq!(config.decode_limit(), 65536);
    }
}
