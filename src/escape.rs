use crate::alphabet;
use crate::error::{Error, Result};
use std::borrow::Cow;

/// Undo percent-escaping that a browser or chat client may have applied to a token.
///
/// Tokens are produced without any escapes, but some clients escape characters like `'`, `(` or
/// `!` when a link is copied around. Every escape must decode to an alphabet symbol; anything else
/// is reported as [`Error::Alphabet`] at the offset of the `%`.
pub fn unescape(token: &str) -> Result<Cow<'_, str>> {
    if !token.contains('%') {
        return Ok(Cow::Borrowed(token));
    }

    let bytes = token.as_bytes();
    let mut out = String::with_capacity(token.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            // Non-ASCII characters are left for the decoder to reject.
            let c = token[i..].chars().next().unwrap_or_default();
            out.push(c);
            i += c.len_utf8();
            continue;
        }
        let bad = Error::Alphabet {
            index: i,
            found: '%',
        };
        let hex = bytes.get(i + 1..i + 3).ok_or(bad.clone())?;
        let value = match (hex_val(hex[0]), hex_val(hex[1])) {
            (Some(hi), Some(lo)) => (hi << 4) | lo,
            _ => return Err(bad),
        };
        if alphabet::digit(value).is_none() {
            return Err(bad);
        }
        out.push(value as char);
        i += 3;
    }
    Ok(Cow::Owned(out))
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn passthrough() {
        let token = "Zx4~!$'()*";
        assert!(matches!(unescape(token).unwrap(), Cow::Borrowed(t) if t == token));
    }

    #[test]
    fn decodes_escapes() {
        assert_eq!(unescape("ab%27cd%28%29").unwrap(), "ab'cd()");
        assert_eq!(unescape("%2a%2A%21").unwrap(), "**!");
        assert_eq!(unescape("%41").unwrap(), "A");
    }

    #[test]
    fn rejects_malformed() {
        let bad = |index| Err(Error::Alphabet { index, found: '%' });
        assert_eq!(unescape("abc%"), bad(3));
        assert_eq!(unescape("abc%2"), bad(3));
        assert_eq!(unescape("a%zz"), bad(1));
        // '=' and '%' aren't link symbols, even when escaped
        assert_eq!(unescape("ab%3Dcd"), bad(2));
        assert_eq!(unescape("%25"), bad(0));
        assert_eq!(unescape("%C3%A9"), bad(0));
    }

    #[test]
    fn leaves_unicode_for_decoder() {
        assert_eq!(unescape("\u{e9}%27").unwrap(), "\u{e9}'");
    }
}
