//! The symbol set used for link tokens.
//!
//! RFC 3986 allows 81 characters to appear unescaped in a URL fragment. The link alphabet takes
//! all of them except `&` and `=`, which stay free to separate `key=value` pairs in the fragment.
//! Every symbol is printable ASCII, so a token never needs percent-encoding.

/// Number of symbols, and so the radix of the token encoding.
pub const BASE: usize = 79;

/// The symbols, in digit order.
pub const ALPHABET: &[u8; BASE] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-._~!$'()*+,;:@/?";

const INVALID: u8 = 0xFF;

const fn build_lookup() -> [u8; 128] {
    let mut table = [INVALID; 128];
    let mut i = 0;
    while i < BASE {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
}

static LOOKUP: [u8; 128] = build_lookup();

/// Symbol for a digit. Panics if `digit >= BASE`, which the encoder never produces.
#[inline]
pub(crate) fn symbol(digit: u64) -> u8 {
    ALPHABET[digit as usize]
}

/// Digit value of a symbol, or `None` if the byte isn't in the alphabet.
#[inline]
pub fn digit(symbol: u8) -> Option<u8> {
    match LOOKUP.get(symbol as usize) {
        Some(&d) if d != INVALID => Some(d),
        _ => None,
    }
}

/// Check if a character belongs to the link alphabet.
pub fn contains(c: char) -> bool {
    c.is_ascii() && digit(c as u8).is_some()
}
