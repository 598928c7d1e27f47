//! Base-79 conversion between bytes and link tokens.
//!
//! Bytes are taken in windows of 7. Each window is read as a big-endian integer and written as 9
//! digits in the [link alphabet](crate::alphabet), most significant first. A final window of `r`
//! bytes uses the fewest digits that can hold any `r`-byte value, so the token length depends
//! only on the input length, and the input length can be read back from the token length.

use crate::alphabet::{self, BASE};
use crate::error::{Error, Result};
use byteorder::{BigEndian, ByteOrder};

const BLOCK_BYTES: usize = 7;
const BLOCK_CHARS: usize = 9;
const RADIX: u64 = BASE as u64;

/// Digits used for a final window of `n` bytes, where `n < BLOCK_BYTES`.
const TAIL_CHARS: [usize; BLOCK_BYTES] = [0, 2, 3, 4, 6, 7, 8];

/// Length of the token for `len` bytes of input.
pub fn encoded_len(len: usize) -> usize {
    (len / BLOCK_BYTES) * BLOCK_CHARS + TAIL_CHARS[len % BLOCK_BYTES]
}

/// Number of bytes a token of `len` characters decodes to. Fails if no byte count encodes to that
/// many characters.
pub fn decoded_len(len: usize) -> Result<usize> {
    let tail = TAIL_CHARS
        .iter()
        .position(|&t| t == len % BLOCK_CHARS)
        .ok_or(Error::TruncatedStream { len })?;
    Ok((len / BLOCK_CHARS) * BLOCK_BYTES + tail)
}

/// Encode bytes as a token. Never fails.
pub fn encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(encoded_len(data.len()));
    let mut chunks = data.chunks_exact(BLOCK_BYTES);
    for chunk in &mut chunks {
        push_digits(&mut out, BigEndian::read_uint(chunk, BLOCK_BYTES), BLOCK_CHARS);
    }
    let tail = chunks.remainder();
    if !tail.is_empty() {
        push_digits(
            &mut out,
            BigEndian::read_uint(tail, tail.len()),
            TAIL_CHARS[tail.len()],
        );
    }
    out
}

fn push_digits(out: &mut String, mut value: u64, width: usize) {
    let mut digits = [0u8; BLOCK_CHARS];
    for d in digits[..width].iter_mut().rev() {
        *d = alphabet::symbol(value % RADIX);
        value /= RADIX;
    }
    out.extend(digits[..width].iter().map(|&b| b as char));
}

/// Decode a token back into bytes.
///
/// Fails on the first character outside the alphabet, on a token length that no byte count
/// produces, and on any window whose value doesn't fit the bytes it stands for.
pub fn decode(token: &str) -> Result<Vec<u8>> {
    if let Some((index, found)) = token.char_indices().find(|(_, c)| !alphabet::contains(*c)) {
        return Err(Error::Alphabet { index, found });
    }
    let mut out = Vec::with_capacity(decoded_len(token.len())?);

    for (n, window) in token.as_bytes().chunks(BLOCK_CHARS).enumerate() {
        let width = if window.len() == BLOCK_CHARS {
            BLOCK_BYTES
        } else {
            decoded_len(window.len())?
        };
        let value = window.iter().fold(0u64, |acc, &s| {
            acc * RADIX + alphabet::digit(s).unwrap_or_default() as u64
        });
        if value >> (8 * width) != 0 {
            return Err(Error::BadWindow {
                index: n * BLOCK_CHARS,
            });
        }
        let start = out.len();
        out.resize(start + width, 0);
        BigEndian::write_uint(&mut out[start..], value, width);
    }
    Ok(out)
}
