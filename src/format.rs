/*!

The link token format.

A token is what follows `#code=` in a share link. It carries a piece of source text, and nothing
else: there is no server involved, so everything needed to restore the text is in the token.

# Layers

From the outside in:

1. **Token**: a string over the 79-symbol link alphabet (see below). Tokens are written without
   any percent-escapes. A reader should still undo `%XX` escapes before decoding, as clients
   sometimes add them when a link is copied.
2. **Payload**: the bytes the token decodes to. The first byte names the format; the rest is the
   compressed frame.
3. **Frame**: one zstd frame without the 4-byte magic number. The frame header must carry the
   content size and the content checksum flag, and must not carry a dictionary ID. The window
   size is at most 2 MiB. The content size must use the shortest field that holds it, and can't
   exceed 32768 times the frame's length.
4. **Source text**: the decompressed frame, which must be valid UTF-8.

# Alphabet

Digit values run from 0 to 78, in this order:

```text
0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-._~!$'()*+,;:@/?
```

These are the characters allowed unescaped in a URL fragment, except `&` and `=`.

# Windows

The payload is split into 7-byte windows. Each window is read as a big-endian unsigned integer
and written as 9 digits, most significant first. If the payload length isn't a multiple of 7,
the last window has `r` bytes and is written with the fewest digits that can hold any `r`-byte
value:

| Bytes in last window | 1 | 2 | 3 | 4 | 5 | 6 |
|----------------------|---|---|---|---|---|---|
| Digits               | 2 | 3 | 4 | 6 | 7 | 8 |

A token whose length leaves 1 or 5 digits in its last window is invalid, as is any window whose
digits are larger than the window's bytes can hold.

# Format byte

| Value | Meaning                                  |
|-------|------------------------------------------|
| 0     | Reserved                                 |
| 1     | zstd frame as described above            |
| 2-255 | Reserved for future formats              |

A reader must refuse formats it doesn't know rather than guess.

*/
