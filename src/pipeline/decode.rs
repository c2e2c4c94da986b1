//! Byte-to-text decoding with a fallback chain that never fails.
//!
//! Order: UTF-8 → UTF-16 → Windows-1252. The last step maps every byte to
//! a character (it is a superset of ISO-8859-1), so a chapter is never
//! dropped purely because of its encoding.
//!
//! UTF-16 without a byte-order mark is only attempted when the data has an
//! even length and contains NUL bytes. Markup in any single-byte encoding
//! has no NULs, while the ASCII-range tags of UTF-16 markup are full of
//! them; without this gate almost any even-length Latin-1 file would
//! "decode" cleanly as UTF-16 garbage.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use tracing::debug;

/// Decode raw chapter bytes to text.
pub fn decode_text(bytes: &[u8]) -> String {
    let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
    if !had_errors {
        return text.into_owned();
    }

    if let Some(text) = decode_utf16(bytes) {
        debug!("Decoded {} bytes as UTF-16", bytes.len());
        return text;
    }

    debug!("Decoded {} bytes as Windows-1252", bytes.len());
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

fn decode_utf16(bytes: &[u8]) -> Option<String> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((enc, bom_len)) if enc == UTF_16LE || enc == UTF_16BE => (enc, &bytes[bom_len..]),
        _ => (sniff_utf16(bytes)?, bytes),
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
}

/// Guess UTF-16 endianness from where the NUL bytes sit.
fn sniff_utf16(bytes: &[u8]) -> Option<&'static Encoding> {
    if bytes.is_empty() || bytes.len() % 2 != 0 {
        return None;
    }
    let (mut even, mut odd) = (0usize, 0usize);
    for (i, b) in bytes.iter().enumerate() {
        if *b == 0 {
            if i % 2 == 0 {
                even += 1;
            } else {
                odd += 1;
            }
        }
    }
    match (even, odd) {
        (0, 0) => None,
        (e, o) if o >= e => Some(UTF_16LE),
        _ => Some(UTF_16BE),
    }
}
