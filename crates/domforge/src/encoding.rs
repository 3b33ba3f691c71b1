//! Byte-level charset handling at the document boundary.
//!
//! In memory a document is always a Rust `String` (UTF-8); conversion
//! only happens when bytes enter or leave. Decoding prefers UTF-8 and
//! falls back to windows-1252, which decodes any byte sequence. Encoding
//! honors the configured target charset by WHATWG label.

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

use crate::warning::warn_once;

/// Decode raw document bytes: valid UTF-8 as-is, anything else as
/// windows-1252.
pub(crate) fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}

/// Encode `text` for file output in `charset`. Unknown labels fall back
/// to UTF-8 with a warning.
pub(crate) fn encode(text: &str, charset: &str) -> Vec<u8> {
    let (encoded, _, had_errors) = lookup(charset).encode(text);
    if had_errors {
        warn_once(
            "charset",
            &format!("some characters are not representable in {charset}"),
        );
    }
    encoded.into_owned()
}

/// Resolve a charset name to an encoding. `CP1252` (the normalized name
/// for the latin-1 family) is not a WHATWG label and is mapped by hand.
fn lookup(charset: &str) -> &'static Encoding {
    if charset.eq_ignore_ascii_case("cp1252") {
        return WINDOWS_1252;
    }
    match Encoding::for_label(charset.as_bytes()) {
        Some(encoding) => encoding,
        None => {
            warn_once("charset", &format!("unknown charset label {charset}, using UTF-8"));
            UTF_8
        }
    }
}

/// Strip a leading U+FEFF byte-order mark.
pub(crate) fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_utf8_directly() {
        assert_eq!(decode("héllo".as_bytes()), "héllo");
    }

    #[test]
    fn non_utf8_decodes_as_windows_1252() {
        // 0xE9 is é in windows-1252 and invalid alone in UTF-8.
        assert_eq!(decode(&[b'h', 0xE9]), "hé");
    }

    #[test]
    fn cp1252_label_resolves() {
        assert_eq!(encode("é", "CP1252"), vec![0xE9]);
    }

    #[test]
    fn bom_is_stripped() {
        assert_eq!(strip_bom("\u{feff}x"), "x");
        assert_eq!(strip_bom("x"), "x");
    }
}
