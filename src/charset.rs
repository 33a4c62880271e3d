//! Character set detection and conversion for legacy IPTC text.
//!
//! IPTC strings carry no per-field encoding; the envelope may declare UTF-8
//! through the `(1,90)` CharacterSet dataset (ESC `%` `G`), otherwise the
//! encoding has to be sniffed from the bytes themselves. Conversion covers
//! the closed set of encodings the format is seen with in the wild and is
//! best-effort: failure leaves the caller's bytes untouched.

use crate::iptc::{DatasetKey, IptcData};
use crate::iptc::datasets::{CHARACTER_SET, ENVELOPE};
use crate::value::Value;

/// The `(1,90)` payload that declares UTF-8: ESC `%` `G`.
pub const UTF8_INDICATOR: &[u8] = b"\x1b%G";

/// The encodings the conversion table knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Ascii,
    Utf8,
    Utf16Be,
    Utf16Le,
    Iso88591,
}

impl Charset {
    pub fn name(self) -> &'static str {
        match self {
            Charset::Ascii => "ASCII",
            Charset::Utf8 => "UTF-8",
            Charset::Utf16Be => "UTF-16BE",
            Charset::Utf16Le => "UTF-16LE",
            Charset::Iso88591 => "ISO-8859-1",
        }
    }
}

/// Sniff the character set of the string datasets in `iptc`.
///
/// The explicit UTF-8 indicator wins unconditionally. Otherwise every
/// string value is scanned byte by byte: pure 7-bit content is `Ascii`,
/// content whose multi-byte sequences all validate is `Utf8`, anything else
/// is `None` and the caller must choose (conventionally ISO-8859-1).
pub fn detect_charset(iptc: &IptcData) -> Option<Charset> {
    let indicator = DatasetKey::new(ENVELOPE, CHARACTER_SET);
    if let Some(entry) = iptc.find_id(indicator) {
        if let Value::Str(bytes) = &entry.value {
            if bytes == UTF8_INDICATOR {
                return Some(Charset::Utf8);
            }
        }
    }

    let mut ascii = true;
    let mut utf8 = true;

    'scan: for entry in iptc {
        let Some(bytes) = entry.value.text_bytes() else {
            continue;
        };
        // Count of continuation bytes still owed by the current sequence.
        let mut seq = 0u8;
        for &c in bytes {
            if seq > 0 {
                if c & 0xC0 != 0x80 {
                    utf8 = false;
                    break 'scan;
                }
                seq -= 1;
                continue;
            }
            if c & 0x80 == 0 {
                continue;
            }
            ascii = false;
            seq = match c {
                c if c & 0xE0 == 0xC0 => 1,
                c if c & 0xF0 == 0xE0 => 2,
                c if c & 0xF8 == 0xF0 => 3,
                c if c & 0xFC == 0xF8 => 4,
                c if c & 0xFE == 0xFC => 5,
                _ => {
                    utf8 = false;
                    break 'scan;
                }
            };
        }
        if seq > 0 {
            // Unterminated sequence.
            utf8 = false;
            break;
        }
    }

    if ascii {
        Some(Charset::Ascii)
    } else if utf8 {
        Some(Charset::Utf8)
    } else {
        None
    }
}

/// Transcode `bytes` from one encoding to another.
///
/// Returns `None` when the input is not valid in `from` or cannot be
/// represented in `to`; the caller keeps the original bytes in that case.
/// `from == to` is trivially successful.
pub fn convert(bytes: &[u8], from: Charset, to: Charset) -> Option<Vec<u8>> {
    if from == to {
        return Some(bytes.to_vec());
    }
    let text = decode_text(bytes, from)?;
    encode_text(&text, to)
}

fn decode_text(bytes: &[u8], from: Charset) -> Option<String> {
    match from {
        Charset::Ascii => bytes
            .iter()
            .all(u8::is_ascii)
            .then(|| bytes.iter().map(|b| *b as char).collect()),
        Charset::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
        Charset::Iso88591 => Some(bytes.iter().map(|b| char::from(*b)).collect()),
        Charset::Utf16Be | Charset::Utf16Le => {
            if bytes.len() % 2 != 0 {
                return None;
            }
            let units = bytes.chunks_exact(2).map(|c| match from {
                Charset::Utf16Be => u16::from_be_bytes([c[0], c[1]]),
                _ => u16::from_le_bytes([c[0], c[1]]),
            });
            char::decode_utf16(units)
                .collect::<Result<String, _>>()
                .ok()
        }
    }
}

fn encode_text(text: &str, to: Charset) -> Option<Vec<u8>> {
    match to {
        Charset::Ascii => text
            .chars()
            .map(|c| u8::try_from(u32::from(c)).ok().filter(u8::is_ascii))
            .collect(),
        Charset::Utf8 => Some(text.as_bytes().to_vec()),
        Charset::Iso88591 => text
            .chars()
            .map(|c| u8::try_from(u32::from(c)).ok())
            .collect(),
        Charset::Utf16Be => Some(
            text.encode_utf16()
                .flat_map(|u| u.to_be_bytes())
                .collect(),
        ),
        Charset::Utf16Le => Some(
            text.encode_utf16()
                .flat_map(|u| u.to_le_bytes())
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iptc::IptcEntry;

    fn with_strings(texts: &[&[u8]]) -> IptcData {
        let mut iptc = IptcData::new();
        for t in texts {
            // Keywords is repeatable, so any number of samples fits.
            iptc.add(IptcEntry::new(
                DatasetKey::new(2, 25),
                Value::Str(t.to_vec()),
            ))
            .unwrap();
        }
        iptc
    }

    // ── detection ────────────────────────────────────────────────────

    #[test]
    fn all_ascii_detected() {
        let iptc = with_strings(&[b"plain", b"text only"]);
        assert_eq!(detect_charset(&iptc), Some(Charset::Ascii));
    }

    #[test]
    fn valid_utf8_detected() {
        let iptc = with_strings(&[b"caf\xC3\xA9", b"ascii too"]);
        assert_eq!(detect_charset(&iptc), Some(Charset::Utf8));
    }

    #[test]
    fn latin1_is_unknown() {
        // 0xE9 alone is an invalid UTF-8 lead/continuation pattern.
        let iptc = with_strings(&[b"caf\xE9"]);
        assert_eq!(detect_charset(&iptc), None);
    }

    #[test]
    fn unterminated_sequence_is_unknown() {
        let iptc = with_strings(&[b"abc\xC3"]);
        assert_eq!(detect_charset(&iptc), None);
    }

    #[test]
    fn indicator_wins_over_content() {
        let mut iptc = with_strings(&[b"caf\xE9"]);
        assert!(iptc.assign("Iptc.Envelope.CharacterSet", "\x1b%G"));
        assert_eq!(detect_charset(&iptc), Some(Charset::Utf8));
    }

    #[test]
    fn empty_container_is_ascii() {
        assert_eq!(detect_charset(&IptcData::new()), Some(Charset::Ascii));
    }

    // ── conversion ───────────────────────────────────────────────────

    #[test]
    fn identity_conversion() {
        assert_eq!(
            convert(b"caf\xE9", Charset::Iso88591, Charset::Iso88591),
            Some(b"caf\xE9".to_vec())
        );
    }

    #[test]
    fn latin1_to_utf8() {
        assert_eq!(
            convert(b"caf\xE9", Charset::Iso88591, Charset::Utf8),
            Some("café".as_bytes().to_vec())
        );
    }

    #[test]
    fn utf8_to_utf16_round_trip() {
        let utf16 = convert("héllo".as_bytes(), Charset::Utf8, Charset::Utf16Be).unwrap();
        assert_eq!(utf16.len(), 10);
        let back = convert(&utf16, Charset::Utf16Be, Charset::Utf8).unwrap();
        assert_eq!(back, "héllo".as_bytes());
    }

    #[test]
    fn invalid_input_fails() {
        assert_eq!(convert(b"\xFF\xFE\xFD", Charset::Utf8, Charset::Ascii), None);
        assert_eq!(convert(b"odd", Charset::Utf16Be, Charset::Utf8), None);
    }

    #[test]
    fn unrepresentable_output_fails() {
        assert_eq!(
            convert("日本".as_bytes(), Charset::Utf8, Charset::Iso88591),
            None
        );
        assert_eq!(convert("é".as_bytes(), Charset::Utf8, Charset::Ascii), None);
    }
}
